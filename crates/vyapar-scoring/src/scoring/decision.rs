use serde::{Serialize, Serializer};

pub const CHURN_HIGH_RISK_ABOVE: f64 = 0.7;
pub const CHURN_MEDIUM_RISK_ABOVE: f64 = 0.4;
pub const HOT_LEAD_ABOVE: u32 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChurnStatus {
    HighRisk,
    MediumRisk,
    Safe,
}

impl ChurnStatus {
    pub fn from_risk(risk_score: f64) -> Self {
        if risk_score > CHURN_HIGH_RISK_ABOVE {
            Self::HighRisk
        } else if risk_score > CHURN_MEDIUM_RISK_ABOVE {
            Self::MediumRisk
        } else {
            Self::Safe
        }
    }

    /// A positive churn class always flags the customer; otherwise the probability decides.
    pub fn from_prediction(churn_class: f64, probability: f64) -> Self {
        if churn_class >= 0.5 {
            Self::HighRisk
        } else {
            Self::from_risk(probability)
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::HighRisk => "High Risk",
            Self::MediumRisk => "Medium Risk",
            Self::Safe => "Safe",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryStatus {
    CriticalLowStock,
    Healthy,
}

impl InventoryStatus {
    pub fn from_urgency(restock_urgent: bool) -> Self {
        if restock_urgent {
            Self::CriticalLowStock
        } else {
            Self::Healthy
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::CriticalLowStock => "CRITICAL LOW STOCK",
            Self::Healthy => "Healthy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadStatus {
    Hot,
    Cold,
}

impl LeadStatus {
    pub fn from_score(lead_score: u32) -> Self {
        if lead_score > HOT_LEAD_ABOVE {
            Self::Hot
        } else {
            Self::Cold
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hot => "Hot Lead",
            Self::Cold => "Cold Lead",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseStatus {
    AuditRequired,
    AutoApproved,
}

impl ExpenseStatus {
    pub fn from_anomaly(is_anomaly: bool) -> Self {
        if is_anomaly {
            Self::AuditRequired
        } else {
            Self::AutoApproved
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AuditRequired => "Audit Required",
            Self::AutoApproved => "Auto-Approved",
        }
    }
}

macro_rules! serialize_as_label {
    ($($status:ty),+ $(,)?) => {
        $(
            impl Serialize for $status {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str(self.label())
                }
            }
        )+
    };
}

serialize_as_label!(ChurnStatus, InventoryStatus, LeadStatus, ExpenseStatus);

/// Rounds half away from zero to `places` decimals for display in responses.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
