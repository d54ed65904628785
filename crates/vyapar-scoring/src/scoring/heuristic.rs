//! Rule-based scorers used when no trained model is configured for an endpoint.
//!
//! Every function here is pure: the same features always produce the same score.

use super::features::{ChurnFeatures, ExpenseFeatures, InventoryFeatures, LeadFeatures};

pub const CHURN_BASE_RISK: f64 = 0.1;
pub const CHURN_RISK_CAP: f64 = 0.99;
pub const LEAD_BASE_SCORE: u32 = 20;
pub const LEAD_SCORE_CAP: u32 = 99;
pub const EXPENSE_ANOMALY_THRESHOLD: f64 = 5000.0;
pub const STOCKOUT_WARNING_DAYS: f64 = 7.0;

pub fn churn_risk(features: &ChurnFeatures) -> f64 {
    let mut risk = CHURN_BASE_RISK;

    if features.days_inactive > 30.0 {
        risk += 0.4;
    }
    if features.support_tickets > 3.0 {
        risk += 0.3;
    }
    if features.monthly_bill > 1000.0 {
        risk += 0.1;
    }

    risk.min(CHURN_RISK_CAP)
}

/// Days of stock left at the current sales velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StockoutForecast {
    pub days_until_stockout: f64,
    pub restock_urgent: bool,
}

pub fn stockout_forecast(features: &InventoryFeatures) -> StockoutForecast {
    let velocity = if features.daily_sales_avg > 0.0 {
        features.daily_sales_avg
    } else {
        1.0
    };
    let days_until_stockout = features.current_stock / velocity;

    StockoutForecast {
        days_until_stockout,
        restock_urgent: days_until_stockout < STOCKOUT_WARNING_DAYS,
    }
}

pub fn lead_score(features: &LeadFeatures) -> u32 {
    let mut score = LEAD_BASE_SCORE;

    if features.budget > 50_000.0 {
        score += 40;
    } else if features.budget > 10_000.0 {
        score += 20;
    }
    if features.urgency > 7.0 {
        score += 30;
    }

    score.min(LEAD_SCORE_CAP)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpenseAudit {
    pub is_anomaly: bool,
    pub risk_score: f64,
}

pub fn expense_audit(features: &ExpenseFeatures) -> ExpenseAudit {
    let is_anomaly = features.amount > EXPENSE_ANOMALY_THRESHOLD;
    ExpenseAudit {
        is_anomaly,
        risk_score: if is_anomaly { 0.9 } else { 0.1 },
    }
}
