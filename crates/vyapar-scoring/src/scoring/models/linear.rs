use serde::Deserialize;

use super::{check_width, finite, ModelError, PredictiveModel};
use crate::scoring::features::FeatureVector;

fn default_threshold() -> f64 {
    0.5
}

fn linear_term(coefficients: &[f64], intercept: f64, features: &FeatureVector) -> f64 {
    coefficients
        .iter()
        .zip(features.as_slice())
        .fold(intercept, |acc, (weight, value)| acc + weight * value)
}

fn validate_weights(coefficients: &[f64], intercept: f64) -> Result<(), String> {
    if coefficients.is_empty() {
        return Err("coefficients must not be empty".to_string());
    }
    if !intercept.is_finite() || coefficients.iter().any(|weight| !weight.is_finite()) {
        return Err("coefficients and intercept must be finite".to_string());
    }
    Ok(())
}

/// Ordinary least squares regressor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinearRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegression {
    const NAME: &'static str = "linear_regression";

    pub(crate) fn validate(&self) -> Result<(), String> {
        validate_weights(&self.coefficients, self.intercept)
    }
}

impl PredictiveModel for LinearRegression {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        check_width(Self::NAME, self.coefficients.len(), features)?;
        finite(
            Self::NAME,
            linear_term(&self.coefficients, self.intercept, features),
        )
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn feature_count(&self) -> usize {
        self.coefficients.len()
    }
}

/// Binary logistic classifier; `predict` returns 1.0 for the positive class.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl LogisticRegression {
    const NAME: &'static str = "logistic_regression";

    pub(crate) fn validate(&self) -> Result<(), String> {
        validate_weights(&self.coefficients, self.intercept)?;
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(format!(
                "threshold {} must lie within [0, 1]",
                self.threshold
            ));
        }
        Ok(())
    }
}

impl PredictiveModel for LogisticRegression {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let probability = self.predict_probability(features)?;
        Ok(if probability >= self.threshold { 1.0 } else { 0.0 })
    }

    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        check_width(Self::NAME, self.coefficients.len(), features)?;
        let logit = linear_term(&self.coefficients, self.intercept, features);
        finite(Self::NAME, 1.0 / (1.0 + (-logit).exp()))
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn feature_count(&self) -> usize {
        self.coefficients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::features::ScoringEndpoint;
    use crate::scoring::request::ScoringRequest;
    use serde_json::json;

    fn churn_vector(days_inactive: f64, support_tickets: f64, monthly_bill: f64) -> FeatureVector {
        let request = ScoringRequest::from_value(json!({
            "days_inactive": days_inactive,
            "support_tickets": support_tickets,
            "monthly_bill": monthly_bill,
        }))
        .expect("object");
        FeatureVector::extract(ScoringEndpoint::Churn, &request).expect("extracts")
    }

    fn churn_classifier() -> LogisticRegression {
        LogisticRegression {
            coefficients: vec![0.08, 0.6, 0.0005],
            intercept: -4.5,
            threshold: 0.5,
        }
    }

    #[test]
    fn probability_is_sigmoid_of_logit() {
        let model = LogisticRegression {
            coefficients: vec![0.0, 0.0, 0.0],
            intercept: 0.0,
            threshold: 0.5,
        };
        let probability = model
            .predict_probability(&churn_vector(10.0, 1.0, 100.0))
            .expect("scores");
        assert!((probability - 0.5).abs() < 1e-12);
    }

    #[test]
    fn class_follows_threshold() {
        let model = churn_classifier();
        assert_eq!(model.predict(&churn_vector(60.0, 6.0, 1500.0)), Ok(1.0));
        assert_eq!(model.predict(&churn_vector(2.0, 0.0, 200.0)), Ok(0.0));
    }

    #[test]
    fn width_mismatch_is_reported() {
        let model = LinearRegression {
            coefficients: vec![1.0, 1.0],
            intercept: 0.0,
        };
        let err = model
            .predict(&churn_vector(1.0, 1.0, 1.0))
            .expect_err("three features into a two feature model");
        assert_eq!(
            err,
            ModelError::FeatureCount {
                model: "linear_regression",
                expected: 2,
                found: 3,
            }
        );
    }

    #[test]
    fn regression_has_no_probability() {
        let model = LinearRegression {
            coefficients: vec![1.0, 0.0, 0.0],
            intercept: 0.0,
        };
        assert!(matches!(
            model.predict_probability(&churn_vector(1.0, 0.0, 0.0)),
            Err(ModelError::Unsupported { .. })
        ));
    }

    #[test]
    fn validation_rejects_degenerate_weights() {
        let empty = LinearRegression {
            coefficients: Vec::new(),
            intercept: 0.0,
        };
        assert!(empty.validate().is_err());

        let bad_threshold = LogisticRegression {
            threshold: 1.5,
            ..churn_classifier()
        };
        assert!(bad_threshold.validate().is_err());
    }
}
