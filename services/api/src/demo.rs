use crate::cli::EngineArgs;
use clap::Args;
use serde_json::{json, Value};
use vyapar_scoring::config::AppConfig;
use vyapar_scoring::error::AppError;
use vyapar_scoring::scoring::{
    ErrorResponse, ScoreResult, ScoringEndpoint, ScoringEngine, ScoringError, ScoringRequest,
    ScoringResponse,
};

/// Which chain a `score` invocation runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScoreTarget {
    Auto,
    Endpoint(ScoringEndpoint),
}

fn parse_target(raw: &str) -> Result<ScoreTarget, String> {
    if raw.trim().eq_ignore_ascii_case("auto") {
        return Ok(ScoreTarget::Auto);
    }
    ScoringEndpoint::parse(raw).map(ScoreTarget::Endpoint).ok_or_else(|| {
        format!("unknown endpoint '{raw}' (expected churn, inventory, lead, expense or auto)")
    })
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Endpoint to score against (churn, inventory, lead, expense) or `auto`
    #[arg(value_parser = parse_target)]
    pub(crate) target: ScoreTarget,
    /// JSON object carrying the input fields
    #[arg(long)]
    pub(crate) payload: String,
    #[command(flatten)]
    pub(crate) engine: EngineArgs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    #[command(flatten)]
    pub(crate) engine: EngineArgs,
}

fn build_engine(overrides: EngineArgs) -> Result<ScoringEngine, AppError> {
    let mut config = AppConfig::load()?;
    overrides.apply(&mut config.scoring);
    Ok(ScoringEngine::from_config(&config.scoring)?)
}

fn score_payload(
    engine: &ScoringEngine,
    target: ScoreTarget,
    payload: Value,
) -> Result<(Option<ScoringEndpoint>, ScoreResult), ScoringError> {
    let request = ScoringRequest::from_value(payload)?;
    match target {
        ScoreTarget::Auto => engine
            .score_inferred(&request)
            .map(|(endpoint, result)| (Some(endpoint), result)),
        ScoreTarget::Endpoint(endpoint) => {
            engine.score(endpoint, &request).map(|result| (None, result))
        }
    }
}

fn render(routed: Option<ScoringEndpoint>, result: &ScoreResult) -> Result<String, AppError> {
    let envelope = match routed {
        Some(endpoint) => ScoringResponse::routed(endpoint, result),
        None => ScoringResponse::new(result),
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        target,
        payload,
        engine,
    } = args;

    let engine = build_engine(engine)?;
    let payload: Value = serde_json::from_str(&payload)?;

    match score_payload(&engine, target, payload) {
        Ok((routed, result)) => {
            println!("{}", render(routed, &result)?);
            Ok(())
        }
        Err(err) => {
            let envelope = ErrorResponse::new(err.to_string());
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            Err(err.into())
        }
    }
}

fn demo_payloads() -> Vec<(&'static str, ScoreTarget, Value)> {
    vec![
        (
            "Dormant customer with open tickets",
            ScoreTarget::Endpoint(ScoringEndpoint::Churn),
            json!({ "days_inactive": 45, "support_tickets": 5, "monthly_bill": 1200 }),
        ),
        (
            "Slow-moving shelf stock",
            ScoreTarget::Endpoint(ScoringEndpoint::Inventory),
            json!({ "current_stock": 12, "daily_sales_avg": 4 }),
        ),
        (
            "Enterprise enquiry",
            ScoreTarget::Endpoint(ScoringEndpoint::Lead),
            json!({ "budget": 75000, "urgency": 9 }),
        ),
        (
            "Large equipment claim",
            ScoreTarget::Endpoint(ScoringEndpoint::Expense),
            json!({ "amount": 7200, "category": "Equipment" }),
        ),
        (
            "Unlabelled payload routed by its keys",
            ScoreTarget::Auto,
            json!({ "budget": 8000, "urgency": 3 }),
        ),
    ]
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let engine = build_engine(args.engine)?;

    println!("Vyapar scoring demo");
    println!("Scorers in use:");
    for endpoint in ScoringEndpoint::ALL {
        println!("  - {}: {}", endpoint, engine.scorer_label(endpoint));
    }

    for (title, target, payload) in demo_payloads() {
        println!("\n{title}");
        println!("request: {payload}");
        match score_payload(&engine, target, payload) {
            Ok((routed, result)) => println!("{}", render(routed, &result)?),
            Err(err) => {
                let envelope = ErrorResponse::new(err.to_string());
                println!("{}", serde_json::to_string_pretty(&envelope)?);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_accept_route_names_and_auto() {
        assert_eq!(parse_target("auto"), Ok(ScoreTarget::Auto));
        assert_eq!(
            parse_target("score-lead"),
            Ok(ScoreTarget::Endpoint(ScoringEndpoint::Lead))
        );
        assert_eq!(
            parse_target("churn"),
            Ok(ScoreTarget::Endpoint(ScoringEndpoint::Churn))
        );
        assert!(parse_target("weather").is_err());
    }

    #[test]
    fn every_demo_payload_scores_with_heuristics() {
        let engine = ScoringEngine::heuristic();
        for (title, target, payload) in demo_payloads() {
            let outcome = score_payload(&engine, target, payload);
            assert!(outcome.is_ok(), "{title}: {outcome:?}");
        }
    }

    #[test]
    fn auto_target_reports_the_chosen_endpoint() {
        let engine = ScoringEngine::heuristic();
        let (routed, result) =
            score_payload(&engine, ScoreTarget::Auto, json!({ "amount": 9000 })).expect("scores");

        assert_eq!(routed, Some(ScoringEndpoint::Expense));
        let rendered: Value = serde_json::from_str(&render(routed, &result).expect("renders"))
            .expect("json output");
        assert_eq!(rendered["endpoint"], json!("expense"));
        assert_eq!(rendered["is_fraud_risk"], json!(true));
    }

    #[test]
    fn non_object_payload_is_a_scoring_error() {
        let engine = ScoringEngine::heuristic();
        let outcome = score_payload(
            &engine,
            ScoreTarget::Endpoint(ScoringEndpoint::Churn),
            json!("days_inactive=40"),
        );
        assert!(matches!(outcome, Err(ScoringError::Feature(_))));
    }
}
