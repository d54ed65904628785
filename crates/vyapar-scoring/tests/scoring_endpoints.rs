//! End-to-end behavior of the scoring routes through the public router.
//!
//! These scenarios pin the response contract callers depend on: the `success` flag,
//! the per-endpoint fields, and the uniform failure envelope.

mod common {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;
    use vyapar_scoring::scoring::{scoring_router, ScoringEngine};

    pub(super) async fn post(path: &str, body: Value) -> (StatusCode, Value) {
        let router = scoring_router(Arc::new(ScoringEngine::heuristic()));
        let request = Request::post(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize")))
            .expect("request builds");

        let response = router.oneshot(request).await.expect("route executes");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&bytes).expect("json payload"))
    }
}

use axum::http::StatusCode;
use common::post;
use serde_json::json;

#[tokio::test]
async fn quiet_customers_are_safe_across_the_band() {
    for days in [0, 15, 30] {
        for tickets in [0, 3] {
            for bill in [0, 999, 1000] {
                let (status, payload) = post(
                    "/predict-churn",
                    json!({
                        "days_inactive": days,
                        "support_tickets": tickets,
                        "monthly_bill": bill
                    }),
                )
                .await;

                assert_eq!(status, StatusCode::OK);
                assert_eq!(payload["risk_score"], json!(0.1));
                assert_eq!(payload["status"], json!("Safe"));
            }
        }
    }
}

#[tokio::test]
async fn heuristic_scores_never_exceed_their_caps() {
    let (_, churn) = post(
        "/predict-churn",
        json!({ "days_inactive": 1e6, "support_tickets": 1e6, "monthly_bill": 1e9 }),
    )
    .await;
    assert!(churn["risk_score"].as_f64().expect("number") <= 0.99);

    let (_, lead) = post("/score-lead", json!({ "budget": 1e12, "urgency": 100 })).await;
    assert!(lead["lead_score"].as_u64().expect("integer") <= 99);

    let (_, expense) = post("/audit-expense", json!({ "amount": 1e12 })).await;
    assert!(expense["risk_score"].as_f64().expect("number") <= 0.99);
}

#[tokio::test]
async fn numeric_strings_are_accepted() {
    let (status, payload) = post(
        "/score-lead",
        json!({ "budget": "60000", "urgency": "9" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["lead_score"], json!(90));
    assert_eq!(payload["status"], json!("Hot Lead"));
}

#[tokio::test]
async fn empty_payloads_use_defaults() {
    let (status, churn) = post("/predict-churn", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(churn["risk_score"], json!(0.1));

    let (_, inventory) = post("/predict-inventory", json!({})).await;
    assert_eq!(inventory["days_until_stockout"], json!(0.0));
    assert_eq!(inventory["restock_urgent"], json!(true));

    let (_, expense) = post("/audit-expense", json!({})).await;
    assert_eq!(expense["status"], json!("Auto-Approved"));
    assert!(expense.get("category").is_none());
}

#[tokio::test]
async fn bad_input_never_leaks_a_raw_fault() {
    for (path, body) in [
        ("/predict-churn", json!({ "days_inactive": "unknown" })),
        ("/predict-inventory", json!({ "current_stock": null })),
        ("/score-lead", json!({ "budget": { "min": 10 } })),
        ("/audit-expense", json!({ "amount": "Infinity" })),
    ] {
        let (status, payload) = post(path, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{path}");
        assert_eq!(payload["success"], json!(false), "{path}");
        assert!(
            !payload["error"].as_str().unwrap_or_default().is_empty(),
            "{path}"
        );
    }
}
