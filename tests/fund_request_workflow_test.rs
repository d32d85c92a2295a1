mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use common::TestApp;
use orgledger_api::{
    entities::expense_transaction::ExpenseStatus,
    errors::ServiceError,
    services::{expenses::CreateExpenseInput, fund_requests::CreateFundRequestInput},
};

async fn seed_request(app: &TestApp, code: &str) -> uuid::Uuid {
    app.state
        .services
        .fund_requests
        .create_fund_request(CreateFundRequestInput {
            request_code: code.to_string(),
            purpose: "Sports fest materials".to_string(),
            amount: dec!(5000.00),
            requestor: "Treasurer".to_string(),
            date_needed: None,
        })
        .await
        .expect("seed fund request")
        .id
}

#[tokio::test]
async fn advances_through_every_step_in_order() {
    let app = TestApp::new().await;
    let id = seed_request(&app, "FR-2025-001").await;
    let requests = &app.state.services.fund_requests;

    for step in 2..=8 {
        let updated = requests.advance(id, step).await.expect("one-step advance");
        assert_eq!(updated.current_step, step);
    }

    let finished = requests.get_fund_request(id).await.unwrap();
    assert_eq!(finished.status, "validated");

    // Terminal: no further advances.
    let err = requests.advance(id, 9).await.expect_err("already validated");
    assert!(matches!(err, ServiceError::InvalidTransition(_)));
}

#[tokio::test]
async fn skipping_a_step_is_refused() {
    let app = TestApp::new().await;
    let id = seed_request(&app, "FR-2025-002").await;
    let requests = &app.state.services.fund_requests;

    let err = requests.advance(id, 4).await.expect_err("cannot jump to step 4");
    assert!(matches!(err, ServiceError::InvalidTransition(_)));
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

    // Nothing moved.
    let request = requests.get_fund_request(id).await.unwrap();
    assert_eq!(request.current_step, 1);
    assert_eq!(request.status, "submitted");
}

#[tokio::test]
async fn rejection_freezes_the_step_and_is_one_way() {
    let app = TestApp::new().await;
    let id = seed_request(&app, "FR-2025-003").await;
    let requests = &app.state.services.fund_requests;

    requests.advance(id, 2).await.unwrap();
    requests.advance(id, 3).await.unwrap();

    let rejected = requests
        .reject(id, "Quotation is missing".to_string())
        .await
        .unwrap();
    assert_eq!(rejected.status, "rejected");
    assert!(rejected.is_rejected);
    assert_eq!(rejected.rejection_step, Some(3));
    assert_eq!(rejected.current_step, 3);
    assert_eq!(
        rejected.rejection_reason.as_deref(),
        Some("Quotation is missing")
    );

    let err = requests.advance(id, 4).await.expect_err("rejected is terminal");
    assert!(matches!(err, ServiceError::InvalidTransition(_)));

    // A second rejection is refused so the recorded step survives.
    let err = requests
        .reject(id, "Different reason".to_string())
        .await
        .expect_err("already rejected");
    assert!(matches!(err, ServiceError::InvalidTransition(_)));
    let request = requests.get_fund_request(id).await.unwrap();
    assert_eq!(request.rejection_step, Some(3));
}

#[tokio::test]
async fn rejection_requires_a_reason() {
    let app = TestApp::new().await;
    let id = seed_request(&app, "FR-2025-004").await;

    let err = app
        .state
        .services
        .fund_requests
        .reject(id, "   ".to_string())
        .await
        .expect_err("blank reason");
    assert!(matches!(err, ServiceError::MissingReason));
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn expenses_accumulate_and_compensate_utilized_funds() {
    let app = TestApp::new().await;
    let id = seed_request(&app, "FR-2025-005").await;
    let expenses = &app.state.services.expenses;

    let tarpaulin = expenses
        .create_expense(CreateExpenseInput {
            request_id: id,
            expense_name: "Tarpaulin".to_string(),
            amount: dec!(800.00),
            receipt_reference: None,
            date_incurred: None,
        })
        .await
        .unwrap();
    expenses
        .create_expense(CreateExpenseInput {
            request_id: id,
            expense_name: "Sound system".to_string(),
            amount: dec!(1500.00),
            receipt_reference: None,
            date_incurred: None,
        })
        .await
        .unwrap();

    let request = app
        .state
        .services
        .fund_requests
        .get_fund_request(id)
        .await
        .unwrap();
    assert_eq!(request.utilized_funds, dec!(2300.00));

    // Duplicate names under the same request conflict.
    let err = expenses
        .create_expense(CreateExpenseInput {
            request_id: id,
            expense_name: "Tarpaulin".to_string(),
            amount: dec!(100.00),
            receipt_reference: None,
            date_incurred: None,
        })
        .await
        .expect_err("duplicate expense name");
    assert!(matches!(err, ServiceError::DuplicateName(_)));

    expenses.delete_expense(tarpaulin.id).await.unwrap();
    let request = app
        .state
        .services
        .fund_requests
        .get_fund_request(id)
        .await
        .unwrap();
    assert_eq!(request.utilized_funds, dec!(1500.00));
}

#[tokio::test]
async fn validating_the_last_expense_auto_validates_the_request() {
    let app = TestApp::new().await;
    let id = seed_request(&app, "FR-2025-006").await;
    let services = &app.state.services;

    services.fund_requests.advance(id, 2).await.unwrap();

    let first = services
        .expenses
        .create_expense(CreateExpenseInput {
            request_id: id,
            expense_name: "Medals".to_string(),
            amount: dec!(900.00),
            receipt_reference: None,
            date_incurred: None,
        })
        .await
        .unwrap();
    let second = services
        .expenses
        .create_expense(CreateExpenseInput {
            request_id: id,
            expense_name: "Certificates".to_string(),
            amount: dec!(300.00),
            receipt_reference: None,
            date_incurred: None,
        })
        .await
        .unwrap();

    services
        .expenses
        .set_expense_status(first.id, ExpenseStatus::Validated)
        .await
        .unwrap();
    let request = services.fund_requests.get_fund_request(id).await.unwrap();
    assert_eq!(request.current_step, 2, "one expense still pending");

    services
        .expenses
        .set_expense_status(second.id, ExpenseStatus::Validated)
        .await
        .unwrap();
    let request = services.fund_requests.get_fund_request(id).await.unwrap();
    assert_eq!(request.status, "validated");
    assert_eq!(request.current_step, 8);
}

#[tokio::test]
async fn rejecting_the_last_pending_expense_completes_validation() {
    let app = TestApp::new().await;
    let id = seed_request(&app, "FR-2025-010").await;
    let services = &app.state.services;

    let medals = services
        .expenses
        .create_expense(CreateExpenseInput {
            request_id: id,
            expense_name: "Medals".to_string(),
            amount: dec!(900.00),
            receipt_reference: None,
            date_incurred: None,
        })
        .await
        .unwrap();
    let snacks = services
        .expenses
        .create_expense(CreateExpenseInput {
            request_id: id,
            expense_name: "Snacks".to_string(),
            amount: dec!(400.00),
            receipt_reference: None,
            date_incurred: None,
        })
        .await
        .unwrap();

    services
        .expenses
        .set_expense_status(medals.id, ExpenseStatus::Validated)
        .await
        .unwrap();
    let request = services.fund_requests.get_fund_request(id).await.unwrap();
    assert_eq!(request.status, "submitted", "one expense still pending");

    // Rejecting the straggler leaves only validated expenses behind.
    services
        .expenses
        .set_expense_status(snacks.id, ExpenseStatus::Rejected)
        .await
        .unwrap();
    let request = services.fund_requests.get_fund_request(id).await.unwrap();
    assert_eq!(request.status, "validated");
    assert_eq!(request.current_step, 8);
}

#[tokio::test]
async fn rejected_requests_are_never_auto_validated() {
    let app = TestApp::new().await;
    let id = seed_request(&app, "FR-2025-007").await;
    let services = &app.state.services;

    let expense = services
        .expenses
        .create_expense(CreateExpenseInput {
            request_id: id,
            expense_name: "Venue deposit".to_string(),
            amount: dec!(2000.00),
            receipt_reference: None,
            date_incurred: None,
        })
        .await
        .unwrap();

    services
        .fund_requests
        .reject(id, "Over budget".to_string())
        .await
        .unwrap();

    services
        .expenses
        .set_expense_status(expense.id, ExpenseStatus::Validated)
        .await
        .unwrap();

    let request = services.fund_requests.get_fund_request(id).await.unwrap();
    assert_eq!(request.status, "rejected");
    assert_eq!(request.rejection_step, Some(1));

    // Rejected expense amounts stay in utilized_funds for the audit trail.
    services
        .expenses
        .set_expense_status(expense.id, ExpenseStatus::Rejected)
        .await
        .unwrap();
    let request = services.fund_requests.get_fund_request(id).await.unwrap();
    assert_eq!(request.utilized_funds, dec!(2000.00));
}

#[tokio::test]
async fn http_workflow_round_trip() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/fund-requests",
            Some(json!({
                "request_code": "FR-HTTP-001",
                "purpose": "General assembly snacks",
                "amount": "1200.00",
                "requestor": "Secretary",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["data"]["id"].as_str().expect("request id").to_string();

    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/fund-requests/{}/advance", id),
            Some(json!({ "to_step": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["current_step"], 2);

    let (status, _) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/fund-requests/{}/advance", id),
            Some(json!({ "to_step": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/fund-requests/{}/reject", id),
            Some(json!({ "reason": "Insufficient documentation" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "rejected");

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/fund-requests/summary", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rejected"], 1);
}
