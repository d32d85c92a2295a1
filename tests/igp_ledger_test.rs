mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use common::TestApp;
use orgledger_api::{
    entities::igp_transaction::ReceiptStatus,
    errors::ServiceError,
    queries::{igp_queries::ListIgpTransactionsQuery, Query as _},
    services::{
        igp_supplies::CreateSupplyInput,
        igp_transactions::{CreateTransactionInput, UpdateTransactionInput},
        igps::CreateIgpInput,
    },
};

async fn seed_igp_with_supply(
    app: &TestApp,
    name: &str,
    quantity: i32,
) -> (uuid::Uuid, uuid::Uuid) {
    let igp = app
        .state
        .services
        .igps
        .create_igp(CreateIgpInput {
            name: name.to_string(),
            igp_type: "merchandise".to_string(),
            description: None,
            unit_price: dec!(25.00),
            semester: Some("2025-1".to_string()),
        })
        .await
        .expect("seed igp");
    let supply = app
        .state
        .services
        .igp_supplies
        .create_supply(CreateSupplyInput {
            igp_id: igp.id,
            quantity,
            unit_cost: dec!(10.00),
            expenses: dec!(0),
            supply_date: None,
        })
        .await
        .expect("seed supply");
    (igp.id, supply.id)
}

#[tokio::test]
async fn recording_sales_updates_supply_and_parent() {
    let app = TestApp::new().await;
    let (igp_id, supply_id) = seed_igp_with_supply(&app, "Org Shirts", 10).await;
    let txns = &app.state.services.igp_transactions;

    txns.create_transaction(CreateTransactionInput {
        igp_id,
        supply_id,
        purchaser: "Ana".to_string(),
        batch: None,
        quantity: 4,
        receipt_status: ReceiptStatus::Received,
        date_purchased: None,
    })
    .await
    .expect("received sale");

    // Pending sales consume capacity but contribute nothing to the totals.
    txns.create_transaction(CreateTransactionInput {
        igp_id,
        supply_id,
        purchaser: "Ben".to_string(),
        batch: None,
        quantity: 3,
        receipt_status: ReceiptStatus::Pending,
        date_purchased: None,
    })
    .await
    .expect("pending sale");

    let supply = app
        .state
        .services
        .igp_supplies
        .get_supply(supply_id)
        .await
        .unwrap();
    assert_eq!(supply.quantity_sold, 7);
    assert_eq!(supply.total_revenue, dec!(100.00));

    let igp = app.state.services.igps.get_igp(igp_id).await.unwrap();
    assert_eq!(igp.total_sold, 4);
    assert_eq!(igp.revenue, dec!(100.00));
}

#[tokio::test]
async fn oversell_is_rejected_and_totals_unchanged() {
    let app = TestApp::new().await;
    let (igp_id, supply_id) = seed_igp_with_supply(&app, "Lanyards", 5).await;
    let txns = &app.state.services.igp_transactions;

    txns.create_transaction(CreateTransactionInput {
        igp_id,
        supply_id,
        purchaser: "Ana".to_string(),
        batch: None,
        quantity: 4,
        receipt_status: ReceiptStatus::Received,
        date_purchased: None,
    })
    .await
    .unwrap();

    let err = txns
        .create_transaction(CreateTransactionInput {
            igp_id,
            supply_id,
            purchaser: "Ben".to_string(),
            batch: None,
            quantity: 2,
            receipt_status: ReceiptStatus::Pending,
            date_purchased: None,
        })
        .await
        .expect_err("only one unit left");
    assert!(matches!(err, ServiceError::InsufficientSupply(_)));
    assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let supply = app
        .state
        .services
        .igp_supplies
        .get_supply(supply_id)
        .await
        .unwrap();
    assert_eq!(supply.quantity_sold, 4);
    let igp = app.state.services.igps.get_igp(igp_id).await.unwrap();
    assert_eq!(igp.total_sold, 4);
}

#[tokio::test]
async fn cancelling_releases_capacity_and_reverses_totals() {
    let app = TestApp::new().await;
    let (igp_id, supply_id) = seed_igp_with_supply(&app, "Mugs", 10).await;
    let txns = &app.state.services.igp_transactions;

    let sale = txns
        .create_transaction(CreateTransactionInput {
            igp_id,
            supply_id,
            purchaser: "Ana".to_string(),
            batch: None,
            quantity: 6,
            receipt_status: ReceiptStatus::Received,
            date_purchased: None,
        })
        .await
        .unwrap();

    txns.update_transaction(
        sale.id,
        UpdateTransactionInput {
            receipt_status: Some(ReceiptStatus::Cancelled),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let supply = app
        .state
        .services
        .igp_supplies
        .get_supply(supply_id)
        .await
        .unwrap();
    assert_eq!(supply.quantity_sold, 0);
    assert_eq!(supply.total_revenue, dec!(0));

    let igp = app.state.services.igps.get_igp(igp_id).await.unwrap();
    assert_eq!(igp.total_sold, 0);
    assert_eq!(igp.revenue, dec!(0));

    // The freed capacity is usable again.
    txns.create_transaction(CreateTransactionInput {
        igp_id,
        supply_id,
        purchaser: "Ben".to_string(),
        batch: None,
        quantity: 10,
        receipt_status: ReceiptStatus::Pending,
        date_purchased: None,
    })
    .await
    .expect("full capacity available after cancellation");
}

#[tokio::test]
async fn receipt_crossing_moves_full_amount_into_totals() {
    let app = TestApp::new().await;
    let (igp_id, supply_id) = seed_igp_with_supply(&app, "Stickers", 10).await;
    let txns = &app.state.services.igp_transactions;

    let sale = txns
        .create_transaction(CreateTransactionInput {
            igp_id,
            supply_id,
            purchaser: "Ana".to_string(),
            batch: None,
            quantity: 5,
            receipt_status: ReceiptStatus::Pending,
            date_purchased: None,
        })
        .await
        .unwrap();

    let igp = app.state.services.igps.get_igp(igp_id).await.unwrap();
    assert_eq!(igp.total_sold, 0);

    txns.update_transaction(
        sale.id,
        UpdateTransactionInput {
            receipt_status: Some(ReceiptStatus::Received),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let igp = app.state.services.igps.get_igp(igp_id).await.unwrap();
    assert_eq!(igp.total_sold, 5);
    assert_eq!(igp.revenue, dec!(125.00));

    let supply = app
        .state
        .services
        .igp_supplies
        .get_supply(supply_id)
        .await
        .unwrap();
    // Capacity was already consumed while pending.
    assert_eq!(supply.quantity_sold, 5);
    assert_eq!(supply.total_revenue, dec!(125.00));
}

#[tokio::test]
async fn deleting_a_transaction_compensates_totals() {
    let app = TestApp::new().await;
    let (igp_id, supply_id) = seed_igp_with_supply(&app, "Pins", 10).await;
    let txns = &app.state.services.igp_transactions;

    let sale = txns
        .create_transaction(CreateTransactionInput {
            igp_id,
            supply_id,
            purchaser: "Ana".to_string(),
            batch: None,
            quantity: 3,
            receipt_status: ReceiptStatus::Received,
            date_purchased: None,
        })
        .await
        .unwrap();

    txns.delete_transaction(sale.id).await.unwrap();

    let supply = app
        .state
        .services
        .igp_supplies
        .get_supply(supply_id)
        .await
        .unwrap();
    assert_eq!(supply.quantity_sold, 0);
    assert_eq!(supply.total_revenue, dec!(0));
    let igp = app.state.services.igps.get_igp(igp_id).await.unwrap();
    assert_eq!(igp.total_sold, 0);
    assert_eq!(igp.revenue, dec!(0));
}

#[tokio::test]
async fn deleting_a_supply_compensates_received_contribution_only() {
    let app = TestApp::new().await;
    let (igp_id, supply_id) = seed_igp_with_supply(&app, "Tote Bags", 10).await;
    let txns = &app.state.services.igp_transactions;

    txns.create_transaction(CreateTransactionInput {
        igp_id,
        supply_id,
        purchaser: "Ana".to_string(),
        batch: None,
        quantity: 4,
        receipt_status: ReceiptStatus::Received,
        date_purchased: None,
    })
    .await
    .unwrap();
    txns.create_transaction(CreateTransactionInput {
        igp_id,
        supply_id,
        purchaser: "Ben".to_string(),
        batch: None,
        quantity: 3,
        receipt_status: ReceiptStatus::Pending,
        date_purchased: None,
    })
    .await
    .unwrap();

    app.state
        .services
        .igp_supplies
        .delete_supply(supply_id)
        .await
        .unwrap();

    let igp = app.state.services.igps.get_igp(igp_id).await.unwrap();
    assert_eq!(igp.total_sold, 0);
    assert_eq!(igp.revenue, dec!(0));

    // The supply's transactions went with it.
    let err = app
        .state
        .services
        .igp_supplies
        .get_supply(supply_id)
        .await
        .expect_err("supply is gone");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn listing_summary_matches_the_filtered_rows() {
    let app = TestApp::new().await;
    let (igp_id, supply_id) = seed_igp_with_supply(&app, "Lanyards", 20).await;
    let txns = &app.state.services.igp_transactions;

    for (purchaser, quantity, status) in [
        ("Ana", 4, ReceiptStatus::Received),
        ("Ben", 2, ReceiptStatus::Received),
        ("Cira", 5, ReceiptStatus::Pending),
    ] {
        txns.create_transaction(CreateTransactionInput {
            igp_id,
            supply_id,
            purchaser: purchaser.to_string(),
            batch: None,
            quantity,
            receipt_status: status,
            date_purchased: None,
        })
        .await
        .unwrap();
    }

    let filter = ListIgpTransactionsQuery {
        igp_id: Some(igp_id),
        receipt_status: Some(ReceiptStatus::Received),
        start_date: None,
        end_date: None,
        limit: 1,
        offset: 0,
    };
    let (page, total, summary) = filter.execute(&app.state.db).await.unwrap();

    // The summary spans the whole filtered set, not just the page.
    assert_eq!(page.len(), 1);
    assert_eq!(total, 2);
    assert_eq!(summary.total_quantity, 6);
    assert_eq!(summary.total_revenue, dec!(150.00));

    // And it equals the sum over the rows the same filter returns.
    let (rows, _, _) = ListIgpTransactionsQuery {
        limit: 50,
        offset: 0,
        ..filter
    }
    .execute(&app.state.db)
    .await
    .unwrap();
    let quantity: i64 = rows.iter().map(|t| i64::from(t.quantity)).sum();
    let revenue: rust_decimal::Decimal = rows
        .iter()
        .map(|t| rust_decimal::Decimal::from(t.quantity) * t.unit_price_at_purchase)
        .sum();
    assert_eq!(summary.total_quantity, quantity);
    assert_eq!(summary.total_revenue, revenue);
}

#[tokio::test]
async fn http_surface_round_trip() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/igps",
            Some(json!({
                "name": "Food Stand",
                "igp_type": "food",
                "unit_price": "15.50",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let igp_id = body["data"]["id"].as_str().expect("igp id").to_string();

    // Duplicate names conflict.
    let (status, _) = app
        .request_json(
            Method::POST,
            "/api/v1/igps",
            Some(json!({
                "name": "Food Stand",
                "igp_type": "food",
                "unit_price": "15.50",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .request_json(
            Method::GET,
            &format!("/api/v1/igps/{}/summary", igp_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_sold"], 0);

    // A reversed window on the transaction listing is a client error.
    let (status, _) = app
        .request_json(
            Method::GET,
            "/api/v1/igp-transactions?start_date=2025-06-30T00:00:00Z&end_date=2025-06-01T00:00:00Z",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
