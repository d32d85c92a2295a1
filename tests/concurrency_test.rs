mod common;

use rust_decimal_macros::dec;

use common::TestApp;
use orgledger_api::{
    entities::igp_transaction::ReceiptStatus,
    errors::ServiceError,
    services::{
        igp_supplies::CreateSupplyInput, igp_transactions::CreateTransactionInput,
        igps::CreateIgpInput,
    },
};

fn sale(igp_id: uuid::Uuid, supply_id: uuid::Uuid, purchaser: &str) -> CreateTransactionInput {
    CreateTransactionInput {
        igp_id,
        supply_id,
        purchaser: purchaser.to_string(),
        batch: None,
        quantity: 1,
        receipt_status: ReceiptStatus::Received,
        date_purchased: None,
    }
}

/// Two buyers race for the last unit. Exactly one sale lands; the loser sees
/// either the capacity check or the version check, both of which leave the
/// totals untouched.
#[tokio::test]
async fn concurrent_sales_never_oversell_the_last_unit() {
    let app = TestApp::new().await;

    let igp = app
        .state
        .services
        .igps
        .create_igp(CreateIgpInput {
            name: "Limited Jackets".to_string(),
            igp_type: "merchandise".to_string(),
            description: None,
            unit_price: dec!(450.00),
            semester: None,
        })
        .await
        .unwrap();
    let supply = app
        .state
        .services
        .igp_supplies
        .create_supply(CreateSupplyInput {
            igp_id: igp.id,
            quantity: 1,
            unit_cost: dec!(300.00),
            expenses: dec!(0),
            supply_date: None,
        })
        .await
        .unwrap();

    let service_a = app.state.services.igp_transactions.clone();
    let service_b = app.state.services.igp_transactions.clone();
    let (first, second) = tokio::join!(
        service_a.create_transaction(sale(igp.id, supply.id, "Ana")),
        service_b.create_transaction(sale(igp.id, supply.id, "Ben")),
    );

    let successes = [first.is_ok(), second.is_ok()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert_eq!(successes, 1, "exactly one sale must land");

    let failure = if first.is_err() {
        first.err().unwrap()
    } else {
        second.err().unwrap()
    };
    assert!(
        matches!(
            failure,
            ServiceError::InsufficientSupply(_) | ServiceError::ConcurrentModification(_)
        ),
        "loser failed with {failure:?}"
    );

    let supply = app
        .state
        .services
        .igp_supplies
        .get_supply(supply.id)
        .await
        .unwrap();
    assert_eq!(supply.quantity_sold, 1);
    assert_eq!(supply.total_revenue, dec!(450.00));

    let igp = app.state.services.igps.get_igp(igp.id).await.unwrap();
    assert_eq!(igp.total_sold, 1);
    assert_eq!(igp.revenue, dec!(450.00));
}

/// Retryable conflicts are distinguishable from invariant violations, so a
/// client can safely retry only the former.
#[tokio::test]
async fn conflict_errors_are_marked_retryable() {
    let app = TestApp::new().await;

    let igp = app
        .state
        .services
        .igps
        .create_igp(CreateIgpInput {
            name: "Raffle Tickets".to_string(),
            igp_type: "fundraiser".to_string(),
            description: None,
            unit_price: dec!(20.00),
            semester: None,
        })
        .await
        .unwrap();
    let supply = app
        .state
        .services
        .igp_supplies
        .create_supply(CreateSupplyInput {
            igp_id: igp.id,
            quantity: 2,
            unit_cost: dec!(5.00),
            expenses: dec!(0),
            supply_date: None,
        })
        .await
        .unwrap();

    app.state
        .services
        .igp_transactions
        .create_transaction(sale(igp.id, supply.id, "Ana"))
        .await
        .unwrap();
    app.state
        .services
        .igp_transactions
        .create_transaction(sale(igp.id, supply.id, "Ben"))
        .await
        .unwrap();

    let err = app
        .state
        .services
        .igp_transactions
        .create_transaction(sale(igp.id, supply.id, "Caloy"))
        .await
        .expect_err("supply exhausted");
    assert!(!err.is_retryable(), "capacity exhaustion is not retryable");
}
