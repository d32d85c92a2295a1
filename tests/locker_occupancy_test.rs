mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use serde_json::json;

use common::TestApp;
use orgledger_api::{
    entities::{locker::LockerStatus, locker_rental::RentalStatus},
    errors::ServiceError,
    services::{
        lockers::CreateLockerInput,
        rentals::{CreateRentalInput, UpdateRentalInput},
    },
};

async fn seed_locker(app: &TestApp, number: &str) -> uuid::Uuid {
    app.state
        .services
        .lockers
        .create_locker(CreateLockerInput {
            locker_number: number.to_string(),
            section: "A".to_string(),
        })
        .await
        .expect("seed locker")
        .id
}

fn rental_input(locker_id: uuid::Uuid, status: RentalStatus) -> CreateRentalInput {
    let now = Utc::now();
    CreateRentalInput {
        locker_id,
        renter_name: "Cat Santos".to_string(),
        renter_email: "cat@example.com".to_string(),
        rental_status: status,
        date_rented: now,
        date_due: now + Duration::days(120),
        payment_amount: dec!(150.00),
    }
}

#[tokio::test]
async fn active_rental_occupies_the_locker() {
    let app = TestApp::new().await;
    let locker_id = seed_locker(&app, "A-01").await;

    app.state
        .services
        .rentals
        .create_rental(rental_input(locker_id, RentalStatus::Active))
        .await
        .unwrap();

    let locker = app.state.services.lockers.get_locker(locker_id).await.unwrap();
    assert_eq!(locker.status, LockerStatus::Occupied.as_str());

    // A second active rental on the same locker conflicts.
    let err = app
        .state
        .services
        .rentals
        .create_rental(rental_input(locker_id, RentalStatus::Active))
        .await
        .expect_err("locker already occupied");
    assert!(matches!(err, ServiceError::LockerUnavailable(_)));
    assert_eq!(err.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn pending_rental_leaves_the_locker_available() {
    let app = TestApp::new().await;
    let locker_id = seed_locker(&app, "A-02").await;

    app.state
        .services
        .rentals
        .create_rental(rental_input(locker_id, RentalStatus::Pending))
        .await
        .unwrap();

    let locker = app.state.services.lockers.get_locker(locker_id).await.unwrap();
    assert_eq!(locker.status, LockerStatus::Available.as_str());
}

#[tokio::test]
async fn ending_a_rental_releases_the_locker() {
    let app = TestApp::new().await;
    let locker_id = seed_locker(&app, "A-03").await;
    let rentals = &app.state.services.rentals;

    let rental = rentals
        .create_rental(rental_input(locker_id, RentalStatus::Active))
        .await
        .unwrap();

    rentals
        .update_rental(
            rental.id,
            UpdateRentalInput {
                rental_status: Some(RentalStatus::Expired),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let locker = app.state.services.lockers.get_locker(locker_id).await.unwrap();
    assert_eq!(locker.status, LockerStatus::Available.as_str());

    // Re-activating takes the locker again.
    rentals
        .update_rental(
            rental.id,
            UpdateRentalInput {
                rental_status: Some(RentalStatus::Active),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let locker = app.state.services.lockers.get_locker(locker_id).await.unwrap();
    assert_eq!(locker.status, LockerStatus::Occupied.as_str());
}

#[tokio::test]
async fn moving_a_rental_swaps_both_lockers_atomically() {
    let app = TestApp::new().await;
    let locker_a = seed_locker(&app, "C-01").await;
    let locker_b = seed_locker(&app, "C-02").await;
    let locker_c = seed_locker(&app, "C-03").await;
    let rentals = &app.state.services.rentals;
    let lockers = &app.state.services.lockers;

    let rental = rentals
        .create_rental(rental_input(locker_a, RentalStatus::Active))
        .await
        .unwrap();

    rentals
        .update_rental(
            rental.id,
            UpdateRentalInput {
                locker_id: Some(locker_b),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let a = lockers.get_locker(locker_a).await.unwrap();
    let b = lockers.get_locker(locker_b).await.unwrap();
    assert_eq!(a.status, LockerStatus::Available.as_str());
    assert_eq!(b.status, LockerStatus::Occupied.as_str());

    // Moving onto a locker that is not available fails whole and leaves
    // the current assignment untouched.
    lockers
        .set_locker_status(locker_c, LockerStatus::Maintenance)
        .await
        .unwrap();
    let err = rentals
        .update_rental(
            rental.id,
            UpdateRentalInput {
                locker_id: Some(locker_c),
                ..Default::default()
            },
        )
        .await
        .expect_err("target locker is under maintenance");
    assert!(matches!(err, ServiceError::LockerUnavailable(_)));

    let b = lockers.get_locker(locker_b).await.unwrap();
    assert_eq!(b.status, LockerStatus::Occupied.as_str());
    let moved = rentals.get_rental(rental.id).await.unwrap();
    assert_eq!(moved.locker_id, locker_b);
}

#[tokio::test]
async fn pending_rentals_cannot_move_onto_unavailable_lockers() {
    let app = TestApp::new().await;
    let locker_a = seed_locker(&app, "D-01").await;
    let locker_b = seed_locker(&app, "D-02").await;
    let rentals = &app.state.services.rentals;
    let lockers = &app.state.services.lockers;

    let rental = rentals
        .create_rental(rental_input(locker_a, RentalStatus::Pending))
        .await
        .unwrap();
    lockers
        .set_locker_status(locker_b, LockerStatus::Maintenance)
        .await
        .unwrap();

    let err = rentals
        .update_rental(
            rental.id,
            UpdateRentalInput {
                locker_id: Some(locker_b),
                ..Default::default()
            },
        )
        .await
        .expect_err("maintenance locker cannot take the rental");
    assert!(matches!(err, ServiceError::LockerUnavailable(_)));

    let unchanged = rentals.get_rental(rental.id).await.unwrap();
    assert_eq!(unchanged.locker_id, locker_a);
    assert_eq!(unchanged.rental_status, RentalStatus::Pending.as_str());
}

#[tokio::test]
async fn deleting_an_active_rental_releases_the_locker() {
    let app = TestApp::new().await;
    let locker_id = seed_locker(&app, "A-04").await;

    let rental = app
        .state
        .services
        .rentals
        .create_rental(rental_input(locker_id, RentalStatus::Active))
        .await
        .unwrap();
    app.state.services.rentals.delete_rental(rental.id).await.unwrap();

    let locker = app.state.services.lockers.get_locker(locker_id).await.unwrap();
    assert_eq!(locker.status, LockerStatus::Available.as_str());
}

#[tokio::test]
async fn reversed_dates_are_refused() {
    let app = TestApp::new().await;
    let locker_id = seed_locker(&app, "A-05").await;

    let now = Utc::now();
    let mut input = rental_input(locker_id, RentalStatus::Active);
    input.date_rented = now;
    input.date_due = now - Duration::days(1);

    let err = app
        .state
        .services
        .rentals
        .create_rental(input)
        .await
        .expect_err("due date precedes rental date");
    assert!(matches!(err, ServiceError::InvalidDateRange(_)));
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

    // The locker was never flipped.
    let locker = app.state.services.lockers.get_locker(locker_id).await.unwrap();
    assert_eq!(locker.status, LockerStatus::Available.as_str());
}

#[tokio::test]
async fn occupied_lockers_cannot_be_deleted_or_retagged() {
    let app = TestApp::new().await;
    let locker_id = seed_locker(&app, "A-06").await;

    app.state
        .services
        .rentals
        .create_rental(rental_input(locker_id, RentalStatus::Active))
        .await
        .unwrap();

    let err = app
        .state
        .services
        .lockers
        .delete_locker(locker_id)
        .await
        .expect_err("active rental blocks deletion");
    assert!(matches!(err, ServiceError::LockerUnavailable(_)));

    let err = app
        .state
        .services
        .lockers
        .set_locker_status(locker_id, LockerStatus::Maintenance)
        .await
        .expect_err("occupied locker cannot be retagged");
    assert!(matches!(err, ServiceError::LockerUnavailable(_)));
}

#[tokio::test]
async fn occupancy_counters_via_http() {
    let app = TestApp::new().await;
    let first = seed_locker(&app, "B-01").await;
    let _second = seed_locker(&app, "B-02").await;

    app.state
        .services
        .rentals
        .create_rental(rental_input(first, RentalStatus::Active))
        .await
        .unwrap();

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/lockers/occupancy", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["occupied"], 1);
    assert_eq!(body["data"]["available"], 1);

    // Occupied cannot be assigned by hand over HTTP either.
    let (status, _) = app
        .request_json(
            Method::PUT,
            &format!("/api/v1/lockers/{}/status", _second),
            Some(json!({ "status": "occupied" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
