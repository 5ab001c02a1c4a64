// End-to-end rental flow over an in-memory store

use fleet::{FleetError, RentalWorkflow, Screen};
use serde_json::json;

mod fixtures;
use fixtures::Harness;

#[tokio::test]
async fn test_assign_m1_to_ana_end_to_end() {
    let harness = Harness::seeded();
    let mut workflow = RentalWorkflow::new(harness.rentals.clone());
    assert_eq!(workflow.screen(), Screen::Home);

    assert_eq!(workflow.start_rental().await.unwrap(), Screen::SelectMotorcycle);
    let choices = workflow.motorcycle_choices().await.unwrap();
    assert_eq!(choices.len(), 1);
    assert_eq!(choices[0].id, "m1");

    assert_eq!(
        workflow.pick_motorcycle("m1").await.unwrap(),
        Screen::SelectClient {
            motorcycle_id: "m1".to_string()
        }
    );
    assert_eq!(workflow.pick_client("c1").await.unwrap(), Screen::Home);

    let m1 = harness.motorcycle("m1").await;
    assert_eq!(m1["client"], json!("Ana"));
    assert_eq!(m1["clientId"], json!("c1"));
    assert_eq!(m1["isAvailable"], json!(false));
    // Form fields survive the partial update
    assert_eq!(m1["brand"], json!("Honda"));
}

#[tokio::test]
async fn test_return_restores_availability() {
    let harness = Harness::seeded();
    harness.rentals.assign_rental("m1", "c1").await.unwrap();

    let mut workflow = RentalWorkflow::new(harness.rentals.clone());
    workflow.open_rental("m1").await.unwrap();
    assert_eq!(workflow.return_rental().await.unwrap(), Screen::Home);

    let m1 = harness.motorcycle("m1").await;
    assert!(m1.get("client").is_none());
    assert!(m1.get("clientId").is_none());
    assert_eq!(m1["isAvailable"], json!(true));
}

#[tokio::test]
async fn test_back_never_mutates_records() {
    let harness = Harness::seeded();
    let before = harness.store.dump().await;
    let mut workflow = RentalWorkflow::new(harness.rentals.clone());

    workflow.start_rental().await.unwrap();
    assert_eq!(workflow.back(), Screen::Home);

    workflow.start_rental().await.unwrap();
    workflow.pick_motorcycle("m1").await.unwrap();
    assert_eq!(workflow.back(), Screen::Home);

    assert_eq!(harness.store.dump().await, before);

    // The discarded selection does not leak into the next pass
    workflow.start_rental().await.unwrap();
    assert_eq!(workflow.screen(), Screen::SelectMotorcycle);
}

#[tokio::test]
async fn test_unknown_client_keeps_select_client() {
    let harness = Harness::seeded();
    let before = harness.store.dump().await;
    let mut workflow = RentalWorkflow::new(harness.rentals.clone());

    workflow.start_rental().await.unwrap();
    workflow.pick_motorcycle("m1").await.unwrap();
    let err = workflow.pick_client("c404").await.unwrap_err();

    assert!(matches!(err, FleetError::NotFound { kind: "client", .. }));
    assert_eq!(
        workflow.screen(),
        Screen::SelectClient {
            motorcycle_id: "m1".to_string()
        }
    );
    assert_eq!(harness.store.dump().await, before);

    // The user may retry with another client
    assert_eq!(workflow.pick_client("c1").await.unwrap(), Screen::Home);
}

#[tokio::test]
async fn test_motorcycle_rented_elsewhere_is_rejected_on_commit() {
    let harness = Harness::seeded();
    let mut workflow = RentalWorkflow::new(harness.rentals.clone());
    workflow.start_rental().await.unwrap();
    workflow.pick_motorcycle("m1").await.unwrap();

    // Another writer rents m1 while this flow sits on select-client
    harness.rentals.assign_rental("m1", "c1").await.unwrap();

    let err = workflow.pick_client("c1").await.unwrap_err();
    assert!(matches!(err, FleetError::InvariantViolation { .. }));
    assert!(matches!(workflow.screen(), Screen::SelectClient { .. }));
}

#[tokio::test]
async fn test_renamed_client_shows_on_active_rental() {
    let harness = Harness::seeded();
    harness.rentals.assign_rental("m1", "c1").await.unwrap();

    let mut draft = fleet::ClientDraft::from(&harness.records.get_client("c1").await.unwrap().unwrap());
    draft.name = "Ana Souza".to_string();
    harness.records.update_client("c1", draft).await.unwrap();

    let rented = harness.rentals.active_rentals().await.unwrap();
    assert_eq!(rented[0].client.as_deref(), Some("Ana Souza"));
    let details = harness.rentals.rental_details("m1").await.unwrap();
    assert_eq!(details.client.unwrap().id, "c1");
}
