use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::models::{Client, Motorcycle, RentalStatus};
use crate::records::Repository;
use crate::{FleetError, Result};

/// A motorcycle together with whoever is renting it.
#[derive(Debug, Clone, PartialEq)]
pub struct RentalDetails {
    pub motorcycle: Motorcycle,
    /// `None` when the referenced client no longer exists
    pub client: Option<Client>,
}

/// Rental commits and queries over the record store.
///
/// Each commit is a single multi-field `update`, so the client reference and
/// the availability flag always change together.
#[derive(Clone)]
pub struct RentalService {
    repo: Repository,
}

impl RentalService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Motorcycle that can be offered on the select-motorcycle screen.
    pub async fn require_available(&self, motorcycle_id: &str) -> Result<Motorcycle> {
        let motorcycle = self.repo.require::<Motorcycle>(motorcycle_id).await?;
        match motorcycle.rental_status() {
            RentalStatus::Available => Ok(motorcycle),
            RentalStatus::Rented { client_name, .. } => Err(FleetError::invariant(format!(
                "motorcycle {motorcycle_id} is already rented to {client_name}"
            ))),
            RentalStatus::Inconsistent => Err(FleetError::invariant(format!(
                "motorcycle {motorcycle_id} has conflicting rental fields"
            ))),
        }
    }

    /// Rent an available motorcycle to a client.
    pub async fn assign_rental(&self, motorcycle_id: &str, client_id: &str) -> Result<Motorcycle> {
        let motorcycle = self.require_available(motorcycle_id).await?;
        let client = self.repo.require::<Client>(client_id).await?;

        let mut fields = Map::new();
        fields.insert("client".into(), json!(client.name));
        fields.insert("clientId".into(), json!(client.id));
        fields.insert("isAvailable".into(), json!(false));
        self.repo.update::<Motorcycle>(&motorcycle.id, fields).await?;

        info!(
            motorcycle.id = %motorcycle.id,
            client.id = %client.id,
            client.name = %client.name,
            "Rental assigned"
        );
        self.repo.require(motorcycle_id).await
    }

    /// End the current rental of a motorcycle.
    pub async fn return_rental(&self, motorcycle_id: &str) -> Result<Motorcycle> {
        let motorcycle = self.repo.require::<Motorcycle>(motorcycle_id).await?;
        if motorcycle.rental_status() == RentalStatus::Available {
            return Err(FleetError::invariant(format!(
                "motorcycle {motorcycle_id} is not rented"
            )));
        }
        if motorcycle.rental_status() == RentalStatus::Inconsistent {
            warn!(motorcycle.id = %motorcycle_id, "Returning motorcycle with conflicting rental fields");
        }

        let mut fields = Map::new();
        fields.insert("client".into(), Value::Null);
        fields.insert("clientId".into(), Value::Null);
        fields.insert("isAvailable".into(), json!(true));
        self.repo.update::<Motorcycle>(motorcycle_id, fields).await?;

        info!(
            motorcycle.id = %motorcycle_id,
            client.name = ?motorcycle.client,
            "Rental returned"
        );
        self.repo.require(motorcycle_id).await
    }

    /// Motorcycles currently rented, for the home list.
    pub async fn active_rentals(&self) -> Result<Vec<Motorcycle>> {
        let motorcycles: Vec<Motorcycle> = self.repo.list().await?;
        Ok(motorcycles.into_iter().filter(|m| m.is_rented()).collect())
    }

    pub async fn available_motorcycles(&self) -> Result<Vec<Motorcycle>> {
        let motorcycles: Vec<Motorcycle> = self.repo.list().await?;
        Ok(motorcycles
            .into_iter()
            .filter(|m| m.rental_status() == RentalStatus::Available)
            .collect())
    }

    pub async fn rental_details(&self, motorcycle_id: &str) -> Result<RentalDetails> {
        let motorcycle = self.repo.require::<Motorcycle>(motorcycle_id).await?;
        if !motorcycle.is_rented() {
            return Err(FleetError::invariant(format!(
                "motorcycle {motorcycle_id} is not rented"
            )));
        }
        let client = self.resolve_client(&motorcycle).await?;
        Ok(RentalDetails { motorcycle, client })
    }

    /// Look up the renting client by id, falling back to the stored name.
    pub async fn resolve_client(&self, motorcycle: &Motorcycle) -> Result<Option<Client>> {
        if let Some(id) = &motorcycle.client_id {
            if let Some(client) = self.repo.get::<Client>(id).await? {
                return Ok(Some(client));
            }
        }
        let Some(name) = &motorcycle.client else {
            return Ok(None);
        };
        let clients: Vec<Client> = self.repo.list().await?;
        Ok(clients.into_iter().find(|c| &c.name == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DataStore, MemoryStore, MockDataStore};
    use std::sync::Arc;

    fn seeded() -> (MemoryStore, RentalService) {
        let store = MemoryStore::with_data(json!({
            "motorcycles": {
                "m1": {"name": "CG 160", "isAvailable": true},
                "m2": {"name": "Factor", "client": "Bia", "isAvailable": false}
            },
            "clients": {
                "c1": {"name": "Ana", "address": "Rua A", "phone": "1"},
                "c2": {"name": "Bia", "address": "Rua B", "phone": "2"}
            }
        }));
        let service = RentalService::new(Repository::new(Arc::new(store.clone())));
        (store, service)
    }

    #[tokio::test]
    async fn test_assign_sets_both_rental_fields() {
        let (store, service) = seeded();
        let m = service.assign_rental("m1", "c1").await.unwrap();

        assert_eq!(m.client.as_deref(), Some("Ana"));
        assert_eq!(m.client_id.as_deref(), Some("c1"));
        assert!(!m.is_available);
        let stored = store.get("motorcycles/m1").await.unwrap().unwrap();
        assert_eq!(stored["isAvailable"], json!(false));
        assert_eq!(stored["name"], json!("CG 160"));
    }

    #[tokio::test]
    async fn test_assign_refuses_rented_motorcycle() {
        let (store, service) = seeded();
        let before = store.dump().await;

        let err = service.assign_rental("m2", "c1").await.unwrap_err();
        assert!(matches!(err, FleetError::InvariantViolation { .. }));
        assert_eq!(store.dump().await, before);
    }

    #[tokio::test]
    async fn test_return_clears_client_and_frees_motorcycle() {
        let (_, service) = seeded();
        let m = service.return_rental("m2").await.unwrap();
        assert_eq!(m.client, None);
        assert_eq!(m.client_id, None);
        assert_eq!(m.rental_status(), RentalStatus::Available);
    }

    #[tokio::test]
    async fn test_return_refuses_available_motorcycle() {
        let (_, service) = seeded();
        assert!(service.return_rental("m1").await.is_err());
    }

    #[tokio::test]
    async fn test_listings_partition_motorcycles() {
        let (_, service) = seeded();
        let rented: Vec<_> = service.active_rentals().await.unwrap();
        let free: Vec<_> = service.available_motorcycles().await.unwrap();
        assert_eq!(rented.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(), ["m2"]);
        assert_eq!(free.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(), ["m1"]);
    }

    #[tokio::test]
    async fn test_details_resolve_legacy_name_reference() {
        let (_, service) = seeded();
        let details = service.rental_details("m2").await.unwrap();
        assert_eq!(details.client.map(|c| c.id), Some("c2".to_string()));
    }

    #[tokio::test]
    async fn test_failed_update_is_reported() {
        let mut store = MockDataStore::new();
        store.expect_get().returning(|path| {
            Ok(match path {
                "motorcycles/m1" => Some(json!({"name": "CG 160"})),
                "clients/c1" => Some(json!({"name": "Ana"})),
                _ => None,
            })
        });
        store
            .expect_update()
            .times(1)
            .returning(|_, _| Err(FleetError::Store("offline".into())));
        let service = RentalService::new(Repository::new(Arc::new(store)));

        let err = service.assign_rental("m1", "c1").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
