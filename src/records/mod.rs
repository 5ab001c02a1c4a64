// Create, edit, list and delete motorcycle and client records

pub mod repository;

use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::camera::ImagePipeline;
use crate::models::{
    new_record_id, Client, ClientDraft, ImageRef, Motorcycle, MotorcycleDraft, PictureField,
    Record, RecordKind,
};
use crate::{FleetError, Result};

pub use repository::{decode_collection, RecordFeed, Repository};

/// What happened when a record and the images it owns were deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionReport {
    pub id: String,
    pub images_removed: usize,
    /// Files that outlived their record
    pub images_left: Vec<ImageRef>,
}

impl DeletionReport {
    pub fn is_complete(&self) -> bool {
        self.images_left.is_empty()
    }
}

/// Form-level operations on records.
#[derive(Clone)]
pub struct RecordService {
    repo: Repository,
    images: Arc<ImagePipeline>,
}

impl RecordService {
    pub fn new(repo: Repository, images: Arc<ImagePipeline>) -> Self {
        Self { repo, images }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn images(&self) -> &Arc<ImagePipeline> {
        &self.images
    }

    pub async fn list_motorcycles(&self) -> Result<Vec<Motorcycle>> {
        self.repo.list().await
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>> {
        self.repo.list().await
    }

    pub async fn get_motorcycle(&self, id: &str) -> Result<Option<Motorcycle>> {
        self.repo.get(id).await
    }

    pub async fn get_client(&self, id: &str) -> Result<Option<Client>> {
        self.repo.get(id).await
    }

    pub async fn subscribe_motorcycles(&self) -> Result<RecordFeed<Motorcycle>> {
        self.repo.subscribe().await
    }

    pub async fn subscribe_clients(&self) -> Result<RecordFeed<Client>> {
        self.repo.subscribe().await
    }

    pub async fn create_motorcycle(&self, draft: MotorcycleDraft) -> Result<Motorcycle> {
        draft.validate()?;
        let id = self.unused_id(RecordKind::Motorcycle).await?;
        let motorcycle = draft.into_record(&id);
        self.repo.set(&motorcycle).await?;
        info!(motorcycle.id = %id, name = %motorcycle.name, "Motorcycle created");
        Ok(motorcycle)
    }

    pub async fn update_motorcycle(&self, id: &str, draft: MotorcycleDraft) -> Result<Motorcycle> {
        draft.validate()?;
        self.repo.require::<Motorcycle>(id).await?;
        self.repo
            .update::<Motorcycle>(id, draft.to_update_fields())
            .await?;
        info!(motorcycle.id = %id, "Motorcycle updated");
        self.repo.require(id).await
    }

    pub async fn create_client(&self, draft: ClientDraft) -> Result<Client> {
        draft.validate()?;
        let id = self.unused_id(RecordKind::Client).await?;
        let client = draft.into_record(&id);
        self.repo.set(&client).await?;
        info!(client.id = %id, name = %client.name, "Client created");
        Ok(client)
    }

    pub async fn update_client(&self, id: &str, draft: ClientDraft) -> Result<Client> {
        draft.validate()?;
        let previous = self.repo.require::<Client>(id).await?;
        self.repo.update::<Client>(id, draft.to_update_fields()).await?;
        info!(client.id = %id, "Client updated");

        // A renamed client keeps showing under the new name on its motorcycles.
        if previous.name != draft.name {
            self.rename_on_rentals(&previous, &draft.name).await;
        }
        self.repo.require(id).await
    }

    /// Delete a motorcycle and every image it owns.
    pub async fn delete_motorcycle(&self, id: &str) -> Result<DeletionReport> {
        self.delete_with_images::<Motorcycle>(id).await
    }

    /// Delete a client and every image it owns.
    ///
    /// Refused while any motorcycle is rented to the client.
    pub async fn delete_client(&self, id: &str) -> Result<DeletionReport> {
        let client = self.repo.require::<Client>(id).await?;
        let motorcycles: Vec<Motorcycle> = self.repo.list().await?;
        if let Some(rented) = motorcycles.iter().find(|m| m.is_rented_by(&client)) {
            return Err(FleetError::invariant(format!(
                "client {} still rents motorcycle {}",
                client.id, rented.id
            )));
        }
        self.delete_with_images::<Client>(id).await
    }

    /// Bulk delete from the list screen's selection mode. Each id succeeds or fails on its own.
    pub async fn delete_motorcycles(&self, ids: &[String]) -> Vec<(String, Result<DeletionReport>)> {
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            results.push((id.clone(), self.delete_motorcycle(id).await));
        }
        results
    }

    /// Append freshly captured photos to a record.
    ///
    /// For a client's profile picture the last photo wins; the previous picture
    /// and any other new photos are deleted.
    pub async fn attach_pictures(
        &self,
        kind: RecordKind,
        id: &str,
        field: PictureField,
        added: Vec<ImageRef>,
    ) -> Result<()> {
        if added.is_empty() {
            return Ok(());
        }
        let wire = field.wire_name(kind);
        let mut fields = Map::new();
        let mut replaced = Vec::new();

        match kind {
            RecordKind::Motorcycle => {
                let m = self.repo.require::<Motorcycle>(id).await?;
                let mut list = match field {
                    PictureField::Primary => m.pictures,
                    PictureField::Documents => m.document_pictures,
                };
                list.extend(added);
                fields.insert(wire.into(), json!(list));
                self.repo.update::<Motorcycle>(id, fields).await?;
            }
            RecordKind::Client => {
                let c = self.repo.require::<Client>(id).await?;
                match field {
                    PictureField::Primary => {
                        let mut added = added;
                        let kept = added.pop();
                        replaced.extend(c.picture);
                        replaced.extend(added);
                        fields.insert(wire.into(), json!(kept));
                    }
                    PictureField::Documents => {
                        let mut list = c.document_pictures;
                        list.extend(added);
                        fields.insert(wire.into(), json!(list));
                    }
                }
                self.repo.update::<Client>(id, fields).await?;
            }
        }

        let left = self.images.delete_images(&replaced).await;
        if !left.is_empty() {
            warn!(kind = kind.label(), id = %id, leftover = ?left, "Replaced pictures could not be removed");
        }
        info!(kind = kind.label(), id = %id, field = wire, "Pictures attached");
        Ok(())
    }

    /// Remove one picture from a record, then delete its file.
    ///
    /// The record is updated first; if the file delete fails afterwards only
    /// an unreferenced file is left behind.
    pub async fn remove_picture(
        &self,
        kind: RecordKind,
        id: &str,
        field: PictureField,
        index: usize,
    ) -> Result<ImageRef> {
        let wire = field.wire_name(kind);
        let out_of_range = || FleetError::NotFound {
            kind: "picture",
            id: format!("{id}/{wire}/{index}"),
        };

        let mut fields = Map::new();
        let removed = match kind {
            RecordKind::Motorcycle => {
                let m = self.repo.require::<Motorcycle>(id).await?;
                let mut list = match field {
                    PictureField::Primary => m.pictures,
                    PictureField::Documents => m.document_pictures,
                };
                if index >= list.len() {
                    return Err(out_of_range());
                }
                let removed = list.remove(index);
                fields.insert(wire.into(), json!(list));
                self.repo.update::<Motorcycle>(id, fields).await?;
                removed
            }
            RecordKind::Client => {
                let c = self.repo.require::<Client>(id).await?;
                let removed = match field {
                    PictureField::Primary => {
                        let picture = c.picture.filter(|_| index == 0).ok_or_else(out_of_range)?;
                        fields.insert(wire.into(), Value::Null);
                        picture
                    }
                    PictureField::Documents => {
                        let mut list = c.document_pictures;
                        if index >= list.len() {
                            return Err(out_of_range());
                        }
                        let removed = list.remove(index);
                        fields.insert(wire.into(), json!(list));
                        removed
                    }
                };
                self.repo.update::<Client>(id, fields).await?;
                removed
            }
        };

        if !self.images.delete_image(&removed).await {
            warn!(image = %removed, "Picture removed from record but file remains");
        }
        Ok(removed)
    }

    async fn delete_with_images<T: Record>(&self, id: &str) -> Result<DeletionReport> {
        let record = self.repo.require::<T>(id).await?;
        let owned = record.owned_images();

        if let Err(e) = self.repo.remove::<T>(id).await {
            error!(kind = T::KIND.label(), id = %id, error = %e, "Deletion failed, record and images kept");
            return Err(e);
        }

        let images_left = self.images.delete_images(&owned).await;
        let report = DeletionReport {
            id: id.to_string(),
            images_removed: owned.len() - images_left.len(),
            images_left,
        };
        if report.is_complete() {
            info!(kind = T::KIND.label(), id = %id, images = report.images_removed, "Record deleted");
        } else {
            warn!(
                kind = T::KIND.label(),
                id = %id,
                leftover = ?report.images_left,
                "Record deleted but some images could not be removed"
            );
        }
        Ok(report)
    }

    async fn rename_on_rentals(&self, client: &Client, new_name: &str) {
        let motorcycles: Vec<Motorcycle> = match self.repo.list().await {
            Ok(list) => list,
            Err(e) => {
                warn!(client.id = %client.id, error = %e, "Could not refresh rental names");
                return;
            }
        };
        for m in motorcycles.iter().filter(|m| m.is_rented_by(client)) {
            let mut fields = Map::new();
            fields.insert("client".into(), json!(new_name));
            fields.insert("clientId".into(), json!(client.id));
            if let Err(e) = self.repo.update::<Motorcycle>(&m.id, fields).await {
                warn!(motorcycle.id = %m.id, error = %e, "Could not refresh rental name");
            }
        }
    }

    /// Millisecond-timestamp id not yet taken in the collection.
    async fn unused_id(&self, kind: RecordKind) -> Result<String> {
        let mut id = new_record_id();
        while self.repo.store().get(&kind.path(&id)).await?.is_some() {
            let next = id.parse::<i64>().unwrap_or_default() + 1;
            id = next.to_string();
        }
        Ok(id)
    }
}

impl std::fmt::Debug for RecordService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordService")
            .field("images", &self.images)
            .finish()
    }
}
