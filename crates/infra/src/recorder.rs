//! Inventory-consumption recorder.
//!
//! Records that some amount of an inventory item was applied to a crop and
//! decrements the item's balance, as one unit. The sufficiency check runs
//! against the balance read here; the store commits only while that balance
//! is unchanged, so two racing calls can never both spend the same stock.
//!
//! ```text
//! request ──validate──▶ get_crop ──▶ get_item ──plan──▶ commit_consumption
//!                          │            │         │            │
//!                      NotFound    Validation Validation    Conflict
//! ```

use std::sync::Arc;

use thiserror::Error;
use tracing::{Span, info, instrument, warn};

use agrisync_core::{CropId, DomainError};
use agrisync_crops::{InputUsedDetail, InputUsedRequest};

use crate::store::{CropStore, InputLedger, InventoryStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The crop does not exist.
    #[error("crop not found")]
    NotFound,

    /// Rejected input: insufficient stock, unresolvable item, bad amount.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The item's balance changed between read and commit. Safe to retry.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store error: {0}")]
    Store(String),
}

impl From<DomainError> for RecordError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound => RecordError::NotFound,
            DomainError::Conflict(m) => RecordError::Conflict(m),
            other => RecordError::Validation(other.message()),
        }
    }
}

impl From<StoreError> for RecordError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => RecordError::NotFound,
            StoreError::Conflict(m) => RecordError::Conflict(m),
            StoreError::MissingReference(m) => RecordError::Validation(m),
            StoreError::Backend(m) => RecordError::Store(m),
        }
    }
}

/// Ties the recorder to its three collaborators.
pub struct InputRecorder<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for InputRecorder<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> InputRecorder<S>
where
    S: CropStore + InventoryStore + InputLedger + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Record consumption of `request.amount_used` of an item against a crop.
    ///
    /// Returns the new ledger entry with the post-decrement item. Nothing is
    /// retried internally; on `Conflict` the caller may resubmit.
    #[instrument(
        name = "record_input",
        skip(self, request),
        fields(
            crop_id = %crop_id,
            inventory_item_id = %request.inventory_item_id,
            amount_used = %request.amount_used,
            input_id = tracing::field::Empty
        )
    )]
    pub async fn record_input(
        &self,
        crop_id: CropId,
        request: InputUsedRequest,
    ) -> Result<InputUsedDetail, RecordError> {
        match self.try_record(crop_id, &request).await {
            Ok((detail, description)) => {
                Span::current().record("input_id", detail.input.id.get());
                info!(%description, "input recorded");
                Ok(detail)
            }
            Err(RecordError::Store(msg)) => {
                tracing::error!(error = %msg, "input could not be recorded");
                Err(RecordError::Store(msg))
            }
            Err(err) => {
                warn!(error = %err, "input rejected");
                Err(err)
            }
        }
    }

    async fn try_record(
        &self,
        crop_id: CropId,
        request: &InputUsedRequest,
    ) -> Result<(InputUsedDetail, String), RecordError> {
        let crop = self.store.get_crop(crop_id).await?;

        let item = match self.store.get_item(request.inventory_item_id).await {
            Ok(item) => item,
            Err(StoreError::NotFound) => {
                return Err(RecordError::Validation(format!(
                    "inventory_item_id: invalid pk \"{}\" - object does not exist.",
                    request.inventory_item_id
                )));
            }
            Err(other) => return Err(other.into()),
        };

        let consumption = request.plan(&crop, &item)?;
        let detail = self.store.commit_consumption(consumption).await?;
        let description = detail.describe(&crop);
        Ok((detail, description))
    }
}
