//! Persistence boundary for farm records.
//!
//! One trait per record family, plus [`FarmStore`] for "everything". The
//! Recorder only needs [`CropStore`], [`InventoryStore`] and [`InputLedger`].

use async_trait::async_trait;
use thiserror::Error;

use agrisync_auth::{NewUser, User};
use agrisync_core::{CropId, FieldId, InventoryItemId, TaskId, UserId};
use agrisync_crops::{Consumption, Crop, Field, InputUsedDetail, NewCrop, NewField};
use agrisync_inventory::{BalanceChange, InventoryItem, ItemUpdate, NewInventoryItem};
use agrisync_tasks::{NewTask, Task};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryFarmStore;
pub use postgres::PostgresFarmStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The addressed record does not exist.
    #[error("not found")]
    NotFound,

    /// A guarded write lost a race, or a uniqueness rule was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A referenced record (foreign key) does not exist.
    #[error("missing reference: {0}")]
    MissingReference(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Filter for task listings.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub assigned_to: Option<UserId>,
}

#[async_trait]
pub trait FieldStore: Send + Sync {
    async fn create_field(&self, new: NewField) -> StoreResult<Field>;
    async fn list_fields(&self) -> StoreResult<Vec<Field>>;
    async fn get_field(&self, id: FieldId) -> StoreResult<Field>;
    async fn update_field(&self, id: FieldId, new: NewField) -> StoreResult<Field>;
    /// Deletes the field, its crops and their input records.
    async fn delete_field(&self, id: FieldId) -> StoreResult<()>;
}

#[async_trait]
pub trait CropStore: Send + Sync {
    /// Fails with `MissingReference` when `new.field_id` does not resolve.
    async fn create_crop(&self, new: NewCrop) -> StoreResult<Crop>;
    async fn list_crops(&self) -> StoreResult<Vec<Crop>>;
    async fn get_crop(&self, id: CropId) -> StoreResult<Crop>;
    async fn update_crop(&self, id: CropId, new: NewCrop) -> StoreResult<Crop>;
    /// Deletes the crop and its input records.
    async fn delete_crop(&self, id: CropId) -> StoreResult<()>;
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn create_item(&self, new: NewInventoryItem) -> StoreResult<InventoryItem>;
    async fn list_items(&self) -> StoreResult<Vec<InventoryItem>>;
    async fn get_item(&self, id: InventoryItemId) -> StoreResult<InventoryItem>;
    /// Writes only the attributes present in `update`. A balance edit is
    /// compare-and-set like [`InventoryStore::update_balance`]: `Conflict`
    /// when the stored balance is no longer the observed one.
    async fn update_item(&self, update: ItemUpdate) -> StoreResult<InventoryItem>;
    /// Deletes the item; historical input records keep existing with a null
    /// item reference.
    async fn delete_item(&self, id: InventoryItemId) -> StoreResult<()>;

    /// Compare-and-set: writes `change.new` only while the stored balance is
    /// still `change.observed`; otherwise `Conflict`.
    async fn update_balance(&self, change: BalanceChange) -> StoreResult<InventoryItem>;
}

#[async_trait]
pub trait InputLedger: Send + Sync {
    /// Entries for a crop, newest first.
    async fn list_inputs_for_crop(&self, crop_id: CropId) -> StoreResult<Vec<InputUsedDetail>>;

    /// Insert the ledger entry and apply the guarded decrement as one unit.
    ///
    /// - `NotFound`: the crop no longer exists.
    /// - `MissingReference`: the item no longer exists.
    /// - `Conflict`: the balance moved since it was observed.
    ///
    /// On any error nothing is written.
    async fn commit_consumption(&self, consumption: Consumption) -> StoreResult<InputUsedDetail>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Fails with `MissingReference` when the assignee does not resolve.
    async fn create_task(&self, new: NewTask) -> StoreResult<Task>;
    /// Newest first.
    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>>;
    async fn get_task(&self, id: TaskId) -> StoreResult<Task>;
    async fn update_task(&self, id: TaskId, new: NewTask) -> StoreResult<Task>;
    async fn delete_task(&self, id: TaskId) -> StoreResult<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the username is taken.
    async fn create_user(&self, new: NewUser) -> StoreResult<User>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn get_user(&self, id: UserId) -> StoreResult<User>;
}

/// Every record family behind one object, as the API layer uses it.
pub trait FarmStore:
    FieldStore + CropStore + InventoryStore + InputLedger + TaskStore + UserStore
{
}

impl<T> FarmStore for T where
    T: FieldStore + CropStore + InventoryStore + InputLedger + TaskStore + UserStore
{
}
