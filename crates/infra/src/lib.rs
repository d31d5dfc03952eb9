//! Infrastructure layer: storage, the consumption recorder, configuration.

pub mod config;
pub mod recorder;
pub mod store;

pub use recorder::{InputRecorder, RecordError};
pub use store::{
    CropStore, FarmStore, FieldStore, InMemoryFarmStore, InputLedger, InventoryStore,
    PostgresFarmStore, StoreError, StoreResult, TaskFilter, TaskStore, UserStore,
};
