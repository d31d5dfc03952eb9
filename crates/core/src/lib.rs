//! `agrisync-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, require_text};
pub use id::{CropId, FieldId, InputUsedId, InventoryItemId, TaskId, UserId};
pub use value_object::{Quantity, ValueObject, check_precision};
