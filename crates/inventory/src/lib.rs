//! Inventory domain module.
//!
//! Business rules for stocked consumables, implemented as deterministic domain
//! logic (no IO, no HTTP, no storage).

pub mod item;

pub use item::{BalanceChange, InventoryItem, InventoryItemPatch, ItemUpdate, NewInventoryItem};
