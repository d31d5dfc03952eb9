//! Request DTOs and response views.
//!
//! Decimal fields accept JSON strings or numbers; responses render them as
//! two-decimal strings.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use agrisync_auth::User;
use agrisync_core::{FieldId, InventoryItemId, TaskId, UserId};
use agrisync_crops::{CropPatch, FieldPatch};
use agrisync_inventory::InventoryItemPatch;
use agrisync_tasks::{Task, TaskPatch, TaskStatus};

/// Distinguish an absent attribute (`None`) from an explicit `null`
/// (`Some(None)`).
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

// -------------------------
// Fields
// -------------------------

#[derive(Debug, Deserialize)]
pub struct FieldRequest {
    pub name: String,
    #[serde(default)]
    pub location_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FieldPatchRequest {
    pub name: Option<String>,
    pub location_description: Option<String>,
}

impl From<FieldPatchRequest> for FieldPatch {
    fn from(r: FieldPatchRequest) -> Self {
        FieldPatch {
            name: r.name,
            location_description: r.location_description,
        }
    }
}

// -------------------------
// Crops
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CropRequest {
    pub name: String,
    pub field_id: FieldId,
    pub planting_date: NaiveDate,
    pub expected_harvest_date: NaiveDate,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CropPatchRequest {
    pub name: Option<String>,
    pub field_id: Option<FieldId>,
    pub planting_date: Option<NaiveDate>,
    pub expected_harvest_date: Option<NaiveDate>,
    pub status: Option<String>,
}

impl From<CropPatchRequest> for CropPatch {
    fn from(r: CropPatchRequest) -> Self {
        CropPatch {
            name: r.name,
            field_id: r.field_id,
            planting_date: r.planting_date,
            expected_harvest_date: r.expected_harvest_date,
            status: r.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddInputRequest {
    pub inventory_item_id: InventoryItemId,
    pub amount_used: Decimal,
    pub date_used: NaiveDate,
}

// -------------------------
// Inventory
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ItemPatchRequest {
    pub name: Option<String>,
    pub quantity: Option<Decimal>,
}

impl From<ItemPatchRequest> for InventoryItemPatch {
    fn from(r: ItemPatchRequest) -> Self {
        InventoryItemPatch {
            name: r.name,
            quantity: r.quantity,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: Decimal,
}

// -------------------------
// Tasks
// -------------------------

#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assigned_to_id: Option<UserId>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaskPatchRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to_id: Option<Option<UserId>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    pub status: Option<String>,
}

impl From<TaskPatchRequest> for TaskPatch {
    fn from(r: TaskPatchRequest) -> Self {
        TaskPatch {
            title: r.title,
            description: r.description,
            assigned_to: r.assigned_to_id,
            due_date: r.due_date,
            status: r.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskStatusRequest {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub assigned_to: Option<String>,
}

/// A task with its assignee expanded.
#[derive(Debug, Serialize)]
pub struct TaskView {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub assigned_to: Option<User>,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

impl TaskView {
    pub fn new(task: Task, assignee: Option<User>) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            assigned_to: assignee,
            due_date: task.due_date,
            status: task.status,
            created_at: task.created_at,
        }
    }
}

// -------------------------
// Users
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amount_accepts_string_or_number() {
        let a: AddInputRequest = serde_json::from_str(
            r#"{"inventory_item_id": 3, "amount_used": "40.50", "date_used": "2024-05-01"}"#,
        )
        .unwrap();
        let b: AddInputRequest = serde_json::from_str(
            r#"{"inventory_item_id": 3, "amount_used": 40.5, "date_used": "2024-05-01"}"#,
        )
        .unwrap();
        assert_eq!(a.amount_used, dec!(40.50));
        assert_eq!(a.amount_used, b.amount_used);
        assert_eq!(a.inventory_item_id, InventoryItemId::new(3));
    }

    #[test]
    fn task_patch_distinguishes_null_from_absent() {
        let absent: TaskPatchRequest = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        let cleared: TaskPatchRequest = serde_json::from_str(r#"{"assigned_to_id": null}"#).unwrap();
        assert_eq!(absent.assigned_to_id, None);
        assert_eq!(cleared.assigned_to_id, Some(None));
    }
}
