use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use agrisync_core::{CropId, DomainResult, Entity, InputUsedId, InventoryItemId, Quantity};
use agrisync_inventory::{BalanceChange, InventoryItem};

use crate::crop::Crop;

/// Label used when the consumed inventory item has since been deleted.
pub const DELETED_ITEM_LABEL: &str = "(deleted item)";

/// An append-only ledger entry: `amount_used` of an inventory item applied to
/// a crop on `date_used`.
///
/// `inventory_item_id` becomes `None` when the item is deleted; the entry
/// itself survives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputUsed {
    pub id: InputUsedId,
    pub crop_id: CropId,
    pub inventory_item_id: Option<InventoryItemId>,
    pub amount_used: Quantity,
    pub date_used: NaiveDate,
}

impl Entity for InputUsed {
    type Id = InputUsedId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// A validated request to record consumption against a crop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputUsedRequest {
    pub inventory_item_id: InventoryItemId,
    pub amount_used: Quantity,
    pub date_used: NaiveDate,
}

impl InputUsedRequest {
    pub fn new(
        inventory_item_id: InventoryItemId,
        amount_used: Decimal,
        date_used: NaiveDate,
    ) -> DomainResult<Self> {
        Ok(Self {
            inventory_item_id,
            amount_used: Quantity::positive("amount_used", amount_used)?,
            date_used,
        })
    }

    /// Decide the ledger entry and balance write for this request against
    /// the current crop and item state.
    pub fn plan(&self, crop: &Crop, item: &InventoryItem) -> DomainResult<Consumption> {
        let balance = item.plan_consumption(self.amount_used)?;
        Ok(Consumption {
            crop_id: crop.id,
            inventory_item_id: item.id,
            amount_used: self.amount_used,
            date_used: self.date_used,
            balance,
        })
    }
}

/// A planned consumption: one ledger insert plus one conditional decrement,
/// committed together or not at all.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Consumption {
    pub crop_id: CropId,
    pub inventory_item_id: InventoryItemId,
    pub amount_used: Quantity,
    pub date_used: NaiveDate,
    pub balance: BalanceChange,
}

/// A ledger entry together with the item it references, if it still exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputUsedDetail {
    #[serde(flatten)]
    pub input: InputUsed,
    pub inventory_item: Option<InventoryItem>,
}

impl InputUsedDetail {
    /// e.g. `"40.00 of Urea for Maize"`.
    pub fn describe(&self, crop: &Crop) -> String {
        let item = self
            .inventory_item
            .as_ref()
            .map(|i| i.name.as_str())
            .unwrap_or(DELETED_ITEM_LABEL);
        format!("{} of {} for {}", self.input.amount_used, item, crop.name)
    }
}

/// Newest first; ties broken by id so the order is stable.
pub fn sort_for_display(entries: &mut [InputUsedDetail]) {
    entries.sort_by(|a, b| {
        b.input
            .date_used
            .cmp(&a.input.date_used)
            .then_with(|| b.input.id.cmp(&a.input.id))
    });
}
