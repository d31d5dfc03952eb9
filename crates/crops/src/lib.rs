//! Crops domain module.
//!
//! Fields, crops, and the input-usage ledger that links crops to consumed
//! inventory. Deterministic domain logic only; persistence lives in infra.

pub mod crop;
pub mod field;
pub mod input_used;

pub use crop::{Crop, CropPatch, CropStatus, NewCrop};
pub use field::{Field, FieldPatch, NewField};
pub use input_used::{
    Consumption, DELETED_ITEM_LABEL, InputUsed, InputUsedDetail, InputUsedRequest, sort_for_display,
};

/// A crop with its field and consumption history, newest entry first.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CropDetail {
    #[serde(flatten)]
    pub crop: Crop,
    pub field: Field,
    pub inputs_used: Vec<InputUsedDetail>,
}

impl CropDetail {
    pub fn new(crop: Crop, field: Field, mut inputs_used: Vec<InputUsedDetail>) -> Self {
        sort_for_display(&mut inputs_used);
        Self {
            crop,
            field,
            inputs_used,
        }
    }

    /// e.g. `"Maize in North Field"`.
    pub fn describe(&self) -> String {
        self.crop.describe(&self.field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrisync_core::{CropId, FieldId};
    use chrono::NaiveDate;

    #[test]
    fn detail_describes_crop_in_its_field() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let field = Field {
            id: FieldId::new(1),
            name: "North Field".to_string(),
            location_description: String::new(),
        };
        let crop = Crop {
            id: CropId::new(4),
            name: "Maize".to_string(),
            field_id: field.id,
            planting_date: day,
            expected_harvest_date: day,
            status: CropStatus::Growing,
        };
        let detail = CropDetail::new(crop, field, Vec::new());
        assert_eq!(detail.describe(), "Maize in North Field");
    }
}
