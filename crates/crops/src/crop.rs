use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use agrisync_core::{CropId, DomainError, DomainResult, Entity, FieldId, require_text};

use crate::field::Field;

const NAME_MAX_CHARS: usize = 100;

/// Growth status of a crop. Caller-set; no transition order is enforced.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropStatus {
    #[default]
    Planted,
    Growing,
    Harvested,
}

impl CropStatus {
    pub const ALL: [CropStatus; 3] = [CropStatus::Planted, CropStatus::Growing, CropStatus::Harvested];

    pub fn as_str(&self) -> &'static str {
        match self {
            CropStatus::Planted => "planted",
            CropStatus::Growing => "growing",
            CropStatus::Harvested => "harvested",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "status: \"{s}\" is not a valid choice (expected one of: planted, growing, harvested)"
                ))
            })
    }
}

impl core::fmt::Display for CropStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A planting cycle of a named crop within a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crop {
    pub id: CropId,
    pub name: String,
    pub field_id: FieldId,
    pub planting_date: NaiveDate,
    pub expected_harvest_date: NaiveDate,
    pub status: CropStatus,
}

impl Entity for Crop {
    type Id = CropId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Crop {
    /// Human-readable label, e.g. `"Maize in North Field"`.
    pub fn describe(&self, field: &Field) -> String {
        format!("{} in {}", self.name, field.name)
    }
}

/// Validated attributes for creating or replacing a crop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCrop {
    pub name: String,
    pub field_id: FieldId,
    pub planting_date: NaiveDate,
    pub expected_harvest_date: NaiveDate,
    pub status: CropStatus,
}

impl NewCrop {
    pub fn new(
        name: &str,
        field_id: FieldId,
        planting_date: NaiveDate,
        expected_harvest_date: NaiveDate,
        status: Option<&str>,
    ) -> DomainResult<Self> {
        let status = match status {
            Some(s) => CropStatus::parse(s)?,
            None => CropStatus::default(),
        };
        Ok(Self {
            name: require_text("name", name, NAME_MAX_CHARS)?,
            field_id,
            planting_date,
            expected_harvest_date,
            status,
        })
    }
}

/// Partial update for a crop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CropPatch {
    pub name: Option<String>,
    pub field_id: Option<FieldId>,
    pub planting_date: Option<NaiveDate>,
    pub expected_harvest_date: Option<NaiveDate>,
    pub status: Option<String>,
}

impl CropPatch {
    pub fn apply(&self, current: &Crop) -> DomainResult<NewCrop> {
        NewCrop::new(
            self.name.as_deref().unwrap_or(&current.name),
            self.field_id.unwrap_or(current.field_id),
            self.planting_date.unwrap_or(current.planting_date),
            self.expected_harvest_date.unwrap_or(current.expected_harvest_date),
            Some(self.status.as_deref().unwrap_or(current.status.as_str())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn status_defaults_to_planted() {
        let c = NewCrop::new("Maize", FieldId::new(1), date(2024, 3, 1), date(2024, 8, 1), None).unwrap();
        assert_eq!(c.status, CropStatus::Planted);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = NewCrop::new("Maize", FieldId::new(1), date(2024, 3, 1), date(2024, 8, 1), Some("ripe"))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(m) if m.contains("\"ripe\"")));
    }

    #[test]
    fn any_status_transition_is_allowed() {
        let crop = Crop {
            id: CropId::new(1),
            name: "Maize".to_string(),
            field_id: FieldId::new(1),
            planting_date: date(2024, 3, 1),
            expected_harvest_date: date(2024, 8, 1),
            status: CropStatus::Harvested,
        };
        let next = CropPatch {
            status: Some("planted".to_string()),
            ..CropPatch::default()
        }
        .apply(&crop)
        .unwrap();
        assert_eq!(next.status, CropStatus::Planted);
        assert_eq!(next.name, "Maize");
    }

    #[test]
    fn describe_names_crop_and_field() {
        let field = Field {
            id: FieldId::new(1),
            name: "North Field".to_string(),
            location_description: String::new(),
        };
        let crop = Crop {
            id: CropId::new(2),
            name: "Maize".to_string(),
            field_id: field.id,
            planting_date: date(2024, 3, 1),
            expected_harvest_date: date(2024, 8, 1),
            status: CropStatus::Growing,
        };
        assert_eq!(crop.describe(&field), "Maize in North Field");
    }
}
