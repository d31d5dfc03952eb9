use serde::Serialize;

use agrisync_core::{DomainResult, Entity, FieldId, require_text};

const NAME_MAX_CHARS: usize = 100;

/// A physical plot of land.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub id: FieldId,
    pub name: String,
    pub location_description: String,
}

impl Entity for Field {
    type Id = FieldId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl core::fmt::Display for Field {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Validated attributes for creating or replacing a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewField {
    pub name: String,
    pub location_description: String,
}

impl NewField {
    pub fn new(name: &str, location_description: Option<&str>) -> DomainResult<Self> {
        Ok(Self {
            name: require_text("name", name, NAME_MAX_CHARS)?,
            location_description: location_description.unwrap_or_default().trim().to_string(),
        })
    }
}

/// Partial update for a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPatch {
    pub name: Option<String>,
    pub location_description: Option<String>,
}

impl FieldPatch {
    pub fn apply(&self, current: &Field) -> DomainResult<NewField> {
        NewField::new(
            self.name.as_deref().unwrap_or(&current.name),
            Some(
                self.location_description
                    .as_deref()
                    .unwrap_or(&current.location_description),
            ),
        )
    }
}
