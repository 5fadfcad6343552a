use crate::TemplateFileError;
use crate::building::BuildingDefinition;
use crate::segment::SegmentDefinition;
use log::warn;
use serde_derive::Deserialize;
use std::collections::HashSet;

#[derive(Deserialize, Debug)]
pub struct Templates {
    #[serde(rename = "@name")]
    pub name: Option<String>,
    #[serde(rename = "$value", default)]
    pub elements: Vec<TemplateItem>,
}

#[derive(Deserialize, Debug)]
pub enum TemplateItem {
    Segment(SegmentDefinition),
    Building(BuildingDefinition),

    #[serde(other)]
    Unknown,
}

impl Templates {
    pub fn segments(&self) -> impl Iterator<Item = &SegmentDefinition> {
        self.elements.iter().filter_map(|item| match item {
            TemplateItem::Segment(segment) => Some(segment),
            _ => None,
        })
    }

    pub fn buildings(&self) -> impl Iterator<Item = &BuildingDefinition> {
        self.elements.iter().filter_map(|item| match item {
            TemplateItem::Building(building) => Some(building),
            _ => None,
        })
    }

    pub fn validate(&self) -> Result<(), TemplateFileError> {
        let unknown = self
            .elements
            .iter()
            .filter(|item| matches!(item, TemplateItem::Unknown))
            .count();
        if unknown > 0 {
            warn!(
                "Skipping {} unknown element(s) in template set {}",
                unknown,
                self.name.as_deref().unwrap_or("unnamed")
            );
        }

        let mut ids = HashSet::new();

        for segment in self.segments() {
            segment.validate()?;
            if !ids.insert(segment.id.as_str()) {
                return Err(TemplateFileError::DuplicateId {
                    id: segment.id.clone(),
                });
            }
        }

        for building in self.buildings() {
            building.validate()?;
            if !ids.insert(building.id.as_str()) {
                return Err(TemplateFileError::DuplicateId {
                    id: building.id.clone(),
                });
            }
        }

        if ids.is_empty() {
            return Err(TemplateFileError::EmptySource);
        }

        Ok(())
    }
}
