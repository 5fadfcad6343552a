use crate::io::template_source::TemplateSource;
use crate::scene::template::{BuildingTemplate, SegmentTemplate, TemplateSet};
use anyhow::Context;
use dashmap::DashMap;
use log::{info, warn};
use roadsmith_files::deserialize_templates;
use std::io::Cursor;
use std::sync::Arc;

/// Loaded template sets, and every template in them by id. Templates are immutable once loaded, so
/// loading a set a second time just hands out the cached one.
#[derive(Default)]
pub struct TemplateLibrary {
    sets: DashMap<String, Arc<TemplateSet>>,
    segments: DashMap<String, Arc<SegmentTemplate>>,
    buildings: DashMap<String, Arc<BuildingTemplate>>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load_set<S: TemplateSource>(&self, source: &S, path: &str) -> anyhow::Result<Arc<TemplateSet>> {
        let cached = self.sets.get(path).map(|entry| entry.value().clone());
        if let Some(set) = cached {
            return Ok(set);
        }

        let bytes = source.fetch(path).await?;
        let templates =
            deserialize_templates(Cursor::new(bytes)).with_context(|| format!("Parsing template set {}", path))?;
        let set = Arc::new(TemplateSet::from_definitions(&templates));

        for segment in &set.segments {
            if self.segments.insert(segment.id.clone(), segment.clone()).is_some() {
                warn!("Segment template {} from {} replaces an earlier one", segment.id, path);
            }
        }

        for building in &set.buildings {
            if self.buildings.insert(building.id.clone(), building.clone()).is_some() {
                warn!("Building template {} from {} replaces an earlier one", building.id, path);
            }
        }

        info!(
            "Loaded template set {} ({}): {} segments, {} buildings",
            set.name.as_deref().unwrap_or("unnamed"),
            path,
            set.segments.len(),
            set.buildings.len()
        );

        self.sets.insert(path.to_string(), set.clone());
        Ok(set)
    }

    pub fn segment(&self, id: &str) -> Option<Arc<SegmentTemplate>> {
        self.segments.get(id).map(|entry| entry.value().clone())
    }

    pub fn building(&self, id: &str) -> Option<Arc<BuildingTemplate>> {
        self.buildings.get(id).map(|entry| entry.value().clone())
    }

    pub fn set_count(&self) -> usize {
        self.sets.len()
    }
}
