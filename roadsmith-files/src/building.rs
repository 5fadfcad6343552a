use crate::TemplateFileError;
use serde_derive::Deserialize;

fn default_weight() -> f32 {
    1.0
}

#[derive(Deserialize, Debug, Clone)]
pub struct BuildingDefinition {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@weight", default = "default_weight")]
    pub weight: f32,
    #[serde(rename = "@width")]
    pub width: f32,
    #[serde(rename = "@depth")]
    pub depth: f32,
    #[serde(rename = "@height")]
    pub height: f32,
}

impl BuildingDefinition {
    pub fn validate(&self) -> Result<(), TemplateFileError> {
        if self.id.trim().is_empty() {
            return Err(TemplateFileError::FormatError {
                id: self.id.clone(),
                reason: "the id is empty",
            });
        }

        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(TemplateFileError::FormatError {
                id: self.id.clone(),
                reason: "the weight has to be a finite, non-negative number",
            });
        }

        let dimensions = [self.width, self.depth, self.height];
        if dimensions.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(TemplateFileError::FormatError {
                id: self.id.clone(),
                reason: "width, depth and height have to be positive",
            });
        }

        Ok(())
    }
}
