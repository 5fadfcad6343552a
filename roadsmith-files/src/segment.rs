use crate::TemplateFileError;
use serde_derive::Deserialize;

fn default_weight() -> f32 {
    1.0
}

fn default_width() -> f32 {
    8.0
}

/// A pre-authored road piece. The named nodes carry the connection points, their role is derived
/// from the node name by the consumer (e.g. `Socket_Entry`, `Socket_Exit`, `Branch_Left`).
#[derive(Deserialize, Debug, Clone)]
pub struct SegmentDefinition {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@weight", default = "default_weight")]
    pub weight: f32,
    #[serde(rename = "@width", default = "default_width")]
    pub width: f32,
    /// Signed heading change in degrees, positive turns left (counter-clockwise seen from above).
    #[serde(rename = "@turn", default)]
    pub turn: f32,
    /// Whether the piece may also be placed mirrored (i.e. as the opposite curve).
    #[serde(rename = "@mirrorable", default)]
    pub mirrorable: bool,
    #[serde(rename = "Node", default)]
    pub nodes: Vec<NodeDefinition>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NodeDefinition {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@x", default)]
    pub x: f32,
    #[serde(rename = "@y", default)]
    pub y: f32,
    #[serde(rename = "@z", default)]
    pub z: f32,
    /// Rotation around the up axis, in degrees.
    #[serde(rename = "@yaw", default)]
    pub yaw: f32,
}

impl SegmentDefinition {
    pub fn validate(&self) -> Result<(), TemplateFileError> {
        let reason = if self.id.trim().is_empty() {
            Some("the id is empty")
        } else if !self.weight.is_finite() || self.weight < 0.0 {
            Some("the weight has to be a finite, non-negative number")
        } else if !self.width.is_finite() || self.width <= 0.0 {
            Some("the width has to be positive")
        } else if !self.turn.is_finite() || self.turn.abs() >= 180.0 {
            Some("the turn has to be within (-180, 180) degrees")
        } else if self
            .nodes
            .iter()
            .any(|node| !(node.x.is_finite() && node.y.is_finite() && node.z.is_finite() && node.yaw.is_finite()))
        {
            Some("a node has a non-finite transform")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(TemplateFileError::FormatError {
                id: self.id.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }
}
