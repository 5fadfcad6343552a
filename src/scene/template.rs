//! Immutable templates the network and the building streamer clone their instances from.

use crate::network::sockets::{SocketRole, SocketTable};
use crate::scene::node::{Pose, SceneNode};
use crate::scene::types::Mesh;
use crate::util::{heading_of, sample_arc_xz};
use glam::Vec3;
use roadsmith_files::building::BuildingDefinition;
use roadsmith_files::segment::SegmentDefinition;
use roadsmith_files::typedefs::Templates;
use std::sync::Arc;

const MESH_SAMPLE_SPACING: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveKind {
    Straight,
    /// Signed heading change in radians, positive turns left.
    Curve { turn: f32 },
}

#[derive(Debug, Clone)]
pub struct SegmentTemplate {
    pub id: String,
    pub weight: f32,
    pub curve: CurveKind,
    pub mirrorable: bool,
    pub width: f32,
    /// Chord length between entry and exit, zero without an exit socket.
    pub span: f32,
    pub sockets: SocketTable,
    pub prototype: SceneNode,
}

impl SegmentTemplate {
    pub fn new(id: impl Into<String>, weight: f32, curve: CurveKind, width: f32, sockets: SocketTable) -> Self {
        let id = id.into();
        let entry = sockets.entry_or_origin();
        let exit = sockets.local(SocketRole::Exit);

        let span = exit
            .map(|exit| exit.translation.distance(entry.translation))
            .unwrap_or(0.0);

        let mesh = match exit {
            Some(exit) => {
                let turn = match curve {
                    CurveKind::Straight => 0.0,
                    CurveKind::Curve { turn } => turn,
                };
                let centerline = sample_arc_xz(
                    entry.translation,
                    heading_of(entry.rotation),
                    exit.translation,
                    turn,
                    MESH_SAMPLE_SPACING,
                );
                Mesh::ribbon(&centerline, width)
            }
            None => Mesh::default(),
        };

        Self {
            prototype: SceneNode::new(id.clone(), Some(Arc::new(mesh))),
            id,
            weight,
            curve,
            mirrorable: false,
            width,
            span,
            sockets,
        }
    }

    /// A straight piece of `length` along +Z.
    pub fn straight(id: impl Into<String>, length: f32, weight: f32) -> Self {
        let sockets = SocketTable::default()
            .with(SocketRole::Entry, Pose::IDENTITY)
            .with(SocketRole::Exit, Pose::new(Vec3::new(0.0, 0.0, length), Default::default()));
        Self::new(id, weight, CurveKind::Straight, 8.0, sockets)
    }

    /// A circular arc of `radius`, turning by `turn` radians (positive = left).
    pub fn curve(id: impl Into<String>, radius: f32, turn: f32, weight: f32) -> Self {
        let exit = Vec3::new(
            radius * (1.0 - turn.abs().cos()) * turn.signum(),
            0.0,
            radius * turn.abs().sin(),
        );
        let sockets = SocketTable::default()
            .with(SocketRole::Entry, Pose::IDENTITY)
            .with(SocketRole::Exit, Pose::from_translation_yaw(exit, turn));
        Self::new(id, weight, CurveKind::Curve { turn }, 8.0, sockets)
    }

    /// A straight piece of `length` with perpendicular branch sockets at its middle.
    pub fn junction(id: impl Into<String>, length: f32, weight: f32) -> Self {
        let half_width = 4.0;
        let sockets = SocketTable::default()
            .with(SocketRole::Entry, Pose::IDENTITY)
            .with(SocketRole::Exit, Pose::new(Vec3::new(0.0, 0.0, length), Default::default()))
            .with(
                SocketRole::BranchLeft,
                Pose::from_translation_yaw(Vec3::new(half_width, 0.0, length * 0.5), std::f32::consts::FRAC_PI_2),
            )
            .with(
                SocketRole::BranchRight,
                Pose::from_translation_yaw(Vec3::new(-half_width, 0.0, length * 0.5), -std::f32::consts::FRAC_PI_2),
            );
        Self::new(id, weight, CurveKind::Straight, 8.0, sockets)
    }

    pub fn with_mirrorable(mut self, mirrorable: bool) -> Self {
        self.mirrorable = mirrorable;
        self
    }

    pub fn from_definition(definition: &SegmentDefinition) -> Self {
        let sockets = SocketTable::resolve(definition.nodes.iter().map(|node| {
            (
                node.name.as_str(),
                Pose::from_translation_yaw(Vec3::new(node.x, node.y, node.z), node.yaw.to_radians()),
            )
        }));

        let curve = if definition.turn == 0.0 {
            CurveKind::Straight
        } else {
            CurveKind::Curve {
                turn: definition.turn.to_radians(),
            }
        };

        Self::new(&definition.id, definition.weight, curve, definition.width, sockets)
            .with_mirrorable(definition.mirrorable)
    }

    #[inline]
    pub fn is_junction(&self) -> bool {
        self.sockets.has_branches()
    }

    #[inline]
    pub fn is_straight(&self) -> bool {
        matches!(self.curve, CurveKind::Straight)
    }

    pub fn turn(&self) -> f32 {
        match self.curve {
            CurveKind::Straight => 0.0,
            CurveKind::Curve { turn } => turn,
        }
    }

    /// -1 for right, 1 for left and 0 for straight pieces, taking mirroring into account.
    pub fn direction(&self, mirror: bool) -> i8 {
        let turn = if mirror { -self.turn() } else { self.turn() };
        if turn > 0.0 {
            1
        } else if turn < 0.0 {
            -1
        } else {
            0
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildingTemplate {
    pub id: String,
    pub weight: f32,
    pub width: f32,
    pub depth: f32,
    pub height: f32,
    pub prototype: SceneNode,
}

impl BuildingTemplate {
    pub fn new(id: impl Into<String>, weight: f32, width: f32, depth: f32, height: f32) -> Self {
        let id = id.into();
        Self {
            prototype: SceneNode::new(id.clone(), Some(Arc::new(Mesh::cuboid(width, depth, height)))),
            id,
            weight,
            width,
            depth,
            height,
        }
    }

    pub fn from_definition(definition: &BuildingDefinition) -> Self {
        Self::new(
            &definition.id,
            definition.weight,
            definition.width,
            definition.depth,
            definition.height,
        )
    }
}

/// Everything that has been loaded from one template file.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    pub name: Option<String>,
    pub segments: Vec<Arc<SegmentTemplate>>,
    pub buildings: Vec<Arc<BuildingTemplate>>,
}

impl TemplateSet {
    pub fn new(segments: Vec<SegmentTemplate>, buildings: Vec<BuildingTemplate>) -> Self {
        Self {
            name: None,
            segments: segments.into_iter().map(Arc::new).collect(),
            buildings: buildings.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn from_definitions(templates: &Templates) -> Self {
        Self {
            name: templates.name.clone(),
            segments: templates
                .segments()
                .map(|definition| Arc::new(SegmentTemplate::from_definition(definition)))
                .collect(),
            buildings: templates
                .buildings()
                .map(|definition| Arc::new(BuildingTemplate::from_definition(definition)))
                .collect(),
        }
    }

    pub fn segment(&self, id: &str) -> Option<&Arc<SegmentTemplate>> {
        self.segments.iter().find(|template| template.id == id)
    }

    pub fn building(&self, id: &str) -> Option<&Arc<BuildingTemplate>> {
        self.buildings.iter().find(|template| template.id == id)
    }

    /// Everything a linear chain may be built from, i.e. all but junctions.
    pub fn chain_segments(&self) -> impl Iterator<Item = &Arc<SegmentTemplate>> {
        self.segments.iter().filter(|template| !template.is_junction())
    }

    pub fn straights(&self) -> impl Iterator<Item = &Arc<SegmentTemplate>> {
        self.chain_segments().filter(|template| template.is_straight())
    }

    pub fn junction(&self) -> Option<&Arc<SegmentTemplate>> {
        self.segments.iter().find(|template| template.is_junction())
    }
}
