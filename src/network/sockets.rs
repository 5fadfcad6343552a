//! Connection points ("sockets") of segment templates.
//!
//! Socket nodes are matched by name exactly once, when a template is loaded, into a [`SocketTable`].
//! Placement only ever looks up the table by [`SocketRole`].

use crate::scene::node::{Pose, SceneNode};
use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketRole {
    Entry,
    Exit,
    BranchLeft,
    BranchRight,
}

impl SocketRole {
    pub const ALL: [SocketRole; 4] = [
        SocketRole::Entry,
        SocketRole::Exit,
        SocketRole::BranchLeft,
        SocketRole::BranchRight,
    ];

    /// The (lowercase) fragment a node name has to contain to serve as this socket.
    pub fn name_fragment(self) -> &'static str {
        match self {
            SocketRole::Entry => "entry",
            SocketRole::Exit => "exit",
            SocketRole::BranchLeft => "left",
            SocketRole::BranchRight => "right",
        }
    }

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

/// Role to local transform lookup of a single template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SocketTable {
    sockets: [Option<Pose>; 4],
}

impl SocketTable {
    /// Matches named nodes against the socket roles, case-insensitive. The first match per role wins.
    pub fn resolve<'a>(nodes: impl IntoIterator<Item = (&'a str, Pose)>) -> Self {
        let mut table = SocketTable::default();

        for (name, pose) in nodes {
            let name = name.to_lowercase();
            for role in SocketRole::ALL {
                if table.sockets[role.slot()].is_none() && name.contains(role.name_fragment()) {
                    trace!("Node {} resolves the {:?} socket", name, role);
                    table.sockets[role.slot()] = Some(pose);
                }
            }
        }

        table
    }

    pub fn with(mut self, role: SocketRole, pose: Pose) -> Self {
        self.sockets[role.slot()] = Some(pose);
        self
    }

    #[inline]
    pub fn local(&self, role: SocketRole) -> Option<Pose> {
        self.sockets[role.slot()]
    }

    /// Templates without an entry socket are attached at their origin.
    #[inline]
    pub fn entry_or_origin(&self) -> Pose {
        self.local(SocketRole::Entry).unwrap_or(Pose::IDENTITY)
    }

    pub fn has_branches(&self) -> bool {
        self.local(SocketRole::BranchLeft).is_some() && self.local(SocketRole::BranchRight).is_some()
    }
}

/// World space transform of a socket of a placed instance.
///
/// Refreshes the world matrix of `node` first, reading the cached one after a `set_transform` would
/// yield the previous placement. A missing entry falls back to the instance origin, any other missing
/// socket is `None`.
pub fn resolve_world(node: &mut SceneNode, table: &SocketTable, role: SocketRole) -> Option<Pose> {
    let world = node.update_world_matrix();

    let local = match role {
        SocketRole::Entry => table.entry_or_origin(),
        _ => table.local(role)?,
    };

    let local = if node.is_mirrored() {
        // The scale is applied by the world matrix already, only the rotation needs reflecting.
        Pose::new(local.translation, local.mirrored_x().rotation)
    } else {
        local
    };

    Some(Pose::new(
        world.transform_point3(local.translation),
        (node.rotation() * local.rotation).normalize(),
    ))
}
