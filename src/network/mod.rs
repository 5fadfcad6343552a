//! Procedural road network: segments snapped together socket to socket, kept apart by a coarse
//! occupancy grid.

pub mod builder;
pub mod collision;
pub mod grid;
pub mod placer;
pub mod policy;
pub mod sockets;
pub mod state;
