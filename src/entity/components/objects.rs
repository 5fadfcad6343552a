use glam::Vec3;

pub struct Location(pub Vec3);

/// Yaw in radians, see [`crate::util::yaw_rotation`].
pub struct Heading(pub f32);

pub struct Vehicle {
    pub name: String,
}

/// Drives an entity along the active road chain. The segment it is on is the streaming window's
/// follower index, `progress` is the distance travelled within that segment.
pub struct RoadFollower {
    pub speed: f32,
    pub progress: f32,
}

impl RoadFollower {
    pub fn new(speed: f32) -> Self {
        Self { speed, progress: 0.0 }
    }
}
