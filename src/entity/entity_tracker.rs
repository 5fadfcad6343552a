use crate::entity::components::objects::{Heading, Location, RoadFollower, Vehicle};
use crate::scene::node::Pose;
use crate::util::heading_of;
use hecs::{Entity, World};
use log::debug;

#[derive(Default)]
pub struct EntityTracker {
    world: World,
}

impl EntityTracker {
    pub fn new() -> Self {
        EntityTracker::default()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn spawn_vehicle(&mut self, name: &str, speed: f32, start: Pose) -> Entity {
        debug!("Spawning vehicle {} at {}", name, start.translation);
        self.world.spawn((
            Vehicle { name: name.to_string() },
            Location(start.translation),
            Heading(heading_of(start.rotation)),
            RoadFollower::new(speed),
        ))
    }

    pub fn location(&self, entity: Entity) -> Option<glam::Vec3> {
        self.world
            .get::<&Location>(entity)
            .ok()
            .map(|location| location.0)
    }

    pub fn heading(&self, entity: Entity) -> Option<f32> {
        self.world
            .get::<&Heading>(entity)
            .ok()
            .map(|heading| heading.0)
    }

    pub fn despawn(&mut self, entity: Entity) -> bool {
        self.world.despawn(entity).is_ok()
    }
}
