use crate::entity::components::objects::{Heading, Location, RoadFollower};
use crate::streaming::window::StreamingWindowManager;
use crate::util::heading_of;
use hecs::World;
use log::trace;

#[derive(Default)]
pub struct FollowerSystem {}

impl FollowerSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves every road follower along the active chain, advancing the manager's follower index
    /// whenever a segment has been driven to its end. Followers wait at the frontier if the road
    /// hasn't grown far enough yet.
    pub fn update(&self, world: &mut World, manager: &mut StreamingWindowManager, delta_time: f32) {
        profiling::scope!("FollowerSystem::update");

        for (entity, (follower, location, heading)) in
            world.query_mut::<(&mut RoadFollower, &mut Location, &mut Heading)>()
        {
            follower.progress += follower.speed * delta_time;

            loop {
                let index = manager.follower_index();
                let segments = manager.active_segments();
                let Some(segment) = segments.get(index) else {
                    break;
                };
                let Some(exit) = segment.exit() else {
                    break;
                };

                let entry = segment.entry();
                let length = entry.translation.distance(exit.translation);
                if length <= f32::EPSILON {
                    break;
                }

                if follower.progress >= length && index + 1 < segments.len() {
                    follower.progress -= length;
                    manager.set_follower_index(index + 1);
                    trace!("{:?} entered segment {}", entity, index + 1);
                    continue;
                }

                follower.progress = follower.progress.min(length);
                let t = follower.progress / length;
                location.0 = entry.translation.lerp(exit.translation, t);
                heading.0 = heading_of(entry.rotation.slerp(exit.rotation, t));
                break;
            }
        }
    }
}
