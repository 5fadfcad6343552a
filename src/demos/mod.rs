//! A headless stand-in for the interactive viewer: one vehicle driving down an endless road.

use crate::entity::entity_tracker::EntityTracker;
use crate::entity::systems::follower_system::FollowerSystem;
use crate::random::RandomSource;
use crate::scene::template::TemplateSet;
use crate::streaming::buildings::{BuildingConfig, BuildingStreamer};
use crate::streaming::window::{NetworkStats, StreamingConfig, StreamingWindowManager, TickReport};
use glam::Vec3;
use hecs::Entity;
use log::{info, warn};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemoSummary {
    pub ticks: usize,
    pub grown: usize,
    pub retired: usize,
    pub buildings_spawned: usize,
    pub buildings_retired: usize,
    pub max_active_segments: usize,
    pub final_position: Vec3,
    pub stats: NetworkStats,
}

pub struct DrivingDemo {
    manager: StreamingWindowManager,
    entities: EntityTracker,
    follower_system: FollowerSystem,
    vehicle: Entity,
}

impl DrivingDemo {
    pub fn new(
        templates: Arc<TemplateSet>,
        config: StreamingConfig,
        initial_segments: usize,
        speed: f32,
        road_rng: Box<dyn RandomSource>,
        building_rng: Box<dyn RandomSource>,
    ) -> Self {
        let origin = config.origin;
        let mut manager = StreamingWindowManager::new(config, road_rng)
            .with_buildings(BuildingStreamer::new(BuildingConfig::default(), building_rng));

        let report = manager.initialize(templates, initial_segments);
        if report.aborted {
            warn!(
                "Only {} of {} initial segments could be placed",
                report.committed, initial_segments
            );
        }

        let mut entities = EntityTracker::new();
        let vehicle = entities.spawn_vehicle("car", speed, origin);

        Self {
            manager,
            entities,
            follower_system: FollowerSystem::new(),
            vehicle,
        }
    }

    pub fn manager(&self) -> &StreamingWindowManager {
        &self.manager
    }

    pub fn vehicle_position(&self) -> Option<Vec3> {
        self.entities.location(self.vehicle)
    }

    /// Moves the vehicle, then streams the world around its new position.
    pub fn tick(&mut self, delta_time: f32) -> TickReport {
        self.follower_system
            .update(self.entities.world_mut(), &mut self.manager, delta_time);

        match self.vehicle_position() {
            Some(position) => self.manager.update(position),
            None => TickReport::default(),
        }
    }

    pub fn run(&mut self, ticks: usize, delta_time: f32) -> DemoSummary {
        let mut summary = DemoSummary::default();

        for _ in 0..ticks {
            let report = self.tick(delta_time);
            summary.ticks += 1;
            summary.grown += report.grown;
            summary.retired += report.retired;
            summary.buildings_spawned += report.buildings_spawned;
            summary.buildings_retired += report.buildings_retired;
            summary.max_active_segments = summary.max_active_segments.max(self.manager.active_segments().len());
        }

        summary.final_position = self.vehicle_position().unwrap_or_default();
        summary.stats = self.manager.stats();
        info!(
            "Drove {} ticks to {}: {} segments grown, {} retired, {} active at most",
            summary.ticks, summary.final_position, summary.grown, summary.retired, summary.max_active_segments
        );
        summary
    }

    pub fn dispose(&mut self) {
        self.entities.despawn(self.vehicle);
        self.manager.dispose();
    }
}
