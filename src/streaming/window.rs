//! Keeps a window of road (and buildings) around a moving reference position.

use crate::network::builder::{GenerationReport, LinearConfig, NetworkBuilder};
use crate::network::grid::GridConfig;
use crate::network::state::{NetworkState, PlacedSegment};
use crate::pool::PoolStats;
use crate::pool::instances::InstancePools;
use crate::random::RandomSource;
use crate::scene::node::Pose;
use crate::scene::template::TemplateSet;
use crate::streaming::buildings::BuildingStreamer;
use glam::Vec3;
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct StreamingConfig {
    /// Grow when the frontier is closer to the reference than this.
    pub spawn_ahead: f32,
    /// Retire the oldest segment once its exit is farther behind than this.
    pub despawn_behind: f32,
    pub min_segments: usize,
    /// Instances to pre-warm per segment template pool.
    pub prewarm: usize,
    pub grid: GridConfig,
    pub linear: LinearConfig,
    pub origin: Pose,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            spawn_ahead: 120.0,
            despawn_behind: 60.0,
            min_segments: 4,
            prewarm: 0,
            grid: GridConfig::default(),
            linear: LinearConfig::default(),
            origin: Pose::IDENTITY,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub grown: usize,
    pub retired: usize,
    pub buildings_spawned: usize,
    pub buildings_retired: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkStats {
    pub active_segments: usize,
    pub occupied_cells: usize,
    pub pool: PoolStats,
    pub buildings: PoolStats,
}

pub struct StreamingWindowManager {
    config: StreamingConfig,
    templates: Option<Arc<TemplateSet>>,
    state: NetworkState,
    pools: InstancePools,
    builder: NetworkBuilder,
    buildings: Option<BuildingStreamer>,
    /// Index into the active segments of whatever follows the road.
    follower_index: usize,
    growth_stalled: bool,
    disposed: bool,
}

impl StreamingWindowManager {
    pub fn new(config: StreamingConfig, rng: Box<dyn RandomSource>) -> Self {
        Self {
            state: NetworkState::new(config.grid.cell_size).with_origin(config.origin),
            pools: InstancePools::new().with_initial_size(config.prewarm),
            builder: NetworkBuilder::new(&config.grid, config.linear.clone(), rng),
            config,
            templates: None,
            buildings: None,
            follower_index: 0,
            growth_stalled: false,
            disposed: false,
        }
    }

    pub fn with_buildings(mut self, buildings: BuildingStreamer) -> Self {
        self.buildings = Some(buildings);
        self
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// Starts over with `templates`, building the first `initial_segment_count` segments.
    pub fn initialize(&mut self, templates: Arc<TemplateSet>, initial_segment_count: usize) -> GenerationReport {
        if self.disposed {
            warn!("Cannot initialize a disposed streaming window");
            return GenerationReport::default();
        }

        self.clear();
        let report = self
            .builder
            .build_linear(&mut self.state, &mut self.pools, &templates, initial_segment_count);
        info!(
            "Initialized the road with {} segments ({} rejected candidates)",
            report.committed, report.rejected
        );

        self.templates = Some(templates);
        report
    }

    /// Per tick: grow by at most one segment ahead of `reference`, then retire what fell behind.
    pub fn update(&mut self, reference: Vec3) -> TickReport {
        profiling::scope!("StreamingWindowManager::update");
        let mut report = TickReport::default();

        if self.disposed {
            return report;
        }

        let Some(templates) = self.templates.clone() else {
            return report;
        };

        let frontier = self.state.frontier();
        if frontier.is_some_and(|frontier| frontier.translation.distance(reference) < self.config.spawn_ahead) {
            let grown = self
                .builder
                .extend_one(&mut self.state, &mut self.pools, &templates);
            report.grown = grown.committed;

            if grown.committed > 0 {
                self.growth_stalled = false;
            } else if !self.growth_stalled {
                warn!("The road cannot grow any further at {} segments", self.state.len());
                self.growth_stalled = true;
            }
        }

        while self.state.len() > self.config.min_segments {
            let behind = self
                .state
                .segments()
                .front()
                .and_then(PlacedSegment::exit)
                .is_some_and(|exit| distance_behind(exit, reference) > self.config.despawn_behind);

            if !behind {
                break;
            }

            self.state.retire_oldest(&mut self.pools);
            self.follower_index = self.follower_index.saturating_sub(1);
            report.retired += 1;
        }

        if let Some(buildings) = self.buildings.as_mut() {
            let (spawned, retired) = buildings.update(reference, &templates, &self.state);
            report.buildings_spawned = spawned;
            report.buildings_retired = retired;
        }

        if report.grown > 0 || report.retired > 0 {
            debug!(
                "Tick at {}: +{} -{} segments, {} active",
                reference,
                report.grown,
                report.retired,
                self.state.len()
            );
        }

        report
    }

    pub fn active_segments(&self) -> &VecDeque<PlacedSegment> {
        self.state.segments()
    }

    pub fn state(&self) -> &NetworkState {
        &self.state
    }

    pub fn pools(&self) -> &InstancePools {
        &self.pools
    }

    pub fn buildings(&self) -> Option<&BuildingStreamer> {
        self.buildings.as_ref()
    }

    pub fn frontier(&self) -> Option<Pose> {
        self.state.frontier()
    }

    pub fn road_center_at(&self, z: f32) -> Option<Vec3> {
        self.state.road_center_at(z)
    }

    pub fn follower_index(&self) -> usize {
        self.follower_index
    }

    /// Clamped to the active segments.
    pub fn set_follower_index(&mut self, index: usize) {
        self.follower_index = index.min(self.state.len().saturating_sub(1));
    }

    pub fn stats(&self) -> NetworkStats {
        NetworkStats {
            active_segments: self.state.len(),
            occupied_cells: self.state.grid.occupied_count(),
            pool: self.pools.stats(),
            buildings: self
                .buildings
                .as_ref()
                .map(BuildingStreamer::stats)
                .unwrap_or_default(),
        }
    }

    /// Back to empty. Instances stay pooled for the next [`StreamingWindowManager::initialize`].
    pub fn clear(&mut self) {
        self.state.clear(&mut self.pools);
        self.builder.reset();
        if let Some(buildings) = self.buildings.as_mut() {
            buildings.clear();
        }

        self.templates = None;
        self.follower_index = 0;
        self.growth_stalled = false;
    }

    /// Frees every pooled instance for good. Later updates do nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }

        self.clear();
        self.pools.dispose();
        if let Some(buildings) = self.buildings.as_mut() {
            buildings.dispose();
        }

        self.disposed = true;
        info!("Disposed the streaming window");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// How far `reference` has moved past `exit`, measured along the road's heading there. Negative
/// while the reference is still before it.
fn distance_behind(exit: Pose, reference: Vec3) -> f32 {
    (reference - exit.translation).dot(exit.forward())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_behind_follows_the_heading() {
        let exit = Pose::from_translation_yaw(Vec3::new(0.0, 0.0, 20.0), 0.0);
        assert!((distance_behind(exit, Vec3::new(0.0, 0.0, 90.0)) - 70.0).abs() < 1.0e-5);
        assert!((distance_behind(exit, Vec3::new(30.0, 0.0, 20.0))).abs() < 1.0e-5);
        assert!(distance_behind(exit, Vec3::new(0.0, 0.0, -70.0)) < 0.0);
    }
}
