//! Buildings lining the road, streamed in sections along the travel axis (+Z).

use crate::network::grid::OccupancyGrid;
use crate::network::policy::weighted_pick;
use crate::network::state::NetworkState;
use crate::pool::instances::InstancePools;
use crate::pool::{PoolHandle, PoolStats};
use crate::random::RandomSource;
use crate::scene::template::{BuildingTemplate, TemplateSet};
use glam::{Quat, Vec3};
use log::trace;
use std::collections::VecDeque;
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct BuildingConfig {
    pub section_length: f32,
    pub lot_spacing: f32,
    /// Distance between the road center and a building's center.
    pub setback: f32,
    pub spawn_ahead: f32,
    pub despawn_behind: f32,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        Self {
            section_length: 60.0,
            lot_spacing: 15.0,
            setback: 14.0,
            spawn_ahead: 120.0,
            despawn_behind: 60.0,
        }
    }
}

#[derive(Debug)]
struct BuildingSection {
    index: i64,
    buildings: Vec<(Arc<BuildingTemplate>, PoolHandle)>,
}

pub struct BuildingStreamer {
    config: BuildingConfig,
    sections: VecDeque<BuildingSection>,
    pools: InstancePools,
    rng: Box<dyn RandomSource>,
}

impl BuildingStreamer {
    pub fn new(config: BuildingConfig, rng: Box<dyn RandomSource>) -> Self {
        Self {
            config,
            sections: VecDeque::new(),
            pools: InstancePools::new(),
            rng,
        }
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn building_count(&self) -> usize {
        self.sections.iter().map(|section| section.buildings.len()).sum()
    }

    pub fn stats(&self) -> PoolStats {
        self.pools.stats()
    }

    /// World space footprint centers of every active building.
    pub fn positions(&self) -> Vec<(String, Vec3)> {
        self.sections
            .iter()
            .flat_map(|section| section.buildings.iter())
            .filter_map(|(template, handle)| {
                let node = self.pools.node(&template.id, *handle)?;
                Some((template.id.clone(), node.translation()))
            })
            .collect()
    }

    /// Populates at most one section ahead and retires every section that fell behind. Returns the
    /// number of buildings spawned and retired.
    pub fn update(&mut self, reference: Vec3, templates: &TemplateSet, road: &NetworkState) -> (usize, usize) {
        profiling::scope!("BuildingStreamer::update");
        let length = self.config.section_length;
        let mut spawned = 0;

        let next_index = self
            .sections
            .back()
            .map(|section| section.index + 1)
            .unwrap_or_else(|| (reference.z / length).floor() as i64);
        let next_start = next_index as f32 * length;
        let road_end = road.frontier().map(|frontier| frontier.translation.z);

        // The road has to cover the whole section, otherwise we don't know where its center is.
        if next_start < reference.z + self.config.spawn_ahead && road_end.is_some_and(|z| z >= next_start + length) {
            let section = self.populate(next_index, templates, road);
            spawned = section.buildings.len();
            self.sections.push_back(section);
        }

        let mut retired = 0;
        while let Some(section) = self.sections.front() {
            let section_end = (section.index + 1) as f32 * length;
            if section_end >= reference.z - self.config.despawn_behind {
                break;
            }

            if let Some(section) = self.sections.pop_front() {
                retired += section.buildings.len();
                self.release_section(section);
            }
        }

        (spawned, retired)
    }

    fn populate(&mut self, index: i64, templates: &TemplateSet, road: &NetworkState) -> BuildingSection {
        let mut section = BuildingSection {
            index,
            buildings: Vec::new(),
        };

        let lots = (self.config.section_length / self.config.lot_spacing).floor().max(1.0) as usize;
        let start = index as f32 * self.config.section_length;

        for lot in 0..lots {
            let z = start + (lot as f32 + 0.5) * self.config.lot_spacing;
            let Some(center) = road.road_center_at(z) else {
                continue;
            };

            for side in [1.0f32, -1.0] {
                let Some(template) = weighted_pick(&templates.buildings, |t| t.weight, self.rng.as_mut()).cloned()
                else {
                    return section;
                };

                let position = Vec3::new(center.x + side * self.config.setback, center.y, z);
                if Self::overlaps_road(&template, position, &road.grid) {
                    trace!("Skipping lot at {}, it overlaps the road", position);
                    continue;
                }

                let handle = self.pools.acquire(&template.id, &template.prototype);
                if let Some(node) = self.pools.node_mut(&template.id, handle) {
                    // facing the road
                    node.set_transform(position, Quat::from_rotation_y(-side * FRAC_PI_2), Vec3::ONE);
                    node.update_world_matrix();
                    node.set_visible(true);
                }
                section.buildings.push((template, handle));
            }
        }

        section
    }

    /// Whether any cell under the footprint (rotated to face the road, so the width runs along Z) is
    /// claimed by road.
    fn overlaps_road(template: &BuildingTemplate, position: Vec3, grid: &OccupancyGrid) -> bool {
        let half = Vec3::new(template.depth * 0.5, 0.0, template.width * 0.5);
        let step = grid.cell_size() * 0.5;
        let steps_x = ((half.x * 2.0) / step).ceil() as usize;
        let steps_z = ((half.z * 2.0) / step).ceil() as usize;

        (0..=steps_x).any(|ix| {
            (0..=steps_z).any(|iz| {
                let offset = Vec3::new(
                    (-half.x + ix as f32 * step).min(half.x),
                    0.0,
                    (-half.z + iz as f32 * step).min(half.z),
                );
                grid.is_occupied(grid.cell_at(position + offset))
            })
        })
    }

    fn release_section(&mut self, section: BuildingSection) {
        for (template, handle) in section.buildings {
            self.pools.release(&template.id, handle);
        }
    }

    pub fn clear(&mut self) {
        while let Some(section) = self.sections.pop_front() {
            self.release_section(section);
        }
    }

    pub fn dispose(&mut self) {
        self.clear();
        self.pools.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::grid::GridCell;
    use crate::network::state::SegmentId;

    #[test]
    fn footprint_check_sees_road_cells() {
        let template = BuildingTemplate::new("block", 1.0, 12.0, 10.0, 20.0);
        let mut grid = OccupancyGrid::new(10.0);
        grid.claim(GridCell::new(0, 3), SegmentId(0));

        assert!(!BuildingStreamer::overlaps_road(&template, Vec3::new(14.0, 0.0, 30.0), &grid));
        assert!(BuildingStreamer::overlaps_road(&template, Vec3::new(6.0, 0.0, 30.0), &grid));
        assert!(!BuildingStreamer::overlaps_road(&template, Vec3::new(0.0, 0.0, 60.0), &grid));
    }
}
