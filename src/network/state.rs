use crate::network::grid::{GridCell, OccupancyGrid};
use crate::network::placer::Placement;
use crate::pool::PoolHandle;
use crate::pool::instances::InstancePools;
use crate::scene::node::Pose;
use crate::scene::template::SegmentTemplate;
use glam::Vec3;
use log::debug;
use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Placement index, handed out in commit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(pub u64);

impl Display for SegmentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchSide {
    Left,
    Right,
}

/// A branch chain that still has to be built, captured from a junction's branch socket.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchRequest {
    pub transform: Pose,
    pub side: BranchSide,
    pub length: usize,
    pub parent: SegmentId,
}

#[derive(Debug, Clone)]
pub struct PlacedSegment {
    pub id: SegmentId,
    pub template: Arc<SegmentTemplate>,
    pub instance: PoolHandle,
    pub placement: Placement,
    pub cells: Vec<GridCell>,
}

impl PlacedSegment {
    #[inline]
    pub fn entry(&self) -> Pose {
        self.placement.entry
    }

    #[inline]
    pub fn exit(&self) -> Option<Pose> {
        self.placement.exit
    }

    pub fn is_mirrored(&self) -> bool {
        self.placement.mirrored
    }

    /// Somewhere in the middle of the segment, used when nothing better is known.
    pub fn midpoint(&self) -> Vec3 {
        match self.exit() {
            Some(exit) => self.entry().translation.lerp(exit.translation, 0.5),
            None => self.entry().translation,
        }
    }
}

/// Segments that have been grown off a junction of the main chain.
#[derive(Debug, Clone)]
pub struct BranchChain {
    pub request: BranchRequest,
    pub segments: Vec<PlacedSegment>,
}

/// Everything the network builder mutates: the ordered main chain, branch chains and the grid.
#[derive(Debug)]
pub struct NetworkState {
    pub grid: OccupancyGrid,
    segments: VecDeque<PlacedSegment>,
    branches: Vec<BranchChain>,
    next_id: u64,
    origin: Pose,
}

impl NetworkState {
    pub fn new(cell_size: f32) -> Self {
        Self {
            grid: OccupancyGrid::new(cell_size),
            segments: VecDeque::new(),
            branches: Vec::new(),
            next_id: 0,
            origin: Pose::IDENTITY,
        }
    }

    pub fn with_origin(mut self, origin: Pose) -> Self {
        self.origin = origin;
        self
    }

    pub fn origin(&self) -> Pose {
        self.origin
    }

    /// Where the next main chain segment attaches. `None` if the newest segment has no exit.
    pub fn frontier(&self) -> Option<Pose> {
        match self.segments.back() {
            Some(segment) => segment.exit(),
            None => Some(self.origin),
        }
    }

    pub fn segments(&self) -> &VecDeque<PlacedSegment> {
        &self.segments
    }

    pub fn branches(&self) -> &[BranchChain] {
        &self.branches
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn branch_segment_count(&self) -> usize {
        self.branches.iter().map(|chain| chain.segments.len()).sum()
    }

    /// Ids of the `count` most recently committed main chain segments.
    pub fn recent_ids(&self, count: usize) -> Vec<SegmentId> {
        self.segments
            .iter()
            .rev()
            .take(count)
            .map(|segment| segment.id)
            .collect()
    }

    pub fn allocate_id(&mut self) -> SegmentId {
        let id = SegmentId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn commit(&mut self, segment: PlacedSegment) {
        self.grid.claim_all(&segment.cells, segment.id);
        self.segments.push_back(segment);
    }

    pub fn open_branch(&mut self, request: BranchRequest) -> usize {
        self.branches.push(BranchChain {
            request,
            segments: Vec::new(),
        });
        self.branches.len() - 1
    }

    pub fn commit_branch(&mut self, chain: usize, segment: PlacedSegment) {
        self.grid.claim_all(&segment.cells, segment.id);
        if let Some(chain) = self.branches.get_mut(chain) {
            chain.segments.push(segment);
        }
    }

    fn release_segment(grid: &mut OccupancyGrid, pools: &mut InstancePools, segment: &PlacedSegment) {
        grid.release_all(&segment.cells, segment.id);
        pools.release(&segment.template.id, segment.instance);
    }

    /// Retires the oldest main chain segment together with every branch hanging off it.
    pub fn retire_oldest(&mut self, pools: &mut InstancePools) -> Option<SegmentId> {
        let oldest = self.segments.pop_front()?;
        Self::release_segment(&mut self.grid, pools, &oldest);

        let grid = &mut self.grid;
        self.branches.retain(|chain| {
            if chain.request.parent != oldest.id {
                return true;
            }

            for segment in &chain.segments {
                Self::release_segment(grid, pools, segment);
            }
            false
        });

        debug!("Retired segment {} ({})", oldest.id, oldest.template.id);
        Some(oldest.id)
    }

    /// Releases everything back into the pools and starts over at the origin.
    pub fn clear(&mut self, pools: &mut InstancePools) {
        for segment in self.segments.drain(..) {
            Self::release_segment(&mut self.grid, pools, &segment);
        }

        for chain in self.branches.drain(..) {
            for segment in &chain.segments {
                Self::release_segment(&mut self.grid, pools, segment);
            }
        }

        self.grid.clear();
        self.next_id = 0;
    }

    /// Approximate road center at `z`: interpolated within the main chain segment spanning `z`, or
    /// the midpoint of the segment closest to it.
    pub fn road_center_at(&self, z: f32) -> Option<Vec3> {
        let spanning = self.segments.iter().find_map(|segment| {
            let start = segment.entry().translation;
            let end = segment.exit()?.translation;
            let (low, high) = if start.z <= end.z { (start.z, end.z) } else { (end.z, start.z) };

            if z < low || z > high || (high - low) <= f32::EPSILON {
                return None;
            }

            Some(start.lerp(end, (z - start.z) / (end.z - start.z)))
        });

        spanning.or_else(|| {
            self.segments
                .iter()
                .map(PlacedSegment::midpoint)
                .min_by(|a, b| (a.z - z).abs().total_cmp(&(b.z - z).abs()))
        })
    }
}
