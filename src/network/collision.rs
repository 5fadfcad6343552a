use crate::network::grid::{GridCell, GridConfig, OccupancyGrid};
use crate::network::placer::Placement;
use crate::network::state::SegmentId;
use crate::util::{heading_of, sample_arc_xz};
use itertools::Itertools;
use log::trace;

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The candidate fits; these are the cells to claim, in sampling order.
    Accept { cells: Vec<GridCell> },
    Reject { cell: GridCell, owner: SegmentId },
    /// No exit socket, only the entry could be sampled. The chain can't continue past it.
    Degenerate { cells: Vec<GridCell> },
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accept { .. })
    }
}

#[derive(Debug, Clone)]
pub struct CollisionAdjudicator {
    sample_spacing: f32,
    seam_tolerance: usize,
}

impl CollisionAdjudicator {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            sample_spacing: config.sample_spacing,
            seam_tolerance: config.seam_tolerance,
        }
    }

    /// Number of recently committed segments a candidate may overlap with.
    pub fn seam_tolerance(&self) -> usize {
        self.seam_tolerance
    }

    /// The distinct cells covered by the midline of `placement`, in sampling order.
    pub fn footprint(&self, placement: &Placement, grid: &OccupancyGrid) -> Vec<GridCell> {
        let entry = placement.entry;
        let Some(exit) = placement.exit else {
            return vec![grid.cell_at(entry.translation)];
        };

        sample_arc_xz(
            entry.translation,
            heading_of(entry.rotation),
            exit.translation,
            placement.turn(),
            self.sample_spacing,
        )
        .into_iter()
        .map(|point| grid.cell_at(point))
        .unique()
        .collect()
    }

    /// Checks `placement` against everything in `grid`. Cells claimed only by `tolerated` segments
    /// (the most recent ones of the chain) don't count as collision, any other owner does.
    pub fn evaluate(&self, placement: &Placement, grid: &OccupancyGrid, tolerated: &[SegmentId]) -> Verdict {
        profiling::scope!("CollisionAdjudicator::evaluate");
        let cells = self.footprint(placement, grid);

        if placement.exit.is_none() {
            return Verdict::Degenerate { cells };
        }

        for cell in &cells {
            if let Some(owner) = grid
                .owners(*cell)
                .iter()
                .find(|owner| !tolerated.contains(owner))
            {
                trace!("Candidate overlaps {} at {:?}", owner, cell);
                return Verdict::Reject {
                    cell: *cell,
                    owner: *owner,
                };
            }
        }

        Verdict::Accept { cells }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::placer::place;
    use crate::scene::node::Pose;
    use crate::scene::template::SegmentTemplate;
    use glam::Vec3;

    fn placement_at(template: &SegmentTemplate, z: f32) -> Placement {
        let mut instance = template.prototype.deep_clone();
        place(template, &mut instance, Pose::new(Vec3::new(0.0, 0.0, z), Default::default()), false)
    }

    #[test]
    fn footprint_of_a_straight() {
        let adjudicator = CollisionAdjudicator::new(&GridConfig::default());
        let grid = OccupancyGrid::new(10.0);
        let template = SegmentTemplate::straight("long", 20.0, 1.0);

        let cells = adjudicator.footprint(&placement_at(&template, 0.0), &grid);
        assert_eq!(cells, [GridCell::new(0, 0), GridCell::new(0, 1), GridCell::new(0, 2)]);
    }

    #[test]
    fn seam_window_is_tolerated() {
        let adjudicator = CollisionAdjudicator::new(&GridConfig::default());
        let mut grid = OccupancyGrid::new(10.0);
        let template = SegmentTemplate::straight("long", 20.0, 1.0);
        grid.claim(GridCell::new(0, 2), SegmentId(0));

        let placement = placement_at(&template, 20.0);
        assert!(adjudicator.evaluate(&placement, &grid, &[SegmentId(0)]).is_accepted());
        assert_eq!(
            adjudicator.evaluate(&placement, &grid, &[SegmentId(1), SegmentId(2)]),
            Verdict::Reject {
                cell: GridCell::new(0, 2),
                owner: SegmentId(0)
            }
        );
    }

    #[test]
    fn missing_exit_is_degenerate() {
        use crate::network::sockets::SocketTable;
        use crate::scene::template::CurveKind;

        let adjudicator = CollisionAdjudicator::new(&GridConfig::default());
        let grid = OccupancyGrid::new(10.0);
        let template = SegmentTemplate::new("stub", 1.0, CurveKind::Straight, 8.0, SocketTable::default());

        assert_eq!(
            adjudicator.evaluate(&placement_at(&template, 0.0), &grid, &[]),
            Verdict::Degenerate {
                cells: vec![GridCell::new(0, 0)]
            }
        );
    }
}
