use roadsmith::network::builder::{LinearConfig, NetworkBuilder};
use roadsmith::network::grid::{GridCell, GridConfig};
use roadsmith::network::policy::PolicyKind;
use roadsmith::network::state::{NetworkState, SegmentId};
use roadsmith::pool::instances::InstancePools;
use roadsmith::random::Mulberry32;
use roadsmith::scene::template::{SegmentTemplate, TemplateSet};
use std::collections::HashSet;
use std::f32::consts::{FRAC_PI_4, FRAC_PI_6};

fn builder(policy: PolicyKind, seed: u32) -> NetworkBuilder {
    let config = LinearConfig {
        policy,
        ..LinearConfig::default()
    };
    NetworkBuilder::new(&GridConfig::default(), config, Box::new(Mulberry32::new(seed)))
}

fn curvy_templates() -> TemplateSet {
    TemplateSet::new(
        vec![
            SegmentTemplate::straight("road_long", 20.0, 3.0),
            SegmentTemplate::straight("road_short", 10.0, 2.0),
            SegmentTemplate::curve("curve_30", 30.0, FRAC_PI_6, 1.0).with_mirrorable(true),
            SegmentTemplate::curve("curve_45", 25.0, FRAC_PI_4, 1.0).with_mirrorable(true),
        ],
        vec![],
    )
}

fn assert_connected(state: &NetworkState) {
    for (previous, next) in state.segments().iter().zip(state.segments().iter().skip(1)) {
        let exit = previous.exit().expect("committed segments have an exit");
        assert!(
            exit.abs_diff_eq(&next.entry(), 1.0e-4),
            "{} does not continue {}: {:?} vs {:?}",
            next.id,
            previous.id,
            next.entry(),
            exit
        );
    }
}

fn assert_no_illegal_overlap(state: &NetworkState, tolerance: usize) {
    let segments = state.segments();
    for i in 0..segments.len() {
        let cells = segments[i].cells.iter().collect::<HashSet<_>>();
        for j in (i + tolerance + 1)..segments.len() {
            let shared = segments[j].cells.iter().filter(|cell| cells.contains(cell)).count();
            assert_eq!(shared, 0, "segments {} and {} share {} cells", i, j, shared);
        }
    }
}

#[test_log::test]
fn twenty_straight_segments() {
    let templates = TemplateSet::new(
        vec![
            SegmentTemplate::straight("long", 20.0, 1.0),
            SegmentTemplate::straight("short", 10.0, 1.0),
        ],
        vec![],
    );

    for policy in [PolicyKind::Weighted, PolicyKind::default()] {
        let mut state = NetworkState::new(10.0);
        let mut pools = InstancePools::new();
        let report = builder(policy, 11).build_linear(&mut state, &mut pools, &templates, 20);

        assert_eq!(report.committed, 20);
        assert_eq!(report.rejected, 0);
        assert!(!report.aborted);
        assert_eq!(state.len(), 20);
        assert_eq!(pools.stats().in_use, 20);

        let expected = state
            .segments()
            .iter()
            .map(|segment| segment.template.span)
            .sum::<f32>();
        let frontier = state.frontier().expect("frontier").translation;
        assert!((frontier.length() - expected).abs() < 1.0e-3);
        assert!(frontier.x.abs() < 1.0e-4);
        assert!(frontier.z > 0.0);

        assert_connected(&state);
        assert_no_illegal_overlap(&state, 2);
    }
}

#[test_log::test]
fn curvy_chain_stays_connected_and_disjoint() {
    let templates = curvy_templates();

    for seed in [1, 42, 1337, 2024] {
        let mut state = NetworkState::new(10.0);
        let mut pools = InstancePools::new();
        let report = builder(PolicyKind::default(), seed).build_linear(&mut state, &mut pools, &templates, 60);

        assert!(report.committed > 0);
        assert_eq!(report.committed, state.len());
        assert_eq!(pools.stats().in_use, state.len());
        assert_connected(&state);
        assert_no_illegal_overlap(&state, 2);
    }
}

#[test_log::test]
fn weighted_chain_recovers_from_collisions() {
    let templates = curvy_templates();
    let mut state = NetworkState::new(10.0);
    let mut pools = InstancePools::new();
    let report = builder(PolicyKind::Weighted, 9).build_linear(&mut state, &mut pools, &templates, 40);

    assert_eq!(report.committed, state.len());
    assert_connected(&state);
    assert_no_illegal_overlap(&state, 2);
    // rejected candidates went back into their pools
    assert_eq!(pools.stats().in_use, state.len());
}

#[test_log::test]
fn curves_follow_the_direction_rules() {
    let templates = curvy_templates();
    let (min_straights, max_run) = (2, 1);
    let policy = PolicyKind::DirectionConstrained {
        min_straights_between_curves: min_straights,
        max_same_direction_run: max_run,
    };

    for seed in [3, 5, 8, 13] {
        let mut state = NetworkState::new(10.0);
        let mut pools = InstancePools::new();
        builder(policy, seed).build_linear(&mut state, &mut pools, &templates, 50);

        let mut straights = 0;
        let mut last_direction = 0;
        let mut run = 0;
        let mut curves = 0;
        for segment in state.segments() {
            let direction = segment.template.direction(segment.is_mirrored());
            if direction == 0 {
                straights += 1;
                continue;
            }

            curves += 1;
            assert!(straights >= min_straights, "only {} straights before a curve", straights);
            if direction == last_direction {
                run += 1;
            } else {
                last_direction = direction;
                run = 1;
            }
            assert!(run <= max_run, "{} curves in a row turning {}", run, direction);
            straights = 0;
        }
        assert!(curves > 0, "seed {} produced no curves at all", seed);
    }
}

#[test_log::test]
fn road_center_interpolates_along_the_chain() {
    let templates = TemplateSet::new(vec![SegmentTemplate::straight("long", 20.0, 1.0)], vec![]);
    let mut state = NetworkState::new(10.0);
    let mut pools = InstancePools::new();
    builder(PolicyKind::Weighted, 1).build_linear(&mut state, &mut pools, &templates, 5);

    let center = state.road_center_at(35.0).expect("road");
    assert!(center.abs_diff_eq(glam::Vec3::new(0.0, 0.0, 35.0), 1.0e-4));

    // beyond the frontier, the closest segment's midpoint
    let center = state.road_center_at(500.0).expect("road");
    assert!(center.abs_diff_eq(glam::Vec3::new(0.0, 0.0, 90.0), 1.0e-4));
}

#[test_log::test]
fn blocked_frontier_aborts_the_run() {
    let templates = TemplateSet::new(vec![SegmentTemplate::straight("long", 20.0, 1.0)], vec![]);
    let mut state = NetworkState::new(10.0);
    let mut pools = InstancePools::new();
    // something foreign sits right in front of the origin
    state.grid.claim(GridCell::new(0, 1), SegmentId(u64::MAX));

    let report = builder(PolicyKind::default(), 1).build_linear(&mut state, &mut pools, &templates, 3);
    assert!(report.aborted);
    assert_eq!(report.committed, 0);
    assert_eq!(report.rejected, 1);
    assert_eq!(pools.stats().in_use, 0);
}

const FOREIGN: SegmentId = SegmentId(u64::MAX);

/// Almost always rolls the curve, which bends into x cell 1 (or -1 mirrored).
fn curve_heavy_templates() -> TemplateSet {
    TemplateSet::new(
        vec![
            SegmentTemplate::straight("road_long", 20.0, 0.001),
            SegmentTemplate::curve("curve_45", 25.0, FRAC_PI_4, 1000.0).with_mirrorable(true),
        ],
        vec![],
    )
}

fn weighted_builder(config: LinearConfig) -> NetworkBuilder {
    NetworkBuilder::new(&GridConfig::default(), config, Box::new(Mulberry32::new(21)))
}

#[test_log::test]
fn failing_curves_fall_back_to_straights() {
    let mut state = NetworkState::new(10.0);
    let mut pools = InstancePools::new();
    for z in 0..20 {
        state.grid.claim(GridCell::new(1, z), FOREIGN);
        state.grid.claim(GridCell::new(-1, z), FOREIGN);
    }

    let config = LinearConfig {
        policy: PolicyKind::Weighted,
        straight_fallback_after: 2,
        max_consecutive_failures: 6,
        ..LinearConfig::default()
    };
    let report = weighted_builder(config).build_linear(&mut state, &mut pools, &curve_heavy_templates(), 5);

    assert!(!report.aborted);
    assert_eq!(report.committed, 5);
    // two rolled curves per step before only straights are offered
    assert_eq!(report.rejected, 10);
    assert!(state.segments().iter().all(|segment| segment.template.is_straight()));
    assert_eq!(pools.stats().in_use, 5);
    assert_connected(&state);
}

#[test_log::test]
fn consecutive_failures_end_the_run() {
    let mut state = NetworkState::new(10.0);
    let mut pools = InstancePools::new();
    // every footprint starts in the origin cell
    state.grid.claim(GridCell::new(0, 0), FOREIGN);

    let config = LinearConfig {
        policy: PolicyKind::Weighted,
        max_consecutive_failures: 6,
        ..LinearConfig::default()
    };
    let report = weighted_builder(config).build_linear(&mut state, &mut pools, &curve_heavy_templates(), 5);

    assert!(report.aborted);
    assert_eq!(report.committed, 0);
    assert_eq!(report.rejected, 7);
    assert!(state.is_empty());
    assert_eq!(pools.stats().in_use, 0);
}

#[test_log::test]
fn attempts_are_bounded() {
    let mut state = NetworkState::new(10.0);
    let mut pools = InstancePools::new();
    state.grid.claim(GridCell::new(0, 0), FOREIGN);

    let config = LinearConfig {
        policy: PolicyKind::Weighted,
        max_attempts: 3,
        max_consecutive_failures: 100,
        ..LinearConfig::default()
    };
    let report = weighted_builder(config).build_linear(&mut state, &mut pools, &curve_heavy_templates(), 5);

    assert!(report.aborted);
    assert_eq!(report.rejected, 3);
    assert_eq!(pools.stats().in_use, 0);
}
