use roadsmith::network::builder::{LinearConfig, NetworkBuilder, SpineConfig};
use roadsmith::network::grid::GridConfig;
use roadsmith::network::state::{BranchSide, NetworkState};
use roadsmith::pool::instances::InstancePools;
use roadsmith::random::Mulberry32;
use roadsmith::scene::template::{SegmentTemplate, TemplateSet};

fn templates() -> TemplateSet {
    TemplateSet::new(
        vec![
            SegmentTemplate::straight("road_long", 20.0, 1.0),
            SegmentTemplate::junction("junction_cross", 20.0, 1.0),
        ],
        vec![],
    )
}

fn builder() -> NetworkBuilder {
    NetworkBuilder::new(
        &GridConfig::default(),
        LinearConfig::default(),
        Box::new(Mulberry32::new(0)),
    )
}

#[test_log::test]
fn golden_spine_for_seed_42() {
    let mut state = NetworkState::new(10.0);
    let mut pools = InstancePools::new();
    let config = SpineConfig {
        seed: 42,
        length: 20,
        junction_probability: 0.25,
        branch_length: 5,
        ..SpineConfig::default()
    };

    let report = builder().build_spine_and_branch(&mut state, &mut pools, &templates(), &config);

    assert_eq!(report.spine_segments, 20);
    assert_eq!(report.junction_positions, [5, 11, 15]);
    assert_eq!(report.branch_requests.len(), 6);
    assert_eq!(report.branch_lengths, [5; 6]);
    assert_eq!(state.len(), 20);
    assert_eq!(state.branches().len(), 6);
    assert_eq!(state.branch_segment_count(), 30);
    assert_eq!(pools.stats().in_use, 50);

    let sides = report
        .branch_requests
        .iter()
        .map(|request| request.side)
        .collect::<Vec<_>>();
    assert_eq!(
        sides,
        [
            BranchSide::Left,
            BranchSide::Right,
            BranchSide::Left,
            BranchSide::Right,
            BranchSide::Left,
            BranchSide::Right
        ]
    );

    for (request, position) in report.branch_requests.chunks(2).zip(report.junction_positions.iter()) {
        let parent = &state.segments()[*position];
        assert_eq!(parent.template.id, "junction_cross");
        assert!(request.iter().all(|request| request.parent == parent.id));
    }
}

#[test_log::test]
fn branch_chains_are_connected() {
    let mut state = NetworkState::new(10.0);
    let mut pools = InstancePools::new();
    builder().build_spine_and_branch(&mut state, &mut pools, &templates(), &SpineConfig::default());

    for chain in state.branches() {
        let first = chain.segments.first().expect("non-empty branch");
        assert!(first.entry().abs_diff_eq(&chain.request.transform, 1.0e-4));

        for (previous, next) in chain.segments.iter().zip(chain.segments.iter().skip(1)) {
            let exit = previous.exit().expect("exit");
            assert!(exit.abs_diff_eq(&next.entry(), 1.0e-4));
        }

        // branches leave the spine sideways
        let direction = chain.request.transform.forward();
        match chain.request.side {
            BranchSide::Left => assert!(direction.x > 0.99),
            BranchSide::Right => assert!(direction.x < -0.99),
        }
    }
}

#[test_log::test]
fn seeds_are_reproducible() {
    for (seed, expected) in [(7, vec![1usize, 2, 8, 12, 15]), (1337, vec![1usize, 2, 12, 15])] {
        for _ in 0..2 {
            let mut state = NetworkState::new(10.0);
            let mut pools = InstancePools::new();
            let config = SpineConfig {
                seed,
                ..SpineConfig::default()
            };
            let report = builder().build_spine_and_branch(&mut state, &mut pools, &templates(), &config);
            assert_eq!(report.junction_positions, expected);
            assert_eq!(report.branch_requests.len(), expected.len() * 2);
        }
    }
}

#[test_log::test]
fn branch_cells_are_claimed_and_released() {
    let mut state = NetworkState::new(10.0);
    let mut pools = InstancePools::new();
    builder().build_spine_and_branch(&mut state, &mut pools, &templates(), &SpineConfig::default());
    assert!(state.grid.occupied_count() > 0);

    while state.retire_oldest(&mut pools).is_some() {}
    assert!(state.branches().is_empty());
    assert_eq!(state.grid.occupied_count(), 0);
    assert_eq!(pools.stats().in_use, 0);
}

#[test_log::test]
fn junction_never_at_the_ends() {
    let mut state = NetworkState::new(10.0);
    let mut pools = InstancePools::new();
    let config = SpineConfig {
        length: 6,
        junction_probability: 1.0,
        branch_length: 1,
        ..SpineConfig::default()
    };
    let report = builder().build_spine_and_branch(&mut state, &mut pools, &templates(), &config);
    assert_eq!(report.junction_positions, [1, 2, 3, 4]);
    assert_eq!(state.segments()[0].template.id, "road_long");
    assert_eq!(state.segments()[5].template.id, "road_long");
}
