use clap::Parser;
use log::info;
use roadsmith::demos::DrivingDemo;
use roadsmith::io::template_library::TemplateLibrary;
use roadsmith::io::template_source::{EmbeddedTemplateSource, FsTemplateSource};
use roadsmith::network::builder::{LinearConfig, NetworkBuilder, SpineConfig};
use roadsmith::network::grid::GridConfig;
use roadsmith::network::policy::PolicyKind;
use roadsmith::network::state::NetworkState;
use roadsmith::pool::instances::InstancePools;
use roadsmith::random::{Mulberry32, RandomSource};
use roadsmith::scene::node::Pose;
use roadsmith::scene::template::TemplateSet;
use roadsmith::settings::{CliArgs, OperationMode};
use roadsmith::streaming::window::StreamingConfig;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    log::trace!("Starting with args: {:?}", args);

    // Loading is the only async part, there's no need for more than a single thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let library = TemplateLibrary::new();
    let templates = runtime.block_on(load_templates(&library, &args))?;

    let grid = GridConfig {
        seam_tolerance: args.seam_tolerance,
        ..GridConfig::default()
    };
    let origin = Pose::new(args.origin.unwrap_or_default(), Default::default());

    match args.operation_mode {
        OperationMode::Chain { segments, weighted } => {
            let policy = if weighted {
                PolicyKind::Weighted
            } else {
                PolicyKind::default()
            };
            let config = LinearConfig {
                policy,
                ..LinearConfig::default()
            };

            let mut state = NetworkState::new(grid.cell_size).with_origin(origin);
            let mut pools = InstancePools::new();
            let mut builder = NetworkBuilder::new(&grid, config, random_source(args.seed));
            let report = builder.build_linear(&mut state, &mut pools, &templates, segments);

            let frontier = state.frontier().map(|pose| pose.translation).unwrap_or_default();
            println!(
                "Placed {} of {} segments ({} rejected candidates), frontier at {}",
                report.committed, segments, report.rejected, frontier
            );
        }
        OperationMode::Spine {
            length,
            junction_probability,
            branch_length,
        } => {
            let config = SpineConfig {
                seed: args.seed.unwrap_or(SpineConfig::default().seed),
                length,
                junction_probability,
                branch_length,
                ..SpineConfig::default()
            };

            let mut state = NetworkState::new(grid.cell_size).with_origin(origin);
            let mut pools = InstancePools::new();
            let mut builder = NetworkBuilder::new(&grid, LinearConfig::default(), random_source(args.seed));
            let report = builder.build_spine_and_branch(&mut state, &mut pools, &templates, &config);

            println!(
                "Spine of {} segments, junctions at {:?}, branch lengths {:?}",
                report.spine_segments, report.junction_positions, report.branch_lengths
            );
        }
        OperationMode::Drive {
            ticks,
            speed,
            initial_segments,
        } => {
            let config = StreamingConfig {
                grid,
                origin,
                ..StreamingConfig::default()
            };

            let building_seed = args.seed.map(|seed| seed.wrapping_add(1));
            let mut demo = DrivingDemo::new(
                templates,
                config,
                initial_segments,
                speed,
                random_source(args.seed),
                random_source(building_seed),
            );

            // fixed 60 Hz steps
            let summary = demo.run(ticks, 1.0 / 60.0);
            println!(
                "Drove to {} in {} ticks, {} segments active at most, road pool {:?}, building pool {:?}",
                summary.final_position,
                summary.ticks,
                summary.max_active_segments,
                summary.stats.pool,
                summary.stats.buildings
            );
            demo.dispose();
        }
    }

    Ok(())
}

async fn load_templates(library: &TemplateLibrary, args: &CliArgs) -> anyhow::Result<Arc<TemplateSet>> {
    match &args.data_dir {
        Some(data_dir) => {
            info!("Loading {} from {}", args.template_set, data_dir);
            library
                .load_set(&FsTemplateSource::new(data_dir), &args.template_set)
                .await
        }
        None => {
            info!("Loading the built-in template set {}", args.template_set);
            library
                .load_set(&EmbeddedTemplateSource, &args.template_set)
                .await
        }
    }
}

fn random_source(seed: Option<u32>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(Mulberry32::new(seed)),
        None => Box::new(rand::rng()),
    }
}
