use clap::{Parser, Subcommand};
use glam::Vec3;

#[derive(Parser, Debug)]
#[command(name = "roadsmith")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Procedural road networks, streamed around a driving vehicle")]
pub struct CliArgs {
    /// Directory to load template sets from. Without it, the built-in sets are used.
    #[arg(long, env = "ROADSMITH_DATA_DIR")]
    pub data_dir: Option<String>,

    #[arg(long, default_value = "city.xml", env = "ROADSMITH_TEMPLATE_SET")]
    pub template_set: String,

    /// Seed for every random decision. Unseeded runs differ every time.
    #[arg(long)]
    pub seed: Option<u32>,

    /// Where the road starts, e.g. "(0, 0, 0)".
    #[arg(long, value_parser = parse_vec3)]
    pub origin: Option<Vec3>,

    #[arg(long, default_value_t = 2)]
    pub seam_tolerance: usize,

    #[command(subcommand)]
    pub operation_mode: OperationMode,
}

#[derive(Subcommand, Debug)]
pub enum OperationMode {
    /// Builds a single linear chain.
    Chain {
        #[arg(long, default_value_t = 20)]
        segments: usize,
        /// Use weighted single picks instead of the direction constrained shuffle.
        #[arg(long)]
        weighted: bool,
    },
    /// Builds a straight spine with branches off its junctions.
    Spine {
        #[arg(long, default_value_t = 20)]
        length: usize,
        #[arg(long, default_value_t = 0.25)]
        junction_probability: f64,
        #[arg(long, default_value_t = 5)]
        branch_length: usize,
    },
    /// Drives down an endless, streamed road.
    Drive {
        #[arg(long, default_value_t = 600)]
        ticks: usize,
        #[arg(long, default_value_t = 15.0)]
        speed: f32,
        #[arg(long, default_value_t = 8)]
        initial_segments: usize,
    },
}

/// Parses "x, y, z", optionally wrapped in parentheses, e.g. "(0, 0, -40)".
pub fn parse_vec3(input: &str) -> Result<Vec3, String> {
    let inner = input.trim();
    let inner = inner
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(inner);

    let components = inner
        .split(',')
        .map(|component| {
            component
                .trim()
                .parse::<f32>()
                .map_err(|err| format!("Invalid component {:?}: {}", component.trim(), err))
        })
        .collect::<Result<Vec<_>, _>>()?;

    <[f32; 3]>::try_from(components.as_slice())
        .map(Vec3::from_array)
        .map_err(|_| format!("Expected 3 components, got {}", components.len()))
}
