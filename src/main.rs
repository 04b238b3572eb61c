use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ndarray::Array3;
use std::path::PathBuf;
use volume_graphcut::config::{
    BoundaryDirection, Connectivity, NoiseStatistic, RegionTerm, SegmentationConfig, SigmaPolicy,
};
use volume_graphcut::report::{save_summary, SegmentationSummary};
use volume_graphcut::{segment, VoxelIndex};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum RegionMode {
    None,
    Threshold,
    Histogram,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Direction {
    None,
    BrightToDark,
    DarkToBright,
}

#[derive(Parser, Debug)]
#[clap(
    name = "volume-graphcut",
    about = "Graph-cut segmentation of a synthetic sphere phantom"
)]
struct Cli {
    /// Edge length of the cubic phantom volume
    #[clap(long, default_value = "32")]
    size: usize,

    /// Intensity inside the sphere
    #[clap(long, default_value = "180")]
    object_intensity: u16,

    /// Intensity of the surrounding background
    #[clap(long, default_value = "60")]
    background_intensity: u16,

    /// Amplitude of the deterministic texture added to every voxel
    #[clap(long, default_value = "15")]
    texture: u16,

    /// JSON configuration file; command line flags are applied on top
    #[clap(long)]
    config: Option<PathBuf>,

    /// Weight of the regional term
    #[clap(long)]
    lambda: Option<f64>,

    /// Fixed boundary-term sigma (estimated from the volume when omitted)
    #[clap(long)]
    sigma: Option<f64>,

    /// Use the median instead of the mean when estimating sigma
    #[clap(long)]
    median_noise: bool,

    /// Number of histogram bins
    #[clap(long)]
    bins: Option<usize>,

    /// Regional term
    #[clap(long, value_enum)]
    region_term: Option<RegionMode>,

    /// Threshold for the threshold regional term
    #[clap(long, default_value = "120")]
    threshold: f64,

    /// Preferred boundary direction
    #[clap(long, value_enum)]
    direction: Option<Direction>,

    /// Neighborhood size (6, 18 or 26)
    #[clap(long)]
    connectivity: Option<u8>,

    /// Directory receiving summary.json
    #[clap(long)]
    output_dir: Option<PathBuf>,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    // Set number of threads
    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    let config = build_config(&args)?;
    log::info!("Configuration: {:?}", config);

    // 1. Create the phantom
    let volume = sphere_phantom(&args);
    let center = args.size / 2;
    let last = args.size.saturating_sub(1);

    // 2. Seeds: sphere center and two opposite corners
    let sources = vec![VoxelIndex::new(center, center, center)];
    let sinks = vec![VoxelIndex::new(0, 0, 0), VoxelIndex::new(last, last, last)];

    // 3. Segment
    let segmentation = segment(volume.view(), &sources, &sinks, &config)?;
    let summary = SegmentationSummary::from_segmentation(&segmentation);

    log::info!(
        "Foreground: {} voxels ({:.1}%) in {} component(s), max flow {:.4}",
        summary.foreground_voxels,
        summary.foreground_fraction * 100.0,
        summary.foreground_components,
        summary.max_flow
    );

    // 4. Save or print the summary
    match &args.output_dir {
        Some(dir) => save_summary(&summary, dir)?,
        None => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    Ok(())
}

/// Merge the optional JSON configuration file with command line flags
fn build_config(args: &Cli) -> Result<SegmentationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading configuration {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing configuration {}", path.display()))?
        }
        None => SegmentationConfig::default(),
    };

    if let Some(lambda) = args.lambda {
        config.lambda = lambda;
    }
    if let Some(sigma) = args.sigma {
        config.sigma = SigmaPolicy::Fixed(sigma);
    } else if args.median_noise {
        config.sigma = SigmaPolicy::Estimate(NoiseStatistic::MedianAbsoluteDifference);
    }
    if let Some(bins) = args.bins {
        config.histogram_bins = bins;
    }
    if let Some(mode) = args.region_term {
        config.region_term = match mode {
            RegionMode::None => RegionTerm::None,
            RegionMode::Threshold => RegionTerm::Threshold {
                threshold: args.threshold,
            },
            RegionMode::Histogram => RegionTerm::Histogram,
        };
    }
    if let Some(direction) = args.direction {
        config.boundary_direction = match direction {
            Direction::None => BoundaryDirection::None,
            Direction::BrightToDark => BoundaryDirection::BrightToDark,
            Direction::DarkToBright => BoundaryDirection::DarkToBright,
        };
    }
    if let Some(connectivity) = args.connectivity {
        config.connectivity = match connectivity {
            6 => Connectivity::Six,
            18 => Connectivity::Eighteen,
            26 => Connectivity::TwentySix,
            other => anyhow::bail!("unsupported connectivity {}, expected 6, 18 or 26", other),
        };
    }

    config.validate()?;
    Ok(config)
}

/// Bright sphere of radius size/4 on a darker background, with a repeating texture
fn sphere_phantom(args: &Cli) -> Array3<u16> {
    let size = args.size;
    let center = (size / 2) as f64;
    let radius = size as f64 / 4.0;

    Array3::from_shape_fn((size, size, size), |(x, y, z)| {
        let dx = x as f64 - center;
        let dy = y as f64 - center;
        let dz = z as f64 - center;
        let inside = (dx * dx + dy * dy + dz * dz).sqrt() <= radius;

        let base = if inside {
            args.object_intensity
        } else {
            args.background_intensity
        };
        let texture = ((x * 7 + y * 13 + z * 17) % 5) as u16 * args.texture / 4;
        base.saturating_add(texture)
    })
}
