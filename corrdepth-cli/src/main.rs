use clap::Parser;
use corrdepth::io::{load_rgba_image, save_depth_map};
use corrdepth::{Backend, DepthConfig, DepthEstimator, Method};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Stereo depth maps with ZNCC block matching")]
struct Cli {
    /// Path to the JSON configuration file; built-in defaults when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Block width in pixels.
    #[arg(short = 'x', value_name = "N")]
    block_x: Option<usize>,
    /// Block height in pixels.
    #[arg(short = 'y', value_name = "N")]
    block_y: Option<usize>,
    /// Largest disparity searched.
    #[arg(short = 'd', value_name = "N")]
    disp_limit: Option<u16>,
    /// Search the full range instead of the coarse-to-fine search.
    #[arg(short = 'b', long)]
    brute: bool,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum MethodConfig {
    Brute,
    Hierarchic,
}

impl From<MethodConfig> for Method {
    fn from(value: MethodConfig) -> Self {
        match value {
            MethodConfig::Brute => Method::Brute,
            MethodConfig::Hierarchic => Method::Hierarchic,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum BackendConfig {
    Threads,
    Rayon,
}

impl From<BackendConfig> for Backend {
    fn from(value: BackendConfig) -> Self {
        match value {
            BackendConfig::Threads => Backend::Threads,
            BackendConfig::Rayon => Backend::Rayon,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DepthConfigJson {
    block_x: usize,
    block_y: usize,
    disp_limit: u16,
    method: MethodConfig,
    threads: usize,
    batch_rows: usize,
    fill_passes: usize,
    backend: BackendConfig,
}

impl Default for DepthConfigJson {
    fn default() -> Self {
        let cfg = DepthConfig::default();
        Self {
            block_x: cfg.block_x,
            block_y: cfg.block_y,
            disp_limit: cfg.disp_limit,
            method: MethodConfig::Hierarchic,
            threads: cfg.threads,
            batch_rows: cfg.batch_rows,
            fill_passes: cfg.fill_passes,
            backend: BackendConfig::Threads,
        }
    }
}

impl From<DepthConfigJson> for DepthConfig {
    fn from(value: DepthConfigJson) -> Self {
        DepthConfig {
            block_x: value.block_x,
            block_y: value.block_y,
            disp_limit: value.disp_limit,
            method: value.method.into(),
            threads: value.threads,
            batch_rows: value.batch_rows,
            fill_passes: value.fill_passes,
            backend: value.backend.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Config {
    left_path: PathBuf,
    right_path: PathBuf,
    output_path: PathBuf,
    depth: DepthConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            left_path: PathBuf::from("im0.png"),
            right_path: PathBuf::from("im1.png"),
            output_path: PathBuf::from("depth01p.png"),
            depth: DepthConfigJson::default(),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("corrdepth=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config: Config = match &cli.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    let mut depth_cfg = DepthConfig::from(config.depth);
    if let Some(block_x) = cli.block_x {
        depth_cfg.block_x = block_x;
    }
    if let Some(block_y) = cli.block_y {
        depth_cfg.block_y = block_y;
    }
    if let Some(limit) = cli.disp_limit {
        depth_cfg.disp_limit = limit;
    }
    if cli.brute {
        depth_cfg.method = Method::Brute;
    }
    depth_cfg.validate()?;

    let total = Instant::now();
    let decode = Instant::now();
    let left = load_rgba_image(&config.left_path)?;
    let right = load_rgba_image(&config.right_path)?;
    if left.width() != right.width() || left.height() != right.height() {
        return Err(format!(
            "image dimensions do not match: {}x{} vs {}x{}",
            left.width(),
            left.height(),
            right.width(),
            right.height()
        )
        .into());
    }
    println!("Image decoding time: {:.3} seconds.", decode.elapsed().as_secs_f64());

    let estimator = DepthEstimator::new().with_config(depth_cfg);
    let depth = estimator.generate(left.view(), right.view())?;
    save_depth_map(&config.output_path, &depth)?;

    println!(
        "Wrote {} ({}x{}). Program total time: {:.3} seconds.",
        config.output_path.display(),
        depth.width(),
        depth.height(),
        total.elapsed().as_secs_f64()
    );
    Ok(())
}
