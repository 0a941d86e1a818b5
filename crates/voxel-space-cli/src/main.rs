mod assets;

use anyhow::Context;
use assets::AssetMaps;
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voxel_space_core::camera::ControlInput;
use voxel_space_core::config::ViewerConfig;
use voxel_space_core::procgen::TerrainParams;
use voxel_space_core::viewer::{FlightSegment, MapLoader, SyntheticMaps, Viewer};

#[derive(Parser)]
#[command(name = "voxel-space", version, about = "Voxel Space terrain renderer")]
struct Cli {
    /// Viewer configuration (JSON). Missing fields use defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a single frame to PNG
    Render(RenderArgs),
    /// Play a scripted flight and write the last frame plus per-frame reports
    Flythrough(FlightArgs),
}

#[derive(Args)]
struct MapArgs {
    /// Asset root holding the color and height directories; overrides `map.asset_root`
    #[arg(long, conflicts_with = "synthetic")]
    assets: Option<PathBuf>,
    /// Generate seeded maps instead of reading PNG assets
    #[arg(long)]
    synthetic: bool,
    /// Map index to start on
    #[arg(long, default_value_t = 0)]
    map: usize,
    /// Seed for synthetic maps
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Args)]
struct ViewArgs {
    #[arg(long)]
    width: Option<usize>,
    #[arg(long)]
    height: Option<usize>,
    #[arg(long)]
    x: Option<f32>,
    #[arg(long)]
    y: Option<f32>,
    /// Camera elevation
    #[arg(long)]
    altitude: Option<f32>,
    #[arg(long, allow_hyphen_values = true)]
    horizon: Option<f32>,
    #[arg(long)]
    zfar: Option<f32>,
    /// Heading in degrees, clockwise
    #[arg(long, allow_hyphen_values = true)]
    heading: Option<f32>,
}

#[derive(Args)]
struct RenderArgs {
    #[command(flatten)]
    maps: MapArgs,
    #[command(flatten)]
    view: ViewArgs,
    #[arg(short, long, default_value = "frame.png")]
    output: PathBuf,
    /// Print overlay diagnostics as JSON on stdout
    #[arg(long)]
    diagnostics: bool,
}

#[derive(Args)]
struct FlightArgs {
    #[command(flatten)]
    maps: MapArgs,
    #[command(flatten)]
    view: ViewArgs,
    /// JSON array of `{frames, input}` segments; a built-in tour when omitted
    #[arg(long)]
    script: Option<PathBuf>,
    /// Simulated seconds per frame
    #[arg(long, default_value_t = 1.0 / 30.0)]
    dt: f32,
    #[arg(long, default_value_t = 10)]
    sample_every: usize,
    #[arg(short, long, default_value = "flight.png")]
    output: PathBuf,
    /// Where to write the flight summary JSON; stdout when omitted
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ViewerConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid viewer config in {}", path.display()))
        }
        None => Ok(ViewerConfig::default()),
    }
}

fn apply_view_overrides(config: &mut ViewerConfig, view: &ViewArgs) {
    let render = &mut config.render;
    render.width = view.width.unwrap_or(render.width);
    render.height = view.height.unwrap_or(render.height);
    let camera = &mut config.camera;
    camera.x = view.x.unwrap_or(camera.x);
    camera.y = view.y.unwrap_or(camera.y);
    camera.height = view.altitude.unwrap_or(camera.height);
    camera.horizon = view.horizon.unwrap_or(camera.horizon);
    camera.zfar = view.zfar.unwrap_or(camera.zfar);
    if let Some(degrees) = view.heading {
        camera.angle = degrees.to_radians();
    }
}

/// PNG asset root to read maps from, or `None` for synthetic maps.
fn asset_root(args: &MapArgs, config: &ViewerConfig) -> Option<PathBuf> {
    if args.synthetic {
        return None;
    }
    Some(
        args.assets
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.map.asset_root)),
    )
}

fn map_loader(args: &MapArgs, config: &ViewerConfig) -> Box<dyn MapLoader> {
    match asset_root(args, config) {
        Some(root) => Box::new(AssetMaps::from_config(root, &config.map)),
        None => Box::new(SyntheticMaps {
            base: TerrainParams {
                side: config.map.side,
                seed: args.seed,
                ..TerrainParams::default()
            },
        }),
    }
}

fn open_viewer(
    config: ViewerConfig,
    maps: &MapArgs,
) -> anyhow::Result<(Viewer, Box<dyn MapLoader>)> {
    let loader = map_loader(maps, &config);
    let mut viewer = Viewer::try_new(config).context("invalid viewer configuration")?;
    viewer
        .request_map(maps.map, loader.as_ref())
        .with_context(|| format!("failed to load map {}", maps.map))?;
    Ok((viewer, loader))
}

/// Climb out, look around, then cruise while paging once through the maps.
fn default_tour() -> Vec<FlightSegment> {
    let hold = |frames, input| FlightSegment { frames, input };
    vec![
        hold(
            30,
            ControlInput {
                forward: true,
                elevate_up: true,
                ..ControlInput::default()
            },
        ),
        hold(
            45,
            ControlInput {
                rotate_right: true,
                ..ControlInput::default()
            },
        ),
        hold(
            60,
            ControlInput {
                forward: true,
                boost: true,
                ..ControlInput::default()
            },
        ),
        hold(
            1,
            ControlInput {
                next_map: true,
                ..ControlInput::default()
            },
        ),
        hold(
            30,
            ControlInput {
                strafe_left: true,
                horizon_down: true,
                slow: true,
                ..ControlInput::default()
            },
        ),
    ]
}

fn run_render(mut config: ViewerConfig, args: RenderArgs) -> anyhow::Result<()> {
    apply_view_overrides(&mut config, &args.view);
    let (mut viewer, _loader) = open_viewer(config, &args.maps)?;
    let spans = viewer.render()?;
    assets::save_png(viewer.frame(), &args.output)?;
    info!(spans, output = %args.output.display(), "frame written");

    if args.diagnostics {
        println!("{}", serde_json::to_string_pretty(&viewer.diagnostics())?);
    } else {
        for line in viewer.diagnostics().lines() {
            info!("{line}");
        }
    }
    Ok(())
}

fn run_flight(mut config: ViewerConfig, args: FlightArgs) -> anyhow::Result<()> {
    apply_view_overrides(&mut config, &args.view);
    let script = match &args.script {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<Vec<FlightSegment>>(&text)
                .with_context(|| format!("invalid flight script in {}", path.display()))?
        }
        None => default_tour(),
    };

    let (mut viewer, loader) = open_viewer(config, &args.maps)?;
    let summary = viewer.run_flight(&script, args.dt, args.sample_every, loader.as_ref())?;
    assets::save_png(viewer.frame(), &args.output)?;
    info!(
        frames = summary.frames,
        failed_map_loads = summary.failed_map_loads,
        output = %args.output.display(),
        "flight finished"
    );

    let json = serde_json::to_string_pretty(&summary)?;
    match &args.summary {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    match cli.command {
        Command::Render(args) => run_render(config, args),
        Command::Flythrough(args) => run_flight(config, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_args(assets: Option<&str>, synthetic: bool) -> MapArgs {
        MapArgs {
            assets: assets.map(PathBuf::from),
            synthetic,
            map: 0,
            seed: 42,
        }
    }

    #[test]
    fn asset_root_comes_from_config_unless_overridden() {
        let mut config = ViewerConfig::default();
        config.map.asset_root = "terrain".to_string();
        assert_eq!(
            asset_root(&map_args(None, false), &config),
            Some(PathBuf::from("terrain"))
        );
        assert_eq!(
            asset_root(&map_args(Some("elsewhere"), false), &config),
            Some(PathBuf::from("elsewhere"))
        );
        assert_eq!(asset_root(&map_args(None, true), &config), None);
    }

    #[test]
    fn assets_and_synthetic_flags_conflict() {
        let parsed =
            Cli::try_parse_from(["voxel-space", "render", "--assets", "maps", "--synthetic"]);
        assert!(parsed.is_err());
        let parsed = Cli::try_parse_from(["voxel-space", "render", "--synthetic"]);
        assert!(parsed.is_ok());
    }
}
