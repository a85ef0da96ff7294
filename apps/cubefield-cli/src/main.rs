mod script;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cubefield_camera::Camera;
use cubefield_common::AppConfig;
use cubefield_input::InputRouter;
use cubefield_render::{CubeField, DebugTextRenderer, RenderView, Renderer};
use script::InputScript;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cubefield-cli", about = "Headless tools for the cube field camera")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// YAML config file (window, camera, field)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print the resolved configuration
    Config,
    /// Drive a camera through a scripted input sequence
    Simulate {
        /// Number of frames to simulate
        #[arg(short, long, default_value = "60")]
        frames: u32,
        /// Seconds per frame
        #[arg(long, default_value = "0.016")]
        dt: f32,
        /// Input script, e.g. "w:0-30,d:10-20,turn:5"
        #[arg(short, long, default_value = "")]
        script: String,
        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    frames: u32,
    dt: f32,
    position: [f32; 3],
    rotation: [f32; 4],
    effective_move_speed: f32,
    active_inputs: Vec<&'static str>,
    visible_cubes: usize,
    total_cubes: usize,
}

fn simulate(
    config: &AppConfig,
    script: &InputScript,
    frames: u32,
    dt: f32,
) -> anyhow::Result<(Camera, CubeField)> {
    let aspect = config.window.width as f32 / config.window.height.max(1) as f32;
    let mut camera = Camera::new(aspect, &config.camera)?;
    let field = CubeField::grid(&config.field);

    let mut router = InputRouter::with_default_bindings();
    router.set_pointer_captured(true);

    for frame in 0..frames {
        script.feed(frame, &mut router);
        for action in router.drain() {
            camera.apply(action);
        }
        camera.update(dt);
    }
    tracing::debug!("simulated {frames} frames");

    Ok((camera, field))
}

fn report(camera: &Camera, field: &CubeField, frames: u32, dt: f32) -> SimulationReport {
    let transform = camera.transform();
    SimulationReport {
        frames,
        dt,
        position: transform.position.to_array(),
        rotation: transform.rotation.to_array(),
        effective_move_speed: camera.effective_move_speed(),
        active_inputs: camera.active_inputs().map(|m| m.label()).collect(),
        visible_cubes: RenderView::from_camera(camera).visible_count(field),
        total_cubes: field.len(),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("cubefield-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("input: {}", cubefield_input::crate_info());
            println!("camera: {}", cubefield_camera::crate_info());
            println!("render: {}", cubefield_render::crate_info());
        }
        Commands::Config => {
            println!("# resolved camera settings");
            print!("{}", serde_yaml::to_string(&config.camera.resolve())?);
            println!("# window and field");
            print!("{}", serde_yaml::to_string(&config.window)?);
            print!("{}", serde_yaml::to_string(&config.field)?);
        }
        Commands::Simulate {
            frames,
            dt,
            script,
            json,
        } => {
            let script = InputScript::parse(&script).context("invalid input script")?;
            let (camera, field) = simulate(&config, &script, frames, dt)?;

            if json {
                let report = report(&camera, &field, frames, dt);
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Simulated {frames} frames at dt={dt}");
                print!(
                    "{}",
                    DebugTextRenderer::new().render(&field, &RenderView::from_camera(&camera))
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn global_flags_follow_subcommand() {
        use clap::CommandFactory;
        Cli::command().debug_assert();

        let cli =
            Cli::try_parse_from(["cubefield-cli", "simulate", "-v", "-c", "demo.yaml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("demo.yaml")));
        assert!(matches!(cli.command, Commands::Simulate { frames: 60, .. }));

        let cli = Cli::try_parse_from(["cubefield-cli", "-v", "info"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn scripted_hold_then_release() {
        let script = InputScript::parse("w:0-10").unwrap();
        let (camera, _) = simulate(&AppConfig::default(), &script, 20, 0.1).unwrap();
        assert!(camera
            .transform()
            .position
            .abs_diff_eq(Vec3::new(0.0, 0.0, 10.0), 1e-3));
        assert!(!camera.is_moving());
    }

    #[test]
    fn held_key_is_reported_active() {
        let script = InputScript::parse("w:0,d:0").unwrap();
        let (camera, field) = simulate(&AppConfig::default(), &script, 1, 0.1).unwrap();
        let report = report(&camera, &field, 1, 0.1);
        assert_eq!(report.active_inputs, vec!["forward", "right"]);
        assert_eq!(report.total_cubes, 1000);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"effective_move_speed\":10.0"));
    }

    #[test]
    fn scripted_turn_rotates() {
        let script = InputScript::parse("turn:0").unwrap();
        let (camera, _) = simulate(&AppConfig::default(), &script, 2, 0.01).unwrap();
        assert!(!camera
            .transform()
            .rotation
            .abs_diff_eq(glam::Quat::IDENTITY, 1e-4));
    }

    #[test]
    fn no_frames_leaves_camera_at_rest() {
        let script = InputScript::parse("w:0-5").unwrap();
        let (camera, _) = simulate(&AppConfig::default(), &script, 0, 0.1).unwrap();
        assert_eq!(camera.transform().position, Vec3::ZERO);
    }
}
