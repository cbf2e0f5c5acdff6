use ::rand as external_rand;
use anyhow::{Context, Result};
use clap::Parser;
use external_rand::rngs::StdRng;
use external_rand::SeedableRng;
use tracing::info;

#[cfg(feature = "ui")]
mod audio;
mod branch;
mod color;
mod config;
mod headless;
mod interaction;
mod noise;
mod nutrients;
mod particle;
mod population;
mod scene;
mod simulation;
mod types;

#[cfg(feature = "ui")]
mod controls;
#[cfg(feature = "ui")]
mod visualization;

use config::*;
use headless::RunOptions;
use simulation::{Simulation, StopSignal};

#[cfg(feature = "ui")]
use macroquad::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run without a window and print a JSON summary
    #[arg(long)]
    headless: bool,

    /// Number of ticks to simulate in headless mode
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Seed for the headless random generator
    #[arg(long)]
    seed: Option<u64>,

    /// Headless mode: keep the pointer pressed at the centre of the surface
    #[arg(long)]
    hold: bool,

    /// Override the initial particle count
    #[arg(long)]
    particles: Option<usize>,

    /// Configuration file path (YAML or JSON). If not specified, searches for config.yaml, config.yml, or config.json in current directory.
    #[arg(short, long)]
    config: Option<String>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(count) = args.particles {
        config.initial_particle_count = count;
    }

    #[cfg(feature = "ui")]
    if !args.headless {
        macroquad::Window::from_config(window_conf(&config), ui_main(config));
        return Ok(());
    }
    #[cfg(not(feature = "ui"))]
    if !args.headless {
        info!("built without the ui feature, running headless");
    }

    headless_main(&args, config)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Load configuration from file or use default
fn load_config(config_path: Option<&str>) -> Result<SimulationConfig> {
    match config_path {
        Some(path) => SimulationConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {path}")),
        None => Ok(SimulationConfig::from_default_paths()),
    }
}

/// Headless mode - fixed 60 Hz simulated clock, summary on stdout
fn headless_main(args: &Args, config: SimulationConfig) -> Result<()> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut sim = Simulation::with_config(&mut rng, config);
    let options = RunOptions {
        max_ticks: args.ticks,
        hold_pointer: args.hold,
    };
    info!(ticks = options.max_ticks, hold = options.hold_pointer, "starting headless run");

    let summary = headless::run(&mut sim, &mut rng, &options, &StopSignal::new());
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(feature = "ui")]
async fn ui_main(mut config: SimulationConfig) {
    use audio::TonePlayer;
    use controls::handle_controls;
    use scene::Scene;
    use visualization::{draw_help_hint, draw_help_popup, draw_stats_and_help, Canvas};

    config.width = screen_width();
    config.height = screen_height();

    let mut rng = external_rand::thread_rng();
    let mut sim = Simulation::with_config(&mut rng, config);
    let mut canvas = Canvas::new(sim.interaction.width, sim.interaction.height);
    let mut audio = TonePlayer::new();
    let mut scene = Scene::new();
    let stop = StopSignal::new();
    info!(
        width = sim.interaction.width,
        height = sim.interaction.height,
        particles = sim.population.len(),
        "mycelium field started"
    );

    while !stop.is_stopped() {
        let (width, height) = (screen_width(), screen_height());
        if canvas.fit(width, height) {
            sim.resize(width, height);
        }

        scene.clear();
        let now = get_time();
        let now_ms = now * 1000.0;

        handle_controls(&mut sim, &mut rng, &mut scene, &mut audio, &stop, now_ms);

        if !sim.paused {
            sim.tick(now_ms, &mut rng, &mut scene);
        }

        canvas.draw_scene(&scene);
        canvas.present();

        audio.submit(&scene.tones, now);
        audio.pump(now).await;

        draw_stats_and_help(&sim);
        if sim.help_popup_visible {
            draw_help_popup();
        } else {
            draw_help_hint();
        }

        // Take screenshot if requested
        if sim.take_screenshot_request() {
            let timestamp = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            let filename = format!("mycofield_{}.png", timestamp);

            match capture_screenshot(canvas.texture(), &filename) {
                Ok(()) => info!(file = %filename, "screenshot saved"),
                Err(e) => tracing::error!(file = %filename, error = %e, "failed to save screenshot"),
            }
        }

        next_frame().await;
    }
}

#[cfg(feature = "ui")]
fn window_conf(config: &SimulationConfig) -> macroquad::window::Conf {
    macroquad::window::Conf {
        window_title: "Mycelium Field".to_owned(),
        window_width: config.width as i32,
        window_height: config.height as i32,
        window_resizable: true,
        ..macroquad::window::Conf::default()
    }
}

#[cfg(feature = "ui")]
/// Save the drawing surface (without HUD text) as a PNG
fn capture_screenshot(texture: &Texture2D, filename: &str) -> Result<()> {
    let surface = texture.get_texture_data();

    let width = surface.width as u32;
    let height = surface.height as u32;
    let bytes = &surface.bytes;

    let mut img = image::RgbaImage::new(width, height);

    // Render target rows are stored bottom-up; image rows go top-down
    for (row_index, row) in bytes.chunks_exact(width as usize * 4).enumerate() {
        let y = height - 1 - row_index as u32;
        for (x, px) in row.chunks_exact(4).enumerate() {
            // The surface is always opaque; trails leave partial alpha behind
            img.put_pixel(x as u32, y, image::Rgba([px[0], px[1], px[2], 255]));
        }
    }

    img.save(filename)
        .with_context(|| format!("writing {filename}"))?;

    Ok(())
}
