// Headless mode - runs the simulation without a window and reports a summary

use ::rand as external_rand;
use external_rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::interaction::ColorScheme;
use crate::scene::Scene;
use crate::simulation::{Counters, Simulation, StopSignal};

pub const TICK_MS: f64 = 1000.0 / 60.0;

#[derive(Clone, Debug)]
pub struct RunOptions {
    pub max_ticks: u64,
    /// Keep the pointer pressed at the surface centre for the whole run.
    pub hold_pointer: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub simulated_ms: f64,
    pub particle_count: usize,
    pub total_nutrient: f32,
    pub mean_nutrient: f32,
    pub color_scheme: ColorScheme,
    pub oldest_particle_id: Option<u64>,
    pub newest_particle_id: Option<u64>,
    pub primitives_last_frame: usize,
    pub counters: Counters,
}

/// Call `tick` at the simulated refresh rate until the tick budget is spent
/// or `stop` is raised.
pub fn run<R: Rng>(sim: &mut Simulation, rng: &mut R, options: &RunOptions, stop: &StopSignal) -> RunSummary {
    let mut scene = Scene::new();
    let mut now = 0.0;
    let mut ticks = 0;

    if options.hold_pointer {
        let (cx, cy) = (sim.interaction.width / 2.0, sim.interaction.height / 2.0);
        sim.pointer_down(cx, cy, now, rng, &mut scene);
    }

    while !stop.is_stopped() {
        if ticks >= options.max_ticks {
            stop.stop();
            break;
        }
        scene.clear();
        now += TICK_MS;
        sim.tick(now, rng, &mut scene);
        ticks += 1;
    }

    let (particle_count, total_nutrient, mean_nutrient) = sim.stats();
    let particles = sim.population.particles();
    let summary = RunSummary {
        ticks,
        simulated_ms: now,
        particle_count,
        total_nutrient,
        mean_nutrient,
        color_scheme: sim.interaction.scheme,
        oldest_particle_id: particles.first().map(|p| p.id),
        newest_particle_id: particles.last().map(|p| p.id),
        primitives_last_frame: scene.primitives.len(),
        counters: sim.counters,
    };
    info!(
        ticks,
        particles = particle_count,
        growth_events = sim.counters.growth_events,
        "headless run finished"
    );
    summary
}
