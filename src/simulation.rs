use ::rand as external_rand;
use external_rand::Rng;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::branch::{Growth, GrowthOutcome, GrowthStyle};
use crate::config::SimulationConfig;
use crate::interaction::{ColorScheme, InteractionState};
use crate::nutrients::diffuse;
use crate::particle::{random_heading, UpdateContext, UPWARD};
use crate::population::Population;
use crate::scene::{Primitive, Rotation, Scene, ToneRequest};
use crate::types::{Point, Rgba};

const MOIRE_PERIOD: f32 = 20.0;
const MOIRE_ALPHA: f32 = 0.05;
const MOIRE_SPIN: f32 = 0.001;
const PRESS_LENGTH: f32 = 30.0;

/// Shared flag the surrounding application sets to end the run loop.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct TickReport {
    pub grew: bool,
    pub growth_segments: usize,
    pub growth_end: Option<Point>,
    pub exchanges: usize,
    pub connections: usize,
    pub evicted: usize,
    pub glitched: bool,
}

// Running totals for the headless summary
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct Counters {
    pub ticks: u64,
    pub growth_events: u64,
    pub spawned: u64,
    pub evicted: u64,
    pub tone_requests: u64,
}

// Simulation - contains state, config, and control flags
pub struct Simulation {
    pub config: SimulationConfig,
    pub population: Population,
    pub interaction: InteractionState,
    pub counters: Counters,
    pub paused: bool,
    pub help_popup_visible: bool,
    screenshot_requested: bool,
}

impl Simulation {
    pub fn with_config<R: Rng>(rng: &mut R, config: SimulationConfig) -> Self {
        let interaction = InteractionState::new(config.width, config.height);
        let mut sim = Self {
            config,
            population: Population::new(),
            interaction,
            counters: Counters::default(),
            paused: false,
            help_popup_visible: false,
            screenshot_requested: false,
        };
        sim.seed(rng);
        sim
    }

    fn seed<R: Rng>(&mut self, rng: &mut R) {
        let hues = self.interaction.hue_range();
        self.population.seed_grid(
            rng,
            self.config.initial_particle_count,
            self.interaction.width,
            self.interaction.height,
            hues,
            self.config.noise_scale,
        );
        self.counters.spawned += self.config.initial_particle_count as u64;
    }

    pub fn reset<R: Rng>(&mut self, rng: &mut R) {
        self.population.clear();
        self.interaction.last_growth_ms = None;
        self.seed(rng);
        debug!(particles = self.population.len(), "simulation reset");
    }

    /// Press: immediate upward growth, a confirmation tone and a burst of
    /// particles at the press point. Sustained-press growth resumes one
    /// interval later.
    pub fn pointer_down<R: Rng>(
        &mut self,
        x: f32,
        y: f32,
        now_ms: f64,
        rng: &mut R,
        scene: &mut Scene,
    ) -> GrowthOutcome {
        self.interaction.pointer_down(x, y);
        let outcome = self.grow_at(x, y, UPWARD, PRESS_LENGTH, rng, scene);
        scene.tone(ToneRequest::now(300.0, 0.2, 0.1));
        self.spawn_burst(x, y, self.config.press_spawn_count, rng);
        self.interaction.mark_growth(now_ms);
        outcome
    }

    fn grow_at<R: Rng>(
        &mut self,
        x: f32,
        y: f32,
        angle: f32,
        length: f32,
        rng: &mut R,
        scene: &mut Scene,
    ) -> GrowthOutcome {
        let style = GrowthStyle::for_frame(
            self.interaction.frame_count,
            self.config.growth_depth,
            self.config.branch_tone_chance,
        );
        let outcome =
            Growth::new(rng, scene, style).grow(x, y, angle, length, self.config.growth_depth);
        self.counters.growth_events += 1;
        outcome
    }

    fn spawn_burst<R: Rng>(&mut self, x: f32, y: f32, count: usize, rng: &mut R) {
        let hues = self.interaction.hue_range();
        for _ in 0..count {
            self.population
                .spawn_at(rng, x, y, hues, self.config.noise_scale);
        }
        self.counters.spawned += count as u64;
    }

    /// Advance one frame. `now_ms` is the external clock in milliseconds.
    pub fn tick<R: Rng>(&mut self, now_ms: f64, rng: &mut R, scene: &mut Scene) -> TickReport {
        let mut report = TickReport::default();
        let tones_before = scene.tones.len();
        self.interaction.frame_count = self.interaction.frame_count.wrapping_add(1);
        let (width, height) = (self.interaction.width, self.interaction.height);

        // Translucent overlay instead of a clear leaves fading trails
        scene.push(Primitive::Rect {
            x: 0.0,
            y: 0.0,
            w: width,
            h: height,
            color: Rgba::BLACK.with_alpha(self.config.fade_alpha),
            rotation: None,
        });

        if self.config.moire {
            self.push_moire(scene);
        }

        if self
            .interaction
            .growth_due(now_ms, self.config.growth_interval_ms)
        {
            let half = self.config.growth_jitter / 2.0;
            let x = self.interaction.pointer.x + (rng.gen::<f32>() - 0.5) * 2.0 * half;
            let y = self.interaction.pointer.y + (rng.gen::<f32>() - 0.5) * 2.0 * half;
            let angle = random_heading(rng);
            let length = 20.0 + rng.gen::<f32>() * 20.0;
            let outcome = self.grow_at(x, y, angle, length, rng, scene);
            report.growth_segments = outcome.segments;
            report.growth_end = Some(outcome.root_end);
            self.spawn_burst(x, y, self.config.growth_spawn_count, rng);
            self.interaction.mark_growth(now_ms);
            report.grew = true;
        }

        if self.config.nutrient_diffusion {
            report.exchanges = diffuse(self.population.particles_mut(), &self.config);
        }

        let ctx = UpdateContext::from_config(
            &self.config,
            self.interaction.noise_time(self.config.time_scale),
            self.interaction.pointer,
            width,
            height,
        );
        report.connections = self.population.sweep(&ctx, &self.config, rng, scene);

        if self.config.glitch && rng.gen::<f32>() < self.config.glitch_chance {
            scene.push(Primitive::GlitchSlice {
                y: rng.gen::<f32>() * height,
                height: 10.0 + rng.gen::<f32>() * 30.0,
                shift: (rng.gen::<f32>() * 100.0).floor(),
            });
            scene.tone(ToneRequest::now(1000.0 + rng.gen::<f32>() * 2000.0, 0.1, 0.05));
            report.glitched = true;
        }

        report.evicted = self.population.evict_oldest(self.config.max_particles);

        self.counters.ticks += 1;
        self.counters.evicted += report.evicted as u64;
        self.counters.tone_requests += (scene.tones.len() - tones_before) as u64;
        report
    }

    // Two stripe sets, the second slowly rotating about the centre
    fn push_moire(&self, scene: &mut Scene) {
        let (width, height) = (self.interaction.width, self.interaction.height);
        let color = Rgba::WHITE.with_alpha(MOIRE_ALPHA);
        let stripe = MOIRE_PERIOD / 2.0;

        let mut x = 0.0;
        while x < width {
            scene.push(Primitive::Rect { x, y: 0.0, w: stripe, h: height, color, rotation: None });
            x += MOIRE_PERIOD;
        }

        let rotation = Some(Rotation {
            angle: self.interaction.frame_count as f32 * MOIRE_SPIN,
            pivot: Point::new(width / 2.0, height / 2.0),
        });
        let mut i = 0.0;
        while i < width * 1.5 {
            scene.push(Primitive::Rect {
                x: i - width / 2.0,
                y: 0.0,
                w: stripe,
                h: height,
                color,
                rotation,
            });
            i += MOIRE_PERIOD;
        }
    }

    pub fn stats(&self) -> (usize, f32, f32) {
        let count = self.population.len();
        let total = self.population.total_nutrient();
        let mean = if self.population.is_empty() { 0.0 } else { total / count as f32 };
        (count, total, mean)
    }
}

// Input the window loop forwards. Headless runs only press and tick.
#[cfg_attr(not(feature = "ui"), allow(dead_code))]
impl Simulation {
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }
    pub fn toggle_moire(&mut self) {
        self.config.moire = !self.config.moire;
    }
    pub fn toggle_glitch(&mut self) {
        self.config.glitch = !self.config.glitch;
    }
    pub fn toggle_help_popup(&mut self) {
        self.help_popup_visible = !self.help_popup_visible;
    }

    pub fn request_screenshot(&mut self) {
        self.screenshot_requested = true;
    }

    /// True once per request; clears the request.
    pub fn take_screenshot_request(&mut self) -> bool {
        std::mem::take(&mut self.screenshot_requested)
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.interaction.resize(width, height);
        debug!(
            width = self.interaction.width,
            height = self.interaction.height,
            "viewport resized"
        );
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.interaction.pointer_move(x, y);
    }

    pub fn pointer_up(&mut self) {
        self.interaction.pointer_up();
    }

    /// Color-scheme key. Plays a short ascending arpeggio.
    pub fn cycle_color_scheme<R: Rng>(&mut self, rng: &mut R, scene: &mut Scene) -> ColorScheme {
        let scheme = self.interaction.cycle_scheme(self.config.palette_mode, rng);
        for (i, freq) in [220.0, 277.18, 329.63].into_iter().enumerate() {
            scene.tone(ToneRequest::now(freq, 0.3, 0.1).delayed(i as f32 * 0.1));
        }
        debug!(?scheme, "color scheme changed");
        scheme
    }
}
