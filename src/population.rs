use ::rand as external_rand;
use external_rand::Rng;

use crate::color::{dist_sq, hsba, map_range};
use crate::config::SimulationConfig;
use crate::interaction::HueRange;
use crate::particle::{Particle, UpdateContext};
use crate::scene::{Scene, ToneRequest};

/// Insertion-ordered particle collection. The front is always the oldest.
#[derive(Debug, Default)]
pub struct Population {
    particles: Vec<Particle>,
    next_id: u64,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn total_nutrient(&self) -> f32 {
        self.particles.iter().map(|p| p.nutrient).sum()
    }

    /// Spread `count` particles over a near-square grid, one per cell with
    /// random placement inside the cell.
    pub fn seed_grid<R: Rng>(
        &mut self,
        rng: &mut R,
        count: usize,
        width: f32,
        height: f32,
        hues: HueRange,
        noise_scale: f32,
    ) {
        if count == 0 {
            return;
        }
        let cols = (count as f32).sqrt().ceil() as usize;
        let rows = count.div_ceil(cols);
        let cell_w = width / cols as f32;
        let cell_h = height / rows as f32;

        let target = self.particles.len() + count;
        'rows: for row in 0..rows {
            for col in 0..cols {
                if self.particles.len() >= target {
                    break 'rows;
                }
                let x = col as f32 * cell_w + rng.gen::<f32>() * cell_w;
                let y = row as f32 * cell_h + rng.gen::<f32>() * cell_h;
                self.spawn_at(rng, x, y, hues, noise_scale);
            }
        }
    }

    pub fn spawn_at<R: Rng>(
        &mut self,
        rng: &mut R,
        x: f32,
        y: f32,
        hues: HueRange,
        noise_scale: f32,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.particles
            .push(Particle::new(rng, id, x, y, hues, noise_scale));
        id
    }

    /// Update, draw and connect every particle in insertion order.
    ///
    /// Particle `i` is updated before it is compared with the later,
    /// not-yet-updated particles; connection geometry reflects that.
    /// Returns the number of connection lines drawn.
    pub fn sweep<R: Rng>(
        &mut self,
        ctx: &UpdateContext,
        config: &SimulationConfig,
        rng: &mut R,
        scene: &mut Scene,
    ) -> usize {
        let max_d = config.connection_distance;
        let max_d_sq = config.connection_distance_sq();
        let mut connections = 0;

        for i in 0..self.particles.len() {
            let (head, tail) = self.particles.split_at_mut(i + 1);
            let p = &mut head[i];
            p.update(ctx);
            scene.push(p.draw(config.depth_effect));

            let color = hsba(p.hue, p.saturation, p.brightness, 1.0);
            for q in tail.iter() {
                let d_sq = dist_sq(p.x, p.y, q.x, q.y);
                if d_sq >= max_d_sq {
                    continue;
                }
                let d = d_sq.sqrt();
                let alpha = map_range(d, 0.0, max_d, 1.0, 0.0);
                scene.line(p.position(), q.position(), config.connection_width, color.with_alpha(alpha));
                connections += 1;

                if d < config.connection_tone_distance
                    && rng.gen::<f32>() < config.connection_tone_chance
                {
                    let freq = map_range(d, 0.0, config.connection_tone_distance, 300.0, 800.0);
                    scene.tone(ToneRequest::now(freq, 0.05, 0.02));
                }
            }
        }
        connections
    }

    /// Drop the oldest particles until at most `cap` remain.
    pub fn evict_oldest(&mut self, cap: usize) -> usize {
        let excess = self.particles.len().saturating_sub(cap);
        if excess > 0 {
            self.particles.drain(..excess);
        }
        excess
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::ColorScheme;
    use crate::types::Point;
    use ::rand::rngs::StdRng;
    use ::rand::SeedableRng;

    fn hues() -> HueRange {
        ColorScheme::Lactarius.hue_range()
    }

    fn ctx() -> UpdateContext {
        UpdateContext {
            time: 0.0,
            pointer: Point::new(-500.0, -500.0),
            width: 400.0,
            height: 300.0,
            pointer_radius: 100.0,
            pointer_force: 5.0,
        }
    }

    #[test]
    fn grid_seeding_fills_every_row_band() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut pop = Population::new();
        pop.seed_grid(&mut rng, 100, 400.0, 300.0, hues(), 0.005);
        assert_eq!(pop.len(), 100);
        for p in pop.particles() {
            assert!((0.0..400.0).contains(&p.x) && (0.0..300.0).contains(&p.y));
        }
        // 10x10 grid: each 30px row band holds ten particles
        let top_band = pop.particles().iter().filter(|p| p.y < 30.0).count();
        assert_eq!(top_band, 10);
    }

    #[test]
    fn grid_seeding_handles_non_square_counts() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut pop = Population::new();
        pop.seed_grid(&mut rng, 7, 90.0, 90.0, hues(), 0.005);
        assert_eq!(pop.len(), 7);
        pop.seed_grid(&mut rng, 0, 90.0, 90.0, hues(), 0.005);
        assert_eq!(pop.len(), 7);
    }

    #[test]
    fn eviction_removes_the_oldest_first() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut pop = Population::new();
        let ids: Vec<u64> = (0..12)
            .map(|i| pop.spawn_at(&mut rng, i as f32, 0.0, hues(), 0.005))
            .collect();
        assert_eq!(pop.evict_oldest(20), 0);
        assert_eq!(pop.evict_oldest(5), 7);
        let remaining: Vec<u64> = pop.particles().iter().map(|p| p.id).collect();
        assert_eq!(remaining, ids[7..].to_vec());
    }

    #[test]
    fn sweep_connects_close_pairs_once() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut pop = Population::new();
        pop.spawn_at(&mut rng, 100.0, 100.0, hues(), 0.005);
        pop.spawn_at(&mut rng, 110.0, 100.0, hues(), 0.005);
        pop.spawn_at(&mut rng, 350.0, 250.0, hues(), 0.005);
        let mut scene = Scene::new();
        let config = SimulationConfig::default();
        let lines = pop.sweep(&ctx(), &config, &mut rng, &mut scene);
        // particles move at most ~2px per tick, so only the first pair links
        assert_eq!(lines, 1);
        assert_eq!(scene.line_count(), 1);
        assert_eq!(scene.circle_count(), 3);
    }

    #[test]
    fn very_close_pairs_request_a_tone() {
        let mut rng = StdRng::seed_from_u64(16);
        let mut pop = Population::new();
        pop.spawn_at(&mut rng, 100.0, 100.0, hues(), 0.005);
        pop.spawn_at(&mut rng, 110.0, 100.0, hues(), 0.005);
        // linked but outside the tone distance
        pop.spawn_at(&mut rng, 100.0, 160.0, hues(), 0.005);
        let config = SimulationConfig {
            connection_tone_chance: 1.0,
            ..SimulationConfig::default()
        };
        let mut scene = Scene::new();
        let lines = pop.sweep(&ctx(), &config, &mut rng, &mut scene);
        assert_eq!(lines, 3);
        // ~10px apart maps to ~467 Hz on the 300..800 Hz scale
        assert_eq!(scene.tones.len(), 1);
        let tone = scene.tones[0];
        assert!((415.0..520.0).contains(&tone.frequency), "{tone:?}");
        assert_eq!((tone.duration, tone.delay), (0.05, 0.0));
    }

    #[test]
    fn connection_alpha_fades_with_distance() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut pop = Population::new();
        pop.spawn_at(&mut rng, 100.0, 100.0, hues(), 0.005);
        pop.spawn_at(&mut rng, 200.0, 100.0, hues(), 0.005);
        let mut scene = Scene::new();
        pop.sweep(&ctx(), &SimulationConfig::default(), &mut rng, &mut scene);
        let alpha = scene
            .primitives
            .iter()
            .find_map(|p| match p {
                crate::scene::Primitive::Line { color, .. } => Some(color.a),
                _ => None,
            })
            .expect("pair at ~100px should connect");
        assert!(alpha > 0.0 && alpha < 0.3, "alpha = {alpha}");
    }
}
