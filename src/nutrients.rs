// Nutrient exchange between neighboring particles

use crate::color::dist_sq;
use crate::config::{PairMode, SimulationConfig};
use crate::particle::Particle;

/// Move `rate * (a - b)` from `a` to `b`. Zero-sum by construction.
#[inline]
pub fn exchange(a: &mut f32, b: &mut f32, rate: f32) {
    let diff = (*a - *b) * rate;
    *a -= diff;
    *b += diff;
}

/// Diffusion rate for a pair `d` apart, or `None` when out of range.
#[inline]
fn pair_rate(d_sq: f32, radius: f32, radius_sq: f32, base_rate: f32) -> Option<f32> {
    if d_sq >= radius_sq {
        return None;
    }
    Some(base_rate * (1.0 - d_sq.sqrt() / radius))
}

/// One diffusion pass over the population.
///
/// In `Ordered` mode every pair is visited from both ends, so nutrient can
/// hop more than once per tick depending on order. Only the first particle
/// of a visited pair has its visuals refreshed, matching the pass it belongs to.
pub fn diffuse(particles: &mut [Particle], config: &SimulationConfig) -> usize {
    let radius = config.nutrient_radius;
    let radius_sq = config.nutrient_radius_sq();
    let base = config.diffusion_rate;
    let n = particles.len();
    let mut exchanges = 0;

    for i in 0..n {
        let start = match config.pair_mode {
            PairMode::Ordered => 0,
            PairMode::Unordered => i + 1,
        };
        for j in start..n {
            if i == j {
                continue;
            }
            let (pi, pj) = pair_mut(particles, i, j);
            let Some(rate) = pair_rate(dist_sq(pi.x, pi.y, pj.x, pj.y), radius, radius_sq, base)
            else {
                continue;
            };
            exchange(&mut pi.nutrient, &mut pj.nutrient, rate);
            pi.refresh_from_nutrient();
            if config.pair_mode == PairMode::Unordered {
                pj.refresh_from_nutrient();
            }
            exchanges += 1;
        }
    }
    exchanges
}

fn pair_mut(particles: &mut [Particle], i: usize, j: usize) -> (&mut Particle, &mut Particle) {
    debug_assert_ne!(i, j);
    if i < j {
        let (left, right) = particles.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = particles.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}
