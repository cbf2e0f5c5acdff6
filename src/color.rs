// Color and scalar helpers shared by the particle, branch and orchestrator code.

use crate::types::Rgba;

/// HSB to RGB. Hue wraps modulo 360 (negative hues included), saturation
/// and brightness are clamped to `[0, 100]`.
pub fn hsb_to_rgb(h: f32, s: f32, b: f32) -> [u8; 3] {
    let h = h.rem_euclid(360.0);
    let s = s.clamp(0.0, 100.0) / 100.0;
    let b = b.clamp(0.0, 100.0) / 100.0;

    let k = |n: f32| (n + h / 60.0) % 6.0;
    let f = |n: f32| b * (1.0 - s * k(n).min(4.0 - k(n)).min(1.0).max(0.0));
    let channel = |n: f32| (255.0 * f(n)).round().clamp(0.0, 255.0) as u8;

    [channel(5.0), channel(3.0), channel(1.0)]
}

pub fn hsba(h: f32, s: f32, b: f32, alpha: f32) -> Rgba {
    let [r, g, bl] = hsb_to_rgb(h, s, b);
    Rgba::new(r, g, bl, alpha.clamp(0.0, 1.0))
}

/// Linearly re-map `value` from `[start1, stop1]` onto `[start2, stop2]`.
/// Not clamped. A zero-width source range maps everything to `start2`.
pub fn map_range(value: f32, start1: f32, stop1: f32, start2: f32, stop2: f32) -> f32 {
    let span = stop1 - start1;
    if span == 0.0 {
        return start2;
    }
    start2 + (stop2 - start2) * ((value - start1) / span)
}

#[inline]
pub fn dist(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    dist_sq(x1, y1, x2, y2).sqrt()
}

#[inline]
pub fn dist_sq(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    dx * dx + dy * dy
}
