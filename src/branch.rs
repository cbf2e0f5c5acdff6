// Recursive branching growth. Each node draws one segment and fans out into
// at least two children one level shallower.

use ::rand as external_rand;
use external_rand::Rng;

use crate::color::{hsba, map_range};
use crate::scene::{Scene, ToneRequest};
use crate::types::Point;

/// Per-invocation growth settings. Built once per growth event.
#[derive(Clone, Copy, Debug)]
pub struct GrowthStyle {
    pub hue_offset: f32,
    // segments at this depth are fully opaque
    pub max_depth: u32,
    pub tone_chance: f32,
}

impl GrowthStyle {
    pub fn for_frame(frame_count: u64, max_depth: u32, tone_chance: f32) -> Self {
        Self {
            hue_offset: (frame_count % 360) as f32,
            max_depth: max_depth.max(1),
            tone_chance,
        }
    }
}

/// Result of one top-level growth call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrowthOutcome {
    pub segments: usize,
    /// Far end of the first segment; the origin when nothing was drawn.
    pub root_end: Point,
}

pub struct Growth<'a, R: Rng> {
    rng: &'a mut R,
    scene: &'a mut Scene,
    style: GrowthStyle,
    segments: usize,
}

impl<'a, R: Rng> Growth<'a, R> {
    pub fn new(rng: &'a mut R, scene: &'a mut Scene, style: GrowthStyle) -> Self {
        Self {
            rng,
            scene,
            style,
            segments: 0,
        }
    }

    pub fn grow(&mut self, x: f32, y: f32, angle: f32, length: f32, depth: u32) -> GrowthOutcome {
        let before = self.segments;
        let root_end = self.branch(x, y, angle, length, depth);
        GrowthOutcome {
            segments: self.segments - before,
            root_end,
        }
    }

    fn branch(&mut self, x: f32, y: f32, angle: f32, length: f32, depth: u32) -> Point {
        if depth == 0 {
            return Point::new(x, y);
        }

        let end_x = x + angle.cos() * length;
        let end_y = y + angle.sin() * length;

        let hue = self.style.hue_offset + depth as f32 * 20.0;
        let alpha = depth as f32 / self.style.max_depth as f32;
        self.scene.line(
            Point::new(x, y),
            Point::new(end_x, end_y),
            depth as f32 * 0.5,
            hsba(hue, 80.0, 90.0, alpha),
        );
        self.segments += 1;

        if depth >= 3 && self.rng.gen::<f32>() < self.style.tone_chance {
            let freq = map_range(depth as f32, 1.0, 5.0, 800.0, 200.0);
            self.scene.tone(ToneRequest::now(freq, 0.1, 0.05));
        }

        let fan_out = ((self.rng.gen::<f32>() * (depth + 2) as f32).floor() as usize).max(2);
        for _ in 0..fan_out {
            let turn = (self.rng.gen::<f32>() - 0.5) * 1.4;
            let shrink = 0.6 + self.rng.gen::<f32>() * 0.3;
            self.branch(end_x, end_y, angle + turn, length * shrink, depth - 1);
        }
        Point::new(end_x, end_y)
    }
}
