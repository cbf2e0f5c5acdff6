// Pointer/keyboard snapshot consumed by each tick

use ::rand as external_rand;
use external_rand::Rng;
use serde::Serialize;

use crate::config::{PaletteMode, MIN_VIEWPORT};
use crate::types::Point;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HueRange {
    pub min: f32,
    pub max: f32,
}

impl HueRange {
    #[cfg(test)]
    pub fn contains(&self, hue: f32) -> bool {
        hue >= self.min && hue <= self.max
    }
}

/// Color schemes named after the fungi they imitate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ColorScheme {
    Lactarius,
    Amanita,
    Cortinarius,
    Lichen,
    Chanterelle,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 5] = [
        ColorScheme::Lactarius,
        ColorScheme::Amanita,
        ColorScheme::Cortinarius,
        ColorScheme::Lichen,
        ColorScheme::Chanterelle,
    ];

    pub fn hue_range(self) -> HueRange {
        let (min, max) = match self {
            ColorScheme::Lactarius => (180.0, 240.0),
            ColorScheme::Amanita => (0.0, 30.0),
            ColorScheme::Cortinarius => (270.0, 330.0),
            ColorScheme::Lichen => (60.0, 120.0),
            ColorScheme::Chanterelle => (30.0, 60.0),
        };
        HueRange { min, max }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

// The only mutable state shared between input handling and the tick
#[derive(Clone, Debug, Serialize)]
pub struct InteractionState {
    pub pointer: Point,
    pub pressed: bool,
    pub scheme: ColorScheme,
    // ms timestamp of the last growth
    pub last_growth_ms: Option<f64>,
    pub frame_count: u64,
    pub width: f32,
    pub height: f32,
}

impl InteractionState {
    pub fn new(width: f32, height: f32) -> Self {
        let width = width.max(MIN_VIEWPORT);
        let height = height.max(MIN_VIEWPORT);
        Self {
            pointer: Point::new(width / 2.0, height / 2.0),
            pressed: false,
            scheme: ColorScheme::Lactarius,
            last_growth_ms: None,
            frame_count: 0,
            width,
            height,
        }
    }

    pub fn hue_range(&self) -> HueRange {
        self.scheme.hue_range()
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.pointer = Point::new(x, y);
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.pointer = Point::new(x, y);
        self.pressed = true;
    }

    pub fn pointer_up(&mut self) {
        self.pressed = false;
    }

    /// Clamps to at least 1x1 so wrap arithmetic never divides by zero.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = if width.is_finite() { width.max(MIN_VIEWPORT) } else { MIN_VIEWPORT };
        self.height = if height.is_finite() { height.max(MIN_VIEWPORT) } else { MIN_VIEWPORT };
    }

    pub fn cycle_scheme<R: Rng>(&mut self, mode: PaletteMode, rng: &mut R) -> ColorScheme {
        self.scheme = match mode {
            PaletteMode::Cycle => self.scheme.next(),
            PaletteMode::Random => ColorScheme::ALL[rng.gen_range(0..ColorScheme::ALL.len())],
        };
        self.scheme
    }

    /// Idle / growth-eligible gate. Eligible while pressed once strictly more
    /// than `interval_ms` has passed since the last growth.
    pub fn growth_due(&self, now_ms: f64, interval_ms: f64) -> bool {
        if !self.pressed {
            return false;
        }
        match self.last_growth_ms {
            None => true,
            Some(last) => now_ms - last > interval_ms,
        }
    }

    pub fn mark_growth(&mut self, now_ms: f64) {
        self.last_growth_ms = Some(now_ms);
    }

    pub fn noise_time(&self, time_scale: f32) -> f32 {
        self.frame_count as f32 * time_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::rand::rngs::StdRng;
    use ::rand::SeedableRng;

    #[test]
    fn cycling_walks_the_palette_in_order() {
        let mut state = InteractionState::new(100.0, 100.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = vec![state.scheme];
        for _ in 0..ColorScheme::ALL.len() {
            seen.push(state.cycle_scheme(PaletteMode::Cycle, &mut rng));
        }
        assert_eq!(&seen[..5], &ColorScheme::ALL);
        assert_eq!(seen[5], ColorScheme::Lactarius);
    }

    #[test]
    fn random_mode_stays_inside_the_palette() {
        let mut state = InteractionState::new(100.0, 100.0);
        let mut rng = StdRng::seed_from_u64(99);
        let ranges: Vec<HueRange> = ColorScheme::ALL.iter().map(|s| s.hue_range()).collect();
        for _ in 0..200 {
            state.cycle_scheme(PaletteMode::Random, &mut rng);
            assert!(ranges.contains(&state.hue_range()));
        }
    }

    #[test]
    fn resize_clamps_degenerate_viewports() {
        let mut state = InteractionState::new(0.0, -5.0);
        assert_eq!((state.width, state.height), (1.0, 1.0));
        state.resize(640.0, 0.0);
        assert_eq!((state.width, state.height), (640.0, 1.0));
        state.resize(f32::NAN, 480.0);
        assert_eq!((state.width, state.height), (1.0, 480.0));
    }

    #[test]
    fn growth_gate_is_rate_limited() {
        let mut state = InteractionState::new(100.0, 100.0);
        assert!(!state.growth_due(0.0, 300.0), "idle while released");
        state.pointer_down(10.0, 10.0);
        assert!(state.growth_due(0.0, 300.0), "first growth is immediate");
        state.mark_growth(0.0);
        assert!(!state.growth_due(300.0, 300.0));
        assert!(state.growth_due(300.5, 300.0));
        state.pointer_up();
        assert!(!state.growth_due(10_000.0, 300.0));
    }
}
