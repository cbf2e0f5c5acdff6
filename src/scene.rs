// One tick's output: draw primitives and tone requests, drained once per frame

use serde::Serialize;

use crate::types::{Point, Rgba};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Rotation {
    pub angle: f32,
    pub pivot: Point,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Primitive {
    Circle {
        center: Point,
        radius: f32,
        color: Rgba,
    },
    Line {
        from: Point,
        to: Point,
        width: f32,
        color: Rgba,
    },
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgba,
        rotation: Option<Rotation>,
    },
    /// Horizontal band of the surface redrawn `shift` pixels to the right.
    GlitchSlice { y: f32, height: f32, shift: f32 },
}

/// Fire-and-forget sound request. `delay` is seconds from the frame that
/// emitted it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ToneRequest {
    pub frequency: f32,
    pub duration: f32,
    pub volume: f32,
    pub delay: f32,
}

impl ToneRequest {
    pub fn now(frequency: f32, duration: f32, volume: f32) -> Self {
        Self {
            frequency,
            duration,
            volume: volume.clamp(0.0, 1.0),
            delay: 0.0,
        }
    }

    pub fn delayed(self, delay: f32) -> Self {
        Self {
            delay: delay.max(0.0),
            ..self
        }
    }
}

#[derive(Debug, Default)]
pub struct Scene {
    pub primitives: Vec<Primitive>,
    pub tones: Vec<ToneRequest>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.primitives.clear();
        self.tones.clear();
    }

    pub fn push(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn line(&mut self, from: Point, to: Point, width: f32, color: Rgba) {
        self.primitives.push(Primitive::Line {
            from,
            to,
            width,
            color,
        });
    }

    pub fn tone(&mut self, tone: ToneRequest) {
        self.tones.push(tone);
    }

    #[cfg(test)]
    pub fn line_count(&self) -> usize {
        self.primitives
            .iter()
            .filter(|p| matches!(p, Primitive::Line { .. }))
            .count()
    }

    #[cfg(test)]
    pub fn circle_count(&self) -> usize {
        self.primitives
            .iter()
            .filter(|p| matches!(p, Primitive::Circle { .. }))
            .count()
    }
}
