use macroquad::prelude::*;

use crate::controls::get_controls_text;
use crate::scene::{Primitive, Rotation, Scene};
use crate::simulation::Simulation;
use crate::types::{Point, Rgba};

const INTRO_FRAMES: u64 = 240;

fn to_color(c: Rgba) -> Color {
    Color::new(
        c.r as f32 / 255.0,
        c.g as f32 / 255.0,
        c.b as f32 / 255.0,
        c.a,
    )
}

fn rotate(p: Point, r: &Rotation) -> Vec2 {
    let (sin, cos) = r.angle.sin_cos();
    let dx = p.x - r.pivot.x;
    let dy = p.y - r.pivot.y;
    vec2(
        r.pivot.x + dx * cos - dy * sin,
        r.pivot.y + dx * sin + dy * cos,
    )
}

// Persistent drawing surface. The fade rect in each scene clears old strokes
pub struct Canvas {
    target: RenderTarget,
    camera: Camera2D,
    // copy of the surface that glitch slices are read back from
    scratch: RenderTarget,
    scratch_camera: Camera2D,
    width: u32,
    height: u32,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        let (w, h) = (width.max(1.0) as u32, height.max(1.0) as u32);
        let target = render_target(w, h);
        target.texture.set_filter(FilterMode::Linear);
        let mut camera = Camera2D::from_display_rect(Rect::new(0.0, 0.0, w as f32, h as f32));
        camera.render_target = Some(target.clone());

        let scratch = render_target(w, h);
        scratch.texture.set_filter(FilterMode::Nearest);
        let mut scratch_camera = Camera2D::from_display_rect(Rect::new(0.0, 0.0, w as f32, h as f32));
        scratch_camera.render_target = Some(scratch.clone());

        set_camera(&camera);
        clear_background(BLACK);
        set_default_camera();

        Self {
            target,
            camera,
            scratch,
            scratch_camera,
            width: w,
            height: h,
        }
    }

    // true when the surface was recreated
    pub fn fit(&mut self, width: f32, height: f32) -> bool {
        let (w, h) = (width.max(1.0) as u32, height.max(1.0) as u32);
        if (w, h) == (self.width, self.height) {
            return false;
        }
        *self = Self::new(width, height);
        true
    }

    pub fn texture(&self) -> &Texture2D {
        &self.target.texture
    }

    pub fn draw_scene(&self, scene: &Scene) {
        set_camera(&self.camera);
        for primitive in &scene.primitives {
            match primitive {
                Primitive::Circle {
                    center,
                    radius,
                    color,
                } => draw_circle(center.x, center.y, *radius, to_color(*color)),
                Primitive::Line {
                    from,
                    to,
                    width,
                    color,
                } => draw_line(from.x, from.y, to.x, to.y, *width, to_color(*color)),
                Primitive::Rect {
                    x,
                    y,
                    w,
                    h,
                    color,
                    rotation: None,
                } => draw_rectangle(*x, *y, *w, *h, to_color(*color)),
                Primitive::Rect {
                    x,
                    y,
                    w,
                    h,
                    color,
                    rotation: Some(rotation),
                } => {
                    let corners = [
                        Point::new(*x, *y),
                        Point::new(x + w, *y),
                        Point::new(x + w, y + h),
                        Point::new(*x, y + h),
                    ]
                    .map(|p| rotate(p, rotation));
                    let color = to_color(*color);
                    draw_triangle(corners[0], corners[1], corners[2], color);
                    draw_triangle(corners[0], corners[2], corners[3], color);
                }
                Primitive::GlitchSlice { y, height, shift } => {
                    self.displace_slice(*y, *height, *shift)
                }
            }
        }
        set_default_camera();
    }

    // Tear a band of the surface sideways in place; it fades with the trails
    fn displace_slice(&self, y: f32, height: f32, shift: f32) {
        let (w, h) = (self.width as f32, self.height as f32);
        let slice_h = height.min(h - y);
        if slice_h <= 0.0 {
            return;
        }

        // A render target can't be sampled while drawn into; go through the scratch copy.
        // Both copies go through identical cameras, so rows line up without flipping.
        set_camera(&self.scratch_camera);
        clear_background(BLACK);
        draw_texture_ex(
            &self.target.texture,
            0.0,
            0.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(w, h)),
                ..Default::default()
            },
        );

        set_camera(&self.camera);
        draw_texture_ex(
            &self.scratch.texture,
            shift,
            y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(w, slice_h)),
                source: Some(Rect::new(0.0, y, w, slice_h)),
                ..Default::default()
            },
        );
    }

    pub fn present(&self) {
        let (w, h) = (self.width as f32, self.height as f32);
        clear_background(BLACK);
        draw_texture_ex(
            &self.target.texture,
            0.0,
            0.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(w, h)),
                flip_y: true,
                ..Default::default()
            },
        );
    }
}

pub fn draw_stats_and_help(sim: &Simulation) {
    let (count, _total, mean) = sim.stats();
    let stats_text = format!(
        "Particles: {} | Mean nutrient: {:.2} | Scheme: {:?} | FPS: {}",
        count,
        mean,
        sim.interaction.scheme,
        get_fps(),
    );
    draw_text(&stats_text, 10.0, screen_height() - 12.0, 16.0, Color::new(1.0, 1.0, 1.0, 0.6));
    if sim.paused {
        draw_text("PAUSED - Press ENTER to resume", 10.0, 24.0, 20.0, YELLOW);
    }

    let frame = sim.interaction.frame_count;
    if frame < INTRO_FRAMES {
        let alpha = 1.0 - frame as f32 / INTRO_FRAMES as f32;
        for (i, line) in [
            "Click and drag to grow mycelium network",
            "Press spacebar to change colors",
        ]
        .iter()
        .enumerate()
        {
            let size = measure_text(line, None, 16, 1.0);
            draw_text(
                line,
                (screen_width() - size.width) / 2.0,
                30.0 + i as f32 * 25.0,
                16.0,
                Color::new(1.0, 1.0, 1.0, alpha),
            );
        }
    }
}

pub fn draw_help_popup() {
    let lines = get_controls_text();
    let width = 460.0;
    let height = 40.0 + lines.len() as f32 * 22.0;
    let x = (screen_width() - width) / 2.0;
    let y = (screen_height() - height) / 2.0;

    draw_rectangle(x, y, width, height, Color::new(0.0, 0.0, 0.0, 0.8));
    draw_rectangle_lines(x, y, width, height, 2.0, Color::new(1.0, 1.0, 1.0, 0.5));
    draw_text("Controls", x + 16.0, y + 28.0, 22.0, WHITE);
    for (i, line) in lines.iter().enumerate() {
        draw_text(
            line.text,
            x + 16.0,
            y + 54.0 + i as f32 * 22.0,
            line.font_size,
            line.color,
        );
    }
}

pub fn draw_help_hint() {
    let hint_text = "Press F1 for controls";
    let hint_font_size = 16.0;
    let hint_width = measure_text(hint_text, None, hint_font_size as u16, 1.0).width;
    draw_text(
        hint_text,
        screen_width() - hint_width - 10.0,
        screen_height() - 12.0,
        hint_font_size,
        Color::new(0.7, 0.7, 0.7, 0.6),
    );
}
