use ::rand as external_rand;
use external_rand::Rng;
use macroquad::prelude::*;
use tracing::info;

use crate::audio::TonePlayer;
use crate::scene::Scene;
use crate::simulation::{Simulation, StopSignal};

pub struct ControlText {
    pub text: &'static str,
    pub font_size: f32,
    pub color: Color,
}

/// Translate this frame's raw input into simulation calls.
pub fn handle_controls<R: Rng>(
    sim: &mut Simulation,
    rng: &mut R,
    scene: &mut Scene,
    audio: &mut TonePlayer,
    stop: &StopSignal,
    now_ms: f64,
) {
    let (mx, my) = mouse_position();
    if (mx, my) != (sim.interaction.pointer.x, sim.interaction.pointer.y) {
        sim.pointer_move(mx, my);
    }

    if is_mouse_button_pressed(MouseButton::Left) {
        // Browsers only allow sound after a gesture; keep the same contract
        audio.activate();
        sim.pointer_down(mx, my, now_ms, rng, scene);
    }
    if is_mouse_button_released(MouseButton::Left) {
        sim.pointer_up();
    }

    if is_key_pressed(KeyCode::Space) {
        sim.cycle_color_scheme(rng, scene);
    }

    if is_key_pressed(KeyCode::Enter) {
        sim.toggle_pause();
    }

    if is_key_pressed(KeyCode::R) {
        sim.reset(rng);
    }

    if is_key_pressed(KeyCode::M) {
        sim.toggle_moire();
    }

    if is_key_pressed(KeyCode::G) {
        sim.toggle_glitch();
    }

    // Screenshot (P key), taken at the end of the frame
    if is_key_pressed(KeyCode::P) {
        sim.request_screenshot();
    }

    // Help popup (F1 key, or Escape to close when visible)
    if is_key_pressed(KeyCode::F1) {
        sim.toggle_help_popup();
    } else if is_key_pressed(KeyCode::Escape) {
        if sim.help_popup_visible {
            sim.help_popup_visible = false;
        } else {
            info!("quit requested");
            stop.stop();
        }
    }
}

pub fn get_controls_text() -> Vec<ControlText> {
    let line = |text: &'static str| ControlText {
        text,
        font_size: 16.0,
        color: Color::new(1.0, 1.0, 1.0, 0.8),
    };
    vec![
        line("LMB (hold) = Grow mycelium | Move = Repel particles"),
        line("SPACE = Change color scheme"),
        line("ENTER = Pause | R = Reset"),
        line("M = Moire layer | G = Glitch effect"),
        line("P = Screenshot | F1 = Help | ESC = Quit"),
    ]
}
