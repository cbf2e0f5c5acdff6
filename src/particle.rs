use ::rand as external_rand;
use external_rand::Rng;
use std::f32::consts::{PI, TAU};

use crate::color::{dist, hsba, map_range};
use crate::config::SimulationConfig;
use crate::interaction::HueRange;
use crate::noise;
use crate::scene::Primitive;
use crate::types::Point;

/// Per-tick inputs a particle reacts to.
#[derive(Clone, Copy, Debug)]
pub struct UpdateContext {
    pub time: f32,
    pub pointer: Point,
    pub width: f32,
    pub height: f32,
    pub pointer_radius: f32,
    pub pointer_force: f32,
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    pub hue: f32,
    pub saturation: f32,
    pub brightness: f32,
    pub nutrient: f32,
    // Depth oscillation, drawn as size/opacity only
    pub z: f32,
    pub vz: f32,
    // Motion parameters, fixed at creation
    pub speed: f32,
    pub noise_scale_x: f32,
    pub noise_scale_y: f32,
    pub noise_offset_x: f32,
    pub noise_offset_y: f32,
}

impl Particle {
    pub fn new<R: Rng>(
        rng: &mut R,
        id: u64,
        x: f32,
        y: f32,
        hues: HueRange,
        noise_scale: f32,
    ) -> Self {
        Self {
            id,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            size: 3.0 + rng.gen::<f32>() * 5.0,
            hue: hues.min + rng.gen::<f32>() * (hues.max - hues.min),
            saturation: 80.0 + rng.gen::<f32>() * 20.0,
            brightness: 80.0 + rng.gen::<f32>() * 20.0,
            nutrient: rng.gen::<f32>(),
            z: rng.gen::<f32>() * 2.0 - 1.0,
            vz: (rng.gen::<f32>() - 0.5) * 0.02,
            speed: 0.5 + rng.gen::<f32>() * 1.5,
            noise_scale_x: noise_scale * (0.7 + rng.gen::<f32>() * 0.6),
            noise_scale_y: noise_scale * (0.7 + rng.gen::<f32>() * 0.6),
            noise_offset_x: rng.gen::<f32>() * 1000.0,
            noise_offset_y: rng.gen::<f32>() * 1000.0,
        }
    }

    pub fn update(&mut self, ctx: &UpdateContext) {
        let nx = noise::sample(
            self.x * self.noise_scale_x + self.noise_offset_x,
            self.y * self.noise_scale_x,
            ctx.time,
        );
        let ny = noise::sample(
            self.x * self.noise_scale_y,
            self.y * self.noise_scale_y + self.noise_offset_y,
            ctx.time + 50.0,
        );

        self.vx = noise::to_angle(nx).cos() * self.speed;
        self.vy = noise::to_angle(ny).sin() * self.speed;

        // Pointer repulsion, strongest at the pointer and fading to zero at the radius
        let d = dist(self.x, self.y, ctx.pointer.x, ctx.pointer.y);
        if d < ctx.pointer_radius {
            let force = map_range(d, 0.0, ctx.pointer_radius, ctx.pointer_force, 0.0);
            let away = (self.y - ctx.pointer.y).atan2(self.x - ctx.pointer.x);
            self.vx += away.cos() * force;
            self.vy += away.sin() * force;
        }

        self.x += self.vx;
        self.y += self.vy;

        self.z += self.vz;
        if self.z.abs() > 1.0 {
            self.vz = -self.vz;
        }

        self.x = wrap(self.x, ctx.width);
        self.y = wrap(self.y, ctx.height);
    }

    /// Size and brightness follow the nutrient level.
    pub fn refresh_from_nutrient(&mut self) {
        self.size = 3.0 + self.nutrient * 5.0;
        self.brightness = 70.0 + self.nutrient * 30.0;
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn draw(&self, depth_effect: bool) -> Primitive {
        let (size_mul, alpha) = if depth_effect {
            (
                map_range(self.z, -1.0, 1.0, 0.5, 1.5),
                map_range(self.z, -1.0, 1.0, 0.7, 1.0),
            )
        } else {
            (1.0, 1.0)
        };
        Primitive::Circle {
            center: self.position(),
            radius: (self.size * size_mul).max(0.1),
            color: hsba(self.hue, self.saturation, self.brightness, alpha),
        }
    }
}

impl UpdateContext {
    pub fn from_config(config: &SimulationConfig, time: f32, pointer: Point, width: f32, height: f32) -> Self {
        Self {
            time,
            pointer,
            width,
            height,
            pointer_radius: config.pointer_radius,
            pointer_force: config.pointer_force,
        }
    }
}

/// Toroidal wrap into `[0, extent)`, for any finite input.
#[inline]
pub fn wrap(value: f32, extent: f32) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    let wrapped = value.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs
    if wrapped >= extent {
        0.0
    } else {
        wrapped
    }
}

pub fn random_heading<R: Rng>(rng: &mut R) -> f32 {
    rng.gen::<f32>() * TAU
}

pub const UPWARD: f32 = -PI / 2.0;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::ColorScheme;
    use ::rand::rngs::StdRng;
    use ::rand::SeedableRng;

    fn ctx(pointer: Point) -> UpdateContext {
        UpdateContext {
            time: 0.37,
            pointer,
            width: 200.0,
            height: 100.0,
            pointer_radius: 100.0,
            pointer_force: 5.0,
        }
    }

    fn particle(rng: &mut StdRng, x: f32, y: f32) -> Particle {
        Particle::new(rng, 0, x, y, ColorScheme::Lactarius.hue_range(), 0.005)
    }

    #[test]
    fn wrap_maps_any_position_into_bounds() {
        for v in [-1e6, -200.0, -0.0, -1e-9, 0.0, 199.999, 200.0, 450.5, 1e7] {
            let w = wrap(v, 200.0);
            assert!((0.0..200.0).contains(&w), "{v} wrapped to {w}");
        }
        assert_eq!(wrap(-10.0, 200.0), 190.0);
        assert_eq!(wrap(210.0, 200.0), 10.0);
    }

    #[test]
    fn update_keeps_particles_on_the_torus() {
        let mut rng = StdRng::seed_from_u64(7);
        let starts = [(-50.0, -50.0), (0.0, 0.0), (250.0, 30.0), (199.9, 99.9), (-1e4, 3e4)];
        for (x, y) in starts {
            let mut p = particle(&mut rng, x, y);
            for step in 0..50 {
                let pointer = Point::new((step * 13 % 200) as f32, 50.0);
                p.update(&ctx(pointer));
                assert!((0.0..200.0).contains(&p.x), "x = {}", p.x);
                assert!((0.0..100.0).contains(&p.y), "y = {}", p.y);
            }
        }
    }

    #[test]
    fn velocity_is_overwritten_not_accumulated() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut p = particle(&mut rng, 50.0, 50.0);
        let far = Point::new(-1000.0, -1000.0);
        p.vx = 1e4;
        p.vy = -1e4;
        p.update(&ctx(far));
        assert!(p.vx.abs() <= p.speed + 1e-4);
        assert!(p.vy.abs() <= p.speed + 1e-4);
    }

    #[test]
    fn pointer_pushes_particles_away() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut near = particle(&mut rng, 60.0, 50.0);
        let speed = near.speed;
        near.update(&ctx(Point::new(50.0, 50.0)));
        // force at d = 10 is 4.5, larger than any noise-driven speed
        assert!(near.vx > 4.5 - speed - 1e-3, "vx = {}", near.vx);
    }

    #[test]
    fn nutrient_drives_size_and_brightness() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut p = particle(&mut rng, 0.0, 0.0);
        p.nutrient = 1.0;
        p.refresh_from_nutrient();
        assert_eq!((p.size, p.brightness), (8.0, 100.0));
        p.nutrient = 0.0;
        p.refresh_from_nutrient();
        assert_eq!((p.size, p.brightness), (3.0, 70.0));
    }

    #[test]
    fn new_particles_use_the_active_hue_range() {
        let mut rng = StdRng::seed_from_u64(21);
        let range = ColorScheme::Cortinarius.hue_range();
        for i in 0..100 {
            let p = Particle::new(&mut rng, i, 1.0, 1.0, range, 0.005);
            assert!(range.contains(p.hue));
            assert!((0.0..=1.0).contains(&p.nutrient));
            assert!(p.size > 0.0);
        }
    }

    #[test]
    fn depth_reflects_at_the_bounds() {
        let mut rng = StdRng::seed_from_u64(14);
        let far = Point::new(-1000.0, -1000.0);
        let mut p = particle(&mut rng, 50.0, 50.0);
        p.z = 0.995;
        p.vz = 0.01;
        p.update(&ctx(far));
        assert!(p.z > 1.0);
        assert_eq!(p.vz, -0.01);
        p.update(&ctx(far));
        assert!(p.z < 1.0);
        assert_eq!(p.vz, -0.01, "no second flip once back inside");

        let mut q = particle(&mut rng, 20.0, 20.0);
        let step = q.vz.abs();
        for _ in 0..2_000 {
            q.update(&ctx(far));
            assert!(q.z.abs() <= 1.0 + step + 1e-5, "z = {}", q.z);
        }
    }

    #[test]
    fn depth_scales_radius_and_opacity() {
        let mut rng = StdRng::seed_from_u64(15);
        let mut p = particle(&mut rng, 10.0, 10.0);
        p.size = 4.0;

        let radius_alpha = |p: &Particle, depth_effect: bool| match p.draw(depth_effect) {
            Primitive::Circle { radius, color, .. } => (radius, color.a),
            other => panic!("expected a circle, got {other:?}"),
        };

        p.z = 1.0;
        let (r, a) = radius_alpha(&p, true);
        assert!((r - 6.0).abs() < 1e-5 && (a - 1.0).abs() < 1e-5, "near: {r} {a}");
        p.z = -1.0;
        let (r, a) = radius_alpha(&p, true);
        assert!((r - 2.0).abs() < 1e-5 && (a - 0.7).abs() < 1e-5, "far: {r} {a}");
        // without the depth effect z is ignored
        assert_eq!(radius_alpha(&p, false), (4.0, 1.0));
    }

    #[test]
    fn draw_does_not_mutate() {
        let mut rng = StdRng::seed_from_u64(8);
        let p = particle(&mut rng, 10.0, 20.0);
        let before = (p.x, p.y, p.size, p.nutrient, p.z);
        let prim = p.draw(true);
        assert_eq!(before, (p.x, p.y, p.size, p.nutrient, p.z));
        match prim {
            Primitive::Circle { center, radius, .. } => {
                assert_eq!(center, Point::new(10.0, 20.0));
                assert!(radius > 0.0);
            }
            other => panic!("expected a circle, got {other:?}"),
        }
    }
}
