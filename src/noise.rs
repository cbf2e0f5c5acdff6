// Motion substrate: three interfering sinusoids, not gradient noise

/// Sample the field at `(x, y, z)`. Always within `[0, 1]`.
#[inline]
pub fn sample(x: f32, y: f32, z: f32) -> f32 {
    let wave = (x * 10.0 + y * 8.0 + z * 6.0).sin() * 0.5
        + (x * 8.0 - y * 12.0 + z * 4.0).cos() * 0.3
        + (y * 6.0 - x * 4.0 + z * 8.0).sin() * 0.2;
    // Weights sum to 1, so `wave` is in [-1, 1]; the clamp absorbs rounding.
    (wave * 0.5 + 0.5).clamp(0.0, 1.0)
}

/// Map a sample in `[0, 1]` to an angle in `[-PI, PI]`.
#[inline]
pub fn to_angle(value: f32) -> f32 {
    (value * 2.0 - 1.0) * std::f32::consts::PI
}
