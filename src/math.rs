//! Pure computation helpers extracted for testability.
//!
//! All functions in this module are free of Bevy ECS dependencies and operate
//! on plain numeric / `Vec3` / colour inputs, making them straightforward to unit-test.

use bevy::prelude::{LinearRgba, Vec3};

/// Maps a noise value from the standard `[-1, 1]` range into `[min, max]`.
///
/// Noise generators (e.g. `Fbm<Perlin>`) produce values centred around zero.
/// This linearly rescales to an arbitrary output range.
///
/// # Examples
/// ```
/// # use hex_map::math::map_noise_to_range;
/// assert_eq!(map_noise_to_range(-1.0, 0.0, 10.0), 0.0);
/// assert_eq!(map_noise_to_range( 1.0, 0.0, 10.0), 10.0);
/// assert_eq!(map_noise_to_range( 0.0, 2.0, 6.0),  4.0);
/// ```
pub fn map_noise_to_range(noise_val: f64, min: f32, max: f32) -> f32 {
    min + ((noise_val as f32 + 1.0) / 2.0) * (max - min)
}

/// Computes the face normal of a triangle defined by three vertices.
///
/// Uses the cross product of edges `(v1 - v0)` and `(v2 - v0)`.
/// Returns `Vec3::ZERO` if the triangle is degenerate (collinear points).
pub fn compute_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    edge1.cross(edge2).normalize_or_zero()
}

/// Like [`compute_normal`], but flipped to face upward.
///
/// The map mesh is rendered double-sided, so winding carries no meaning and
/// lighting only needs a consistent hemisphere. Vertical walls keep whatever
/// horizontal direction the cross product produced.
pub fn upward_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    let n = compute_normal(v0, v1, v2);
    if n.y < 0.0 { -n } else { n }
}

/// Horizontal fraction of terrace step `step` out of `total`.
pub fn terrace_horizontal(step: u32, total: u32) -> f32 {
    step as f32 / total as f32
}

/// Vertical fraction of terrace step `step` out of `total`.
///
/// Odd steps rise, even steps stay level, so a slope becomes a staircase of
/// flat treads separated by risers.
pub fn terrace_vertical(step: u32, total: u32) -> f32 {
    let rises = total.div_ceil(2).max(1);
    ((step + 1) / 2) as f32 / rises as f32
}

/// Interpolates from `a` to `b` along a terraced slope.
///
/// `step` ranges over `0..=total`; step 0 returns `a` and step `total`
/// returns `b`. Horizontal position advances uniformly while height advances
/// only on odd steps.
///
/// # Examples
/// ```
/// # use bevy::prelude::Vec3;
/// # use hex_map::math::terrace_lerp;
/// let a = Vec3::new(0.0, 0.0, 0.0);
/// let b = Vec3::new(5.0, 3.0, 0.0);
/// assert_eq!(terrace_lerp(a, b, 0, 5), a);
/// assert_eq!(terrace_lerp(a, b, 5, 5), b);
/// ```
pub fn terrace_lerp(a: Vec3, b: Vec3, step: u32, total: u32) -> Vec3 {
    if step == 0 {
        return a;
    }
    if step >= total {
        return b;
    }
    let h = terrace_horizontal(step, total);
    let v = terrace_vertical(step, total);
    Vec3::new(
        a.x + (b.x - a.x) * h,
        a.y + (b.y - a.y) * v,
        a.z + (b.z - a.z) * h,
    )
}

/// Component-wise linear interpolation between two colours.
pub fn lerp_color(a: LinearRgba, b: LinearRgba, t: f32) -> LinearRgba {
    LinearRgba::new(
        a.red + (b.red - a.red) * t,
        a.green + (b.green - a.green) * t,
        a.blue + (b.blue - a.blue) * t,
        a.alpha + (b.alpha - a.alpha) * t,
    )
}

/// Colour blend matching [`terrace_lerp`]: advances with the horizontal fraction.
pub fn terrace_color_lerp(a: LinearRgba, b: LinearRgba, step: u32, total: u32) -> LinearRgba {
    if step >= total {
        return b;
    }
    lerp_color(a, b, terrace_horizontal(step, total))
}

/// Camera offset from its focus for an orbit at `yaw` around Y and `pitch`
/// above the horizon, `distance` away.
///
/// Yaw 0 places the camera on the +Z side of the focus.
pub fn orbit_offset(yaw: f32, pitch: f32, distance: f32) -> Vec3 {
    let (sy, cy) = yaw.sin_cos();
    let (sp, cp) = pitch.sin_cos();
    Vec3::new(sy * cp, sp, cy * cp) * distance
}
