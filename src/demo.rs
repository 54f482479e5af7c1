use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

use crate::math::{hsv_to_rgb, mat4_identity, mat4_translation, Vec3};
use crate::splat::Splat;

// --- Demo splat generators ---

/// Point on a (p, q) torus knot: winds `p` times around the axis and
/// `q` times through the hole, closing after one full turn of `t`.
fn torus_knot_point(p: f32, q: f32, major: f32, minor: f32, t: f32) -> Vec3 {
    let ring = major + minor * (q * t).cos();
    Vec3::new(
        ring * (p * t).cos(),
        minor * (q * t).sin(),
        ring * (p * t).sin(),
    )
}

fn generate_torus_knot_splats(count: usize, rng: &mut impl Rng) -> Vec<Splat> {
    let mut splats = Vec::with_capacity(count);

    let p = 3.0;
    let q = 4.0;
    let major = 1.5;
    let minor = 0.45;

    for i in 0..count {
        let t = i as f32 / count.max(1) as f32 * TAU;
        let base = torus_knot_point(p, q, major, minor, t);

        let jitter = Vec3::new(
            rng.random_range(-0.05_f32..0.05_f32),
            rng.random_range(-0.05_f32..0.05_f32),
            rng.random_range(-0.05_f32..0.05_f32),
        );

        // Hue runs once around the loop.
        let color = hsv_to_rgb(t / TAU * 360.0, 0.85, 0.92);

        let scale = rng.random_range(0.02_f32..0.05_f32);
        splats.push(Splat {
            position: base + jitter,
            color,
            opacity: rng.random_range(0.55_f32..0.9_f32),
            scale: Vec3::new(scale, scale * rng.random_range(0.85..1.25), scale),
            rotation: [1.0, 0.0, 0.0, 0.0],
        });
    }

    splats
}

fn generate_spiral_disc_splats(count: usize, rng: &mut impl Rng) -> Vec<Splat> {
    let mut splats = Vec::with_capacity(count);

    let arms = 2usize;
    let turns = 1.75;
    let disc_radius = 2.2;
    let thickness = 0.22;

    for i in 0..count {
        let u = i as f32 / count.max(1) as f32;
        // sqrt keeps the disc density uniform in area.
        let radius = disc_radius * u.sqrt();
        let arm_phase = (i % arms) as f32 / arms as f32 * TAU;
        let angle = u * turns * TAU + arm_phase + rng.random_range(-0.25_f32..0.25_f32);

        let position = Vec3::new(
            radius * angle.cos(),
            thickness * (1.1 - u) * rng.random_range(-1.0_f32..1.0_f32),
            radius * angle.sin(),
        );

        // Warm core fading toward a cool rim.
        let color = hsv_to_rgb(40.0 + 200.0 * u, 0.65, 1.0 - 0.3 * u);

        let scale = rng.random_range(0.02_f32..0.055_f32);
        splats.push(Splat {
            position,
            color,
            opacity: rng.random_range(0.5_f32..0.9_f32),
            scale: Vec3::new(scale, scale, scale),
            rotation: [1.0, 0.0, 0.0, 0.0],
        });
    }

    splats
}

/// Deterministic demo scene: two thirds torus knot, one third spiral
/// disc. The same `(count, seed)` always yields the same splats.
pub fn generate_demo_splats(count: usize, seed: u64) -> Vec<Splat> {
    let mut rng = StdRng::seed_from_u64(seed);
    let knot_count = count * 2 / 3;
    let mut splats = generate_torus_knot_splats(knot_count, &mut rng);
    splats.extend(generate_spiral_disc_splats(count - knot_count, &mut rng));
    splats
}

/// Round-robin scene assignment plus one transform per scene: scene 0
/// is the identity, scene `k` slides its splats `2k` units along z.
pub fn generate_demo_scene_table(splat_count: usize, scene_count: usize) -> (Vec<u32>, Vec<f32>) {
    let scene_count = scene_count.max(1);

    let scene_indexes = (0..splat_count)
        .map(|i| (i % scene_count) as u32)
        .collect();

    let mut transforms = Vec::with_capacity(scene_count * 16);
    transforms.extend_from_slice(&mat4_identity());
    for scene in 1..scene_count {
        transforms.extend_from_slice(&mat4_translation(0.0, 0.0, 2.0 * scene as f32));
    }

    (scene_indexes, transforms)
}
