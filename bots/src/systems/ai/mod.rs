// tactical_bots_core/bots/src/systems/ai/mod.rs
pub mod bot_ai;
pub mod combat;
pub mod difficulty;
pub mod flank;
pub mod locomotion;
pub mod pathfinding;
pub mod perception;
pub mod route;
pub mod stuck;
pub mod tactical;

use rand::Rng;

use difficulty::Range;

/// Uniform sample in `[min, max]`; collapses to `min` on an empty or inverted range.
pub fn rand_between<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

pub fn sample_range<R: Rng + ?Sized>(rng: &mut R, range: Range) -> f32 {
    rand_between(rng, range.min, range.max)
}

/// Bernoulli trial with the probability clamped into `[0, 1]`.
pub fn chance<R: Rng + ?Sized>(rng: &mut R, probability: f32) -> bool {
    let p = if probability.is_finite() { probability.clamp(0.0, 1.0) } else { 0.0 };
    rng.gen_bool(f64::from(p))
}
