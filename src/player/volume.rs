//! Volume conversion and safety limits
//!
//! Volume travels through the API as a linear 0.0-1.0 level but is clamped
//! in the decibel domain so the floor and ceiling are perceptually uniform.
//! Zero is a true mute and bypasses the dB clamp entirely.

/// Quietest audible level
pub const MIN_DB: f64 = -60.0;
/// Loudest allowed level, kept below unity as headroom
pub const MAX_DB: f64 = -3.0;

pub fn linear_to_db(linear: f64) -> f64 {
    20.0 * linear.log10()
}

pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Clamp a requested linear level into the safe dB range
///
/// Non-finite and non-positive requests mute. Anything else is converted to
/// dB, clamped to [`MIN_DB`]..[`MAX_DB`], and converted back.
pub fn apply_safety_limits(linear: f64) -> f64 {
    if !linear.is_finite() || linear <= 0.0 {
        return 0.0;
    }
    db_to_linear(linear_to_db(linear).clamp(MIN_DB, MAX_DB))
}
