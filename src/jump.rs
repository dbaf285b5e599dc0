//! Jump sub-machine: constant-speed ascent to a fixed height, then gravity.
//!
//! The ascent speed is the gravity constant itself, so a jump rises exactly
//! as fast as a free fall descends.

use glam::IVec2;

use crate::types::JumpState;

/// Result of advancing a jump by one tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JumpStep {
    /// Jump requested while airborne; the request is dropped.
    Idle,
    /// Grounded -> ascending. Gravity must be disabled.
    Started,
    /// Still ascending.
    Ascending,
    /// Ascent finished. Gravity must be re-enabled.
    Finished,
}

impl JumpStep {
    /// Vertical velocity imposed by the jump this tick, if any.
    pub fn velocity_y(self, gravity: i32) -> Option<i32> {
        match self {
            JumpStep::Started | JumpStep::Ascending => Some(gravity),
            JumpStep::Idle | JumpStep::Finished => None,
        }
    }

    /// Whether the jump action must be queued again for the next tick.
    pub fn requeue(self) -> bool {
        matches!(self, JumpStep::Started | JumpStep::Ascending)
    }

    /// New gravity flag, if the step changes it.
    pub fn gravity_enabled(self) -> Option<bool> {
        match self {
            JumpStep::Started => Some(false),
            JumpStep::Finished => Some(true),
            JumpStep::Idle | JumpStep::Ascending => None,
        }
    }
}

/// Advance `jump` for an entity whose minimum corner is at height `y`.
///
/// `probe` answers whether a displacement would be blocked; it is asked for
/// `(0, -1)` before starting (unless `force`) and `(0, 1)` while ascending.
pub fn advance(
    jump: &mut JumpState,
    y: f32,
    force: bool,
    mut probe: impl FnMut(IVec2) -> bool,
) -> JumpStep {
    if !jump.is_jumping {
        if force || probe(IVec2::NEG_Y) {
            jump.is_jumping = true;
            jump.just_started = true;
            jump.target_height_y = y + jump.jump_height as f32;
            return JumpStep::Started;
        }
        return JumpStep::Idle;
    }

    jump.just_started = false;
    if y >= jump.target_height_y || probe(IVec2::Y) {
        jump.is_jumping = false;
        JumpStep::Finished
    } else {
        JumpStep::Ascending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grounded_start_records_target() {
        let mut j = JumpState::new(90);
        let mut asked = Vec::new();
        let step = advance(&mut j, 470.0, false, |d| {
            asked.push(d);
            true
        });
        assert_eq!(step, JumpStep::Started);
        assert_eq!(asked, vec![IVec2::NEG_Y]);
        assert!(j.is_jumping && j.just_started);
        assert_eq!(j.target_height_y, 560.0);
        assert_eq!(step.velocity_y(15), Some(15));
        assert_eq!(step.gravity_enabled(), Some(false));
        assert!(step.requeue());
    }

    #[test]
    fn test_airborne_request_is_dropped() {
        let mut j = JumpState::new(90);
        let step = advance(&mut j, 300.0, false, |_| false);
        assert_eq!(step, JumpStep::Idle);
        assert!(!j.is_jumping);
        assert!(!step.requeue());
        assert_eq!(step.velocity_y(15), None);
    }

    #[test]
    fn test_forced_start_skips_ground_probe() {
        let mut j = JumpState::new(40);
        let step = advance(&mut j, 300.0, true, |_| panic!("no probe expected"));
        assert_eq!(step, JumpStep::Started);
        assert_eq!(j.target_height_y, 340.0);
    }

    #[test]
    fn test_ascent_ends_at_target_or_ceiling() {
        let mut j = JumpState::new(30);
        advance(&mut j, 0.0, true, |_| false);
        assert_eq!(advance(&mut j, 15.0, false, |_| false), JumpStep::Ascending);
        assert!(!j.just_started);
        let step = advance(&mut j, 30.0, false, |_| false);
        assert_eq!(step, JumpStep::Finished);
        assert_eq!(step.gravity_enabled(), Some(true));
        assert!(!j.is_jumping);

        advance(&mut j, 0.0, true, |_| false);
        assert_eq!(advance(&mut j, 5.0, false, |d| d == IVec2::Y), JumpStep::Finished);
    }
}
