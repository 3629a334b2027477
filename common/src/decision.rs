use crate::types::Action;

/// Threshold rule with a single inclusive boundary: `value >= threshold` wants the
/// switch ON, anything below wants it OFF. There is no hysteresis band.
pub fn decide(value: f64, threshold: f64, state_before: bool) -> Action {
    let wants_on = value >= threshold;
    match (wants_on, state_before) {
        (true, true) => Action::LeaveOn,
        (true, false) => Action::Activate,
        (false, true) => Action::Deactivate,
        (false, false) => Action::LeaveOff,
    }
}
