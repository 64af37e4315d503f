//! Navigational status classification
//!
//! AIS broadcasts carry a navigational status code. The per-year variant of
//! the monthly pass keeps only vessels that exhibit both stopped and moving
//! behavior in a month, which biases later analysis toward vessels with
//! observable stop/go transitions.

/// Status codes that mean the vessel is stopped (at anchor, moored, aground).
pub const STOPPED_CODES: [i32; 3] = [1, 5, 6];

/// Status codes that mean the vessel is underway or otherwise moving.
pub const MOVING_CODES: [i32; 8] = [0, 2, 3, 4, 7, 8, 11, 12];

/// Return true iff the scanned status codes include at least one stopped
/// code and at least one moving code.
///
/// Short-circuits as soon as both classes have been seen. Codes outside both
/// groups count toward neither. An empty scan is false.
pub fn has_stop_and_go<I>(statuses: I) -> bool
where
    I: IntoIterator<Item = i32>,
{
    let mut seen_stopped = false;
    let mut seen_moving = false;

    for status in statuses {
        if STOPPED_CODES.contains(&status) {
            seen_stopped = true;
        } else if MOVING_CODES.contains(&status) {
            seen_moving = true;
        }
        if seen_stopped && seen_moving {
            return true;
        }
    }

    false
}
