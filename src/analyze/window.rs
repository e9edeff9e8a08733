use crate::model::Schedule;
use chrono::{DateTime, Utc};

/// 1-based window index of `timestamp`, or `None` before the event start.
///
/// A timestamp exactly on a window boundary belongs to the later window.
pub fn window_of(timestamp: DateTime<Utc>, schedule: &Schedule) -> Option<u32> {
    let delta = schedule.millis_since_start(timestamp);
    if delta < 0 {
        return None;
    }
    let index = delta / schedule.window_millis() + 1;
    Some(u32::try_from(index).unwrap_or(u32::MAX))
}
