use tracing::debug;

use crate::state::interval::to_microseconds;
use crate::state::schema::{SessionSettings, Station};

/// Duration of one full run through every station, in microseconds.
///
/// Intermission (and feedback, when enabled) is paid once per station.
/// Stations are assumed uniform at the first station's duration, except that
/// with `static_at_end` the last station contributes its own duration once.
pub fn calculate_run_duration(session: &SessionSettings, stations: &[Station]) -> i64 {
    let count = stations.len() as i64;

    let intermission = session.intermission_duration.total_micros();
    let mut overhead = intermission.saturating_mul(count);
    if session.feedback {
        let feedback = to_microseconds(session.feedback_duration.as_ref()).unwrap_or(0);
        overhead = overhead.saturating_add(feedback.saturating_mul(count));
    }

    let station_time = match (stations.first(), stations.last()) {
        (Some(first), Some(last)) if session.static_at_end => first
            .duration
            .total_micros()
            .saturating_mul(count - 1)
            .saturating_add(last.duration.total_micros()),
        (Some(first), _) => first.duration.total_micros().saturating_mul(count),
        _ => 0,
    };

    let total = overhead.saturating_add(station_time);
    debug!(
        stations = count,
        overhead_us = overhead,
        station_us = station_time,
        total_us = total,
        "calculated run duration"
    );
    total
}
