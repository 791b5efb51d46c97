//! Process-wide assistant session.
//!
//! Constructed once at startup and passed by reference to the dispatch
//! engine and the trigger surfaces.  The time-of-day string is captured at
//! construction and never refreshed.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};

use crate::trigger::TriggerGate;

/// Long-lived session state.
#[derive(Debug)]
pub struct AssistantSession {
    current_time: String,
    gate: Arc<TriggerGate>,
}

impl AssistantSession {
    /// Capture the local time now and bind the shared trigger gate.
    pub fn new(gate: Arc<TriggerGate>) -> Self {
        Self::at(Local::now(), gate)
    }

    /// Build a session as if it were created at `now`.
    pub fn at<Tz: TimeZone>(now: DateTime<Tz>, gate: Arc<TriggerGate>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            current_time: format_time_of_day(&now),
            gate,
        }
    }

    /// Time of day captured at construction, e.g. `"09:05 PM"`.
    pub fn current_time(&self) -> &str {
        &self.current_time
    }

    /// The gate shared with every trigger surface.
    pub fn gate(&self) -> &Arc<TriggerGate> {
        &self.gate
    }

    /// Accept the next trigger.
    pub fn rearm_trigger(&self) {
        self.gate.rearm();
    }
}

/// 12-hour clock with zero-padded hour and AM/PM marker.
fn format_time_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn time_is_twelve_hour_with_marker() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 21, 5, 0).unwrap();
        let session = AssistantSession::at(t, Arc::new(TriggerGate::new()));
        assert_eq!(session.current_time(), "09:05 PM");
    }

    #[test]
    fn morning_time() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 0, 30, 0).unwrap();
        let session = AssistantSession::at(t, Arc::new(TriggerGate::new()));
        assert_eq!(session.current_time(), "12:30 AM");
    }

    #[test]
    fn rearm_goes_through_shared_gate() {
        let gate = Arc::new(TriggerGate::new());
        let session = AssistantSession::new(Arc::clone(&gate));
        assert!(gate.try_fire());
        assert!(!gate.is_armed());
        session.rearm_trigger();
        assert!(gate.is_armed());
    }
}
