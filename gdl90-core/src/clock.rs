//! Time-of-day estimation from minute-resolution vendor time messages.
//!
//! Skyradar units report UTC hour and minute only (message 0x65). The
//! estimator anchors on each new minute and counts seconds from heartbeat
//! arrivals in between:
//!
//! ```text
//!                vendor time
//!  Uninitialized ───────────▶ Synced ◀──────────────┐
//!                               │                   │ vendor time,
//!                               │ heartbeats cross  │ new minute
//!                               ▼ a minute boundary │
//!                            Drifting ──────────────┘
//! ```
//!
//! A vendor time repeating the last vendor minute leaves the counter alone,
//! so retransmits never pull the seconds back to zero.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::types::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClockState {
    /// No vendor time seen; records carry no absolute timestamp.
    Uninitialized,
    /// Anchored to the last vendor minute.
    Synced,
    /// Counted past a minute boundary without a confirming vendor message.
    Drifting,
}

#[derive(Debug, Clone)]
pub struct TimeEstimator {
    state: ClockState,
    start_date: NaiveDate,
    heartbeat_interval: TimeDelta,
    current: Option<NaiveDateTime>,
    last_vendor: Option<(u8, u8)>,
}

impl TimeEstimator {
    pub fn new(start_date: NaiveDate, heartbeat_interval_secs: u32) -> Self {
        TimeEstimator {
            state: ClockState::Uninitialized,
            start_date,
            heartbeat_interval: TimeDelta::seconds(heartbeat_interval_secs as i64),
            current: None,
            last_vendor: None,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_synced(&self) -> bool {
        self.state != ClockState::Uninitialized
    }

    /// Current estimate as UTC, `None` until the first vendor time.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.current.map(|t| t.and_utc())
    }

    /// Seconds past the estimated minute.
    pub fn seconds(&self) -> Option<u32> {
        self.current.map(|t| t.second())
    }

    /// Feed a decoded message: vendor time re-anchors, heartbeats advance.
    pub fn observe(&mut self, message: &Message) {
        match message {
            Message::GpsTime(t) => self.on_vendor_time(t.hour, t.minute),
            Message::Heartbeat(_) => self.on_heartbeat(),
            _ => {}
        }
    }

    /// Apply a vendor hour:minute. Out-of-range values are ignored.
    pub fn on_vendor_time(&mut self, hour: u8, minute: u8) {
        let Some(time) = NaiveTime::from_hms_opt(hour as u32, minute as u32, 0) else {
            debug!(hour, minute, "ignoring out-of-range vendor time");
            return;
        };

        if self.last_vendor == Some((hour, minute)) {
            return;
        }
        self.last_vendor = Some((hour, minute));

        let Some(current) = self.current else {
            let anchored = NaiveDateTime::new(self.start_date, time);
            info!(time = %anchored, "time estimate synced");
            self.current = Some(anchored);
            self.state = ClockState::Synced;
            return;
        };

        // Pick the day that keeps the new minute within 12 h of the estimate.
        let mut anchored = NaiveDateTime::new(current.date(), time);
        let half_day = TimeDelta::hours(12);
        if anchored < current - half_day {
            anchored += TimeDelta::days(1);
        } else if anchored > current + half_day {
            anchored -= TimeDelta::days(1);
        }

        if anchored != current.with_second(0).unwrap_or(current) {
            debug!(estimate = %current, vendor = %anchored, "time estimate corrected");
        }
        self.current = Some(anchored);
        self.state = ClockState::Synced;
    }

    /// Advance by one heartbeat interval.
    pub fn on_heartbeat(&mut self) {
        let Some(current) = self.current else {
            return;
        };
        let next = current + self.heartbeat_interval;
        if (next.date(), next.hour(), next.minute())
            != (current.date(), current.hour(), current.minute())
        {
            self.state = ClockState::Drifting;
        }
        self.current = Some(next);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
