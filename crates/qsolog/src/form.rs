//! Data entry form state.
//!
//! The form holds what the operator has typed, as raw text, until it is
//! submitted. Its time and date follow the UTC clock until the operator types
//! a time of their own.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fields::{self, InputPolicy};
use crate::qso::{Band, Column, LogEntry, Mode, QsoDirection, DATE_FORMAT, TIME_FORMAT};

/// Selections the form starts with and returns to on clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDefaults {
    /// Default operating mode.
    pub mode: Mode,
    /// Default band.
    pub band: Band,
    /// Default QSO direction.
    pub qso: QsoDirection,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            mode: Mode::Ssb,
            band: Band::M160,
            qso: QsoDirection::Sent,
        }
    }
}

/// The entry form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryForm {
    /// Time text, `HH:MM`.
    pub time: String,
    /// Date text, `YYYY-MM-DD`.
    pub date: String,
    /// Call sign text.
    pub call: String,
    /// Selected mode.
    pub mode: Mode,
    /// Selected band.
    pub band: Band,
    /// Frequency text.
    pub freq: String,
    /// Report sent text.
    pub tx: String,
    /// Report received text.
    pub rx: String,
    /// Power text.
    pub pwr: String,
    /// Selected QSO direction.
    pub qso: QsoDirection,
    defaults: FormDefaults,
    clock_paused: bool,
}

impl EntryForm {
    /// Create a form showing the current UTC time and date.
    #[must_use]
    pub fn new(defaults: FormDefaults, now: DateTime<Utc>) -> Self {
        Self {
            time: now.format(TIME_FORMAT).to_string(),
            date: now.format(DATE_FORMAT).to_string(),
            call: String::new(),
            mode: defaults.mode,
            band: defaults.band,
            freq: String::new(),
            tx: String::new(),
            rx: String::new(),
            pwr: String::new(),
            qso: defaults.qso,
            defaults,
            clock_paused: false,
        }
    }

    /// Advance the clock.
    ///
    /// Does nothing while the clock is paused. When the time wraps past
    /// midnight the date is refreshed too.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if self.clock_paused {
            return;
        }
        let current = now.time();
        let shown = NaiveTime::parse_from_str(&self.time, TIME_FORMAT).ok();
        if shown.is_some_and(|shown| current < shown) {
            self.date = now.format(DATE_FORMAT).to_string();
        }
        self.time = now.format(TIME_FORMAT).to_string();
    }

    /// Type into the time field, which stops the clock.
    pub fn set_time(&mut self, text: impl Into<String>) {
        self.time = text.into();
        self.clock_paused = true;
    }

    /// Check if the clock has been stopped by typing a time.
    #[must_use]
    pub fn is_clock_paused(&self) -> bool {
        self.clock_paused
    }

    /// Restart the clock.
    pub fn resume_clock(&mut self, now: DateTime<Utc>) {
        self.clock_paused = false;
        self.time = now.format(TIME_FORMAT).to_string();
        self.date = now.format(DATE_FORMAT).to_string();
    }

    /// Empty every text field and restore the default selections.
    pub fn clear(&mut self, now: DateTime<Utc>) {
        self.call.clear();
        self.freq.clear();
        self.tx.clear();
        self.rx.clear();
        self.pwr.clear();
        self.mode = self.defaults.mode;
        self.band = self.defaults.band;
        self.qso = self.defaults.qso;
        self.resume_clock(now);
    }

    /// Validate the form into a log entry.
    ///
    /// Empty frequency, report and power fields become zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if no call sign was entered, or the
    /// first field validation error.
    pub fn submit(&self, policy: InputPolicy) -> Result<LogEntry> {
        if self.call.trim().is_empty() {
            return Err(Error::MissingField { field: "call" });
        }
        Ok(LogEntry {
            time: fields::validate_time(&self.time, policy)?,
            date: fields::validate_date(&self.date, policy)?,
            call: fields::validate_call(&self.call, policy)?,
            mode: self.mode,
            band: self.band,
            freq: fields::validate_freq(&self.freq, policy)?,
            tx: fields::validate_report(Column::Tx, &self.tx, policy)?,
            rx: fields::validate_report(Column::Rx, &self.rx, policy)?,
            pwr: fields::validate_pwr(&self.pwr, policy)?,
            qso: self.qso,
        })
    }

    /// Prepare for the next contact after a successful submit.
    ///
    /// The call sign and reports are cleared; band, mode, frequency and
    /// power stay for the next contact on the same frequency.
    pub fn after_submit(&mut self, now: DateTime<Utc>) {
        self.call.clear();
        self.tx.clear();
        self.rx.clear();
        self.resume_clock(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn form() -> EntryForm {
        EntryForm::new(FormDefaults::default(), at(2024, 3, 1, 14, 2))
    }

    #[test]
    fn test_new_shows_clock() {
        let f = form();
        assert_eq!(f.time, "14:02");
        assert_eq!(f.date, "2024-03-01");
        assert_eq!(f.band, Band::M160);
        assert_eq!(f.mode, Mode::Ssb);
        assert!(!f.is_clock_paused());
    }

    #[test]
    fn test_tick_updates_time() {
        let mut f = form();
        f.tick(at(2024, 3, 1, 14, 3));
        assert_eq!(f.time, "14:03");
        assert_eq!(f.date, "2024-03-01");
    }

    #[test]
    fn test_tick_rolls_date_at_midnight() {
        let mut f = EntryForm::new(FormDefaults::default(), at(2024, 2, 28, 23, 59));
        f.tick(at(2024, 2, 29, 0, 0));
        assert_eq!(f.time, "00:00");
        assert_eq!(f.date, "2024-02-29");
    }

    #[test]
    fn test_typed_time_pauses_clock() {
        let mut f = form();
        f.set_time("13:30");
        f.tick(at(2024, 3, 1, 14, 10));
        assert_eq!(f.time, "13:30");
        assert!(f.is_clock_paused());

        f.resume_clock(at(2024, 3, 1, 14, 11));
        assert_eq!(f.time, "14:11");
        assert!(!f.is_clock_paused());
    }

    #[test]
    fn test_clear_restores_defaults() {
        let defaults = FormDefaults {
            mode: Mode::Cw,
            band: Band::M40,
            qso: QsoDirection::Sent,
        };
        let mut f = EntryForm::new(defaults, at(2024, 3, 1, 14, 2));
        f.call = "W1AW".to_string();
        f.freq = "14.250".to_string();
        f.mode = Mode::Ft8;
        f.band = Band::M20;
        f.qso = QsoDirection::Rcvd;
        f.set_time("01:00");

        f.clear(at(2024, 3, 1, 15, 0));
        assert!(f.call.is_empty());
        assert!(f.freq.is_empty());
        assert_eq!(f.mode, Mode::Cw);
        assert_eq!(f.band, Band::M40);
        assert_eq!(f.qso, QsoDirection::Sent);
        assert_eq!(f.time, "15:00");
        assert!(!f.is_clock_paused());
    }

    #[test]
    fn test_submit() {
        let mut f = form();
        f.call = "w1aw".to_string();
        f.band = Band::M20;
        f.freq = "14.25".to_string();
        f.tx = "59".to_string();
        f.pwr = "5.5".to_string();

        let entry = f.submit(InputPolicy::Reject).unwrap();
        assert_eq!(entry.call, "W1AW");
        assert_eq!(entry.freq, "14.250");
        assert_eq!(entry.tx, "59");
        assert_eq!(entry.rx, "0");
        assert_eq!(entry.pwr, "5.50");
        assert_eq!(entry.time, "14:02");
        assert_eq!(entry.band, Band::M20);
    }

    #[test]
    fn test_submit_requires_call() {
        let f = form();
        assert!(matches!(
            f.submit(InputPolicy::Reject),
            Err(Error::MissingField { field: "call" })
        ));
    }

    #[test]
    fn test_submit_applies_policy() {
        let mut f = form();
        f.call = "W1AW".to_string();
        f.set_time("25:00");
        assert!(f.submit(InputPolicy::Reject).is_err());
        assert_eq!(f.submit(InputPolicy::Clamp).unwrap().time, "23:00");
    }

    #[test]
    fn test_after_submit_keeps_frequency() {
        let mut f = form();
        f.call = "W1AW".to_string();
        f.freq = "7.074".to_string();
        f.tx = "-10".to_string();
        f.rx = "-12".to_string();

        f.after_submit(at(2024, 3, 1, 14, 5));
        assert!(f.call.is_empty());
        assert!(f.tx.is_empty());
        assert!(f.rx.is_empty());
        assert_eq!(f.freq, "7.074");
        assert_eq!(f.time, "14:05");
    }
}
