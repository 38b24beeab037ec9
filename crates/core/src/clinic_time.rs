//! Clinic civil time.
//!
//! Invoices and age calculations are expressed in the clinic's wall-clock time, which is a fixed
//! UTC offset without daylight saving. Everything here is independent of the host process's
//! local timezone setting.

use crate::constants::{DEFAULT_UTC_OFFSET_HOURS, INVOICE_DATE_FORMAT, INVOICE_TIME_FORMAT};
use crate::{ClinicError, ClinicResult};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// A fixed UTC offset used to render instants as clinic-local dates and times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClinicTime {
    offset: FixedOffset,
}

impl ClinicTime {
    /// Create a clinic time from a whole-hour UTC offset.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::InvalidInput` if `hours` is outside `-12..=14`.
    pub fn from_offset_hours(hours: i32) -> ClinicResult<Self> {
        if !(-12..=14).contains(&hours) {
            return Err(ClinicError::InvalidInput(format!(
                "UTC offset must be between -12 and +14 hours, got {hours}"
            )));
        }
        let offset = FixedOffset::east_opt(hours * 3600).ok_or_else(|| {
            ClinicError::InvalidInput(format!("invalid UTC offset: {hours} hours"))
        })?;
        Ok(Self { offset })
    }

    /// Vietnam civil time (UTC+7).
    pub fn vietnam() -> Self {
        // DEFAULT_UTC_OFFSET_HOURS is within -12..=14
        Self::from_offset_hours(DEFAULT_UTC_OFFSET_HOURS).expect("UTC+7 is a valid offset")
    }

    /// The clinic-local calendar date at instant `at`.
    pub fn date_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// `DD/MM/YYYY` in clinic time.
    pub fn format_date(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset)
            .format(INVOICE_DATE_FORMAT)
            .to_string()
    }

    /// `HH:mm` (24-hour) in clinic time.
    pub fn format_time(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset)
            .format(INVOICE_TIME_FORMAT)
            .to_string()
    }
}

impl Default for ClinicTime {
    fn default() -> Self {
        Self::vietnam()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(s: &str) -> DateTime<Utc> {
        s.parse::<DateTime<Utc>>().expect("valid datetime")
    }

    #[test]
    fn formats_in_utc_plus_seven() {
        let clinic = ClinicTime::vietnam();
        let at = instant("2026-10-19T02:30:00Z");
        assert_eq!(clinic.format_date(at), "19/10/2026");
        assert_eq!(clinic.format_time(at), "09:30");
    }

    #[test]
    fn late_utc_evening_rolls_into_next_clinic_day() {
        let clinic = ClinicTime::vietnam();
        let at = instant("2026-12-31T17:05:00Z");
        assert_eq!(clinic.format_date(at), "01/01/2027");
        assert_eq!(clinic.format_time(at), "00:05");
        assert_eq!(
            clinic.date_of(at),
            NaiveDate::from_ymd_opt(2027, 1, 1).expect("valid date")
        );
    }

    #[test]
    fn afternoon_uses_24_hour_clock() {
        let clinic = ClinicTime::vietnam();
        assert_eq!(clinic.format_time(instant("2026-10-19T08:45:00Z")), "15:45");
    }

    #[test]
    fn rejects_out_of_range_offset() {
        let err = ClinicTime::from_offset_hours(15).expect_err("should reject +15");
        assert!(matches!(err, ClinicError::InvalidInput(_)));
        assert!(ClinicTime::from_offset_hours(-12).is_ok());
    }
}
