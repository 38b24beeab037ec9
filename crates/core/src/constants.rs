//! Constants used throughout the clinic core crate.

/// Clinic civil time offset from UTC, in hours (Vietnam, no daylight saving).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

/// Default directory for clinic data when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "clinic_data";

/// Directory name (under the data directory) holding examination snapshots.
pub const EXAMINATIONS_DIR_NAME: &str = "examinations";

/// File extension of examination snapshot files.
pub const EXAMINATION_FILE_EXTENSION: &str = "yaml";

/// Percentage discounts are rounded to a multiple of this many đồng.
pub const DISCOUNT_ROUNDING_STEP: i64 = 1_000;

/// Display label of a fixed-amount discount.
pub const FIX_DISCOUNT_UNIT: &str = "đ";

/// Display label of a percentage discount.
pub const PERCENT_DISCOUNT_UNIT: &str = "%";

/// Past this many whole months a child's age is shown in years.
pub const AGE_IN_YEARS_AFTER_MONTHS: u32 = 36;

/// Below this many whole months a child's age also shows remaining days.
pub const AGE_WITH_DAYS_BELOW_MONTHS: u32 = 3;

/// Resources protected by the built-in access-level map.
pub const DEFAULT_RESOURCES: &[&str] = &[
    "examination",
    "medicine",
    "service",
    "invoice_template",
    "role",
    "article",
    "user",
    "patient",
];

/// Date format of printed invoices.
pub const INVOICE_DATE_FORMAT: &str = "%d/%m/%Y";

/// Time format of printed invoices (24-hour clock).
pub const INVOICE_TIME_FORMAT: &str = "%H:%M";
