//! Patient age as printed on invoices.
//!
//! The clinic mostly sees children, so ages are bucketed:
//!
//! | elapsed since birth                 | display                  |
//! |-------------------------------------|--------------------------|
//! | birth date in the future            | `chưa sinh`              |
//! | past the 36-month anniversary       | `<years> tuổi`           |
//! | 3 to 36 whole months                | `<months> tháng`         |
//! | 1 or 2 whole months                 | `<months> tháng <d> ngày`|
//! | under a month, born today           | `hôm nay`                |
//! | under a month                       | `<days> ngày`            |
//!
//! Whole months count calendar anniversaries: the `m`-th anniversary of a birth on the 31st
//! falls on the last day of shorter months.

use crate::constants::{AGE_IN_YEARS_AFTER_MONTHS, AGE_WITH_DAYS_BELOW_MONTHS};
use chrono::{Datelike, Months, NaiveDate};

/// Bucketed age of a patient on a given day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KidAge {
    Unborn,
    Years(u32),
    Months(u32),
    MonthsAndDays { months: u32, days: i64 },
    BornToday,
    Days(i64),
}

impl std::fmt::Display for KidAge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KidAge::Unborn => f.write_str("chưa sinh"),
            KidAge::Years(years) => write!(f, "{years} tuổi"),
            KidAge::Months(months) => write!(f, "{months} tháng"),
            KidAge::MonthsAndDays { months, days } => write!(f, "{months} tháng {days} ngày"),
            KidAge::BornToday => f.write_str("hôm nay"),
            KidAge::Days(days) => write!(f, "{days} ngày"),
        }
    }
}

/// Bucket the age of someone born on `birth_date` as of `today`.
pub fn kid_age(birth_date: NaiveDate, today: NaiveDate) -> KidAge {
    if birth_date > today {
        return KidAge::Unborn;
    }

    let (months, anniversary) = whole_months(birth_date, today);
    let days_rest = (today - anniversary).num_days();
    let days_total = (today - birth_date).num_days();

    if months > AGE_IN_YEARS_AFTER_MONTHS || (months == AGE_IN_YEARS_AFTER_MONTHS && days_rest > 0)
    {
        KidAge::Years(months / 12)
    } else if months >= AGE_WITH_DAYS_BELOW_MONTHS {
        KidAge::Months(months)
    } else if months >= 1 {
        KidAge::MonthsAndDays {
            months,
            days: days_rest,
        }
    } else if days_total == 0 {
        KidAge::BornToday
    } else {
        KidAge::Days(days_total)
    }
}

/// Largest `m` with `birth + m months <= today`, together with that anniversary date.
///
/// Requires `birth <= today`.
fn whole_months(birth: NaiveDate, today: NaiveDate) -> (u32, NaiveDate) {
    let estimate = (today.year() - birth.year()) * 12 + today.month() as i32 - birth.month() as i32;
    let mut months = u32::try_from(estimate).unwrap_or(0);

    while months > 0 {
        match birth.checked_add_months(Months::new(months)) {
            Some(anniversary) if anniversary <= today => return (months, anniversary),
            _ => months -= 1,
        }
    }

    (0, birth)
}
