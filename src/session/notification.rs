//! Maintenance reminder due dates.
//!
//! The controller stores, per reminder, the date it was last reset and an
//! interval in days.  The due date is the reset date plus the interval,
//! with calendar normalization across month and year boundaries.

use chrono::{Days, Months, NaiveDate};
use heapless::Vec;

use crate::protocol::message::{NOTIFICATION_SLOTS, NotificationEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    RinseFilter,
    CleanFilter,
    ChangeWater,
    SpaCheckup,
    Other(u8),
}

impl From<u8> for NotificationKind {
    fn from(id: u8) -> Self {
        match id {
            1 => Self::RinseFilter,
            2 => Self::CleanFilter,
            3 => Self::ChangeWater,
            4 => Self::SpaCheckup,
            other => Self::Other(other),
        }
    }
}

impl NotificationKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::RinseFilter => "Rinse Filter",
            Self::CleanFilter => "Clean Filter",
            Self::ChangeWater => "Change Water",
            Self::SpaCheckup => "Spa Checkup",
            Self::Other(_) => "Unknown",
        }
    }
}

/// An active reminder with its computed due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueNotification {
    pub kind: NotificationKind,
    pub entry: NotificationEntry,
    pub due: NaiveDate,
}

/// Reset date (`2000 + year`, month, day) plus `interval_days`.
///
/// Day and month are normalized the way a calendar library would treat
/// out-of-range components: day 0 is the last day of the previous month,
/// month 0 is December of the previous year.  Returns `None` only if the
/// result falls outside the representable date range.
pub fn due_date(day: u8, month: u8, year: u8, interval_days: u16) -> Option<NaiveDate> {
    let year_start = NaiveDate::from_ymd_opt(2000 + i32::from(year), 1, 1)?;
    let month_start = match month {
        0 => year_start.checked_sub_months(Months::new(1))?,
        m => year_start.checked_add_months(Months::new(u32::from(m) - 1))?,
    };
    // Day 1 is month_start itself.
    let offset = i64::from(day) + i64::from(interval_days) - 1;
    if offset >= 0 {
        month_start.checked_add_days(Days::new(offset as u64))
    } else {
        month_start.checked_sub_days(Days::new(offset.unsigned_abs()))
    }
}

/// Computes due dates for every active reminder slot.
pub struct NotificationScheduler;

impl NotificationScheduler {
    pub fn schedule(entries: &[NotificationEntry]) -> Vec<DueNotification, NOTIFICATION_SLOTS> {
        entries
            .iter()
            .filter(|e| e.is_active())
            .filter_map(|e| {
                let due = due_date(e.reset_day, e.reset_month, e.reset_year, e.interval_days)?;
                Some(DueNotification {
                    kind: NotificationKind::from(e.id),
                    entry: *e,
                    due,
                })
            })
            .take(NOTIFICATION_SLOTS)
            .collect()
    }
}
