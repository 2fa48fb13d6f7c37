use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

// ── Billing period ────────────────────────────────────────────────

/// A 26th-to-25th monthly invoicing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BillingPeriod {
    /// The cycle enclosing `today`: the 26th of one month through the 25th
    /// of the next, rolling the year over at the December/January boundary.
    pub fn containing(today: NaiveDate) -> BillingPeriod {
        let (year, month) = (today.year(), today.month());
        if today.day() >= 26 {
            let (next_year, next_month) = if month == 12 {
                (year + 1, 1)
            } else {
                (year, month + 1)
            };
            BillingPeriod {
                start: ymd(year, month, 26),
                end: ymd(next_year, next_month, 25),
            }
        } else {
            let (prev_year, prev_month) = if month == 1 {
                (year - 1, 12)
            } else {
                (year, month - 1)
            };
            BillingPeriod {
                start: ymd(prev_year, prev_month, 26),
                end: ymd(year, month, 25),
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("day 25/26 exists in every month")
}

// ── Cancellation cutoffs ──────────────────────────────────────────
//
// Parent- and admin-initiated cancellations use different cutoffs upstream.
// Both are kept as named policies until the business settles on one.

/// Who is cancelling — selects which cutoff policy applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelActor {
    Parent,
    Admin,
}

impl CancelActor {
    pub fn penalty_applies(self, exam_start: NaiveDateTime, cancel_time: NaiveDateTime) -> bool {
        match self {
            CancelActor::Parent => parent_penalty_applies(exam_start, cancel_time),
            CancelActor::Admin => admin_penalty_applies(exam_start, cancel_time),
        }
    }
}

/// Parent policy: penalty once the cancellation lands after 17:00 on the
/// calendar day preceding the exam date.
pub fn parent_penalty_applies(exam_start: NaiveDateTime, cancel_time: NaiveDateTime) -> bool {
    let five_pm = NaiveTime::from_hms_opt(17, 0, 0).expect("17:00 is a valid time");
    let cutoff = exam_start.date().and_time(five_pm) - Duration::days(1);
    cancel_time > cutoff
}

/// Admin policy: penalty when fewer than 12 hours remain before the exam
/// starts.
pub fn admin_penalty_applies(exam_start: NaiveDateTime, cancel_time: NaiveDateTime) -> bool {
    exam_start - cancel_time < Duration::hours(12)
}
