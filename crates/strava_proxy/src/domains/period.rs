use chrono::offset::LocalResult;
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde::Serialize;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
}

/// An inclusive range of local calendar days.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub period: Period,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    /// The window of `period` containing `anchor`, moved back `offset` periods.
    ///
    /// Weeks run Monday through Sunday. Returns `None` when the anchor or the
    /// offset leaves the representable date range.
    pub fn for_period(period: Period, anchor: NaiveDate, offset: u32) -> Option<Self> {
        match period {
            Period::Week => {
                let monday = anchor.checked_sub_signed(Duration::days(i64::from(
                    anchor.weekday().num_days_from_monday(),
                )))?;
                let start = monday.checked_sub_signed(Duration::weeks(i64::from(offset)))?;
                let end = start.checked_add_signed(Duration::days(6))?;
                Some(Self { period, start, end })
            }
            Period::Month => {
                let first = anchor.with_day(1)?;
                let start = first.checked_sub_months(Months::new(offset))?;
                let end = start.checked_add_months(Months::new(1))?.pred_opt()?;
                Some(Self { period, start, end })
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// `(after, before)` epoch seconds for the upstream activities query.
    ///
    /// Widened by a day on both sides: activities carry their own local time
    /// zone, so the exact cut is made on `start_date_local` afterwards.
    pub fn upstream_bounds(&self, tz: &Tz) -> (i64, i64) {
        let after = local_midnight(tz, self.start) - SECONDS_PER_DAY;
        let before = local_midnight(tz, self.end) + 2 * SECONDS_PER_DAY;
        (after, before)
    }
}

fn local_midnight(tz: &Tz, date: NaiveDate) -> i64 {
    let naive = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.timestamp(),
        // midnight skipped by a DST jump
        LocalResult::None => naive.and_utc().timestamp(),
    }
}
