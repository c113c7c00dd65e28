use crate::config::AnalyticsSettings;
use crate::models::{RangeRequest, RangeSummary};
use crate::normalization::parse_sale_date;
use chrono::{Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Inclusive date-time range in business-local wall time.
///
/// After `normalized()`, `start` sits at 00:00:00.000 and `end` at
/// 23:59:59.999 and `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::milliseconds(MILLIS_PER_DAY - 1)
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Whole-day range between two calendar dates (inclusive, any order).
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(start_of_day(start), start_of_day(end)).normalized()
    }

    /// Swap inverted bounds, then clamp both ends to whole days.
    pub fn normalized(self) -> Self {
        let (start, end) = if self.end < self.start {
            (self.end, self.start)
        } else {
            (self.start, self.end)
        };

        Self {
            start: start_of_day(start.date()),
            end: end_of_day(end.date()),
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }

    /// Inclusive membership test.
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }

    /// Number of calendar days covered, counting both ends.
    pub fn day_count(&self) -> i64 {
        (self.end_date() - self.start_date()).num_days() + 1
    }

    /// The window of equal whole-day length ending the day before `start`.
    /// `None` when that window would fall before the earliest date chrono
    /// can represent.
    pub fn previous_window(&self) -> Option<Self> {
        let days = u64::try_from(self.day_count()).ok()?;
        let end = self.start_date().checked_sub_days(Days::new(1))?;
        let start = self.start_date().checked_sub_days(Days::new(days))?;
        Some(Self::from_dates(start, end))
    }

    pub fn to_summary(&self) -> RangeSummary {
        const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";
        RangeSummary {
            start: self.start.format(FORMAT).to_string(),
            end: self.end.format(FORMAT).to_string(),
        }
    }
}

/// Range Normalizer entry point: absent in, absent out.
pub fn normalize_range(range: Option<DateRange>) -> Option<DateRange> {
    range.map(DateRange::normalized)
}

/// Parse the range picker's strings and normalize them.
///
/// A range with either bound unparsable, or longer than
/// `settings.max_range_days`, is treated as no range at all.
pub fn parse_range_request(
    request: &RangeRequest,
    settings: &AnalyticsSettings,
) -> Option<DateRange> {
    let start = parse_sale_date(&request.start, settings.timezone);
    let end = parse_sale_date(&request.end, settings.timezone);

    let (Some(start), Some(end)) = (start, end) else {
        tracing::warn!(
            "Ignoring malformed date range: start={:?} end={:?}",
            request.start,
            request.end
        );
        return None;
    };

    let range = DateRange::new(start, end).normalized();
    if range.day_count() > i64::from(settings.max_range_days) {
        tracing::warn!(
            "Ignoring date range of {} days (max {}): start={:?} end={:?}",
            range.day_count(),
            settings.max_range_days,
            request.start,
            request.end
        );
        return None;
    }

    Some(range)
}
