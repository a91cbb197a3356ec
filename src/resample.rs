use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use itertools::Itertools;
use tracing::debug;

use crate::data::{localize, Bar, Period};

/// Aggregate a daily series into bars of the requested period.
///
/// Weeks end on Friday and months on the last calendar day; each output bar
/// is stamped with that bucket end at local midnight. Daily input is returned
/// unchanged.
pub fn resample(bars: &[Bar], period: Period) -> Vec<Bar> {
    let bucket_end: fn(NaiveDate) -> NaiveDate = match period {
        Period::Daily => return bars.to_vec(),
        Period::Weekly => week_ending_friday,
        Period::Monthly => month_end,
    };

    let mut resampled = Vec::new();
    for (label, group) in &bars.iter().group_by(|bar| bucket_end(bar.date())) {
        match aggregate(label, group) {
            Some(bar) => resampled.push(bar),
            None => debug!(%label, "dropping bucket with undefined aggregate"),
        }
    }
    resampled
}

fn aggregate<'a>(label: NaiveDate, mut group: impl Iterator<Item = &'a Bar>) -> Option<Bar> {
    let first = group.next()?;
    let mut bar = Bar {
        timestamp: localize(first.timestamp.timezone(), label.and_time(NaiveTime::MIN)),
        ..first.clone()
    };
    for next in group {
        bar.high = bar.high.max(next.high);
        bar.low = bar.low.min(next.low);
        bar.close = next.close;
        bar.volume += next.volume;
    }

    let fields = [bar.open, bar.high, bar.low, bar.close, bar.volume];
    fields.iter().all(|value| value.is_finite()).then_some(bar)
}

pub fn week_ending_friday(date: NaiveDate) -> NaiveDate {
    let friday = Weekday::Fri.num_days_from_monday();
    let weekday = date.weekday().num_days_from_monday();
    let ahead = (friday + 7 - weekday) % 7;
    date + Duration::days(i64::from(ahead))
}

pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}
