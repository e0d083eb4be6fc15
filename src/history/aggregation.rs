// Time-bucketing of raw measurement records into chronological history.
// Pure logic only; fetching records stays in the record store.

use chrono::{DateTime, FixedOffset, TimeDelta};

use crate::models::{HistoryEntry, MeasurementRecord};

/// Maximum gap between a record and the previously accepted record of the same bucket.
pub const TOLERANCE: TimeDelta = TimeDelta::milliseconds(100);

/// How a bucket of records is collapsed into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Key generation rate: truncating integer mean.
    Rate,
    /// Key consumption: sum, where each record counts at least 1.
    Count,
}

impl Reducer {
    fn reduce(self, bucket: &[(DateTime<FixedOffset>, &MeasurementRecord)]) -> i64 {
        match self {
            Reducer::Rate => {
                // The mean of i64 values always fits back into i64.
                let sum: i128 = bucket.iter().map(|(_, r)| i128::from(r.value)).sum();
                let mean = sum / bucket.len() as i128;
                i64::try_from(mean).unwrap_or(if mean < 0 { i64::MIN } else { i64::MAX })
            }
            Reducer::Count => bucket
                .iter()
                .fold(0i64, |acc, (_, r)| acc.saturating_add(r.value.max(1))),
        }
    }
}

/// Parses an RFC 3339 timestamp with or without fractional seconds.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(ts).ok()
}

/// Groups records into buckets of time-adjacent samples and reduces each bucket.
///
/// Records with unparsable timestamps are skipped. A record joins the open bucket
/// when it is within [`TOLERANCE`] of the last record accepted into that bucket, so
/// a dense chain of samples may produce a bucket wider than the tolerance.
/// When `limit > 0`, only the most recent `limit` entries are returned.
pub fn aggregate(records: &[MeasurementRecord], limit: usize, reducer: Reducer) -> Vec<HistoryEntry> {
    let mut parsed: Vec<(DateTime<FixedOffset>, &MeasurementRecord)> = records
        .iter()
        .filter_map(|r| parse_timestamp(&r.timestamp).map(|ts| (ts, r)))
        .collect();
    parsed.sort_by_key(|(ts, _)| *ts);

    let mut out: Vec<HistoryEntry> = Vec::new();
    let mut bucket: Vec<(DateTime<FixedOffset>, &MeasurementRecord)> = Vec::new();
    let mut last_time: Option<DateTime<FixedOffset>> = None;

    for (ts, rec) in parsed {
        if let Some(last) = last_time
            && ts - last > TOLERANCE
        {
            flush(&mut bucket, &mut out, reducer);
        }
        bucket.push((ts, rec));
        last_time = Some(ts);
    }
    flush(&mut bucket, &mut out, reducer);

    if limit > 0 && out.len() > limit {
        out.drain(..out.len() - limit);
    }
    out
}

fn flush(
    bucket: &mut Vec<(DateTime<FixedOffset>, &MeasurementRecord)>,
    out: &mut Vec<HistoryEntry>,
    reducer: Reducer,
) {
    let Some((_, first)) = bucket.first() else {
        return;
    };
    out.push(HistoryEntry {
        timestamp: first.timestamp.clone(),
        value: reducer.reduce(bucket),
    });
    bucket.clear();
}
