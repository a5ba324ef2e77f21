use chrono::Timelike;

use super::model::{CrashDataset, CrashRecord, InjuryCategory};
use crate::error::QueryError;

// ---------------------------------------------------------------------------
// Parameter validation
// ---------------------------------------------------------------------------

fn check_hour(hour: u32) -> Result<(), QueryError> {
    if hour > 23 {
        return Err(QueryError::InvalidParameter(format!(
            "hour {hour} is out of range 0..=23"
        )));
    }
    Ok(())
}

/// Caller-supplied indices can be stale (built against another dataset);
/// an out-of-range one is a parameter error, not a panic.
fn lookup(dataset: &CrashDataset, index: usize) -> Result<&CrashRecord, QueryError> {
    dataset.records.get(index).ok_or_else(|| {
        QueryError::InvalidParameter(format!(
            "record index {index} is out of bounds for {} records",
            dataset.len()
        ))
    })
}

// ---------------------------------------------------------------------------
// Point-map filter
// ---------------------------------------------------------------------------

/// Coordinates of records with at least `min_injured` injured persons,
/// for the point-map view.
///
/// A record with no `injured_persons` count is excluded (missing is not
/// zero), so even `min_injured == 0` only passes records that carry a
/// count. Every returned pair is geolocated by the load-time invariant.
pub fn injury_threshold_points(dataset: &CrashDataset, min_injured: u32) -> Vec<(f64, f64)> {
    dataset
        .records
        .iter()
        .filter(|r| r.injured_persons.is_some_and(|n| n >= min_injured))
        .map(|r| (r.latitude, r.longitude))
        .collect()
}

// ---------------------------------------------------------------------------
// Hour filter
// ---------------------------------------------------------------------------

/// Indices of records whose crash hour equals `hour`.
///
/// The subset is index-based so every column of a matching record stays
/// reachable; an empty result is valid and left to downstream aggregates
/// to signal (see [`centroid`]).
pub fn hour_indices(dataset: &CrashDataset, hour: u32) -> Result<Vec<usize>, QueryError> {
    check_hour(hour)?;
    Ok(dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.timestamp.hour() == hour)
        .map(|(i, _)| i)
        .collect())
}

// ---------------------------------------------------------------------------
// Centroid
// ---------------------------------------------------------------------------

/// Arithmetic mean (latitude, longitude) over the subset, used to center
/// the map view. An empty subset has no centroid: `EmptySelection`,
/// never NaN. `indices` should come from [`hour_indices`] over the same
/// dataset; an index past the end is `InvalidParameter`.
pub fn centroid(dataset: &CrashDataset, indices: &[usize]) -> Result<(f64, f64), QueryError> {
    if indices.is_empty() {
        return Err(QueryError::EmptySelection);
    }
    let mut lat_sum = 0.0;
    let mut lon_sum = 0.0;
    for &i in indices {
        let record = lookup(dataset, i)?;
        lat_sum += record.latitude;
        lon_sum += record.longitude;
    }
    let n = indices.len() as f64;
    Ok((lat_sum / n, lon_sum / n))
}

// ---------------------------------------------------------------------------
// Minute histogram
// ---------------------------------------------------------------------------

/// Crash counts per minute within `[hour, hour+1)`, as 60 zero-filled
/// bins indexed by minute.
///
/// `indices` is re-filtered against the hour window; in normal use it
/// already comes from [`hour_indices`] over the same dataset with the
/// same `hour` and the re-filter keeps nothing out. An index past the
/// end is `InvalidParameter`.
pub fn minute_histogram(
    dataset: &CrashDataset,
    indices: &[usize],
    hour: u32,
) -> Result<[u32; 60], QueryError> {
    check_hour(hour)?;
    let mut bins = [0u32; 60];
    for &i in indices {
        let ts = lookup(dataset, i)?.timestamp;
        if ts.hour() == hour {
            bins[ts.minute() as usize] += 1;
        }
    }
    Ok(bins)
}

// ---------------------------------------------------------------------------
// Top-N streets
// ---------------------------------------------------------------------------

/// The `n` worst (street, injury count) rows for a category, over the
/// full dataset.
///
/// Deliberately independent of any hour/threshold selection: the ranking
/// answers "overall worst streets". Rows are per record, not grouped by
/// street, matching the source table's sorted-head semantics; records
/// with no count, a zero count, or no street name are dropped, and ties
/// keep insertion order (stable sort).
pub fn top_streets(
    dataset: &CrashDataset,
    category: InjuryCategory,
    n: usize,
) -> Vec<(String, u32)> {
    let mut rows: Vec<(String, u32)> = dataset
        .records
        .iter()
        .filter_map(|r| {
            let count = category.count(r).filter(|&c| c >= 1)?;
            let street = r.on_street_name.clone()?;
            Some((street, count))
        })
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1));
    rows.truncate(n);
    rows
}
