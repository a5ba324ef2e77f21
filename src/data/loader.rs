use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDateTime;
use log::warn;
use serde_json::Value as JsonValue;

use super::model::{CrashDataset, CrashRecord};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Schema contract
// ---------------------------------------------------------------------------

/// Raw columns the source must carry, matched case-insensitively.
pub const EXPECTED_COLUMNS: [&str; 9] = [
    "crash_date",
    "crash_time",
    "latitude",
    "longitude",
    "injured_persons",
    "injured_pedestrians",
    "injured_cyclists",
    "injured_motorists",
    "on_street_name",
];

/// Name of the merged crash date + crash time column.
pub const DATE_TIME_COLUMN: &str = "date/time";

/// What to do with a row whose crash date/time does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampPolicy {
    /// Drop the offending row with a logged warning and keep loading.
    /// Favors partial-data availability; the default.
    #[default]
    DropRow,
    /// Abort the whole load with [`LoadError::MalformedTimestamp`].
    Fail,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a collision dataset from a file, reading at most `max_rows` raw
/// rows. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`  – the NYC open-data export layout (recommended)
/// * `.json` – records-oriented array of objects, the
///   `df.to_json(orient='records')` shape
///
/// Normalization, in order: merge `crash_date` + `crash_time` into a parsed
/// timestamp named `date/time`; drop rows missing latitude or longitude;
/// lower-case every column name. Unparseable timestamps follow the default
/// [`TimestampPolicy::DropRow`].
pub fn load_file(path: &Path, max_rows: usize) -> Result<CrashDataset, LoadError> {
    load_file_with(path, max_rows, TimestampPolicy::default())
}

/// Same as [`load_file`] with an explicit timestamp policy.
pub fn load_file_with(
    path: &Path,
    max_rows: usize,
    policy: TimestampPolicy,
) -> Result<CrashDataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path, max_rows, policy),
        "json" => load_json(path, max_rows, policy),
        other => Err(LoadError::UnsupportedFormat(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Positions of the expected columns within the source header.
struct SchemaIndices {
    date: usize,
    time: usize,
    latitude: usize,
    longitude: usize,
    injured_persons: usize,
    injured_pedestrians: usize,
    injured_cyclists: usize,
    injured_motorists: usize,
    on_street_name: usize,
}

impl SchemaIndices {
    /// Locate every expected column in the lower-cased header, or fail
    /// with the first missing one.
    fn from_headers(headers: &[String]) -> Result<Self, LoadError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| LoadError::MalformedSchema {
                    column: name.to_string(),
                })
        };
        Ok(SchemaIndices {
            date: find("crash_date")?,
            time: find("crash_time")?,
            latitude: find("latitude")?,
            longitude: find("longitude")?,
            injured_persons: find("injured_persons")?,
            injured_pedestrians: find("injured_pedestrians")?,
            injured_cyclists: find("injured_cyclists")?,
            injured_motorists: find("injured_motorists")?,
            on_street_name: find("on_street_name")?,
        })
    }

    fn is_typed_column(&self, idx: usize) -> bool {
        idx == self.date
            || idx == self.time
            || idx == self.latitude
            || idx == self.longitude
            || idx == self.injured_persons
            || idx == self.injured_pedestrians
            || idx == self.injured_cyclists
            || idx == self.injured_motorists
            || idx == self.on_street_name
    }
}

fn load_csv(
    path: &Path,
    max_rows: usize,
    policy: TimestampPolicy,
) -> Result<CrashDataset, LoadError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| csv_open_error(path, e))?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();
    let schema = SchemaIndices::from_headers(&headers)?;
    let columns = normalized_columns(&headers, &schema);

    let mut records = Vec::new();

    for (row_no, result) in reader.records().take(max_rows).enumerate() {
        let row = result?;
        let cell = |idx: usize| row.get(idx).unwrap_or("").trim();

        let timestamp = match merge_timestamp(cell(schema.date), cell(schema.time)) {
            Some(ts) => ts,
            None => {
                let value = format!("{} {}", cell(schema.date), cell(schema.time));
                match policy {
                    TimestampPolicy::DropRow => {
                        warn!("row {row_no}: dropping record with unparseable timestamp '{value}'");
                        continue;
                    }
                    TimestampPolicy::Fail => {
                        return Err(LoadError::MalformedTimestamp { row: row_no, value });
                    }
                }
            }
        };

        // dropna(subset=[latitude, longitude])
        let (latitude, longitude) =
            match (parse_coord(cell(schema.latitude)), parse_coord(cell(schema.longitude))) {
                (Some(lat), Some(lon)) => (lat, lon),
                _ => continue,
            };

        let mut extra = BTreeMap::new();
        for (idx, value) in row.iter().enumerate() {
            if !schema.is_typed_column(idx) {
                extra.insert(headers[idx].clone(), value.to_string());
            }
        }

        records.push(CrashRecord {
            timestamp,
            latitude,
            longitude,
            injured_persons: parse_count(cell(schema.injured_persons)),
            injured_pedestrians: parse_count(cell(schema.injured_pedestrians)),
            injured_cyclists: parse_count(cell(schema.injured_cyclists)),
            injured_motorists: parse_count(cell(schema.injured_motorists)),
            on_street_name: parse_street(cell(schema.on_street_name)),
            extra,
        });
    }

    Ok(CrashDataset { records, columns })
}

/// Lower-cased column list with `date/time` in place of `crash_date` and
/// `crash_time` removed.
fn normalized_columns(headers: &[String], schema: &SchemaIndices) -> Vec<String> {
    headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != schema.time)
        .map(|(idx, h)| {
            if idx == schema.date {
                DATE_TIME_COLUMN.to_string()
            } else {
                h.clone()
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   {
///     "crash_date": "05/12/2019",
///     "crash_time": "17:45",
///     "latitude": 40.7128,
///     "longitude": -74.006,
///     "injured_persons": 1,
///     ...
///   },
///   ...
/// ]
/// ```
fn load_json(
    path: &Path,
    max_rows: usize,
    policy: TimestampPolicy,
) -> Result<CrashDataset, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| file_open_error(path, e))?;
    let root: JsonValue =
        serde_json::from_str(&text).map_err(|e| LoadError::Json(e.to_string()))?;

    let rows = root
        .as_array()
        .ok_or_else(|| LoadError::Json("expected top-level JSON array".to_string()))?;

    // Column order comes from the first record's key order (kept as
    // written in the source); the schema check runs even when there are
    // no rows.
    let headers: Vec<String> = match rows.first() {
        Some(first) => first
            .as_object()
            .ok_or_else(|| LoadError::Json("row 0 is not a JSON object".to_string()))?
            .keys()
            .map(|k| k.to_ascii_lowercase())
            .collect(),
        None => EXPECTED_COLUMNS.iter().map(|c| c.to_string()).collect(),
    };
    let schema = SchemaIndices::from_headers(&headers)?;
    let columns = normalized_columns(&headers, &schema);

    let mut records = Vec::new();

    for (row_no, rec) in rows.iter().take(max_rows).enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::Json(format!("row {row_no} is not a JSON object")))?;

        // Keys matched case-insensitively, like the CSV header.
        let field = |name: &str| {
            obj.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        };
        let text_field = |name: &str| -> String {
            match field(name) {
                Some(JsonValue::String(s)) => s.trim().to_string(),
                Some(JsonValue::Null) | None => String::new(),
                Some(other) => other.to_string(),
            }
        };

        let date = text_field("crash_date");
        let time = text_field("crash_time");
        let timestamp = match merge_timestamp(&date, &time) {
            Some(ts) => ts,
            None => {
                let value = format!("{date} {time}");
                match policy {
                    TimestampPolicy::DropRow => {
                        warn!("row {row_no}: dropping record with unparseable timestamp '{value}'");
                        continue;
                    }
                    TimestampPolicy::Fail => {
                        return Err(LoadError::MalformedTimestamp { row: row_no, value });
                    }
                }
            }
        };

        let coord = |name: &str| match field(name) {
            Some(v) => v.as_f64().or_else(|| parse_coord(&text_field(name))),
            None => None,
        };
        let (latitude, longitude) = match (coord("latitude"), coord("longitude")) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => continue,
        };

        let count = |name: &str| match field(name) {
            Some(JsonValue::Number(n)) => n.as_u64().map(|v| v as u32).or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f as u32)
            }),
            Some(JsonValue::String(s)) => parse_count(s.trim()),
            _ => None,
        };

        let mut extra = BTreeMap::new();
        for (key, value) in obj {
            let lower = key.to_ascii_lowercase();
            if !EXPECTED_COLUMNS.contains(&lower.as_str()) {
                let text = match value {
                    JsonValue::String(s) => s.clone(),
                    JsonValue::Null => String::new(),
                    other => other.to_string(),
                };
                extra.insert(lower, text);
            }
        }

        records.push(CrashRecord {
            timestamp,
            latitude,
            longitude,
            injured_persons: count("injured_persons"),
            injured_pedestrians: count("injured_pedestrians"),
            injured_cyclists: count("injured_cyclists"),
            injured_motorists: count("injured_motorists"),
            on_street_name: parse_street(&text_field("on_street_name")),
            extra,
        });
    }

    Ok(CrashDataset { records, columns })
}

// ---------------------------------------------------------------------------
// Cell parsing helpers
// ---------------------------------------------------------------------------

/// Concatenate the raw date and time cells and parse the result.
/// Accepts the NYC export form (`05/12/2019 17:45`) and the ISO form,
/// with or without seconds.
fn merge_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    if date.is_empty() || time.is_empty() {
        return None;
    }
    let merged = format!("{date} {time}");
    const FORMATS: [&str; 4] = [
        "%m/%d/%Y %H:%M",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&merged, fmt).ok())
}

/// Empty or non-numeric coordinate cells count as missing.
fn parse_coord(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Injury counts arrive as integers (`3`) or float-formatted (`3.0`);
/// an empty cell is missing, never zero.
fn parse_count(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<u32>() {
        return Some(n);
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && *f >= 0.0)
        .map(|f| f as u32)
}

fn parse_street(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Distinguish "the file is not there" from other open failures, so the
/// caller sees `SourceNotFound` rather than a generic CSV error.
fn csv_open_error(path: &Path, e: csv::Error) -> LoadError {
    let not_found = matches!(
        e.kind(),
        csv::ErrorKind::Io(inner) if inner.kind() == std::io::ErrorKind::NotFound
    );
    if not_found {
        LoadError::SourceNotFound {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, e),
        }
    } else {
        LoadError::Csv(e)
    }
}

fn file_open_error(path: &Path, e: std::io::Error) -> LoadError {
    if e.kind() == std::io::ErrorKind::NotFound {
        LoadError::SourceNotFound {
            path: path.to_path_buf(),
            source: e,
        }
    } else {
        LoadError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::{Datelike, Timelike};
    use tempfile::NamedTempFile;

    use super::*;

    const HEADER: &str = "CRASH_DATE,CRASH_TIME,BOROUGH,LATITUDE,LONGITUDE,\
INJURED_PERSONS,INJURED_PEDESTRIANS,INJURED_CYCLISTS,INJURED_MOTORISTS,ON_STREET_NAME";

    fn write_csv(rows: &[&str]) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .expect("create temp csv");
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_and_normalizes_rows() {
        let file = write_csv(&[
            "05/12/2019,17:45,BROOKLYN,40.701,-73.920,2,1,0,1,BROADWAY",
            "05/13/2019,08:02,MANHATTAN,40.758,-73.985,0,0,0,0,7 AVENUE",
        ]);
        let ds = load_file(file.path(), 100).unwrap();

        assert_eq!(ds.len(), 2);
        let first = &ds.records[0];
        assert_eq!(first.timestamp.month(), 5);
        assert_eq!(first.timestamp.day(), 12);
        assert_eq!(first.timestamp.hour(), 17);
        assert_eq!(first.timestamp.minute(), 45);
        assert_eq!(first.latitude, 40.701);
        assert_eq!(first.injured_persons, Some(2));
        assert_eq!(first.on_street_name.as_deref(), Some("BROADWAY"));
        // Pass-through column survives under its lower-cased name.
        assert_eq!(first.extra.get("borough").map(String::as_str), Some("BROOKLYN"));
    }

    #[test]
    fn column_names_are_lowercased_and_merged() {
        let file = write_csv(&["05/12/2019,17:45,QUEENS,40.7,-73.9,0,0,0,0,MAIN ST"]);
        let ds = load_file(file.path(), 100).unwrap();
        assert_eq!(
            ds.columns,
            vec![
                "date/time",
                "borough",
                "latitude",
                "longitude",
                "injured_persons",
                "injured_pedestrians",
                "injured_cyclists",
                "injured_motorists",
                "on_street_name",
            ]
        );
    }

    #[test]
    fn drops_rows_missing_coordinates() {
        let file = write_csv(&[
            "05/12/2019,17:45,QUEENS,40.7,-73.9,0,0,0,0,MAIN ST",
            "05/12/2019,18:00,QUEENS,,-73.9,1,0,0,0,MAIN ST",
            "05/12/2019,18:15,QUEENS,40.7,,1,0,0,0,MAIN ST",
        ]);
        let ds = load_file(file.path(), 100).unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn max_rows_caps_raw_rows_before_filtering() {
        let file = write_csv(&[
            "05/12/2019,17:45,QUEENS,,,0,0,0,0,MAIN ST",
            "05/12/2019,18:00,QUEENS,40.7,-73.9,0,0,0,0,MAIN ST",
            "05/12/2019,18:15,QUEENS,40.7,-73.9,0,0,0,0,MAIN ST",
        ]);
        // Two raw rows read, the first dropped for missing coordinates.
        let ds = load_file(file.path(), 2).unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn missing_counts_stay_missing() {
        let file = write_csv(&["05/12/2019,17:45,QUEENS,40.7,-73.9,,0,,1,MAIN ST"]);
        let ds = load_file(file.path(), 100).unwrap();
        let rec = &ds.records[0];
        assert_eq!(rec.injured_persons, None);
        assert_eq!(rec.injured_pedestrians, Some(0));
        assert_eq!(rec.injured_cyclists, None);
        assert_eq!(rec.injured_motorists, Some(1));
    }

    #[test]
    fn float_formatted_counts_parse() {
        let file = write_csv(&["05/12/2019,17:45,QUEENS,40.7,-73.9,3.0,0.0,1.0,2.0,MAIN ST"]);
        let ds = load_file(file.path(), 100).unwrap();
        assert_eq!(ds.records[0].injured_persons, Some(3));
        assert_eq!(ds.records[0].injured_cyclists, Some(1));
    }

    #[test]
    fn missing_latitude_column_is_malformed_schema() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(
            file,
            "CRASH_DATE,CRASH_TIME,LONGITUDE,INJURED_PERSONS,INJURED_PEDESTRIANS,\
INJURED_CYCLISTS,INJURED_MOTORISTS,ON_STREET_NAME"
        )
        .unwrap();
        file.flush().unwrap();

        let err = load_file(file.path(), 10).unwrap_err();
        match err {
            LoadError::MalformedSchema { column } => assert_eq!(column, "latitude"),
            other => panic!("expected MalformedSchema, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_source_not_found() {
        let err = load_file(Path::new("/no/such/collisions.csv"), 10).unwrap_err();
        assert!(matches!(err, LoadError::SourceNotFound { .. }));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_file(Path::new("collisions.parquet"), 10).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "parquet"));
    }

    #[test]
    fn bad_timestamp_drops_row_by_default() {
        let file = write_csv(&[
            "not-a-date,17:45,QUEENS,40.7,-73.9,0,0,0,0,MAIN ST",
            "05/12/2019,18:00,QUEENS,40.7,-73.9,0,0,0,0,MAIN ST",
        ]);
        let ds = load_file(file.path(), 100).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].timestamp.hour(), 18);
    }

    #[test]
    fn bad_timestamp_fails_under_strict_policy() {
        let file = write_csv(&[
            "05/12/2019,18:00,QUEENS,40.7,-73.9,0,0,0,0,MAIN ST",
            "not-a-date,17:45,QUEENS,40.7,-73.9,0,0,0,0,MAIN ST",
        ]);
        let err = load_file_with(file.path(), 100, TimestampPolicy::Fail).unwrap_err();
        match err {
            LoadError::MalformedTimestamp { row, .. } => assert_eq!(row, 1),
            other => panic!("expected MalformedTimestamp, got {other:?}"),
        }
    }

    #[test]
    fn iso_timestamps_also_parse() {
        let file = write_csv(&["2019-05-12,17:45:30,QUEENS,40.7,-73.9,0,0,0,0,MAIN ST"]);
        let ds = load_file(file.path(), 100).unwrap();
        assert_eq!(ds.records[0].timestamp.second(), 30);
    }

    #[test]
    fn json_records_load_like_csv() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[
  {{"CRASH_DATE": "05/12/2019", "CRASH_TIME": "17:45", "BOROUGH": "BROOKLYN",
    "LATITUDE": 40.701, "LONGITUDE": -73.92, "INJURED_PERSONS": 2,
    "INJURED_PEDESTRIANS": 1, "INJURED_CYCLISTS": null, "INJURED_MOTORISTS": 1,
    "ON_STREET_NAME": "BROADWAY"}},
  {{"CRASH_DATE": "05/13/2019", "CRASH_TIME": "08:02", "BOROUGH": "QUEENS",
    "LATITUDE": null, "LONGITUDE": -73.98, "INJURED_PERSONS": 0,
    "INJURED_PEDESTRIANS": 0, "INJURED_CYCLISTS": 0, "INJURED_MOTORISTS": 0,
    "ON_STREET_NAME": "MAIN ST"}}
]"#
        )
        .unwrap();
        file.flush().unwrap();

        let ds = load_file(file.path(), 100).unwrap();
        // Second record dropped: null latitude.
        assert_eq!(ds.len(), 1);
        let rec = &ds.records[0];
        assert_eq!(rec.injured_persons, Some(2));
        assert_eq!(rec.injured_cyclists, None);
        assert_eq!(rec.extra.get("borough").map(String::as_str), Some("BROOKLYN"));
        assert!(ds.columns.contains(&DATE_TIME_COLUMN.to_string()));
    }

    #[test]
    fn json_columns_keep_source_key_order() {
        // ON_STREET_NAME deliberately out of alphabetical position.
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[
  {{"CRASH_DATE": "05/12/2019", "CRASH_TIME": "17:45", "ON_STREET_NAME": "BROADWAY",
    "LATITUDE": 40.701, "LONGITUDE": -73.92, "INJURED_PERSONS": 2,
    "INJURED_PEDESTRIANS": 1, "INJURED_CYCLISTS": 0, "INJURED_MOTORISTS": 1}}
]"#
        )
        .unwrap();
        file.flush().unwrap();

        let ds = load_file(file.path(), 100).unwrap();
        assert_eq!(
            ds.columns,
            vec![
                "date/time",
                "on_street_name",
                "latitude",
                "longitude",
                "injured_persons",
                "injured_pedestrians",
                "injured_cyclists",
                "injured_motorists",
            ]
        );
    }
}
