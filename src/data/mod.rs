/// Data layer: core types, loading, caching, and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse + normalize file → CrashDataset
///   └──────────┘
///        │            (memoized per max_rows by cache)
///        ▼
///   ┌─────────────┐
///   │ CrashDataset │  Vec<CrashRecord>, immutable after load
///   └─────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  query    │  pure filters/aggregates → view data
///   └──────────┘
/// ```
pub mod cache;
pub mod loader;
pub mod model;
pub mod query;
