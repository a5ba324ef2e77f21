use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crashdash::data::query;
use crashdash::{DatasetCache, InjuryCategory, QueryError};

/// Terminal stand-in for the hosting dashboard UI: loads the collision
/// dataset through the cache and prints each view the real renderers
/// would consume.
#[derive(Debug, Parser)]
#[command(name = "crashdash", about = "Motor vehicle collision dashboard backend")]
struct Args {
    /// Collision source file (.csv or .json).
    #[arg(long, default_value = "Motor_Vehicle_Collisions_-_Crashes.csv")]
    file: PathBuf,

    /// Maximum raw rows to read from the source.
    #[arg(long, default_value_t = 100_000)]
    max_rows: usize,

    /// Minimum number of injured persons for the point-map filter.
    #[arg(long, default_value_t = 0)]
    min_injured: u32,

    /// Hour of day (0-23) for the density map and minute histogram.
    #[arg(long, default_value_t = 17)]
    hour: u32,

    /// Affected type of people for the street ranking:
    /// pedestrians, cyclists, or motorists.
    #[arg(long, default_value = "pedestrians")]
    category: String,

    /// How many streets the ranking shows.
    #[arg(long, default_value_t = 5)]
    top: usize,

    /// Dump the hour-filtered raw records after the views.
    #[arg(long)]
    show_raw: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let category: InjuryCategory = args.category.parse()?;

    let mut cache = DatasetCache::new(&args.file);
    let dataset = cache
        .load(args.max_rows)
        .with_context(|| format!("loading {}", args.file.display()))?;

    println!("Motor Vehicle Collisions");
    println!(
        "{} records loaded from {}\n",
        dataset.len(),
        args.file.display()
    );

    // ---- Point map: where are the most people injured? ----
    let points = query::injury_threshold_points(&dataset, args.min_injured);
    println!(
        "{} collisions with >= {} injured persons",
        points.len(),
        args.min_injured
    );

    // ---- Density map: collisions in the selected hour ----
    let hour = args.hour;
    let indices = query::hour_indices(&dataset, hour)?;
    println!(
        "\n{} collisions between {hour}:00 and {}:00",
        indices.len(),
        hour + 1
    );
    match query::centroid(&dataset, &indices) {
        Ok((lat, lon)) => println!("map centered at ({lat:.5}, {lon:.5})"),
        Err(QueryError::EmptySelection) => println!("no data for this hour"),
        Err(other) => return Err(other.into()),
    }

    // ---- Minute histogram ----
    let bins = query::minute_histogram(&dataset, &indices, hour)?;
    let peak = bins.iter().copied().max().unwrap_or(0);
    if peak > 0 {
        println!("\nBreakdown by minute:");
        for (minute, count) in bins.iter().enumerate() {
            // Scale bars to a 40-column terminal strip.
            let width = (count * 40 / peak.max(1)) as usize;
            println!("{minute:>3} | {:<40} {count}", "#".repeat(width));
        }
    } else {
        println!("\nno collisions to bucket for this hour");
    }

    // ---- Top dangerous streets (always over the full dataset) ----
    println!("\nTop {} dangerous streets by injured {category}:", args.top);
    let top = query::top_streets(&dataset, category, args.top);
    if top.is_empty() {
        println!("  (no qualifying streets)");
    }
    for (street, count) in &top {
        println!("  {count:>4}  {street}");
    }

    // ---- Optional raw dump of the hour subset ----
    if args.show_raw {
        println!("\nRaw data ({} columns):", dataset.columns.len());
        println!("{}", dataset.columns.join(","));
        for &i in &indices {
            let r = &dataset.records[i];
            println!(
                "{},{:.5},{:.5},{},{},{},{},{}",
                r.timestamp,
                r.latitude,
                r.longitude,
                fmt_count(r.injured_persons),
                fmt_count(r.injured_pedestrians),
                fmt_count(r.injured_cyclists),
                fmt_count(r.injured_motorists),
                r.on_street_name.as_deref().unwrap_or(""),
            );
        }
    }

    Ok(())
}

fn fmt_count(c: Option<u32>) -> String {
    c.map(|n| n.to_string()).unwrap_or_default()
}
