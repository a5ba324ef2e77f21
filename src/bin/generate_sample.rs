use anyhow::{Context, Result};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn next_range(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Crash hours are evening-heavy; draw from a rough NYC-like profile.
fn crash_hour(rng: &mut SimpleRng) -> u32 {
    // Weight per hour of day, peaking at the evening commute.
    const WEIGHTS: [u64; 24] = [
        3, 2, 2, 1, 1, 2, 4, 6, 8, 7, 6, 6, 7, 7, 8, 9, 10, 12, 12, 10, 8, 6, 5, 4,
    ];
    let total: u64 = WEIGHTS.iter().sum();
    let mut pick = rng.next_range(total);
    for (hour, &w) in WEIGHTS.iter().enumerate() {
        if pick < w {
            return hour as u32;
        }
        pick -= w;
    }
    23
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let boroughs = [
        // (name, center latitude, center longitude)
        ("MANHATTAN", 40.7768, -73.9656),
        ("BROOKLYN", 40.6526, -73.9497),
        ("QUEENS", 40.7282, -73.7949),
        ("BRONX", 40.8448, -73.8648),
        ("STATEN ISLAND", 40.5795, -74.1502),
    ];
    let streets = [
        "BROADWAY",
        "ATLANTIC AVENUE",
        "QUEENS BOULEVARD",
        "GRAND CONCOURSE",
        "FLATBUSH AVENUE",
        "3 AVENUE",
        "NORTHERN BOULEVARD",
        "OCEAN PARKWAY",
    ];

    let n_rows = 2000;
    let output_path = "sample_collisions.csv";
    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;

    writer.write_record([
        "CRASH_DATE",
        "CRASH_TIME",
        "BOROUGH",
        "LATITUDE",
        "LONGITUDE",
        "INJURED_PERSONS",
        "INJURED_PEDESTRIANS",
        "INJURED_CYCLISTS",
        "INJURED_MOTORISTS",
        "ON_STREET_NAME",
    ])?;

    let mut dropped = 0;
    for _ in 0..n_rows {
        let month = 1 + rng.next_range(12);
        let day = 1 + rng.next_range(28);
        let hour = crash_hour(&mut rng);
        let minute = rng.next_range(60);

        let (borough, lat0, lon0) = boroughs[rng.next_range(boroughs.len() as u64) as usize];
        // Jitter around the borough center; a few percent of rows lose
        // their geocode entirely, like the real export.
        let geocoded = rng.next_f64() > 0.03;
        let (lat, lon) = if geocoded {
            (
                format!("{:.6}", rng.gauss(lat0, 0.02)),
                format!("{:.6}", rng.gauss(lon0, 0.02)),
            )
        } else {
            dropped += 1;
            (String::new(), String::new())
        };

        // Most collisions injure nobody; counts are sparse.
        let pedestrians = rng.next_range(20).saturating_sub(17);
        let cyclists = rng.next_range(25).saturating_sub(22);
        let motorists = rng.next_range(10).saturating_sub(7);
        let persons = pedestrians + cyclists + motorists;

        let street = if rng.next_f64() > 0.1 {
            streets[rng.next_range(streets.len() as u64) as usize]
        } else {
            ""
        };

        writer.write_record([
            format!("{month:02}/{day:02}/2019").as_str(),
            format!("{hour}:{minute:02}").as_str(),
            borough,
            lat.as_str(),
            lon.as_str(),
            persons.to_string().as_str(),
            pedestrians.to_string().as_str(),
            cyclists.to_string().as_str(),
            motorists.to_string().as_str(),
            street,
        ])?;
    }
    writer.flush()?;

    println!(
        "Wrote {n_rows} collision rows to {output_path} ({dropped} without coordinates)"
    );
    Ok(())
}
