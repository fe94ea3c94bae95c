//! Synthetic product-catalog generation.
//!
//! Produces a CSV with the same header as a real catalog so the loader, the
//! explorer and the forecaster can be exercised without the original dataset.
//! Output is fully determined by the seed.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::error::AppError;
use crate::io::ingest::REQUIRED_COLUMNS;

/// Centre of the year distribution before per-colour drift.
const YEAR_CENTRE: f64 = 2013.5;
/// Spread of product years around their centre.
const YEAR_SIGMA: f64 = 2.5;
/// Share of valid years written in the float form `2012.0`.
const FLOAT_YEAR_RATE: f64 = 0.1;
/// Share of rows whose `usage` is left empty.
const EMPTY_USAGE_RATE: f64 = 0.01;

const GENDERS: &[(&str, f64)] = &[
    ("Men", 0.45),
    ("Women", 0.40),
    ("Unisex", 0.06),
    ("Boys", 0.05),
    ("Girls", 0.04),
];

/// master category -> sub category -> article types
const TAXONOMY: &[(&str, f64, &[(&str, &[&str])])] = &[
    (
        "Apparel",
        0.48,
        &[
            ("Topwear", &["Tshirts", "Shirts", "Tops", "Kurtas"]),
            ("Bottomwear", &["Jeans", "Trousers", "Shorts"]),
        ],
    ),
    (
        "Accessories",
        0.25,
        &[
            ("Watches", &["Watches"]),
            ("Bags", &["Handbags", "Backpacks"]),
            ("Jewellery", &["Earrings"]),
        ],
    ),
    (
        "Footwear",
        0.21,
        &[
            ("Shoes", &["Casual Shoes", "Sports Shoes", "Formal Shoes"]),
            ("Sandal", &["Sandals"]),
            ("Flip Flops", &["Flip Flops"]),
        ],
    ),
    (
        "Personal Care",
        0.06,
        &[("Fragrance", &["Perfume and Body Mist", "Deodorant"])],
    ),
];

/// Colour weight and year drift (positive drift = trending up over time).
const COLOURS: &[(&str, f64, f64)] = &[
    ("Black", 0.22, 0.0),
    ("White", 0.12, 0.5),
    ("Blue", 0.11, -0.5),
    ("Navy Blue", 0.08, 1.5),
    ("Grey", 0.07, 0.0),
    ("Red", 0.06, -1.0),
    ("Brown", 0.06, -1.5),
    ("Green", 0.05, 1.0),
    ("Pink", 0.05, 0.5),
    ("Purple", 0.04, -0.5),
    ("Silver", 0.04, 0.0),
    ("Beige", 0.03, 2.0),
];

const SEASONS: &[(&str, f64)] = &[("Summer", 0.48), ("Fall", 0.26), ("Winter", 0.17), ("Spring", 0.09)];

const USAGES: &[(&str, f64)] = &[
    ("Casual", 0.70),
    ("Sports", 0.10),
    ("Ethnic", 0.08),
    ("Formal", 0.06),
    ("Party", 0.03),
    ("Travel", 0.03),
];

const BRANDS: &[&str] = &["Puma", "Nike", "Fabindia", "Titan", "Roadster", "Wrangler", "Baggit", "Fastrack"];

/// Knobs for `ft sample`.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub rows: usize,
    pub seed: u64,
    pub year_min: i32,
    pub year_max: i32,
    /// Probability that a row is written without a year.
    pub missing_year_rate: f64,
    /// Probability that a row is written with a field missing.
    pub malformed_rate: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            rows: 2000,
            seed: 42,
            year_min: 2008,
            year_max: 2019,
            missing_year_rate: 0.02,
            malformed_rate: 0.005,
        }
    }
}

/// What was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleSummary {
    pub rows_written: usize,
    pub missing_year: usize,
    pub malformed: usize,
}

impl SampleSummary {
    pub fn valid_rows(&self) -> usize {
        self.rows_written - self.missing_year - self.malformed
    }
}

/// Write a synthetic catalog CSV to `path`.
pub fn write_sample_csv(path: &Path, config: &SampleConfig) -> Result<SampleSummary, AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create sample CSV '{}': {e}", path.display())))?;
    let summary = write_sample(file, config)?;
    tracing::info!(
        path = %path.display(),
        rows = summary.rows_written,
        missing_year = summary.missing_year,
        malformed = summary.malformed,
        "wrote sample catalog"
    );
    Ok(summary)
}

/// Write a synthetic catalog CSV to any writer.
pub fn write_sample<W: Write>(writer: W, config: &SampleConfig) -> Result<SampleSummary, AppError> {
    validate(config)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let year_noise = Normal::new(0.0, YEAR_SIGMA)
        .map_err(|e| AppError::new(4, format!("Year distribution error: {e}")))?;

    let gender_idx = weighted(GENDERS.iter().map(|(_, w)| *w))?;
    let master_idx = weighted(TAXONOMY.iter().map(|(_, w, _)| *w))?;
    let colour_idx = weighted(COLOURS.iter().map(|(_, w, _)| *w))?;
    let season_idx = weighted(SEASONS.iter().map(|(_, w)| *w))?;
    let usage_idx = weighted(USAGES.iter().map(|(_, w)| *w))?;

    // Malformed rows are short by one field, so the writer must accept them.
    let mut out = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    out.write_record(REQUIRED_COLUMNS)
        .map_err(|e| AppError::new(2, format!("Failed to write sample CSV header: {e}")))?;

    let mut summary = SampleSummary::default();
    for i in 0..config.rows {
        let id = 10_000 + i as i64;
        let gender = GENDERS[gender_idx.sample(&mut rng)].0;
        let (master, _, subs) = TAXONOMY[master_idx.sample(&mut rng)];
        let (sub, articles) = subs[rng.gen_range(0..subs.len())];
        let article = articles[rng.gen_range(0..articles.len())];
        let (colour, _, drift) = COLOURS[colour_idx.sample(&mut rng)];
        let season = SEASONS[season_idx.sample(&mut rng)].0;
        let usage = if rng.gen_bool(EMPTY_USAGE_RATE) {
            ""
        } else {
            USAGES[usage_idx.sample(&mut rng)].0
        };
        let brand = BRANDS[rng.gen_range(0..BRANDS.len())];

        let centre = YEAR_CENTRE + drift;
        let year = ((centre + year_noise.sample(&mut rng)).round() as i32).clamp(config.year_min, config.year_max);
        let year_field = if rng.gen_bool(config.missing_year_rate) {
            summary.missing_year += 1;
            String::new()
        } else if rng.gen_bool(FLOAT_YEAR_RATE) {
            format!("{year}.0")
        } else {
            year.to_string()
        };

        let name = format!("{brand} {gender} {colour} {article}");
        let mut row = vec![
            id.to_string(),
            gender.to_string(),
            master.to_string(),
            sub.to_string(),
            article.to_string(),
            colour.to_string(),
            season.to_string(),
            year_field,
            usage.to_string(),
            name,
        ];

        // A row without a year is already unusable; only corrupt rows that would load.
        let malformed = !row[7].is_empty() && rng.gen_bool(config.malformed_rate);
        if malformed {
            row.pop();
            summary.malformed += 1;
        }

        out.write_record(&row)
            .map_err(|e| AppError::new(2, format!("Failed to write sample CSV row: {e}")))?;
        summary.rows_written += 1;
    }

    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to write sample CSV: {e}")))?;
    Ok(summary)
}

fn validate(config: &SampleConfig) -> Result<(), AppError> {
    if config.rows == 0 {
        return Err(AppError::new(2, "Sample row count must be > 0."));
    }
    if config.year_max < config.year_min {
        return Err(AppError::new(2, "Invalid year range for sample generation."));
    }
    let rate_ok = |p: f64| p.is_finite() && (0.0..1.0).contains(&p);
    if !(rate_ok(config.missing_year_rate) && rate_ok(config.malformed_rate)) {
        return Err(AppError::new(2, "Invalid missing-year/malformed rates (expected 0 <= p < 1)."));
    }
    Ok(())
}

fn weighted(weights: impl Iterator<Item = f64>) -> Result<WeightedIndex<f64>, AppError> {
    WeightedIndex::new(weights).map_err(|e| AppError::new(4, format!("Weight table error: {e}")))
}
