use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value, json};
use std::fs;

/// A CLI tool to generate raw homeowner records for the segment evaluator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "homeowners.json")]
    output: String,

    /// Number of records to generate
    #[arg(short = 'n', long, default_value_t = 1000)]
    rows: usize,

    /// Probability that any optional cell is left out of a record
    #[arg(long, default_value_t = 0.05)]
    missing_rate: f64,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

const EMPLOYMENT_STATUSES: [&str; 4] = ["Employed", "Retired", "Self-Employed", "Unemployed"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if !(0.0..=1.0).contains(&cli.missing_rate) {
        eprintln!(
            "Error: --missing-rate ({}) must be between 0 and 1",
            cli.missing_rate
        );
        std::process::exit(1);
    }

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    println!("Generating {} homeowner records...", cli.rows);
    let records: Vec<Value> = (0..cli.rows)
        .map(|_| Value::Object(generate_record(&mut rng, cli.missing_rate)))
        .collect();

    let json_output = serde_json::to_string_pretty(&records)?;
    fs::write(&cli.output, json_output)?;

    println!(
        "Successfully generated and saved {} records to '{}'",
        records.len(),
        cli.output
    );

    Ok(())
}

/// One raw export row. Numbers are sometimes written the way spreadsheets
/// export them (`$412,000`, `6.25%`) so preparation has something to coerce.
fn generate_record(rng: &mut StdRng, missing_rate: f64) -> Map<String, Value> {
    let mut record = Map::new();

    let age: u32 = rng.random_range(25..=90);
    let years_owned: u32 = rng.random_range(0..=age.saturating_sub(22).min(45));
    let avm: f64 = (rng.random_range(150_000.0..1_500_000.0_f64) / 1000.0).round() * 1000.0;
    let balance: f64 = if rng.random_bool(0.25) {
        0.0
    } else {
        (avm * rng.random_range(0.05..0.95) / 100.0).round() * 100.0
    };
    let rate: f64 = (rng.random_range(2.5..8.0_f64) * 100.0).round() / 10_000.0;
    let sqft: u32 = rng.random_range(700..=6000);
    let sale_year = 2025 - years_owned;
    let month: u32 = rng.random_range(1..=12);
    let day: u32 = rng.random_range(1..=28);

    record.insert("AGE".to_string(), json!(age));
    record.insert("LENGTH_OF_RESIDENCE".to_string(), json!(years_owned));
    record.insert(
        "CURRENT_AVM_VALUE".to_string(),
        if rng.random_bool(0.3) {
            json!(format_currency(avm))
        } else {
            json!(avm)
        },
    );
    record.insert("CURRENT_SALE_MTG_1_LOAN_AMOUNT".to_string(), json!(balance));
    record.insert(
        "CURRENT_SALE_MTG_1_INT_RATE".to_string(),
        if rng.random_bool(0.3) {
            json!(format!("{:.2}%", rate * 100.0))
        } else {
            json!(rate)
        },
    );
    record.insert("SUM_BUILDING_SQFT".to_string(), json!(sqft));
    record.insert(
        "CURRENT_SALE_RECORDING_DATE".to_string(),
        if rng.random_bool(0.5) {
            json!(format!("{:02}/{:02}/{}", month, day, sale_year))
        } else {
            json!(format!("{}-{:02}-{:02}", sale_year, month, day))
        },
    );
    record.insert(
        "MEDIAN_HOME_PRICE".to_string(),
        json!((avm * rng.random_range(0.7..1.3) / 1000.0).round() * 1000.0),
    );
    record.insert(
        "MEDIAN_SQFT".to_string(),
        json!(rng.random_range(1200..=2600)),
    );
    let status = if age >= 67 {
        "Retired"
    } else {
        EMPLOYMENT_STATUSES.choose(rng).copied().unwrap_or("Employed")
    };
    record.insert("EMPLOYMENT_STATUS".to_string(), json!(status));
    record.insert("IS_OWNER".to_string(), json!(rng.random_bool(0.92)));

    // Drop optional cells to exercise the null-handling path.
    for key in [
        "CURRENT_AVM_VALUE",
        "CURRENT_SALE_MTG_1_LOAN_AMOUNT",
        "CURRENT_SALE_MTG_1_INT_RATE",
        "MEDIAN_HOME_PRICE",
        "MEDIAN_SQFT",
        "EMPLOYMENT_STATUS",
    ] {
        if rng.random_bool(missing_rate) {
            record.remove(key);
        }
    }

    record
}

fn format_currency(amount: f64) -> String {
    let whole = amount.round() as u64;
    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("${}", grouped)
}
