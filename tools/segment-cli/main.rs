use clap::{ArgAction, Parser, Subcommand};
use itertools::Itertools;
use segment_formula::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::filter::LevelFilter;

/// Compile, validate and evaluate homeowner segment formulas
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Field catalog JSON file. Defaults to the built-in homeowner catalog
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Dataset preparation config JSON file (implies --prepare)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Run dataset preparation on loaded datasets (derives EQUITY, SALE_YEAR, ...)
    #[arg(long, global = true)]
    prepare: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the fields a formula may use
    Fields,
    /// Check a formula and show its normalized form
    Validate { formula: String },
    /// Count the rows of a dataset matching a formula
    Evaluate {
        formula: String,
        /// Dataset as a JSON array of records, or a `.bin` snapshot
        dataset: PathBuf,
        /// Also print the indices of matching rows
        #[arg(long)]
        rows: bool,
    },
    /// Explain why one row does or does not match
    Explain {
        formula: String,
        dataset: PathBuf,
        row: usize,
    },
    /// Write a bincode snapshot of a (prepared) dataset
    Snapshot { dataset: PathBuf, output: PathBuf },
    /// Manage stored segments
    Segments {
        #[command(subcommand)]
        action: SegmentsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum SegmentsCommand {
    /// Show every stored segment with its cached count
    List {
        #[arg(long)]
        store: PathBuf,
    },
    /// Validate a formula and store it as a segment
    Add {
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        formula: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        color: Option<String>,
    },
    /// Recompute every segment's count against a dataset
    Refresh {
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        dataset: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let catalog = match &cli.catalog {
        Some(path) => {
            FieldCatalog::from_file(path).unwrap_or_else(|e| exit_with_error(&e.to_string()))
        }
        None => FieldCatalog::default(),
    };

    match &cli.command {
        Command::Fields => run_fields(&cli, &catalog),
        Command::Validate { formula } => run_validate(&cli, &catalog, formula),
        Command::Evaluate {
            formula,
            dataset,
            rows,
        } => run_evaluate(&cli, &catalog, formula, dataset, *rows),
        Command::Explain {
            formula,
            dataset,
            row,
        } => run_explain(&cli, &catalog, formula, dataset, *row),
        Command::Snapshot { dataset, output } => run_snapshot(&cli, dataset, output),
        Command::Segments { action } => run_segments(&cli, &catalog, action),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run_fields(cli: &Cli, catalog: &FieldCatalog) {
    if cli.json {
        print_json(&catalog.list_fields());
        return;
    }
    println!("{:<18} {:<8} {:<32} DESCRIPTION", "FIELD", "TYPE", "COLUMN");
    for field in catalog.list_fields() {
        println!(
            "{:<18} {:<8} {:<32} {}",
            field.name, field.semantic_type, field.physical_column, field.description
        );
    }
}

fn run_validate(cli: &Cli, catalog: &FieldCatalog, formula: &str) {
    let report = validate(formula, catalog);
    if cli.json {
        print_json(&report);
    } else if report.valid {
        println!("{}", report.message);
        println!("  -> Normalized: {}", report.normalized_form);
    } else {
        println!("Invalid formula: {}", report.message);
    }
    if !report.valid {
        std::process::exit(1);
    }
}

fn run_evaluate(cli: &Cli, catalog: &FieldCatalog, formula: &str, path: &Path, rows: bool) {
    let total_start = Instant::now();

    let load_start = Instant::now();
    let dataset = load_dataset(cli, path);
    let load_duration = load_start.elapsed();

    let compile_start = Instant::now();
    let predicate = Compiler::new(catalog)
        .compile(formula)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let compile_duration = compile_start.elapsed();

    let eval_start = Instant::now();
    let result = Evaluator::new(&dataset)
        .evaluate(&predicate)
        .unwrap_or_else(|e| exit_with_error(&format!("Evaluation failed: {}", e)));
    let eval_duration = eval_start.elapsed();

    if cli.json {
        print_json(&result);
        return;
    }

    println!("Formula:  {}", predicate.normalized_form());
    println!(
        "  -> Matched {} of {} rows",
        result.match_count,
        dataset.row_count()
    );
    if rows {
        println!("  -> Rows: {}", result.matched_row_indices.iter().join(", "));
    }

    println!("\n--- Performance Summary ---");
    println!("Dataset Loading:      {:?}", load_duration);
    println!("Compilation:          {:?}", compile_duration);
    println!("Evaluation:           {:?}", eval_duration);
    println!("-----------------------------");
    println!("Total Execution:      {:?}", total_start.elapsed());
}

fn run_explain(cli: &Cli, catalog: &FieldCatalog, formula: &str, path: &Path, row: usize) {
    let dataset = load_dataset(cli, path);
    let predicate = Compiler::new(catalog)
        .compile(formula)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let explanation = Evaluator::new(&dataset)
        .explain(&predicate, row)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));

    if cli.json {
        print_json(&serde_json::json!({
            "row": explanation.row,
            "matched": explanation.matched,
            "reason": explanation.reason,
        }));
        return;
    }
    let verdict = if explanation.matched {
        "matches"
    } else {
        "does not match"
    };
    println!("Row {} {}", explanation.row, verdict);
    println!("  -> Reason: {}", explanation.reason);
}

fn run_snapshot(cli: &Cli, path: &Path, output: &Path) {
    let dataset = load_dataset(cli, path);
    dataset
        .save_snapshot(output)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    println!(
        "Wrote snapshot of {} rows and {} columns to '{}'",
        dataset.row_count(),
        dataset.columns().len(),
        output.display()
    );
}

fn run_segments(cli: &Cli, catalog: &FieldCatalog, action: &SegmentsCommand) {
    match action {
        SegmentsCommand::List { store } => {
            let segments = JsonFileStore::new(store)
                .load_segments()
                .unwrap_or_else(|e| exit_with_error(&e.to_string()));
            if cli.json {
                print_json(&segments);
                return;
            }
            for segment in &segments {
                let count = segment
                    .count
                    .map_or_else(|| "not evaluated".to_string(), |c| c.to_string());
                println!(
                    "{:<24} {:<32} {:>14}  {}",
                    segment.id, segment.name, count, segment.formula
                );
            }
        }
        SegmentsCommand::Add {
            store,
            id,
            name,
            formula,
            description,
            color,
        } => {
            let report = validate(formula, catalog);
            if !report.valid {
                exit_with_error(&format!("Invalid formula: {}", report.message));
            }
            let mut segment = Segment::new(id, name, formula).with_description(description);
            if let Some(color) = color {
                segment = segment.with_color(color);
            }
            JsonFileStore::new(store)
                .upsert_segment(segment)
                .unwrap_or_else(|e| exit_with_error(&e.to_string()));
            println!("Saved segment '{}': {}", id, report.normalized_form);
        }
        SegmentsCommand::Refresh { store, dataset } => {
            let dataset = load_dataset(cli, dataset);
            let store = JsonFileStore::new(store);
            let outcomes = refresh_all(&store, catalog, &dataset)
                .unwrap_or_else(|e| exit_with_error(&e.to_string()));

            let mut failed = 0;
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(count) => println!("  -> {}: {} rows", outcome.id, count),
                    Err(e) => {
                        failed += 1;
                        println!("  -> {}: FAILED ({})", outcome.id, e);
                    }
                }
            }
            println!(
                "Refreshed {} segment(s), {} failed",
                outcomes.len() - failed,
                failed
            );
            if failed > 0 {
                std::process::exit(2);
            }
        }
    }
}

fn load_dataset(cli: &Cli, path: &Path) -> Dataset {
    let is_snapshot = path.extension().is_some_and(|ext| ext == "bin");
    let dataset = if is_snapshot {
        Dataset::load_snapshot(path)
    } else {
        Dataset::from_file(path)
    }
    .unwrap_or_else(|e| exit_with_error(&e.to_string()));

    if !cli.prepare && cli.config.is_none() {
        return dataset;
    }
    let config = match &cli.config {
        Some(config_path) => PreparationConfig::from_file(config_path)
            .unwrap_or_else(|e| exit_with_error(&e.to_string())),
        None => PreparationConfig::default(),
    };
    prepare(dataset, &config).unwrap_or_else(|e| exit_with_error(&e.to_string()))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => exit_with_error(&format!("Could not serialize output: {}", e)),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
