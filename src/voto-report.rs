//! Offline companion to the server: prints the standings held in a storage
//! directory, and runs the analysis workbench over a CSV file.

use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use clap::{Arg, ArgAction, ArgMatches, Command};

use voto_backend::{
    analysis::{AnalysisSession, ModelKind, ModelMetrics, TestSplit, TrainingReport, UploadSummary},
    model::{candidate::Category, seed::Seed},
    results::ResultsSummary,
    state::ElectionState,
    storage::FileStore,
};

const PROGRAM_NAME: &str = "voto-report";

const ABOUT_TEXT: &str = "Inspect a voting demo without starting the server.

EXIT CODES:
     0: Success.
     1: Error.";

const STORAGE_DIR: &str = "STORAGE_DIR";
const CATEGORY: &str = "CATEGORY";
const CSV_PATH: &str = "CSV_PATH";
const MODEL: &str = "MODEL";
const SPLIT: &str = "SPLIT";
const OUT: &str = "OUT";

const PREVIEW_ROWS: usize = 10;

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .subcommand_required(true)
        .subcommand(
            Command::new("results")
                .about("Print the standings stored by the server")
                .arg(
                    Arg::new(STORAGE_DIR)
                        .help("The server's `storage_dir`")
                        .action(ArgAction::Set)
                        .required(true),
                )
                .arg(
                    Arg::new(CATEGORY)
                        .long("category")
                        .help("Only show one office")
                        .value_parser(["presidencia", "alcaldia"])
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("analyze")
                .about("Check a CSV file and run a simulated training on it")
                .arg(
                    Arg::new(CSV_PATH)
                        .help("The CSV file to analyse")
                        .action(ArgAction::Set)
                        .required(true),
                )
                .arg(
                    Arg::new(MODEL)
                        .long("model")
                        .help("Model family to train")
                        .value_parser(["random-forest", "svm", "neural-network", "logistic"])
                        .default_value("random-forest")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new(SPLIT)
                        .long("split")
                        .help("Fraction of rows held out for testing")
                        .value_parser(["0.2", "0.3", "0.4"])
                        .default_value("0.2")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new(OUT)
                        .long("out")
                        .help("Where to write the metrics CSV")
                        .action(ArgAction::Set),
                ),
        )
}

/// Errors that this program may produce.
#[derive(Debug, Eq, PartialEq)]
enum Error {
    /// IO error described by the inner message.
    IO(String),
    /// Bad input described by the inner message.
    Input(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IO(msg) => write!(f, "IO error: {msg}"),
            Self::Input(msg) => write!(f, "Invalid input: {msg}"),
        }
    }
}

/// Load the standings from a storage directory.
fn results(dir: &str, category: Option<Category>) -> Result<ResultsSummary, Error> {
    if !Path::new(dir).is_dir() {
        return Err(Error::IO(format!("{dir} is not a directory")));
    }
    let store = FileStore::open(dir).map_err(|e| Error::IO(e.to_string()))?;
    let election = ElectionState::load(Arc::new(store), Seed::demo());
    Ok(ResultsSummary::new(election.candidates(), category))
}

fn print_results(summary: &ResultsSummary) {
    let scope = summary
        .category
        .map(|c| c.to_string())
        .unwrap_or_else(|| "all offices".to_string());
    println!(
        "{scope}: {} vote{} across {} candidate{}",
        summary.total_votes,
        if summary.total_votes != 1 { "s" } else { "" },
        summary.candidate_count,
        if summary.candidate_count != 1 { "s" } else { "" }
    );
    println!("Leader: {}", summary.leader);
    for row in &summary.rows {
        println!(
            "  {:<4} {:<24} {:<24} {:>6} ({}%)",
            row.id, row.name, row.party, row.votes, row.percentage
        );
    }
}

/// Run the workbench over a CSV file without waiting for a simulated run.
fn analyze(
    path: &str,
    model: ModelKind,
    split: TestSplit,
) -> Result<(UploadSummary, TrainingReport), Error> {
    let text = fs::read_to_string(path).map_err(|e| Error::IO(e.to_string()))?;
    let mut session = AnalysisSession::new();
    let upload = session
        .upload(&text, PREVIEW_ROWS)
        .map_err(|e| Error::Input(e.to_string()))?;
    session
        .begin_training(model, split)
        .map_err(|e| Error::Input(e.to_string()))?;
    let metrics = ModelMetrics::random(&mut rand::thread_rng());
    let report = session
        .finish_training(metrics)
        .ok_or_else(|| Error::Input("training did not start".to_string()))?;
    Ok((upload, report))
}

fn print_analysis(upload: &UploadSummary, report: &TrainingReport) {
    println!(
        "{} columns, {} rows",
        upload.data.headers.len(),
        upload.data.row_count
    );
    println!(
        "Nulls: {}, duplicates: {}, inconsistencies: {}",
        upload.quality.nulls, upload.quality.duplicates, upload.quality.inconsistencies
    );
    println!(
        "Trained {} with test split {}",
        report.model, report.test_split
    );
    println!("{}", report.metrics.to_csv());
}

/// Run the chosen subcommand and return the exit code.
fn run(args: &ArgMatches) -> u8 {
    let outcome = match args.subcommand() {
        Some(("results", sub)) => {
            // Required argument is guaranteed to be present.
            let dir: &String = sub.get_one(STORAGE_DIR).unwrap();
            let category = sub
                .get_one::<String>(CATEGORY)
                .map(|c| c.parse::<Category>().map_err(Error::Input))
                .transpose();
            category
                .and_then(|category| results(dir, category))
                .map(|summary| print_results(&summary))
        }
        Some(("analyze", sub)) => {
            // Required, or defaulted, so always present.
            let path: &String = sub.get_one(CSV_PATH).unwrap();
            let model: &String = sub.get_one(MODEL).unwrap();
            let split: &String = sub.get_one(SPLIT).unwrap();
            let out = sub.get_one::<String>(OUT);

            model
                .parse::<ModelKind>()
                .and_then(|model| split.parse::<TestSplit>().map(|split| (model, split)))
                .map_err(|e| Error::Input(e.to_string()))
                .and_then(|(model, split)| analyze(path, model, split))
                .and_then(|(upload, report)| {
                    print_analysis(&upload, &report);
                    match out {
                        Some(out) => fs::write(out, report.metrics.to_csv())
                            .map_err(|e| Error::IO(e.to_string())),
                        None => Ok(()),
                    }
                })
        }
        _ => Err(Error::Input("missing subcommand".to_string())),
    };

    match outcome {
        Ok(()) => 0,
        Err(err) => {
            println!("{err}");
            1
        }
    }
}

fn main() {
    let args = cli().get_matches();
    let exit_code = run(&args);
    std::process::exit(exit_code.into())
}
