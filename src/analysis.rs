//! The "data analysis" workbench: CSV upload, superficial quality counts and
//! a simulated model training run whose metrics are random.
//!
//! None of this looks at the data beyond counting cells. It exists to drive
//! the administrator dashboard.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name offered for the metrics download.
pub const METRICS_FILE_NAME: &str = "model-results.csv";

/// Progress is reported in steps of this many percent.
pub const PROGRESS_STEP: u8 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("The CSV file is empty")]
    EmptyFile,
    #[error("Load a CSV file first")]
    NoData,
    #[error("A model is already being trained")]
    AlreadyTraining,
    #[error("Unknown model '{0}'")]
    UnknownModel(String),
    #[error("Unknown test split '{0}'")]
    UnknownSplit(String),
    #[error("Unknown cleaning action '{0}'")]
    UnknownAction(String),
}

/// Header row plus a preview of the first rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvData {
    pub headers: Vec<String>,
    pub preview: Vec<Vec<String>>,
    pub row_count: usize,
}

/// Superficial problems found in the uploaded rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuality {
    /// Blank cells.
    pub nulls: usize,
    /// Rows whose full text repeats an earlier row.
    pub duplicates: usize,
    /// Cells containing characters outside letters, digits, spaces and `.,-`.
    pub inconsistencies: usize,
}

fn allowed_cell() -> &'static Regex {
    static ALLOWED: OnceLock<Regex> = OnceLock::new();
    ALLOWED.get_or_init(|| {
        // Unwrap safe: the pattern is a constant known to compile.
        Regex::new(r"^[a-zA-Z0-9\s.,áéíóúñÁÉÍÓÚÑ-]*$").unwrap()
    })
}

/// Parse CSV text by splitting lines on `\n` and cells on `,`. Quoting is not
/// supported.
///
/// Returns the headers with a preview of up to `preview_rows` rows (cells
/// trimmed), and quality counts over every row (cells untrimmed).
pub fn parse_csv(text: &str, preview_rows: usize) -> Result<(CsvData, DataQuality), AnalysisError> {
    let lines: Vec<&str> = text.split('\n').filter(|l| !l.trim().is_empty()).collect();
    let (header, body) = lines.split_first().ok_or(AnalysisError::EmptyFile)?;

    let headers = header.split(',').map(|h| h.trim().to_string()).collect();
    let preview = body
        .iter()
        .take(preview_rows)
        .map(|line| line.split(',').map(|c| c.trim().to_string()).collect())
        .collect();
    let rows: Vec<Vec<&str>> = body.iter().map(|line| line.split(',').collect()).collect();

    let data = CsvData {
        headers,
        preview,
        row_count: body.len(),
    };
    Ok((data, assess_quality(&rows)))
}

pub fn assess_quality(rows: &[Vec<&str>]) -> DataQuality {
    let allowed = allowed_cell();
    let mut quality = DataQuality::default();

    for cell in rows.iter().flatten() {
        if cell.trim().is_empty() {
            quality.nulls += 1;
        }
        if !allowed.is_match(cell) {
            quality.inconsistencies += 1;
        }
    }

    let distinct: HashSet<String> = rows.iter().map(|r| r.join(",")).collect();
    quality.duplicates = rows.len() - distinct.len();
    quality
}

/// Cleaning operations offered on the quality tab. Only the counters change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanAction {
    Nulls,
    Duplicates,
    Mean,
    Median,
}

impl CleanAction {
    pub fn message(self) -> &'static str {
        match self {
            Self::Nulls => "Filas con valores nulos eliminadas",
            Self::Duplicates => "Filas duplicadas eliminadas",
            Self::Mean => "Valores imputados por media",
            Self::Median => "Valores imputados por mediana",
        }
    }
}

impl FromStr for CleanAction {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nulls" => Ok(Self::Nulls),
            "duplicates" => Ok(Self::Duplicates),
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            other => Err(AnalysisError::UnknownAction(other.to_string())),
        }
    }
}

/// Model families offered for training.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    #[default]
    RandomForest,
    Svm,
    NeuralNetwork,
    Logistic,
}

impl ModelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RandomForest => "random-forest",
            Self::Svm => "svm",
            Self::NeuralNetwork => "neural-network",
            Self::Logistic => "logistic",
        }
    }
}

impl Display for ModelKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::RandomForest, Self::Svm, Self::NeuralNetwork, Self::Logistic]
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| AnalysisError::UnknownModel(s.to_string()))
    }
}

/// Fraction of rows held out for testing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestSplit {
    #[default]
    #[serde(rename = "0.2")]
    Twenty,
    #[serde(rename = "0.3")]
    Thirty,
    #[serde(rename = "0.4")]
    Forty,
}

impl TestSplit {
    pub fn fraction(self) -> f64 {
        match self {
            Self::Twenty => 0.2,
            Self::Thirty => 0.3,
            Self::Forty => 0.4,
        }
    }
}

impl FromStr for TestSplit {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0.2" => Ok(Self::Twenty),
            "0.3" => Ok(Self::Thirty),
            "0.4" => Ok(Self::Forty),
            other => Err(AnalysisError::UnknownSplit(other.to_string())),
        }
    }
}

/// Training request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainRequest {
    pub model: String,
    pub test_split: String,
}

/// Metrics "produced" by a training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub mae: f64,
}

impl ModelMetrics {
    /// Plausible-looking numbers with no relation to any data.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            accuracy: 0.85 + rng.gen::<f64>() * 0.1,
            precision: 0.82 + rng.gen::<f64>() * 0.1,
            recall: 0.79 + rng.gen::<f64>() * 0.1,
            mae: rng.gen::<f64>() * 0.2,
        }
    }

    /// The downloadable metrics table.
    pub fn to_csv(&self) -> String {
        format!(
            "Métrica,Valor\nAccuracy,{:.4}\nPrecision,{:.4}\nRecall,{:.4}\nMAE,{:.4}",
            self.accuracy, self.precision, self.recall, self.mae
        )
    }
}

/// Result of a finished training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingReport {
    pub model: ModelKind,
    pub test_split: f64,
    pub metrics: ModelMetrics,
    pub finished_at: DateTime<Utc>,
}

/// Where a training run is at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingProgress {
    pub training: bool,
    pub progress: u8,
}

/// Upload summary returned to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSummary {
    pub data: CsvData,
    pub quality: DataQuality,
}

/// Message and updated counts after a cleaning action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanSummary {
    pub message: String,
    pub quality: DataQuality,
}

/// The workbench state for the signed-in administrator.
#[derive(Debug, Default)]
pub struct AnalysisSession {
    upload: Option<UploadSummary>,
    progress: TrainingProgress,
    pending: Option<(ModelKind, TestSplit)>,
    report: Option<TrainingReport>,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current data set with `text`. On error the previous data set
    /// is kept.
    pub fn upload(&mut self, text: &str, preview_rows: usize) -> Result<UploadSummary, AnalysisError> {
        let (data, quality) = parse_csv(text, preview_rows)?;
        info!(
            "Loaded CSV with {} columns and {} rows",
            data.headers.len(),
            data.row_count
        );
        let summary = UploadSummary { data, quality };
        self.upload = Some(summary.clone());
        Ok(summary)
    }

    pub fn clean(&mut self, action: CleanAction) -> Result<CleanSummary, AnalysisError> {
        let upload = self.upload.as_mut().ok_or(AnalysisError::NoData)?;
        match action {
            CleanAction::Nulls => upload.quality.nulls = 0,
            CleanAction::Duplicates => upload.quality.duplicates = 0,
            CleanAction::Mean | CleanAction::Median => {}
        }
        Ok(CleanSummary {
            message: action.message().to_string(),
            quality: upload.quality,
        })
    }

    /// Start a training run. Needs uploaded data and no run in progress.
    pub fn begin_training(&mut self, model: ModelKind, split: TestSplit) -> Result<(), AnalysisError> {
        if self.upload.is_none() {
            return Err(AnalysisError::NoData);
        }
        if self.progress.training {
            return Err(AnalysisError::AlreadyTraining);
        }
        info!("Training {model} model with test split {}", split.fraction());
        self.progress = TrainingProgress {
            training: true,
            progress: 0,
        };
        self.pending = Some((model, split));
        Ok(())
    }

    /// Move the progress bar one step, capped at 100.
    pub fn advance(&mut self) -> u8 {
        self.progress.progress = self.progress.progress.saturating_add(PROGRESS_STEP).min(100);
        self.progress.progress
    }

    /// End the current run with `metrics`.
    pub fn finish_training(&mut self, metrics: ModelMetrics) -> Option<TrainingReport> {
        let (model, split) = self.pending.take()?;
        let report = TrainingReport {
            model,
            test_split: split.fraction(),
            metrics,
            finished_at: Utc::now(),
        };
        self.progress = TrainingProgress {
            training: false,
            progress: 100,
        };
        self.report = Some(report.clone());
        info!("Finished training {model} model");
        Some(report)
    }

    pub fn progress(&self) -> TrainingProgress {
        self.progress
    }

    /// The downloadable metrics of the last finished run.
    pub fn metrics_csv(&self) -> Option<String> {
        self.report.as_ref().map(|r| r.metrics.to_csv())
    }
}
