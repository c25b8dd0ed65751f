//! Batch image conversion.
//!
//! Walks a directory, picks every file whose extension matches one of the
//! configured source extensions, and re-encodes it next to the original
//! with the target extension:
//!
//! ```text
//! images/
//! ├── maison.PNG      →  maison.jpg
//! ├── garden.png      →  garden.jpg
//! └── notes.txt          (ignored)
//! ```
//!
//! Color modes are normalized for the target format by the backend (alpha
//! and palette images become RGB for JPEG). Existing outputs are overwritten;
//! each output is written by at most one source.
//!
//! ## Parallel Processing
//!
//! Files are converted in parallel using [rayon](https://docs.rs/rayon). A
//! file that fails to convert is reported and does not stop the others.
//! Progress is streamed as [`ConvertEvent`]s over an optional channel.

use crate::config::ConvertConfig;
use crate::imaging::{BackendError, ConvertParams, ImageBackend, Quality, plan_conversion};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Input directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
}

/// Options for one batch run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Source extensions, lowercase.
    pub from: Vec<String>,
    pub to: String,
    pub quality: Quality,
    pub recursive: bool,
}

impl ConvertOptions {
    pub fn from_config(config: &ConvertConfig) -> Self {
        Self {
            from: config.from.iter().map(|e| e.to_ascii_lowercase()).collect(),
            to: config.to.clone(),
            quality: Quality::new(config.quality),
            recursive: config.recursive,
        }
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.from.iter().any(|f| f.eq_ignore_ascii_case(e)))
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::from_config(&ConvertConfig::default())
    }
}

/// Progress of a batch run, one event per state change of each file.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertEvent {
    Converting { source: PathBuf, output: PathBuf },
    Saved { output: PathBuf },
    Failed { source: PathBuf, message: String },
}

/// A file that was converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedFile {
    pub source: PathBuf,
    pub output: PathBuf,
}

/// A file that could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFile {
    pub source: PathBuf,
    pub message: String,
}

/// Outcome of a batch run. Both lists are sorted by source path.
#[derive(Debug, Default)]
pub struct ConvertReport {
    pub converted: Vec<ConvertedFile>,
    pub failed: Vec<FailedFile>,
}

/// What a batch run will do.
#[derive(Debug, Default)]
pub struct ConversionPlan {
    /// Conversions to run, sorted by source path.
    pub conversions: Vec<ConvertParams>,
    /// Sources whose output path is already claimed by an earlier source.
    pub conflicts: Vec<FailedFile>,
}

/// List the conversions a batch run would perform.
///
/// When several sources map to one output (`a.png` and `a.tiff` both
/// becoming `a.jpg`), the first in path order keeps it and the others are
/// listed as conflicts.
pub fn plan_conversions(
    dir: &Path,
    options: &ConvertOptions,
) -> Result<ConversionPlan, ConvertError> {
    if !dir.is_dir() {
        return Err(ConvertError::DirectoryNotFound(dir.to_path_buf()));
    }
    let max_depth = if options.recursive { usize::MAX } else { 1 };

    let mut candidates = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(max_depth) {
        let entry = entry?;
        if !entry.file_type().is_file() || !options.matches(entry.path()) {
            continue;
        }
        let params = plan_conversion(entry.path(), &options.to, options.quality);
        // Same source and target extension: nothing to do.
        if params.output == params.source {
            continue;
        }
        candidates.push(params);
    }
    candidates.sort_by(|a, b| a.source.cmp(&b.source));

    let mut plan = ConversionPlan::default();
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
    for params in candidates {
        if let Some(owner) = claimed.get(&params.output) {
            plan.conflicts.push(FailedFile {
                message: format!(
                    "{} is already written from {}",
                    params.output.display(),
                    owner.display()
                ),
                source: params.source,
            });
            continue;
        }
        claimed.insert(params.output.clone(), params.source.clone());
        plan.conversions.push(params);
    }
    Ok(plan)
}

/// Convert every matching file in `dir`.
pub fn convert_directory(
    backend: &impl ImageBackend,
    dir: &Path,
    options: &ConvertOptions,
    progress: Option<Sender<ConvertEvent>>,
) -> Result<ConvertReport, ConvertError> {
    let plan = plan_conversions(dir, options)?;

    let mut report = ConvertReport::default();
    for conflict in plan.conflicts {
        warn!(source = %conflict.source.display(), "{}", conflict.message);
        emit(
            &progress,
            ConvertEvent::Failed {
                source: conflict.source.clone(),
                message: conflict.message.clone(),
            },
        );
        report.failed.push(conflict);
    }

    let results: Vec<(ConvertParams, Result<(), BackendError>)> = plan
        .conversions
        .into_par_iter()
        .map_with(progress, |tx, params| {
            emit(
                tx,
                ConvertEvent::Converting {
                    source: params.source.clone(),
                    output: params.output.clone(),
                },
            );
            let result = backend.convert(&params);
            match &result {
                Ok(()) => emit(
                    tx,
                    ConvertEvent::Saved {
                        output: params.output.clone(),
                    },
                ),
                Err(e) => emit(
                    tx,
                    ConvertEvent::Failed {
                        source: params.source.clone(),
                        message: e.to_string(),
                    },
                ),
            }
            (params, result)
        })
        .collect();

    // `collect` on an indexed parallel iterator keeps input order.
    for (params, result) in results {
        match result {
            Ok(()) => report.converted.push(ConvertedFile {
                source: params.source,
                output: params.output,
            }),
            Err(e) => report.failed.push(FailedFile {
                source: params.source,
                message: e.to_string(),
            }),
        }
    }
    report.failed.sort_by(|a, b| a.source.cmp(&b.source));
    Ok(report)
}

fn emit(tx: &Option<Sender<ConvertEvent>>, event: ConvertEvent) {
    if let Some(tx) = tx {
        // A dropped receiver only means nobody is listening.
        let _ = tx.send(event);
    }
}
