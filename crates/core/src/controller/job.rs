//! One generation pass: load, vary, write.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::generation::{DispatchError, Dispatcher, VariationParams, VariationStrategy};
use crate::pattern::pattern_store;
use crate::pattern::{Pattern, PatternError};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("source pattern not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("no drum hits in {}", .0.display())]
    EmptyPattern(PathBuf),

    #[error(transparent)]
    Read(PatternError),

    #[error("failed to write {}: {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        source: PatternError,
    },

    #[error("generation task failed: {0}")]
    Task(String),
}

impl GenerationError {
    fn from_load(error: PatternError) -> Self {
        match error {
            PatternError::NotFound(path) => GenerationError::SourceNotFound(path),
            PatternError::EmptyPattern(path) => GenerationError::EmptyPattern(path),
            other => GenerationError::Read(other),
        }
    }
}

/// Where a pass writes its output.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputTarget {
    /// Overwrite the source file with a single variation.
    InPlace,
    /// Write one file per slot number.
    Slots { dir: PathBuf, slots: Vec<u32> },
}

#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub source: PathBuf,
    pub strategy: VariationStrategy,
    pub params: VariationParams,
    pub output: OutputTarget,
    /// Copy the source to `<file>.backup` before anything is written.
    pub backup: bool,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub source: PathBuf,
    pub written: Vec<PathBuf>,
    pub backup: Option<PathBuf>,
}

/// `<dir>/<stem>_var<slot>.txt`
pub fn variation_path(dir: &Path, source: &Path, slot: u32) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("pattern");
    dir.join(format!("{}_var{}.txt", stem, slot))
}

/// Relative variation directories are resolved next to the source file.
pub fn resolve_variation_dir(variation_dir: &Path, source: &Path) -> PathBuf {
    if variation_dir.is_absolute() {
        return variation_dir.to_path_buf();
    }
    match source.parent() {
        Some(parent) => parent.join(variation_dir),
        None => variation_dir.to_path_buf(),
    }
}

pub fn backup_path(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_owned();
    name.push(".backup");
    PathBuf::from(name)
}

/// Take `count` slots starting at `next`, wrapping within `1..=max`.
pub fn allocate_slots(next: &mut u32, count: u32, max: u32) -> Vec<u32> {
    let max = max.max(1);
    let count = count.clamp(1, max);
    if *next == 0 || *next > max {
        *next = 1;
    }

    (0..count)
        .map(|_| {
            let slot = *next;
            *next = if slot >= max { 1 } else { slot + 1 };
            slot
        })
        .collect()
}

async fn save_blocking(pattern: Pattern, path: PathBuf) -> Result<PathBuf, GenerationError> {
    let target = path.clone();
    tokio::task::spawn_blocking(move || pattern_store::save(&pattern, &target))
        .await
        .map_err(|e| GenerationError::Task(e.to_string()))?
        .map_err(|source| GenerationError::WriteFailure {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

pub async fn run_generation(
    dispatcher: &Dispatcher,
    job: GenerationJob,
) -> Result<GenerationOutcome, GenerationError> {
    let source = job.source.clone();
    let pattern = tokio::task::spawn_blocking(move || pattern_store::load(&source))
        .await
        .map_err(|e| GenerationError::Task(e.to_string()))?
        .map_err(GenerationError::from_load)?;

    log::info!(
        "Loaded {} hits from {} ({:.3}s loop)",
        pattern.len(),
        job.source.display(),
        pattern.loop_duration
    );

    let backup = if job.backup {
        let path = backup_path(&job.source);
        let copy = pattern.clone().with_source(None);
        let path = save_blocking(copy, path).await?;
        log::info!("Backup saved: {}", path.display());
        Some(path)
    } else {
        None
    };

    let mut rng = match job.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let targets = match &job.output {
        OutputTarget::InPlace => vec![job.source.clone()],
        OutputTarget::Slots { dir, slots } => slots
            .iter()
            .map(|slot| variation_path(dir, &job.source, *slot))
            .collect(),
    };

    let mut written = Vec::with_capacity(targets.len());
    for target in targets {
        let variation = dispatcher
            .generate(&pattern, job.strategy, &job.params, &mut rng)
            .await
            .map_err(|e| match e {
                DispatchError::EmptyPattern => GenerationError::EmptyPattern(job.source.clone()),
            })?;

        let path = save_blocking(variation.with_source(None), target).await?;
        log::info!("Saved variation: {}", path.display());
        written.push(path);
    }

    Ok(GenerationOutcome {
        source: job.source,
        written,
        backup,
    })
}
