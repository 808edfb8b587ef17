//! Reading and writing CHULOOPA drum pattern files.
//!
//! ```text
//! # Track Drum Data
//! # Format: DRUM_CLASS,TIMESTAMP,VELOCITY,DELTA_TIME
//! # Classes: 0=kick, 1=snare, 2=hat
//! # Total loop duration: 5.061950 seconds
//! 0,0.084172,0.482133,0.635646
//! ```

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::pattern::{DrumClass, Hit, Pattern};

/// Prefix of the header line carrying the loop duration.
pub const DURATION_HEADER: &str = "# Total loop duration:";

const HEADER_TITLE: &str = "# Track Drum Data (AI Generated Variation)";

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("pattern {} contains no hits", .0.display())]
    EmptyPattern(PathBuf),
}

/// Why a single data record was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("expected 4 fields, found {0}")]
    FieldCount(usize),

    #[error("field `{field}` is not a number: {value:?}")]
    NotNumeric { field: &'static str, value: String },

    #[error("unknown drum class {0}")]
    UnknownClass(i64),
}

/// Load a pattern from disk. Malformed records are skipped with a warning.
pub fn load(path: &Path) -> Result<Pattern, PatternError> {
    let text = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            PatternError::NotFound(path.to_path_buf())
        } else {
            PatternError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let pattern = parse(&text, Some(path));
    if pattern.is_empty() {
        return Err(PatternError::EmptyPattern(path.to_path_buf()));
    }
    Ok(pattern)
}

/// Parse pattern text. Never fails; an unusable input yields an empty pattern.
pub fn parse(text: &str, source: Option<&Path>) -> Pattern {
    let mut hits = Vec::new();
    let mut loop_duration = 0.0;

    for (line_number, raw) in text.lines().enumerate() {
        let line = raw.trim();

        if let Some(rest) = line.strip_prefix(DURATION_HEADER) {
            match parse_duration_header(rest) {
                Some(duration) => loop_duration = duration,
                None => log::warn!("Ignoring unreadable duration header: {}", line),
            }
            continue;
        }

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_record(line) {
            Ok(hit) => hits.push(hit),
            Err(e) => log::warn!(
                "Skipping line {} ({}): {}",
                line_number + 1,
                e,
                line
            ),
        }
    }

    // Without a usable header the duration is where the last hit's delta lands
    if loop_duration <= 0.0 {
        if let Some(last) = hits.last() {
            loop_duration = last.timestamp + last.delta_time;
        }
    }

    Pattern {
        hits,
        loop_duration,
        source: source.map(Path::to_path_buf),
    }
    .normalized()
}

fn parse_duration_header(rest: &str) -> Option<f64> {
    rest.split_whitespace()
        .next()
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value >= 0.0)
}

/// Parse one `DRUM_CLASS,TIMESTAMP,VELOCITY,DELTA_TIME` record.
/// Trailing extra fields are ignored.
pub fn parse_record(line: &str) -> Result<Hit, RecordError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 4 {
        return Err(RecordError::FieldCount(fields.len()));
    }

    let class_index = fields[0]
        .parse::<i64>()
        .map_err(|_| RecordError::NotNumeric {
            field: "drum_class",
            value: fields[0].to_string(),
        })?;
    let drum_class =
        DrumClass::from_index(class_index).ok_or(RecordError::UnknownClass(class_index))?;

    Ok(Hit {
        drum_class,
        timestamp: parse_float("timestamp", fields[1])?,
        velocity: parse_float("velocity", fields[2])?,
        delta_time: parse_float("delta_time", fields[3])?,
    })
}

fn parse_float(field: &'static str, value: &str) -> Result<f64, RecordError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RecordError::NotNumeric {
            field,
            value: value.to_string(),
        })
}

/// Render a pattern in the on-disk format. Delta times are recomputed first.
pub fn render(pattern: &Pattern) -> String {
    let mut pattern = pattern.clone();
    pattern.recalculate_delta_times();

    let mut out = String::new();
    let _ = writeln!(out, "{}", HEADER_TITLE);
    let _ = writeln!(out, "# Format: DRUM_CLASS,TIMESTAMP,VELOCITY,DELTA_TIME");
    let _ = writeln!(out, "# Classes: {}", DrumClass::legend());
    let _ = writeln!(
        out,
        "# DELTA_TIME: Duration until next hit (for last hit: time until loop end)"
    );
    let _ = writeln!(
        out,
        "{} {:.6} seconds",
        DURATION_HEADER, pattern.loop_duration
    );
    for hit in &pattern.hits {
        let _ = writeln!(out, "{}", render_record(hit));
    }
    out
}

/// Single data record with six-decimal precision.
pub fn render_record(hit: &Hit) -> String {
    format!(
        "{},{:.6},{:.6},{:.6}",
        hit.drum_class.index(),
        hit.timestamp,
        hit.velocity,
        hit.delta_time
    )
}

/// Write a pattern to disk, creating the parent directory if needed.
pub fn save(pattern: &Pattern, path: &Path) -> Result<(), PatternError> {
    let io_error = |source| PatternError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
    }

    fs::write(path, render(pattern)).map_err(io_error)
}
