use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Distance kept between the latest allowed timestamp and the loop end.
/// One unit of the six-decimal file precision, so a saved hit never rounds
/// onto the loop boundary.
pub const LOOP_END_GUARD: f64 = 1e-6;

/// Instrument classes produced by the CHULOOPA drum classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrumClass {
    Kick,
    Snare,
    Hat,
}

impl DrumClass {
    pub const ALL: [DrumClass; 3] = [DrumClass::Kick, DrumClass::Snare, DrumClass::Hat];

    /// Numeric class used in pattern files.
    pub fn index(&self) -> u8 {
        match self {
            Self::Kick => 0,
            Self::Snare => 1,
            Self::Hat => 2,
        }
    }

    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::Kick),
            1 => Some(Self::Snare),
            2 => Some(Self::Hat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kick => "kick",
            Self::Snare => "snare",
            Self::Hat => "hat",
        }
    }

    /// Every class except this one, in index order.
    pub fn others(&self) -> Vec<DrumClass> {
        Self::ALL.iter().copied().filter(|c| c != self).collect()
    }

    /// `0=kick, 1=snare, 2=hat`
    pub fn legend() -> String {
        Self::ALL
            .iter()
            .map(|c| format!("{}={}", c.index(), c.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for DrumClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single percussive event.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub drum_class: DrumClass,
    /// Seconds from loop start.
    pub timestamp: f64,
    /// Normalized intensity, 0.0-1.0.
    pub velocity: f64,
    /// Seconds until the next hit, or until loop end for the last hit.
    /// Always derived from timestamps, see [`Pattern::recalculate_delta_times`].
    pub delta_time: f64,
}

impl Hit {
    pub fn new(drum_class: DrumClass, timestamp: f64, velocity: f64) -> Self {
        Self {
            drum_class,
            timestamp,
            velocity,
            delta_time: 0.0,
        }
    }
}

/// An ordered set of hits spliced against a fixed loop duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub hits: Vec<Hit>,
    /// Total loop duration in seconds.
    pub loop_duration: f64,
    /// File (or backend) the pattern came from.
    pub source: Option<PathBuf>,
}

impl Pattern {
    /// Build a pattern and establish the delta-time invariant.
    pub fn new(hits: Vec<Hit>, loop_duration: f64) -> Self {
        let mut pattern = Self {
            hits,
            loop_duration,
            source: None,
        };
        pattern.recalculate_delta_times();
        pattern
    }

    pub fn with_source(mut self, source: Option<PathBuf>) -> Self {
        self.source = source;
        self
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Latest timestamp a hit may carry.
    pub fn max_timestamp(&self) -> f64 {
        (self.loop_duration - LOOP_END_GUARD).max(0.0)
    }

    /// Clamp a timestamp into `[0, loop_duration)`.
    pub fn clamp_timestamp(&self, timestamp: f64) -> f64 {
        if !timestamp.is_finite() {
            return 0.0;
        }
        timestamp.max(0.0).min(self.max_timestamp())
    }

    /// Sort hits by time and derive every delta time from the timestamps.
    pub fn recalculate_delta_times(&mut self) {
        self.hits
            .sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

        let count = self.hits.len();
        for i in 0..count {
            let next = if i + 1 < count {
                self.hits[i + 1].timestamp
            } else {
                self.loop_duration
            };
            self.hits[i].delta_time = next - self.hits[i].timestamp;
        }
    }

    /// Clamp every hit into range, then re-sort and recompute delta times.
    pub fn normalize(&mut self) {
        let max_timestamp = self.max_timestamp();
        for hit in &mut self.hits {
            hit.timestamp = if hit.timestamp.is_finite() {
                hit.timestamp.max(0.0).min(max_timestamp)
            } else {
                0.0
            };
            hit.velocity = if hit.velocity.is_finite() {
                hit.velocity.clamp(0.0, 1.0)
            } else {
                0.0
            };
        }
        self.recalculate_delta_times();
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Offset of the first hit from loop start (zero for an empty pattern).
    pub fn lead_in(&self) -> f64 {
        self.hits.first().map_or(0.0, |hit| hit.timestamp)
    }

    /// Lead-in plus every delta time. Equals `loop_duration` whenever the
    /// delta times were derived by [`Pattern::recalculate_delta_times`].
    pub fn covered_duration(&self) -> f64 {
        self.lead_in() + self.hits.iter().map(|hit| hit.delta_time).sum::<f64>()
    }

    /// Number of hits per class, indexed by [`DrumClass::index`].
    pub fn class_counts(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for hit in &self.hits {
            counts[hit.drum_class.index() as usize] += 1;
        }
        counts
    }
}
