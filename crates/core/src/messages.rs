use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::generation::VariationStrategy;

/// Events consumed by the generation controller
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    // Control surface
    SpiceChanged(f32),
    RegenerateRequested {
        /// Pattern file to vary; the configured tracked file when `None`.
        track: Option<PathBuf>,
    },
    TrackCleared,

    // File watcher
    FileChanged(PathBuf),

    // System
    Shutdown,
}

/// Outbound messages for the looper
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Progress(String),
    VariationsReady(u32),
    Error(String),
}

impl Notification {
    /// Message name, appended to the address prefix on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Notification::Progress(_) => "generation_progress",
            Notification::VariationsReady(_) => "variations_ready",
            Notification::Error(_) => "error",
        }
    }
}

/// How file changes are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerMode {
    /// A changed pattern file starts a generation pass on its own.
    #[default]
    Autonomous,
    /// Only explicit regenerate requests start a pass; file changes are logged.
    Mediated,
}

/// Settings configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    // Files
    pub track_dir: PathBuf,
    pub variation_dir: PathBuf,
    pub file_suffix: String,
    /// Default target for regenerate requests, relative to `track_dir`.
    pub tracked_file: PathBuf,
    /// Overwrite the source file instead of writing variation slots.
    pub in_place: bool,
    pub backup_original: bool,
    pub clear_variations_on_track_cleared: bool,

    // Generation
    pub strategy: VariationStrategy,
    pub mode: ControllerMode,
    pub initial_spice: f32,
    pub variations_per_pass: u32,
    pub max_stored_variations: u32,
    pub rng_seed: Option<u64>,

    // Watcher timing
    pub debounce_ms: u64,
    pub settle_delay_ms: u64,
    pub poll_interval_ms: u64,

    // OSC
    pub osc_enabled: bool,
    pub osc_listen_addr: String,
    pub osc_listen_port: u16,
    pub osc_send_addr: String,
    pub osc_send_port: u16,
    pub osc_address_prefix: String,

    // Generative backend
    pub gemini_model: String,
    pub api_key_env: String,
    pub temperature: f32,
    pub backend_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // File defaults
            track_dir: PathBuf::from("."),
            variation_dir: PathBuf::from("variations"),
            file_suffix: "_drums.txt".to_string(),
            tracked_file: PathBuf::from("track_0_drums.txt"),
            in_place: false,
            backup_original: false,
            clear_variations_on_track_cleared: false,

            // Generation defaults
            strategy: VariationStrategy::Generative,
            mode: ControllerMode::Autonomous,
            initial_spice: 0.5,
            variations_per_pass: 1,
            max_stored_variations: 3,
            rng_seed: None,

            // Watcher defaults
            debounce_ms: 2000,
            settle_delay_ms: 500,
            poll_interval_ms: 250,

            // OSC defaults
            osc_enabled: true,
            osc_listen_addr: "127.0.0.1".to_string(),
            osc_listen_port: 5000,
            osc_send_addr: "127.0.0.1".to_string(),
            osc_send_port: 5001,
            osc_address_prefix: "/chuloopa/".to_string(),

            // Backend defaults
            gemini_model: "gemini-3-flash-preview".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            temperature: 0.7,
            backend_timeout_secs: 60,
        }
    }
}

impl Settings {
    pub fn tracked_path(&self) -> PathBuf {
        if self.tracked_file.is_absolute() {
            self.tracked_file.clone()
        } else {
            self.track_dir.join(&self.tracked_file)
        }
    }

    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.osc_listen_addr, self.osc_listen_port)
    }

    pub fn send_socket(&self) -> String {
        format!("{}:{}", self.osc_send_addr, self.osc_send_port)
    }
}
