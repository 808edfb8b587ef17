use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use super::debounce::Debouncer;
use super::job::{
    allocate_slots, resolve_variation_dir, run_generation, variation_path, GenerationError,
    GenerationJob, GenerationOutcome, OutputTarget,
};
use super::spice::SpiceLevel;
use crate::control::Notifier;
use crate::generation::{Dispatcher, VariationParams};
use crate::messages::{ControllerEvent, ControllerMode, Notification, Settings};
use crate::modules::ModuleMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Generating,
}

#[derive(Debug, Default)]
struct TrackState {
    phase: Phase,
    /// A request arrived while generating; run once more afterwards.
    pending: bool,
    backed_up: bool,
    next_slot: u32,
}

/// Messages from tasks the controller spawned itself.
enum Internal {
    Settled(PathBuf),
    Finished {
        source: PathBuf,
        result: Result<GenerationOutcome, GenerationError>,
    },
}

/// Cloneable access to a running controller.
#[derive(Clone)]
pub struct ControllerHandle {
    sender: mpsc::Sender<ModuleMessage>,
    spice: SpiceLevel,
}

impl ControllerHandle {
    pub async fn send(&self, event: ControllerEvent) -> Result<(), String> {
        self.sender
            .send(ModuleMessage::Event(event))
            .await
            .map_err(|_| "generation controller has stopped".to_string())
    }

    pub async fn regenerate(&self, track: Option<PathBuf>) -> Result<(), String> {
        self.send(ControllerEvent::RegenerateRequested { track }).await
    }

    pub async fn shutdown(&self) -> Result<(), String> {
        self.send(ControllerEvent::Shutdown).await
    }

    pub fn spice(&self) -> f32 {
        self.spice.get()
    }
}

/// Owns all generation state. Runs one job per pattern file at a time and
/// coalesces requests that arrive meanwhile into a single follow-up pass.
pub struct GenerationController {
    settings: Settings,
    dispatcher: Arc<Dispatcher>,
    notifier: Arc<dyn Notifier>,
    messages: mpsc::Receiver<ModuleMessage>,
    internal_tx: mpsc::Sender<Internal>,
    internal_rx: mpsc::Receiver<Internal>,
    tracks: HashMap<PathBuf, TrackState>,
    debouncer: Debouncer,
    spice: SpiceLevel,
    jobs_started: u64,
}

impl GenerationController {
    pub fn new(
        settings: Settings,
        dispatcher: Arc<Dispatcher>,
        notifier: Arc<dyn Notifier>,
        messages: mpsc::Receiver<ModuleMessage>,
    ) -> Self {
        let (internal_tx, internal_rx) = mpsc::channel(64);
        let debouncer = Debouncer::new(Duration::from_millis(settings.debounce_ms));
        let spice = SpiceLevel::new(settings.initial_spice);

        Self {
            settings,
            dispatcher,
            notifier,
            messages,
            internal_tx,
            internal_rx,
            tracks: HashMap::new(),
            debouncer,
            spice,
            jobs_started: 0,
        }
    }

    /// Handle that feeds events through `sender`, which must belong to the
    /// channel this controller receives from.
    pub fn handle(&self, sender: mpsc::Sender<ModuleMessage>) -> ControllerHandle {
        ControllerHandle {
            sender,
            spice: self.spice.clone(),
        }
    }

    pub fn spice_level(&self) -> SpiceLevel {
        self.spice.clone()
    }

    pub fn phase(&self, path: &Path) -> Phase {
        self.tracks
            .get(path)
            .map(|state| state.phase)
            .unwrap_or_default()
    }

    fn in_flight(&self) -> usize {
        self.tracks
            .values()
            .filter(|state| state.phase == Phase::Generating)
            .count()
    }

    /// Process events until `Shutdown` or until every sender is gone, then
    /// wait for running jobs.
    pub async fn run(mut self) {
        log::info!(
            "Generation controller running ({:?} mode, {} strategy, {})",
            self.settings.mode,
            self.settings.strategy,
            self.dispatcher.capability()
        );

        loop {
            tokio::select! {
                message = self.messages.recv() => {
                    match message {
                        Some(ModuleMessage::Event(ControllerEvent::Shutdown)) | None => {
                            log::info!("Generation controller received shutdown signal");
                            break;
                        }
                        Some(ModuleMessage::Event(event)) => self.handle_event(event).await,
                        Some(ModuleMessage::Status(status)) => log::info!("{}", status),
                        Some(ModuleMessage::Error(error)) => log::error!("{}", error),
                    }
                }

                Some(internal) = self.internal_rx.recv() => self.handle_internal(internal),
            }
        }

        // Let running jobs finish; drop anything still queued
        for state in self.tracks.values_mut() {
            state.pending = false;
        }
        while self.in_flight() > 0 {
            log::info!("Waiting for {} generation job(s) to finish...", self.in_flight());
            match self.internal_rx.recv().await {
                Some(Internal::Finished { source, result }) => self.finish(source, result),
                Some(Internal::Settled(_)) => {}
                None => break,
            }
        }

        log::info!("Generation controller stopped");
    }

    async fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::SpiceChanged(level) => match self.spice.set(level) {
                Some(stored) => log::info!("Spice level: {:.2}", stored),
                None => log::warn!("Ignoring non-numeric spice level"),
            },
            ControllerEvent::RegenerateRequested { track } => {
                let path = track.unwrap_or_else(|| self.settings.tracked_path());
                self.request(path);
            }
            ControllerEvent::FileChanged(path) => self.file_changed(path),
            ControllerEvent::TrackCleared => self.track_cleared().await,
            // Handled by the run loop
            ControllerEvent::Shutdown => {}
        }
    }

    fn handle_internal(&mut self, internal: Internal) {
        match internal {
            Internal::Settled(path) => self.request(path),
            Internal::Finished { source, result } => {
                self.finish(source.clone(), result);
                let follow_up = self
                    .tracks
                    .get_mut(&source)
                    .map(|state| std::mem::take(&mut state.pending))
                    .unwrap_or(false);
                if follow_up {
                    log::info!("Running queued request for {}", source.display());
                    self.request(source);
                }
            }
        }
    }

    fn file_changed(&mut self, path: PathBuf) {
        if !self.debouncer.accept(&path, Instant::now()) {
            log::debug!("Debounced change to {}", path.display());
            return;
        }

        match self.settings.mode {
            ControllerMode::Mediated => {
                log::info!(
                    "{} changed; waiting for a regenerate request",
                    path.display()
                );
            }
            ControllerMode::Autonomous => {
                log::info!("{} changed, generating after settle delay", path.display());
                let delay = Duration::from_millis(self.settings.settle_delay_ms);
                let internal = self.internal_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = internal.send(Internal::Settled(path)).await;
                });
            }
        }
    }

    fn request(&mut self, path: PathBuf) {
        if let Some(state) = self.tracks.get_mut(&path) {
            if state.phase == Phase::Generating {
                if !state.pending {
                    log::info!("Generation already running for {}, queued", path.display());
                }
                state.pending = true;
                return;
            }
        }

        if !path.is_file() {
            let error = GenerationError::SourceNotFound(path);
            log::error!("{}", error);
            self.notifier.notify(Notification::Error(error.to_string()));
            return;
        }

        self.start(path);
    }

    fn start(&mut self, path: PathBuf) {
        let params = VariationParams {
            spice: self.spice.get(),
            temperature: self.settings.temperature,
        };
        let seed = self
            .settings
            .rng_seed
            .map(|seed| seed.wrapping_add(self.jobs_started));
        self.jobs_started += 1;

        let state = self.tracks.entry(path.clone()).or_default();
        state.phase = Phase::Generating;

        let backup = self.settings.backup_original && !state.backed_up;
        state.backed_up |= backup;

        let output = if self.settings.in_place {
            OutputTarget::InPlace
        } else {
            OutputTarget::Slots {
                dir: resolve_variation_dir(&self.settings.variation_dir, &path),
                slots: allocate_slots(
                    &mut state.next_slot,
                    self.settings.variations_per_pass,
                    self.settings.max_stored_variations,
                ),
            }
        };

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        log::info!(
            "Generating {} variation for {} (spice {:.2})",
            self.settings.strategy,
            name,
            params.spice
        );
        self.notifier.notify(Notification::Progress(format!(
            "Generating {} variation for {}",
            self.settings.strategy, name
        )));

        let job = GenerationJob {
            source: path.clone(),
            strategy: self.settings.strategy,
            params,
            output,
            backup,
            seed,
        };

        let dispatcher = self.dispatcher.clone();
        let internal = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = run_generation(&dispatcher, job).await;
            let _ = internal
                .send(Internal::Finished {
                    source: path,
                    result,
                })
                .await;
        });
    }

    fn finish(&mut self, source: PathBuf, result: Result<GenerationOutcome, GenerationError>) {
        if let Some(state) = self.tracks.get_mut(&source) {
            state.phase = Phase::Idle;
        }

        match result {
            Ok(outcome) => {
                if outcome.written.iter().any(|path| path == &source) {
                    // Our own write must not look like a new recording
                    self.debouncer.mark(&source, Instant::now());
                }
                let count = u32::try_from(outcome.written.len()).unwrap_or(u32::MAX);
                log::info!("{} variation(s) ready for {}", count, source.display());
                self.notifier.notify(Notification::VariationsReady(count));
            }
            Err(e) => {
                log::error!("Generation failed for {}: {}", source.display(), e);
                self.notifier.notify(Notification::Error(e.to_string()));
            }
        }
    }

    async fn track_cleared(&mut self) {
        log::info!("Looper cleared its track");
        if !self.settings.clear_variations_on_track_cleared {
            return;
        }

        let source = self.settings.tracked_path();
        let dir = resolve_variation_dir(&self.settings.variation_dir, &source);
        let mut removed = 0;
        for slot in 1..=self.settings.max_stored_variations {
            let path = variation_path(&dir, &source, slot);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("Could not remove {}: {}", path.display(), e),
            }
        }

        if let Some(state) = self.tracks.get_mut(&source) {
            state.next_slot = 1;
        }
        log::info!("Removed {} stale variation(s)", removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullBackend;
    use crate::generation::VariationStrategy;
    use parking_lot::Mutex;
    use tempfile::TempDir;

    const TRACK: &str = "# Total loop duration: 2.000000 seconds\n\
0,0.000000,0.900000,0.500000\n\
1,1.000000,0.800000,1.000000\n";

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Notification>>,
    }

    impl Notifier for Recorder {
        fn notify(&self, notification: Notification) {
            self.seen.lock().push(notification);
        }
    }

    fn settings(dir: &Path) -> Settings {
        Settings {
            track_dir: dir.to_path_buf(),
            strategy: VariationStrategy::Humanize,
            rng_seed: Some(1),
            debounce_ms: 2000,
            settle_delay_ms: 0,
            ..Settings::default()
        }
    }

    fn controller(
        settings: Settings,
    ) -> (GenerationController, mpsc::Sender<ModuleMessage>, Arc<Recorder>) {
        let (tx, rx) = mpsc::channel(16);
        let recorder = Arc::new(Recorder::default());
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(NullBackend::new("offline"))));
        let controller = GenerationController::new(settings, dispatcher, recorder.clone(), rx);
        (controller, tx, recorder)
    }

    #[tokio::test]
    async fn test_spice_is_clamped() {
        let dir = TempDir::new().unwrap();
        let (controller, tx, _) = controller(settings(dir.path()));
        let handle = controller.handle(tx);
        let task = tokio::spawn(controller.run());

        handle.send(ControllerEvent::SpiceChanged(3.0)).await.unwrap();
        handle.send(ControllerEvent::SpiceChanged(f32::NAN)).await.unwrap();
        handle.shutdown().await.unwrap();
        task.await.unwrap();

        assert_eq!(handle.spice(), 1.0);
    }

    #[tokio::test]
    async fn test_missing_source_reports_error_once() {
        let dir = TempDir::new().unwrap();
        let (mut controller, _tx, recorder) = controller(settings(dir.path()));

        controller
            .handle_event(ControllerEvent::RegenerateRequested { track: None })
            .await;

        let seen = recorder.seen.lock().clone();
        assert_eq!(seen.len(), 1);
        assert!(matches!(&seen[0], Notification::Error(text) if text.contains("track_0_drums.txt")));
        assert_eq!(controller.phase(&dir.path().join("track_0_drums.txt")), Phase::Idle);
    }

    #[tokio::test]
    async fn test_regenerate_writes_slot() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("track_0_drums.txt");
        std::fs::write(&source, TRACK).unwrap();

        let (controller, tx, recorder) = controller(settings(dir.path()));
        let handle = controller.handle(tx);
        let task = tokio::spawn(controller.run());

        handle.regenerate(None).await.unwrap();
        handle.shutdown().await.unwrap();
        task.await.unwrap();

        assert!(dir.path().join("variations/track_0_drums_var1.txt").exists());
        let seen = recorder.seen.lock().clone();
        assert!(matches!(seen.first(), Some(Notification::Progress(_))));
        assert_eq!(seen.last(), Some(&Notification::VariationsReady(1)));
    }

    #[tokio::test]
    async fn test_mediated_mode_ignores_file_changes() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("track_0_drums.txt");
        std::fs::write(&source, TRACK).unwrap();

        let mut settings = settings(dir.path());
        settings.mode = ControllerMode::Mediated;
        let (mut controller, _tx, recorder) = controller(settings);

        controller
            .handle_event(ControllerEvent::FileChanged(source.clone()))
            .await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(controller.internal_rx.try_recv().is_err());
        assert!(recorder.seen.lock().is_empty());
        assert_eq!(controller.phase(&source), Phase::Idle);
    }

    #[tokio::test]
    async fn test_autonomous_change_is_debounced() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("track_0_drums.txt");
        std::fs::write(&source, TRACK).unwrap();

        let (mut controller, _tx, _) = controller(settings(dir.path()));

        controller
            .handle_event(ControllerEvent::FileChanged(source.clone()))
            .await;
        controller
            .handle_event(ControllerEvent::FileChanged(source.clone()))
            .await;

        let settled = tokio::time::timeout(Duration::from_secs(1), controller.internal_rx.recv())
            .await
            .unwrap();
        assert!(matches!(settled, Some(Internal::Settled(path)) if path == source));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(controller.internal_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_track_cleared_removes_variations() {
        let dir = TempDir::new().unwrap();
        let variations = dir.path().join("variations");
        std::fs::create_dir_all(&variations).unwrap();
        std::fs::write(variations.join("track_0_drums_var1.txt"), TRACK).unwrap();
        std::fs::write(variations.join("track_0_drums_var3.txt"), TRACK).unwrap();
        std::fs::write(variations.join("track_1_drums_var1.txt"), TRACK).unwrap();

        let mut settings = settings(dir.path());
        settings.clear_variations_on_track_cleared = true;
        let (mut controller, _tx, _) = controller(settings);

        controller.handle_event(ControllerEvent::TrackCleared).await;

        assert!(!variations.join("track_0_drums_var1.txt").exists());
        assert!(!variations.join("track_0_drums_var3.txt").exists());
        assert!(variations.join("track_1_drums_var1.txt").exists());
    }
}
