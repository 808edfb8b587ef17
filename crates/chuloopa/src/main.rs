use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use chuloopa_core::controller::{allocate_slots, resolve_variation_dir, run_generation};
use chuloopa_core::{
    resolve_backend, ConfigManager, ControllerMode, Dispatcher, FileWatchModule,
    GenerationController, GenerationJob, LogNotifier, ModuleManager, Notifier, OscModule,
    OscNotifier, OutputTarget, Settings, VariationParams, VariationStrategy,
};

/// Generates drum pattern variations for the CHULOOPA looper.
#[derive(Parser, Debug)]
#[command(name = "chuloopa")]
#[command(about = "Drum pattern variation generator for CHULOOPA")]
struct Args {
    /// Track number (0-2); reads track_<N>_drums.txt from the track directory
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..3))]
    track: Option<u8>,

    /// Path to a drum pattern file
    #[arg(short, long, conflicts_with = "track")]
    file: Option<PathBuf>,

    /// Variation strategy (generative, groove_preserve, humanize, mutate, densify, simplify, shift, random)
    #[arg(short = 'T', long, alias = "type")]
    strategy: Option<VariationStrategy>,

    /// Watch the track directory and listen for OSC control messages
    #[arg(short, long)]
    watch: bool,

    /// Only generate on explicit regenerate requests, not on file changes
    #[arg(long, requires = "watch")]
    mediated: bool,

    /// Directory containing track files
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Directory for variation files (relative paths are resolved next to the track)
    #[arg(long)]
    variation_dir: Option<PathBuf>,

    /// Copy the source to <file>.backup before the first pass
    #[arg(short, long)]
    backup: bool,

    /// Overwrite the source file instead of writing variation files
    #[arg(long)]
    in_place: bool,

    /// Generative sampling temperature (0.0-1.0)
    #[arg(long)]
    temperature: Option<f32>,

    /// Variation intensity (0.0-1.0)
    #[arg(long)]
    spice: Option<f32>,

    /// Seed for reproducible variations
    #[arg(long)]
    seed: Option<u64>,

    /// JSON settings file; written with defaults if missing
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => {
            let mut manager = ConfigManager::new(Some(path.clone()));
            manager.load()?
        }
        None => Settings::default(),
    };

    if let Some(dir) = &args.dir {
        settings.track_dir = dir.clone();
    }
    if let Some(dir) = &args.variation_dir {
        settings.variation_dir = dir.clone();
    }
    if let Some(strategy) = args.strategy {
        settings.strategy = strategy;
    }
    if args.mediated {
        settings.mode = ControllerMode::Mediated;
    }
    if args.backup {
        settings.backup_original = true;
    }
    if args.in_place {
        settings.in_place = true;
    }
    if let Some(temperature) = args.temperature {
        settings.temperature = temperature;
    }
    if let Some(spice) = args.spice {
        settings.initial_spice = spice;
    }
    if args.seed.is_some() {
        settings.rng_seed = args.seed;
    }

    ConfigManager::validate_settings(&settings)
        .map_err(|errors| anyhow!("invalid settings: {}", errors.join(", ")))?;
    Ok(settings)
}

fn build_dispatcher(settings: &Settings) -> Dispatcher {
    Dispatcher::new(resolve_backend(settings))
        .with_timeout(Duration::from_secs(settings.backend_timeout_secs))
}

async fn generate_once(settings: Settings, source: PathBuf) -> anyhow::Result<()> {
    if !source.is_file() {
        bail!("File not found: {}", source.display());
    }

    let output = if settings.in_place {
        OutputTarget::InPlace
    } else {
        let mut next_slot = 1;
        OutputTarget::Slots {
            dir: resolve_variation_dir(&settings.variation_dir, &source),
            slots: allocate_slots(
                &mut next_slot,
                settings.variations_per_pass,
                settings.max_stored_variations,
            ),
        }
    };

    let job = GenerationJob {
        source,
        strategy: settings.strategy,
        params: VariationParams {
            spice: settings.initial_spice,
            temperature: settings.temperature,
        },
        output,
        backup: settings.backup_original,
        seed: settings.rng_seed,
    };

    log::info!("Generating variation: {}", job.strategy);
    let dispatcher = build_dispatcher(&settings);
    let outcome = run_generation(&dispatcher, job)
        .await
        .context("Failed to generate variation")?;

    for path in &outcome.written {
        println!("{}", path.display());
    }
    log::info!("Variation generated successfully");
    Ok(())
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    let mut manager = ModuleManager::new();

    manager.register_module(Box::new(FileWatchModule::new(
        settings.track_dir.clone(),
        settings.file_suffix.clone(),
        Duration::from_millis(settings.poll_interval_ms),
    )));

    let notifier: Arc<dyn Notifier> = if settings.osc_enabled {
        manager.register_module(Box::new(OscModule::new(
            settings.listen_socket(),
            settings.osc_address_prefix.clone(),
        )));

        match OscNotifier::new(settings.send_socket(), settings.osc_address_prefix.clone()) {
            Ok(notifier) => Arc::new(notifier),
            Err(e) => {
                log::warn!("OSC notifications disabled: {}", e);
                Arc::new(LogNotifier)
            }
        }
    } else {
        Arc::new(LogNotifier)
    };

    manager
        .initialize()
        .await
        .map_err(|e| anyhow!("Failed to initialize modules: {}", e))?;
    manager
        .start()
        .await
        .map_err(|e| anyhow!("Failed to start modules: {}", e))?;

    let messages = manager
        .take_message_receiver()
        .ok_or_else(|| anyhow!("module message receiver already taken"))?;
    let controller = GenerationController::new(
        settings.clone(),
        Arc::new(build_dispatcher(&settings)),
        notifier,
        messages,
    );
    let handle = controller.handle(manager.message_sender());
    let controller_task = tokio::spawn(controller.run());

    log::info!(
        "Watching {} for *{} ({:?} mode). Press Ctrl+C to stop.",
        settings.track_dir.display(),
        settings.file_suffix,
        settings.mode
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    log::info!("Stopping...");

    if let Err(e) = handle.shutdown().await {
        log::warn!("{}", e);
    }
    controller_task.await?;
    manager
        .shutdown()
        .await
        .map_err(|e| anyhow!("Module shutdown failed: {}", e))?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = load_settings(&args)?;

    if args.watch {
        return serve(settings).await;
    }

    let source = match (&args.file, args.track) {
        (Some(file), _) => file.clone(),
        (None, Some(track)) => settings
            .track_dir
            .join(format!("track_{}{}", track, settings.file_suffix)),
        (None, None) => bail!("Specify --track or --file (or --watch)"),
    };

    generate_once(settings, source).await
}
