//! Oxidized-Retro - Libretro Frontend
//!
//! Headless frontend binary: loads a core shared object and a game image
//! from the command line, drives the core for a bounded number of frames
//! at its reported pace, and tears the session down in order. Video and
//! audio go to null sinks; input reads all-released.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context};

use or_bridge::{NullAudioSink, NullInputSource, NullVideoSink, SessionContext};
use or_core::Config;
use or_loader::LoadedCore;
use or_runtime::{CoreSession, FrameStats, GameSource};

/// Frames to run when the command line does not say otherwise.
const DEFAULT_FRAMES: u64 = 300;

struct Args {
    core_path: PathBuf,
    game_path: PathBuf,
    frames: u64,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = std::env::args().skip(1);
    let core_path = args.next().map(PathBuf::from);
    let game_path = args.next().map(PathBuf::from);
    let frames = match args.next() {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("invalid frame count `{raw}`"))?,
        None => DEFAULT_FRAMES,
    };

    match (core_path, game_path) {
        (Some(core_path), Some(game_path)) => Ok(Args {
            core_path,
            game_path,
            frames,
        }),
        _ => bail!("usage: oxidized-retro <core> <game> [frames]"),
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Oxidized-Retro libretro frontend");

    let args = parse_args()?;
    let config = Config::load().map_err(|e| anyhow!("failed to load configuration: {e}"))?;
    config
        .paths
        .ensure_directories()
        .context("creating system/save directories")?;

    let core = LoadedCore::load(&args.core_path)?;
    let identity = core.system_info();
    tracing::info!(
        "core: {} {} (extensions: {})",
        identity.library_name,
        identity.library_version,
        identity.valid_extensions
    );

    let ctx = SessionContext::from_config(&config, Box::new(NullInputSource))?;
    let mut session = CoreSession::new(core, Box::new(NullVideoSink), Box::new(NullAudioSink));
    session.register_callbacks(ctx)?;
    session.init()?;

    let game = GameSource::from_file(&args.game_path)
        .with_context(|| format!("reading game image {}", args.game_path.display()))?;
    let av = session.load_game(game)?;

    let target_frame_time = if config.general.throttle && av.timing.fps > 0.0 {
        Some(Duration::from_secs_f64(1.0 / av.timing.fps))
    } else {
        None
    };

    let mut totals = FrameStats::default();
    let started = Instant::now();
    for _ in 0..args.frames {
        let frame_start = Instant::now();
        let stats = session.run_frame()?;
        totals.refreshed += stats.refreshed;
        totals.duplicated += stats.duplicated;
        totals.hw_frames += stats.hw_frames;
        totals.audio_frames += stats.audio_frames;

        // Sleep to maintain the core's reported frame rate
        if let Some(target) = target_frame_time {
            let elapsed = frame_start.elapsed();
            if elapsed < target {
                std::thread::sleep(target - elapsed);
            }
        }
    }

    tracing::info!(
        "ran {} frames in {:.2}s: {} refreshes, {} dupes, {} hw frames, {} audio frames",
        session.frame_count(),
        started.elapsed().as_secs_f64(),
        totals.refreshed,
        totals.duplicated,
        totals.hw_frames,
        totals.audio_frames
    );

    session.unload_game()?;
    session.deinit()?;
    Ok(())
}
