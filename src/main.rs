//! tascript - Frame-scripted input playback engine
//!
//! Parses indentation-structured TAS input scripts, delta-compiles them into
//! per-frame press/release/move sets, and replays them through an input sink.

use std::path::Path;
use std::time::Duration;

use tascript::analysis::annotate::{annotate_text, LineAnnotation};
use tascript::app::cli::{Cli, Commands};
use tascript::app::config::Config;
use tascript::compile::compiler::{self, InstructionCompiler};
use tascript::playback::scheduler::PlaybackScheduler;
use tascript::playback::sink::LoggingSink;
use tascript::{FrameCache, FrameCount, ScriptCache};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    // Execute command
    match cli.command {
        Commands::Run {
            file,
            period_ms,
            quick,
            raw,
        } => {
            run_play(&file, period_ms, quick, raw, &config)?;
        }
        Commands::Count { file, json } => {
            run_count(&file, json)?;
        }
        Commands::Check { file, json } => {
            run_check(&file, json)?;
        }
        Commands::Annotate { file } => {
            run_annotate(&file)?;
        }
        Commands::Init { force } => {
            run_init(force, &config)?;
        }
    }

    Ok(())
}

fn run_play(
    file: &Path,
    period_ms: Option<u64>,
    quick: bool,
    raw: bool,
    config: &Config,
) -> anyhow::Result<()> {
    compiler::set_mouse_offset(config.playback.offset_x, config.playback.offset_y);

    let cache = ScriptCache::new();
    let unit = cache.get_or_parse(file)?;
    let compiler = InstructionCompiler::new();
    let period = Duration::from_millis(period_ms.unwrap_or(config.playback.frame_period_ms));

    if raw {
        info!(
            file = %file.display(),
            frames = unit.instructions.len(),
            "script parsed, compiling per frame"
        );
        if quick {
            PlaybackScheduler::run_quick_raw(compiler, &unit.instructions, &mut LoggingSink)?;
        } else {
            let scheduler = PlaybackScheduler::new(period);
            scheduler
                .spawn_timed_raw(compiler, unit.instructions.clone(), LoggingSink)
                .wait()?;
        }
    } else {
        let frames = compiler.compile_sequence(&unit.instructions)?;
        info!(
            file = %file.display(),
            frames = frames.len(),
            "script compiled"
        );
        if quick {
            PlaybackScheduler::run_quick(&frames, &mut LoggingSink)?;
        } else {
            let scheduler = PlaybackScheduler::new(period);
            scheduler.spawn_timed(frames, LoggingSink).wait()?;
        }
    }

    info!("playback finished");
    Ok(())
}

fn run_count(file: &Path, json: bool) -> anyhow::Result<()> {
    let cache = FrameCache::new();
    let count = cache.count_file(file)?;

    if json {
        println!("{}", serde_json::to_string(&count)?);
    } else {
        match count {
            FrameCount::Frames(n) => println!("{n}"),
            FrameCount::Indeterminate => println!("indeterminate"),
        }
    }
    Ok(())
}

fn run_check(file: &Path, json: bool) -> anyhow::Result<()> {
    let cache = ScriptCache::new();
    let unit = cache.get_or_parse(file)?;
    let compiler = InstructionCompiler::new();
    let frames = compiler.compile_sequence(&unit.instructions)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&frames)?);
    } else {
        info!(
            file = %file.display(),
            frames = frames.len(),
            "script is valid"
        );
        println!("ok: {} frames", frames.len());
    }
    Ok(())
}

fn run_annotate(file: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)?;
    let cache = FrameCache::new();
    let annotations = annotate_text(&text, file.parent(), &cache);

    let width = annotations
        .iter()
        .map(|a| a.to_string().len())
        .max()
        .unwrap_or(0);
    for (line, annotation) in text.lines().zip(&annotations) {
        match annotation {
            LineAnnotation::None => println!("{:>width$} | {line}", ""),
            other => println!("{:>width$} | {line}", other.to_string()),
        }
    }
    Ok(())
}

fn run_init(force: bool, config: &Config) -> anyhow::Result<()> {
    let path = Config::default_path();
    if path.exists() && !force {
        anyhow::bail!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    config.save(&path)?;
    info!(path = %path.display(), "config written");
    Ok(())
}
