//! Tangram entrypoint: CLI parsing, logging setup, project load, tick
//! loop. The renderer and audio device are host concerns; this binary
//! runs the engine against the null backends and feeds `ask_and_wait`
//! prompts from stdin, which is enough to run logic-only projects and
//! to host the engine behind an external compositor.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use core_backend::{NullAudio, NullRenderer, RendererBackend, SystemClock};
use core_config::CliOverrides;
use core_engine::Engine;
use core_events::InputEvent;
use core_model::ProjectDocument;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "tangram", version, about = "Entry-style block program runtime")]
struct Args {
    /// Project JSON file to run.
    pub project: PathBuf,
    /// Target fps override (> 0); takes precedence over the project's
    /// own speed setting.
    #[arg(long = "setfps")]
    pub setfps: Option<u32>,
    /// VSync hint for the renderer backend: 0 or 1.
    #[arg(long = "setVsync")]
    pub set_vsync: Option<u8>,
    /// Prefer the Vulkan renderer backend: 0 or 1.
    #[arg(long = "useVk")]
    pub use_vk: Option<u8>,
    /// Configuration file path (overrides discovery of `tangram.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

fn main() -> std::process::ExitCode {
    match run() {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            // Logging may not be up yet; print directly too.
            eprintln!("tangram: {err:#}");
            error!(target: "runtime", error = %format!("{err:#}"), "initialisation failed");
            std::process::ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    if let Some(fps) = args.setfps
        && fps == 0
    {
        anyhow::bail!("--setfps must be greater than 0");
    }

    let config = core_config::load_from(args.config.as_deref())?;
    let effective = config.effective(CliOverrides {
        fps: args.setfps,
        vsync: args.set_vsync.map(|v| v != 0),
        use_vulkan: args.use_vk.map(|v| v != 0),
    });
    let _log_guard = configure_logging(&effective)?;
    install_panic_hook();
    info!(
        target: "runtime",
        vsync = effective.vsync,
        vulkan = effective.use_vulkan,
        "startup"
    );

    let mut doc = ProjectDocument::from_path(&args.project)
        .with_context(|| format!("loading project {}", args.project.display()))?;
    if let Some(fps) = effective.fps_override {
        doc.target_fps = fps;
    }

    let mut engine = Engine::new(
        &doc,
        Box::new(NullAudio),
        Box::new(SystemClock::new()),
        Some(effective.cloud_file.clone()),
    );
    engine.set_input_channel(spawn_stdin_feed());
    engine.start();
    let mut renderer = NullRenderer;
    run_loop(&mut engine, &mut renderer);

    info!(target: "runtime", "clean shutdown");
    Ok(())
}

/// Fixed-timestep tick loop paced to the target fps.
fn run_loop(engine: &mut Engine, renderer: &mut dyn RendererBackend) {
    let frame = Duration::from_secs_f64(1.0 / engine.world.target_fps.max(1) as f64);
    info!(
        target: "runtime",
        fps = engine.world.target_fps,
        frame_ms = frame.as_millis() as u64,
        "entering tick loop"
    );
    loop {
        let started = Instant::now();
        engine.tick();
        if engine.shutdown_requested() {
            break;
        }
        // The compositor consumes the pen buffer and presents; headless
        // that is a drain plus an empty present, once per frame.
        engine.take_pen_lines();
        renderer.present();
        let elapsed = started.elapsed();
        if elapsed < frame {
            std::thread::sleep(frame - elapsed);
        }
    }
}

/// Headless input: each stdin line answers a pending `ask_and_wait`;
/// EOF shuts the engine down.
fn spawn_stdin_feed() -> crossbeam_channel::Receiver<InputEvent> {
    let (tx, rx) = crossbeam_channel::bounded(64);
    std::thread::Builder::new()
        .name("stdin-feed".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match std::io::BufRead::read_line(&mut stdin.lock(), &mut line) {
                    Ok(0) => {
                        let _ = tx.send(InputEvent::Quit);
                        break;
                    }
                    Ok(_) => {
                        let submitted = line.trim_end_matches(['\r', '\n']).to_owned();
                        if tx.send(InputEvent::TextSubmit(submitted)).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(target: "runtime.input", %err, "stdin read failed");
                        let _ = tx.send(InputEvent::Quit);
                        break;
                    }
                }
            }
        })
        .expect("spawning the stdin feed thread");
    rx
}

fn configure_logging(effective: &core_config::EffectiveConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(effective.log_filter.clone()));
    match &effective.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

fn install_panic_hook() {
    let default = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        error!(target: "runtime", %panic_info, "panic");
        default(panic_info);
    }));
}
