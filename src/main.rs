use terraplay::GlobeApp;
use terraplay::cli::Args;
use terraplay::config::{self, PathConfig, Settings};
use terraplay::core::{FrameDuration, RefreshClock};
use terraplay::server::{ApiServer, SharedApiState};
use terraplay::viewer::{LogSink, TextureCatalog};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn init_logging(args: &Args, path_config: &PathConfig) -> Result<()> {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .as_ref()
            .cloned()
            .unwrap_or_else(|| config::data_file(config::LOG_FILE, path_config));

        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .filter_module("tiny_http", log::LevelFilter::Warn)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging respects RUST_LOG if set
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .filter_module("tiny_http", log::LevelFilter::Warn)
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

/// CLI flags override persisted settings.
fn apply_overrides(settings: &mut Settings, args: &Args) {
    if let Some(dir) = &args.assets_dir {
        settings.assets_dir = dir.clone();
    }
    if let Some(name) = &args.spectrum {
        settings.default_spectrum = name.clone();
    }
    if let Some(ms) = args.frame_ms {
        settings.frame_duration_ms = ms;
    }
    if args.serve {
        settings.api_server_enabled = true;
    }
    if let Some(port) = args.port {
        settings.api_server_port = port;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());
    if let Err(e) = config::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {}", e);
    }

    init_logging(&args, &path_config)?;
    info!("Terraplay globe player starting...");
    debug!("Command-line args: {:?}", args);

    let settings_path = config::config_file(config::SETTINGS_FILE, &path_config);
    info!("Config path: {}", settings_path.display());
    let mut settings = Settings::load(&settings_path)?;
    apply_overrides(&mut settings, &args);

    let catalog = settings.catalog()?;
    let mut app = GlobeApp::new(
        catalog,
        TextureCatalog::new(&settings.assets_dir),
        FrameDuration::from_millis(settings.frame_duration_ms),
        Box::new(LogSink),
    );

    let report = app.load_assets();
    info!(
        "Preloaded {}: {} textures, {} missing, fallback {}",
        report.spectrum,
        report.loaded,
        report.missing.len(),
        if report.fallback_available { "available" } else { "missing" }
    );

    if settings.default_spectrum != app.state().spectrum_name() {
        app.select_spectrum(&settings.default_spectrum)?;
    }
    if let Some(year) = args.predict {
        app.show_prediction(year)?;
    }
    if let Some((start, end)) = args.play_range(app.state().range_selection()) {
        app.set_range_selection(start, end)?;
    }

    let shared = Arc::new(SharedApiState::default());
    shared.update(app.snapshot());
    let commands = settings
        .api_server_enabled
        .then(|| ApiServer::start(settings.api_server_port, Arc::clone(&shared)));

    if args.autoplay {
        app.play()?;
    }

    let clock = RefreshClock::new();
    let refresh = Duration::from_secs_f64(1.0 / f64::from(settings.refresh_hz.max(1)));
    debug!("Refresh loop at {} Hz", settings.refresh_hz.max(1));

    loop {
        if let Some(rx) = &commands {
            while let Ok(command) = rx.try_recv() {
                if let Err(e) = app.handle_command(command) {
                    warn!("API command failed: {}", e);
                }
            }
        }

        app.update(clock.now());
        shared.update(app.snapshot());

        if commands.is_none() && !app.is_playing() {
            break;
        }
        thread::sleep(refresh);
    }

    info!("Final year: {}", app.state().year_label());
    Ok(())
}
