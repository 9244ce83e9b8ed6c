mod args;

use args::{Args, Mode};
use auto_tower_run::game_automation::{
    BotConfig, ControlPlane, Detector, Session, TemplateLibrary, TimingConfig, Token, run_batch,
};
use auto_tower_run::host::{FrameCapture, HostBackend, HostPlatform, WindowLocator};
use clap::Parser;
use std::io::Cursor;
use std::process::ExitCode;
use std::sync::Arc;

const SCREENSHOT_FILE: &str = "tower-screenshot.png";

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    log::info!(
        "🗼 Auto Tower Run v{} (© {} Vigor Solutions)",
        env!("APP_VERSION_DISPLAY"),
        env!("APP_BUILD_YEAR")
    );

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("❌ Failed to start the async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), String> {
    let config = BotConfig::load(args.config.as_deref()).map_err(|e| e.to_string())?;
    let host = Arc::new(open_host(&args)?);
    log::info!("🖥️ Host backend: {}", host.name());

    match args.mode() {
        Mode::Screenshot => screenshot(&host, &config).await,
        Mode::Probe => {
            let library = TemplateLibrary::load(&args.templates);
            probe(&host, &config, Detector::new(library, config.matching.clone())).await
        }
        Mode::Run => {
            let library = TemplateLibrary::load(&args.templates);
            if library.is_empty() {
                return Err(format!(
                    "No templates found in {}",
                    args.templates.display()
                ));
            }
            let runs = args.runs.unwrap_or(config.limits.max_runs);
            let control = ControlPlane::new();
            install_stop_handlers(&control, &host);

            let detector = Detector::new(library, config.matching.clone());
            let session = Session::new(host, detector, config, control);
            log::info!("🚀 Starting {runs} run(s)");
            let summary = run_batch(&session, runs).await;
            if summary.stopped_by_user {
                log::info!("🛑 Stopped by user after {} completed run(s)", summary.completed);
            } else {
                log::info!("✅ Completed {} of {} run(s)", summary.completed, runs);
            }
            match summary.aborted {
                Some(reason) => Err(reason),
                None => Ok(()),
            }
        }
    }
}

fn open_host(args: &Args) -> Result<HostBackend, String> {
    match &args.replay {
        Some(dir) => HostBackend::replay(dir).map_err(|e| e.to_string()),
        None => open_live_host(),
    }
}

#[cfg(feature = "desktop")]
fn open_live_host() -> Result<HostBackend, String> {
    HostBackend::desktop().map_err(|e| e.to_string())
}

#[cfg(not(feature = "desktop"))]
fn open_live_host() -> Result<HostBackend, String> {
    Err("Built without the `desktop` feature: rebuild with `--features desktop` \
         or pass `--replay DIR`"
        .to_string())
}

fn install_stop_handlers(control: &ControlPlane, host: &HostBackend) {
    let on_ctrl_c = control.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.stop();
        }
    });

    #[cfg(feature = "desktop")]
    if !host.is_replay() {
        auto_tower_run::host::hotkeys::spawn_hotkey_listener(control.clone());
        log::info!("⌨️ Hotkeys: P = pause/resume, S = skip initial waits, Q = stop");
    }
    #[cfg(not(feature = "desktop"))]
    let _ = host;
}

fn frame_capture(config: &BotConfig) -> FrameCapture {
    FrameCapture::new(WindowLocator::new(
        &config.window_filters,
        TimingConfig::ms(config.timing.restore_settle_ms),
    ))
}

async fn screenshot(host: &HostBackend, config: &BotConfig) -> Result<(), String> {
    let frame = frame_capture(config)
        .capture(host)
        .await
        .map_err(|e| e.to_string())?;

    let mut png = Vec::new();
    frame
        .rgb()
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| format!("PNG encoding failed: {e}"))?;
    tokio::fs::write(SCREENSHOT_FILE, &png)
        .await
        .map_err(|e| format!("Write failed: {e}"))?;
    log::info!(
        "✅ Screenshot of {} saved to {}",
        frame.rect(),
        SCREENSHOT_FILE
    );
    Ok(())
}

async fn probe(host: &HostBackend, config: &BotConfig, detector: Detector) -> Result<(), String> {
    let frame = frame_capture(config)
        .capture(host)
        .await
        .map_err(|e| e.to_string())?;
    log::info!("🔎 Probing {} tokens on a frame of {}", Token::ALL.len(), frame.rect());

    for token in Token::ALL {
        let threshold = detector.config().threshold_for(token);
        if detector.library().get(token).is_none() {
            log::info!("🔎 {:<16} template not loaded", token.name());
            continue;
        }
        match detector.probe(&frame, token) {
            Some(m) => log::info!(
                "🔎 {:<16} {} (threshold {:.2}) {}",
                token.name(),
                m,
                threshold,
                if m.passes(threshold) { "✅" } else { "❌" }
            ),
            None => log::info!("🔎 {:<16} template larger than the frame", token.name()),
        }
    }
    Ok(())
}
