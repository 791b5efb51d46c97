//! Application entry point for the voice assistant.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Load Whisper and build the speech adapter and action provider.
//! 5. Capture the session (time of day, trigger gate) and the shared state.
//! 6. Spawn the trigger loop on the runtime.
//! 7. Spawn the hotkey listener thread.
//! 8. Run [`eframe::run_native`], which blocks the main thread until the
//!    window is closed.

use std::sync::Arc;

use anyhow::Context as _;
use eframe::egui;
use tokio::sync::mpsc;
use voice_assistant::{
    app::AssistantApp,
    config::AppConfig,
    providers::SystemProvider,
    router::{new_shared_state, AssistantSession, DispatchConfig, DispatchEngine, TriggerLoop},
    speech::LocalSpeech,
    stt::{SttEngine, SttError, TranscribeParams, WhisperEngine},
    trigger::{parse_key, HotkeyListener, TriggerEvent, TriggerGate},
};

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_decorations(false)
        .with_transparent(true)
        .with_inner_size([300.0, 110.0])
        .with_min_inner_size([250.0, 60.0])
        .with_resizable(false);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Voice assistant starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 4. Speech and actions
    let model_path = config.model_path();
    let stt: Arc<dyn SttEngine> =
        match WhisperEngine::load(&model_path, TranscribeParams::from_config(&config.stt)) {
            Ok(engine) => {
                log::info!("Whisper model loaded: {}", model_path.display());
                Arc::new(engine)
            }
            Err(e) => {
                log::warn!(
                    "Could not load Whisper model ({}): {e}. Every command will fail recognition.",
                    model_path.display()
                );
                Arc::new(NoModelStt {
                    path: model_path.display().to_string(),
                })
            }
        };

    let speech = Arc::new(LocalSpeech::new(stt, &config, rt.handle().clone()));
    let provider = Arc::new(SystemProvider::from_config(&config));

    // 5. Session and shared state
    let gate = Arc::new(TriggerGate::new());
    let session = Arc::new(AssistantSession::new(Arc::clone(&gate)));
    log::info!("Session started at {}", session.current_time());

    let state = new_shared_state();
    let engine = Arc::new(DispatchEngine::new(
        session,
        speech,
        provider,
        Arc::clone(&state),
        DispatchConfig::from_config(&config),
    ));

    // 6. Trigger loop
    let (trigger_tx, trigger_rx) = mpsc::channel::<TriggerEvent>(8);
    rt.spawn(TriggerLoop::new(engine).run(trigger_rx));

    // 7. Hotkey listener thread
    let hotkey_key = parse_key(&config.hotkey.push_to_talk_key).unwrap_or_else(|| {
        log::warn!(
            "Unknown push-to-talk key {:?}; using F9",
            config.hotkey.push_to_talk_key
        );
        rdev::Key::F9
    });
    let _hotkey_listener = HotkeyListener::start(hotkey_key, Arc::clone(&gate), trigger_tx.clone());

    // 8. Window (blocks until closed)
    let app = AssistantApp::new(state, gate, trigger_tx, config.clone());
    eframe::run_native(
        "Voice Assistant",
        native_options(&config),
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow::anyhow!("window failed: {e}"))?;

    log::info!("Voice assistant shut down");
    Ok(())
}

// ---------------------------------------------------------------------------
// NoModelStt: fallback SttEngine when the model file is not present
// ---------------------------------------------------------------------------

struct NoModelStt {
    path: String,
}

impl SttEngine for NoModelStt {
    fn transcribe(&self, _audio: &[f32]) -> Result<String, SttError> {
        Err(SttError::ModelNotFound(self.path.clone()))
    }
}
