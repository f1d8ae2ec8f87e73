//! voxd — push-to-talk voice dictation.
//!
//! Wires the subsystems together: configuration, capture pipeline,
//! transcription backend, rewriter, injector, history sink, and the global
//! key listener feeding the session controller.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use voxd::audio::AudioPipeline;
use voxd::config::{AppConfig, AppPaths};
use voxd::inject::TextInjector;
use voxd::rewrite::TextRewriter;
use voxd::session::{FileHistorySink, HistorySink, LogPresenter, SessionController};
use voxd::stt::create_provider;
use voxd::trigger::{parse_key, TriggerListener};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load().context("failed to load configuration")?;
    if !config.stt.is_configured() {
        log::warn!(
            "no transcription API key configured; edit {} before dictating",
            AppPaths::new().settings_file.display()
        );
    }

    let push_to_talk = parse_key(&config.trigger.push_to_talk_key).with_context(|| {
        format!(
            "unknown push-to-talk key {:?}",
            config.trigger.push_to_talk_key
        )
    })?;
    let toggle = parse_key(&config.trigger.toggle_key)
        .with_context(|| format!("unknown toggle key {:?}", config.trigger.toggle_key))?;

    let history: Option<Arc<dyn HistorySink>> = if config.history.enabled {
        let path = config
            .history
            .path
            .clone()
            .unwrap_or_else(|| AppPaths::new().history_file);
        Some(Arc::new(FileHistorySink::new(path)))
    } else {
        None
    };

    let controller = Arc::new(SessionController::new(
        Arc::new(AudioPipeline::new()),
        create_provider(&config.stt),
        Arc::new(TextRewriter::from_config(&config.rewrite)),
        Arc::new(TextInjector::new(&config.inject)),
        Arc::new(LogPresenter),
        history,
        config.stt.streaming,
        config.stt.custom_words.clone(),
    ));

    let (trigger_tx, trigger_rx) = mpsc::channel(16);
    let _listener = TriggerListener::start(push_to_talk, toggle, trigger_tx);

    log::info!(
        "voxd ready — hold {} to dictate, press {} to toggle",
        config.trigger.push_to_talk_key,
        config.trigger.toggle_key
    );

    controller.run(trigger_rx).await;
    Ok(())
}
