mod common;

use common::{CHANNEL, RecordingConsole, ScriptedTransport, channel_config, text_source_config};
use mockall::mock;
use rask_log_shipper::app::{InstallConfig, InstallError, Installer};
use rask_log_shipper::buffer::SourceSet;
use rask_log_shipper::channel::{Channel, ChannelConfig};
use rask_log_shipper::collector::{Collector, CollectorSet};
use rask_log_shipper::console::ConsoleSink;
use rask_log_shipper::domain::{ErrorEvent, Level, Payload};
use rask_log_shipper::sender::DeliveryOutcome;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::prelude::*;

mock! {
    pub Console {}

    impl ConsoleSink for Console {
        fn write(&self, level: Level, text: &str);
        fn error(&self, text: &str);
    }
}

fn collectors(transport: Arc<ScriptedTransport>) -> (CollectorSet, SourceSet) {
    let config = ChannelConfig {
        // Long enough that only explicit ticks deliver.
        interval: Duration::from_secs(60),
        ..channel_config()
    };
    let channel = Arc::new(Channel::new(CHANNEL, transport, config).unwrap());
    let sources = SourceSet::for_levels(&Level::ALL, &text_source_config());
    let collectors = CollectorSet::new(vec![Arc::new(Collector::new(channel, sources.clone()))]);
    (collectors, sources)
}

fn install_config(console: Arc<dyn ConsoleSink>) -> InstallConfig {
    InstallConfig {
        console,
        ..InstallConfig::default()
    }
}

#[tokio::test]
async fn test_install_is_one_time() {
    let transport = Arc::new(ScriptedTransport::new());
    let installer = Installer::new(install_config(Arc::new(RecordingConsole::default())));

    let (first, _) = collectors(transport.clone());
    let logger = installer.install(first).unwrap();
    assert!(logger.workers().iter().all(|worker| worker.is_running()));

    let (second, _) = collectors(transport);
    assert_eq!(
        installer.install(second).unwrap_err(),
        InstallError::AlreadyInstalled
    );

    logger.shutdown().await;
    assert!(logger.workers().iter().all(|worker| !worker.is_running()));
}

#[tokio::test]
async fn test_install_requires_collectors() {
    let installer = Installer::new(install_config(Arc::new(RecordingConsole::default())));
    assert_eq!(
        installer.install(CollectorSet::default()).unwrap_err(),
        InstallError::NoCollectors
    );
}

#[tokio::test]
async fn test_console_passthrough_respects_mute() {
    let mut console = MockConsole::new();
    console
        .expect_write()
        .withf(|level, text| *level == Level::Warn && text == "careful 1")
        .times(1)
        .return_const(());
    console.expect_error().never();

    let (collectors, sources) = collectors(Arc::new(ScriptedTransport::new()));
    let logger = Installer::new(install_config(Arc::new(console)))
        .install(collectors)
        .unwrap();

    logger.warn("careful", vec![json!(1)]).await;
    sources.filter_by_level(Level::Warn).mute();
    logger.warn("quiet", vec![]).await;

    // Muting only silences the echo; both messages are queued.
    let pending = sources.find_by_level(Level::Warn).unwrap().pending();
    let texts: Vec<&str> = pending.iter().map(|event| event.message.as_str()).collect();
    assert_eq!(texts, vec!["careful", "quiet"]);

    logger.workers().stop();
}

#[tokio::test]
async fn test_uncaught_and_notify_route_by_level() {
    let (collectors, sources) = collectors(Arc::new(ScriptedTransport::new()));
    let console = Arc::new(RecordingConsole::default());
    let logger = Installer::new(install_config(console.clone()))
        .install(collectors)
        .unwrap();

    logger
        .uncaught(ErrorEvent::new(Payload::error("TypeError", "x is undefined")).at("app.js", 3, 7))
        .await;
    logger.notify(Level::Info, "checkout started", vec![]).await;

    let error_events = sources.find_by_level(Level::Error).unwrap().pending();
    assert_eq!(error_events.len(), 1);
    assert_eq!(error_events[0].message, "TypeError: x is undefined");

    let info_events = sources.find_by_level(Level::Info).unwrap().pending();
    assert_eq!(info_events.len(), 1);
    assert_eq!(info_events[0].message, "checkout started");

    // Neither path echoes to the console.
    assert!(console.lines().is_empty());
    logger.workers().stop();
}

#[tokio::test]
async fn test_shutdown_delivers_queued_events_once() {
    let transport = Arc::new(ScriptedTransport::new());
    let (collectors, _) = collectors(transport.clone());
    let logger = Installer::new(install_config(Arc::new(RecordingConsole::default())))
        .install(collectors)
        .unwrap();

    logger.error("boom", vec![]).await;
    logger.log("context", vec![]).await;

    let outcomes = logger.shutdown().await;
    assert_eq!(outcomes, vec![DeliveryOutcome::Delivered { events: 2 }]);

    let puts = transport.puts();
    assert_eq!(puts.len(), 1);
    let texts: Vec<&str> = puts[0]
        .log_events
        .iter()
        .map(|event| event.message.as_str())
        .collect();
    // Declared order: debug, info, log, warn, error.
    assert_eq!(texts, vec!["context", "boom"]);

    assert!(logger.shutdown().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_final_delivery_is_reported_and_completes() {
    let transport = Arc::new(ScriptedTransport::with_put_delay(Duration::from_secs(10)));
    let (collectors, sources) = collectors(transport.clone());
    let console = Arc::new(RecordingConsole::default());
    let config = InstallConfig {
        shutdown_timeout: Duration::from_secs(1),
        ..install_config(console.clone())
    };
    let logger = Installer::new(config).install(collectors).unwrap();

    logger.error("boom", vec![]).await;
    assert!(logger.shutdown().await.is_empty());

    // Passthrough echo, then the report for the unfinished channel.
    let errors = console.errors();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0], "boom");
    assert!(errors[1].contains(CHANNEL));
    assert!(errors[1].contains("still in flight"));

    // The put was not abandoned with the shutdown deadline.
    tokio::time::sleep(Duration::from_secs(30)).await;
    let puts = transport.puts();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].log_events[0].message, "boom");
    let stats = logger.workers().items()[0].stats().snapshot();
    assert_eq!(stats.batches_delivered, 1);
    assert_eq!(stats.resets, 0);
    assert!(sources.flush().is_empty());
}

#[tokio::test]
async fn test_capture_layer_ships_foreign_tracing_events() {
    let transport = Arc::new(ScriptedTransport::new());
    let (collectors, _) = collectors(transport.clone());
    let logger = Installer::new(install_config(Arc::new(RecordingConsole::default())))
        .install(collectors)
        .unwrap();

    let subscriber = tracing_subscriber::registry().with(logger.capture_layer());
    tracing::subscriber::with_default(subscriber, || {
        tracing::error!(target: "checkout", order = 42, "payment failed");
        tracing::info!(target: "rask_log_shipper::worker", "internal, not shipped");
    });

    logger.shutdown().await;

    let puts = transport.puts();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].log_events.len(), 1);
    assert_eq!(puts[0].log_events[0].message, "payment failed");
}

#[tokio::test]
async fn test_panics_are_shipped_as_uncaught_errors() {
    let transport = Arc::new(ScriptedTransport::new());
    let (collectors, _) = collectors(transport.clone());
    let config = InstallConfig {
        capture_panics: true,
        ..install_config(Arc::new(RecordingConsole::default()))
    };
    let logger = Installer::new(config).install(collectors).unwrap();

    let result = std::panic::catch_unwind(|| panic!("kaboom"));
    assert!(result.is_err());

    logger.shutdown().await;

    let puts = transport.puts();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].log_events[0].message, "panic: kaboom");
}
