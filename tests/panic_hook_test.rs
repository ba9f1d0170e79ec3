//! Own test binary: the panic hook is process-wide.

mod common;

use common::{CHANNEL, RecordingConsole, ScriptedTransport, channel_config, text_source_config};
use rask_log_shipper::app::{InstallConfig, InstallError, Installer};
use rask_log_shipper::buffer::SourceSet;
use rask_log_shipper::channel::Channel;
use rask_log_shipper::collector::{Collector, CollectorSet};
use rask_log_shipper::domain::Level;
use std::sync::Arc;

fn collectors() -> CollectorSet {
    let transport = Arc::new(ScriptedTransport::new());
    let channel = Arc::new(Channel::new(CHANNEL, transport, channel_config()).unwrap());
    let sources = SourceSet::for_levels(&[Level::Error], &text_source_config());
    CollectorSet::new(vec![Arc::new(Collector::new(channel, sources))])
}

fn panic_capturing_config() -> InstallConfig {
    InstallConfig {
        capture_panics: true,
        console: Arc::new(RecordingConsole::default()),
        ..InstallConfig::default()
    }
}

#[tokio::test]
async fn test_failed_panic_hook_install_leaves_installer_usable() {
    let first = Installer::new(panic_capturing_config())
        .install(collectors())
        .unwrap();

    let second = Installer::new(panic_capturing_config());
    assert_eq!(
        second.install(collectors()).unwrap_err(),
        InstallError::PanicHookAlreadyInstalled
    );
    // Still reports the real cause rather than a stale install.
    assert_eq!(
        second.install(collectors()).unwrap_err(),
        InstallError::PanicHookAlreadyInstalled
    );

    let without_hook = Installer::new(InstallConfig {
        capture_panics: false,
        ..panic_capturing_config()
    });
    let logger = without_hook.install(collectors()).unwrap();
    assert_eq!(
        without_hook.install(collectors()).unwrap_err(),
        InstallError::AlreadyInstalled
    );

    logger.shutdown().await;
    first.shutdown().await;
}
