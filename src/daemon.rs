use std::sync::Arc;

use crate::config::AppConfig;
use crate::cursor::applier::CursorColorApplier;
use crate::cursor::store::SettingsFile;
use crate::detect::detector::ShellDetector;
use crate::error::Result;
use crate::platform::command::PlatformKind;
use crate::session::controller::{Controller, StartOutcome, StopOutcome};
use crate::session::notify::{DesktopNotifier, Notifier, SilentNotifier};
use crate::session::status::ConsoleStatusBar;
use crate::ws::control_server::{
    ControlCommand, ControlReceiver, ControlResponse, bind_control_server, create_control_channel, serve,
};

pub fn build_controller(config: &AppConfig) -> Result<Controller> {
    let platform = PlatformKind::current();
    let store = Arc::new(SettingsFile::new(config.settings_path()?));
    tracing::info!(platform = platform.as_str(), settings = %store.path().display(), "building controller");

    let notifier: Arc<dyn Notifier> = if config.notifications {
        Arc::new(DesktopNotifier)
    } else {
        Arc::new(SilentNotifier)
    };

    Ok(Controller::new(
        Arc::new(ShellDetector::new(platform, config.command_timeout())),
        Arc::new(CursorColorApplier::new(store)),
        config.color_policy(),
        Arc::new(ConsoleStatusBar),
        notifier,
        config.poll_interval(),
    ))
}

/// Runs one control command against the controller and describes the result.
pub async fn handle_command(controller: &mut Controller, command: ControlCommand) -> ControlResponse {
    let outcome = match command {
        ControlCommand::Start => controller.start().await.map(|outcome| match outcome {
            StartOutcome::Started => "started",
            StartOutcome::AlreadyRunning => "already running",
        }),
        ControlCommand::Stop => controller.stop().await.map(|outcome| match outcome {
            StopOutcome::Stopped => "stopped",
            StopOutcome::NotRunning => "not running",
        }),
        ControlCommand::Status => Ok(if controller.is_running() {
            "running"
        } else {
            "stopped"
        }),
    };

    let status = controller.status();
    match outcome {
        Ok(message) => ControlResponse {
            success: true,
            message: Some(message.to_string()),
            running: status.running,
            language: status.language.map(|l| l.code().to_string()),
        },
        Err(e) => {
            tracing::warn!(command = ?command, error = %e, "control command failed");
            ControlResponse {
                running: status.running,
                ..ControlResponse::failure(e.to_string())
            }
        }
    }
}

/// Resolves on Ctrl+C, or SIGTERM on Unix (plain `kill`, systemd, launchd).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("interrupt received, shutting down"),
        _ = terminate => tracing::info!("terminate received, shutting down"),
    }
}

/// Owns the controller until the channel closes or `shutdown` resolves,
/// then tears the session down.
pub async fn run_controller(
    mut controller: Controller,
    mut control_rx: ControlReceiver,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    // created once so a signal arriving mid-command is not lost
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            message = control_rx.recv() => {
                let Some(message) = message else {
                    break;
                };
                let response = handle_command(&mut controller, message.command).await;
                let _ = message.reply.send(response);
            }
            _ = &mut shutdown => break,
        }
    }

    controller.shutdown().await
}

/// Daemon mode: control server plus the controller task.
pub async fn run_daemon(config: AppConfig, start_now: bool) -> Result<()> {
    let addr = config.listen_addr()?;
    let listener = bind_control_server(addr).await?;
    let mut controller = build_controller(&config)?;

    println!("Lang Cursor - Daemon Mode");
    println!("=========================");
    println!("Polling every {} ms once started", config.poll_interval_ms);
    println!("Control channel on ws://{}\n", addr);

    if start_now {
        controller.start().await?;
    }

    let (control_tx, control_rx) = create_control_channel();
    tokio::spawn(async move {
        if let Err(e) = serve(listener, control_tx).await {
            tracing::error!(error = %e, "control server error");
        }
    });

    run_controller(controller, control_rx, shutdown_signal()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::color_policy::ColorPolicy;
    use crate::detect::detector::LanguageCode;
    use crate::session::status::StatusItem;
    use crate::test_utils::{
        MemoryStore, RecordingNotifier, RecordingStatusBar, ScriptedSource, wait_until,
    };
    use crate::ws::client::send_command;
    use crate::ws::control_server::ControlMessage;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn controller(store: Arc<MemoryStore>, bar: Arc<RecordingStatusBar>) -> Controller {
        Controller::new(
            Arc::new(ScriptedSource::new(LanguageCode::Korean)),
            Arc::new(CursorColorApplier::new(store)),
            ColorPolicy::default(),
            bar,
            Arc::new(RecordingNotifier::default()),
            Duration::from_millis(10),
        )
    }

    #[tokio::test]
    async fn test_handle_command_messages() {
        let store = Arc::new(MemoryStore::default());
        let bar = Arc::new(RecordingStatusBar::default());
        let mut controller = controller(store, bar);

        let stop = handle_command(&mut controller, ControlCommand::Stop).await;
        assert!(stop.success);
        assert_eq!(stop.message.as_deref(), Some("not running"));

        let start = handle_command(&mut controller, ControlCommand::Start).await;
        assert_eq!(start.message.as_deref(), Some("started"));
        assert!(start.running);

        let again = handle_command(&mut controller, ControlCommand::Start).await;
        assert_eq!(again.message.as_deref(), Some("already running"));

        let stop = handle_command(&mut controller, ControlCommand::Stop).await;
        assert_eq!(stop.message.as_deref(), Some("stopped"));
        assert!(!stop.running);
    }

    #[tokio::test]
    async fn test_commands_over_websocket() {
        let store = Arc::new(MemoryStore::with_color("#777777"));
        let bar = Arc::new(RecordingStatusBar::default());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (control_tx, control_rx) = create_control_channel();
        tokio::spawn(serve(listener, control_tx));
        let owner = tokio::spawn(run_controller(
            controller(store.clone(), bar.clone()),
            control_rx,
            std::future::pending::<()>(),
        ));

        let start = send_command(addr, ControlCommand::Start).await.unwrap();
        assert!(start.success);
        assert!(start.running);

        let item = bar.item(0);
        wait_until(|| item.text() == "Keyboard Lang: ko").await;
        let status = send_command(addr, ControlCommand::Status).await.unwrap();
        assert_eq!(status.language.as_deref(), Some("ko"));
        assert_eq!(store.current().as_deref(), Some("#00ff00"));

        let stop = send_command(addr, ControlCommand::Stop).await.unwrap();
        assert_eq!(stop.message.as_deref(), Some("stopped"));
        assert_eq!(store.current().as_deref(), Some("#777777"));

        owner.abort();
    }

    #[tokio::test]
    async fn test_shutdown_future_restores_running_session() {
        let store = Arc::new(MemoryStore::with_color("#888888"));
        let bar = Arc::new(RecordingStatusBar::default());
        let (control_tx, control_rx) = create_control_channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let owner = tokio::spawn(run_controller(
            controller(store.clone(), bar.clone()),
            control_rx,
            async move {
                let _ = stop_rx.await;
            },
        ));

        let (reply_tx, reply_rx) = oneshot::channel();
        control_tx
            .send(ControlMessage {
                command: ControlCommand::Start,
                reply: reply_tx,
            })
            .await
            .unwrap();
        assert!(reply_rx.await.unwrap().running);

        let item = bar.item(0);
        wait_until(|| item.text() == "Keyboard Lang: ko").await;
        assert_eq!(store.current().as_deref(), Some("#00ff00"));

        // control channel stays open; only the shutdown future ends the loop
        stop_tx.send(()).unwrap();
        owner.await.unwrap().unwrap();

        assert_eq!(store.current().as_deref(), Some("#888888"));
        assert!(item.is_disposed());
        drop(control_tx);
    }

    #[tokio::test]
    async fn test_daemon_fails_when_port_taken() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dir = tempdir().unwrap();
        let settings = dir.path().join("settings.json");
        let config = AppConfig {
            settings_path: Some(settings.clone()),
            listen_addr: taken.local_addr().unwrap().to_string(),
            notifications: false,
            ..AppConfig::default()
        };

        assert!(run_daemon(config, true).await.is_err());
        assert!(!settings.exists());
    }
}
