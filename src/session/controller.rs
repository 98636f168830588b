use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use crate::cursor::applier::{CursorColorApplier, CursorColorState};
use crate::cursor::color_policy::ColorPolicy;
use crate::detect::detector::{LanguageCode, LanguageSource};
use crate::error::Result;
use crate::session::notify::{Notifier, START_NOTICE, STOP_NOTICE};
use crate::session::status::{StatusBar, StatusItem, status_text};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    pub running: bool,
    pub language: Option<LanguageCode>,
}

/// A running poll loop. The tick task, its cancel token and the status item
/// are released together in `Controller::end_session`.
struct PollSession {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    item: Arc<dyn StatusItem>,
    language: watch::Receiver<Option<LanguageCode>>,
}

/// Everything one tick needs, moved into the session task.
struct Tick {
    source: Arc<dyn LanguageSource>,
    applier: Arc<CursorColorApplier>,
    policy: Arc<ColorPolicy>,
    item: Arc<dyn StatusItem>,
    language: watch::Sender<Option<LanguageCode>>,
}

impl Tick {
    async fn run(&self, cancel: &CancellationToken) -> Result<()> {
        let language = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            language = self.source.detect() => language,
        };

        self.language.send_replace(Some(language));
        self.item.set_text(&status_text(language.code()));
        self.applier.apply(self.policy.color_for(language)).await
    }
}

async fn poll_loop(tick: Tick, period: Duration, cancel: CancellationToken) {
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = timer.tick() => {}
        }

        if let Err(e) = tick.run(&cancel).await {
            tracing::warn!(error = %e, "failed to apply cursor colour");
        }
    }

    tracing::debug!("poll loop finished");
}

/// Owns the Stopped/Running lifecycle of the poll loop.
pub struct Controller {
    source: Arc<dyn LanguageSource>,
    applier: Arc<CursorColorApplier>,
    policy: Arc<ColorPolicy>,
    status_bar: Arc<dyn StatusBar>,
    notifier: Arc<dyn Notifier>,
    poll_interval: Duration,
    original: Option<CursorColorState>,
    session: Option<PollSession>,
}

impl Controller {
    pub fn new(
        source: Arc<dyn LanguageSource>,
        applier: Arc<CursorColorApplier>,
        policy: ColorPolicy,
        status_bar: Arc<dyn StatusBar>,
        notifier: Arc<dyn Notifier>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            applier,
            policy: Arc::new(policy),
            status_bar,
            notifier,
            poll_interval,
            original: None,
            session: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            running: self.is_running(),
            language: self.session.as_ref().and_then(|s| *s.language.borrow()),
        }
    }

    pub async fn start(&mut self) -> Result<StartOutcome> {
        if self.session.is_some() {
            tracing::warn!("poll session already running");
            return Ok(StartOutcome::AlreadyRunning);
        }

        if self.original.is_none() {
            self.original = Some(self.applier.capture().await?);
        }

        let item: Arc<dyn StatusItem> = Arc::from(self.status_bar.create_item());
        item.show();

        let (language_tx, language_rx) = watch::channel(None);
        let tick = Tick {
            source: Arc::clone(&self.source),
            applier: Arc::clone(&self.applier),
            policy: Arc::clone(&self.policy),
            item: Arc::clone(&item),
            language: language_tx,
        };

        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll_loop(tick, self.poll_interval, cancel.clone()));

        self.session = Some(PollSession {
            cancel,
            task,
            item,
            language: language_rx,
        });

        tracing::info!(interval_ms = self.poll_interval.as_millis() as u64, "poll session started");
        self.notifier.notify(START_NOTICE);
        Ok(StartOutcome::Started)
    }

    pub async fn stop(&mut self) -> Result<StopOutcome> {
        if !self.end_session().await {
            tracing::debug!("stop requested with no running session");
            return Ok(StopOutcome::NotRunning);
        }

        self.applier.restore(self.original.as_ref()).await?;
        tracing::info!("poll session stopped");
        self.notifier.notify(STOP_NOTICE);
        Ok(StopOutcome::Stopped)
    }

    /// Process teardown: end any session, then restore. A process that never
    /// started a session has not touched the settings and leaves them alone.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.end_session().await;
        if self.original.is_none() {
            return Ok(());
        }
        self.applier.restore(self.original.as_ref()).await
    }

    /// Cancels the tick loop and waits for it, so no tick writes after this
    /// returns. Returns false when there was no session.
    async fn end_session(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };

        session.cancel.cancel();
        if let Err(e) = session.task.await {
            tracing::warn!(error = %e, "poll task ended abnormally");
        }
        session.item.dispose();
        true
    }
}
