//! Runtime shell around [`CheckoutMachine`].
//!
//! A [`CheckoutSession`] owns one machine and drives its countdowns. Every
//! running countdown has exactly one ticker task, spawned on the tokio
//! runtime the session was created on. Starting, pausing, stopping or
//! resetting a countdown cancels its ticker; each ticker carries a
//! generation number so a tick that was already in flight when its task
//! was cancelled is discarded instead of decrementing the new baseline.
//!
//! Views observe the session through [`CheckoutHandle::subscribe`] (latest
//! [`CheckoutView`]) and [`CheckoutHandle::notifications`] (notifications
//! the gate let through).

pub mod context;
pub mod payment;

use crate::checkout::{
    CheckoutMachine, CheckoutStatus, CheckoutView, Notification, NotificationKind, Tick, TimerKind,
};
use crate::config::CheckoutConfig;
use crate::core::{StateHistory, Trigger};
use crate::snapshot::{SessionSnapshot, SnapshotError};
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle as Runtime;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info};

const NOTIFICATION_CAPACITY: usize = 32;

/// Errors that can occur when opening a session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Checkout sessions must be created inside a tokio runtime")]
    NoRuntime,

    #[error("Session restore failed: {0}")]
    Restore(#[from] SnapshotError),
}

struct Ticker {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Tickers {
    general: Option<Ticker>,
    pix: Option<Ticker>,
    generation: u64,
}

impl Tickers {
    fn slot(&mut self, kind: TimerKind) -> &mut Option<Ticker> {
        match kind {
            TimerKind::General => &mut self.general,
            TimerKind::Pix => &mut self.pix,
        }
    }

    fn is_current(&self, kind: TimerKind, generation: u64) -> bool {
        let slot = match kind {
            TimerKind::General => &self.general,
            TimerKind::Pix => &self.pix,
        };
        slot.as_ref().is_some_and(|t| t.generation == generation)
    }

    fn cancel(&mut self, kind: TimerKind) {
        if let Some(ticker) = self.slot(kind).take() {
            ticker.handle.abort();
            debug!(timer = %kind, generation = ticker.generation, "ticker cancelled");
        }
    }

    fn cancel_all(&mut self) {
        self.cancel(TimerKind::General);
        self.cancel(TimerKind::Pix);
    }
}

struct Inner {
    machine: CheckoutMachine,
    tickers: Tickers,
    disposed: bool,
}

struct Shared {
    inner: Mutex<Inner>,
    runtime: Runtime,
    tick_interval: Duration,
    view: watch::Sender<CheckoutView>,
    notifications: broadcast::Sender<Notification>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the set of live tickers match the machine's running countdowns.
    /// `restart` forces a fresh ticker for that countdown.
    fn reconcile(self: &Arc<Self>, inner: &mut Inner, restart: Option<TimerKind>) {
        let Inner {
            machine, tickers, ..
        } = inner;
        for kind in [TimerKind::General, TimerKind::Pix] {
            let running = machine.countdown(kind).is_running();
            let live = tickers.slot(kind).is_some();
            if restart == Some(kind) || (live && !running) {
                tickers.cancel(kind);
            }
            if running && tickers.slot(kind).is_none() {
                self.spawn_ticker(tickers, kind);
            }
        }
    }

    fn spawn_ticker(self: &Arc<Self>, tickers: &mut Tickers, kind: TimerKind) {
        tickers.generation += 1;
        let generation = tickers.generation;
        let period = self.tick_interval;
        let first = Instant::now() + period;
        let shared = Arc::downgrade(self);
        let handle = self
            .runtime
            .spawn(run_ticker(shared, kind, generation, first, period));
        *tickers.slot(kind) = Some(Ticker { generation, handle });
        debug!(timer = %kind, generation, "ticker scheduled");
    }

    /// Apply one tick. Returns whether the ticker should keep going.
    fn on_tick(self: &Arc<Self>, kind: TimerKind, generation: u64) -> bool {
        let mut inner = self.lock();
        if inner.disposed || !inner.tickers.is_current(kind, generation) {
            return false;
        }
        let tick = inner.machine.tick(kind);
        if let Tick::Expired { session_expired } = tick {
            debug!(timer = %kind, session_expired, "countdown reached zero");
        }
        self.reconcile(&mut inner, None);
        self.publish(&inner);
        tick.keeps_running()
    }

    fn publish(&self, inner: &Inner) {
        self.view.send_replace(inner.machine.view());
    }
}

async fn run_ticker(
    shared: Weak<Shared>,
    kind: TimerKind,
    generation: u64,
    first: Instant,
    period: Duration,
) {
    let mut ticks = time::interval_at(first, period);
    loop {
        ticks.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        if !shared.on_tick(kind, generation) {
            break;
        }
    }
}

/// Cloneable access to one checkout session.
///
/// Every command is applied under the session lock and followed by a view
/// update, so all handles observe the same state.
#[derive(Clone)]
pub struct CheckoutHandle {
    shared: Arc<Shared>,
}

impl CheckoutHandle {
    fn read<R>(&self, f: impl FnOnce(&CheckoutMachine) -> R) -> R {
        f(&self.shared.lock().machine)
    }

    fn command<R>(&self, rejected: R, f: impl FnOnce(&mut CheckoutMachine) -> R) -> R {
        self.apply(rejected, f, |_| None)
    }

    /// Run a timer start, replacing the ticker only if the start was accepted.
    fn start(&self, kind: TimerKind, f: impl FnOnce(&mut CheckoutMachine) -> bool) -> bool {
        self.apply(false, f, |started| started.then_some(kind))
    }

    fn apply<R>(
        &self,
        rejected: R,
        f: impl FnOnce(&mut CheckoutMachine) -> R,
        restart: impl FnOnce(&R) -> Option<TimerKind>,
    ) -> R {
        let mut inner = self.shared.lock();
        if inner.disposed {
            debug!("command on disposed checkout session ignored");
            return rejected;
        }
        let result = f(&mut inner.machine);
        self.shared.reconcile(&mut inner, restart(&result));
        self.shared.publish(&inner);
        result
    }

    pub fn status(&self) -> CheckoutStatus {
        self.read(|m| m.status())
    }

    pub fn message(&self) -> Option<String> {
        self.read(|m| m.message().map(str::to_string))
    }

    pub fn is_locked(&self) -> bool {
        self.read(|m| m.is_locked())
    }

    pub fn timer_seconds(&self) -> u32 {
        self.read(|m| m.timer_seconds())
    }

    pub fn timer_running(&self) -> bool {
        self.read(|m| m.timer_running())
    }

    pub fn timer_expired(&self) -> bool {
        self.read(|m| m.timer_expired())
    }

    pub fn pix_timer_seconds(&self) -> u32 {
        self.read(|m| m.pix_timer_seconds())
    }

    pub fn pix_timer_running(&self) -> bool {
        self.read(|m| m.pix_timer_running())
    }

    pub fn pix_timer_expired(&self) -> bool {
        self.read(|m| m.pix_timer_expired())
    }

    pub fn view(&self) -> CheckoutView {
        self.read(|m| m.view())
    }

    pub fn history(&self) -> StateHistory<CheckoutStatus> {
        self.read(|m| m.history().clone())
    }

    /// Whether a countdown expiry has moved this session to `expired`.
    pub fn expired_by_timer(&self) -> bool {
        self.read(|m| {
            m.status() == CheckoutStatus::Expired
                && m.history().last().is_some_and(|t| {
                    matches!(t.trigger, Trigger::TimerExpired | Trigger::PixTimerExpired)
                })
        })
    }

    pub fn can_show_notification(&self, kind: NotificationKind) -> bool {
        self.read(|m| m.can_show_notification(kind))
    }

    pub fn can_show_expiration(&self) -> bool {
        self.read(|m| m.can_show_expiration())
    }

    pub fn set_pending(&self) -> bool {
        self.command(false, |m| m.set_pending())
    }

    /// Enter `pending` and start the general timer with the configured length.
    pub fn begin(&self) -> bool {
        self.start(TimerKind::General, |m| m.begin())
    }

    /// Start the PIX countdown with the configured window length.
    pub fn begin_pix(&self) -> bool {
        self.start(TimerKind::Pix, |m| m.begin_pix())
    }

    /// Try to take the processing lock. `false` means another submission
    /// holds it (or the session is finished) and the caller must not proceed.
    pub fn set_processing(&self) -> bool {
        self.command(false, |m| m.set_processing())
    }

    pub fn set_approved(&self, message: Option<String>) -> bool {
        self.command(false, |m| m.set_approved(message))
    }

    pub fn set_failed(&self, message: Option<String>) -> bool {
        self.command(false, |m| m.set_failed(message))
    }

    pub fn set_expired(&self, message: Option<String>) -> bool {
        self.command(false, |m| m.set_expired(message))
    }

    pub fn reset(&self) {
        self.command((), |m| m.reset())
    }

    pub fn start_timer(&self, minutes: u32) -> bool {
        self.start(TimerKind::General, |m| m.start_timer(minutes))
    }

    pub fn pause_timer(&self) -> bool {
        self.command(false, |m| m.pause_timer())
    }

    pub fn resume_timer(&self) -> bool {
        self.command(false, |m| m.resume_timer())
    }

    pub fn start_pix_timer(&self, minutes: u32) -> bool {
        self.start(TimerKind::Pix, |m| m.start_pix_timer(minutes))
    }

    /// Show a notification if the gate allows it, broadcasting it to every
    /// notification subscriber.
    pub fn show_notification(
        &self,
        kind: NotificationKind,
        message: impl Into<String>,
    ) -> Option<Notification> {
        let shown = self.command(None, |m| m.show_notification(kind, message))?;
        // Sending only fails when nobody is listening.
        let _ = self.shared.notifications.send(shown.clone());
        Some(shown)
    }

    pub fn subscribe(&self) -> watch::Receiver<CheckoutView> {
        self.shared.view.subscribe()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.shared.notifications.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.read(SessionSnapshot::capture)
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.lock().disposed
    }
}

/// Owner of a checkout session.
///
/// Dropping the session (or calling [`dispose`](Self::dispose)) cancels both
/// countdown tickers; outstanding handles keep answering queries but ignore
/// commands.
pub struct CheckoutSession {
    handle: CheckoutHandle,
}

impl CheckoutSession {
    /// Open a fresh session on the current tokio runtime.
    pub fn new(config: CheckoutConfig) -> Result<Self, SessionError> {
        Self::with_machine(CheckoutMachine::new(config))
    }

    /// Reopen a session from a snapshot, rescheduling running countdowns.
    pub fn restore(snapshot: SessionSnapshot, config: CheckoutConfig) -> Result<Self, SessionError> {
        let machine = snapshot.restore(config)?;
        Self::with_machine(machine)
    }

    fn with_machine(machine: CheckoutMachine) -> Result<Self, SessionError> {
        let runtime = Runtime::try_current().map_err(|_| SessionError::NoRuntime)?;
        let tick_interval = machine.config().tick_interval();
        let (view, _) = watch::channel(machine.view());
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                machine,
                tickers: Tickers::default(),
                disposed: false,
            }),
            runtime,
            tick_interval,
            view,
            notifications,
        });
        {
            let mut inner = shared.lock();
            shared.reconcile(&mut inner, None);
        }
        debug!("checkout session opened");
        Ok(Self {
            handle: CheckoutHandle { shared },
        })
    }

    pub fn handle(&self) -> CheckoutHandle {
        self.handle.clone()
    }

    /// Cancel both tickers and stop accepting commands. Idempotent.
    pub fn dispose(&self) {
        let mut inner = self.handle.shared.lock();
        if inner.disposed {
            return;
        }
        inner.disposed = true;
        inner.tickers.cancel_all();
        info!(status = %inner.machine.status(), "checkout session disposed");
    }
}

impl Deref for CheckoutSession {
    type Target = CheckoutHandle;

    fn deref(&self) -> &CheckoutHandle {
        &self.handle
    }
}

impl Drop for CheckoutSession {
    fn drop(&mut self) {
        self.dispose();
    }
}
