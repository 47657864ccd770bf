/// Signal handling for clean shutdown.
///
/// First SIGINT (Ctrl-C) or SIGTERM: flip a shared watch channel; the
/// countdown observes it and the loop exits without starting another touch.
/// Second signal: exit immediately, even if a touch is stuck on a dead mount.
use tokio::sync::watch;

/// Exit status used when a repeated signal forces the process down.
pub const FORCED_EXIT_CODE: i32 = 130;

/// What to do with an incoming shutdown signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// Finish the current step, then stop.
    RequestShutdown,
    /// Stop now.
    ForceExit,
}

/// Counts shutdown signals; every signal after the first escalates.
#[derive(Debug, Default)]
pub struct SignalEscalation {
    received: u32,
}

impl SignalEscalation {
    pub fn on_signal(&mut self) -> SignalAction {
        self.received = self.received.saturating_add(1);
        if self.received == 1 {
            SignalAction::RequestShutdown
        } else {
            SignalAction::ForceExit
        }
    }
}

fn handle_signal(escalation: &mut SignalEscalation, trigger: &ShutdownTrigger, name: &str) {
    match escalation.on_signal() {
        SignalAction::RequestShutdown => {
            tracing::info!(signal = name, "shutdown requested; signal again to exit now");
            trigger.trigger();
        }
        SignalAction::ForceExit => {
            tracing::warn!(signal = name, "repeated signal, exiting immediately");
            std::process::exit(FORCED_EXIT_CODE);
        }
    }
}

/// Sending half: requests shutdown.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Receiving half: observed by the countdown.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Create a linked trigger/receiver pair.
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // send_replace never fails, even with no receivers left.
        self.tx.send_replace(true);
    }
}

impl Shutdown {
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been requested. Never resolves if the
    /// trigger is dropped without firing.
    pub async fn requested(&mut self) {
        if self.rx.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Spawn a task that listens for SIGINT and SIGTERM for the life of the
/// process: the first fires `trigger`, the next one exits.
#[cfg(unix)]
pub fn install(trigger: ShutdownTrigger) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::spawn(async move {
        let mut escalation = SignalEscalation::default();
        loop {
            let name = tokio::select! {
                Some(()) = sigint.recv() => "SIGINT",
                Some(()) = sigterm.recv() => "SIGTERM",
                else => break,
            };
            handle_signal(&mut escalation, &trigger, name);
        }
    });
    Ok(())
}

/// Spawn a task that listens for Ctrl-C: the first fires `trigger`, the
/// next one exits.
#[cfg(not(unix))]
pub fn install(trigger: ShutdownTrigger) -> std::io::Result<()> {
    tokio::spawn(async move {
        let mut escalation = SignalEscalation::default();
        while tokio::signal::ctrl_c().await.is_ok() {
            handle_signal(&mut escalation, &trigger, "ctrl-c");
        }
    });
    Ok(())
}
