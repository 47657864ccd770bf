/// The keep-alive loop: count down, touch, repeat until shutdown or a
/// failed touch.
use crate::config::Settings;
use crate::countdown::{run_countdown, CountdownDisplay, CountdownOutcome};
use crate::signals::Shutdown;
use crate::touch::{touch_detached, TouchError, Toucher};

/// Loop states. There is no terminal state; the loop only ends through
/// shutdown or an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    CountingDown,
    Touching,
}

/// Summary returned after a clean shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub touches: u64,
}

/// Run until shutdown is requested. A touch failure is returned as-is;
/// nothing is retried.
pub async fn run(
    settings: &Settings,
    display: &mut dyn CountdownDisplay,
    shutdown: &mut Shutdown,
) -> Result<RunSummary, TouchError> {
    let mut toucher = Toucher::new(&settings.target);
    let total_secs = settings.frequency.countdown_secs();

    tracing::info!(
        path = %toucher.path().display(),
        minutes = settings.frequency.minutes(),
        interval = ?settings.frequency.as_duration(),
        "keeping path alive"
    );

    let mut state = LoopState::CountingDown;
    loop {
        state = match state {
            LoopState::CountingDown => {
                tracing::debug!(total_secs, touches = toucher.touches(), "countdown started");
                match run_countdown(total_secs, toucher.touches(), display, shutdown).await {
                    CountdownOutcome::Completed => LoopState::Touching,
                    CountdownOutcome::Cancelled { elapsed_secs } => {
                        tracing::info!(
                            elapsed_secs,
                            remaining_secs = total_secs - elapsed_secs,
                            "countdown interrupted"
                        );
                        break;
                    }
                }
            }
            LoopState::Touching => {
                if shutdown.is_requested() {
                    break;
                }
                let (returned, result) = touch_detached(toucher).await;
                toucher = returned;
                result?;
                LoopState::CountingDown
            }
        };
    }

    tracing::info!(touches = toucher.touches(), "stopped");
    Ok(RunSummary {
        touches: toucher.touches(),
    })
}
