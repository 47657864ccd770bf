/// Countdown between touches: one tick per second, rendered as a transient
/// progress bar, raced against the shutdown signal.
use crate::signals::Shutdown;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const TICK: Duration = Duration::from_secs(1);

/// Redraw interval, so the spinner keeps turning between ticks.
const REDRAW: Duration = Duration::from_millis(100);

const BAR_TEMPLATE: &str = "{prefix:.red} {spinner} {bar:40} {eta} times touched {msg}";

/// How a countdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    /// All ticks elapsed.
    Completed,
    /// Shutdown was requested after `elapsed_secs` ticks.
    Cancelled { elapsed_secs: u64 },
}

/// Renders countdown progress.
pub trait CountdownDisplay {
    /// A new countdown of `total_secs` ticks is starting.
    fn begin(&mut self, total_secs: u64, touches: u64);

    /// One second has elapsed.
    fn tick(&mut self);

    /// The countdown is over (completed or cancelled). Clears the display.
    fn finish(&mut self);
}

/// Terminal progress bar, cleared from the screen when each countdown ends.
pub struct ProgressBarDisplay {
    target: fn() -> ProgressDrawTarget,
    bar: Option<ProgressBar>,
}

impl ProgressBarDisplay {
    /// Draw on stderr (hidden automatically when stderr is not a terminal).
    pub fn stderr() -> Self {
        Self {
            target: ProgressDrawTarget::stderr,
            bar: None,
        }
    }

    #[cfg(test)]
    fn hidden() -> Self {
        Self {
            target: ProgressDrawTarget::hidden,
            bar: None,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸ ")
    }
}

impl CountdownDisplay for ProgressBarDisplay {
    fn begin(&mut self, total_secs: u64, touches: u64) {
        let bar = ProgressBar::with_draw_target(Some(total_secs), (self.target)());
        bar.set_style(Self::style());
        bar.set_prefix("Time until touch...");
        bar.set_message(touches.to_string());
        bar.enable_steady_tick(REDRAW);
        self.bar = Some(bar);
    }

    fn tick(&mut self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Count down `total_secs` one-second ticks.
///
/// Returns after the last tick, or as soon as `shutdown` fires.
pub async fn run_countdown(
    total_secs: u64,
    touches: u64,
    display: &mut dyn CountdownDisplay,
    shutdown: &mut Shutdown,
) -> CountdownOutcome {
    display.begin(total_secs, touches);

    let mut elapsed_secs = 0;
    while elapsed_secs < total_secs {
        tokio::select! {
            _ = tokio::time::sleep(TICK) => {
                elapsed_secs += 1;
                display.tick();
            }
            _ = shutdown.requested() => {
                display.finish();
                tracing::debug!(elapsed_secs, total_secs, "countdown cancelled");
                return CountdownOutcome::Cancelled { elapsed_secs };
            }
        }
    }

    display.finish();
    CountdownOutcome::Completed
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::signals;

    /// Records every display call, one entry per countdown.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingDisplay {
        /// (total_secs, touches) passed to each `begin`.
        pub begins: Vec<(u64, u64)>,
        /// Ticks seen in each countdown.
        pub ticks: Vec<u64>,
        pub finishes: usize,
    }

    impl CountdownDisplay for RecordingDisplay {
        fn begin(&mut self, total_secs: u64, touches: u64) {
            self.begins.push((total_secs, touches));
            self.ticks.push(0);
        }

        fn tick(&mut self) {
            if let Some(last) = self.ticks.last_mut() {
                *last += 1;
            }
        }

        fn finish(&mut self) {
            self.finishes += 1;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn completes_after_total_ticks() {
        let (_trigger, mut shutdown) = signals::channel();
        let mut display = RecordingDisplay::default();
        let start = tokio::time::Instant::now();

        let outcome = run_countdown(60, 4, &mut display, &mut shutdown).await;

        assert_eq!(outcome, CountdownOutcome::Completed);
        assert_eq!(start.elapsed(), Duration::from_secs(60));
        assert_eq!(display.begins, vec![(60, 4)]);
        assert_eq!(display.ticks, vec![60]);
        assert_eq!(display.finishes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_early() {
        let (trigger, mut shutdown) = signals::channel();
        let mut display = RecordingDisplay::default();

        let stopper = async {
            tokio::time::sleep(Duration::from_millis(10_500)).await;
            trigger.trigger();
        };
        let (outcome, ()) =
            tokio::join!(run_countdown(60, 0, &mut display, &mut shutdown), stopper);

        assert_eq!(outcome, CountdownOutcome::Cancelled { elapsed_secs: 10 });
        assert_eq!(display.ticks, vec![10]);
        assert_eq!(display.finishes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn already_cancelled_returns_immediately() {
        let (trigger, mut shutdown) = signals::channel();
        trigger.trigger();
        let mut display = RecordingDisplay::default();

        let outcome = run_countdown(120, 0, &mut display, &mut shutdown).await;
        assert_eq!(outcome, CountdownOutcome::Cancelled { elapsed_secs: 0 });
        assert_eq!(display.ticks, vec![0]);
    }

    #[test]
    fn progress_bar_tracks_ticks_and_clears() {
        let mut display = ProgressBarDisplay::hidden();
        display.begin(120, 7);

        let bar = display.bar.clone().unwrap();
        assert_eq!(bar.length(), Some(120));
        assert_eq!(bar.message(), "7");
        assert_eq!(bar.prefix(), "Time until touch...");

        for _ in 0..120 {
            display.tick();
        }
        assert_eq!(bar.position(), 120);

        display.finish();
        assert!(display.bar.is_none());
        assert!(bar.is_finished());
    }

    #[test]
    fn steady_redraw_does_not_advance_the_countdown() {
        assert!(REDRAW <= Duration::from_millis(100));

        let mut display = ProgressBarDisplay::hidden();
        display.begin(60, 0);
        let bar = display.bar.clone().unwrap();

        std::thread::sleep(REDRAW * 3);
        assert_eq!(bar.position(), 0);

        display.tick();
        assert_eq!(bar.position(), 1);
        display.finish();
        assert!(bar.is_finished());
    }

    #[test]
    fn tick_without_begin_is_ignored() {
        let mut display = ProgressBarDisplay::hidden();
        display.tick();
        display.finish();
        assert!(display.bar.is_none());
    }

    #[test]
    fn bar_template_parses() {
        assert!(ProgressStyle::with_template(BAR_TEMPLATE).is_ok());
    }
}
