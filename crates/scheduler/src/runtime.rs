use std::sync::Arc;
use std::time::Duration;

use autobuyer_core_types::CycleId;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SchedulerError;
use crate::metrics;
use crate::model::{CycleState, EngineConfig, StatusTone};
use crate::orchestrator::CycleRunner;
use crate::ports::{ActivateHandler, StatusSurface};

struct Lifecycle {
    state: CycleState,
    /// Cancels the loop spawned by the current enable.
    cancel: Option<CancellationToken>,
}

struct Inner {
    cycles: Arc<dyn CycleRunner>,
    status: Arc<dyn StatusSurface>,
    config: Arc<EngineConfig>,
    lifecycle: Mutex<Lifecycle>,
    /// Held for the whole of a running cycle.
    cycle_slot: Mutex<()>,
}

/// Enable/disable state machine driving cycles on a fixed interval.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// Fails when `config` does not validate; the countdown timer needs a
    /// non-zero tick.
    pub fn new(
        cycles: Arc<dyn CycleRunner>,
        status: Arc<dyn StatusSurface>,
        config: Arc<EngineConfig>,
    ) -> Result<Self, SchedulerError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                cycles,
                status,
                config,
                lifecycle: Mutex::new(Lifecycle {
                    state: CycleState::Disabled,
                    cancel: None,
                }),
                cycle_slot: Mutex::new(()),
            }),
        })
    }

    pub async fn state(&self) -> CycleState {
        self.inner.lifecycle.lock().await.state
    }

    /// Starts cycling. Returns `false` when already enabled.
    pub async fn enable(&self) -> bool {
        let mut life = self.inner.lifecycle.lock().await;
        if life.state.is_enabled() {
            debug!("enable ignored, already running");
            return false;
        }
        self.inner.start_locked(&mut life).await;
        true
    }

    /// Stops cycling. A cycle already in flight runs to completion.
    pub async fn disable(&self) -> bool {
        let mut life = self.inner.lifecycle.lock().await;
        if !life.state.is_enabled() {
            return false;
        }
        self.inner.stop_locked(&mut life).await;
        true
    }

    /// Flips the enabled state and returns the new one.
    pub async fn toggle(&self) -> bool {
        let mut life = self.inner.lifecycle.lock().await;
        if life.state.is_enabled() {
            self.inner.stop_locked(&mut life).await;
            false
        } else {
            self.inner.start_locked(&mut life).await;
            true
        }
    }

    /// Shows the control in its OFF state and routes activations to
    /// [`Scheduler::toggle`].
    pub async fn expose(&self) -> Result<(), SchedulerError> {
        {
            let life = self.inner.lifecycle.lock().await;
            self.inner.render(life.state, None).await;
        }
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let handler: ActivateHandler = Arc::new(move || {
            let _ = tx.send(());
        });
        self.inner.status.on_activate(handler).await?;

        let scheduler = self.clone();
        tokio::spawn(async move {
            while rx.recv().await.is_some() {
                let enabled = scheduler.toggle().await;
                info!(enabled, "auto-buyer toggled");
            }
        });
        Ok(())
    }
}

impl Inner {
    async fn start_locked(self: &Arc<Self>, life: &mut Lifecycle) {
        let token = CancellationToken::new();
        life.state = CycleState::Idle;
        life.cancel = Some(token.clone());
        self.render(CycleState::Idle, None).await;
        info!("auto-buyer enabled");

        let inner = Arc::clone(self);
        tokio::spawn(async move { inner.run_loop(token).await });
    }

    async fn stop_locked(&self, life: &mut Lifecycle) {
        if let Some(token) = life.cancel.take() {
            token.cancel();
        }
        life.state = CycleState::Disabled;
        self.render(CycleState::Disabled, None).await;
        info!("auto-buyer disabled");
    }

    async fn run_loop(self: Arc<Self>, token: CancellationToken) {
        loop {
            let slot = tokio::select! {
                _ = token.cancelled() => break,
                slot = self.cycle_slot.lock() => slot,
            };
            if !self.transition(&token, CycleState::Buying, None).await {
                break;
            }
            let cycle = CycleId::new();
            metrics::record_cycle_started();
            info!(%cycle, "cycle started");
            self.cycles.run_cycle(cycle.clone()).await;
            metrics::record_cycle_completed();
            info!(%cycle, "cycle finished");
            drop(slot);

            if !self.count_down(&token).await {
                break;
            }
        }
        debug!("cycle loop stopped");
    }

    /// Waits one cycle interval, refreshing the label every tick. Returns
    /// `false` once the loop has been cancelled.
    async fn count_down(&self, token: &CancellationToken) -> bool {
        let interval = self.config.cycle_interval();
        let tick = self.config.countdown_tick();
        let started = Instant::now();
        let deadline = started + interval;
        if !self
            .transition(token, CycleState::CountingDown, Some(interval))
            .await
        {
            return false;
        }

        let mut ticker = interval_at(started + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = token.cancelled() => return false,
                _ = sleep_until(deadline) => return true,
                _ = ticker.tick() => {}
            }
            let elapsed = started.elapsed();
            if elapsed >= interval {
                return true;
            }
            if !self
                .transition(token, CycleState::CountingDown, Some(interval - elapsed))
                .await
            {
                return false;
            }
        }
    }

    /// Applies `state` unless the loop owning `token` was disabled meanwhile.
    async fn transition(
        &self,
        token: &CancellationToken,
        state: CycleState,
        remaining: Option<Duration>,
    ) -> bool {
        let mut life = self.lifecycle.lock().await;
        if token.is_cancelled() {
            return false;
        }
        life.state = state;
        self.render(state, remaining).await;
        true
    }

    async fn render(&self, state: CycleState, remaining: Option<Duration>) {
        let (label, tone) = status_text(state, remaining);
        if let Err(err) = self.status.set_label(&label).await {
            warn!(error = %err, "status label update failed");
        }
        if let Err(err) = self.status.set_tone(tone).await {
            warn!(error = %err, "status tone update failed");
        }
    }
}

pub fn status_text(state: CycleState, remaining: Option<Duration>) -> (String, StatusTone) {
    match state {
        CycleState::Disabled => ("Auto-Buyer: OFF".to_string(), StatusTone::Off),
        CycleState::Idle => ("Auto-Buyer: ON".to_string(), StatusTone::Active),
        CycleState::Buying => ("Auto-Buyer: buying…".to_string(), StatusTone::Busy),
        CycleState::CountingDown => {
            let millis = remaining.unwrap_or_default().as_millis() as u64;
            let secs = (millis + 999) / 1000;
            (
                format!("Auto-Buyer: next run in {secs}s"),
                StatusTone::Active,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::sleep;

    use super::*;
    use crate::testing::{shared, CountingRunner, FakePage};

    fn scheduler(
        runner: &Arc<CountingRunner>,
        page: &Arc<FakePage>,
        interval_ms: u64,
    ) -> Scheduler {
        let config = EngineConfig {
            cycle_interval_ms: interval_ms,
            ..EngineConfig::default()
        };
        Scheduler::new(runner.clone(), page.clone(), Arc::new(config)).unwrap()
    }

    #[test]
    fn zero_countdown_tick_is_refused() {
        let config = EngineConfig {
            countdown_tick_ms: 0,
            ..EngineConfig::default()
        };
        let built = Scheduler::new(
            Arc::new(CountingRunner::default()),
            shared(FakePage::default()),
            Arc::new(config),
        );
        assert!(matches!(built, Err(SchedulerError::InvalidConfig(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn enabling_twice_runs_one_cycle() {
        let runner = Arc::new(CountingRunner::default());
        let page = shared(FakePage::default());
        let scheduler = scheduler(&runner, &page, 60_000);

        assert!(scheduler.enable().await);
        assert!(!scheduler.enable().await);
        sleep(Duration::from_millis(10)).await;

        assert_eq!(runner.started(), 1);
        assert_eq!(scheduler.state().await, CycleState::CountingDown);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_labels_then_next_cycle() {
        let runner = Arc::new(CountingRunner::default());
        let page = shared(FakePage::default());
        let scheduler = scheduler(&runner, &page, 3_000);

        scheduler.enable().await;
        sleep(Duration::from_millis(3_500)).await;
        scheduler.disable().await;

        let labels = page.labels();
        assert_eq!(
            &labels[..6],
            &[
                "Auto-Buyer: ON",
                "Auto-Buyer: buying…",
                "Auto-Buyer: next run in 3s",
                "Auto-Buyer: next run in 2s",
                "Auto-Buyer: next run in 1s",
                "Auto-Buyer: buying…",
            ]
        );
        assert_eq!(labels.last().map(String::as_str), Some("Auto-Buyer: OFF"));
        assert_eq!(page.last_tone(), Some(StatusTone::Off));
        assert_eq!(runner.started(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn disable_lets_running_cycle_finish() {
        let runner = Arc::new(CountingRunner::taking(Duration::from_secs(5)));
        let page = shared(FakePage::default());
        let scheduler = scheduler(&runner, &page, 10_000);

        scheduler.enable().await;
        sleep(Duration::from_secs(1)).await;
        assert!(scheduler.disable().await);
        sleep(Duration::from_secs(120)).await;

        assert_eq!(runner.started(), 1);
        assert_eq!(runner.finished(), 1);
        assert_eq!(scheduler.state().await, CycleState::Disabled);
        assert_eq!(
            page.labels().last().map(String::as_str),
            Some("Auto-Buyer: OFF")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn re_enable_waits_for_in_flight_cycle() {
        let runner = Arc::new(CountingRunner::taking(Duration::from_secs(5)));
        let page = shared(FakePage::default());
        let scheduler = scheduler(&runner, &page, 60_000);

        scheduler.enable().await;
        sleep(Duration::from_secs(1)).await;
        scheduler.disable().await;
        scheduler.enable().await;
        sleep(Duration::from_secs(1)).await;
        assert_eq!(scheduler.state().await, CycleState::Idle);
        assert_eq!(runner.started(), 1);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(runner.started(), 2);
        assert_eq!(runner.max_in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn control_activation_toggles() {
        let runner = Arc::new(CountingRunner::default());
        let page = shared(FakePage::default());
        let scheduler = scheduler(&runner, &page, 60_000);

        scheduler.expose().await.unwrap();
        assert_eq!(page.labels(), vec!["Auto-Buyer: OFF"]);

        assert!(page.press_control());
        sleep(Duration::from_millis(10)).await;
        assert!(scheduler.state().await.is_enabled());
        assert_eq!(runner.started(), 1);

        assert!(page.press_control());
        sleep(Duration::from_millis(10)).await;
        assert_eq!(scheduler.state().await, CycleState::Disabled);
    }

    #[test]
    fn countdown_label_rounds_up() {
        let (label, tone) = status_text(
            CycleState::CountingDown,
            Some(Duration::from_millis(59_001)),
        );
        assert_eq!(label, "Auto-Buyer: next run in 60s");
        assert_eq!(tone, StatusTone::Active);

        let (label, _) = status_text(CycleState::CountingDown, Some(Duration::from_secs(1)));
        assert_eq!(label, "Auto-Buyer: next run in 1s");
    }

    #[test]
    fn fixed_labels() {
        assert_eq!(
            status_text(CycleState::Disabled, None),
            ("Auto-Buyer: OFF".to_string(), StatusTone::Off)
        );
        assert_eq!(
            status_text(CycleState::Buying, None),
            ("Auto-Buyer: buying…".to_string(), StatusTone::Busy)
        );
    }
}
