// Pause / skip / stop signalling shared between the control loop and its producers
use super::error::{RunError, RunResult};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Duration, sleep};

/// Granularity of the pause spin-wait
pub const PAUSE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub paused: bool,
    pub skip_initial_wait: bool,
    pub running: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            paused: false,
            skip_initial_wait: false,
            running: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    TogglePause,
    Pause,
    Resume,
    SkipInitialWait,
    Stop,
}

/// Single-slot control state: producers write, the loop reads the latest value.
///
/// Cloning is cheap and every clone observes the same state.
#[derive(Debug, Clone)]
pub struct ControlPlane {
    tx: Arc<watch::Sender<ControlState>>,
}

impl Default for ControlPlane {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlPlane {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ControlState::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> ControlState {
        *self.tx.borrow()
    }

    pub fn apply(&self, command: ControlCommand) {
        self.tx.send_modify(|state| match command {
            ControlCommand::TogglePause => state.paused = !state.paused,
            ControlCommand::Pause => state.paused = true,
            ControlCommand::Resume => state.paused = false,
            ControlCommand::SkipInitialWait => state.skip_initial_wait = true,
            ControlCommand::Stop => state.running = false,
        });
        let state = self.snapshot();
        match command {
            ControlCommand::TogglePause | ControlCommand::Pause | ControlCommand::Resume => {
                if state.paused {
                    log::info!("⏸️ Paused (press P to resume)");
                } else {
                    log::info!("▶️ Resumed");
                }
            }
            ControlCommand::SkipInitialWait => {
                log::info!("⏭️ Skipping the initial button waits")
            }
            ControlCommand::Stop => log::info!("🛑 Stop requested"),
        }
    }

    pub fn pause(&self) {
        self.apply(ControlCommand::Pause);
    }

    pub fn resume(&self) {
        self.apply(ControlCommand::Resume);
    }

    pub fn stop(&self) {
        self.apply(ControlCommand::Stop);
    }

    pub fn request_skip(&self) {
        self.apply(ControlCommand::SkipInitialWait);
    }

    pub fn clear_skip(&self) {
        self.tx.send_modify(|state| state.skip_initial_wait = false);
    }

    pub fn is_running(&self) -> bool {
        self.snapshot().running
    }

    pub fn skip_requested(&self) -> bool {
        self.snapshot().skip_initial_wait
    }

    /// Suspension point: fails with `Stopped` once stop was requested and
    /// blocks (without timeout) while paused.
    pub async fn checkpoint(&self) -> RunResult<()> {
        loop {
            let state = self.snapshot();
            if !state.running {
                return Err(RunError::Stopped);
            }
            if !state.paused {
                return Ok(());
            }
            sleep(PAUSE_POLL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn test_commands_update_state() {
        let control = ControlPlane::new();
        assert_eq!(control.snapshot(), ControlState::default());

        control.apply(ControlCommand::TogglePause);
        assert!(control.snapshot().paused);
        control.apply(ControlCommand::TogglePause);
        assert!(!control.snapshot().paused);

        control.request_skip();
        assert!(control.skip_requested());
        control.clear_skip();
        assert!(!control.skip_requested());

        control.stop();
        assert!(!control.is_running());
    }

    #[test]
    fn test_clones_share_state() {
        let control = ControlPlane::new();
        let producer = control.clone();
        producer.pause();
        assert!(control.snapshot().paused);
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkpoint_passes_when_running() {
        let control = ControlPlane::new();
        assert!(control.checkpoint().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkpoint_fails_after_stop() {
        let control = ControlPlane::new();
        control.stop();
        assert!(matches!(control.checkpoint().await, Err(RunError::Stopped)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkpoint_blocks_until_resumed() {
        let control = ControlPlane::new();
        control.pause();

        let producer = control.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(5)).await;
            producer.resume();
        });

        let start = Instant::now();
        control.checkpoint().await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_while_paused_unwinds() {
        let control = ControlPlane::new();
        control.pause();

        let producer = control.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(750)).await;
            producer.stop();
        });

        assert!(matches!(control.checkpoint().await, Err(RunError::Stopped)));
    }
}
