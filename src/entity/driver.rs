//! Background task that fires timed effect expiries for one player.
//!
//! The task sleeps until the player's earliest effect deadline, locks the
//! player and expires whatever is due. Call [`EffectDriver::notify`] after
//! adding a timed effect so the task re-reads the deadline.

use log::{debug, trace};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::player::PlayerEntity;

pub type SharedPlayer = Arc<Mutex<PlayerEntity>>;

pub struct EffectDriver {
    wake: Arc<Notify>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl EffectDriver {
    /// Start driving `player`'s effect timers on the current runtime.
    pub fn spawn(player: SharedPlayer) -> Self {
        let wake = Arc::new(Notify::new());
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run(player, wake.clone(), shutdown_rx));
        Self {
            wake,
            shutdown,
            handle,
        }
    }

    /// Re-check the next deadline (after adding or removing a timed effect).
    pub fn notify(&self) {
        self.wake.notify_one();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the task and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            debug!("effect driver ended abnormally: {}", e);
        }
    }
}

async fn run(player: SharedPlayer, wake: Arc<Notify>, mut shutdown: watch::Receiver<bool>) {
    loop {
        let deadline = {
            let mut guard = player.lock().await;
            let expired = guard.expire_effects(Instant::now());
            if !expired.is_empty() {
                debug!("{}: expired {:?}", guard.name(), expired);
            }
            guard.next_effect_deadline()
        };
        trace!("next effect deadline: {:?}", deadline);

        let sleep = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = wake.notified() => {}
            _ = sleep => {}
        }
    }
    debug!("effect driver stopped");
}
