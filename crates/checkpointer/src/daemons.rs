//! Timer-driven background tasks of the checkpointer.

use std::{sync::Arc, time::Duration};

use arbor_config::CheckpointConfig;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::*;

use crate::checkpointer::Checkpointer;

fn ticker(period: Duration) -> time::Interval {
    // tokio rejects a zero period
    let period = period.max(Duration::from_millis(1));
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Waits for the next tick. Returns false once shutdown was requested or its sender is gone.
///
/// Shutdown is only observed here, never while a write or cleanup is running.
async fn next_tick(interval: &mut time::Interval, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return false;
    }
    tokio::select! {
        _ = interval.tick() => true,
        // Only ever flips to true, so any change means stop.
        _ = shutdown.changed() => false,
    }
}

/// Writes the queued checkpoint every `period` until shutdown.
pub async fn write_daemon(
    checkpointer: Arc<Checkpointer>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = ticker(period);
    while next_tick(&mut interval, &mut shutdown).await {
        checkpointer.write_pending_checkpoint().await;
    }
    debug!("write daemon stopped");
}

/// Garbage collects old checkpoints every `period` until shutdown.
pub async fn cleanup_daemon(
    checkpointer: Arc<Checkpointer>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = ticker(period);
    while next_tick(&mut interval, &mut shutdown).await {
        if let Err(err) = checkpointer.cleanup_checkpoints().await {
            warn!(%err, "checkpoint cleanup failed");
        }
    }
    debug!("cleanup daemon stopped");
}

/// Handle to the running daemons.
///
/// Dropping it also stops them, but only [`Self::shutdown`] waits for them to finish.
#[expect(
    missing_debug_implementations,
    reason = "Inner types don't have Debug implementation"
)]
pub struct DaemonHandles {
    checkpointer: Arc<Checkpointer>,
    shutdown_tx: watch::Sender<bool>,
    write: JoinHandle<()>,
    cleanup: JoinHandle<()>,
}

impl DaemonHandles {
    /// Stops both daemons once their current step completes, writes the checkpoint still in
    /// the queue and waits for all queued database calls.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        // Receivers live in the tasks, which are still running.
        let _ = self.shutdown_tx.send(true);
        self.write.await?;
        self.cleanup.await?;

        if let Some(block_id) = self.checkpointer.write_pending_checkpoint().await {
            info!(%block_id, "wrote queued checkpoint on shutdown");
        }

        let storage = self.checkpointer.storage().clone();
        tokio::task::spawn_blocking(move || storage.wait_idle()).await?;
        info!("checkpoint daemons stopped");
        Ok(())
    }
}

/// Spawns both daemons on the current tokio runtime.
pub fn spawn_daemons(checkpointer: &Arc<Checkpointer>, config: &CheckpointConfig) -> DaemonHandles {
    info!(
        write_interval = ?config.write_interval(),
        cleanup_interval = ?config.cleanup_interval(),
        max_reorg_height = %checkpointer.max_reorg_height(),
        "starting checkpoint daemons"
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    DaemonHandles {
        checkpointer: checkpointer.clone(),
        write: tokio::spawn(write_daemon(
            checkpointer.clone(),
            config.write_interval(),
            shutdown_rx.clone(),
        )),
        cleanup: tokio::spawn(cleanup_daemon(
            checkpointer.clone(),
            config.cleanup_interval(),
            shutdown_rx,
        )),
        shutdown_tx,
    }
}
