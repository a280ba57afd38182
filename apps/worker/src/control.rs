//! Control-signal plumbing
//!
//! The bus subscriber forwards the first pause/cancel signal over a
//! watch channel; the batch loop and the progress observer read it at
//! their observation points. When the bus is unavailable the observer
//! falls back to polling the job row at whole-lead boundaries.

use automation::Interrupt;
use chrono::Utc;
use domain_jobs::{ControlAction, ControlStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

pub type ControlReceiver = watch::Receiver<Option<Interrupt>>;

/// Forward control messages into the watch channel. The first signal is
/// terminal from the worker's perspective, so the task ends after one.
pub fn spawn_control_listener(
    mut stream: ControlStream,
    tx: watch::Sender<Option<Interrupt>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Some(message) = stream.next_message().await {
            let latency = message.latency(Utc::now());
            info!(
                action = %message.action,
                latency_ms = latency.num_milliseconds(),
                "Control signal received"
            );

            let interrupt = match message.action {
                ControlAction::Pause => Interrupt::Paused,
                ControlAction::Cancel => Interrupt::Cancelled,
            };
            let _ = tx.send(Some(interrupt));
        }
    })
}

/// The interrupt currently latched in the channel, if any
pub fn latched(rx: &ControlReceiver) -> Option<Interrupt> {
    *rx.borrow()
}

/// Wait until an interrupt arrives. Never resolves if the sender is gone
/// without having signalled; callers race this against a sleep.
pub async fn wait_for_interrupt(rx: &mut ControlReceiver) -> Interrupt {
    loop {
        if let Some(interrupt) = *rx.borrow_and_update() {
            return interrupt;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_latched_reflects_channel_state() {
        let (tx, rx) = watch::channel(None);
        assert_eq!(latched(&rx), None);

        tx.send(Some(Interrupt::Paused)).unwrap();
        assert_eq!(latched(&rx), Some(Interrupt::Paused));
    }

    #[tokio::test]
    async fn test_wait_for_interrupt_resolves_on_signal() {
        let (tx, mut rx) = watch::channel(None);

        let waiter = tokio::spawn(async move { wait_for_interrupt(&mut rx).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.send(Some(Interrupt::Cancelled)).unwrap();

        let interrupt = waiter.await.unwrap();
        assert_eq!(interrupt, Interrupt::Cancelled);
    }

    #[tokio::test]
    async fn test_wait_for_interrupt_sees_pre_latched_signal() {
        let (tx, mut rx) = watch::channel(None);
        tx.send(Some(Interrupt::Paused)).unwrap();

        let interrupt = wait_for_interrupt(&mut rx).await;
        assert_eq!(interrupt, Interrupt::Paused);
    }

    #[tokio::test]
    async fn test_wait_for_interrupt_pends_when_sender_dropped_unsignalled() {
        let (tx, mut rx) = watch::channel(None);
        drop(tx);

        let result =
            tokio::time::timeout(Duration::from_millis(50), wait_for_interrupt(&mut rx)).await;
        assert!(result.is_err());
    }
}
