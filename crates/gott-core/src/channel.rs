//! Rendezvous hand-off between an update producer and the dispatcher.
//!
//! [`UpdateSender::send`] completes only once the receiving side has taken
//! the update, so a producer never runs ahead of the consumer: updates are
//! consumed in exactly the order they were sent and a slow consumer stalls
//! the producer.

use tokio::sync::{mpsc, oneshot};
use tracing::trace;

use crate::error::ChannelClosed;
use crate::update::Update;

struct Delivery {
    update: Update,
    accepted: oneshot::Sender<()>,
}

/// Creates a connected sender/receiver pair.
pub fn channel() -> (UpdateSender, UpdateReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (UpdateSender { tx }, UpdateReceiver { rx })
}

/// Producer half. Cheap to clone.
#[derive(Clone)]
pub struct UpdateSender {
    tx: mpsc::Sender<Delivery>,
}

impl UpdateSender {
    /// Hands an update to the receiver and waits until it was taken.
    ///
    /// Fails if the receiver was dropped before or while waiting.
    pub async fn send(&self, update: Update) -> Result<(), ChannelClosed> {
        let (accepted, ack) = oneshot::channel();
        self.tx
            .send(Delivery { update, accepted })
            .await
            .map_err(|_| ChannelClosed)?;
        ack.await.map_err(|_| ChannelClosed)
    }

    /// Returns `true` if the receiver is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl std::fmt::Debug for UpdateSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateSender")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Consumer half.
#[derive(Debug)]
pub struct UpdateReceiver {
    rx: mpsc::Receiver<Delivery>,
}

impl UpdateReceiver {
    /// Receives the next update, acknowledging it to the sender.
    ///
    /// Returns `None` once every sender has been dropped.
    pub async fn recv(&mut self) -> Option<Update> {
        loop {
            let Delivery { update, accepted } = self.rx.recv().await?;
            // A sender that gave up waiting no longer owns a place in the
            // order; skip its update.
            if accepted.send(()).is_ok() {
                return Some(update);
            }
            trace!(
                update_type = %update.update_type(),
                "Skipping update abandoned by its sender"
            );
        }
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("update_type", &self.update.update_type())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::MessageRemoved;
    use std::time::Duration;

    fn removed(chat_id: i64) -> Update {
        Update::MessageRemoved(MessageRemoved {
            timestamp: 0,
            message_id: format!("mid.{chat_id}"),
            chat_id,
            user_id: 1,
        })
    }

    #[tokio::test]
    async fn test_send_waits_for_receiver() {
        let (tx, mut rx) = channel();

        let producer = tokio::spawn(async move { tx.send(removed(1)).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!producer.is_finished());

        let update = rx.recv().await.unwrap();
        assert_eq!(update, removed(1));
        assert_eq!(producer.await.unwrap(), Ok(()));
    }

    #[tokio::test]
    async fn test_order_is_preserved() {
        let (tx, mut rx) = channel();

        let producer = tokio::spawn(async move {
            for id in 1..=3 {
                tx.send(removed(id)).await.unwrap();
            }
        });

        for id in 1..=3 {
            assert_eq!(rx.recv().await, Some(removed(id)));
        }
        producer.await.unwrap();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped() {
        let (tx, rx) = channel();
        drop(rx);
        assert!(tx.is_closed());
        assert_eq!(tx.send(removed(1)).await, Err(ChannelClosed));
    }

    #[tokio::test]
    async fn test_pending_send_fails_when_receiver_dropped() {
        let (tx, rx) = channel();

        let producer = tokio::spawn(async move { tx.send(removed(1)).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!producer.is_finished());

        drop(rx);
        assert_eq!(producer.await.unwrap(), Err(ChannelClosed));
    }

    #[tokio::test]
    async fn test_abandoned_send_is_skipped() {
        let (tx, mut rx) = channel();

        let abandoned = {
            let tx = tx.clone();
            tokio::spawn(async move { tx.send(removed(1)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        abandoned.abort();
        assert!(abandoned.await.unwrap_err().is_cancelled());

        let producer = tokio::spawn(async move { tx.send(removed(2)).await });

        assert_eq!(rx.recv().await, Some(removed(2)));
        assert_eq!(producer.await.unwrap(), Ok(()));
    }
}
