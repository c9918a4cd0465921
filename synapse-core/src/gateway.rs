//! Closable channels at the ingress and egress boundary, and the shutdown
//! broadcast.

use crate::error::{Result, SynapseError};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Default number of buffered signals per gateway.
pub const DEFAULT_GATEWAY_CAPACITY: usize = 1000;

/// A bounded signal channel guarded by a closed flag.
///
/// The flag is checked and released before the channel operation, so a
/// concurrent `close`/`open` never waits on a blocked sender or receiver.
pub struct Gateway<T> {
    closed: Mutex<bool>,
    sender: mpsc::Sender<T>,
    receiver: tokio::sync::Mutex<mpsc::Receiver<T>>,
}

impl<T: Send> Gateway<T> {
    /// Create an open gateway with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            closed: Mutex::new(false),
            sender,
            receiver: tokio::sync::Mutex::new(receiver),
        }
    }

    /// Send a signal. Blocks while the channel is full.
    ///
    /// # Errors
    ///
    /// Returns `GatewayClosed` if the gateway is closed.
    pub async fn send_signal(&self, signal: T) -> Result<()> {
        self.check_open()?;
        self.sender
            .send(signal)
            .await
            .map_err(|_| SynapseError::GatewayClosed)
    }

    /// Receive the next signal. Blocks until one arrives.
    ///
    /// # Errors
    ///
    /// Returns `GatewayClosed` if the gateway is closed.
    pub async fn receive_signal(&self) -> Result<T> {
        self.check_open()?;
        let mut receiver = self.receiver.lock().await;
        receiver.recv().await.ok_or(SynapseError::GatewayClosed)
    }

    /// Close the gateway.
    pub fn close(&self) {
        *self.closed.lock() = true;
    }

    /// Reopen the gateway.
    pub fn open(&self) {
        *self.closed.lock() = false;
    }

    /// Check whether the gateway is closed.
    pub fn is_closed(&self) -> bool {
        *self.closed.lock()
    }

    fn check_open(&self) -> Result<()> {
        let closed = *self.closed.lock();
        if closed {
            return Err(SynapseError::GatewayClosed);
        }
        Ok(())
    }
}

impl<T: Send> Default for Gateway<T> {
    fn default() -> Self {
        Self::new(DEFAULT_GATEWAY_CAPACITY)
    }
}

/// Process-wide cancellation broadcast.
///
/// Closing is idempotent and visible to every clone.
#[derive(Clone)]
pub struct Closer {
    tx: Arc<watch::Sender<bool>>,
}

impl Closer {
    /// Create an open closer.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fire the closer. Returns `true` only for the call that closed it.
    pub fn close(&self) -> bool {
        !self.tx.send_replace(true)
    }

    /// Check whether the closer has fired.
    pub fn is_closed(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the closer fires.
    pub async fn closed(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot drop while waiting.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

impl Default for Closer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Closer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Closer")
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn gateway_round_trip() {
        let gateway = Gateway::new(4);
        gateway.send_signal(7u32).await.unwrap();
        assert_eq!(gateway.receive_signal().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn closed_gateway_fails_without_blocking() {
        let gateway: Gateway<u32> = Gateway::new(1);
        gateway.close();
        assert!(gateway.is_closed());

        let result = tokio::time::timeout(Duration::from_millis(100), gateway.receive_signal())
            .await
            .expect("receive must not block");
        assert!(matches!(result, Err(SynapseError::GatewayClosed)));

        // Fill the channel so an open send would block.
        gateway.open();
        gateway.send_signal(1).await.unwrap();
        gateway.close();
        let result = tokio::time::timeout(Duration::from_millis(100), gateway.send_signal(2))
            .await
            .expect("send must not block");
        assert!(matches!(result, Err(SynapseError::GatewayClosed)));
    }

    #[tokio::test]
    async fn reopened_gateway_delivers() {
        let gateway = Gateway::new(2);
        gateway.close();
        gateway.open();
        gateway.send_signal("hi").await.unwrap();
        assert_eq!(gateway.receive_signal().await.unwrap(), "hi");
    }

    #[tokio::test]
    async fn closer_is_idempotent_and_shared() {
        let closer = Closer::new();
        let clone = closer.clone();
        assert!(!clone.is_closed());

        let waiter = tokio::spawn(async move { clone.closed().await });
        assert!(closer.close());
        assert!(!closer.close());

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter must wake")
            .unwrap();
        assert!(closer.is_closed());
    }

    #[tokio::test]
    async fn closed_returns_immediately_when_already_closed() {
        let closer = Closer::new();
        closer.close();
        tokio::time::timeout(Duration::from_millis(100), closer.closed())
            .await
            .expect("must not block");
    }
}
