//! The one-shot transfer token produced by [`crate::buffer::Buffer::send`].
//!
//! Unlike a move, sending a buffer does not consume the caller's handle: the
//! origin keeps existing as a (now permanently inaccessible) value the
//! caller can still inspect for identity/logging purposes, while exactly one
//! other thread may [`SendToken::receive`] a freshly constructed, fully
//! accessible `Buffer` over the same storage. A token dropped before any
//! receiver claims it still safely releases the storage — there is no
//! use-after-free risk — but it is the one place in this crate that mirrors
//! Netty's "collected without being released" cleaner-backstop scenario, so
//! it gets its own `warn`-level trace.

use std::sync::Mutex;

use crate::buffer::{Buffer, SendPayload};
use crate::error::{BufferError, Result};
use crate::lifecycle;

/// A buffer's contents, in transit to exactly one receiver.
///
/// `SendToken` is `Send` regardless of what thread created it: the payload
/// it carries only ever becomes a live `Buffer` again once [`receive`] runs,
/// and only one caller, on one thread, can win that race.
///
/// [`receive`]: SendToken::receive
pub struct SendToken {
    payload: Mutex<Option<SendPayload>>,
}

impl SendToken {
    pub(crate) fn new(payload: SendPayload) -> Self {
        SendToken { payload: Mutex::new(Some(payload)) }
    }

    /// Claims the transferred buffer. Fails with `SendConsumed` if another
    /// caller already received it, or if it was discarded first. Takes `&self`
    /// rather than consuming the token so a token shared across threads (e.g.
    /// via `Arc<SendToken>`) can be raced by several receivers with only one
    /// winner, matching the single-receive guarantee directly rather than
    /// relying on move semantics to enforce it.
    pub fn receive(&self) -> Result<Buffer> {
        let payload = self
            .payload
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .take()
            .ok_or_else(BufferError::send_consumed)?;
        Ok(Buffer::from_send_payload(payload))
    }

    /// Explicitly discards the transfer without ever constructing a
    /// receiving buffer, releasing the backing storage immediately through
    /// the same path an un-received drop would take.
    pub fn discard(&self) {
        let payload = self.payload.lock().unwrap_or_else(|poison| poison.into_inner()).take();
        if let Some(payload) = payload {
            lifecycle::release(payload.recycler(), payload.region());
        }
    }
}

impl Drop for SendToken {
    fn drop(&mut self) {
        let payload = self.payload.lock().unwrap_or_else(|poison| poison.into_inner()).take();
        if let Some(payload) = payload {
            tracing::warn!("leak backstop: send token dropped before any receiver claimed it");
            lifecycle::release(payload.recycler(), payload.region());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::HeapMemoryManager;
    use std::sync::Arc;

    #[test]
    fn second_receive_fails_with_send_consumed() {
        let buf = Buffer::allocate(Arc::new(HeapMemoryManager), 4).unwrap();
        let token = buf.send().unwrap();
        assert!(token.receive().is_ok());
        let second = token.receive();
        assert!(second.is_err());
        assert_eq!(second.unwrap_err().code(), crate::error::codes::SEND_CONSUMED);
    }

    #[test]
    fn discard_without_receive_does_not_panic() {
        let buf = Buffer::allocate(Arc::new(HeapMemoryManager), 4).unwrap();
        let token = buf.send().unwrap();
        token.discard();
    }
}
