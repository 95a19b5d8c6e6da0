//! Correlates incoming [`Reply`] envelopes with the caller awaiting them.

use crate::message::{now_ms, Reply};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::trace;

struct PendingReply {
    sender: oneshot::Sender<Reply>,
    expiry_date_ms: u64,
}

/// Maps `requestReplyId → pending reply callback`, with a background
/// sweeper that times out entries whose TTL has elapsed.
///
/// The sweeper runs at `sweep_interval`, per spec clamped by the caller to
/// no coarser than the smallest outstanding TTL (or a fixed floor).
pub struct ReplyCallerDirectory {
    pending: DashMap<String, PendingReply>,
}

impl ReplyCallerDirectory {
    /// Create a directory and spawn its sweeper task at `sweep_interval`.
    pub fn spawn(sweep_interval: Duration) -> Arc<Self> {
        let directory = Arc::new(Self {
            pending: DashMap::new(),
        });
        tokio::spawn(run_sweeper(Arc::clone(&directory), sweep_interval));
        directory
    }

    /// Create a directory without a sweeper, for tests that drive sweeping
    /// manually via [`Self::sweep`].
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            pending: DashMap::new(),
        })
    }

    /// Register a pending reply, returning the receiver the caller should
    /// await.
    pub fn register(&self, request_reply_id: String, expiry_date_ms: u64) -> oneshot::Receiver<Reply> {
        let (sender, receiver) = oneshot::channel();
        self.pending.insert(
            request_reply_id,
            PendingReply {
                sender,
                expiry_date_ms,
            },
        );
        receiver
    }

    /// Consume the pending entry matching `reply.request_reply_id` and
    /// deliver it. Returns `false` if no entry was registered (e.g. it
    /// already timed out), in which case the caller should log and drop.
    pub fn resolve(&self, reply: Reply) -> bool {
        match self.pending.remove(&reply.request_reply_id) {
            Some((_, pending)) => pending.sender.send(reply).is_ok(),
            None => false,
        }
    }

    /// Remove and time out every entry whose TTL has elapsed as of `now_ms`.
    pub fn sweep(&self, now_ms: u64) {
        let expired: Vec<String> = self
            .pending
            .iter()
            .filter(|entry| entry.expiry_date_ms < now_ms)
            .map(|entry| entry.key().clone())
            .collect();

        for request_reply_id in expired {
            if let Some((id, pending)) = self.pending.remove(&request_reply_id) {
                trace!(request_reply_id = %id, "reply timed out");
                let _ = pending.sender.send(Reply::failure(
                    id,
                    crate::error::RpcError::timed_out("reply TTL elapsed"),
                ));
            }
        }
    }

    /// Number of replies currently awaited.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

async fn run_sweeper(directory: Arc<ReplyCallerDirectory>, sweep_interval: Duration) {
    let mut interval = tokio::time::interval(sweep_interval);
    loop {
        interval.tick().await;
        directory.sweep(now_ms());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::RpcValue;

    #[tokio::test]
    async fn resolve_delivers_to_registered_waiter() {
        let directory = ReplyCallerDirectory::new();
        let receiver = directory.register("r1".into(), u64::MAX);
        assert!(directory.resolve(Reply::success("r1", vec![RpcValue::Bool(true)])));
        let reply = receiver.await.unwrap();
        assert_eq!(reply.request_reply_id, "r1");
    }

    #[test]
    fn resolve_of_unknown_id_returns_false() {
        let directory = ReplyCallerDirectory::new();
        assert!(!directory.resolve(Reply::success("ghost", vec![])));
    }

    #[tokio::test]
    async fn sweep_times_out_expired_entries() {
        let directory = ReplyCallerDirectory::new();
        let receiver = directory.register("r1".into(), 100);
        directory.sweep(200);
        assert_eq!(directory.pending_count(), 0);
        let reply = receiver.await.unwrap();
        match reply.body {
            crate::message::ReplyBody::Error(err) => {
                assert_eq!(err.code, crate::error::RpcErrorCode::TimeOut)
            }
            crate::message::ReplyBody::Response(_) => panic!("expected timeout error"),
        }
    }

    #[test]
    fn sweep_leaves_unexpired_entries_pending() {
        let directory = ReplyCallerDirectory::new();
        let _receiver = directory.register("r1".into(), 1_000);
        directory.sweep(200);
        assert_eq!(directory.pending_count(), 1);
    }
}
