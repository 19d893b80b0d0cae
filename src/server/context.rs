//! Shared, process-wide state handed to every session: the namespace
//! registry, the credential table, and the `stop-server` shutdown signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::auth::CredentialTable;
use crate::cache::NamespaceRegistry;
use crate::config::DEFAULT_IDLE_TIMEOUT_SECS;

pub struct ServerContext {
    pub registry: NamespaceRegistry,
    pub credentials: CredentialTable,
    /// Idle read deadline applied to interactive sessions, resolved from
    /// configuration at startup.
    pub idle_timeout: Duration,
    stopped: AtomicBool,
    stop_notify: Notify,
}

impl ServerContext {
    pub fn new(credentials: CredentialTable) -> Arc<Self> {
        Self::with_idle_timeout(credentials, Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS))
    }

    pub fn with_idle_timeout(credentials: CredentialTable, idle_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            registry: NamespaceRegistry::new(),
            credentials,
            idle_timeout,
            stopped: AtomicBool::new(false),
            stop_notify: Notify::new(),
        })
    }

    /// Sets the process-wide stop flag and wakes the accept loop
    /// immediately, rather than waiting for its next incidental `accept()`
    /// the way the reference implementation's poll-after-accept does.
    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.stop_notify.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub async fn stopped(&self) {
        self.stop_notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CredentialTable;

    #[test]
    fn starts_unstopped() {
        let ctx = ServerContext::new(CredentialTable::from_records(vec![]));
        assert!(!ctx.is_stopped());
    }

    #[test]
    fn new_defaults_idle_timeout_to_sixty_seconds() {
        let ctx = ServerContext::new(CredentialTable::from_records(vec![]));
        assert_eq!(ctx.idle_timeout, Duration::from_secs(60));
    }

    #[test]
    fn with_idle_timeout_uses_the_given_duration() {
        let ctx = ServerContext::with_idle_timeout(
            CredentialTable::from_records(vec![]),
            Duration::from_secs(5),
        );
        assert_eq!(ctx.idle_timeout, Duration::from_secs(5));
    }

    #[test]
    fn request_stop_sets_flag() {
        let ctx = ServerContext::new(CredentialTable::from_records(vec![]));
        ctx.request_stop();
        assert!(ctx.is_stopped());
    }

    #[tokio::test]
    async fn request_stop_wakes_waiters() {
        let ctx = ServerContext::new(CredentialTable::from_records(vec![]));
        let waiter = {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.stopped().await })
        };
        tokio::task::yield_now().await;
        ctx.request_stop();
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("stop should wake the waiter promptly")
            .unwrap();
    }
}
