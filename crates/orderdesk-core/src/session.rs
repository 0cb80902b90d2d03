//! Signed-in user session, shared by injection rather than globals.
//!
//! Authentication itself happens elsewhere; whoever performs it pushes
//! the resulting session into a [`SessionHandle`]. Holders of a clone
//! see the current session and can subscribe to changes, which is how
//! caches learn that their contents belong to a previous user.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.expires_at, Some(at) if at <= Utc::now())
    }
}

/// Shared handle to the current session. Cloning is cheap; all clones
/// observe the same state.
#[derive(Clone)]
pub struct SessionHandle {
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Replace the current session, notifying subscribers.
    pub fn set(&self, session: Session) {
        debug!(user_id = %session.user_id, "Session updated");
        self.tx.send_replace(Some(session));
    }

    /// Drop the current session (sign-out), notifying subscribers.
    pub fn clear(&self) {
        debug!("Session cleared");
        self.tx.send_replace(None);
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    /// Get the signed-in user's id, if any.
    pub fn user_id(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|s| s.user_id.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Subscribe to session changes. The receiver yields on every
    /// `set` and `clear`.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_handle_clones_share_state() {
        let handle = SessionHandle::new();
        let clone = handle.clone();
        assert!(!clone.is_signed_in());

        handle.set(Session::new("u1", "token-1"));
        assert_eq!(clone.user_id().as_deref(), Some("u1"));

        handle.clear();
        assert!(clone.current().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_observe_changes() {
        let handle = SessionHandle::new();
        let mut rx = handle.subscribe();

        handle.set(Session::new("u1", "token-1"));
        rx.changed().await.expect("sender alive");
        assert_eq!(rx.borrow().as_ref().map(|s| s.user_id.clone()).as_deref(), Some("u1"));

        handle.clear();
        rx.changed().await.expect("sender alive");
        assert!(rx.borrow().is_none());
    }

    #[test]
    fn test_expiry() {
        let mut session = Session::new("u1", "token-1");
        assert!(!session.is_expired());

        session.expires_at = Some(Utc::now() - Duration::minutes(1));
        assert!(session.is_expired());

        session.expires_at = Some(Utc::now() + Duration::minutes(30));
        assert!(!session.is_expired());
    }
}
