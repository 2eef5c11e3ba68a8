//! Authenticated session lifecycle.
//!
//! A [`Session`] is the cookie set produced by one credential exchange. The
//! [`SessionStore`] holds the current one and is owned by the supervisory
//! loop, which is the only writer; the status resolver borrows it to sign
//! requests. Re-authentication is reactive: the loop calls the
//! [`SessionManager`] only after the platform answers "login required".

mod afreeca;

pub use afreeca::AfreecaSessionManager;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Result;
use crate::config::Credentials;
use crate::utils::cookies;

/// Cookie set returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    cookies: BTreeMap<String, String>,
    acquired_at: DateTime<Utc>,
}

impl Session {
    pub fn new(cookies: BTreeMap<String, String>) -> Self {
        Self {
            cookies,
            acquired_at: Utc::now(),
        }
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    /// `Cookie` header value for authenticated requests.
    pub fn cookie_header(&self) -> String {
        cookies::to_header_value(&self.cookies)
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// Holder of the single current session.
#[derive(Debug, Default)]
pub struct SessionStore {
    current: Option<Session>,
    generation: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The session to attach to outbound requests, if one was acquired.
    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// Replace the current session wholesale.
    pub fn replace(&mut self, session: Session) {
        self.current = Some(session);
        self.generation += 1;
    }

    /// How many sessions have been installed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Performs the platform credential exchange.
#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Run a full login and return the fresh session.
    ///
    /// Fails with [`crate::Error::Auth`] when no usable session could be
    /// produced, whether the platform rejected the credentials or the
    /// request never completed.
    async fn acquire_session(&self, credentials: &Credentials) -> Result<Session>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(pairs: &[(&str, &str)]) -> Session {
        Session::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_store_starts_empty() {
        let store = SessionStore::new();
        assert!(store.current().is_none());
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn test_replace_supersedes_previous_session() {
        let mut store = SessionStore::new();
        store.replace(session(&[("PdboxTicket", "old"), ("extra", "1")]));
        store.replace(session(&[("PdboxTicket", "new")]));

        let current = store.current().unwrap();
        assert_eq!(current.cookie_header(), "PdboxTicket=new");
        assert_eq!(store.generation(), 2);
    }
}
