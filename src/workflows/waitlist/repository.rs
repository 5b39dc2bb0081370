use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::wizard::WaitlistWizard;

/// Identifier for one wizard session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wizard plus bookkeeping for the session store.
#[derive(Debug, Clone)]
pub struct WizardSession {
    pub id: SessionId,
    pub started_at: DateTime<Utc>,
    /// Last time the session was created or changed.
    pub last_active: DateTime<Utc>,
    pub wizard: WaitlistWizard,
}

impl WizardSession {
    pub fn start() -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::random(),
            started_at: now,
            last_active: now,
            wizard: WaitlistWizard::new(),
        }
    }

    /// Idle for longer than `ttl` as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        (now - self.last_active)
            .to_std()
            .map(|idle| idle > ttl)
            .unwrap_or(false)
    }
}

/// Session storage. `update` runs the closure while the session is held
/// exclusively, which is what keeps the pending-submission check atomic.
pub trait WizardRepository: Send + Sync {
    fn insert(&self, session: WizardSession) -> Result<WizardSession, RepositoryError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<WizardSession>, RepositoryError>;
    fn update<T, F>(&self, id: &SessionId, apply: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut WizardSession) -> T;
    fn remove(&self, id: &SessionId) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("session already exists")]
    Conflict,
    #[error("session not found")]
    NotFound,
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Process-local store; sessions vanish on restart.
///
/// With an idle TTL, sessions nobody touched for that long are treated as
/// gone and swept out whenever a new session is inserted.
#[derive(Debug, Default, Clone)]
pub struct InMemoryWizardRepository {
    sessions: Arc<Mutex<HashMap<SessionId, WizardSession>>>,
    idle_ttl: Option<Duration>,
}

impl InMemoryWizardRepository {
    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            idle_ttl: Some(idle_ttl),
        }
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<SessionId, WizardSession>>, RepositoryError> {
        self.sessions
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session mutex poisoned".to_string()))
    }

    fn expired(&self, session: &WizardSession, now: DateTime<Utc>) -> bool {
        self.idle_ttl
            .is_some_and(|ttl| session.is_expired(now, ttl))
    }

    /// Drops every idle session and returns how many went.
    pub fn prune_expired(&self) -> Result<usize, RepositoryError> {
        let mut guard = self.lock()?;
        Ok(self.prune_locked(&mut guard, Utc::now()))
    }

    fn prune_locked(
        &self,
        sessions: &mut HashMap<SessionId, WizardSession>,
        now: DateTime<Utc>,
    ) -> usize {
        let before = sessions.len();
        sessions.retain(|_, session| !self.expired(session, now));
        let pruned = before - sessions.len();
        if pruned > 0 {
            debug!(pruned, live = sessions.len(), "expired waitlist sessions pruned");
        }
        pruned
    }
}

impl WizardRepository for InMemoryWizardRepository {
    fn insert(&self, session: WizardSession) -> Result<WizardSession, RepositoryError> {
        let mut guard = self.lock()?;
        self.prune_locked(&mut guard, Utc::now());
        if guard.contains_key(&session.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<WizardSession>, RepositoryError> {
        let mut guard = self.lock()?;
        let now = Utc::now();
        if guard
            .get(id)
            .is_some_and(|session| self.expired(session, now))
        {
            guard.remove(id);
            return Ok(None);
        }
        Ok(guard.get(id).cloned())
    }

    fn update<T, F>(&self, id: &SessionId, apply: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut WizardSession) -> T,
    {
        let mut guard = self.lock()?;
        let now = Utc::now();
        if guard
            .get(id)
            .is_some_and(|session| self.expired(session, now))
        {
            guard.remove(id);
            return Err(RepositoryError::NotFound);
        }

        let session = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        session.last_active = now;
        Ok(apply(session))
    }

    fn remove(&self, id: &SessionId) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        guard
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}
