//! Hosting of live sessions between interactions.
//!
//! Each browser connection or client owns one [`SessionEntry`]. Entries are
//! kept in memory only; idle ones are purged and the least recently used is
//! evicted when the registry is full.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use wikichat_core::config::SessionConfig;
use wikichat_core::Language;

use crate::error::ChatError;
use crate::session::Session;

/// A hosted session.
#[derive(Debug)]
pub struct SessionEntry {
    pub id: Uuid,
    pub session: Session,
    pub created_at: DateTime<Utc>,
}

impl SessionEntry {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            session: Session::new(),
            created_at: Utc::now(),
        }
    }
}

/// Shared handle to a hosted session.
///
/// Holding the lock for a whole interaction serializes the interactions of
/// one session while different sessions proceed independently.
pub type SessionHandle = Arc<tokio::sync::Mutex<SessionEntry>>;

struct Slot {
    handle: SessionHandle,
    /// Language used for the next resolution. Kept outside the session lock
    /// so it stays readable while a resolution is in flight.
    language: Language,
    last_active: Instant,
}

/// In-memory map of live sessions.
pub struct SessionRegistry {
    slots: Mutex<HashMap<Uuid, Slot>>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            idle_timeout,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.idle_timeout(), config.max_sessions)
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<Uuid, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, slot: &Slot, now: Instant) -> bool {
        now.duration_since(slot.last_active) >= self.idle_timeout
    }

    /// Apply `f` to a live slot and refresh its idle clock.
    fn touch<T>(&self, id: Uuid, f: impl FnOnce(&mut Slot) -> T) -> Result<T, ChatError> {
        let now = Instant::now();
        let mut slots = self.slots();
        match slots.get_mut(&id) {
            Some(slot) if !self.is_expired(slot, now) => {
                slot.last_active = now;
                Ok(f(slot))
            }
            Some(_) => {
                slots.remove(&id);
                debug!(session_id = %id, "Session expired on access");
                Err(ChatError::SessionNotFound(id))
            }
            None => Err(ChatError::SessionNotFound(id)),
        }
    }

    /// Reuse the requested session if it is still live, otherwise create one.
    ///
    /// Returns the session id and its current language; `language` only
    /// applies to a newly created session.
    pub fn open(&self, requested: Option<Uuid>, language: Language) -> (Uuid, Language) {
        let now = Instant::now();
        let mut slots = self.slots();

        if let Some(id) = requested {
            match slots.get_mut(&id) {
                Some(slot) if !self.is_expired(slot, now) => {
                    slot.last_active = now;
                    return (id, slot.language);
                }
                Some(_) => {
                    slots.remove(&id);
                    debug!(session_id = %id, "Requested session expired");
                }
                None => {}
            }
        }

        while slots.len() >= self.max_sessions {
            let oldest = slots
                .iter()
                .min_by_key(|(_, slot)| slot.last_active)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    slots.remove(&id);
                    info!(session_id = %id, "Evicted least recently used session");
                }
                None => break,
            }
        }

        let id = Uuid::new_v4();
        slots.insert(
            id,
            Slot {
                handle: Arc::new(tokio::sync::Mutex::new(SessionEntry::new(id))),
                language,
                last_active: now,
            },
        );
        info!(session_id = %id, language = language.code(), "Session created");
        (id, language)
    }

    /// Fetch a live session and refresh its idle clock.
    pub fn get(&self, id: Uuid) -> Result<SessionHandle, ChatError> {
        self.touch(id, |slot| slot.handle.clone())
    }

    /// The language the session resolves its next query in.
    pub fn language(&self, id: Uuid) -> Result<Language, ChatError> {
        self.touch(id, |slot| slot.language)
    }

    /// Change the session language for later resolutions.
    pub fn set_language(&self, id: Uuid, language: Language) -> Result<(), ChatError> {
        self.touch(id, |slot| slot.language = language)
    }

    pub fn remove(&self, id: Uuid) -> Result<(), ChatError> {
        match self.slots().remove(&id) {
            Some(_) => {
                info!(session_id = %id, "Session removed");
                Ok(())
            }
            None => Err(ChatError::SessionNotFound(id)),
        }
    }

    /// Drop every session idle for at least the idle timeout.
    ///
    /// Returns the number of sessions removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut slots = self.slots();
        let before = slots.len();
        slots.retain(|_, slot| !self.is_expired(slot, now));
        let purged = before - slots.len();
        if purged > 0 {
            info!(purged, remaining = slots.len(), "Purged idle sessions");
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_open_creates_session_with_language() {
        let registry = SessionRegistry::new(HOUR, 10);
        let (id, language) = registry.open(None, Language::Tamil);
        assert_eq!(language, Language::Tamil);
        assert_eq!(registry.language(id).unwrap(), Language::Tamil);

        let handle = registry.get(id).unwrap();
        let entry = handle.lock().await;
        assert_eq!(entry.id, id);
        assert!(entry.session.is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_open_reuses_live_session() {
        let registry = SessionRegistry::new(HOUR, 10);
        let (id, _) = registry.open(None, Language::English);
        registry.set_language(id, Language::Hindi).unwrap();

        let (again, language) = registry.open(Some(id), Language::English);
        assert_eq!(again, id);
        assert_eq!(language, Language::Hindi);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_language_accessible_while_session_locked() {
        let registry = SessionRegistry::new(HOUR, 10);
        let (id, _) = registry.open(None, Language::English);
        let handle = registry.get(id).unwrap();
        let _busy = handle.lock().await;

        registry.set_language(id, Language::Malayalam).unwrap();
        assert_eq!(registry.language(id).unwrap(), Language::Malayalam);
    }

    #[test]
    fn test_language_of_unknown_session() {
        let registry = SessionRegistry::new(HOUR, 10);
        let id = Uuid::new_v4();
        assert!(matches!(registry.language(id), Err(ChatError::SessionNotFound(x)) if x == id));
        assert!(registry.set_language(id, Language::Urdu).is_err());
    }

    #[test]
    fn test_open_unknown_id_creates_new() {
        let registry = SessionRegistry::new(HOUR, 10);
        let unknown = Uuid::new_v4();
        let (id, _) = registry.open(Some(unknown), Language::English);
        assert_ne!(id, unknown);
        assert!(registry.get(id).is_ok());
    }

    #[test]
    fn test_get_unknown_session() {
        let registry = SessionRegistry::new(HOUR, 10);
        let id = Uuid::new_v4();
        assert!(matches!(registry.get(id), Err(ChatError::SessionNotFound(x)) if x == id));
    }

    #[test]
    fn test_remove() {
        let registry = SessionRegistry::new(HOUR, 10);
        let (id, _) = registry.open(None, Language::English);
        assert!(registry.remove(id).is_ok());
        assert!(registry.is_empty());
        assert!(matches!(registry.remove(id), Err(ChatError::SessionNotFound(_))));
    }

    #[test]
    fn test_zero_timeout_expires_immediately() {
        let registry = SessionRegistry::new(Duration::ZERO, 10);
        let (id, _) = registry.open(None, Language::English);
        assert!(registry.get(id).is_err());
        assert!(registry.is_empty());

        let (first, _) = registry.open(None, Language::English);
        let (second, _) = registry.open(Some(first), Language::English);
        assert_ne!(first, second);
    }

    #[test]
    fn test_purge_expired() {
        let registry = SessionRegistry::new(Duration::ZERO, 10);
        registry.open(None, Language::English);
        registry.open(None, Language::German);
        assert_eq!(registry.purge_expired(), 2);
        assert_eq!(registry.purge_expired(), 0);

        let live = SessionRegistry::new(HOUR, 10);
        live.open(None, Language::English);
        assert_eq!(live.purge_expired(), 0);
        assert_eq!(live.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let registry = SessionRegistry::new(HOUR, 2);
        let (first, _) = registry.open(None, Language::English);
        std::thread::sleep(Duration::from_millis(5));
        let (second, _) = registry.open(None, Language::English);
        std::thread::sleep(Duration::from_millis(5));
        // Touch the first so the second becomes the oldest.
        registry.get(first).unwrap();
        std::thread::sleep(Duration::from_millis(5));

        let (third, _) = registry.open(None, Language::English);
        assert_eq!(registry.len(), 2);
        assert!(registry.get(first).is_ok());
        assert!(registry.get(third).is_ok());
        assert!(registry.get(second).is_err());
    }

    #[test]
    fn test_from_config() {
        let config = SessionConfig {
            max_sessions: 1,
            ..SessionConfig::default()
        };
        let registry = SessionRegistry::from_config(&config);
        registry.open(None, Language::English);
        registry.open(None, Language::English);
        assert_eq!(registry.len(), 1);
    }
}
