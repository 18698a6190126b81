//! Session storage trait for Quarry.
//!
//! Only one atomisation session is live at a time, so a store holds at most
//! one session.

use std::sync::Arc;

use crate::core::{AtomisationSession, Atomiser};
use crate::error::Result;

/// Trait for session storage backends.
pub trait SessionStore: Send + Sync {
    /// Load the stored session. `Ok(None)` when there is none.
    fn load(&self) -> Result<Option<AtomisationSession>>;

    /// Store `session`, replacing any previous one.
    fn save(&self, session: &AtomisationSession) -> Result<()>;

    /// Remove the stored session. Succeeds when there is none.
    fn clear(&self) -> Result<()>;

    /// Check if a session is stored.
    fn exists(&self) -> Result<bool> {
        Ok(self.load()?.is_some())
    }

    /// Load the stored session into an [`Atomiser`].
    fn load_atomiser(&self) -> Result<Atomiser> {
        Ok(Atomiser::from_session(self.load()?))
    }

    /// Persist an atomiser's state: save its session, or clear the store
    /// when it has none.
    fn persist(&self, atomiser: &Atomiser) -> Result<()> {
        match atomiser.session() {
            Some(session) => self.save(session),
            None => self.clear(),
        }
    }
}

/// Blanket implementation of SessionStore for Arc-wrapped stores.
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn load(&self) -> Result<Option<AtomisationSession>> {
        (**self).load()
    }

    fn save(&self, session: &AtomisationSession) -> Result<()> {
        (**self).save(session)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}
