//! In-memory session storage for testing.

use std::io;
use std::sync::RwLock;

use crate::core::AtomisationSession;
use crate::error::{QuarryError, Result};
use crate::storage::SessionStore;

/// In-memory session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<AtomisationSession>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> QuarryError {
        QuarryError::storage("<memory>", io::Error::other("session lock poisoned"))
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<AtomisationSession>> {
        let session = self.session.read().map_err(|_| Self::poisoned())?;
        Ok(session.clone())
    }

    fn save(&self, session: &AtomisationSession) -> Result<()> {
        let mut slot = self.session.write().map_err(|_| Self::poisoned())?;
        *slot = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut slot = self.session.write().map_err(|_| Self::poisoned())?;
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::tests::test_session_store_roundtrip;
    use std::sync::Arc;

    #[test]
    fn test_memory_store_roundtrip() {
        test_session_store_roundtrip(&MemorySessionStore::new());
    }

    #[test]
    fn test_arc_store_roundtrip() {
        test_session_store_roundtrip(&Arc::new(MemorySessionStore::new()));
    }
}
