//! Scope guard that closes a driver session however a run ends.

use std::ops::{Deref, DerefMut};

use crate::ports::DriverSession;

/// Owns an open session and calls [`DriverSession::close`] on drop.
pub struct SessionGuard {
    session: Box<dyn DriverSession>,
}

impl SessionGuard {
    /// Takes ownership of `session`.
    #[must_use]
    pub fn new(session: Box<dyn DriverSession>) -> Self {
        Self { session }
    }
}

impl Deref for SessionGuard {
    type Target = dyn DriverSession;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref()
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session.as_mut()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.close();
    }
}
