use parking_lot::RwLock;
use std::sync::Arc;

/// Caller access token shared by the gateway and the execution trigger.
///
/// Cloning shares the same cell, so a sign-in or sign-out is seen by every
/// holder on its next request.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    token: Arc<RwLock<Option<String>>>,
}

impl Credentials {
    pub fn new(token: Option<String>) -> Self {
        let credentials = Self::default();
        if let Some(token) = token {
            credentials.set(token);
        }
        credentials
    }

    /// Blank tokens are treated as signed out.
    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        let token = (!token.trim().is_empty()).then_some(token);
        *self.token.write() = token;
    }

    pub fn clear(&self) {
        *self.token.write() = None;
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }
}
