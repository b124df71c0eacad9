use std::sync::Arc;

use super::sources::CredentialSource;

/// Decides whether an authenticated fetch is permitted right now.
///
/// Holds no state of its own; every call consults the credential source.
#[derive(Clone)]
pub struct CredentialGate {
    source: Arc<dyn CredentialSource>,
}

impl CredentialGate {
    pub fn new(source: Arc<dyn CredentialSource>) -> Self {
        Self { source }
    }

    pub fn is_authorized(&self) -> bool {
        self.source.token().is_some()
    }

    /// Token to attach as `Authorization: Bearer <token>`, if any.
    pub fn bearer(&self) -> Option<String> {
        self.source.token()
    }
}

impl std::fmt::Debug for CredentialGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialGate")
            .field("authorized", &self.is_authorized())
            .finish()
    }
}
