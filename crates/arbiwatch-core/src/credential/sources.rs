use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::config::CredentialConfig;

/// A place the bearer token can be read from.
///
/// Implementations must not cache: `token()` is called before every
/// authenticated fetch and must reflect the store's current contents.
pub trait CredentialSource: Send + Sync {
    /// Current token, or `None` when absent or blank.
    fn token(&self) -> Option<String>;
}

fn non_blank(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Reads the token from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialSource for EnvCredential {
    fn token(&self) -> Option<String> {
        std::env::var(&self.var).ok().and_then(non_blank)
    }
}

/// Reads the token from a file. A missing file means no token yet.
#[derive(Debug, Clone)]
pub struct FileCredential {
    path: PathBuf,
}

impl FileCredential {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialSource for FileCredential {
    fn token(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => non_blank(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(
                    event = "core.credential.file_read_failed",
                    path = %self.path.display(),
                    error = %e
                );
                None
            }
        }
    }
}

/// In-memory slot populated by an embedding auth subsystem.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct SharedCredential {
    slot: Arc<RwLock<Option<String>>>,
}

impl SharedCredential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let credential = Self::new();
        credential.set(token);
        credential
    }

    pub fn set(&self, token: impl Into<String>) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(token.into());
    }

    pub fn clear(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}

impl CredentialSource for SharedCredential {
    fn token(&self) -> Option<String> {
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        slot.clone().and_then(non_blank)
    }
}

/// Tries each source in order; the first non-blank token wins.
#[derive(Clone, Default)]
pub struct ChainCredential {
    sources: Vec<Arc<dyn CredentialSource>>,
}

impl ChainCredential {
    pub fn new(sources: Vec<Arc<dyn CredentialSource>>) -> Self {
        Self { sources }
    }

    /// Build the lookup chain described by the `[credential]` config section:
    /// env var first, then the token file when configured.
    pub fn from_config(config: &CredentialConfig) -> Self {
        let mut sources: Vec<Arc<dyn CredentialSource>> =
            vec![Arc::new(EnvCredential::new(config.token_env.clone()))];
        if let Some(path) = &config.token_file {
            sources.push(Arc::new(FileCredential::new(path.clone())));
        }
        Self { sources }
    }
}

impl CredentialSource for ChainCredential {
    fn token(&self) -> Option<String> {
        self.sources.iter().find_map(|source| source.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_credential_set_and_clear() {
        let credential = SharedCredential::new();
        assert_eq!(credential.token(), None);

        credential.set("abc");
        assert_eq!(credential.token(), Some("abc".to_string()));

        credential.clear();
        assert_eq!(credential.token(), None);
    }

    #[test]
    fn test_shared_credential_clones_share_slot() {
        let credential = SharedCredential::new();
        let handle = credential.clone();
        handle.set("late-token");
        assert_eq!(credential.token(), Some("late-token".to_string()));
    }

    #[test]
    fn test_blank_token_is_absent() {
        let credential = SharedCredential::with_token("   \n");
        assert_eq!(credential.token(), None);
    }

    #[test]
    fn test_file_credential_reads_on_every_call() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("token");
        let credential = FileCredential::new(&path);

        assert_eq!(credential.token(), None);

        std::fs::write(&path, "file-token\n").unwrap();
        assert_eq!(credential.token(), Some("file-token".to_string()));

        std::fs::write(&path, "rotated").unwrap();
        assert_eq!(credential.token(), Some("rotated".to_string()));
    }

    #[test]
    fn test_env_credential_missing_var() {
        let credential = EnvCredential::new("ARBIWATCH_TEST_TOKEN_THAT_IS_NEVER_SET");
        assert_eq!(credential.token(), None);
    }

    #[test]
    fn test_chain_first_token_wins() {
        let first = SharedCredential::new();
        let second = SharedCredential::with_token("second");
        let chain = ChainCredential::new(vec![Arc::new(first.clone()), Arc::new(second)]);

        assert_eq!(chain.token(), Some("second".to_string()));

        first.set("first");
        assert_eq!(chain.token(), Some("first".to_string()));
    }

    #[test]
    fn test_chain_from_config_includes_token_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("token");
        std::fs::write(&path, "from-file").unwrap();

        let config = CredentialConfig {
            token_env: "ARBIWATCH_TEST_TOKEN_THAT_IS_NEVER_SET".to_string(),
            token_file: Some(path),
        };
        let chain = ChainCredential::from_config(&config);
        assert_eq!(chain.token(), Some("from-file".to_string()));
    }
}
