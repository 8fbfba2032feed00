use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use larder_api::TokenStore;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{path}: {source}")]
pub struct TokenFileError {
    path: PathBuf,
    #[source]
    source: std::io::Error,
}

/// Keeps the bearer token in a single file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, source: std::io::Error) -> TokenFileError {
        TokenFileError {
            path: self.path.clone(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    type Error = TokenFileError;

    fn load(&self) -> Result<Option<String>, Self::Error> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.error(e)),
        }
    }

    fn save(&self, token: &str) -> Result<(), Self::Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }
        std::fs::write(&self.path, token).map_err(|e| self.error(e))?;
        restrict_permissions(&self.path).map_err(|e| self.error(e))
    }

    fn clear(&self) -> Result<(), Self::Error> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.error(e)),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("larder")
}

pub fn default_token_path() -> PathBuf {
    default_data_dir().join("token")
}
