use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::domain::repository::{StorageError, TodoRepository};
use crate::infrastructure::{
    json_file_repo::JsonFileTodoRepository, sqlite_repo::SqliteTodoRepository, AnyTodoRepository,
};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://todos.db";
pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PLEASE_DO_ADDR `{0}`: {1}")]
    Addr(String, std::net::AddrParseError),
    #[error("unsupported DATABASE_URL `{0}`; expected sqlite://, sqlite::memory:, file:// or a .json path")]
    Storage(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Sqlite(String),
    JsonFile(PathBuf),
}

impl StorageConfig {
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        if url.starts_with("sqlite:") {
            Ok(StorageConfig::Sqlite(url.to_string()))
        } else if let Some(path) = url.strip_prefix("file://") {
            Ok(StorageConfig::JsonFile(PathBuf::from(path)))
        } else if url.ends_with(".json") {
            Ok(StorageConfig::JsonFile(PathBuf::from(url)))
        } else {
            Err(ConfigError::Storage(url.to_string()))
        }
    }

    /// Opens and initialises the configured repository.
    pub async fn open(&self) -> Result<AnyTodoRepository, StorageError> {
        let repo = match self {
            StorageConfig::Sqlite(url) => {
                prepare_sqlite_file(url)?;
                AnyTodoRepository::Sqlite(SqliteTodoRepository::connect(url).await?)
            }
            StorageConfig::JsonFile(path) => AnyTodoRepository::JsonFile(JsonFileTodoRepository::new(path)),
        };
        repo.init().await?;
        Ok(repo)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub addr: SocketAddr,
}

impl Config {
    /// Reads `DATABASE_URL` and `PLEASE_DO_ADDR`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let addr = std::env::var("PLEASE_DO_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
        Self::from_values(&database_url, &addr)
    }

    pub fn from_values(database_url: &str, addr: &str) -> Result<Self, ConfigError> {
        let storage = StorageConfig::parse(database_url)?;
        let addr = addr.parse().map_err(|e| ConfigError::Addr(addr.to_string(), e))?;
        Ok(Self { storage, addr })
    }
}

/// Makes sure a file-backed SQLite URL points at an existing file.
pub fn prepare_sqlite_file(database_url: &str) -> std::io::Result<()> {
    if database_url.starts_with("sqlite::memory:") { return Ok(()); }
    let Some(path) = database_url.strip_prefix("sqlite://") else { return Ok(()) };
    let path = path.split('?').next().unwrap_or(path);
    // Windows absolute paths arrive as /C:/path
    let path = if cfg!(windows) && path.len() >= 3 && path.as_bytes()[0] == b'/' && path.as_bytes()[2] == b':' {
        &path[1..]
    } else {
        path
    };
    let p = Path::new(path);
    if let Some(parent) = p.parent() {
        if !parent.as_os_str().is_empty() { std::fs::create_dir_all(parent)?; }
    }
    if !p.exists() {
        std::fs::OpenOptions::new().create(true).append(true).open(p)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_storage_from_url() {
        assert_eq!(StorageConfig::parse("sqlite::memory:").unwrap(), StorageConfig::Sqlite("sqlite::memory:".into()));
        assert_eq!(StorageConfig::parse("sqlite://data/todos.db").unwrap(), StorageConfig::Sqlite("sqlite://data/todos.db".into()));
        assert_eq!(StorageConfig::parse("file:///tmp/todos").unwrap(), StorageConfig::JsonFile("/tmp/todos".into()));
        assert_eq!(StorageConfig::parse("todos.json").unwrap(), StorageConfig::JsonFile("todos.json".into()));
        assert!(matches!(StorageConfig::parse("postgres://x"), Err(ConfigError::Storage(_))));
    }

    #[test]
    fn rejects_bad_address() {
        assert!(matches!(Config::from_values("sqlite::memory:", "localhost"), Err(ConfigError::Addr(..))));
        let config = Config::from_values(DEFAULT_DATABASE_URL, DEFAULT_ADDR).unwrap();
        assert_eq!(config.addr.port(), 3000);
    }

    #[test]
    fn creates_sqlite_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("todos.db");
        prepare_sqlite_file(&format!("sqlite://{}", db.display())).unwrap();
        assert!(db.exists());
        prepare_sqlite_file("sqlite::memory:").unwrap();
    }

    #[tokio::test]
    async fn opens_configured_repository() {
        let dir = tempfile::tempdir().unwrap();
        let json = StorageConfig::JsonFile(dir.path().join("todos.json")).open().await.unwrap();
        assert!(matches!(json, AnyTodoRepository::JsonFile(_)));
        let sqlite = StorageConfig::Sqlite("sqlite::memory:".into()).open().await.unwrap();
        assert!(sqlite.load().await.unwrap().is_empty());
    }
}
