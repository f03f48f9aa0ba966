use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::domain::models::message::ConversationId;

/// CsvConnection manages file paths and ensures CSV files exist.
///
/// ```text
/// data/
/// ├── donations.csv
/// ├── ignored.csv
/// └── conversations/
///     └── {encoded conversation id}.csv
/// ```
///
/// Clones share one write lock, so every repository created from the same
/// connection serializes its read-modify-write cycles.
#[derive(Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl CsvConnection {
    /// Create a new CSV connection with a base directory
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
            info!("Created data directory: {}", base_path.display());
        }

        Ok(Self {
            base_directory: base_path,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn donations_file_path(&self) -> PathBuf {
        self.base_directory.join("donations.csv")
    }

    pub fn ignored_file_path(&self) -> PathBuf {
        self.base_directory.join("ignored.csv")
    }

    pub fn conversations_directory(&self) -> PathBuf {
        self.base_directory.join("conversations")
    }

    /// File holding one conversation's messages.
    ///
    /// ASCII letters, digits and `-` are kept; every other byte becomes
    /// `_xx` (lowercase hex), so distinct ids never share a file.
    pub fn conversation_file_path(&self, conversation: &ConversationId) -> PathBuf {
        let mut stem = String::new();
        for byte in conversation.as_str().bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                stem.push(byte as char);
            } else {
                stem.push_str(&format!("_{:02x}", byte));
            }
        }
        self.conversations_directory().join(format!("{}.csv", stem))
    }

    /// Ensure a CSV file exists with the given header line
    pub fn ensure_file_exists(&self, path: &Path, header: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        if !path.exists() {
            fs::write(path, format!("{}\n", header))?;
            debug!("Created CSV file: {:?}", path);
        }
        Ok(())
    }

    /// Hold this for the whole of any check-then-write sequence
    pub fn lock_writes(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| anyhow!("CSV write lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_base_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path().join("nested").join("data");
        let connection = CsvConnection::new(&base).expect("Failed to create connection");
        assert!(base.exists());
        assert_eq!(connection.donations_file_path(), base.join("donations.csv"));
    }

    #[test]
    fn test_conversation_file_names_are_distinct() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let connection = CsvConnection::new(temp_dir.path()).unwrap();
        let a = connection.conversation_file_path(&ConversationId::from_raw("a:b"));
        let b = connection.conversation_file_path(&ConversationId::from_raw("a_b"));
        assert_ne!(a, b);
        assert_eq!(
            connection
                .conversation_file_path(&ConversationId::from_raw("thread::donation::x1"))
                .file_name()
                .unwrap(),
            "thread_3a_3adonation_3a_3ax1.csv"
        );
    }

    #[test]
    fn test_ensure_file_exists_writes_header_once() {
        let temp_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(temp_dir.path()).unwrap();
        let path = connection.conversations_directory().join("c.csv");
        connection.ensure_file_exists(&path, "a,b").unwrap();
        fs::write(&path, "a,b\n1,2\n").unwrap();
        connection.ensure_file_exists(&path, "a,b").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b\n1,2\n");
    }
}
