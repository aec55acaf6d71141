//! File-backed keychain counters.
//!
//! Each gateway gets one plain-text file, named after the gateway, holding the decimal value of the next keychain id.
//! Allocations hold an exclusive OS lock on a companion `.lock` file for the whole read-modify-write, so allocators
//! in different processes, or several allocators on the same directory, never hand out the same id. Tasks in this
//! process first queue on an in-process lock, so only one blocking thread per gateway waits on the file lock.
//! Every new value is written to a temporary file that is then renamed over the counter. A reader therefore sees
//! either the old or the new value, never a partial write.
use std::{
    collections::HashMap,
    env,
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use fs4::fs_std::FileExt;
use log::*;
use tempfile::NamedTempFile;
use tokio::sync::Mutex as AsyncMutex;

use crate::{
    db_types::Gateway,
    traits::{KeychainAllocator, KeychainError},
};

const KEYCHAIN_DIR_ENV: &str = "MPG_KEYCHAIN_DIR";
const DEFAULT_KEYCHAIN_DIR: &str = ".merchant_gateway/keychain";
const COUNTER_FILE_SUFFIX: &str = "_last_keychain_id";
const LOCK_FILE_SUFFIX: &str = ".lock";

#[derive(Clone, Debug)]
pub struct FileKeychainAllocator {
    dir: PathBuf,
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl FileKeychainAllocator {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into(), locks: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Uses `MPG_KEYCHAIN_DIR` if it is set, otherwise `~/.merchant_gateway/keychain`.
    pub fn from_env_or_default() -> Self {
        let dir = env::var(KEYCHAIN_DIR_ENV).map(PathBuf::from).unwrap_or_else(|_| {
            let home = dirs::home_dir().unwrap_or_else(|| {
                warn!("🔑️ Could not determine the home directory. Keychain counters will live in the working directory");
                PathBuf::from(".")
            });
            home.join(DEFAULT_KEYCHAIN_DIR)
        });
        info!("🔑️ Keychain counters are stored in {}", dir.display());
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        self.dir.as_path()
    }

    /// The counter file for the gateway called `name`.
    pub fn counter_path(&self, name: &str) -> Result<PathBuf, KeychainError> {
        let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid || name.starts_with('.') {
            return Err(KeychainError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}{COUNTER_FILE_SUFFIX}")))
    }

    fn lock_for(&self, name: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(name.to_string()).or_default())
    }

    /// The lock file that guards the counter of the gateway called `name`.
    pub fn lock_path(&self, name: &str) -> Result<PathBuf, KeychainError> {
        let mut path = self.counter_path(name)?.into_os_string();
        path.push(LOCK_FILE_SUFFIX);
        Ok(PathBuf::from(path))
    }

    async fn read_counter(&self, name: &str) -> Result<i64, KeychainError> {
        let path = self.counter_path(name)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => parse_counter(name, &contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!("🔑️ No counter file for {name} yet. Starting at zero");
                Ok(0)
            },
            Err(e) => Err(io_error(name, e)),
        }
    }

    /// Reads the counter, writes back its successor and returns the value read, all while holding an exclusive OS
    /// lock on the gateway's lock file. Other allocators, in this process or any other, wait on the same lock.
    async fn increment_counter(&self, name: &str) -> Result<i64, KeychainError> {
        let counter = self.counter_path(name)?;
        let lock = self.lock_path(name)?;
        let dir = self.dir.clone();
        let owned_name = name.to_string();
        tokio::task::spawn_blocking(move || {
            fs::create_dir_all(&dir).map_err(|e| io_error(&owned_name, e))?;
            let lock_file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&lock)
                .map_err(|e| io_error(&owned_name, e))?;
            lock_file.lock_exclusive().map_err(|e| io_error(&owned_name, e))?;
            let current = match fs::read_to_string(&counter) {
                Ok(contents) => parse_counter(&owned_name, &contents)?,
                Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
                Err(e) => return Err(io_error(&owned_name, e)),
            };
            write_counter(&dir, &counter, current + 1).map_err(|e| io_error(&owned_name, e))?;
            // Closing the lock file releases the lock.
            drop(lock_file);
            Ok(current)
        })
        .await
        .map_err(|e| KeychainError::IoError { name: name.to_string(), reason: e.to_string() })?
    }
}

fn parse_counter(name: &str, contents: &str) -> Result<i64, KeychainError> {
    let value = contents.trim();
    match value.parse::<i64>() {
        Ok(v) if v >= 0 => Ok(v),
        _ => Err(KeychainError::CorruptCounter { name: name.to_string(), value: value.to_string() }),
    }
}

fn write_counter(dir: &Path, path: &Path, value: i64) -> io::Result<()> {
    let mut file = NamedTempFile::new_in(dir)?;
    write!(file, "{value}")?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn io_error(name: &str, e: io::Error) -> KeychainError {
    KeychainError::IoError { name: name.to_string(), reason: e.to_string() }
}

impl KeychainAllocator for FileKeychainAllocator {
    async fn current_id(&self, gateway: &Gateway) -> Result<i64, KeychainError> {
        self.read_counter(&gateway.name).await
    }

    async fn next_id(&self, gateway: &Gateway) -> Result<i64, KeychainError> {
        let lock = self.lock_for(&gateway.name);
        let _guard = lock.lock().await;
        let current = self.increment_counter(&gateway.name).await?;
        debug!("🔑️ Keychain id {current} allocated for gateway {}", gateway.name);
        Ok(current)
    }
}
