//! Client-local cart persistence.
//!
//! The cart lives under a single storage key, [`CART_KEY`], as a JSON array of
//! lines. Storage is a port: [`CartStorage`] returns `Result`s and leaves the
//! decision of what a failure means to the [`CartStore`](crate::CartStore).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use woolery_core::Cart;

/// The single key the cart is stored under.
pub const CART_KEY: &str = "cart";

/// Errors raised by a [`CartStorage`] backend.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Reading or writing the backing file failed.
    #[error("cart storage I/O failed for {path}: {source}")]
    Io {
        /// File that could not be accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The stored value could not be decoded as a cart.
    #[error("stored cart is corrupt: {0}")]
    Corrupt(String),

    /// The cart could not be encoded.
    #[error("cart could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    /// The backend refuses writes (e.g. quota exceeded).
    #[error("cart storage unavailable: {0}")]
    Unavailable(String),
}

impl PersistenceError {
    /// Returns `true` if the stored data was unreadable rather than the
    /// storage itself failing.
    #[must_use]
    pub const fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt(_))
    }
}

/// Durable storage for a single serialized cart.
pub trait CartStorage: Send {
    /// Load the stored cart, `Ok(None)` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or holds a corrupt value.
    fn load(&self) -> Result<Option<Cart>, PersistenceError>;

    /// Replace the stored cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be written.
    fn save(&self, cart: &Cart) -> Result<(), PersistenceError>;

    /// Remove the stored cart. Removing an absent cart succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored value exists but cannot be removed.
    fn remove(&self) -> Result<(), PersistenceError>;
}

fn decode(raw: &str) -> Result<Cart, PersistenceError> {
    serde_json::from_str(raw).map_err(|e| PersistenceError::Corrupt(e.to_string()))
}

// =============================================================================
// FileStorage
// =============================================================================

/// Stores the cart as `<dir>/cart.json`.
///
/// Writes go to a temporary file that is renamed over the old one, so a crash
/// mid-write never leaves a truncated cart behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Create file storage inside `dir`. The directory is created on first
    /// write.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{CART_KEY}.json")),
        }
    }

    /// Path of the cart file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CartStorage for FileStorage {
    fn load(&self) -> Result<Option<Cart>, PersistenceError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => decode(&raw).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, cart: &Cart) -> Result<(), PersistenceError> {
        let encoded = serde_json::to_string(cart)?;

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, encoded).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }

    fn remove(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-memory storage for session-only carts and tests.
///
/// Clones share the same slot, so a test can keep a handle after giving the
/// storage to a store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemorySlot>>,
}

#[derive(Debug, Default)]
struct MemorySlot {
    value: Option<String>,
    fail_writes: bool,
    removals: usize,
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage pre-filled with a raw stored value.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        let storage = Self::default();
        storage.slot().value = Some(raw.into());
        storage
    }

    /// Make every subsequent write fail, simulating exhausted storage.
    pub fn fail_writes(&self, fail: bool) {
        self.slot().fail_writes = fail;
    }

    /// The raw stored value, if any.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.slot().value.clone()
    }

    /// How many times the stored cart has been removed.
    #[must_use]
    pub fn removals(&self) -> usize {
        self.slot().removals
    }

    fn slot(&self) -> MutexGuard<'_, MemorySlot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Cart>, PersistenceError> {
        self.slot().value.as_deref().map(decode).transpose()
    }

    fn save(&self, cart: &Cart) -> Result<(), PersistenceError> {
        let encoded = serde_json::to_string(cart)?;
        let mut slot = self.slot();
        if slot.fail_writes {
            return Err(PersistenceError::Unavailable("quota exceeded".to_string()));
        }
        slot.value = Some(encoded);
        Ok(())
    }

    fn remove(&self) -> Result<(), PersistenceError> {
        let mut slot = self.slot();
        if slot.fail_writes {
            return Err(PersistenceError::Unavailable("quota exceeded".to_string()));
        }
        slot.value = None;
        slot.removals += 1;
        Ok(())
    }
}
