//! Typed key/value output shared between the steps of a chain.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use tracing::debug;

use crate::error::MissingOutputError;

type Value = Arc<dyn Any + Send + Sync>;

/// Process-wide output used by every chain that opts into process scope.
///
/// Lives for the whole process and is never reset mid-run.
static PROCESS_OUTPUT: LazyLock<Arc<ChainOutput>> = LazyLock::new(|| Arc::new(ChainOutput::new()));

#[derive(Clone)]
struct Entry {
    value: Value,
    type_name: &'static str,
    rendered: Option<String>,
}

/// Thread-safe store of step outputs keyed by caller-chosen strings.
///
/// Writes are unconditional upserts: a second writer using the same key
/// replaces the first one without any collision check. In process scope the
/// keys must therefore be unique across every participating chain.
///
/// # Example
///
/// ```
/// use testchain::context::ChainOutput;
///
/// let output = ChainOutput::new();
/// output.set("Sleep", 1000u64);
///
/// assert_eq!(output.get::<u64>("Sleep").unwrap(), 1000);
/// assert!(output.get::<u64>("Missing").is_err());
/// ```
#[derive(Default)]
pub struct ChainOutput {
    entries: RwLock<HashMap<String, Entry>>,
}

impl ChainOutput {
    /// Create an empty, chain-scoped store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-scoped store shared by all chains that opt in.
    pub fn process() -> Arc<ChainOutput> {
        Arc::clone(&PROCESS_OUTPUT)
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.insert(key.into(), Arc::new(value), type_name::<T>(), None);
    }

    /// Store `value` under `key` and remember its display form for
    /// [`get_string`](Self::get_string).
    pub fn set_display<T: Any + Send + Sync + fmt::Display>(&self, key: impl Into<String>, value: T) {
        let rendered = value.to_string();
        self.insert(key.into(), Arc::new(value), type_name::<T>(), Some(rendered));
    }

    fn insert(&self, key: String, value: Value, type_name: &'static str, rendered: Option<String>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = Entry {
            value,
            type_name,
            rendered,
        };
        if entries.insert(key.clone(), entry).is_some() {
            debug!("Output '{}' overwritten", key);
        }
    }

    /// Get a shared handle to the value stored under `key`.
    pub fn get_arc<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>, MissingOutputError> {
        let value = self
            .lookup(key)
            .ok_or_else(|| MissingOutputError::absent(key))?
            .value;
        value
            .downcast::<T>()
            .map_err(|_| MissingOutputError::type_mismatch(key, type_name::<T>()))
    }

    /// Get a copy of the value stored under `key`.
    ///
    /// Fails with [`MissingOutputError`] when the key is absent or the stored
    /// value is not a `T`. There is no implicit default.
    pub fn get<T: Any + Send + Sync + Clone>(&self, key: &str) -> Result<T, MissingOutputError> {
        self.get_arc::<T>(key).map(|value| (*value).clone())
    }

    /// Non-failing variant of [`get`](Self::get).
    pub fn try_get<T: Any + Send + Sync + Clone>(&self, key: &str) -> Option<T> {
        self.get(key).ok()
    }

    /// Get the stored value as a string.
    ///
    /// Works for `String` and `&'static str` values and for anything stored
    /// with [`set_display`](Self::set_display).
    pub fn get_string(&self, key: &str) -> Result<String, MissingOutputError> {
        let entry = self.lookup(key).ok_or_else(|| MissingOutputError::absent(key))?;
        if let Some(rendered) = entry.rendered {
            return Ok(rendered);
        }
        if let Some(s) = entry.value.downcast_ref::<String>() {
            return Ok(s.clone());
        }
        if let Some(s) = entry.value.downcast_ref::<&'static str>() {
            return Ok((*s).to_string());
        }
        Err(MissingOutputError::type_mismatch(key, "displayable value"))
    }

    /// Check whether a value exists under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Name of the type stored under `key`, if any.
    pub fn type_name_of(&self, key: &str) -> Option<&'static str> {
        self.lookup(key).map(|entry| entry.type_name)
    }

    /// All keys currently stored, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Check if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str) -> Option<Entry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl fmt::Debug for ChainOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainOutput").field("keys", &self.keys()).finish()
    }
}
