//! Typed output keys bound to an owner identity.

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::output::ChainOutput;
use crate::error::MissingOutputError;

/// A reproducible output key of the form `owner` or `owner_suffix`, bound to
/// the value type `T`.
///
/// Producers and consumers build the same key from the same owner instead of
/// repeating string literals.
///
/// # Example
///
/// ```
/// use testchain::context::{ChainOutput, OutputKey};
///
/// struct Collection01;
///
/// let output = ChainOutput::new();
/// let id = OutputKey::<u128>::for_owner::<Collection01>(Some("SharedId"));
/// assert_eq!(id.key(), "Collection01_SharedId");
///
/// id.put(&output, 42);
/// assert_eq!(id.get(&output).unwrap(), 42);
/// ```
pub struct OutputKey<T> {
    key: String,
    _value: PhantomData<fn() -> T>,
}

impl<T> OutputKey<T> {
    /// Build a key from an explicit owner name and optional suffix.
    pub fn new(owner: &str, suffix: Option<&str>) -> Self {
        let key = match suffix {
            Some(suffix) => format!("{}_{}", owner, suffix),
            None => owner.to_string(),
        };
        Self {
            key,
            _value: PhantomData,
        }
    }

    /// Build a key whose owner is the short name of type `O`.
    pub fn for_owner<O: ?Sized>(suffix: Option<&str>) -> Self {
        Self::new(short_type_name::<O>(), suffix)
    }

    /// The composed key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Check whether the output holds a value under this key.
    pub fn contains(&self, output: &ChainOutput) -> bool {
        output.contains_key(&self.key)
    }
}

impl<T: Any + Send + Sync + Clone> OutputKey<T> {
    /// Read the value, failing with [`MissingOutputError`] when absent.
    pub fn get(&self, output: &ChainOutput) -> Result<T, MissingOutputError> {
        output.get(&self.key)
    }

    /// Read the value if present and of type `T`.
    pub fn try_get(&self, output: &ChainOutput) -> Option<T> {
        output.try_get(&self.key)
    }

    /// Store the value under this key.
    pub fn put(&self, output: &ChainOutput, value: T) {
        output.set(self.key.clone(), value);
    }

    /// Read a shared handle to the value.
    pub fn get_arc(&self, output: &ChainOutput) -> Result<Arc<T>, MissingOutputError> {
        output.get_arc(&self.key)
    }
}

impl<T> Clone for OutputKey<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            _value: PhantomData,
        }
    }
}

impl<T> fmt::Debug for OutputKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputKey")
            .field("key", &self.key)
            .field("type", &type_name::<T>())
            .finish()
    }
}

impl<T> fmt::Display for OutputKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Last path segment of a type name, without generic arguments.
pub(crate) fn short_type_name<O: ?Sized>() -> &'static str {
    let full = type_name::<O>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
