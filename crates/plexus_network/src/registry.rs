// SPDX-License-Identifier: MIT OR Apache-2.0
//! Generic factory keyed by class identifier.
//!
//! A [`Registry`] maps a stable [`ClassIdentifier`] to a prototype able to
//! produce fresh instances. Processors are created this way, and so can any
//! other pluggable kind (readers, writers, dialogs) that needs to be
//! instantiated from a string, e.g. while loading a persisted network.

use crate::error::RegistryError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Globally unique name of a concrete type; the persistence key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassIdentifier(String);

impl ClassIdentifier {
    /// Create a class identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassIdentifier {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ClassIdentifier {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::borrow::Borrow<str> for ClassIdentifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Something that can stamp out new instances of `T`
pub trait Prototype<T>: Send + Sync {
    /// Class identifier the instances are registered under
    fn class_identifier(&self) -> &ClassIdentifier;

    /// Produce a fresh instance
    fn instantiate(&self) -> T;
}

/// Closure-backed prototype
struct FnPrototype<F> {
    class_identifier: ClassIdentifier,
    make: F,
}

impl<T, F> Prototype<T> for FnPrototype<F>
where
    F: Fn() -> T + Send + Sync,
{
    fn class_identifier(&self) -> &ClassIdentifier {
        &self.class_identifier
    }

    fn instantiate(&self) -> T {
        (self.make)()
    }
}

/// Registry of prototypes keyed by class identifier.
///
/// Registration order is preserved so type pickers list entries the way they
/// were registered.
pub struct Registry<T> {
    entries: IndexMap<ClassIdentifier, Arc<dyn Prototype<T>>>,
}

impl<T: 'static> Registry<T> {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Register a prototype.
    ///
    /// A second registration under an identifier that is already present is
    /// rejected and the first registration is kept.
    pub fn register_entry(
        &mut self,
        prototype: Arc<dyn Prototype<T>>,
    ) -> Result<(), RegistryError> {
        let id = prototype.class_identifier().clone();
        if self.entries.contains_key(&id) {
            tracing::warn!(
                "Class identifier '{id}' is already registered, keeping the first registration"
            );
            return Err(RegistryError::DuplicateRegistration(id));
        }

        tracing::debug!("Registered '{id}'");
        self.entries.insert(id, prototype);
        Ok(())
    }

    /// Register a closure producing instances of `T`
    pub fn register_fn<F>(
        &mut self,
        class_identifier: impl Into<ClassIdentifier>,
        make: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register_entry(Arc::new(FnPrototype {
            class_identifier: class_identifier.into(),
            make,
        }))
    }

    /// Create a new instance, or `None` if the identifier is unknown
    pub fn create(&self, class_identifier: &str) -> Option<T> {
        self.entries.get(class_identifier).map(|p| p.instantiate())
    }

    /// Check whether an identifier is registered, without instantiating
    pub fn is_valid_type(&self, class_identifier: &str) -> bool {
        self.entries.contains_key(class_identifier)
    }

    /// Iterate registered identifiers in registration order
    pub fn class_identifiers(&self) -> impl Iterator<Item = &ClassIdentifier> {
        self.entries.keys()
    }

    /// Remove a registration
    pub fn unregister(&mut self, class_identifier: &str) -> Option<Arc<dyn Prototype<T>>> {
        self.entries.shift_remove(class_identifier)
    }

    /// Release every prototype
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of registered identifiers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: 'static> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
