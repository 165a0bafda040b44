// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry resolved by capability rather than by key.
//!
//! Several implementations may be able to handle the same subject (a geometry
//! renderer for a mesh, a codec for a file path). [`CapabilityRegistry`] asks
//! each registered implementation in turn and uses the first that matches, so
//! registration order is the tie-break.

use std::fmt;
use std::sync::Arc;

/// An implementation that can handle some subjects of type `S`
pub trait Capability<S: ?Sized>: Send + Sync {
    /// What [`Capability::create`] produces
    type Output;

    /// Name used in logs and debugging output
    fn name(&self) -> &str;

    /// Whether this implementation can handle `subject`
    fn matches(&self, subject: &S) -> bool;

    /// Produce an instance bound to `subject`
    fn create(&self, subject: &S) -> Self::Output;
}

/// Ordered collection of capability implementations
pub struct CapabilityRegistry<S: ?Sized, O> {
    entries: Vec<Arc<dyn Capability<S, Output = O>>>,
}

impl<S: ?Sized + 'static, O: 'static> CapabilityRegistry<S, O> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an implementation. Earlier registrations win ties.
    pub fn register_entry(&mut self, implementation: Arc<dyn Capability<S, Output = O>>) {
        tracing::debug!("Registered capability '{}'", implementation.name());
        self.entries.push(implementation);
    }

    /// First registered implementation matching `subject`
    pub fn first_matching(&self, subject: &S) -> Option<&Arc<dyn Capability<S, Output = O>>> {
        self.entries.iter().find(|e| e.matches(subject))
    }

    /// Every implementation matching `subject`, in registration order
    pub fn all_matching<'a>(
        &'a self,
        subject: &'a S,
    ) -> impl Iterator<Item = &'a Arc<dyn Capability<S, Output = O>>> + 'a {
        self.entries.iter().filter(move |e| e.matches(subject))
    }

    /// Create an instance from the first matching implementation
    pub fn create(&self, subject: &S) -> Option<O> {
        self.first_matching(subject).map(|e| e.create(subject))
    }

    /// Names of registered implementations, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name()).collect()
    }

    /// Number of registered implementations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Release every implementation
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<S: ?Sized + 'static, O: 'static> Default for CapabilityRegistry<S, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized + 'static, O: 'static> fmt::Debug for CapabilityRegistry<S, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("entries", &self.names())
            .finish()
    }
}
