// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property links and their evaluation.

use crate::converter::ConverterRegistry;
use crate::processor::ProcessorId;
use crate::property::{Property, PropertyRef};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a property link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub Uuid);

impl LinkId {
    /// Create a new random link ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

/// Directional value-propagation edge between two properties.
///
/// A bidirectional link is two of these, one per direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyLink {
    /// Unique link ID
    pub id: LinkId,
    /// Property whose changes are pushed
    pub source: PropertyRef,
    /// Property receiving converted values
    pub destination: PropertyRef,
}

impl PropertyLink {
    /// Create a new link
    pub fn new(source: PropertyRef, destination: PropertyRef) -> Self {
        Self {
            id: LinkId::new(),
            source,
            destination,
        }
    }

    /// Check if either end belongs to a specific processor
    pub fn involves_processor(&self, processor: ProcessorId) -> bool {
        self.source.processor == processor || self.destination.processor == processor
    }
}

/// Applies converters across links
#[derive(Debug, Clone, Copy)]
pub struct LinkEvaluator<'a> {
    converters: &'a ConverterRegistry,
}

impl<'a> LinkEvaluator<'a> {
    /// Create an evaluator over a converter registry
    pub fn new(converters: &'a ConverterRegistry) -> Self {
        Self { converters }
    }

    /// Whether `src` can be linked into `dst`
    pub fn can_link(&self, src: &Property, dst: &Property) -> bool {
        self.converters.can_convert(src.property_type(), dst.property_type())
    }

    /// Push the value of `src` into `dst`.
    ///
    /// Returns `true` if `dst` changed. Without a converter for the type pair,
    /// or when the converter cannot represent the current value, `dst` is left
    /// untouched.
    pub fn evaluate(&self, src: &Property, dst: &mut Property) -> bool {
        let (from, to) = (src.property_type(), dst.property_type());
        let Some(converter) = self.converters.find(from, to) else {
            tracing::debug!("No converter {from} -> {to}, skipping link into '{}'", dst.identifier);
            return false;
        };

        let Some(value) = converter.convert(src.value()) else {
            tracing::debug!(
                "Value of '{}' not representable as {to}, skipping link",
                src.identifier
            );
            return false;
        };

        match dst.set_value(value) {
            Ok(changed) => changed,
            Err(e) => {
                tracing::warn!(
                    "Converted {from} -> {to} value not written to '{}': {e}",
                    dst.identifier
                );
                false
            }
        }
    }
}
