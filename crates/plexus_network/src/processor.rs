// SPDX-License-Identifier: MIT OR Apache-2.0
//! Processor definitions for the network.

use crate::invalidation::InvalidationLevel;
use crate::port::{Port, PortDirection, PortRef};
use crate::property::{Property, PropertyRef};
use crate::registry::{ClassIdentifier, Prototype};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a processor instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessorId(pub Uuid);

impl ProcessorId {
    /// Create a new random processor ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProcessorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProcessorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Processor category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessorCategory {
    /// Data sources (readers, generators)
    Source,
    /// Data transformations
    Filter,
    /// Rendering into images
    Render,
    /// Final consumers (canvases, writers)
    Sink,
    /// Utility processors
    Utility,
}

/// Processor type definition, used as the registry prototype
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorTemplate {
    /// Class identifier
    pub class_identifier: ClassIdentifier,
    /// Display name, also the default instance identifier
    pub display_name: String,
    /// Category
    pub category: ProcessorCategory,
    /// Description
    pub description: String,
    /// Ports of every instance
    pub ports: Vec<Port>,
    /// Properties of every instance, with their default values
    pub properties: Vec<Property>,
}

impl ProcessorTemplate {
    /// Create a template with no ports or properties
    pub fn new(
        class_identifier: impl Into<ClassIdentifier>,
        display_name: impl Into<String>,
        category: ProcessorCategory,
    ) -> Self {
        Self {
            class_identifier: class_identifier.into(),
            display_name: display_name.into(),
            category,
            description: String::new(),
            ports: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a port
    pub fn with_port(mut self, port: Port) -> Self {
        self.ports.push(port);
        self
    }

    /// Add a property
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }
}

impl Prototype<Processor> for ProcessorTemplate {
    fn class_identifier(&self) -> &ClassIdentifier {
        &self.class_identifier
    }

    fn instantiate(&self) -> Processor {
        Processor::new(self)
    }
}

/// A processor instance: the node of the network
#[derive(Debug, Clone)]
pub struct Processor {
    /// Unique instance ID
    pub id: ProcessorId,
    /// Instance name, unique within a network
    pub identifier: String,
    /// Class the processor was created from
    pub class_identifier: ClassIdentifier,
    /// Display name of the class
    pub display_name: String,
    ports: Vec<Port>,
    properties: IndexMap<String, Property>,
    invalidation: InvalidationLevel,
}

impl Processor {
    /// Create a new processor from a template.
    ///
    /// Ports or properties whose identifier repeats an earlier one are
    /// dropped with a warning, keeping identifiers unique per processor.
    pub fn new(template: &ProcessorTemplate) -> Self {
        let mut ports: Vec<Port> = Vec::with_capacity(template.ports.len());
        for port in &template.ports {
            if ports.iter().any(|p| p.identifier == port.identifier) {
                tracing::warn!(
                    "Duplicate port '{}' in '{}' ignored",
                    port.identifier,
                    template.class_identifier
                );
                continue;
            }
            ports.push(port.clone());
        }

        let mut properties = IndexMap::with_capacity(template.properties.len());
        for property in &template.properties {
            if properties.contains_key(&property.identifier) {
                tracing::warn!(
                    "Duplicate property '{}' in '{}' ignored",
                    property.identifier,
                    template.class_identifier
                );
                continue;
            }
            properties.insert(property.identifier.clone(), property.clone());
        }

        Self {
            id: ProcessorId::new(),
            identifier: template.display_name.clone(),
            class_identifier: template.class_identifier.clone(),
            display_name: template.display_name.clone(),
            ports,
            properties,
            invalidation: InvalidationLevel::Valid,
        }
    }

    /// Get a port by identifier
    pub fn port(&self, identifier: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.identifier == identifier)
    }

    /// Get all ports
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter()
    }

    /// Get the inports
    pub fn inports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.direction == PortDirection::Inport)
    }

    /// Get the outports
    pub fn outports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.direction == PortDirection::Outport)
    }

    /// Handle to one of this processor's ports
    pub fn port_ref(&self, identifier: impl Into<String>) -> PortRef {
        PortRef::new(self.id, identifier)
    }

    /// Get a property by identifier
    pub fn property(&self, identifier: &str) -> Option<&Property> {
        self.properties.get(identifier)
    }

    pub(crate) fn property_mut(&mut self, identifier: &str) -> Option<&mut Property> {
        self.properties.get_mut(identifier)
    }

    pub(crate) fn replace_property(&mut self, property: Property) -> Option<Property> {
        self.properties.insert(property.identifier.clone(), property)
    }

    /// Get all properties
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    /// Handle to one of this processor's properties
    pub fn property_ref(&self, identifier: impl Into<String>) -> PropertyRef {
        PropertyRef::new(self.id, identifier)
    }

    /// Current invalidation level
    pub fn invalidation_level(&self) -> InvalidationLevel {
        self.invalidation
    }

    /// Whether the processor needs recomputation
    pub fn is_valid(&self) -> bool {
        self.invalidation == InvalidationLevel::Valid
    }

    /// Raise the invalidation level. Returns `true` if it increased.
    pub(crate) fn raise_invalidation(&mut self, level: InvalidationLevel) -> bool {
        if self.invalidation >= level {
            return false;
        }
        self.invalidation = level;
        true
    }

    pub(crate) fn reset_invalidation(&mut self) {
        self.invalidation = InvalidationLevel::Valid;
    }
}
