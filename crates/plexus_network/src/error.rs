// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for network operations.

use crate::port::{DataType, PortRef};
use crate::processor::ProcessorId;
use crate::property::{PropertyRef, PropertyType};
use crate::registry::ClassIdentifier;

/// Error when registering into a registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Class identifier already registered; the first registration is kept
    #[error("Class identifier already registered: {0}")]
    DuplicateRegistration(ClassIdentifier),

    /// Converter for this type pair already registered
    #[error("Converter already registered: {from} -> {to}")]
    DuplicateConverter {
        /// Source type
        from: PropertyType,
        /// Destination type
        to: PropertyType,
    },
}

/// Error when connecting two ports
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// Processor not found
    #[error("Processor not found: {0}")]
    ProcessorNotFound(ProcessorId),

    /// Port not found
    #[error("Port not found: {0}")]
    PortNotFound(PortRef),

    /// Both ports have the same direction
    #[error("Cannot connect two ports of the same direction")]
    SameDirection,

    /// Both ports belong to the same processor
    #[error("Cannot connect a processor to itself")]
    SelfConnection,

    /// Data types are neither identical nor convertible
    #[error("Incompatible port types: {outport} cannot feed {inport}")]
    IncompatibleTypes {
        /// Data type produced by the outport
        outport: DataType,
        /// Data type accepted by the inport
        inport: DataType,
    },

    /// The inport already has a producer, or the edge already exists
    #[error("Port already connected: {0}")]
    AlreadyConnected(PortRef),
}

/// Error when creating or evaluating a property link
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Property not found
    #[error("Property not found: {0}")]
    PropertyNotFound(PropertyRef),

    /// Source and destination are the same property
    #[error("Cannot link a property to itself")]
    SameProperty,

    /// A link between these properties already exists
    #[error("Link already exists: {0} -> {1}")]
    AlreadyLinked(PropertyRef, PropertyRef),

    /// No converter exists for the type pair
    #[error("No converter from {from} to {to}")]
    NoConverter {
        /// Source type
        from: PropertyType,
        /// Destination type
        to: PropertyType,
    },
}

/// Error when writing a property
#[derive(Debug, thiserror::Error)]
pub enum PropertyError {
    /// Property not found
    #[error("Property not found: {0}")]
    PropertyNotFound(PropertyRef),

    /// Value type does not match the property type
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Type of the property
        expected: PropertyType,
        /// Type of the rejected value
        got: PropertyType,
    },

    /// Value has a NaN or infinite component
    #[error("Non-finite {0} value rejected")]
    NonFinite(PropertyType),
}

/// Error when saving or loading a network
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// File I/O failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// RON serialization failed
    #[error("RON serialization error: {0}")]
    RonEncode(#[from] ron::Error),

    /// RON parsing failed
    #[error("RON parse error: {0}")]
    RonDecode(#[from] ron::error::SpannedError),

    /// JSON serialization or parsing failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Format cannot represent a NaN or infinite property value
    #[error("Cannot encode non-finite value of '{processor}.{property}'")]
    NonFiniteValue {
        /// Owning processor
        processor: String,
        /// Property identifier
        property: String,
    },

    /// No codec handles this path
    #[error("Unsupported network file format: {0}")]
    UnsupportedFormat(String),

    /// Document was written by a newer format version
    #[error("Unsupported network format version {found} (latest supported is {supported})")]
    UnsupportedVersion {
        /// Version in the document
        found: u32,
        /// Latest version this build reads
        supported: u32,
    },
}

/// Error when the data-flow graph contains a cycle
#[derive(Debug, thiserror::Error)]
#[error("Network contains a cycle")]
pub struct CycleError;
