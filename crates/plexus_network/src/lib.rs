// SPDX-License-Identifier: MIT OR Apache-2.0
//! Processor network runtime for Plexus.
//!
//! This crate provides the model behind a node-based visualization pipeline:
//! - Processors instantiated by class identifier from a [`Registry`]
//! - Typed ports joined by data-flow connections
//! - Properties joined by value links, with cross-type converters
//! - Invalidation propagation deciding what must be recomputed
//! - Persistence through pluggable file codecs
//!
//! ## Architecture
//!
//! A [`Runtime`] holds the process-wide registries. It is filled during
//! start-up and then shared read-only by every [`Network`]. A network owns its
//! processors; connections and links refer to ports and properties by handle
//! ([`PortRef`], [`PropertyRef`]) and are dropped together with the processor
//! they refer to.

pub mod capability;
pub mod connection;
pub mod converter;
pub mod error;
pub mod invalidation;
pub mod link;
pub mod network;
pub mod persist;
pub mod port;
pub mod processor;
pub mod processors;
pub mod property;
pub mod registry;
pub mod runtime;

pub use capability::{Capability, CapabilityRegistry};
pub use connection::{Connection, ConnectionId};
pub use converter::{Converter, ConverterRegistry, MatchTier};
pub use error::{ConnectError, CycleError, LinkError, PersistError, PropertyError, RegistryError};
pub use invalidation::InvalidationLevel;
pub use link::{LinkEvaluator, LinkId, PropertyLink};
pub use network::Network;
pub use persist::{LoadReport, LoadWarning, NetworkDocument};
pub use port::{DataType, Port, PortDirection, PortRef};
pub use processor::{Processor, ProcessorCategory, ProcessorId, ProcessorTemplate};
pub use property::{Property, PropertyRef, PropertyType, PropertyValue};
pub use registry::{ClassIdentifier, Prototype, Registry};
pub use runtime::Runtime;
