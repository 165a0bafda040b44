// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process-wide registries.
//!
//! A [`Runtime`] is filled during start-up and then shared read-only as
//! `Arc<Runtime>` by every [`Network`](crate::network::Network) that uses it.
//! Once wrapped in the `Arc` nothing can register into it any more.

use crate::capability::CapabilityRegistry;
use crate::converter::ConverterRegistry;
use crate::error::RegistryError;
use crate::persist::{self, NetworkCodec};
use crate::processor::{Processor, ProcessorTemplate};
use crate::processors;
use crate::registry::Registry;
use std::path::Path;
use std::sync::Arc;

/// Codec registry keyed by file path
pub type CodecRegistry = CapabilityRegistry<Path, Box<dyn NetworkCodec>>;

/// Registries consulted by the network
#[derive(Debug, Default)]
pub struct Runtime {
    processors: Registry<Processor>,
    converters: ConverterRegistry,
    codecs: CodecRegistry,
}

impl Runtime {
    /// Create a runtime with empty registries.
    ///
    /// Identity and widening conversions are always available.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runtime with every built-in processor, converter and codec
    pub fn init() -> Self {
        let mut runtime = Self::new();
        processors::register_builtin_processors(&mut runtime.processors);
        crate::converter::register_builtin_converters(&mut runtime.converters);
        persist::register_builtin_codecs(&mut runtime.codecs);
        tracing::info!(
            "Runtime initialised with {} processor types, {} converters, {} codecs",
            runtime.processors.len(),
            runtime.converters.len(),
            runtime.codecs.len()
        );
        runtime
    }

    /// Release every registration
    pub fn shutdown(&mut self) {
        self.processors.clear();
        self.converters.clear();
        self.codecs.clear();
        tracing::info!("Runtime shut down");
    }

    /// Freeze the runtime for sharing between networks
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Register a processor type
    pub fn register_processor(&mut self, template: ProcessorTemplate) -> Result<(), RegistryError> {
        self.processors.register_entry(Arc::new(template))
    }

    /// Create a processor from its class identifier
    pub fn create_processor(&self, class_identifier: &str) -> Option<Processor> {
        self.processors.create(class_identifier)
    }

    /// Whether a processor class identifier is registered
    pub fn is_valid_type(&self, class_identifier: &str) -> bool {
        self.processors.is_valid_type(class_identifier)
    }

    /// Processor registry
    pub fn processors(&self) -> &Registry<Processor> {
        &self.processors
    }

    /// Mutable processor registry
    pub fn processors_mut(&mut self) -> &mut Registry<Processor> {
        &mut self.processors
    }

    /// Converter registry
    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// Mutable converter registry
    pub fn converters_mut(&mut self) -> &mut ConverterRegistry {
        &mut self.converters
    }

    /// Network file codecs
    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    /// Mutable network file codecs
    pub fn codecs_mut(&mut self) -> &mut CodecRegistry {
        &mut self.codecs
    }
}
