// SPDX-License-Identifier: MIT OR Apache-2.0
//! Network persistence.
//!
//! A [`Network`] is saved as a [`NetworkDocument`]: processors by class
//! identifier and instance identifier, property values, and connections and
//! links addressed by `processor identifier + port/property identifier`.
//! Loading tolerates partial failure: anything that cannot be restored is
//! skipped and reported in a [`LoadReport`], and the rest of the network is
//! built regardless.
//!
//! The file format is picked by a codec from the runtime's
//! [`CodecRegistry`], matched on the file extension.

use crate::capability::Capability;
use crate::error::PersistError;
use crate::network::Network;
use crate::port::PortRef;
use crate::processor::ProcessorId;
use crate::property::{PropertyRef, PropertyValue};
use crate::registry::ClassIdentifier;
use crate::runtime::{CodecRegistry, Runtime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Current network format version
pub const NETWORK_FORMAT_VERSION: u32 = 1;

/// Serialized form of a network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDocument {
    /// Format version
    pub version: u32,
    /// Processors, in insertion order
    #[serde(default)]
    pub processors: Vec<ProcessorRecord>,
    /// Data-flow connections
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
    /// Property links
    #[serde(default)]
    pub links: Vec<LinkRecord>,
}

impl Default for NetworkDocument {
    fn default() -> Self {
        Self {
            version: NETWORK_FORMAT_VERSION,
            processors: Vec::new(),
            connections: Vec::new(),
            links: Vec::new(),
        }
    }
}

impl NetworkDocument {
    fn first_non_finite(&self) -> Option<(&ProcessorRecord, &PropertyRecord)> {
        self.processors.iter().find_map(|processor| {
            processor
                .properties
                .iter()
                .find(|p| !p.value.is_finite())
                .map(|property| (processor, property))
        })
    }
}

/// A saved processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorRecord {
    /// Class identifier used to re-create the processor
    #[serde(rename = "type")]
    pub class_identifier: ClassIdentifier,
    /// Instance identifier, unique within the network
    pub identifier: String,
    /// Saved property values
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
}

/// A saved property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    /// Property identifier
    pub identifier: String,
    /// Value at save time
    pub value: PropertyValue,
}

/// A port or property addressed by processor instance identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRecord {
    /// Instance identifier of the owning processor
    pub processor: String,
    /// Port or property identifier
    pub identifier: String,
}

impl fmt::Display for EndpointRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.processor, self.identifier)
    }
}

/// A saved connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Producing port
    pub outport: EndpointRecord,
    /// Consuming port
    pub inport: EndpointRecord,
}

/// A saved directional link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Source property
    pub source: EndpointRecord,
    /// Destination property
    pub destination: EndpointRecord,
}

/// Something that could not be restored while loading
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadWarning {
    /// Class identifier not registered in the runtime
    #[error("Unknown processor type '{class_identifier}' for '{identifier}', skipped")]
    UnknownType {
        /// Missing class identifier
        class_identifier: ClassIdentifier,
        /// Instance identifier of the skipped processor
        identifier: String,
    },

    /// Instance identifier already used earlier in the document
    #[error("Duplicate processor identifier '{from}', loaded as '{to}'")]
    Renamed {
        /// Identifier in the document
        from: String,
        /// Identifier assigned on load
        to: String,
    },

    /// Processor type has no such property any more
    #[error("Unknown property '{property}' on '{processor}', value dropped")]
    UnknownProperty {
        /// Owning processor
        processor: String,
        /// Missing property
        property: String,
    },

    /// Saved value could not be written
    #[error("Cannot restore '{processor}.{property}': {reason}")]
    PropertyValue {
        /// Owning processor
        processor: String,
        /// Property identifier
        property: String,
        /// Why the write failed
        reason: String,
    },

    /// Connection could not be re-created
    #[error("Cannot restore connection {outport} -> {inport}: {reason}")]
    Connection {
        /// Producing port
        outport: EndpointRecord,
        /// Consuming port
        inport: EndpointRecord,
        /// Why the connection failed
        reason: String,
    },

    /// Link could not be re-created
    #[error("Cannot restore link {from} -> {to}: {reason}")]
    Link {
        /// Source property
        from: EndpointRecord,
        /// Destination property
        to: EndpointRecord,
        /// Why the link failed
        reason: String,
    },
}

/// Outcome of loading a network
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Problems encountered, in document order
    pub warnings: Vec<LoadWarning>,
}

impl LoadReport {
    /// Whether everything in the document was restored
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn push(&mut self, warning: LoadWarning) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }
}

// ============================================================================
// Codecs
// ============================================================================

/// Text encoding of a [`NetworkDocument`]
pub trait NetworkCodec {
    /// Codec name
    fn name(&self) -> &str;

    /// Encode a document
    fn encode(&self, document: &NetworkDocument) -> Result<String, PersistError>;

    /// Decode a document
    fn decode(&self, text: &str) -> Result<NetworkDocument, PersistError>;
}

/// RON network files
#[derive(Debug, Default, Clone, Copy)]
pub struct RonCodec;

impl NetworkCodec for RonCodec {
    fn name(&self) -> &str {
        "ron"
    }

    fn encode(&self, document: &NetworkDocument) -> Result<String, PersistError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(document, config)?)
    }

    fn decode(&self, text: &str) -> Result<NetworkDocument, PersistError> {
        Ok(ron::from_str(text)?)
    }
}

/// JSON network files
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl NetworkCodec for JsonCodec {
    fn name(&self) -> &str {
        "json"
    }

    /// JSON has no NaN or infinity, so such values fail the save instead of
    /// being written as `null`.
    fn encode(&self, document: &NetworkDocument) -> Result<String, PersistError> {
        if let Some((processor, property)) = document.first_non_finite() {
            return Err(PersistError::NonFiniteValue {
                processor: processor.identifier.clone(),
                property: property.identifier.clone(),
            });
        }
        Ok(serde_json::to_string_pretty(document)?)
    }

    fn decode(&self, text: &str) -> Result<NetworkDocument, PersistError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Selects a codec by file extension
struct ExtensionCodec {
    name: &'static str,
    extensions: &'static [&'static str],
    make: fn() -> Box<dyn NetworkCodec>,
}

impl Capability<Path> for ExtensionCodec {
    type Output = Box<dyn NetworkCodec>;

    fn name(&self) -> &str {
        self.name
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    fn create(&self, _path: &Path) -> Self::Output {
        (self.make)()
    }
}

/// Register the RON (`.ron`, `.plexus`) and JSON (`.json`) codecs
pub fn register_builtin_codecs(registry: &mut CodecRegistry) {
    registry.register_entry(Arc::new(ExtensionCodec {
        name: "ron",
        extensions: &["ron", "plexus"],
        make: || Box::new(RonCodec),
    }));
    registry.register_entry(Arc::new(ExtensionCodec {
        name: "json",
        extensions: &["json"],
        make: || Box::new(JsonCodec),
    }));
}

// ============================================================================
// Network <-> document
// ============================================================================

impl Network {
    /// Snapshot the network as a document
    pub fn to_document(&self) -> NetworkDocument {
        let names: HashMap<ProcessorId, &str> = self
            .processors()
            .map(|p| (p.id, p.identifier.as_str()))
            .collect();
        let endpoint = |processor: ProcessorId, identifier: &str| {
            names.get(&processor).map(|name| EndpointRecord {
                processor: (*name).to_string(),
                identifier: identifier.to_string(),
            })
        };

        let processors = self
            .processors()
            .map(|p| ProcessorRecord {
                class_identifier: p.class_identifier.clone(),
                identifier: p.identifier.clone(),
                properties: p
                    .properties()
                    .map(|prop| PropertyRecord {
                        identifier: prop.identifier.clone(),
                        value: prop.value().clone(),
                    })
                    .collect(),
            })
            .collect();

        let connections = self
            .connections()
            .filter_map(|c| {
                Some(ConnectionRecord {
                    outport: endpoint(c.outport.processor, &c.outport.identifier)?,
                    inport: endpoint(c.inport.processor, &c.inport.identifier)?,
                })
            })
            .collect();

        let links = self
            .links()
            .filter_map(|l| {
                Some(LinkRecord {
                    source: endpoint(l.source.processor, &l.source.identifier)?,
                    destination: endpoint(l.destination.processor, &l.destination.identifier)?,
                })
            })
            .collect();

        NetworkDocument {
            version: NETWORK_FORMAT_VERSION,
            processors,
            connections,
            links,
        }
    }

    /// Rebuild a network from a document.
    ///
    /// Only a document from a newer format version is an error. Processors of
    /// unknown type are skipped together with every connection and link that
    /// refers to them; each skipped item is recorded in the report.
    pub fn from_document(
        runtime: Arc<Runtime>,
        document: &NetworkDocument,
    ) -> Result<(Self, LoadReport), PersistError> {
        if document.version > NETWORK_FORMAT_VERSION {
            return Err(PersistError::UnsupportedVersion {
                found: document.version,
                supported: NETWORK_FORMAT_VERSION,
            });
        }

        let mut network = Network::new(runtime);
        let mut report = LoadReport::default();
        let mut ids: HashMap<&str, ProcessorId> = HashMap::new();

        for record in &document.processors {
            let Some(mut processor) = network
                .runtime()
                .create_processor(record.class_identifier.as_str())
            else {
                report.push(LoadWarning::UnknownType {
                    class_identifier: record.class_identifier.clone(),
                    identifier: record.identifier.clone(),
                });
                continue;
            };

            processor.identifier = record.identifier.clone();
            for saved in &record.properties {
                let Some(property) = processor.property_mut(&saved.identifier) else {
                    report.push(LoadWarning::UnknownProperty {
                        processor: record.identifier.clone(),
                        property: saved.identifier.clone(),
                    });
                    continue;
                };
                if let Err(e) = property.set_value(saved.value.clone()) {
                    report.push(LoadWarning::PropertyValue {
                        processor: record.identifier.clone(),
                        property: saved.identifier.clone(),
                        reason: e.to_string(),
                    });
                }
            }

            let id = network.add_processor(processor);
            if let Some(assigned) = network.processor(id).map(|p| &p.identifier) {
                if assigned != &record.identifier {
                    report.push(LoadWarning::Renamed {
                        from: record.identifier.clone(),
                        to: assigned.clone(),
                    });
                }
            }
            // References resolve to the first processor with an identifier
            ids.entry(record.identifier.as_str()).or_insert(id);
        }

        for record in &document.connections {
            let resolved = ids
                .get(record.outport.processor.as_str())
                .zip(ids.get(record.inport.processor.as_str()));
            let result = match resolved {
                Some((&out, &inp)) => network
                    .connect(
                        &PortRef::new(out, record.outport.identifier.clone()),
                        &PortRef::new(inp, record.inport.identifier.clone()),
                    )
                    .map(|_| ())
                    .map_err(|e| e.to_string()),
                None => Err("processor was not loaded".to_string()),
            };
            if let Err(reason) = result {
                report.push(LoadWarning::Connection {
                    outport: record.outport.clone(),
                    inport: record.inport.clone(),
                    reason,
                });
            }
        }

        for record in &document.links {
            let resolved = ids
                .get(record.source.processor.as_str())
                .zip(ids.get(record.destination.processor.as_str()));
            let result = match resolved {
                Some((&src, &dst)) => network
                    .create_link(
                        &PropertyRef::new(src, record.source.identifier.clone()),
                        &PropertyRef::new(dst, record.destination.identifier.clone()),
                    )
                    .map(|_| ())
                    .map_err(|e| e.to_string()),
                None => Err("processor was not loaded".to_string()),
            };
            if let Err(reason) = result {
                report.push(LoadWarning::Link {
                    from: record.source.clone(),
                    to: record.destination.clone(),
                    reason,
                });
            }
        }

        tracing::info!(
            "Loaded network: {} processors, {} connections, {} links, {} warnings",
            network.processor_count(),
            network.connection_count(),
            network.link_count(),
            report.warnings.len()
        );
        Ok((network, report))
    }

    /// Save to a file; the format is chosen by extension
    pub fn save_to_path(&self, path: &Path) -> Result<(), PersistError> {
        let codec = codec_for(self.runtime(), path)?;
        let text = codec.encode(&self.to_document())?;
        std::fs::write(path, text)?;
        tracing::info!("Saved network to {} ({})", path.display(), codec.name());
        Ok(())
    }

    /// Load from a file; the format is chosen by extension
    pub fn load_from_path(
        runtime: Arc<Runtime>,
        path: &Path,
    ) -> Result<(Self, LoadReport), PersistError> {
        let codec = codec_for(&runtime, path)?;
        let text = std::fs::read_to_string(path)?;
        let document = codec.decode(&text)?;
        tracing::debug!("Read {} ({})", path.display(), codec.name());
        Self::from_document(runtime, &document)
    }
}

fn codec_for(runtime: &Runtime, path: &Path) -> Result<Box<dyn NetworkCodec>, PersistError> {
    runtime
        .codecs()
        .create(path)
        .ok_or_else(|| PersistError::UnsupportedFormat(path.display().to_string()))
}
