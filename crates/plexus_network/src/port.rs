// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for processor inputs/outputs.

use crate::processor::ProcessorId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Consumes data produced upstream
    Inport,
    /// Produces data for downstream processors
    Outport,
}

/// Data type that flows through ports
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 2D image
    Image,
    /// 3D volume
    Volume,
    /// Triangle mesh
    Mesh,
    /// Generic buffer of values
    Buffer,
    /// Single scalar value
    Scalar,
    /// Accepts any data type (inports only)
    Any,
    /// Plugin-defined type, matched by name
    Custom(String),
}

impl DataType {
    /// Check whether data of type `produced` can flow into a port of this type
    pub fn accepts(&self, produced: &DataType) -> bool {
        if self == produced {
            return true;
        }

        matches!((produced, self), (_, Self::Any) | (Self::Scalar, Self::Buffer))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => f.write_str("Image"),
            Self::Volume => f.write_str("Volume"),
            Self::Mesh => f.write_str("Mesh"),
            Self::Buffer => f.write_str("Buffer"),
            Self::Scalar => f.write_str("Scalar"),
            Self::Any => f.write_str("Any"),
            Self::Custom(name) => write!(f, "Custom({name})"),
        }
    }
}

/// A port on a processor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// Identifier, unique within the owning processor
    pub identifier: String,
    /// Port direction
    pub direction: PortDirection,
    /// Data type
    pub data_type: DataType,
    /// Whether more than one connection is allowed
    pub multi_connect: bool,
}

impl Port {
    /// Create a new inport. Inports accept a single producer by default.
    pub fn inport(identifier: impl Into<String>, data_type: DataType) -> Self {
        Self {
            identifier: identifier.into(),
            direction: PortDirection::Inport,
            data_type,
            multi_connect: false,
        }
    }

    /// Create a new outport
    pub fn outport(identifier: impl Into<String>, data_type: DataType) -> Self {
        Self {
            identifier: identifier.into(),
            direction: PortDirection::Outport,
            data_type,
            multi_connect: true, // Outports can feed any number of consumers
        }
    }

    /// Allow this inport to receive data from several producers
    pub fn multi_input(mut self) -> Self {
        self.multi_connect = true;
        self
    }

    /// Whether this is an inport
    pub fn is_inport(&self) -> bool {
        self.direction == PortDirection::Inport
    }

    /// Whether this is an outport
    pub fn is_outport(&self) -> bool {
        self.direction == PortDirection::Outport
    }
}

/// Handle to a port: owning processor plus port identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    /// Owning processor
    pub processor: ProcessorId,
    /// Port identifier within the processor
    pub identifier: String,
}

impl PortRef {
    /// Create a new port handle
    pub fn new(processor: ProcessorId, identifier: impl Into<String>) -> Self {
        Self {
            processor,
            identifier: identifier.into(),
        }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.processor, self.identifier)
    }
}
