// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed processor parameters.

use crate::error::PropertyError;
use crate::invalidation::InvalidationLevel;
use crate::processor::ProcessorId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag of a property value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PropertyType {
    /// Boolean
    Bool,
    /// 32-bit integer
    Int,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
    /// 2D integer vector
    IVec2,
    /// 2D vector
    Vec2,
    /// 3D vector
    Vec3,
    /// 4D vector / color
    Vec4,
    /// String value
    String,
}

impl PropertyType {
    /// Get all property types
    pub fn all() -> &'static [PropertyType] {
        &[
            PropertyType::Bool,
            PropertyType::Int,
            PropertyType::Float,
            PropertyType::Double,
            PropertyType::IVec2,
            PropertyType::Vec2,
            PropertyType::Vec3,
            PropertyType::Vec4,
            PropertyType::String,
        ]
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Value held by a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i32),
    /// Float
    Float(f32),
    /// Double
    Double(f64),
    /// 2D integer vector
    IVec2([i32; 2]),
    /// 2D vector
    Vec2([f32; 2]),
    /// 3D vector
    Vec3([f32; 3]),
    /// 4D vector / color
    Vec4([f32; 4]),
    /// String
    String(String),
}

impl PropertyValue {
    /// Get the type tag for this value
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::Bool(_) => PropertyType::Bool,
            Self::Int(_) => PropertyType::Int,
            Self::Float(_) => PropertyType::Float,
            Self::Double(_) => PropertyType::Double,
            Self::IVec2(_) => PropertyType::IVec2,
            Self::Vec2(_) => PropertyType::Vec2,
            Self::Vec3(_) => PropertyType::Vec3,
            Self::Vec4(_) => PropertyType::Vec4,
            Self::String(_) => PropertyType::String,
        }
    }

    /// Whether every floating-point component is finite
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Float(v) => v.is_finite(),
            Self::Double(v) => v.is_finite(),
            Self::Vec2(v) => v.iter().all(|c| c.is_finite()),
            Self::Vec3(v) => v.iter().all(|c| c.is_finite()),
            Self::Vec4(v) => v.iter().all(|c| c.is_finite()),
            Self::Bool(_) | Self::Int(_) | Self::IVec2(_) | Self::String(_) => true,
        }
    }

    /// Clamp numeric components into `range`; other values are returned unchanged
    pub fn clamped(self, range: &PropertyRange) -> Self {
        match self {
            Self::Int(v) => Self::Int(range.clamp(f64::from(v)) as i32),
            Self::Float(v) => Self::Float(range.clamp(f64::from(v)) as f32),
            Self::Double(v) => Self::Double(range.clamp(v)),
            Self::IVec2(v) => Self::IVec2(v.map(|c| range.clamp(f64::from(c)) as i32)),
            Self::Vec2(v) => Self::Vec2(v.map(|c| range.clamp(f64::from(c)) as f32)),
            Self::Vec3(v) => Self::Vec3(v.map(|c| range.clamp(f64::from(c)) as f32)),
            Self::Vec4(v) => Self::Vec4(v.map(|c| range.clamp(f64::from(c)) as f32)),
            other @ (Self::Bool(_) | Self::String(_)) => other,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::IVec2([x, y]) => write!(f, "({x}, {y})"),
            Self::Vec2([x, y]) => write!(f, "({x}, {y})"),
            Self::Vec3([x, y, z]) => write!(f, "({x}, {y}, {z})"),
            Self::Vec4([x, y, z, w]) => write!(f, "({x}, {y}, {z}, {w})"),
            Self::String(v) => f.write_str(v),
        }
    }
}

/// Inclusive numeric range applied component-wise on write
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertyRange {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

impl PropertyRange {
    /// Create a new range. Bounds are swapped if given in the wrong order; a
    /// NaN bound leaves that side open.
    pub fn new(min: f64, max: f64) -> Self {
        let min = if min.is_nan() { f64::NEG_INFINITY } else { min };
        let max = if max.is_nan() { f64::INFINITY } else { max };
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    // Fields are public and deserializable, so bounds may arrive inverted or NaN
    fn clamp(&self, v: f64) -> f64 {
        let (lo, hi) = if self.min > self.max {
            (self.max, self.min)
        } else {
            (self.min, self.max)
        };
        v.max(lo).min(hi)
    }
}

/// A named, typed parameter owned by a processor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    /// Identifier, unique within the owning processor
    pub identifier: String,
    /// Display name
    pub display_name: String,
    value: PropertyValue,
    /// Level the owning processor is raised to when this property changes
    pub invalidation_level: InvalidationLevel,
    /// Optional numeric range
    pub range: Option<PropertyRange>,
}

impl Property {
    /// Create a new property. Its type is fixed by the initial value.
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        value: PropertyValue,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            value,
            invalidation_level: InvalidationLevel::InvalidOutput,
            range: None,
        }
    }

    /// Clamp writes into `[min, max]`
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        let range = PropertyRange::new(min, max);
        self.value = self.value.clamped(&range);
        self.range = Some(range);
        self
    }

    /// Set the level a change of this property raises its processor to
    pub fn with_invalidation_level(mut self, level: InvalidationLevel) -> Self {
        self.invalidation_level = level;
        self
    }

    /// Type tag of this property
    pub fn property_type(&self) -> PropertyType {
        self.value.property_type()
    }

    /// Current value
    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    /// Write a new value.
    ///
    /// Returns `Ok(true)` if the stored value changed. NaN and infinite
    /// components are rejected. The caller is responsible for invalidating the
    /// owning processor.
    pub fn set_value(&mut self, value: PropertyValue) -> Result<bool, PropertyError> {
        if value.property_type() != self.property_type() {
            return Err(PropertyError::TypeMismatch {
                expected: self.property_type(),
                got: value.property_type(),
            });
        }
        if !value.is_finite() {
            return Err(PropertyError::NonFinite(value.property_type()));
        }

        let value = match &self.range {
            Some(range) => value.clamped(range),
            None => value,
        };

        if value == self.value {
            return Ok(false);
        }
        self.value = value;
        Ok(true)
    }
}

/// Handle to a property: owning processor plus property identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyRef {
    /// Owning processor
    pub processor: ProcessorId,
    /// Property identifier within the processor
    pub identifier: String,
}

impl PropertyRef {
    /// Create a new property handle
    pub fn new(processor: ProcessorId, identifier: impl Into<String>) -> Self {
        Self {
            processor,
            identifier: identifier.into(),
        }
    }
}

impl fmt::Display for PropertyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.processor, self.identifier)
    }
}
