// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cross-type property value conversion.
//!
//! Converters are keyed by an ordered pair of [`PropertyType`] tags. Lookup
//! resolves in three tiers, most specific first:
//!
//! 1. [`MatchTier::Identity`]: source and destination share a type.
//! 2. [`MatchTier::Exact`]: a converter registered for exactly this pair.
//! 3. [`MatchTier::Compatible`]: a built-in lossless widening
//!    (`Bool -> Int`, `Int -> Float`, `Int -> Double`, `Float -> Double`,
//!    `IVec2 -> Vec2`).
//!
//! An exact registration therefore always overrides the widening tier.

use crate::error::RegistryError;
use crate::property::{PropertyType, PropertyValue};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Pure mapping from one property value to a value of another type.
///
/// Returns `None` when the particular value cannot be represented (e.g. a
/// string that does not parse as a number).
pub trait Converter: Send + Sync {
    /// Convert `value`
    fn convert(&self, value: &PropertyValue) -> Option<PropertyValue>;
}

impl<F> Converter for F
where
    F: Fn(&PropertyValue) -> Option<PropertyValue> + Send + Sync,
{
    fn convert(&self, value: &PropertyValue) -> Option<PropertyValue> {
        self(value)
    }
}

/// How a converter was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchTier {
    /// Same type on both sides
    Identity,
    /// Registered for this exact pair
    Exact,
    /// Derived widening conversion
    Compatible,
}

/// Result of a converter lookup
#[derive(Clone)]
pub struct ConverterMatch {
    /// Tier the converter was found in
    pub tier: MatchTier,
    converter: Arc<dyn Converter>,
}

impl ConverterMatch {
    /// Apply the converter
    pub fn convert(&self, value: &PropertyValue) -> Option<PropertyValue> {
        self.converter.convert(value)
    }
}

impl fmt::Debug for ConverterMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterMatch").field("tier", &self.tier).finish()
    }
}

/// Registry of converters keyed by ordered type pair
pub struct ConverterRegistry {
    exact: IndexMap<(PropertyType, PropertyType), Arc<dyn Converter>>,
    identity: Arc<dyn Converter>,
}

impl ConverterRegistry {
    /// Create a registry with only the identity and widening tiers
    pub fn new() -> Self {
        Self {
            exact: IndexMap::new(),
            identity: Arc::new(|v: &PropertyValue| Some(v.clone())),
        }
    }

    /// Create a registry with the built-in converters registered
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        register_builtin_converters(&mut registry);
        registry
    }

    /// Register a converter for an exact type pair.
    ///
    /// The first registration for a pair wins. Same-type pairs always resolve
    /// to the identity tier, so registering one has no effect on lookups.
    pub fn register(
        &mut self,
        from: PropertyType,
        to: PropertyType,
        converter: impl Converter + 'static,
    ) -> Result<(), RegistryError> {
        if self.exact.contains_key(&(from, to)) {
            tracing::warn!(
                "Converter {from} -> {to} is already registered, keeping the first registration"
            );
            return Err(RegistryError::DuplicateConverter { from, to });
        }
        if from == to {
            tracing::debug!("Converter {from} -> {to} is shadowed by the identity tier");
        }
        self.exact.insert((from, to), Arc::new(converter));
        Ok(())
    }

    /// Resolve a converter for `from -> to`
    pub fn find(&self, from: PropertyType, to: PropertyType) -> Option<ConverterMatch> {
        if from == to {
            return Some(ConverterMatch {
                tier: MatchTier::Identity,
                converter: Arc::clone(&self.identity),
            });
        }

        if let Some(converter) = self.exact.get(&(from, to)) {
            return Some(ConverterMatch {
                tier: MatchTier::Exact,
                converter: Arc::clone(converter),
            });
        }

        widening(from, to).map(|converter| ConverterMatch {
            tier: MatchTier::Compatible,
            converter,
        })
    }

    /// Whether values of type `from` can be linked into type `to`
    pub fn can_convert(&self, from: PropertyType, to: PropertyType) -> bool {
        self.find(from, to).is_some()
    }

    /// Number of exact registrations
    pub fn len(&self) -> usize {
        self.exact.len()
    }

    /// Returns `true` if no exact converters are registered
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    /// Drop every exact registration
    pub fn clear(&mut self) {
        self.exact.clear();
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("exact", &self.exact.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Lossless widening conversions
fn widening(from: PropertyType, to: PropertyType) -> Option<Arc<dyn Converter>> {
    use PropertyType as T;
    use PropertyValue as V;

    let converter: Arc<dyn Converter> = match (from, to) {
        (T::Bool, T::Int) => Arc::new(|v: &V| match v {
            V::Bool(b) => Some(V::Int(i32::from(*b))),
            _ => None,
        }),
        (T::Int, T::Float) => Arc::new(|v: &V| match v {
            V::Int(i) => Some(V::Float(*i as f32)),
            _ => None,
        }),
        (T::Int, T::Double) => Arc::new(|v: &V| match v {
            V::Int(i) => Some(V::Double(f64::from(*i))),
            _ => None,
        }),
        (T::Float, T::Double) => Arc::new(|v: &V| match v {
            V::Float(x) => Some(V::Double(f64::from(*x))),
            _ => None,
        }),
        (T::IVec2, T::Vec2) => Arc::new(|v: &V| match v {
            V::IVec2(c) => Some(V::Vec2(c.map(|x| x as f32))),
            _ => None,
        }),
        _ => return None,
    };
    Some(converter)
}

/// Register the converters every runtime starts with: numeric narrowing,
/// vector truncation, string formatting and string parsing.
pub fn register_builtin_converters(registry: &mut ConverterRegistry) {
    use PropertyType as T;
    use PropertyValue as V;

    let narrowing: [(T, T, fn(&V) -> Option<V>); 8] = [
        (T::Float, T::Int, |v| match v {
            V::Float(x) => Some(V::Int(x.round() as i32)),
            _ => None,
        }),
        (T::Double, T::Int, |v| match v {
            V::Double(x) => Some(V::Int(x.round() as i32)),
            _ => None,
        }),
        (T::Double, T::Float, |v| match v {
            V::Double(x) => Some(V::Float(*x as f32)),
            _ => None,
        }),
        (T::Int, T::Bool, |v| match v {
            V::Int(i) => Some(V::Bool(*i != 0)),
            _ => None,
        }),
        (T::Vec2, T::IVec2, |v| match v {
            V::Vec2(c) => Some(V::IVec2(c.map(|x| x.round() as i32))),
            _ => None,
        }),
        (T::Vec3, T::Vec2, |v| match v {
            V::Vec3([x, y, _]) => Some(V::Vec2([*x, *y])),
            _ => None,
        }),
        (T::Vec4, T::Vec3, |v| match v {
            V::Vec4([x, y, z, _]) => Some(V::Vec3([*x, *y, *z])),
            _ => None,
        }),
        (T::Vec4, T::Vec2, |v| match v {
            V::Vec4([x, y, _, _]) => Some(V::Vec2([*x, *y])),
            _ => None,
        }),
    ];

    let parsing: [(T, T, fn(&V) -> Option<V>); 3] = [
        (T::String, T::Int, |v| match v {
            V::String(s) => s.trim().parse().ok().map(V::Int),
            _ => None,
        }),
        (T::String, T::Float, |v| match v {
            V::String(s) => s.trim().parse().ok().map(V::Float),
            _ => None,
        }),
        (T::String, T::Double, |v| match v {
            V::String(s) => s.trim().parse().ok().map(V::Double),
            _ => None,
        }),
    ];

    for (from, to, f) in narrowing.into_iter().chain(parsing) {
        // Fresh registry, so duplicates cannot occur
        let _ = registry.register(from, to, f);
    }

    for &from in T::all() {
        if from != T::String {
            let _ = registry.register(from, T::String, |v: &V| Some(V::String(v.to_string())));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_tier() {
        let registry = ConverterRegistry::new();
        let m = registry.find(PropertyType::Vec3, PropertyType::Vec3).unwrap();
        assert_eq!(m.tier, MatchTier::Identity);
        assert_eq!(
            m.convert(&PropertyValue::Vec3([1.0, 2.0, 3.0])),
            Some(PropertyValue::Vec3([1.0, 2.0, 3.0]))
        );
    }

    #[test]
    fn test_widening_tier() {
        let registry = ConverterRegistry::new();
        let m = registry.find(PropertyType::Int, PropertyType::Double).unwrap();
        assert_eq!(m.tier, MatchTier::Compatible);
        assert_eq!(m.convert(&PropertyValue::Int(3)), Some(PropertyValue::Double(3.0)));

        // Widening is one-directional
        assert!(registry.find(PropertyType::Double, PropertyType::Int).is_none());
    }

    #[test]
    fn test_exact_beats_widening() {
        let mut registry = ConverterRegistry::new();
        registry
            .register(PropertyType::Int, PropertyType::Float, |v: &PropertyValue| match v {
                PropertyValue::Int(i) => Some(PropertyValue::Float(*i as f32 * 0.5)),
                _ => None,
            })
            .unwrap();

        let m = registry.find(PropertyType::Int, PropertyType::Float).unwrap();
        assert_eq!(m.tier, MatchTier::Exact);
        assert_eq!(m.convert(&PropertyValue::Int(4)), Some(PropertyValue::Float(2.0)));
    }

    #[test]
    fn test_duplicate_converter_keeps_first() {
        let mut registry = ConverterRegistry::with_builtin();
        let before = registry.len();
        let err = registry
            .register(PropertyType::Float, PropertyType::Int, |_: &PropertyValue| {
                Some(PropertyValue::Int(0))
            })
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateConverter { .. }));
        assert_eq!(registry.len(), before);

        let m = registry.find(PropertyType::Float, PropertyType::Int).unwrap();
        assert_eq!(m.convert(&PropertyValue::Float(2.6)), Some(PropertyValue::Int(3)));
    }

    #[test]
    fn test_builtin_string_conversions() {
        let registry = ConverterRegistry::with_builtin();
        let to_string = registry.find(PropertyType::Vec2, PropertyType::String).unwrap();
        assert_eq!(
            to_string.convert(&PropertyValue::Vec2([1.0, 2.5])),
            Some(PropertyValue::String("(1, 2.5)".to_string()))
        );

        let parse = registry.find(PropertyType::String, PropertyType::Int).unwrap();
        assert_eq!(
            parse.convert(&PropertyValue::String(" 42 ".into())),
            Some(PropertyValue::Int(42))
        );
        assert_eq!(parse.convert(&PropertyValue::String("abc".into())), None);
    }

    #[test]
    fn test_unrelated_types_have_no_converter() {
        let registry = ConverterRegistry::with_builtin();
        assert!(!registry.can_convert(PropertyType::Bool, PropertyType::Vec3));
        assert!(!registry.can_convert(PropertyType::String, PropertyType::Vec4));
    }
}
