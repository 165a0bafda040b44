// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in processor types.
//!
//! These describe ports and properties only; computing outputs is the job of
//! whatever evaluates the network.

use crate::invalidation::InvalidationLevel;
use crate::port::{DataType, Port};
use crate::processor::{Processor, ProcessorCategory, ProcessorTemplate};
use crate::property::{Property, PropertyValue};
use crate::registry::Registry;
use std::sync::Arc;

/// Reads a volume from disk
pub const VOLUME_SOURCE: &str = "org.plexus.VolumeSource";
/// Reads a mesh from disk
pub const MESH_SOURCE: &str = "org.plexus.MeshSource";
/// Reads an image from disk
pub const IMAGE_SOURCE: &str = "org.plexus.ImageSource";
/// Extracts an axis-aligned slice from a volume
pub const VOLUME_SLICE: &str = "org.plexus.VolumeSlice";
/// Computes a histogram and summary statistics of a volume
pub const VOLUME_STATISTICS: &str = "org.plexus.VolumeStatistics";
/// Renders a volume by ray casting
pub const VOLUME_RAYCASTER: &str = "org.plexus.VolumeRaycaster";
/// Renders any number of meshes
pub const MESH_RENDERER: &str = "org.plexus.MeshRenderer";
/// Blends two images
pub const IMAGE_BLEND: &str = "org.plexus.ImageBlend";
/// Draws a gradient behind an image
pub const BACKGROUND: &str = "org.plexus.Background";
/// Displays an image
pub const CANVAS: &str = "org.plexus.Canvas";

/// Templates of every built-in processor type
pub fn builtin_templates() -> Vec<ProcessorTemplate> {
    vec![
        // ====================================================================
        // Sources
        // ====================================================================
        ProcessorTemplate::new(VOLUME_SOURCE, "Volume Source", ProcessorCategory::Source)
            .with_description("Loads a volume dataset")
            .with_port(Port::outport("volume", DataType::Volume))
            .with_property(
                Property::new("filename", "File", PropertyValue::String(String::new()))
                    .with_invalidation_level(InvalidationLevel::InvalidResample),
            )
            .with_property(Property::new(
                "spacing",
                "Voxel Spacing",
                PropertyValue::Vec3([1.0; 3]),
            )),
        ProcessorTemplate::new(MESH_SOURCE, "Mesh Source", ProcessorCategory::Source)
            .with_description("Loads a triangle mesh")
            .with_port(Port::outport("mesh", DataType::Mesh))
            .with_property(
                Property::new("filename", "File", PropertyValue::String(String::new()))
                    .with_invalidation_level(InvalidationLevel::InvalidResample),
            ),
        ProcessorTemplate::new(IMAGE_SOURCE, "Image Source", ProcessorCategory::Source)
            .with_description("Loads an image")
            .with_port(Port::outport("image", DataType::Image))
            .with_property(
                Property::new("filename", "File", PropertyValue::String(String::new()))
                    .with_invalidation_level(InvalidationLevel::InvalidResample),
            ),
        // ====================================================================
        // Filters
        // ====================================================================
        ProcessorTemplate::new(VOLUME_SLICE, "Volume Slice", ProcessorCategory::Filter)
            .with_description("Extracts an axis-aligned slice as an image")
            .with_port(Port::inport("volume", DataType::Volume))
            .with_port(Port::outport("image", DataType::Image))
            .with_property(
                Property::new("sliceAxis", "Slice Axis", PropertyValue::Int(2))
                    .with_range(0.0, 2.0)
                    .with_invalidation_level(InvalidationLevel::InvalidResample),
            )
            .with_property(
                Property::new("sliceNumber", "Slice", PropertyValue::Int(1))
                    .with_range(1.0, 4096.0),
            )
            .with_property(Property::new(
                "flipHorizontal",
                "Flip Horizontal",
                PropertyValue::Bool(false),
            )),
        ProcessorTemplate::new(VOLUME_STATISTICS, "Volume Statistics", ProcessorCategory::Filter)
            .with_description("Histogram and mean intensity of a volume")
            .with_port(Port::inport("volume", DataType::Volume))
            .with_port(Port::outport("histogram", DataType::Buffer))
            .with_port(Port::outport("mean", DataType::Scalar))
            .with_property(
                Property::new("bins", "Bins", PropertyValue::Int(256))
                    .with_range(2.0, 4096.0)
                    .with_invalidation_level(InvalidationLevel::InvalidResample),
            ),
        // ====================================================================
        // Renderers
        // ====================================================================
        ProcessorTemplate::new(VOLUME_RAYCASTER, "Volume Raycaster", ProcessorCategory::Render)
            .with_description("Direct volume rendering")
            .with_port(Port::inport("volume", DataType::Volume))
            .with_port(Port::inport("transferFunction", DataType::Buffer))
            .with_port(Port::outport("image", DataType::Image))
            .with_property(
                Property::new("samplingRate", "Sampling Rate", PropertyValue::Float(2.0))
                    .with_range(0.1, 20.0),
            )
            .with_property(
                Property::new("isoValue", "Iso Value", PropertyValue::Double(0.5))
                    .with_range(0.0, 1.0),
            )
            .with_property(Property::new(
                "lightPosition",
                "Light Position",
                PropertyValue::Vec3([0.0, 5.0, 5.0]),
            ))
            .with_property(
                Property::new("dimensions", "Dimensions", PropertyValue::IVec2([256, 256]))
                    .with_range(1.0, 8192.0)
                    .with_invalidation_level(InvalidationLevel::InvalidResample),
            ),
        ProcessorTemplate::new(MESH_RENDERER, "Mesh Renderer", ProcessorCategory::Render)
            .with_description("Rasterizes meshes")
            .with_port(Port::inport("meshes", DataType::Mesh).multi_input())
            .with_port(Port::outport("image", DataType::Image))
            .with_property(Property::new(
                "cameraPosition",
                "Camera Position",
                PropertyValue::Vec3([0.0, 0.0, 3.0]),
            ))
            .with_property(Property::new("wireframe", "Wireframe", PropertyValue::Bool(false)))
            .with_property(
                Property::new("dimensions", "Dimensions", PropertyValue::IVec2([256, 256]))
                    .with_range(1.0, 8192.0)
                    .with_invalidation_level(InvalidationLevel::InvalidResample),
            ),
        // ====================================================================
        // Image utilities
        // ====================================================================
        ProcessorTemplate::new(IMAGE_BLEND, "Image Blend", ProcessorCategory::Utility)
            .with_description("Alpha blends two images")
            .with_port(Port::inport("imageA", DataType::Image))
            .with_port(Port::inport("imageB", DataType::Image))
            .with_port(Port::outport("image", DataType::Image))
            .with_property(
                Property::new("alpha", "Alpha", PropertyValue::Float(0.5)).with_range(0.0, 1.0),
            ),
        ProcessorTemplate::new(BACKGROUND, "Background", ProcessorCategory::Utility)
            .with_description("Draws a vertical gradient behind an image")
            .with_port(Port::inport("inport", DataType::Image))
            .with_port(Port::outport("outport", DataType::Image))
            .with_property(
                Property::new("bgColor1", "Color 1", PropertyValue::Vec4([0.0, 0.0, 0.0, 1.0]))
                    .with_range(0.0, 1.0),
            )
            .with_property(
                Property::new("bgColor2", "Color 2", PropertyValue::Vec4([1.0, 1.0, 1.0, 1.0]))
                    .with_range(0.0, 1.0),
            ),
        // ====================================================================
        // Sinks
        // ====================================================================
        ProcessorTemplate::new(CANVAS, "Canvas", ProcessorCategory::Sink)
            .with_description("Displays an image")
            .with_port(Port::inport("inport", DataType::Image))
            .with_property(
                Property::new("dimensions", "Canvas Size", PropertyValue::IVec2([256, 256]))
                    .with_range(1.0, 8192.0)
                    .with_invalidation_level(InvalidationLevel::InvalidResample),
            )
            .with_property(Property::new(
                "title",
                "Title",
                PropertyValue::String("Canvas".to_string()),
            )),
    ]
}

/// Register every built-in processor type
pub fn register_builtin_processors(registry: &mut Registry<Processor>) {
    for template in builtin_templates() {
        if let Err(e) = registry.register_entry(Arc::new(template)) {
            tracing::warn!("Skipping built-in processor: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_identifiers_unique() {
        let mut registry = Registry::new();
        register_builtin_processors(&mut registry);
        assert_eq!(registry.len(), builtin_templates().len());
    }

    #[test]
    fn test_builtin_ports() {
        let mut registry = Registry::new();
        register_builtin_processors(&mut registry);

        let slice = registry.create(VOLUME_SLICE).unwrap();
        assert_eq!(slice.inports().count(), 1);
        assert_eq!(slice.outports().count(), 1);

        let renderer = registry.create(MESH_RENDERER).unwrap();
        assert!(renderer.port("meshes").unwrap().multi_connect);

        let canvas = registry.create(CANVAS).unwrap();
        assert_eq!(canvas.outports().count(), 0);
        assert_eq!(
            canvas.property("dimensions").unwrap().invalidation_level,
            InvalidationLevel::InvalidResample
        );
    }
}
