//! Vertex data layout
//!
//! The vertex-only demo feeds position and color through a classic
//! vertex buffer; this module owns the Pod type and its Vulkan input
//! descriptions.

use ash::vk;
use bytemuck::{Pod, Zeroable};
use nalgebra::{Vector2, Vector3};

/// Interleaved 2D position + RGB color vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Clip-space xy position
    pub position: [f32; 2],
    /// RGB color passed to the fragment stage
    pub color: [f32; 3],
}

impl Vertex {
    /// Build a vertex from math types
    pub fn new(position: Vector2<f32>, color: Vector3<f32>) -> Self {
        Self {
            position: [position.x, position.y],
            color: [color.x, color.y, color.z],
        }
    }

    /// Vertex buffer binding description
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Vertex attribute layout: position at location 0, color at 1
    pub fn attribute_descriptions() -> Vec<vk::VertexInputAttributeDescription> {
        vec![
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: 0,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 8, // 2 * sizeof(f32) after position
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 20);
        assert_eq!(Vertex::binding_description().stride, 20);
    }

    #[test]
    fn attribute_offsets_match_the_struct_layout() {
        let attributes = Vertex::attribute_descriptions();
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes[0].offset, 0);
        assert_eq!(attributes[0].format, vk::Format::R32G32_SFLOAT);
        assert_eq!(attributes[1].offset, 8);
        assert_eq!(attributes[1].format, vk::Format::R32G32B32_SFLOAT);
    }

    #[test]
    fn constructor_copies_components() {
        use approx::assert_relative_eq;

        let v = Vertex::new(Vector2::new(0.25, -0.5), Vector3::new(1.0, 0.5, 0.0));
        assert_relative_eq!(v.position[0], 0.25);
        assert_relative_eq!(v.position[1], -0.5);
        assert_relative_eq!(v.color[1], 0.5);
    }
}
