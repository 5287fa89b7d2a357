//! Graphics pipeline construction
//!
//! One `PipelineDesc` captures everything the demos vary between each
//! other: primitive topology, vertex input layout, depth testing, push
//! constants and descriptor set layouts. The fixed-function remainder
//! (fill mode, back-face culling, no blending, single sample) is shared
//! by every demo.

use ash::{vk, Device};
use std::ffi::CStr;

use crate::context::{RenderError, RenderResult};
use crate::shader::ShaderModule;

/// Per-demo pipeline parameters
pub struct PipelineDesc {
    /// Viewport and scissor extent
    pub extent: vk::Extent2D,
    /// Primitive topology fed to input assembly
    pub topology: vk::PrimitiveTopology,
    /// Vertex buffer binding, if the demo uses vertex input
    pub vertex_binding: Option<vk::VertexInputBindingDescription>,
    /// Vertex attribute layout, empty without vertex input
    pub vertex_attributes: Vec<vk::VertexInputAttributeDescription>,
    /// Enable LESS depth test and write
    pub depth_test: bool,
    /// Push constant block size in bytes, zero for none
    pub push_constant_size: u32,
    /// Stages that read the push constant block
    pub push_constant_stages: vk::ShaderStageFlags,
    /// Descriptor set layouts bound by the pipeline
    pub set_layouts: Vec<vk::DescriptorSetLayout>,
}

impl PipelineDesc {
    /// Describe a pipeline rendering into `extent` with the defaults
    pub fn new(extent: vk::Extent2D) -> Self {
        Self {
            extent,
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            vertex_binding: None,
            vertex_attributes: Vec::new(),
            depth_test: false,
            push_constant_size: 0,
            push_constant_stages: vk::ShaderStageFlags::empty(),
            set_layouts: Vec::new(),
        }
    }
}

impl Default for PipelineDesc {
    fn default() -> Self {
        // The demos all render 512x512 offscreen unless configured.
        Self::new(vk::Extent2D {
            width: 512,
            height: 512,
        })
    }
}

/// Graphics pipeline wrapper with RAII cleanup
pub struct GraphicsPipeline {
    device: Device,
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
}

impl GraphicsPipeline {
    /// Create a graphics pipeline from shader modules and a description
    ///
    /// `shaders` lists the stages in pipeline order; each module carries
    /// its own stage, so vertex+fragment and vertex+geometry+fragment
    /// sets both work.
    pub fn new(
        device: Device,
        render_pass: vk::RenderPass,
        desc: &PipelineDesc,
        shaders: &[&ShaderModule],
    ) -> RenderResult<Self> {
        let entry = CStr::from_bytes_with_nul(b"main\0").unwrap();
        let shader_stages: Vec<vk::PipelineShaderStageCreateInfo> =
            shaders.iter().map(|shader| shader.stage_info(entry)).collect();

        let vertex_bindings: Vec<vk::VertexInputBindingDescription> =
            desc.vertex_binding.into_iter().collect();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&desc.vertex_attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(desc.topology)
            .primitive_restart_enable(false);

        let viewport = vk::Viewport::builder()
            .x(0.0)
            .y(0.0)
            .width(desc.extent.width as f32)
            .height(desc.extent.height as f32)
            .min_depth(0.0)
            .max_depth(1.0)
            .build();

        let scissor = vk::Rect2D::builder()
            .offset(vk::Offset2D { x: 0, y: 0 })
            .extent(desc.extent)
            .build();

        let viewports = [viewport];
        let scissors = [scissor];
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::CLOCKWISE)
            .depth_bias_enable(false);

        let multisampling = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(desc.depth_test)
            .depth_write_enable(desc.depth_test)
            .depth_compare_op(vk::CompareOp::LESS)
            .depth_bounds_test_enable(false)
            .min_depth_bounds(0.0)
            .max_depth_bounds(1.0)
            .stencil_test_enable(false);

        let color_blend_attachment = vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false)
            .build();

        let color_blend_attachments = [color_blend_attachment];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let mut push_constant_ranges = Vec::new();
        if desc.push_constant_size > 0 {
            push_constant_ranges.push(
                vk::PushConstantRange::builder()
                    .stage_flags(desc.push_constant_stages)
                    .offset(0)
                    .size(desc.push_constant_size)
                    .build(),
            );
        }

        let layout_info = vk::PipelineLayoutCreateInfo::builder()
            .set_layouts(&desc.set_layouts)
            .push_constant_ranges(&push_constant_ranges);
        let layout = unsafe {
            device
                .create_pipeline_layout(&layout_info, None)
                .map_err(RenderError::Api)?
        };

        let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisampling)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blending)
            .layout(layout)
            .render_pass(render_pass)
            .subpass(0);

        let pipelines = unsafe {
            device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info.build()], None)
                .map_err(|(_, err)| RenderError::Api(err))?
        };

        let pipeline = pipelines[0];

        Ok(Self {
            device,
            pipeline,
            layout,
        })
    }

    /// Get pipeline handle
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Get layout handle
    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desc_defaults_match_the_offscreen_target() {
        let desc = PipelineDesc::default();
        assert_eq!(desc.extent.width, 512);
        assert_eq!(desc.extent.height, 512);
        assert_eq!(desc.topology, vk::PrimitiveTopology::TRIANGLE_LIST);
        assert!(desc.vertex_binding.is_none());
        assert!(desc.vertex_attributes.is_empty());
        assert!(!desc.depth_test);
        assert_eq!(desc.push_constant_size, 0);
        assert!(desc.set_layouts.is_empty());
    }

    #[test]
    fn desc_is_parameterized_by_extent() {
        let desc = PipelineDesc::new(vk::Extent2D {
            width: 64,
            height: 32,
        });
        assert_eq!(desc.extent.width, 64);
        assert_eq!(desc.extent.height, 32);
    }
}
