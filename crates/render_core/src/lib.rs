//! # Render Core
//!
//! Headless Vulkan rendering primitives shared by the demo programs.
//!
//! Every demo performs the same five steps: create a context, pick a
//! device, allocate command resources, build a pipeline, submit work.
//! This crate owns those steps as small RAII wrappers over `ash` so the
//! demo binaries stay short linear runs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use render_core::prelude::*;
//!
//! fn main() -> RenderResult<()> {
//!     let settings = RenderSettings::default();
//!     let ctx = RenderContext::new("demo", &settings)?;
//!     log::info!("running on {}", ctx.device_name());
//!     Ok(())
//! }
//! ```
//!
//! There is no swapchain and no frame loop: demos render into offscreen
//! attachments and read the pixels back through a host-visible buffer.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod buffer;
pub mod commands;
pub mod context;
pub mod descriptor;
pub mod framebuffer;
pub mod image;
pub mod memory;
pub mod pipeline;
pub mod readback;
pub mod render_pass;
pub mod settings;
pub mod shader;
pub mod vertex;

/// Commonly used types for demo programs
pub mod prelude {
    pub use crate::buffer::{Buffer, StorageBuffer, VertexBuffer};
    pub use crate::commands::{CommandPool, CommandRecorder};
    pub use crate::context::{RenderContext, RenderError, RenderResult};
    pub use crate::descriptor::{DescriptorPool, DescriptorSetLayoutBuilder, DescriptorSetWriter};
    pub use crate::framebuffer::Framebuffer;
    pub use crate::image::AttachmentImage;
    pub use crate::pipeline::{GraphicsPipeline, PipelineDesc};
    pub use crate::readback::Readback;
    pub use crate::render_pass::RenderPass;
    pub use crate::settings::RenderSettings;
    pub use crate::shader::{ShaderModule, ShaderStage};
    pub use crate::vertex::Vertex;
}
