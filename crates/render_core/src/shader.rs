//! Shader management and compilation
//!
//! Shader modules are created either from SPIR-V bytes or from GLSL
//! source compiled at run time through `shaderc`, so the demo programs
//! can keep their shaders inline as string constants.

use ash::{vk, Device};
use std::ffi::CStr;

use crate::context::{RenderError, RenderResult};

/// Pipeline stages a demo shader can target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Geometry shader
    Geometry,
    /// Fragment shader
    Fragment,
    /// Compute shader
    Compute,
}

impl ShaderStage {
    /// Map to the shaderc compilation kind
    fn shaderc_kind(self) -> shaderc::ShaderKind {
        match self {
            Self::Vertex => shaderc::ShaderKind::Vertex,
            Self::Geometry => shaderc::ShaderKind::Geometry,
            Self::Fragment => shaderc::ShaderKind::Fragment,
            Self::Compute => shaderc::ShaderKind::Compute,
        }
    }

    /// Map to the Vulkan stage flag
    pub fn vk_flags(self) -> vk::ShaderStageFlags {
        match self {
            Self::Vertex => vk::ShaderStageFlags::VERTEX,
            Self::Geometry => vk::ShaderStageFlags::GEOMETRY,
            Self::Fragment => vk::ShaderStageFlags::FRAGMENT,
            Self::Compute => vk::ShaderStageFlags::COMPUTE,
        }
    }
}

/// Shader module wrapper with RAII cleanup
pub struct ShaderModule {
    device: Device,
    module: vk::ShaderModule,
    stage: ShaderStage,
}

impl ShaderModule {
    /// Compile GLSL source and create a shader module from the result
    ///
    /// `name` shows up in compiler diagnostics; pass something that
    /// identifies the demo and stage.
    pub fn from_glsl(
        device: Device,
        stage: ShaderStage,
        source: &str,
        name: &str,
    ) -> RenderResult<Self> {
        let words = compile_glsl(stage, source, name)?;
        Self::from_spirv_words(device, stage, &words)
    }

    /// Create a shader module from SPIR-V words
    pub fn from_spirv_words(device: Device, stage: ShaderStage, words: &[u32]) -> RenderResult<Self> {
        let create_info = vk::ShaderModuleCreateInfo::builder().code(words);

        let module = unsafe {
            device
                .create_shader_module(&create_info, None)
                .map_err(RenderError::Api)?
        };

        Ok(Self {
            device,
            module,
            stage,
        })
    }

    /// Create a shader module from SPIR-V bytes
    pub fn from_spirv_bytes(device: Device, stage: ShaderStage, bytes: &[u8]) -> RenderResult<Self> {
        let words = spirv_words(bytes)?;
        Self::from_spirv_words(device, stage, &words)
    }

    /// Get shader module handle
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    /// Stage this module was compiled for
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Create the pipeline stage create info for this module
    pub fn stage_info(&self, entry_point: &CStr) -> vk::PipelineShaderStageCreateInfo {
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(self.stage.vk_flags())
            .module(self.module)
            .name(entry_point)
            .build()
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

/// Compile GLSL to SPIR-V words
fn compile_glsl(stage: ShaderStage, source: &str, name: &str) -> RenderResult<Vec<u32>> {
    let compiler = shaderc::Compiler::new()
        .ok_or_else(|| RenderError::ShaderCompilation("shaderc not available".to_string()))?;
    let mut options = shaderc::CompileOptions::new()
        .ok_or_else(|| RenderError::ShaderCompilation("shaderc options unavailable".to_string()))?;
    options.set_target_env(
        shaderc::TargetEnv::Vulkan,
        shaderc::EnvVersion::Vulkan1_0 as u32,
    );
    options.set_optimization_level(shaderc::OptimizationLevel::Size);

    let artifact = compiler
        .compile_into_spirv(source, stage.shaderc_kind(), name, "main", Some(&options))
        .map_err(|e| RenderError::ShaderCompilation(e.to_string()))?;

    Ok(artifact.as_binary().to_vec())
}

/// Reinterpret a SPIR-V byte stream as words, checking alignment
fn spirv_words(bytes: &[u8]) -> RenderResult<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        return Err(RenderError::InvalidOperation {
            reason: "SPIR-V byte length is not a multiple of 4".to_string(),
        });
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_maps_to_vulkan_flags() {
        assert_eq!(ShaderStage::Vertex.vk_flags(), vk::ShaderStageFlags::VERTEX);
        assert_eq!(
            ShaderStage::Geometry.vk_flags(),
            vk::ShaderStageFlags::GEOMETRY
        );
        assert_eq!(
            ShaderStage::Fragment.vk_flags(),
            vk::ShaderStageFlags::FRAGMENT
        );
        assert_eq!(ShaderStage::Compute.vk_flags(), vk::ShaderStageFlags::COMPUTE);
    }

    #[test]
    fn spirv_words_rejects_misaligned_input() {
        let result = spirv_words(&[0x03, 0x02, 0x23]);
        assert!(matches!(
            result,
            Err(RenderError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn spirv_words_decodes_little_endian() {
        // SPIR-V magic number in little-endian byte order.
        let words = spirv_words(&[0x03, 0x02, 0x23, 0x07]).unwrap();
        assert_eq!(words, vec![0x0723_0203]);
    }
}
