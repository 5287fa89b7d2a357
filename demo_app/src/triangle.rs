//! Vertex-only triangle
//!
//! The classic first triangle, rendered offscreen: three vertices in a
//! host-visible vertex buffer, a color-only render pass, one draw call,
//! then a readback and a PNG on disk.

use ash::vk;
use nalgebra::{Vector2, Vector3};
use render_core::prelude::*;

const VERTEX_SHADER: &str = r#"
#version 450

layout(location = 0) in vec2 inPosition;
layout(location = 1) in vec3 inColor;

layout(location = 0) out vec3 fragColor;

void main() {
    gl_Position = vec4(inPosition, 0.0, 1.0);
    fragColor = inColor;
}
"#;

const FRAGMENT_SHADER: &str = r#"
#version 450

layout(location = 0) in vec3 fragColor;

layout(location = 0) out vec4 outColor;

void main() {
    outColor = vec4(fragColor, 1.0);
}
"#;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("triangle demo failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> RenderResult<()> {
    let settings = RenderSettings::load_or_default("render.toml");
    let ctx = RenderContext::new("triangle", &settings)?;
    log::info!("Rendering on {}", ctx.device_name());

    let device = ctx.device();
    let extent = settings.extent();

    let color = AttachmentImage::new_color(
        device.clone(),
        ctx.memory_properties(),
        extent,
        vk::Format::R32G32B32A32_SFLOAT,
    )?;
    let render_pass = RenderPass::new_color_only(device.clone(), color.format())?;
    let framebuffer = Framebuffer::new(
        device.clone(),
        render_pass.handle(),
        &[color.image_view()],
        extent,
    )?;

    // Clockwise in Vulkan's y-down clip space, so the triangle faces front.
    let vertices = [
        Vertex::new(Vector2::new(0.0, -0.5), Vector3::new(1.0, 0.0, 0.0)),
        Vertex::new(Vector2::new(0.5, 0.5), Vector3::new(0.0, 1.0, 0.0)),
        Vertex::new(Vector2::new(-0.5, 0.5), Vector3::new(0.0, 0.0, 1.0)),
    ];
    let vertex_buffer = VertexBuffer::new(device.clone(), ctx.memory_properties(), &vertices)?;

    let vertex_shader = ShaderModule::from_glsl(
        device.clone(),
        ShaderStage::Vertex,
        VERTEX_SHADER,
        "triangle.vert",
    )?;
    let fragment_shader = ShaderModule::from_glsl(
        device.clone(),
        ShaderStage::Fragment,
        FRAGMENT_SHADER,
        "triangle.frag",
    )?;

    let mut desc = PipelineDesc::new(extent);
    desc.vertex_binding = Some(Vertex::binding_description());
    desc.vertex_attributes = Vertex::attribute_descriptions();
    let pipeline = GraphicsPipeline::new(
        device.clone(),
        render_pass.handle(),
        &desc,
        &[&vertex_shader, &fragment_shader],
    )?;

    let mut recorder = ctx.command_pool().create_recorder()?;
    recorder.begin(false)?;
    {
        let clear_values = render_pass.clear_values([0.0, 0.0, 0.0, 1.0]);
        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };
        let mut pass = recorder.begin_render_pass(
            render_pass.handle(),
            framebuffer.handle(),
            render_area,
            &clear_values,
        )?;
        pass.bind_pipeline(pipeline.handle());
        pass.bind_vertex_buffers(0, &[vertex_buffer.handle()], &[0]);
        pass.draw(vertex_buffer.vertex_count(), 1, 0, 0);
    }
    recorder.end()?;
    recorder.submit(ctx.queue(), true)?;

    let readback = Readback::new(device, ctx.memory_properties(), extent)?;
    let pixels = readback.read_attachment(ctx.command_pool(), ctx.queue(), &color)?;

    let output = settings.output_path("triangle.png");
    readback.save_png(&output, &pixels)?;
    log::info!("Wrote {}", output.display());

    Ok(())
}
