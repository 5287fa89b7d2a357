//! Geometry-shader expansion
//!
//! The vertex stage places bare points on concentric rings without any
//! vertex input; a geometry shader then expands every point into a
//! small triangle. Instancing picks the ring, `gl_VertexIndex` picks
//! the angle, so one draw call fans out into hundreds of triangles.

use ash::vk;
use render_core::prelude::*;

const POINTS_PER_RING: u32 = 32;
const RING_COUNT: u32 = 8;

const VERTEX_SHADER: &str = r#"
#version 450

layout(location = 0) out vec3 vColor;

void main() {
    float angle = 6.28318530718 * float(gl_VertexIndex) / 32.0;
    float radius = 0.15 + 0.75 * float(gl_InstanceIndex) / 8.0;
    gl_Position = vec4(radius * cos(angle), radius * sin(angle), 0.0, 1.0);
    vColor = vec3(0.5 + 0.5 * cos(angle),
                  0.5 + 0.5 * sin(angle),
                  float(gl_InstanceIndex) / 8.0);
}
"#;

const GEOMETRY_SHADER: &str = r#"
#version 450

layout(points) in;
layout(triangle_strip, max_vertices = 3) out;

layout(location = 0) in vec3 vColor[];

layout(location = 0) out vec3 fColor;

void main() {
    const vec2 offsets[3] = vec2[](vec2(0.0, -0.04),
                                   vec2(0.035, 0.03),
                                   vec2(-0.035, 0.03));
    for (int i = 0; i < 3; ++i) {
        gl_Position = gl_in[0].gl_Position + vec4(offsets[i], 0.0, 0.0);
        fColor = vColor[0];
        EmitVertex();
    }
    EndPrimitive();
}
"#;

const FRAGMENT_SHADER: &str = r#"
#version 450

layout(location = 0) in vec3 fColor;

layout(location = 0) out vec4 outColor;

void main() {
    outColor = vec4(fColor, 1.0);
}
"#;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("geometry demo failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> RenderResult<()> {
    let settings = RenderSettings::load_or_default("render.toml");
    let ctx = RenderContext::new("geometry", &settings)?;
    log::info!("Rendering on {}", ctx.device_name());

    if !ctx.supports_geometry_shader() {
        return Err(RenderError::InitializationFailed(
            "geometry shaders are not supported on this device".to_string(),
        ));
    }

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

    let vertex_shader = ShaderModule::from_glsl(
        device.clone(),
        ShaderStage::Vertex,
        VERTEX_SHADER,
        "geometry.vert",
    )?;
    let geometry_shader = ShaderModule::from_glsl(
        device.clone(),
        ShaderStage::Geometry,
        GEOMETRY_SHADER,
        "geometry.geom",
    )?;
    let fragment_shader = ShaderModule::from_glsl(
        device.clone(),
        ShaderStage::Fragment,
        FRAGMENT_SHADER,
        "geometry.frag",
    )?;

    let mut desc = PipelineDesc::new(extent);
    desc.topology = vk::PrimitiveTopology::POINT_LIST;
    let pipeline = GraphicsPipeline::new(
        device.clone(),
        render_pass.handle(),
        &desc,
        &[&vertex_shader, &geometry_shader, &fragment_shader],
    )?;

    let mut recorder = ctx.command_pool().create_recorder()?;
    recorder.begin(false)?;
    {
        let clear_values = render_pass.clear_values([0.02, 0.02, 0.05, 1.0]);
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
        pass.draw(POINTS_PER_RING, RING_COUNT, 0, 0);
    }
    recorder.end()?;
    recorder.submit(ctx.queue(), true)?;

    let readback = Readback::new(device, ctx.memory_properties(), extent)?;
    let pixels = readback.read_attachment(ctx.command_pool(), ctx.queue(), &color)?;

    let output = settings.output_path("geometry.png");
    readback.save_png(&output, &pixels)?;
    log::info!(
        "Wrote {} ({} points expanded per ring, {} rings)",
        output.display(),
        POINTS_PER_RING,
        RING_COUNT
    );

    Ok(())
}
