//! Render-to-buffer readback check
//!
//! Renders a centered triangle over a known clear color, copies the
//! attachment into a host-visible buffer and verifies the mapped
//! texels: the top-left corner must still carry the clear color and
//! the center must carry the fill color. A mismatch on either side
//! means the copy or the layout transition went wrong.

use ash::vk;
use render_core::prelude::*;

const CLEAR_COLOR: [f32; 4] = [0.1, 0.2, 0.3, 1.0];
const FILL_COLOR: [f32; 4] = [0.9, 0.4, 0.1, 1.0];

// Centered triangle, no vertex input; the corners stay uncovered.
const VERTEX_SHADER: &str = r#"
#version 450

void main() {
    const vec2 positions[3] = vec2[](vec2(0.0, -0.5),
                                     vec2(0.5, 0.5),
                                     vec2(-0.5, 0.5));
    gl_Position = vec4(positions[gl_VertexIndex], 0.0, 1.0);
}
"#;

const FRAGMENT_SHADER: &str = r#"
#version 450

layout(location = 0) out vec4 outColor;

void main() {
    outColor = vec4(0.9, 0.4, 0.1, 1.0);
}
"#;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("readback demo failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> RenderResult<()> {
    let settings = RenderSettings::load_or_default("render.toml");
    let ctx = RenderContext::new("readback", &settings)?;
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

    let vertex_shader = ShaderModule::from_glsl(
        device.clone(),
        ShaderStage::Vertex,
        VERTEX_SHADER,
        "readback.vert",
    )?;
    let fragment_shader = ShaderModule::from_glsl(
        device.clone(),
        ShaderStage::Fragment,
        FRAGMENT_SHADER,
        "readback.frag",
    )?;

    let desc = PipelineDesc::new(extent);
    let pipeline = GraphicsPipeline::new(
        device.clone(),
        render_pass.handle(),
        &desc,
        &[&vertex_shader, &fragment_shader],
    )?;

    let mut recorder = ctx.command_pool().create_recorder()?;
    recorder.begin(false)?;
    {
        let clear_values = render_pass.clear_values(CLEAR_COLOR);
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
        pass.draw(3, 1, 0, 0);
    }
    recorder.end()?;
    recorder.submit(ctx.queue(), true)?;

    let readback = Readback::new(device, ctx.memory_properties(), extent)?;
    let pixels = readback.read_attachment(ctx.command_pool(), ctx.queue(), &color)?;

    let center = readback.texel(&pixels, extent.width / 2, extent.height / 2);
    let corner = readback.texel(&pixels, 0, 0);
    log::info!("Center texel: {center:?}, corner texel: {corner:?}");

    if !close(center, FILL_COLOR) {
        return Err(RenderError::InvalidOperation {
            reason: format!("center texel {center:?} does not match fill color {FILL_COLOR:?}"),
        });
    }
    if !close(corner, CLEAR_COLOR) {
        return Err(RenderError::InvalidOperation {
            reason: format!("corner texel {corner:?} does not match clear color {CLEAR_COLOR:?}"),
        });
    }

    log::info!("Readback verified: attachment contents reached host memory intact");
    Ok(())
}

fn close(a: [f32; 4], b: [f32; 4]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
}
