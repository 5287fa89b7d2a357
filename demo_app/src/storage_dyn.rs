//! Dynamic storage buffer with instanced rendering
//!
//! Vertex positions live in a device-local storage buffer bound through
//! a `STORAGE_BUFFER_DYNAMIC` descriptor; the shader fetches them by
//! `gl_VertexIndex` instead of using vertex input. 10,000 instances of
//! the same triangle spiral away from the camera, colored by a push
//! constant palette of 16 random colors. The result is dumped as raw
//! rgba32f floats, one `image.bin` per run.

use ash::vk;
use rand::Rng;
use render_core::prelude::*;

const INSTANCE_COUNT: u32 = 10_000;
const PALETTE_SIZE: usize = 16;

const VERTEX_SHADER: &str = r#"
#version 450

layout(location = 0) out vec4 fragColor;

layout(set = 0, binding = 0) readonly buffer Positions {
    vec2 positions[];
};

layout(push_constant) uniform PushConstants {
    vec4 colors[16];
} pc;

void main() {
    vec4 offset = vec4(2.0 * cos(gl_InstanceIndex / 5.0),
                       2.0 * sin(gl_InstanceIndex / 5.0),
                       0.0,
                       gl_InstanceIndex / 100.0 + 1.0);
    gl_Position = vec4(positions[gl_VertexIndex], 0.6, 1.0) + offset;
    fragColor = vec4(pc.colors[gl_InstanceIndex % 16].rgb, 1.0);
}
"#;

const FRAGMENT_SHADER: &str = r#"
#version 450

layout(location = 0) in vec4 fragColor;

layout(location = 0) out vec4 outColor;

void main() {
    outColor = fragColor;
}
"#;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("storage buffer demo failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> RenderResult<()> {
    let settings = RenderSettings::load_or_default("render.toml");
    let ctx = RenderContext::new("storage_dyn", &settings)?;
    log::info!("Rendering on {}", ctx.device_name());

    let device = ctx.device();
    let extent = settings.extent();

    let color = AttachmentImage::new_color(
        device.clone(),
        ctx.memory_properties(),
        extent,
        vk::Format::R32G32B32A32_SFLOAT,
    )?;
    let depth = AttachmentImage::new_depth(device.clone(), ctx.memory_properties(), extent)?;
    let render_pass = RenderPass::new_offscreen(device.clone(), color.format())?;
    let framebuffer = Framebuffer::new(
        device.clone(),
        render_pass.handle(),
        &[color.image_view(), depth.image_view()],
        extent,
    )?;

    // Triangle positions, staged into device-local memory.
    let positions: [[f32; 2]; 3] = [[0.0, -0.5], [0.5, 0.5], [-0.5, 0.5]];
    let storage = StorageBuffer::new(
        device.clone(),
        ctx.memory_properties(),
        ctx.command_pool(),
        ctx.queue(),
        &positions,
    )?;

    let set_layout = DescriptorSetLayoutBuilder::new()
        .add_dynamic_storage_buffer(0, vk::ShaderStageFlags::VERTEX)
        .build(&device)?;
    let descriptor_pool = DescriptorPool::new(device.clone(), 1)?;
    let descriptor_set = descriptor_pool.allocate_descriptor_sets(&[set_layout.handle()])?[0];
    DescriptorSetWriter::new()
        .write_buffer(
            descriptor_set,
            0,
            vk::DescriptorType::STORAGE_BUFFER_DYNAMIC,
            storage.handle(),
            0,
            vk::WHOLE_SIZE,
        )
        .update(&device);

    let vertex_shader = ShaderModule::from_glsl(
        device.clone(),
        ShaderStage::Vertex,
        VERTEX_SHADER,
        "storage_dyn.vert",
    )?;
    let fragment_shader = ShaderModule::from_glsl(
        device.clone(),
        ShaderStage::Fragment,
        FRAGMENT_SHADER,
        "storage_dyn.frag",
    )?;

    // 16 vec4-aligned palette entries, matching the std430 push block.
    let mut rng = rand::thread_rng();
    let palette: [[f32; 4]; PALETTE_SIZE] = std::array::from_fn(|_| {
        [
            rng.gen_range(0.5..1.0),
            rng.gen_range(0.5..1.0),
            rng.gen_range(0.5..1.0),
            1.0,
        ]
    });

    let mut desc = PipelineDesc::new(extent);
    desc.depth_test = true;
    desc.push_constant_size = std::mem::size_of_val(&palette) as u32;
    desc.push_constant_stages = vk::ShaderStageFlags::VERTEX;
    desc.set_layouts = vec![set_layout.handle()];
    let pipeline = GraphicsPipeline::new(
        device.clone(),
        render_pass.handle(),
        &desc,
        &[&vertex_shader, &fragment_shader],
    )?;

    let mut recorder = ctx.command_pool().create_recorder()?;
    recorder.begin(false)?;
    {
        let clear_values = render_pass.clear_values([0.0, 0.0, 0.0, 0.0]);
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
        pass.push_constants(
            pipeline.layout(),
            vk::ShaderStageFlags::VERTEX,
            0,
            bytemuck::cast_slice(&palette),
        );
        pass.bind_descriptor_sets(pipeline.layout(), 0, &[descriptor_set], &[0]);
        pass.draw(positions.len() as u32, INSTANCE_COUNT, 0, 0);
    }
    recorder.end()?;
    recorder.submit(ctx.queue(), true)?;

    let readback = Readback::new(device, ctx.memory_properties(), extent)?;
    let pixels = readback.read_attachment(ctx.command_pool(), ctx.queue(), &color)?;

    let output = settings.output_path("image.bin");
    readback.save_raw(&output, &pixels)?;
    log::info!(
        "Wrote {} ({} instances, {} texels)",
        output.display(),
        INSTANCE_COUNT,
        pixels.len() / 4
    );

    Ok(())
}
