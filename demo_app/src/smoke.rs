//! Minimal smoke test
//!
//! Exercises the shared setup path and nothing else: create a context,
//! pick a device, allocate a command buffer, submit it empty and wait.
//! If this runs, the Vulkan loader, device selection and queue
//! submission all work.

use render_core::prelude::*;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("smoke test failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> RenderResult<()> {
    let settings = RenderSettings::load_or_default("render.toml");
    let ctx = RenderContext::new("smoke", &settings)?;

    log::info!("Device: {}", ctx.device_name());
    log::info!(
        "Memory types: {}, queue family: {}",
        ctx.memory_properties().memory_type_count,
        ctx.queue_family()
    );

    let mut recorder = ctx.command_pool().create_recorder()?;
    recorder.begin(true)?;
    recorder.end()?;
    recorder.submit(ctx.queue(), true)?;
    ctx.wait_idle()?;

    log::info!("Empty submission completed");
    Ok(())
}
