use anyhow::Result;

mod assets;
mod camera;
mod config;
mod configurator;
mod engine;
mod error;
mod math;
mod model;
mod orbit;
mod placement;
mod rendering;
mod scene_graph;
mod window;

fn main() -> Result<()> {
    pretty_env_logger::init();

    pollster::block_on(window::run())?;

    Ok(())
}
