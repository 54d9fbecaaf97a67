use crate::configurator::ConfiguratorState;

/// One frame of simulation: apply finished loads, move the camera, settle transforms.
pub fn update(state: &mut ConfiguratorState) -> anyhow::Result<()> {
    state.process_loads()?;
    state.update();
    state.scene.late_update();

    Ok(())
}
