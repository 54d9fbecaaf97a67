use std::path::Path;

use anyhow::Context;
use glam::Vec2;

use crate::{
    assets::loader::{AssetLoader, LoadCompletion},
    camera::Camera,
    config::ConfiguratorConfig,
    error::InsertionError,
    orbit::OrbitControls,
    placement::{MarkerId, PickOutcome, PlacementController},
    scene_graph::Scene,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPurpose {
    Frame,
    Transom(MarkerId),
}

/// Everything the click handler and the render loop share.
pub struct ConfiguratorState {
    pub config: ConfiguratorConfig,
    pub camera: Camera,
    pub orbit: OrbitControls,
    pub scene: Scene,
    loader: AssetLoader<LoadPurpose>,
    controller: Option<PlacementController>,
}

impl ConfiguratorState {
    /// Starts loading the base frame; the controller exists once it arrives.
    pub fn new(config: ConfiguratorConfig) -> anyhow::Result<Self> {
        let camera = Camera::from_config(&config.camera);
        let orbit = OrbitControls::from_camera(&camera, config.orbit.clone());

        let mut loader = AssetLoader::new()?;
        loader.request(&config.frame_asset, LoadPurpose::Frame);

        Ok(Self {
            config,
            camera,
            orbit,
            scene: Scene::new(),
            loader,
            controller: None,
        })
    }

    pub fn controller(&self) -> Option<&PlacementController> {
        self.controller.as_ref()
    }

    /// Applies finished loads. A frame that fails to load or has the wrong
    /// shape is fatal; transom failures are logged and can be retried.
    pub fn process_loads(&mut self) -> anyhow::Result<()> {
        for completion in self.loader.drain() {
            self.apply_completion(completion)?;
        }

        Ok(())
    }

    fn apply_completion(&mut self, completion: LoadCompletion<LoadPurpose>) -> anyhow::Result<()> {
        let LoadCompletion { tag, path, result } = completion;

        match tag {
            LoadPurpose::Frame => {
                let asset = result
                    .with_context(|| format!("Failed to load frame asset {}", path.display()))?;
                let frame_root = self.scene.spawn_asset(asset, None);

                let controller = PlacementController::initialize(
                    &mut self.scene,
                    frame_root,
                    self.config.placement.clone(),
                )
                .with_context(|| format!("Frame asset {} cannot be configured", path.display()))?;

                log::info!("Loaded frame {}", path.display());
                self.controller = Some(controller);
            }
            LoadPurpose::Transom(marker) => {
                let Some(controller) = self.controller.as_mut() else {
                    log::warn!("Dropping transom for marker {} without a frame", marker);
                    return Ok(());
                };

                match controller.complete_insertion(&mut self.scene, marker, result) {
                    Ok(inserted) => log::info!(
                        "Placed transom at marker {}, new markers {} and {}",
                        inserted.marker,
                        inserted.new_markers[0],
                        inserted.new_markers[1]
                    ),
                    Err(error @ InsertionError::NotPending { .. }) => {
                        log::warn!("Discarding transom load: {}", error)
                    }
                    Err(error) => log::error!("{:#}", anyhow::Error::new(error)),
                }
            }
        }

        Ok(())
    }

    /// Click at `cursor` in a `viewport` sized surface. `None` until the frame has loaded.
    pub fn click(&mut self, cursor: Vec2, viewport: Vec2) -> Option<PickOutcome> {
        let controller = self.controller.as_mut()?;
        let outcome = controller.handle_pick(&mut self.scene, &self.camera, cursor, viewport);

        if let PickOutcome::InsertRequested(marker) = outcome {
            let path: &Path = &self.config.transom_asset;
            self.loader.request(path, LoadPurpose::Transom(marker));
        }

        Some(outcome)
    }

    pub fn pending_loads(&self) -> usize {
        self.loader.in_flight()
    }

    pub fn update(&mut self) {
        self.orbit.update(&mut self.camera);
    }

    #[cfg(test)]
    fn wait_for_loads(&mut self) -> anyhow::Result<()> {
        while let Some(completion) = self.loader.wait() {
            self.apply_completion(completion)?;
        }

        Ok(())
    }
}
