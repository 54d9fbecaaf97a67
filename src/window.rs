use std::sync::Arc;

use anyhow::Context;
use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    config::ConfiguratorConfig, configurator::ConfiguratorState, engine, placement::PickOutcome,
    rendering::renderer::Renderer,
};

/// Pointer travel in pixels below which a press and release count as a click.
const CLICK_SLOP: f32 = 4.0;
const PIXELS_PER_LINE: f32 = 40.0;

struct DragState {
    start: Vec2,
    moved: bool,
}

struct App {
    renderer: Option<Renderer>,
    state: ConfiguratorState,
    mouse_pos: Vec2,
    drag: Option<DragState>,
    error: Option<anyhow::Error>,
}

impl App {
    fn from_state(state: ConfiguratorState) -> Self {
        Self {
            renderer: None,
            state,
            mouse_pos: Vec2::ZERO,
            drag: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn cursor_moved(&mut self, position: Vec2) {
        let delta = position - self.mouse_pos;
        self.mouse_pos = position;

        if let Some(drag) = self.drag.as_mut() {
            if drag.moved || position.distance(drag.start) > CLICK_SLOP {
                drag.moved = true;
                self.state.orbit.rotate(delta);
            }
        }
    }

    fn release(&mut self, viewport: Vec2) {
        let Some(drag) = self.drag.take() else {
            return;
        };

        if drag.moved {
            return;
        }

        match self.state.click(self.mouse_pos, viewport) {
            None => log::debug!("Frame not loaded yet, ignoring click"),
            Some(PickOutcome::Miss) => {}
            Some(PickOutcome::InsertRequested(marker)) => log::info!(
                "Loading transom for marker {} ({} loads in flight)",
                marker,
                self.state.pending_loads()
            ),
            Some(PickOutcome::Pending(marker)) => {
                log::debug!("Transom for marker {} is still loading", marker)
            }
            Some(PickOutcome::VisibilityToggled { marker, visible, .. }) => {
                log::info!(
                    "Transom at marker {} is now {}",
                    marker,
                    if visible { "visible" } else { "hidden" }
                )
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes().with_title("Frame configurator");
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(error) => return self.fail(event_loop, error.into()),
        };

        match pollster::block_on(Renderer::new(window, &self.state)) {
            Ok(renderer) => {
                renderer.window.request_redraw();
                self.renderer = Some(renderer);
            }
            Err(error) => self.fail(event_loop, error.context("Failed to create renderer")),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        let viewport = Vec2::new(renderer.size.width as f32, renderer.size.height as f32);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                renderer.resize(new_size);
            }
            WindowEvent::RedrawRequested => {
                renderer.window.request_redraw();

                if let Err(error) = engine::update(&mut self.state) {
                    return self.fail(event_loop, error);
                }

                match renderer.render(&mut self.state) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        renderer.resize(renderer.size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory");
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        log::warn!("Timeout");
                    }
                    Err(other) => {
                        log::error!("Unexpected error: {:?}", other);
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    self.drag = Some(DragState {
                        start: self.mouse_pos,
                        moved: false,
                    });
                }
                ElementState::Released => self.release(viewport),
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
                };
                self.state.orbit.zoom(lines);
            }
            _ => (),
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let config = ConfiguratorConfig::from_env();
    log::info!(
        "Frame asset {}, transom asset {}",
        config.frame_asset.display(),
        config.transom_asset.display()
    );

    let state = ConfiguratorState::new(config).context("Failed to create configurator state")?;
    let mut app = App::from_state(state);
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
