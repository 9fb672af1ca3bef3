//! Window creation and event handling via winit.
//!
//! [`OrreryApp`] implements winit's [`ApplicationHandler`]: it owns the input
//! state and the camera, and drives one recorded frame per redraw.

use std::sync::Arc;

use glam::Vec3;
use orrery_config::Config;
use orrery_input::{InputSnapshot, KeyboardState, MouseState};
use orrery_render::{Camera, CommandList};
use tracing::{debug, error, info, instrument};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::controls::FlyControls;
use crate::error::AppError;
use crate::frame::{FrameParams, record_frame};
use crate::frame_clock::FrameClock;
use crate::hud::{FpsCounter, title_with_fps};
use crate::renderer::Renderer;

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
}

/// The camera described by the `[camera]` and `[render]` config sections.
pub fn camera_from_config(config: &Config) -> Camera {
    let mut camera = Camera::new(
        Vec3::from_array(config.camera.position),
        config.camera.yaw_degrees,
        config.camera.pitch_degrees,
    );
    camera.zoom = config.render.fov_degrees;
    camera.near = config.render.near;
    camera.far = config.render.far;
    camera.set_aspect_ratio(config.window.width as f32, config.window.height as f32);
    camera
}

pub struct OrreryApp {
    config: Config,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    keyboard: KeyboardState,
    mouse: MouseState,
    camera: Camera,
    controls: FlyControls,
    clock: FrameClock,
    fps: FpsCounter,
    /// Runtime shadow toggle; only effective when the cubemap exists.
    shadows: bool,
    orbiting: bool,
    commands: CommandList,
    error: Option<AppError>,
}

impl OrreryApp {
    pub fn new(config: Config) -> Self {
        Self {
            camera: camera_from_config(&config),
            controls: FlyControls::from_config(&config.camera),
            shadows: config.render.shadows,
            orbiting: config.scene.orbiting,
            config,
            window: None,
            renderer: None,
            keyboard: KeyboardState::new(),
            mouse: MouseState::new(),
            clock: FrameClock::new(),
            fps: FpsCounter::new(),
            commands: CommandList::new(),
            error: None,
        }
    }

    /// The error that ended the event loop, if any.
    pub fn take_error(&mut self) -> Option<AppError> {
        self.error.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: AppError) {
        error!("{err}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn resize(&mut self, event_loop: &ActiveEventLoop, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera.set_aspect_ratio(width as f32, height as f32);
        let resized = match &mut self.renderer {
            Some(renderer) => renderer.resize(width, height),
            None => Ok(()),
        };
        if let Err(err) = resized {
            self.fail(event_loop, err);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.clock.tick();
        let input = InputSnapshot::capture(&self.keyboard, &self.mouse);
        self.keyboard.clear_transients();
        self.mouse.clear_transients();

        let actions = self.controls.apply(&mut self.camera, &input, dt);
        if actions.exit {
            info!("Escape pressed, shutting down");
            event_loop.exit();
            return;
        }
        let Some(renderer) = &mut self.renderer else {
            return;
        };

        if actions.toggle_shadows {
            if renderer.manager.supports_shadows() {
                self.shadows = !self.shadows;
                info!("Shadows {}", if self.shadows { "on" } else { "off" });
            } else {
                info!("Shadows unavailable: start with --shadows to allocate the shadow map");
            }
        }
        if actions.toggle_orbit {
            self.orbiting = !self.orbiting;
            info!("Orbiting {}", if self.orbiting { "on" } else { "off" });
        }

        if self.fps.record(f64::from(dt)).is_some() {
            debug!("{}", self.fps.label());
            if self.config.debug.show_fps
                && let Some(window) = &self.window
            {
                window.set_title(&title_with_fps(&self.config.window.title, &self.fps));
            }
        }

        let params = FrameParams {
            dt,
            view: self.camera.view_matrix(),
            projection: self.camera.projection_matrix(),
            camera_position: self.camera.position,
            light: &self.config.light,
            light_source: renderer.sun,
            shadows: self.shadows,
            orbiting: self.orbiting,
            clear_color: self.config.render.clear_color,
            far_plane: self.config.render.far_plane,
        };

        self.commands.clear();
        if record_frame(
            &mut self.commands,
            &mut renderer.manager,
            &mut renderer.scene,
            &renderer.skybox,
            &params,
        )
        .is_err()
        {
            return;
        }
        if let Some(summary) = renderer.submit(&self.commands) {
            tracing::trace!(
                passes = summary.passes,
                draws = summary.draws,
                presented = summary.presented,
                "Frame submitted"
            );
        }
    }
}

impl ApplicationHandler for OrreryApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = match event_loop.create_window(window_attributes_from_config(&self.config)) {
            Ok(window) => Arc::new(window),
            Err(err) => return self.fail(event_loop, err.into()),
        };

        match Renderer::new(window.clone(), &self.config) {
            Ok(renderer) => {
                let (width, height) = renderer.context.size();
                self.camera.set_aspect_ratio(width as f32, height as f32);
                self.renderer = Some(renderer);
            }
            Err(err) => return self.fail(event_loop, err),
        }

        self.mouse.set_captured(&window, true);
        self.clock.reset();
        window.request_redraw();
        self.window = Some(window);
        info!("Orrery running");
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.resize(event_loop, new_size.width, new_size.height);
            }
            WindowEvent::Focused(false) => {
                self.keyboard.release_all();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.keyboard.process_event(&event);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::CursorLeft { .. } => {
                self.mouse.on_cursor_left();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.mouse.on_scroll(delta);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.mouse.on_raw_motion(delta.0, delta.1);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            self.mouse.set_captured(window, false);
        }
        info!("Exiting after {} frames", self.clock.frame_count());
    }
}

/// Creates an event loop and runs the demo until the window is closed.
#[instrument(skip_all)]
pub fn run(config: Config) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = OrreryApp::new(config);
    event_loop.run_app(&mut app)?;
    match app.take_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
