//! Window, event loop and per-frame driver
//!
//! [`ViewerApp`] owns the scene and the interaction state; the window, GPU
//! engine and UI are created once winit resumes the application.

use std::{f32::consts::TAU, sync::Arc, time::Instant};

use anyhow::Context;
use log::{debug, error, info};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    assets::{AssetManifest, RING_NAME},
    config::ViewerConfig,
    content::InfoCatalog,
    gfx::{
        camera::{CameraController, CameraManager, OrbitCamera, PointerAction},
        picking::ObjectPicker,
        resources::PointLight,
        scene::{NodeId, Scene},
        sky::SkyCycle,
        RenderEngine,
    },
    interaction::{ClickOutcome, FocusController},
    ui::{InfoPanel, UiManager},
};

pub struct ViewerApp {
    event_loop: EventLoop<()>,
    state: AppState,
}

struct AppState {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    scene: Scene,
    picker: ObjectPicker,
    focus: FocusController,
    catalog: InfoCatalog,
    panel: InfoPanel,
    sky: SkyCycle,
    ring: Option<NodeId>,
    // (x, z) spin of the ring, kept in [0, 2π)
    ring_angles: (f32, f32),
    // Set when startup fails inside the event loop; returned from `run`
    fatal: Option<anyhow::Error>,
}

impl ViewerApp {
    /// Builds the scene from `config` and loads every showcase asset.
    ///
    /// Missing or broken assets are logged and skipped; the window opens
    /// with whatever loaded.
    pub fn new(config: ViewerConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("failed to create event loop")?;

        let (width, height) = config.window_size;
        let aspect = width as f32 / height.max(1) as f32;
        let camera = OrbitCamera::from_settings(&config.camera, config.focus.default_fov, aspect);
        let controller = CameraController::new(config.click_drag_tolerance);
        let light = PointLight::from_settings(&config.light);

        let mut scene = Scene::new(CameraManager::new(camera, controller), light);
        let loaded = scene.load_manifest(&AssetManifest::default(), &config.resources_dir);
        if loaded == 0 {
            info!(
                "no assets found under '{}', showing an empty scene",
                config.resources_dir.display()
            );
        }

        Ok(Self {
            event_loop,
            state: AppState::new(config, scene),
        })
    }

    /// Opens the window and runs until it is closed
    pub fn run(mut self) -> anyhow::Result<()> {
        self.event_loop.set_control_flow(ControlFlow::Poll);
        self.event_loop
            .run_app(&mut self.state)
            .context("event loop terminated abnormally")?;

        match self.state.fatal.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl AppState {
    /// Interaction state over a loaded scene; graphics come up on resume
    fn new(config: ViewerConfig, scene: Scene) -> Self {
        let ring = scene.find_top_level(RING_NAME);
        if ring.is_none() {
            debug!("no '{}' object, light toggle unavailable", RING_NAME);
        }

        Self {
            window: None,
            render_engine: None,
            ui_manager: None,
            scene,
            picker: ObjectPicker::new(),
            focus: FocusController::new(config.focus),
            catalog: InfoCatalog::default(),
            panel: InfoPanel::new(config.content_dir.clone()),
            sky: SkyCycle::new(config.sky),
            ring,
            ring_angles: (0.0, 0.0),
            fatal: None,
            config,
        }
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let (width, height) = self.config.window_size;
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title(self.config.window_title.clone())
                    .with_inner_size(LogicalSize::new(width, height)),
            )
            .context("failed to create window")?;
        let window = Arc::new(window);

        let (width, height) = window.inner_size().into();
        let render_engine = pollster::block_on(RenderEngine::new(window.clone(), width, height))
            .context("failed to initialise the renderer")?;

        let mut ui_manager = UiManager::new(
            render_engine.device(),
            render_engine.queue(),
            render_engine.surface_format(),
            &window,
        );
        ui_manager.update_display_size(width, height);

        self.scene
            .camera_manager
            .camera
            .resize_projection(width, height);

        self.window = Some(window);
        self.render_engine = Some(render_engine);
        self.ui_manager = Some(ui_manager);
        Ok(())
    }

    fn handle_click(&mut self, position: (f32, f32)) {
        let Some(render_engine) = self.render_engine.as_ref() else {
            return;
        };
        let (width, height) = render_engine.get_surface_size();
        self.click_at(position, (width as f32, height as f32), Instant::now());
    }

    /// Picks under `position` in a `viewport`-sized surface and reacts to the hit
    fn click_at(&mut self, position: (f32, f32), viewport: (f32, f32), now: Instant) -> ClickOutcome {
        let hit = self
            .picker
            .pick_object(position, viewport, &self.scene.camera_manager.camera, &self.scene)
            .map(|pick| pick.node);

        let outcome = self.focus.handle_click(&mut self.scene, hit, now);
        debug!("click at {:?}: {:?}", position, outcome);
        outcome
    }

    fn handle_wheel(&mut self) {
        self.focus.handle_wheel(&mut self.scene);
        self.panel.hide();
    }

    /// Advances everything that moves on its own by one frame and returns
    /// the sky colour to clear with
    fn step_frame(&mut self, now: Instant) -> [f32; 3] {
        let clear_color = self.sky.advance();

        if let Some(ring) = self.ring {
            let (spin_x, spin_z) = self.config.ring_spin;
            self.ring_angles.0 = (self.ring_angles.0 + spin_x).rem_euclid(TAU);
            self.ring_angles.1 = (self.ring_angles.1 + spin_z).rem_euclid(TAU);
            self.scene
                .set_node_rotation(ring, self.ring_angles.0, 0.0, self.ring_angles.1);
        }

        let camera = &mut self.scene.camera_manager.camera;
        camera.approach_fov(self.focus.target_fov(), self.config.camera.zoom_speed);
        camera.update();

        if let Some(name) = self.focus.poll_reveal(now) {
            match self.catalog.entry_for(&name) {
                Some(entry) => self.panel.show(entry),
                None => debug!("no information for '{}'", name),
            }
        }

        self.scene.update();
        clear_color
    }

    fn redraw(&mut self) {
        if self.render_engine.is_none() || self.window.is_none() {
            return;
        }
        let clear_color = self.step_frame(Instant::now());

        let (Some(render_engine), Some(window)) = (self.render_engine.as_mut(), self.window.as_ref())
        else {
            return;
        };
        self.scene.sync_gpu_resources(
            render_engine.device(),
            render_engine.queue(),
            render_engine.transform_layout(),
            render_engine.material_layout(),
        );
        render_engine.update(&self.scene.camera_manager.camera.uniform, &self.scene.light);

        let result = match self.ui_manager.as_mut() {
            Some(ui_manager) => {
                self.panel
                    .prepare(ui_manager, render_engine.device(), render_engine.queue());
                let panel = &self.panel;
                render_engine.render_frame(
                    &self.scene,
                    clear_color,
                    Some(|device: &wgpu::Device, queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView| {
                        ui_manager.draw(device, queue, encoder, window, view, |ui| panel.draw(ui));
                    }),
                )
            }
            None => render_engine.render_frame(
                &self.scene,
                clear_color,
                None::<fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView)>,
            ),
        };

        if let Err(e) = result {
            error!("{:#}", anyhow::Error::new(e));
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.init_graphics(event_loop) {
            error!("{:#}", e);
            self.fatal = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // UI gets first look; the wheel always resets the view
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let ui_event: Event<()> = Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(&window, &ui_event) {
                match event {
                    WindowEvent::MouseWheel { .. } => {}
                    WindowEvent::MouseInput { button, state, .. } => {
                        // Keep drag state consistent, but a click on the UI never picks
                        self.scene.camera_manager.process_mouse_button(button, state);
                        return;
                    }
                    _ => return,
                }
            }
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            }
            | WindowEvent::CloseRequested => {
                info!("closing");
                event_loop.exit();
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.scene
                    .camera_manager
                    .set_shift_held(modifiers.state().shift_key());
            }
            WindowEvent::CursorMoved { position, .. } => {
                let height = window.inner_size().height as f32;
                self.scene
                    .camera_manager
                    .process_cursor_moved((position.x as f32, position.y as f32), height);
            }
            WindowEvent::MouseInput { button, state, .. } => {
                if let Some(PointerAction::Click { position }) =
                    self.scene.camera_manager.process_mouse_button(button, state)
                {
                    self.handle_click(position);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let PointerAction::Wheel = self.scene.camera_manager.process_scroll(&delta) {
                    self.handle_wheel();
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if width == 0 || height == 0 {
                    return;
                }
                self.scene
                    .camera_manager
                    .camera
                    .resize_projection(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
