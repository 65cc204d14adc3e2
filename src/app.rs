//! winit application glue.
//!
//! Owns the window, the texture registry, and the renderer. Startup runs in
//! a fixed order: device, registry initialization, texture registration,
//! renderer construction; all texture registration completes before the
//! first frame is drawn.

use crate::{
    core::{Identifier, MetalTextureLoader, TextureRegistry},
    renderer::CubeRenderer,
    scene::RenderMode,
};
use log::{debug, error, info};
use objc2_metal::MTLCreateSystemDefaultDevice;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    raw_window_handle::HasWindowHandle,
    window::{Window, WindowAttributes, WindowId},
};

const ASSET_ROOT: &str = "assets";
const WINDOW_TITLE: &str = "Rotating Cube";
const WINDOW_WIDTH: u32 = 960;
const WINDOW_HEIGHT: u32 = 720;

pub struct App {
    window: Option<Window>,
    renderer: Option<CubeRenderer>,
    registry: TextureRegistry<MetalTextureLoader>,
    mode: RenderMode,
}

impl App {
    #[must_use]
    pub fn new(mode: RenderMode) -> Self {
        Self {
            window: None,
            renderer: None,
            registry: TextureRegistry::new(),
            mode,
        }
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        // `--colored` falls back to the vertex-colored cube, no texture.
        let mode = if std::env::args().any(|arg| arg == "--colored") {
            RenderMode::VertexColored
        } else {
            RenderMode::Textured
        };

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(mode);
        event_loop.run_app(&mut app)?;
        Ok(())
    }

    fn setup(&mut self, window: &Window) -> Result<CubeRenderer, Box<dyn std::error::Error>> {
        let device = MTLCreateSystemDefaultDevice().ok_or("no Metal device available")?;

        self.registry
            .initialize(MetalTextureLoader::new(device.clone()), ASSET_ROOT)?;

        let dirt = Identifier::of("dirt");
        self.registry.register(dirt.clone(), &dirt);

        let handle = window.window_handle()?;
        let size = window.inner_size();
        let renderer = CubeRenderer::new(
            device,
            handle.as_raw(),
            size.width,
            size.height,
            self.mode,
            &self.registry,
            &dirt,
        )?;
        Ok(renderer)
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => window,
            Err(e) => {
                error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        info!("window created");

        // Renderer construction failure is fatal: without a pipeline there
        // is nothing to degrade to.
        match self.setup(&window) {
            Ok(renderer) => {
                info!("renderer initialized ({:?} mode)", self.mode);
                self.renderer = Some(renderer);
                window.request_redraw();
            }
            Err(e) => {
                error!("failed to initialize renderer: {e}");
                event_loop.exit();
            }
        }

        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    if let Some(renderer) = &mut self.renderer {
                        renderer.update_drawable_size(size.width, size.height);
                    }
                    debug!("window resized to {}x{}", size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                info!("escape pressed, exiting");
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                if let Some(renderer) = &mut self.renderer {
                    if let Err(e) = renderer.render() {
                        error!("render error: {e}");
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
