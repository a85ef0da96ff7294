use anyhow::{Context, Result};
use clap::Parser;
use cubefield_camera::Camera;
use cubefield_common::{AppConfig, Movement};
use cubefield_input::{InputRouter, LogicalKey};
use cubefield_render::{CubeField, RenderView};
use cubefield_render_wgpu::WgpuRenderer;
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

/// Frame deltas above this are clamped so a stall does not teleport the camera.
const MAX_FRAME_DELTA: f32 = 0.1;

#[derive(Parser)]
#[command(name = "cubefield-desktop", about = "Fly through an instanced cube field")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML config file (window, camera, field)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Map a physical key to the logical key name the router binds.
fn logical_key(code: KeyCode) -> Option<LogicalKey> {
    let name = match code {
        KeyCode::KeyW => "w",
        KeyCode::KeyA => "a",
        KeyCode::KeyS => "s",
        KeyCode::KeyD => "d",
        KeyCode::ArrowUp => "arrowup",
        KeyCode::ArrowDown => "arrowdown",
        KeyCode::ArrowLeft => "arrowleft",
        KeyCode::ArrowRight => "arrowright",
        _ => return None,
    };
    Some(LogicalKey::new(name))
}

/// Application state that exists before and independently of the GPU.
struct AppState {
    config: AppConfig,
    camera: Camera,
    router: InputRouter,
    field: CubeField,
    show_overlay: bool,
    last_frame: Instant,
    frame_time: f32,
}

impl AppState {
    fn new(config: AppConfig) -> Result<Self> {
        let aspect = config.window.width as f32 / config.window.height.max(1) as f32;
        let camera = Camera::new(aspect, &config.camera).context("invalid camera config")?;

        let mut router = InputRouter::with_default_bindings();
        for (key, movement) in [
            ("arrowup", Movement::Forward),
            ("arrowleft", Movement::Left),
            ("arrowdown", Movement::Backward),
            ("arrowright", Movement::Right),
        ] {
            let _ = router.subscribe(key, movement);
        }

        let field = CubeField::grid(&config.field);

        Ok(Self {
            config,
            camera,
            router,
            field,
            show_overlay: true,
            last_frame: Instant::now(),
            frame_time: 0.0,
        })
    }

    /// Advance one frame. Input queued since the last frame is applied
    /// first, so the camera only changes at frame boundaries.
    fn update(&mut self, dt: f32) {
        for action in self.router.drain() {
            self.camera.apply(action);
        }
        self.camera.update(dt);
        self.frame_time = dt;
    }

    fn handle_key(&mut self, code: KeyCode, pressed: bool) -> bool {
        if let Some(key) = logical_key(code) {
            if pressed {
                self.router.key_down(key);
            } else {
                self.router.key_up(key);
            }
        }

        if !pressed {
            return false;
        }

        match code {
            KeyCode::F1 => {
                self.show_overlay = !self.show_overlay;
                false
            }
            // Escape releases the pointer; the caller updates the cursor.
            KeyCode::Escape => {
                self.router.set_pointer_captured(false);
                true
            }
            _ => false,
        }
    }

    fn draw_ui(&self, ctx: &EguiContext) {
        if !self.show_overlay {
            return;
        }

        let transform = self.camera.transform();
        let (axis, angle) = transform.rotation.to_axis_angle();
        let active: Vec<&str> = self.camera.active_inputs().map(|m| m.label()).collect();
        let view = RenderView::from_camera(&self.camera);

        egui::Window::new("Camera")
            .default_pos([12.0, 12.0])
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!(
                    "Position: ({:.1}, {:.1}, {:.1})",
                    transform.position.x, transform.position.y, transform.position.z
                ));
                ui.label(format!(
                    "Rotation: {:.1}° about ({:.2}, {:.2}, {:.2})",
                    angle.to_degrees(),
                    axis.x,
                    axis.y,
                    axis.z
                ));
                ui.label(format!(
                    "Speed: {:.1} ({})",
                    self.camera.effective_move_speed(),
                    if active.is_empty() {
                        "idle".to_string()
                    } else {
                        active.join(" + ")
                    }
                ));
                ui.label(format!(
                    "Visible cubes: {} / {}",
                    view.visible_count(&self.field),
                    self.field.len()
                ));
                if self.frame_time > 0.0 {
                    ui.label(format!(
                        "Frame: {:.1} ms ({:.0} fps)",
                        self.frame_time * 1000.0,
                        1.0 / self.frame_time
                    ));
                }
                ui.separator();
                ui.small("Click: capture mouse | Esc: release | WASD/arrows: move | F1: overlay");
            });
    }
}

/// Window and GPU resources, created once the event loop is resumed.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, state: &AppState, egui_ctx: &EguiContext) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(state.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                state.config.window.width,
                state.config.window.height,
            ));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("cubefield_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(
            &device,
            surface_format,
            config.width,
            config.height,
            &state.field,
        );

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn set_pointer_captured(&self, captured: bool) {
        let grab = if captured {
            self.window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined))
        } else {
            self.window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(e) = grab {
            tracing::warn!("cursor grab failed: {e}");
        }
        self.window.set_cursor_visible(!captured);
    }

    fn draw_overlay(
        &mut self,
        egui_ctx: &EguiContext,
        state: &AppState,
        view: &wgpu::TextureView,
    ) {
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });

        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.state.last_frame)
            .as_secs_f32()
            .min(MAX_FRAME_DELTA);
        self.state.last_frame = now;
        self.state.update(dt);

        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.renderer.render(
            &gpu.device,
            &gpu.queue,
            &view,
            &RenderView::from_camera(&self.state.camera),
        );
        gpu.draw_overlay(&self.egui_ctx, &self.state, &view);

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        match Gpu::new(event_loop, &self.state, &self.egui_ctx) {
            Ok(gpu) => {
                let size = gpu.window.inner_size();
                let aspect = size.width.max(1) as f32 / size.height.max(1) as f32;
                if let Err(e) = self.state.camera.set_aspect_ratio(aspect) {
                    tracing::warn!("keeping configured aspect ratio: {e}");
                }
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to initialize GPU: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                    let aspect = gpu.config.width as f32 / gpu.config.height as f32;
                    if let Err(e) = self.state.camera.set_aspect_ratio(aspect) {
                        tracing::warn!("ignoring resize: {e}");
                    }
                }
            }
            WindowEvent::Focused(false) => {
                self.state.router.release_all();
                self.state.router.set_pointer_captured(false);
                if let Some(gpu) = &self.gpu {
                    gpu.set_pointer_captured(false);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                let capture_changed = self
                    .state
                    .handle_key(key, key_state == ElementState::Pressed);
                if capture_changed {
                    if let Some(gpu) = &self.gpu {
                        gpu.set_pointer_captured(self.state.router.is_pointer_captured());
                    }
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                ..
            } => {
                if !self.state.router.is_pointer_captured() {
                    self.state.router.set_pointer_captured(true);
                    if let Some(gpu) = &self.gpu {
                        gpu.set_pointer_captured(true);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.state.router.mouse_moved(delta.0 as f32, delta.1 as f32);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("cubefield-desktop starting");

    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    let state = AppState::new(config)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
