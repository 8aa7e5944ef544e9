use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

mod config;
mod renderer;
mod scene;

use config::DemoConfig;
use glam::Vec3;
use renderer::GpuState;
use scene::Spin;

struct App {
    config: DemoConfig,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,

    spin: Spin,

    last_frame: Instant,
    frame_count: u32,
    fps_timer: Instant,

    init_error: Option<anyhow::Error>,
}

impl App {
    fn new() -> Self {
        let config = DemoConfig::default();
        let spin = Spin::new(config.rotation_rate_deg, Vec3::from(config.rotation_axis));

        Self {
            config,
            window: None,
            gpu: None,
            spin,
            last_frame: Instant::now(),
            frame_count: 0,
            fps_timer: Instant::now(),
            init_error: None,
        }
    }

    fn update(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.spin.advance(dt);

        self.frame_count += 1;
        if self.fps_timer.elapsed().as_secs_f32() >= 1.0 {
            let fps = self.frame_count as f32 / self.fps_timer.elapsed().as_secs_f32();
            log::debug!("{fps:.1} fps, angle {:.1} deg", self.spin.angle_deg());
            self.frame_count = 0;
            self.fps_timer = Instant::now();
        }
    }

    fn render(&mut self) {
        let Some(gpu) = &mut self.gpu else { return };
        let Some(window) = &self.window else { return };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.resize(gpu.size);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                panic!("Out of GPU memory");
            }
            Err(wgpu::SurfaceError::Timeout) => {
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.prepare_frame(self.spin.model_matrix());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        gpu.render(&view, &mut encoder);

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window_attrs = Window::default_attributes()
            .with_title(self.config.window_title)
            .with_inner_size(PhysicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.init_error = Some(anyhow::Error::from(e).context("failed to create window"));
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(GpuState::new(window.clone(), &self.config)) {
            Ok(gpu) => {
                self.window = Some(window);
                self.gpu = Some(gpu);
            }
            Err(e) => {
                self.init_error =
                    Some(anyhow::Error::from(e).context("failed to initialize renderer"));
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                // Only the surface follows the window; the projection keeps
                // the startup aspect.
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                    && event.state == ElementState::Pressed
                {
                    event_loop.exit();
                }
            }

            WindowEvent::RedrawRequested => {
                self.update();
                self.render();
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn run() -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app)?;

    if let Some(e) = app.init_error.take() {
        return Err(e);
    }

    log::info!("shut down cleanly");
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{e:#}");
        std::process::exit(-1);
    }
}
