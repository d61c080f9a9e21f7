use crate::camera::{Camera, CameraController, CameraUniform};
use crate::formation::build_formations;
use crate::render::Render;
use crate::swarm::Swarm;
use crate::{CameraParams, SwarmError, SwarmParams};
use std::sync::Arc;
use std::time::Instant;
use wgpu::util::DeviceExt;
use winit::event::ElementState;
use winit::keyboard::*;
use winit::{
  dpi::PhysicalSize,
  event::{Event, KeyEvent, StartCause, WindowEvent},
  event_loop::{EventLoop, EventLoopWindowTarget},
  window::Window,
};

struct EventLoopWrapper {
  event_loop: EventLoop<()>,
  window: Arc<Window>,
}

impl EventLoopWrapper {
  pub fn new(title: &str) -> Result<Self, SwarmError> {
    let event_loop = EventLoop::new()?;
    let mut builder = winit::window::WindowBuilder::new();
    builder = builder.with_title(title).with_resizable(false);
    let window = Arc::new(builder.build(&event_loop)?);

    Ok(Self { event_loop, window })
  }
}

struct SurfaceWrapper {
  surface: Option<wgpu::Surface<'static>>,
  config: Option<wgpu::SurfaceConfiguration>,
}

impl SurfaceWrapper {
  fn new() -> Self {
    Self {
      surface: None,
      config: None,
    }
  }

  fn resume(&mut self, context: &State, window: Arc<Window>) -> Result<(), SwarmError> {
    let window_size = window.inner_size();
    let width = window_size.width.max(1);
    let height = window_size.height.max(1);
    let surface = context.instance.create_surface(window)?;
    let mut config = surface
      .get_default_config(&context.adapter, width, height)
      .ok_or(SwarmError::SurfaceConfig)?;
    let view_format = config.format.add_srgb_suffix();
    config.view_formats.push(view_format);
    surface.configure(&context.device, &config);
    self.surface = Some(surface);
    self.config = Some(config);
    Ok(())
  }

  fn acquire(&mut self, context: &State) -> Option<wgpu::SurfaceTexture> {
    let surface = self.surface.as_ref()?;

    match surface.get_current_texture() {
      Ok(frame) => Some(frame),
      Err(wgpu::SurfaceError::Timeout) => {
        log::warn!("surface timed out, retrying");
        surface.get_current_texture().ok()
      }
      Err(
        e @ (wgpu::SurfaceError::Outdated
        | wgpu::SurfaceError::Lost
        | wgpu::SurfaceError::OutOfMemory),
      ) => {
        log::warn!("surface error ({e}), reconfiguring");
        surface.configure(&context.device, self.config.as_ref()?);
        surface.get_current_texture().ok()
      }
    }
  }

  fn config(&self) -> Option<&wgpu::SurfaceConfiguration> {
    self.config.as_ref()
  }
}

struct State {
  instance: wgpu::Instance,
  adapter: wgpu::Adapter,
  device: wgpu::Device,
  queue: wgpu::Queue,
  camera: Camera,
  camera_uniform: CameraUniform,
  camera_buffer: wgpu::Buffer,
  camera_bind_group: wgpu::BindGroup,
  camera_controller: CameraController,
  camera_bind_group_layout: wgpu::BindGroupLayout,
}

impl State {
  fn input(&mut self, event: &WindowEvent) -> bool {
    self.camera_controller.process_events(event)
  }

  fn update(&mut self) {
    self.camera_controller.update_camera(&mut self.camera);
    self.camera_uniform.update_view_proj(&self.camera);
    self.queue.write_buffer(
      &self.camera_buffer,
      0,
      bytemuck::cast_slice(&[self.camera_uniform]),
    );
  }

  async fn init(
    size: &PhysicalSize<u32>,
    camera_params: &CameraParams,
  ) -> Result<Self, SwarmError> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
      #[cfg(not(target_arch = "wasm32"))]
      backends: wgpu::Backends::PRIMARY,
      ..Default::default()
    });

    let adapter = instance
      .request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: None,
        force_fallback_adapter: false,
      })
      .await
      .ok_or(SwarmError::NoAdapter)?;
    log::info!("using adapter {}", adapter.get_info().name);

    let (device, queue) = adapter
      .request_device(
        &wgpu::DeviceDescriptor {
          label: None,
          required_features: wgpu::Features::empty(),
          required_limits: wgpu::Limits::default(),
          memory_hints: Default::default(),
        },
        None,
      )
      .await?;

    let camera = Camera::new(
      camera_params,
      size.width.max(1) as f32 / size.height.max(1) as f32,
    );
    let mut camera_uniform = CameraUniform::new();
    camera_uniform.update_view_proj(&camera);

    let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Camera Buffer"),
      contents: bytemuck::cast_slice(&[camera_uniform]),
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let camera_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::VERTEX,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
          },
          count: None,
        }],
        label: Some("camera_bind_group_layout"),
      });
    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &camera_bind_group_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: camera_buffer.as_entire_binding(),
      }],
      label: Some("camera_bind_group"),
    });
    let camera_controller = CameraController::init(camera_params);

    Ok(Self {
      instance,
      adapter,
      device,
      queue,
      camera,
      camera_uniform,
      camera_buffer,
      camera_bind_group,
      camera_controller,
      camera_bind_group_layout,
    })
  }
}

async fn start(params: SwarmParams, camera_params: CameraParams) -> Result<(), SwarmError> {
  let formations = build_formations()?;
  let EventLoopWrapper { event_loop, window } = EventLoopWrapper::new("Formation Swarm")?;
  let mut surface = SurfaceWrapper::new();
  let mut context = State::init(&window.inner_size(), &camera_params).await?;
  let mut swarm = Swarm::new(formations, &params, Instant::now());
  let mut renderer: Option<Render> = None;
  let mut failure: Option<SwarmError> = None;

  event_loop.run(|event, target: &EventLoopWindowTarget<()>| match event {
    Event::NewEvents(StartCause::Init) => {
      if let Err(e) = surface.resume(&context, window.clone()) {
        failure = Some(e);
        target.exit();
        return;
      }
      if renderer.is_none() {
        if let Some(config) = surface.config() {
          renderer = Some(Render::init(
            config,
            &context.device,
            &context.camera_bind_group_layout,
            &swarm.particles(),
            params.particle_radius,
          ));
        }
      }
    }
    Event::WindowEvent { event, window_id } if window_id == window.id() => {
      if !context.input(&event) {
        match event {
          WindowEvent::CloseRequested
          | WindowEvent::KeyboardInput {
            event:
              KeyEvent {
                state: ElementState::Pressed,
                physical_key: PhysicalKey::Code(KeyCode::Escape),
                ..
              },
            ..
          } => {
            swarm.shutdown();
            target.exit();
          }
          WindowEvent::RedrawRequested => {
            window.request_redraw();
            let Some(render) = renderer.as_mut() else {
              return;
            };
            if let Some(index) = swarm.tick(Instant::now()) {
              log::info!("morphing to formation {index}");
            }
            context.update();
            let (Some(frame), Some(config)) = (surface.acquire(&context), surface.config()) else {
              return;
            };
            let view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
              format: Some(config.view_formats[0]),
              ..wgpu::TextureViewDescriptor::default()
            });
            render.render(
              &view,
              &context.device,
              &context.queue,
              &context.camera_bind_group,
              &swarm.particles(),
            );
            frame.present();
            log::trace!("mean error {:.4}", swarm.mean_error());
          }
          _ => {}
        }
      }
    }
    _ => {}
  })?;

  match failure {
    Some(e) => Err(e),
    None => Ok(()),
  }
}

pub fn run(params: SwarmParams, camera_params: CameraParams) -> Result<(), SwarmError> {
  pollster::block_on(start(params, camera_params))
}
