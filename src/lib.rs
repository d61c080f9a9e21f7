pub mod camera;
pub mod controller;
pub mod cycler;
pub mod error;
pub mod formation;
pub mod geometry;
pub mod physics;
pub mod render;
pub mod shapes;
pub mod state;
pub mod swarm;

pub use error::SwarmError;

pub struct SwarmParams {
  pub time_step: f32,
  pub particle_radius: f32,
  pub particle_mass: f32,
  pub gravity: [f32; 3],
}

impl Default for SwarmParams {
  fn default() -> Self {
    Self {
      time_step: 1.0 / 60.0,
      particle_radius: 0.1,
      particle_mass: 1.0,
      gravity: [0.0; 3],
    }
  }
}

pub struct CameraParams {
  pub eye: [f32; 3],
  pub fovy: f32,
  pub speed: f32,
  pub rotational_speed: f32,
  // orbit-control units: 2.0 is one turn every 30 s at 60 fps
  pub auto_rotate_speed: f32,
}

impl Default for CameraParams {
  fn default() -> Self {
    Self {
      eye: [0.0, 25.0, 50.0],
      fovy: 75.0,
      speed: 0.5,
      rotational_speed: 0.02,
      auto_rotate_speed: 10.0,
    }
  }
}

/// Per-instance data uploaded to the GPU every frame.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Particle {
  pub pos: [f32; 3],
}
