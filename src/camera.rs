use crate::CameraParams;
use cgmath::{InnerSpace, Rad, Rotation, Rotation3, SquareMatrix};
use std::f32::consts::PI;
use winit::{
  dpi::PhysicalPosition,
  event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
  keyboard::{KeyCode, PhysicalKey},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

pub struct Camera {
  pub eye: cgmath::Point3<f32>,
  pub target: cgmath::Point3<f32>,
  pub up: cgmath::Vector3<f32>,
  pub aspect: f32,
  pub fovy: f32,
  pub znear: f32,
  pub zfar: f32,
}

impl Camera {
  /// Looks at the origin from `params.eye`.
  pub fn new(params: &CameraParams, aspect: f32) -> Self {
    Self {
      eye: params.eye.into(),
      target: (0.0, 0.0, 0.0).into(),
      up: cgmath::Vector3::unit_y(),
      aspect,
      fovy: params.fovy,
      znear: 0.1,
      zfar: 1000.0,
    }
  }

  fn build_view_projection_matrix(&self) -> cgmath::Matrix4<f32> {
    let view = cgmath::Matrix4::look_at_rh(self.eye, self.target, self.up);
    let proj = cgmath::perspective(cgmath::Deg(self.fovy), self.aspect, self.znear, self.zfar);
    OPENGL_TO_WGPU_MATRIX * proj * view
  }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
  view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
  pub fn new() -> Self {
    Self {
      view_proj: cgmath::Matrix4::identity().into(),
    }
  }

  pub fn update_view_proj(&mut self, camera: &Camera) {
    self.view_proj = camera.build_view_projection_matrix().into();
  }
}

impl Default for CameraUniform {
  fn default() -> Self {
    Self::new()
  }
}

/// Orbit angle per frame for an orbit-control style auto-rotate speed
/// (2.0 is one full turn every 30 s at 60 fps).
pub fn auto_rotate_angle(speed: f32) -> f32 {
  2.0 * PI / 60.0 / 60.0 * speed
}

const ORBIT_RADIANS_PER_PIXEL: f32 = 0.005;
const ZOOM_PER_LINE: f32 = 0.95;
const MIN_DISTANCE: f32 = 1.0;

/// Keys move and tilt the camera. Dragging with the left button orbits it
/// around the target and the wheel zooms, the way orbit controls do.
pub struct CameraController {
  speed: f32,
  rotation_speed: f32,
  auto_rotate: f32,
  is_forward_pressed: bool,
  is_backward_pressed: bool,
  is_left_pressed: bool,
  is_right_pressed: bool,
  is_rotate_up_pressed: bool,
  is_rotate_down_pressed: bool,
  is_dragging: bool,
  cursor: Option<PhysicalPosition<f64>>,
  orbit: (f32, f32),
  zoom_lines: f32,
}

impl CameraController {
  pub fn init(params: &CameraParams) -> Self {
    Self {
      speed: params.speed,
      rotation_speed: params.rotational_speed,
      auto_rotate: auto_rotate_angle(params.auto_rotate_speed),
      is_forward_pressed: false,
      is_backward_pressed: false,
      is_left_pressed: false,
      is_right_pressed: false,
      is_rotate_up_pressed: false,
      is_rotate_down_pressed: false,
      is_dragging: false,
      cursor: None,
      orbit: (0.0, 0.0),
      zoom_lines: 0.0,
    }
  }

  /// Queues an orbit by a cursor movement in pixels.
  pub fn drag(&mut self, dx: f32, dy: f32) {
    self.orbit.0 += dx;
    self.orbit.1 += dy;
  }

  /// Queues a zoom; positive lines move the camera closer.
  pub fn zoom(&mut self, lines: f32) {
    self.zoom_lines += lines;
  }

  pub fn process_events(&mut self, event: &WindowEvent) -> bool {
    match event {
      WindowEvent::KeyboardInput {
        event:
          KeyEvent {
            state,
            physical_key: PhysicalKey::Code(keycode),
            ..
          },
        ..
      } => {
        let is_pressed = *state == ElementState::Pressed;
        match keycode {
          KeyCode::KeyW | KeyCode::ArrowUp => {
            self.is_forward_pressed = is_pressed;
            true
          }
          KeyCode::KeyA | KeyCode::ArrowLeft => {
            self.is_left_pressed = is_pressed;
            true
          }
          KeyCode::KeyS | KeyCode::ArrowDown => {
            self.is_backward_pressed = is_pressed;
            true
          }
          KeyCode::KeyD | KeyCode::ArrowRight => {
            self.is_right_pressed = is_pressed;
            true
          }
          KeyCode::KeyQ => {
            self.is_rotate_up_pressed = is_pressed;
            true
          }
          KeyCode::KeyE => {
            self.is_rotate_down_pressed = is_pressed;
            true
          }
          _ => false,
        }
      }
      WindowEvent::MouseInput {
        state,
        button: MouseButton::Left,
        ..
      } => {
        self.is_dragging = *state == ElementState::Pressed;
        true
      }
      WindowEvent::CursorMoved { position, .. } => {
        if let (true, Some(last)) = (self.is_dragging, self.cursor) {
          self.drag((position.x - last.x) as f32, (position.y - last.y) as f32);
        }
        self.cursor = Some(*position);
        self.is_dragging
      }
      WindowEvent::MouseWheel { delta, .. } => {
        self.zoom(match delta {
          MouseScrollDelta::LineDelta(_, y) => *y,
          MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
        });
        true
      }
      _ => false,
    }
  }

  pub fn update_camera(&mut self, camera: &mut Camera) {
    if self.auto_rotate != 0.0 {
      let spin = cgmath::Quaternion::from_angle_y(Rad(self.auto_rotate));
      camera.eye = camera.target + spin.rotate_vector(camera.eye - camera.target);
      camera.up = spin.rotate_vector(camera.up);
    }

    let (dx, dy) = std::mem::take(&mut self.orbit);
    if dx != 0.0 || dy != 0.0 {
      let offset = camera.eye - camera.target;
      let right = camera.up.cross(offset).normalize();
      let yaw = cgmath::Quaternion::from_angle_y(Rad(-dx * ORBIT_RADIANS_PER_PIXEL));
      let pitch = cgmath::Quaternion::from_axis_angle(right, Rad(-dy * ORBIT_RADIANS_PER_PIXEL));
      let spin = yaw * pitch;
      camera.eye = camera.target + spin.rotate_vector(offset);
      camera.up = spin.rotate_vector(camera.up);
    }

    let lines = std::mem::take(&mut self.zoom_lines);
    if lines != 0.0 {
      let offset = camera.eye - camera.target;
      let distance = (offset.magnitude() * ZOOM_PER_LINE.powf(lines)).max(MIN_DISTANCE);
      camera.eye = camera.target + offset.normalize() * distance;
    }

    let forward = camera.target - camera.eye;
    let forward_norm = forward.normalize();
    let forward_mag = forward.magnitude();

    if self.is_forward_pressed && forward_mag > self.speed {
      camera.eye += forward_norm * self.speed;
    }
    if self.is_backward_pressed {
      camera.eye -= forward_norm * self.speed;
    }

    let right = forward_norm.cross(camera.up);

    if self.is_right_pressed {
      camera.eye = camera.target - (forward + right * self.speed).normalize() * forward_mag;
    }
    if self.is_left_pressed {
      camera.eye = camera.target - (forward - right * self.speed).normalize() * forward_mag;
    }

    if self.is_rotate_up_pressed || self.is_rotate_down_pressed {
      let sign = if self.is_rotate_up_pressed { 1.0 } else { -1.0 };
      let rotation =
        cgmath::Quaternion::from_axis_angle(right.normalize(), Rad(sign * self.rotation_speed));
      camera.eye = camera.target - rotation.rotate_vector(forward);
      camera.up = rotation.rotate_vector(camera.up);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use cgmath::MetricSpace;

  #[test]
  fn auto_rotate_matches_orbit_controls_period() {
    // speed 10: a full turn every 360 frames
    let turn: f32 = (0..360).map(|_| auto_rotate_angle(10.0)).sum();
    assert!((turn - 2.0 * PI).abs() < 1e-3);
  }

  #[test]
  fn auto_rotate_keeps_distance_and_height() {
    let params = CameraParams::default();
    let mut camera = Camera::new(&params, 1.0);
    let mut controller = CameraController::init(&params);
    let distance = camera.eye.distance(camera.target);
    for _ in 0..90 {
      controller.update_camera(&mut camera);
    }
    assert!((camera.eye.distance(camera.target) - distance).abs() < 1e-3);
    assert!((camera.eye.y - 25.0).abs() < 1e-3);
    // a quarter turn from +z lands on the x axis
    assert!(camera.eye.z.abs() < 1e-2);
  }

  fn still_params() -> CameraParams {
    CameraParams {
      auto_rotate_speed: 0.0,
      ..CameraParams::default()
    }
  }

  #[test]
  fn horizontal_drag_orbits_at_constant_distance_and_height() {
    let params = still_params();
    let mut camera = Camera::new(&params, 1.0);
    let mut controller = CameraController::init(&params);
    let start = camera.eye;
    let distance = camera.eye.distance(camera.target);
    controller.drag(120.0, 0.0);
    controller.update_camera(&mut camera);
    assert!((camera.eye.distance(camera.target) - distance).abs() < 1e-3);
    assert!((camera.eye.y - start.y).abs() < 1e-3);
    assert!(camera.eye.distance(start) > 1.0);

    // the drag is consumed by one update
    let moved = camera.eye;
    controller.update_camera(&mut camera);
    assert!(camera.eye.distance(moved) < 1e-6);
  }

  #[test]
  fn vertical_drag_tilts_without_changing_distance() {
    let params = still_params();
    let mut camera = Camera::new(&params, 1.0);
    let mut controller = CameraController::init(&params);
    let distance = camera.eye.distance(camera.target);
    controller.drag(0.0, 50.0);
    controller.update_camera(&mut camera);
    assert!((camera.eye.distance(camera.target) - distance).abs() < 1e-3);
    assert!((camera.eye.y - params.eye[1]).abs() > 1e-2);
    assert!(camera.eye.x.abs() < 1e-3);
  }

  #[test]
  fn wheel_zooms_towards_target_and_stops_short_of_it() {
    let params = still_params();
    let mut camera = Camera::new(&params, 1.0);
    let mut controller = CameraController::init(&params);
    let distance = camera.eye.distance(camera.target);
    controller.zoom(1.0);
    controller.update_camera(&mut camera);
    assert!((camera.eye.distance(camera.target) - distance * 0.95).abs() < 1e-3);

    controller.zoom(1000.0);
    controller.update_camera(&mut camera);
    assert!((camera.eye.distance(camera.target) - MIN_DISTANCE).abs() < 1e-4);
  }
}
