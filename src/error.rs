//! Error types for start-up failures.
//!
//! Nothing here is recoverable at run time. `main` logs the error and exits.

use crate::formation::FormationError;
use std::fmt;

#[derive(Debug)]
pub enum SwarmError {
  /// Formations did not pass validation.
  Formation(FormationError),
  /// The windowing event loop could not be created or failed while running.
  EventLoop(winit::error::EventLoopError),
  /// The window could not be opened.
  Window(winit::error::OsError),
  /// Failed to create a surface for rendering.
  SurfaceCreation(wgpu::CreateSurfaceError),
  /// No compatible GPU adapter found.
  NoAdapter,
  /// Failed to create GPU device.
  DeviceCreation(wgpu::RequestDeviceError),
  /// The surface reported no usable configuration for this adapter.
  SurfaceConfig,
  /// The Ctrl-C handler could not be installed.
  Signal(ctrlc::Error),
}

impl fmt::Display for SwarmError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SwarmError::Formation(e) => write!(f, "invalid formations: {}", e),
      SwarmError::EventLoop(e) => write!(f, "event loop error: {}", e),
      SwarmError::Window(e) => write!(f, "failed to open window: {}", e),
      SwarmError::SurfaceCreation(e) => write!(f, "failed to create GPU surface: {}", e),
      SwarmError::NoAdapter => write!(f, "no compatible GPU adapter found"),
      SwarmError::DeviceCreation(e) => write!(f, "failed to create GPU device: {}", e),
      SwarmError::SurfaceConfig => write!(f, "surface is not supported by the adapter"),
      SwarmError::Signal(e) => write!(f, "failed to install Ctrl-C handler: {}", e),
    }
  }
}

impl std::error::Error for SwarmError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      SwarmError::Formation(e) => Some(e),
      SwarmError::EventLoop(e) => Some(e),
      SwarmError::Window(e) => Some(e),
      SwarmError::SurfaceCreation(e) => Some(e),
      SwarmError::DeviceCreation(e) => Some(e),
      SwarmError::Signal(e) => Some(e),
      SwarmError::NoAdapter | SwarmError::SurfaceConfig => None,
    }
  }
}

impl From<FormationError> for SwarmError {
  fn from(e: FormationError) -> Self {
    SwarmError::Formation(e)
  }
}

impl From<winit::error::EventLoopError> for SwarmError {
  fn from(e: winit::error::EventLoopError) -> Self {
    SwarmError::EventLoop(e)
  }
}

impl From<winit::error::OsError> for SwarmError {
  fn from(e: winit::error::OsError) -> Self {
    SwarmError::Window(e)
  }
}

impl From<wgpu::CreateSurfaceError> for SwarmError {
  fn from(e: wgpu::CreateSurfaceError) -> Self {
    SwarmError::SurfaceCreation(e)
  }
}

impl From<wgpu::RequestDeviceError> for SwarmError {
  fn from(e: wgpu::RequestDeviceError) -> Self {
    SwarmError::DeviceCreation(e)
  }
}

impl From<ctrlc::Error> for SwarmError {
  fn from(e: ctrlc::Error) -> Self {
    SwarmError::Signal(e)
  }
}
