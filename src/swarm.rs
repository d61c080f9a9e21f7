use crate::controller::ParticleController;
use crate::cycler::FormationCycler;
use crate::formation::{build_formations, FormationSet};
use crate::physics::World;
use crate::{Particle, SwarmError, SwarmParams};
use cgmath::{MetricSpace, Vector3};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Physics world, controller and cycler wired together.
///
/// Dropping the swarm cancels the cycler and releases every position observer.
pub struct Swarm {
  world: World,
  controller: ParticleController,
  cycler: FormationCycler,
  time_step: f32,
  transitions: u64,
}

impl Swarm {
  /// Places particle `j` on vertex `j` of the first formation.
  pub fn new(formations: FormationSet, params: &SwarmParams, now: Instant) -> Self {
    let formations = Rc::new(formations);
    let mut world = World::new(
      formations.formation(0),
      params.particle_mass,
      params.particle_radius,
    )
    .with_gravity(Vector3::from(params.gravity));
    let controller = ParticleController::new(Rc::clone(&formations), &mut world);
    log::info!(
      "swarm of {} particles over {} formations",
      formations.particle_count(),
      formations.len()
    );
    Self {
      world,
      controller,
      cycler: FormationCycler::start(now),
      time_step: params.time_step,
      transitions: 0,
    }
  }

  /// One frame: maybe change formation, then advance the physics by one step.
  /// Returns the new formation index when it changed.
  pub fn tick(&mut self, now: Instant) -> Option<usize> {
    let changed = if self.cycler.poll(now) {
      self.transitions += 1;
      Some(self.controller.advance(&mut self.world))
    } else {
      None
    };
    self.world.step(self.time_step);
    changed
  }

  pub fn particle_count(&self) -> usize {
    self.world.bodies().len()
  }

  pub fn active_formation(&self) -> usize {
    self.controller.active()
  }

  pub fn transitions(&self) -> u64 {
    self.transitions
  }

  pub fn world(&self) -> &World {
    &self.world
  }

  pub fn is_running(&self) -> bool {
    self.cycler.is_running()
  }

  pub fn particles(&self) -> Vec<Particle> {
    self
      .world
      .bodies()
      .iter()
      .map(|b| Particle {
        pos: b.position.into(),
      })
      .collect()
  }

  /// Mean distance between each particle and its current target.
  pub fn mean_error(&self) -> f32 {
    let targets = self
      .controller
      .formations()
      .formation(self.controller.active());
    let total: f32 = self
      .world
      .bodies()
      .iter()
      .zip(targets)
      .map(|(b, t)| b.position.distance(*t))
      .sum();
    total / self.particle_count().max(1) as f32
  }

  pub fn shutdown(&mut self) {
    if !self.cycler.is_running() {
      return;
    }
    self.cycler.cancel();
    self.controller.release(&mut self.world);
    log::info!("swarm shut down after {} transitions", self.transitions);
  }
}

impl Drop for Swarm {
  fn drop(&mut self) {
    self.shutdown();
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessReport {
  pub frames: u64,
  pub transitions: u64,
  pub active_formation: usize,
  pub mean_error: f32,
}

/// Runs the swarm without a window on a virtual clock that advances by one
/// time step per frame. Stops early once `stop` is set.
pub fn run_headless(
  params: &SwarmParams,
  frames: u64,
  stop: &AtomicBool,
) -> Result<HeadlessReport, SwarmError> {
  let formations = build_formations()?;
  let start = Instant::now();
  let frame_time = Duration::from_secs_f32(params.time_step);
  let mut swarm = Swarm::new(formations, params, start);

  let mut frame = 0;
  while frame < frames && !stop.load(Ordering::Relaxed) {
    frame += 1;
    let now = frame_instant(start, frame_time, frame);
    if let Some(index) = swarm.tick(now) {
      log::info!(
        "frame {frame}: formation {index}, mean error {:.4}",
        swarm.mean_error()
      );
    }
  }
  if frame < frames {
    log::warn!("interrupted after {frame} of {frames} frames");
  }

  let report = HeadlessReport {
    frames: frame,
    transitions: swarm.transitions(),
    active_formation: swarm.active_formation(),
    mean_error: swarm.mean_error(),
  };
  swarm.shutdown();
  Ok(report)
}

// Exact for any frame count, however long the run.
fn frame_instant(start: Instant, frame_time: Duration, frame: u64) -> Instant {
  let nanos = frame_time.as_nanos().saturating_mul(u128::from(frame));
  let secs = u64::try_from(nanos / 1_000_000_000).unwrap_or(u64::MAX);
  start + Duration::new(secs, (nanos % 1_000_000_000) as u32)
}
