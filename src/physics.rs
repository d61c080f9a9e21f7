//! Minimal rigid-body world standing in for a full physics engine.
//!
//! Bodies are spheres integrated with semi-implicit Euler. Position
//! observers registered through [`PositionFeed`] run at the start of every
//! step, before integration, and may overwrite the body's velocity.

use cgmath::{Point3, Vector3, Zero};
use std::collections::BTreeMap;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Write access to one body's velocity, handed to observers.
pub struct BodyControl<'a> {
  velocity: &'a mut Vector3<f32>,
}

impl BodyControl<'_> {
  pub fn set_velocity(&mut self, x: f32, y: f32, z: f32) {
    *self.velocity = Vector3::new(x, y, z);
  }

  pub fn velocity(&self) -> Vector3<f32> {
    *self.velocity
  }
}

pub type PositionObserver = Box<dyn FnMut(Point3<f32>, &mut BodyControl<'_>)>;

/// Register/unregister capability pair for per-body position reports.
pub trait PositionFeed {
  fn body_count(&self) -> usize;
  fn subscribe(&mut self, body: usize, observer: PositionObserver) -> SubscriptionId;
  /// Returns false if `id` was not live.
  fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
  fn subscription_count(&self) -> usize;
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Body {
  pub position: Point3<f32>,
  pub velocity: Vector3<f32>,
  pub mass: f32,
  pub radius: f32,
}

struct Subscription {
  body: usize,
  observer: PositionObserver,
}

pub struct World {
  bodies: Vec<Body>,
  gravity: Vector3<f32>,
  subscriptions: BTreeMap<SubscriptionId, Subscription>,
  next_id: u64,
  steps: u64,
}

impl World {
  /// One resting sphere per initial position.
  pub fn new(positions: &[Point3<f32>], mass: f32, radius: f32) -> Self {
    let bodies = positions
      .iter()
      .map(|&position| Body {
        position,
        velocity: Vector3::zero(),
        mass,
        radius,
      })
      .collect();
    Self {
      bodies,
      gravity: Vector3::zero(),
      subscriptions: BTreeMap::new(),
      next_id: 0,
      steps: 0,
    }
  }

  #[must_use]
  pub fn with_gravity(mut self, gravity: Vector3<f32>) -> Self {
    self.gravity = gravity;
    self
  }

  pub fn gravity(&self) -> Vector3<f32> {
    self.gravity
  }

  pub fn bodies(&self) -> &[Body] {
    &self.bodies
  }

  pub fn body(&self, index: usize) -> &Body {
    &self.bodies[index]
  }

  pub fn set_velocity(&mut self, index: usize, velocity: Vector3<f32>) {
    self.bodies[index].velocity = velocity;
  }

  pub fn steps(&self) -> u64 {
    self.steps
  }

  /// Fires every live observer with its body's current position, in
  /// subscription order.
  pub fn report_positions(&mut self) {
    let bodies = &mut self.bodies;
    for subscription in self.subscriptions.values_mut() {
      let body = &mut bodies[subscription.body];
      let mut control = BodyControl {
        velocity: &mut body.velocity,
      };
      (subscription.observer)(body.position, &mut control);
    }
  }

  pub fn step(&mut self, dt: f32) {
    self.report_positions();
    for body in &mut self.bodies {
      body.velocity += self.gravity * dt;
      body.position += body.velocity * dt;
    }
    self.steps += 1;
    log::trace!("physics step {} (dt {dt})", self.steps);
  }
}

impl PositionFeed for World {
  fn body_count(&self) -> usize {
    self.bodies.len()
  }

  fn subscribe(&mut self, body: usize, observer: PositionObserver) -> SubscriptionId {
    assert!(
      body < self.bodies.len(),
      "cannot subscribe to body {body}: world has {} bodies",
      self.bodies.len()
    );
    let id = SubscriptionId(self.next_id);
    self.next_id += 1;
    self.subscriptions.insert(id, Subscription { body, observer });
    id
  }

  fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
    self.subscriptions.remove(&id).is_some()
  }

  fn subscription_count(&self) -> usize {
    self.subscriptions.len()
  }
}
