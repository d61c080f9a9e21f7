use crate::formation::FormationSet;
use crate::physics::{BodyControl, PositionFeed, SubscriptionId};
use cgmath::Point3;
use std::rc::Rc;

/// Steers every particle toward its vertex in the active formation.
///
/// Each particle gets one standing position observer that sets its velocity to
/// `target - position` whenever the feed reports a position: a proportional
/// controller with unit gain and no damping. Changing formation swaps the whole
/// observer set in one call, old ones released before new ones are installed.
pub struct ParticleController {
  formations: Rc<FormationSet>,
  active: usize,
  subscriptions: Vec<SubscriptionId>,
}

impl ParticleController {
  /// Starts tracking formation 0.
  pub fn new<F: PositionFeed>(formations: Rc<FormationSet>, feed: &mut F) -> Self {
    assert_eq!(
      feed.body_count(),
      formations.particle_count(),
      "physics world must hold one body per particle"
    );
    let mut controller = Self {
      formations,
      active: 0,
      subscriptions: Vec::new(),
    };
    controller.subscriptions = controller.subscribe_active(feed);
    controller
  }

  pub fn active(&self) -> usize {
    self.active
  }

  pub fn formations(&self) -> &FormationSet {
    &self.formations
  }

  pub fn live_subscriptions(&self) -> usize {
    self.subscriptions.len()
  }

  /// Moves to the next formation, wrapping after the last one.
  pub fn advance<F: PositionFeed>(&mut self, feed: &mut F) -> usize {
    let next = (self.active + 1) % self.formations.len();
    self.enter(next, feed);
    next
  }

  /// Switches to formation `index`, panicking if it does not exist.
  pub fn enter<F: PositionFeed>(&mut self, index: usize, feed: &mut F) {
    assert!(
      index < self.formations.len(),
      "formation {index} out of range ({} formations)",
      self.formations.len()
    );
    self.release(feed);
    self.active = index;
    self.subscriptions = self.subscribe_active(feed);
    log::info!("tracking formation {index}");
  }

  /// Unsubscribes every observer of the current formation.
  pub fn release<F: PositionFeed>(&mut self, feed: &mut F) {
    for id in self.subscriptions.drain(..) {
      feed.unsubscribe(id);
    }
  }

  fn subscribe_active<F: PositionFeed>(&self, feed: &mut F) -> Vec<SubscriptionId> {
    self
      .formations
      .formation(self.active)
      .iter()
      .enumerate()
      .map(|(body, &target)| {
        feed.subscribe(
          body,
          Box::new(move |position: Point3<f32>, control: &mut BodyControl<'_>| {
            let error = target - position;
            control.set_velocity(error.x, error.y, error.z);
          }),
        )
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::formation::Formation;
  use crate::physics::World;
  use cgmath::Vector3;
  use rand::{rngs::SmallRng, Rng, SeedableRng};

  fn scatter(rng: &mut SmallRng, n: usize) -> Formation {
    (0..n)
      .map(|_| {
        Point3::new(
          rng.gen_range(-10.0..10.0),
          rng.gen_range(-10.0..10.0),
          rng.gen_range(-10.0..10.0),
        )
      })
      .collect()
  }

  fn setup(count: usize, formations: usize) -> (Rc<FormationSet>, World) {
    let mut rng = SmallRng::seed_from_u64(42);
    let set = FormationSet::new((0..formations).map(|_| scatter(&mut rng, count)).collect())
      .unwrap();
    let world = World::new(set.formation(0), 1.0, 0.1);
    (Rc::new(set), world)
  }

  #[test]
  fn starts_on_first_formation() {
    let (set, mut world) = setup(8, 3);
    let controller = ParticleController::new(Rc::clone(&set), &mut world);
    assert_eq!(controller.active(), 0);
    assert_eq!(world.subscription_count(), 8);
    for (body, target) in world.bodies().iter().zip(set.formation(0)) {
      assert_eq!(body.position, *target);
    }
  }

  #[test]
  fn velocity_is_exact_position_error() {
    let mut rng = SmallRng::seed_from_u64(3);
    for _ in 0..50 {
      let start = scatter(&mut rng, 4);
      let targets = scatter(&mut rng, 4);
      let set = Rc::new(FormationSet::new(vec![start.clone(), targets.clone()]).unwrap());
      let mut world = World::new(&start, 1.0, 0.1);
      let mut controller = ParticleController::new(set, &mut world);
      controller.advance(&mut world);
      world.report_positions();
      for (j, body) in world.bodies().iter().enumerate() {
        let expected: Vector3<f32> = targets[j] - start[j];
        assert_eq!(body.velocity, expected);
      }
    }
  }

  #[test]
  fn advance_wraps_around() {
    let (set, mut world) = setup(5, 3);
    let mut controller = ParticleController::new(set, &mut world);
    assert_eq!(controller.advance(&mut world), 1);
    assert_eq!(controller.advance(&mut world), 2);
    assert_eq!(controller.advance(&mut world), 0);
  }

  #[test]
  fn transitions_do_not_accumulate_subscriptions() {
    let (set, mut world) = setup(16, 3);
    let mut controller = ParticleController::new(set, &mut world);
    for _ in 0..10 {
      controller.advance(&mut world);
      world.step(1.0 / 60.0);
      assert_eq!(world.subscription_count(), 16);
      assert_eq!(controller.live_subscriptions(), 16);
    }
  }

  #[test]
  fn release_removes_every_observer() {
    let (set, mut world) = setup(6, 2);
    let mut controller = ParticleController::new(set, &mut world);
    controller.release(&mut world);
    assert_eq!(world.subscription_count(), 0);
    let before: Vec<_> = world.bodies().to_vec();
    world.step(1.0 / 60.0);
    assert_eq!(world.bodies(), &before[..]);
  }

  #[test]
  fn particles_converge_on_target() {
    let (set, mut world) = setup(10, 2);
    let mut controller = ParticleController::new(Rc::clone(&set), &mut world);
    controller.advance(&mut world);
    for _ in 0..2000 {
      world.step(1.0 / 60.0);
    }
    for (body, target) in world.bodies().iter().zip(set.formation(1)) {
      assert!((body.position - *target).x.abs() < 1e-3);
      assert!((body.position - *target).y.abs() < 1e-3);
      assert!((body.position - *target).z.abs() < 1e-3);
    }
  }

  #[test]
  #[should_panic(expected = "one body per particle")]
  fn world_size_must_match_particle_count() {
    let (set, _) = setup(4, 2);
    let mut small = World::new(&set.formation(0)[..2], 1.0, 0.1);
    let _ = ParticleController::new(set, &mut small);
  }
}
