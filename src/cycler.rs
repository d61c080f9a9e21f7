use std::time::{Duration, Instant};

/// Fixed period between formation changes.
pub const CYCLE_INTERVAL: Duration = Duration::from_millis(5000);

/// Repeating timer polled from the frame loop.
///
/// A firing re-arms the timer from the moment it fired, so a late poll delays
/// every following tick instead of producing a burst of catch-up ticks.
#[derive(Debug)]
pub struct FormationCycler {
  interval: Duration,
  next_fire: Option<Instant>,
  fired: u64,
}

impl FormationCycler {
  pub fn start(now: Instant) -> Self {
    Self {
      interval: CYCLE_INTERVAL,
      next_fire: Some(now + CYCLE_INTERVAL),
      fired: 0,
    }
  }

  pub fn interval(&self) -> Duration {
    self.interval
  }

  pub fn is_running(&self) -> bool {
    self.next_fire.is_some()
  }

  pub fn fired(&self) -> u64 {
    self.fired
  }

  /// Time left before the next firing, `None` once cancelled.
  pub fn remaining(&self, now: Instant) -> Option<Duration> {
    self
      .next_fire
      .map(|deadline| deadline.saturating_duration_since(now))
  }

  /// Returns true when a tick is due. At most one tick per call.
  pub fn poll(&mut self, now: Instant) -> bool {
    match self.next_fire {
      Some(deadline) if now >= deadline => {
        self.next_fire = Some(now + self.interval);
        self.fired += 1;
        true
      }
      _ => false,
    }
  }

  pub fn cancel(&mut self) {
    if self.next_fire.take().is_some() {
      log::debug!("formation cycler cancelled after {} ticks", self.fired);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fires_once_per_interval() {
    let t0 = Instant::now();
    let mut cycler = FormationCycler::start(t0);
    assert!(!cycler.poll(t0));
    assert!(!cycler.poll(t0 + Duration::from_millis(4999)));
    assert!(cycler.poll(t0 + CYCLE_INTERVAL));
    assert!(!cycler.poll(t0 + CYCLE_INTERVAL));
    assert!(cycler.poll(t0 + CYCLE_INTERVAL * 2));
    assert_eq!(cycler.fired(), 2);
  }

  #[test]
  fn late_poll_does_not_catch_up() {
    let t0 = Instant::now();
    let mut cycler = FormationCycler::start(t0);
    let late = t0 + Duration::from_secs(17);
    assert!(cycler.poll(late));
    assert!(!cycler.poll(late + Duration::from_millis(10)));
    assert_eq!(cycler.remaining(late), Some(CYCLE_INTERVAL));
    assert!(cycler.poll(late + CYCLE_INTERVAL));
  }

  #[test]
  fn cancelled_cycler_never_fires() {
    let t0 = Instant::now();
    let mut cycler = FormationCycler::start(t0);
    cycler.cancel();
    assert!(!cycler.is_running());
    assert!(!cycler.poll(t0 + Duration::from_secs(60)));
    assert_eq!(cycler.remaining(t0), None);
  }
}
