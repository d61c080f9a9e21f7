use crate::geometry::{extract, Vertex, DEFAULT_TOLERANCE};
use crate::shapes;
use std::fmt;

/// Every reference shape resolves to this many particles.
pub const PARTICLE_COUNT: usize = 144;

pub type Formation = Vec<Vertex>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormationError {
  /// No formations were supplied.
  Empty,
  /// A formation does not match the particle count set by the first one.
  LengthMismatch {
    index: usize,
    expected: usize,
    found: usize,
  },
}

impl fmt::Display for FormationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FormationError::Empty => write!(f, "a formation set needs at least one formation"),
      FormationError::LengthMismatch {
        index,
        expected,
        found,
      } => write!(
        f,
        "formation {index} has {found} vertices but the particle count is {expected}"
      ),
    }
  }
}

impl std::error::Error for FormationError {}

/// Ordered, non-empty list of formations that all drive the same particles.
#[derive(Debug, Clone)]
pub struct FormationSet {
  formations: Vec<Formation>,
}

impl FormationSet {
  pub fn new(formations: Vec<Formation>) -> Result<Self, FormationError> {
    let expected = formations.first().ok_or(FormationError::Empty)?.len();
    if let Some((index, formation)) = formations
      .iter()
      .enumerate()
      .find(|(_, f)| f.len() != expected)
    {
      return Err(FormationError::LengthMismatch {
        index,
        expected,
        found: formation.len(),
      });
    }
    Ok(Self { formations })
  }

  pub fn len(&self) -> usize {
    self.formations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.formations.is_empty()
  }

  pub fn particle_count(&self) -> usize {
    self.formations[0].len()
  }

  /// Panics when `index` is out of range.
  pub fn formation(&self, index: usize) -> &[Vertex] {
    &self.formations[index]
  }

  pub fn iter(&self) -> impl Iterator<Item = &[Vertex]> {
    self.formations.iter().map(Vec::as_slice)
  }
}

#[must_use]
pub fn grid_formation() -> Formation {
  let mesh = shapes::grid(
    shapes::GRID_SIZE,
    shapes::GRID_SIZE,
    shapes::GRID_SEGMENTS,
    shapes::GRID_SEGMENTS,
  );
  extract(&mesh, DEFAULT_TOLERANCE)
}

/// The sphere has more distinct points than there are particles; skip the first
/// and keep the next [`PARTICLE_COUNT`].
#[must_use]
pub fn sphere_formation() -> Formation {
  let mesh = shapes::icosphere(shapes::SPHERE_RADIUS, shapes::SPHERE_DETAIL);
  extract(&mesh, 0.0)
    .into_iter()
    .skip(1)
    .take(PARTICLE_COUNT)
    .collect()
}

#[must_use]
pub fn heart_formation() -> Formation {
  extract(&shapes::heart(), DEFAULT_TOLERANCE)
}

/// Grid, sphere and heart, in cycling order.
pub fn build_formations() -> Result<FormationSet, FormationError> {
  let set = FormationSet::new(vec![grid_formation(), sphere_formation(), heart_formation()])?;
  log::info!(
    "built {} formations of {} particles",
    set.len(),
    set.particle_count()
  );
  Ok(set)
}
