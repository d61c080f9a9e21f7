use cgmath::{MetricSpace, Point3};

pub type Vertex = Point3<f32>;

/// Default weld tolerance, enough to absorb float noise at shared triangle edges.
pub const DEFAULT_TOLERANCE: f32 = 1e-4;

/// Triangle-soup position buffer. Shared vertices repeat once per incident face.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
  positions: Vec<f32>,
}

impl Mesh {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_flat(positions: Vec<f32>) -> Self {
    assert!(
      positions.len() % 3 == 0,
      "mesh position buffer length {} is not a multiple of 3",
      positions.len()
    );
    Self { positions }
  }

  pub fn push(&mut self, v: Vertex) {
    self.positions.extend_from_slice(&[v.x, v.y, v.z]);
  }

  pub fn push_triangle(&mut self, a: Vertex, b: Vertex, c: Vertex) {
    self.push(a);
    self.push(b);
    self.push(c);
  }

  pub fn vertex_count(&self) -> usize {
    self.positions.len() / 3
  }

  pub fn as_flat(&self) -> &[f32] {
    &self.positions
  }

  pub fn vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
    self
      .positions
      .chunks_exact(3)
      .map(|p| Point3::new(p[0], p[1], p[2]))
  }

  /// Scales every position componentwise.
  #[must_use]
  pub fn scaled(mut self, x: f32, y: f32, z: f32) -> Self {
    for p in self.positions.chunks_exact_mut(3) {
      p[0] *= x;
      p[1] *= y;
      p[2] *= z;
    }
    self
  }
}

/// Welds the mesh into an ordered list of distinct points.
///
/// Each input point joins the first already-kept representative within
/// `tolerance` (inclusive), otherwise it becomes a new representative. Output
/// order is the order in which representatives were first seen, so the result
/// only depends on the input sequence.
#[must_use]
pub fn extract(mesh: &Mesh, tolerance: f32) -> Vec<Vertex> {
  let tolerance = tolerance.max(0.0);
  let tolerance_sq = tolerance * tolerance;
  let mut representatives: Vec<Vertex> = Vec::new();
  for v in mesh.vertices() {
    let merged = if tolerance == 0.0 {
      representatives.iter().any(|r| *r == v)
    } else {
      representatives
        .iter()
        .any(|r| r.distance2(v) <= tolerance_sq)
    };
    if !merged {
      representatives.push(v);
    }
  }
  log::trace!(
    "extracted {} of {} vertices (tolerance {tolerance})",
    representatives.len(),
    mesh.vertex_count()
  );
  representatives
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::{rngs::SmallRng, Rng, SeedableRng};

  fn random_mesh(rng: &mut SmallRng, triangles: usize, extent: f32) -> Mesh {
    let mut mesh = Mesh::new();
    for _ in 0..triangles * 3 {
      mesh.push(Point3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
      ));
    }
    mesh
  }

  #[test]
  fn exact_dedup_keeps_first_seen_order() {
    let a = Point3::new(1.0, 0.0, 0.0);
    let b = Point3::new(0.0, 1.0, 0.0);
    let c = Point3::new(0.0, 0.0, 1.0);
    let mut mesh = Mesh::new();
    mesh.push_triangle(b, a, c);
    mesh.push_triangle(c, a, b);
    assert_eq!(extract(&mesh, 0.0), vec![b, a, c]);
  }

  #[test]
  fn near_duplicates_merge_into_first_representative() {
    let mesh = Mesh::from_flat(vec![
      0.0, 0.0, 0.0, //
      0.00005, 0.0, 0.0, //
      1.0, 0.0, 0.0, //
    ]);
    let out = extract(&mesh, DEFAULT_TOLERANCE);
    assert_eq!(out, vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)]);
    assert_eq!(extract(&mesh, 0.0).len(), 3);
  }

  #[test]
  fn tolerance_is_inclusive() {
    let mesh = Mesh::from_flat(vec![0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 3.0, 0.0, 0.0]);
    assert_eq!(extract(&mesh, 0.5).len(), 2);
    assert_eq!(extract(&mesh, 0.49).len(), 3);
  }

  #[test]
  fn negative_tolerance_behaves_like_exact() {
    let mesh = Mesh::from_flat(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.1, 0.0, 0.0]);
    assert_eq!(extract(&mesh, -1.0), extract(&mesh, 0.0));
  }

  #[test]
  fn output_is_separated_and_covers_input() {
    let mut rng = SmallRng::seed_from_u64(42);
    for &t in &[0.0f32, 0.05, 0.3, 1.0] {
      let mesh = random_mesh(&mut rng, 60, 2.0);
      let out = extract(&mesh, t);
      assert!(out.len() <= mesh.vertex_count());
      for (i, a) in out.iter().enumerate() {
        for b in &out[i + 1..] {
          assert!(a.distance(*b) > t, "representatives {a:?} and {b:?} within {t}");
        }
      }
      for v in mesh.vertices() {
        assert!(out.iter().any(|r| r.distance(v) <= t));
      }
    }
  }

  #[test]
  fn extraction_is_deterministic() {
    let mut rng = SmallRng::seed_from_u64(7);
    let mesh = random_mesh(&mut rng, 100, 1.0);
    let first = extract(&mesh, 0.2);
    for _ in 0..5 {
      assert_eq!(extract(&mesh, 0.2), first);
    }
  }

  #[test]
  fn scaled_mirrors_axis() {
    let mesh = Mesh::from_flat(vec![1.0, 2.0, 3.0]).scaled(1.0, -1.0, 1.0);
    assert_eq!(mesh.as_flat(), &[1.0, -2.0, 3.0]);
  }

  #[test]
  #[should_panic(expected = "not a multiple of 3")]
  fn malformed_buffer_fails_fast() {
    let _ = Mesh::from_flat(vec![0.0, 1.0]);
  }
}
