//! Procedural meshes for the three formations.
//!
//! Every generator returns a triangle soup, so vertices shared between faces
//! appear once per face and are welded later by [`crate::geometry::extract`].

use crate::geometry::{Mesh, Vertex};
use cgmath::{EuclideanSpace, InnerSpace, Point2, Point3, Vector3, Zero};

pub const GRID_SIZE: f32 = 5.0;
pub const GRID_SEGMENTS: u32 = 11;
pub const SPHERE_RADIUS: f32 = 5.0;
pub const SPHERE_DETAIL: u32 = 3;
pub const HEART_DEPTH: f32 = 1.0;
pub const CURVE_DIVISIONS: u32 = 12;

/// Flat plane in the XY plane centred on the origin.
#[must_use]
pub fn grid(width: f32, height: f32, segments_x: u32, segments_y: u32) -> Mesh {
  let columns = segments_x + 1;
  let segment_width = width / segments_x as f32;
  let segment_height = height / segments_y as f32;

  let mut points = Vec::with_capacity((columns * (segments_y + 1)) as usize);
  for iy in 0..=segments_y {
    let y = iy as f32 * segment_height - height / 2.0;
    for ix in 0..=segments_x {
      let x = ix as f32 * segment_width - width / 2.0;
      points.push(Point3::new(x, -y, 0.0));
    }
  }

  let mut mesh = Mesh::new();
  for iy in 0..segments_y {
    for ix in 0..segments_x {
      let a = (ix + columns * iy) as usize;
      let b = (ix + columns * (iy + 1)) as usize;
      let c = (ix + 1 + columns * (iy + 1)) as usize;
      let d = (ix + 1 + columns * iy) as usize;
      mesh.push_triangle(points[a], points[b], points[d]);
      mesh.push_triangle(points[b], points[c], points[d]);
    }
  }
  mesh
}

#[rustfmt::skip]
const ICOSAHEDRON_FACES: [[usize; 3]; 20] = [
  [0, 11, 5], [0, 5, 1],  [0, 1, 7],   [0, 7, 10], [0, 10, 11],
  [1, 5, 9],  [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
  [3, 9, 4],  [3, 4, 2],  [3, 2, 6],   [3, 6, 8],  [3, 8, 9],
  [4, 9, 5],  [2, 4, 11], [6, 2, 10],  [8, 6, 7],  [9, 8, 1],
];

/// Icosahedron of the given circumradius with every face split into a
/// triangular lattice of `detail + 1` segments per edge. Lattice points are
/// pushed back onto the sphere, so `detail` 3 gives 320 faces and 162 distinct
/// points. Faces come out row by row from each face's first two corners
/// towards the third.
#[must_use]
pub fn icosphere(radius: f32, detail: u32) -> Mesh {
  let t = (1.0 + 5.0f32.sqrt()) / 2.0;
  let corners: Vec<Vector3<f32>> = [
    [-1.0, t, 0.0],
    [1.0, t, 0.0],
    [-1.0, -t, 0.0],
    [1.0, -t, 0.0],
    [0.0, -1.0, t],
    [0.0, 1.0, t],
    [0.0, -1.0, -t],
    [0.0, 1.0, -t],
    [t, 0.0, -1.0],
    [t, 0.0, 1.0],
    [-t, 0.0, -1.0],
    [-t, 0.0, 1.0],
  ]
  .into_iter()
  .map(Vector3::from)
  .collect();

  let cols = detail + 1;
  let mut mesh = Mesh::new();
  for face in ICOSAHEDRON_FACES {
    // row i runs from the a-c edge to the b-c edge, j steps along it
    let point = |i: u32, j: u32| lattice_point(&corners, face, [cols - i - j, j, i], radius);
    for i in 0..cols {
      for j in 0..2 * (cols - i) - 1 {
        let k = j / 2;
        if j % 2 == 0 {
          mesh.push_triangle(point(i, k + 1), point(i + 1, k), point(i, k));
        } else {
          mesh.push_triangle(point(i, k + 1), point(i + 1, k + 1), point(i + 1, k));
        }
      }
    }
  }
  mesh
}

fn project(p: Vertex, radius: f32) -> Vertex {
  Point3::from_vec(p.to_vec().normalize() * radius)
}

// Corners are summed in ascending corner index, so two faces sharing an edge
// produce the same bits for every point on it.
fn lattice_point(
  corners: &[Vector3<f32>],
  face: [usize; 3],
  weights: [u32; 3],
  radius: f32,
) -> Vertex {
  let segments: u32 = weights.iter().sum();
  let mut terms = [
    (face[0], weights[0]),
    (face[1], weights[1]),
    (face[2], weights[2]),
  ];
  terms.sort_unstable_by_key(|&(corner, _)| corner);
  let sum = terms
    .iter()
    .fold(Vector3::zero(), |acc, &(corner, w)| acc + corners[corner] * w as f32);
  project(Point3::from_vec(sum / segments as f32), radius)
}

/// Closed 2D outline built from cubic Bezier segments.
#[derive(Clone, Debug)]
pub struct Outline {
  start: Point2<f32>,
  cursor: Point2<f32>,
  curves: Vec<[Point2<f32>; 4]>,
}

impl Outline {
  pub fn move_to(x: f32, y: f32) -> Self {
    let start = Point2::new(x, y);
    Self {
      start,
      cursor: start,
      curves: Vec::new(),
    }
  }

  #[must_use]
  pub fn bezier_to(mut self, c1: (f32, f32), c2: (f32, f32), end: (f32, f32)) -> Self {
    let end = Point2::new(end.0, end.1);
    self.curves.push([
      self.cursor,
      Point2::new(c1.0, c1.1),
      Point2::new(c2.0, c2.1),
      end,
    ]);
    self.cursor = end;
    self
  }

  /// Samples every curve at `divisions` steps. Repeated points at curve joins
  /// and the closing point are dropped.
  pub fn contour(&self, divisions: u32) -> Vec<Point2<f32>> {
    let mut points: Vec<Point2<f32>> = Vec::new();
    if self.curves.is_empty() {
      points.push(self.start);
      return points;
    }
    for curve in &self.curves {
      for i in 0..=divisions {
        let p = cubic_bezier(curve, i as f32 / divisions as f32);
        if points.last() != Some(&p) {
          points.push(p);
        }
      }
    }
    if points.len() > 1 && points.last() == points.first() {
      points.pop();
    }
    points
  }
}

fn cubic_bezier([p0, p1, p2, p3]: &[Point2<f32>; 4], t: f32) -> Point2<f32> {
  let k = 1.0 - t;
  let w0 = k * k * k;
  let w1 = 3.0 * k * k * t;
  let w2 = 3.0 * k * t * t;
  let w3 = t * t * t;
  Point2::new(
    w0 * p0.x + w1 * p1.x + w2 * p2.x + w3 * p3.x,
    w0 * p0.y + w1 * p1.y + w2 * p2.y + w3 * p3.y,
  )
}

fn signed_area(contour: &[Point2<f32>]) -> f32 {
  let n = contour.len();
  (0..n)
    .map(|i| {
      let p = contour[i];
      let q = contour[(i + 1) % n];
      p.x * q.y - q.x * p.y
    })
    .sum::<f32>()
    / 2.0
}

fn cross(o: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f32 {
  (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn inside_triangle(p: Point2<f32>, a: Point2<f32>, b: Point2<f32>, c: Point2<f32>) -> bool {
  cross(a, b, p) >= 0.0 && cross(b, c, p) >= 0.0 && cross(c, a, p) >= 0.0
}

/// Ear-clipping triangulation of a simple polygon. Returns index triples wound
/// counter-clockwise regardless of the input orientation.
pub fn triangulate(contour: &[Point2<f32>]) -> Vec<[usize; 3]> {
  let mut remaining: Vec<usize> = (0..contour.len()).collect();
  if signed_area(contour) < 0.0 {
    remaining.reverse();
  }
  let mut triangles = Vec::with_capacity(contour.len().saturating_sub(2));

  while remaining.len() > 3 {
    let n = remaining.len();
    let ear = (0..n).find(|&i| {
      let (a, b, c) = (
        remaining[(i + n - 1) % n],
        remaining[i],
        remaining[(i + 1) % n],
      );
      let (pa, pb, pc) = (contour[a], contour[b], contour[c]);
      cross(pa, pb, pc) > 0.0
        && remaining
          .iter()
          .filter(|&&k| k != a && k != b && k != c)
          .all(|&k| !inside_triangle(contour[k], pa, pb, pc))
    });
    // degenerate input: clip anyway so every vertex still ends up in a triangle
    let i = ear.unwrap_or(0);
    triangles.push([
      remaining[(i + n - 1) % n],
      remaining[i],
      remaining[(i + 1) % n],
    ]);
    remaining.remove(i);
  }
  if remaining.len() == 3 {
    triangles.push([remaining[0], remaining[1], remaining[2]]);
  }
  triangles
}

/// Extrudes a closed outline along +z with no bevel: a back cap at z = 0, a
/// front cap at z = `depth` and `steps` rings of side quads.
#[must_use]
pub fn extrude(contour: &[Point2<f32>], depth: f32, steps: u32) -> Mesh {
  let n = contour.len();
  let layer = |s: u32| -> Vec<Vertex> {
    let z = depth / steps as f32 * s as f32;
    contour.iter().map(|p| Point3::new(p.x, p.y, z)).collect()
  };
  let layers: Vec<Vec<Vertex>> = (0..=steps).map(layer).collect();
  let faces = triangulate(contour);

  let mut mesh = Mesh::new();
  let back = &layers[0];
  for &[a, b, c] in &faces {
    mesh.push_triangle(back[c], back[b], back[a]);
  }
  let front = &layers[steps as usize];
  for &[a, b, c] in &faces {
    mesh.push_triangle(front[a], front[b], front[c]);
  }
  for s in 0..steps as usize {
    let (lower, upper) = (&layers[s], &layers[s + 1]);
    for j in 0..n {
      let k = (j + n - 1) % n;
      mesh.push_triangle(lower[j], lower[k], upper[j]);
      mesh.push_triangle(lower[k], upper[k], upper[j]);
    }
  }
  mesh
}

/// The heart outline, authored upside down around `(-2.5, -5)`.
pub fn heart_outline() -> Outline {
  let (x, y) = (-2.5, -5.0);
  Outline::move_to(x + 2.5, y + 2.5)
    .bezier_to((x + 2.5, y + 2.5), (x + 2.0, y), (x, y))
    .bezier_to((x - 3.0, y), (x - 3.0, y + 3.5), (x - 3.0, y + 3.5))
    .bezier_to((x - 3.0, y + 5.5), (x - 1.5, y + 7.7), (x + 2.5, y + 9.5))
    .bezier_to((x + 6.0, y + 7.7), (x + 8.0, y + 4.5), (x + 8.0, y + 3.5))
    .bezier_to((x + 8.0, y + 3.5), (x + 8.0, y), (x + 5.0, y))
    .bezier_to((x + 3.5, y), (x + 2.5, y + 2.5), (x + 2.5, y + 2.5))
}

/// Extruded heart, flipped on Y so the point faces down.
#[must_use]
pub fn heart() -> Mesh {
  let contour = heart_outline().contour(CURVE_DIVISIONS);
  extrude(&contour, HEART_DEPTH, 1).scaled(1.0, -1.0, 1.0)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::{extract, DEFAULT_TOLERANCE};
  use cgmath::MetricSpace;

  #[test]
  fn grid_emits_two_triangles_per_cell() {
    let mesh = grid(GRID_SIZE, GRID_SIZE, GRID_SEGMENTS, GRID_SEGMENTS);
    assert_eq!(mesh.vertex_count(), 11 * 11 * 6);
    assert!(mesh.vertices().all(|v| v.z == 0.0));
    assert!(mesh
      .vertices()
      .all(|v| v.x.abs() <= 2.5 + 1e-5 && v.y.abs() <= 2.5 + 1e-5));
    assert_eq!(extract(&mesh, DEFAULT_TOLERANCE).len(), 144);
  }

  #[test]
  fn grid_starts_at_top_left() {
    let mesh = grid(2.0, 2.0, 2, 2);
    let first = mesh.vertices().next().unwrap();
    assert_eq!(first, Point3::new(-1.0, 1.0, 0.0));
  }

  #[test]
  fn icosphere_points_lie_on_sphere() {
    let mesh = icosphere(SPHERE_RADIUS, SPHERE_DETAIL);
    assert_eq!(mesh.vertex_count(), 20 * 16 * 3);
    for v in mesh.vertices() {
      assert!((v.to_vec().magnitude() - SPHERE_RADIUS).abs() < 1e-4);
    }
  }

  #[test]
  fn icosphere_edges_weld_exactly() {
    let base = extract(&icosphere(1.0, 0), 0.0);
    assert_eq!(base.len(), 12);
    // 10 n^2 + 2 points for n segments per edge
    assert_eq!(extract(&icosphere(1.0, 1), 0.0).len(), 42);
    let fine = extract(&icosphere(SPHERE_RADIUS, SPHERE_DETAIL), 0.0);
    assert_eq!(fine.len(), 162);
  }

  #[test]
  fn icosphere_starts_on_first_face() {
    let mesh = icosphere(SPHERE_RADIUS, SPHERE_DETAIL);
    let first = mesh.vertices().next().unwrap();
    // a quarter of the way from corner 0 towards corner 11
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;
    let expected = project(Point3::new(-0.75 - t * 0.25, t * 0.75, 0.25), SPHERE_RADIUS);
    assert!(first.distance(expected) < 1e-5);
  }

  #[test]
  fn heart_contour_has_twelve_samples_per_curve() {
    let contour = heart_outline().contour(CURVE_DIVISIONS);
    assert_eq!(contour.len(), 6 * 12);
    assert_eq!(contour[0], Point2::new(0.0, -2.5));
  }

  #[test]
  fn triangulation_covers_every_vertex() {
    let contour = heart_outline().contour(CURVE_DIVISIONS);
    let faces = triangulate(&contour);
    assert_eq!(faces.len(), contour.len() - 2);
    for i in 0..contour.len() {
      assert!(faces.iter().any(|f| f.contains(&i)), "vertex {i} unused");
    }
  }

  #[test]
  fn triangulation_handles_clockwise_square() {
    let square = [
      Point2::new(0.0, 0.0),
      Point2::new(0.0, 1.0),
      Point2::new(1.0, 1.0),
      Point2::new(1.0, 0.0),
    ];
    let faces = triangulate(&square);
    assert_eq!(faces.len(), 2);
    for [a, b, c] in faces {
      assert!(cross(square[a], square[b], square[c]) > 0.0);
    }
  }

  #[test]
  fn heart_is_mirrored_and_extruded() {
    let mesh = heart();
    let (min_y, max_y) = mesh
      .vertices()
      .fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v.y), hi.max(v.y)));
    assert!((max_y - 5.0).abs() < 1e-4);
    assert!((min_y + 4.5).abs() < 1e-4);
    assert!(mesh.vertices().all(|v| v.z == 0.0 || v.z == HEART_DEPTH));
    assert_eq!(extract(&mesh, DEFAULT_TOLERANCE).len(), 144);
  }
}
