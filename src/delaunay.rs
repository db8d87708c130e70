//! Incremental Delaunay triangulation of landmark points.
//!
//! Construction is Bowyer-Watson over a triangulation closed by a single
//! vertex at infinity. Every convex hull edge `(u, v)` carries a ghost face
//! `[v, u, GHOST]` standing for the open half-plane beyond it, so a point
//! outside the current hull is inserted exactly like one inside: remove every
//! face it conflicts with and re-connect the cavity to the new vertex. Since
//! no finite scaffold is involved, the real faces are always the Delaunay
//! triangulation of the inserted points alone and cover their convex hull.
//!
//! Until three non-collinear points have arrived there is no face at all;
//! the collinear prefix is kept and fanned to the first point off its line.
//!
//! ## Exactness and determinism
//!
//! Coordinates are integers, so both predicates are evaluated exactly
//! ([`orient2d`] and the in-circle determinant in `i128`). There is no
//! epsilon, and faces live in a `Vec` that is only ever filtered and
//! appended to, so the same ordered input always produces the same faces in
//! the same order. Cocircular ties are resolved by insertion order: a point
//! exactly on a circumcircle leaves that face in place.
//!
//! ## Complexity
//!
//! Cavity search is a linear scan over the live faces, so one insertion is
//! O(n) and a full build is O(n^2) in the worst case. Landmark sets hold
//! tens to a few hundred points, where the scan is cheaper than maintaining
//! an adjacency walk.

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Point, Rect, Triangle};

/// Largest accepted rectangle dimension and coordinate magnitude. Keeps the
/// in-circle determinant within `i128`.
pub const MAX_EXTENT: i32 = 1 << 24;

/// Index of the vertex at infinity.
const GHOST: usize = usize::MAX;

/// Twice the signed area of `(a, b, c)`. Positive for a counter-clockwise turn
/// in a y-up frame, zero for collinear points.
pub fn orient2d(a: Point, b: Point, c: Point) -> i128 {
    let (ax, ay) = (a.x as i128, a.y as i128);
    let (bx, by) = (b.x as i128, b.y as i128);
    let (cx, cy) = (c.x as i128, c.y as i128);
    (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
}

/// Whether `d` lies strictly inside the circumcircle of `(a, b, c)`.
///
/// `(a, b, c)` must have positive orientation. For a collinear triple the
/// test degenerates to a half-plane test and never panics.
pub fn in_circumcircle(a: Point, b: Point, c: Point, d: Point) -> bool {
    let row = |p: Point| {
        let dx = p.x as i128 - d.x as i128;
        let dy = p.y as i128 - d.y as i128;
        (dx, dy, dx * dx + dy * dy)
    };
    let (adx, ady, ad) = row(a);
    let (bdx, bdy, bd) = row(b);
    let (cdx, cdy, cd) = row(c);

    let det = adx * (bdy * cd - bd * cdy) - ady * (bdx * cd - bd * cdx)
        + ad * (bdx * cdy - bdy * cdx);
    det > 0
}

/// Whether both coordinates of `p` are within `MAX_EXTENT` of the origin.
pub fn in_domain(p: Point) -> bool {
    p.x.abs() <= MAX_EXTENT && p.y.abs() <= MAX_EXTENT
}

/// Dot product of `p - origin` and `q - origin`.
fn dot(origin: Point, p: Point, q: Point) -> i128 {
    let (px, py) = (p.x as i128 - origin.x as i128, p.y as i128 - origin.y as i128);
    let (qx, qy) = (q.x as i128 - origin.x as i128, q.y as i128 - origin.y as i128);
    px * qx + py * qy
}

/// `p` is on the open segment `(a, b)`, given that the three are collinear.
fn strictly_between(a: Point, b: Point, p: Point) -> bool {
    dot(a, p, b) > 0 && dot(b, p, a) > 0
}

/// Directed edges of `faces` whose reverse is not an edge of `faces`.
fn open_edges(faces: &[[usize; 3]]) -> Vec<(usize, usize)> {
    let edges: Vec<(usize, usize)> = faces
        .iter()
        .flat_map(|&[i, j, k]| [(i, j), (j, k), (k, i)])
        .collect();
    edges
        .iter()
        .copied()
        .filter(|&(i, j)| !edges.contains(&(j, i)))
        .collect()
}

/// Working triangulation for one frame.
///
/// Vertices are the inserted points in insertion order. Real faces are
/// vertex-index triples with positive orientation; ghost faces end in
/// `GHOST`.
#[derive(Debug, Clone)]
pub struct Triangulation {
    bounds: Rect,
    vertices: Vec<Point>,
    faces: Vec<[usize; 3]>,
}

impl Triangulation {
    /// Start an empty triangulation for the image domain `bounds`.
    pub fn new(bounds: Rect) -> Result<Self> {
        let Rect { width, height } = bounds;
        if width <= 0 || height <= 0 || width > MAX_EXTENT || height > MAX_EXTENT {
            return Err(Error::InvalidBounds {
                width: width as i64,
                height: height as i64,
            });
        }

        Ok(Self {
            bounds,
            vertices: Vec::new(),
            faces: Vec::new(),
        })
    }

    /// The image domain triangles are later filtered against.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Points inserted so far, in insertion order, duplicates excluded.
    pub fn points(&self) -> &[Point] {
        &self.vertices
    }

    pub fn num_points(&self) -> usize {
        self.vertices.len()
    }

    /// Insert one point.
    ///
    /// Returns `Ok(false)` when the point was already present and has been
    /// skipped. Only points beyond [`MAX_EXTENT`] are rejected, with
    /// [`Error::OutsideDomain`]; points merely outside the rectangle are
    /// triangulated and later removed by [`retain_within`].
    pub fn insert(&mut self, p: Point) -> Result<bool> {
        if !in_domain(p) {
            return Err(Error::OutsideDomain { x: p.x, y: p.y });
        }
        if self.vertices.contains(&p) {
            debug!(x = p.x, y = p.y, "skipping duplicate point");
            return Ok(false);
        }

        let v = self.vertices.len();
        self.vertices.push(p);

        if self.faces.is_empty() {
            if v >= 2 && orient2d(self.vertices[0], self.vertices[1], p) != 0 {
                self.fan_collinear_prefix();
            }
            return Ok(true);
        }

        let faces = std::mem::take(&mut self.faces);
        let mut kept = Vec::with_capacity(faces.len() + 2);
        let mut cavity = Vec::new();
        for face in faces {
            if self.conflicts(face, p) {
                let [i, j, k] = face;
                cavity.extend([(i, j), (j, k), (k, i)]);
            } else {
                kept.push(face);
            }
        }

        // Edges shared by two cavity faces appear once in each direction.
        let boundary: Vec<(usize, usize)> = cavity
            .iter()
            .copied()
            .filter(|&(i, j)| !cavity.contains(&(j, i)))
            .collect();

        kept.extend(boundary.into_iter().map(|(i, j)| match (i, j) {
            (GHOST, j) => [j, v, GHOST],
            (i, GHOST) => [v, i, GHOST],
            (i, j) => [i, j, v],
        }));
        self.faces = kept;
        Ok(true)
    }

    /// Whether `p` invalidates `face`.
    ///
    /// A ghost face `[u, v, GHOST]` is the open half-plane left of `u -> v`
    /// together with the open segment `(u, v)`.
    fn conflicts(&self, [a, b, c]: [usize; 3], p: Point) -> bool {
        let (pa, pb) = (self.vertices[a], self.vertices[b]);
        if c == GHOST {
            match orient2d(pa, pb, p) {
                0 => strictly_between(pa, pb, p),
                o => o > 0,
            }
        } else {
            in_circumcircle(pa, pb, self.vertices[c], p)
        }
    }

    /// Build the first faces once the newest vertex leaves the line through
    /// all earlier ones. The fan is the only triangulation of such a set.
    fn fan_collinear_prefix(&mut self) {
        let apex = self.vertices.len() - 1;
        let (origin, towards) = (self.vertices[0], self.vertices[1]);

        let mut line: Vec<usize> = (0..apex).collect();
        line.sort_by_key(|&i| dot(origin, self.vertices[i], towards));

        let apex_point = self.vertices[apex];
        self.faces = line
            .windows(2)
            .map(|pair| {
                let (i, j) = (pair[0], pair[1]);
                if orient2d(self.vertices[i], self.vertices[j], apex_point) > 0 {
                    [i, j, apex]
                } else {
                    [j, i, apex]
                }
            })
            .collect();

        let ghosts: Vec<[usize; 3]> = open_edges(&self.faces)
            .into_iter()
            .map(|(i, j)| [j, i, GHOST])
            .collect();
        self.faces.extend(ghosts);
        debug!(collinear = apex, "first faces built");
    }

    /// Faces made of inserted points, in face order.
    pub fn triangles(&self) -> Vec<Triangle> {
        self.faces
            .iter()
            .filter(|face| face[2] != GHOST)
            .map(|&[a, b, c]| Triangle::new(self.vertices[a], self.vertices[b], self.vertices[c]))
            .collect()
    }

    /// Convex hull edges, each directed with the triangulation on its left.
    ///
    /// Empty while the inserted points are all collinear.
    pub fn hull(&self) -> Vec<(Point, Point)> {
        self.faces
            .iter()
            .filter(|face| face[2] == GHOST)
            .map(|&[u, v, _]| (self.vertices[v], self.vertices[u]))
            .collect()
    }
}

/// Triangulate `points` in order within `bounds`.
pub fn triangulate(points: &[Point], bounds: Rect) -> Result<Vec<Triangle>> {
    let mut triangulation = Triangulation::new(bounds)?;
    for &p in points {
        triangulation.insert(p)?;
    }
    Ok(triangulation.triangles())
}

/// Keep only triangles with all three vertices inside `bounds`.
pub fn retain_within(triangles: Vec<Triangle>, bounds: Rect) -> Vec<Triangle> {
    triangles
        .into_iter()
        .filter(|t| t.vertices.iter().all(|&p| bounds.contains(p)))
        .collect()
}
