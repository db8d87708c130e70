use serde::{Deserialize, Serialize};

/// A landmark position in integer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The valid pixel domain of one image: origin at (0, 0), extent `width` x `height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Rectangle covering every pixel of a `width` x `height` image.
    ///
    /// Dimensions beyond `i32::MAX` saturate; the triangulator rejects
    /// them as out of range anyway.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        Self {
            width: i32::try_from(width).unwrap_or(i32::MAX),
            height: i32::try_from(height).unwrap_or(i32::MAX),
        }
    }

    /// Half-open containment: `0 <= x < width` and `0 <= y < height`.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }
}

/// Three vertices of one face of a triangulation.
///
/// Zero-area triangles are representable; nothing downstream assumes
/// a positive area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triangle {
    pub vertices: [Point; 3],
}

impl Triangle {
    pub const fn new(a: Point, b: Point, c: Point) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    /// The three edges in vertex order: (a, b), (b, c), (c, a).
    pub fn edges(&self) -> [(Point, Point); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }

    /// Twice the signed area; positive when the vertices run counter-clockwise
    /// in a y-up frame.
    pub fn doubled_area(&self) -> i128 {
        let [a, b, c] = self.vertices;
        crate::delaunay::orient2d(a, b, c)
    }

    pub fn contains_vertex(&self, p: Point) -> bool {
        self.vertices.contains(&p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_containment_is_half_open() {
        let rect = Rect::new(10, 20);

        assert!(rect.contains(Point::new(0, 0)));
        assert!(rect.contains(Point::new(9, 19)));
        assert!(!rect.contains(Point::new(10, 5)));
        assert!(!rect.contains(Point::new(5, 20)));
        assert!(!rect.contains(Point::new(-1, 5)));
    }

    #[test]
    fn rect_from_huge_dimensions_saturates() {
        let rect = Rect::from_dimensions(u32::MAX, 4);
        assert_eq!(rect.width, i32::MAX);
        assert_eq!(rect.height, 4);
    }

    #[test]
    fn triangle_edges_close_the_loop() {
        let t = Triangle::new(Point::new(0, 0), Point::new(4, 0), Point::new(0, 3));
        let edges = t.edges();

        assert_eq!(edges[0], (Point::new(0, 0), Point::new(4, 0)));
        assert_eq!(edges[2], (Point::new(0, 3), Point::new(0, 0)));
        assert_eq!(t.doubled_area(), 12);
        assert!(t.contains_vertex(Point::new(4, 0)));
    }
}
