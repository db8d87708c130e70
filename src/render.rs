//! Mesh rasterization.
//!
//! Drawing goes through the [`Canvas`] trait so the renderer only ever
//! borrows the caller's buffer. `image::RgbImage` implements it directly.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Point, Triangle};

/// Colors and sizes used to draw a mesh.
///
/// Deserializes from JSON; absent fields keep their default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshStyle {
    /// Fill color of landmark dots, RGB.
    pub dot_color: [u8; 3],
    /// Color of triangle edges, RGB.
    pub line_color: [u8; 3],
    /// Dot radius in pixels.
    pub dot_radius: i32,
    /// Edge thickness in pixels.
    pub line_thickness: u32,
    pub anti_aliased: bool,
}

impl Default for MeshStyle {
    fn default() -> Self {
        Self {
            dot_color: [180, 244, 66],
            line_color: [15, 100, 15],
            dot_radius: 5,
            line_thickness: 2,
            anti_aliased: true,
        }
    }
}

impl MeshStyle {
    /// Load a style from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let style = serde_json::from_reader(BufReader::new(file))?;
        Ok(style)
    }
}

/// A raster target the renderer can draw on.
///
/// Implementations clip to their own extent; out-of-range coordinates are
/// never an error.
pub trait Canvas {
    /// Fill the disc of `radius` pixels around `center`.
    fn fill_disc(&mut self, center: Point, radius: i32, color: Rgb<u8>);

    /// Stroke the segment `from`-`to` with the given thickness.
    fn stroke_line(
        &mut self,
        from: Point,
        to: Point,
        thickness: u32,
        color: Rgb<u8>,
        anti_aliased: bool,
    );
}

impl Canvas for RgbImage {
    fn fill_disc(&mut self, center: Point, radius: i32, color: Rgb<u8>) {
        let (img_w, img_h) = (self.width() as i64, self.height() as i64);
        let (cx, cy, r) = (center.x as i64, center.y as i64, radius.max(0) as i64);

        for py in (cy - r).max(0)..=(cy + r).min(img_h - 1) {
            for px in (cx - r).max(0)..=(cx + r).min(img_w - 1) {
                let (dx, dy) = (px - cx, py - cy);
                if dx * dx + dy * dy <= r * r {
                    self.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }

    fn stroke_line(
        &mut self,
        from: Point,
        to: Point,
        thickness: u32,
        color: Rgb<u8>,
        anti_aliased: bool,
    ) {
        let (img_w, img_h) = (self.width() as i64, self.height() as i64);
        let half = thickness.max(1) as f64 / 2.0;
        let reach = half.ceil() as i64 + 1;

        let x0 = (from.x.min(to.x) as i64 - reach).max(0);
        let x1 = (from.x.max(to.x) as i64 + reach).min(img_w - 1);
        let y0 = (from.y.min(to.y) as i64 - reach).max(0);
        let y1 = (from.y.max(to.y) as i64 + reach).min(img_h - 1);

        for py in y0..=y1 {
            for px in x0..=x1 {
                let d = distance_to_segment(px as f64, py as f64, from, to);
                let coverage = if anti_aliased {
                    (half + 0.5 - d).clamp(0.0, 1.0)
                } else if d <= half {
                    1.0
                } else {
                    0.0
                };
                if coverage > 0.0 {
                    let dst = self.get_pixel_mut(px as u32, py as u32);
                    *dst = blend(*dst, color, coverage);
                }
            }
        }
    }
}

fn distance_to_segment(px: f64, py: f64, a: Point, b: Point) -> f64 {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (dx, dy) = (b.x as f64 - ax, b.y as f64 - ay);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0)
    };
    let (qx, qy) = (ax + t * dx, ay + t * dy);
    ((px - qx) * (px - qx) + (py - qy) * (py - qy)).sqrt()
}

fn blend(dst: Rgb<u8>, src: Rgb<u8>, alpha: f64) -> Rgb<u8> {
    let mix = |d: u8, s: u8| (d as f64 + (s as f64 - d as f64) * alpha).round() as u8;
    Rgb([
        mix(dst[0], src[0]),
        mix(dst[1], src[1]),
        mix(dst[2], src[2]),
    ])
}

/// Draws landmark dots and triangle edges with a fixed [`MeshStyle`].
#[derive(Debug, Clone, Default)]
pub struct MeshRenderer {
    style: MeshStyle,
}

impl MeshRenderer {
    pub fn new(style: MeshStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &MeshStyle {
        &self.style
    }

    pub fn draw_point<C: Canvas + ?Sized>(&self, canvas: &mut C, point: Point) {
        canvas.fill_disc(point, self.style.dot_radius, Rgb(self.style.dot_color));
    }

    pub fn draw_points<C: Canvas + ?Sized>(&self, canvas: &mut C, points: &[Point]) {
        for &point in points {
            self.draw_point(canvas, point);
        }
    }

    /// Stroke all three edges of `triangle`.
    pub fn draw_triangle<C: Canvas + ?Sized>(&self, canvas: &mut C, triangle: &Triangle) {
        let color = Rgb(self.style.line_color);
        for (from, to) in triangle.edges() {
            canvas.stroke_line(
                from,
                to,
                self.style.line_thickness,
                color,
                self.style.anti_aliased,
            );
        }
    }

    /// Stroke every triangle. Edges shared by neighbors are stroked once per
    /// triangle.
    pub fn draw_triangles<C: Canvas + ?Sized>(&self, canvas: &mut C, triangles: &[Triangle]) {
        for triangle in triangles {
            self.draw_triangle(canvas, triangle);
        }
    }

    /// Dots first, then edges on top.
    pub fn draw<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        points: &[Point],
        triangles: &[Triangle],
    ) {
        self.draw_points(canvas, points);
        self.draw_triangles(canvas, triangles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        discs: Vec<Point>,
        lines: Vec<(Point, Point)>,
    }

    impl Canvas for Recorder {
        fn fill_disc(&mut self, center: Point, _radius: i32, _color: Rgb<u8>) {
            self.discs.push(center);
        }

        fn stroke_line(&mut self, from: Point, to: Point, _: u32, _: Rgb<u8>, _: bool) {
            self.lines.push((from, to));
        }
    }

    #[test]
    fn default_style() {
        let style = MeshStyle::default();
        assert_eq!(style.dot_color, [180, 244, 66]);
        assert_eq!(style.line_color, [15, 100, 15]);
        assert_eq!(style.dot_radius, 5);
        assert_eq!(style.line_thickness, 2);
        assert!(style.anti_aliased);
    }

    #[test]
    fn partial_style_json_keeps_defaults() {
        let style: MeshStyle = serde_json::from_str(r#"{"dot_radius": 3}"#).unwrap();
        assert_eq!(style.dot_radius, 3);
        assert_eq!(style.line_color, MeshStyle::default().line_color);
    }

    #[test]
    fn shared_edges_are_drawn_per_triangle() {
        let (a, b, c, d) = (
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        );
        let triangles = [Triangle::new(a, b, c), Triangle::new(a, c, d)];
        let mut canvas = Recorder::default();

        MeshRenderer::default().draw(&mut canvas, &[a, b, c, d], &triangles);

        assert_eq!(canvas.discs.len(), 4);
        assert_eq!(canvas.lines.len(), 6);
        let diagonal = canvas
            .lines
            .iter()
            .filter(|&&(p, q)| (p, q) == (c, a) || (p, q) == (a, c))
            .count();
        assert_eq!(diagonal, 2);
    }

    #[test]
    fn empty_mesh_draws_nothing() {
        let mut canvas = Recorder::default();
        MeshRenderer::default().draw(&mut canvas, &[], &[]);
        assert!(canvas.discs.is_empty());
        assert!(canvas.lines.is_empty());
    }

    #[test]
    fn disc_is_clipped_at_the_border() {
        let mut img = RgbImage::new(8, 8);
        let color = Rgb([1, 2, 3]);

        img.fill_disc(Point::new(0, 0), 5, color);
        img.fill_disc(Point::new(-100, 4), 5, color);
        img.fill_disc(Point::new(i32::MAX, i32::MIN), 5, color);

        assert_eq!(*img.get_pixel(0, 0), color);
        assert_eq!(*img.get_pixel(3, 4), color); // 9 + 16 <= 25
        assert_eq!(*img.get_pixel(4, 4), Rgb([0, 0, 0])); // 16 + 16 > 25
        assert_eq!(*img.get_pixel(7, 7), Rgb([0, 0, 0]));
    }

    #[test]
    fn thick_line_covers_the_segment() {
        let mut img = RgbImage::new(20, 20);
        let color = Rgb([200, 100, 50]);

        img.stroke_line(Point::new(2, 10), Point::new(17, 10), 2, color, true);

        assert_eq!(*img.get_pixel(9, 10), color);
        // One pixel off the axis sits on the stroke's half-covered rim.
        assert_eq!(*img.get_pixel(9, 9), Rgb([100, 50, 25]));
        assert_eq!(*img.get_pixel(9, 11), Rgb([100, 50, 25]));
        assert_eq!(*img.get_pixel(9, 12), Rgb([0, 0, 0]));
    }

    #[test]
    fn anti_aliased_edge_is_blended() {
        let mut img = RgbImage::new(20, 20);
        img.stroke_line(Point::new(0, 0), Point::new(19, 7), 2, Rgb([255, 255, 255]), true);

        let partial = img.pixels().any(|p| p[0] > 0 && p[0] < 255);
        assert!(partial, "expected partially covered pixels");
    }

    #[test]
    fn aliased_line_is_solid() {
        let mut img = RgbImage::new(20, 20);
        img.stroke_line(Point::new(0, 0), Point::new(19, 7), 2, Rgb([255, 255, 255]), false);

        assert!(img.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(*img.get_pixel(0, 0), Rgb([255, 255, 255]));
    }

    #[test]
    fn line_outside_image_is_a_no_op() {
        let mut img = RgbImage::new(10, 10);
        img.stroke_line(Point::new(-50, -50), Point::new(-20, -40), 2, Rgb([9, 9, 9]), true);
        img.stroke_line(Point::new(i32::MIN, 0), Point::new(i32::MAX, 0), 2, Rgb([9, 9, 9]), true);

        assert!(img.pixels().take(10).all(|p| *p == Rgb([9, 9, 9])));
        assert!(img.pixels().skip(30).all(|p| *p == Rgb([0, 0, 0])));
    }
}
