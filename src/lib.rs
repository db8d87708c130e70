//! # landmark-mesh
//!
//! Overlay a Delaunay mesh of facial landmarks onto still frames.
//!
//! This crate provides:
//! - **Parsing**: `"x y,x y,..."` coordinate strings into integer points
//! - **Triangulation**: incremental, exact Delaunay triangulation bounded by
//!   the image rectangle
//! - **Rendering**: landmark dots and anti-aliased triangle edges on an
//!   `image::RgbImage`
//! - **Frame pipeline**: `<dir>/<id>.png` in, `<dir>/drawn_<id>.png` out
//!
//! ## Pipeline
//!
//! 1. Parse the coordinate string, truncating each coordinate
//! 2. Insert points in input order into a Delaunay triangulation closed by a
//!    vertex at infinity, drawing each dot as it goes in
//! 3. Drop triangles with any vertex outside the image
//! 4. Stroke the three edges of every remaining triangle
//!
//! ## Quick Start
//!
//! ```rust
//! use image::RgbImage;
//! use landmark_mesh::{overlay_mesh, MeshRenderer, TrailingPair};
//!
//! let mut frame = RgbImage::new(64, 64);
//! let mesh = overlay_mesh(
//!     &mut frame,
//!     "10.5 10.2,50 12,30.9 40",
//!     &MeshRenderer::default(),
//!     TrailingPair::Flush,
//! )
//! .unwrap();
//!
//! assert_eq!(mesh.points.len(), 3);
//! assert_eq!(mesh.triangles.len(), 1);
//! ```
//!
//! ## Incremental Triangulation
//!
//! ```rust
//! use landmark_mesh::{retain_within, Point, Rect, Triangulation};
//!
//! let bounds = Rect::new(100, 100);
//! let mut triangulation = Triangulation::new(bounds).unwrap();
//! for p in [Point::new(10, 10), Point::new(90, 10), Point::new(50, 80)] {
//!     triangulation.insert(p).unwrap();
//! }
//!
//! let triangles = retain_within(triangulation.triangles(), bounds);
//! assert_eq!(triangles.len(), 1);
//! ```

pub mod delaunay;
mod error;
mod parse;
mod pipeline;
mod render;
mod types;

pub use delaunay::{retain_within, triangulate, Triangulation};
pub use error::{Error, Result};
pub use parse::{parse_points, parse_points_with, TrailingPair};
pub use pipeline::{
    overlay_mesh, FixedLandmarks, FrameOutcome, FramePipeline, FrameReport, FrameStatus,
    LandmarkDir, LandmarkSource, Mesh, REFERENCE_FACE,
};
pub use render::{Canvas, MeshRenderer, MeshStyle};
pub use types::{Point, Rect, Triangle};
