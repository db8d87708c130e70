//! Per-frame orchestration: load an image, overlay the landmark mesh, write
//! the result next to it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use image::RgbImage;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::delaunay::{in_domain, retain_within, Triangulation};
use crate::error::{Error, Result};
use crate::parse::{parse_points_with, TrailingPair};
use crate::render::MeshRenderer;
use crate::types::{Point, Rect, Triangle};

/// 68-point sample face used when no landmark feed is configured.
pub const REFERENCE_FACE: &str = concat!(
    "260.040343 888.611127,269.976639 986.237354,289.517197 1083.266163,318.881451 1173.145982,",
    "364.546544 1250.371343,418.218724 1309.539448,461.121964 1353.916568,504.180831 1384.225729,",
    "559.618409 1388.323818,621.603966 1370.890055,679.025618 1321.635214,733.523399 1257.153803,",
    "774.329893 1186.295180,799.438576 1104.623734,808.253363 1017.840100,812.229479 928.171773,",
    "811.221769 840.187872,284.726667 848.636778,314.568856 809.799045,363.772096 799.441036,",
    "415.291389 808.526863,460.919328 829.631910,583.462146 820.953046,636.755684 795.958497,",
    "691.394963 783.182439,743.891658 792.415951,775.381131 828.681755,529.630091 906.442344,",
    "529.574225 967.086822,530.012695 1026.679804,531.292755 1086.990969,467.638977 1106.164622,",
    "501.108780 1119.289102,536.497121 1129.913266,572.325308 1114.384652,604.607400 1099.128276,",
    "343.791704 920.670122,376.535971 906.083111,416.491883 907.205085,450.937132 925.887388,",
    "414.741360 935.063918,374.592095 935.758863,608.171787 919.124603,644.627460 896.407367,",
    "685.007219 893.673088,717.802710 903.722484,689.087399 921.081659,648.842417 925.134424,",
    "428.372733 1189.689410,468.256940 1173.033265,509.813908 1166.325831,544.873064 1173.577640,",
    "584.582054 1162.312021,632.018411 1162.765017,673.808561 1169.648399,637.463043 1224.757898,",
    "593.982270 1254.679665,550.961616 1263.246796,512.593977 1260.883046,468.722179 1238.307145,",
    "444.941818 1193.994500,511.391420 1191.338850,546.770070 1193.972674,587.503078 1186.534614,",
    "655.700551 1176.627786,590.680093 1215.187488,549.193046 1223.938076,512.354186 1220.627523",
);

/// Supplies the coordinate string for a frame.
pub trait LandmarkSource {
    fn landmarks(&self, frame_id: u32) -> Result<String>;
}

/// The same coordinate string for every frame.
#[derive(Debug, Clone)]
pub struct FixedLandmarks {
    coordinates: String,
}

impl FixedLandmarks {
    pub fn new(coordinates: impl Into<String>) -> Self {
        Self {
            coordinates: coordinates.into(),
        }
    }

    /// The built-in [`REFERENCE_FACE`].
    pub fn reference() -> Self {
        Self::new(REFERENCE_FACE)
    }
}

impl LandmarkSource for FixedLandmarks {
    fn landmarks(&self, _frame_id: u32) -> Result<String> {
        Ok(self.coordinates.clone())
    }
}

/// Per-frame coordinate strings stored as `<dir>/<frame_id>.txt`.
#[derive(Debug, Clone)]
pub struct LandmarkDir {
    dir: PathBuf,
}

impl LandmarkDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl LandmarkSource for LandmarkDir {
    fn landmarks(&self, frame_id: u32) -> Result<String> {
        let path = self.dir.join(format!("{frame_id}.txt"));
        Ok(fs::read_to_string(path)?)
    }
}

/// Geometry drawn by [`overlay_mesh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mesh {
    /// Parsed landmarks, in input order.
    pub points: Vec<Point>,
    /// Triangles that passed the bounds filter.
    pub triangles: Vec<Triangle>,
}

/// Parse `coordinates`, triangulate within the image bounds and draw the
/// mesh onto `image`.
///
/// Dots are drawn as points are inserted and clipped to the image; points off
/// the image are triangulated, and their triangles dropped by the bounds
/// filter. Coordinates are range-checked first, so on error the image is
/// left untouched.
pub fn overlay_mesh(
    image: &mut RgbImage,
    coordinates: &str,
    renderer: &MeshRenderer,
    trailing: TrailingPair,
) -> Result<Mesh> {
    let points = parse_points_with(coordinates, trailing)?;
    let bounds = Rect::from_dimensions(image.width(), image.height());
    let mut triangulation = Triangulation::new(bounds)?;

    if let Some(p) = points.iter().find(|&&p| !in_domain(p)) {
        return Err(Error::OutsideDomain { x: p.x, y: p.y });
    }

    for &point in &points {
        renderer.draw_point(image, point);
        triangulation.insert(point)?;
    }

    let triangles = retain_within(triangulation.triangles(), triangulation.bounds());
    renderer.draw_triangles(image, &triangles);
    debug!(
        points = points.len(),
        triangles = triangles.len(),
        "mesh drawn"
    );

    Ok(Mesh { points, triangles })
}

/// What happened to one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Drawn {
        points: usize,
        triangles: usize,
        output: PathBuf,
        elapsed: Duration,
    },
    /// The source image could not be read.
    Skipped { input: PathBuf, elapsed: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStatus {
    Drawn,
    Skipped,
    Failed,
}

/// Serializable summary of one frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub frame_id: u32,
    pub status: FrameStatus,
    pub points: usize,
    pub triangles: usize,
    pub output: Option<PathBuf>,
    pub elapsed_secs: f64,
    pub error: Option<String>,
}

impl FrameReport {
    fn from_outcome(frame_id: u32, outcome: FrameOutcome) -> Self {
        match outcome {
            FrameOutcome::Drawn {
                points,
                triangles,
                output,
                elapsed,
            } => Self {
                frame_id,
                status: FrameStatus::Drawn,
                points,
                triangles,
                output: Some(output),
                elapsed_secs: elapsed.as_secs_f64(),
                error: None,
            },
            FrameOutcome::Skipped { elapsed, .. } => Self {
                frame_id,
                status: FrameStatus::Skipped,
                points: 0,
                triangles: 0,
                output: None,
                elapsed_secs: elapsed.as_secs_f64(),
                error: None,
            },
        }
    }

    fn failed(frame_id: u32, err: &Error, elapsed: Duration) -> Self {
        Self {
            frame_id,
            status: FrameStatus::Failed,
            points: 0,
            triangles: 0,
            output: None,
            elapsed_secs: elapsed.as_secs_f64(),
            error: Some(err.to_string()),
        }
    }
}

/// Draws landmark meshes onto the frames of one directory.
///
/// Frame `n` is read from `<dir>/n.png` and written to `<dir>/drawn_n.png`.
#[derive(Debug, Clone)]
pub struct FramePipeline<S> {
    dir: PathBuf,
    source: S,
    renderer: MeshRenderer,
    trailing: TrailingPair,
}

impl<S: LandmarkSource> FramePipeline<S> {
    pub fn new(dir: impl Into<PathBuf>, source: S) -> Self {
        Self {
            dir: dir.into(),
            source,
            renderer: MeshRenderer::default(),
            trailing: TrailingPair::default(),
        }
    }

    pub fn with_renderer(mut self, renderer: MeshRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_trailing_pair(mut self, trailing: TrailingPair) -> Self {
        self.trailing = trailing;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn input_path(&self, frame_id: u32) -> PathBuf {
        self.dir.join(format!("{frame_id}.png"))
    }

    pub fn output_path(&self, frame_id: u32) -> PathBuf {
        self.dir.join(format!("drawn_{frame_id}.png"))
    }

    /// Process one frame.
    ///
    /// A missing or unreadable source image is not an error: it is logged and
    /// reported as [`FrameOutcome::Skipped`].
    #[tracing::instrument(skip(self))]
    pub fn process_frame(&self, frame_id: u32) -> Result<FrameOutcome> {
        let start = Instant::now();
        let input = self.input_path(frame_id);

        let mut image = match load_rgb(&input) {
            Ok(image) => image,
            Err(err) => {
                warn!(%err, "source image unavailable, skipping frame");
                return Ok(FrameOutcome::Skipped {
                    input,
                    elapsed: start.elapsed(),
                });
            }
        };

        let coordinates = self.source.landmarks(frame_id)?;
        let mesh = overlay_mesh(&mut image, &coordinates, &self.renderer, self.trailing)?;

        let output = self.output_path(frame_id);
        image.save(&output)?;

        let elapsed = start.elapsed();
        info!(
            output = %output.display(),
            elapsed_secs = elapsed.as_secs_f64(),
            "drew mesh for frame"
        );

        Ok(FrameOutcome::Drawn {
            points: mesh.points.len(),
            triangles: mesh.triangles.len(),
            output,
            elapsed,
        })
    }

    /// Process frames `start..end` in order.
    ///
    /// A failing frame is logged and reported; later frames still run.
    pub fn process_range(&self, start: u32, end: u32) -> Vec<FrameReport> {
        (start..end)
            .map(|frame_id| {
                let started = Instant::now();
                match self.process_frame(frame_id) {
                    Ok(outcome) => FrameReport::from_outcome(frame_id, outcome),
                    Err(err) => {
                        error!(frame_id, %err, "frame failed");
                        FrameReport::failed(frame_id, &err, started.elapsed())
                    }
                }
            })
            .collect()
    }
}

fn load_rgb(path: &Path) -> Result<RgbImage> {
    let image = image::open(path).map_err(|source| Error::ImageUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_points;
    use image::Rgb;

    #[test]
    fn reference_face_has_68_landmarks() {
        let points = parse_points(REFERENCE_FACE).unwrap();
        assert_eq!(points.len(), 68);
        assert_eq!(points[0], Point::new(260, 888));

        let legacy = parse_points_with(REFERENCE_FACE, TrailingPair::Drop).unwrap();
        assert_eq!(legacy.len(), 67);
    }

    #[test]
    fn reference_face_meshes_on_a_large_frame() {
        let mut image = RgbImage::new(1080, 1920);
        let mesh = overlay_mesh(
            &mut image,
            REFERENCE_FACE,
            &MeshRenderer::default(),
            TrailingPair::Flush,
        )
        .unwrap();

        assert_eq!(mesh.points.len(), 68);
        assert!(mesh.triangles.len() > 68);
        let dot = Rgb(MeshRenderer::default().style().dot_color);
        assert!(image.pixels().any(|p| *p == dot));
    }

    #[test]
    fn empty_coordinates_leave_image_unchanged() {
        let mut image = RgbImage::from_pixel(16, 16, Rgb([7, 8, 9]));
        let before = image.clone();

        let mesh = overlay_mesh(&mut image, "", &MeshRenderer::default(), TrailingPair::Flush)
            .unwrap();

        assert!(mesh.points.is_empty());
        assert!(mesh.triangles.is_empty());
        assert_eq!(image, before);
    }

    #[test]
    fn malformed_coordinates_leave_image_unchanged() {
        let mut image = RgbImage::new(16, 16);
        let before = image.clone();

        let err = overlay_mesh(
            &mut image,
            "1 1,abc 2",
            &MeshRenderer::default(),
            TrailingPair::Flush,
        )
        .unwrap_err();

        assert!(matches!(err, Error::MalformedInput { .. }));
        assert_eq!(image, before);
    }

    #[test]
    fn reference_face_below_a_small_frame_is_clipped() {
        let mut image = RgbImage::from_pixel(320, 240, Rgb([7, 8, 9]));
        let before = image.clone();

        let mesh = overlay_mesh(
            &mut image,
            REFERENCE_FACE,
            &MeshRenderer::default(),
            TrailingPair::Flush,
        )
        .unwrap();

        // Every landmark lies below row 780: nothing survives the filter.
        assert_eq!(mesh.points.len(), 68);
        assert!(mesh.triangles.is_empty());
        assert_eq!(image, before);
    }

    #[test]
    fn partly_visible_mesh_keeps_only_triangles_inside() {
        let mut image = RgbImage::new(64, 64);
        let mesh = overlay_mesh(
            &mut image,
            "10 10,50 12,30 40,30 5000,-900 20",
            &MeshRenderer::default(),
            TrailingPair::Flush,
        )
        .unwrap();

        assert_eq!(mesh.points.len(), 5);
        assert_eq!(mesh.triangles.len(), 1);
    }

    #[test]
    fn out_of_range_point_fails_before_drawing() {
        let mut image = RgbImage::new(16, 16);
        let before = image.clone();

        let err = overlay_mesh(
            &mut image,
            "1 1,5 5,20000000 5",
            &MeshRenderer::default(),
            TrailingPair::Flush,
        )
        .unwrap_err();

        assert!(matches!(err, Error::OutsideDomain { x: 20_000_000, y: 5 }));
        assert_eq!(image, before);
    }

    #[test]
    fn zero_sized_image_is_invalid_bounds() {
        let mut image = RgbImage::new(0, 10);
        let err = overlay_mesh(&mut image, "", &MeshRenderer::default(), TrailingPair::Flush)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidBounds { width: 0, height: 10 }));
    }

    #[test]
    fn paths_follow_frame_naming() {
        let pipeline = FramePipeline::new("/frames", FixedLandmarks::reference());
        assert_eq!(pipeline.input_path(7), PathBuf::from("/frames/7.png"));
        assert_eq!(pipeline.output_path(7), PathBuf::from("/frames/drawn_7.png"));
    }
}
