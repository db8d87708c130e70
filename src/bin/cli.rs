//! CLI application for drawing landmark meshes onto frames.
//!
//! Usage:
//!   landmark-mesh <dir> <frame>                 # one frame
//!   landmark-mesh <dir> <start> <end>           # frames start..end (end exclusive)
//!   landmark-mesh <dir> <frame> --json          # JSON report on stdout

use std::ops::Range;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use landmark_mesh::{
    Error, FixedLandmarks, FramePipeline, FrameReport, FrameStatus, LandmarkDir, LandmarkSource,
    MeshRenderer, MeshStyle, TrailingPair,
};
use tracing::Level;

const EXIT_FAILURE: i32 = 1;
const EXIT_USAGE: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "landmark-mesh")]
#[command(author, version, about = "Draw a Delaunay mesh of facial landmarks onto frames", long_about = None)]
struct Args {
    /// Directory holding <id>.png frames
    dir: Option<PathBuf>,

    /// Frame id, or the first frame of a range
    start: Option<u32>,

    /// End of the frame range (exclusive)
    end: Option<u32>,

    /// Read per-frame coordinates from <DIR>/<id>.txt instead of the built-in face
    #[arg(long, value_name = "DIR")]
    landmarks: Option<PathBuf>,

    /// JSON file overriding mesh colors and sizes
    #[arg(long, value_name = "FILE")]
    style: Option<PathBuf>,

    /// Discard a final coordinate pair that is not followed by a comma
    #[arg(long)]
    drop_trailing_pair: bool,

    /// Output frame reports as JSON
    #[arg(short, long)]
    json: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let Some((dir, start)) = positionals(&args) else {
        // Fewer than two positionals: show usage, not an error.
        let _ = Args::command().print_help();
        return;
    };

    match run(&args, dir, start) {
        Ok(reports) => {
            if reports.iter().any(|r| r.status == FrameStatus::Failed) {
                std::process::exit(EXIT_FAILURE);
            }
        }
        Err(e @ Error::Argument(_)) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", Args::command().render_usage());
            std::process::exit(EXIT_USAGE);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_FAILURE);
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn positionals(args: &Args) -> Option<(PathBuf, u32)> {
    Some((args.dir.clone()?, args.start?))
}

fn frame_range(start: u32, end: Option<u32>) -> Result<Range<u32>, Error> {
    match end {
        Some(end) if end < start => Err(Error::Argument(format!(
            "end frame {end} precedes start frame {start}"
        ))),
        Some(end) => Ok(start..end),
        None => start
            .checked_add(1)
            .map(|next| start..next)
            .ok_or_else(|| Error::Argument(format!("frame id {start} out of range"))),
    }
}

fn run(args: &Args, dir: PathBuf, start: u32) -> Result<Vec<FrameReport>, Error> {
    let frames = frame_range(start, args.end)?;

    let style = match &args.style {
        Some(path) => MeshStyle::load(path)?,
        None => MeshStyle::default(),
    };
    let trailing = if args.drop_trailing_pair {
        TrailingPair::Drop
    } else {
        TrailingPair::Flush
    };
    let renderer = MeshRenderer::new(style);

    let reports = match &args.landmarks {
        Some(landmarks) => process(
            FramePipeline::new(dir, LandmarkDir::new(landmarks)),
            renderer,
            trailing,
            frames,
        ),
        None => process(
            FramePipeline::new(dir, FixedLandmarks::reference()),
            renderer,
            trailing,
            frames,
        ),
    };

    let output = if args.json {
        serde_json::to_string_pretty(&reports)?
    } else {
        format_human_readable(&reports)
    };
    print!("{}", output);

    Ok(reports)
}

fn process<S: LandmarkSource>(
    pipeline: FramePipeline<S>,
    renderer: MeshRenderer,
    trailing: TrailingPair,
    frames: Range<u32>,
) -> Vec<FrameReport> {
    pipeline
        .with_renderer(renderer)
        .with_trailing_pair(trailing)
        .process_range(frames.start, frames.end)
}

fn format_human_readable(reports: &[FrameReport]) -> String {
    let mut s = String::new();

    for report in reports {
        match report.status {
            FrameStatus::Drawn => {
                let output = report
                    .output
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                s.push_str(&format!(
                    "Frame {}: {} points, {} triangles -> {} in {:.4}s\n",
                    report.frame_id, report.points, report.triangles, output, report.elapsed_secs
                ));
            }
            FrameStatus::Skipped => {
                s.push_str(&format!(
                    "Frame {}: skipped (no image) in {:.4}s\n",
                    report.frame_id, report.elapsed_secs
                ));
            }
            FrameStatus::Failed => {
                s.push_str(&format!(
                    "Frame {}: failed: {}\n",
                    report.frame_id,
                    report.error.as_deref().unwrap_or("unknown error")
                ));
            }
        }
    }

    s
}
