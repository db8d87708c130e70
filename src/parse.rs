//! Coordinate-string parsing.
//!
//! Landmarks arrive as `x y` pairs separated by commas, e.g.
//! `"260.04 888.61,269.97 986.23"`. Each coordinate is truncated to its
//! integer part.
//!
//! The scanner is a three-state machine:
//!
//! | state            | digit or `.`         | `' '`                 | `,`                         |
//! |------------------|----------------------|-----------------------|-----------------------------|
//! | `AfterComma`     | start x run          | error                 | error                       |
//! | `AfterSpace`     | start y run          | error                 | error                       |
//! | `Accumulating x` | extend run           | convert x, `AfterSpace` | error                     |
//! | `Accumulating y` | extend run           | error                 | convert y, emit, `AfterComma` |
//!
//! Any other byte is an error. What happens to a pair still pending at end of
//! input is governed by [`TrailingPair`].

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::Point;

/// Policy for a final `x y` pair that is not followed by a comma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingPair {
    /// Emit the pending pair. An incomplete pair (x without y) is an error.
    #[default]
    Flush,
    /// Only pairs terminated by `,` are emitted; anything pending at end of
    /// input is discarded. This is the behavior of the legacy tooling.
    Drop,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    X,
    Y { x: i32 },
}

#[derive(Debug, Clone, Copy)]
enum State {
    AfterComma,
    AfterSpace { x: i32 },
    Accumulating { field: Field, begin: usize },
}

/// Parse a coordinate string, flushing a trailing pair.
pub fn parse_points(input: &str) -> Result<Vec<Point>> {
    parse_points_with(input, TrailingPair::default())
}

/// Parse a coordinate string with an explicit trailing-pair policy.
///
/// Leading and trailing ASCII whitespace is ignored. Error offsets are byte
/// offsets into `input`.
pub fn parse_points_with(input: &str, trailing: TrailingPair) -> Result<Vec<Point>> {
    let body = input.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let lead = input.len() - body.len();
    let body = body.trim_end_matches(|c: char| c.is_ascii_whitespace());

    let mut points = Vec::new();
    let mut state = State::AfterComma;

    for (i, &byte) in body.as_bytes().iter().enumerate() {
        let numeric = byte.is_ascii_digit() || byte == b'.';
        state = match (state, byte) {
            (State::AfterComma, _) if numeric => State::Accumulating {
                field: Field::X,
                begin: i,
            },
            (State::AfterSpace { x }, _) if numeric => State::Accumulating {
                field: Field::Y { x },
                begin: i,
            },
            (accumulating @ State::Accumulating { .. }, _) if numeric => accumulating,
            (
                State::Accumulating {
                    field: Field::X,
                    begin,
                },
                b' ',
            ) => State::AfterSpace {
                x: truncate(&body[begin..i], lead + begin)?,
            },
            (
                State::Accumulating {
                    field: Field::Y { x },
                    begin,
                },
                b',',
            ) => {
                let y = truncate(&body[begin..i], lead + begin)?;
                points.push(Point::new(x, y));
                State::AfterComma
            }
            (state, _) => return Err(unexpected(body, i, lead, state)),
        };
    }

    match (state, trailing) {
        (State::AfterComma, _) => {}
        (
            State::Accumulating {
                field: Field::Y { x },
                begin,
            },
            TrailingPair::Flush,
        ) => {
            let y = truncate(&body[begin..], lead + begin)?;
            points.push(Point::new(x, y));
        }
        (_, TrailingPair::Flush) => {
            return Err(Error::MalformedInput {
                offset: lead + body.len(),
                reason: "input ends inside an incomplete coordinate pair".to_string(),
            });
        }
        (_, TrailingPair::Drop) => {
            debug!(
                offset = lead + body.len(),
                "discarding pending coordinate pair at end of input"
            );
        }
    }

    Ok(points)
}

/// Convert a numeric run to its integer part.
fn truncate(run: &str, offset: usize) -> Result<i32> {
    let malformed = |reason: &str| Error::MalformedInput {
        offset,
        reason: format!("{reason} in {run:?}"),
    };

    let (integer, fraction) = match run.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (run, None),
    };

    if integer.is_empty() {
        return Err(malformed("missing integer digits"));
    }
    match fraction {
        Some(f) if f.contains('.') => return Err(malformed("more than one decimal point")),
        Some("") => return Err(malformed("missing fractional digits")),
        _ => {}
    }

    integer
        .parse::<i32>()
        .map_err(|_| malformed("integer part out of range"))
}

fn unexpected(body: &str, i: usize, lead: usize, state: State) -> Error {
    let found = body[i..].chars().next().unwrap_or_default();
    let expected = match state {
        State::AfterComma => "an x coordinate",
        State::AfterSpace { .. } => "a y coordinate",
        State::Accumulating {
            field: Field::X, ..
        } => "a digit, '.' or ' '",
        State::Accumulating {
            field: Field::Y { .. },
            ..
        } => "a digit, '.' or ','",
    };
    Error::MalformedInput {
        offset: lead + i,
        reason: format!("expected {expected}, found {found:?}"),
    }
}
