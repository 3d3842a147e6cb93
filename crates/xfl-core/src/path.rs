//! Path assembly from edge soup.
//!
//! Shape outlines arrive as unordered fragments, each tagged with the fill
//! styles on either side and an optional stroke style. Fragments sharing a
//! style are chained end to start into subpaths; a chain whose free end comes
//! back near its own start is closed.

use kurbo::{BezPath, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;
use xfl_data::model::{Edge, PathCommand};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssemblerConfig {
    /// Max gap between a chain's free end and the next fragment's start.
    pub chain_tolerance: f64,
    /// Max gap between a chain's free end and its own start for it to close.
    pub close_tolerance: f64,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            chain_tolerance: 8.0,
            close_tolerance: 24.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleRef {
    Fill(usize),
    Stroke(usize),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Piece {
    Line(Point),
    Quad(Point, Point),
    Cubic(Point, Point, Point),
}

impl Piece {
    fn end(&self) -> Point {
        match *self {
            Piece::Line(p) | Piece::Quad(_, p) | Piece::Cubic(_, _, p) => p,
        }
    }

    fn append_to(&self, path: &mut BezPath) {
        match *self {
            Piece::Line(p) => path.line_to(p),
            Piece::Quad(c, p) => path.quad_to(c, p),
            Piece::Cubic(c1, c2, p) => path.curve_to(c1, c2, p),
        }
    }
}

/// A run of pieces drawn without lifting the pen.
#[derive(Clone, Debug, PartialEq)]
struct RawSegment {
    start: Point,
    pieces: Vec<Piece>,
}

impl RawSegment {
    fn new(start: Point) -> Self {
        Self {
            start,
            pieces: Vec::new(),
        }
    }

    fn end(&self) -> Point {
        self.pieces.last().map(Piece::end).unwrap_or(self.start)
    }

    /// Same outline walked from the other end.
    fn reversed(&self) -> RawSegment {
        let mut points = Vec::with_capacity(self.pieces.len() + 1);
        points.push(self.start);
        points.extend(self.pieces.iter().map(Piece::end));

        let mut pieces = Vec::with_capacity(self.pieces.len());
        for (i, piece) in self.pieces.iter().enumerate().rev() {
            let to = points[i];
            pieces.push(match *piece {
                Piece::Line(_) => Piece::Line(to),
                Piece::Quad(c, _) => Piece::Quad(c, to),
                Piece::Cubic(c1, c2, _) => Piece::Cubic(c2, c1, to),
            });
        }
        RawSegment {
            start: self.end(),
            pieces,
        }
    }
}

fn point(p: &xfl_data::model::Point) -> Option<Point> {
    if p.is_finite() {
        Some(Point::new(p.x, p.y))
    } else {
        None
    }
}

/// Splits one edge's command list at every pen lift. Commands with a
/// non-finite coordinate are dropped one by one.
fn split_segments(commands: &[PathCommand]) -> Vec<RawSegment> {
    let mut out = Vec::new();
    let mut current: Option<RawSegment> = None;
    let mut skipped = 0usize;

    fn flush(seg: Option<RawSegment>, out: &mut Vec<RawSegment>) {
        if let Some(seg) = seg {
            if !seg.pieces.is_empty() {
                out.push(seg);
            }
        }
    }

    for cmd in commands {
        let piece = match cmd {
            PathCommand::MoveTo(p) => {
                match point(p) {
                    Some(p) => {
                        flush(current.take(), &mut out);
                        current = Some(RawSegment::new(p));
                    }
                    None => skipped += 1,
                }
                continue;
            }
            PathCommand::Close => {
                if let Some(mut seg) = current.take() {
                    let start = seg.start;
                    if !seg.pieces.is_empty() && seg.end() != start {
                        seg.pieces.push(Piece::Line(start));
                    }
                    flush(Some(seg), &mut out);
                    current = Some(RawSegment::new(start));
                }
                continue;
            }
            PathCommand::LineTo(p) => point(p).map(Piece::Line),
            PathCommand::QuadTo(c, p) => match (point(c), point(p)) {
                (Some(c), Some(p)) => Some(Piece::Quad(c, p)),
                _ => None,
            },
            PathCommand::CubicTo(c1, c2, p) => match (point(c1), point(c2), point(p)) {
                (Some(c1), Some(c2), Some(p)) => Some(Piece::Cubic(c1, c2, p)),
                _ => None,
            },
        };

        match piece {
            Some(piece) => match current.as_mut() {
                Some(seg) => seg.pieces.push(piece),
                // No pen position yet: the piece's end becomes the start.
                None => current = Some(RawSegment::new(piece.end())),
            },
            None => skipped += 1,
        }
    }
    flush(current.take(), &mut out);

    if skipped > 0 {
        trace!(skipped, "dropped non-finite path commands");
    }
    out
}

/// While fragments are still being linked, only a loop that lands exactly on
/// its start is complete.
const EXACT_CLOSE: f64 = 1e-9;

#[derive(Clone, Debug)]
struct Chain {
    start: Point,
    end: Point,
    pieces: Vec<Piece>,
    closed: bool,
}

impl Chain {
    fn from_segment(seg: RawSegment) -> Self {
        Self {
            start: seg.start,
            end: seg.end(),
            pieces: seg.pieces,
            closed: false,
        }
    }

    fn extend(&mut self, pieces: Vec<Piece>) {
        self.pieces.extend(pieces);
        if let Some(last) = self.pieces.last() {
            self.end = last.end();
        }
    }

    fn try_close(&mut self, tolerance: f64) {
        // A single piece cannot enclose anything.
        if self.pieces.len() >= 2 && self.end.distance(self.start) <= tolerance {
            self.closed = true;
        }
    }

    fn to_subpath(&self) -> Subpath {
        let mut path = BezPath::new();
        path.move_to(self.start);
        for piece in &self.pieces {
            piece.append_to(&mut path);
        }
        if self.closed {
            path.close_path();
        }
        Subpath {
            path,
            closed: self.closed,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Subpath {
    pub path: BezPath,
    pub closed: bool,
}

/// Every subpath drawn with one style.
#[derive(Clone, Debug, PartialEq)]
pub struct StylePath {
    pub style: StyleRef,
    pub subpaths: Vec<Subpath>,
}

impl StylePath {
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        for sub in &self.subpaths {
            path.extend(sub.path.elements().iter().copied());
        }
        path
    }

    pub fn closed_count(&self) -> usize {
        self.subpaths.iter().filter(|s| s.closed).count()
    }
}

/// Output of assembling one shape: fills first (by index), then strokes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssembledShape {
    pub paths: Vec<StylePath>,
}

impl AssembledShape {
    pub fn fills(&self) -> impl Iterator<Item = (usize, &StylePath)> {
        self.paths.iter().filter_map(|p| match p.style {
            StyleRef::Fill(i) => Some((i, p)),
            StyleRef::Stroke(_) => None,
        })
    }

    pub fn strokes(&self) -> impl Iterator<Item = (usize, &StylePath)> {
        self.paths.iter().filter_map(|p| match p.style {
            StyleRef::Stroke(i) => Some((i, p)),
            StyleRef::Fill(_) => None,
        })
    }

    pub fn style(&self, style: StyleRef) -> Option<&StylePath> {
        self.paths.iter().find(|p| p.style == style)
    }

    /// All fill geometry as one path.
    pub fn fill_outline(&self) -> BezPath {
        let mut path = BezPath::new();
        for (_, p) in self.fills() {
            path.extend(p.to_path().elements().iter().copied());
        }
        path
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PathAssembler {
    config: AssemblerConfig,
}

impl PathAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> AssemblerConfig {
        self.config
    }

    pub fn assemble(&self, edges: &[Edge]) -> AssembledShape {
        let mut groups: BTreeMap<StyleRef, Vec<RawSegment>> = BTreeMap::new();

        for edge in edges {
            if edge.fill_left.is_none() && edge.fill_right.is_none() && edge.stroke.is_none() {
                continue;
            }
            let segments = split_segments(&edge.commands);
            if let Some(i) = edge.fill_left {
                groups
                    .entry(StyleRef::Fill(i))
                    .or_default()
                    .extend(segments.iter().cloned());
            }
            if let Some(i) = edge.fill_right {
                groups
                    .entry(StyleRef::Fill(i))
                    .or_default()
                    .extend(segments.iter().map(RawSegment::reversed));
            }
            if let Some(i) = edge.stroke {
                groups
                    .entry(StyleRef::Stroke(i))
                    .or_default()
                    .extend(segments.iter().cloned());
            }
        }

        let paths = groups
            .into_iter()
            .filter_map(|(style, segments)| {
                let chains = self.chain(segments);
                if chains.is_empty() {
                    return None;
                }
                Some(StylePath {
                    style,
                    subpaths: chains.iter().map(Chain::to_subpath).collect(),
                })
            })
            .collect();

        AssembledShape { paths }
    }

    fn chain(&self, segments: Vec<RawSegment>) -> Vec<Chain> {
        let tol = self.config.chain_tolerance;
        let close_tol = self.config.close_tolerance;
        let mut chains: Vec<Chain> = Vec::new();

        for seg in segments {
            if seg.pieces.is_empty() {
                continue;
            }
            let target = chains
                .iter_mut()
                .find(|c| !c.closed && c.end.distance(seg.start) <= tol);
            match target {
                Some(chain) => {
                    chain.extend(seg.pieces);
                    chain.try_close(EXACT_CLOSE);
                }
                None => chains.push(Chain::from_segment(seg)),
            }
        }

        // Fragments that arrived out of order leave several open chains that
        // meet end to start; join them.
        loop {
            let mut joined = None;
            'search: for i in 0..chains.len() {
                if chains[i].closed {
                    continue;
                }
                for j in 0..chains.len() {
                    if i == j || chains[j].closed {
                        continue;
                    }
                    if chains[i].end.distance(chains[j].start) <= tol {
                        joined = Some((i, j));
                        break 'search;
                    }
                }
            }
            let Some((i, j)) = joined else { break };
            let tail = chains.remove(j);
            let i = if j < i { i - 1 } else { i };
            chains[i].extend(tail.pieces);
            chains[i].try_close(EXACT_CLOSE);
        }

        // Nothing continues from these ends any more: close what comes back
        // near its start and keep the rest open.
        for chain in chains.iter_mut().filter(|c| !c.closed) {
            chain.try_close(close_tol);
        }
        chains
    }
}
