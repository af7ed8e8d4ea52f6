//! Pixel-space hex geometry.
//!
//! Tiles use a pointy-top layout: a tile's bounding box is `width × height`,
//! horizontal neighbours are one full width apart and diagonal neighbours sit
//! half a width across and three quarters of a height down/up. All
//! coordinates are integers so positions compare and hash exactly.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MapError;

/// One of the six adjacency slots of a hex tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    West,
    NorthWest,
    NorthEast,
    East,
    SouthEast,
    SouthWest,
}

impl Direction {
    /// Fixed iteration order, used by every traversal.
    pub const ALL: [Direction; 6] = [
        Direction::West,
        Direction::NorthWest,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::West => Direction::East,
            Direction::NorthWest => Direction::SouthEast,
            Direction::NorthEast => Direction::SouthWest,
            Direction::East => Direction::West,
            Direction::SouthEast => Direction::NorthWest,
            Direction::SouthWest => Direction::NorthEast,
        }
    }

    /// Slot index into per-direction arrays (`[T; 6]`).
    pub fn index(self) -> usize {
        match self {
            Direction::West => 0,
            Direction::NorthWest => 1,
            Direction::NorthEast => 2,
            Direction::East => 3,
            Direction::SouthEast => 4,
            Direction::SouthWest => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::West => "West",
            Direction::NorthWest => "NorthWest",
            Direction::NorthEast => "NorthEast",
            Direction::East => "East",
            Direction::SouthEast => "SouthEast",
            Direction::SouthWest => "SouthWest",
        }
    }

    /// Offset from a tile's top-left corner to its neighbour's in this direction.
    pub fn displacement(self, tile: TileSize) -> Point {
        let half_w = tile.width / 2;
        let row_h = tile.height * 3 / 4;
        match self {
            Direction::West => Point::new(-tile.width, 0),
            Direction::NorthWest => Point::new(-half_w, -row_h),
            Direction::NorthEast => Point::new(half_w, -row_h),
            Direction::East => Point::new(tile.width, 0),
            Direction::SouthEast => Point::new(half_w, row_h),
            Direction::SouthWest => Point::new(-half_w, row_h),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Direction {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| MapError::UnknownDirection(s.to_string()))
    }
}

/// Direction given by name.
///
/// An unknown token is a contract violation on the caller's side; it is
/// logged and returned as an error so the caller can abort whatever it was
/// building.
pub fn parse_direction(token: &str) -> Result<Direction, MapError> {
    token.parse::<Direction>().inspect_err(|e| log::error!("{e}"))
}

/// Top-left corner of the neighbouring tile of `pos` in direction `dir`.
pub fn neighbour_pos(pos: Point, dir: Direction, tile: TileSize) -> Point {
    pos + dir.displacement(tile)
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise add that pins at the `i32` range instead of wrapping.
    pub fn saturating_add(self, rhs: Point) -> Point {
        Point::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }

    pub fn saturating_sub(self, rhs: Point) -> Point {
        Point::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Bounding box of one hexagonal tile, from the world surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileSize {
    pub width: i32,
    pub height: i32,
}

impl TileSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2, self.height / 2)
    }
}

impl Default for TileSize {
    fn default() -> Self {
        Self::new(128, 128)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const ZERO: Self = Self {
        width: 0,
        height: 0,
    };

    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Per-axis maximum.
    pub fn max(self, other: Size) -> Size {
        Size::new(self.width.max(other.width), self.height.max(other.height))
    }
}

/// Integer rectangle; `x`/`y` is the top-left corner, right/bottom edges are
/// exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const ZERO: Self = Self {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Rect covering the tile whose top-left corner is `pos`.
    pub fn tile(pos: Point, tile: TileSize) -> Self {
        Self::new(pos.x, pos.y, tile.width, tile.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn translated(&self, delta: Point) -> Rect {
        Rect::new(self.x + delta.x, self.y + delta.y, self.width, self.height)
    }

    pub fn with_origin(&self, origin: Point) -> Rect {
        Rect::new(origin.x, origin.y, self.width, self.height)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {} {}x{}]",
            self.x, self.y, self.width, self.height
        )
    }
}

// ---------------------------------------------------------------------------
// Hexagon silhouette
// ---------------------------------------------------------------------------

/// The six corners of a tile's hexagon, relative to its top-left corner,
/// clockwise from the upper-left shoulder.
pub fn hexagon_vertices(tile: TileSize) -> [Point; 6] {
    let w = tile.width;
    let h = tile.height;
    [
        Point::new(0, h / 4),
        Point::new(w / 2, 0),
        Point::new(w, h / 4),
        Point::new(w, 3 * h / 4),
        Point::new(w / 2, h),
        Point::new(0, 3 * h / 4),
    ]
}

/// Point-in-hexagon test in tile-local coordinates. Edges count as inside.
pub fn hex_contains(local: Point, tile: TileSize) -> bool {
    if local.x < 0 || local.y < 0 || local.x > tile.width || local.y > tile.height {
        return false;
    }

    let vertices = hexagon_vertices(tile);
    (0..vertices.len()).all(|i| {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        let cross = (b.x - a.x) as i64 * (local.y - a.y) as i64
            - (b.y - a.y) as i64 * (local.x - a.x) as i64;
        cross >= 0
    })
}
