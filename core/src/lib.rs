#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the sandpile workspace.
//!
//! This crate defines the vocabulary that connects the authoritative lattice,
//! the pure systems that steer a run and the adapters that present it. The
//! world owns the grain counts and hands out read-only [`LatticeView`] values;
//! adapters consume those views without ever reaching into world internals.
//! Every relaxation pass may additionally report [`Event`] values describing
//! how the bounding box grew and whether anything toppled.

use serde::{Deserialize, Serialize};

/// Grain count at which a cell becomes unstable and fires.
pub const TOPPLE_THRESHOLD: u64 = 4;

/// Number of orthogonal neighbors that receive grains when a cell fires.
pub const NEIGHBOR_COUNT: u64 = 4;

/// Location of a single lattice cell expressed as signed logical coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: i64,
    y: i64,
}

impl CellCoord {
    /// Creates a new lattice coordinate.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Horizontal logical coordinate of the cell.
    #[must_use]
    pub const fn x(&self) -> i64 {
        self.x
    }

    /// Vertical logical coordinate of the cell.
    #[must_use]
    pub const fn y(&self) -> i64 {
        self.y
    }

    /// Returns the orthogonal neighbor reached by stepping once in `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        match direction {
            Direction::Up => Self::new(self.x, self.y - 1),
            Direction::Down => Self::new(self.x, self.y + 1),
            Direction::Left => Self::new(self.x - 1, self.y),
            Direction::Right => Self::new(self.x + 1, self.y),
        }
    }
}

/// Initial grain count assigned to a lattice cell before the first pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellSeed {
    cell: CellCoord,
    grains: u64,
}

impl CellSeed {
    /// Creates a seed placing `grains` grains on `cell`.
    #[must_use]
    pub const fn new(cell: CellCoord, grains: u64) -> Self {
        Self { cell, grains }
    }

    /// Cell receiving the grains.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Number of grains placed on the cell.
    #[must_use]
    pub const fn grains(&self) -> u64 {
        self.grains
    }
}

/// Edge of the bounding box, doubling as the orthogonal neighbor direction.
///
/// `Up` points toward decreasing `y`, matching array row order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing `y`.
    Up,
    /// Toward increasing `y`.
    Down,
    /// Toward decreasing `x`.
    Left,
    /// Toward increasing `x`.
    Right,
}

impl Direction {
    /// Every direction in the order a firing cell feeds its neighbors.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Reports whether growing in this direction adds a row rather than a column.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }
}

/// Axis-aligned rectangle of logical coordinates backed by the dense array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    min_x: i64,
    min_y: i64,
    width: usize,
    height: usize,
}

impl Bounds {
    /// Creates bounds anchored at `(min_x, min_y)` spanning `width` by `height` cells.
    #[must_use]
    pub const fn new(min_x: i64, min_y: i64, width: usize, height: usize) -> Self {
        Self {
            min_x,
            min_y,
            width,
            height,
        }
    }

    /// Computes the smallest bounds enclosing every provided cell.
    ///
    /// Returns `None` when no cells are supplied.
    #[must_use]
    pub fn enclosing<I>(cells: I) -> Option<Self>
    where
        I: IntoIterator<Item = CellCoord>,
    {
        let mut cells = cells.into_iter();
        let first = cells.next()?;
        let (mut min_x, mut max_x) = (first.x(), first.x());
        let (mut min_y, mut max_y) = (first.y(), first.y());

        for cell in cells {
            min_x = min_x.min(cell.x());
            max_x = max_x.max(cell.x());
            min_y = min_y.min(cell.y());
            max_y = max_y.max(cell.y());
        }

        let width = span(min_x, max_x)?;
        let height = span(min_y, max_y)?;
        Some(Self::new(min_x, min_y, width, height))
    }

    /// Smallest logical `x` covered by the bounds.
    #[must_use]
    pub const fn min_x(&self) -> i64 {
        self.min_x
    }

    /// Smallest logical `y` covered by the bounds.
    #[must_use]
    pub const fn min_y(&self) -> i64 {
        self.min_y
    }

    /// Largest logical `x` covered by the bounds.
    #[must_use]
    pub const fn max_x(&self) -> i64 {
        self.min_x + self.width as i64 - 1
    }

    /// Largest logical `y` covered by the bounds.
    #[must_use]
    pub const fn max_y(&self) -> i64 {
        self.min_y + self.height as i64 - 1
    }

    /// Number of columns covered by the bounds.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows covered by the bounds.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Number of cells covered by the bounds.
    #[must_use]
    pub const fn area(&self) -> usize {
        self.width * self.height
    }

    /// Reports whether the logical coordinate lies inside the bounds.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.index_of(cell).is_some()
    }

    /// Translates a logical coordinate into array indices `(column, row)`.
    #[must_use]
    pub fn index_of(&self, cell: CellCoord) -> Option<(usize, usize)> {
        let column = usize::try_from(cell.x().checked_sub(self.min_x)?).ok()?;
        let row = usize::try_from(cell.y().checked_sub(self.min_y)?).ok()?;
        (column < self.width && row < self.height).then_some((column, row))
    }

    /// Translates array indices back into the logical coordinate they cover.
    #[must_use]
    pub const fn cell_at(&self, column: usize, row: usize) -> CellCoord {
        CellCoord::new(self.min_x + column as i64, self.min_y + row as i64)
    }

    /// Bounds after growing by exactly one row or column on the given edge.
    #[must_use]
    pub const fn expanded(self, direction: Direction) -> Self {
        match direction {
            Direction::Up => Self::new(self.min_x, self.min_y - 1, self.width, self.height + 1),
            Direction::Down => Self::new(self.min_x, self.min_y, self.width, self.height + 1),
            Direction::Left => Self::new(self.min_x - 1, self.min_y, self.width + 1, self.height),
            Direction::Right => Self::new(self.min_x, self.min_y, self.width + 1, self.height),
        }
    }
}

fn span(min: i64, max: i64) -> Option<usize> {
    let extent = max.abs_diff(min).checked_add(1)?;
    usize::try_from(extent).ok()
}

/// Read-only view of the grain counts covered by a set of bounds.
///
/// Cells are stored row-major: row `0` holds the smallest `y`.
#[derive(Clone, Copy, Debug)]
pub struct LatticeView<'a> {
    bounds: Bounds,
    cells: &'a [u64],
}

impl<'a> LatticeView<'a> {
    /// Wraps a row-major grain slice covering `bounds`.
    ///
    /// Returns `None` when the slice length does not match the bounds area.
    #[must_use]
    pub fn new(bounds: Bounds, cells: &'a [u64]) -> Option<Self> {
        (cells.len() == bounds.area()).then_some(Self { bounds, cells })
    }

    /// Bounds covered by the view.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Number of columns in the view.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.bounds.width()
    }

    /// Number of rows in the view.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.bounds.height()
    }

    /// Grain count at the provided logical coordinate, if covered.
    #[must_use]
    pub fn grains_at(&self, cell: CellCoord) -> Option<u64> {
        let (column, row) = self.bounds.index_of(cell)?;
        self.cells.get(row * self.width() + column).copied()
    }

    /// Iterates over rows in ascending `y` order.
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &'a [u64]> + 'a {
        let width = self.width().max(1);
        self.cells.chunks_exact(width)
    }

    /// Flat row-major slice of all grain counts.
    #[must_use]
    pub const fn cells(&self) -> &'a [u64] {
        self.cells
    }
}

/// Events reported by the world while relaxing the lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Confirms that the bounding box grew by one row or column.
    GridExpanded {
        /// Edge that received the new row or column.
        direction: Direction,
        /// Bounds after the expansion.
        bounds: Bounds,
    },
    /// Announces that a relaxation pass completed.
    Relaxed {
        /// Iteration counter after the pass.
        iteration: u64,
        /// Whether any cell fired during the pass.
        changed: bool,
        /// Number of cells that fired during the pass.
        toppled: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::{Bounds, CellCoord, CellSeed, Direction, Event, LatticeView};
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn enclosing_bounds_cover_every_cell() {
        let bounds = Bounds::enclosing([
            CellCoord::new(-3, 2),
            CellCoord::new(4, -1),
            CellCoord::new(0, 5),
        ])
        .expect("non-empty input");

        assert_eq!(bounds.min_x(), -3);
        assert_eq!(bounds.max_x(), 4);
        assert_eq!(bounds.min_y(), -1);
        assert_eq!(bounds.max_y(), 5);
        assert_eq!(bounds.width(), 8);
        assert_eq!(bounds.height(), 7);
    }

    #[test]
    fn enclosing_bounds_reject_empty_input() {
        assert!(Bounds::enclosing(std::iter::empty()).is_none());
    }

    #[test]
    fn single_cell_bounds_are_one_by_one() {
        let bounds = Bounds::enclosing([CellCoord::new(7, -7)]).expect("non-empty input");
        assert_eq!((bounds.width(), bounds.height()), (1, 1));
        assert_eq!(bounds.index_of(CellCoord::new(7, -7)), Some((0, 0)));
    }

    #[test]
    fn expansion_adds_one_row_or_column() {
        let bounds = Bounds::new(0, 0, 3, 2);

        let up = bounds.expanded(Direction::Up);
        assert_eq!((up.min_y(), up.max_y(), up.height()), (-1, 1, 3));

        let down = bounds.expanded(Direction::Down);
        assert_eq!((down.min_y(), down.max_y(), down.height()), (0, 2, 3));

        let left = bounds.expanded(Direction::Left);
        assert_eq!((left.min_x(), left.max_x(), left.width()), (-1, 2, 4));

        let right = bounds.expanded(Direction::Right);
        assert_eq!((right.min_x(), right.max_x(), right.width()), (0, 3, 4));
    }

    #[test]
    fn index_translation_is_offset_by_minimum() {
        let bounds = Bounds::new(-2, 3, 4, 2);
        assert_eq!(bounds.index_of(CellCoord::new(-2, 3)), Some((0, 0)));
        assert_eq!(bounds.index_of(CellCoord::new(1, 4)), Some((3, 1)));
        assert_eq!(bounds.index_of(CellCoord::new(2, 4)), None);
        assert_eq!(bounds.index_of(CellCoord::new(-3, 3)), None);
        assert_eq!(bounds.cell_at(3, 1), CellCoord::new(1, 4));
    }

    #[test]
    fn step_moves_to_orthogonal_neighbor() {
        let origin = CellCoord::new(0, 0);
        assert_eq!(origin.step(Direction::Up), CellCoord::new(0, -1));
        assert_eq!(origin.step(Direction::Down), CellCoord::new(0, 1));
        assert_eq!(origin.step(Direction::Left), CellCoord::new(-1, 0));
        assert_eq!(origin.step(Direction::Right), CellCoord::new(1, 0));
    }

    #[test]
    fn lattice_view_rejects_mismatched_slice() {
        let cells = [0_u64; 5];
        assert!(LatticeView::new(Bounds::new(0, 0, 2, 2), &cells).is_none());
    }

    #[test]
    fn lattice_view_reads_by_logical_coordinate() {
        let cells = [1, 2, 3, 4, 5, 6];
        let view = LatticeView::new(Bounds::new(10, -1, 3, 2), &cells).expect("matching slice");

        assert_eq!(view.grains_at(CellCoord::new(10, -1)), Some(1));
        assert_eq!(view.grains_at(CellCoord::new(12, 0)), Some(6));
        assert_eq!(view.grains_at(CellCoord::new(13, 0)), None);

        let rows: Vec<&[u64]> = view.rows().collect();
        assert_eq!(rows, vec![&[1, 2, 3][..], &[4, 5, 6][..]]);
    }

    #[test]
    fn seed_round_trips_through_bincode() {
        assert_round_trip(&CellSeed::new(CellCoord::new(-4, 9), u64::MAX));
    }

    #[test]
    fn event_round_trips_through_bincode() {
        assert_round_trip(&Event::GridExpanded {
            direction: Direction::Left,
            bounds: Bounds::new(-1, 0, 3, 1),
        });
        assert_round_trip(&Event::Relaxed {
            iteration: 12,
            changed: true,
            toppled: 3,
        });
    }
}
