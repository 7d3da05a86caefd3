//! Dense grain storage backing the unbounded lattice.

use sandpile_core::{Bounds, CellCoord, CellSeed, Direction, LatticeView};

use crate::SeedError;

/// Live and snapshot grain arrays covering the current bounding box.
///
/// Both buffers are row-major with stride `bounds.width()` and always share
/// the same shape, so an index valid for one is valid for the other.
#[derive(Clone, Debug)]
pub(crate) struct Lattice {
    bounds: Bounds,
    live: Vec<u64>,
    snapshot: Vec<u64>,
}

impl Lattice {
    /// Allocates the bounding box of `seeds` and writes every seed into it.
    ///
    /// Later seeds overwrite earlier ones on the same coordinate.
    pub(crate) fn from_seeds(seeds: &[CellSeed]) -> Result<Self, SeedError> {
        let bounds =
            Bounds::enclosing(seeds.iter().map(CellSeed::cell)).ok_or(SeedError::Empty)?;
        let area = bounds
            .width()
            .checked_mul(bounds.height())
            .ok_or(SeedError::Oversized {
                width: bounds.width(),
                height: bounds.height(),
            })?;

        let mut live = vec![0; area];
        for seed in seeds {
            if let Some((column, row)) = bounds.index_of(seed.cell()) {
                live[row * bounds.width() + column] = seed.grains();
            }
        }

        Ok(Self {
            bounds,
            snapshot: vec![0; area],
            live,
        })
    }

    pub(crate) const fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub(crate) const fn width(&self) -> usize {
        self.bounds.width()
    }

    pub(crate) const fn height(&self) -> usize {
        self.bounds.height()
    }

    /// Copies the live grains into the snapshot used for firing decisions.
    pub(crate) fn refresh_snapshot(&mut self) {
        self.snapshot.copy_from_slice(&self.live);
    }

    pub(crate) fn snapshot_at(&self, column: usize, row: usize) -> u64 {
        self.snapshot[self.offset(column, row)]
    }

    /// Removes grains from a live cell.
    pub(crate) fn drain(&mut self, column: usize, row: usize, grains: u64) {
        let offset = self.offset(column, row);
        self.live[offset] -= grains;
    }

    /// Adds grains to a live cell.
    pub(crate) fn deposit(&mut self, column: usize, row: usize, grains: u64) {
        let offset = self.offset(column, row);
        self.live[offset] += grains;
    }

    /// Grows both arrays by one zeroed row or column on the given edge.
    ///
    /// Existing cells keep their logical coordinates; for `Up` and `Left`
    /// that means their array index shifts by one.
    pub(crate) fn expand(&mut self, direction: Direction) -> Bounds {
        let width = self.width();
        self.live = grown(&self.live, width, direction);
        self.snapshot = grown(&self.snapshot, width, direction);
        self.bounds = self.bounds.expanded(direction);
        self.bounds
    }

    pub(crate) fn grains_at(&self, cell: CellCoord) -> Option<u64> {
        let (column, row) = self.bounds.index_of(cell)?;
        Some(self.live[self.offset(column, row)])
    }

    pub(crate) fn view(&self) -> LatticeView<'_> {
        LatticeView::new(self.bounds, &self.live)
            .expect("live buffer always matches the bounding box area")
    }

    pub(crate) fn total_grains(&self) -> u128 {
        self.live.iter().map(|&grains| u128::from(grains)).sum()
    }

    pub(crate) fn is_stable(&self) -> bool {
        self.live
            .iter()
            .all(|&grains| grains < sandpile_core::TOPPLE_THRESHOLD)
    }

    const fn offset(&self, column: usize, row: usize) -> usize {
        row * self.bounds.width() + column
    }
}

fn grown(cells: &[u64], width: usize, direction: Direction) -> Vec<u64> {
    let rows = cells.len().checked_div(width).unwrap_or(0);
    let mut grown = Vec::with_capacity(if direction.is_vertical() {
        cells.len() + width
    } else {
        cells.len() + rows
    });

    match direction {
        Direction::Up => {
            grown.resize(width, 0);
            grown.extend_from_slice(cells);
        }
        Direction::Down => {
            grown.extend_from_slice(cells);
            grown.resize(cells.len() + width, 0);
        }
        Direction::Left => {
            for row in cells.chunks_exact(width) {
                grown.push(0);
                grown.extend_from_slice(row);
            }
        }
        Direction::Right => {
            for row in cells.chunks_exact(width) {
                grown.extend_from_slice(row);
                grown.push(0);
            }
        }
    }

    grown
}
