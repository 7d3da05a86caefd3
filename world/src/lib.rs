#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative lattice state for the sandpile simulation.
//!
//! The [`World`] owns the dense grain arrays and the iteration counter.
//! Adapters advance it one synchronous relaxation pass at a time through
//! [`World::iterate`] and observe it exclusively through the [`query`]
//! module.

mod lattice;
mod relax;

use sandpile_core::{CellSeed, Event};
use thiserror::Error;

use crate::lattice::Lattice;

/// Errors reported while building a world from seed cells.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SeedError {
    /// No seed cells were supplied, so there is no bounding box to allocate.
    #[error("no seed cells were provided; the initial bounding box is empty")]
    Empty,
    /// The bounding box of the seeds cannot be addressed in memory.
    #[error("seed cells span {width}x{height} cells, which cannot be allocated")]
    Oversized {
        /// Columns spanned by the seeds.
        width: usize,
        /// Rows spanned by the seeds.
        height: usize,
    },
}

/// Represents the authoritative sandpile model.
#[derive(Clone, Debug)]
pub struct World {
    lattice: Lattice,
    iteration: u64,
    changed: bool,
}

impl World {
    /// Creates a world whose lattice exactly covers the bounding box of `seeds`.
    pub fn from_seeds(seeds: &[CellSeed]) -> Result<Self, SeedError> {
        Ok(Self {
            lattice: Lattice::from_seeds(seeds)?,
            iteration: 0,
            changed: false,
        })
    }

    /// Performs one synchronous relaxation pass and reports whether any cell fired.
    pub fn iterate(&mut self) -> bool {
        let mut events = Vec::new();
        self.iterate_recording(&mut events)
    }

    /// Performs one relaxation pass, appending the events it produced.
    ///
    /// Every growth step is reported as [`Event::GridExpanded`] in the order it
    /// happened, followed by a single [`Event::Relaxed`] closing the pass.
    pub fn iterate_recording(&mut self, out_events: &mut Vec<Event>) -> bool {
        let outcome = relax::relax(&mut self.lattice, out_events);
        self.iteration = self.iteration.saturating_add(1);
        self.changed = outcome.changed;
        out_events.push(Event::Relaxed {
            iteration: self.iteration,
            changed: outcome.changed,
            toppled: outcome.toppled,
        });
        outcome.changed
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use sandpile_core::{Bounds, CellCoord, LatticeView};

    use super::World;

    /// Bounding box currently backed by the dense array.
    #[must_use]
    pub fn bounds(world: &World) -> Bounds {
        world.lattice.bounds()
    }

    /// Number of relaxation passes performed so far.
    #[must_use]
    pub fn iteration(world: &World) -> u64 {
        world.iteration
    }

    /// Whether the most recent pass fired any cell; `false` before the first pass.
    #[must_use]
    pub fn changed(world: &World) -> bool {
        world.changed
    }

    /// Grain count at `cell`, or `None` when the cell lies outside the bounds.
    #[must_use]
    pub fn grains_at(world: &World, cell: CellCoord) -> Option<u64> {
        world.lattice.grains_at(cell)
    }

    /// Sum of every grain on the lattice.
    #[must_use]
    pub fn total_grains(world: &World) -> u128 {
        world.lattice.total_grains()
    }

    /// Reports whether no cell currently holds enough grains to fire.
    #[must_use]
    pub fn is_stable(world: &World) -> bool {
        world.lattice.is_stable()
    }

    /// Captures a read-only view of the live grain counts.
    #[must_use]
    pub fn lattice_view(world: &World) -> LatticeView<'_> {
        world.lattice.view()
    }
}
