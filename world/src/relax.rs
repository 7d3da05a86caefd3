//! Synchronous toppling pass over the lattice.

use sandpile_core::{Direction, Event, NEIGHBOR_COUNT, TOPPLE_THRESHOLD};

use crate::lattice::Lattice;

/// Summary of a single relaxation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct PassOutcome {
    pub(crate) changed: bool,
    pub(crate) toppled: u64,
}

/// Fires every cell whose snapshot count reaches the threshold, once.
///
/// Firing decisions read the snapshot taken at the start of the pass while
/// grains are moved in the live array, so every unstable cell fires
/// simultaneously. Cells on the boundary grow the lattice before feeding
/// their outer neighbor. Growing `Up` or `Left` shifts every array index on
/// that axis by one, so the scan cursor is advanced to keep pointing at the
/// firing cell; the remaining neighbors of that cell and the rest of the scan
/// use the adjusted cursor.
pub(crate) fn relax(lattice: &mut Lattice, out_events: &mut Vec<Event>) -> PassOutcome {
    lattice.refresh_snapshot();
    let mut outcome = PassOutcome::default();

    let mut row = 0;
    while row < lattice.height() {
        let mut column = 0;
        while column < lattice.width() {
            let grains = lattice.snapshot_at(column, row);
            if grains >= TOPPLE_THRESHOLD {
                let overflow = grains / NEIGHBOR_COUNT;
                lattice.drain(column, row, overflow * NEIGHBOR_COUNT);

                if row > 0 {
                    lattice.deposit(column, row - 1, overflow);
                } else {
                    grow(lattice, Direction::Up, out_events);
                    lattice.deposit(column, 0, overflow);
                    row += 1;
                }

                if row + 1 < lattice.height() {
                    lattice.deposit(column, row + 1, overflow);
                } else {
                    grow(lattice, Direction::Down, out_events);
                    lattice.deposit(column, lattice.height() - 1, overflow);
                }

                if column > 0 {
                    lattice.deposit(column - 1, row, overflow);
                } else {
                    grow(lattice, Direction::Left, out_events);
                    lattice.deposit(0, row, overflow);
                    column += 1;
                }

                if column + 1 < lattice.width() {
                    lattice.deposit(column + 1, row, overflow);
                } else {
                    grow(lattice, Direction::Right, out_events);
                    lattice.deposit(lattice.width() - 1, row, overflow);
                }

                outcome.changed = true;
                outcome.toppled += 1;
            }
            column += 1;
        }
        row += 1;
    }

    outcome
}

fn grow(lattice: &mut Lattice, direction: Direction, out_events: &mut Vec<Event>) {
    let bounds = lattice.expand(direction);
    out_events.push(Event::GridExpanded { direction, bounds });
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandpile_core::{CellCoord, CellSeed};

    fn lattice(seeds: &[(i64, i64, u64)]) -> Lattice {
        let seeds: Vec<CellSeed> = seeds
            .iter()
            .map(|&(x, y, grains)| CellSeed::new(CellCoord::new(x, y), grains))
            .collect();
        Lattice::from_seeds(&seeds).expect("non-empty seeds")
    }

    fn grains(lattice: &Lattice, x: i64, y: i64) -> u64 {
        lattice.grains_at(CellCoord::new(x, y)).unwrap_or(0)
    }

    #[test]
    fn three_grains_never_fire() {
        let mut lattice = lattice(&[(0, 0, 3)]);
        let mut events = Vec::new();

        let outcome = relax(&mut lattice, &mut events);

        assert_eq!(outcome, PassOutcome::default());
        assert!(events.is_empty());
        assert_eq!(grains(&lattice, 0, 0), 3);
    }

    #[test]
    fn four_grains_fire_one_per_neighbor() {
        let mut lattice = lattice(&[(0, 0, 4)]);
        let mut events = Vec::new();

        let outcome = relax(&mut lattice, &mut events);

        assert!(outcome.changed);
        assert_eq!(outcome.toppled, 1);
        assert_eq!(grains(&lattice, 0, 0), 0);
        for direction in Direction::ALL {
            let neighbor = CellCoord::new(0, 0).step(direction);
            assert_eq!(lattice.grains_at(neighbor), Some(1), "{direction:?}");
        }
    }

    #[test]
    fn ten_grains_fire_two_per_neighbor_and_keep_the_rest() {
        let mut lattice = lattice(&[(0, 0, 10)]);
        let mut events = Vec::new();

        let _ = relax(&mut lattice, &mut events);

        assert_eq!(grains(&lattice, 0, 0), 2);
        assert_eq!(grains(&lattice, 0, -1), 2);
        assert_eq!(grains(&lattice, 0, 1), 2);
        assert_eq!(grains(&lattice, -1, 0), 2);
        assert_eq!(grains(&lattice, 1, 0), 2);
        assert_eq!(lattice.total_grains(), 10);
    }

    #[test]
    fn boundary_firing_grows_each_edge_once() {
        let mut lattice = lattice(&[(0, 0, 4)]);
        let mut events = Vec::new();

        let _ = relax(&mut lattice, &mut events);

        let directions: Vec<Direction> = events
            .iter()
            .map(|event| match event {
                Event::GridExpanded { direction, .. } => *direction,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(directions, Direction::ALL.to_vec());

        let bounds = lattice.bounds();
        assert_eq!((bounds.min_x(), bounds.min_y()), (-1, -1));
        assert_eq!((bounds.width(), bounds.height()), (3, 3));
    }

    #[test]
    fn interior_firing_does_not_grow() {
        let mut lattice = lattice(&[(-1, -1, 0), (0, 0, 4), (1, 1, 0)]);
        let mut events = Vec::new();

        let outcome = relax(&mut lattice, &mut events);

        assert!(outcome.changed);
        assert!(events.is_empty());
        assert_eq!(lattice.bounds().area(), 9);
    }

    #[test]
    fn firing_uses_snapshot_not_inbound_grains() {
        // (1, 0) reaches four grains only after (0, 0) fires into it.
        let mut lattice = lattice(&[(-1, 0, 0), (0, 0, 4), (1, 0, 3), (2, 0, 0)]);
        let mut events = Vec::new();

        let outcome = relax(&mut lattice, &mut events);

        assert_eq!(outcome.toppled, 1);
        assert_eq!(grains(&lattice, 1, 0), 4);
    }

    #[test]
    fn adjacent_boundary_cells_fire_with_shifted_cursor() {
        let mut lattice = lattice(&[(0, 0, 4), (1, 0, 4)]);
        let mut events = Vec::new();

        let outcome = relax(&mut lattice, &mut events);

        assert_eq!(outcome.toppled, 2);
        let bounds = lattice.bounds();
        assert_eq!((bounds.min_x(), bounds.min_y()), (-1, -1));
        assert_eq!((bounds.width(), bounds.height()), (4, 3));
        for (x, y) in [(0, -1), (1, -1), (0, 1), (1, 1), (-1, 0), (0, 0), (1, 0), (2, 0)] {
            assert_eq!(grains(&lattice, x, y), 1, "cell ({x}, {y})");
        }
        assert_eq!(lattice.total_grains(), 8);
    }
}
