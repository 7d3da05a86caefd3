//! Relaxation loop wiring the world, the schedule and the snapshot sink together.

use std::path::PathBuf;

use sandpile_core::Event;
use sandpile_rendering::SnapshotSink;
use sandpile_system_schedule::{Directive, HaltReason, Schedule};
use sandpile_world::{query, World};
use tracing::{debug, error, info};

/// Outcome of a completed run.
#[derive(Debug)]
pub(crate) struct RunSummary {
    pub(crate) iterations: u64,
    pub(crate) halt: Option<HaltReason>,
    pub(crate) saved: Vec<PathBuf>,
    pub(crate) skipped: usize,
}

/// Relaxes `world` until the schedule halts, capturing snapshots as directed.
///
/// A failed capture is logged and skipped; the run carries on.
pub(crate) fn run(
    world: &mut World,
    schedule: &mut Schedule,
    sink: &mut dyn SnapshotSink,
) -> RunSummary {
    let mut summary = RunSummary {
        iterations: 0,
        halt: None,
        saved: Vec::new(),
        skipped: 0,
    };
    let mut events = Vec::new();
    let mut directives = Vec::new();

    while schedule.should_relax() {
        events.clear();
        let _ = world.iterate_recording(&mut events);
        log_events(&events);

        directives.clear();
        schedule.handle(&events, &mut directives);
        execute(&directives, world, sink, &mut summary);
    }

    directives.clear();
    schedule.finish(&mut directives);
    execute(&directives, world, sink, &mut summary);

    summary.iterations = schedule.iteration();
    summary.halt = schedule.halt_reason();
    summary
}

fn log_events(events: &[Event]) {
    for event in events {
        match *event {
            Event::GridExpanded { direction, bounds } => debug!(
                ?direction,
                width = bounds.width(),
                height = bounds.height(),
                "lattice expanded"
            ),
            Event::Relaxed {
                iteration,
                changed,
                toppled,
            } => debug!(iteration, changed, toppled, "relaxation pass complete"),
        }
    }
}

fn execute(
    directives: &[Directive],
    world: &World,
    sink: &mut dyn SnapshotSink,
    summary: &mut RunSummary,
) {
    for directive in directives {
        match *directive {
            Directive::Capture { iteration } => {
                match sink.capture(iteration, &query::lattice_view(world)) {
                    Ok(path) => {
                        info!(iteration, path = %path.display(), "saved image");
                        summary.saved.push(path);
                    }
                    Err(err) => {
                        error!(iteration, "skipping image: {err:#}");
                        summary.skipped += 1;
                    }
                }
            }
        }
    }
}
