#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure scheduling system that decides when a run stops and when to capture images.

use sandpile_core::Event;

/// Configuration parameters required to construct the schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    max_iterations: u64,
    frequency: u64,
}

impl Config {
    /// Creates a configuration capping the run at `max_iterations` passes and
    /// capturing every `frequency` passes; a zero frequency disables periodic captures.
    #[must_use]
    pub const fn new(max_iterations: u64, frequency: u64) -> Self {
        Self {
            max_iterations,
            frequency,
        }
    }

    /// Upper bound on the number of relaxation passes.
    #[must_use]
    pub const fn max_iterations(&self) -> u64 {
        self.max_iterations
    }

    /// Number of passes between periodic captures.
    #[must_use]
    pub const fn frequency(&self) -> u64 {
        self.frequency
    }
}

/// Instruction emitted for the adapter driving the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Render and persist the lattice as it stands after `iteration` passes.
    Capture {
        /// Iteration counter the capture is labelled with.
        iteration: u64,
    },
}

/// Reason the run stopped relaxing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HaltReason {
    /// The most recent pass fired no cell.
    Stabilized,
    /// The iteration cap was reached while cells were still firing.
    IterationCap,
}

/// Tracks relaxation progress and emits capture directives.
#[derive(Debug)]
pub struct Schedule {
    config: Config,
    iteration: u64,
    changed: bool,
    last_capture: Option<u64>,
}

impl Schedule {
    /// Creates a schedule that has not yet observed any pass.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            iteration: 0,
            changed: true,
            last_capture: None,
        }
    }

    /// Number of passes observed so far.
    #[must_use]
    pub const fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Reports whether the adapter should run another relaxation pass.
    #[must_use]
    pub fn should_relax(&self) -> bool {
        self.halt_reason().is_none()
    }

    /// Explains why relaxation stopped, or `None` while it should continue.
    #[must_use]
    pub fn halt_reason(&self) -> Option<HaltReason> {
        if !self.changed {
            Some(HaltReason::Stabilized)
        } else if self.iteration >= self.config.max_iterations {
            Some(HaltReason::IterationCap)
        } else {
            None
        }
    }

    /// Consumes pass events and emits periodic capture directives.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Directive>) {
        for event in events {
            let Event::Relaxed {
                iteration, changed, ..
            } = *event
            else {
                continue;
            };

            self.iteration = iteration;
            self.changed = changed;

            if self.is_periodic(iteration) {
                self.capture(iteration, out);
            }
        }
    }

    /// Emits the closing capture unless the final iteration was already captured.
    pub fn finish(&mut self, out: &mut Vec<Directive>) {
        if self.last_capture != Some(self.iteration) {
            self.capture(self.iteration, out);
        }
    }

    fn is_periodic(&self, iteration: u64) -> bool {
        let frequency = self.config.frequency;
        frequency != 0 && iteration % frequency == 0
    }

    fn capture(&mut self, iteration: u64, out: &mut Vec<Directive>) {
        self.last_capture = Some(iteration);
        out.push(Directive::Capture { iteration });
    }
}
