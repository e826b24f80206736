//! Progress reporting for generation calls.
//!
//! RULE: Observers are advisory. The engine reports a fixed set of
//! milestones, never waits on the observer, and produces the same
//! result whether or not one is attached.

use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;

/// Coarse milestones of one generation call, in emission order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    Started,
    PatternPrepared,
    Decomposed,
    Scheduled,
    Completed,
}

impl Milestone {
    pub fn percent(&self) -> u8 {
        match self {
            Self::Started         => 0,
            Self::PatternPrepared => 20,
            Self::Decomposed      => 60,
            Self::Scheduled       => 90,
            Self::Completed       => 100,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Started         => "Initializing generation process...",
            Self::PatternPrepared => "Analyzing template patterns...",
            Self::Decomposed      => "Calculating order distribution...",
            Self::Scheduled       => "Generating temporal distribution...",
            Self::Completed       => "Distribution complete",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressEvent {
    pub message: String,
    pub progress: u8,
}

impl From<Milestone> for ProgressEvent {
    fn from(m: Milestone) -> Self {
        Self {
            message: m.message().to_string(),
            progress: m.percent(),
        }
    }
}

/// A sink for progress events. Fire-and-forget.
pub trait ProgressObserver {
    fn on_progress(&mut self, event: &ProgressEvent);
}

/// The absent observer.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _event: &ProgressEvent) {}
}

impl<F: FnMut(&ProgressEvent)> ProgressObserver for F {
    fn on_progress(&mut self, event: &ProgressEvent) {
        self(event)
    }
}

impl ProgressObserver for Sender<ProgressEvent> {
    fn on_progress(&mut self, event: &ProgressEvent) {
        // A dropped receiver just means nobody is listening.
        let _ = self.send(event.clone());
    }
}
