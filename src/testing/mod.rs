//! Test helpers: a shared call log and recording collaborators.
//!
//! [`Recorder`] collects entries in call order. [`RecordingView`] and
//! [`RecordingUnit`] append their label to a recorder when initialized, which
//! makes orchestrator initialization order easy to assert.

pub mod recorder;

pub use recorder::{Recorder, RecordingUnit, RecordingView};
