//! Recorder: a shared, ordered call log, plus a view and a logic unit that
//! write to it when initialized.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::mvc::{LogicUnit, Provider, Role, UnitContext, UnitProps, View};

// ---------------------------------------------------------------------------
// Recorder
// ---------------------------------------------------------------------------

/// Ordered log shared between the code under test and the assertions.
///
/// Cloning shares the log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    entries: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    /// Snapshot of every entry so far.
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// Index of the first entry equal to `entry`.
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries.borrow().iter().position(|e| e == entry)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

// ---------------------------------------------------------------------------
// RecordingView
// ---------------------------------------------------------------------------

/// View that records `label` when initialized.
pub struct RecordingView {
    context: UnitContext,
    recorder: Recorder,
    label: String,
}

impl RecordingView {
    pub fn new(props: &UnitProps, recorder: &Recorder, label: impl Into<String>) -> Self {
        Self {
            context: UnitContext::from_props(props),
            recorder: recorder.clone(),
            label: label.into(),
        }
    }

    /// Factory provider for an orchestrator.
    pub fn provider(recorder: &Recorder, label: impl Into<String>) -> Provider<dyn View> {
        let recorder = recorder.clone();
        let label = label.into();
        Provider::<dyn View>::of(move |props| RecordingView::new(&props, &recorder, label.clone()))
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl View for RecordingView {
    fn context(&self) -> &UnitContext {
        &self.context
    }

    fn initialize(&self) {
        self.recorder.record(self.label.clone());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// RecordingUnit
// ---------------------------------------------------------------------------

/// Logic unit that records `label` when initialized.
pub struct RecordingUnit {
    context: UnitContext,
    recorder: Recorder,
    role: Role,
    label: String,
}

impl RecordingUnit {
    pub fn new(
        props: &UnitProps,
        recorder: &Recorder,
        role: Role,
        label: impl Into<String>,
    ) -> Self {
        Self {
            context: UnitContext::from_props(props),
            recorder: recorder.clone(),
            role,
            label: label.into(),
        }
    }

    /// Factory provider registering under `label`.
    pub fn provider(
        recorder: &Recorder,
        role: Role,
        label: impl Into<String>,
    ) -> Provider<dyn LogicUnit> {
        let recorder = recorder.clone();
        let label = label.into();
        Provider::<dyn LogicUnit>::of(move |props| {
            let unit = RecordingUnit::new(&props, &recorder, role, label.clone());
            unit.context.set_key_name(label.clone());
            unit
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl LogicUnit for RecordingUnit {
    fn context(&self) -> &UnitContext {
        &self.context
    }

    fn role(&self) -> Role {
        self.role
    }

    fn initialize(&self) {
        self.recorder.record(self.label.clone());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_is_shared_and_ordered() {
        let recorder = Recorder::new();
        let other = recorder.clone();
        recorder.record("a");
        other.record("b");
        assert_eq!(recorder.entries(), vec!["a", "b"]);
        assert_eq!(recorder.position("b"), Some(1));
        assert_eq!(recorder.position("c"), None);
        recorder.clear();
        assert!(other.is_empty());
    }

    #[test]
    fn recording_unit_keys_itself_by_label() {
        let recorder = Recorder::new();
        let unit =
            RecordingUnit::provider(&recorder, Role::Tool, "grid").generate(&UnitProps::new());
        assert_eq!(unit.context().key_name().as_deref(), Some("grid"));
        assert_eq!(unit.role(), Role::Tool);
        unit.initialize();
        assert_eq!(recorder.entries(), vec!["grid"]);
    }

    #[test]
    fn recording_view_records_label() {
        let recorder = Recorder::new();
        let view = RecordingView::provider(&recorder, "view").generate(&UnitProps::new());
        view.initialize();
        assert_eq!(recorder.len(), 1);
        assert_eq!(
            view.as_any().downcast_ref::<RecordingView>().map(RecordingView::label),
            Some("view")
        );
    }
}
