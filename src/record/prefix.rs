use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;

use super::key::{Key, Label};
use super::recorder::Recorder;
use crate::error::{RecordError, Result};

/// Call-site hierarchy active on one recorder. Never shared between recorders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixStack {
    labels: Vec<Label>,
}

impl PrefixStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<Label>) {
        self.labels.push(label.into());
    }

    /// Removes the innermost label. `level` only decorates the error.
    pub fn pop(&mut self, level: usize) -> Result<Label> {
        self.labels.pop().ok_or(RecordError::Underflow { level })
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Prefix + `leaf`, without touching the stack.
    pub fn compose(&self, leaf: impl Into<Key>) -> Key {
        Key::from(self.labels.as_slice()) + leaf
    }
}

/// Pops its label from the recorder it was pushed on when dropped,
/// including during unwinding.
#[must_use = "the prefix is popped as soon as the guard is dropped"]
pub struct PrefixGuard {
    recorder: Rc<RefCell<Recorder>>,
    label: Label,
}

impl PrefixGuard {
    pub(crate) fn push(recorder: Rc<RefCell<Recorder>>, label: Label) -> Self {
        recorder.borrow_mut().append_prefix(label.clone());
        Self { recorder, label }
    }

    pub fn label(&self) -> &Label {
        &self.label
    }
}

impl Drop for PrefixGuard {
    fn drop(&mut self) {
        let Ok(mut recorder) = self.recorder.try_borrow_mut() else {
            warn!(label = %self.label, "recorder busy, prefix left on stack");
            return;
        };
        match recorder.pop_prefix() {
            Ok(popped) if popped == self.label => {}
            Ok(popped) => warn!(
                expected = %self.label,
                popped = %popped,
                level = recorder.level(),
                "prefix guard released out of order"
            ),
            Err(e) => warn!(label = %self.label, "prefix guard release failed: {}", e),
        }
    }
}
