use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;
use tracing::{debug, warn};

use super::key::{Key, Label};
use super::prefix::PrefixGuard;
use super::recorder::{Entries, RecordArgs, Recorder};
use super::value::Value;
use crate::config::RecordConfig;
use crate::error::Result;
use crate::report::tree::EntryTree;

/// Shared handle on the recorder of one level.
///
/// Two handles are equal only if they point at the same recorder. A handle
/// outlives its scope: after exit it still shows what was recorded at that
/// level, not the merged parent view.
#[derive(Clone)]
pub struct RecordHandle(Rc<RefCell<Recorder>>);

impl RecordHandle {
    fn new(level: usize) -> Self {
        RecordHandle(Rc::new(RefCell::new(Recorder::new(level))))
    }

    pub fn level(&self) -> usize {
        self.0.borrow().level()
    }

    pub fn is_started(&self) -> bool {
        self.0.borrow().is_started()
    }

    pub fn start(&self) {
        self.0.borrow_mut().start();
    }

    pub fn stop(&self) {
        self.0.borrow_mut().stop();
    }

    pub fn record(&self, args: RecordArgs) {
        self.0.borrow_mut().record(args);
    }

    pub fn add_entry(&self, leaf: impl Into<Key>, value: impl Into<Value>) {
        self.0.borrow_mut().add_entry(leaf, value);
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn entries(&self) -> Entries {
        self.0.borrow().entries().clone()
    }

    pub fn prefixes(&self) -> Vec<Label> {
        self.0.borrow().prefixes().labels().to_vec()
    }

    /// Pushes `label` until the returned guard is dropped.
    pub fn push_prefix(&self, label: impl Into<Label>) -> PrefixGuard {
        PrefixGuard::push(Rc::clone(&self.0), label.into())
    }

    /// Pushes `label` with no guard; pair with [`RecordHandle::pop_prefix`].
    pub fn append_prefix(&self, label: impl Into<Label>) {
        self.0.borrow_mut().append_prefix(label);
    }

    pub fn pop_prefix(&self) -> Result<Label> {
        self.0.borrow_mut().pop_prefix()
    }

    /// Read access to the recorder. Calling back into this handle from `f`
    /// panics on the double borrow.
    pub fn with<R>(&self, f: impl FnOnce(&Recorder) -> R) -> R {
        f(&self.0.borrow())
    }

    pub fn to_tree(&self) -> EntryTree {
        EntryTree::from(self.entries())
    }
}

impl PartialEq for RecordHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for RecordHandle {}

impl fmt::Display for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(recorder) => write!(f, "Record({})", recorder.level()),
            Err(_) => f.write_str("Record(<busy>)"),
        }
    }
}

impl fmt::Debug for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// One recorder per nesting level, looked up by the current depth.
///
/// Invariant: once a lookup has happened at the current depth, there are
/// `depth + 1` recorders and the one at index `i` has level `i`.
#[derive(Debug, Default)]
pub struct ScopeStack {
    records: Vec<RecordHandle>,
    depth: usize,
    config: RecordConfig,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RecordConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of live recorders.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn config(&self) -> &RecordConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: RecordConfig) {
        self.config = config;
    }

    /// The recorder for the present depth, created stopped and empty on first
    /// lookup. Later lookups at the same depth return the same instance.
    pub fn current(&mut self) -> RecordHandle {
        while self.records.len() <= self.depth {
            let level = self.records.len();
            self.records.push(RecordHandle::new(level));
        }
        self.records[self.depth].clone()
    }

    /// Materializes the parent, descends one level and starts the new recorder.
    pub fn begin_scope(&mut self) -> RecordHandle {
        self.current();
        self.depth += 1;
        let child = self.current();
        child.start();
        debug!(level = self.depth, "recording scope entered");
        child
    }

    /// Stops and removes the innermost recorder. Above the root its entries
    /// are merged into the parent under the parent's live prefix.
    pub fn end_scope(&mut self) -> Option<RecordHandle> {
        let Some(child) = self.records.pop() else {
            warn!(depth = self.depth, "recording scope exited with no recorder");
            return None;
        };
        child.stop();
        if self.depth > 0 {
            self.depth -= 1;
            let parent = self.current();
            let merged = child.with(|rec| {
                parent.0.borrow_mut().merge(rec);
                rec.entries().len()
            });
            debug!(level = self.depth, merged, "recording scope exited");
        } else {
            debug!("root recorder dropped");
        }
        Some(child)
    }

    /// Exits the scope whose recorder is `scope`. Scopes opened inside it and
    /// still open are exited first, innermost first, each merging into its
    /// parent. Returns `false` if `scope` is no longer on the stack.
    pub fn exit(&mut self, scope: &RecordHandle) -> bool {
        let Some(position) = self.records.iter().position(|rec| rec == scope) else {
            warn!(scope = %scope, depth = self.depth, "recording scope already exited");
            return false;
        };
        let inner = self.records.len() - 1 - position;
        if inner > 0 {
            warn!(scope = %scope, inner, "recording scope exited out of order, closing inner scopes");
        }
        while self.records.len() > position {
            if self.end_scope().is_none() {
                break;
            }
        }
        true
    }
}

thread_local! {
    static REGISTRY: RefCell<ScopeStack> = RefCell::new(ScopeStack::new());
}

fn with_registry<R>(f: impl FnOnce(&mut ScopeStack) -> R) -> R {
    REGISTRY.with(|registry| f(&mut registry.borrow_mut()))
}

/// Recording scope that exits when dropped, unwinding included.
#[must_use = "the scope exits as soon as it is dropped"]
pub struct Scope {
    recorder: RecordHandle,
    open: bool,
}

impl Scope {
    pub fn recorder(&self) -> &RecordHandle {
        &self.recorder
    }

    /// Exits now and hands back this scope's recorder. Scopes opened inside
    /// this one that are still open are exited with it.
    pub fn close(mut self) -> RecordHandle {
        self.open = false;
        with_registry(|stack| stack.exit(&self.recorder));
        self.recorder.clone()
    }
}

impl Deref for Scope {
    type Target = RecordHandle;

    fn deref(&self) -> &RecordHandle {
        &self.recorder
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        let exited = REGISTRY.try_with(|registry| match registry.try_borrow_mut() {
            Ok(mut stack) => {
                stack.exit(&self.recorder);
                true
            }
            Err(_) => false,
        });
        if !matches!(exited, Ok(true)) {
            warn!(scope = %self.recorder, "recording scope could not be exited");
        }
    }
}

/// Recorder of the current depth.
pub fn current() -> RecordHandle {
    with_registry(ScopeStack::current)
}

pub fn begin_scope() -> RecordHandle {
    with_registry(ScopeStack::begin_scope)
}

pub fn end_scope() -> Option<RecordHandle> {
    with_registry(ScopeStack::end_scope)
}

/// Enters a recording scope guarded by the returned [`Scope`].
pub fn scope() -> Scope {
    Scope {
        recorder: begin_scope(),
        open: true,
    }
}

/// Current nesting depth.
pub fn level() -> usize {
    with_registry(|stack| stack.depth())
}

pub fn record(args: RecordArgs) {
    current().record(args);
}

pub fn add_entry(leaf: impl Into<Key>, value: impl Into<Value>) {
    current().add_entry(leaf, value);
}

pub fn start() {
    current().start();
}

pub fn stop() {
    current().stop();
}

pub fn clear() {
    current().clear();
}

pub fn is_started() -> bool {
    current().is_started()
}

pub fn entries() -> Entries {
    current().entries()
}

pub fn push_prefix(label: impl Into<Label>) -> PrefixGuard {
    current().push_prefix(label)
}

pub fn configure(config: RecordConfig) {
    with_registry(|stack| stack.set_config(config));
}

pub fn config() -> RecordConfig {
    with_registry(|stack| stack.config().clone())
}

/// Drops every recorder on this thread and restores the default config.
pub fn reset_scopes() {
    with_registry(|stack| *stack = ScopeStack::new());
}
