use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::key::Label;
use super::scope;
use crate::error::{RecordError, Result};

/// Textual identity of a receiver, used as the caller part of a prefix label.
///
/// Only implemented by types that want to show up in keys; calls without a
/// describable receiver fall back to the configured caller or the origin.
pub trait Describe {
    fn describe(&self) -> String;
}

/// Origin identifier -> names of the methods instrumented under it.
pub type LoggedMethods = BTreeMap<String, BTreeSet<String>>;

thread_local! {
    static LOGGED_METHODS: RefCell<LoggedMethods> = RefCell::new(LoggedMethods::new());
}

/// Snapshot of every `origin -> method` pair invoked through a [`Prefix`] on
/// this thread.
pub fn logged_methods() -> LoggedMethods {
    LOGGED_METHODS.with(|logged| logged.borrow().clone())
}

pub(crate) fn reset_logged_methods() {
    LOGGED_METHODS.with(|logged| logged.borrow_mut().clear());
}

fn log_method(origin: &str, method: &str) {
    LOGGED_METHODS.with(|logged| {
        let inserted = logged
            .borrow_mut()
            .entry(origin.to_string())
            .or_default()
            .insert(method.to_string());
        if inserted {
            debug!(origin, method, "instrumented method registered");
        }
    });
}

fn require_non_empty(what: &str, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(RecordError::Configuration(format!("{} must not be empty", what)));
    }
    Ok(())
}

fn require_identifier(method: &str) -> Result<()> {
    require_non_empty("method name", method)?;
    let mut chars = method.chars();
    let head_ok = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_');
    if !head_ok || !chars.all(|c| c.is_alphanumeric() || c == '_') {
        return Err(RecordError::Configuration(format!(
            "'{}' is not a method name",
            method
        )));
    }
    Ok(())
}

/// Pushes `<caller>.<label>` on the current recorder for the duration of a
/// wrapped call.
///
/// ```ignore
/// impl Pricer {
///     fn price(&self, quote: f64) -> f64 {
///         Prefix::of::<Pricer>("price")?.call_on(self, |p| p.discount(quote))
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    origin: String,
    method: String,
    label: String,
}

impl Prefix {
    pub fn new(origin: impl Into<String>, method: impl Into<String>) -> Result<Self> {
        let origin = origin.into();
        let method = method.into();
        require_non_empty("origin", &origin)?;
        require_identifier(&method)?;
        Ok(Self {
            label: method.clone(),
            origin,
            method,
        })
    }

    /// Instrumentation for a method declared on `T`.
    pub fn of<T: ?Sized>(method: impl Into<String>) -> Result<Self> {
        Self::new(std::any::type_name::<T>(), method)
    }

    /// Replaces the default label (the method name).
    pub fn with_label(mut self, label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        require_non_empty("label", &label)?;
        if label.chars().any(char::is_whitespace) {
            return Err(RecordError::Configuration(format!(
                "label '{}' contains whitespace",
                label
            )));
        }
        self.label = label;
        Ok(self)
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Runs `f` without a receiver: the caller is the configured fallback, or
    /// the origin if none is configured.
    pub fn call<R>(&self, f: impl FnOnce() -> R) -> R {
        let caller = scope::config()
            .caller_fallback
            .unwrap_or_else(|| self.origin.clone());
        self.invoke(&caller, f)
    }

    /// Runs `f` on `receiver`, labelled by `receiver.describe()`.
    pub fn call_on<T, R>(&self, receiver: &T, f: impl FnOnce(&T) -> R) -> R
    where
        T: Describe + ?Sized,
    {
        let caller = receiver.describe();
        self.invoke(&caller, || f(receiver))
    }

    fn invoke<R>(&self, caller: &str, f: impl FnOnce() -> R) -> R {
        log_method(&self.origin, &self.method);
        let _guard = scope::push_prefix(Label::new(format!("{}.{}", caller, self.label)));
        f()
    }
}
