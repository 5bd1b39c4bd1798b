use std::collections::BTreeMap;
use tracing::trace;

use super::key::{Key, Label};
use super::prefix::PrefixStack;
use super::value::Value;
use crate::error::Result;

/// Recorded entries, keyed by prefix stack + leaf key.
pub type Entries = BTreeMap<Key, Value>;

/// Arguments of one `record` call: mappings first, then keywords.
///
/// Keywords are applied after every mapping, so a keyword overrides a
/// mapping entry with the same key.
#[derive(Debug, Clone, Default)]
pub struct RecordArgs {
    mappings: Vec<Vec<(Key, Value)>>,
    keywords: Vec<(Key, Value)>,
}

impl RecordArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mapping<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Value>,
    {
        self.mappings.push(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn keyword(mut self, name: impl Into<Label>, value: impl Into<Value>) -> Self {
        self.keywords.push((Key::from(name.into()), value.into()));
        self
    }

    fn into_pairs(self) -> impl Iterator<Item = (Key, Value)> {
        self.mappings.into_iter().flatten().chain(self.keywords)
    }
}

/// State of one recording level: a start/stop switch, a prefix stack and the
/// entries recorded at this level.
#[derive(Debug)]
pub struct Recorder {
    level: usize,
    started: bool,
    prefixes: PrefixStack,
    entries: Entries,
}

impl Recorder {
    pub fn new(level: usize) -> Self {
        Self {
            level,
            started: false,
            prefixes: PrefixStack::new(),
            entries: Entries::new(),
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn start(&mut self) {
        self.started = true;
    }

    pub fn stop(&mut self) {
        self.started = false;
    }

    pub fn entries(&self) -> &Entries {
        &self.entries
    }

    pub fn prefixes(&self) -> &PrefixStack {
        &self.prefixes
    }

    /// Stores every pair of `args` under the live prefix. Ignored while stopped.
    pub fn record(&mut self, args: RecordArgs) {
        if !self.started {
            return;
        }
        for (key, value) in args.into_pairs() {
            self.add_entry(key, value);
        }
    }

    /// Stores `value` under prefix stack + `leaf`, whether started or not.
    pub fn add_entry(&mut self, leaf: impl Into<Key>, value: impl Into<Value>) {
        let key = self.prefixes.compose(leaf);
        trace!(level = self.level, key = %key, "entry recorded");
        self.entries.insert(key, value.into());
    }

    /// Empties the entries; the prefix stack and started flag are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Folds `child`'s entries into this recorder: each child key, with all its
    /// labels, is appended after this recorder's live prefix.
    pub fn merge(&mut self, child: &Recorder) {
        for (key, value) in &child.entries {
            self.add_entry(key, value);
        }
    }

    pub fn append_prefix(&mut self, label: impl Into<Label>) {
        self.prefixes.push(label);
    }

    pub fn pop_prefix(&mut self) -> Result<Label> {
        self.prefixes.pop(self.level)
    }
}
