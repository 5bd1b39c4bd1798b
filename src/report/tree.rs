use std::collections::{BTreeMap, BTreeSet};

use super::table::Table;
use crate::record::{self, Entries, Key, Value};

const TABLE_LABEL: &str = "table";
const PATH_SEPARATOR: &str = "---";

/// Result of looking a key up in an [`EntryTree`].
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// The key addresses a recorded entry.
    Value(Value),
    /// The key is a proper prefix of recorded keys; the subtree holds them
    /// with the prefix removed.
    Tree(EntryTree),
}

/// Recorded entries viewed as nested mappings: a key prefix selects the
/// subtree of every entry below it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryTree {
    entries: Entries,
}

impl From<Entries> for EntryTree {
    fn from(entries: Entries) -> Self {
        Self { entries }
    }
}

impl EntryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &Entries {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Length of the longest key.
    pub fn depth(&self) -> usize {
        self.entries.keys().map(Key::len).max().unwrap_or(0)
    }

    pub fn lookup(&self, key: impl Into<Key>) -> Option<Lookup> {
        let key = key.into();
        if let Some(value) = self.entries.get(&key) {
            return Some(Lookup::Value(value.clone()));
        }
        let subtree = self.subtree(&key);
        if subtree.is_empty() {
            None
        } else {
            Some(Lookup::Tree(subtree))
        }
    }

    /// Every entry below `prefix`, re-keyed without it.
    pub fn subtree(&self, prefix: &Key) -> EntryTree {
        self.entries
            .iter()
            .filter_map(|(key, value)| key.strip_prefix(prefix).map(|rest| (rest, value.clone())))
            .collect::<Entries>()
            .into()
    }

    /// Single-label entries become one property row, two-label entries become
    /// `(row, column)` cells. Both tables come back sorted.
    pub fn toplevel_tables(&self, name: &str) -> (Table, Table) {
        let mut properties = Table::named(name);
        let mut values = Table::named(name);
        for (key, value) in &self.entries {
            match key.labels() {
                [col] => properties.append("", col.as_str(), value),
                [row, col] => values.append(row.as_str(), col.as_str(), value),
                _ => {}
            }
        }
        (properties.sorted(), values.sorted())
    }

    /// One table per subtree and depth, stored under `prefix + "table"`.
    pub fn to_tables(&self) -> BTreeMap<Key, Table> {
        let mut tables = BTreeMap::new();
        for depth in 0..self.depth() {
            let prefixes: BTreeSet<Key> = self.entries.keys().map(|k| k.truncated(depth)).collect();
            for prefix in prefixes {
                let Some(Lookup::Tree(subtree)) = self.lookup(&prefix) else {
                    continue;
                };
                let (mut properties, mut values) =
                    subtree.toplevel_tables(&prefix.join(PATH_SEPARATOR));
                if !properties.is_empty() && depth == 0 {
                    properties.name = Some("Properties".to_string());
                    tables.insert(&prefix + TABLE_LABEL, properties.transpose());
                }
                if !values.is_empty() {
                    if values.rows_count() == 1 {
                        values = values.transpose();
                    }
                    tables.insert(&prefix + TABLE_LABEL, values);
                }
            }
        }
        tables
    }

    /// Directory-like listing: each key prints only the labels that differ
    /// from the previous key, the last one followed by its value.
    pub fn pretty_string(&self, indent: usize) -> String {
        let step = format!("|{}", " ".repeat(indent));
        let mut lines = Vec::new();
        let mut previous: Option<&Key> = None;
        for (key, value) in &self.entries {
            let shared = previous.map_or(0, |prev| common_len(prev, key));
            let rest = &key.labels()[shared..];
            for (i, label) in rest.iter().enumerate() {
                let mut line = format!("{}{}", step.repeat(shared + i), label);
                if i + 1 == rest.len() {
                    line.push_str(&format!(":{}{}", " ".repeat(indent), value));
                }
                lines.push(line);
            }
            previous = Some(key);
        }
        lines.join("\n")
    }

    /// `(table name, csv text)` for every table of [`EntryTree::to_tables`].
    pub fn to_csv_documents(&self, separator: &str) -> Vec<(String, String)> {
        self.to_tables()
            .into_values()
            .map(|table| (table.name.clone().unwrap_or_default(), table.to_csv(separator)))
            .collect()
    }

    /// Flat JSON object, each key joined with `separator`.
    pub fn to_json(&self, separator: &str) -> serde_json::Value {
        let object = self
            .entries
            .iter()
            .map(|(key, value)| {
                let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
                (key.join(separator), json)
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(object)
    }

    /// [`EntryTree::pretty_string`] with the installed `tree_indent`.
    pub fn listing(&self) -> String {
        self.pretty_string(record::config().tree_indent)
    }

    /// [`EntryTree::to_csv_documents`] with the installed `csv_separator`.
    pub fn csv_documents(&self) -> Vec<(String, String)> {
        self.to_csv_documents(&record::config().csv_separator)
    }

    /// [`EntryTree::to_json`] with the installed `key_separator`.
    pub fn flat_json(&self) -> serde_json::Value {
        self.to_json(&record::config().key_separator)
    }
}

/// Number of leading labels shared by `a` and `b`, capped so `b` keeps at
/// least its last label.
fn common_len(a: &Key, b: &Key) -> usize {
    let shared = a
        .labels()
        .iter()
        .zip(b.labels())
        .take_while(|(x, y)| x == y)
        .count();
    shared.min(b.len().saturating_sub(1))
}
