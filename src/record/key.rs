use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// A single component of a record key: a method label, a prefix or a leaf name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Label(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(text: &str) -> Self {
        Label(text.to_string())
    }
}

impl From<String> for Label {
    fn from(text: String) -> Self {
        Label(text)
    }
}

impl From<&String> for Label {
    fn from(text: &String) -> Self {
        Label(text.clone())
    }
}

impl From<i64> for Label {
    fn from(n: i64) -> Self {
        Label(n.to_string())
    }
}

impl From<usize> for Label {
    fn from(n: usize) -> Self {
        Label(n.to_string())
    }
}

impl PartialEq<str> for Label {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Label {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Ordered, immutable sequence of labels addressing one recorded entry.
///
/// Equality and hashing are structural: `Key::from("a") + "b"` and
/// `Key::from(["a", "b"])` are the same key.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(Vec<Label>);

impl Key {
    pub const SEPARATOR: &'static str = "|";

    pub fn new() -> Self {
        Key(Vec::new())
    }

    pub fn labels(&self) -> &[Label] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// New key with `other` in front of this one.
    pub fn prepend(&self, other: impl Into<Key>) -> Key {
        let mut labels = other.into().0;
        labels.extend(self.0.iter().cloned());
        Key(labels)
    }

    pub fn strip_prefix(&self, prefix: &Key) -> Option<Key> {
        self.0.strip_prefix(prefix.0.as_slice()).map(|rest| Key(rest.to_vec()))
    }

    /// The first `n` labels (or all of them when the key is shorter).
    pub fn truncated(&self, n: usize) -> Key {
        Key(self.0.iter().take(n).cloned().collect())
    }

    pub fn join(&self, separator: &str) -> String {
        self.0
            .iter()
            .map(Label::as_str)
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join(Key::SEPARATOR))
    }
}

impl From<Label> for Key {
    fn from(label: Label) -> Self {
        Key(vec![label])
    }
}

impl From<&Label> for Key {
    fn from(label: &Label) -> Self {
        Key(vec![label.clone()])
    }
}

impl From<&str> for Key {
    fn from(text: &str) -> Self {
        Key(vec![Label::from(text)])
    }
}

impl From<String> for Key {
    fn from(text: String) -> Self {
        Key(vec![Label::from(text)])
    }
}

impl From<&String> for Key {
    fn from(text: &String) -> Self {
        Key(vec![Label::from(text)])
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl From<Vec<Label>> for Key {
    fn from(labels: Vec<Label>) -> Self {
        Key(labels)
    }
}

impl From<&[Label]> for Key {
    fn from(labels: &[Label]) -> Self {
        Key(labels.to_vec())
    }
}

impl From<Vec<&str>> for Key {
    fn from(labels: Vec<&str>) -> Self {
        Key(labels.into_iter().map(Label::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Key {
    fn from(labels: [&str; N]) -> Self {
        Key(labels.into_iter().map(Label::from).collect())
    }
}

impl FromIterator<Label> for Key {
    fn from_iter<I: IntoIterator<Item = Label>>(iter: I) -> Self {
        Key(iter.into_iter().collect())
    }
}

impl<T: Into<Key>> Add<T> for Key {
    type Output = Key;

    fn add(mut self, other: T) -> Key {
        self.0.extend(other.into().0);
        self
    }
}

impl<T: Into<Key>> Add<T> for &Key {
    type Output = Key;

    fn add(self, other: T) -> Key {
        self.clone() + other
    }
}

impl Add<Key> for Label {
    type Output = Key;

    fn add(self, key: Key) -> Key {
        key.prepend(self)
    }
}

impl Add<Key> for &str {
    type Output = Key;

    fn add(self, key: Key) -> Key {
        key.prepend(self)
    }
}

impl Add<Key> for Vec<Label> {
    type Output = Key;

    fn add(self, key: Key) -> Key {
        key.prepend(self)
    }
}
