//! Hierarchically scoped recording of key/value observations.
//!
//! # STACK DISCIPLINE
//! Every recording level owns one [`Recorder`]. Entering a scope creates the
//! next level; exiting it merges that level's entries into the parent, rooted
//! under the parent's live prefix. Prefix guards and scope guards release on
//! every exit path, unwinding included.
//!
//! # THREADING
//! The registries are thread-local. Each thread records into its own stack of
//! recorders and nothing is shared across threads.

pub mod instrument;
pub mod key;
pub mod prefix;
pub mod recorder;
pub mod scope;
pub mod value;

pub use instrument::{logged_methods, Describe, LoggedMethods, Prefix};
pub use key::{Key, Label};
pub use prefix::{PrefixGuard, PrefixStack};
pub use recorder::{Entries, RecordArgs, Recorder};
pub use scope::{
    add_entry, begin_scope, clear, config, configure, current, end_scope, entries, is_started,
    level, push_prefix, record, scope, start, stop, RecordHandle, Scope, ScopeStack,
};
pub use value::Value;
