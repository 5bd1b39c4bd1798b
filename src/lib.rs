pub mod config;
pub mod error;
pub mod record;
pub mod report;

pub use config::RecordConfig;
pub use error::{RecordError, Result};
pub use record::{
    current, scope, Describe, Entries, Key, Label, Prefix, RecordArgs, RecordHandle, Recorder,
    Scope, Value,
};
pub use report::{EntryTree, Lookup, Table};

/// Clears every thread-local registry: recorders, depth, config and the
/// logged instrumented methods.
pub fn reset() {
    record::scope::reset_scopes();
    record::instrument::reset_logged_methods();
}

/// Records into the current recorder; a no-op while it is stopped.
///
/// ```ignore
/// record!(a_key = 1, another_key = "x");
/// record!(pairs);
/// record!(pairs, more_pairs; key = 2.5);
/// ```
///
/// Mappings are stored before keywords, so a keyword wins over a mapping
/// entry with the same key.
#[macro_export]
macro_rules! record {
    ($($name:ident = $value:expr),* $(,)?) => {
        $crate::record::record(
            $crate::record::RecordArgs::new()$(.keyword(stringify!($name), $value))*
        )
    };
    ($($mapping:expr),+ $(; $($name:ident = $value:expr),* $(,)?)?) => {
        $crate::record::record(
            $crate::record::RecordArgs::new()
                $(.mapping($mapping))+
                $($(.keyword(stringify!($name), $value))*)?
        )
    };
}
