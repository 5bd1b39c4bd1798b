use mitschreiben::record::{
    self, add_entry, current, entries, level, push_prefix, scope, start, stop, ScopeStack,
};
use mitschreiben::{Entries, Key, Label, RecordArgs, RecordConfig, RecordError, Recorder, Value};

fn expected(pairs: Vec<(Key, Value)>) -> Entries {
    pairs.into_iter().collect()
}

fn labels(names: &[&str]) -> Vec<Label> {
    names.iter().map(|name| Label::from(*name)).collect()
}

#[test]
fn test_key_concatenation() {
    let left = Key::from("a") + "b";
    let literal = Key::from(["a", "b"]);
    assert_eq!(left, literal, "Concatenated and literal keys should be equal");

    let prefixed = "root" + literal.clone();
    assert_eq!(prefixed, Key::from(["root", "a", "b"]));
    assert_eq!(literal.len(), 2, "Operands must stay untouched");

    let joined = &prefixed + Key::from(["c", "d"]);
    assert_eq!(joined.to_string(), "root|a|b|c|d");

    let from_label = Label::from("x") + Key::from("y");
    assert_eq!(from_label, Key::from(["x", "y"]), "A label should concatenate on the left");
    let from_labels = labels(&["p", "q"]) + Key::from("r");
    assert_eq!(from_labels, Key::from(["p", "q", "r"]), "A label sequence should concatenate on the left");
    assert_eq!(joined.join("/"), "root/a/b/c/d");
    assert_eq!(joined.strip_prefix(&prefixed), Some(Key::from(["c", "d"])));
}

#[test]
fn test_not_started_records_nothing() {
    mitschreiben::reset();

    mitschreiben::record!(key = "value");
    assert_eq!(entries(), Entries::new());
    mitschreiben::record!(vec![("a_key", "a_value")]);
    assert_eq!(entries(), Entries::new());
    mitschreiben::record!(vec![("a_key", "a_value")]; key = "value");
    assert_eq!(entries(), Entries::new(), "Stopped recorder should discard everything");
}

#[test]
fn test_start_stop_toggling() {
    mitschreiben::reset();

    // 1. Started: keywords are stored
    start();
    mitschreiben::record!(key = "value");
    assert_eq!(entries(), expected(vec![(Key::from("key"), "value".into())]));

    // 2. Toggle and record in between
    mitschreiben::record!(vec![("a_key", "a_value")]);
    stop();
    mitschreiben::record!(vec![("b_key", "b_value")]; INT = 12345);
    start();
    mitschreiben::record!(c_key = 3);
    stop();
    mitschreiben::record!(d_key = 4);

    // 3. Verify only the started windows survived
    assert_eq!(
        entries(),
        expected(vec![
            (Key::from("key"), "value".into()),
            (Key::from("a_key"), "a_value".into()),
            (Key::from("c_key"), 3.into()),
        ]),
        "Only calls made while started should be stored"
    );
}

#[test]
fn test_keywords_override_mappings() {
    mitschreiben::reset();
    start();

    mitschreiben::record!(vec![("k", 1), ("other", 5)]; k = 2);
    assert_eq!(entries().get(&Key::from("k")), Some(&Value::Int(2)));
    assert_eq!(entries().len(), 2);
}

#[test]
fn test_add_entry_is_idempotent() {
    mitschreiben::reset();

    add_entry("x", 1);
    let once = entries();
    add_entry("x", 1);
    assert_eq!(entries(), once, "Repeated identical writes should not change entries");
    assert_eq!(once.len(), 1);
}

#[test]
fn test_entry_key_is_prefix_plus_leaf() {
    mitschreiben::reset();
    start();

    let _outer = push_prefix("outer");
    let _inner = push_prefix("inner");
    mitschreiben::record!(leaf = true);

    assert_eq!(
        entries().keys().cloned().collect::<Vec<_>>(),
        vec![Key::from(["outer", "inner", "leaf"])]
    );
}

#[test]
fn test_prefix_stack_restored_after_guards() {
    mitschreiben::reset();
    let before = current().prefixes();
    {
        let _a = push_prefix("a");
        {
            let _b = push_prefix("b");
            current().append_prefix("c");
            assert_eq!(current().pop_prefix().unwrap(), Label::from("c"));
            assert_eq!(current().prefixes(), labels(&["a", "b"]));
        }
        assert_eq!(current().prefixes(), labels(&["a"]));
    }
    assert_eq!(current().prefixes(), before, "Matched pushes and pops should restore the stack");
}

#[test]
fn test_pop_empty_prefix_underflows() {
    mitschreiben::reset();
    let err = current().pop_prefix().unwrap_err();
    assert!(matches!(err, RecordError::Underflow { level: 0 }));
}

#[test]
fn test_record_as_scope() {
    mitschreiben::reset();

    // 1. Outside any scope nothing is recorded
    mitschreiben::record!(vec![("a_key", "a_value")]; key = "value");
    assert_eq!(entries(), Entries::new());

    // 2. Enter a scope and record
    let scope = scope();
    mitschreiben::record!(vec![("a_key", "a_value")]);
    assert_eq!(entries(), expected(vec![(Key::from("a_key"), "a_value".into())]));
    assert_eq!(*scope.recorder(), current(), "Scope recorder should be the current one");
    // 3. Exit and inspect the handed-back recorder
    let rec = scope.close();

    assert_eq!(rec.entries(), expected(vec![(Key::from("a_key"), "a_value".into())]));
    assert!(!rec.is_started(), "Exited recorder should be stopped");
    assert_eq!(level(), 0);
}

#[test]
fn test_scope_scenario_with_prefix() {
    mitschreiben::reset();
    {
        let _scope = scope();
        mitschreiben::record!(x = 1);
        let guard = push_prefix("f");
        mitschreiben::record!(y = 2);
        drop(guard);
    }
    assert_eq!(
        entries(),
        expected(vec![
            (Key::from("x"), 1.into()),
            (Key::from(["f", "y"]), 2.into()),
        ])
    );
}

#[test]
fn test_nested_scope_without_prefix() {
    mitschreiben::reset();
    {
        let _a = scope();
        {
            let _b = scope();
            mitschreiben::record!(v = 9);
        }
    }
    assert_eq!(entries(), expected(vec![(Key::from("v"), 9.into())]));
}

#[test]
fn test_scope_isolation_until_exit() {
    mitschreiben::reset();
    // 1. Record in the outer scope
    let outer = scope();
    mitschreiben::record!(outer_value = 1);

    // 2. Inner entries stay in the inner recorder
    let inner = scope();
    mitschreiben::record!(inner_value = 2);
    assert_eq!(
        outer.entries(),
        expected(vec![(Key::from("outer_value"), 1.into())]),
        "Inner entries must not leak into the outer scope before exit"
    );
    assert_eq!(inner.entries().len(), 1);
    drop(inner);

    // 3. Exit merges them upward
    assert_eq!(
        outer.entries(),
        expected(vec![
            (Key::from("outer_value"), 1.into()),
            (Key::from("inner_value"), 2.into()),
        ])
    );
}

#[test]
fn test_merge_roots_child_keys_under_parent_prefix() {
    mitschreiben::reset();
    let outer = scope();
    let _p = push_prefix("P");
    {
        let _inner = scope();
        let _f = push_prefix("f");
        mitschreiben::record!(k = "V");
    }
    let merged = outer.entries();
    assert_eq!(merged.get(&Key::from(["P", "f", "k"])), Some(&Value::from("V")));
    assert!(!merged.contains_key(&Key::from(["f", "k"])), "Child key must not survive unprefixed");
}

#[test]
fn test_multilevel_identity() {
    mitschreiben::reset();
    let r1 = current();
    let r2 = current();
    assert_eq!(r1, r2, "Same level should yield the same recorder");

    let outer = scope();
    let r1 = outer.recorder().clone();
    let r2a = {
        let inner = scope();
        assert_ne!(r1, *inner.recorder());
        assert_eq!(current(), *inner.recorder());
        inner.recorder().clone()
    };
    let r2b = {
        let inner = scope();
        assert_ne!(r1, *inner.recorder());
        assert_eq!(current(), *inner.recorder());
        inner.recorder().clone()
    };
    assert_ne!(r2a, r2b, "Sibling scopes should get distinct recorders");
    assert_eq!(r2a.level(), 2);
    assert_eq!(r2a.to_string(), "Record(2)");
}

#[test]
fn test_multilevel_scopes_with_prefixes() {
    mitschreiben::reset();
    let s1 = scope();
    let r1 = s1.recorder().clone();
    {
        let _level2 = current().push_prefix("level2");
        assert_eq!(current().prefixes(), labels(&["level2"]));
        let r2a = {
            let s2a = scope();
            assert!(current().prefixes().is_empty(), "A new level starts with an empty stack");
            mitschreiben::record!(level = level(), name = "R2a");
            assert_eq!(
                entries(),
                expected(vec![
                    (Key::from("level"), 2.into()),
                    (Key::from("name"), "R2a".into()),
                ])
            );
            s2a.recorder().clone()
        };
        assert_ne!(current(), r2a);
        assert_eq!(current(), r1);
        {
            let _another = current().push_prefix("another_prefix");
            assert_eq!(current().prefixes(), labels(&["level2", "another_prefix"]));
            let _s2b = scope();
            assert!(current().prefixes().is_empty());
            mitschreiben::record!(recorded = "just something");
            assert_eq!(
                entries(),
                expected(vec![(Key::from("recorded"), "just something".into())])
            );
        }
        assert_eq!(current().prefixes(), labels(&["level2"]));
    }
    assert!(current().prefixes().is_empty());
    drop(s1);

    assert_eq!(
        entries(),
        expected(vec![
            (Key::from(["level2", "level"]), 2.into()),
            (Key::from(["level2", "name"]), "R2a".into()),
            (Key::from(["level2", "another_prefix", "recorded"]), "just something".into()),
        ])
    );
}

#[test]
fn test_closing_outer_scope_closes_inner_scopes() {
    mitschreiben::reset();

    // 1. Open two nested scopes and record in the inner one
    let outer = scope();
    let inner = scope();
    let outer_rec = outer.recorder().clone();
    let inner_rec = inner.recorder().clone();
    mitschreiben::record!(in_inner = 1);

    // 2. Close the outer one first
    let closed = outer.close();
    assert_eq!(closed, outer_rec, "Close should hand back the outer recorder");
    assert_eq!(level(), 0, "Both scopes should be exited");
    assert!(!outer_rec.is_started());
    assert!(!inner_rec.is_started());
    assert_eq!(outer_rec.entries(), expected(vec![(Key::from("in_inner"), 1.into())]));

    // 3. The root is stopped, so this is discarded
    mitschreiben::record!(after_close = 2);

    // 4. Dropping the stale inner guard must not exit anything
    drop(inner);
    assert_eq!(level(), 0);
    assert_eq!(
        entries(),
        expected(vec![(Key::from("in_inner"), 1.into())]),
        "Root should hold only the merged inner entry"
    );
}

#[test]
fn test_stale_scope_after_reset_is_ignored() {
    mitschreiben::reset();
    let stale = scope();
    mitschreiben::reset();

    let fresh = scope();
    drop(stale);
    assert_eq!(level(), 1, "A stale guard must leave the live scope open");
    assert_eq!(current(), *fresh.recorder());
}

#[test]
fn test_scope_merges_when_body_panics() {
    mitschreiben::reset();
    let outcome = std::panic::catch_unwind(|| {
        let _scope = scope();
        let _p = push_prefix("p");
        mitschreiben::record!(a = 1);
        panic!("calculation failed");
    });
    assert!(outcome.is_err(), "The panic should propagate unchanged");
    assert_eq!(level(), 0, "Depth should be restored after unwinding");
    assert_eq!(entries(), expected(vec![(Key::from(["p", "a"]), 1.into())]));
    assert!(current().prefixes().is_empty());
}

#[test]
fn test_clear_keeps_prefixes_and_flag() {
    mitschreiben::reset();
    start();
    current().append_prefix("kept");
    mitschreiben::record!(a = 1);
    record::clear();
    assert!(entries().is_empty());
    assert!(record::is_started());
    assert_eq!(current().prefixes(), labels(&["kept"]));
}

#[test]
fn test_registry_level_invariant() {
    // 1. First lookup creates the root
    let mut stack = ScopeStack::new();
    assert!(stack.is_empty());

    let root = stack.current();
    assert_eq!(stack.len(), 1);
    assert_eq!(root.level(), 0);

    // 2. Descend one level
    let child = stack.begin_scope();
    assert_eq!(stack.depth(), 1);
    assert_eq!(stack.len(), stack.depth() + 1);
    assert_eq!(child.level(), 1);
    assert!(child.is_started());

    // 3. Exit merges and restores the parent
    child.add_entry("leaf", 1);
    let exited = stack.end_scope().unwrap();
    assert_eq!(exited, child);
    assert_eq!(stack.depth(), 0);
    assert_eq!(stack.len(), 1);
    assert_eq!(stack.current(), root, "The parent should be reused after exit");
    assert_eq!(root.entries().len(), 1);

    // 4. Exit at the root
    stack.end_scope();
    assert!(stack.is_empty(), "Exiting at depth 0 drops the root");
    assert_ne!(stack.current(), root);
}

#[test]
fn test_begin_scope_materializes_parent() {
    let config = RecordConfig {
        key_separator: "/".to_string(),
        ..RecordConfig::default()
    };
    let mut stack = ScopeStack::with_config(config.clone());
    assert_eq!(stack.config(), &config);
    let child = stack.begin_scope();
    assert_eq!(stack.len(), 2);
    assert_eq!(child.level(), 1);
}

#[test]
fn test_recorder_merge_directly() {
    let mut parent = Recorder::new(0);
    parent.append_prefix("P");

    let mut child = Recorder::new(1);
    child.start();
    child.append_prefix("f");
    child.record(RecordArgs::new().keyword("y", 2.5));

    parent.merge(&child);
    assert_eq!(parent.entries().get(&Key::from(["P", "f", "y"])), Some(&Value::Float(2.5)));
    assert!(!parent.is_started(), "Merging does not start the parent");
}

#[test]
fn test_config_from_json() {
    let config = RecordConfig::from_json(r#"{"caller_fallback": "engine", "tree_indent": 2}"#).unwrap();
    assert_eq!(config.caller_fallback.as_deref(), Some("engine"));
    assert_eq!(config.tree_indent, 2);
    assert_eq!(config.key_separator, "|", "Missing fields keep their defaults");

    let err = RecordConfig::from_json(r#"{"colour": "blue"}"#).unwrap_err();
    assert!(matches!(err, RecordError::Config(_)));
}
