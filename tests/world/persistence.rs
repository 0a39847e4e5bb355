//! Integration tests for world snapshots

use futures::executor::block_on;
use nml_foundation::{Error, Value};
use nml_language::Vm;
use nml_world::{MemoryStore, Task, from_bytes, load_from_file, save_to_file, to_bytes};

fn run(store: &MemoryStore, source: &str) -> Value {
    let me = store.alias("Me").unwrap();
    let vm = Vm::compile(me, source).unwrap();
    block_on(Task::new(store, vm).run_to_end()).unwrap()
}

fn seeded_world() -> MemoryStore {
    let store = MemoryStore::with_seed(11);
    let base = store.create(None);
    let me = store.create(Some(base));
    store.set_alias("Me", me);
    store.set_alias("Base", base);
    store
        .set_verb(base, "greet", "$_return = 'hi ' + $_directObj")
        .unwrap();
    store
}

#[test]
fn scripts_continue_after_a_reload() {
    let store = seeded_world();
    run(&store, "%visits = 1\n%log = ['first']");

    let restored = from_bytes(&to_bytes(&store).unwrap()).unwrap();
    let value = run(
        &restored,
        "%visits += 1\n%log[1] = 'second'\n$_return = greet(%visits)",
    );
    assert_eq!(value, Value::from("hi 2"));

    let me = restored.alias("Me").unwrap();
    assert_eq!(
        restored.read_prop(me, "log"),
        Ok(Value::Array(vec![Value::from("first"), Value::from("second")]))
    );
    // The saved world is untouched.
    assert_eq!(
        store.read_prop(store.alias("Me").unwrap(), "visits"),
        Ok(Value::from(1))
    );
}

#[test]
fn reloaded_worlds_create_the_same_ids() {
    let store = seeded_world();
    let restored = from_bytes(&to_bytes(&store).unwrap()).unwrap();
    assert_eq!(store.create(None), restored.create(None));
    assert_eq!(store.ids(), restored.ids());
}

#[test]
fn file_round_trip_keeps_structure() {
    let path = std::env::temp_dir().join(format!("nml_world_it_{}.msgpack", std::process::id()));
    let store = seeded_world();
    save_to_file(&store, &path).unwrap();
    let restored = load_from_file(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(restored.len(), store.len());
    assert_eq!(restored.aliases(), store.aliases());
    let me = restored.alias("Me").unwrap();
    let base = restored.alias("Base").unwrap();
    assert_eq!(restored.object(me).and_then(|o| o.parent), Some(base));
    assert_eq!(restored.verb_names(base), vec!["greet"]);
}

#[test]
fn truncated_snapshots_are_rejected() {
    let bytes = to_bytes(&seeded_world()).unwrap();
    let err = from_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
}
