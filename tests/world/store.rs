//! Integration tests for object stores

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::executor::block_on;
use nml_foundation::{ObjectId, RuntimeError, Value};
use nml_language::{CallArgs, Reply, Request, Vm};
use nml_world::{MemoryStore, ObjectStore, Task, serve};

/// Counts every property read made through it.
struct CountingStore {
    inner: MemoryStore,
    reads: AtomicUsize,
}

#[async_trait]
impl ObjectStore for CountingStore {
    async fn get_prop(&self, object: ObjectId, name: &str) -> Result<Value, RuntimeError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.inner.get_prop(object, name).await
    }

    async fn set_prop(
        &self,
        object: ObjectId,
        name: &str,
        value: Value,
    ) -> Result<(), RuntimeError> {
        self.inner.set_prop(object, name, value).await
    }

    async fn resolve_alias(&self, name: &str) -> Result<ObjectId, RuntimeError> {
        self.inner.resolve_alias(name).await
    }

    async fn find_verb(&self, object: ObjectId, verb: &str) -> Result<String, RuntimeError> {
        self.inner.find_verb(object, verb).await
    }
}

#[test]
fn custom_stores_plug_into_tasks() {
    let inner = MemoryStore::with_seed(3);
    let me = inner.create(None);
    inner.write_prop(me, "a", Value::from(2)).unwrap();
    let store = CountingStore {
        inner,
        reads: AtomicUsize::new(0),
    };

    let vm = Vm::compile(me, "$_return = %a * %a + %a").unwrap();
    let value = block_on(Task::new(&store, vm).run_to_end()).unwrap();
    assert_eq!(value, Value::from(6));
    assert_eq!(store.reads.load(Ordering::Relaxed), 3);
}

#[test]
fn inherited_verbs_run_on_the_child() {
    let store = MemoryStore::with_seed(9);
    let animal = store.create(None);
    let cat = store.create(Some(animal));
    store.write_prop(animal, "sound", Value::from("...")).unwrap();
    store.write_prop(cat, "sound", Value::from("meow")).unwrap();
    store
        .set_verb(animal, "speak", "$_return = 'says ' + %sound")
        .unwrap();

    let args = CallArgs::new("speak", cat);
    let value = block_on(async {
        let mut task = Task::for_call(&store, cat, &args).await?;
        task.run_to_end().await
    })
    .unwrap();
    assert_eq!(value, Value::from("says meow"));
}

#[test]
fn serve_answers_each_request_kind() {
    let store = MemoryStore::with_seed(1);
    let id = store.create(None);
    store.set_alias("Thing", id);
    store.set_verb(id, "poke", "%poked = true").unwrap();

    block_on(async {
        let reply = serve(
            &store,
            Request::SetProp {
                object: id,
                name: "hp".into(),
                value: Value::from(5),
            },
        )
        .await
        .unwrap();
        assert!(matches!(reply, Reply::Done));

        let reply = serve(
            &store,
            Request::GetProp {
                object: id,
                name: "hp".into(),
            },
        )
        .await
        .unwrap();
        assert!(matches!(reply, Reply::Value(v) if v == Value::from(5)));

        let reply = serve(&store, Request::ResolveAlias { name: "Thing".into() })
            .await
            .unwrap();
        assert!(matches!(reply, Reply::Value(Value::Object(found)) if found == id));

        let reply = serve(
            &store,
            Request::Call {
                object: id,
                args: CallArgs::new("poke", id),
            },
        )
        .await
        .unwrap();
        assert!(matches!(reply, Reply::Frame(vm) if vm.owner() == id));
    });
}

#[test]
fn store_errors_reach_the_script() {
    let store = MemoryStore::with_seed(2);
    let me = store.create(None);

    let run = |source: &str| {
        let vm = Vm::compile(me, source).unwrap();
        block_on(Task::new(&store, vm).run_to_end())
    };

    assert_eq!(
        run("$x = %missing"),
        Err(RuntimeError::PropNotFound("missing".into()))
    );
    assert_eq!(
        run("$x = ##Nobody"),
        Err(RuntimeError::UnknownAlias("Nobody".into()))
    );
    assert_eq!(
        run("fly to moon"),
        Err(RuntimeError::VerbNotFound("fly".into()))
    );
}
