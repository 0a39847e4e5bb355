//! Integration tests for tasks
//!
//! Tasks are ticked by hand here to check what the store sees between
//! ticks.

use std::sync::Arc;

use futures::executor::block_on;
use nml_foundation::{RuntimeError, Value};
use nml_language::Vm;
use nml_world::{MemoryStore, Task, TaskConfig, Tick, TraceEvent, Tracer, TracerConfig};
use parking_lot::Mutex;

#[test]
fn delegated_write_lands_when_its_tick_is_served() {
    let store = MemoryStore::with_seed(4);
    let me = store.create(None);
    store.set_verb(me, "mark", "$n = 1\n%marked = true").unwrap();

    let vm = Vm::compile(me, "mark\n$_return = %marked").unwrap();
    let mut task = Task::new(&store, vm);

    block_on(async {
        assert_eq!(task.tick().await, Ok(Tick::Served("call")));
        assert_eq!(task.vm().frame_count(), 2);

        assert_eq!(task.tick().await, Ok(Tick::Stepped));
        assert!(store.read_prop(me, "marked").is_err());

        assert_eq!(task.tick().await, Ok(Tick::Served("set_prop")));
        assert_eq!(store.read_prop(me, "marked"), Ok(Value::Bool(true)));

        // The frame's last statement completes and hands back null.
        assert_eq!(task.tick().await, Ok(Tick::Stepped));
        assert_eq!(task.vm().frame_count(), 1);
        assert_eq!(task.vm().ip(), &[0]);

        assert_eq!(task.run_to_end().await, Ok(Value::Bool(true)));
    });
}

#[test]
fn interleaved_tasks_share_the_world() {
    let store = MemoryStore::with_seed(8);
    let counter = store.create(None);
    store.write_prop(counter, "count", Value::from(0)).unwrap();

    let script = "$i = 0\nwhile $i < 5\n  %count += 1\n  $i += 1\nend";
    let mut first = Task::new(&store, Vm::compile(counter, script).unwrap());
    let mut second = Task::new(&store, Vm::compile(counter, script).unwrap());

    block_on(async {
        let mut done = (false, false);
        while !(done.0 && done.1) {
            if !done.0 {
                done.0 = matches!(first.tick().await.unwrap(), Tick::Finished(_));
            }
            if !done.1 {
                done.1 = matches!(second.tick().await.unwrap(), Tick::Finished(_));
            }
        }
    });

    // Each read-modify-write spans ticks, so the tasks can overwrite each
    // other; every task still ran its own five increments.
    let count = store.read_prop(counter, "count").unwrap();
    let count = count.as_number().unwrap();
    assert!((5.0..=10.0).contains(&count), "count was {count}");
    assert_eq!(first.vm().local("i"), Some(&Value::from(5)));
    assert_eq!(second.vm().local("i"), Some(&Value::from(5)));
}

#[test]
fn tick_budget_covers_nested_frames() {
    let store = MemoryStore::with_seed(5);
    let me = store.create(None);
    store
        .set_verb(me, "spin", "$i = 0\nwhile true\n  $i += 1\nend")
        .unwrap();

    let vm = Vm::compile(me, "spin").unwrap();
    let mut task = Task::new(&store, vm).with_config(TaskConfig {
        max_ticks: Some(25),
    });
    let err = block_on(task.run_to_end()).unwrap_err();
    assert_eq!(err, RuntimeError::TickLimitExceeded(25));
    assert_eq!(task.ticks(), 25);
    assert_eq!(task.vm().frame_count(), 2);
}

#[test]
fn trace_follows_a_call() {
    let store = MemoryStore::with_seed(6);
    let me = store.create(None);
    store.set_verb(me, "seven", "$_return = 7").unwrap();

    let tracer = Arc::new(Mutex::new(Tracer::new(TracerConfig::new().enabled())));
    let vm = Vm::compile(me, "$x = seven()").unwrap();
    let mut task = Task::new(&store, vm).with_tracer(Arc::clone(&tracer));
    block_on(task.run_to_end()).unwrap();

    let tracer = tracer.lock();
    let events: Vec<&str> = tracer
        .buffer()
        .iter()
        .map(|record| record.event_type())
        .collect();
    assert_eq!(events.first(), Some(&"request"));
    assert!(events.contains(&"frame-push"));
    assert_eq!(events.last(), Some(&"finished"));

    let returned = tracer
        .buffer()
        .iter()
        .find_map(|record| match &record.event {
            TraceEvent::FrameReturned { value, .. } => Some(value.clone()),
            _ => None,
        });
    assert_eq!(returned, Some(Value::from(7)));
}
