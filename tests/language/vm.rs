//! Integration tests for the VM
//!
//! Scripts are driven to completion against a small in-test host that
//! answers every request the VM suspends on.

use std::collections::HashMap;

use nml_foundation::{ObjectId, RuntimeError, Value};
use nml_language::{Reply, Request, Step, Vm, VmConfig, code_to_ast};

const ME: ObjectId = ObjectId(0x10);
const BOX: ObjectId = ObjectId(0x20);

/// Objects with props and verb sources, keyed by id.
#[derive(Default)]
struct World {
    props: HashMap<(ObjectId, String), Value>,
    verbs: HashMap<(ObjectId, String), String>,
    aliases: HashMap<String, ObjectId>,
    log: Vec<String>,
}

impl World {
    fn serve(&mut self, request: Request) -> Result<Reply, RuntimeError> {
        self.log.push(request.kind().to_string());
        match request {
            Request::GetProp { object, name } => self
                .props
                .get(&(object, name.clone()))
                .cloned()
                .map(Reply::Value)
                .ok_or(RuntimeError::PropNotFound(name)),
            Request::SetProp {
                object,
                name,
                value,
            } => {
                self.props.insert((object, name), value);
                Ok(Reply::Done)
            }
            Request::ResolveAlias { name } => self
                .aliases
                .get(&name)
                .map(|id| Reply::Value(Value::Object(*id)))
                .ok_or(RuntimeError::UnknownAlias(name)),
            Request::Call { object, args } => {
                let source = self
                    .verbs
                    .get(&(object, args.verb.clone()))
                    .ok_or_else(|| RuntimeError::VerbNotFound(args.verb.clone()))?;
                let ast = code_to_ast(source)?;
                Ok(Reply::Frame(Box::new(Vm::for_call(object, ast, &args))))
            }
        }
    }
}

/// Runs `vm` to the end, returning how many steps it took.
fn drive(vm: &mut Vm, world: &mut World) -> Result<usize, RuntimeError> {
    for steps in 1..=10_000 {
        match vm.step() {
            Ok(Step::Continue) => {}
            Ok(Step::Suspend(request)) => vm.resume(world.serve(request))?,
            Err(RuntimeError::EndOfScript) => return Ok(steps),
            Err(err) => return Err(err),
        }
    }
    panic!("script did not finish");
}

fn run(source: &str, world: &mut World) -> Result<Vm, RuntimeError> {
    let mut vm = Vm::compile(ME, source)?;
    drive(&mut vm, world)?;
    Ok(vm)
}

#[test]
fn fizzbuzz_into_a_property() {
    let src = "\
$out = []
$i = 1
while $i <= 15
  $word = $i
  if $i / 15 == 1
    $word = 'FizzBuzz'
  end
  if $i == 3 or $i == 6 or $i == 9 or $i == 12
    $word = 'Fizz'
  end
  if $i == 5 or $i == 10
    $word = 'Buzz'
  end
  $out[$i - 1] = $word
  $i += 1
end
%result = $out";
    let mut world = World::default();
    run(src, &mut world).unwrap();
    let result = &world.props[&(ME, "result".to_string())];
    let items = result.as_array().unwrap();
    assert_eq!(items.len(), 15);
    assert_eq!(items[2], Value::from("Fizz"));
    assert_eq!(items[4], Value::from("Buzz"));
    assert_eq!(items[14], Value::from("FizzBuzz"));
    assert_eq!(items[6], Value::from(7));
}

#[test]
fn verbs_run_on_the_object_they_are_called_for() {
    let mut world = World::default();
    world.aliases.insert("Box".into(), BOX);
    world.verbs.insert(
        (ME, "put".into()),
        "$_return = $_indirectObj\n%last = $_directObj".into(),
    );

    let vm = run("$where = put(apple in ##Box)", &mut world).unwrap();
    assert_eq!(vm.local("where"), Some(&Value::Object(BOX)));
    assert_eq!(world.props[&(ME, "last".to_string())], Value::from("apple"));
    assert_eq!(
        world.log,
        vec!["resolve_alias", "call", "set_prop"],
        "one request per suspension"
    );
}

#[test]
fn verb_results_compose_in_expressions() {
    let mut world = World::default();
    world
        .verbs
        .insert((ME, "square".into()), "$_return = $_directObj * $_directObj".into());
    world
        .verbs
        .insert((ME, "sum".into()), "$_return = $_params[0] + $_params[1]".into());

    let vm = run("$r = sum(square(3) square(4))", &mut world).unwrap();
    assert_eq!(vm.local("r"), Some(&Value::from(25)));
}

#[test]
fn delegated_frames_step_one_statement_at_a_time() {
    let mut world = World::default();
    world
        .verbs
        .insert((ME, "three".into()), "$a = 1\n$b = 2\n$c = 3".into());

    let mut flat = Vm::compile(ME, "$a = 1\n$b = 2\n$c = 3\n$d = 4").unwrap();
    let flat_steps = drive(&mut flat, &mut World::default()).unwrap();
    assert_eq!(flat_steps, 4);

    // The call suspends once, the frame takes one step per statement (its
    // last also hands back the result), then the calling statement re-runs.
    let mut vm = Vm::compile(ME, "three").unwrap();
    let steps = drive(&mut vm, &mut world).unwrap();
    assert_eq!(steps, 1 + 3 + 1);
}

#[test]
fn recursion_depth_follows_config() {
    let mut world = World::default();
    world.verbs.insert(
        (ME, "countdown".into()),
        "if $_directObj > 0\n  countdown ($_directObj - 1)\nend".into(),
    );

    let mut shallow = Vm::compile(ME, "countdown 10")
        .unwrap()
        .with_config(VmConfig { max_call_depth: 20 });
    drive(&mut shallow, &mut world).unwrap();

    let mut limited = Vm::compile(ME, "countdown 10")
        .unwrap()
        .with_config(VmConfig { max_call_depth: 5 });
    assert_eq!(
        drive(&mut limited, &mut world),
        Err(RuntimeError::CallDepthExceeded(5))
    );
}

#[test]
fn missing_property_stops_the_script_where_it_was() {
    let mut world = World::default();
    let mut vm = Vm::compile(ME, "$a = 1\n$b = %nope\n$c = 3").unwrap();
    let err = drive(&mut vm, &mut world).unwrap_err();
    assert_eq!(err, RuntimeError::PropNotFound("nope".into()));
    assert_eq!(vm.ip(), &[1]);
    assert_eq!(vm.local("c"), None);
}

mod properties {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn multiplication_binds_tighter_than_addition(a in 0..50i32, b in 0..50i32, c in 0..50i32) {
            let vm = run(&format!("$r = {a} + {b} * {c} - {a}"), &mut World::default()).unwrap();
            prop_assert_eq!(vm.local("r"), Some(&Value::from(b * c)));
        }

        #[test]
        fn while_loop_runs_its_body_n_times(n in 0..40i32) {
            let src = format!("$i = 0\n$hits = 0\nwhile $i < {n}\n$i += 1\n$hits += 1\nend");
            let vm = run(&src, &mut World::default()).unwrap();
            prop_assert_eq!(vm.local("i"), Some(&Value::from(n)));
            prop_assert_eq!(vm.local("hits"), Some(&Value::from(n)));
        }
    }
}
