use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use blue::{
    clear_global_state,
    config::Config,
    error::ErrorKind,
    get_result,
    interpreter::{
        evaluator::{
            core::{EvalResult, Evaluator},
            function::core::{is_sealed, lookup},
        },
        host::{Clock, Host, MemoryLoader, Scheduler, ThreadScheduler},
        value::{
            core::Value,
            function::{Arity, Builtin},
        },
    },
    register_builtin, run_source,
};

// The builtin registry is process-wide.
static REGISTRY: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    let guard = REGISTRY.lock().unwrap_or_else(PoisonError::into_inner);
    clear_global_state();
    guard
}

fn answer() -> Builtin {
    Builtin::new("answer", Arity::Exact(0), "answer() is 42", |_, _| Ok(Value::Integer(42)))
}

#[test]
fn builtins_registered_before_the_first_evaluator_are_visible() {
    let _guard = serial();
    assert!(!is_sealed());
    register_builtin(answer()).unwrap();
    register_builtin(Builtin::new("twice", Arity::Exact(1), "twice(x) is x + x", |_, args| {
        let x = args.at(0)?.expect_i64("x")?;
        Ok(Value::Integer(x * 2))
    })).unwrap();

    let v = get_result("twice(answer())").unwrap();
    assert_eq!(v.as_i64(), Some(84));
    assert!(is_sealed());
}

#[test]
fn registration_after_sealing_is_rejected() {
    let _guard = serial();
    drop(Evaluator::default());

    let error = register_builtin(answer()).unwrap_err();
    assert_eq!(error.kind, ErrorKind::Host);
    assert!(error.message.contains("sealed"), "{error}");
    assert!(lookup("answer").is_none());
}

#[test]
fn clearing_global_state_restores_the_core_registry() {
    let _guard = serial();
    register_builtin(answer()).unwrap();
    assert!(lookup("answer").is_some());

    clear_global_state();

    assert!(lookup("answer").is_none());
    assert!(lookup("print").is_some());
    assert!(!is_sealed());
}

#[test]
fn registered_builtins_check_their_arity() {
    let _guard = serial();
    register_builtin(answer()).unwrap();
    match get_result("answer(1)") {
        Err(blue::error::Error::Runtime(e)) => assert_eq!(e.kind, ErrorKind::Arity),
        other => panic!("expected an ArityError, got {other:?}"),
    }
}

#[test]
fn help_describes_builtins_and_functions() {
    let _guard = serial();
    let v = get_result("help(len)").unwrap();
    assert!(v.inspect().contains("len(x)"), "{v}");
    let v = get_result("fun area(w, h = 1) { w * h }; help(area)").unwrap();
    assert_eq!(v.inspect(), "fun area(w, h = 1)");
}

struct FixedClock {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        1_700_000_000_000
    }

    fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

#[derive(Default)]
struct RecordingScheduler {
    names: Arc<Mutex<Vec<String>>>,
    inner: ThreadScheduler,
}

impl Scheduler for RecordingScheduler {
    fn spawn(&self, name: String, task: Box<dyn FnOnce() + Send>) -> EvalResult<()> {
        self.names.lock().unwrap().push(name.clone());
        self.inner.spawn(name, task)
    }
}

#[test]
fn time_builtins_use_the_host_clock() {
    let _guard = serial();
    let slept = Arc::new(Mutex::new(Vec::new()));
    let config = Config::default();
    let host = Host::new(&config).with_clock(FixedClock { slept: Arc::clone(&slept) });

    let v = run_source("sleep(250); now_ms()", "clock", config, host).unwrap();
    assert_eq!(v.as_i64(), Some(1_700_000_000_000));
    assert_eq!(*slept.lock().unwrap(), [Duration::from_millis(250)]);
}

#[test]
fn spawned_workers_are_named_after_their_process() {
    let _guard = serial();
    let scheduler = RecordingScheduler::default();
    let names = Arc::clone(&scheduler.names);
    let config = Config::default().with_node_name("edge");
    let host = Host::new(&config).with_scheduler(scheduler);

    let v = run_source("val p = spawn(fun(parent) { send(parent, node_name()) }, self())\nrecv(self(), 5000)",
                       "spawn",
                       config,
                       host).unwrap();
    assert_eq!(v.as_str(), Some("edge"));

    let names = names.lock().unwrap();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("blue-edge:"), "{names:?}");
}

#[test]
fn imports_resolve_through_the_host_loader() {
    let _guard = serial();
    let loader = MemoryLoader::new().with_module("geometry.shapes",
                                                 "val sides = 4\nfun area(w) { w * w }");
    let config = Config::default();
    let host = Host::new(&config).with_loader(loader);

    let v = run_source("import geometry.shapes\nshapes.area(shapes.sides)", "import", config, host).unwrap();
    assert_eq!(v.as_i64(), Some(16));
}

#[test]
fn rendered_errors_point_at_the_source() {
    let _guard = serial();
    let config = Config::default();
    let host = Host::new(&config);

    let rendered = run_source("val a = 1\nval b = a / 0", "render", config, host).unwrap_err();
    let mut lines = rendered.lines();
    assert_eq!(lines.next(), Some("EvaluatorError: ArithmeticError: division by zero"));
    assert!(rendered.contains("at render:2:"), "{rendered}");
    assert!(rendered.contains("val b = a / 0"), "{rendered}");
}

#[test]
fn parse_errors_are_rendered_as_they_are() {
    let _guard = serial();
    let config = Config::default();
    let host = Host::new(&config);

    let rendered = run_source("val = 1", "broken", config, host).unwrap_err();
    assert!(rendered.starts_with("ParserError: "), "{rendered}");
    assert!(rendered.contains("broken:1:"), "{rendered}");
}
