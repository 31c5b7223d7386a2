use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use blue::{
    clear_global_state,
    error::{Error, ErrorKind},
    get_result,
    interpreter::{
        broker::Broker,
        process::{Process, ProcessKey, table},
        value::core::Value,
    },
};

// Tests here share the process table and the broker.
static GLOBAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    GLOBAL.lock().unwrap_or_else(PoisonError::into_inner)
}

fn value_of(src: &str) -> Value {
    get_result(src).unwrap_or_else(|e| panic!("Script failed: {e}\n{src}"))
}

fn error_of(src: &str) -> (ErrorKind, String) {
    match get_result(src) {
        Err(Error::Runtime(e)) => (e.kind, e.message),
        other => panic!("expected a runtime error, got {other:?}"),
    }
}

#[test]
fn mailbox_delivery_is_fifo() {
    let _guard = serial();
    let process = Process::new(ProcessKey::new("test", 1));
    for i in 0..5 {
        process.send(Value::Integer(i)).unwrap();
    }
    for i in 0..5 {
        let v = process.recv(Some(Duration::from_millis(10))).unwrap();
        assert_eq!(v.as_i64(), Some(i));
    }
}

#[test]
fn messages_from_one_sender_arrive_in_order() {
    let _guard = serial();
    let v = value_of(r"
        fun producer(parent) {
            for i in 1..5 { send(parent, i) }
        }
        spawn(producer, self())
        [recv(self(), 5000) for _ in range(5)]
    ");
    assert_eq!(v.inspect(), "[1, 2, 3, 4, 5]");
}

#[test]
fn processes_can_be_addressed_through_members() {
    let _guard = serial();
    let v = value_of(r"
        val me = self()
        val echo = spawn(fun() { val msg = recv(self()); send(msg[0], msg[1]) })
        echo.send([me, 'pong'])
        me.recv(5000)
    ");
    assert_eq!(v.as_str(), Some("pong"));
}

#[test]
fn the_proc_namespace_mirrors_the_builtins() {
    let _guard = serial();
    let v = value_of(r"
        val p = proc.spawn(fun(parent) { proc.send(parent, node_name()) }, proc.self())
        proc.recv(proc.self(), 5000) == node_name()
    ");
    assert!(matches!(v, Value::Boolean(true)));
}

#[test]
fn recv_times_out() {
    let _guard = serial();
    let (kind, message) = error_of("recv(self(), 20)");
    assert_eq!(kind, ErrorKind::Process);
    assert_eq!(message, "recv timed out after 20ms");
}

#[test]
fn a_failing_process_does_not_affect_its_spawner() {
    let _guard = serial();
    let v = value_of(r"
        spawn(fun() { 1 / 0 })
        'still here'
    ");
    assert_eq!(v.as_str(), Some("still here"));
}

#[test]
fn spawn_needs_something_callable() {
    let _guard = serial();
    assert_eq!(error_of("spawn(42)").0, ErrorKind::Type);
}

#[test]
fn finished_processes_leave_the_table() {
    let _guard = serial();
    clear_global_state();
    let v = value_of(r"
        val p = spawn(fun(parent) { send(parent, 'done') }, self())
        recv(self(), 5000)
    ");
    assert_eq!(v.as_str(), Some("done"));
    // The worker drops its evaluator right after the send.
    for _ in 0..200 {
        if table::count() == 0 {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(table::count(), 0);
}

#[test]
fn publish_reaches_matching_subscribers() {
    let _guard = serial();
    let v = value_of(r"
        val a = subscribe('orders.fifo')
        val b = subscribe('orders.other')
        val delivered = publish('orders.fifo', {id: 7})
        assert(delivered == 1)
        val message = poll(a, 1000)
        assert(message.topic == 'orders.fifo')
        message.msg.id
    ");
    assert_eq!(v.as_i64(), Some(7));
}

#[test]
fn topics_can_be_added_and_removed() {
    let _guard = serial();
    let v = value_of(r"
        val s = subscribe('topics.first')
        add_topic(s, 'topics.second')
        assert(s.topics == ['topics.first', 'topics.second'])
        assert(remove_topic(s, 'topics.first'))
        assert(not remove_topic(s, 'topics.first'))
        assert(publish('topics.first', 1) == 0)
        assert(publish('topics.second', 2) == 1)
        poll(s, 1000).msg
    ");
    assert_eq!(v.as_i64(), Some(2));
}

#[test]
fn unsubscribed_subscribers_stop_receiving() {
    let _guard = serial();
    let (kind, _) = error_of(r"
        val s = subscribe('gone.topic')
        unsubscribe(s)
        assert(publish('gone.topic', 1) == 0)
        poll(s, 50)
    ");
    assert_eq!(kind, ErrorKind::Process);
}

#[test]
fn poll_times_out_without_messages() {
    let _guard = serial();
    let (kind, message) = error_of("poll(subscribe('quiet.topic'), 20)");
    assert_eq!(kind, ErrorKind::Process);
    assert!(message.contains("timed out"), "{message}");
}

#[test]
fn clearing_global_state_closes_everything() {
    let _guard = serial();
    let broker = Broker::global();
    let subscriber = broker.subscribe("clear.topic");
    let process = table::register("test");
    assert!(table::lookup("test", process.id()).is_some());

    clear_global_state();

    assert!(broker.is_empty());
    assert!(!subscriber.is_active());
    assert!(process.is_finished());
    assert_eq!(table::count(), 0);
    assert_eq!(broker.publish("clear.topic", &Value::Null).unwrap(), 0);
}
