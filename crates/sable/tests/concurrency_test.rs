mod common;

use common::eval;
use sable::{Interpreter, Value};

#[test]
fn test_thread_join_returns_value() {
    assert_eq!(
        eval("(def t (thread (lambda () (* 6 7)))) (thread-join t)"),
        Value::int(42)
    );
}

#[test]
fn test_thread_error_propagates_on_join() {
    let err = common::eval_err("(thread-join (thread (lambda () (car (list)))))");
    assert!(err.to_string().contains("empty list"));
}

#[test]
fn test_thread_joins_once() {
    let err = common::eval_err("(def t (thread (lambda () 1))) (thread-join t) (thread-join t)");
    assert!(err.to_string().contains("already joined"));
}

#[test]
fn test_threads_share_captured_scope() {
    let src = "(def counter 0)
               (def guard (make-lock))
               (def (bump) (lock guard) (set counter (+ counter 1)) (unlock guard))
               (def (work) (for-each (lambda (i) (bump)) (range 50)))
               (def workers (map (lambda (i) (thread work)) (range 4)))
               (for-each thread-join workers)
               counter";
    assert_eq!(eval(src), Value::int(200));
}

#[test]
fn test_lock_state() {
    assert_eq!(
        eval("(def l (make-lock)) (lock l) (def held (is-locked l)) (unlock l) (list held (is-locked l))"),
        Value::list(vec![Value::Bool(true), Value::Bool(false)])
    );
}

#[test]
fn test_thread_alive_after_join_is_false() {
    assert_eq!(
        eval("(def t (thread (lambda () (sleep 1) 1))) (thread-join t) (thread-alive t)"),
        Value::Bool(false)
    );
}

#[test]
fn test_interpreters_on_separate_threads() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let interp = Interpreter::new();
                interp
                    .eval_str(&format!("(def (sq n) (* n n)) (sq {i})"))
                    .unwrap()
            })
        })
        .collect();
    let results: Vec<Value> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(
        results,
        vec![Value::int(0), Value::int(1), Value::int(4), Value::int(9)]
    );
}
