// The depth limit is process-wide, so this lives in its own test binary.

use sable::{Interpreter, SableError};

#[test]
fn test_runaway_recursion_hits_depth_limit() {
    // spawned with the platform's default stack size
    let worker = std::thread::spawn(|| {
        let interp = Interpreter::builder().max_depth(300).build();
        interp.eval_str("(def (down n) (+ 1 (down n))) (down 0)")
    });
    let err = worker.join().unwrap().unwrap_err();
    assert!(matches!(err.inner(), SableError::Eval(msg) if msg.contains("maximum evaluation depth (300)")));
    assert!(err.stack_trace().is_some());
}
