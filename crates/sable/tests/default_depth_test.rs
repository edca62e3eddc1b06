// Runs with the default depth limit; keep other tests out of this binary.

use sable::{Interpreter, SableError};

fn runaway_on(worker: std::thread::JoinHandle<sable::EvalResult>) -> SableError {
    worker.join().unwrap().unwrap_err()
}

#[test]
fn test_default_limit_fits_an_ordinary_thread() {
    let err = runaway_on(std::thread::spawn(|| {
        Interpreter::new().eval_str("(def (down n) (+ 1 (down n))) (down 0)")
    }));
    let expected = format!("maximum evaluation depth ({})", sable_eval::DEFAULT_MAX_DEPTH);
    assert!(matches!(err.inner(), SableError::Eval(msg) if msg.contains(&expected)), "{err}");
}

#[test]
fn test_default_limit_on_an_8mib_thread() {
    let worker = std::thread::Builder::new()
        .stack_size(8 * 1024 * 1024)
        .spawn(|| {
            Interpreter::new().eval_str(
                "(def (walk n) (if (= n 0) (walk n) (walk (- n 1)))) (walk 20)",
            )
        })
        .unwrap();
    let err = runaway_on(worker);
    assert!(err.to_string().contains("maximum evaluation depth"), "{err}");
}
