pub mod ast;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod function;
pub mod sync;
pub mod value;

pub use ast::{Node, Shape};
pub use dispatch::DispatchSet;
pub use env::Env;
pub use error::{CallFrame, Result, SableError, Span, StackTrace};
pub use function::{Closure, FunctionEntry, FunctionKind, NativeFn, SpecialFn};
pub use lasso::Spur;
pub use sync::{Lock, ThreadHandle};
pub use value::{intern, resolve, with_resolved, Type, Value};
