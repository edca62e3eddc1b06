mod eval;
mod special_forms;

pub use eval::{
    apply_closure, call_function, call_stack_depth, capture_stack_trace, eval_all, eval_body,
    evaluate, max_depth, push_call_frame, set_max_depth, truncate_call_stack, DEFAULT_MAX_DEPTH,
};
pub use special_forms::{register_core, register_special_forms, SPECIAL_FORM_NAMES};
