//! Turning failures into oracle prompts and oracle output back into source.

mod extract;
mod prompt;

pub use extract::extract_source;
pub use prompt::{build_prompt, STACKTRACE_PROMPT_CHARS};
