//! Prompt text sent to the repair oracle.

use std::fmt::Write as _;

use crate::ports::oracle::RepairRequest;

/// How much of each stack trace is included in a prompt.
pub const STACKTRACE_PROMPT_CHARS: usize = 500;

/// Renders the instructions sent to the repair oracle.
#[must_use]
pub fn build_prompt(request: &RepairRequest) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "The test class {} is failing.", request.class_name);
    let _ = writeln!(prompt, "File: {}", request.file_path.display());
    prompt.push_str("\nCurrent source:\n```\n");
    prompt.push_str(request.current_source.trim_end());
    prompt.push_str("\n```\n\nFailures:\n");

    for failure in &request.failures {
        let _ = writeln!(prompt, "- {}: {}", failure.method, failure.message);
        let trace = truncate_chars(failure.stacktrace.trim(), STACKTRACE_PROMPT_CHARS);
        if !trace.is_empty() {
            let _ = writeln!(prompt, "  Stack trace:\n  {}", trace.replace('\n', "\n  "));
        }
    }

    prompt.push_str(
        "\nRequirements:\n\
         1. Output only the complete corrected file in a single fenced code block.\n\
         2. Keep every existing test method and every assertion.\n\
         3. Do not weaken tests or add assertions that are always true.\n\
         4. Fix the test code only; do not change production code.\n",
    );
    prompt
}

fn truncate_chars(text: &str, max: usize) -> &str {
    text.char_indices().nth(max).map_or(text, |(idx, _)| &text[..idx])
}
