//! Command-template adapter for the `TestRunner` port.

use tracing::debug;

use super::shell::render_template;
use crate::error::BoxError;
use crate::ports::runner::{ExecutionReport, FailureDetail, TestRunner};
use crate::ports::shell::{ShellExecutor, ShellOutput};

/// Number of trailing output characters kept as the stack trace of a
/// failure synthesized from an exit code.
const OUTPUT_TAIL_CHARS: usize = 2000;

/// Runs a configured command line per test class.
///
/// The command's stdout may carry a JSON [`ExecutionReport`]; if it does
/// not, the exit code decides pass or fail and a single class-level
/// failure is synthesized from the process output.
pub struct CommandTestRunner {
    shell: Box<dyn ShellExecutor>,
    template: String,
}

impl CommandTestRunner {
    /// Creates a runner from a `{class}` command template.
    pub fn new(shell: Box<dyn ShellExecutor>, template: impl Into<String>) -> Self {
        Self { shell, template: template.into() }
    }
}

impl TestRunner for CommandTestRunner {
    fn execute(&self, class_name: &str) -> Result<ExecutionReport, BoxError> {
        let command = render_template(&self.template, "class", class_name);
        debug!(%command, "executing test class");
        let output = self.shell.run(&command)?;
        Ok(interpret(class_name, &output))
    }
}

fn interpret(class_name: &str, output: &ShellOutput) -> ExecutionReport {
    if let Some(report) = parse_report(&output.stdout) {
        return report;
    }
    if output.success() {
        return ExecutionReport { class_name: class_name.to_string(), failures: Vec::new() };
    }
    let simple_name = class_name.rsplit('.').next().unwrap_or(class_name);
    let combined = format!("{}{}", output.stdout, output.stderr);
    ExecutionReport {
        class_name: class_name.to_string(),
        failures: vec![FailureDetail {
            method: simple_name.to_string(),
            message: format!("test command exited with status {}", output.exit_code),
            stacktrace: tail(&combined, OUTPUT_TAIL_CHARS).to_string(),
        }],
    }
}

/// Finds the last stdout line that parses as a JSON report.
fn parse_report(stdout: &str) -> Option<ExecutionReport> {
    if let Ok(report) = serde_json::from_str::<ExecutionReport>(stdout.trim()) {
        return Some(report);
    }
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .find_map(|line| serde_json::from_str(line).ok())
}

fn tail(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    let skip = count - max_chars;
    text.char_indices().nth(skip).map_or(text, |(idx, _)| &text[idx..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::live::shell::LiveShellExecutor;

    fn runner(template: &str) -> CommandTestRunner {
        CommandTestRunner::new(Box::new(LiveShellExecutor::new()), template)
    }

    #[test]
    fn json_report_is_used_verbatim() {
        let json = r#"{"class_name":"com.example.CalcTest","failures":[{"method":"adds","message":"expected 4","stacktrace":"at CalcTest.adds"}]}"#;
        let report = runner(&format!("echo 'building...'; echo '{json}'; exit 1"))
            .execute("com.example.CalcTest")
            .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].method, "adds");
        assert_eq!(report.failures[0].message, "expected 4");
    }

    #[test]
    fn zero_exit_without_report_passes() {
        let report = runner("echo ok {class}").execute("com.example.CalcTest").unwrap();
        assert!(report.passed());
        assert_eq!(report.class_name, "com.example.CalcTest");
    }

    #[test]
    fn nonzero_exit_without_report_synthesizes_failure() {
        let report = runner("echo boom >&2; exit 3").execute("com.example.CalcTest").unwrap();
        assert!(!report.passed());
        assert_eq!(report.failures[0].method, "CalcTest");
        assert!(report.failures[0].message.contains("status 3"));
        assert!(report.failures[0].stacktrace.contains("boom"));
    }

    #[test]
    fn tail_keeps_the_end() {
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("ab", 3), "ab");
    }
}
