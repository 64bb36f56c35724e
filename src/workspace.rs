//! Per-attempt audit directories under `<storage>/remediation/`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::MendError;
use crate::ports::clock::Clock;
use crate::ports::filesystem::FileSystem;

const README: &str = "\
# Remediation workspace

One repair attempt for one failing test.

- `failure-context.txt`: failing class, method, message, stack trace, and source
- `prompt.txt`: prompt sent to the repair oracle
- `response.txt`: raw oracle output
- `diagnostic-report.md`: outcome summary
- `applied-changes/`: copies of files written by the attempt
- `logs/activity.log`: timestamped activity log
";

/// Failure details written to `failure-context.txt`.
#[derive(Debug, Clone, Copy)]
pub struct FailureContext<'a> {
    /// Fully-qualified class name.
    pub class_name: &'a str,
    /// Failing method name.
    pub method: &'a str,
    /// Failure message.
    pub message: &'a str,
    /// Stack trace.
    pub stacktrace: &'a str,
    /// Test source at the time of failure.
    pub source: &'a str,
}

/// Creates and fills remediation workspaces.
pub struct RemediationWorkspace<'a> {
    fs: &'a dyn FileSystem,
    clock: &'a dyn Clock,
    root: PathBuf,
}

impl<'a> RemediationWorkspace<'a> {
    /// Workspaces live in `<storage_dir>/remediation`.
    pub fn new(fs: &'a dyn FileSystem, clock: &'a dyn Clock, storage_dir: &Path) -> Self {
        Self { fs, clock, root: storage_dir.join("remediation") }
    }

    /// Creates `<SimpleClass>_<method>_<timestamp>` and writes its README.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Workspace`] if the README cannot be written.
    pub fn create(
        &self,
        class_name: &str,
        method: &str,
        at: DateTime<Utc>,
    ) -> Result<PathBuf, MendError> {
        let simple = class_name.rsplit('.').next().unwrap_or(class_name);
        let stamp = at.to_rfc3339_opts(SecondsFormat::Millis, true).replace([':', '.'], "-");
        let dir = self.root.join(format!("{simple}_{}_{stamp}", sanitize(method)));
        self.write(&dir.join("README.md"), README)?;
        Ok(dir)
    }

    /// Writes `failure-context.txt`.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Workspace`] on write failure.
    pub fn save_failure_context(
        &self,
        dir: &Path,
        context: &FailureContext<'_>,
    ) -> Result<(), MendError> {
        let text = format!(
            "Class: {}\nMethod: {}\n\nError message:\n{}\n\nStack trace:\n{}\n\nSource:\n{}\n",
            context.class_name, context.method, context.message, context.stacktrace, context.source
        );
        self.write(&dir.join("failure-context.txt"), &text)
    }

    /// Writes `prompt.txt`.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Workspace`] on write failure.
    pub fn save_prompt(&self, dir: &Path, prompt: &str) -> Result<(), MendError> {
        self.write(&dir.join("prompt.txt"), prompt)
    }

    /// Writes `response.txt`.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Workspace`] on write failure.
    pub fn save_response(&self, dir: &Path, response: &str) -> Result<(), MendError> {
        self.write(&dir.join("response.txt"), response)
    }

    /// Writes `diagnostic-report.md`.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Workspace`] on write failure.
    pub fn save_diagnostic(&self, dir: &Path, report: &str) -> Result<(), MendError> {
        self.write(&dir.join("diagnostic-report.md"), report)
    }

    /// Copies a modified file into `applied-changes/` under its file name.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Workspace`] on write failure.
    pub fn save_modified_file(
        &self,
        dir: &Path,
        original_path: &Path,
        contents: &str,
    ) -> Result<PathBuf, MendError> {
        let name = original_path.file_name().map_or_else(
            || original_path.to_string_lossy().into_owned(),
            |n| n.to_string_lossy().into_owned(),
        );
        let target = dir.join("applied-changes").join(name);
        self.write(&target, contents)?;
        Ok(target)
    }

    /// Appends `[<rfc3339>] <message>` to `logs/activity.log`.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Workspace`] on write failure.
    pub fn log_activity(&self, dir: &Path, message: &str) -> Result<(), MendError> {
        let line = format!("[{}] {message}\n", self.clock.now().to_rfc3339());
        let path = dir.join("logs/activity.log");
        self.fs.append(&path, &line).map_err(|e| workspace_error(&path, &e))
    }

    /// Names of existing workspaces, sorted. Empty if none were created yet.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.fs.list_dir(&self.root).unwrap_or_default()
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), MendError> {
        self.fs.write(path, contents).map_err(|e| workspace_error(path, &e))
    }
}

fn workspace_error(path: &Path, err: &crate::error::BoxError) -> MendError {
    MendError::Workspace(format!("{}: {err}", path.display()))
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fixed::SteppingClock;
    use crate::adapters::memory::MemoryFileSystem;

    fn at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-01T12:30:45.123Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn create_names_directory_and_writes_readme() {
        let fs = MemoryFileSystem::new();
        let clock = SteppingClock::starting_at("2025-03-01T00:00:00Z");
        let ws = RemediationWorkspace::new(&fs, &clock, Path::new("/p/.mend"));

        let dir = ws.create("com.example.CalcTest", "adds by (2, 2)", at()).unwrap();

        assert_eq!(
            dir,
            PathBuf::from("/p/.mend/remediation/CalcTest_adds_by__2__2__2025-03-01T12-30-45-123Z")
        );
        assert!(fs.read_to_string(&dir.join("README.md")).unwrap().contains("prompt.txt"));
        assert_eq!(ws.list().len(), 1);
    }

    #[test]
    fn artifacts_land_in_expected_files() {
        let fs = MemoryFileSystem::new();
        let clock = SteppingClock::starting_at("2025-03-01T00:00:00Z");
        let ws = RemediationWorkspace::new(&fs, &clock, Path::new("/s"));
        let dir = ws.create("CalcTest", "adds", at()).unwrap();

        ws.save_failure_context(
            &dir,
            &FailureContext {
                class_name: "CalcTest",
                method: "adds",
                message: "expected 4",
                stacktrace: "at adds",
                source: "class CalcTest",
            },
        )
        .unwrap();
        ws.save_prompt(&dir, "fix it").unwrap();
        ws.save_response(&dir, "done").unwrap();
        ws.save_diagnostic(&dir, "# ok").unwrap();
        let copy = ws
            .save_modified_file(&dir, Path::new("/p/src/test/kotlin/CalcTest.kt"), "new")
            .unwrap();
        ws.log_activity(&dir, "first").unwrap();
        ws.log_activity(&dir, "second").unwrap();

        let context = fs.read_to_string(&dir.join("failure-context.txt")).unwrap();
        assert!(context.contains("Method: adds"));
        assert!(context.contains("expected 4"));
        assert_eq!(fs.read_to_string(&dir.join("prompt.txt")).unwrap(), "fix it");
        assert_eq!(copy, dir.join("applied-changes/CalcTest.kt"));
        assert_eq!(
            fs.read_to_string(&dir.join("logs/activity.log")).unwrap(),
            "[2025-03-01T00:00:00+00:00] first\n[2025-03-01T00:00:01+00:00] second\n"
        );
    }

    #[test]
    fn list_without_workspaces_is_empty() {
        let fs = MemoryFileSystem::new();
        let clock = SteppingClock::starting_at("2025-03-01T00:00:00Z");
        assert!(RemediationWorkspace::new(&fs, &clock, Path::new("/s")).list().is_empty());
    }
}
