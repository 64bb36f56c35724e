//! When to rebuild the test structure instead of reusing the stored one.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::builder::{descriptor_files, module_dirs, test_files};
use super::TestTree;
use crate::config::LayoutConfig;
use crate::ports::clock::Clock;
use crate::ports::filesystem::FileSystem;

const DAY_SECS: u64 = 24 * 60 * 60;

/// A rebuild rule. Rules compose with [`UpdatePolicy::AnyOf`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdatePolicy {
    /// Rebuild on every run.
    Always,
    /// Only build when there is no stored structure.
    Never,
    /// Rebuild once the stored structure is older than this.
    OlderThan {
        /// Maximum age in seconds.
        max_age_secs: u64,
    },
    /// Rebuild when a test source changed after the last build.
    TestSourcesModified,
    /// Rebuild when a build descriptor changed after the last build.
    BuildDescriptorsModified,
    /// Rebuild when any member rule says so.
    AnyOf {
        /// Member rules.
        policies: Vec<UpdatePolicy>,
    },
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        Self::AnyOf {
            policies: vec![Self::BuildDescriptorsModified, Self::OlderThan { max_age_secs: DAY_SECS }],
        }
    }
}

/// What a policy may look at.
#[derive(Clone, Copy)]
pub struct ProjectView<'a> {
    /// Filesystem for modification times.
    pub fs: &'a dyn FileSystem,
    /// Current time.
    pub clock: &'a dyn Clock,
    /// Project root.
    pub project_root: &'a Path,
    /// Where descriptors and test sources live.
    pub layout: &'a LayoutConfig,
}

impl UpdatePolicy {
    /// Whether to rebuild. Always `true` when there is no stored structure.
    #[must_use]
    pub fn should_rebuild(&self, existing: Option<&TestTree>, project: &ProjectView<'_>) -> bool {
        match existing {
            None => true,
            Some(tree) => self.evaluate(tree, project),
        }
    }

    fn evaluate(&self, tree: &TestTree, project: &ProjectView<'_>) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::OlderThan { max_age_secs } => {
                let max_age = i64::try_from(*max_age_secs)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .unwrap_or(Duration::MAX);
                project.clock.now() - tree.last_updated > max_age
            }
            Self::TestSourcesModified => {
                let modules = module_dirs(project.fs, project.project_root, project.layout);
                let files = modules
                    .iter()
                    .flat_map(|dir| test_files(project.fs, dir, project.layout));
                any_modified_after(project.fs, files, tree.last_updated)
            }
            Self::BuildDescriptorsModified => {
                let files = descriptor_files(project.fs, project.project_root, project.layout);
                any_modified_after(project.fs, files, tree.last_updated)
            }
            Self::AnyOf { policies } => policies.iter().any(|p| p.evaluate(tree, project)),
        }
    }
}

/// Files whose modification time is unknown never count as modified.
fn any_modified_after<I, P>(fs: &dyn FileSystem, files: I, since: DateTime<Utc>) -> bool
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    files.into_iter().any(|f| fs.modified(f.as_ref()).is_some_and(|t| t > since))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fixed::SteppingClock;
    use crate::adapters::memory::MemoryFileSystem;
    use crate::graph::fixtures;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    /// Stored tree built at 2025-03-01T12:00:00Z.
    fn stored() -> TestTree {
        fixtures::sample_tree()
    }

    fn project() -> MemoryFileSystem {
        let fs = MemoryFileSystem::with_files([
            ("/p/pom.xml", ""),
            ("/p/core/pom.xml", ""),
            ("/p/core/src/test/kotlin/com/example/CalcTest.kt", ""),
        ]);
        for path in fs.paths() {
            fs.set_modified(&path, ts("2025-03-01T11:00:00Z"));
        }
        fs
    }

    fn decide(policy: &UpdatePolicy, fs: &MemoryFileSystem, now: &str, tree: Option<&TestTree>) -> bool {
        let clock = SteppingClock::starting_at(now);
        let layout = LayoutConfig::default();
        let project = ProjectView { fs, clock: &clock, project_root: Path::new("/p"), layout: &layout };
        policy.should_rebuild(tree, &project)
    }

    #[test]
    fn missing_tree_always_rebuilds() {
        let fs = project();
        assert!(decide(&UpdatePolicy::Never, &fs, "2025-03-01T12:00:00Z", None));
    }

    #[test]
    fn always_and_never() {
        let fs = project();
        let tree = stored();
        assert!(decide(&UpdatePolicy::Always, &fs, "2025-03-01T12:00:00Z", Some(&tree)));
        assert!(!decide(&UpdatePolicy::Never, &fs, "2099-01-01T00:00:00Z", Some(&tree)));
    }

    #[test]
    fn older_than_compares_age_strictly() {
        let fs = project();
        let tree = stored();
        let hour = UpdatePolicy::OlderThan { max_age_secs: 3600 };
        assert!(!decide(&hour, &fs, "2025-03-01T13:00:00Z", Some(&tree)));
        assert!(decide(&hour, &fs, "2025-03-01T13:00:01Z", Some(&tree)));
    }

    #[test]
    fn root_descriptor_change_triggers_rebuild() {
        let fs = project();
        let tree = stored();
        let policy = UpdatePolicy::BuildDescriptorsModified;
        assert!(!decide(&policy, &fs, "2025-03-01T12:30:00Z", Some(&tree)));

        fs.set_modified(Path::new("/p/pom.xml"), ts("2025-03-01T12:10:00Z"));
        assert!(decide(&policy, &fs, "2025-03-01T12:30:00Z", Some(&tree)));
    }

    #[test]
    fn test_source_change_triggers_rebuild() {
        let fs = project();
        let tree = stored();
        let policy = UpdatePolicy::TestSourcesModified;
        assert!(!decide(&policy, &fs, "2025-03-01T12:30:00Z", Some(&tree)));

        fs.set_modified(
            Path::new("/p/core/src/test/kotlin/com/example/CalcTest.kt"),
            ts("2025-03-01T12:10:00Z"),
        );
        assert!(decide(&policy, &fs, "2025-03-01T12:30:00Z", Some(&tree)));
    }

    #[test]
    fn default_is_descriptors_or_a_day() {
        let fs = project();
        let tree = stored();
        let policy = UpdatePolicy::default();
        assert!(!decide(&policy, &fs, "2025-03-02T11:59:59Z", Some(&tree)));
        assert!(decide(&policy, &fs, "2025-03-02T12:00:01Z", Some(&tree)));
    }

    #[test]
    fn serde_shape_is_tagged() {
        let yaml = serde_yaml::to_string(&UpdatePolicy::default()).unwrap();
        assert!(yaml.contains("kind: any_of"));
        assert!(yaml.contains("kind: build_descriptors_modified"));
        let back: UpdatePolicy = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, UpdatePolicy::default());
    }
}
