//! Folding runner results and repair attempts into the test tree.

use crate::graph::{ExecutionOutcome, RemediationOutcome, TestTree};
use crate::ledger::{ExecutionDetails, ExecutionLedger, RemediationDetails, RemediationLedger};
use crate::ports::runner::{ExecutionReport, FailureDetail};

/// Records one execution on every method of `class_name`.
///
/// A method fails when a reported failure names it (by simple or display
/// name); every other method of the class is recorded as a success. When
/// failures were reported but none names a method of the class, as with a
/// crashed engine or a class-level error, every method fails with the
/// first reported failure.
pub(crate) fn record_execution(
    tree: TestTree,
    ledger: &ExecutionLedger<'_>,
    class_name: &str,
    report: &ExecutionReport,
    duration_ms: u64,
) -> TestTree {
    let class_failure = if names_no_method(&tree, class_name, &report.failures) {
        report.failures.first()
    } else {
        None
    };
    let paths = tree.method_paths(class_name, |_| true);
    paths.into_iter().fold(tree, |tree, path| {
        tree.update_method(&path.module_id, &path.class_id, &path.method_id, |method| {
            let failure =
                report.failures.iter().find(|f| method.answers_to(&f.method)).or(class_failure);
            let (outcome, details) = match failure {
                Some(failure) => (
                    ExecutionOutcome::Failure,
                    ExecutionDetails {
                        duration_ms,
                        error_message: Some(failure.message.clone()),
                        stack_trace: Some(failure.stacktrace.clone()),
                        ..ExecutionDetails::default()
                    },
                ),
                None => (
                    ExecutionOutcome::Success,
                    ExecutionDetails { duration_ms, ..ExecutionDetails::default() },
                ),
            };
            ledger.record(method, outcome, details)
        })
    })
}

/// Records one remediation attempt on each method of `class_name` named by
/// `failing`, or on every method of the class when none is named.
pub(crate) fn record_remediation(
    tree: TestTree,
    ledger: &RemediationLedger<'_>,
    class_name: &str,
    failing: &[FailureDetail],
    outcome: RemediationOutcome,
    details: &RemediationDetails,
) -> TestTree {
    let whole_class = names_no_method(&tree, class_name, failing);
    let paths = tree.method_paths(class_name, |m| {
        whole_class || failing.iter().any(|f| m.answers_to(&f.method))
    });
    paths.into_iter().fold(tree, |tree, path| {
        tree.update_method(&path.module_id, &path.class_id, &path.method_id, |method| {
            ledger.record(method, outcome, details.clone())
        })
    })
}

/// `true` when there are failures and none of them names a stored method
/// of `class_name`.
fn names_no_method(tree: &TestTree, class_name: &str, failures: &[FailureDetail]) -> bool {
    !failures.is_empty()
        && tree
            .method_paths(class_name, |m| failures.iter().any(|f| m.answers_to(&f.method)))
            .is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fixed::SteppingClock;
    use crate::graph::fixtures::sample_tree;

    const CALC: &str = "com.example.CalcTest";
    const CALC_ID: &str = "core/com.example.CalcTest";

    fn failure(method: &str) -> FailureDetail {
        FailureDetail {
            method: method.to_string(),
            message: "expected:<4> but was:<5>".to_string(),
            stacktrace: "at CalcTest.adds(CalcTest.kt:12)".to_string(),
        }
    }

    #[test]
    fn failing_and_passing_methods_are_told_apart() {
        let clock = SteppingClock::starting_at("2025-03-01T12:00:00Z");
        let ledger = ExecutionLedger::new(&clock);
        let report = ExecutionReport { class_name: CALC.into(), failures: vec![failure("adds")] };

        let tree = record_execution(sample_tree(), &ledger, CALC, &report, 120);

        let adds = tree.find_method("core", CALC_ID, "adds").unwrap();
        let last = adds.last_execution.as_ref().unwrap();
        assert_eq!(last.outcome, ExecutionOutcome::Failure);
        assert_eq!(last.duration_ms, 120);
        assert_eq!(last.error_message.as_deref(), Some("expected:<4> but was:<5>"));

        let divides = tree.find_method("core", CALC_ID, "divides").unwrap();
        assert_eq!(divides.last_execution.as_ref().unwrap().outcome, ExecutionOutcome::Success);

        let parses = tree.find_method("core", "core/com.example.ParserTest", "parses").unwrap();
        assert!(parses.execution_history.is_empty());
    }

    #[test]
    fn display_names_match_reported_failures() {
        let clock = SteppingClock::starting_at("2025-03-01T12:00:00Z");
        let ledger = ExecutionLedger::new(&clock);
        let report =
            ExecutionReport { class_name: CALC.into(), failures: vec![failure("divides()")] };

        let tree = record_execution(sample_tree(), &ledger, CALC, &report, 5);

        let divides = tree.find_method("core", CALC_ID, "divides").unwrap();
        assert_eq!(divides.last_execution.as_ref().unwrap().outcome, ExecutionOutcome::Failure);
    }

    #[test]
    fn remediation_lands_only_on_failing_methods() {
        let clock = SteppingClock::starting_at("2025-03-01T12:00:00Z");
        let ledger = RemediationLedger::new(&clock);
        let details = RemediationDetails {
            workspace_path: "/p/.mend/remediation/CalcTest_adds_x".into(),
            duration_ms: 900,
            ..RemediationDetails::default()
        };

        let tree = record_remediation(
            sample_tree(),
            &ledger,
            CALC,
            &[failure("adds")],
            RemediationOutcome::Success,
            &details,
        );

        let adds = tree.find_method("core", CALC_ID, "adds").unwrap();
        assert_eq!(adds.remediation_history.len(), 1);
        assert_eq!(adds.last_remediation.as_ref().unwrap().workspace_path, details.workspace_path);
        assert!(tree.find_method("core", CALC_ID, "divides").unwrap().remediation_history.is_empty());
    }

    #[test]
    fn class_level_failure_fails_every_method() {
        let clock = SteppingClock::starting_at("2025-03-01T12:00:00Z");
        let ledger = ExecutionLedger::new(&clock);
        let crash = FailureDetail {
            method: "CalcTest".to_string(),
            message: "test command exited with status 1".to_string(),
            stacktrace: "BUILD FAILURE".to_string(),
        };
        let report = ExecutionReport { class_name: CALC.into(), failures: vec![crash] };

        let tree = record_execution(sample_tree(), &ledger, CALC, &report, 40);

        for id in ["adds", "divides"] {
            let method = tree.find_method("core", CALC_ID, id).unwrap();
            let last = method.last_execution.as_ref().unwrap();
            assert_eq!(last.outcome, ExecutionOutcome::Failure);
            assert_eq!(last.error_message.as_deref(), Some("test command exited with status 1"));
            assert_eq!(last.stack_trace.as_deref(), Some("BUILD FAILURE"));
            assert!(crate::ledger::requires_remediation(method));
        }
        let parses = tree.find_method("core", "core/com.example.ParserTest", "parses").unwrap();
        assert!(parses.execution_history.is_empty());
    }

    #[test]
    fn class_level_failure_records_remediation_on_every_method() {
        let clock = SteppingClock::starting_at("2025-03-01T12:00:00Z");
        let ledger = RemediationLedger::new(&clock);

        let tree = record_remediation(
            sample_tree(),
            &ledger,
            CALC,
            &[failure("CalcTest")],
            RemediationOutcome::Failure,
            &RemediationDetails::default(),
        );

        for id in ["adds", "divides"] {
            let method = tree.find_method("core", CALC_ID, id).unwrap();
            assert_eq!(method.remediation_history.len(), 1);
        }
    }

    #[test]
    fn no_failures_records_no_remediation() {
        let clock = SteppingClock::starting_at("2025-03-01T12:00:00Z");
        let ledger = RemediationLedger::new(&clock);
        let tree = record_remediation(
            sample_tree(),
            &ledger,
            CALC,
            &[],
            RemediationOutcome::Success,
            &RemediationDetails::default(),
        );
        assert_eq!(tree, sample_tree());
    }

    #[test]
    fn unknown_class_leaves_tree_untouched() {
        let clock = SteppingClock::starting_at("2025-03-01T12:00:00Z");
        let ledger = ExecutionLedger::new(&clock);
        let report = ExecutionReport { class_name: "com.example.Gone".into(), failures: vec![] };
        let tree = record_execution(sample_tree(), &ledger, "com.example.Gone", &report, 1);
        assert_eq!(tree, sample_tree());
    }
}
