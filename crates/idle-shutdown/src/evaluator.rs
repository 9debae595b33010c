use derive_more::Display;

use crate::device::DeviceQuery;
use crate::device::DeviceSnapshot;
use crate::device::ProcessSample;
use crate::error::IdleResult;
use crate::matcher::NameMatcher;

/// Idle/busy classification of the whole GPU set for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Verdict {
    #[display("idle")]
    Idle,
    #[display("busy")]
    Busy,
}

/// Reduces per-device process lists to a single [`Verdict`].
///
/// The GPUs are idle when every running process on every device is ignored.
/// A device without processes never makes the set busy.
#[derive(Debug)]
pub struct IdleEvaluator<M> {
    matcher: M,
}

impl<M: NameMatcher> IdleEvaluator<M> {
    pub fn new(matcher: M) -> Self {
        Self { matcher }
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    /// Classify an already captured snapshot.
    pub fn evaluate(&self, snapshot: &DeviceSnapshot) -> Verdict {
        for (index, processes) in snapshot.devices.iter().enumerate() {
            if let Some(process) = self.first_busy(processes) {
                log_busy(index as u32, process);
                return Verdict::Busy;
            }
        }
        Verdict::Idle
    }

    /// Query devices one at a time and stop at the first busy one.
    pub fn poll<Q: DeviceQuery + ?Sized>(
        &self,
        query: &Q,
        device_count: u32,
    ) -> IdleResult<Verdict> {
        for index in 0..device_count {
            let processes = query.running_processes(index)?;
            if let Some(process) = self.first_busy(&processes) {
                log_busy(index, process);
                return Ok(Verdict::Busy);
            }
        }
        Ok(Verdict::Idle)
    }

    fn first_busy<'a>(&self, processes: &'a [ProcessSample]) -> Option<&'a ProcessSample> {
        processes.iter().find(|p| !self.matcher.is_match(&p.name))
    }
}

fn log_busy(index: u32, process: &ProcessSample) {
    tracing::debug!(
        device = index,
        pid = process.pid,
        kind = %process.kind,
        "GPU {} is used by {:?}",
        index,
        process.name
    );
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use error_stack::Report;
    use similar_asserts::assert_eq;

    use super::*;
    use crate::device::ProcessKind;
    use crate::error::IdleError;
    use crate::matcher::IgnoreList;
    use crate::matcher::PatternSyntax;

    fn evaluator(patterns: &[&str]) -> IdleEvaluator<IgnoreList> {
        IdleEvaluator::new(
            IgnoreList::compile(patterns, PatternSyntax::Regex).expect("patterns should compile"),
        )
    }

    fn process(name: &str, pid: u32) -> ProcessSample {
        ProcessSample::new(name, pid, ProcessKind::Graphics)
    }

    /// Serves a fixed snapshot and records which devices were asked for.
    struct RecordingQuery {
        snapshot: DeviceSnapshot,
        queried: RefCell<Vec<u32>>,
        failing_device: Option<u32>,
    }

    impl RecordingQuery {
        fn new(devices: Vec<Vec<ProcessSample>>) -> Self {
            Self {
                snapshot: DeviceSnapshot::new(devices),
                queried: RefCell::new(Vec::new()),
                failing_device: None,
            }
        }
    }

    impl DeviceQuery for RecordingQuery {
        fn device_count(&self) -> IdleResult<u32> {
            Ok(self.snapshot.device_count() as u32)
        }

        fn running_processes(&self, index: u32) -> IdleResult<Vec<ProcessSample>> {
            self.queried.borrow_mut().push(index);
            if self.failing_device == Some(index) {
                return Err(Report::new(IdleError::DeviceQuery { index }));
            }
            Ok(self.snapshot.devices[index as usize].clone())
        }
    }

    #[test]
    fn ignored_display_server_is_idle() {
        let snapshot = DeviceSnapshot::new(vec![vec![process("Xorg", 1201)], vec![]]);

        assert_eq!(evaluator(&["Xorg"]).evaluate(&snapshot), Verdict::Idle);
    }

    #[test]
    fn pattern_case_mismatch_is_busy() {
        let snapshot = DeviceSnapshot::new(vec![vec![process("Xorg", 1201)], vec![]]);

        assert_eq!(evaluator(&["xorg"]).evaluate(&snapshot), Verdict::Busy);
    }

    #[test]
    fn no_processes_is_idle() {
        let evaluator = evaluator(&[]);

        assert_eq!(evaluator.evaluate(&DeviceSnapshot::default()), Verdict::Idle);
        assert_eq!(
            evaluator.evaluate(&DeviceSnapshot::new(vec![vec![], vec![], vec![]])),
            Verdict::Idle
        );
    }

    #[test]
    fn one_workload_anywhere_is_busy() {
        let snapshot = DeviceSnapshot::new(vec![
            vec![process("Xorg", 1201), process("gnome-shell", 1302)],
            vec![],
            vec![
                process("Xorg", 1201),
                ProcessSample::new("python3", 4410, ProcessKind::Compute)
                    .with_memory_used(2_147_483_648),
            ],
        ]);

        assert_eq!(
            evaluator(&["Xorg", "gnome-shell"]).evaluate(&snapshot),
            Verdict::Busy
        );
    }

    #[test]
    fn evaluation_is_repeatable() {
        let evaluator = evaluator(&["Xorg"]);
        let idle = DeviceSnapshot::new(vec![vec![process("Xorg", 1)]]);
        let busy = DeviceSnapshot::new(vec![vec![process("blender", 2)]]);

        assert_eq!(evaluator.evaluate(&idle), evaluator.evaluate(&idle));
        assert_eq!(evaluator.evaluate(&busy), evaluator.evaluate(&busy));
        assert_eq!(evaluator.evaluate(&idle), Verdict::Idle);
    }

    #[test]
    fn poll_stops_at_first_busy_device() {
        let query = RecordingQuery::new(vec![
            vec![process("Xorg", 1)],
            vec![process("blender", 2)],
            vec![process("python3", 3)],
        ]);

        let verdict = evaluator(&["Xorg"])
            .poll(&query, 3)
            .expect("query should succeed");

        assert_eq!(verdict, Verdict::Busy);
        assert_eq!(query.queried.into_inner(), vec![0, 1]);
    }

    #[test]
    fn poll_visits_every_device_when_idle() {
        let query = RecordingQuery::new(vec![vec![process("Xorg", 1)], vec![], vec![]]);

        let verdict = evaluator(&["Xorg"])
            .poll(&query, 3)
            .expect("query should succeed");

        assert_eq!(verdict, Verdict::Idle);
        assert_eq!(query.queried.into_inner(), vec![0, 1, 2]);
    }

    #[test]
    fn poll_propagates_query_error() {
        let mut query = RecordingQuery::new(vec![vec![], vec![], vec![]]);
        query.failing_device = Some(1);

        let err = evaluator(&[])
            .poll(&query, 3)
            .expect_err("device 1 should fail");

        assert!(matches!(
            err.current_context(),
            IdleError::DeviceQuery { index: 1 }
        ));
        assert_eq!(query.queried.into_inner(), vec![0, 1]);
    }

    #[test]
    fn capture_then_evaluate_matches_poll() {
        let query =
            RecordingQuery::new(vec![vec![process("Xorg", 1)], vec![process("blender", 2)]]);
        let evaluator = evaluator(&["Xorg"]);

        let snapshot = DeviceSnapshot::capture(&query, 2).expect("capture should succeed");

        assert_eq!(snapshot.device_count(), 2);
        assert_eq!(
            evaluator.evaluate(&snapshot),
            evaluator.poll(&query, 2).expect("poll should succeed")
        );
    }
}
