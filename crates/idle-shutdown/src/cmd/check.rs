use tracing::info;

use crate::config::CheckArgs;
use crate::device::DeviceQuery;
use crate::device::DeviceSnapshot;
use crate::error::IdleResult;
use crate::evaluator::IdleEvaluator;
use crate::evaluator::Verdict;
use crate::matcher::IgnoreList;
use crate::platform::NvmlDeviceQuery;

pub fn run_check(args: CheckArgs) -> IdleResult<()> {
    let evaluator = IdleEvaluator::new(args.ignore.compile()?);
    let query = NvmlDeviceQuery::init()?;

    check(&query, &evaluator)?;
    Ok(())
}

/// Capture every device, log each process and return the verdict.
pub fn check<Q: DeviceQuery + ?Sized>(
    query: &Q,
    evaluator: &IdleEvaluator<IgnoreList>,
) -> IdleResult<Verdict> {
    let device_count = query.device_count()?;
    let snapshot = DeviceSnapshot::capture(query, device_count)?;

    for (index, processes) in snapshot.devices.iter().enumerate() {
        info!("GPU {}: {} process(es)", index, processes.len());
        for process in processes {
            let memory = process
                .memory_used
                .map(|bytes| format!("{} MiB", bytes / (1024 * 1024)))
                .unwrap_or_else(|| "n/a".to_string());
            info!(
                "  pid={} name={:?} kind={} memory={} ignored={}",
                process.pid,
                process.name,
                process.kind,
                memory,
                evaluator.matcher().is_ignored(&process.name)
            );
        }
    }

    let verdict = evaluator.evaluate(&snapshot);
    info!("GPU verdict: {}", verdict);
    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::device::ProcessKind;
    use crate::device::ProcessSample;
    use crate::matcher::PatternSyntax;

    struct FixedQuery(Vec<Vec<ProcessSample>>);

    impl DeviceQuery for FixedQuery {
        fn device_count(&self) -> IdleResult<u32> {
            Ok(self.0.len() as u32)
        }

        fn running_processes(&self, index: u32) -> IdleResult<Vec<ProcessSample>> {
            Ok(self.0[index as usize].clone())
        }
    }

    fn evaluator(patterns: &[&str]) -> IdleEvaluator<IgnoreList> {
        IdleEvaluator::new(
            IgnoreList::compile(patterns, PatternSyntax::Regex).expect("patterns should compile"),
        )
    }

    #[test_log::test]
    fn reports_idle_when_only_ignored_processes_run() {
        let query = FixedQuery(vec![
            vec![ProcessSample::new("/usr/lib/xorg/Xorg", 1201, ProcessKind::Graphics)
                .with_memory_used(64 * 1024 * 1024)],
            vec![],
        ]);

        let verdict = check(&query, &evaluator(&["Xorg"])).expect("check should succeed");

        assert_eq!(verdict, Verdict::Idle);
    }

    #[test_log::test]
    fn reports_busy_for_unknown_process() {
        let query = FixedQuery(vec![vec![ProcessSample::new(
            "python3",
            4410,
            ProcessKind::Compute,
        )]]);

        let verdict = check(&query, &evaluator(&["Xorg"])).expect("check should succeed");

        assert_eq!(verdict, Verdict::Busy);
    }
}
