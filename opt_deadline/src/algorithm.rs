use std::fmt;

use lib::{
    coarse_grain::coarse_grain,
    error::OptResult,
    fine_grain::fine_grain,
    initial_solution_fa::initial_solution_fa,
    initial_solution_sa::initial_solution_sa,
    oracle::ResourceOracle,
    output_log::ResultLog,
    process::Process,
};
use log::{error, info};

use crate::outputs_result::RunResult;

pub trait Algorithm {
    fn name(&self) -> &'static str;

    fn run<O: ResourceOracle>(
        &self,
        process: &mut Process,
        oracle: &mut O,
        result_log: &mut ResultLog,
    ) -> OptResult<()>;

    /// Runs the pipeline and reports success instead of the error, which is
    /// logged.
    fn process<O: ResourceOracle>(
        &self,
        process: &mut Process,
        oracle: &mut O,
        result_log: &mut ResultLog,
    ) -> RunResult {
        info!("{} > Starting", self.name());
        let status = match self.run(process, oracle, result_log) {
            Ok(()) => {
                info!(
                    "{} > Completed with global objective function: {}",
                    self.name(),
                    process.global_objective()
                );
                true
            }
            Err(err) => {
                error!("{} > {}", self.name(), err);
                false
            }
        };
        RunResult {
            algorithm: self.name().to_string(),
            status,
            global_objective: process.global_objective(),
        }
    }
}

/// Slack-balanced initialization followed by the fine-grain refinement.
pub struct AlgorithmA;

impl Algorithm for AlgorithmA {
    fn name(&self) -> &'static str {
        "Algorithm1"
    }

    fn run<O: ResourceOracle>(
        &self,
        process: &mut Process,
        oracle: &mut O,
        result_log: &mut ResultLog,
    ) -> OptResult<()> {
        initial_solution_sa(process)?;
        result_log.write_snapshot(process, "Initial solution SA");
        fine_grain(process, oracle, result_log)?;
        Ok(())
    }
}

/// Fair-share initialization, then the pairwise coarse search, then the
/// fine-grain refinement.
pub struct AlgorithmB;

impl Algorithm for AlgorithmB {
    fn name(&self) -> &'static str {
        "Algorithm2"
    }

    fn run<O: ResourceOracle>(
        &self,
        process: &mut Process,
        oracle: &mut O,
        result_log: &mut ResultLog,
    ) -> OptResult<()> {
        initial_solution_fa(process)?;
        result_log.write_snapshot(process, "Initial solution FA");
        let report = coarse_grain(process)?;
        info!(
            "CoarseGrain applied {} moves in {} rounds",
            report.applied_moves, report.rounds
        );
        result_log.write_snapshot(process, "Coarse grain solution");
        fine_grain(process, oracle, result_log)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmSelection {
    AlgorithmA,
    AlgorithmB,
    Both,
}

impl AlgorithmSelection {
    pub fn from_flags(algorithm_1: bool, algorithm_2: bool) -> Option<Self> {
        match (algorithm_1, algorithm_2) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::AlgorithmA),
            (false, true) => Some(Self::AlgorithmB),
            (false, false) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AlgorithmA => "Algorithm1",
            Self::AlgorithmB => "Algorithm2",
            Self::Both => "Algorithm12",
        }
    }
}

impl fmt::Display for AlgorithmSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Runs the selected algorithms on `process`. With both selected, the second
/// one only starts after the first succeeded.
pub fn run_algorithms<O: ResourceOracle>(
    selection: AlgorithmSelection,
    process: &mut Process,
    oracle: &mut O,
    result_log: &mut ResultLog,
) -> Vec<RunResult> {
    match selection {
        AlgorithmSelection::AlgorithmA => vec![AlgorithmA.process(process, oracle, result_log)],
        AlgorithmSelection::AlgorithmB => vec![AlgorithmB.process(process, oracle, result_log)],
        AlgorithmSelection::Both => {
            let first = AlgorithmA.process(process, oracle, result_log);
            if !first.status {
                return vec![first];
            }
            let second = AlgorithmB.process(process, oracle, result_log);
            vec![first, second]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib::application::Stage;
    use lib::error::OptError;
    use lib::tests_helper::{create_application, create_process, FnOracle, ModelOracle};

    fn create_stage(avg_time: f64) -> Stage {
        Stage {
            name: "S0".to_string(),
            avg_time,
            number_of_tasks: 4,
        }
    }

    fn create_sample_process() -> Process {
        create_process(
            300.0,
            vec![
                create_application("a", 1.0, 0.0, 1000.0, 0.0).with_stages(vec![create_stage(100.0)]),
                create_application("b", 2.0, 0.0, 1000.0, 0.0).with_stages(vec![create_stage(200.0)]),
            ],
        )
    }

    fn labels(result_log: &ResultLog) -> Vec<&str> {
        result_log
            .snapshots
            .iter()
            .map(|snapshot| snapshot.label.as_str())
            .collect()
    }

    #[test]
    fn test_algorithm_selection_from_flags() {
        assert_eq!(
            AlgorithmSelection::from_flags(true, false),
            Some(AlgorithmSelection::AlgorithmA)
        );
        assert_eq!(
            AlgorithmSelection::from_flags(false, true),
            Some(AlgorithmSelection::AlgorithmB)
        );
        assert_eq!(
            AlgorithmSelection::from_flags(true, true),
            Some(AlgorithmSelection::Both)
        );
        assert_eq!(AlgorithmSelection::from_flags(false, false), None);
        assert_eq!(AlgorithmSelection::Both.to_string(), "Algorithm12");
    }

    #[test]
    fn test_algorithm_a_milestones() {
        let mut process = create_sample_process();
        let mut oracle = ModelOracle::default();
        let mut result_log = ResultLog::new();
        let result = AlgorithmA.process(&mut process, &mut oracle, &mut result_log);

        assert!(result.status);
        assert_eq!(result.algorithm, "Algorithm1");
        assert_eq!(result.global_objective, process.global_objective());
        let labels = labels(&result_log);
        assert_eq!(labels[0], "Initial solution SA");
        assert_eq!(labels[1], "Fine grain baseline");
        assert!(labels[2..].iter().all(|label| *label == "Fine grain"));
        for app in process.applications() {
            assert!(app.number_of_cores() > 0);
        }
    }

    #[test]
    fn test_algorithm_b_milestones() {
        let mut process = create_sample_process();
        let mut oracle = ModelOracle::default();
        let mut result_log = ResultLog::new();
        let result = AlgorithmB.process(&mut process, &mut oracle, &mut result_log);

        assert!(result.status);
        assert_eq!(result.algorithm, "Algorithm2");
        let labels = labels(&result_log);
        assert_eq!(labels[0], "Initial solution FA");
        assert_eq!(labels[1], "Coarse grain solution");
        assert_eq!(labels[2], "Fine grain baseline");
        // The fair share gives deadlines 100 and 200.
        assert_eq!(result_log.snapshots[0].applications[0].deadline, 100.0);
        assert_eq!(result_log.snapshots[0].applications[1].deadline, 200.0);
    }

    #[test]
    fn test_algorithm_a_infeasible_deadline_fails() {
        let mut process = create_process(
            100.0,
            vec![
                create_application("a", 1.0, 80.0, 1000.0, 0.0),
                create_application("b", 1.0, 60.0, 1000.0, 0.0),
            ],
        );
        let mut oracle = ModelOracle::default();
        let mut result_log = ResultLog::new();
        let result = AlgorithmA.process(&mut process, &mut oracle, &mut result_log);

        assert!(!result.status);
        assert!(result_log.snapshots.is_empty());
        assert_eq!(oracle.estimate_calls, 0);
    }

    #[test]
    fn test_run_both_stops_after_failure() {
        let mut process = create_sample_process();
        let mut oracle = FnOracle::new(
            |_, _| Err(OptError::Parse("Parsing error of OPT_IC output".to_string())),
            |_, _| Ok(1.0),
        );
        let mut result_log = ResultLog::new();
        let results = run_algorithms(
            AlgorithmSelection::Both,
            &mut process,
            &mut oracle,
            &mut result_log,
        );

        assert_eq!(results.len(), 1);
        assert!(!results[0].status);
        assert_eq!(labels(&result_log), vec!["Initial solution SA"]);
    }

    #[test]
    fn test_run_both_runs_second_after_success() {
        let mut process = create_sample_process();
        let mut oracle = ModelOracle::default();
        let mut result_log = ResultLog::new();
        let results = run_algorithms(
            AlgorithmSelection::Both,
            &mut process,
            &mut oracle,
            &mut result_log,
        );

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|result| result.status));
        assert_eq!(results[1].algorithm, "Algorithm2");
        assert!(labels(&result_log).contains(&"Initial solution FA"));
    }
}
