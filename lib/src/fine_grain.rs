//! Fine-grain refinement driven by the external estimators.
//!
//! After a baseline where every application is sized by the estimator at its
//! current deadline, the time left unused by all applications (the total
//! residual) is offered to each application in turn. The application whose
//! estimate saves the most weighted cores takes it, its deadline becomes the
//! simulated runtime, and it leaves the active set. Applications that cannot
//! save cores leave the active set as well, so the loop ends after at most
//! one pass per application.
use log::{debug, info};
use std::collections::BTreeSet;

use crate::{
    application::TimeInstant,
    error::{OptError, OptResult},
    oracle::ResourceOracle,
    output_log::ResultLog,
    process::Process,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FineGrainReport {
    pub passes: usize,
    pub improvements: usize,
    pub total_residual: TimeInstant,
    /// Size of the active set at the end of each pass.
    pub active_set_sizes: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    new_number_of_cores: u32,
    gain: f64,
}

/// Sizes every application at its current deadline and returns the total
/// residual time.
fn compute_baseline(
    process: &mut Process,
    oracle: &mut impl ResourceOracle,
) -> OptResult<TimeInstant> {
    let mut total_residual_time = 0.0;
    for index in 0..process.number_of_applications() {
        debug!("Analysis application n. {}", index);
        let application = process.application(index);
        let deadline = application.deadline();
        let number_of_cores = oracle.estimate_cores(application, deadline)?;
        debug!("Number of cores: {}", number_of_cores);
        process.application_mut(index).set_number_of_cores(number_of_cores);

        let execution_time = oracle.simulate_runtime(process.application(index), number_of_cores)?;
        let residual_time = deadline - execution_time;
        total_residual_time += residual_time;
        debug!(
            "Execution time: {}, deadline: {}, residual time: {}, total residual time: {}",
            execution_time, deadline, residual_time, total_residual_time
        );
    }
    Ok(total_residual_time)
}

/// One scan of the active set. Applications that cannot save cores with the
/// extra residual time are removed from `active_set`.
fn find_best_candidate(
    process: &Process,
    oracle: &mut impl ResourceOracle,
    active_set: &mut BTreeSet<usize>,
    total_residual_time: TimeInstant,
) -> OptResult<Option<Candidate>> {
    let mut best: Option<Candidate> = None;
    let indices: Vec<usize> = active_set.iter().copied().collect();
    for index in indices {
        let application = process.application(index);
        let inflated_deadline = application.deadline() + total_residual_time;
        debug!(
            "Considering application index {}: deadline input (deadline + total residual): {}",
            index, inflated_deadline
        );
        let new_number_of_cores = oracle.estimate_cores(application, inflated_deadline)?;
        let current_number_of_cores = application.number_of_cores();

        if new_number_of_cores < current_number_of_cores {
            let gain = application.weight()
                * (new_number_of_cores as f64 - current_number_of_cores as f64);
            if best.map_or(true, |candidate| gain < candidate.gain) {
                debug!("Found new best {}", gain);
                best = Some(Candidate {
                    index,
                    new_number_of_cores,
                    gain,
                });
            }
        } else {
            debug!("Application {} removed", index);
            active_set.remove(&index);
        }
    }
    Ok(best)
}

pub fn fine_grain(
    process: &mut Process,
    oracle: &mut impl ResourceOracle,
    result_log: &mut ResultLog,
) -> OptResult<FineGrainReport> {
    info!("FineGrain > Starting process");

    let mut report = FineGrainReport::default();
    let mut total_residual_time = compute_baseline(process, oracle)?;
    result_log.write_snapshot(process, "Fine grain baseline");

    let mut active_set: BTreeSet<usize> = (0..process.number_of_applications()).collect();

    while !active_set.is_empty() {
        debug!("Iteration index: {}", report.passes);
        let best =
            find_best_candidate(process, oracle, &mut active_set, total_residual_time)?;

        if let Some(candidate) = best {
            info!(
                "New improvement found for application index: {}",
                candidate.index
            );
            process
                .application_mut(candidate.index)
                .set_number_of_cores(candidate.new_number_of_cores);
            let application = process.application(candidate.index);
            let deadline = application.deadline();
            let execution_time =
                oracle.simulate_runtime(application, candidate.new_number_of_cores)?;

            if deadline > execution_time {
                return Err(OptError::Consistency(format!(
                    "new execution time {} of application '{}' is smaller than its current \
                     deadline {}: error in residual time computation",
                    execution_time,
                    application.id(),
                    deadline
                )));
            }

            total_residual_time -= (execution_time - deadline).abs();
            process
                .application_mut(candidate.index)
                .set_deadline(execution_time);
            active_set.remove(&candidate.index);
            report.improvements += 1;

            debug!(
                "New deadline for application: {}, new total residual time: {}",
                execution_time, total_residual_time
            );
            info!(
                "[Current Result] Iteration Index: {}; Global Objective Function: {}; FineGrain",
                report.passes,
                process.global_objective()
            );
            result_log.write_snapshot(process, "Fine grain");
        }

        report.active_set_sizes.push(active_set.len());
        report.passes += 1;
    }

    report.total_residual = total_residual_time;
    info!(
        "FineGrain > End process ({} passes, {} improvements)",
        report.passes, report.improvements
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_helper::{create_application, create_process, FnOracle, ModelOracle};

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_fine_grain_constant_estimator_changes_nothing() {
        let mut process = create_process(
            300.0,
            vec![
                create_application("a", 1.0, 0.0, 100.0, 120.0),
                create_application("b", 2.0, 0.0, 100.0, 180.0),
            ],
        );
        let mut oracle = FnOracle::new(|_, _| Ok(8), |_, _| Ok(40.0));
        let mut result_log = ResultLog::new();
        let report = fine_grain(&mut process, &mut oracle, &mut result_log).unwrap();

        assert_eq!(report.passes, 1);
        assert_eq!(report.improvements, 0);
        assert_eq!(report.active_set_sizes, vec![0]);
        assert_eq!(report.total_residual, (120.0 - 40.0) + (180.0 - 40.0));
        assert_eq!(process.application(0).deadline(), 120.0);
        assert_eq!(process.application(1).deadline(), 180.0);
        assert_eq!(process.application(0).number_of_cores(), 8);
        assert_eq!(process.application(1).number_of_cores(), 8);
        assert_eq!(result_log.snapshots.len(), 1);
        assert_eq!(result_log.snapshots[0].label, "Fine grain baseline");
        // Baseline calls plus one estimate per application in the single pass.
        assert_eq!(oracle.estimate_calls, 4);
        assert_eq!(oracle.simulate_calls, 2);
    }

    #[test]
    fn test_fine_grain_single_improvement() {
        let mut process = create_process(
            190.0,
            vec![
                create_application("a", 1.0, 0.0, 1000.0, 100.0),
                create_application("b", 2.0, 0.0, 1000.0, 90.0),
            ],
        );
        let mut oracle = ModelOracle::default();
        let mut result_log = ResultLog::new();
        let report = fine_grain(&mut process, &mut oracle, &mut result_log).unwrap();

        assert_eq!(report.passes, 1);
        assert_eq!(report.improvements, 1);
        assert_eq!(process.application(0).number_of_cores(), 10);
        assert_eq!(process.application(0).deadline(), 100.0);
        assert_eq!(process.application(1).number_of_cores(), 11);
        assert!((process.application(1).deadline() - 1000.0 / 11.0).abs() < EPSILON);
        let expected_residual = (90.0 - 1000.0 / 12.0) - (1000.0 / 11.0 - 90.0);
        assert!((report.total_residual - expected_residual).abs() < EPSILON);
        assert_eq!(result_log.snapshots.len(), 2);
        assert_eq!(result_log.snapshots[1].label, "Fine grain");
        assert_eq!(result_log.snapshots[1].global_objective, 32.0);
    }

    #[test]
    fn test_fine_grain_picks_largest_weighted_saving_first() {
        let mut process = create_process(
            240.0,
            vec![
                create_application("a", 1.0, 0.0, 1000.0, 100.0),
                create_application("b", 2.0, 0.0, 1000.0, 90.0),
                create_application("c", 3.0, 0.0, 600.0, 50.0),
            ],
        );
        let mut oracle = ModelOracle::default();
        let mut result_log = ResultLog::new();
        let initial_objective = 10.0 + 2.0 * 12.0 + 3.0 * 12.0;
        let report = fine_grain(&mut process, &mut oracle, &mut result_log).unwrap();

        assert_eq!(result_log.snapshots[0].global_objective, initial_objective);
        assert_eq!(report.passes, 2);
        assert_eq!(report.improvements, 2);
        assert_eq!(report.active_set_sizes, vec![1, 0]);
        // "c" saves 3 weighted cores in the first pass, "b" saves 2 in the second.
        let objectives: Vec<f64> = result_log
            .snapshots
            .iter()
            .map(|snapshot| snapshot.global_objective)
            .collect();
        assert_eq!(objectives, vec![70.0, 67.0, 65.0]);
        assert_eq!(process.application(0).number_of_cores(), 10);
        assert_eq!(process.application(1).number_of_cores(), 11);
        assert_eq!(process.application(2).number_of_cores(), 11);
        assert!((process.application(2).deadline() - 600.0 / 11.0).abs() < EPSILON);
        assert!((process.application(1).deadline() - 1000.0 / 11.0).abs() < EPSILON);
    }

    #[test]
    fn test_fine_grain_terminates_within_number_of_applications() {
        let mut process = create_process(
            5000.0,
            (0..6)
                .map(|i| {
                    create_application(
                        &format!("app_{}", i),
                        1.0 + i as f64,
                        50.0 * i as f64,
                        4000.0 + 700.0 * i as f64,
                        500.0 + 60.0 * i as f64,
                    )
                })
                .collect(),
        );
        let mut oracle = ModelOracle::default();
        let mut result_log = ResultLog::new();
        let report = fine_grain(&mut process, &mut oracle, &mut result_log).unwrap();

        assert!(report.passes <= 6);
        let mut previous = 6;
        for size in report.active_set_sizes.iter() {
            assert!(*size < previous);
            previous = *size;
        }
        assert_eq!(report.active_set_sizes.last(), Some(&0));
    }

    #[test]
    fn test_fine_grain_inconsistent_simulator() {
        let mut process = create_process(
            100.0,
            vec![create_application("a", 1.0, 0.0, 100.0, 100.0)],
        );
        let mut oracle = FnOracle::new(
            |app, deadline| Ok(if deadline > app.deadline() { 5 } else { 10 }),
            |_, cores| Ok(if cores == 10 { 80.0 } else { 50.0 }),
        );
        let mut result_log = ResultLog::new();
        let result = fine_grain(&mut process, &mut oracle, &mut result_log);

        assert!(matches!(result, Err(OptError::Consistency(_))));
        // Mutations applied before the failure are kept.
        assert_eq!(process.application(0).number_of_cores(), 5);
    }

    #[test]
    fn test_fine_grain_propagates_oracle_failure() {
        let mut process = create_process(
            100.0,
            vec![create_application("a", 1.0, 0.0, 100.0, 100.0)],
        );
        let mut oracle = FnOracle::new(
            |_, _| Err(OptError::Parse("Parsing error of OPT_IC output".to_string())),
            |_, _| Ok(1.0),
        );
        let mut result_log = ResultLog::new();
        assert!(matches!(
            fine_grain(&mut process, &mut oracle, &mut result_log),
            Err(OptError::Parse(_))
        ));
        assert!(result_log.snapshots.is_empty());
    }
}
