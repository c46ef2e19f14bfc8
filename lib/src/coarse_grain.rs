//! Coarse-grain local search.
//!
//! Each round evaluates, for every ordered pair of applications `(i, j)`,
//! moving `delta` of deadline from `i` to `j`. Core counts come from the
//! closed-form performance model. The cheapest improving move of the round is
//! applied; when no move improves, `delta` is halved. The search always runs
//! [`MAX_NUMBER_OF_ITERATIONS`] rounds.
//!
//! Core counts follow `(deadline - chi_0) / chi_c`, truncated. A move is
//! feasible only when neither application ends up with fewer cores than the
//! model assigns to its current deadline, so the shortened side rejects every
//! `delta` that crosses one of its `chi_c` steps.
use log::{debug, info};

use crate::{
    application::{Application, TimeInstant},
    error::{OptError, OptResult},
    process::Process,
};

pub const MAX_NUMBER_OF_ITERATIONS: usize = 1000;

/// A possible shift of deadline between two applications.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadlineShift {
    pub delta_deadline: f64,
    /// Index of the application whose deadline is reduced.
    pub app_reduce: usize,
    /// Index of the application whose deadline is incremented.
    pub app_increment: usize,
    pub evaluation_cost: f64,
    pub new_deadline_app_reduce: TimeInstant,
    pub new_deadline_app_increment: TimeInstant,
    pub new_number_of_cores_app_reduce: u32,
    pub new_number_of_cores_app_increment: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoarseGrainReport {
    pub rounds: usize,
    pub applied_moves: usize,
    pub final_delta: f64,
    /// Global objective after each applied move.
    pub objectives: Vec<f64>,
}

fn objective_function(app1: (&Application, u32), app2: (&Application, u32)) -> f64 {
    app1.0.cost(app1.1) + app2.0.cost(app2.1)
}

fn initialize_delta_deadline(process: &Process) -> f64 {
    process.total_deadline() / process.number_of_applications() as f64
}

/// Evaluates reducing the deadline of `app_reduce` and incrementing the
/// deadline of `app_increment` by `delta_deadline`. Returns `None` when the
/// shift is infeasible.
pub fn shift_deadline(
    process: &Process,
    app_reduce: usize,
    app_increment: usize,
    delta_deadline: f64,
) -> Option<DeadlineShift> {
    let app_i = process.application(app_reduce);
    let app_j = process.application(app_increment);
    let deadline_i = app_i.deadline();
    let deadline_j = app_j.deadline();

    let ncores_i = app_i.cores_for_deadline(deadline_i);
    let ncores_j = app_j.cores_for_deadline(deadline_j);
    if ncores_i <= 0 || ncores_j <= 0 {
        return None;
    }

    let new_deadline_i = deadline_i - delta_deadline;
    let new_deadline_j = deadline_j + delta_deadline;
    let new_ncores_i = app_i.cores_for_deadline(new_deadline_i);
    let new_ncores_j = app_j.cores_for_deadline(new_deadline_j);

    if new_ncores_i < ncores_i || new_ncores_j < ncores_j {
        return None;
    }
    let new_ncores_i = u32::try_from(new_ncores_i).ok()?;
    let new_ncores_j = u32::try_from(new_ncores_j).ok()?;

    Some(DeadlineShift {
        delta_deadline,
        app_reduce,
        app_increment,
        evaluation_cost: objective_function((app_i, new_ncores_i), (app_j, new_ncores_j)),
        new_deadline_app_reduce: new_deadline_i,
        new_deadline_app_increment: new_deadline_j,
        new_number_of_cores_app_reduce: new_ncores_i,
        new_number_of_cores_app_increment: new_ncores_j,
    })
}

/// Collects the feasible shifts of one round that lower the cost of their
/// pair.
fn find_improving_shifts(process: &Process, delta_deadline: f64) -> Vec<DeadlineShift> {
    let num_of_apps = process.number_of_applications();
    let mut possible_solutions = Vec::new();
    for i in 0..num_of_apps {
        for j in 0..num_of_apps {
            if i == j {
                continue;
            }
            let app_i = process.application(i);
            let app_j = process.application(j);
            let evaluation_before = objective_function(
                (app_i, app_i.number_of_cores()),
                (app_j, app_j.number_of_cores()),
            );
            debug!(
                "Pair ({}, {}): evaluation before deadline movements: {}",
                i, j, evaluation_before
            );
            match shift_deadline(process, i, j, delta_deadline) {
                Some(shift) => {
                    debug!(
                        "Pair ({}, {}): evaluation after deadline movements: {}",
                        i, j, shift.evaluation_cost
                    );
                    if shift.evaluation_cost < evaluation_before {
                        possible_solutions.push(shift);
                    }
                }
                None => debug!(
                    "Pair ({}, {}): shift lowers a core count, solution discarded",
                    i, j
                ),
            }
        }
    }
    possible_solutions
}

fn apply_shift(process: &mut Process, shift: &DeadlineShift) {
    info!(
        "Application '{}' increases deadline to {} (before was {}), application '{}' decreases \
         deadline to {} (before was {})",
        process.application(shift.app_increment).id(),
        shift.new_deadline_app_increment,
        process.application(shift.app_increment).deadline(),
        process.application(shift.app_reduce).id(),
        shift.new_deadline_app_reduce,
        process.application(shift.app_reduce).deadline(),
    );
    let app_reduce = process.application_mut(shift.app_reduce);
    app_reduce.set_deadline(shift.new_deadline_app_reduce);
    app_reduce.set_number_of_cores(shift.new_number_of_cores_app_reduce);
    let app_increment = process.application_mut(shift.app_increment);
    app_increment.set_deadline(shift.new_deadline_app_increment);
    app_increment.set_number_of_cores(shift.new_number_of_cores_app_increment);
}

pub fn coarse_grain(process: &mut Process) -> OptResult<CoarseGrainReport> {
    info!("CoarseGrain > Starting process");
    if process.number_of_applications() == 0 {
        return Err(OptError::Infeasibility(
            "CoarseGrain: no applications to process".to_string(),
        ));
    }

    let mut report = CoarseGrainReport::default();
    let mut delta_deadline = initialize_delta_deadline(process);

    while report.rounds < MAX_NUMBER_OF_ITERATIONS {
        debug!(
            "Iteration number: {}, delta deadline: {}",
            report.rounds, delta_deadline
        );
        let possible_solutions = find_improving_shifts(process, delta_deadline);

        let best = possible_solutions.iter().fold(None, |best: Option<&DeadlineShift>, shift| {
            match best {
                Some(current) if current.evaluation_cost <= shift.evaluation_cost => Some(current),
                _ => Some(shift),
            }
        });

        match best {
            Some(shift) => {
                apply_shift(process, shift);
                report.applied_moves += 1;
                let objective = process.global_objective();
                report.objectives.push(objective);
                info!(
                    "[Current Result] Iteration Index: {}; Global Objective Function: {}; CoarseGrain",
                    report.rounds, objective
                );
            }
            None => {
                debug!("No better solution. Decreasing delta deadline");
                delta_deadline /= 2.0;
            }
        }
        report.rounds += 1;
    }

    report.final_delta = delta_deadline;
    info!(
        "CoarseGrain > End process ({} moves applied)",
        report.applied_moves
    );
    Ok(report)
}
