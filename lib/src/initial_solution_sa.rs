//! Slack-balanced initial allocation.
//!
//! Every application is sized against the first one (the reference) so that
//! the marginal cost of shortening any deadline is the same for all of them.
//! The resulting core counts give closed-form deadlines.
use log::{debug, info};

use crate::{
    application::Application,
    error::{OptError, OptResult},
    process::Process,
};

const INDEX_APP_REF: usize = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct SlackBalancedSolution {
    pub alpha: Vec<f64>,
    pub n1: f64,
    /// Fractional core count of each application.
    pub number_of_cores: Vec<f64>,
}

fn compute_alpha(application: &Application, reference: &Application) -> f64 {
    ((reference.weight() * application.chi_c()) / (application.weight() * reference.chi_c())).sqrt()
}

fn compute_n1(alpha: &[f64], process: &Process) -> f64 {
    let (numerator, sum_chi_0) = process
        .applications()
        .iter()
        .zip(alpha)
        .fold((0.0, 0.0), |(numerator, sum_chi_0), (app, alpha_app)| {
            (numerator + app.chi_c() / alpha_app, sum_chi_0 + app.chi_0())
        });
    numerator / (process.total_deadline() - sum_chi_0)
}

/// Computes the slack-balanced core counts without touching the process.
pub fn compute_slack_balanced_solution(process: &Process) -> OptResult<SlackBalancedSolution> {
    if process.number_of_applications() <= INDEX_APP_REF {
        return Err(OptError::Infeasibility(
            "InitialSolution_SA: no applications to initialize".to_string(),
        ));
    }
    let reference = process.application(INDEX_APP_REF);
    let alpha: Vec<f64> = process
        .applications()
        .iter()
        .enumerate()
        .map(|(index, app)| {
            if index == INDEX_APP_REF {
                1.0
            } else {
                compute_alpha(app, reference)
            }
        })
        .collect();

    let n1 = compute_n1(&alpha, process);
    let number_of_cores: Vec<f64> = alpha
        .iter()
        .enumerate()
        .map(|(index, alpha_app)| if index == INDEX_APP_REF { n1 } else { alpha_app * n1 })
        .collect();

    for (index, n_app) in number_of_cores.iter().enumerate() {
        if !(*n_app > 0.0) || !n_app.is_finite() {
            return Err(OptError::Infeasibility(format!(
                "The number of cores (n) per application index {} (id_app: {}) has been estimated \
                 with a value of {} <= 0.0. The input deadline of the process is probably too \
                 small: the problem is unfeasible.",
                index,
                process.application(index).id(),
                n_app
            )));
        }
    }

    Ok(SlackBalancedSolution {
        alpha,
        n1,
        number_of_cores,
    })
}

/// Assigns every application the deadline its slack-balanced core count
/// achieves. Fails without mutating anything when some core count is not
/// positive.
pub fn initial_solution_sa(process: &mut Process) -> OptResult<SlackBalancedSolution> {
    info!("InitialSolution_SA > Starting initialization");
    let solution = compute_slack_balanced_solution(process)?;
    debug!("alpha: {:?}, n1: {}", solution.alpha, solution.n1);

    for (index, n_app) in solution.number_of_cores.iter().enumerate() {
        let application = process.application_mut(index);
        let deadline = application.deadline_for_cores(*n_app);
        debug!("Application index ({}) init deadline: {}", index, deadline);
        application.set_deadline(deadline);
    }

    info!("InitialSolution_SA > Initialization completed");
    Ok(solution)
}
