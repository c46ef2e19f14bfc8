//! Builders and deterministic oracles shared by the unit tests of the
//! workspace crates (enable the `test-helpers` feature).
use crate::{
    application::{Application, TimeInstant},
    error::{OptError, OptResult},
    oracle::ResourceOracle,
    process::Process,
};

pub fn create_application(
    id: &str,
    weight: f64,
    chi_0: f64,
    chi_c: f64,
    deadline: TimeInstant,
) -> Application {
    let mut app = Application::new(id, weight, chi_0, chi_c).unwrap();
    app.set_deadline(deadline);
    app
}

pub fn create_process(total_deadline: TimeInstant, applications: Vec<Application>) -> Process {
    let mut process = Process::new(total_deadline).unwrap();
    for application in applications {
        process.push_application(application);
    }
    process
}

/// Answers with the closed-form performance model of each application:
/// the smallest core count meeting the deadline, and `chi_0 + chi_c / cores`.
#[derive(Debug, Default)]
pub struct ModelOracle {
    pub estimate_calls: usize,
    pub simulate_calls: usize,
}

impl ResourceOracle for ModelOracle {
    fn estimate_cores(
        &mut self,
        application: &Application,
        deadline: TimeInstant,
    ) -> OptResult<u32> {
        self.estimate_calls += 1;
        let cores = (application.chi_c() / (deadline - application.chi_0())).ceil();
        if !(cores > 0.0) || !cores.is_finite() {
            return Err(OptError::Infeasibility(format!(
                "no core count meets deadline {} for '{}'",
                deadline,
                application.id()
            )));
        }
        Ok(cores as u32)
    }

    fn simulate_runtime(
        &mut self,
        application: &Application,
        cores: u32,
    ) -> OptResult<TimeInstant> {
        self.simulate_calls += 1;
        Ok(application.deadline_for_cores(cores as f64))
    }
}

type EstimateFn = Box<dyn FnMut(&Application, TimeInstant) -> OptResult<u32>>;
type SimulateFn = Box<dyn FnMut(&Application, u32) -> OptResult<TimeInstant>>;

/// Oracle answering through the given closures.
pub struct FnOracle {
    estimate: EstimateFn,
    simulate: SimulateFn,
    pub estimate_calls: usize,
    pub simulate_calls: usize,
}

impl FnOracle {
    pub fn new(
        estimate: impl FnMut(&Application, TimeInstant) -> OptResult<u32> + 'static,
        simulate: impl FnMut(&Application, u32) -> OptResult<TimeInstant> + 'static,
    ) -> Self {
        Self {
            estimate: Box::new(estimate),
            simulate: Box::new(simulate),
            estimate_calls: 0,
            simulate_calls: 0,
        }
    }
}

impl ResourceOracle for FnOracle {
    fn estimate_cores(
        &mut self,
        application: &Application,
        deadline: TimeInstant,
    ) -> OptResult<u32> {
        self.estimate_calls += 1;
        (self.estimate)(application, deadline)
    }

    fn simulate_runtime(
        &mut self,
        application: &Application,
        cores: u32,
    ) -> OptResult<TimeInstant> {
        self.simulate_calls += 1;
        (self.simulate)(application, cores)
    }
}
