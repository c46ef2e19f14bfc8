//! The allocation state shared by every optimization phase.
use std::path::{Path, PathBuf};

use crate::{
    application::{Application, TimeInstant},
    error::{OptError, OptResult},
    output_log::{ApplicationSnapshot, ProcessSnapshot},
};

/// Ordered, index-stable set of co-scheduled applications sharing one
/// end-to-end deadline. Phases receive it by `&mut` and mutate deadlines and
/// core counts in place; applications are never added or removed once an
/// optimization phase has started.
#[derive(Debug, Clone)]
pub struct Process {
    applications: Vec<Application>,
    total_deadline: TimeInstant,
    config_file: PathBuf,
}

impl Process {
    pub fn new(total_deadline: TimeInstant) -> OptResult<Self> {
        if !(total_deadline > 0.0) || !total_deadline.is_finite() {
            return Err(OptError::InvalidInput(format!(
                "total deadline must be a positive number, got {}",
                total_deadline
            )));
        }
        Ok(Self {
            applications: Vec::new(),
            total_deadline,
            config_file: PathBuf::new(),
        })
    }

    pub fn with_config_file(mut self, config_file: &Path) -> Self {
        self.config_file = config_file.to_path_buf();
        self
    }

    pub fn push_application(&mut self, application: Application) {
        self.applications.push(application);
    }

    pub fn number_of_applications(&self) -> usize {
        self.applications.len()
    }

    pub fn total_deadline(&self) -> TimeInstant {
        self.total_deadline
    }

    /// Configuration file forwarded to the estimator.
    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn application(&self, index: usize) -> &Application {
        &self.applications[index]
    }

    pub fn application_mut(&mut self, index: usize) -> &mut Application {
        &mut self.applications[index]
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    /// Total weighted resource cost: `Σ weight_i * cores_i`.
    pub fn global_objective(&self) -> f64 {
        self.applications
            .iter()
            .map(|app| app.cost(app.number_of_cores()))
            .sum()
    }

    /// Sum of the average stage times of every application, i.e. the time
    /// the whole batch takes when each stage runs with its profiled
    /// parallelism.
    pub fn total_real_time(&self) -> TimeInstant {
        self.applications.iter().map(|app| app.total_avg_time()).sum()
    }

    pub fn snapshot(&self, label: &str) -> ProcessSnapshot {
        ProcessSnapshot {
            label: label.to_owned(),
            total_deadline: self.total_deadline,
            global_objective: self.global_objective(),
            applications: self
                .applications
                .iter()
                .map(|app| ApplicationSnapshot {
                    id: app.id().clone(),
                    weight: app.weight(),
                    deadline: app.deadline(),
                    number_of_cores: app.number_of_cores(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::Stage;

    fn create_application(id: &str, weight: f64, cores: u32, avg_time: f64) -> Application {
        let mut app = Application::new(id, weight, 0.0, 100.0)
            .unwrap()
            .with_stages(vec![Stage {
                name: "S0".to_string(),
                avg_time,
                number_of_tasks: 4,
            }]);
        app.set_number_of_cores(cores);
        app
    }

    #[test]
    fn test_process_new_rejects_invalid_deadline() {
        assert!(Process::new(0.0).is_err());
        assert!(Process::new(-10.0).is_err());
        assert!(Process::new(f64::INFINITY).is_err());
        assert_eq!(Process::new(300.0).unwrap().total_deadline(), 300.0);
    }

    #[test]
    fn test_process_global_objective() {
        let mut process = Process::new(300.0).unwrap();
        process.push_application(create_application("a", 1.0, 3, 10.0));
        process.push_application(create_application("b", 2.5, 4, 20.0));
        assert_eq!(process.number_of_applications(), 2);
        assert_eq!(process.global_objective(), 13.0);
        assert_eq!(process.total_real_time(), 30.0);
    }

    #[test]
    fn test_process_application_mut_is_index_stable() {
        let mut process = Process::new(300.0).unwrap();
        process.push_application(create_application("a", 1.0, 3, 10.0));
        process.push_application(create_application("b", 1.0, 3, 10.0));
        process.application_mut(1).set_deadline(42.0);
        assert_eq!(process.application(1).id(), "b");
        assert_eq!(process.application(1).deadline(), 42.0);
        assert_eq!(process.application(0).deadline(), 0.0);
    }

    #[test]
    fn test_process_snapshot() {
        let mut process = Process::new(300.0).unwrap();
        process.push_application(create_application("a", 2.0, 5, 10.0));
        process.application_mut(0).set_deadline(120.0);
        let snapshot = process.snapshot("Initial solution SA");
        assert_eq!(snapshot.label, "Initial solution SA");
        assert_eq!(snapshot.global_objective, 10.0);
        assert_eq!(snapshot.applications.len(), 1);
        assert_eq!(snapshot.applications[0].id, "a");
        assert_eq!(snapshot.applications[0].deadline, 120.0);
        assert_eq!(snapshot.applications[0].number_of_cores, 5);
    }
}
