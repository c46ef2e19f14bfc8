//! Application description and its affine performance model.
use getset::{CopyGetters, Getters, Setters};
use serde_derive::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{OptError, OptResult};

/// Time is measured in the unit of the profiles (milliseconds in practice).
pub type TimeInstant = f64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub avg_time: TimeInstant,
    #[serde(default)]
    pub number_of_tasks: u32,
}

/// Paths of the descriptors an application was built from. The optimizer
/// never looks inside the jobs and tasks files; they are forwarded to the
/// estimator as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileResources {
    pub application_file: PathBuf,
    pub jobs_file: PathBuf,
    pub stages_file: PathBuf,
    pub tasks_file: PathBuf,
    pub lua_file: PathBuf,
    pub infrastructure_file: PathBuf,
}

impl FileResources {
    /// The six paths in job-description order.
    pub fn as_array(&self) -> [&PathBuf; 6] {
        [
            &self.application_file,
            &self.jobs_file,
            &self.stages_file,
            &self.tasks_file,
            &self.lua_file,
            &self.infrastructure_file,
        ]
    }
}

#[derive(Debug, Clone, Getters, CopyGetters, Setters)]
pub struct Application {
    #[getset(get = "pub")]
    id: String,
    #[getset(get_copy = "pub")]
    weight: f64,
    #[getset(get_copy = "pub", set = "pub")]
    deadline: TimeInstant,
    #[getset(get_copy = "pub", set = "pub")]
    number_of_cores: u32,
    /// Latency floor: the completion time no amount of cores goes below.
    #[getset(get_copy = "pub")]
    chi_0: f64,
    /// Latency removed per additional core.
    #[getset(get_copy = "pub")]
    chi_c: f64,
    #[getset(get = "pub")]
    stages: Vec<Stage>,
    #[getset(get_copy = "pub")]
    container_cores: u32,
    #[getset(get = "pub")]
    file_resources: FileResources,
}

impl Application {
    pub fn new(id: &str, weight: f64, chi_0: f64, chi_c: f64) -> OptResult<Self> {
        if !(weight > 0.0) || !weight.is_finite() {
            return Err(OptError::InvalidInput(format!(
                "application '{}' has weight {}, a positive weight is required",
                id, weight
            )));
        }
        Ok(Self {
            id: id.to_owned(),
            weight,
            deadline: 0.0,
            number_of_cores: 0,
            chi_0,
            chi_c,
            stages: Vec::new(),
            container_cores: 1,
            file_resources: FileResources::default(),
        })
    }

    pub fn with_stages(mut self, stages: Vec<Stage>) -> Self {
        self.stages = stages;
        self
    }

    pub fn with_container_cores(mut self, container_cores: u32) -> Self {
        self.container_cores = container_cores;
        self
    }

    pub fn with_file_resources(mut self, file_resources: FileResources) -> Self {
        self.file_resources = file_resources;
        self
    }

    /// Completion time predicted for `cores` cores: `chi_0 + chi_c / cores`.
    pub fn deadline_for_cores(&self, cores: f64) -> TimeInstant {
        self.chi_0 + self.chi_c / cores
    }

    /// Core count of the coarse-grain model, `(deadline - chi_0) / chi_c`,
    /// before truncation. This is not the inverse of
    /// [`Application::deadline_for_cores`].
    pub fn exact_cores_for_deadline(&self, deadline: TimeInstant) -> f64 {
        (deadline - self.chi_0) / self.chi_c
    }

    /// [`Application::exact_cores_for_deadline`] truncated toward zero. Zero
    /// when the quotient is not finite, negative when the deadline is below
    /// `chi_0`.
    pub fn cores_for_deadline(&self, deadline: TimeInstant) -> i64 {
        let cores = self.exact_cores_for_deadline(deadline);
        if !cores.is_finite() {
            return 0;
        }
        cores.trunc() as i64
    }

    pub fn cost(&self, cores: u32) -> f64 {
        self.weight * cores as f64
    }

    pub fn total_avg_time(&self) -> TimeInstant {
        self.stages.iter().map(|stage| stage.avg_time).sum()
    }

    pub fn max_number_of_tasks(&self) -> u32 {
        self.stages
            .iter()
            .map(|stage| stage.number_of_tasks)
            .max()
            .unwrap_or(0)
    }
}
