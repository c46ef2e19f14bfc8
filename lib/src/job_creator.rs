//! Build a [`Process`] from a job description file.
//!
//! A job description lists one application per line: six resource paths
//! (application, jobs, stages, tasks, simulator template, infrastructure)
//! followed by the application weight. Blank lines and lines starting with
//! `#` are skipped. The application, stages and infrastructure descriptors
//! are YAML documents:
//!
//! ```yaml
//! # application
//! application_id: query26
//! chi_0: 12000.0
//! chi_c: 480000.0
//! # stages
//! stages:
//!   - { name: S0, avg_time: 3200.0, number_of_tasks: 24 }
//! # infrastructure
//! container_cores: 2
//! ```
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    application::{Application, FileResources, Stage, TimeInstant},
    error::{OptError, OptResult},
    process::Process,
};

const NUMBER_OF_RESOURCE_FILES: usize = 6;

#[derive(Debug, Deserialize)]
struct ApplicationDescriptor {
    application_id: String,
    chi_0: f64,
    chi_c: f64,
}

#[derive(Debug, Deserialize)]
struct StagesDescriptor {
    stages: Vec<Stage>,
}

#[derive(Debug, Deserialize)]
struct InfrastructureDescriptor {
    container_cores: u32,
}

/// One parsed line of a job description.
#[derive(Debug, Clone, PartialEq)]
pub struct JobEntry {
    pub file_resources: FileResources,
    pub weight: f64,
}

fn load_yaml<T: DeserializeOwned>(file_path: &Path) -> OptResult<T> {
    let contents = fs::read_to_string(file_path).map_err(|err| {
        OptError::io(
            format!("Impossible to open the file '{}'", file_path.display()),
            err,
        )
    })?;
    serde_yaml::from_str(&contents)
        .map_err(|err| OptError::yaml(format!("Invalid descriptor '{}'", file_path.display()), err))
}

fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Parses the contents of a job description. Relative paths are resolved
/// against `base_dir`.
pub fn parse_job_description(contents: &str, base_dir: &Path) -> OptResult<Vec<JobEntry>> {
    let mut entries = Vec::new();
    for (line_index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < NUMBER_OF_RESOURCE_FILES + 1 {
            return Err(OptError::Parse(format!(
                "line {}: expected {} resource files and a weight, found {} fields",
                line_index + 1,
                NUMBER_OF_RESOURCE_FILES,
                fields.len()
            )));
        }
        let weight_str = fields[NUMBER_OF_RESOURCE_FILES];
        let weight = weight_str.parse::<f64>().map_err(|_| {
            OptError::Parse(format!(
                "line {}: weight '{}' is not a number",
                line_index + 1,
                weight_str
            ))
        })?;
        let file_resources = FileResources {
            application_file: resolve(base_dir, fields[0]),
            jobs_file: resolve(base_dir, fields[1]),
            stages_file: resolve(base_dir, fields[2]),
            tasks_file: resolve(base_dir, fields[3]),
            lua_file: resolve(base_dir, fields[4]),
            infrastructure_file: resolve(base_dir, fields[5]),
        };
        entries.push(JobEntry {
            file_resources,
            weight,
        });
    }
    Ok(entries)
}

/// Loads the descriptors of one application. Its initial core count is the
/// largest task count among its stages.
pub fn create_application_from_entry(entry: JobEntry) -> OptResult<Application> {
    let resources = &entry.file_resources;
    let descriptor: ApplicationDescriptor = load_yaml(&resources.application_file)?;
    let stages: StagesDescriptor = load_yaml(&resources.stages_file)?;
    let infrastructure: InfrastructureDescriptor = load_yaml(&resources.infrastructure_file)?;

    if infrastructure.container_cores == 0 {
        return Err(OptError::InvalidInput(format!(
            "'{}' declares zero cores per container",
            resources.infrastructure_file.display()
        )));
    }

    let mut application = Application::new(
        &descriptor.application_id,
        entry.weight,
        descriptor.chi_0,
        descriptor.chi_c,
    )?
    .with_stages(stages.stages)
    .with_container_cores(infrastructure.container_cores)
    .with_file_resources(entry.file_resources);
    let initial_cores = application.max_number_of_tasks();
    application.set_number_of_cores(initial_cores);

    debug!(
        "Loaded application '{}' (weight {}, chi_0 {}, chi_c {}, {} stages)",
        application.id(),
        application.weight(),
        application.chi_0(),
        application.chi_c(),
        application.stages().len()
    );
    Ok(application)
}

/// Builds the process described by `data_file` with the given end-to-end
/// deadline.
///
/// # Example
///
/// ```
/// use lib::job_creator::create_process_from_job_description;
/// use std::path::Path;
///
/// let process = create_process_from_job_description(
///     Path::new("tests/sample_jobs/job_description.txt"),
///     Path::new("tests/sample_jobs/config.yaml"),
///     100000.0,
/// )
/// .unwrap();
/// assert_eq!(process.number_of_applications(), 2);
/// ```
pub fn create_process_from_job_description(
    data_file: &Path,
    config_file: &Path,
    total_deadline: TimeInstant,
) -> OptResult<Process> {
    let contents = fs::read_to_string(data_file).map_err(|err| {
        OptError::io(
            format!("Impossible to open the file '{}'", data_file.display()),
            err,
        )
    })?;
    let base_dir = data_file.parent().unwrap_or_else(|| Path::new("."));
    let mut process = Process::new(total_deadline)?.with_config_file(config_file);
    for entry in parse_job_description(&contents, base_dir)? {
        process.push_application(create_application_from_entry(entry)?);
    }
    info!(
        "Created process with {} applications and total deadline {}",
        process.number_of_applications(),
        total_deadline
    );
    Ok(process)
}
