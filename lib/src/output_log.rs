use log::info;
use serde_derive::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;

use crate::{
    application::TimeInstant,
    error::{OptError, OptResult},
    process::Process,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSnapshot {
    pub id: String,
    pub weight: f64,
    pub deadline: TimeInstant,
    pub number_of_cores: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub label: String,
    pub total_deadline: TimeInstant,
    pub global_objective: f64,
    pub applications: Vec<ApplicationSnapshot>,
}

/// Snapshots of the allocation taken after each milestone of a run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResultLog {
    pub snapshots: Vec<ProcessSnapshot>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_snapshot(&mut self, process: &Process, label: &str) {
        info!(
            "[{}] global objective function: {}",
            label,
            process.global_objective()
        );
        self.snapshots.push(process.snapshot(label));
    }

    pub fn last_snapshot(&self) -> Option<&ProcessSnapshot> {
        self.snapshots.last()
    }

    pub fn dump_result_log_to_yaml(&self, file_path: &str) -> OptResult<()> {
        let yaml = serde_yaml::to_string(&self)
            .map_err(|err| OptError::yaml("Failed to serialize ResultLog to YAML", err))?;
        append_info_to_yaml(file_path, &yaml)
    }
}

pub fn create_yaml_file(folder_path: &str, file_name: &str) -> OptResult<String> {
    if fs::metadata(folder_path).is_err() {
        fs::create_dir_all(folder_path)
            .map_err(|err| OptError::io(format!("Failed to create folder '{}'", folder_path), err))?;
        info!("Created folder: {}", folder_path);
    }
    let file_path = format!("{}/{}.yaml", folder_path, file_name);
    fs::File::create(&file_path)
        .map_err(|err| OptError::io(format!("Failed to create file '{}'", file_path), err))?;
    Ok(file_path)
}

pub fn append_info_to_yaml(file_path: &str, info: &str) -> OptResult<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(file_path)
        .map_err(|err| OptError::io(format!("Failed to open file '{}'", file_path), err))?;
    file.write_all(info.as_bytes())
        .map_err(|err| OptError::io(format!("Failed to write to file '{}'", file_path), err))
}
