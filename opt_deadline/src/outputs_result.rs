use lib::error::{OptError, OptResult};
use lib::output_log::append_info_to_yaml;
use serde_derive::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub algorithm: String,
    pub status: bool,
    pub global_objective: f64,
}

#[derive(Serialize, Deserialize)]
struct ResultInfo {
    results: Vec<RunResult>,
}

pub fn dump_run_results_to_file(file_path: &str, results: &[RunResult]) -> OptResult<()> {
    let result_info = ResultInfo {
        results: results.to_vec(),
    };
    let yaml = serde_yaml::to_string(&result_info)
        .map_err(|err| OptError::yaml("Failed to serialize run results to YAML", err))?;

    append_info_to_yaml(file_path, &yaml)
}
