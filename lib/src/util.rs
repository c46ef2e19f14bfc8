use chrono::{DateTime, Utc};

use crate::{error::OptResult, output_log::create_yaml_file};

pub fn create_result_log_yaml(dir_path: &str, alg_name: &str) -> OptResult<String> {
    let now: DateTime<Utc> = Utc::now();
    let date = now.format("%Y-%m-%d-%H-%M-%S").to_string();
    let file_name = format!("{}-{}-result", date, alg_name);
    create_yaml_file(dir_path, &file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_create_result_log_yaml_normal() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = create_result_log_yaml(dir.path().to_str().unwrap(), "AlgorithmA").unwrap();
        assert!(file_path.ends_with("-AlgorithmA-result.yaml"));
        assert!(Path::new(&file_path).exists());
    }
}
