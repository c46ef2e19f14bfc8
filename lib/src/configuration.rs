//! Run configuration: where the external estimator and simulator live.
use serde_derive::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::error::{OptError, OptResult};

pub const DEFAULT_TMP_DIRECTORY: &str = "/tmp";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Command line of the infrastructure-sizing estimator.
    pub opt_ic_command: String,
    /// Directory holding `dagsim.sh`.
    pub dagsim_path: String,
    #[serde(default)]
    pub tmp_directory: Option<String>,
}

impl Configuration {
    pub fn read_configuration_from_file(file_path: &Path) -> OptResult<Self> {
        let contents = fs::read_to_string(file_path).map_err(|err| {
            OptError::io(
                format!("Impossible to open the file '{}'", file_path.display()),
                err,
            )
        })?;
        Self::from_yaml_str(&contents).map_err(|err| match err {
            OptError::Yaml { source, .. } => OptError::yaml(
                format!("Invalid configuration file '{}'", file_path.display()),
                source,
            ),
            other => other,
        })
    }

    pub fn from_yaml_str(contents: &str) -> OptResult<Self> {
        let configuration: Configuration = serde_yaml::from_str(contents)
            .map_err(|err| OptError::yaml("Invalid configuration", err))?;
        if configuration.opt_ic_command.trim().is_empty() {
            return Err(OptError::InvalidInput(
                "configuration key 'opt_ic_command' is empty".to_string(),
            ));
        }
        Ok(configuration)
    }

    /// The temporary directory, falling back to `/tmp` when unset or empty.
    pub fn tmp_directory(&self) -> &str {
        match self.tmp_directory.as_deref() {
            Some(dir) if !dir.is_empty() => dir,
            _ => DEFAULT_TMP_DIRECTORY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_from_yaml_str_normal() {
        let configuration = Configuration::from_yaml_str(
            "opt_ic_command: /opt/OPT_IC/src/opt_ic\ndagsim_path: /opt/dagSim\ntmp_directory: /var/tmp/opt\n",
        )
        .unwrap();
        assert_eq!(configuration.opt_ic_command, "/opt/OPT_IC/src/opt_ic");
        assert_eq!(configuration.dagsim_path, "/opt/dagSim");
        assert_eq!(configuration.tmp_directory(), "/var/tmp/opt");
    }

    #[test]
    fn test_configuration_default_tmp_directory() {
        let configuration =
            Configuration::from_yaml_str("opt_ic_command: opt_ic\ndagsim_path: /opt/dagSim\n")
                .unwrap();
        assert_eq!(configuration.tmp_directory(), DEFAULT_TMP_DIRECTORY);

        let configuration = Configuration::from_yaml_str(
            "opt_ic_command: opt_ic\ndagsim_path: /opt/dagSim\ntmp_directory: ''\n",
        )
        .unwrap();
        assert_eq!(configuration.tmp_directory(), DEFAULT_TMP_DIRECTORY);
    }

    #[test]
    fn test_configuration_missing_key() {
        assert!(matches!(
            Configuration::from_yaml_str("dagsim_path: /opt/dagSim\n"),
            Err(OptError::Yaml { .. })
        ));
    }

    #[test]
    fn test_configuration_empty_command() {
        assert!(matches!(
            Configuration::from_yaml_str("opt_ic_command: ' '\ndagsim_path: /opt/dagSim\n"),
            Err(OptError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_read_configuration_from_file_missing() {
        assert!(matches!(
            Configuration::read_configuration_from_file(Path::new("/nonexistent/config.yaml")),
            Err(OptError::Io { .. })
        ));
    }
}
