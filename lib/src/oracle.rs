//! Estimators consulted by the fine-grain refinement.
//!
//! [`ExternalOracle`] shells out to the infrastructure-sizing estimator and to
//! the DAG simulator and parses their text output. Calls block until the child
//! exits; there is no timeout and no retry.
use log::{debug, warn};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    process::Command,
};
use tempfile::NamedTempFile;

use crate::{
    application::{Application, TimeInstant},
    configuration::Configuration,
    error::{OptError, OptResult},
};

pub const ESTIMATOR_MARKER: &str = "N YARN containers (VMs): ";
pub const NODES_PLACEHOLDER: &str = "Nodes = @@nodes@@;";
const DAGSIM_SCRIPT: &str = "dagsim.sh";
// Column of the first simulator output line holding the elapsed time.
const DAGSIM_TIME_FIELD: usize = 2;

pub trait ResourceOracle {
    /// Cores the application needs to complete within `deadline`.
    fn estimate_cores(&mut self, application: &Application, deadline: TimeInstant)
        -> OptResult<u32>;
    /// Elapsed time of the application when it runs on `cores` cores.
    fn simulate_runtime(&mut self, application: &Application, cores: u32)
        -> OptResult<TimeInstant>;
}

pub struct ExternalOracle {
    opt_ic_command: String,
    dagsim_command: PathBuf,
    tmp_directory: PathBuf,
    config_file: PathBuf,
}

impl ExternalOracle {
    pub fn new(configuration: &Configuration, config_file: &Path) -> Self {
        Self {
            opt_ic_command: configuration.opt_ic_command.clone(),
            dagsim_command: Path::new(&configuration.dagsim_path).join(DAGSIM_SCRIPT),
            tmp_directory: PathBuf::from(configuration.tmp_directory()),
            config_file: config_file.to_path_buf(),
        }
    }

    /// Creates a new file in the temporary directory holding `contents`. The
    /// file is removed when the returned handle is dropped.
    fn write_temporary_file(
        &self,
        prefix: &str,
        suffix: &str,
        contents: &str,
    ) -> OptResult<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(&self.tmp_directory)
            .map_err(|err| {
                OptError::io(
                    format!(
                        "Cannot create temporary file in '{}'",
                        self.tmp_directory.display()
                    ),
                    err,
                )
            })?;
        file.write_all(contents.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|err| {
                OptError::io(
                    format!("Cannot write temporary file '{}'", file.path().display()),
                    err,
                )
            })?;
        Ok(file)
    }

    fn write_estimator_input(
        &self,
        application: &Application,
        deadline: TimeInstant,
    ) -> OptResult<NamedTempFile> {
        let line = create_estimator_input(application, deadline);
        self.write_temporary_file(&format!("app_{}_", application.id()), "", &line)
    }

    fn write_simulator_script(
        &self,
        application: &Application,
        cores: u32,
    ) -> OptResult<NamedTempFile> {
        let template_path = &application.file_resources().lua_file;
        let template = fs::read_to_string(template_path).map_err(|err| {
            OptError::io(
                format!("Cannot open the input LUA file '{}'", template_path.display()),
                err,
            )
        })?;
        let script = create_simulator_script(&template, cores).map_err(|_| {
            OptError::InvalidInput(format!(
                "Cannot find the template line '{}' into the LUA template file '{}'",
                NODES_PLACEHOLDER,
                template_path.display()
            ))
        })?;
        self.write_temporary_file("lua_", ".lua", &script)
    }
}

impl ResourceOracle for ExternalOracle {
    fn estimate_cores(
        &mut self,
        application: &Application,
        deadline: TimeInstant,
    ) -> OptResult<u32> {
        let input_file = self.write_estimator_input(application, deadline)?;
        let mut command_line = self.opt_ic_command.split_whitespace();
        let program = command_line.next().unwrap_or_default();
        let mut args: Vec<String> = command_line.map(str::to_owned).collect();
        args.push(input_file.path().display().to_string());
        args.push("-f".to_string());
        args.push("-c".to_string());
        args.push(self.config_file.display().to_string());

        let output = run_command(Path::new(program), &args)?;
        parse_estimator_output(&output, application.container_cores())
    }

    fn simulate_runtime(
        &mut self,
        application: &Application,
        cores: u32,
    ) -> OptResult<TimeInstant> {
        let script = self.write_simulator_script(application, cores)?;
        let output = run_command(
            &self.dagsim_command,
            &[script.path().display().to_string()],
        )?;
        parse_simulator_output(&output)
    }
}

/// Runs `program` and returns its stdout followed by its stderr.
fn run_command(program: &Path, args: &[String]) -> OptResult<String> {
    debug!("Invoke cmd: {} {}", program.display(), args.join(" "));
    let output = Command::new(program).args(args).output().map_err(|err| {
        OptError::io(
            format!("Error launch process '{}'", program.display()),
            err,
        )
    })?;
    if !output.status.success() {
        warn!(
            "Process '{}' exited with {}",
            program.display(),
            output.status
        );
    }
    let mut result = String::from_utf8_lossy(&output.stdout).into_owned();
    result.push_str(&String::from_utf8_lossy(&output.stderr));
    debug!("Process output:\n{}", result);
    Ok(result)
}

/// The estimator descriptor: the six resource paths followed by the deadline,
/// on one line.
pub fn create_estimator_input(application: &Application, deadline: TimeInstant) -> String {
    let mut line = application
        .file_resources()
        .as_array()
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<String>>()
        .join(" ");
    line.push_str(&format!(" {}", deadline));
    line
}

/// Extracts the container count printed by the estimator and converts it to
/// cores.
pub fn parse_estimator_output(output: &str, container_cores: u32) -> OptResult<u32> {
    let index = output
        .find(ESTIMATOR_MARKER)
        .ok_or_else(|| OptError::Parse("Parsing error of OPT_IC output".to_string()))?;
    let tail = &output[index + ESTIMATOR_MARKER.len()..];
    let token = tail.split_whitespace().next().unwrap_or_default();
    let containers = token.parse::<u32>().map_err(|_| {
        OptError::Parse(format!(
            "Parsing error of OPT_IC output: '{}' is not a container count",
            token
        ))
    })?;
    containers.checked_mul(container_cores).ok_or_else(|| {
        OptError::Parse(format!(
            "{} containers of {} cores overflow the core count",
            containers, container_cores
        ))
    })
}

/// Extracts the elapsed time from the first line of the simulator output.
pub fn parse_simulator_output(output: &str) -> OptResult<TimeInstant> {
    let bad_formed = || {
        OptError::Parse(
            "Dagsim result is empty or bad-formed. Check Dagsim configuration and all data paths are correct."
                .to_string(),
        )
    };
    let first_line = output.lines().next().ok_or_else(bad_formed)?;
    let fields: Vec<&str> = first_line.split_whitespace().collect();
    let field = match fields.len() {
        1 => fields[0],
        n if n > DAGSIM_TIME_FIELD => fields[DAGSIM_TIME_FIELD],
        _ => return Err(bad_formed()),
    };
    match field.parse::<TimeInstant>() {
        Ok(time) if time.is_finite() => Ok(time),
        _ => Err(bad_formed()),
    }
}

/// Substitutes the node count placeholder of a simulator template.
pub fn create_simulator_script(template: &str, cores: u32) -> OptResult<String> {
    if !template.contains(NODES_PLACEHOLDER) {
        return Err(OptError::InvalidInput(format!(
            "template has no '{}' line",
            NODES_PLACEHOLDER
        )));
    }
    Ok(template.replacen(NODES_PLACEHOLDER, &format!("Nodes = {};", cores), 1))
}
