mod algorithm;
mod outputs_result;

use algorithm::{run_algorithms, AlgorithmSelection};
use clap::{ArgGroup, Parser};
use lib::configuration::Configuration;
use lib::error::{OptError, OptResult};
use lib::job_creator::create_process_from_job_description;
use lib::oracle::ExternalOracle;
use lib::output_log::ResultLog;
use lib::util::create_result_log_yaml;
use log::{error, info};
use outputs_result::dump_run_results_to_file;
use std::path::Path;

#[derive(Parser)]
#[clap(
    name = "opt_deadline",
    version = "1.0",
    about = "About:
    Splits an end-to-end deadline among co-scheduled applications so that the
    weighted number of cores is minimized. -1 runs the slack-balanced solution
    refined by the estimators, -2 runs the fair-share solution followed by the
    coarse and fine grain searches, -12 runs both.",
    group(
        ArgGroup::new("algorithm")
            .required(true)
            .multiple(true)
            .args(["algorithm_1", "algorithm_2"])
    )
)]
struct ArgParser {
    ///Path to the job description file.
    data_file: String,
    ///Path to the configuration file.
    config_file: String,
    ///End-to-end deadline shared by all the applications.
    deadline: f64,
    ///Run algorithm 1 (slack-balanced + fine grain).
    #[clap(short = '1')]
    algorithm_1: bool,
    ///Run algorithm 2 (fair-share + coarse grain + fine grain).
    #[clap(short = '2')]
    algorithm_2: bool,
    ///Path to output directory.
    #[clap(short = 'o', long = "output_dir_path", default_value = "../outputs")]
    output_dir_path: String,
}

fn run(arg: &ArgParser) -> OptResult<bool> {
    let selection = AlgorithmSelection::from_flags(arg.algorithm_1, arg.algorithm_2)
        .ok_or_else(|| OptError::InvalidInput("no algorithm selected".to_string()))?;
    info!("Selected {}", selection);

    let config_file = Path::new(&arg.config_file);
    let configuration = Configuration::read_configuration_from_file(config_file)?;
    let mut process =
        create_process_from_job_description(Path::new(&arg.data_file), config_file, arg.deadline)?;

    let file_path = create_result_log_yaml(&arg.output_dir_path, selection.name())?;
    info!("Generated solution file: {}", file_path);

    let mut oracle = ExternalOracle::new(&configuration, config_file);
    let mut result_log = ResultLog::new();
    let results = run_algorithms(selection, &mut process, &mut oracle, &mut result_log);

    result_log.dump_result_log_to_yaml(&file_path)?;
    dump_run_results_to_file(&file_path, &results)?;

    Ok(results.iter().all(|result| result.status))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let arg: ArgParser = ArgParser::parse();

    match run(&arg) {
        Ok(true) => info!("Optimization completed"),
        Ok(false) => {
            error!("Optimization failed");
            std::process::exit(1);
        }
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    }
}
