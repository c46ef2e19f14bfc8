//! Fair-share initial allocation: the end-to-end deadline is split in
//! proportion to the average workload of each application's stages.
use log::{debug, info};

use crate::{
    application::TimeInstant,
    error::{OptError, OptResult},
    process::Process,
};

pub fn initial_solution_fa(process: &mut Process) -> OptResult<()> {
    info!("InitialSolution_FA > Starting initialization");

    let total_avg_per_app: Vec<TimeInstant> = process
        .applications()
        .iter()
        .map(|app| app.total_avg_time())
        .collect();
    let total_avg_all_apps: TimeInstant = total_avg_per_app.iter().sum();

    if !(total_avg_all_apps > 0.0) || !total_avg_all_apps.is_finite() {
        return Err(OptError::InvalidInput(format!(
            "InitialSolution_FA: the stages of the {} applications have a total average \
             execution time of {}, a positive value is required",
            process.number_of_applications(),
            total_avg_all_apps
        )));
    }

    let process_deadline = process.total_deadline();
    for (index, total_avg_app) in total_avg_per_app.iter().enumerate() {
        let new_deadline = process_deadline * total_avg_app / total_avg_all_apps;
        debug!("App index ({}) setting initial deadline: {}", index, new_deadline);
        process.application_mut(index).set_deadline(new_deadline);
    }

    info!("InitialSolution_FA > Initialization completed");
    Ok(())
}
