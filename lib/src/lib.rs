pub mod application;
pub mod coarse_grain;
pub mod configuration;
pub mod error;
pub mod fine_grain;
pub mod initial_solution_fa;
pub mod initial_solution_sa;
pub mod job_creator;
pub mod oracle;
pub mod output_log;
pub mod process;
#[cfg(any(test, feature = "test-helpers"))]
pub mod tests_helper;
pub mod util;
