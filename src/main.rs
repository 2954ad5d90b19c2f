/*!
 * SemTester - Main Entry Point
 *
 * Every process (the root and each forked child) returns through here:
 * exit code 0 on completion, -1 on any fatal harness failure.
 */

use tracing::{error, info};

use semtester::{
    init_tracing, ConsoleLog, Harness, HarnessConfig, PosixPlatform, EXIT_FAILURE_CODE,
};

fn main() {
    // Initialize structured tracing
    init_tracing();

    let config = match HarnessConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(EXIT_FAILURE_CODE);
        }
    };

    let console = ConsoleLog::stdout();
    let harness = Harness::new(PosixPlatform::new(), config);

    match harness.run(&console) {
        Ok(report) => {
            info!(pid = report.pid, role = %report.role, "Exiting normally");
        }
        Err(e) => {
            error!(error = %e, "Harness failed");
            std::process::exit(EXIT_FAILURE_CODE);
        }
    }
}
