use keyplay::cli::{Args, Settings};
use keyplay::{Outcome, run_file};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Args = argh::from_env();
    let settings = Settings::try_from(args);
    let filter = settings.as_ref().map_or("info", Settings::log_filter);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let settings = match settings {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("{err:#}");
            return ExitCode::from(2);
        }
    };

    let mut interp = settings.interpreter();
    let caps = interp.capabilities();
    if !caps.calls {
        log::info!("Dry run: no input will be sent and no command will run");
    }
    if caps.shell {
        log::info!("Shell commands are enabled");
    }
    if !settings.wait_time.is_zero() {
        log::info!("Starting in {:.1} seconds", settings.wait_time.as_secs_f64());
        std::thread::sleep(settings.wait_time);
    }

    match run_file(&settings.script, &mut interp) {
        Ok(Outcome::Completed) => ExitCode::SUCCESS,
        Ok(Outcome::Halted { line }) => {
            match interp.last_error() {
                Some(err) if err.line() != line => {
                    log::error!("Stopped at line {line} (failure at line {})", err.line())
                }
                _ => log::error!("Stopped at line {line}"),
            }
            ExitCode::from(1)
        }
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::from(2)
        }
    }
}
