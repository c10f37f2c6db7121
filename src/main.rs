//! Binary entrypoint for the `gitward` CLI.

use std::process::ExitCode;

use gitward::Error;

fn main() -> ExitCode {
    gitward::config::load_env_defaults();
    gitward::logging::init();
    match gitward::run(std::env::args_os()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match &err {
                // clap already formats its own "error: ..." message.
                Error::Usage(message) => eprint!("{message}"),
                other => eprintln!("error: {other}"),
            }
            ExitCode::from(err.exit_code())
        }
    }
}
