use std::process::ExitCode;

use clap::Parser;
use log::error;
use surfaceview::{args::Args, commands::run};

fn main() -> ExitCode {
    // .env is optional
    let _ = dotenvy::dotenv();
    env_logger::init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:?}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
