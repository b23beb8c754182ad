use std::process::ExitCode;

use clap::Parser;
use memgrind::{memgrind, Args};

fn main() -> ExitCode {
    env_logger::init();
    match memgrind(Args::parse()) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("memgrind: {e}");
            ExitCode::FAILURE
        }
    }
}
