use clap::Parser;
use log::{debug, error};
use snafu::ErrorCompat;

mod args;
mod prep;

fn main() {
    let args = args::Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    debug!("main: args: {:?}", args);

    if let Err(e) = prep::run_prep(&args) {
        error!("main: {:?}", e);
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
