use std::process::ExitCode;

use log::error;

use flickr2kml::error::full_chain;
use flickr2kml::*;

fn main() -> ExitCode {
    let opts = match cli::init_binary() {
        Ok(Some(opts)) => opts,
        Ok(None) => return ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let debug = opts.debug;

    match cli::settings_from_options(opts).and_then(|settings| pipeline::run(&settings)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("*** An unrecoverable error occurred ***");
            if debug {
                error!("{}", full_chain(&e));
            } else {
                error!("{}", e);
            }
            ExitCode::FAILURE
        }
    }
}
