//! # `vendorism`
//!
//! Command-line tool that vendors files from a source tree into a project.
//!
//! ## Usage
//!
//! ```sh
//! vendorism get                 # fetch the source tree
//! vendorism set                 # regenerate all vendored files
//! vendorism set --file lib/a.js # regenerate a single file
//! vendorism diff lib/a.js       # record manual edits as a patch
//! vendorism eject lib/a.js      # stop managing a file
//! ```

use clap::Parser as _;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};
use vendorism::cli::Args;
use vendorism::error::VendorError;

fn main() {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_target(false).with_env_filter(filter).init();

    match vendorism::run(&args) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            error!("{:#}", err);
            std::process::exit(
                err.downcast_ref::<VendorError>()
                    .map_or(1, VendorError::exit_code),
            );
        }
    }
}
