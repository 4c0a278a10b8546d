use crate::config::DEFAULT_CONFIG_FILE;
use clap::{Parser, Subcommand};

/// Command-line arguments for vendorism
#[derive(Parser, Debug, Clone)]
#[command(name = "vendorism")]
#[command(about = "Vendor files from a source tree into your project, transformed and tagged")]
#[command(long_about = None)]
#[command(version)]
pub struct Args {
    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch the source tree and run the source hooks
    #[command(alias = "source")]
    Get {
        #[command(flatten)]
        config: ConfigArg,
    },

    /// Regenerate the vendored files in the target tree
    #[command(alias = "target")]
    Set {
        #[command(flatten)]
        config: ConfigArg,

        /// Only regenerate this source-relative file, without hooks
        #[arg(long, value_name = "PATH")]
        file: Option<String>,
    },

    /// Strip the banner from a vendored file so syncs leave it alone
    Eject {
        #[command(flatten)]
        config: ConfigArg,

        /// File to eject (absolute, target-relative or working-directory relative)
        #[arg(value_name = "FILE")]
        file: String,
    },

    /// Record manual edits of a vendored file as a patch
    Diff {
        #[command(flatten)]
        config: ConfigArg,

        /// Source-relative path of the edited file
        #[arg(value_name = "FILE")]
        file: String,
    },
}

impl Command {
    /// Configuration file path of any command
    #[must_use]
    pub fn config_path(&self) -> &str {
        match self {
            Self::Get { config }
            | Self::Set { config, .. }
            | Self::Eject { config, .. }
            | Self::Diff { config, .. } => &config.config,
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct ConfigArg {
    /// Configuration file path
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE, env = "VENDORISM_CONFIG")]
    pub config: String,
}
