//! Command line flags.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Print every available overlay and exit
    #[arg(long)]
    pub list_sites: bool,

    /// Summon this overlay right after startup
    #[arg(long, value_name = "ID")]
    pub site: Option<String>,

    /// Report whether accessibility permission is granted and exit
    #[arg(long)]
    pub check_permissions: bool,

    /// Read configuration from this file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
