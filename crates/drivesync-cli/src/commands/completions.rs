//! Shell completions generation command
//!
//! Usage: `drivesync completions bash > ~/.local/share/bash-completion/completions/drivesync`

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::Shell;

use super::Context;

/// Arguments for the completions subcommand
#[derive(Debug, clap::Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsCommand {
    /// Prints the completion script to stdout
    pub async fn execute(&self, _ctx: &Context) -> Result<ExitCode> {
        let mut cmd = crate::Cli::command();
        clap_complete::generate(self.shell, &mut cmd, "drivesync", &mut io::stdout());
        Ok(ExitCode::SUCCESS)
    }
}
