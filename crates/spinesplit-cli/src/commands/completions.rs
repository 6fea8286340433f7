//! Hidden `spinesplit completions <shell>`: emits a shell completion script.
//!
//! Ambient CLI nicety grounded on `shnn-cli`'s `clap_complete` dependency.

use clap::{Args, CommandFactory, ValueEnum};
use clap_complete::{generate, Shell};

use crate::commands::Cli;
use crate::error::CliResult;

/// Generate a shell completion script on stdout.
#[derive(Args, Debug)]
pub struct CompletionsCommand {
    /// Target shell.
    #[arg(value_enum)]
    pub shell: ShellArg,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl From<ShellArg> for Shell {
    fn from(value: ShellArg) -> Self {
        match value {
            ShellArg::Bash => Shell::Bash,
            ShellArg::Zsh => Shell::Zsh,
            ShellArg::Fish => Shell::Fish,
            ShellArg::PowerShell => Shell::PowerShell,
            ShellArg::Elvish => Shell::Elvish,
        }
    }
}

impl CompletionsCommand {
    pub fn execute(self) -> CliResult<()> {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(Shell::from(self.shell), &mut cmd, name, &mut std::io::stdout());
        Ok(())
    }
}
