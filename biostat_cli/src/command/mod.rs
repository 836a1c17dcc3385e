use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::settings::{OutputFormat, Settings};

use self::{docs::DocsArg, list::ListArg, run::RunArg, show::ShowArg};

mod docs;
mod list;
mod run;
mod show;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Settings file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Output format
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,
    /// Decimals for numeric results in text reports
    #[arg(long, global = true)]
    decimals: Option<usize>,
    /// Plain ASCII text reports
    #[arg(long, global = true)]
    ascii: bool,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// List available calculators
    List(#[clap(flatten)] ListArg),
    /// Show a calculator's parameters, formula and example
    Show(#[clap(flatten)] ShowArg),
    /// Run a calculator
    Run(#[clap(flatten)] RunArg),
    /// Write the calculator reference (markdown)
    Docs(#[clap(flatten)] DocsArg),
}

impl CommandArgs {
    fn settings(&self) -> anyhow::Result<Settings> {
        Ok(Settings::load_or_default(self.config.as_deref())?.with_overrides(
            self.format,
            self.decimals,
            self.ascii,
        ))
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    let settings = args.settings()?;
    match &args.mode {
        Mode::List(arg) => list::run(arg, &settings)?,
        Mode::Show(arg) => show::run(arg, &settings)?,
        Mode::Run(arg) => run::run(arg, &settings)?,
        Mode::Docs(arg) => docs::run(arg)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = CommandArgs::try_parse_from([
            "biostat",
            "run",
            "paired-t",
            "meanDiff=5",
            "sdDiff=10",
            "--format",
            "json",
            "--ascii",
        ])
        .unwrap();
        let settings = args.settings().unwrap();
        assert_eq!(settings.format, OutputFormat::Json);
        assert!(settings.ascii_only);
        assert!(matches!(args.mode, Mode::Run(_)));
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(CommandArgs::try_parse_from(["biostat"]).is_err());
    }
}
