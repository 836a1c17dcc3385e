use std::path::PathBuf;

use biostat_core::registry::generate_calculators_markdown;

use crate::util::Output;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct DocsArg {
    /// Output file path (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &DocsArg) -> anyhow::Result<()> {
    let markdown = generate_calculators_markdown();
    let mut output = Output::from_output_path(arg.output.clone())?;
    output.write_text(&markdown)?;
    if arg.output.is_some() {
        eprintln!("Wrote {} bytes to {}", markdown.len(), output.display_path());
    }
    Ok(())
}
