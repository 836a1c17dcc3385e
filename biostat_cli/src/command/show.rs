use biostat_core::registry::Calculator;

use crate::{
    report::render_metadata,
    settings::{OutputFormat, Settings},
    util::Output,
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ShowArg {
    /// Calculator slug (see `biostat list`)
    calculator: String,
}

pub(crate) fn run(arg: &ShowArg, settings: &Settings) -> anyhow::Result<()> {
    let meta = Calculator::from_slug(&arg.calculator)?.metadata();

    let mut output = Output::stdout();
    match settings.format {
        OutputFormat::Json => output.write_json(&meta)?,
        OutputFormat::Text => output.write_text(&render_metadata(&meta, settings))?,
    }
    Ok(())
}
