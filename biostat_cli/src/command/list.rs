use std::fmt::Write as _;

use biostat_core::registry::{Calculator, Category};

use crate::{
    report::to_ascii,
    settings::{OutputFormat, Settings},
    util::Output,
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ListArg {
    /// Only this category (e.g. "survival", "meta-analysis")
    #[arg(long)]
    category: Option<String>,
}

fn category_matches(category: Category, filter: &str) -> bool {
    let name = category.display_name().to_ascii_lowercase().replace(' ', "-");
    name == filter.trim().to_ascii_lowercase().replace(' ', "-")
}

fn selected(filter: Option<&str>) -> Vec<Category> {
    Category::all()
        .iter()
        .copied()
        .filter(|category| filter.map_or(true, |f| category_matches(*category, f)))
        .collect()
}

pub(crate) fn run(arg: &ListArg, settings: &Settings) -> anyhow::Result<()> {
    let categories = selected(arg.category.as_deref());
    if categories.is_empty() {
        let names: Vec<&str> = Category::all().iter().map(|c| c.display_name()).collect();
        anyhow::bail!(
            "Unknown category {:?}; expected one of: {}",
            arg.category.as_deref().unwrap_or_default(),
            names.join(", ")
        );
    }

    let mut output = Output::stdout();
    match settings.format {
        OutputFormat::Json => {
            let metadata: Vec<_> = categories
                .iter()
                .flat_map(|category| Calculator::in_category(*category))
                .map(|calculator| calculator.metadata())
                .collect();
            output.write_json(&metadata)?;
        }
        OutputFormat::Text => {
            let mut text = String::new();
            for category in categories {
                let _ = writeln!(text, "{}", category.display_name());
                for calculator in Calculator::in_category(category) {
                    let meta = calculator.metadata();
                    let _ = writeln!(text, "  {:<28} {}", meta.slug, meta.title);
                }
                text.push('\n');
            }
            if settings.ascii_only {
                text = to_ascii(&text);
            }
            output.write_text(&text)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_filter() {
        assert_eq!(selected(None).len(), Category::all().len());
        assert_eq!(selected(Some("Meta-Analysis")), vec![Category::MetaAnalysis]);
        assert_eq!(selected(Some("cluster rct")), vec![Category::ClusterRct]);
        assert!(selected(Some("astrology")).is_empty());
    }
}
