//! Frontmatter maintenance: normalize everything, or set/append one field

use kg_note::{Context, Error, FrontmatterCommand, Result, display_path};

pub fn run(ctx: &Context, action: FrontmatterCommand) -> Result<()> {
    match action {
        FrontmatterCommand::Normalize => normalize(ctx),
        FrontmatterCommand::Set { note, key, value } => {
            let corpus = super::resolve::load_corpus(ctx)?;
            let target = super::resolve::resolve_note(&corpus, &note)?;
            let value: serde_yaml::Value = serde_yaml::from_str(&value)?;
            ctx.store().set_field(&target.path, &key, value)?;
            println!("Updated {} in {}", key, display_path(&target.path));
            Ok(())
        }
        FrontmatterCommand::Append { note, key, value } => {
            let corpus = super::resolve::load_corpus(ctx)?;
            let target = super::resolve::resolve_note(&corpus, &note)?;
            ctx.store().update_field(&target.path, &key, &value)?;
            println!("Appended to {} in {}", key, display_path(&target.path));
            Ok(())
        }
    }
}

fn normalize(ctx: &Context) -> Result<()> {
    let report = ctx.store().normalize_all()?;
    for path in &report.changed {
        println!("Normalized frontmatter in {}", display_path(path));
    }
    println!(
        "{} changed, {} already normalized",
        report.changed.len(),
        report.unchanged
    );
    super::resolve::report_errors(&report.errors);
    if report.errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} file(s) could not be normalized",
            report.errors.len()
        )))
    }
}
