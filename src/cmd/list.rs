//! List notes with their metadata

use serde::Serialize;

use kg_note::{Context, Result, SortKey};

#[derive(Serialize)]
struct Row<'a> {
    id: &'a str,
    title: &'a str,
    tags: &'a [String],
    date: Option<&'a str>,
    lastmod: Option<&'a str>,
}

pub fn run(ctx: &Context, sort: SortKey, reverse: bool, tag: Option<String>) -> Result<()> {
    let corpus = super::resolve::load_corpus(ctx)?;
    let notes = corpus.listing(sort, reverse, tag.as_deref());

    let rows: Vec<Row<'_>> = notes
        .iter()
        .map(|n| Row {
            id: &n.id,
            title: n.title(),
            tags: n.tags(),
            date: n.frontmatter.date.as_deref(),
            lastmod: n.frontmatter.last_modified.as_deref(),
        })
        .collect();

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let width = rows.iter().map(|r| r.title.chars().count()).max().unwrap_or(0).max(5);
    println!("{:<width$}  {:<10}  {:<10}  TAGS", "TITLE", "DATE", "LASTMOD", width = width);
    for row in &rows {
        println!(
            "{:<width$}  {:<10}  {:<10}  {}",
            row.title,
            row.date.unwrap_or("-"),
            row.lastmod.unwrap_or("-"),
            row.tags.join(", "),
            width = width
        );
    }
    Ok(())
}
