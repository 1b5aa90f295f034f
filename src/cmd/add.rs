//! Create a new note

use std::io::IsTerminal;

use kg_note::{Context, Result, display_path};

pub fn run(ctx: &Context, title: String, tags: Vec<String>, content: Option<String>) -> Result<()> {
    let body = match content {
        Some(text) => text,
        None if std::io::stdin().is_terminal() => String::new(),
        None => super::resolve::read_input(None)?,
    };

    let store = ctx.store();
    let id = store.create(&title, &tags, &body)?;

    // Output full path for shell pipeline compatibility
    println!("{}", display_path(&store.note_path(&id)));
    Ok(())
}
