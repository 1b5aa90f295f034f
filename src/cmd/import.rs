//! Import an external markdown file

use std::path::Path;

use kg_note::{Context, Result, display_path};

pub fn run(ctx: &Context, file: String) -> Result<()> {
    let store = ctx.store();
    let id = store.import_external(Path::new(&file))?;
    println!("{}", display_path(&store.note_path(&id)));
    Ok(())
}
