//! Connect two notes in both directions

use kg_note::{ConnectionGraph, Context, Result};

pub fn run(ctx: &Context, first: String, second: String) -> Result<()> {
    let corpus = super::resolve::load_corpus(ctx)?;
    let a = super::resolve::resolve_note(&corpus, &first)?.id.clone();
    let b = super::resolve::resolve_note(&corpus, &second)?.id.clone();

    let mut graph = ConnectionGraph::from_corpus(&corpus);
    let outcome = graph.connect(&ctx.store(), &a, &b)?;

    if outcome.forward_added || outcome.reverse_added {
        println!("Connected {} <-> {}", a, b);
    } else {
        println!("{} and {} were already connected", a, b);
    }
    Ok(())
}
