use std::process::ExitCode;

use clap::Parser;
use kg_note::{Cli, Command, Context};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let ctx = Context::new(cli.dir.as_deref(), cli.json);

    match run(&ctx, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(ctx: &Context, command: Command) -> kg_note::Result<()> {
    match command {
        Command::Add { title, tags, content } => cmd::add::run(ctx, title, tags, content),
        Command::Import { file } => cmd::import::run(ctx, file),
        Command::Connect { first, second } => cmd::connect::run(ctx, first, second),
        Command::Edit { note, file } => cmd::edit::run(ctx, note, file),
        Command::List { sort, reverse, tag } => cmd::list::run(ctx, sort, reverse, tag),
        Command::Search { query, context, limit } => cmd::search::run(ctx, query, context, limit),
        Command::Stats => cmd::stats::run(ctx),
        Command::Export { format, output } => cmd::export::run(ctx, format, output),
        Command::Visualize { output, format, layout, filter } => {
            cmd::visualize::run(ctx, output, format, layout, filter)
        }
        Command::Frontmatter(action) => cmd::frontmatter::run(ctx, action),
        Command::Check { repair } => cmd::check::run(ctx, repair),
    }
}

mod cmd {
    pub mod add;
    pub mod check;
    pub mod connect;
    pub mod edit;
    pub mod export;
    pub mod frontmatter;
    pub mod import;
    pub mod list;
    pub mod resolve;
    pub mod search;
    pub mod stats;
    pub mod visualize;
}
