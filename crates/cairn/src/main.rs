mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Command::Init { path } => commands::init::run(&path),
        Command::CatFile { kind, object } => commands::cat_file::run(kind, &object),
        Command::HashObject { kind, write, path } => commands::hash_object::run(kind, write, &path),
        Command::Log { commit, max_count } => commands::log::run(&commit, max_count),
        Command::LsTree { recursive, tree } => commands::ls_tree::run(recursive, &tree),
        Command::Checkout { commit, path } => commands::checkout::run(&commit, &path),
        Command::ShowRef => commands::show_ref::run(),
        Command::Tag {
            annotate,
            message,
            name,
            object,
        } => commands::tag::run(annotate, message.as_deref(), name.as_deref(), &object),
        Command::RevParse { kind, name } => commands::rev_parse::run(kind, &name),
        Command::LsFiles { verbose } => commands::ls_files::run(verbose),
        Command::CheckIgnore { paths } => commands::check_ignore::run(&paths),
        Command::Status => commands::status::run(),
        Command::Add { paths } => commands::add::run(&paths),
        Command::Rm { paths } => commands::rm::run(&paths),
        Command::Commit { message } => commands::commit::run(&message),
    };

    if let Err(e) = result {
        eprintln!("fatal: {}", e);
        std::process::exit(e.exit_code());
    }
}
