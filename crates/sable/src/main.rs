use std::process::ExitCode;

use anyhow::Context as _;
use camino::Utf8PathBuf;
use clap::Parser;
use sable_db::{FsContentProvider, Renderer, Workspace};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
enum Options {
    /// Parses a file and reports its diagnostics.
    Check {
        path: Utf8PathBuf,
        /// Show annotated source snippets instead of one line per error.
        #[arg(long)]
        snippets: bool,
        /// Print the syntax tree to stdout.
        #[arg(long)]
        dump: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SABLE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    match Options::parse() {
        Options::Check { path, snippets, dump } => {
            let mut workspace = Workspace::new(FsContentProvider);
            let file =
                workspace.open(&path).with_context(|| format!("failed to read `{path}`"))?;

            let parse = workspace.parse(file);
            if dump {
                print!("{}", parse.debug_dump());
            }
            let errors = workspace.get_parse_errors(file);
            info!(%path, count = errors.len(), "checked");

            let renderer = Renderer::styled();
            for error in &errors {
                if snippets {
                    eprintln!("{}", workspace.render_snippet(file, error, &renderer));
                } else {
                    eprintln!("{}", workspace.render(file, error));
                }
            }

            Ok(if errors.is_empty() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}
