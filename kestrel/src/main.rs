use std::time::Instant;

use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::discover::Kestrel;

mod config;
mod discover;
mod render;
mod util;

pub const CONTENT_DIR: &str = "content";
pub const POSTS_DIR: &str = "_posts";
pub const CONFIG_FILE: &str = "config.toml";

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// Builds a site, embedding Graphviz diagrams as inline SVG images.
        cmd kestrel {
            /// Log at debug level unless `RUST_LOG` says otherwise.
            optional -v, --verbose

            /// Renders `<input>/content` into `<output>`.
            cmd build {
                required input: PathBuf
                required output: PathBuf
            }

            /// Embeds the diagrams in a single markdown file.
            cmd embed {
                required file: PathBuf
                /// Write here instead of to stdout.
                optional -o, --output output: PathBuf
                /// Omit the diagram source comment.
                optional --no-comment
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build(input: &std::path::Path, output: &std::path::Path) -> plumage::error::Result<()> {
    let start = Instant::now();
    let kestrel = Kestrel::new(input, output)?;
    let discovered = kestrel.discover()?;
    tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "discovery finished");

    let render = Instant::now();
    kestrel.build(discovered)?;
    tracing::info!(elapsed_ms = render.elapsed().as_millis() as u64, "render finished");
    tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, output = %output.display(), "site built");
    Ok(())
}

pub fn main() {
    let flags = flags::Kestrel::from_env_or_exit();
    init_tracing(flags.verbose);

    let result = match flags.subcommand {
        flags::KestrelCmd::Build(cmd) => build(&cmd.input, &cmd.output),
        flags::KestrelCmd::Embed(cmd) => std::env::current_dir()
            .map_err(plumage::error::Error::from)
            .and_then(|cwd| Config::discover(&cwd))
            .and_then(|config| {
                render::embed(&config, &cmd.file, cmd.output.as_deref(), !cmd.no_comment)
            }),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
