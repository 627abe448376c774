//! folio - search index, posts and previews for a static portfolio blog.

mod build;
mod cli;
mod config;
mod generator;
mod inline;
mod posts;
mod search;
mod serve;
mod show;
mod utils;

use anyhow::Result;
use build::{build_site, index_site};
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use serve::serve_site;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SiteConfig::load(&cli)?;

    match &cli.command {
        Commands::Build { skip_generate } => {
            let output = build_site(&config, *skip_generate)?;
            if let Some(report) = &output.index {
                log!("build"; "search index: {} files", report.written.len());
            }
            for path in output.sitemap.iter().chain(&output.robots) {
                log!("build"; "wrote {}", path.display());
            }
            log!("build"; "done, {} pages", output.urls.len());
            Ok(())
        }
        Commands::Index => {
            let written = index_site(&config)?;
            log!("search"; "wrote {} index files", written.len());
            Ok(())
        }
        Commands::Posts { limit } => show::list_posts(&config, *limit),
        Commands::Post { slug } => show::show_post(&config, slug),
        Commands::Search { query, .. } => show::search(&config, &query.join(" ")),
        Commands::Serve { .. } => serve_site(&config),
    }
}
