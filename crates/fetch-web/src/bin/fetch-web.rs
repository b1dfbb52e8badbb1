// ABOUTME: CLI binary for extracting article listings and article bodies from RSC-rendered pages.
// ABOUTME: Reads pages over HTTP or from local HTML files; logs go to stderr, results to stdout.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sitegen_fetch_web::{Client, ContentType, FetchedArticle};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fetch-web")]
#[command(about = "Extract article listings and bodies from Next.js pages")]
struct Cli {
    /// Request timeout in seconds
    #[arg(long = "timeout", default_value_t = 15, global = true)]
    timeout: u64,

    /// User-Agent header sent with every request
    #[arg(long = "user-agent", global = true)]
    user_agent: Option<String>,

    /// Site base prepended to listing paths when building article URLs
    #[arg(long = "site-base", global = true)]
    site_base: Option<String>,

    /// Output JSON instead of rendered content
    #[arg(long = "json", global = true)]
    json_output: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the article stubs found on a listing page as JSON
    Listing {
        feed_url: String,
        /// Read the page from this file instead of fetching it
        #[arg(long = "html")]
        html: Option<PathBuf>,
    },
    /// Print one article
    Article {
        url: String,
        /// Read the page from this file instead of fetching it
        #[arg(long = "html")]
        html: Option<PathBuf>,
        /// Output format: markdown (default), html, json
        #[arg(short = 'f', long = "format", default_value = "markdown")]
        format: String,
    },
    /// Fetch a listing and every article on it, printing JSON
    Crawl {
        feed_url: String,
        /// Stop after this many articles
        #[arg(long = "limit")]
        limit: Option<usize>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_client(cli: &Cli) -> Client {
    let mut builder = Client::builder().timeout(Duration::from_secs(cli.timeout));
    if let Some(ua) = &cli.user_agent {
        builder = builder.user_agent(ua);
    }
    if let Some(base) = &cli.site_base {
        builder = builder.site_base(base);
    }
    builder.build()
}

fn read_html(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn render_article(article: &FetchedArticle, format: &str, json_output: bool) -> Result<String> {
    if json_output || format.eq_ignore_ascii_case("json") {
        return Ok(serde_json::to_string_pretty(article)?);
    }
    Ok(match ContentType::from(format) {
        ContentType::Markdown => article.format_markdown(),
        ContentType::Html => article.html.clone(),
    })
}

async fn run(cli: Cli) -> Result<()> {
    let client = build_client(&cli);

    match &cli.command {
        Command::Listing { feed_url, html } => {
            let stubs = match html {
                Some(path) => client.parse_listing_html(&read_html(path)?, feed_url),
                None => client.fetch_listing(feed_url).await?,
            };
            println!("{}", serde_json::to_string_pretty(&stubs)?);
        }
        Command::Article { url, html, format } => {
            let article = match html {
                Some(path) => client.parse_article_html(&read_html(path)?, url),
                None => client.fetch_article(url).await?,
            };
            if article.is_empty() {
                bail!("no article content found for {}", url);
            }
            println!("{}", render_article(&article, format, cli.json_output)?);
        }
        Command::Crawl { feed_url, limit } => {
            let mut stubs = client.fetch_listing(feed_url).await?;
            if let Some(limit) = limit {
                stubs.truncate(*limit);
            }
            info!(count = stubs.len(), "fetching articles");

            let mut articles = Vec::new();
            let mut failed = 0usize;
            for result in client.fetch_articles(&stubs).await {
                match result {
                    Ok(article) => articles.push(article),
                    Err(e) => {
                        eprintln!("error: {}", e);
                        failed += 1;
                    }
                }
            }
            println!("{}", serde_json::to_string_pretty(&articles)?);
            if failed > 0 {
                bail!("{} of {} articles failed", failed, stubs.len());
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
