use anyhow::Result;
use clap::{Parser, Subcommand};
use crawler::CrawlConfig;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

mod session;

use session::{Flow, Session, PROMPT};

#[derive(Parser)]
#[command(name = "tiersearch")]
#[command(about = "Crawl a site into a positional index and search it by phrase", long_about = None)]
struct Cli {
    /// Index file path
    #[arg(long, global = true, env = "TIERSEARCH_INDEX", default_value = "./index.json")]
    index: PathBuf,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the site and write the index file
    Build {
        #[command(flatten)]
        crawl: CrawlConfig,
    },
    /// Show the postings of one word
    Print { word: String },
    /// Search the index for a word or phrase
    Find {
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,
    },
    /// Interactive session (the default)
    Shell {
        #[command(flatten)]
        crawl: CrawlConfig,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    let mut stdout = std::io::stdout();

    match cli.command {
        Some(Commands::Build { crawl }) => {
            let meta = Session::new(cli.index.clone(), crawl).build().await?;
            writeln!(stdout, "Indexed {} pages ({} terms) into {}", meta.num_pages, meta.num_terms, cli.index.display())?;
        }
        Some(Commands::Print { word }) => {
            let mut session = Session::new(cli.index, CrawlConfig::default());
            session.load()?;
            session.print_term(&word, &mut stdout)?;
        }
        Some(Commands::Find { words }) => {
            let mut session = Session::new(cli.index, CrawlConfig::default());
            session.load()?;
            session.find(&words.join(" "), &mut stdout)?;
        }
        Some(Commands::Shell { crawl }) => run_shell(Session::new(cli.index, crawl)).await?,
        None => run_shell(Session::new(cli.index, CrawlConfig::from_env()?)).await?,
    }
    Ok(())
}

async fn run_shell(mut session: Session) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();
    loop {
        write!(stdout, "{PROMPT}")?;
        stdout.flush()?;
        let Some(line) = lines.next_line().await? else { break };
        if session.execute(&line, &mut stdout).await? == Flow::Exit {
            break;
        }
    }
    Ok(())
}
