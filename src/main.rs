use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use study_search::catalog::CatalogState;
use study_search::config::{
    default_config_path, find_config_file, load_config, load_from_env, Config, BASE_URL_ENV,
};
use study_search::query::Operator;
use study_search::ui::{render_studies, render_terms, status_line, RenderOptions, Spinner, Status};
use study_search::Session;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Study Search - build boolean queries over a term vocabulary and browse matching studies
#[derive(Parser, Debug)]
#[command(name = "study-search")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build boolean queries over a term vocabulary and browse matching studies", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base address of the study index (overrides config and environment)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds (default: none)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (text if TTY, JSON otherwise)
    Auto,
    /// Human-readable text
    Text,
    /// JSON format (machine-readable)
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a query once and print one page of results
    #[command(alias = "s")]
    Search {
        /// Boolean query, e.g. "memory AND (recall OR fear)"
        query: String,

        /// Page to show (clamped to the available pages)
        #[arg(long, short, default_value_t = 1, allow_negative_numbers = true)]
        page: i64,
    },

    /// List the term vocabulary
    #[command(alias = "t")]
    Terms {
        /// Only show terms containing this text (case-insensitive)
        #[arg(long, short)]
        filter: Option<String>,
    },

    /// Build a query interactively
    #[command(alias = "sh")]
    Shell,

    /// Write a default configuration file
    InitConfig {
        /// Where to write it (default: user config directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn print_env_vars() {
    println!("Study Search - Environment Variables");
    println!();
    println!("Service:");
    println!("  {}                      Base address of the study index", BASE_URL_ENV);
    println!("  STUDY_SEARCH_SERVICE__BASE_URL             Same, nested form");
    println!("  STUDY_SEARCH_SERVICE__REQUEST_TIMEOUT_SECS Whole-request timeout (default: none)");
    println!("  STUDY_SEARCH_SERVICE__USER_AGENT           User agent sent with requests");
    println!();
    println!("Logging:");
    println!("  STUDY_SEARCH_LOGGING__LEVEL                Default log level (default: info)");
    println!("  STUDY_SEARCH_LOGGING__FORMAT               pretty or json");
    println!("  RUST_LOG                                   Full tracing filter, overrides the level");
    println!();
    println!("Example:");
    println!("  export {}=\"http://localhost:5000\"", BASE_URL_ENV);
    std::process::exit(0);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Show environment variables and exit if requested
    if cli.env {
        print_env_vars();
    }

    let config_path = cli.config.clone().or_else(find_config_file);
    let mut config = match &config_path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => load_from_env()?,
    };
    if let Some(base_url) = &cli.base_url {
        config.service.base_url = base_url.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.service.request_timeout_secs = Some(timeout);
    }

    init_tracing(&cli, &config);

    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }
    tracing::debug!(base_url = %config.service.base_url, "Study index");

    let json = match cli.output {
        OutputFormat::Auto => !std::io::stdout().is_terminal(),
        OutputFormat::Text => false,
        OutputFormat::Json => true,
    };

    match cli.command {
        Some(Commands::Search { query, page }) => run_search(&config, &query, page, json).await,
        Some(Commands::Terms { filter }) => run_terms(&config, filter.as_deref(), json).await,
        Some(Commands::Shell) => run_shell(&config).await,
        Some(Commands::InitConfig { path, force }) => init_config(path, force),
        None => {
            println!("Study Search v{}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Commands:");
            println!("  search <query>   - Run a query and print matching studies");
            println!("  terms            - List the term vocabulary");
            println!("  shell            - Build a query interactively");
            println!("  init-config      - Write a default configuration file");
            Ok(())
        }
    }
}

fn init_tracing(cli: &Cli, config: &Config) {
    let log_level = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("study_search={}", env_filter)),
    );

    // Logs go to stderr so rendered results stay clean on stdout
    if config.logging.format.as_deref() == Some("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run_search(config: &Config, query: &str, page: i64, json: bool) -> Result<()> {
    let index = Arc::new(config.build_index()?);
    let mut session = Session::new(index);

    if let Some(handle) = session.set_full_text(query) {
        let spinner = (!json && std::io::stderr().is_terminal())
            .then(|| Spinner::new("Searching studies…"));
        handle.outcome().await;
        if let Some(spinner) = spinner {
            spinner.finish();
        }
    }
    session.set_page(page);

    let view = session.studies();
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render_studies(&view, RenderOptions::detect()));
    }

    if view.error().is_some() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_terms(config: &Config, filter: Option<&str>, json: bool) -> Result<()> {
    let index = Arc::new(config.build_index()?);
    let session = Session::new(index);
    let state = session.mount().await?;

    let terms = session.catalog().filter(filter.unwrap_or_default());
    if json {
        println!("{}", serde_json::to_string_pretty(&terms)?);
    } else {
        print!("{}", render_terms(&state, &terms, RenderOptions::detect()));
    }

    if matches!(state, CatalogState::Errored(_)) {
        std::process::exit(1);
    }
    Ok(())
}

/// One line of shell input
#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Append(Operator),
    Term(String),
    Set(String),
    Reset,
    Terms(String),
    Page(i64),
    Next,
    Prev,
    Show,
    Help,
    Quit,
}

fn parse_shell_command(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    if let Ok(op) = line.parse::<Operator>() {
        return Ok(ShellCommand::Append(op));
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "term" | "pick" => {
            if rest.is_empty() {
                Err("Usage: term <name>".to_string())
            } else {
                Ok(ShellCommand::Term(rest.to_string()))
            }
        }
        "set" | "query" => Ok(ShellCommand::Set(rest.to_string())),
        "reset" | "clear" => Ok(ShellCommand::Reset),
        "terms" | "filter" => Ok(ShellCommand::Terms(rest.to_string())),
        "page" => rest
            .parse()
            .map(ShellCommand::Page)
            .map_err(|_| "Usage: page <number>".to_string()),
        "next" | "n" => Ok(ShellCommand::Next),
        "prev" | "p" => Ok(ShellCommand::Prev),
        "show" | "" => Ok(ShellCommand::Show),
        "help" | "?" => Ok(ShellCommand::Help),
        "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
        other => Err(format!("Unknown command: {} (try 'help')", other)),
    }
}

fn print_shell_help() {
    println!("Build a query, results refresh as it changes:");
    println!("  AND | OR | NOT | ( | )   append an operator");
    println!("  term <name>              append a term from the catalog");
    println!("  set <text>               replace the whole query");
    println!("  reset                    clear the query");
    println!("  terms [filter]           list catalog terms");
    println!("  page <n> | next | prev   move between result pages");
    println!("  show                     print the current results");
    println!("  quit                     leave the shell");
}

async fn run_shell(config: &Config) -> Result<()> {
    let index = Arc::new(config.build_index()?);
    let mut session = Session::new(index);
    let opts = RenderOptions::detect();

    let mut catalog_load = session.mount();
    let mut catalog_loaded = false;
    let mut revision = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_shell_help();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_shell_command(&line) {
                    Ok(ShellCommand::Quit) => break,
                    Ok(command) => apply_shell_command(&mut session, command, opts),
                    Err(message) => println!("{}", status_line(Status::Error, &message, opts)),
                }
            }
            changed = revision.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("Query: {}", session.query());
                print!("{}", render_studies(&session.studies(), opts));
            }
            state = &mut catalog_load, if !catalog_loaded => {
                catalog_loaded = true;
                match state {
                    Ok(CatalogState::Ready) => println!(
                        "{}",
                        status_line(
                            Status::Success,
                            &format!("{} terms loaded", session.catalog().len()),
                            opts,
                        )
                    ),
                    Ok(CatalogState::Errored(message)) => {
                        println!("{}", status_line(Status::Error, &message, opts))
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "Catalog load task failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

fn apply_shell_command(session: &mut Session, command: ShellCommand, opts: RenderOptions) {
    // Fetch handles are detached; results arrive through the revision channel
    match command {
        ShellCommand::Append(op) => {
            session.append(op);
        }
        ShellCommand::Term(term) => {
            session.pick_term(&term);
        }
        ShellCommand::Set(text) => {
            session.set_full_text(&text);
        }
        ShellCommand::Reset => {
            session.reset();
        }
        ShellCommand::Terms(filter) => {
            let catalog = session.catalog();
            let terms = catalog.filter(&filter);
            print!("{}", render_terms(&catalog.state(), &terms, opts));
        }
        ShellCommand::Page(n) => {
            session.set_page(n);
        }
        ShellCommand::Next => {
            session.next_page();
        }
        ShellCommand::Prev => {
            session.prev_page();
        }
        ShellCommand::Show => {
            println!("Query: {}", session.query());
            print!("{}", render_studies(&session.studies(), opts));
        }
        ShellCommand::Help => print_shell_help(),
        ShellCommand::Quit => {}
    }
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path.or_else(default_config_path) {
        Some(path) => path,
        None => anyhow::bail!("Could not determine a config directory; pass --path"),
    };

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    Config::default().save(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
