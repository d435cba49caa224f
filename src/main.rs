use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::debug;

use secure_vault::cli::{self, Context};
use secure_vault::config::{default_data_dir, DATA_DIR_ENV};
use secure_vault::entry::{CategoryPatch, NewCategory};
use secure_vault::generator::{GeneratorOptions, DEFAULT_LENGTH};
use secure_vault::Result;

#[derive(Parser)]
#[command(name = "secure-vault")]
#[command(author = "Oleg")]
#[command(version)]
#[command(about = "Local encrypted password vault", long_about = None)]
struct Cli {
    /// Directory holding the vault files
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Log level for diagnostics on stderr (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new vault with a master passphrase
    Init,

    /// Show whether a vault exists and how many entries it holds
    Status,

    /// Add an entry
    Add,

    /// Edit an entry
    Edit {
        /// Entry id
        id: u64,
    },

    /// Show one entry
    Show {
        /// Entry id
        id: u64,
        /// Print the password and notes in clear
        #[arg(long)]
        reveal: bool,
    },

    /// List all entries
    List,

    /// Find entries by title, username or URL
    Search {
        /// Case-insensitive text to look for
        query: String,
    },

    /// Delete an entry
    Remove {
        /// Entry id
        id: u64,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Generate a random password
    Generate(GenerateArgs),

    /// Write all entries, decrypted, to a JSON file
    Export {
        /// Destination file
        file: PathBuf,
        /// Overwrite without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Add entries from a JSON file produced by export
    Import {
        /// Source file
        file: PathBuf,
    },

    /// List categories, or change them with a subcommand
    Categories {
        #[command(subcommand)]
        action: Option<CategoryAction>,
    },

    /// List tags in use
    Tags,
}

#[derive(Subcommand)]
enum CategoryAction {
    /// Create a category
    Add {
        name: String,
        /// Icon name shown next to the category
        #[arg(long)]
        icon: Option<String>,
        /// Display color as #rrggbb
        #[arg(long)]
        color: Option<String>,
    },

    /// Rename a category or change its icon or color
    Edit {
        name: String,
        /// New name; entries in the category move with it
        #[arg(long)]
        rename: Option<String>,
        /// New icon name
        #[arg(long)]
        icon: Option<String>,
        /// New color as #rrggbb
        #[arg(long)]
        color: Option<String>,
    },

    /// Delete a category; its entries are kept without one
    Remove {
        name: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Number of characters
    #[arg(short, long, default_value_t = DEFAULT_LENGTH)]
    length: usize,
    /// Leave out uppercase letters
    #[arg(long)]
    no_upper: bool,
    /// Leave out lowercase letters
    #[arg(long)]
    no_lower: bool,
    /// Leave out digits
    #[arg(long)]
    no_digits: bool,
    /// Leave out symbols
    #[arg(long)]
    no_symbols: bool,
}

impl From<&GenerateArgs> for GeneratorOptions {
    fn from(args: &GenerateArgs) -> Self {
        Self {
            length: args.length,
            uppercase: !args.no_upper,
            lowercase: !args.no_lower,
            digits: !args.no_digits,
            symbols: !args.no_symbols,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Generating needs no vault
    if let Commands::Generate(args) = &cli.command {
        return cli::generate::run(&GeneratorOptions::from(args));
    }

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    debug!(data_dir = %data_dir.display(), "opening vault");
    let ctx = Context::open(data_dir)?;

    match cli.command {
        Commands::Init => cli::init::run(&ctx).await,
        Commands::Status => cli::status::run(&ctx),
        Commands::Add => cli::entry::add(&ctx).await,
        Commands::Edit { id } => cli::entry::edit(&ctx, id).await,
        Commands::Show { id, reveal } => cli::entry::show(&ctx, id, reveal).await,
        Commands::List => cli::entry::list(&ctx).await,
        Commands::Search { query } => cli::entry::search(&ctx, &query).await,
        Commands::Remove { id, yes } => cli::entry::remove(&ctx, id, yes).await,
        Commands::Export { file, yes } => cli::transfer::export(&ctx, &file, yes).await,
        Commands::Import { file } => cli::transfer::import(&ctx, &file).await,
        Commands::Categories { action } => run_category(&ctx, action).await,
        Commands::Tags => cli::category::tags(&ctx),
        Commands::Generate(_) => Ok(()),
    }
}

async fn run_category(ctx: &Context, action: Option<CategoryAction>) -> Result<()> {
    match action {
        None => cli::category::list(ctx),
        Some(CategoryAction::Add { name, icon, color }) => {
            cli::category::add(ctx, &NewCategory { name, icon, color }).await
        }
        Some(CategoryAction::Edit { name, rename, icon, color }) => {
            let patch = CategoryPatch {
                name: rename,
                icon,
                color,
            };
            cli::category::update(ctx, &name, &patch).await
        }
        Some(CategoryAction::Remove { name, yes }) => cli::category::remove(ctx, &name, yes).await,
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("secure_vault={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
