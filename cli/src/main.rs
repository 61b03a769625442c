//! Storefront CLI binary: manage the session and drive the settings client from a shell.
//!
//! Subcommands: `login`, `logout`, `refresh`, `save`, `purge`.

mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use storefront::{ActiveClass, ClientConfig, SettingsClient, ThemeType, View};

#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(about = "Storefront settings client: log in, refresh, save and purge themes")]
struct Args {
    #[command(subcommand)]
    cmd: Command,

    /// Session file (default: STOREFRONT_SESSION_FILE or the user data directory)
    #[arg(long, global = true, value_name = "PATH")]
    session: Option<PathBuf>,

    /// Verbose: debug logs for cache, limiter and retries on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Store brand (and user) identity in the session
    Login {
        #[arg(long, value_name = "ID")]
        brand_id: String,
        #[arg(long, value_name = "ID")]
        user_id: Option<String>,
    },
    /// Remove identity and the cached header config
    Logout,
    /// Fetch settings for the logged-in brand and print them as JSON
    Refresh {
        /// Extra data to load: home_sections, banner or theme_settings
        #[arg(long, value_name = "CLASS")]
        class: Option<ActiveClass>,
        /// Editor view the refresh runs for
        #[arg(long, value_name = "VIEW", default_value = "home")]
        view: View,
        /// Pretty-print (multi-line) JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Validate a theme JSON file and save it upstream
    Save {
        #[arg(long, value_name = "TYPE", default_value = "web")]
        theme: ThemeType,
        #[arg(long, value_name = "PATH")]
        file: PathBuf,
    },
    /// Purge upstream caches and rebuild home sections from fresh catalog data
    Purge,
}

fn print_json(value: &impl serde::Serialize, pretty: bool) -> Result<(), Box<dyn std::error::Error>> {
    let s = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", s);
    Ok(())
}

fn make_client() -> Result<(ClientConfig, Arc<SettingsClient>), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let client = Arc::new(SettingsClient::from_config(&config)?);
    Ok((config, client))
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let session = cli::open_session(args.session.clone())?;
    match args.cmd {
        Command::Login { brand_id, user_id } => {
            cli::login(session.as_ref(), &brand_id, user_id.as_deref());
            eprintln!("logged in as brand {} ({})", brand_id, session.path().display());
        }
        Command::Logout => {
            cli::logout(session.as_ref());
            eprintln!("logged out");
        }
        Command::Refresh {
            class,
            view,
            pretty,
        } => {
            let (config, client) = make_client()?;
            let settings = cli::refresh(&config, client, session, class, view).await?;
            print_json(&settings, pretty)?;
        }
        Command::Save { theme, file } => {
            let (_, client) = make_client()?;
            let result = cli::save(&client, session.as_ref(), theme, &file).await?;
            print_json(&result, false)?;
        }
        Command::Purge => {
            let (_, client) = make_client()?;
            let report = cli::purge(&client, session.as_ref()).await?;
            print_json(&report, true)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = config::load_and_apply(storefront::config::APP_NAME, None) {
        eprintln!("storefront: config not loaded: {}", e);
    }
    let log_guard = match logging::init(args.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("storefront: logging: {}", e);
            None
        }
    };

    if let Err(e) = run(args).await {
        eprintln!("storefront: {}", e);
        drop(log_guard);
        std::process::exit(1);
    }
}
