use clap::{Parser, Subcommand};
use search_session::StrategyKind;

#[derive(Parser, Debug)]
#[command(name = "capstone-search", about = "Search the capstone repository", version)]
pub struct Cli {
    /// Service base URL; overrides `CAPSTONE_API_URL`.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Bearer credential; overrides `CAPSTONE_API_TOKEN`.
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Emit JSON instead of human-readable output (resource commands).
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one search and wait for its summary.
    Search {
        /// Free-text query.
        query: String,
        /// Result page, 1-based.
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        /// Summary strategy; defaults to `SUMMARY_STRATEGY`.
        #[arg(long, value_parser = parse_strategy)]
        strategy: Option<StrategyKind>,
    },
    /// Open a shared location such as `/?search=drones`.
    Open {
        location: String,
        #[arg(long, value_parser = parse_strategy)]
        strategy: Option<StrategyKind>,
    },
    /// Interactive search: each line is debounced into a search.
    /// `:p N` switches page, `:q` quits.
    Live {
        #[arg(long, value_parser = parse_strategy)]
        strategy: Option<StrategyKind>,
    },
    /// Capstone records.
    #[command(subcommand)]
    Capstones(CapstonesCommand),
    /// User accounts.
    #[command(subcommand)]
    Users(UsersCommand),
    /// Exchange credentials for an access token.
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "CAPSTONE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the current session on the server.
    Logout,
    /// Show the account the credential belongs to.
    Whoami,
}

#[derive(Subcommand, Debug)]
pub enum CapstonesCommand {
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        per_page: u32,
        /// Full-text filter.
        #[arg(short, long)]
        query: Option<String>,
    },
    Show {
        id: i64,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        per_page: u32,
        /// Email filter.
        #[arg(short, long)]
        search: Option<String>,
    },
    Show {
        id: i64,
    },
    Delete {
        id: i64,
    },
}

fn parse_strategy(s: &str) -> Result<StrategyKind, String> {
    s.parse::<StrategyKind>().map_err(|e| e.to_string())
}
