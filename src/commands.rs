//! Command handlers. Each returns `anyhow::Result` to `main`.

use anyhow::{Context, Result, bail};
use capstone_api::types::{Capstone, Page, User};
use capstone_api::{
    ApiConfig, CapstoneClient, DEFAULT_TIMEOUT_SECS, env_opt_u64, opt_env, validate_http_endpoint,
};
use colored::Colorize;
use search_session::{
    Debouncer, SearchExecutor, SearchOutcome, SessionConfig, StrategyKind, SummaryPhase,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::cli::{CapstonesCommand, Cli, Command, UsersCommand};
use crate::terminal_view::TerminalView;

type Executor = SearchExecutor<CapstoneClient, TerminalView>;

pub async fn run(cli: Cli) -> Result<()> {
    let client = build_client(&cli)?;
    info!(base = client.base_url(), "client ready");

    match cli.command {
        Command::Search { query, page, strategy } => {
            let exec = executor(&client, strategy)?;
            let outcome = exec.run_search(&query, page).await;
            finish_search(&exec, outcome).await
        }
        Command::Open { location, strategy } => {
            let exec = executor(&client, strategy)?;
            let outcome = exec.open_location(&location).await;
            if outcome == SearchOutcome::Skipped {
                bail!("location {location:?} carries no search query");
            }
            finish_search(&exec, outcome).await
        }
        Command::Live { strategy } => live(executor(&client, strategy)?).await,
        Command::Capstones(cmd) => capstones(&client, cmd, cli.json).await,
        Command::Users(cmd) => users(&client, cmd, cli.json).await,
        Command::Login { username, password } => {
            let resp = client.login(&username, &password).await?;
            println!("{} {}", "Logged in as".green(), resp.data.user.email.bold());
            println!("export CAPSTONE_API_TOKEN={}", resp.data.access_token);
            Ok(())
        }
        Command::Logout => {
            let msg = client.logout().await?;
            println!("{msg}");
            Ok(())
        }
        Command::Whoami => {
            let me = client.current_user().await?;
            match me.email {
                Some(email) => println!("{} ({})", email.bold(), me.role.unwrap_or_default()),
                None => println!("{}", "anonymous".dimmed()),
            }
            Ok(())
        }
    }
}

/* ------------------------------ wiring ------------------------------ */

fn build_client(cli: &Cli) -> Result<CapstoneClient> {
    let mut cfg = match &cli.base_url {
        Some(url) => {
            validate_http_endpoint("--base-url", url.trim())?;
            let mut cfg = ApiConfig::new(url.trim());
            cfg.token = opt_env("CAPSTONE_API_TOKEN");
            cfg.timeout_secs =
                env_opt_u64("CAPSTONE_API_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);
            cfg
        }
        None => ApiConfig::from_env().context("set CAPSTONE_API_URL or pass --base-url")?,
    };
    if cli.token.is_some() {
        cfg = cfg.with_token(cli.token.clone());
    }
    Ok(CapstoneClient::new(cfg)?)
}

fn executor(client: &CapstoneClient, strategy: Option<StrategyKind>) -> Result<Executor> {
    let mut cfg = SessionConfig::from_env()?;
    if let Some(s) = strategy {
        cfg = cfg.with_strategy(s);
    }
    debug!(?cfg, "session config");
    Ok(SearchExecutor::new(
        client.clone(),
        TerminalView::new(client.base_url()),
        cfg,
    ))
}

/// Waits for the summary region to settle when an acquisition was started.
async fn finish_search(exec: &Executor, outcome: SearchOutcome) -> Result<()> {
    match outcome {
        SearchOutcome::Rendered { summary_started: true, .. } => {
            let mut phase = exec.summary_phase();
            phase
                .wait_for(|p| p.is_settled())
                .await
                .context("summary channel closed")?;
            Ok(())
        }
        SearchOutcome::Rendered { .. } | SearchOutcome::Skipped | SearchOutcome::Superseded => {
            Ok(())
        }
        SearchOutcome::Failed(err) => Err(err).context("search failed"),
    }
}

/* ------------------------------ live mode ------------------------------ */

async fn live(exec: Executor) -> Result<()> {
    let debouncer = Debouncer::new(exec.config().debounce_delay);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "{}",
        "Type a query. `:p N` switches page, `:q` quits.".dimmed()
    );

    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line == ":q" {
            break;
        }

        if let Some(arg) = line.strip_prefix(":p") {
            let Ok(page) = arg.trim().parse::<u32>() else {
                println!("{}", "usage: :p <page>".yellow());
                continue;
            };
            let Some(query) = exec.session().await.query().map(str::to_string) else {
                println!("{}", "no active query".yellow());
                continue;
            };
            debouncer.cancel();
            exec.run_search(&query, page).await;
            continue;
        }

        let exec = exec.clone();
        debouncer.schedule(async move {
            exec.run_search(&line, 1).await;
        });
    }

    debouncer.cancel();
    if *exec.summary_phase().borrow() == SummaryPhase::Loading {
        debug!("leaving live mode with a summary in flight");
    }
    Ok(())
}

/* ------------------------------ resources ------------------------------ */

async fn capstones(client: &CapstoneClient, cmd: CapstonesCommand, json: bool) -> Result<()> {
    match cmd {
        CapstonesCommand::List { page, per_page, query } => {
            let list = client.list_capstones(page, per_page, query.as_deref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                print_capstone_page(&list);
            }
        }
        CapstonesCommand::Show { id } => {
            let c = client.get_capstone(id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&c)?);
            } else {
                print_capstone(&c);
            }
        }
        CapstonesCommand::Delete { id } => {
            let msg = client.delete_capstone(id).await?;
            println!("{msg}");
        }
    }
    Ok(())
}

async fn users(client: &CapstoneClient, cmd: UsersCommand, json: bool) -> Result<()> {
    match cmd {
        UsersCommand::List { page, per_page, search } => {
            let list = client.list_users(page, per_page, search.as_deref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                print_user_page(&list);
            }
        }
        UsersCommand::Show { id } => {
            let u = client.get_user(id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&u)?);
            } else {
                println!("{:>5}  {}  {}", u.id, u.email.bold(), u.role.dimmed());
            }
        }
        UsersCommand::Delete { id } => {
            let msg = client.delete_user(id).await?;
            println!("{msg}");
        }
    }
    Ok(())
}

fn page_footer<T>(page: &Page<T>) -> String {
    format!(
        "page {} of {} ({} total)",
        page.page,
        search_session::total_pages(page.total, page.per_page),
        page.total
    )
}

fn print_capstone_page(page: &Page<Capstone>) {
    for c in &page.results {
        let title = c.title.as_deref().unwrap_or("(untitled)");
        let year = c.year.map(|y| y.to_string()).unwrap_or_default();
        println!("{:>5}  {}  {}", c.id, title.bold(), year.dimmed());
    }
    println!("{}", page_footer(page).dimmed());
}

fn print_capstone(c: &Capstone) {
    println!("{}", c.title.as_deref().unwrap_or("(untitled)").bold());
    if !c.authors.is_empty() {
        println!("{}", c.authors.join(", "));
    }
    let meta: Vec<String> = [
        c.year.map(|y| y.to_string()),
        c.course.clone(),
        c.host.clone(),
        c.doc_type.clone(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !meta.is_empty() {
        println!("{}", meta.join(" | ").dimmed());
    }
    if let Some(a) = &c.abstract_text {
        println!("\n{a}");
    }
    if !c.keywords.is_empty() {
        println!("\n{} {}", "Keywords:".bold(), c.keywords.join(", "));
    }
    if let Some(link) = &c.external_links {
        println!("{} {}", "Links:".bold(), link);
    }
}

fn print_user_page(page: &Page<User>) {
    for u in &page.results {
        println!("{:>5}  {}  {}", u.id, u.email.bold(), u.role.dimmed());
    }
    println!("{}", page_footer(page).dimmed());
}
