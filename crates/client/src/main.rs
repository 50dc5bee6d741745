//! `qaforum-client` -- read-only command-line view of a forum database.
//!
//! Prints one page as JSON in a `{ "data": ... }` envelope.
//!
//! ```text
//! qaforum-client dashboard [page] [none|search|tag] [query]
//! qaforum-client question <id>
//! qaforum-client tags
//! ```
//!
//! # Environment variables
//!
//! | Variable                     | Required | Default | Description                 |
//! |------------------------------|----------|---------|-----------------------------|
//! | `DATABASE_URL`               | yes      | --      | Postgres connection string  |
//! | `QAFORUM_PAGE_SIZE`          | no       | `10`    | Questions per dashboard page |
//! | `QAFORUM_SIBLING_COUNT`      | no       | `1`     | Page links around the current page |
//! | `QAFORUM_DB_MAX_CONNECTIONS` | no       | `20`    | Pool size                   |

use std::sync::Arc;

use anyhow::{bail, Context};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qaforum_client::backend::PgBackend;
use qaforum_client::config::ClientConfig;
use qaforum_client::views::{DashboardQuery, DetailView, LoadOutcome, PageSettings};
use qaforum_client::ForumClient;
use qaforum_core::filter::{FilterMode, QuestionFilter};
use qaforum_core::session::Session;
use qaforum_core::types::DbId;

enum Command {
    Dashboard(DashboardQuery),
    Question(DbId),
    Tags,
}

fn parse_command(args: &[String]) -> anyhow::Result<Command> {
    match args.first().map(String::as_str) {
        None | Some("dashboard") => {
            let page = match args.get(1) {
                Some(raw) => raw.parse().with_context(|| format!("invalid page number {raw:?}"))?,
                None => 1,
            };
            let mode: FilterMode = match args.get(2) {
                Some(raw) => raw.parse()?,
                None => FilterMode::None,
            };
            let query = args.get(3..).map(|rest| rest.join(" ")).unwrap_or_default();
            Ok(Command::Dashboard(DashboardQuery::new(
                QuestionFilter::new(mode, query),
                page,
            )))
        }
        Some("question") => {
            let raw = args.get(1).context("question requires an id")?;
            let id = raw.parse().with_context(|| format!("invalid question id {raw:?}"))?;
            Ok(Command::Question(id))
        }
        Some("tags") => Ok(Command::Tags),
        Some(other) => bail!("unknown command {other:?} (expected dashboard, question or tags)"),
    }
}

fn print_data<T: Serialize>(data: &T) -> anyhow::Result<()> {
    let body = serde_json::json!({ "data": data });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qaforum_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_command(&args)?;

    // --- Configuration ---
    let config = ClientConfig::from_env()?;
    tracing::info!(
        items_per_page = config.items_per_page,
        sibling_count = config.sibling_count,
        "Loaded client configuration",
    );

    // --- Database ---
    let backend = PgBackend::connect(&config)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");
    backend.prepare().await?;

    let client = ForumClient::new(Arc::new(backend), PageSettings::from(&config));
    let session = Session::anonymous();

    match command {
        Command::Dashboard(query) => {
            if client.dashboard().load(&session, &query).await? == LoadOutcome::Superseded {
                bail!("dashboard load was superseded");
            }
            print_data(&client.dashboard().current().await)?;
        }
        Command::Question(id) => {
            let thread = client.open_question(&session, id).await?;
            if *thread.view() == DetailView::Missing {
                tracing::warn!(question_id = id, "Question not found");
            }
            print_data(thread.view())?;
        }
        Command::Tags => {
            print_data(&client.tag_index().await?)?;
        }
    }

    Ok(())
}
