//! Fills a Postgres-backed todo store with sample records.
//!
//! Reads `DB_DSN` (required) and `SEED_COUNT` (default 25). Every third
//! record is marked completed after it is created.

use anyhow::{bail, Context};
use rand::Rng;
use todo_core::{PostgresTodoRepository, TodoRepository, UpdateTodo};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_COUNT: usize = 25;

const TITLES: &[&str] = &[
    "Buy groceries",
    "Read a book",
    "Write blog post",
    "Exercise",
    "Call a friend",
    "Plan vacation",
    "Clean kitchen",
    "Fix bug #42",
    "Review PR",
    "Learn Rust traits",
];

const TAGS: &[&str] = &["home", "work", "study", "health", "fun"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    let dsn = std::env::var("DB_DSN").unwrap_or_default();
    if dsn.is_empty() {
        bail!("DB_DSN is required");
    }
    let count = seed_count(std::env::var("SEED_COUNT").ok().as_deref());

    let store = PostgresTodoRepository::connect(&dsn)
        .await
        .context("failed to connect to postgres")?;
    store
        .ensure_schema()
        .await
        .context("failed to prepare schema")?;

    let titles = {
        let mut rng = rand::rng();
        (1..=count)
            .map(|ordinal| seed_title(&mut rng, ordinal))
            .collect::<Vec<_>>()
    };

    let completed = UpdateTodo {
        completed: Some(true),
        ..UpdateTodo::default()
    };
    let mut finished = 0;
    for (index, title) in titles.iter().enumerate() {
        let todo = store
            .create(title)
            .await
            .with_context(|| format!("failed to create {title:?}"))?;
        if index % 3 == 0 {
            store
                .update(&todo.id, &completed)
                .await
                .with_context(|| format!("failed to complete {}", todo.id))?;
            finished += 1;
        }
        tracing::debug!(id = %todo.id, title = %todo.title, "seeded");
    }

    tracing::info!(inserted = titles.len(), finished, "seeded todos");
    Ok(())
}

/// Positive integers only; anything else falls back to the default.
fn seed_count(raw: Option<&str>) -> usize {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => DEFAULT_COUNT,
        Some(value) => match value.parse::<usize>() {
            Ok(count) if count > 0 => count,
            _ => {
                tracing::warn!(value, "ignoring invalid SEED_COUNT");
                DEFAULT_COUNT
            }
        },
    }
}

fn seed_title<R: Rng + ?Sized>(rng: &mut R, ordinal: usize) -> String {
    let title = TITLES[rng.random_range(0..TITLES.len())];
    let tag = TAGS[rng.random_range(0..TAGS.len())];
    format!("{title} [{tag}] #{ordinal}")
}
