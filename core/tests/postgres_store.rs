//! Contract tests against a live PostgreSQL.
//!
//! Skipped unless `TEST_DATABASE_URL` points at a disposable database.

use todo_core::{PostgresTodoRepository, TodoError, TodoRepository, UpdateTodo};

async fn store() -> Option<PostgresTodoRepository> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let repo = PostgresTodoRepository::connect(&url).await.unwrap();
    repo.ensure_schema().await.unwrap();
    Some(repo)
}

#[tokio::test]
async fn crud_lifecycle() {
    let Some(repo) = store().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let created = repo.create("it").await.unwrap();
    assert_eq!(created.created_at, created.updated_at);

    let fetched = repo.get(&created.id).await.unwrap();
    assert_eq!(fetched, created);

    let listed = repo.list(10, 0).await.unwrap();
    assert!(!listed.is_empty());

    let changes = UpdateTodo {
        title: Some("changed".to_string()),
        completed: Some(true),
    };
    let updated = repo.update(&created.id, &changes).await.unwrap();
    assert_eq!(updated.title, "changed");
    assert!(updated.completed);
    assert!(updated.updated_at > created.updated_at);
    assert_eq!(repo.get(&created.id).await.unwrap(), updated);

    repo.delete(&created.id).await.unwrap();
    assert!(matches!(
        repo.get(&created.id).await,
        Err(TodoError::NotFound(_))
    ));
    assert!(matches!(
        repo.delete(&created.id).await,
        Err(TodoError::NotFound(_))
    ));
    assert!(matches!(
        repo.update(&created.id, &changes).await,
        Err(TodoError::NotFound(_))
    ));
}

#[tokio::test]
async fn list_clamps_and_orders_newest_first() {
    let Some(repo) = store().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let listed = repo.list(-1, -1).await.unwrap();
    assert!(listed
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at));
    assert!(repo.list(10, i64::MAX).await.unwrap().is_empty());
}

#[tokio::test]
async fn ping_reaches_the_database() {
    let Some(repo) = store().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    repo.ping().await.unwrap();
}
