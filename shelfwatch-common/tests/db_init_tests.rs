//! Database initialization tests

use shelfwatch_common::db::init_database;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("shelfwatch.db");

    let pool = init_database(&db_path).await.unwrap();

    assert!(db_path.exists(), "Database file was not created");

    sqlx::query("INSERT INTO wishlist_items (title, price, url, isbn) VALUES (?, ?, ?, ?)")
        .bind("A")
        .bind("¥1,000")
        .bind("https://example.com/dp/1111111111")
        .bind("1111111111")
        .execute(&pool)
        .await
        .unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM wishlist_items")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("shelfwatch.db");

    let pool1 = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO wishlist_items (title, price, url, isbn) VALUES ('A', '', '', '111')")
        .execute(&pool1)
        .await
        .unwrap();
    pool1.close().await;

    // Reopening must be idempotent and keep existing rows
    let pool2 = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM wishlist_items")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_isbn_uniqueness_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("shelfwatch.db");
    let pool = init_database(&db_path).await.unwrap();

    sqlx::query("INSERT INTO wishlist_items (title, price, url, isbn) VALUES ('A', '', '', '111')")
        .execute(&pool)
        .await
        .unwrap();

    let duplicate =
        sqlx::query("INSERT INTO wishlist_items (title, price, url, isbn) VALUES ('B', '', '', '111')")
            .execute(&pool)
            .await;
    assert!(duplicate.is_err());
}
