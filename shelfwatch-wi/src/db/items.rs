//! Wishlist item persistence
//!
//! One transaction per batch: read the full set of stored keys, skip items
//! whose key is already present, insert the rest, commit after all items.
//! Any failure mid-batch aborts the transaction (rollback on drop); there is
//! no partial-commit mode.

use std::collections::HashSet;

use sqlx::SqlitePool;

use shelfwatch_common::Result;

use crate::models::{PersistReport, WishlistItem};

/// Column used to skip already-stored items.
///
/// The original pipeline skipped on title while collection dedups on ISBN;
/// both behaviors are kept explicit so the caller chooses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DedupKey {
    #[default]
    Title,
    Isbn,
}

impl DedupKey {
    fn column(&self) -> &'static str {
        match self {
            DedupKey::Title => "title",
            DedupKey::Isbn => "isbn",
        }
    }

    fn of<'a>(&self, item: &'a WishlistItem) -> &'a str {
        match self {
            DedupKey::Title => &item.title,
            DedupKey::Isbn => &item.isbn,
        }
    }
}

/// Insert new items, skipping those whose dedup key is already stored
pub async fn save_items(
    pool: &SqlitePool,
    items: &[WishlistItem],
    dedup: DedupKey,
) -> Result<PersistReport> {
    let mut tx = pool.begin().await?;

    let rows: Vec<String> =
        sqlx::query_scalar(&format!("SELECT {} FROM wishlist_items", dedup.column()))
            .fetch_all(&mut *tx)
            .await?;
    let existing: HashSet<String> = rows.into_iter().collect();

    let mut inserted = 0;
    let mut skipped = 0;

    for item in items {
        if existing.contains(dedup.of(item)) {
            tracing::debug!(isbn = %item.isbn, title = %item.title, "Skipping duplicate item");
            skipped += 1;
            continue;
        }

        sqlx::query("INSERT INTO wishlist_items (title, price, url, isbn) VALUES (?, ?, ?, ?)")
            .bind(&item.title)
            .bind(&item.price)
            .bind(&item.url)
            .bind(&item.isbn)
            .execute(&mut *tx)
            .await?;
        inserted += 1;
    }

    tx.commit().await?;

    tracing::info!(inserted, skipped, "Wishlist items persisted");
    Ok(PersistReport { inserted, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        shelfwatch_common::db::init_tables(&pool).await.unwrap();
        pool
    }

    fn item(title: &str, isbn: &str) -> WishlistItem {
        WishlistItem {
            title: title.to_string(),
            price: "¥1,000".to_string(),
            url: format!("https://example.com/dp/{}", isbn),
            isbn: isbn.to_string(),
        }
    }

    async fn stored_titles(pool: &SqlitePool) -> Vec<String> {
        sqlx::query_scalar("SELECT title FROM wishlist_items ORDER BY id")
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_save_is_idempotent_on_title() {
        let pool = setup_test_db().await;
        let items = vec![item("A", "111")];

        let first = save_items(&pool, &items, DedupKey::Title).await.unwrap();
        assert_eq!(first, PersistReport { inserted: 1, skipped: 0 });

        let second = save_items(&pool, &items, DedupKey::Title).await.unwrap();
        assert_eq!(second, PersistReport { inserted: 0, skipped: 1 });

        assert_eq!(stored_titles(&pool).await, vec!["A".to_string()]);
    }

    #[tokio::test]
    async fn test_title_key_skips_same_title_different_isbn() {
        let pool = setup_test_db().await;

        save_items(&pool, &[item("A", "111")], DedupKey::Title)
            .await
            .unwrap();
        let report = save_items(&pool, &[item("A", "222")], DedupKey::Title)
            .await
            .unwrap();

        assert_eq!(report, PersistReport { inserted: 0, skipped: 1 });
    }

    #[tokio::test]
    async fn test_isbn_key_keeps_same_title_different_isbn() {
        let pool = setup_test_db().await;

        save_items(&pool, &[item("A", "111")], DedupKey::Isbn)
            .await
            .unwrap();
        let report = save_items(&pool, &[item("A", "222")], DedupKey::Isbn)
            .await
            .unwrap();

        assert_eq!(report, PersistReport { inserted: 1, skipped: 0 });
    }

    #[tokio::test]
    async fn test_mid_batch_failure_rolls_back_everything() {
        let pool = setup_test_db().await;

        // Distinct titles, so the title-key skip does not fire; the third
        // item then violates the UNIQUE constraint on isbn mid-transaction.
        let items = vec![item("A", "111"), item("B", "222"), item("C", "111")];

        let result = save_items(&pool, &items, DedupKey::Title).await;
        assert!(result.is_err());

        assert!(stored_titles(&pool).await.is_empty());
    }

    #[tokio::test]
    async fn test_mixed_batch_counts() {
        let pool = setup_test_db().await;

        save_items(&pool, &[item("A", "111")], DedupKey::Title)
            .await
            .unwrap();
        let report = save_items(
            &pool,
            &[item("A", "111"), item("B", "222"), item("C", "333")],
            DedupKey::Title,
        )
        .await
        .unwrap();

        assert_eq!(report, PersistReport { inserted: 2, skipped: 1 });
        assert_eq!(
            stored_titles(&pool).await,
            vec!["A".to_string(), "B".to_string(), "C".to_string()]
        );
    }
}
