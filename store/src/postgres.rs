use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;

use crate::{Document, Error, IndexRecord, Store};

/// [`Store`] backed by a Postgres connection pool, following the same
/// `sqlx` access patterns as the rest of this workspace's crates.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(uri: &str) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .connect(uri)
            .await
            .map_err(Error::ConnectFailed)?;

        Ok(PgStore { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        PgStore { pool }
    }

    /// Runs the workspace's schema migrations against the connected
    /// database.
    pub async fn migrate(&self) -> Result<(), Error> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::CollectionCreateFailed(sqlx::Error::Migrate(Box::new(e))))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_doc(&self, doc: &Document) -> Result<(), Error> {
        let query = r#"
            INSERT INTO crawler_docs (id, url, title, max_frequency)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
        "#;

        let result = sqlx::query(query)
            .bind(&doc.id)
            .bind(&doc.url)
            .bind(&doc.title)
            .bind(doc.max_frequency)
            .execute(&self.pool)
            .await
            .map_err(Error::WriteFailed)?;

        if result.rows_affected() == 0 {
            return Err(Error::DuplicateKey);
        }

        Ok(())
    }

    async fn insert_term(&self, record: &IndexRecord) -> Result<(), Error> {
        let query = r#"
            INSERT INTO inverted_index (term, postings)
            VALUES ($1, $2)
            ON CONFLICT (term) DO NOTHING
        "#;

        let result = sqlx::query(query)
            .bind(&record.term)
            .bind(Json(&record.index))
            .execute(&self.pool)
            .await
            .map_err(Error::WriteFailed)?;

        if result.rows_affected() == 0 {
            return Err(Error::DuplicateKey);
        }

        Ok(())
    }

    async fn update_term_index(
        &self,
        term: &str,
        postings: &HashMap<String, f64>,
    ) -> Result<(), Error> {
        let query = r#"
            INSERT INTO inverted_index (term, postings)
            VALUES ($1, $2)
            ON CONFLICT (term)
            DO UPDATE SET postings = EXCLUDED.postings
        "#;

        sqlx::query(query)
            .bind(term)
            .bind(Json(postings))
            .execute(&self.pool)
            .await
            .map_err(Error::WriteFailed)?;

        Ok(())
    }

    async fn find_doc(&self, id: &str) -> Result<Option<Document>, Error> {
        let query = r#"SELECT id, url, title, max_frequency FROM crawler_docs WHERE id = $1"#;

        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::ReadFailed)?;

        Ok(row.map(|row| Document {
            id: row.get("id"),
            url: row.get("url"),
            title: row.get("title"),
            max_frequency: row.get("max_frequency"),
        }))
    }

    async fn find_term(&self, term: &str) -> Result<Option<IndexRecord>, Error> {
        let query = r#"SELECT term, postings FROM inverted_index WHERE term = $1"#;

        let row = sqlx::query(query)
            .bind(term)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::ReadFailed)?;

        Ok(row.map(|row| {
            let Json(index): Json<HashMap<String, f64>> = row.get("postings");
            IndexRecord {
                term: row.get("term"),
                index,
            }
        }))
    }

    async fn distinct_terms(&self) -> Result<HashSet<String>, Error> {
        let query = r#"SELECT term FROM inverted_index"#;

        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::ReadFailed)?;

        Ok(rows.iter().map(|row| row.get("term")).collect())
    }

    async fn count_terms(&self) -> Result<u64, Error> {
        let query = r#"SELECT COUNT(*) AS count FROM inverted_index"#;

        let row = sqlx::query(query)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::ReadFailed)?;

        let count: i64 = row.get("count");
        Ok(count as u64)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
