//! Publication records in the relational backend.

use std::collections::BTreeSet;

use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, instrument, warn};

use crate::db::{Database, DbError};
use crate::publication::{
    PREPRINT_JOURNAL, Publication, PublicationStats, UNKNOWN_YEAR, display_order,
};

/// Columns selected for every publication read.
const PUBLICATION_COLUMNS: &str = "p.id, p.title, p.journal, p.year, p.url, p.doi";

#[derive(Debug, FromRow)]
struct PublicationRow {
    id: i64,
    title: String,
    journal: Option<String>,
    year: Option<String>,
    url: Option<String>,
    doi: Option<String>,
}

/// Outcome of [`PublicationRepository::upsert_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub upserted: usize,
    pub failed: usize,
}

/// Reads and writes publications with their authors and tags.
#[derive(Debug, Clone)]
pub struct PublicationRepository {
    pool: SqlitePool,
}

impl PublicationRepository {
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Inserts or updates one publication keyed by `(title, year)` and
    /// replaces its author and tag links, all in one transaction.
    ///
    /// Returns the publication row id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Query`]; the transaction is rolled back.
    #[instrument(skip(self, publication), fields(title = %publication.title, year = %publication.year))]
    pub async fn upsert(&self, publication: &Publication) -> Result<i64, DbError> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO publications (title, journal, year, url, doi, updated_at)
             VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT (title, year) DO UPDATE SET
                 journal = excluded.journal,
                 url = excluded.url,
                 doi = excluded.doi,
                 updated_at = CURRENT_TIMESTAMP
             RETURNING id",
        )
        .bind(&publication.title)
        .bind(&publication.journal)
        .bind(&publication.year)
        .bind(publication.url.as_deref())
        .bind(publication.doi.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM publication_authors WHERE publication_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM publication_tags WHERE publication_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for (index, name) in publication.authors.iter().enumerate() {
            sqlx::query("INSERT OR IGNORE INTO authors (name) VALUES (?)")
                .bind(name)
                .execute(&mut *tx)
                .await?;
            let (author_id,): (i64,) = sqlx::query_as("SELECT id FROM authors WHERE name = ?")
                .bind(name)
                .fetch_one(&mut *tx)
                .await?;
            let order = i64::try_from(index + 1).unwrap_or(i64::MAX);
            // A repeated name keeps its first position.
            sqlx::query(
                "INSERT OR IGNORE INTO publication_authors (publication_id, author_id, author_order)
                 VALUES (?, ?, ?)",
            )
            .bind(id)
            .bind(author_id)
            .bind(order)
            .execute(&mut *tx)
            .await?;
        }

        for tag in &publication.tags {
            sqlx::query("INSERT OR IGNORE INTO tags (name) VALUES (?)")
                .bind(tag)
                .execute(&mut *tx)
                .await?;
            let (tag_id,): (i64,) = sqlx::query_as("SELECT id FROM tags WHERE name = ?")
                .bind(tag)
                .fetch_one(&mut *tx)
                .await?;
            sqlx::query("INSERT INTO publication_tags (publication_id, tag_id) VALUES (?, ?)")
                .bind(id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!(id, "publication upserted");
        Ok(id)
    }

    /// Upserts every record, counting failures instead of stopping.
    pub async fn upsert_all(&self, publications: &[Publication]) -> UpsertSummary {
        let mut summary = UpsertSummary::default();
        for publication in publications {
            match self.upsert(publication).await {
                Ok(_) => summary.upserted += 1,
                Err(error) => {
                    warn!(title = %publication.title, error = %error, "failed to upsert publication");
                    summary.failed += 1;
                }
            }
        }
        info!(
            upserted = summary.upserted,
            failed = summary.failed,
            "database updated"
        );
        summary
    }

    /// All publications, year descending then title.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Query`] if a query fails.
    pub async fn list_all(&self) -> Result<Vec<Publication>, DbError> {
        let rows: Vec<PublicationRow> = sqlx::query_as(&format!(
            "SELECT {PUBLICATION_COLUMNS} FROM publications p"
        ))
        .fetch_all(&self.pool)
        .await?;
        self.hydrate(rows).await
    }

    /// Publications of one year, by title.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Query`] if a query fails.
    pub async fn list_by_year(&self, year: &str) -> Result<Vec<Publication>, DbError> {
        let rows: Vec<PublicationRow> = sqlx::query_as(&format!(
            "SELECT {PUBLICATION_COLUMNS} FROM publications p WHERE p.year = ?"
        ))
        .bind(year)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate(rows).await
    }

    /// Publications whose title or an author contains `term` and that carry
    /// every tag in `tags`. An empty term matches everything.
    ///
    /// Term matching uses SQLite `LIKE`, which folds ASCII case only.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Query`] if a query fails.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str, tags: &[String]) -> Result<Vec<Publication>, DbError> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {PUBLICATION_COLUMNS} FROM publications p WHERE 1 = 1"
        ));

        let term = term.trim();
        if !term.is_empty() {
            let pattern = format!("%{}%", escape_like(term));
            query
                .push(" AND (p.title LIKE ")
                .push_bind(pattern.clone())
                .push(
                    " ESCAPE '\\' OR EXISTS (SELECT 1 FROM publication_authors pa \
                     JOIN authors a ON a.id = pa.author_id \
                     WHERE pa.publication_id = p.id AND a.name LIKE ",
                )
                .push_bind(pattern)
                .push(" ESCAPE '\\'))");
        }

        let wanted: BTreeSet<&String> = tags.iter().collect();
        if !wanted.is_empty() {
            query.push(
                " AND p.id IN (SELECT pt.publication_id FROM publication_tags pt \
                 JOIN tags t ON t.id = pt.tag_id WHERE t.name IN (",
            );
            let mut names = query.separated(", ");
            for tag in &wanted {
                names.push_bind((*tag).clone());
            }
            names.push_unseparated(") GROUP BY pt.publication_id HAVING COUNT(DISTINCT t.name) = ");
            query
                .push_bind(i64::try_from(wanted.len()).unwrap_or(i64::MAX))
                .push(")");
        }

        let rows: Vec<PublicationRow> = query.build_query_as().fetch_all(&self.pool).await?;
        self.hydrate(rows).await
    }

    /// Every tag attached to at least one publication, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Query`] if the query fails.
    pub async fn all_tags(&self) -> Result<Vec<String>, DbError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT t.name FROM tags t
             JOIN publication_tags pt ON pt.tag_id = t.id
             ORDER BY t.name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Counts of publications and of authors and tags in use, plus the
    /// numeric year range.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Query`] if a query fails.
    pub async fn stats(&self) -> Result<PublicationStats, DbError> {
        let (publications,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM publications")
            .fetch_one(&self.pool)
            .await?;
        let (authors,): (i64,) =
            sqlx::query_as("SELECT COUNT(DISTINCT author_id) FROM publication_authors")
                .fetch_one(&self.pool)
                .await?;
        let (tags,): (i64,) = sqlx::query_as("SELECT COUNT(DISTINCT tag_id) FROM publication_tags")
            .fetch_one(&self.pool)
            .await?;
        let (earliest, latest): (Option<i64>, Option<i64>) = sqlx::query_as(
            "SELECT MIN(CAST(year AS INTEGER)), MAX(CAST(year AS INTEGER)) FROM publications
             WHERE year <> '' AND year NOT GLOB '*[^0-9]*'",
        )
        .fetch_one(&self.pool)
        .await?;

        let count = |n: i64| usize::try_from(n).unwrap_or(0);
        Ok(PublicationStats {
            publications: count(publications),
            authors: count(authors),
            tags: count(tags),
            earliest_year: earliest.and_then(|y| u32::try_from(y).ok()),
            latest_year: latest.and_then(|y| u32::try_from(y).ok()),
        })
    }

    async fn hydrate(&self, rows: Vec<PublicationRow>) -> Result<Vec<Publication>, DbError> {
        let mut publications = Vec::with_capacity(rows.len());
        for row in rows {
            let authors: Vec<(String,)> = sqlx::query_as(
                "SELECT a.name FROM publication_authors pa
                 JOIN authors a ON a.id = pa.author_id
                 WHERE pa.publication_id = ?
                 ORDER BY pa.author_order",
            )
            .bind(row.id)
            .fetch_all(&self.pool)
            .await?;
            let tags: Vec<(String,)> = sqlx::query_as(
                "SELECT t.name FROM publication_tags pt
                 JOIN tags t ON t.id = pt.tag_id
                 WHERE pt.publication_id = ?",
            )
            .bind(row.id)
            .fetch_all(&self.pool)
            .await?;

            publications.push(Publication {
                title: row.title,
                authors: authors.into_iter().map(|(name,)| name).collect(),
                journal: row.journal.unwrap_or_else(|| PREPRINT_JOURNAL.to_string()),
                year: row.year.unwrap_or_else(|| UNKNOWN_YEAR.to_string()),
                url: row.url,
                doi: row.doi,
                tags: tags.into_iter().map(|(name,)| name).collect(),
            });
        }
        publications.sort_by(display_order);
        Ok(publications)
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
