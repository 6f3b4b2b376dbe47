//! [`SqliteStore`] — the SQLite implementation of [`RankHistoryStore`] and
//! [`KeywordCatalog`].

use std::{collections::BTreeMap, path::Path};

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use serpwatch_core::{
  history::{CompetitorSnapshot, KeywordStatus, RankRecord},
  keyword::{Keyword, NewKeyword, normalize_phrase},
  observation::RankObservation,
  store::{KeywordCatalog, RankHistoryStore},
};

use crate::{
  Result,
  encode::{RawCompetitor, RawKeyword, RawRecord, encode_dt, encode_rank},
  schema::SCHEMA,
};

const KEYWORD_COLUMNS: &str = "keyword, genre, url, priority, notes, created_at, updated_at";

const UPSERT_KEYWORD: &str = "
  INSERT INTO keywords (keyword, genre, url, priority, notes, created_at, updated_at)
  VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
  ON CONFLICT(keyword) DO UPDATE SET
    genre      = excluded.genre,
    url        = excluded.url,
    priority   = excluded.priority,
    notes      = excluded.notes,
    updated_at = excluded.updated_at";

/// Column values of one keyword upsert, already normalised and encoded.
type KeywordParams = (String, Option<String>, Option<String>, Option<String>, Option<String>);

fn keyword_params(input: NewKeyword) -> Result<KeywordParams> {
  let phrase = normalize_phrase(&input.phrase)?;
  Ok((phrase, input.genre, input.url, input.priority, input.note))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Rank history and keyword catalog backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of competitor rows stored for `keyword` across all snapshots.
  #[cfg(test)]
  pub(crate) async fn competitor_row_count(&self, keyword: &str) -> Result<usize> {
    let key = normalize_phrase(keyword)?;
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM competitors WHERE keyword = ?1",
          rusqlite::params![key],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(usize::try_from(count).unwrap_or_default())
  }
}

// ─── RankHistoryStore impl ───────────────────────────────────────────────────

impl RankHistoryStore for SqliteStore {
  type Error = crate::Error;

  async fn get_previous(&self, keyword: &str) -> Result<Option<RankRecord>> {
    let key = normalize_phrase(keyword)?;

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT keyword, last_rank, last_url, last_checked_at
             FROM rankings WHERE keyword = ?1",
            rusqlite::params![key],
            |row| RawRecord::from_row(row, 0),
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn commit(
    &self,
    keyword:     &str,
    observation: &RankObservation,
    checked_at:  DateTime<Utc>,
  ) -> Result<()> {
    let key    = normalize_phrase(keyword)?;
    let rank   = observation.rank().map(encode_rank);
    let url    = observation.url().map(str::to_owned);
    let at_str = encode_dt(checked_at);
    let competitors: Vec<(String, i64)> = observation
      .competitors
      .iter()
      .map(|c| (c.url.clone(), encode_rank(c.rank)))
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO rankings (keyword, last_rank, last_url, last_checked_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(keyword) DO UPDATE SET
             last_rank       = excluded.last_rank,
             last_url        = excluded.last_url,
             last_checked_at = excluded.last_checked_at",
          rusqlite::params![key, rank, url, at_str],
        )?;
        {
          // A listing can carry the same competitor URL twice; keep its best rank.
          let mut stmt = tx.prepare(
            "INSERT INTO competitors (keyword, url, rank, checked_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(keyword, url, checked_at) DO UPDATE SET
               rank = MIN(rank, excluded.rank)",
          )?;
          for (c_url, c_rank) in &competitors {
            stmt.execute(rusqlite::params![key, c_url, c_rank, at_str])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  async fn list_records(&self) -> Result<Vec<RankRecord>> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT keyword, last_rank, last_url, last_checked_at
           FROM rankings ORDER BY keyword",
        )?;
        let rows = stmt
          .query_map([], |row| RawRecord::from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn latest_competitors(
    &self,
    keyword: &str,
    limit:   usize,
  ) -> Result<Vec<CompetitorSnapshot>> {
    let key       = normalize_phrase(keyword)?;
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawCompetitor> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT keyword, url, rank, checked_at
           FROM competitors
           WHERE keyword = ?1
             AND checked_at = (SELECT MAX(checked_at) FROM competitors WHERE keyword = ?1)
           ORDER BY rank ASC, url ASC
           LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![key, limit_val], |row| {
            Ok(RawCompetitor {
              keyword:    row.get(0)?,
              url:        row.get(1)?,
              rank:       row.get(2)?,
              checked_at: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCompetitor::into_snapshot).collect()
  }
}

// ─── KeywordCatalog impl ─────────────────────────────────────────────────────

impl KeywordCatalog for SqliteStore {
  type Error = crate::Error;

  async fn upsert_keyword(&self, input: NewKeyword) -> Result<Keyword> {
    let (phrase, genre, url, priority, notes) = keyword_params(input)?;
    let now_str = encode_dt(Utc::now());

    let raw: RawKeyword = self
      .conn
      .call(move |conn| {
        let sql = format!("{UPSERT_KEYWORD} RETURNING {KEYWORD_COLUMNS}");
        Ok(conn.query_row(
          &sql,
          rusqlite::params![phrase, genre, url, priority, notes, now_str],
          |row| RawKeyword::from_row(row, 0),
        )?)
      })
      .await?;

    raw.into_keyword()
  }

  async fn upsert_keywords(&self, inputs: Vec<NewKeyword>) -> Result<usize> {
    // Later duplicates of a phrase win, as if upserted one after another.
    let mut by_phrase: BTreeMap<String, KeywordParams> = BTreeMap::new();
    for input in inputs {
      let Ok(params) = keyword_params(input) else {
        continue;
      };
      by_phrase.insert(params.0.clone(), params);
    }
    let now_str = encode_dt(Utc::now());

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(UPSERT_KEYWORD)?;
          for (phrase, genre, url, priority, notes) in by_phrase.values() {
            stmt.execute(rusqlite::params![phrase, genre, url, priority, notes, now_str])?;
          }
        }
        tx.commit()?;
        Ok(by_phrase.len())
      })
      .await?;

    Ok(written)
  }

  async fn get_keyword(&self, phrase: &str) -> Result<Option<Keyword>> {
    let key = normalize_phrase(phrase)?;

    let raw: Option<RawKeyword> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {KEYWORD_COLUMNS} FROM keywords WHERE keyword = ?1");
        Ok(conn
          .query_row(&sql, rusqlite::params![key], |row| RawKeyword::from_row(row, 0))
          .optional()?)
      })
      .await?;

    raw.map(RawKeyword::into_keyword).transpose()
  }

  async fn list_keywords(&self, genre: Option<&str>) -> Result<Vec<Keyword>> {
    let genre = genre.map(str::to_owned);

    let raws: Vec<RawKeyword> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {KEYWORD_COLUMNS} FROM keywords
           WHERE (?1 IS NULL OR genre = ?1)
           ORDER BY keyword"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![genre], |row| RawKeyword::from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawKeyword::into_keyword).collect()
  }

  async fn list_genres(&self) -> Result<Vec<String>> {
    let genres = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT genre FROM keywords WHERE genre IS NOT NULL ORDER BY genre",
        )?;
        let rows = stmt
          .query_map([], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(genres)
  }

  async fn delete_keyword(&self, phrase: &str) -> Result<bool> {
    let key = normalize_phrase(phrase)?;

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM rankings WHERE keyword = ?1", rusqlite::params![key])?;
        tx.execute("DELETE FROM competitors WHERE keyword = ?1", rusqlite::params![key])?;
        let n = tx.execute("DELETE FROM keywords WHERE keyword = ?1", rusqlite::params![key])?;
        tx.commit()?;
        Ok(n > 0)
      })
      .await?;

    Ok(deleted)
  }

  async fn keywords_with_rankings(&self, genre: Option<&str>) -> Result<Vec<KeywordStatus>> {
    let genre = genre.map(str::to_owned);

    let raws: Vec<(RawKeyword, Option<RawRecord>)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             k.keyword, k.genre, k.url, k.priority, k.notes, k.created_at, k.updated_at,
             r.last_rank, r.last_url, r.last_checked_at
           FROM keywords k
           LEFT JOIN rankings r ON r.keyword = k.keyword
           WHERE (?1 IS NULL OR k.genre = ?1)
           ORDER BY k.keyword",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![genre], |row| {
            let keyword = RawKeyword::from_row(row, 0)?;
            let checked_at: Option<String> = row.get(9)?;
            let record = match checked_at {
              Some(last_checked_at) => Some(RawRecord {
                keyword: keyword.keyword.clone(),
                last_rank: row.get(7)?,
                last_url: row.get(8)?,
                last_checked_at,
              }),
              None => None,
            };
            Ok((keyword, record))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(keyword, record)| {
        Ok(KeywordStatus {
          keyword: keyword.into_keyword()?,
          record:  record.map(RawRecord::into_record).transpose()?,
        })
      })
      .collect()
  }
}
