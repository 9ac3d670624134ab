//! SQLite-backed entity store

use crate::corpus::{self, CorpusReader};
use crate::{DuplicatePolicy, StoreConfig, StoreError};
use erl_domain::{Entity, KnowledgeBase, LookupError, SearchHit};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// `store_meta` key written once a build has finished
const META_BUILD_COMPLETE: &str = "build_complete";

/// Rows fetched per round trip while iterating
const PAGE_SIZE: i64 = 256;

/// Summary of a completed build
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// Corpus files processed
    pub files: usize,

    /// Entity records ingested (including overwrites)
    pub entities: usize,

    /// Facts ingested across all records
    pub facts: usize,

    /// Records that replaced an earlier record with the same id
    pub overwritten: usize,

    /// Wall-clock build time
    pub elapsed: Duration,
}

impl BuildReport {
    /// Entities ingested per second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.entities as f64 / secs
        } else {
            0.0
        }
    }

    /// One-line human readable summary
    pub fn summary(&self) -> String {
        format!(
            "{} entities ({} facts, {} overwritten) from {} files in {:.2}s ({:.1} e/s)",
            self.entities,
            self.facts,
            self.overwritten,
            self.files,
            self.elapsed.as_secs_f64(),
            self.throughput()
        )
    }
}

/// Persistent, append-then-read-only index of canonical entities
///
/// Built once from a corpus with [`EntityStore::build`], then reopened any
/// number of times with [`EntityStore::open`]. Holds an id → entity index and
/// an exact name → id index.
///
/// # Thread Safety
///
/// The store is `Send + Sync`. Readers share one connection guarded by a
/// mutex. After [`EntityStore::close`] every query fails with
/// [`StoreError::Closed`].
///
/// # Examples
///
/// ```no_run
/// use erl_store::{EntityStore, StoreConfig};
///
/// let (store, report) = EntityStore::build("kb.db", "data/kb", &StoreConfig::default()).unwrap();
/// println!("{}", report.summary());
///
/// let paris = store.get_by_name("Paris").unwrap();
/// store.close().unwrap();
/// ```
pub struct EntityStore {
    conn: Mutex<Option<Connection>>,
    path: PathBuf,
}

impl EntityStore {
    /// Build a new store at `path` from a corpus file or directory of `kb_part-<n>.xml` files
    ///
    /// Files are ingested in numeric part order. A malformed record aborts the
    /// build; records committed before the failure stay on disk but the store
    /// is not marked complete, so [`EntityStore::open`] refuses it.
    pub fn build<P: AsRef<Path>, C: AsRef<Path>>(
        path: P,
        corpus: C,
        config: &StoreConfig,
    ) -> Result<(Self, BuildReport), StoreError> {
        let files = corpus::corpus_files(corpus.as_ref())?;
        tracing::info!(
            "Creating entity store {} from {} corpus file(s) in {}",
            path.as_ref().display(),
            files.len(),
            corpus.as_ref().display()
        );

        let entities = files.iter().flat_map(|file| {
            tracing::info!("Processing file: {}", file.display());
            match CorpusReader::open(file) {
                Ok(reader) => {
                    Box::new(reader) as Box<dyn Iterator<Item = Result<Entity, StoreError>>>
                }
                Err(e) => Box::new(std::iter::once(Err(e))),
            }
        });

        let (store, mut report) = Self::build_from_entities(path, entities, config)?;
        report.files = files.len();
        Ok((store, report))
    }

    /// Build a new store at `path` from already parsed entities
    ///
    /// Use `:memory:` for an in-memory store (useful for testing). The
    /// configuration is validated first; zero intervals fail with
    /// [`StoreError::Config`] before anything is written.
    pub fn build_from_entities<P, I>(
        path: P,
        entities: I,
        config: &StoreConfig,
    ) -> Result<(Self, BuildReport), StoreError>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = Result<Entity, StoreError>>,
    {
        let config = config.clone().validate()?;
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;

        if is_complete(&conn)? {
            return Err(StoreError::AlreadyBuilt(path.to_path_buf()));
        }

        let stale: i64 = conn.query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0))?;
        if stale > 0 {
            tracing::warn!(
                "Discarding {} entities left by an incomplete build of {}",
                stale,
                path.display()
            );
            conn.execute_batch("DELETE FROM entities; DELETE FROM entity_names; DELETE FROM store_meta;")?;
        }

        let report = ingest(&conn, entities, &config)?;

        conn.execute(
            "INSERT OR REPLACE INTO store_meta (key, value) VALUES (?1, ?2)",
            params![META_BUILD_COMPLETE, report.entities.to_string()],
        )?;
        tracing::info!("Built entity store {}: {}", path.display(), report.summary());

        let store = Self {
            conn: Mutex::new(Some(conn)),
            path: path.to_path_buf(),
        };
        Ok((store, report))
    }

    /// Attach to an already built store without re-ingesting
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        tracing::info!("Opening entity store: {}", path.display());

        if !path.exists() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("entity store not found: {}", path.display()),
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        if !is_complete(&conn)? {
            return Err(StoreError::IncompleteBuild(path.to_path_buf()));
        }

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            path: path.to_path_buf(),
        })
    }

    /// Location of the backing database
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether [`EntityStore::close`] has been called
    pub fn is_closed(&self) -> bool {
        self.conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Flush and release the database; later queries fail with [`StoreError::Closed`]
    ///
    /// Closing twice is a no-op.
    pub fn close(&self) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(conn) = conn {
            tracing::info!("Closing entity store: {}", self.path.display());
            conn.close().map_err(|(_, e)| StoreError::Database(e))?;
        }
        Ok(())
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let guard = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(StoreError::Closed),
        }
    }

    /// Get an entity by id
    pub fn get(&self, id: &str) -> Result<Option<Entity>, StoreError> {
        self.with_conn(|conn| fetch_by_id(conn, id))
    }

    /// Get the entity registered under an exact name
    ///
    /// Matching is case- and diacritic-sensitive; there is no fuzzy matching.
    pub fn get_by_name(&self, name: &str) -> Result<Option<Entity>, StoreError> {
        self.with_conn(|conn| fetch_by_name(conn, name))
    }

    /// Get the id registered under an exact name
    pub fn id_for_name(&self, name: &str) -> Result<Option<String>, StoreError> {
        self.with_conn(|conn| {
            let id = conn
                .prepare_cached("SELECT id FROM entity_names WHERE name = ?1")?
                .query_row(params![name], |row| row.get(0))
                .optional()?;
            Ok(id)
        })
    }

    /// Get the descriptive text of an entity
    ///
    /// `None` when the entity is unknown or has no text.
    pub fn get_text(&self, id: &str) -> Result<Option<String>, StoreError> {
        self.with_conn(|conn| {
            let text: Option<Option<String>> = conn
                .prepare_cached("SELECT text FROM entities WHERE id = ?1")?
                .query_row(params![id], |row| row.get(0))
                .optional()?;
            Ok(text.flatten())
        })
    }

    /// Number of distinct entities
    pub fn len(&self) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0))?;
            usize::try_from(count).map_err(|_| StoreError::InvalidData(format!("negative count {}", count)))
        })
    }

    /// Whether the store holds no entities
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Iterate every entity in ingestion order
    ///
    /// Rows are fetched lazily in pages. If the store is closed mid-iteration
    /// the iterator yields one [`StoreError::Closed`] and then stops.
    pub fn iter(&self) -> EntityIter<'_> {
        EntityIter {
            store: self,
            last_seq: 0,
            page: VecDeque::new(),
            done: false,
        }
    }

    fn fetch_page(&self, after_seq: i64) -> Result<Vec<(i64, Entity)>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT seq, body FROM entities WHERE seq > ?1 ORDER BY seq LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![after_seq, PAGE_SIZE], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter()
                .map(|(seq, body)| Ok((seq, serde_json::from_str(&body)?)))
                .collect()
        })
    }
}

/// Lazy iterator over the entities of an [`EntityStore`]
pub struct EntityIter<'a> {
    store: &'a EntityStore,
    last_seq: i64,
    page: VecDeque<Entity>,
    done: bool,
}

impl Iterator for EntityIter<'_> {
    type Item = Result<Entity, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(entity) = self.page.pop_front() {
            return Some(Ok(entity));
        }
        if self.done {
            return None;
        }
        match self.store.fetch_page(self.last_seq) {
            Ok(rows) => {
                if (rows.len() as i64) < PAGE_SIZE {
                    self.done = true;
                }
                for (seq, entity) in rows {
                    self.last_seq = seq;
                    self.page.push_back(entity);
                }
                self.page.pop_front().map(Ok)
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl KnowledgeBase for EntityStore {
    fn search(&self, query: &str) -> Result<Vec<SearchHit>, LookupError> {
        Ok(self.get_by_name(query)?.map(to_hit).into_iter().collect())
    }

    fn batch_search(
        &self,
        queries: &BTreeSet<String>,
    ) -> Result<HashMap<String, Vec<SearchHit>>, LookupError> {
        let results = self.with_conn(|conn| {
            queries
                .iter()
                .map(|query| {
                    let hits = fetch_by_name(conn, query)?.map(to_hit).into_iter().collect();
                    Ok((query.clone(), hits))
                })
                .collect::<Result<HashMap<_, _>, StoreError>>()
        })?;
        Ok(results)
    }

    fn text(&self, id: &str) -> Result<Option<String>, LookupError> {
        Ok(self.get_text(id)?)
    }
}

fn to_hit(entity: Entity) -> SearchHit {
    SearchHit {
        id: entity.id().to_string(),
        name: entity.name().to_string(),
        entity_type: entity.entity_type(),
    }
}

fn is_complete(conn: &Connection) -> Result<bool, StoreError> {
    let has_meta: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'store_meta')",
        [],
        |row| row.get(0),
    )?;
    if !has_meta {
        return Ok(false);
    }
    let marker: Option<String> = conn
        .query_row(
            "SELECT value FROM store_meta WHERE key = ?1",
            params![META_BUILD_COMPLETE],
            |row| row.get(0),
        )
        .optional()?;
    Ok(marker.is_some())
}

fn fetch_by_id(conn: &Connection, id: &str) -> Result<Option<Entity>, StoreError> {
    let body: Option<String> = conn
        .prepare_cached("SELECT body FROM entities WHERE id = ?1")?
        .query_row(params![id], |row| row.get(0))
        .optional()?;
    body.map(|body| serde_json::from_str(&body).map_err(StoreError::from))
        .transpose()
}

fn fetch_by_name(conn: &Connection, name: &str) -> Result<Option<Entity>, StoreError> {
    let body: Option<String> = conn
        .prepare_cached(
            "SELECT e.body FROM entity_names n JOIN entities e ON e.id = n.id WHERE n.name = ?1",
        )?
        .query_row(params![name], |row| row.get(0))
        .optional()?;
    body.map(|body| serde_json::from_str(&body).map_err(StoreError::from))
        .transpose()
}

/// Insert one entity, returning whether it replaced an earlier record
///
/// The name index keeps one id per name: the last entity inserted under a
/// name takes it over.
fn insert_entity(
    conn: &Connection,
    entity: &Entity,
    policy: DuplicatePolicy,
) -> Result<bool, StoreError> {
    let exists: bool = conn
        .prepare_cached("SELECT EXISTS(SELECT 1 FROM entities WHERE id = ?1)")?
        .query_row(params![entity.id()], |row| row.get(0))?;

    if exists {
        match policy {
            DuplicatePolicy::Reject => {
                return Err(StoreError::DuplicateEntity(entity.id().to_string()))
            }
            DuplicatePolicy::Overwrite => {
                tracing::debug!("Overwriting entity {}", entity.id());
                conn.prepare_cached("DELETE FROM entity_names WHERE id = ?1")?
                    .execute(params![entity.id()])?;
            }
        }
    }

    let body = serde_json::to_string(entity)?;
    conn.prepare_cached(
        "INSERT INTO entities (id, name, entity_type, text, body) VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
         name = excluded.name, entity_type = excluded.entity_type,
         text = excluded.text, body = excluded.body",
    )?
    .execute(params![
        entity.id(),
        entity.name(),
        entity.entity_type().as_str(),
        entity.text(),
        body,
    ])?;

    conn.prepare_cached("INSERT OR REPLACE INTO entity_names (name, id) VALUES (?1, ?2)")?
        .execute(params![entity.name(), entity.id()])?;

    Ok(exists)
}

/// Sequentially ingest entities, committing every `commit_interval` records
fn ingest<I>(conn: &Connection, entities: I, config: &StoreConfig) -> Result<BuildReport, StoreError>
where
    I: IntoIterator<Item = Result<Entity, StoreError>>,
{
    let start = Instant::now();
    let mut report = BuildReport::default();
    let mut pending = 0usize;
    let mut tx = conn.unchecked_transaction()?;

    for entity in entities {
        let entity = entity?;
        if insert_entity(&tx, &entity, config.duplicate_policy)? {
            report.overwritten += 1;
        }
        report.entities += 1;
        report.facts += entity.facts().len();

        pending += 1;
        if pending >= config.commit_interval {
            tx.commit()?;
            tx = conn.unchecked_transaction()?;
            pending = 0;
        }

        if report.entities % config.report_interval == 0 {
            let secs = start.elapsed().as_secs_f64();
            let rate = if secs > 0.0 { report.entities as f64 / secs } else { 0.0 };
            tracing::info!("Processed {} entities ({:.1} e/s)", report.entities, rate);
        }
    }

    tx.commit()?;
    report.elapsed = start.elapsed();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use erl_domain::EntityType;

    fn entity(id: &str, name: &str) -> Result<Entity, StoreError> {
        Ok(Entity::builder(id, name, EntityType::Person).build().unwrap())
    }

    #[test]
    fn test_build_in_memory() {
        let (store, report) = EntityStore::build_from_entities(
            ":memory:",
            vec![entity("E1", "Alice"), entity("E2", "Bob")],
            &StoreConfig::default(),
        )
        .unwrap();

        assert_eq!(report.entities, 2);
        assert_eq!(report.overwritten, 0);
        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.id_for_name("Bob").unwrap().as_deref(), Some("E2"));
    }

    #[test]
    fn test_small_commit_interval() {
        let config = StoreConfig {
            commit_interval: 1,
            report_interval: 2,
            ..StoreConfig::default()
        };
        let entities = (0..5).map(|i| entity(&format!("E{}", i), &format!("N{}", i)));
        let (store, report) = EntityStore::build_from_entities(":memory:", entities, &config).unwrap();

        assert_eq!(report.entities, 5);
        assert_eq!(store.len().unwrap(), 5);
    }

    #[test]
    fn test_build_report_summary() {
        let report = BuildReport {
            files: 2,
            entities: 10,
            facts: 4,
            overwritten: 1,
            elapsed: Duration::from_secs(2),
        };
        assert_eq!(report.throughput(), 5.0);
        assert!(report.summary().starts_with("10 entities (4 facts, 1 overwritten) from 2 files"));
        assert_eq!(BuildReport::default().throughput(), 0.0);
    }

    #[test]
    fn test_iteration_pages() {
        let count = (PAGE_SIZE as usize) * 2 + 7;
        let entities = (0..count).map(|i| entity(&format!("E{:05}", i), &format!("Name {}", i)));
        let (store, _) =
            EntityStore::build_from_entities(":memory:", entities, &StoreConfig::default()).unwrap();

        let ids: Vec<String> = store
            .iter()
            .map(|e| e.unwrap().id().to_string())
            .collect();
        assert_eq!(ids.len(), count);
        assert_eq!(ids[0], "E00000");
        assert_eq!(ids[count - 1], format!("E{:05}", count - 1));
    }
}
