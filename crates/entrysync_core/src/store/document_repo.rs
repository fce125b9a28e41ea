//! Document collection repository over SQLite.
//!
//! # Responsibility
//! - Provide collection-scoped insert and document-scoped update/delete.
//! - Read back the full collection as `Entry` projections.
//!
//! # Invariants
//! - Write paths validate content before SQL mutations.
//! - Update/delete of a missing document is a semantic `NotFound`, never a
//!   silent no-op.
//! - Listing order is `created_at ASC, doc_id ASC`.

use crate::db::DbError;
use crate::model::entry::{validate_content, Entry, EntryId, EntryValidationError};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for document persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(EntryValidationError),
    Db(DbError),
    NotFound(EntryId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "document not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted document data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<EntryValidationError> for RepoError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for one document collection.
pub trait DocumentRepository {
    /// Inserts a document with a generated id and returns that id.
    fn insert_document(&self, content: &str, created_at: i64) -> RepoResult<EntryId>;
    /// Replaces the `content` field of one document.
    fn update_content(&self, id: &EntryId, content: &str) -> RepoResult<()>;
    /// Hard-deletes one document.
    fn delete_document(&self, id: &EntryId) -> RepoResult<()>;
    /// Gets one document by id.
    fn get_document(&self, id: &EntryId) -> RepoResult<Option<Entry>>;
    /// Lists every document currently in the collection.
    fn list_documents(&self) -> RepoResult<Vec<Entry>>;
}

/// SQLite-backed repository scoped to one collection.
pub struct SqliteDocumentRepository<'conn> {
    conn: &'conn Connection,
    collection: &'conn str,
}

impl<'conn> SqliteDocumentRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection, collection: &'conn str) -> RepoResult<Self> {
        ensure_documents_table(conn)?;
        Ok(Self { conn, collection })
    }
}

impl DocumentRepository for SqliteDocumentRepository<'_> {
    fn insert_document(&self, content: &str, created_at: i64) -> RepoResult<EntryId> {
        validate_content(content)?;

        let id = EntryId::new(Uuid::new_v4().simple().to_string());
        self.conn.execute(
            "INSERT INTO documents (collection, doc_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![self.collection, id.as_str(), content, created_at],
        )?;
        Ok(id)
    }

    fn update_content(&self, id: &EntryId, content: &str) -> RepoResult<()> {
        validate_content(content)?;

        let changed = self.conn.execute(
            "UPDATE documents
             SET content = ?3
             WHERE collection = ?1 AND doc_id = ?2;",
            params![self.collection, id.as_str(), content],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.clone()));
        }
        Ok(())
    }

    fn delete_document(&self, id: &EntryId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2;",
            params![self.collection, id.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.clone()));
        }
        Ok(())
    }

    fn get_document(&self, id: &EntryId) -> RepoResult<Option<Entry>> {
        let mut stmt = self.conn.prepare(
            "SELECT doc_id, content, created_at
             FROM documents
             WHERE collection = ?1 AND doc_id = ?2;",
        )?;
        let mut rows = stmt.query(params![self.collection, id.as_str()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_document_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_documents(&self) -> RepoResult<Vec<Entry>> {
        let mut stmt = self.conn.prepare(
            "SELECT doc_id, content, created_at
             FROM documents
             WHERE collection = ?1
             ORDER BY created_at ASC, doc_id ASC;",
        )?;
        let mut rows = stmt.query([self.collection])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_document_row(row)?);
        }
        Ok(entries)
    }
}

fn parse_document_row(row: &Row<'_>) -> RepoResult<Entry> {
    let doc_id: String = row.get("doc_id")?;
    if doc_id.trim().is_empty() {
        return Err(RepoError::InvalidData(
            "empty doc_id in documents.doc_id".to_string(),
        ));
    }
    Ok(Entry::from_document(
        EntryId::new(doc_id),
        row.get("content")?,
        row.get("created_at")?,
    ))
}

fn ensure_documents_table(conn: &Connection) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'documents'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::InvalidData(
            "missing required table `documents`; run migrations first".to_string(),
        ));
    }
    Ok(())
}
