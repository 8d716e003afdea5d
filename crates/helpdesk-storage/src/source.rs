//! The record-source capability shared by every store backend.

use std::fmt::{Debug, Display};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use helpdesk_core::error::Result;
use helpdesk_core::types::{
    EscalatedIssue, IssueDraft, KnowledgeDraft, KnowledgeEntry, UserRecord,
};

/// A record type that lives in a named REST collection.
pub trait Record: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Primary key type.
    type Id: Clone + Debug + Display + PartialEq + Serialize + Send + Sync + 'static;
    /// Payload used to create or replace a record (everything but the id).
    type Draft: Clone + Debug + Serialize + Send + Sync + 'static;

    /// Collection name in the REST store dialect.
    const COLLECTION: &'static str;

    fn id(&self) -> &Self::Id;
}

impl Record for KnowledgeEntry {
    type Id = i64;
    type Draft = KnowledgeDraft;
    const COLLECTION: &'static str = "qa";

    fn id(&self) -> &i64 {
        &self.id
    }
}

impl Record for EscalatedIssue {
    type Id = String;
    type Draft = IssueDraft;
    const COLLECTION: &'static str = "submittedIssues";

    fn id(&self) -> &String {
        &self.id
    }
}

impl Record for UserRecord {
    type Id = i64;
    type Draft = UserRecord;
    const COLLECTION: &'static str = "users";

    fn id(&self) -> &i64 {
        &self.id
    }
}

/// A write against a collection.
#[derive(Debug, Clone)]
pub enum Mutation<T: Record> {
    /// Insert a new record; the store assigns the id.
    Create(T::Draft),
    /// Replace the record with the given id.
    Update(T::Id, T::Draft),
    /// Remove the record with the given id.
    Delete(T::Id),
}

impl<T: Record> Mutation<T> {
    /// Short verb for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::Create(_) => "create",
            Mutation::Update(..) => "update",
            Mutation::Delete(_) => "delete",
        }
    }
}

/// Uniform access to a collection, whatever backs it.
///
/// `mutate` returns the stored record for `Create`/`Update` and `None` for
/// `Delete`. Updating or deleting an unknown id yields `NotFound`.
#[async_trait]
pub trait RecordSource<T: Record>: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<T>>;

    async fn fetch_one(&self, id: &T::Id) -> Result<Option<T>>;

    async fn mutate(&self, mutation: Mutation<T>) -> Result<Option<T>>;
}
