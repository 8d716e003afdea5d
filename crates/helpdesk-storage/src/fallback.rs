//! Repository that degrades to a static snapshot when the primary fails.
//!
//! Reads never fail: if the primary source errors, the built-in snapshot is
//! served and the result is tagged `Origin::Fallback`. Writes always go to
//! the primary; when it is unreachable they fail with `Offline` instead of
//! silently landing nowhere.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use helpdesk_core::error::{HelpdeskError, Result};

use crate::source::{Mutation, Record, RecordSource};

/// Where a read was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Primary,
    Fallback,
}

/// A read result tagged with its origin.
#[derive(Debug, Clone)]
pub struct Fetched<R> {
    pub records: R,
    pub origin: Origin,
}

impl<R> Fetched<R> {
    pub fn is_fallback(&self) -> bool {
        self.origin == Origin::Fallback
    }
}

/// Read-only in-memory collection.
#[derive(Debug, Clone)]
pub struct StaticSource<T: Record> {
    records: Vec<T>,
}

impl<T: Record> StaticSource<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self { records }
    }

    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn find(&self, id: &T::Id) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }
}

#[async_trait]
impl<T: Record> RecordSource<T> for StaticSource<T> {
    async fn fetch_all(&self) -> Result<Vec<T>> {
        Ok(self.records.clone())
    }

    async fn fetch_one(&self, id: &T::Id) -> Result<Option<T>> {
        Ok(self.find(id).cloned())
    }

    async fn mutate(&self, _mutation: Mutation<T>) -> Result<Option<T>> {
        Err(HelpdeskError::Offline(format!(
            "{} is served from the built-in snapshot",
            T::COLLECTION
        )))
    }
}

/// Primary source with a static read fallback and an online flag.
pub struct FallbackRepository<T: Record> {
    primary: Arc<dyn RecordSource<T>>,
    fallback: StaticSource<T>,
    online: AtomicBool,
}

impl<T: Record> FallbackRepository<T> {
    pub fn new(primary: Arc<dyn RecordSource<T>>, fallback: StaticSource<T>) -> Self {
        Self {
            primary,
            fallback,
            online: AtomicBool::new(true),
        }
    }

    pub fn collection(&self) -> &'static str {
        T::COLLECTION
    }

    /// Whether the last call to the primary succeeded.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    fn mark(&self, online: bool) {
        let was = self.online.swap(online, Ordering::Relaxed);
        if was != online {
            if online {
                info!(collection = T::COLLECTION, "Primary store reachable again");
            } else {
                warn!(collection = T::COLLECTION, "Primary store unreachable, serving fallback");
            }
        }
    }

    pub async fn fetch_all(&self) -> Fetched<Vec<T>> {
        match self.primary.fetch_all().await {
            Ok(records) => {
                self.mark(true);
                Fetched {
                    records,
                    origin: Origin::Primary,
                }
            }
            Err(e) => {
                warn!(collection = T::COLLECTION, error = %e, "fetch_all failed");
                self.mark(false);
                Fetched {
                    records: self.fallback.records().to_vec(),
                    origin: Origin::Fallback,
                }
            }
        }
    }

    pub async fn fetch_one(&self, id: &T::Id) -> Fetched<Option<T>> {
        match self.primary.fetch_one(id).await {
            Ok(record) => {
                self.mark(true);
                Fetched {
                    records: record,
                    origin: Origin::Primary,
                }
            }
            Err(e) => {
                warn!(collection = T::COLLECTION, %id, error = %e, "fetch_one failed");
                self.mark(false);
                Fetched {
                    records: self.fallback.find(id).cloned(),
                    origin: Origin::Fallback,
                }
            }
        }
    }

    /// Apply a write to the primary. Never touches the fallback.
    pub async fn mutate(&self, mutation: Mutation<T>) -> Result<Option<T>> {
        let kind = mutation.kind();
        match self.primary.mutate(mutation).await {
            Ok(record) => {
                self.mark(true);
                Ok(record)
            }
            Err(e) if e.is_unavailable() => {
                warn!(collection = T::COLLECTION, kind, error = %e, "mutation rejected");
                self.mark(false);
                Err(HelpdeskError::Offline(format!(
                    "cannot modify {} while the store is unreachable",
                    T::COLLECTION
                )))
            }
            Err(e) => Err(e),
        }
    }
}

impl<T: Record> std::fmt::Debug for FallbackRepository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackRepository")
            .field("collection", &T::COLLECTION)
            .field("online", &self.is_online())
            .finish()
    }
}
