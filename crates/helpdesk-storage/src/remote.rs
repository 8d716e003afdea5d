//! REST record source speaking the json-server dialect.
//!
//! Each collection lives at `{base_url}/{collection}` with the usual
//! GET/POST on the collection and GET/PUT/DELETE on `/{collection}/{id}`.
//! Transport failures, timeouts, non-success statuses and undecodable
//! bodies all surface as `HelpdeskError::Unavailable` so the fallback
//! repository can take over.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use helpdesk_core::error::{HelpdeskError, Result};

use crate::source::{Mutation, Record, RecordSource};

/// HTTP client bound to one REST store.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    client: Client,
    base_url: String,
}

impl RemoteSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HelpdeskError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url<T: Record>(&self) -> String {
        format!("{}/{}", self.base_url, T::COLLECTION)
    }

    fn record_url<T: Record>(&self, id: &T::Id) -> String {
        format!("{}/{}/{}", self.base_url, T::COLLECTION, id)
    }
}

async fn send(request: RequestBuilder, what: &str) -> Result<Response> {
    request
        .send()
        .await
        .map_err(|e| HelpdeskError::Unavailable(format!("{}: {}", what, e)))
}

fn ensure_success(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(HelpdeskError::Unavailable(format!(
            "{} returned {}",
            what, status
        )))
    }
}

async fn decode<D: DeserializeOwned>(response: Response, what: &str) -> Result<D> {
    response
        .json::<D>()
        .await
        .map_err(|e| HelpdeskError::Unavailable(format!("{}: bad body: {}", what, e)))
}

#[async_trait]
impl<T: Record> RecordSource<T> for RemoteSource {
    async fn fetch_all(&self) -> Result<Vec<T>> {
        let url = self.collection_url::<T>();
        debug!(%url, "GET collection");
        let what = format!("GET {}", url);
        let response = ensure_success(send(self.client.get(&url), &what).await?, &what)?;
        decode::<Vec<T>>(response, &what).await
    }

    async fn fetch_one(&self, id: &T::Id) -> Result<Option<T>> {
        let url = self.record_url::<T>(id);
        let what = format!("GET {}", url);
        let response = send(self.client.get(&url), &what).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response, &what)?;
        decode::<T>(response, &what).await.map(Some)
    }

    async fn mutate(&self, mutation: Mutation<T>) -> Result<Option<T>> {
        debug!(collection = T::COLLECTION, kind = mutation.kind(), "remote mutation");
        match mutation {
            Mutation::Create(draft) => {
                let url = self.collection_url::<T>();
                let what = format!("POST {}", url);
                let response =
                    ensure_success(send(self.client.post(&url).json(&draft), &what).await?, &what)?;
                decode::<T>(response, &what).await.map(Some)
            }
            Mutation::Update(id, draft) => {
                let url = self.record_url::<T>(&id);
                let what = format!("PUT {}", url);
                let mut body = serde_json::to_value(&draft)?;
                if let Some(fields) = body.as_object_mut() {
                    fields.insert("id".to_string(), serde_json::to_value(&id)?);
                }
                let response = send(self.client.put(&url).json(&body), &what).await?;
                if response.status() == StatusCode::NOT_FOUND {
                    return Err(HelpdeskError::NotFound(format!("{}/{}", T::COLLECTION, id)));
                }
                let response = ensure_success(response, &what)?;
                decode::<T>(response, &what).await.map(Some)
            }
            Mutation::Delete(id) => {
                let url = self.record_url::<T>(&id);
                let what = format!("DELETE {}", url);
                let response = send(self.client.delete(&url), &what).await?;
                if response.status() == StatusCode::NOT_FOUND {
                    return Err(HelpdeskError::NotFound(format!("{}/{}", T::COLLECTION, id)));
                }
                ensure_success(response, &what)?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use helpdesk_core::types::{EscalatedIssue, IssueDraft, KnowledgeEntry, UserRecord};
    use serde_json::{json, Value};

    async fn spawn_store() -> String {
        let app = Router::new()
            .route(
                "/qa",
                get(|| async {
                    Json(json!([
                        {"id": 1, "question": "Printer jam", "answer": ["Open tray", "Remove paper"]},
                        {"id": 2, "question": "VPN drops", "answer": ["Reconnect"]}
                    ]))
                }),
            )
            .route(
                "/qa/{id}",
                get(|Path(id): Path<i64>| async move {
                    if id == 1 {
                        Ok(Json(json!({"id": 1, "question": "Printer jam", "answer": ["Open tray"]})))
                    } else {
                        Err(AxumStatus::NOT_FOUND)
                    }
                })
                .delete(|Path(_id): Path<i64>| async { AxumStatus::NOT_FOUND }),
            )
            .route(
                "/submittedIssues",
                post(|Json(mut body): Json<Value>| async move {
                    body["id"] = json!(17);
                    (AxumStatus::CREATED, Json(body))
                }),
            )
            .route("/users", get(|| async { AxumStatus::INTERNAL_SERVER_ERROR }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let source = RemoteSource::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(source.base_url(), "http://localhost:5000");
        assert_eq!(
            source.record_url::<KnowledgeEntry>(&3),
            "http://localhost:5000/qa/3"
        );
    }

    #[tokio::test]
    async fn test_unreachable_store_is_unavailable() {
        let source = RemoteSource::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        let err = RecordSource::<KnowledgeEntry>::fetch_all(&source)
            .await
            .unwrap_err();
        assert!(matches!(err, HelpdeskError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_fetch_all_reads_answer_field() {
        let base = spawn_store().await;
        let source = RemoteSource::new(&base, Duration::from_secs(2)).unwrap();
        let entries = RecordSource::<KnowledgeEntry>::fetch_all(&source)
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].steps, vec!["Open tray", "Remove paper"]);
    }

    #[tokio::test]
    async fn test_fetch_one_missing_is_none() {
        let base = spawn_store().await;
        let source = RemoteSource::new(&base, Duration::from_secs(2)).unwrap();
        let found = RecordSource::<KnowledgeEntry>::fetch_one(&source, &1)
            .await
            .unwrap();
        assert_eq!(found.unwrap().question, "Printer jam");
        let missing = RecordSource::<KnowledgeEntry>::fetch_one(&source, &9)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let base = spawn_store().await;
        let source = RemoteSource::new(&base, Duration::from_secs(2)).unwrap();
        let err = RecordSource::<KnowledgeEntry>::mutate(&source, Mutation::Delete(4))
            .await
            .unwrap_err();
        assert!(matches!(err, HelpdeskError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_issue_returns_assigned_id() {
        let base = spawn_store().await;
        let source = RemoteSource::new(&base, Duration::from_secs(2)).unwrap();
        let draft = IssueDraft::pending(
            "John Doe".into(),
            "john@example.com".into(),
            "Printer".into(),
            "Still jammed".into(),
            None,
        );
        let created = RecordSource::<EscalatedIssue>::mutate(&source, Mutation::Create(draft))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.id, "17");
        assert_eq!(created.name, "John Doe");
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let base = spawn_store().await;
        let source = RemoteSource::new(&base, Duration::from_secs(2)).unwrap();
        let err = RecordSource::<UserRecord>::fetch_all(&source)
            .await
            .unwrap_err();
        assert!(matches!(err, HelpdeskError::Unavailable(_)));
    }
}
