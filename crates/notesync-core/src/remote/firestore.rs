//! Cloud Firestore REST client for the notes collection.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

use super::{RemoteError, RemoteNoteDocument, RemoteNoteStore, RemoteResult};
use crate::auth::TokenSource;
use crate::models::{Note, NoteId};
use crate::util::{google_api_error_message, is_http_url, normalize_text_option};

pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_NOTES_COLLECTION: &str = "notes";

/// Field holding the note text.
const TEXT_FIELD: &str = "text";
/// Field holding the owning user id. Existing collections use `userId`.
const OWNER_FIELD: &str = "userId";

#[derive(Clone)]
pub struct FirestoreRemoteStore {
    documents_url: String,
    collection: String,
    client: Client,
    tokens: Arc<dyn TokenSource>,
}

impl std::fmt::Debug for FirestoreRemoteStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("FirestoreRemoteStore")
            .field("documents_url", &self.documents_url)
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl FirestoreRemoteStore {
    pub fn new(
        base_url: impl AsRef<str>,
        project_id: impl AsRef<str>,
        collection: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> RemoteResult<Self> {
        let base_url = normalize_base_url(base_url.as_ref())?;
        let project_id = normalize_text_option(Some(project_id.as_ref().to_string()))
            .ok_or_else(|| {
                RemoteError::InvalidPayload("Firebase project id must not be empty".to_string())
            })?;
        let collection = normalize_text_option(Some(collection.into())).ok_or_else(|| {
            RemoteError::InvalidPayload("Collection name must not be empty".to_string())
        })?;

        Ok(Self {
            documents_url: format!("{base_url}/projects/{project_id}/databases/(default)/documents"),
            collection,
            client: Client::builder().build()?,
            tokens,
        })
    }

    fn document_url(&self, id: &NoteId) -> String {
        format!(
            "{}/{}/{}",
            self.documents_url,
            self.collection,
            urlencoding::encode(id.as_str())
        )
    }

    async fn authorized(&self, request: RequestBuilder) -> RemoteResult<RequestBuilder> {
        let token = self
            .tokens
            .bearer_token()
            .await
            .map_err(|error| RemoteError::Unavailable(error.to_string()))?
            .ok_or(RemoteError::Unauthenticated)?;
        Ok(request.bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = self.authorized(request).await?.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Api(google_api_error_message(status, &body)))
    }
}

#[async_trait]
impl RemoteNoteStore for FirestoreRemoteStore {
    async fn query_by_owner(&self, owner_id: &str) -> RemoteResult<Vec<Note>> {
        let request = self
            .client
            .post(format!("{}:runQuery", self.documents_url))
            .json(&owner_query(&self.collection, owner_id));
        let entries = self.send(request).await?.json::<Vec<RunQueryEntry>>().await?;
        entries
            .into_iter()
            .filter_map(|entry| entry.document)
            .map(FirestoreDocument::into_note)
            .collect()
    }

    async fn upsert(&self, id: &NoteId, document: &RemoteNoteDocument) -> RemoteResult<()> {
        let request = self
            .client
            .patch(self.document_url(id))
            .json(&document_body(document));
        self.send(request).await?;
        Ok(())
    }

    async fn delete(&self, id: &NoteId) -> RemoteResult<()> {
        let request = self.client.delete(self.document_url(id));
        self.send(request).await?;
        Ok(())
    }
}

fn normalize_base_url(url: &str) -> RemoteResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(RemoteError::InvalidPayload(
            "Firestore URL must not be empty".to_string(),
        ));
    }
    if !is_http_url(trimmed) {
        return Err(RemoteError::InvalidPayload(
            "Firestore URL must include http:// or https://".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn owner_query(collection: &str, owner_id: &str) -> serde_json::Value {
    serde_json::json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": OWNER_FIELD },
                    "op": "EQUAL",
                    "value": { "stringValue": owner_id },
                }
            }
        }
    })
}

fn document_body(document: &RemoteNoteDocument) -> serde_json::Value {
    serde_json::json!({
        "fields": {
            TEXT_FIELD: { "stringValue": document.text },
            OWNER_FIELD: { "stringValue": document.owner_id },
        }
    })
}

/// One element of a `:runQuery` response. Entries without a document only
/// carry read metadata.
#[derive(Debug, Deserialize)]
struct RunQueryEntry {
    document: Option<FirestoreDocument>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: HashMap<String, FirestoreValue>,
}

#[derive(Debug, Deserialize)]
struct FirestoreValue {
    #[serde(rename = "stringValue")]
    string_value: Option<String>,
}

impl FirestoreDocument {
    fn into_note(mut self) -> RemoteResult<Note> {
        let raw_id = self
            .name
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| {
                RemoteError::InvalidPayload(format!("document name '{}' has no id", self.name))
            })?;
        let id = urlencoding::decode(raw_id)
            .map_or_else(|_| raw_id.to_string(), std::borrow::Cow::into_owned);
        let text = self
            .fields
            .remove(TEXT_FIELD)
            .and_then(|value| value.string_value)
            .unwrap_or_default();
        Ok(Note::new(id, text))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn normalize_base_url_rejects_invalid_values() {
        assert!(normalize_base_url("").is_err());
        assert!(normalize_base_url("firestore.googleapis.com").is_err());
        assert_eq!(
            normalize_base_url("http://localhost:8080/v1/").unwrap(),
            "http://localhost:8080/v1"
        );
    }

    #[test]
    fn owner_query_filters_on_user_id_field() {
        let query = owner_query("notes", "uid-1");
        let filter = &query["structuredQuery"]["where"]["fieldFilter"];
        assert_eq!(filter["field"]["fieldPath"], "userId");
        assert_eq!(filter["op"], "EQUAL");
        assert_eq!(filter["value"]["stringValue"], "uid-1");
        assert_eq!(query["structuredQuery"]["from"][0]["collectionId"], "notes");
    }

    #[test]
    fn document_body_carries_text_and_owner() {
        let body = document_body(&RemoteNoteDocument {
            text: "hello".to_string(),
            owner_id: "uid-1".to_string(),
        });
        assert_eq!(body["fields"]["text"]["stringValue"], "hello");
        assert_eq!(body["fields"]["userId"]["stringValue"], "uid-1");
    }

    #[test]
    fn run_query_response_parses_documents_and_skips_metadata() {
        let payload = r#"[
          {
            "document": {
              "name": "projects/p/databases/(default)/documents/notes/1700000000000",
              "fields": {
                "text": { "stringValue": "hello" },
                "userId": { "stringValue": "uid-1" }
              },
              "createTime": "2024-01-01T00:00:00Z",
              "updateTime": "2024-01-01T00:00:00Z"
            },
            "readTime": "2024-01-01T00:00:00Z"
          },
          {
            "document": {
              "name": "projects/p/databases/(default)/documents/notes/no%20text",
              "fields": { "userId": { "stringValue": "uid-1" } }
            }
          },
          { "readTime": "2024-01-01T00:00:00Z" }
        ]"#;
        let entries: Vec<RunQueryEntry> = serde_json::from_str(payload).unwrap();
        let notes = entries
            .into_iter()
            .filter_map(|entry| entry.document)
            .map(FirestoreDocument::into_note)
            .collect::<RemoteResult<Vec<_>>>()
            .unwrap();
        assert_eq!(
            notes,
            vec![Note::new("1700000000000", "hello"), Note::new("no text", "")]
        );
    }

    #[test]
    fn empty_query_result_is_single_metadata_entry() {
        let entries: Vec<RunQueryEntry> =
            serde_json::from_str(r#"[{"readTime":"2024-01-01T00:00:00Z"}]"#).unwrap();
        assert!(entries.into_iter().all(|entry| entry.document.is_none()));
    }
}
