//! Chroma vector store over its v2 REST API.
//!
//! Collections live under `/api/v2/tenants/{tenant}/databases/{database}`.
//! Records carry `{userId, docId}` metadata; queries filter on `userId` and map
//! hits back through `docId`.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::index::{Collection, VectorError, VectorIndex, VectorMatch, VectorRecord};

pub struct ChromaIndex {
    client: Client,
    /// `{base}/api/v2/tenants/{tenant}/databases/{database}/collections`
    collections_url: String,
    /// Collection name → Chroma collection id, resolved on first use.
    collection_ids: RwLock<HashMap<Collection, String>>,
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    ids: [&'a str; 1],
    embeddings: [&'a [f32]; 1],
    documents: [&'a str; 1],
    metadatas: [Value; 1],
}

/// Chroma returns one inner list per query embedding; we only ever send one.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    ids: Vec<Vec<String>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<HashMap<String, Value>>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f32>>>>,
}

impl ChromaIndex {
    pub fn new(base_url: &str, tenant: &str, database: &str) -> Result<Self, VectorError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            collections_url: format!(
                "{}/api/v2/tenants/{}/databases/{}/collections",
                base_url.trim_end_matches('/'),
                tenant,
                database
            ),
            collection_ids: RwLock::new(HashMap::new()),
        })
    }

    async fn collection_id(&self, collection: Collection) -> Result<String, VectorError> {
        if let Some(id) = self.collection_ids.read().await.get(&collection) {
            return Ok(id.clone());
        }

        let response = self
            .client
            .post(&self.collections_url)
            .json(&json!({ "name": collection.name(), "get_or_create": true }))
            .send()
            .await?;
        let info: CollectionInfo = parse_response(response).await?;

        info!("Resolved Chroma collection {} -> {}", collection, info.id);
        self.collection_ids
            .write()
            .await
            .insert(collection, info.id.clone());
        Ok(info.id)
    }
}

#[async_trait]
impl VectorIndex for ChromaIndex {
    async fn upsert(
        &self,
        collection: Collection,
        record: VectorRecord,
    ) -> Result<(), VectorError> {
        let id = self.collection_id(collection).await?;
        let request = UpsertRequest {
            ids: [&record.id],
            embeddings: [&record.embedding],
            documents: [&record.document],
            metadatas: [json!({
                "userId": record.user_id.to_string(),
                "docId": record.doc_id.to_string(),
            })],
        };

        let response = self
            .client
            .post(format!("{}/{}/upsert", self.collections_url, id))
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(VectorError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        debug!("Upserted {} into {}", record.id, collection);
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        embedding: &[f32],
        user_id: Uuid,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, VectorError> {
        if top_k == 0 {
            return Ok(vec![]);
        }
        let id = self.collection_id(collection).await?;

        let response = self
            .client
            .post(format!("{}/{}/query", self.collections_url, id))
            .json(&json!({
                "query_embeddings": [embedding],
                "n_results": top_k,
                "where": { "userId": user_id.to_string() },
                "include": ["metadatas", "distances"],
            }))
            .send()
            .await?;
        let body: QueryResponse = parse_response(response).await?;

        let matches = matches_from_query(body);
        debug!("Chroma {} returned {} matches", collection, matches.len());
        Ok(matches)
    }

    fn backend(&self) -> &'static str {
        "chroma"
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, VectorError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(VectorError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    serde_json::from_str(&body).map_err(|e| VectorError::Malformed(e.to_string()))
}

/// Maps the first result list back to document ids, nearest first.
/// Hits without a `docId` in their metadata are dropped.
fn matches_from_query(body: QueryResponse) -> Vec<VectorMatch> {
    let count = body.ids.first().map(Vec::len).unwrap_or(0);
    let metadatas = body
        .metadatas
        .and_then(|m| m.into_iter().next())
        .unwrap_or_default();
    let distances = body
        .distances
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default();

    (0..count)
        .filter_map(|i| {
            let doc_id = metadatas
                .get(i)?
                .as_ref()?
                .get("docId")?
                .as_str()?
                .to_string();
            let distance = distances.get(i).copied().flatten().unwrap_or(1.0);
            Some(VectorMatch {
                doc_id,
                score: 1.0 - distance,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const COLLECTIONS_PATH: &str =
        "/api/v2/tenants/default_tenant/databases/default_database/collections";

    fn mock_index(server: &MockServer) -> ChromaIndex {
        ChromaIndex::new(&server.base_url(), "default_tenant", "default_database").unwrap()
    }

    #[test]
    fn test_matches_follow_doc_id_metadata() {
        let body: QueryResponse = serde_json::from_value(json!({
            "ids": [["a", "b", "c"]],
            "metadatas": [[
                {"userId": "u", "docId": "doc-a"},
                null,
                {"userId": "u", "docId": "doc-c"}
            ]],
            "distances": [[0.1, 0.2, 0.4]]
        }))
        .unwrap();

        let matches = matches_from_query(body);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].doc_id, "doc-a");
        assert!((matches[0].score - 0.9).abs() < 1e-6);
        assert_eq!(matches[1].doc_id, "doc-c");
    }

    #[test]
    fn test_empty_query_response() {
        let body: QueryResponse =
            serde_json::from_value(json!({ "ids": [[]], "metadatas": [[]] })).unwrap();
        assert!(matches_from_query(body).is_empty());

        let body: QueryResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches_from_query(body).is_empty());
    }

    #[test]
    fn test_missing_distances_score_zero() {
        let body: QueryResponse = serde_json::from_value(json!({
            "ids": [["a"]],
            "metadatas": [[{"docId": "doc-a"}]],
            "distances": null
        }))
        .unwrap();
        let matches = matches_from_query(body);
        assert_eq!(matches[0].score, 0.0);
    }

    #[test]
    fn test_upsert_request_shape() {
        let embedding = vec![0.5_f32, 0.25];
        let request = UpsertRequest {
            ids: ["doc-1"],
            embeddings: [&embedding],
            documents: ["hello"],
            metadatas: [json!({"userId": "u", "docId": "doc-1"})],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["ids"], json!(["doc-1"]));
        assert_eq!(value["embeddings"], json!([[0.5, 0.25]]));
        assert_eq!(value["metadatas"][0]["docId"], "doc-1");
    }

    #[tokio::test]
    async fn test_zero_top_k_skips_network() {
        let index =
            ChromaIndex::new("http://127.0.0.1:9/", "default_tenant", "default_database").unwrap();
        let hits = index
            .query(Collection::Memory, &[1.0], Uuid::new_v4(), 0)
            .await
            .unwrap();
        assert!(hits.is_empty());
        assert_eq!(index.backend(), "chroma");
    }

    #[test]
    fn test_collections_url_uses_tenant_and_database() {
        let index = ChromaIndex::new("http://chroma:8000/", "acme", "posts").unwrap();
        assert_eq!(
            index.collections_url,
            "http://chroma:8000/api/v2/tenants/acme/databases/posts/collections"
        );
    }

    #[tokio::test]
    async fn test_upsert_and_query_round_trip() {
        let server = MockServer::start_async().await;
        let user_id = Uuid::new_v4();
        let doc_id = Uuid::new_v4();

        let create = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(COLLECTIONS_PATH)
                    .json_body_partial(r#"{"name":"user_memory","get_or_create":true}"#);
                then.status(200)
                    .json_body(json!({"id": "col-1", "name": "user_memory"}));
            })
            .await;
        let upsert_body = json!({
            "ids": [doc_id.to_string()],
            "documents": ["Shipped v2 today"],
            "metadatas": [{"userId": user_id.to_string(), "docId": doc_id.to_string()}]
        });
        let upsert = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("{COLLECTIONS_PATH}/col-1/upsert"))
                    .json_body_partial(upsert_body.to_string());
                then.status(200).json_body(json!({}));
            })
            .await;
        let query_body = json!({
            "where": {"userId": user_id.to_string()},
            "n_results": 3,
            "include": ["metadatas", "distances"]
        });
        let query = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("{COLLECTIONS_PATH}/col-1/query"))
                    .json_body_partial(query_body.to_string());
                then.status(200).json_body(json!({
                    "ids": [[doc_id.to_string()]],
                    "metadatas": [[{"userId": user_id.to_string(), "docId": doc_id.to_string()}]],
                    "distances": [[0.25]]
                }));
            })
            .await;

        let index = mock_index(&server);
        index
            .upsert(
                Collection::Memory,
                VectorRecord {
                    id: doc_id.to_string(),
                    embedding: vec![0.5, 0.5],
                    document: "Shipped v2 today".into(),
                    user_id,
                    doc_id,
                },
            )
            .await
            .unwrap();
        let hits = index
            .query(Collection::Memory, &[0.5, 0.5], user_id, 3)
            .await
            .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, doc_id.to_string());
        assert!((hits[0].score - 0.75).abs() < 1e-6);
        create.assert_hits_async(1).await;
        upsert.assert_hits_async(1).await;
        query.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_query_error_status_is_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(COLLECTIONS_PATH);
                then.status(200)
                    .json_body(json!({"id": "col-9", "name": "user_feedback"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("{COLLECTIONS_PATH}/col-9/query"));
                then.status(500).body("boom");
            })
            .await;

        let err = mock_index(&server)
            .query(Collection::Feedback, &[1.0], Uuid::new_v4(), 2)
            .await
            .unwrap_err();
        match err {
            VectorError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
