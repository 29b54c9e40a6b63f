use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{DocPath, Document, DocumentStore, StoreError};

/// In-process document store. Same upsert semantics as `PgDocumentStore`.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<BTreeMap<String, Value>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError> {
        Ok(self.documents.read().await.get(&path.to_string()).cloned())
    }

    async fn set(&self, path: &DocPath, body: Value) -> Result<(), StoreError> {
        self.documents.write().await.insert(path.to_string(), body);
        Ok(())
    }

    async fn list(&self, path: &DocPath) -> Result<Vec<Document>, StoreError> {
        let parent = path.to_string();
        let documents = self.documents.read().await;
        let mut children = Vec::new();
        for (stored_path, body) in documents.iter() {
            let Ok(stored) = DocPath::parse(stored_path) else {
                continue;
            };
            if stored.parent_string() == parent {
                children.push(Document {
                    key: stored.key().to_string(),
                    body: body.clone(),
                });
            }
        }
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_overwrites_same_path() {
        let store = MemoryDocumentStore::new();
        let path = DocPath::parse("visitors/abc/v1").unwrap();

        store.set(&path, json!({"n": 1})).await.unwrap();
        store.set(&path, json!({"n": 2})).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(&path).await.unwrap(), Some(json!({"n": 2})));
    }

    #[tokio::test]
    async fn test_list_returns_direct_children_only() {
        let store = MemoryDocumentStore::new();
        store
            .set(&DocPath::parse("hr/u1/interviews/a").unwrap(), json!(1))
            .await
            .unwrap();
        store
            .set(&DocPath::parse("hr/u1/interviews/b").unwrap(), json!(2))
            .await
            .unwrap();
        store
            .set(&DocPath::parse("hr/u1/jobs/c").unwrap(), json!(3))
            .await
            .unwrap();

        let children = store
            .list(&DocPath::parse("hr/u1/interviews").unwrap())
            .await
            .unwrap();
        let keys: Vec<_> = children.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = MemoryDocumentStore::new();
        let path = DocPath::parse("interviews/nope").unwrap();
        assert!(store.get(&path).await.unwrap().is_none());
    }
}
