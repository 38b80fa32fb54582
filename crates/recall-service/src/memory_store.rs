//! In-process knowledge repository.
//!
//! Backs the CLI and the orchestrator tests. Items are kept in insertion
//! order; every write checks the embedding length invariant.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use recall_core::{
    validate_embedding, EmbeddedItem, Error, ItemDraft, ItemPatch, KnowledgeItem,
    KnowledgeRepository, ListItemsRequest, ListItemsResponse, Result, SortOrder,
};

/// Repository holding items in memory for the process lifetime.
pub struct InMemoryRepository {
    dimension: usize,
    items: RwLock<Vec<KnowledgeItem>>,
}

impl InMemoryRepository {
    /// Repository accepting embeddings of `dimension` components (or empty).
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            items: RwLock::new(Vec::new()),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl KnowledgeRepository for InMemoryRepository {
    async fn create(&self, draft: ItemDraft) -> Result<KnowledgeItem> {
        validate_embedding(&draft.embedding, self.dimension)?;

        let now = Utc::now();
        let item = KnowledgeItem {
            id: Uuid::now_v7(),
            title: draft.title,
            content: draft.content,
            item_type: draft.item_type,
            tags: draft.tags,
            summary: draft.summary,
            embedding: draft.embedding,
            created_at: now,
            updated_at: now,
        };

        self.items.write().await.push(item.clone());
        debug!(
            subsystem = "store",
            component = "memory",
            op = "create",
            item_id = %item.id,
            "Item stored"
        );
        Ok(item)
    }

    async fn get(&self, id: Uuid) -> Result<Option<KnowledgeItem>> {
        Ok(self.items.read().await.iter().find(|i| i.id == id).cloned())
    }

    async fn list(&self, req: ListItemsRequest) -> Result<ListItemsResponse> {
        let items = self.items.read().await;

        let mut matched: Vec<&KnowledgeItem> = items.iter().filter(|i| req.matches(i)).collect();
        // Stable sort; ties keep insertion order.
        matched.sort_by(|a, b| {
            let ord = by_created_at(a, b);
            match req.sort {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let total = matched.len();
        let page_items = matched
            .into_iter()
            .skip(req.offset())
            .take(req.limit())
            .cloned()
            .collect();

        Ok(ListItemsResponse::new(
            page_items,
            total,
            req.page(),
            req.limit(),
        ))
    }

    async fn update(&self, id: Uuid, patch: ItemPatch) -> Result<KnowledgeItem> {
        if let Some(embedding) = &patch.embedding {
            validate_embedding(embedding, self.dimension)?;
        }

        let mut items = self.items.write().await;
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(Error::ItemNotFound(id))?;
        patch.apply_to(item, Utc::now());
        Ok(item.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|i| i.id != id);
        Ok(items.len() != before)
    }

    async fn embedded_items(&self) -> Result<Vec<EmbeddedItem>> {
        Ok(self
            .items
            .read()
            .await
            .iter()
            .map(EmbeddedItem::from)
            .collect())
    }
}

/// Creation-time ordering used by listings.
pub fn by_created_at(a: &KnowledgeItem, b: &KnowledgeItem) -> Ordering {
    a.created_at.cmp(&b.created_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::ItemType;

    fn draft(title: &str, content: &str, tags: &[&str], embedding: Vec<f64>) -> ItemDraft {
        ItemDraft {
            title: title.to_string(),
            content: content.to_string(),
            item_type: ItemType::Note,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            summary: None,
            embedding,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let repo = InMemoryRepository::new(2);
        let item = repo
            .create(draft("Fox", "The quick brown fox.", &[], vec![1.0, 0.0]))
            .await
            .unwrap();
        assert_eq!(item.created_at, item.updated_at);
        assert_eq!(repo.get(item.id).await.unwrap(), Some(item));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_wrong_dimension() {
        let repo = InMemoryRepository::new(3);
        let err = repo
            .create(draft("Fox", "The quick brown fox.", &[], vec![1.0, 0.0]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(repo.is_empty().await);

        // Empty embedding is the "none" sentinel and is accepted.
        repo.create(draft("Fox", "The quick brown fox.", &[], vec![]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let repo = InMemoryRepository::new(2);
        let id = Uuid::now_v7();
        let err = repo.update(id, ItemPatch::default()).await.unwrap_err();
        assert!(matches!(err, Error::ItemNotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn test_update_rejects_bad_embedding_without_writing() {
        let repo = InMemoryRepository::new(2);
        let item = repo
            .create(draft("Fox", "The quick brown fox.", &["fox"], vec![1.0, 0.0]))
            .await
            .unwrap();

        let patch = ItemPatch::derived(Some("s".into()), vec![], vec![1.0, 0.0, 0.0]);
        assert!(repo.update(item.id, patch).await.is_err());
        assert_eq!(repo.get(item.id).await.unwrap(), Some(item));
    }

    #[tokio::test]
    async fn test_list_filters_sorts_and_pages() {
        let repo = InMemoryRepository::new(2);
        for i in 0..7 {
            let tags: &[&str] = if i % 2 == 0 { &["even"] } else { &["odd"] };
            repo.create(draft(
                &format!("Note {i}"),
                "Some content here.",
                tags,
                vec![],
            ))
            .await
            .unwrap();
        }

        let page = repo
            .list(ListItemsRequest {
                tag: Some("EVEN".into()),
                sort: SortOrder::Asc,
                limit: Some(3),
                page: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].title, "Note 6");

        let newest_first = repo.list(ListItemsRequest::default()).await.unwrap();
        assert_eq!(newest_first.items.len(), 7);
        assert!(newest_first
            .items
            .windows(2)
            .all(|w| by_created_at(&w[0], &w[1]) != Ordering::Less));
    }

    #[tokio::test]
    async fn test_delete_and_projection() {
        let repo = InMemoryRepository::new(2);
        let a = repo
            .create(draft("Alpha", "First item content.", &[], vec![1.0, 0.0]))
            .await
            .unwrap();
        let b = repo
            .create(draft("Beta", "Second item content.", &[], vec![]))
            .await
            .unwrap();

        let projection = repo.embedded_items().await.unwrap();
        assert_eq!(
            projection.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![a.id, b.id]
        );

        assert!(repo.delete(a.id).await.unwrap());
        assert!(!repo.delete(a.id).await.unwrap());
        assert_eq!(repo.embedded_items().await.unwrap().len(), 1);
    }
}
