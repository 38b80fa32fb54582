//! Core data models for recall.
//!
//! These types are shared across all recall crates and represent the
//! knowledge base's domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults;
use crate::error::{Error, Result};

/// Dense embedding vector. Empty means "no embedding available".
pub type Vector = Vec<f64>;

// =============================================================================
// KNOWLEDGE ITEM TYPES
// =============================================================================

/// Closed set of knowledge item kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// Free-form note
    #[default]
    Note,
    /// Saved link with commentary
    Link,
    /// Distilled insight
    Insight,
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Note => write!(f, "note"),
            Self::Link => write!(f, "link"),
            Self::Insight => write!(f, "insight"),
        }
    }
}

impl std::str::FromStr for ItemType {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "note" => Ok(Self::Note),
            "link" => Ok(Self::Link),
            "insight" => Ok(Self::Insight),
            _ => Err(format!("Invalid item type: {}", s)),
        }
    }
}

/// A stored knowledge item with its AI-derived fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// Lowercase single-word tags, at most [`defaults::MAX_TAGS`].
    pub tags: Vec<String>,
    pub summary: Option<String>,
    /// Unit vector of the configured dimension, or empty.
    #[serde(default)]
    pub embedding: Vector,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeItem {
    /// Whether this item can take part in similarity search.
    pub fn has_embedding(&self) -> bool {
        !self.embedding.is_empty()
    }
}

/// Validated input for creating a knowledge item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewKnowledgeItem {
    pub title: String,
    pub content: String,
    #[serde(rename = "type", default)]
    pub item_type: ItemType,
}

impl NewKnowledgeItem {
    pub fn new(title: impl Into<String>, content: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            item_type,
        }
    }

    /// Check minimum lengths for title and content.
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        validate_content(&self.content)
    }
}

/// User edit of an existing item. AI-derived fields are never touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<ItemType>,
}

impl ItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.item_type.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::Validation("update contains no fields".to_string()));
        }
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(content) = &self.content {
            validate_content(content)?;
        }
        Ok(())
    }
}

impl From<ItemUpdate> for ItemPatch {
    fn from(update: ItemUpdate) -> Self {
        Self {
            title: update.title,
            content: update.content,
            item_type: update.item_type,
            ..Default::default()
        }
    }
}

/// Partial-field write applied by a repository as a single update.
///
/// `summary` is doubly optional: `Some(None)` clears the stored summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub item_type: Option<ItemType>,
    pub summary: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub embedding: Option<Vector>,
}

impl ItemPatch {
    /// Patch overwriting all three AI-derived fields together.
    pub fn derived(summary: Option<String>, tags: Vec<String>, embedding: Vector) -> Self {
        Self {
            summary: Some(summary),
            tags: Some(tags),
            embedding: Some(embedding),
            ..Default::default()
        }
    }

    /// Apply onto an item, bumping `updated_at`.
    pub fn apply_to(self, item: &mut KnowledgeItem, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            item.title = title;
        }
        if let Some(content) = self.content {
            item.content = content;
        }
        if let Some(item_type) = self.item_type {
            item.item_type = item_type;
        }
        if let Some(summary) = self.summary {
            item.summary = summary;
        }
        if let Some(tags) = self.tags {
            item.tags = tags;
        }
        if let Some(embedding) = self.embedding {
            item.embedding = embedding;
        }
        item.updated_at = now;
    }
}

/// Fully computed item ready for persistence (id and timestamps are
/// assigned by the repository).
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub title: String,
    pub content: String,
    pub item_type: ItemType,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub embedding: Vector,
}

/// Reject embeddings that are neither empty nor exactly `dimension` long.
pub fn validate_embedding(embedding: &[f64], dimension: usize) -> Result<()> {
    if embedding.is_empty() || embedding.len() == dimension {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "embedding has {} dimensions, expected 0 or {}",
            embedding.len(),
            dimension
        )))
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().chars().count() < defaults::TITLE_MIN_CHARS {
        return Err(Error::Validation(format!(
            "title must be at least {} characters",
            defaults::TITLE_MIN_CHARS
        )));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<()> {
    if content.trim().chars().count() < defaults::CONTENT_MIN_CHARS {
        return Err(Error::Validation(format!(
            "content must be at least {} characters",
            defaults::CONTENT_MIN_CHARS
        )));
    }
    Ok(())
}

/// Check a question before it is embedded.
pub fn validate_question(question: &str) -> Result<()> {
    if question.trim().chars().count() < defaults::QUESTION_MIN_CHARS {
        return Err(Error::Validation(format!(
            "question must be at least {} characters",
            defaults::QUESTION_MIN_CHARS
        )));
    }
    Ok(())
}

// =============================================================================
// LISTING
// =============================================================================

/// Ordering by creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("Invalid sort order: {}", s)),
        }
    }
}

/// Request for listing knowledge items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListItemsRequest {
    /// Case-insensitive substring over title or content
    pub search: Option<String>,
    /// Restrict to one item type
    #[serde(rename = "type")]
    pub item_type: Option<ItemType>,
    /// Exact tag match (compared lowercased)
    pub tag: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
    /// 1-based page number
    pub page: Option<usize>,
    /// Page size
    pub limit: Option<usize>,
}

impl ListItemsRequest {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(defaults::PAGE_LIMIT)
            .clamp(1, defaults::PAGE_LIMIT_MAX)
    }

    pub fn offset(&self) -> usize {
        (self.page() - 1) * self.limit()
    }

    /// Whether an item passes the search/type/tag filters.
    pub fn matches(&self, item: &KnowledgeItem) -> bool {
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            if !item.title.to_lowercase().contains(&needle)
                && !item.content.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(item_type) = self.item_type {
            if item.item_type != item_type {
                return false;
            }
        }
        if let Some(tag) = self.tag.as_deref() {
            let tag = tag.to_lowercase();
            if !item.tags.iter().any(|t| *t == tag) {
                return false;
            }
        }
        true
    }
}

/// A page of knowledge items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListItemsResponse {
    pub items: Vec<KnowledgeItem>,
    /// Items matching the filters across all pages
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

impl ListItemsResponse {
    pub fn new(items: Vec<KnowledgeItem>, total: usize, page: usize, limit: usize) -> Self {
        Self {
            items,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit.max(1)),
        }
    }
}

// =============================================================================
// RETRIEVAL TYPES
// =============================================================================

/// Projection of a stored item used for similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedItem {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub embedding: Vector,
}

impl From<&KnowledgeItem> for EmbeddedItem {
    fn from(item: &KnowledgeItem) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            content: item.content.clone(),
            embedding: item.embedding.clone(),
        }
    }
}

/// An item projection paired with its similarity to a query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem {
    pub item: EmbeddedItem,
    /// Cosine similarity in [-1, 1]
    pub score: f64,
}

/// Item that backed an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: Uuid,
    pub title: String,
    pub similarity_score: f64,
}

impl From<&ScoredItem> for SourceRef {
    fn from(scored: &ScoredItem) -> Self {
        Self {
            id: scored.item.id,
            title: scored.item.title.clone(),
            similarity_score: scored.score,
        }
    }
}

/// How the answer text was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// The generator produced the answer
    Generated,
    /// Knowledge base is empty; generation skipped
    NoItems,
    /// No stored item was comparable with the question; generation skipped
    NoRelevantItems,
    /// No generation backend configured
    Unavailable,
    /// Generation call failed
    Failed,
    /// Generation call exceeded its deadline
    TimedOut,
}

impl AnswerOutcome {
    /// True when the answer text is a fixed fallback string.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Unavailable | Self::Failed | Self::TimedOut)
    }
}

/// Answer to a question plus the items it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub outcome: AnswerOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, content: &str, item_type: ItemType, tags: &[&str]) -> KnowledgeItem {
        let now = Utc::now();
        KnowledgeItem {
            id: Uuid::now_v7(),
            title: title.to_string(),
            content: content.to_string(),
            item_type,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            summary: None,
            embedding: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_item_type_roundtrip_str() {
        for t in [ItemType::Note, ItemType::Link, ItemType::Insight] {
            assert_eq!(t.to_string().parse::<ItemType>().unwrap(), t);
        }
        assert_eq!("INSIGHT".parse::<ItemType>().unwrap(), ItemType::Insight);
        assert!("essay".parse::<ItemType>().is_err());
    }

    #[test]
    fn test_item_type_serializes_lowercase() {
        let json = serde_json::to_string(&ItemType::Link).unwrap();
        assert_eq!(json, "\"link\"");
    }

    #[test]
    fn test_new_item_validation() {
        assert!(NewKnowledgeItem::new("Fox", "The quick brown fox.", ItemType::Note)
            .validate()
            .is_ok());

        let err = NewKnowledgeItem::new("Fx", "The quick brown fox.", ItemType::Note)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("title")));

        let err = NewKnowledgeItem::new("Fox", "too short", ItemType::Note)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("content")));
    }

    #[test]
    fn test_whitespace_does_not_count_toward_minimums() {
        let err = NewKnowledgeItem::new("  a  ", "          ", ItemType::Note)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_new_item_deserializes_type_field() {
        let json = r#"{"title":"Tides","content":"Tides follow the moon.","type":"insight"}"#;
        let parsed: NewKnowledgeItem = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.item_type, ItemType::Insight);
    }

    #[test]
    fn test_item_update_validation() {
        assert!(ItemUpdate::default().validate().is_err());

        let update = ItemUpdate {
            content: Some("short".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let update = ItemUpdate {
            item_type: Some(ItemType::Link),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn test_item_update_never_touches_derived_fields() {
        let update = ItemUpdate {
            title: Some("New title".to_string()),
            ..Default::default()
        };
        let patch: ItemPatch = update.into();
        assert!(patch.summary.is_none());
        assert!(patch.tags.is_none());
        assert!(patch.embedding.is_none());
    }

    #[test]
    fn test_patch_apply_overwrites_derived_fields() {
        let mut it = item("Fox", "The quick brown fox.", ItemType::Note, &["old"]);
        it.summary = Some("old summary".to_string());
        let before = it.updated_at;

        let later = before + chrono::Duration::seconds(5);
        ItemPatch::derived(None, vec!["fox".to_string()], vec![1.0, 0.0]).apply_to(&mut it, later);

        assert_eq!(it.summary, None);
        assert_eq!(it.tags, vec!["fox"]);
        assert_eq!(it.embedding, vec![1.0, 0.0]);
        assert_eq!(it.updated_at, later);
        assert_eq!(it.title, "Fox");
    }

    #[test]
    fn test_validate_embedding() {
        assert!(validate_embedding(&[], 384).is_ok());
        assert!(validate_embedding(&vec![0.0; 384], 384).is_ok());
        assert!(validate_embedding(&vec![0.0; 12], 384).is_err());
    }

    #[test]
    fn test_validate_question() {
        assert!(validate_question("Why?").is_err());
        assert!(validate_question("Tell me about the fox").is_ok());
    }

    #[test]
    fn test_list_request_pagination_defaults() {
        let req = ListItemsRequest::default();
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), defaults::PAGE_LIMIT);
        assert_eq!(req.offset(), 0);

        let req = ListItemsRequest {
            page: Some(3),
            limit: Some(500),
            ..Default::default()
        };
        assert_eq!(req.limit(), defaults::PAGE_LIMIT_MAX);
        assert_eq!(req.offset(), 2 * defaults::PAGE_LIMIT_MAX);

        let req = ListItemsRequest {
            page: Some(0),
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), 1);
    }

    #[test]
    fn test_list_request_matches_filters() {
        let fox = item("Fox", "The quick brown fox jumps.", ItemType::Note, &["animals"]);
        let tide = item("Tides", "Oceans and tides.", ItemType::Insight, &["ocean"]);

        let req = ListItemsRequest {
            search: Some("BROWN".to_string()),
            ..Default::default()
        };
        assert!(req.matches(&fox));
        assert!(!req.matches(&tide));

        let req = ListItemsRequest {
            item_type: Some(ItemType::Insight),
            ..Default::default()
        };
        assert!(!req.matches(&fox));
        assert!(req.matches(&tide));

        let req = ListItemsRequest {
            tag: Some("Ocean".to_string()),
            ..Default::default()
        };
        assert!(req.matches(&tide));
        assert!(!req.matches(&fox));
    }

    #[test]
    fn test_list_response_total_pages() {
        assert_eq!(ListItemsResponse::new(Vec::new(), 0, 1, 10).total_pages, 0);
        assert_eq!(ListItemsResponse::new(Vec::new(), 10, 1, 10).total_pages, 1);
        assert_eq!(ListItemsResponse::new(Vec::new(), 11, 1, 10).total_pages, 2);
    }

    #[test]
    fn test_answer_outcome_degraded() {
        assert!(AnswerOutcome::Failed.is_degraded());
        assert!(AnswerOutcome::TimedOut.is_degraded());
        assert!(AnswerOutcome::Unavailable.is_degraded());
        assert!(!AnswerOutcome::Generated.is_degraded());
        assert!(!AnswerOutcome::NoItems.is_degraded());
    }
}
