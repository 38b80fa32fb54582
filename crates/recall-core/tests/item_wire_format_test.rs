/// Verify the JSON shape of knowledge items and answers seen by callers.
///
/// The `type` key, lowercase item types and snake_case answer outcomes are
/// consumed by clients outside this workspace.
use chrono::Utc;
use recall_core::{Answer, AnswerOutcome, ItemType, KnowledgeItem, SourceRef};
use uuid::Uuid;

#[test]
fn test_knowledge_item_uses_type_key() {
    let now = Utc::now();
    let item = KnowledgeItem {
        id: Uuid::nil(),
        title: "Fox".to_string(),
        content: "The quick brown fox jumps.".to_string(),
        item_type: ItemType::Insight,
        tags: vec!["fox".to_string()],
        summary: None,
        embedding: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    let value = serde_json::to_value(&item).expect("serialize item");
    assert_eq!(value["type"], "insight");
    assert!(value.get("item_type").is_none());
    assert!(value["summary"].is_null());
    assert_eq!(value["embedding"].as_array().map(Vec::len), Some(0));
}

#[test]
fn test_knowledge_item_without_embedding_field_deserializes_empty() {
    let json = r#"{
        "id": "00000000-0000-0000-0000-000000000000",
        "title": "Tides",
        "content": "Tides follow the moon.",
        "type": "note",
        "tags": [],
        "summary": "Moon drives tides.",
        "created_at": "2026-01-01T00:00:00Z",
        "updated_at": "2026-01-01T00:00:00Z"
    }"#;

    let item: KnowledgeItem = serde_json::from_str(json).expect("Failed to deserialize");
    assert!(!item.has_embedding());
    assert_eq!(item.summary.as_deref(), Some("Moon drives tides."));
}

#[test]
fn test_answer_json_shape() {
    let answer = Answer {
        answer: "Foxes jump.".to_string(),
        sources: vec![SourceRef {
            id: Uuid::nil(),
            title: "Fox".to_string(),
            similarity_score: 0.5,
        }],
        outcome: AnswerOutcome::NoRelevantItems,
    };

    let value = serde_json::to_value(&answer).expect("serialize answer");
    assert_eq!(value["outcome"], "no_relevant_items");
    assert_eq!(value["sources"][0]["similarity_score"], 0.5);
    assert_eq!(value["sources"][0]["title"], "Fox");
}
