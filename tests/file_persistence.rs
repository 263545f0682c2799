//! File backend: collections survive reopening, and unreadable slots are
//! reseeded.

use std::fs;

use portal_store::entities::seeds;
use portal_store::{
    open_registry, Feedback, ForumCategories, ForumTopic, ForumTopics, Portal, Query, StoreConfig,
};
use serde_json::{json, Value};
use tempfile::tempdir;

#[test]
fn test_seeded_slots_are_written_on_first_open() {
    let dir = tempdir().unwrap();
    let registry = open_registry(StoreConfig::file(dir.path())).unwrap();
    let _portal = Portal::open(&registry).unwrap();

    let raw = fs::read_to_string(dir.path().join("forum_categories.json")).unwrap();
    let parsed: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.as_array().map(Vec::len), Some(4));

    let feedback = fs::read_to_string(dir.path().join("feedback.json")).unwrap();
    assert_eq!(serde_json::from_str::<Value>(&feedback).unwrap(), json!([]));
}

#[test]
fn test_mutations_survive_reopen() {
    let dir = tempdir().unwrap();

    let (feedback_id, topic_id) = {
        let registry = open_registry(StoreConfig::file(dir.path())).unwrap();
        let portal = Portal::open(&registry).unwrap();
        let feedback = portal
            .feedback
            .create(Feedback::new("ana@portal.local", 4, "Muito bom"))
            .unwrap();
        let topic = portal
            .topics
            .create(ForumTopic::new("events", "Happy hour", "Sexta às 18h"))
            .unwrap();
        portal
            .topics
            .update("welcome", &json!({"views": 42}))
            .unwrap();
        (feedback.id.unwrap(), topic.id.unwrap())
    };

    let registry = open_registry(StoreConfig::file(dir.path())).unwrap();
    let portal = Portal::open(&registry).unwrap();

    let feedback = portal.feedback.list(&Query::new());
    assert_eq!(feedback.len(), 1);
    assert_eq!(feedback[0].id.as_deref(), Some(feedback_id.as_str()));
    assert_eq!(feedback[0].message, "Muito bom");

    assert_eq!(portal.topics.get(&topic_id).unwrap().title, "Happy hour");
    assert_eq!(portal.topics.get("welcome").unwrap().views, 42);
    assert_eq!(portal.topics.list(&Query::new()).len(), 3);
}

#[test]
fn test_persisted_empty_collection_is_not_reseeded() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("forum_categories.json"), "[]").unwrap();

    let registry = open_registry(StoreConfig::file(dir.path())).unwrap();
    let categories = ForumCategories::open(&registry).unwrap();
    assert!(categories.list(&Query::new()).is_empty());
}

#[test]
fn test_corrupt_slot_is_reseeded_and_overwritten() {
    let dir = tempdir().unwrap();
    let slot = dir.path().join("forum_topics.json");
    fs::write(&slot, "{ definitely not a topic list").unwrap();

    let registry = open_registry(StoreConfig::file(dir.path())).unwrap();
    let topics = ForumTopics::open(&registry).unwrap();
    assert_eq!(topics.list(&Query::new()), seeds::forum_topics());

    let raw = fs::read_to_string(&slot).unwrap();
    let repaired: Vec<ForumTopic> = serde_json::from_str(&raw).unwrap();
    assert_eq!(repaired, seeds::forum_topics());
}

#[test]
fn test_no_temp_files_left_behind() {
    let dir = tempdir().unwrap();
    let registry = open_registry(StoreConfig::file(dir.path())).unwrap();
    let portal = Portal::open(&registry).unwrap();
    for i in 0..5 {
        portal
            .feedback
            .create(Feedback::new(format!("u{i}@portal.local"), 5, "ok"))
            .unwrap();
    }

    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
