use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::payload::Payload;
use crate::record::{EntityRecord, RelationRecord};

/// Key whose presence in the first element marks an entity file.
const ENTITY_KEY: &str = "entity_kwd";
/// Checked only after the relation keys; relation rows may carry a name too.
const FALLBACK_ENTITY_KEY: &str = "name";
const HEAD_KEY: &str = "head_entity_id";
const TAIL_KEY: &str = "tail_entity_id";

/// What a single payload turned out to contain.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadKind {
    Entities(Vec<EntityRecord>),
    Relations(Vec<RelationRecord>),
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    InvalidJson { message: String },
    NotAnArray,
    EmptyArray,
    UnrecognizedSchema,
    MalformedItem { index: usize, message: String },
}

/// A payload (or one element of it) that was left out of the load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Skipped {
    pub label: String,
    pub reason: SkipReason,
}

/// Records recovered from a batch of payloads, in input order.
#[derive(Debug, Clone, Default)]
pub struct LoadedRecords {
    pub entities: Vec<EntityRecord>,
    pub relations: Vec<RelationRecord>,
    pub skipped: Vec<Skipped>,
}

/// Decide what a payload holds and parse its elements.
///
/// Elements that do not fit the detected schema are dropped and reported in
/// the returned skip list; whole-payload problems (bad JSON, wrong shape)
/// yield an empty kind and a single skip entry.
pub fn classify(payload: &Payload) -> (PayloadKind, Vec<Skipped>) {
    let skip = |reason| Skipped {
        label: payload.label.clone(),
        reason,
    };

    let value: Value = match serde_json::from_str(&payload.content) {
        Ok(value) => value,
        Err(e) => {
            let reason = SkipReason::InvalidJson {
                message: e.to_string(),
            };
            return (PayloadKind::Unrecognized, vec![skip(reason)]);
        }
    };

    let Value::Array(items) = value else {
        return (PayloadKind::Unrecognized, vec![skip(SkipReason::NotAnArray)]);
    };

    let Some(first) = items.first() else {
        return (PayloadKind::Unrecognized, vec![skip(SkipReason::EmptyArray)]);
    };

    let has_key = |key: &str| first.get(key).is_some();

    if has_key(ENTITY_KEY) {
        let (entities, skipped) = parse_items::<EntityRecord>(items, &payload.label);
        (PayloadKind::Entities(entities), skipped)
    } else if has_key(HEAD_KEY) && has_key(TAIL_KEY) {
        let (relations, skipped) = parse_items::<RelationRecord>(items, &payload.label);
        (PayloadKind::Relations(relations), skipped)
    } else if has_key(FALLBACK_ENTITY_KEY) {
        let (entities, skipped) = parse_items::<EntityRecord>(items, &payload.label);
        (PayloadKind::Entities(entities), skipped)
    } else {
        (
            PayloadKind::Unrecognized,
            vec![skip(SkipReason::UnrecognizedSchema)],
        )
    }
}

fn parse_items<T>(items: Vec<Value>, label: &str) -> (Vec<T>, Vec<Skipped>)
where
    T: serde::de::DeserializeOwned,
{
    let mut parsed = Vec::with_capacity(items.len());
    let mut skipped = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<T>(item) {
            Ok(record) => parsed.push(record),
            Err(e) => skipped.push(Skipped {
                label: label.to_string(),
                reason: SkipReason::MalformedItem {
                    index,
                    message: e.to_string(),
                },
            }),
        }
    }

    (parsed, skipped)
}

/// Load every payload, concatenating entities and relations in input order.
///
/// Never fails: a corrupt payload only removes its own records.
pub fn load_payloads(payloads: &[Payload]) -> LoadedRecords {
    let mut loaded = LoadedRecords::default();

    for payload in payloads {
        let (kind, skipped) = classify(payload);

        match kind {
            PayloadKind::Entities(entities) => {
                debug!(label = %payload.label, count = entities.len(), "Detected entity payload");
                loaded.entities.extend(entities);
            }
            PayloadKind::Relations(relations) => {
                debug!(label = %payload.label, count = relations.len(), "Detected relation payload");
                loaded.relations.extend(relations);
            }
            PayloadKind::Unrecognized => {}
        }

        for entry in &skipped {
            warn!(label = %entry.label, reason = ?entry.reason, "Skipping payload content");
        }
        loaded.skipped.extend(skipped);
    }

    loaded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(label: &str, content: &str) -> Payload {
        Payload::new(label, content)
    }

    #[test]
    fn test_classify_entities() {
        let (kind, skipped) = classify(&payload(
            "entities.json",
            r#"[{"id": "1", "entity_kwd": "Alice"}, {"id": "2", "entity_kwd": "Bob"}]"#,
        ));

        assert!(skipped.is_empty());
        match kind {
            PayloadKind::Entities(entities) => {
                assert_eq!(entities.len(), 2);
                assert_eq!(entities[1].name, "Bob");
            }
            other => panic!("expected entities, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_relations() {
        let (kind, _) = classify(&payload(
            "relations.json",
            r#"[{"head_entity_id": "1", "tail_entity_id": "2", "relation": "knows"}]"#,
        ));

        assert_eq!(
            kind,
            PayloadKind::Relations(vec![RelationRecord::new("1", "2", "knows")])
        );
    }

    #[test]
    fn test_entities_with_both_name_keys_load() {
        let (kind, skipped) = classify(&payload(
            "entities.json",
            r#"[{"id": 1, "entity_kwd": "Alice", "name": "alice"}, {"id": 2, "entity_kwd": "Bob", "name": "bob"}]"#,
        ));

        assert!(skipped.is_empty());
        let PayloadKind::Entities(entities) = kind else {
            panic!("expected entities");
        };
        let names: Vec<_> = entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_named_relations_stay_relations() {
        let (kind, skipped) = classify(&payload(
            "relations.json",
            r#"[{"head_entity_id": 1, "tail_entity_id": 2, "relation": "knows", "name": "r1"}]"#,
        ));

        assert!(skipped.is_empty());
        assert_eq!(
            kind,
            PayloadKind::Relations(vec![RelationRecord::new("1", "2", "knows")])
        );
    }

    #[test]
    fn test_name_only_entities_still_load() {
        let (kind, _) = classify(&payload("entities.json", r#"[{"id": "e1", "name": "Rust"}]"#));
        assert_eq!(kind, PayloadKind::Entities(vec![EntityRecord::new("e1", "Rust")]));
    }

    #[test]
    fn test_classify_rejects_bad_shapes() {
        let cases = [
            ("{not json", "invalid_json"),
            (r#"{"id": 1}"#, "not_an_array"),
            ("[]", "empty_array"),
            (r#"[{"foo": "bar"}]"#, "unrecognized_schema"),
        ];

        for (content, expected) in cases {
            let (kind, skipped) = classify(&payload("bad.json", content));
            assert_eq!(kind, PayloadKind::Unrecognized, "content: {}", content);
            assert_eq!(skipped.len(), 1);
            let tag = serde_json::to_value(&skipped[0].reason).unwrap();
            assert_eq!(tag["kind"], expected);
        }
    }

    #[test]
    fn test_malformed_item_is_skipped_individually() {
        let (kind, skipped) = classify(&payload(
            "entities.json",
            r#"[{"id": "1", "entity_kwd": "Alice"}, {"entity_kwd": "NoId"}, {"id": "3", "entity_kwd": "Carol"}]"#,
        ));

        let PayloadKind::Entities(entities) = kind else {
            panic!("expected entities");
        };
        assert_eq!(entities.len(), 2);
        assert_eq!(skipped.len(), 1);
        assert!(matches!(
            skipped[0].reason,
            SkipReason::MalformedItem { index: 1, .. }
        ));
    }

    #[test]
    fn test_truncated_relation_file_does_not_block_entities() {
        let loaded = load_payloads(&[
            payload(
                "entities.json",
                r#"[{"id": "1", "entity_kwd": "Alice"}, {"id": "2", "entity_kwd": "Bob"}]"#,
            ),
            payload(
                "relations.json",
                r#"[{"head_entity_id": "1", "tail_entity_id": "2", "rel"#,
            ),
        ]);

        assert_eq!(loaded.entities.len(), 2);
        assert!(loaded.relations.is_empty());
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].label, "relations.json");
    }

    #[test]
    fn test_concatenates_in_input_order() {
        let loaded = load_payloads(&[
            payload("a.json", r#"[{"id": "1", "entity_kwd": "A"}]"#),
            payload("r.json", r#"[{"head_entity_id": "1", "tail_entity_id": "2"}]"#),
            payload("b.json", r#"[{"id": "2", "entity_kwd": "B"}]"#),
        ]);

        let names: Vec<_> = loaded.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(loaded.relations.len(), 1);
        assert!(loaded.skipped.is_empty());
    }

    #[test]
    fn test_no_payloads_is_empty() {
        let loaded = load_payloads(&[]);
        assert!(loaded.entities.is_empty());
        assert!(loaded.relations.is_empty());
    }
}
