use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One entity as it appears in an uploaded entity file.
///
/// The name is read from `entity_kwd`; `name` is only a fallback for
/// items that lack it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEntity")]
pub struct EntityRecord {
    pub id: String,
    #[serde(rename = "entity_kwd")]
    pub name: String,
    pub description: String,
    pub source: Vec<String>,
}

#[derive(Deserialize)]
struct RawEntity {
    #[serde(deserialize_with = "id_string")]
    id: String,
    #[serde(default)]
    entity_kwd: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    source: Vec<String>,
}

impl TryFrom<RawEntity> for EntityRecord {
    type Error = String;

    fn try_from(raw: RawEntity) -> Result<Self, Self::Error> {
        let name = raw
            .entity_kwd
            .or(raw.name)
            .ok_or_else(|| "missing field `entity_kwd`".to_string())?;

        Ok(Self {
            id: raw.id,
            name,
            description: raw.description,
            source: raw.source,
        })
    }
}

/// One directed relation between two entity ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRecord {
    #[serde(rename = "head_entity_id", deserialize_with = "id_string")]
    pub head_id: String,
    #[serde(rename = "tail_entity_id", deserialize_with = "id_string")]
    pub tail_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl EntityRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            source: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl RelationRecord {
    pub fn new(
        head_id: impl Into<String>,
        tail_id: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            head_id: head_id.into(),
            tail_id: tail_id.into(),
            relation: relation.into(),
            weight: None,
        }
    }
}

// Exported files carry ids as either strings or integers; both compare as text.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
