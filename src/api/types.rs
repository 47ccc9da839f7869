use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_RELATION_WEIGHT: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(
        default,
        deserialize_with = "optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub label: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl Node {
    /// Persisted layout position stored in `meta.x` / `meta.y`.
    ///
    /// Missing, non-numeric or non-finite coordinates mean the node is free.
    pub fn position(&self) -> Option<Position> {
        let meta = self.meta.as_ref()?;
        let x = meta.get("x")?.as_f64()?;
        let y = meta.get("y")?.as_f64()?;
        (x.is_finite() && y.is_finite()).then_some(Position { x, y })
    }

    pub fn meta_with_position(&self, position: Position) -> Map<String, Value> {
        let mut meta = self.meta.clone().unwrap_or_default();
        meta.insert("x".to_owned(), Value::from(position.x));
        meta.insert("y".to_owned(), Value::from(position.y));
        meta
    }
}

/// Relation type as the server names it. Types this client does not know
/// keep their raw name so they can be shown and written back unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationType {
    Prerequisite,
    #[default]
    Related,
    PartOf,
    Other(String),
}

impl RelationType {
    pub const SELECTABLE: [Self; 3] = [Self::Prerequisite, Self::Related, Self::PartOf];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Prerequisite => "prerequisite",
            Self::Related => "related",
            Self::PartOf => "part_of",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl From<String> for RelationType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "prerequisite" => Self::Prerequisite,
            "related" => Self::Related,
            "part_of" => Self::PartOf,
            _ => Self::Other(raw),
        }
    }
}

impl From<RelationType> for String {
    fn from(kind: RelationType) -> Self {
        match kind {
            RelationType::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(
        default,
        deserialize_with = "optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(deserialize_with = "required_id")]
    pub from: String,
    #[serde(deserialize_with = "required_id")]
    pub to: String,
    #[serde(rename = "type", default)]
    pub kind: RelationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl Relation {
    pub fn is_directed(&self) -> bool {
        self.directed.unwrap_or(false)
    }

    pub fn effective_weight(&self) -> f64 {
        self.weight
            .filter(|weight| weight.is_finite())
            .unwrap_or(DEFAULT_RELATION_WEIGHT)
            .clamp(0.0, 1.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub relations: Vec<Relation>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeDraft {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl NodeDraft {
    pub fn at(label: impl Into<String>, position: Position) -> Self {
        let mut meta = Map::new();
        meta.insert("x".to_owned(), Value::from(position.x));
        meta.insert("y".to_owned(), Value::from(position.y));
        Self {
            label: label.into(),
            meta: Some(meta),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NodePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// `Some(None)` clears the type on the server.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RelationDraft {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: RelationType,
    pub directed: bool,
    pub weight: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RelationPatch {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<RelationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

fn id_from_value<E: de::Error>(value: Value) -> Result<Option<String>, E> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        Value::Number(number) => Ok(Some(number.to_string())),
        other => Err(E::custom(format!(
            "expected a string or numeric id, found {other}"
        ))),
    }
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    id_from_value(Value::deserialize(deserializer)?)
}

fn required_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    id_from_value(Value::deserialize(deserializer)?)?
        .ok_or_else(|| de::Error::custom("relation endpoint id must not be null"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_ids_are_normalised_to_strings() {
        let relation: Relation = serde_json::from_value(json!({
            "id": 7,
            "from": 1,
            "to": "n2",
            "type": "part_of",
            "weight": 0.25
        }))
        .unwrap();

        assert_eq!(relation.id.as_deref(), Some("7"));
        assert_eq!(relation.from, "1");
        assert_eq!(relation.to, "n2");
        assert_eq!(relation.kind, RelationType::PartOf);
        assert!(!relation.is_directed());
    }

    #[test]
    fn unknown_relation_type_keeps_its_name() {
        let relation: Relation = serde_json::from_value(json!({
            "from": "a",
            "to": "b",
            "type": "contrasts_with"
        }))
        .unwrap();

        assert_eq!(
            relation.kind,
            RelationType::Other("contrasts_with".to_owned())
        );
        assert_eq!(relation.kind.as_str(), "contrasts_with");
        assert_eq!(relation.effective_weight(), DEFAULT_RELATION_WEIGHT);

        let written = serde_json::to_value(RelationPatch {
            kind: Some(relation.kind),
            ..RelationPatch::default()
        })
        .unwrap();
        assert_eq!(written, json!({ "type": "contrasts_with" }));
    }

    #[test]
    fn clearing_a_node_type_sends_null() {
        let cleared = serde_json::to_value(NodePatch {
            kind: Some(None),
            ..NodePatch::default()
        })
        .unwrap();
        assert_eq!(cleared, json!({ "type": null }));

        let untouched = serde_json::to_value(NodePatch::default()).unwrap();
        assert_eq!(untouched, json!({}));
    }

    #[test]
    fn null_relation_endpoint_is_rejected() {
        let parsed = serde_json::from_value::<Relation>(json!({
            "from": null,
            "to": "b",
            "type": "related"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn position_requires_both_finite_coordinates() {
        let mut node: Node = serde_json::from_value(json!({
            "id": "n1",
            "label": "Limits",
            "meta": { "x": 12.5, "y": -4 }
        }))
        .unwrap();
        assert_eq!(node.position(), Some(Position { x: 12.5, y: -4.0 }));

        node.meta = Some(serde_json::from_value(json!({ "x": 3 })).unwrap());
        assert_eq!(node.position(), None);

        node.meta = Some(serde_json::from_value(json!({ "x": "3", "y": 4 })).unwrap());
        assert_eq!(node.position(), None);

        node.meta = None;
        assert_eq!(node.position(), None);
    }

    #[test]
    fn position_merge_keeps_other_meta_keys() {
        let node: Node = serde_json::from_value(json!({
            "label": "Derivatives",
            "meta": { "x": 1, "y": 2, "difficulty": "hard" }
        }))
        .unwrap();

        let meta = node.meta_with_position(Position { x: 40.0, y: 50.0 });
        assert_eq!(meta.get("difficulty"), Some(&json!("hard")));
        assert_eq!(meta.get("x"), Some(&json!(40.0)));
        assert_eq!(meta.get("y"), Some(&json!(50.0)));
    }

    #[test]
    fn patches_only_carry_changed_fields() {
        let patch = RelationPatch {
            weight: Some(0.8),
            ..RelationPatch::default()
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "weight": 0.8 }));

        let patch = NodePatch {
            kind: Some(Some("skill".to_owned())),
            ..NodePatch::default()
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "type": "skill" }));
    }

    #[test]
    fn node_draft_places_position_in_meta() {
        let draft = NodeDraft::at("New node", Position { x: 400.0, y: 300.0 });
        assert_eq!(
            serde_json::to_value(&draft).unwrap(),
            json!({ "label": "New node", "meta": { "x": 400.0, "y": 300.0 } })
        );
    }

    #[test]
    fn relation_weight_is_clamped_and_defaulted() {
        let mut relation: Relation = serde_json::from_value(json!({
            "from": "a",
            "to": "b",
            "type": "related",
            "weight": 3.0
        }))
        .unwrap();
        assert_eq!(relation.effective_weight(), 1.0);

        relation.weight = Some(f64::NAN);
        assert_eq!(relation.effective_weight(), DEFAULT_RELATION_WEIGHT);
    }
}
