//! Typed records for the four supported diagram kinds, deserialized from
//! the JSON object recovered out of the model's reply. The model is always
//! asked for the full structure, so a successful parse replaces the
//! session's previous record wholesale.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Sentinel ids an activity edge may reference without declaring them.
pub const START_ID: &str = "start";
pub const FINAL_ID: &str = "final";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagramType {
    Activity,
    Sequence,
    Class,
    UseCase,
}

impl DiagramType {
    pub fn name(self) -> &'static str {
        match self {
            DiagramType::Activity => "Activity",
            DiagramType::Sequence => "Sequence",
            DiagramType::Class => "Class",
            DiagramType::UseCase => "Use Case",
        }
    }

    /// Per-type output file stem; one file per type, overwritten on
    /// re-render within a session.
    pub fn file_stem(self) -> &'static str {
        match self {
            DiagramType::Activity => "activity_diagram",
            DiagramType::Sequence => "sequence_diagram",
            DiagramType::Class => "class_diagram",
            DiagramType::UseCase => "use_case_diagram",
        }
    }
}

impl std::fmt::Display for DiagramType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActivityDiagram {
    pub activities: Vec<Activity>,
    pub edges: Vec<ActivityEdge>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Activity {
    pub id: String,
    pub label: String,
}

/// An edge triple from the model: `["a1", "a2"]` or `["d1", "a2", "Yes"]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct ActivityEdge {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
}

impl TryFrom<Vec<String>> for ActivityEdge {
    type Error = String;

    fn try_from(parts: Vec<String>) -> Result<Self, Self::Error> {
        match parts.len() {
            2 | 3 => {
                let mut it = parts.into_iter();
                Ok(ActivityEdge {
                    from: it.next().unwrap(),
                    to: it.next().unwrap(),
                    label: it.next(),
                })
            }
            n => Err(format!("activity edge must have 2 or 3 elements, got {n}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SequenceDiagram {
    pub participants: Vec<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassDiagram {
    pub classes: Vec<ClassRecord>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Relationship {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseCaseDiagram {
    pub actors: Vec<String>,
    pub use_cases: Vec<UseCase>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UseCase {
    pub name: String,
    #[serde(default)]
    pub actors: Vec<String>,
}

/// Closed set of schema variants keyed by [`DiagramType`].
#[derive(Debug, Clone, PartialEq)]
pub enum Diagram {
    Activity(ActivityDiagram),
    Sequence(SequenceDiagram),
    Class(ClassDiagram),
    UseCase(UseCaseDiagram),
}

impl Diagram {
    /// Interpret a parsed JSON value as the schema selected by `kind`. A
    /// value that parses as JSON but does not fit the schema is a render
    /// failure, not a parse failure.
    pub fn from_value(kind: DiagramType, value: &Value) -> Result<Self, Error> {
        let result = match kind {
            DiagramType::Activity => {
                serde_json::from_value(value.clone()).map(Diagram::Activity)
            }
            DiagramType::Sequence => {
                serde_json::from_value(value.clone()).map(Diagram::Sequence)
            }
            DiagramType::Class => serde_json::from_value(value.clone()).map(Diagram::Class),
            DiagramType::UseCase => {
                serde_json::from_value(value.clone()).map(Diagram::UseCase)
            }
        };
        result.map_err(|e| {
            Error::Render(format!("response does not match the {kind} diagram schema: {e}"))
        })
    }

    pub fn kind(&self) -> DiagramType {
        match self {
            Diagram::Activity(_) => DiagramType::Activity,
            Diagram::Sequence(_) => DiagramType::Sequence,
            Diagram::Class(_) => DiagramType::Class,
            Diagram::UseCase(_) => DiagramType::UseCase,
        }
    }
}
