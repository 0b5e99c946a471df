//! Prompt templates for the completion service. One template per diagram
//! type; each states the target JSON shape with a literal example and
//! appends the user text verbatim. User text is intentionally not escaped
//! or sanitized, so it can steer the model arbitrarily; the downstream
//! extractor and schema checks are the only guard.

use serde_json::Value;

use crate::schema::DiagramType;

const ACTIVITY_TEMPLATE: &str = r#"Convert the following description into a structured JSON format for an activity diagram.
If this is a modification request, update the current diagram state accordingly.

Format:
{
  "start": "Start",
  "activities": [
    {"id": "a1", "label": "Some Activity"},
    {"id": "d1", "label": "Some Decision?"}
  ],
  "edges": [
    ["start", "a1"],
    ["a1", "d1"],
    ["d1", "a2", "Yes"],
    ["d1", "a3", "No"]
  ]
}
"#;

const SEQUENCE_TEMPLATE: &str = r#"Convert the following description into a structured JSON format for a sequence diagram.

Format:
{
  "participants": ["User", "Server", "Database"],
  "messages": [
    {"from": "User", "to": "Server", "message": "Login Request"},
    {"from": "Server", "to": "Database", "message": "Verify Credentials"}
  ]
}
"#;

const CLASS_TEMPLATE: &str = r#"Convert the following description into a structured JSON format for a class diagram.

Format:
{
  "classes": [
    {
      "name": "User",
      "attributes": ["name: string", "email: string"],
      "methods": ["login()", "logout()"]
    }
  ],
  "relationships": [
    {"from": "User", "to": "Order", "type": "has many"}
  ]
}
"#;

const USE_CASE_TEMPLATE: &str = r#"Convert the following description into a structured JSON format for a use case diagram.

Format:
{
  "actors": ["Customer", "Admin"],
  "useCases": [
    {"name": "Place Order", "actors": ["Customer"]},
    {"name": "Manage Inventory", "actors": ["Admin"]}
  ],
  "relationships": [
    {"from": "Place Order", "to": "Process Payment", "type": "includes"}
  ]
}
"#;

/// Assemble the full prompt for one user action. Pure; the same inputs
/// always produce the same string.
pub fn build_prompt(
    user_text: &str,
    diagram_type: DiagramType,
    current_diagram: Option<&Value>,
) -> String {
    let mut prompt = format!(
        "You are an expert in UML diagram modeling.\nCurrent Diagram Type: {}\n\n",
        diagram_type.name()
    );

    if let Some(current) = current_diagram {
        let serialized =
            serde_json::to_string_pretty(current).unwrap_or_else(|_| current.to_string());
        prompt.push_str(&format!("Current Diagram State: {serialized}\n\n"));
    }

    prompt.push_str(match diagram_type {
        DiagramType::Activity => ACTIVITY_TEMPLATE,
        DiagramType::Sequence => SEQUENCE_TEMPLATE,
        DiagramType::Class => CLASS_TEMPLATE,
        DiagramType::UseCase => USE_CASE_TEMPLATE,
    });

    prompt.push_str(&format!("\nInput: {user_text}\n"));
    prompt
}

/// Type-specific guidance shown before reading the first description.
pub fn input_hint(diagram_type: DiagramType) -> &'static str {
    match diagram_type {
        DiagramType::Activity => {
            "Describe the process flow (e.g., 'User logs in, checks dashboard...')"
        }
        DiagramType::Sequence => {
            "List the participants and their interactions (e.g., 'User sends request to Server...')"
        }
        DiagramType::Class => {
            "Describe classes, attributes, methods, and relationships (e.g., 'User class has name, email...')"
        }
        DiagramType::UseCase => {
            "Describe actors and their interactions with the system (e.g., 'Customer can place order...')"
        }
    }
}
