//! Per-session state and the single synchronous request pass. A session is
//! an explicit object owned by its caller; there is no process-global
//! store, and each session renders into its own directory so concurrent
//! sessions never race on the per-type output files.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::Config;
use crate::diagram::build_graph;
use crate::error::Error;
use crate::extract::extract_diagram;
use crate::layout::compute_layout;
use crate::llm::CompletionBackend;
use crate::prompt::build_prompt;
use crate::render::{render_svg, write_svg, ImageFormat};
use crate::schema::{Diagram, DiagramType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct Session {
    pub id: String,
    pub diagram_type: DiagramType,
    pub messages: Vec<ChatMessage>,
    /// Last successfully parsed record; replaced wholesale on every
    /// successful message, untouched on failure.
    pub current_diagram: Option<Value>,
    pub latest_image: Option<PathBuf>,
    output_dir: PathBuf,
    format: ImageFormat,
}

impl Session {
    /// `output_root` is shared between sessions; each session claims the
    /// `<output_root>/<session-id>` subdirectory, created lazily on the
    /// first render.
    pub fn new(diagram_type: DiagramType, output_root: &Path, format: ImageFormat) -> Self {
        let id = Uuid::new_v4().to_string();
        let output_dir = output_root.join(&id);
        Self {
            id,
            diagram_type,
            messages: Vec::new(),
            current_diagram: None,
            latest_image: None,
            output_dir,
            format,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Switch the diagram-type selector. The next message regenerates the
    /// diagram in the new schema; the old record stays until then.
    pub fn set_diagram_type(&mut self, diagram_type: DiagramType) {
        self.diagram_type = diagram_type;
    }

    /// Run one full generate/refine pass: prompt, completion, extraction,
    /// schema check, render. On success the session log gains the user
    /// message plus a confirmation, and the diagram state is replaced. On
    /// failure the log gains the user message plus an error bubble, and
    /// the previous diagram and image stay as they were.
    pub fn process_message(
        &mut self,
        backend: &dyn CompletionBackend,
        config: &Config,
        text: &str,
    ) -> Result<PathBuf, Error> {
        self.push(Role::User, text.to_string());

        match self.run_pipeline(backend, config, text) {
            Ok((value, image_path)) => {
                let verb = if self.current_diagram.is_some() {
                    "updated"
                } else {
                    "created"
                };
                self.current_diagram = Some(value);
                self.latest_image = Some(image_path.clone());
                self.push(
                    Role::Assistant,
                    format!("I've {verb} the diagram based on your request."),
                );
                info!("session {} rendered {}", self.id, image_path.display());
                Ok(image_path)
            }
            Err(err) => {
                warn!("session {} request failed: {err}", self.id);
                self.push(Role::Assistant, err.user_message());
                Err(err)
            }
        }
    }

    fn run_pipeline(
        &self,
        backend: &dyn CompletionBackend,
        config: &Config,
        text: &str,
    ) -> Result<(Value, PathBuf), Error> {
        let prompt = build_prompt(text, self.diagram_type, self.current_diagram.as_ref());
        let raw = backend.complete(&prompt)?;
        let value = extract_diagram(&raw)?;
        let diagram = Diagram::from_value(self.diagram_type, &value)?;
        let graph = build_graph(&diagram)?;
        debug!(
            "built {} graph: {} nodes, {} edges",
            self.diagram_type,
            graph.nodes.len(),
            graph.edges.len()
        );

        let layout = compute_layout(&graph, &config.theme, &config.layout);
        let svg = render_svg(&layout, &config.theme, &config.layout);

        std::fs::create_dir_all(&self.output_dir)?;
        let stem = self.diagram_type.file_stem();
        let svg_path = self.output_dir.join(format!("{stem}.svg"));
        write_svg(&svg, &svg_path)?;

        let image_path = match self.format {
            ImageFormat::Svg => svg_path,
            ImageFormat::Png => {
                let png_path = self.output_dir.join(format!("{stem}.png"));
                self.rasterize(&svg, &png_path, config)?;
                png_path
            }
        };
        Ok((value, image_path))
    }

    #[cfg(feature = "png")]
    fn rasterize(&self, svg: &str, path: &Path, config: &Config) -> Result<(), Error> {
        crate::render::write_png(svg, path, &config.render)
    }

    #[cfg(not(feature = "png"))]
    fn rasterize(&self, _svg: &str, _path: &Path, _config: &Config) -> Result<(), Error> {
        Err(Error::Render(
            "png output support was not compiled in".to_string(),
        ))
    }

    /// Data URI for the latest rendered PNG, paired with
    /// [`crate::render::DOWNLOAD_FILE_NAME`] as the suggested filename.
    pub fn download_data_uri(&self) -> Result<String, Error> {
        let path = self
            .latest_image
            .as_ref()
            .ok_or_else(|| Error::Render("no diagram has been rendered yet".to_string()))?;
        crate::render::png_data_uri(path)
    }

    /// Pretty JSON transcript of the session for explicit export; nothing
    /// is persisted implicitly.
    pub fn to_transcript_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("transcript serialization failed: {e}")))
    }

    fn push(&mut self, role: Role, content: String) {
        self.messages.push(ChatMessage {
            role,
            content,
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    /// Canned backend: returns queued replies in order.
    struct ScriptedBackend {
        replies: std::cell::RefCell<Vec<Result<String, Error>>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<String, Error>>) -> Self {
            Self {
                replies: std::cell::RefCell::new(replies),
            }
        }
    }

    impl CompletionBackend for ScriptedBackend {
        fn complete(&self, _prompt: &str) -> Result<String, Error> {
            self.replies.borrow_mut().remove(0)
        }
    }

    fn sequence_reply(participants: &[&str]) -> String {
        let list = participants
            .iter()
            .map(|p| format!("\"{p}\""))
            .collect::<Vec<_>>()
            .join(", ");
        format!("Here you go:\n{{\"participants\": [{list}], \"messages\": []}}")
    }

    fn test_session(root: &Path) -> Session {
        Session::new(DiagramType::Sequence, root, ImageFormat::Svg)
    }

    #[test]
    fn successful_message_replaces_diagram_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = test_session(dir.path());
        let backend = ScriptedBackend::new(vec![
            Ok(sequence_reply(&["User", "Server"])),
            Ok(sequence_reply(&["User", "Server", "Database"])),
        ]);
        let config = Config::default();

        session.process_message(&backend, &config, "user talks to server").unwrap();
        let first = session.current_diagram.clone().unwrap();
        assert_eq!(first["participants"].as_array().unwrap().len(), 2);

        session.process_message(&backend, &config, "add a database").unwrap();
        let second = session.current_diagram.clone().unwrap();
        // Full replacement, not a merge.
        assert_eq!(second["participants"].as_array().unwrap().len(), 3);
        assert_eq!(second["participants"][2], "Database");
    }

    #[test]
    fn failure_keeps_previous_diagram_and_appends_error_bubble() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = test_session(dir.path());
        let backend = ScriptedBackend::new(vec![
            Ok(sequence_reply(&["User", "Server"])),
            Ok("no json here, sorry".to_string()),
        ]);
        let config = Config::default();

        let image = session
            .process_message(&backend, &config, "first")
            .unwrap();
        assert!(session
            .process_message(&backend, &config, "second")
            .is_err());

        let diagram = session.current_diagram.clone().unwrap();
        assert_eq!(diagram["participants"].as_array().unwrap().len(), 2);
        assert_eq!(session.latest_image.as_deref(), Some(image.as_path()));

        let last = session.messages.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, "Couldn't generate diagram. Please try again.");
    }

    #[test]
    fn confirmation_wording_tracks_create_vs_update() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = test_session(dir.path());
        let backend = ScriptedBackend::new(vec![
            Ok(sequence_reply(&["A", "B"])),
            Ok(sequence_reply(&["A", "B"])),
        ]);
        let config = Config::default();

        session.process_message(&backend, &config, "one").unwrap();
        assert!(session.messages[1].content.contains("created"));
        session.process_message(&backend, &config, "two").unwrap();
        assert!(session.messages[3].content.contains("updated"));
    }

    #[test]
    fn sessions_render_into_distinct_directories() {
        let dir = tempfile::tempdir().unwrap();
        let a = test_session(dir.path());
        let b = test_session(dir.path());
        assert_ne!(a.output_dir(), b.output_dir());
    }

    #[test]
    fn rendered_image_lands_in_the_session_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = test_session(dir.path());
        let backend = ScriptedBackend::new(vec![Ok(sequence_reply(&["User", "Server"]))]);
        let config = Config::default();

        let image = session
            .process_message(&backend, &config, "go")
            .unwrap();
        assert!(image.starts_with(session.output_dir()));
        let contents = std::fs::read_to_string(&image).unwrap();
        assert!(contents.contains("<svg"));
    }

    #[test]
    fn transcript_export_is_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = test_session(dir.path());
        let backend = ScriptedBackend::new(vec![Ok(sequence_reply(&["A", "B"]))]);
        session
            .process_message(&backend, &Config::default(), "hello")
            .unwrap();
        let transcript = session.to_transcript_json().unwrap();
        let value: Value = serde_json::from_str(&transcript).unwrap();
        assert_eq!(value["messages"].as_array().unwrap().len(), 2);
        assert_eq!(value["diagram_type"], "Sequence");
    }
}
