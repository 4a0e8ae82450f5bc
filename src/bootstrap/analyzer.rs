//! Agent analyzer: normalizes heterogeneous agent sources into one record.
//!
//! Three source shapes are accepted:
//!
//! ```text
//! AgentSource::Markdown    ---\nname: tester\n---\n# Tester\nWrites tests...
//! AgentSource::Structured  { id, name, description, instructions, tools, metadata }
//! AgentSource::Json        {"name": "tester", "instructions": "..."}
//! ```
//!
//! All of them end up as an [`AnalyzedAgent`] with a derived name, an
//! optional description, the instruction content and leftover metadata.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utilities::string_utils::{first_heading, first_paragraph};

use super::error::BootstrapError;

/// Name used when nothing in the source identifies the agent.
pub const UNKNOWN_AGENT_NAME: &str = "unknown-agent";

/// Keys tried (in order) for the instruction body of a JSON definition.
const JSON_CONTENT_KEYS: &[&str] =
    &["instructions", "system_prompt", "prompt", "content", "backstory"];

/// A raw agent description as delivered by the agent-loading subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentSource {
    /// Markdown, optionally with YAML frontmatter.
    Markdown {
        content: String,
        /// Where the markdown came from; its file stem is the last-resort name.
        #[serde(default)]
        path: Option<String>,
    },
    /// An already-structured key/value descriptor.
    Structured(StructuredAgent),
    /// A JSON definition as text.
    Json { definition: String },
}

/// Key/value agent descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuredAgent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Instruction / system prompt body.
    #[serde(default, alias = "prompt", alias = "system_prompt")]
    pub instructions: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

/// The canonical record every source variant is normalized into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedAgent {
    pub name: String,
    pub description: Option<String>,
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl AnalyzedAgent {
    /// All text the capability detector should scan.
    pub fn searchable_text(&self) -> String {
        let mut text = String::with_capacity(self.content.len() + 256);
        text.push_str(&self.name);
        text.push('\n');
        if let Some(description) = &self.description {
            text.push_str(description);
            text.push('\n');
        }
        for key in ["tools", "tags", "skills"] {
            if let Some(Value::Array(items)) = self.metadata.get(key) {
                for item in items.iter().filter_map(Value::as_str) {
                    text.push_str(item);
                    text.push(' ');
                }
                text.push('\n');
            }
        }
        text.push_str(&self.content);
        text
    }

    /// Whether the name fell through to the default.
    pub fn has_default_name(&self) -> bool {
        self.name == UNKNOWN_AGENT_NAME
    }
}

impl AgentSource {
    /// Markdown source without a known path.
    pub fn markdown(content: impl Into<String>) -> Self {
        AgentSource::Markdown {
            content: content.into(),
            path: None,
        }
    }

    /// JSON source from definition text.
    pub fn json(definition: impl Into<String>) -> Self {
        AgentSource::Json {
            definition: definition.into(),
        }
    }

    /// Build a source from a file path and its contents, picking the
    /// variant from the extension.
    pub fn from_path(
        path: impl AsRef<Path>,
        content: impl Into<String>,
    ) -> Result<Self, BootstrapError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let content = content.into();

        match extension.as_str() {
            "md" | "markdown" => Ok(AgentSource::Markdown {
                content,
                path: Some(path.display().to_string()),
            }),
            "json" => Ok(AgentSource::Json { definition: content }),
            "yaml" | "yml" => {
                let mut agent: StructuredAgent = serde_yaml::from_str(&content)?;
                if agent.name.is_none() && agent.id.is_none() {
                    agent.name = file_stem(&path.display().to_string());
                }
                Ok(AgentSource::Structured(agent))
            }
            other => Err(BootstrapError::UnsupportedSource {
                kind: if other.is_empty() {
                    format!("{} (no extension)", path.display())
                } else {
                    format!(".{}", other)
                },
            }),
        }
    }

    /// Short label for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentSource::Markdown { .. } => "markdown",
            AgentSource::Structured(_) => "structured",
            AgentSource::Json { .. } => "json",
        }
    }
}

/// Normalize any source variant into an [`AnalyzedAgent`].
pub fn analyze(source: &AgentSource) -> Result<AnalyzedAgent, BootstrapError> {
    match source {
        AgentSource::Markdown { content, path } => Ok(analyze_markdown(content, path.as_deref())),
        AgentSource::Structured(agent) => Ok(analyze_structured(agent)),
        AgentSource::Json { definition } => analyze_json(definition),
    }
}

/// Markdown analysis never fails: broken frontmatter degrades to plain content.
fn analyze_markdown(raw: &str, path: Option<&str>) -> AnalyzedAgent {
    let (frontmatter, body) = match split_frontmatter(raw) {
        Some((yaml, body)) => match serde_yaml::from_str::<serde_yaml::Mapping>(yaml) {
            Ok(mapping) => (Some(mapping), body),
            Err(e) => {
                log::warn!(
                    "Malformed frontmatter in {}: {}; treating the whole document as content",
                    path.unwrap_or("<inline markdown>"),
                    e
                );
                (None, raw)
            }
        },
        None => (None, raw),
    };

    let mut metadata: HashMap<String, Value> = HashMap::new();
    if let Some(mapping) = &frontmatter {
        for (key, value) in mapping {
            let Some(key) = key.as_str() else { continue };
            match serde_json::to_value(value) {
                Ok(json) => {
                    metadata.insert(key.to_string(), json);
                }
                Err(e) => log::debug!("Skipping frontmatter key '{}': {}", key, e),
            }
        }
    }

    let name = take_string(&mut metadata, "name")
        .or_else(|| first_heading(body))
        .or_else(|| path.and_then(file_stem))
        .unwrap_or_else(|| UNKNOWN_AGENT_NAME.to_string());

    let description = take_string(&mut metadata, "description").or_else(|| first_paragraph(body));

    AnalyzedAgent {
        name,
        description,
        content: body.trim().to_string(),
        metadata,
    }
}

fn analyze_structured(agent: &StructuredAgent) -> AnalyzedAgent {
    let name = non_blank(agent.name.as_deref())
        .or_else(|| non_blank(agent.id.as_deref()))
        .unwrap_or_else(|| UNKNOWN_AGENT_NAME.to_string());

    let mut metadata = agent.metadata.clone();
    if !agent.tools.is_empty() {
        metadata.insert("tools".to_string(), Value::from(agent.tools.clone()));
    }
    if let Some(id) = non_blank(agent.id.as_deref()) {
        metadata.entry("id".to_string()).or_insert(Value::String(id));
    }

    AnalyzedAgent {
        name,
        description: non_blank(agent.description.as_deref()),
        content: agent.instructions.clone().unwrap_or_default().trim().to_string(),
        metadata,
    }
}

fn analyze_json(definition: &str) -> Result<AnalyzedAgent, BootstrapError> {
    let value: Value = serde_json::from_str(definition)?;
    let Value::Object(object) = value else {
        return Err(BootstrapError::InvalidDefinition(
            "JSON agent definition must be an object".to_string(),
        ));
    };

    let mut metadata: HashMap<String, Value> = object.into_iter().collect();

    let name = take_string(&mut metadata, "name")
        .or_else(|| metadata.get("id").and_then(Value::as_str).and_then(|s| non_blank(Some(s))))
        .unwrap_or_else(|| UNKNOWN_AGENT_NAME.to_string());
    let description = take_string(&mut metadata, "description");

    let content = JSON_CONTENT_KEYS
        .iter()
        .find_map(|key| take_string(&mut metadata, key))
        .unwrap_or_default();

    Ok(AnalyzedAgent {
        name,
        description,
        content,
        metadata,
    })
}

/// Split `---\n<yaml>\n---\n<body>`; `None` when the document has no
/// (terminated) frontmatter block.
fn split_frontmatter(raw: &str) -> Option<(&str, &str)> {
    let rest = raw
        .strip_prefix("---\r\n")
        .or_else(|| raw.strip_prefix("---\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

/// Remove `key` from the map if it holds a non-blank string.
fn take_string(map: &mut HashMap<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => {}
        _ => return None,
    }
    match map.remove(key) {
        Some(Value::String(s)) => Some(s.trim().to_string()),
        _ => None,
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn file_stem(path: &str) -> Option<String> {
    Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|s| non_blank(Some(s)))
}
