//! Auxiliary status resources polled alongside the chat stream.
//!
//! Each field of [`StatusSnapshot`] is a [`Resource`] that is refreshed and
//! fails independently of the others. A failed refresh keeps the previous
//! value and only records the error.

use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use url::Url;

/// Skill name to skill metadata, in server order.
pub type SkillRegistry = IndexMap<String, SkillInfo>;

/// Metadata describing one installed skill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillInfo {
    /// Short description of what the skill does.
    #[serde(default)]
    pub description: String,
    /// Any other fields the backend reports.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl SkillInfo {
    /// Create skill info with just a description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            extra: Map::new(),
        }
    }
}

/// A file produced by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFile {
    /// File name.
    pub name: String,
    /// Download location, usually relative to the backend root.
    pub url: String,
    /// File size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Modification time in unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<f64>,
}

impl OutputFile {
    /// Create an output file entry without metadata.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            size: None,
            mtime: None,
        }
    }

    /// Resolve the download URL against the backend base URL.
    pub fn resolve_url(&self, base: &Url) -> Result<Url, url::ParseError> {
        base.join(&self.url)
    }

    /// Modification time as a timestamp.
    #[must_use]
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        let mtime = self.mtime?;
        let secs = mtime.trunc() as i64;
        let nanos = (mtime.fract() * 1e9) as u32;
        Utc.timestamp_opt(secs, nanos).single()
    }
}

/// The agent's long- and short-term memory documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    /// Long-term memory.
    #[serde(default)]
    pub ltm: String,
    /// Short-term memory.
    #[serde(default)]
    pub stm: String,
}

/// Which status resource a refresh concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// The task list.
    Tasks,
    /// The skill registry.
    Skills,
    /// The output file listing.
    Outputs,
}

impl ResourceKind {
    /// All polled resources.
    pub const ALL: [ResourceKind; 3] = [Self::Tasks, Self::Skills, Self::Outputs];

    /// Stable lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Skills => "skills",
            Self::Outputs => "outputs",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last known good value of one resource plus refresh bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource<T> {
    value: Option<T>,
    updated_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    consecutive_failures: u32,
}

impl<T> Default for Resource<T> {
    fn default() -> Self {
        Self {
            value: None,
            updated_at: None,
            last_error: None,
            consecutive_failures: 0,
        }
    }
}

impl<T> Resource<T> {
    /// Last successfully fetched value.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Whether any fetch has ever succeeded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.value.is_some()
    }

    /// When the value was last replaced.
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Error from the most recent fetch, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of failed fetches since the last success.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Whether the value shown is older than the latest fetch attempt.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.last_error.is_some()
    }

    /// Replace the value wholesale.
    pub fn record_success(&mut self, value: T, at: DateTime<Utc>) {
        self.value = Some(value);
        self.updated_at = Some(at);
        self.last_error = None;
        self.consecutive_failures = 0;
    }

    /// Note a failed fetch, keeping the previous value.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }
}

/// Latest known state of every polled resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// Task list as a text blob.
    pub tasks: Resource<String>,
    /// Installed skills.
    pub skills: Resource<SkillRegistry>,
    /// Produced files, newest first as reported by the backend.
    pub outputs: Resource<Vec<OutputFile>>,
}

impl StatusSnapshot {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure against one resource.
    pub fn record_failure(&mut self, kind: ResourceKind, error: impl Into<String>) {
        match kind {
            ResourceKind::Tasks => self.tasks.record_failure(error),
            ResourceKind::Skills => self.skills.record_failure(error),
            ResourceKind::Outputs => self.outputs.record_failure(error),
        }
    }

    /// Resources whose last fetch failed.
    #[must_use]
    pub fn stale_resources(&self) -> Vec<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .filter(|kind| match kind {
                ResourceKind::Tasks => self.tasks.is_stale(),
                ResourceKind::Skills => self.skills.is_stale(),
                ResourceKind::Outputs => self.outputs.is_stale(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_failure_keeps_last_good_value() {
        let mut res = Resource::default();
        res.record_success(vec![OutputFile::new("a.txt", "/outputs/a.txt")], Utc::now());
        res.record_failure("HTTP error: 500");
        res.record_failure("HTTP error: 502");

        assert_eq!(res.value().unwrap().len(), 1);
        assert_eq!(res.last_error(), Some("HTTP error: 502"));
        assert_eq!(res.consecutive_failures(), 2);
        assert!(res.is_stale());
    }

    #[test]
    fn test_success_clears_error() {
        let mut res: Resource<String> = Resource::default();
        res.record_failure("down");
        assert!(!res.is_loaded());

        res.record_success("- [ ] write tests".to_string(), Utc::now());
        assert!(res.is_loaded());
        assert!(!res.is_stale());
        assert_eq!(res.consecutive_failures(), 0);
    }

    #[test]
    fn test_snapshot_failure_isolated_per_resource() {
        let mut snapshot = StatusSnapshot::new();
        snapshot.tasks.record_success("todo".into(), Utc::now());
        snapshot.record_failure(ResourceKind::Outputs, "boom");

        assert_eq!(snapshot.stale_resources(), vec![ResourceKind::Outputs]);
        assert_eq!(snapshot.tasks.value().map(String::as_str), Some("todo"));
    }

    #[test]
    fn test_skill_info_keeps_extra_fields() {
        let json = r#"{"weather": {"description": "Look up weather", "entry": "weather_tool.py"}}"#;
        let skills: SkillRegistry = serde_json::from_str(json).unwrap();

        let weather = &skills["weather"];
        assert_eq!(weather.description, "Look up weather");
        assert_eq!(weather.extra["entry"], "weather_tool.py");
    }

    #[test]
    fn test_skill_registry_preserves_order() {
        let json = r#"{"zeta": {"description": "z"}, "alpha": {"description": "a"}}"#;
        let skills: SkillRegistry = serde_json::from_str(json).unwrap();
        let names: Vec<_> = skills.keys().cloned().collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[rstest]
    #[case("http://localhost:8000", "/outputs/report.md", "http://localhost:8000/outputs/report.md")]
    #[case("http://host:8000/alice/", "outputs/a.png", "http://host:8000/alice/outputs/a.png")]
    #[case("http://host", "https://cdn.example.com/x", "https://cdn.example.com/x")]
    fn test_output_url_resolution(#[case] base: &str, #[case] url: &str, #[case] expected: &str) {
        let base = Url::parse(base).unwrap();
        let file = OutputFile::new("f", url);
        assert_eq!(file.resolve_url(&base).unwrap().as_str(), expected);
    }

    #[test]
    fn test_output_file_metadata() {
        let json = r#"{"name": "a.txt", "url": "/outputs/a.txt", "size": 12, "mtime": 1700000000.5}"#;
        let file: OutputFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.size, Some(12));
        let modified = file.modified_at().unwrap();
        assert_eq!(modified.timestamp(), 1_700_000_000);
        assert_eq!(modified.timestamp_subsec_millis(), 500);
    }
}
