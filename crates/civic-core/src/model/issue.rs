use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

/// Opaque issue identifier, stable across reloads.
///
/// The API may send ids as JSON numbers or strings; both normalize to text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct IssueId(String);

impl IssueId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for IssueId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Self(n.to_string()),
            RawId::Text(s) => Self::new(s),
        })
    }
}

impl From<&str> for IssueId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for IssueId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// The three lifecycle states an issue moves through.
///
/// Transitions are free-form: any status may move to any other. The remote
/// store owns enforcement, if it has any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    #[serde(alias = "OPEN")]
    Pending,
    InProgress,
    Resolved,
}

impl IssueStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::InProgress, Self::Resolved];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Resolved => "RESOLVED",
        }
    }

    /// Title-case label for human output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
        }
    }
}

/// Fixed set of issue categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Infrastructure,
    Transportation,
    Environment,
    Safety,
    Other,
}

impl Category {
    pub const ALL: [Self; 5] = [
        Self::Infrastructure,
        Self::Transportation,
        Self::Environment,
        Self::Safety,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Infrastructure => "Infrastructure",
            Self::Transportation => "Transportation",
            Self::Environment => "Environment",
            Self::Safety => "Safety",
            Self::Other => "Other",
        }
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

impl FromStr for IssueStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "pending" | "open" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "infrastructure" => Ok(Self::Infrastructure),
            "transportation" => Ok(Self::Transportation),
            "environment" => Ok(Self::Environment),
            "safety" => Ok(Self::Safety),
            "other" => Ok(Self::Other),
            _ => Err(ParseEnumError {
                expected: "category",
                got: s.to_string(),
            }),
        }
    }
}

/// The user who reported an issue. Display-only.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawReporter")]
pub struct Reporter {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawReporter {
    Name(String),
    #[serde(rename_all = "camelCase")]
    Profile {
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        first_name: Option<String>,
        #[serde(default)]
        last_name: Option<String>,
    },
}

impl From<RawReporter> for Reporter {
    fn from(raw: RawReporter) -> Self {
        match raw {
            RawReporter::Name(username) => Self {
                username: Some(username),
                ..Self::default()
            },
            RawReporter::Profile {
                username,
                first_name,
                last_name,
            } => Self {
                username,
                first_name,
                last_name,
            },
        }
    }
}

impl Reporter {
    /// Full name when known, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("Unknown")
            .to_string()
    }
}

/// A reported issue, as cached from the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: IssueId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub category: Category,
    pub status: IssueStatus,
    #[serde(default)]
    pub created_by: Option<Reporter>,
    #[serde(default, with = "crate::model::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub critical: bool,
    #[serde(default)]
    pub upvotes: u32,
}

impl Issue {
    /// Reporter display name, `"Unknown"` when the API omitted it.
    #[must_use]
    pub fn reporter_name(&self) -> String {
        self.created_by
            .as_ref()
            .map_or_else(|| "Unknown".to_string(), Reporter::display_name)
    }

    /// Creation date in the local timezone, `"N/A"` when absent.
    #[must_use]
    pub fn created_on(&self) -> String {
        self.created_at.map_or_else(
            || "N/A".to_string(),
            |ts| ts.with_timezone(&Local).format("%Y-%m-%d").to_string(),
        )
    }
}
