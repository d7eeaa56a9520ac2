use std::fmt;

use serde::{Deserialize, Serialize};

/// Crisis category detected by the keyword responder, in matching order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Suicide,
    Abuse,
    SelfHarm,
    Harassment,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Suicide,
        Category::Abuse,
        Category::SelfHarm,
        Category::Harassment,
    ];

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Suicide => "suicide",
            Self::Abuse => "abuse",
            Self::SelfHarm => "self_harm",
            Self::Harassment => "harassment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Key of a conversation-starter pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionTag {
    Distressed,
    Anxious,
    Lonely,
}

impl EmotionTag {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "distressed" => Some(Self::Distressed),
            "anxious" => Some(Self::Anxious),
            "lonely" => Some(Self::Lonely),
            _ => None,
        }
    }

    /// Unknown tags fall back to the distressed pool.
    pub fn from_str_or_default(value: &str) -> Self {
        Self::parse(value).unwrap_or(Self::Distressed)
    }
}

/// Structured support service attached to keyword-responder replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub contact: String,
    pub description: String,
    pub available: String,
}

impl Resource {
    pub(crate) fn new(name: &str, contact: &str, description: &str, available: &str) -> Self {
        Self {
            name: name.to_string(),
            contact: contact.to_string(),
            description: description.to_string(),
            available: available.to_string(),
        }
    }
}

/// Reply surfaced to chat callers. Optional fields are omitted when empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<Resource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatReply {
    pub fn new(response: impl Into<String>, priority: Priority) -> Self {
        Self {
            response: response.into(),
            priority,
            resources: None,
            error: None,
        }
    }

    pub fn with_resources(mut self, resources: Vec<Resource>) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Outcome of the regex-based crisis scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisAssessment {
    pub is_crisis: bool,
    /// Highest severity among matched patterns, 0 when nothing matched.
    pub severity: u8,
    pub matched_patterns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyCategory {
    ImmediateDanger,
    CrisisHelplines,
    DomesticViolence,
    LegalAid,
}

impl EmergencyCategory {
    /// Exact key lookup; anything else is not a category.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "immediate_danger" => Some(Self::ImmediateDanger),
            "crisis_helplines" => Some(Self::CrisisHelplines),
            "domestic_violence" => Some(Self::DomesticViolence),
            "legal_aid" => Some(Self::LegalAid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Breathing,
    Grounding,
    Affirmations,
}

impl ExerciseKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "breathing" => Some(Self::Breathing),
            "grounding" => Some(Self::Grounding),
            "affirmations" => Some(Self::Affirmations),
            _ => None,
        }
    }
}
