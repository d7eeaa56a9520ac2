use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::models::CrisisAssessment;

/// Pattern source and severity (1-5, 5 being most severe).
const PATTERN_TABLE: &[(&str, u8)] = &[
    (r"\b(kill|hurt|harm)\s*(my)?self\b", 5),
    (r"\b(suicide|suicidal|end it all)\b", 5),
    (r"\b(want to|wanna)\s*(die|disappear)\b", 5),
    (r"\b(feel|feeling)\s*(unsafe|threatened|scared)\b", 4),
    (r"\b(being|am|getting)\s*(stalked|followed|watched)\b", 4),
    (r"\b(domestic|physical|sexual)\s*(violence|abuse|assault)\b", 4),
    (r"\b(hopeless|worthless|helpless)\b", 3),
    (r"\b(cant|cannot|can't)\s*(take|handle|cope)\s*(it|this)\b", 3),
    (r"\b(nobody|no\s*one)\s*(cares|loves|helps)\b", 3),
];

struct CrisisPattern {
    source: &'static str,
    regex: Regex,
    severity: u8,
}

// The table is fixed at compile time; a bad entry is a programming error.
static CRISIS_PATTERNS: Lazy<Vec<CrisisPattern>> = Lazy::new(|| {
    PATTERN_TABLE
        .iter()
        .map(|&(source, severity)| CrisisPattern {
            source,
            regex: Regex::new(source).expect("valid crisis pattern"),
            severity,
        })
        .collect()
});

#[derive(Debug, Default, Clone, Copy)]
pub struct CrisisDetector;

impl CrisisDetector {
    pub fn new() -> Self {
        Self
    }

    /// Scans every pattern; severity is the maximum over all matches.
    pub fn detect_crisis(&self, text: &str) -> CrisisAssessment {
        let lower = text.to_lowercase();
        let mut severity = 0_u8;
        let mut matched_patterns = Vec::new();

        for pattern in CRISIS_PATTERNS.iter() {
            if pattern.regex.is_match(&lower) {
                severity = severity.max(pattern.severity);
                matched_patterns.push(pattern.source.to_string());
            }
        }

        if !matched_patterns.is_empty() {
            debug!(severity, matches = matched_patterns.len(), "crisis patterns matched");
        }

        CrisisAssessment {
            is_crisis: !matched_patterns.is_empty(),
            severity,
            matched_patterns,
        }
    }
}
