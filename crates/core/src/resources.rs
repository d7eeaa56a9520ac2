use crate::models::{EmergencyCategory, ExerciseKind};

const EMERGENCY_RESOURCES: &[(EmergencyCategory, &[&str])] = &[
    (
        EmergencyCategory::ImmediateDanger,
        &[
            "If you're in immediate danger, please call emergency services (911 in the US)",
            "National Emergency Number: 112 (India)",
        ],
    ),
    (
        EmergencyCategory::CrisisHelplines,
        &[
            "National Crisis Helpline (24/7): 1-800-273-8255",
            "Crisis Text Line: Text HOME to 741741",
            "Women's Helpline (India): 1091",
        ],
    ),
    (
        EmergencyCategory::DomesticViolence,
        &[
            "National Domestic Violence Hotline: 1-800-799-SAFE (7233)",
            "Women in Distress Helpline (India): 181",
        ],
    ),
    (
        EmergencyCategory::LegalAid,
        &[
            "National Legal Services Authority (NALSA): 1516",
            "Legal Aid Society: Find local resources at www.legal-aid.org",
        ],
    ),
];

const SELF_CARE_EXERCISES: &[(ExerciseKind, &[&str])] = &[
    (
        ExerciseKind::Breathing,
        &[
            "4-7-8 Breathing: Inhale for 4 counts, hold for 7, exhale for 8",
            "Box Breathing: Inhale 4, hold 4, exhale 4, hold 4",
            "Deep Belly Breathing: Place hand on belly, breathe deeply for 5 counts",
        ],
    ),
    (
        ExerciseKind::Grounding,
        &[
            "5-4-3-2-1 Technique: Name 5 things you see, 4 you feel, 3 you hear, 2 you smell, 1 you taste",
            "Body Scan: Focus attention slowly from toes to head",
            "Object Focus: Hold an object and notice its texture, temperature, and weight",
        ],
    ),
    (
        ExerciseKind::Affirmations,
        &[
            "I am strong and resilient",
            "I deserve peace and safety",
            "My feelings are valid",
            "I am worthy of love and respect",
            "I trust in my ability to heal",
        ],
    ),
];

/// Static emergency contacts and self-care exercises, kept as plain strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResourceProvider;

impl ResourceProvider {
    pub fn new() -> Self {
        Self
    }

    /// Resources for `category`, or every category flattened in table order.
    pub fn emergency_resources(&self, category: Option<EmergencyCategory>) -> Vec<String> {
        filter_or_flatten(EMERGENCY_RESOURCES, category)
    }

    /// Exercises of `kind`, or every kind flattened in table order.
    pub fn self_care_exercises(&self, kind: Option<ExerciseKind>) -> Vec<String> {
        filter_or_flatten(SELF_CARE_EXERCISES, kind)
    }
}

fn filter_or_flatten<K: PartialEq + Copy>(table: &[(K, &[&str])], key: Option<K>) -> Vec<String> {
    table
        .iter()
        .filter(|(entry_key, _)| key.map_or(true, |key| key == *entry_key))
        .flat_map(|(_, items)| items.iter().map(|item| item.to_string()))
        .collect()
}
