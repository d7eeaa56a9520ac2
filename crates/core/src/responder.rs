use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::models::{Category, ChatReply, EmotionTag, Priority, Resource};
use crate::starter::{StarterPicker, ThreadRngPicker};

static CATEGORY_RESOURCES: Lazy<HashMap<Category, Vec<Resource>>> = Lazy::new(|| {
    let lifeline = vec![
        Resource::new(
            "National Suicide Prevention Lifeline",
            "988",
            "24/7 support from caring professionals who understand what you're going through",
            "Available anytime, day or night",
        ),
        Resource::new(
            "Crisis Text Line",
            "Text HOME to 741741",
            "Text with a trained crisis counselor in a way that might feel more comfortable",
            "24/7 text support",
        ),
    ];

    let mut table = HashMap::new();
    table.insert(Category::Suicide, lifeline.clone());
    table.insert(Category::SelfHarm, lifeline);
    table.insert(
        Category::Abuse,
        vec![
            Resource::new(
                "RAINN National Sexual Assault Hotline",
                "800.656.HOPE (4673)",
                "Confidential support from trained staff who understand trauma and healing",
                "24/7 confidential support",
            ),
            Resource::new(
                "RAINN Online Chat",
                "https://hotline.rainn.org/online",
                "Chat online with trained support specialists in a safe, confidential environment",
                "Available 24/7",
            ),
        ],
    );
    table.insert(
        Category::Harassment,
        vec![Resource::new(
            "National Center for Victims of Crime",
            "1-855-4-VICTIM",
            "Support and advocacy for those experiencing harassment or stalking",
            "Weekdays 8:30am-8:30pm EST",
        )],
    );
    table
});

fn category_keywords(category: Category) -> &'static [&'static str] {
    match category {
        Category::Suicide => &[
            "kill myself",
            "want to die",
            "end it all",
            "suicide",
            "better off dead",
            "no point living",
            "cant go on",
            "don't want to be here",
            "give up on life",
        ],
        Category::Abuse => &[
            "touched",
            "molested",
            "raped",
            "assaulted",
            "abused",
            "hit me",
            "beats me",
            "forced me",
            "inappropriate touch",
            "wrong places",
            "violated",
        ],
        Category::SelfHarm => &[
            "cut myself",
            "hurt myself",
            "self harm",
            "cutting",
            "burn myself",
            "punish myself",
            "cause pain",
            "self injury",
            "self mutilation",
        ],
        Category::Harassment => &[
            "stalking",
            "following me",
            "harassed",
            "bullied",
            "threatened",
            "intimidated",
            "afraid of them",
            "wont leave me alone",
            "keeps messaging",
        ],
    }
}

fn starter_pool(tag: EmotionTag) -> &'static [&'static str] {
    match tag {
        EmotionTag::Distressed => &[
            "Would you like to tell me more about what's been happening?",
            "I'm here to listen without any judgment. What's on your mind?",
            "Sometimes talking about it can help. What feels heaviest right now?",
            "Take your time - there's no rush. What would feel most helpful to share?",
        ],
        EmotionTag::Anxious => &[
            "What's making you feel most anxious right now?",
            "Would you like to explore what's causing these feelings?",
            "Sometimes anxiety can feel overwhelming. What's going through your mind?",
            "We can take this one small step at a time. What feels most pressing?",
        ],
        EmotionTag::Lonely => &[
            "It sounds like you're feeling really isolated. What's been making you feel this way?",
            "Those feelings of loneliness are so hard. Would you like to talk about it?",
            "I hear how difficult this is. What's been making you feel disconnected?",
        ],
    }
}

/// Canned paragraph with an optional starter spliced between `lead` and `tail`.
struct Template {
    lead: &'static str,
    starter: Option<EmotionTag>,
    tail: &'static str,
}

impl Template {
    fn render(&self, starter: Option<&str>) -> String {
        let mut parts = vec![self.lead];
        if let Some(starter) = starter {
            parts.push(starter);
        }
        if !self.tail.is_empty() {
            parts.push(self.tail);
        }
        parts.join(" ")
    }
}

fn crisis_template(category: Category) -> Template {
    match category {
        Category::Suicide => Template {
            lead: "I hear the deep pain in your words, and I want you to know that your life has immense value, even if it doesn't feel that way right now. \
                   These feelings are incredibly heavy to carry, and it makes sense that you're feeling overwhelmed.",
            starter: Some(EmotionTag::Distressed),
            tail: "There are compassionate professionals who truly understand these feelings and want to help you through this moment - \
                   they've helped many others who've felt exactly what you're feeling. Would you be open to talking with them? \
                   You don't have to carry this weight alone.",
        },
        Category::Abuse => Template {
            lead: "I am so deeply sorry that this happened to you. What you experienced is a violation, and it is not your fault - not in any way. \
                   Your feelings, whatever they may be, are completely valid. You've shown incredible courage in sharing this.",
            starter: Some(EmotionTag::Distressed),
            tail: "There are caring professionals who specialize in supporting survivors like you - they can offer the kind of support and guidance \
                   that could be really helpful when you're ready. Everything would be completely confidential, and you'd be in control every step of the way. \
                   Would you like to know more about these resources?",
        },
        Category::SelfHarm => Template {
            lead: "Thank you for trusting me with something this painful. Hurting yourself is often a way of coping with feelings that seem unbearable, \
                   and there is no shame in that. You deserve care and gentleness, especially from yourself.",
            starter: Some(EmotionTag::Distressed),
            tail: "There are people trained to help with exactly this, without judgment, any time of day or night. \
                   Would you be willing to reach out to one of them? If you're hurt right now, please get medical help.",
        },
        Category::Harassment => Template {
            lead: "I'm so sorry you're experiencing this harassment - it's completely unfair and not at all okay. Your feelings of distress are absolutely valid. \
                   No one deserves to feel unsafe or threatened.",
            starter: Some(EmotionTag::Anxious),
            tail: "There are organizations that specialize in helping people in similar situations - they can help protect your rights \
                   and work with you to create a safety plan. Would you like to know more about the support available?",
        },
    }
}

/// Non-crisis keyword bucket, checked after category detection.
struct EmotionBucket {
    name: &'static str,
    keywords: &'static [&'static str],
    priority: Priority,
    template: Template,
}

const EMOTION_BUCKETS: &[EmotionBucket] = &[
    EmotionBucket {
        name: "loneliness",
        keywords: &["alone", "lonely", "no friends", "no one understands", "left out"],
        priority: Priority::Medium,
        template: Template {
            lead: "That feeling of being alone can be really painful. It's completely natural to want connection and understanding - we all do. \
                   College life especially can feel isolating sometimes, even when surrounded by people.",
            starter: Some(EmotionTag::Lonely),
            tail: "Remember that feeling this way doesn't mean there's anything wrong with you. Sometimes it takes time to find our people, \
                   and that's okay. Would you like to explore some ways to start building those connections?",
        },
    },
    EmotionBucket {
        name: "sadness",
        keywords: &["sad", "hurt", "pain", "crying", "depressed", "heartbroken"],
        priority: Priority::Medium,
        template: Template {
            lead: "I can hear how much pain you're in, and it makes complete sense that you're feeling this way. These emotions are so intense, \
                   and sometimes they can feel like they're taking over.",
            starter: Some(EmotionTag::Distressed),
            tail: "You don't have to push these feelings away or try to be strong all the time. It's okay to not be okay, \
                   and it's okay to take the time you need to process these emotions.",
        },
    },
    EmotionBucket {
        name: "fear",
        keywords: &["scared", "afraid", "anxious", "nervous", "worry", "panic"],
        priority: Priority::Medium,
        template: Template {
            lead: "Those anxious feelings can be really overwhelming, and I hear how much they're affecting you. Your body and mind are responding \
                   to something that feels threatening, and that's completely valid.",
            starter: Some(EmotionTag::Anxious),
            tail: "If you'd like, we could try a gentle grounding exercise together - something simple like focusing on your breath or noticing \
                   things around you. What feels most helpful when anxiety is strong?",
        },
    },
    EmotionBucket {
        name: "positivity",
        keywords: &["happy", "better", "good", "hope", "grateful", "proud"],
        priority: Priority::Low,
        template: Template {
            lead: "I'm really moved hearing this spark of hope in your words. These moments of light are so precious, and you're absolutely right \
                   to acknowledge them. What you're feeling is real and valuable. Would you like to explore what's bringing you these positive \
                   feelings? Sometimes talking about our moments of strength can help us build on them.",
            starter: None,
            tail: "",
        },
    },
];

const FALLBACK_TEMPLATE: Template = Template {
    lead: "Thank you for sharing with me. I want you to know that whatever you're experiencing matters, and your feelings are valid.",
    starter: Some(EmotionTag::Distressed),
    tail: "Sometimes just having someone to listen without judgment can help us process our thoughts and feelings better.",
};

/// Returns the first category (in definition order) whose keywords appear
/// in `text`, together with that category's resources.
pub fn detect_category(text: &str) -> Option<(Category, &'static [Resource])> {
    let lower = text.to_lowercase();

    Category::ALL
        .into_iter()
        .find(|category| contains_any(&lower, category_keywords(*category)))
        .map(|category| {
            let resources = CATEGORY_RESOURCES
                .get(&category)
                .map(Vec::as_slice)
                .unwrap_or_default();
            (category, resources)
        })
}

/// Which rule produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Crisis(Category),
    Emotion(&'static str),
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedReply {
    pub reply: ChatReply,
    pub source: ReplySource,
}

/// Substring-driven responder. Stateless apart from its starter picker, so a
/// single instance can serve concurrent callers.
#[derive(Clone)]
pub struct KeywordResponder {
    picker: Arc<dyn StarterPicker>,
}

impl Default for KeywordResponder {
    fn default() -> Self {
        Self::new(Arc::new(ThreadRngPicker))
    }
}

impl KeywordResponder {
    pub fn new(picker: Arc<dyn StarterPicker>) -> Self {
        Self { picker }
    }

    pub fn select_starter(&self, emotion: &str) -> &'static str {
        self.starter_for(EmotionTag::from_str_or_default(emotion))
    }

    fn starter_for(&self, tag: EmotionTag) -> &'static str {
        let pool = starter_pool(tag);
        pool[self.picker.pick(pool.len()) % pool.len()]
    }

    fn render(&self, template: &Template) -> String {
        let starter = template.starter.map(|tag| self.starter_for(tag));
        template.render(starter)
    }

    /// Builds the reply for `message`. The emotion and confidence hints are
    /// accepted from callers but do not influence matching.
    pub fn generate_response(&self, message: &str, emotion: &str, confidence: f32) -> ChatReply {
        self.classify_and_respond(message, emotion, confidence).reply
    }

    pub fn classify_and_respond(
        &self,
        message: &str,
        emotion: &str,
        confidence: f32,
    ) -> ClassifiedReply {
        debug!(emotion, confidence, "generating keyword response");

        if let Some((category, resources)) = detect_category(message) {
            debug!(category = %category, "crisis keyword matched");
            return ClassifiedReply {
                reply: ChatReply::new(self.render(&crisis_template(category)), Priority::High)
                    .with_resources(resources.to_vec()),
                source: ReplySource::Crisis(category),
            };
        }

        let lower = message.to_lowercase();
        if let Some(bucket) = EMOTION_BUCKETS
            .iter()
            .find(|bucket| contains_any(&lower, bucket.keywords))
        {
            debug!(bucket = bucket.name, "emotion keyword matched");
            return ClassifiedReply {
                reply: ChatReply::new(self.render(&bucket.template), bucket.priority),
                source: ReplySource::Emotion(bucket.name),
            };
        }

        ClassifiedReply {
            reply: ChatReply::new(self.render(&FALLBACK_TEMPLATE), Priority::Low),
            source: ReplySource::Fallback,
        }
    }
}

fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}
