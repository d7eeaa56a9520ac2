pub mod crisis;
pub mod models;
pub mod resources;
pub mod responder;
pub mod starter;

pub use crisis::CrisisDetector;
pub use models::*;
pub use resources::ResourceProvider;
pub use responder::{detect_category, ClassifiedReply, KeywordResponder, ReplySource};
pub use starter::{FixedPicker, StarterPicker, ThreadRngPicker};
