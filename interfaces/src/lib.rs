pub mod defs;

pub use defs::{BlogPost, ContentError, GeneratedContent, PostImage, PostKind, Subscriber};
