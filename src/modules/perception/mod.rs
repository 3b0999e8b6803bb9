pub mod structs;
pub mod text_serializer;
pub mod news;

pub use structs::{Article, NewsBatch};
pub use news::NewsSentinel;
pub use text_serializer::render_digest;
