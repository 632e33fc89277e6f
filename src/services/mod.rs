pub mod duration;
pub mod gemini;
pub mod ingestion;
pub mod reconciler;
pub mod recommendations;
pub mod stream_parser;
pub mod sync;
pub mod youtube;
