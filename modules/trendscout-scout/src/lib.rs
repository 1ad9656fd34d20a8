pub mod forum;
pub mod language;
pub mod pipeline;
pub mod run;
pub mod scheduling;
mod stopwords;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod topics;
pub mod youtube_bridge;
