pub mod comments;
pub mod enrichment;
pub mod stats;
pub mod traits;

pub use comments::{CommentConfig, CommentTreeFetcher};
pub use enrichment::{CandidateOutcome, EnrichError, EnrichmentConfig, EnrichmentPipeline, SkipReason};
pub use stats::EnrichStats;
pub use traits::{
    BodyResolver, ChannelRecord, IdentityNormalizer, Page, PostSource, RawComment, SearchRequest,
    TextNormalizer, ThreadRecord, Translator, VideoPlatform, VideoRecord,
};
