pub mod cache;
pub mod indexer;
pub mod local_context;
pub mod ranker;
pub mod skills;

pub use cache::IndexCache;
pub use local_context::{LocalContextConfig, LocalContextResult, LocalContextRetriever, LOCAL_CONTEXT_SOURCE};
pub use ranker::{rank, tokenize, IndexedDocument, RelevanceMatch};
pub use skills::{build_skills_context, SkillsRetriever};
