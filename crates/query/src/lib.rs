pub mod distance;
pub mod matcher;
pub mod retrieval;
pub mod tokenizer;

pub use distance::{edit_distance, normalized_similarity};
pub use matcher::{match_entities, EntityMatcher, MatchedEntity, DEFAULT_SIMILARITY_THRESHOLD};
pub use retrieval::{
    retrieve, RelationshipEvidence, RetrievalConfig, RetrievalResult, Retriever,
    DEFAULT_SUBGRAPH_DEPTH,
};
pub use tokenizer::tokenize;
