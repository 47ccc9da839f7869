mod client;
mod error;
mod types;
mod worker;

pub use client::{GraphApi, HttpGraphApi};
pub use error::ApiError;
pub use types::{
    GraphSnapshot, Node, NodeDraft, NodePatch, Position, Relation, RelationDraft, RelationPatch,
    RelationType, DEFAULT_RELATION_WEIGHT,
};
pub use worker::{ApiEvent, ApiHandle, ApiRequest, ApiWorker, Mutation};
