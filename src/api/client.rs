use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::ApiError;
use super::types::{Node, NodeDraft, NodePatch, Relation, RelationDraft, RelationPatch};

/// Course knowledge-graph endpoints consumed by the editor.
pub trait GraphApi: Send + Sync {
    fn list_nodes(&self, course_id: u64) -> Result<Vec<Node>, ApiError>;
    fn list_relations(&self, course_id: u64) -> Result<Vec<Relation>, ApiError>;
    fn create_node(&self, course_id: u64, draft: &NodeDraft) -> Result<Node, ApiError>;
    fn update_node(
        &self,
        course_id: u64,
        node_id: &str,
        patch: &NodePatch,
    ) -> Result<Node, ApiError>;
    fn delete_node(&self, course_id: u64, node_id: &str) -> Result<(), ApiError>;
    fn create_relation(
        &self,
        course_id: u64,
        draft: &RelationDraft,
    ) -> Result<Relation, ApiError>;
    fn update_relation(
        &self,
        course_id: u64,
        relation_id: &str,
        patch: &RelationPatch,
    ) -> Result<Relation, ApiError>;
    fn delete_relation(&self, course_id: u64, relation_id: &str) -> Result<(), ApiError>;
}

pub struct HttpGraphApi {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpGraphApi {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_owned(),
            token,
        }
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let url = format!("{}{path}", self.base_url);
        debug!(%method, %url, "graph api request");
        let request = self.agent.request(method, &url);
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request("GET", path).call()?;
        Ok(response.into_json()?)
    }

    fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.request(method, path).send_json(body)?;
        Ok(response.into_json()?)
    }

    fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.request("DELETE", path).call()?;
        Ok(())
    }
}

fn nodes_path(course_id: u64) -> String {
    format!("/courses/{course_id}/nodes")
}

fn relations_path(course_id: u64) -> String {
    format!("/courses/{course_id}/relations")
}

impl GraphApi for HttpGraphApi {
    fn list_nodes(&self, course_id: u64) -> Result<Vec<Node>, ApiError> {
        self.get(&nodes_path(course_id))
    }

    fn list_relations(&self, course_id: u64) -> Result<Vec<Relation>, ApiError> {
        self.get(&relations_path(course_id))
    }

    fn create_node(&self, course_id: u64, draft: &NodeDraft) -> Result<Node, ApiError> {
        self.send("POST", &nodes_path(course_id), draft)
    }

    fn update_node(
        &self,
        course_id: u64,
        node_id: &str,
        patch: &NodePatch,
    ) -> Result<Node, ApiError> {
        let path = format!("{}/{node_id}", nodes_path(course_id));
        self.send("PUT", &path, patch)
    }

    fn delete_node(&self, course_id: u64, node_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("{}/{node_id}", nodes_path(course_id)))
    }

    fn create_relation(
        &self,
        course_id: u64,
        draft: &RelationDraft,
    ) -> Result<Relation, ApiError> {
        self.send("POST", &relations_path(course_id), draft)
    }

    fn update_relation(
        &self,
        course_id: u64,
        relation_id: &str,
        patch: &RelationPatch,
    ) -> Result<Relation, ApiError> {
        let path = format!("{}/{relation_id}", relations_path(course_id));
        self.send("PUT", &path, patch)
    }

    fn delete_relation(&self, course_id: u64, relation_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("{}/{relation_id}", relations_path(course_id)))
    }
}
