use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use tracing::{debug, warn};

use super::client::GraphApi;
use super::error::ApiError;
use super::types::{GraphSnapshot, NodeDraft, NodePatch, RelationDraft, RelationPatch};

#[derive(Clone, Debug, PartialEq)]
pub enum ApiRequest {
    Fetch,
    CreateNode(NodeDraft),
    UpdateNode { node_id: String, patch: NodePatch },
    MoveNode { node_id: String, patch: NodePatch },
    DeleteNode(String),
    CreateRelation(RelationDraft),
    UpdateRelation { relation_id: String, patch: RelationPatch },
    DeleteRelation(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutation {
    CreateNode,
    UpdateNode,
    MoveNode,
    DeleteNode,
    CreateRelation,
    UpdateRelation,
    DeleteRelation,
}

impl Mutation {
    pub fn describe(self) -> &'static str {
        match self {
            Self::CreateNode => "create node",
            Self::UpdateNode => "update node",
            Self::MoveNode => "save node position",
            Self::DeleteNode => "delete node",
            Self::CreateRelation => "create relation",
            Self::UpdateRelation => "update relation",
            Self::DeleteRelation => "delete relation",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ApiEvent {
    Fetched(Result<GraphSnapshot, String>),
    /// `Ok` carries the server-assigned id for creations.
    Mutated {
        mutation: Mutation,
        result: Result<Option<String>, String>,
    },
}

/// Cloneable sending side used by the view model.
#[derive(Clone)]
pub struct ApiHandle {
    requests: Sender<ApiRequest>,
}

impl ApiHandle {
    /// Handle wired to a plain receiver instead of a worker thread.
    #[cfg(test)]
    pub(crate) fn detached() -> (Self, Receiver<ApiRequest>) {
        let (requests, received) = mpsc::channel();
        (Self { requests }, received)
    }

    pub fn send(&self, request: ApiRequest) {
        if self.requests.send(request).is_err() {
            warn!("graph api worker is gone; request dropped");
        }
    }
}

/// Single background thread executing requests in FIFO order.
pub struct ApiWorker {
    requests: Sender<ApiRequest>,
    events: Receiver<ApiEvent>,
}

impl ApiWorker {
    pub fn spawn<A, F>(api: A, course_id: u64, notify: F) -> Self
    where
        A: GraphApi + 'static,
        F: Fn() + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel::<ApiRequest>();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            for request in request_rx {
                let event = execute(&api, course_id, request);
                if event_tx.send(event).is_err() {
                    break;
                }
                notify();
            }
            debug!("graph api worker stopped");
        });

        Self {
            requests: request_tx,
            events: event_rx,
        }
    }

    pub fn handle(&self) -> ApiHandle {
        ApiHandle {
            requests: self.requests.clone(),
        }
    }

    pub fn try_recv(&self) -> Result<ApiEvent, TryRecvError> {
        self.events.try_recv()
    }
}

fn fetch_snapshot<A: GraphApi>(api: &A, course_id: u64) -> Result<GraphSnapshot, ApiError> {
    thread::scope(|scope| {
        let relations = scope.spawn(|| api.list_relations(course_id));
        let nodes = api.list_nodes(course_id);
        let relations = relations
            .join()
            .unwrap_or_else(|_| Err(ApiError::Transport("relation fetch panicked".to_owned())));

        Ok(GraphSnapshot {
            nodes: nodes?,
            relations: relations?,
        })
    })
}

fn execute<A: GraphApi>(api: &A, course_id: u64, request: ApiRequest) -> ApiEvent {
    let (mutation, result) = match request {
        ApiRequest::Fetch => {
            let result = fetch_snapshot(api, course_id);
            return match result {
                Ok(snapshot) => {
                    debug!(
                        nodes = snapshot.nodes.len(),
                        relations = snapshot.relations.len(),
                        "graph fetched"
                    );
                    ApiEvent::Fetched(Ok(snapshot))
                }
                Err(error) => {
                    warn!(%error, course_id, "graph fetch failed");
                    ApiEvent::Fetched(Err(error.user_message()))
                }
            };
        }
        ApiRequest::CreateNode(draft) => (
            Mutation::CreateNode,
            api.create_node(course_id, &draft).map(|node| node.id),
        ),
        ApiRequest::UpdateNode { node_id, patch } => (
            Mutation::UpdateNode,
            api.update_node(course_id, &node_id, &patch).map(|_| None),
        ),
        ApiRequest::MoveNode { node_id, patch } => (
            Mutation::MoveNode,
            api.update_node(course_id, &node_id, &patch).map(|_| None),
        ),
        ApiRequest::DeleteNode(node_id) => (
            Mutation::DeleteNode,
            api.delete_node(course_id, &node_id).map(|()| None),
        ),
        ApiRequest::CreateRelation(draft) => (
            Mutation::CreateRelation,
            api.create_relation(course_id, &draft)
                .map(|relation| relation.id),
        ),
        ApiRequest::UpdateRelation { relation_id, patch } => (
            Mutation::UpdateRelation,
            api.update_relation(course_id, &relation_id, &patch)
                .map(|_| None),
        ),
        ApiRequest::DeleteRelation(relation_id) => (
            Mutation::DeleteRelation,
            api.delete_relation(course_id, &relation_id).map(|()| None),
        ),
    };

    let result = result.map_err(|error| {
        warn!(
            %error,
            status = ?error.status(),
            action = mutation.describe(),
            "graph mutation failed"
        );
        error.user_message()
    });
    ApiEvent::Mutated { mutation, result }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use super::*;
    use crate::api::types::{Node, Position, Relation, RelationType};

    #[derive(Default)]
    struct FakeApi {
        calls: Arc<Mutex<Vec<String>>>,
        fail_relations: bool,
    }

    impl FakeApi {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl GraphApi for FakeApi {
        fn list_nodes(&self, course_id: u64) -> Result<Vec<Node>, ApiError> {
            self.record(format!("list_nodes {course_id}"));
            Ok(vec![Node {
                id: Some("n1".to_owned()),
                label: "Limits".to_owned(),
                ..Node::default()
            }])
        }

        fn list_relations(&self, course_id: u64) -> Result<Vec<Relation>, ApiError> {
            self.record(format!("list_relations {course_id}"));
            if self.fail_relations {
                return Err(ApiError::Status {
                    status: 500,
                    message: "database offline".to_owned(),
                });
            }
            Ok(Vec::new())
        }

        fn create_node(&self, _course_id: u64, draft: &NodeDraft) -> Result<Node, ApiError> {
            self.record(format!("create_node {}", draft.label));
            Ok(Node {
                id: Some("n9".to_owned()),
                label: draft.label.clone(),
                ..Node::default()
            })
        }

        fn update_node(
            &self,
            _course_id: u64,
            node_id: &str,
            patch: &NodePatch,
        ) -> Result<Node, ApiError> {
            let x = patch
                .meta
                .as_ref()
                .and_then(|meta| meta.get("x"))
                .and_then(|value| value.as_f64())
                .unwrap_or_default();
            self.record(format!("update_node {node_id} x={x}"));
            Ok(Node::default())
        }

        fn delete_node(&self, _course_id: u64, node_id: &str) -> Result<(), ApiError> {
            self.record(format!("delete_node {node_id}"));
            Err(ApiError::Status {
                status: 404,
                message: "Node not found".to_owned(),
            })
        }

        fn create_relation(
            &self,
            _course_id: u64,
            draft: &RelationDraft,
        ) -> Result<Relation, ApiError> {
            self.record(format!("create_relation {}->{}", draft.from, draft.to));
            Ok(Relation {
                id: Some("r1".to_owned()),
                from: draft.from.clone(),
                to: draft.to.clone(),
                kind: draft.kind.clone(),
                directed: Some(draft.directed),
                weight: Some(draft.weight),
                meta: None,
            })
        }

        fn update_relation(
            &self,
            _course_id: u64,
            relation_id: &str,
            _patch: &RelationPatch,
        ) -> Result<Relation, ApiError> {
            self.record(format!("update_relation {relation_id}"));
            Err(ApiError::Transport("connection reset".to_owned()))
        }

        fn delete_relation(&self, _course_id: u64, relation_id: &str) -> Result<(), ApiError> {
            self.record(format!("delete_relation {relation_id}"));
            Ok(())
        }
    }

    fn next_event(worker: &ApiWorker) -> ApiEvent {
        worker
            .events
            .recv_timeout(Duration::from_secs(5))
            .expect("worker event")
    }

    fn move_request(node_id: &str, x: f64) -> ApiRequest {
        let node = Node {
            id: Some(node_id.to_owned()),
            label: node_id.to_owned(),
            ..Node::default()
        };
        ApiRequest::MoveNode {
            node_id: node_id.to_owned(),
            patch: NodePatch {
                meta: Some(node.meta_with_position(Position { x, y: 0.0 })),
                ..NodePatch::default()
            },
        }
    }

    #[test]
    fn repeated_position_saves_run_in_submission_order() {
        let api = FakeApi::default();
        let calls = Arc::clone(&api.calls);
        let worker = ApiWorker::spawn(api, 3, || {});
        let handle = worker.handle();

        for x in [10.0, 20.0, 30.0] {
            handle.send(move_request("n1", x));
        }
        for _ in 0..3 {
            assert_eq!(
                next_event(&worker),
                ApiEvent::Mutated {
                    mutation: Mutation::MoveNode,
                    result: Ok(None),
                }
            );
        }

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                "update_node n1 x=10".to_owned(),
                "update_node n1 x=20".to_owned(),
                "update_node n1 x=30".to_owned(),
            ]
        );
    }

    #[test]
    fn fetch_failure_reports_the_server_message() {
        let api = FakeApi {
            fail_relations: true,
            ..FakeApi::default()
        };
        let worker = ApiWorker::spawn(api, 3, || {});
        worker.handle().send(ApiRequest::Fetch);

        assert_eq!(
            next_event(&worker),
            ApiEvent::Fetched(Err("database offline".to_owned()))
        );
    }

    #[test]
    fn fetch_success_returns_both_collections() {
        let worker = ApiWorker::spawn(FakeApi::default(), 5, || {});
        worker.handle().send(ApiRequest::Fetch);

        let ApiEvent::Fetched(Ok(snapshot)) = next_event(&worker) else {
            panic!("expected a snapshot");
        };
        assert_eq!(snapshot.nodes.len(), 1);
        assert!(snapshot.relations.is_empty());
    }

    #[test]
    fn creations_report_the_assigned_id() {
        let worker = ApiWorker::spawn(FakeApi::default(), 1, || {});
        let handle = worker.handle();
        handle.send(ApiRequest::CreateNode(NodeDraft::at(
            "New node",
            Position { x: 1.0, y: 2.0 },
        )));
        handle.send(ApiRequest::CreateRelation(RelationDraft {
            from: "n1".to_owned(),
            to: "n2".to_owned(),
            kind: RelationType::Prerequisite,
            directed: true,
            weight: 0.5,
        }));

        assert_eq!(
            next_event(&worker),
            ApiEvent::Mutated {
                mutation: Mutation::CreateNode,
                result: Ok(Some("n9".to_owned())),
            }
        );
        assert_eq!(
            next_event(&worker),
            ApiEvent::Mutated {
                mutation: Mutation::CreateRelation,
                result: Ok(Some("r1".to_owned())),
            }
        );
    }

    #[test]
    fn mutation_failures_carry_user_messages() {
        let worker = ApiWorker::spawn(FakeApi::default(), 1, || {});
        let handle = worker.handle();
        handle.send(ApiRequest::DeleteNode("n4".to_owned()));
        handle.send(ApiRequest::UpdateRelation {
            relation_id: "r2".to_owned(),
            patch: RelationPatch::default(),
        });

        assert_eq!(
            next_event(&worker),
            ApiEvent::Mutated {
                mutation: Mutation::DeleteNode,
                result: Err("Node not found".to_owned()),
            }
        );
        assert_eq!(
            next_event(&worker),
            ApiEvent::Mutated {
                mutation: Mutation::UpdateRelation,
                result: Err("request failed: connection reset".to_owned()),
            }
        );
    }

    #[test]
    fn every_processed_request_wakes_the_ui() {
        let wakeups = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakeups);
        let worker = ApiWorker::spawn(FakeApi::default(), 1, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let handle = worker.handle();
        handle.send(ApiRequest::DeleteRelation("r1".to_owned()));
        handle.send(ApiRequest::Fetch);

        next_event(&worker);
        next_event(&worker);
        let deadline = Instant::now() + Duration::from_secs(5);
        while wakeups.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
            thread::yield_now();
        }
        assert_eq!(wakeups.load(Ordering::SeqCst), 2);
    }
}
