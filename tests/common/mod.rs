//! Shared test fixtures: a scripted node and a view that records every call.

#![allow(dead_code)]

use async_trait::async_trait;
use sitekeys::app::key_editor::KeyEditorView;
use sitekeys::services::node::{NodeError, NodeInterface};
use sitekeys::types::{GeneratedKeyPair, KeyPair, OwnIdentity, Project};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// A node that answers from a script.
///
/// With a gate set, every request waits until the gate is notified, which
/// lets tests observe the editor while a generation is outstanding.
#[derive(Default)]
pub struct FakeNode {
    responses: Mutex<VecDeque<Result<GeneratedKeyPair, NodeError>>>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
    crash: bool,
}

impl FakeNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeeding(insert_uri: &str, request_uri: &str) -> Self {
        Self::new().with_response(Ok(GeneratedKeyPair {
            insert_uri: insert_uri.to_string(),
            request_uri: request_uri.to_string(),
        }))
    }

    pub fn failing(error: NodeError) -> Self {
        Self::new().with_response(Err(error))
    }

    pub fn with_response(self, response: Result<GeneratedKeyPair, NodeError>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// A node whose request task panics instead of answering.
    pub fn crashing() -> Self {
        Self {
            crash: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NodeInterface for FakeNode {
    async fn generate_key_pair(&self) -> Result<GeneratedKeyPair, NodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.crash {
            panic!("fake node crashed");
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or(Err(NodeError::ConnectionClosed))
    }
}

/// A view that remembers everything it was asked to show.
pub struct RecordingView {
    pub key_pairs: Vec<KeyPair>,
    pub projects: Vec<(Vec<String>, Option<usize>)>,
    pub identities: Vec<(Vec<String>, Option<usize>)>,
    pub errors: Vec<String>,
    pub closed: Option<bool>,
    pub confirm_answer: bool,
    pub confirm_requests: usize,
}

impl RecordingView {
    pub fn new() -> Self {
        Self {
            key_pairs: Vec::new(),
            projects: Vec::new(),
            identities: Vec::new(),
            errors: Vec::new(),
            closed: None,
            confirm_answer: true,
            confirm_requests: 0,
        }
    }

    pub fn declining() -> Self {
        Self {
            confirm_answer: false,
            ..Self::new()
        }
    }

    pub fn last_key_pair(&self) -> Option<&KeyPair> {
        self.key_pairs.last()
    }

    pub fn last_identities(&self) -> Option<&(Vec<String>, Option<usize>)> {
        self.identities.last()
    }
}

impl KeyEditorView for RecordingView {
    fn render_key_pair(&mut self, key_pair: &KeyPair) {
        self.key_pairs.push(key_pair.clone());
    }

    fn render_projects(&mut self, projects: &[Project], selected: Option<usize>) {
        let names = projects.iter().map(|p| p.name.clone()).collect();
        self.projects.push((names, selected));
    }

    fn render_identities(&mut self, identities: &[OwnIdentity], selected: Option<usize>) {
        let nicknames = identities.iter().map(|i| i.nickname.clone()).collect();
        self.identities.push((nicknames, selected));
    }

    fn confirm_regenerate(&mut self) -> bool {
        self.confirm_requests += 1;
        self.confirm_answer
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn close(&mut self, cancelled: bool) {
        self.closed = Some(cancelled);
    }
}

pub fn project(name: &str) -> Project {
    Project {
        name: name.to_string(),
        request_uri: format!("USK@{}-routing,crypto,AQACAAE/{}/1", name, name),
        insert_uri: format!("USK@{}-private,crypto,AQECAAE/{}/1", name, name),
    }
}

pub fn identity(nickname: &str) -> OwnIdentity {
    OwnIdentity {
        nickname: nickname.to_string(),
        request_uri: format!("USK@{}-routing,crypto,AQACAAE/WebOfTrust/0", nickname),
        insert_uri: format!("USK@{}-private,crypto,AQECAAE/WebOfTrust/0", nickname),
    }
}
