//! Scripted in-memory directory for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use axum::http::StatusCode;

use super::client::{DirectoryClient, DirectoryResponse};
use crate::domain::RegistrationPayload;
use crate::error::DirectoryError;

type Reply = Result<DirectoryResponse, DirectoryError>;

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Find { owner: String, name: String },
    Get(String),
    Create(RegistrationPayload),
    Update(String, RegistrationPayload),
}

/// Replays queued replies per operation. An exhausted queue answers `503`.
#[derive(Debug, Default)]
pub(crate) struct ScriptedDirectory {
    find: Mutex<VecDeque<Reply>>,
    get: Mutex<VecDeque<Reply>>,
    create: Mutex<VecDeque<Reply>>,
    update: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Call>>,
}

fn push(queue: &Mutex<VecDeque<Reply>>, reply: Reply) {
    if let Ok(mut q) = queue.lock() {
        q.push_back(reply);
    }
}

fn pop(queue: &Mutex<VecDeque<Reply>>) -> Reply {
    queue
        .lock()
        .ok()
        .and_then(|mut q| q.pop_front())
        .unwrap_or_else(|| Ok(DirectoryResponse::new(StatusCode::SERVICE_UNAVAILABLE, "")))
}

impl ScriptedDirectory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_find(&self, status: StatusCode, body: &str) -> &Self {
        push(&self.find, Ok(DirectoryResponse::new(status, body)));
        self
    }

    pub(crate) fn on_find_err(&self, err: DirectoryError) -> &Self {
        push(&self.find, Err(err));
        self
    }

    pub(crate) fn on_get(&self, status: StatusCode, body: &str) -> &Self {
        push(&self.get, Ok(DirectoryResponse::new(status, body)));
        self
    }

    pub(crate) fn on_get_err(&self, err: DirectoryError) -> &Self {
        push(&self.get, Err(err));
        self
    }

    pub(crate) fn on_create(&self, status: StatusCode, body: &str) -> &Self {
        push(&self.create, Ok(DirectoryResponse::new(status, body)));
        self
    }

    pub(crate) fn on_update(&self, status: StatusCode, body: &str) -> &Self {
        push(&self.update, Ok(DirectoryResponse::new(status, body)));
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub(crate) fn find_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Find { .. }))
            .count()
    }

    pub(crate) fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Create(_) | Call::Update(..)))
            .collect()
    }

    fn record(&self, call: Call) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl DirectoryClient for ScriptedDirectory {
    async fn find_room(&self, owner: &str, name: &str) -> Reply {
        self.record(Call::Find {
            owner: owner.to_string(),
            name: name.to_string(),
        });
        pop(&self.find)
    }

    async fn get_room(&self, id: &str) -> Reply {
        self.record(Call::Get(id.to_string()));
        pop(&self.get)
    }

    async fn create_room(&self, payload: &RegistrationPayload) -> Reply {
        self.record(Call::Create(payload.clone()));
        pop(&self.create)
    }

    async fn update_room(&self, id: &str, payload: &RegistrationPayload) -> Reply {
        self.record(Call::Update(id.to_string(), payload.clone()));
        pop(&self.update)
    }
}
