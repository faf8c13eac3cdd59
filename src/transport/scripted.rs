//! In-memory transport for session tests.
//!
//! Poll GETs block until a scripted response is queued, the way a hub holds
//! a long-poll open until it has data. Negotiates are answered with fresh
//! ids, handshakes are acknowledged on the next poll, and invocations can be
//! auto-answered through a responder.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{Message, RECORD_SEPARATOR, decode, encode};

use super::HttpTransport;

// ============================================================================
// Types
// ============================================================================

/// Produces an optional reply frame for an invocation the client posted.
type Responder = Box<dyn Fn(&Message) -> Option<Message> + Send + Sync>;

/// A POST the client issued to the session endpoint.
#[derive(Debug, Clone)]
pub(crate) struct RecordedPost {
    pub url: Url,
    pub body: String,
}

#[derive(Default)]
struct Script {
    negotiations: VecDeque<Result<String>>,
    negotiate_count: u32,
    handshake_replies: VecDeque<String>,
    polls: VecDeque<Result<String>>,
    poll_count: u32,
    posts: Vec<RecordedPost>,
    post_failures: VecDeque<Error>,
    deletes: Vec<(Url, Option<Duration>)>,
    responder: Option<Responder>,
}

// ============================================================================
// ScriptedTransport
// ============================================================================

pub(crate) struct ScriptedTransport {
    script: Mutex<Script>,
    poll_ready: Notify,
    supports_delete: bool,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(Script::default()),
            poll_ready: Notify::new(),
            supports_delete: true,
        })
    }

    /// A transport that cannot issue DELETE.
    pub fn without_delete() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(Script::default()),
            poll_ready: Notify::new(),
            supports_delete: false,
        })
    }

    /// Queues a raw poll body.
    pub fn push_poll(&self, body: impl Into<String>) {
        self.script.lock().polls.push_back(Ok(body.into()));
        self.poll_ready.notify_one();
    }

    /// Queues a poll body made of the given frames.
    pub fn push_frames(&self, frames: &[Message]) {
        let body = frames
            .iter()
            .map(|frame| encode(frame).expect("encode frame"))
            .collect::<String>();
        self.push_poll(body);
    }

    /// Queues a poll failure.
    pub fn push_poll_error(&self, error: Error) {
        self.script.lock().polls.push_back(Err(error));
        self.poll_ready.notify_one();
    }

    /// Overrides the next negotiate outcome.
    pub fn push_negotiate(&self, outcome: Result<String>) {
        self.script.lock().negotiations.push_back(outcome);
    }

    /// Overrides the acknowledgement for the next handshake.
    pub fn push_handshake_reply(&self, body: impl Into<String>) {
        self.script.lock().handshake_replies.push_back(body.into());
    }

    /// Fails the next invocation/send POST.
    pub fn fail_next_post(&self, error: Error) {
        self.script.lock().post_failures.push_back(error);
    }

    /// Auto-answers posted invocations.
    pub fn respond_with<F>(&self, responder: F)
    where
        F: Fn(&Message) -> Option<Message> + Send + Sync + 'static,
    {
        self.script.lock().responder = Some(Box::new(responder));
    }

    pub fn negotiate_count(&self) -> u32 {
        self.script.lock().negotiate_count
    }

    pub fn poll_count(&self) -> u32 {
        self.script.lock().poll_count
    }

    pub fn posts(&self) -> Vec<RecordedPost> {
        self.script.lock().posts.clone()
    }

    /// Frames the client posted, excluding handshakes.
    pub fn sent_frames(&self) -> Vec<Message> {
        self.posts()
            .iter()
            .filter(|post| !is_handshake(&post.body))
            .flat_map(|post| decode(&post.body))
            .collect()
    }

    pub fn deletes(&self) -> Vec<Url> {
        self.script.lock().deletes.iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn delete_timeouts(&self) -> Vec<Option<Duration>> {
        self.script.lock().deletes.iter().map(|(_, timeout)| *timeout).collect()
    }

    fn negotiate(&self) -> Result<String> {
        let mut script = self.script.lock();
        script.negotiate_count += 1;
        let n = script.negotiate_count;

        script.negotiations.pop_front().unwrap_or_else(|| {
            Ok(format!(
                r#"{{"negotiateVersion":1,"connectionId":"conn-{n}","connectionToken":"token-{n}"}}"#
            ))
        })
    }
}

fn is_handshake(body: &str) -> bool {
    body.starts_with("{\"protocol\"")
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, _url: &Url, _bearer: &str, _timeout: Option<Duration>) -> Result<String> {
        loop {
            {
                let mut script = self.script.lock();
                if let Some(outcome) = script.polls.pop_front() {
                    script.poll_count += 1;
                    return outcome;
                }
            }
            self.poll_ready.notified().await;
        }
    }

    async fn post(
        &self,
        url: &Url,
        _bearer: &str,
        body: String,
        _timeout: Option<Duration>,
    ) -> Result<String> {
        if url.path().ends_with("/negotiate") {
            return self.negotiate();
        }

        let mut script = self.script.lock();
        script.posts.push(RecordedPost {
            url: url.clone(),
            body: body.clone(),
        });

        if is_handshake(&body) {
            let ack = script
                .handshake_replies
                .pop_front()
                .unwrap_or_else(|| format!("{{}}{RECORD_SEPARATOR}"));
            script.polls.push_front(Ok(ack));
            drop(script);
            self.poll_ready.notify_one();
            return Ok(String::new());
        }

        if let Some(error) = script.post_failures.pop_front() {
            return Err(error);
        }

        let replies: Vec<Message> = match &script.responder {
            Some(responder) => decode(&body).iter().filter_map(|m| responder(m)).collect(),
            None => Vec::new(),
        };
        for reply in &replies {
            script.polls.push_back(Ok(encode(reply).expect("encode reply")));
        }
        drop(script);

        for _ in &replies {
            self.poll_ready.notify_one();
        }
        Ok(String::new())
    }

    async fn delete(&self, url: &Url, _bearer: &str, timeout: Option<Duration>) -> Result<()> {
        if !self.supports_delete {
            return Err(Error::unsupported_method("DELETE"));
        }
        self.script.lock().deletes.push((url.clone(), timeout));
        Ok(())
    }
}
