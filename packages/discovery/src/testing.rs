//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the discovery library
//! without making real reasoning or network calls.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{DiscoveryError, Result};
use crate::traits::probe::{LinkChecker, LinkStatus, ProbeHit, SourceProbe};
use crate::traits::reasoner::{Reasoner, Role};

/// Scripted response: `Ok(text)` or `Err(message)` for a transport failure.
pub type Scripted = std::result::Result<String, String>;

type Responder = dyn Fn(&str, Role) -> Option<Scripted> + Send + Sync;

/// A scripted reasoner for testing.
///
/// Responses are resolved in this order:
/// 1. the per-role queue (consumed front to back)
/// 2. the responder function, if it returns `Some`
/// 3. the per-role default
///
/// With none of those, the call fails.
#[derive(Default)]
pub struct ScriptedReasoner {
    /// Queued responses by role
    queues: Arc<RwLock<HashMap<Role, VecDeque<Scripted>>>>,

    /// Response used once a role's queue is empty
    defaults: Arc<RwLock<HashMap<Role, Scripted>>>,

    /// Prompt-dependent responses
    responder: Option<Arc<Responder>>,

    /// Artificial delay before every response
    latency: Option<Duration>,

    /// Panic when a prompt contains this text
    panic_on: Option<String>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockReasonerCall>>>,
}

/// Record of a call made to the scripted reasoner.
#[derive(Debug, Clone)]
pub struct MockReasonerCall {
    pub role: Role,
    pub prompt: String,
}

impl ScriptedReasoner {
    /// Create a reasoner with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue responses for search calls.
    pub fn with_search(self, responses: Vec<Scripted>) -> Self {
        self.enqueue(Role::Search, responses)
    }

    /// Queue responses for judge calls.
    pub fn with_judge(self, responses: Vec<Scripted>) -> Self {
        self.enqueue(Role::Judge, responses)
    }

    /// Queue responses for refine calls.
    pub fn with_refine(self, responses: Vec<Scripted>) -> Self {
        self.enqueue(Role::Refine, responses)
    }

    /// Response for a role once its queue is empty.
    pub fn with_default(self, role: Role, response: Scripted) -> Self {
        self.defaults.write().unwrap().insert(role, response);
        self
    }

    /// Make every unscripted refine call fail.
    pub fn with_refine_failure(self, message: impl Into<String>) -> Self {
        self.with_default(Role::Refine, Err(message.into()))
    }

    /// Compute responses from the prompt (deterministic per prompt).
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str, Role) -> Option<Scripted> + Send + Sync + 'static,
    {
        self.responder = Some(Arc::new(responder));
        self
    }

    /// Sleep before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Panic on any prompt containing `needle`.
    pub fn with_panic_on(mut self, needle: impl Into<String>) -> Self {
        self.panic_on = Some(needle.into());
        self
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<MockReasonerCall> {
        self.calls.read().unwrap().clone()
    }

    /// Number of calls made in a role.
    pub fn calls_for(&self, role: Role) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|call| call.role == role)
            .count()
    }

    /// Clear recorded calls.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    fn enqueue(self, role: Role, responses: Vec<Scripted>) -> Self {
        self.queues
            .write()
            .unwrap()
            .entry(role)
            .or_default()
            .extend(responses);
        self
    }

    fn next_response(&self, prompt: &str, role: Role) -> Option<Scripted> {
        let queued = self
            .queues
            .write()
            .unwrap()
            .get_mut(&role)
            .and_then(VecDeque::pop_front);

        queued
            .or_else(|| self.responder.as_ref().and_then(|f| f(prompt, role)))
            .or_else(|| self.defaults.read().unwrap().get(&role).cloned())
    }
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    async fn invoke(&self, prompt: &str, role: Role) -> Result<String> {
        self.calls.write().unwrap().push(MockReasonerCall {
            role,
            prompt: prompt.to_string(),
        });

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(needle) = &self.panic_on {
            if prompt.contains(needle.as_str()) {
                panic!("scripted panic for prompt containing {:?}", needle);
            }
        }

        match self.next_response(prompt, role) {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(DiscoveryError::transport(message)),
            None => Err(DiscoveryError::transport(format!(
                "no scripted {} response",
                role
            ))),
        }
    }
}

/// A mock source probe for testing.
#[derive(Default)]
pub struct MockProbe {
    /// Hits by company name
    hits: Arc<RwLock<HashMap<String, Vec<ProbeHit>>>>,

    /// Transport failures by company name
    failures: Arc<RwLock<HashMap<String, String>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockProbeCall>>>,
}

/// Record of a call made to the mock probe.
#[derive(Debug, Clone)]
pub struct MockProbeCall {
    pub item_name: String,
    pub source_type: String,
}

impl MockProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return these hits for a company.
    pub fn with_hits(self, item_name: impl Into<String>, hits: Vec<ProbeHit>) -> Self {
        self.hits.write().unwrap().insert(item_name.into(), hits);
        self
    }

    /// Fail with a transport error for a company.
    pub fn with_failure(self, item_name: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures
            .write()
            .unwrap()
            .insert(item_name.into(), message.into());
        self
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<MockProbeCall> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl SourceProbe for MockProbe {
    async fn probe(&self, item_name: &str, source_type: &str) -> Result<Vec<ProbeHit>> {
        self.calls.write().unwrap().push(MockProbeCall {
            item_name: item_name.to_string(),
            source_type: source_type.to_string(),
        });

        if let Some(message) = self.failures.read().unwrap().get(item_name) {
            return Err(DiscoveryError::transport(message.clone()));
        }

        Ok(self
            .hits
            .read()
            .unwrap()
            .get(item_name)
            .cloned()
            .unwrap_or_default())
    }
}

/// A mock link checker. URLs are reachable unless marked otherwise.
#[derive(Default)]
pub struct MockLinkChecker {
    unreachable: Arc<RwLock<HashMap<String, String>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockLinkChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report this URL as unreachable.
    pub fn with_unreachable(self, url: impl Into<String>, reason: impl Into<String>) -> Self {
        self.unreachable
            .write()
            .unwrap()
            .insert(url.into(), reason.into());
        self
    }

    /// URLs checked so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl LinkChecker for MockLinkChecker {
    async fn check(&self, url: &str) -> LinkStatus {
        self.calls.write().unwrap().push(url.to_string());
        match self.unreachable.read().unwrap().get(url) {
            Some(reason) => LinkStatus::Unreachable {
                reason: reason.clone(),
            },
            None => LinkStatus::Reachable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_then_default() {
        let reasoner = ScriptedReasoner::new()
            .with_search(vec![Ok("first".into())])
            .with_default(Role::Search, Ok("again".into()));

        assert_eq!(reasoner.invoke("p", Role::Search).await.unwrap(), "first");
        assert_eq!(reasoner.invoke("p", Role::Search).await.unwrap(), "again");
        assert!(reasoner.invoke("p", Role::Judge).await.is_err());
        assert_eq!(reasoner.calls_for(Role::Search), 2);
    }

    #[tokio::test]
    async fn test_responder_sees_prompt() {
        let reasoner = ScriptedReasoner::new().with_responder(|prompt, _| {
            prompt.contains("Acme").then(|| Ok("acme answer".to_string()))
        });
        assert_eq!(reasoner.invoke("about Acme", Role::Search).await.unwrap(), "acme answer");
        assert!(reasoner.invoke("about Globex", Role::Search).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_probe_not_found_is_empty() {
        let probe = MockProbe::new()
            .with_hits("Acme Corp", vec![ProbeHit::new("https://acme.com", "official site")]);
        assert_eq!(probe.probe("Acme Corp", "Annual Report").await.unwrap().len(), 1);
        assert!(probe.probe("Globex", "Annual Report").await.unwrap().is_empty());
        assert_eq!(probe.calls().len(), 2);
    }
}
