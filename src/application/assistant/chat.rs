//! Dashboard assistant
//!
//! Answers chat messages with the dashboard counters as context. Each
//! client's last known counters are remembered, so later messages can
//! omit them; at most [`MAX_CHAT_CLIENTS`] clients are kept, least recently
//! seen evicted first. Reply generation sits behind [`ReplyGenerator`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;
use tracing::debug;

use crate::domain::DomainResult;

/// Counters keyed by their camelCase card name, e.g. `totalUsers`.
pub type StatContext = BTreeMap<String, i64>;

const STAT_LINES: [(&str, &str); 4] = [
    ("Total Users", "totalUsers"),
    ("Active Errors", "activeErrors"),
    ("API Requests", "apiRequests"),
    ("Database Operations", "databaseOps"),
];

pub const MAX_CHAT_CLIENTS: usize = 1024;

const GREETING: &str = "Hello! I am your virtual assistant. How can I assist you today?";

/// `Here are some system stats:` followed by one line per counter;
/// unknown counters read `N/A`.
pub fn stats_summary(context: &StatContext) -> String {
    let mut summary = String::from("Here are some system stats:\n");
    for (label, key) in STAT_LINES {
        let value = context
            .get(key)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        summary.push_str(&format!("- {}: {}\n", label, value));
    }
    summary
}

static BOLD_RE: OnceLock<Regex> = OnceLock::new();

fn bold_regex() -> &'static Regex {
    BOLD_RE.get_or_init(|| {
        Regex::new(r"\*\*(.*?)\*\*")
            .unwrap_or_else(|error| panic!("bold regex failed to compile: {error}"))
    })
}

/// Strip `**bold**` markers within a line, then fold newlines into spaces.
pub fn clean_reply(reply: &str) -> String {
    bold_regex().replace_all(reply, "$1").replace('\n', " ")
}

/// Produces a reply to `message`; `context` carries the counters the
/// reply may refer to.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, message: &str, context: &StatContext) -> DomainResult<String>;
}

/// Built-in generator answering from the counters alone.
#[derive(Debug, Default, Clone)]
pub struct StatsReplyGenerator;

#[async_trait]
impl ReplyGenerator for StatsReplyGenerator {
    async fn generate(&self, message: &str, context: &StatContext) -> DomainResult<String> {
        let question = message.to_lowercase();
        let value = |key: &str| {
            context
                .get(key)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "N/A".to_string())
        };

        let mut answers = Vec::new();
        if question.contains("user") {
            answers.push(format!("There are **{}** registered users.", value("totalUsers")));
        }
        if question.contains("error") {
            answers.push(format!("There are **{}** active errors.", value("activeErrors")));
        }
        if question.contains("api") || question.contains("request") {
            answers.push(format!("The API has served **{}** requests.", value("apiRequests")));
        }
        if question.contains("database") || question.contains("db") {
            answers.push(format!(
                "The database has handled **{}** operations.",
                value("databaseOps")
            ));
        }

        if answers.is_empty() {
            return Ok(format!(
                "I can answer questions about users, errors, API requests and database operations.\n{}",
                stats_summary(context)
            ));
        }
        Ok(answers.join("\n"))
    }
}

struct ClientContext {
    stats: StatContext,
    last_seen: u64,
}

pub struct ChatService {
    generator: Arc<dyn ReplyGenerator>,
    contexts: DashMap<String, ClientContext>,
    capacity: usize,
    clock: AtomicU64,
}

impl ChatService {
    pub fn new(generator: Arc<dyn ReplyGenerator>) -> Self {
        Self::with_capacity(generator, MAX_CHAT_CLIENTS)
    }

    pub fn with_capacity(generator: Arc<dyn ReplyGenerator>, capacity: usize) -> Self {
        Self {
            generator,
            contexts: DashMap::new(),
            capacity: capacity.max(1),
            clock: AtomicU64::new(0),
        }
    }

    /// Number of clients with remembered counters.
    pub fn tracked_clients(&self) -> usize {
        self.contexts.len()
    }

    /// Merge `stats` into the client's context and return the result.
    /// Messages without stats only read; they never create an entry.
    fn context_for(&self, client_id: &str, stats: Option<StatContext>) -> StatContext {
        let now = self.clock.fetch_add(1, Ordering::Relaxed);
        let Some(stats) = stats else {
            return match self.contexts.get_mut(client_id) {
                Some(mut entry) => {
                    entry.last_seen = now;
                    entry.stats.clone()
                }
                None => StatContext::new(),
            };
        };

        let context = {
            let mut entry = self
                .contexts
                .entry(client_id.to_string())
                .or_insert_with(|| ClientContext {
                    stats: StatContext::new(),
                    last_seen: now,
                });
            entry.stats.extend(stats);
            entry.last_seen = now;
            entry.stats.clone()
        };
        self.evict_over_capacity(client_id);
        context
    }

    fn evict_over_capacity(&self, keep: &str) {
        while self.contexts.len() > self.capacity {
            let stalest = self
                .contexts
                .iter()
                .filter(|entry| entry.key() != keep)
                .min_by_key(|entry| entry.last_seen)
                .map(|entry| entry.key().clone());
            match stalest {
                Some(key) => {
                    self.contexts.remove(&key);
                    debug!(client_id = %key, "Evicted chat context");
                }
                None => break,
            }
        }
    }

    /// Merge `stats` into the client's context and reply. An empty message
    /// gets the greeting with the current counters.
    pub async fn reply(
        &self,
        client_id: &str,
        message: &str,
        stats: Option<StatContext>,
    ) -> DomainResult<String> {
        let context = self.context_for(client_id, stats);
        debug!(client_id, ?context, "Chat context");

        let message = message.trim();
        if message.is_empty() {
            return Ok(format!("{}\n\n{}", GREETING, stats_summary(&context)));
        }

        let reply = self.generator.generate(message, &context).await?;
        Ok(clean_reply(&reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(pairs: &[(&str, i64)]) -> StatContext {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn cleans_markdown_and_newlines() {
        assert_eq!(clean_reply("**Hi** there\nfriend"), "Hi there friend");
        assert_eq!(clean_reply("a **b** c **d**"), "a b c d");
        assert_eq!(clean_reply("unclosed **bold"), "unclosed **bold");
    }

    #[test]
    fn bold_markers_do_not_span_lines() {
        assert_eq!(clean_reply("**a\nb** and **c**"), "**a b and c**");
        assert_eq!(clean_reply("**a**\n**b**"), "a b");
    }

    #[test]
    fn summary_marks_unknown_counters() {
        let summary = stats_summary(&stats(&[("totalUsers", 3)]));
        assert!(summary.contains("- Total Users: 3\n"));
        assert!(summary.contains("- Active Errors: N/A\n"));
    }

    #[tokio::test]
    async fn empty_message_greets_with_stats() {
        let chat = ChatService::new(Arc::new(StatsReplyGenerator));
        let reply = chat
            .reply("10.0.0.1", "  ", Some(stats(&[("totalUsers", 7), ("activeErrors", 1)])))
            .await
            .unwrap();
        assert!(reply.starts_with(GREETING));
        assert!(reply.contains("- Total Users: 7"));
        assert!(reply.contains("- Database Operations: N/A"));
    }

    #[tokio::test]
    async fn context_is_remembered_per_client() {
        let chat = ChatService::new(Arc::new(StatsReplyGenerator));
        chat.reply("a", "", Some(stats(&[("totalUsers", 7)])))
            .await
            .unwrap();

        let reply = chat.reply("a", "How many users?", None).await.unwrap();
        assert_eq!(reply, "There are 7 registered users.");

        let other = chat.reply("b", "How many users?", None).await.unwrap();
        assert_eq!(other, "There are N/A registered users.");
    }

    #[tokio::test]
    async fn stat_less_messages_do_not_track_clients() {
        let chat = ChatService::new(Arc::new(StatsReplyGenerator));
        for i in 0..100 {
            chat.reply(&format!("client-{i}"), "", None).await.unwrap();
        }
        assert_eq!(chat.tracked_clients(), 0);
    }

    #[tokio::test]
    async fn client_contexts_are_capped() {
        let chat = ChatService::with_capacity(Arc::new(StatsReplyGenerator), 3);
        for client in ["a", "b", "c"] {
            chat.reply(client, "", Some(stats(&[("totalUsers", 1)])))
                .await
                .unwrap();
        }
        // touching "a" makes "b" the stalest
        chat.reply("a", "users?", None).await.unwrap();
        chat.reply("d", "", Some(stats(&[("totalUsers", 4)])))
            .await
            .unwrap();

        assert_eq!(chat.tracked_clients(), 3);
        assert_eq!(
            chat.reply("b", "users?", None).await.unwrap(),
            "There are N/A registered users."
        );
        assert_eq!(
            chat.reply("a", "users?", None).await.unwrap(),
            "There are 1 registered users."
        );

        for i in 0..1000 {
            chat.reply(&format!("spoofed-{i}"), "", Some(stats(&[("apiRequests", i)])))
                .await
                .unwrap();
        }
        assert_eq!(chat.tracked_clients(), 3);
    }
}
