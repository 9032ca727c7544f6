//! Conversational help for citizens using the reporting app.
//!
//! A [`ChatSession`] keeps the transcript for one open chat window. Each
//! question is sent with a fixed app knowledge base and the most recent turns.
//! Requests are spaced out to stay under the endpoint's quota. When the quota
//! is exhausted anyway, a canned answer picked by keyword is returned instead.

use std::time::Duration;

use chrono::{DateTime, Utc};
use civic_core::defaults::{CHAT_HISTORY_MESSAGES, CHAT_MIN_INTERVAL_MS};
use civic_core::{Error, GenerationBackend};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

pub const GREETING: &str =
    "Hello! I'm your Civic Reporting Assistant. How can I help you today?";

const UNCLEAR_REPLY: &str = "Sorry, I didn't understand that. Can you try rephrasing?";

const APP_KNOWLEDGE: &str = "\
You are an assistant for a Civic Reporting System. Here's what users can do:

1. Report Issues:
   - Report civic issues like potholes, broken street lights, trash, graffiti, etc.
   - Select a category, add a title and description, upload photos, and specify location
   - Reports are analyzed automatically to suggest categories and improve content

2. View Reports:
   - See all reports in the dashboard
   - See your own submitted reports in \"My Reports\"

3. Navigation:
   - Dashboard: Overview of all civic reports in the city
   - Report Issue: Form to submit a new civic issue
   - My Reports: View reports you've submitted

4. Smart Features:
   - Automatic analysis of reports for better categorization
   - Suggestions for titles and descriptions
   - Location-based issue categorization

Always be helpful, concise, and guide users through the app features.
If asked about technical implementation, explain in simple terms.";

const REPORT_HELP: &str = "To report an issue:\n\n\
1. Click 'Report Issue' in the navigation\n\
2. Select a category for your issue\n\
3. Add a title and detailed description\n\
4. Upload photos if possible\n\
5. Specify the location\n\
6. Submit your report\n\n\
Your report will be analyzed and enhanced automatically!";

const DASHBOARD_HELP: &str = "Dashboard features:\n\n\
• See all city reports in real-time\n\
• View reports by category\n\
• Check status of your submissions in 'My Reports'\n\
• Analytics showing issue trends\n\n\
The dashboard updates automatically with new reports.";

const GENERAL_HELP: &str = "I can help you with:\n\n\
• Reporting issues (potholes, street lights, etc.)\n\
• Viewing your submitted reports\n\
• Navigating the dashboard\n\
• Using smart features in reports\n\n\
Please try again in a few moments, or ask about a different topic.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatSender {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: ChatSender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(sender: ChatSender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Where an assistant reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Generated,
    /// Canned answer used while the endpoint is rate limited.
    Local,
    /// The request failed; the text explains the failure.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
    pub source: ReplySource,
}

/// One conversation with the help assistant.
pub struct ChatSession<B> {
    backend: B,
    messages: Vec<ChatMessage>,
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl<B: GenerationBackend> ChatSession<B> {
    /// New conversation, opened with the greeting.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            messages: vec![ChatMessage::new(ChatSender::Assistant, GREETING)],
            min_interval: Duration::from_millis(CHAT_MIN_INTERVAL_MS),
            last_request: None,
        }
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The transcript, greeting first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Ask a question and append both sides to the transcript.
    ///
    /// Blank input is ignored and returns `None`. Failures never escape: they
    /// come back as a `Local` or `Failed` reply.
    #[instrument(
        skip_all,
        fields(subsystem = "inference", component = "assistant", op = "send", model = %self.backend.model_name())
    )]
    pub async fn send(&mut self, input: &str) -> Option<ChatReply> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        self.pace().await;

        let prompt = self.prompt(input);
        self.messages.push(ChatMessage::new(ChatSender::User, input));

        let reply = match self.backend.generate(&prompt).await {
            Ok(text) => {
                let text = text.trim();
                ChatReply {
                    text: (if text.is_empty() { UNCLEAR_REPLY } else { text }).to_string(),
                    source: ReplySource::Generated,
                }
            }
            Err(Error::RateLimited(reason)) => {
                warn!(error = %reason, "Assistant rate limited, answering locally");
                ChatReply {
                    text: local_answer(input).to_string(),
                    source: ReplySource::Local,
                }
            }
            Err(e) => {
                warn!(error = %e, "Assistant request failed");
                ChatReply {
                    text: format!("Error: {}. Please check your connection and try again.", e),
                    source: ReplySource::Failed,
                }
            }
        };

        debug!(source = ?reply.source, response_len = reply.text.len(), "Assistant replied");
        self.messages
            .push(ChatMessage::new(ChatSender::Assistant, reply.text.clone()));
        Some(reply)
    }

    /// Wait until `min_interval` has passed since the previous request.
    async fn pace(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Spacing assistant request");
                tokio::time::sleep(wait).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    /// Knowledge base, the last few turns (greeting excluded) and the question.
    fn prompt(&self, input: &str) -> String {
        let earlier = &self.messages[1.min(self.messages.len())..];
        let recent = &earlier[earlier.len().saturating_sub(CHAT_HISTORY_MESSAGES)..];
        let history: Vec<String> = recent
            .iter()
            .map(|m| {
                let who = match m.sender {
                    ChatSender::User => "User",
                    ChatSender::Assistant => "Assistant",
                };
                format!("{}: {}", who, m.text)
            })
            .collect();

        format!(
            "{APP_KNOWLEDGE}\n\nConversation history:\n{}\n\nUser: {input}\n\nAssistant: Respond concisely and helpfully:",
            history.join("\n")
        )
    }
}

/// Canned help chosen by keyword.
pub fn local_answer(input: &str) -> &'static str {
    let lower = input.to_lowercase();
    if lower.contains("report") || lower.contains("issue") {
        REPORT_HELP
    } else if lower.contains("dashboard") || lower.contains("view") {
        DASHBOARD_HELP
    } else {
        GENERAL_HELP
    }
}
