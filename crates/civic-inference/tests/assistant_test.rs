//! Help assistant conversation behaviour, driven by the scripted backend.

use std::time::Duration;

use civic_inference::assistant::GREETING;
use civic_inference::{ChatSender, ChatSession, MockGenerationBackend, ReplySource};

fn session(backend: MockGenerationBackend) -> ChatSession<MockGenerationBackend> {
    ChatSession::new(backend).with_min_interval(Duration::ZERO)
}

#[tokio::test]
async fn test_generated_reply_is_recorded() {
    let backend = MockGenerationBackend::new().with_reply("  Open 'Report Issue' to start.  ");
    let mut chat = session(backend.clone());

    let reply = chat.send("How do I file something?").await.unwrap();

    assert_eq!(reply.source, ReplySource::Generated);
    assert_eq!(reply.text, "Open 'Report Issue' to start.");
    let transcript = chat.messages();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[0].text, GREETING);
    assert_eq!(transcript[1].sender, ChatSender::User);
    assert_eq!(transcript[2].text, reply.text);

    let prompt = &backend.prompts()[0];
    assert!(prompt.contains("Civic Reporting System"));
    assert!(prompt.contains("User: How do I file something?"));
    assert!(!prompt.contains(GREETING));
}

#[tokio::test]
async fn test_prompt_carries_only_recent_turns() {
    let backend = MockGenerationBackend::new()
        .with_reply("answer one")
        .with_reply("answer two")
        .with_reply("answer three")
        .with_reply("answer four");
    let mut chat = session(backend.clone());

    for question in ["question one", "question two", "question three", "question four"] {
        chat.send(question).await.unwrap();
    }

    let prompts = backend.prompts();
    assert!(prompts[2].contains("User: question one\nAssistant: answer one"));
    let last = &prompts[3];
    assert!(!last.contains("question one"));
    assert!(!last.contains("answer one"));
    assert!(last.contains("User: question two\nAssistant: answer two"));
    assert!(last.contains("User: question three\nAssistant: answer three"));
    assert!(last.contains("User: question four"));
}

#[tokio::test]
async fn test_rate_limited_answers_locally() {
    let backend = MockGenerationBackend::new()
        .with_rate_limit("Rate limit exceeded (429)")
        .with_rate_limit("Rate limit exceeded (429)");
    let mut chat = session(backend);

    let reply = chat.send("How do I report a broken light?").await.unwrap();
    assert_eq!(reply.source, ReplySource::Local);
    assert!(reply.text.starts_with("To report an issue"));

    let reply = chat.send("anything else").await.unwrap();
    assert!(reply.text.starts_with("I can help you with"));
    assert_eq!(chat.messages().len(), 5);
}

#[tokio::test]
async fn test_other_failures_explain_themselves() {
    let mut chat = session(MockGenerationBackend::new().with_failure("connection reset"));

    let reply = chat.send("hello").await.unwrap();

    assert_eq!(reply.source, ReplySource::Failed);
    assert_eq!(
        reply.text,
        "Error: AI unavailable: connection reset. Please check your connection and try again."
    );
}

#[tokio::test]
async fn test_empty_reply_asks_to_rephrase() {
    let mut chat = session(MockGenerationBackend::new().with_reply("   "));
    let reply = chat.send("hmm").await.unwrap();
    assert_eq!(reply.source, ReplySource::Generated);
    assert_eq!(reply.text, "Sorry, I didn't understand that. Can you try rephrasing?");
}

#[tokio::test]
async fn test_blank_input_is_ignored() {
    let backend = MockGenerationBackend::new().with_default_reply("unused");
    let mut chat = session(backend.clone());

    assert!(chat.send("   ").await.is_none());
    assert_eq!(chat.messages().len(), 1);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_requests_are_spaced_out() {
    let backend = MockGenerationBackend::new().with_default_reply("ok");
    let mut chat = ChatSession::new(backend.clone());
    let start = tokio::time::Instant::now();

    chat.send("first").await.unwrap();
    assert!(start.elapsed() < Duration::from_millis(2000));

    chat.send("second").await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(2000));
    assert_eq!(backend.call_count(), 2);
}
