use super::*;

fn contents(session: &ChatSession) -> Vec<(ChatRole, &str)> {
    session
        .messages()
        .iter()
        .map(|m| (m.role, m.content.as_str()))
        .collect()
}

fn expect_send(submit: Submit) -> PendingSend {
    match submit {
        Submit::Send(pending) => pending,
        other => panic!("expected Send, got {other:?}"),
    }
}

// =============================================================
// ChatSession defaults
// =============================================================

#[test]
fn chat_session_default_empty() {
    let session = ChatSession::default();
    assert!(session.messages().is_empty());
    assert!(!session.is_sending());
    assert!(session.suggestions().is_empty());
}

#[test]
fn seeded_session_starts_with_assistant_analysis_and_suggestions() {
    let session = ChatSession::seeded(3, "### Analysis");
    assert_eq!(contents(&session), vec![(ChatRole::Assistant, "### Analysis")]);
    assert_eq!(session.epoch(), 3);
    assert_eq!(session.suggestions().len(), SUGGESTED_PROMPTS.len());
}

// =============================================================
// submit / complete
// =============================================================

#[test]
fn submit_appends_user_and_excludes_it_from_history() {
    let mut session = ChatSession::seeded(1, "seed");
    let pending = expect_send(session.submit("why?"));

    assert_eq!(pending.message, "why?");
    assert_eq!(pending.history, vec![HistoryEntry { role: WireRole::Model, content: "seed".into() }]);
    assert_eq!(contents(&session), vec![(ChatRole::Assistant, "seed"), (ChatRole::User, "why?")]);
    assert!(session.is_sending());
    assert!(session.suggestions().is_empty());
}

#[test]
fn blank_input_is_ignored() {
    let mut session = ChatSession::new(1);
    assert_eq!(session.submit("   "), Submit::Ignored);
    assert!(session.messages().is_empty());
}

#[test]
fn sends_are_serialized_in_submission_order() {
    let mut session = ChatSession::new(1);
    let a = expect_send(session.submit("A"));
    assert_eq!(session.submit("B"), Submit::Queued);
    assert_eq!(session.queued_len(), 1);
    // B is buffered, not yet in the transcript.
    assert_eq!(contents(&session), vec![(ChatRole::User, "A")]);

    let b = session.complete(a.epoch, Ok("replyA".into())).unwrap();
    assert_eq!(b.message, "B");
    assert_eq!(b.history.len(), 2);
    assert!(session.complete(b.epoch, Ok("replyB".into())).is_none());

    assert_eq!(
        contents(&session),
        vec![
            (ChatRole::User, "A"),
            (ChatRole::Assistant, "replyA"),
            (ChatRole::User, "B"),
            (ChatRole::Assistant, "replyB"),
        ]
    );
    assert!(!session.is_sending());
}

#[test]
fn failed_send_appends_placeholder_and_session_stays_usable() {
    let mut session = ChatSession::seeded(1, "seed");
    let a = expect_send(session.submit("A"));
    let err = ApiError::Status { status: 502, body: String::new() };
    assert!(session.complete(a.epoch, Err(err)).is_none());

    assert_eq!(session.messages().last().unwrap().content, CHAT_ERROR_REPLY);
    assert_eq!(session.messages().len(), 3);

    let next = expect_send(session.submit("again"));
    assert_eq!(next.history.len(), 3);
}

#[test]
fn stale_epoch_completion_is_discarded() {
    let mut session = ChatSession::new(2);
    let _pending = expect_send(session.submit("A"));
    assert!(session.complete(1, Ok("late".into())).is_none());
    assert_eq!(session.messages().len(), 1);
    assert!(session.is_sending());
}

#[test]
fn assistant_role_maps_to_model_only_on_wire() {
    assert_eq!(ChatRole::Assistant.wire(), WireRole::Model);
    assert_eq!(ChatRole::User.wire(), WireRole::User);
    let json = serde_json::to_value(ChatMessage::new(ChatRole::Assistant, "x")).unwrap();
    assert_eq!(json["role"], "assistant");
}

#[test]
fn abandon_releases_stream_and_drops_buffer() {
    let mut session = ChatSession::new(1);
    let a = expect_send(session.submit("A"));
    assert_eq!(session.submit("B"), Submit::Queued);

    session.abandon(a.epoch);
    assert!(!session.is_sending());
    assert_eq!(session.queued_len(), 0);
    assert_eq!(contents(&session), vec![(ChatRole::User, "A"), (ChatRole::Assistant, CHAT_ERROR_REPLY)]);

    // A late completion for the abandoned send is ignored.
    assert!(session.complete(a.epoch, Ok("late".into())).is_none());
    assert_eq!(session.messages().len(), 2);
    assert!(matches!(session.submit("C"), Submit::Send(_)));
}

#[test]
fn abandon_for_other_epoch_is_ignored() {
    let mut session = ChatSession::new(2);
    let _pending = expect_send(session.submit("A"));
    session.abandon(1);
    assert!(session.is_sending());
}
