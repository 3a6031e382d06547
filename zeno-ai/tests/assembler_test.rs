//! Context assembly: history selection and order, reply-target lookup with fallback, sender resolution and media.

mod common;

use std::sync::atomic::Ordering;

use prompt::{ConversationTurn, TriggerVerb};
use zeno_ai::assembler::ContextAssembler;
use zeno_core::{Chat, ChatKind, Media, MediaKind, Message, PeerRef, Sender};

use common::{group, text_from, user, MockBot, PNG_BYTES};

const CAP: u64 = 1024;

fn photo(file_id: &str, size: Option<u64>) -> Media {
    Media {
        kind: MediaKind::Photo,
        file_id: file_id.to_string(),
        file_name: None,
        mime_type: None,
        file_size: size,
    }
}

/// **Test:** History keeps prior chatter oldest first and drops the trigger, its reply target, commands and
/// empty messages.
///
/// **Setup:** Journal 1 "first" (Alice), 2 "/start", 3 "" (Bob), 4 "second" (Bob), 5 "target" (Alice); trigger 6
/// replies to 5.
///
/// **Action:** assemble with query "why".
///
/// **Expected:** history = [Alice: first, Bob: second]; replied_to = 5; transcript renders history, then the
/// replied-to block, then the trigger.
#[tokio::test]
async fn test_history_exclusions_and_order() {
    let (bot, _calls) = MockBot::with_receiver();
    let alice = user(1, "Alice");
    let bob = user(2, "Bob");
    bot.add_message(text_from(1, group(), &alice, "first"));
    bot.add_message(text_from(2, group(), &alice, "/start"));
    bot.add_message(text_from(3, group(), &bob, ""));
    bot.add_message(text_from(4, group(), &bob, "second"));
    bot.add_message(text_from(5, group(), &alice, "target"));
    let mut trigger = text_from(6, group(), &alice, "@ask why");
    trigger.reply_to_message_id = Some(5);
    bot.add_message(trigger.clone());

    let assembler = ContextAssembler::new(bot.clone(), CAP);
    let ctx = assembler.assemble(&trigger, "why", TriggerVerb::Asked, false).await;

    assert_eq!(
        ctx.history,
        vec![ConversationTurn::new("Alice", "first"), ConversationTurn::new("Bob", "second")]
    );
    assert_eq!(ctx.replied_to.as_ref().map(|m| m.id), Some(5));

    let history_at = ctx.transcript.find("Chat context:").expect("history block");
    let replied_at = ctx.transcript.find("Replied to:").expect("replied-to block");
    let trigger_at = ctx.transcript.find("user `Alice` Asked:").expect("trigger block");
    assert!(history_at < replied_at && replied_at < trigger_at);
    assert!(ctx.transcript.contains("```\nwhy\n```"));
    assert!(!ctx.transcript.contains("/start"));
}

/// **Test:** Group chats keep 20 history messages, private chats 30.
///
/// **Setup:** 40 prior messages in each chat kind.
///
/// **Action:** assemble a trigger with id 41.
///
/// **Expected:** 20 turns starting at m21 for the group; 30 starting at m11 for the private chat.
#[tokio::test]
async fn test_history_limit_by_chat_kind() {
    for (chat, expected, first) in [
        (group(), 20, "m21"),
        (Chat::new(7, ChatKind::Private), 30, "m11"),
    ] {
        let (bot, _calls) = MockBot::with_receiver();
        let alice = user(1, "Alice");
        for id in 1..=40 {
            bot.add_message(text_from(id, chat.clone(), &alice, &format!("m{}", id)));
        }
        let trigger = text_from(41, chat.clone(), &alice, "/askai hi");

        let ctx = ContextAssembler::new(bot.clone(), CAP)
            .assemble(&trigger, "hi", TriggerVerb::Asked, false)
            .await;

        assert_eq!(ctx.history.len(), expected);
        assert_eq!(ctx.history[0].text, first);
        assert_eq!(ctx.history[expected - 1].text, "m40");
    }
}

/// **Test:** When the transport cannot look messages up by id, the reply target is found in a history window.
///
/// **Setup:** By-id lookups unsupported; trigger 6 replies to 3.
///
/// **Action:** assemble.
///
/// **Expected:** replied_to is message 3.
#[tokio::test]
async fn test_reply_target_history_fallback() {
    let (bot, _calls) = MockBot::with_receiver();
    bot.lookups_unsupported.store(true, Ordering::SeqCst);
    let alice = user(1, "Alice");
    for id in 1..=5 {
        bot.add_message(text_from(id, group(), &alice, &format!("m{}", id)));
    }
    let mut trigger = text_from(6, group(), &alice, "/askai explain");
    trigger.reply_to_message_id = Some(3);

    let ctx = ContextAssembler::new(bot.clone(), CAP)
        .assemble(&trigger, "explain", TriggerVerb::Asked, false)
        .await;

    assert_eq!(ctx.replied_to.map(|m| m.text), Some("m3".to_string()));
    assert!(!ctx.history.iter().any(|t| t.text == "m3"));
}

/// **Test:** A failing history fetch degrades to no history; the query alone is still answerable.
///
/// **Setup:** History fetch fails.
///
/// **Action:** assemble.
///
/// **Expected:** empty history, transcript holds the trigger block.
#[tokio::test]
async fn test_history_failure_degrades() {
    let (bot, _calls) = MockBot::with_receiver();
    bot.history_fails.store(true, Ordering::SeqCst);
    let trigger = text_from(6, group(), &user(1, "Alice"), "/askai hello");

    let ctx = ContextAssembler::new(bot.clone(), CAP)
        .assemble(&trigger, "hello", TriggerVerb::Asked, false)
        .await;

    assert!(ctx.history.is_empty());
    assert!(!ctx.is_empty());
    assert!(ctx.transcript.starts_with("user `Alice` Asked:"));
}

/// **Test:** Raw user references are resolved through the transport, unknown ones fall back to `User_<id>`.
///
/// **Setup:** Messages from PeerRef::User(5) (known as Carol) and PeerRef::User(6) (unknown).
///
/// **Action:** speaker for each.
///
/// **Expected:** "Carol" and "User_6".
#[tokio::test]
async fn test_speaker_resolution() {
    let (bot, _calls) = MockBot::with_receiver();
    bot.add_user(user(5, "Carol"));
    let assembler = ContextAssembler::new(bot.clone(), CAP);

    let known = Message::text(1, group(), Some(Sender::Peer(PeerRef::User(5))), "hi");
    let unknown = Message::text(2, group(), Some(Sender::Peer(PeerRef::User(6))), "hi");

    assert_eq!(assembler.speaker(&known).await, "Carol");
    assert_eq!(assembler.speaker(&unknown).await, "User_6");
}

/// **Test:** Media within the cap becomes an attachment; oversized media is skipped without downloading.
///
/// **Setup:** Trigger carries a small PNG; its reply target carries a photo reported at 2 KiB (cap 1 KiB).
///
/// **Action:** assemble with media enabled.
///
/// **Expected:** exactly one attachment, typed image/png by content, and an "Attached file" line.
#[tokio::test]
async fn test_media_within_cap_only() {
    let (bot, _calls) = MockBot::with_receiver();
    let alice = user(1, "Alice");
    bot.add_media("small", PNG_BYTES.to_vec());
    bot.add_media("big", vec![0u8; 2048]);

    let mut target = text_from(3, group(), &alice, "look");
    target.media = Some(photo("big", Some(2048)));
    bot.add_message(target);

    let mut trigger = text_from(4, group(), &alice, "@ask what is this");
    trigger.media = Some(photo("small", Some(PNG_BYTES.len() as u64)));
    trigger.reply_to_message_id = Some(3);

    let ctx = ContextAssembler::new(bot.clone(), CAP)
        .assemble(&trigger, "what is this", TriggerVerb::Asked, true)
        .await;

    assert_eq!(ctx.attachments.len(), 1);
    assert_eq!(ctx.attachments[0].mime_type, "image/png");
    assert_eq!(ctx.attachments[0].file_name, "photo.jpg");
    assert!(ctx.transcript.contains("Attached file: photo.jpg"));
}

/// **Test:** Media whose size was not reported is checked after download.
///
/// **Setup:** Photo without a reported size whose bytes exceed the cap.
///
/// **Action:** attachment.
///
/// **Expected:** None.
#[tokio::test]
async fn test_unreported_size_checked_after_download() {
    let (bot, _calls) = MockBot::with_receiver();
    bot.add_media("unsized", vec![1u8; 4096]);
    let mut msg = text_from(1, group(), &user(1, "Alice"), "");
    msg.media = Some(photo("unsized", None));

    assert!(ContextAssembler::new(bot.clone(), CAP).attachment(&msg).await.is_none());
}
