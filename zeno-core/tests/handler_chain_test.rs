//! Integration tests for [`zeno_core::HandlerChain`].
//!
//! Covers: a gate filtering the message, Handled claiming it, Continue falling through, handler errors
//! propagating, and before/after ordering.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use zeno_core::{Chat, ChatKind, Handler, HandlerChain, HandlerResponse, Message, Sender, User, ZenoError};

fn group_message(text: &str) -> Message {
    let user = User {
        id: 123,
        username: Some("alice".to_string()),
        first_name: Some("Alice".to_string()),
        last_name: None,
        is_bot: false,
    };
    Message::text(7, Chat::new(-100, ChatKind::Group), Some(Sender::User(user)), text)
}

struct Counting {
    handled: Arc<AtomicUsize>,
    response: HandlerResponse,
}

#[async_trait::async_trait]
impl Handler for Counting {
    async fn handle(&self, _message: &Message) -> zeno_core::Result<HandlerResponse> {
        self.handled.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// **Test: A gate whose before() returns false stops the chain.**
///
/// **Setup:** Gate handler (before → false) followed by a counting handler.
/// **Action:** `chain.handle(&message)`.
/// **Expected:** Filtered; the counting handler never runs.
#[tokio::test]
async fn test_before_false_stops_chain() {
    struct Gate;

    #[async_trait::async_trait]
    impl Handler for Gate {
        async fn before(&self, _message: &Message) -> zeno_core::Result<bool> {
            Ok(false)
        }
    }

    let handled = Arc::new(AtomicUsize::new(0));
    let chain = HandlerChain::new().add_handler(Arc::new(Gate)).add_handler(Arc::new(Counting {
        handled: handled.clone(),
        response: HandlerResponse::Continue,
    }));

    let result = chain.handle(&group_message("/askai hi")).await.unwrap();

    assert_eq!(result, HandlerResponse::Filtered);
    assert_eq!(handled.load(Ordering::SeqCst), 0);
}

/// **Test: Continue falls through; Handled claims the message and reaches after().**
///
/// **Setup:** Handlers returning Continue, Handled, Continue; a recorder capturing the outcome.
/// **Action:** `chain.handle(&message)`.
/// **Expected:** Handled; the third handler is not run; the recorder sees Handled.
#[tokio::test]
async fn test_continue_falls_through_and_handled_reaches_after() {
    struct Recorder {
        seen: Arc<Mutex<Option<HandlerResponse>>>,
    }

    #[async_trait::async_trait]
    impl Handler for Recorder {
        async fn after(&self, _message: &Message, outcome: HandlerResponse) -> zeno_core::Result<()> {
            *self.seen.lock().unwrap() = Some(outcome);
            Ok(())
        }
    }

    let seen = Arc::new(Mutex::new(None));
    let passed = Arc::new(AtomicUsize::new(0));
    let claimed = Arc::new(AtomicUsize::new(0));
    let skipped = Arc::new(AtomicUsize::new(0));

    let chain = HandlerChain::new()
        .add_handler(Arc::new(Recorder { seen: seen.clone() }))
        .add_handler(Arc::new(Counting {
            handled: passed.clone(),
            response: HandlerResponse::Continue,
        }))
        .add_handler(Arc::new(Counting {
            handled: claimed.clone(),
            response: HandlerResponse::Handled,
        }))
        .add_handler(Arc::new(Counting {
            handled: skipped.clone(),
            response: HandlerResponse::Continue,
        }));

    let result = chain.handle(&group_message("@ask hello")).await.unwrap();

    assert_eq!(result, HandlerResponse::Handled);
    assert_eq!(passed.load(Ordering::SeqCst), 1);
    assert_eq!(claimed.load(Ordering::SeqCst), 1);
    assert_eq!(skipped.load(Ordering::SeqCst), 0);
    assert_eq!(*seen.lock().unwrap(), Some(HandlerResponse::Handled));
}

/// **Test: A handler error propagates out of the chain.**
///
/// **Setup:** One handler whose handle() fails with a transport error.
/// **Action:** `chain.handle(&message)`.
/// **Expected:** Err(ZenoError::Bot).
#[tokio::test]
async fn test_handler_error_propagates() {
    struct Failing;

    #[async_trait::async_trait]
    impl Handler for Failing {
        async fn handle(&self, _message: &Message) -> zeno_core::Result<HandlerResponse> {
            Err(ZenoError::Bot("edit failed".to_string()))
        }
    }

    let chain = HandlerChain::new().add_handler(Arc::new(Failing));
    let err = chain.handle(&group_message("")).await.unwrap_err();

    assert!(matches!(err, ZenoError::Bot(m) if m == "edit failed"));
}

/// **Test: before runs first→last, after runs last→first.**
///
/// **Setup:** Two handlers pushing "before_NAME"/"after_NAME" into a shared vec.
/// **Action:** `chain.handle(&message)`.
/// **Expected:** before_first, before_second, after_second, after_first.
#[tokio::test]
async fn test_before_and_after_order() {
    struct Ordered {
        name: &'static str,
        order: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl Handler for Ordered {
        async fn before(&self, _message: &Message) -> zeno_core::Result<bool> {
            self.order.lock().unwrap().push(format!("before_{}", self.name));
            Ok(true)
        }

        async fn after(&self, _message: &Message, _outcome: HandlerResponse) -> zeno_core::Result<()> {
            self.order.lock().unwrap().push(format!("after_{}", self.name));
            Ok(())
        }
    }

    let order = Arc::new(Mutex::new(Vec::new()));
    let chain = HandlerChain::new()
        .add_handler(Arc::new(Ordered {
            name: "first",
            order: order.clone(),
        }))
        .add_handler(Arc::new(Ordered {
            name: "second",
            order: order.clone(),
        }));

    assert_eq!(chain.len(), 2);
    chain.handle(&group_message("hi")).await.unwrap();

    assert_eq!(
        *order.lock().unwrap(),
        vec!["before_first", "before_second", "after_second", "after_first"]
    );
}
