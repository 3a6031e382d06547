//! Background image worker: FIFO processing, per-job failure reporting, queue bounds.

mod common;

use std::sync::atomic::Ordering;

use image_generation_client::ImageError;
use zeno_ai::image_worker::{image_queue, ImageJob, ImageWorker};
use zeno_ai::AiError;

use common::{drain, Call, MockBot, MockImageGenerator, GROUP_ID, PNG_BYTES};

fn job(prompt: &str, reply_to: i32) -> ImageJob {
    ImageJob {
        prompt: prompt.to_string(),
        chat_id: GROUP_ID,
        reply_to_message_id: Some(reply_to),
    }
}

/// **Test:** Jobs run in enqueue order and a failing job does not stop the ones after it.
///
/// **Setup:** Generator fails the first job with a provider error and succeeds for the next two.
///
/// **Action:** enqueue a, b, c; drop the producer; await the worker.
///
/// **Expected:** generator saw a, b, c in order; chat got a failure notice replying to a, then photos for b and c
/// with "🎨 <prompt>" captions replying to their triggers.
#[tokio::test]
async fn test_fifo_and_continue_after_failure() {
    let (bot, mut calls) = MockBot::with_receiver();
    let images = MockImageGenerator::scripted(vec![Err(ImageError::Provider("quota".to_string()))]);
    let (queue, rx) = image_queue(10);
    let worker = ImageWorker::new(rx, bot.clone(), images.clone(), "image-model").spawn();

    queue.try_enqueue(job("a", 1)).unwrap();
    queue.try_enqueue(job("b", 2)).unwrap();
    queue.try_enqueue(job("c", 3)).unwrap();
    drop(queue);
    worker.await.unwrap();

    let prompts: Vec<String> = images.calls().into_iter().map(|(_, p, _)| p).collect();
    assert_eq!(prompts, vec!["a", "b", "c"]);

    let calls = drain(&mut calls);
    assert_eq!(calls.len(), 3);
    match &calls[0] {
        Call::Send { text, options, .. } => {
            assert_eq!(text, "Image generation failed. Try again later.");
            assert_eq!(options.reply_to, Some(1));
        }
        other => panic!("expected a failure notice, got {:?}", other),
    }
    for (call, (prompt, reply)) in calls[1..].iter().zip([("b", 2), ("c", 3)]) {
        match call {
            Call::Photo {
                chat_id,
                caption,
                reply_to,
                bytes,
            } => {
                assert_eq!(*chat_id, GROUP_ID);
                assert_eq!(caption, &format!("🎨 {}", prompt));
                assert_eq!(*reply_to, Some(reply));
                assert_eq!(bytes.as_slice(), PNG_BYTES);
            }
            other => panic!("expected a photo, got {:?}", other),
        }
    }
}

/// **Test:** Each failure class has its own chat-visible message.
///
/// **Setup:** Generator answers timeout, no candidates, no image.
///
/// **Action:** run three jobs.
///
/// **Expected:** three distinct notices in job order.
#[tokio::test]
async fn test_failure_classes_reported() {
    let (bot, mut calls) = MockBot::with_receiver();
    let images = MockImageGenerator::scripted(vec![
        Err(ImageError::Timeout(std::time::Duration::from_secs(60))),
        Err(ImageError::NoCandidates),
        Err(ImageError::NoImage),
    ]);
    let (queue, rx) = image_queue(10);
    let worker = ImageWorker::new(rx, bot.clone(), images, "image-model").spawn();
    for (i, p) in ["x", "y", "z"].iter().enumerate() {
        queue.try_enqueue(job(p, i as i32)).unwrap();
    }
    drop(queue);
    worker.await.unwrap();

    let texts: Vec<String> = drain(&mut calls)
        .iter()
        .filter_map(|c| c.text().map(str::to_string))
        .collect();
    assert_eq!(
        texts,
        vec![
            "Image generation timed out. Try again later.",
            "No image was generated. The prompt may have been blocked.",
            "The model did not return an image.",
        ]
    );
}

/// **Test:** A photo that cannot be delivered is reported as a delivery failure.
///
/// **Setup:** Generation succeeds, photo upload fails.
///
/// **Action:** run one job.
///
/// **Expected:** one notice saying the image could not be sent.
#[tokio::test]
async fn test_delivery_failure_reported() {
    let (bot, mut calls) = MockBot::with_receiver();
    bot.photos_fail.store(true, Ordering::SeqCst);
    let (queue, rx) = image_queue(10);
    let worker = ImageWorker::new(rx, bot.clone(), MockImageGenerator::scripted(Vec::new()), "image-model").spawn();
    queue.try_enqueue(job("sunset", 7)).unwrap();
    drop(queue);
    worker.await.unwrap();

    let calls = drain(&mut calls);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].text(), Some("Generated the image but couldn't send it."));
}

/// **Test:** The queue is bounded and reports a stopped worker.
///
/// **Setup:** Capacity 1 with no consumer running.
///
/// **Action:** enqueue twice; then drop the receiver and enqueue again.
///
/// **Expected:** first Ok, second Err (full), third Err (stopped).
#[tokio::test]
async fn test_queue_bounds() {
    let (queue, rx) = image_queue(1);
    assert!(queue.try_enqueue(job("a", 1)).is_ok());
    assert!(matches!(queue.try_enqueue(job("b", 2)), Err(AiError::Transport(m)) if m.contains("full")));

    drop(rx);
    assert!(matches!(queue.try_enqueue(job("c", 3)), Err(AiError::Transport(m)) if m.contains("stopped")));
}
