//! Background image generation: a bounded queue with a single consumer.
//!
//! Jobs run strictly in enqueue order. A failing job produces a chat-visible message for its failure class and
//! the worker moves on. The worker stops once every [`ImageQueue`] handle is dropped and the queue is drained.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use image_generation_client::{GeneratedImage, ImageError, ImageGenerator, ImageOptions};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};
use zeno_core::{Bot, SendOptions};

use crate::error::AiError;
use crate::mime;

pub const IMAGE_QUEUE_CAPACITY: usize = 100;
pub const IMAGE_WORKER_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_CAPTION_CHARS: usize = 1000;

const MSG_PROVIDER_FAILED: &str = "Image generation failed. Try again later.";
const MSG_TIMED_OUT: &str = "Image generation timed out. Try again later.";
const MSG_NO_CANDIDATES: &str = "No image was generated. The prompt may have been blocked.";
const MSG_NO_IMAGE: &str = "The model did not return an image.";
const MSG_DELIVERY_FAILED: &str = "Generated the image but couldn't send it.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageJob {
    pub prompt: String,
    pub chat_id: i64,
    pub reply_to_message_id: Option<i32>,
}

/// Producer handle. Enqueueing never waits: a full queue is reported to the caller.
#[derive(Clone)]
pub struct ImageQueue {
    tx: mpsc::Sender<ImageJob>,
}

impl ImageQueue {
    pub fn try_enqueue(&self, job: ImageJob) -> Result<(), AiError> {
        match self.tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(job)) => {
                warn!(chat_id = job.chat_id, "Image queue full, rejecting job");
                Err(AiError::Transport("image queue is full".to_string()))
            }
            Err(TrySendError::Closed(job)) => {
                error!(chat_id = job.chat_id, "Image worker is not running");
                Err(AiError::Transport("image worker stopped".to_string()))
            }
        }
    }
}

pub fn image_queue(capacity: usize) -> (ImageQueue, mpsc::Receiver<ImageJob>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ImageQueue { tx }, rx)
}

fn failure_message(e: &ImageError) -> &'static str {
    match e {
        ImageError::Provider(_) => MSG_PROVIDER_FAILED,
        ImageError::Timeout(_) => MSG_TIMED_OUT,
        ImageError::NoCandidates => MSG_NO_CANDIDATES,
        ImageError::NoImage => MSG_NO_IMAGE,
    }
}

fn caption(prompt: &str) -> String {
    let prompt: String = prompt.chars().take(MAX_CAPTION_CHARS).collect();
    format!("🎨 {}", prompt)
}

pub struct ImageWorker {
    rx: mpsc::Receiver<ImageJob>,
    bot: Arc<dyn Bot>,
    generator: Arc<dyn ImageGenerator>,
    model: String,
    timeout: Duration,
}

impl ImageWorker {
    pub fn new(
        rx: mpsc::Receiver<ImageJob>,
        bot: Arc<dyn Bot>,
        generator: Arc<dyn ImageGenerator>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            rx,
            bot,
            generator,
            model: model.into(),
            timeout: IMAGE_WORKER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        info!(model = %self.model, "Image worker started");
        while let Some(job) = self.rx.recv().await {
            self.process(&job).await;
        }
        info!("Image worker stopped");
    }

    #[instrument(skip(self, job), fields(chat_id = job.chat_id, reply_to = ?job.reply_to_message_id))]
    async fn process(&self, job: &ImageJob) {
        let result = self
            .generator
            .generate_image(&self.model, &job.prompt, &ImageOptions::default(), self.timeout)
            .await;

        let notice = match result {
            Ok(image) => match self.deliver(job, &image).await {
                Ok(()) => {
                    info!(size = image.bytes.len(), "Image delivered");
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "Image delivery failed");
                    MSG_DELIVERY_FAILED
                }
            },
            Err(e) => {
                warn!(error = %e, "Image generation failed");
                failure_message(&e)
            }
        };

        let options = SendOptions {
            reply_to: job.reply_to_message_id,
            ..SendOptions::default()
        };
        if let Err(e) = self.bot.send_message(job.chat_id, notice, &options).await {
            error!(error = %e, "Failed to report image failure");
        }
    }

    /// Writes the image to a temp file that is removed when this returns, whatever the outcome.
    async fn deliver(&self, job: &ImageJob, image: &GeneratedImage) -> Result<(), AiError> {
        let suffix = format!(".{}", mime::image_extension(&image.mime_type));
        let mut file = tempfile::Builder::new()
            .prefix("zeno-image-")
            .suffix(&suffix)
            .tempfile()
            .map_err(|e| AiError::Transport(e.to_string()))?;
        file.write_all(&image.bytes)
            .and_then(|_| file.flush())
            .map_err(|e| AiError::Transport(e.to_string()))?;

        self.bot
            .send_photo(job.chat_id, file.path(), &caption(&job.prompt), job.reply_to_message_id)
            .await?;
        Ok(())
    }
}
