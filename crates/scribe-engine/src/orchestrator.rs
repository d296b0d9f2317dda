//! Event pipeline wiring.
//!
//! The orchestrator connects the transport's inbound event stream to the
//! selection engine, drives rendering and archival for the chosen action,
//! and emits replies. Events for one channel are processed strictly in
//! arrival order by a dedicated worker task; channels run concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

use scribe_archive::ArchiveSink;
use scribe_core::{
    ChannelId, ConfigHandle, ContentRenderer, InboundMessage, Quote, Record, ReplyTransport,
};
use scribe_history::HistoryRegistry;

use crate::selection::{Action, SelectionEngine};

const REPLY_BEGIN_SELECTION: &str =
    "Reply to the earliest message you want saved and mention me again.";
const REPLY_SAVED_SINGLE: &str = "Saved. Content:";
const REPLY_SAVED_RANGE: &str = "Saved the following:";
const REPLY_NOTHING_TO_SAVE: &str = "Nothing here to save...";
const REPLY_NOTHING_RECORDED: &str = "Nothing recorded in this channel yet.";
const REPLY_BROWSE_HEADER: &str = "Recorded so far:";

/// Label used when a quoted sender cannot be resolved any other way.
const FALLBACK_SENDER: &str = "Anonymous";

/// Queue depth per channel worker.
const CHANNEL_QUEUE_DEPTH: usize = 64;

/// Wires transport events through the selection engine, renderer, and
/// archive sink.
pub struct Orchestrator {
    config: ConfigHandle,
    registry: Arc<HistoryRegistry>,
    renderer: Arc<ContentRenderer>,
    sink: Arc<dyn ArchiveSink>,
    transport: Arc<dyn ReplyTransport>,
    engine: Mutex<SelectionEngine>,
}

impl Orchestrator {
    pub fn new(
        config: ConfigHandle,
        registry: Arc<HistoryRegistry>,
        renderer: Arc<ContentRenderer>,
        sink: Arc<dyn ArchiveSink>,
        transport: Arc<dyn ReplyTransport>,
    ) -> Self {
        let engine = Mutex::new(SelectionEngine::new(config.clone()));
        Self {
            config,
            registry,
            renderer,
            sink,
            transport,
            engine,
        }
    }

    /// Consume the inbound event stream until it closes.
    ///
    /// Each channel gets its own worker task fed by an ordered queue, so
    /// one channel's suspension points (URL resolution, archive calls)
    /// never stall another channel's events.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<InboundMessage>) {
        let mut workers: HashMap<ChannelId, mpsc::Sender<InboundMessage>> = HashMap::new();
        while let Some(event) = events.recv().await {
            let worker = workers.entry(event.channel_id).or_insert_with(|| {
                let (tx, mut rx) = mpsc::channel::<InboundMessage>(CHANNEL_QUEUE_DEPTH);
                let this = Arc::clone(&self);
                tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        this.handle(event).await;
                    }
                });
                tx
            });
            if worker.send(event).await.is_err() {
                warn!("channel worker dropped its queue");
            }
        }
    }

    /// Process one inbound message to completion.
    pub async fn handle(&self, message: InboundMessage) {
        let action = self.engine.lock().decide(&message);
        match action {
            Action::Cache => self.cache(&message),
            Action::Browse => self.browse(&message).await,
            Action::SaveSingle { quote } => self.save_single(&message, &quote).await,
            Action::SaveRange { quote } => self.save_range(&message, &quote).await,
            Action::BeginSelection => self.begin_selection(&message).await,
        }
    }

    /// Capture-time record construction; the configured display-name
    /// override wins over the transport's label.
    fn capture_record(&self, message: &InboundMessage) -> Record {
        let sender = self
            .config
            .display_name_for(message.sender_id)
            .unwrap_or_else(|| message.sender_name.clone());
        Record::new(
            message.ids.clone(),
            sender,
            message.content.clone(),
            message.timestamp,
        )
    }

    fn cache(&self, message: &InboundMessage) {
        let record = Arc::new(self.capture_record(message));
        self.registry
            .history(message.channel_id)
            .lock()
            .append(record);
    }

    /// The quoted record: the cached one when still retained, otherwise a
    /// synthesis from the quote's own embedded content. Sender resolution
    /// for the synthesized case: configured override, then the quote's
    /// nickname, then the anonymous fallback.
    fn resolve_quoted(&self, channel: ChannelId, quote: &Quote) -> Arc<Record> {
        if let Some(cached) = self.registry.history(channel).lock().find_by_ids(&quote.ids) {
            return cached;
        }
        let sender = self
            .config
            .display_name_for(quote.sender_id)
            .or_else(|| quote.sender_name.clone())
            .unwrap_or_else(|| FALLBACK_SENDER.to_string());
        Arc::new(Record::new(
            quote.ids.clone(),
            sender,
            quote.content.clone(),
            quote.timestamp,
        ))
    }

    async fn save_single(&self, message: &InboundMessage, quote: &Quote) {
        let record = self.resolve_quoted(message.channel_id, quote);
        let text = record.rendered_text(&self.renderer).await.to_string();
        self.sink.archive(&text, message.channel_id).await;
        self.reply(message.channel_id, &format!("{REPLY_SAVED_SINGLE}\n{text}"))
            .await;
    }

    async fn save_range(&self, message: &InboundMessage, quote: &Quote) {
        let records = self
            .registry
            .history(message.channel_id)
            .lock()
            .suffix_from(&quote.ids);
        if records.is_empty() {
            self.reply(message.channel_id, REPLY_NOTHING_TO_SAVE).await;
            return;
        }

        let mut renders = Vec::with_capacity(records.len());
        for record in &records {
            renders.push(record.rendered_text(&self.renderer).await.to_string());
        }
        let joined = renders.join("\n");
        // One append for the whole batch.
        self.sink.archive(&joined, message.channel_id).await;
        self.reply(
            message.channel_id,
            &format!("{REPLY_SAVED_RANGE}\n{joined}"),
        )
        .await;
    }

    async fn browse(&self, message: &InboundMessage) {
        let records = self.registry.history(message.channel_id).lock().snapshot();
        if records.is_empty() {
            self.reply(message.channel_id, REPLY_NOTHING_RECORDED).await;
            return;
        }

        let mut lines = Vec::with_capacity(records.len() + 1);
        lines.push(REPLY_BROWSE_HEADER.to_string());
        for record in &records {
            lines.push(record.rendered_text(&self.renderer).await.to_string());
        }
        self.reply(message.channel_id, &lines.join("\n")).await;
    }

    async fn begin_selection(&self, message: &InboundMessage) {
        let trigger = message.text();
        let text = if trigger.is_empty() {
            REPLY_BEGIN_SELECTION.to_string()
        } else {
            format!("> {trigger}\n{REPLY_BEGIN_SELECTION}")
        };
        self.reply(message.channel_id, &text).await;
    }

    async fn reply(&self, channel: ChannelId, text: &str) {
        if let Err(err) = self.transport.reply(channel, text).await {
            warn!(channel, error = %err, "failed to send reply");
        }
    }
}
