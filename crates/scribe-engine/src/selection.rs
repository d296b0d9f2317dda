//! Reply-driven selection state machine.

use std::collections::HashMap;

use scribe_core::{ChannelId, ConfigHandle, InboundMessage, Quote};

/// Per-channel selection protocol state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    /// A range selection was requested; waiting for the user to quote the
    /// earliest message to save. Keeps the triggering text for context.
    AwaitingRangeStart { prompt: String },
}

/// What the pipeline should do with one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Not addressed to the bot: capture into history.
    Cache,
    /// List everything currently retained in the channel.
    Browse,
    /// Archive the single quoted message.
    SaveSingle { quote: Quote },
    /// Archive from the quoted message through the newest.
    SaveRange { quote: Quote },
    /// Ask the user to quote the earliest message of the range.
    BeginSelection,
}

/// Decides, per inbound message, how the pipeline reacts.
///
/// Holds one [`SelectionState`] per channel; channels never share state.
/// Keywords are substring matches on the message text - a message that
/// merely contains a trigger word is treated as the command. This
/// ambiguity is inherited behavior, not something to disambiguate here.
pub struct SelectionEngine {
    states: HashMap<ChannelId, SelectionState>,
    config: ConfigHandle,
}

impl SelectionEngine {
    pub fn new(config: ConfigHandle) -> Self {
        Self {
            states: HashMap::new(),
            config,
        }
    }

    /// Current state for a channel (Idle until first touched).
    pub fn state(&self, channel: ChannelId) -> SelectionState {
        self.states.get(&channel).cloned().unwrap_or_default()
    }

    /// Apply one inbound message to the channel's state machine.
    pub fn decide(&mut self, message: &InboundMessage) -> Action {
        if !message.mentions_bot {
            // State unchanged in every state.
            return Action::Cache;
        }

        let text = message.text();
        if let Some(quote) = &message.quote {
            // Any addressed quote resolves the pending selection.
            self.states.insert(message.channel_id, SelectionState::Idle);
            if text.contains(&self.config.save_keyword()) {
                Action::SaveSingle {
                    quote: quote.clone(),
                }
            } else {
                Action::SaveRange {
                    quote: quote.clone(),
                }
            }
        } else if text.contains(&self.config.browse_keyword()) {
            Action::Browse
        } else {
            self.states.insert(
                message.channel_id,
                SelectionState::AwaitingRangeStart { prompt: text },
            );
            Action::BeginSelection
        }
    }
}
