// =============================================================================
// messages.rs - Messages entre contextes / Messages between contexts
// =============================================================================
//
// Les deux contextes (arrière-plan, premier plan) ne partagent rien :
// chaque message traverse le canal sous forme de JSON.
// The two contexts (background, foreground) share nothing: every message
// crosses the channel as JSON.

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::color::ColorFormat;
use crate::error::ChannelError;

// =============================================================================
// PROTOCOLE
// PROTOCOL
// =============================================================================

/// Message étiqueté par son champ `action`
/// Message tagged by its `action` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Message {
    /// Premier plan -> arrière-plan, réponse `FormatResponse`
    /// Foreground -> background, answered with `FormatResponse`
    GetColorFormat,

    /// Arrière-plan -> premier plan, sans réponse
    /// Background -> foreground, no response
    ActivatePicker,

    /// Arrière-plan -> premier plan quand le format enregistré change
    /// Background -> foreground when the saved format changes
    FormatChanged {
        #[serde(default)]
        format: ColorFormat,
    },
}

/// Réponse à `get-color-format` ; un `format` absent vaut `hex`
/// Reply to `get-color-format`; a missing `format` reads as `hex`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormatResponse {
    #[serde(default)]
    pub format: ColorFormat,
}

// =============================================================================
// TRANSPORT
// =============================================================================

struct Envelope {
    payload: Value,
    reply: Option<oneshot::Sender<Value>>,
}

/// Crée un canal vers un contexte : l'émetteur et la boîte de réception
/// Creates a channel to one context: the sender and the inbox
pub fn channel() -> (ContextLink, Inbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ContextLink { tx }, Inbox { rx })
}

/// Côté émetteur de la boîte de réception d'un contexte
/// Sending side of a context's inbox
#[derive(Clone)]
pub struct ContextLink {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl ContextLink {
    /// Envoie une requête et attend exactement une réponse
    /// Sends a request and waits for exactly one response
    pub async fn request<R: DeserializeOwned>(&self, message: &Message) -> Result<R, ChannelError> {
        let payload = serde_json::to_value(message).map_err(ChannelError::Encode)?;
        let value = self.request_value(payload).await?;
        serde_json::from_value(value).map_err(ChannelError::Decode)
    }

    /// Comme `request`, avec une charge déjà encodée
    /// Same as `request`, with an already encoded payload
    pub async fn request_value(&self, payload: Value) -> Result<Value, ChannelError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Envelope {
                payload,
                reply: Some(reply),
            })
            .map_err(|_| ChannelError::Closed)?;
        response.await.map_err(|_| ChannelError::NoResponse)
    }

    /// Envoie sans attendre de réponse
    /// Sends without expecting a response
    pub fn notify(&self, message: &Message) -> Result<(), ChannelError> {
        let payload = serde_json::to_value(message).map_err(ChannelError::Encode)?;
        self.tx
            .send(Envelope {
                payload,
                reply: None,
            })
            .map_err(|_| ChannelError::Closed)
    }
}

/// Un message décodé et, pour une requête, son répondeur
/// One decoded message and, for requests, its responder
pub struct Incoming {
    pub message: Message,
    pub responder: Option<Responder>,
}

/// Côté réception d'un contexte
/// Receiving side of a context
pub struct Inbox {
    rx: mpsc::UnboundedReceiver<Envelope>,
}

impl Inbox {
    /// Prochain message valide ; `None` quand tous les émetteurs sont fermés
    /// Next valid message; `None` once every sender is gone
    ///
    /// Undecodable messages are logged and skipped. Their responder is dropped,
    /// so the requester gets `ChannelError::NoResponse` instead of waiting.
    pub async fn recv(&mut self) -> Option<Incoming> {
        loop {
            let envelope = self.rx.recv().await?;
            match serde_json::from_value::<Message>(envelope.payload.clone()) {
                Ok(message) => {
                    return Some(Incoming {
                        message,
                        responder: envelope.reply.map(|tx| Responder { tx }),
                    })
                }
                Err(err) => warn!("Ignoring unknown message {}: {}", envelope.payload, err),
            }
        }
    }
}

/// Canal de réponse à usage unique
/// Single-use response channel
///
/// `respond` consumes the responder, so a request can be answered at most once.
/// Dropping it unanswered releases the requester with `NoResponse`.
#[must_use = "a request expects exactly one response"]
pub struct Responder {
    tx: oneshot::Sender<Value>,
}

impl Responder {
    pub fn respond<T: Serialize>(self, reply: &T) -> Result<(), ChannelError> {
        let value = serde_json::to_value(reply).map_err(ChannelError::Encode)?;
        self.tx.send(value).map_err(|_| ChannelError::Closed)
    }
}

// =============================================================================
// TESTS
// =============================================================================
