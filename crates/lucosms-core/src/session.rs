//! The conversational assistant session.
//!
//! `Assistant` owns the transcript and the remote session handle. An exchange
//! checks the handle out for its whole duration, so "busy" is simply "the
//! handle is not home", and a second exchange cannot start until the first
//! one has been settled.

use tracing::{debug, info, warn};

use crate::ai::ChatSession;
use crate::capability::{CapabilityResponse, ModelReply};
use crate::error::SessionError;
use crate::knowledge::FALLBACK_REPLY;
use crate::navigation::{navigate_to_section, PageSurface};
use crate::state::{ChatMessage, Transcript};

pub struct Assistant<S> {
    transcript: Transcript,
    session: Option<S>,
}

/// An exchange in flight. Holds the session handle until it settles.
pub struct Exchange<S> {
    session: S,
    text: String,
}

/// A finished exchange, ready to be folded back into its `Assistant`.
pub struct Settled<S> {
    session: S,
    outcome: Result<Reply, SessionError>,
}

#[derive(Debug)]
struct Reply {
    text: String,
    tool_invocation: bool,
}

impl<S: ChatSession> Assistant<S> {
    pub fn new(session: S) -> Self {
        Self {
            transcript: Transcript::new(),
            session: Some(session),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_busy(&self) -> bool {
        self.session.is_none()
    }

    /// Start an exchange for `text`.
    ///
    /// Returns `None`, without touching the transcript, when the text is blank
    /// or another exchange is still pending.
    pub fn begin(&mut self, text: &str) -> Option<Exchange<S>> {
        if text.trim().is_empty() {
            return None;
        }

        let session = self.session.take()?;
        self.transcript.push(ChatMessage::user(text));
        info!(chars = text.chars().count(), "exchange started");

        Some(Exchange {
            session,
            text: text.to_string(),
        })
    }

    /// Append the exchange's reply (or the fallback) and return to idle.
    pub fn settle(&mut self, settled: Settled<S>) {
        if self.session.is_some() {
            warn!("settle called with no exchange pending, ignoring");
            return;
        }

        let message = match settled.outcome {
            Ok(reply) => {
                info!(tool_invocation = reply.tool_invocation, "exchange settled");
                ChatMessage {
                    tool_invocation: reply.tool_invocation,
                    ..ChatMessage::assistant(reply.text)
                }
            }
            Err(err) => {
                warn!(kind = err.kind(), error = %err, "exchange failed");
                ChatMessage::assistant(FALLBACK_REPLY)
            }
        };

        self.transcript.push(message);
        self.session = Some(settled.session);
    }

    /// Close out an exchange that was lost before it could settle, installing
    /// a fresh session handle in place of the one it held.
    pub fn recover(&mut self, session: S) {
        if self.session.is_some() {
            return;
        }

        warn!("exchange lost before settling, installing a fresh session");
        self.transcript.push(ChatMessage::assistant(FALLBACK_REPLY));
        self.session = Some(session);
    }

    /// Run a whole exchange in place. Returns false when the submit was ignored.
    pub async fn submit<P>(&mut self, text: &str, page: &mut P) -> bool
    where
        P: PageSurface + ?Sized,
    {
        let Some(exchange) = self.begin(text) else {
            return false;
        };

        let settled = exchange.run(page).await;
        self.settle(settled);
        true
    }
}

impl<S: ChatSession> Exchange<S> {
    pub async fn run<P>(mut self, page: &mut P) -> Settled<S>
    where
        P: PageSurface + ?Sized,
    {
        let outcome = run_protocol(&mut self.session, page, &self.text).await;
        Settled {
            session: self.session,
            outcome,
        }
    }
}

/// Send the text, service at most one capability request, and produce the
/// assistant's reply text.
async fn run_protocol<S, P>(session: &mut S, page: &mut P, text: &str) -> Result<Reply, SessionError>
where
    S: ChatSession,
    P: PageSurface + ?Sized,
{
    let call = match session.send_message(text).await? {
        ModelReply::Direct(text) => {
            return Ok(Reply {
                text,
                tool_invocation: false,
            })
        }
        ModelReply::CapabilityRequest(call) => call,
    };

    let outcome = navigate_to_section(page, call.section_id()?);
    debug!(
        capability = %call.name,
        result = %outcome.result_message(),
        "capability serviced"
    );

    let response = CapabilityResponse::for_call(&call, outcome.result_message());
    match session.send_capability_response(response).await? {
        ModelReply::Direct(text) => Ok(Reply {
            text,
            tool_invocation: true,
        }),
        ModelReply::CapabilityRequest(next) => Err(SessionError::MalformedResponse(format!(
            "expected a reply after '{}', got another request for '{}'",
            call.name, next.name
        ))),
    }
}
