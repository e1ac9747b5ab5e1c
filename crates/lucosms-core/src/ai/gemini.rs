//! Chat session backed by the Gemini `generateContent` REST endpoint.
//!
//! The REST API is stateless, so the session keeps the conversation history
//! itself and resends it, together with the system instruction and the
//! capability declarations, on every turn.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::ChatSession;
use crate::capability::{CapabilityCall, CapabilityDeclaration, CapabilityResponse, ModelReply};
use crate::error::SessionError;
use crate::knowledge::SITE_CONTEXT;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Request URLs end up in transport errors, so the key stays out of them.
const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiSession {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    system_instruction: String,
    declarations: Vec<CapabilityDeclaration>,
    history: Vec<Content>,
}

impl GeminiSession {
    /// Session primed with the site knowledge and the navigation capability.
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            system_instruction: SITE_CONTEXT.to_string(),
            declarations: vec![CapabilityDeclaration::navigate_to_section()],
            history: Vec::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Number of committed turns (user and model) in the conversation.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Send one turn. The turn and the model's answer are only kept in
    /// history when the request succeeds.
    async fn send_turn(&mut self, turn: Content) -> Result<ModelReply, SessionError> {
        self.history.push(turn);

        let answer = match self.generate().await {
            Ok(content) => content,
            Err(err) => {
                self.history.pop();
                return Err(err);
            }
        };

        match parse_reply(&answer) {
            Ok(reply) => {
                self.history.push(answer);
                Ok(reply)
            }
            Err(err) => {
                self.history.pop();
                Err(err)
            }
        }
    }

    async fn generate(&self) -> Result<Content, SessionError> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);

        let request = GenerateContentRequest {
            contents: &self.history,
            system_instruction: SystemInstruction {
                parts: vec![TextPart {
                    text: &self.system_instruction,
                }],
            },
            tools: vec![Tool {
                function_declarations: self
                    .declarations
                    .iter()
                    .map(|d| FunctionDeclaration {
                        name: d.name,
                        description: d.description,
                        parameters: d.parameters_schema(),
                    })
                    .collect(),
            }],
        };

        debug!(model = %self.model, turns = self.history.len(), "gemini generateContent");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(map_http_error(status, &body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|err| SessionError::MalformedResponse(format!("invalid JSON from Gemini: {err}")))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .ok_or_else(|| SessionError::MalformedResponse("Gemini returned no candidates".into()))
    }

    /// Drop a trailing model turn whose function calls were never answered,
    /// together with the user turn that prompted it, so the history keeps
    /// alternating between user and model.
    fn drop_unanswered_call(&mut self) {
        let dangling = self
            .history
            .last()
            .map(|c| c.role == MODEL_ROLE && c.parts.iter().any(|p| p.function_call.is_some()))
            .unwrap_or(false);
        if !dangling {
            return;
        }

        debug!("dropping unanswered function call from history");
        self.history.pop();
        if self.history.last().map(|c| c.role == USER_ROLE).unwrap_or(false) {
            self.history.pop();
        }
    }
}

#[async_trait]
impl ChatSession for GeminiSession {
    async fn send_message(&mut self, text: &str) -> Result<ModelReply, SessionError> {
        self.drop_unanswered_call();
        self.send_turn(Content::user(vec![Part::text(text)])).await
    }

    async fn send_capability_response(
        &mut self,
        response: CapabilityResponse,
    ) -> Result<ModelReply, SessionError> {
        let part = Part {
            function_response: Some(FunctionResponse {
                name: response.name,
                response: json!({ "result": response.result }),
                id: response.id,
            }),
            ..Part::default()
        };
        self.send_turn(Content::user(vec![part])).await
    }
}

const USER_ROLE: &str = "user";
const MODEL_ROLE: &str = "model";

fn model_role() -> String {
    MODEL_ROLE.to_string()
}

/// First function call wins; otherwise the non-thought text parts joined.
fn parse_reply(content: &Content) -> Result<ModelReply, SessionError> {
    if let Some(call) = content.parts.iter().find_map(|p| p.function_call.clone()) {
        return Ok(ModelReply::CapabilityRequest(call));
    }

    let text: String = content
        .parts
        .iter()
        .filter(|p| !p.thought)
        .filter_map(|p| p.text.as_deref())
        .collect();

    if text.is_empty() {
        return Err(SessionError::MalformedResponse(
            "Gemini reply has neither text nor a function call".into(),
        ));
    }

    Ok(ModelReply::Direct(text))
}

fn map_http_error(status: StatusCode, body: &str) -> SessionError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|| body.to_string());

    SessionError::Remote {
        status: status.as_u16(),
        message,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
    system_instruction: SystemInstruction<'a>,
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Serialize)]
struct FunctionDeclaration {
    name: &'static str,
    description: &'static str,
    parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default = "model_role")]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn user(parts: Vec<Part>) -> Self {
        Self {
            role: USER_ROLE.to_string(),
            parts,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<CapabilityCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought_signature: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    thought: bool,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL_PATH: &str = "/gemini-2.5-flash:generateContent";

    fn text_reply(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
    }

    fn call_reply(section: &str) -> Value {
        json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{
                        "functionCall": {
                            "name": "navigate_to_section",
                            "args": { "sectionId": section },
                            "id": "fc-1"
                        }
                    }]
                }
            }]
        })
    }

    fn session_for(server: &MockServer) -> GeminiSession {
        GeminiSession::new("test-key").with_base_url(server.uri())
    }

    async fn request_bodies(server: &MockServer) -> Vec<Value> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_direct_reply_sends_context_and_tools() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(header(API_KEY_HEADER, "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("Basic is 35 UGX.")))
            .expect(1)
            .mount(&server)
            .await;

        let mut session = session_for(&server);
        let reply = session.send_message("What are your prices?").await.unwrap();

        assert_eq!(reply, ModelReply::Direct("Basic is 35 UGX.".to_string()));
        assert_eq!(session.history_len(), 2);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.query(), None);

        let body = &request_bodies(&server).await[0];
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "What are your prices?");
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("LUCOSMS"));
        let declaration = &body["tools"][0]["functionDeclarations"][0];
        assert_eq!(declaration["name"], "navigate_to_section");
        assert_eq!(declaration["parameters"]["required"], json!(["sectionId"]));
    }

    #[tokio::test]
    async fn test_function_call_and_response_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(call_reply("pricing")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("Here is our pricing.")))
            .mount(&server)
            .await;

        let mut session = session_for(&server);
        let reply = session.send_message("show me pricing").await.unwrap();

        let call = match reply {
            ModelReply::CapabilityRequest(call) => call,
            other => panic!("expected capability request, got {other:?}"),
        };
        assert_eq!(call.name, "navigate_to_section");
        assert_eq!(call.args["sectionId"], "pricing");
        assert_eq!(call.id.as_deref(), Some("fc-1"));

        let follow_up = session
            .send_capability_response(CapabilityResponse::for_call(&call, "scrolled to pricing"))
            .await
            .unwrap();
        assert_eq!(follow_up, ModelReply::Direct("Here is our pricing.".to_string()));
        assert_eq!(session.history_len(), 4);

        let bodies = request_bodies(&server).await;
        let contents = bodies[1]["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert!(contents[1]["parts"][0]["functionCall"].is_object());
        let function_response = &contents[2]["parts"][0]["functionResponse"];
        assert_eq!(function_response["name"], "navigate_to_section");
        assert_eq!(function_response["id"], "fc-1");
        assert_eq!(function_response["response"]["result"], "scrolled to pricing");
    }

    #[tokio::test]
    async fn test_first_function_call_wins_over_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [
                            { "text": "Sure, taking you there." },
                            { "functionCall": { "name": "navigate_to_section", "args": { "sectionId": "code" } } },
                            { "functionCall": { "name": "navigate_to_section", "args": { "sectionId": "hero" } } }
                        ]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let mut session = session_for(&server);
        let reply = session.send_message("show me the API").await.unwrap();

        match reply {
            ModelReply::CapabilityRequest(call) => {
                assert_eq!(call.args["sectionId"], "code");
                assert_eq!(call.id, None);
            }
            other => panic!("expected capability request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_error_maps_to_remote_and_keeps_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED" }
            })))
            .mount(&server)
            .await;

        let mut session = session_for(&server);
        let err = session.send_message("hello").await.unwrap_err();

        match err {
            SessionError::Remote { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "RESOURCE_EXHAUSTED: Quota exceeded");
            }
            other => panic!("expected remote error, got {other:?}"),
        }
        assert_eq!(session.history_len(), 0);
    }

    #[tokio::test]
    async fn test_empty_candidates_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let mut session = session_for(&server);
        let err = session.send_message("hello").await.unwrap_err();

        assert_eq!(err.kind(), "malformed_response");
        assert_eq!(session.history_len(), 0);
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let mut session = session_for(&server);
        let err = session.send_message("hello").await.unwrap_err();
        assert_eq!(err.kind(), "malformed_response");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let mut session = GeminiSession::new("SECRET-KEY-123").with_base_url(uri);
        let err = session.send_message("hello").await.unwrap_err();
        assert_eq!(err.kind(), "transport");

        // Transport errors end up in the log file
        let rendered = format!("{err} {err:?}");
        assert!(!rendered.contains("SECRET-KEY-123"), "key leaked: {rendered}");
    }

    #[tokio::test]
    async fn test_unanswered_call_is_dropped_before_next_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(call_reply("pricing")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("Hi!")))
            .mount(&server)
            .await;

        let mut session = session_for(&server);
        session.send_message("show me pricing").await.unwrap();
        session.send_message("hi").await.unwrap();

        let bodies = request_bodies(&server).await;
        let contents = bodies[1]["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[0]["parts"][0]["text"], "hi");
        assert_eq!(session.history_len(), 2);
    }

    #[test]
    fn test_parse_reply_skips_thought_parts() {
        let content: Content = serde_json::from_value(json!({
            "role": "model",
            "parts": [
                { "text": "thinking about prices", "thought": true },
                { "text": "Standard is " },
                { "text": "32 UGX." }
            ]
        }))
        .unwrap();

        assert_eq!(
            parse_reply(&content).unwrap(),
            ModelReply::Direct("Standard is 32 UGX.".to_string())
        );
    }
}
