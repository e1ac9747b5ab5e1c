//! The one local capability the remote model may ask for, and the reply
//! shapes that carry such requests.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::SessionError;

pub const NAVIGATE_TO_SECTION: &str = "navigate_to_section";
pub const SECTION_ID_PARAM: &str = "sectionId";

/// Page sections the model is allowed to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionId {
    Hero,
    Features,
    Code,
    Pricing,
    Customers,
    Newsletter,
}

impl SectionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionId::Hero => "hero",
            SectionId::Features => "features",
            SectionId::Code => "code",
            SectionId::Pricing => "pricing",
            SectionId::Customers => "customers",
            SectionId::Newsletter => "newsletter",
        }
    }

    pub fn all() -> Vec<SectionId> {
        vec![
            SectionId::Hero,
            SectionId::Features,
            SectionId::Code,
            SectionId::Pricing,
            SectionId::Customers,
            SectionId::Newsletter,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SectionId::Hero => "Home",
            SectionId::Features => "Features",
            SectionId::Code => "Developers",
            SectionId::Pricing => "Pricing",
            SectionId::Customers => "Customers",
            SectionId::Newsletter => "Newsletter",
        }
    }
}

/// Schema-typed descriptor of a local function the model may request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityDeclaration {
    pub name: &'static str,
    pub description: &'static str,
    pub parameter: &'static str,
    pub parameter_description: &'static str,
    pub allowed_values: Vec<&'static str>,
}

impl CapabilityDeclaration {
    pub fn navigate_to_section() -> Self {
        Self {
            name: NAVIGATE_TO_SECTION,
            description: "Scrolls the website to a specific section when the user asks to see it.",
            parameter: SECTION_ID_PARAM,
            parameter_description: "The HTML ID of the section to scroll to.",
            allowed_values: SectionId::all().iter().map(|s| s.as_str()).collect(),
        }
    }

    /// OpenAPI-style parameter schema, as the Gemini API expects it.
    pub fn parameters_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        properties.insert(
            self.parameter.to_string(),
            json!({
                "type": "STRING",
                "description": self.parameter_description,
                "enum": self.allowed_values,
            }),
        );

        json!({
            "type": "OBJECT",
            "properties": properties,
            "required": [self.parameter],
        })
    }
}

/// A request from the model to run a named capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl CapabilityCall {
    /// The section the model asked to navigate to.
    ///
    /// Only the shape of the call is checked here. Whether the value is one of
    /// the enumerated sections is left to the page, which reports unknown ids
    /// as "not found".
    pub fn section_id(&self) -> Result<&str, SessionError> {
        if self.name != NAVIGATE_TO_SECTION {
            return Err(SessionError::InvalidCapability(format!(
                "unknown capability '{}'",
                self.name
            )));
        }

        self.args
            .get(SECTION_ID_PARAM)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SessionError::InvalidCapability(format!(
                    "'{}' is missing string argument '{}'",
                    self.name, SECTION_ID_PARAM
                ))
            })
    }
}

/// Result of a serviced capability, sent back to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityResponse {
    pub name: String,
    pub result: String,
    pub id: Option<String>,
}

impl CapabilityResponse {
    pub fn for_call(call: &CapabilityCall, result: impl Into<String>) -> Self {
        Self {
            name: call.name.clone(),
            result: result.into(),
            id: call.id.clone(),
        }
    }
}

/// One reply from the remote model.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    Direct(String),
    CapabilityRequest(CapabilityCall),
}
