//! Transport-neutral descriptions of remote services, methods and messages.
//!
//! These are the JSON shapes the HTTP layer hands to a UI so it can render forms; the
//! wire names follow the camelCase convention that UI already speaks.
use serde::Serialize;

/// One remote service and its callable surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSchema {
    pub service_name: String,
    pub methods: Vec<MethodSummary>,
}

/// A method as listed in a [`ServiceSchema`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodSummary {
    pub name: String,
    pub full_name: String,
    pub input_type: String,
    pub output_type: String,
    /// True when either side streams. Streaming methods are discoverable but not
    /// invocable through this backend.
    pub is_streaming: bool,
}

/// The full detail of a single method, including its flattened input schema.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodSchema {
    pub service_name: String,
    pub method_name: String,
    pub full_name: String,
    pub input_type: String,
    pub output_type: String,
    pub input_details: MessageNode,
    pub is_streaming: bool,
}

/// A node of the recursive message description.
///
/// Within one descriptor walk any message appears at most once as a full node on a
/// root-to-leaf path; a second visit on the same path is represented by the circular
/// sentinel so self-referential schemas stay finite.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageNode {
    Message(Box<MessageSchema>),
    Circular(CircularRef),
}

/// Sentinel marking a message already visited on the current path.
#[derive(Debug, Clone, Serialize)]
pub struct CircularRef {
    pub message: String,
    pub circular: bool,
}

impl CircularRef {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            circular: true,
        }
    }
}

/// A message type flattened for form rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSchema {
    /// Fully qualified message name.
    pub message: String,
    /// Fields in declared order.
    pub fields: Vec<FieldSchema>,
    /// Messages declared inline within this message.
    pub nested_types: Vec<MessageNode>,
    /// Enums declared inline within this message.
    pub enum_types: Vec<EnumSchema>,
}

/// One field of a [`MessageSchema`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub name: String,
    pub number: u32,
    /// Descriptor-proto style type name, e.g. `TYPE_INT32` or `TYPE_MESSAGE`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Descriptor-proto style label, e.g. `LABEL_OPTIONAL` or `LABEL_REPEATED`.
    pub label: String,
    pub required: bool,
    pub repeated: bool,
    pub is_array: bool,
    /// Leading source-info comment of the field. Empty when the server strips
    /// source info from its descriptors, which most do.
    pub description: String,
    /// The primitive type name, or the fully qualified name for composites.
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested_message: Option<MessageNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<EnumValueSchema>>,
}

/// An enum declared inline within a message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumSchema {
    pub name: String,
    pub full_name: String,
    pub values: Vec<EnumValueSchema>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumValueSchema {
    pub name: String,
    pub number: i32,
}
