//! Tool schemas, calls, and streaming reassembly

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Declarative schema for a callable tool
///
/// `parameters` is a JSON-schema-shaped object, passed through to the
/// gateway untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolSchema {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Wire representation in the chat-completions function-calling format
    pub fn to_wire(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// A structured tool invocation requested by the assistant
///
/// `arguments` is the raw JSON string exactly as produced by the model.
/// During streaming it is assembled across fragments; see
/// [`ToolCallAssembly`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Decode the arguments string as a JSON value
    pub fn parsed_arguments(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.arguments)
    }
}

/// Audit record of an executed tool call, kept on the response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub name: String,
    pub args: serde_json::Value,
    pub result_preview: String,
}

impl ToolCallRecord {
    /// Maximum preview length kept on the record
    const PREVIEW_LEN: usize = 200;

    pub fn new(name: impl Into<String>, args: serde_json::Value, result: &str) -> Self {
        let preview = if result.chars().count() > Self::PREVIEW_LEN {
            let cut: String = result.chars().take(Self::PREVIEW_LEN).collect();
            format!("{cut}...")
        } else {
            result.to_string()
        };
        Self {
            name: name.into(),
            args,
            result_preview: preview,
        }
    }
}

/// Accumulates streaming tool-call fragments into complete [`ToolCall`]s
///
/// Fragments arrive keyed by the delta `index`. `id` and `name` latch on
/// first appearance; argument fragments concatenate in arrival order.
#[derive(Debug, Default)]
pub struct ToolCallAssembly {
    slots: BTreeMap<u32, PartialCall>,
}

#[derive(Debug, Default)]
struct PartialCall {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

impl ToolCallAssembly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one fragment into the assembly
    pub fn absorb(&mut self, index: u32, id: Option<&str>, name: Option<&str>, fragment: &str) {
        let slot = self.slots.entry(index).or_default();
        if slot.id.is_none()
            && let Some(id) = id
        {
            slot.id = Some(id.to_string());
        }
        if slot.name.is_none()
            && let Some(name) = name
        {
            slot.name = Some(name.to_string());
        }
        slot.arguments.push_str(fragment);
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Finish assembly, yielding calls in index order
    ///
    /// A slot that never received a name cannot be dispatched and is dropped.
    /// A slot that never received an id gets a synthetic `call_{index}` one so
    /// the result message can still be bound.
    pub fn finish(self) -> Vec<ToolCall> {
        self.slots
            .into_iter()
            .filter_map(|(index, slot)| {
                let name = slot.name?;
                let id = slot.id.unwrap_or_else(|| format!("call_{index}"));
                Some(ToolCall::new(id, name, slot.arguments))
            })
            .collect()
    }
}
