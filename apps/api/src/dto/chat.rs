use chatgate_application::{ChatRequest, ChatRequestKind, MissionContext};
use chatgate_domain::ClientId;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming chat turn.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/chat-turn-request.ts"
)]
pub struct ChatTurnRequest {
    /// Missing messages are validated as empty.
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub mission_id: Option<String>,
    #[serde(default)]
    pub step_id: Option<String>,
    #[serde(default)]
    pub context: Option<ChatContextRequest>,
    #[serde(default, rename = "type")]
    pub kind: Option<ChatRequestType>,
}

impl ChatTurnRequest {
    pub fn into_chat_request(self, client_id: ClientId) -> ChatRequest {
        ChatRequest {
            client_id,
            message: self.message,
            mission_id: self.mission_id,
            step_id: self.step_id,
            context: self.context.map(|context| MissionContext {
                mission_title: context.mission_title,
                step_title: context.step_title,
            }),
            kind: self.kind.map_or(ChatRequestKind::Normal, ChatRequestKind::from),
        }
    }
}

/// Mission titles attached to a help request.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/chat-context-request.ts"
)]
pub struct ChatContextRequest {
    #[serde(default)]
    pub mission_title: Option<String>,
    #[serde(default)]
    pub step_title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/chat-request-type.ts"
)]
pub enum ChatRequestType {
    MissionHelp,
    Normal,
}

impl From<ChatRequestType> for ChatRequestKind {
    fn from(value: ChatRequestType) -> Self {
        match value {
            ChatRequestType::MissionHelp => Self::MissionHelp,
            ChatRequestType::Normal => Self::Normal,
        }
    }
}

/// Reply served from the response cache.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/cached-chat-response.ts"
)]
pub struct CachedChatResponse {
    pub response: String,
    pub cached: bool,
}

/// Canned reply served while the model backend is unreachable.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/offline-chat-response.ts"
)]
pub struct OfflineChatResponse {
    pub response: String,
    pub is_offline: bool,
}

/// Body of an unexpected chat failure.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/chat-failure-response.ts"
)]
pub struct ChatFailureResponse {
    pub error: String,
    pub response: String,
}
