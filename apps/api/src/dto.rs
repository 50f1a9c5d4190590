mod chat;
mod common;
mod monitoring;

pub use chat::{
    CachedChatResponse, ChatContextRequest, ChatFailureResponse, ChatRequestType,
    ChatTurnRequest, OfflineChatResponse,
};
pub use common::HealthResponse;
pub use monitoring::{
    AbuseEventResponse, AbuseLogsResponse, AbuseStatsResponse, MonitoringDescriptionResponse,
    MonitoringQuery, TopAbuserResponse,
};
