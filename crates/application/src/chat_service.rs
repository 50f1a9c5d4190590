//! Chat orchestration: admission, backend completion, caching and fallback.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use chatgate_core::AppResult;
use chatgate_domain::ClientId;

use crate::{AdmissionDecision, AdmissionRejection, AdmissionRequest, AdmissionService};

/// Persona used when no system prompt is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Tu es un avatar IA amusant et bienveillant du projet NIRD. \
Tu représentes les valeurs de Numérique Inclusif Responsable Durable. \
Tu es enthousiaste, tu utilises parfois des emojis, et tu aimes aider les gens à comprendre \
comment contribuer à un numérique plus responsable. \
Sois court dans tes réponses (2-3 phrases max), amical et engageant. \
Tu peux parler de sujets variés mais ramène toujours vers NIRD et les missions disponibles. \
Réponds toujours en français.";

/// Replies served in rotation while the backend is unreachable.
pub const DEFAULT_FALLBACK_RESPONSES: [&str; 5] = [
    "🏴‍☠️ Arrgh ! Mon cerveau de pirate numérique a besoin d'être rechargé... Réessaie dans quelques instants !",
    "⚡ Mes circuits sont en cours de recalibrage ! Reviens bientôt pour une vraie conversation.",
    "🎃 Oups, je dois mettre à jour ma connexion neurale. Réessaie dans un instant !",
    "🔧 Mon équipe de rongeurs numériques répare mes connexions. Patience !",
    "🌊 Je suis parti en voyage pirate, reviens plus tard !",
];

/// Reply returned when the request fails unexpectedly.
pub const INTERNAL_ERROR_REPLY: &str = "😅 Oups, une erreur est survenue...";

/// Prompt handed to the language-model backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    /// System instructions.
    pub system: String,
    /// User turn.
    pub prompt: String,
}

/// Port for the language-model backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Generates a complete reply for the prompt.
    async fn complete(&self, prompt: &ChatPrompt) -> AppResult<String>;
}

/// Kind of chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatRequestKind {
    /// Help requested from inside a mission step.
    MissionHelp,
    /// Free conversation.
    #[default]
    Normal,
}

/// Mission titles shown to the model for mission help.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MissionContext {
    /// Title of the current mission.
    pub mission_title: Option<String>,
    /// Title of the current step.
    pub step_title: Option<String>,
}

/// Inbound chat request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// Identifier derived from transport metadata.
    pub client_id: ClientId,
    /// User message.
    pub message: String,
    /// Optional mission id, part of the cache key.
    pub mission_id: Option<String>,
    /// Optional step id, part of the cache key.
    pub step_id: Option<String>,
    /// Optional titles for prompt assembly.
    pub context: Option<MissionContext>,
    /// Turn kind.
    pub kind: ChatRequestKind,
}

/// Result of handling one chat request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// Request turned away before reaching the backend.
    Rejected(AdmissionRejection),
    /// Reply served from the cache.
    Cached(String),
    /// Fresh reply from the backend.
    Generated(String),
    /// Backend failed; a canned reply is returned instead.
    Offline(String),
}

/// Rotating set of canned replies.
#[derive(Debug)]
pub struct FallbackResponses {
    responses: Vec<String>,
    next: AtomicUsize,
}

impl FallbackResponses {
    /// Creates a rotation. An empty list falls back to the built-in replies.
    #[must_use]
    pub fn new(responses: Vec<String>) -> Self {
        let responses = if responses.is_empty() {
            DEFAULT_FALLBACK_RESPONSES
                .iter()
                .map(|response| (*response).to_owned())
                .collect()
        } else {
            responses
        };

        Self {
            responses,
            next: AtomicUsize::new(0),
        }
    }

    /// Returns the next reply in the rotation.
    #[must_use]
    pub fn next_response(&self) -> String {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.responses.len();
        self.responses[index].clone()
    }
}

impl Default for FallbackResponses {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Application service behind the chat endpoint.
#[derive(Clone)]
pub struct ChatService {
    admission_service: AdmissionService,
    backend: Arc<dyn ChatBackend>,
    system_prompt: String,
    fallback: Arc<FallbackResponses>,
}

impl ChatService {
    /// Creates the chat service.
    #[must_use]
    pub fn new(
        admission_service: AdmissionService,
        backend: Arc<dyn ChatBackend>,
        system_prompt: impl Into<String>,
        fallback: FallbackResponses,
    ) -> Self {
        Self {
            admission_service,
            backend,
            system_prompt: system_prompt.into(),
            fallback: Arc::new(fallback),
        }
    }

    /// Admits the request, then serves it from cache or the backend.
    ///
    /// Backend failures yield [`ChatOutcome::Offline`] and are never cached.
    /// A failed cache write is logged and the reply is still returned.
    pub async fn handle(&self, request: ChatRequest) -> AppResult<ChatOutcome> {
        let ChatRequest {
            client_id,
            message,
            mission_id,
            step_id,
            context,
            kind,
        } = request;

        let decision = self
            .admission_service
            .admit(AdmissionRequest {
                client_id: client_id.clone(),
                message,
                mission_id,
                step_id,
            })
            .await?;

        let (message, cache_key) = match decision {
            AdmissionDecision::Rejected(rejection) => return Ok(ChatOutcome::Rejected(rejection)),
            AdmissionDecision::CacheHit { response } => return Ok(ChatOutcome::Cached(response)),
            AdmissionDecision::Forward { message, cache_key } => (message, cache_key),
        };

        let prompt = ChatPrompt {
            system: self.system_prompt.clone(),
            prompt: build_user_prompt(&message, kind, context.as_ref()),
        };

        let response = match self.backend.complete(&prompt).await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(%client_id, error = %error, "chat backend failed, serving fallback");
                return Ok(ChatOutcome::Offline(self.fallback.next_response()));
            }
        };

        if let Err(error) = self.admission_service.remember(cache_key.clone(), &response).await {
            tracing::warn!(%cache_key, error = %error, "failed to cache chat response");
        }

        Ok(ChatOutcome::Generated(response))
    }
}

/// Builds the user turn, prefixing mission titles for mission help.
#[must_use]
pub fn build_user_prompt(
    message: &str,
    kind: ChatRequestKind,
    context: Option<&MissionContext>,
) -> String {
    let Some(context) = context.filter(|_| kind == ChatRequestKind::MissionHelp) else {
        return message.to_owned();
    };

    let mut prompt = String::new();
    if let Some(title) = context.mission_title.as_deref().filter(|title| !title.is_empty()) {
        prompt.push_str(&format!("Mission : {title}\n"));
    }
    if let Some(title) = context.step_title.as_deref().filter(|title| !title.is_empty()) {
        prompt.push_str(&format!("Étape : {title}\n"));
    }
    if !prompt.is_empty() {
        prompt.push('\n');
    }
    prompt.push_str(message);
    prompt
}
