use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chatgate_application::{AdmissionRejection, ChatOutcome, INTERNAL_ERROR_REPLY};

use crate::dto::{CachedChatResponse, ChatFailureResponse, ChatTurnRequest, OfflineChatResponse};
use crate::error::ErrorResponse;
use crate::request_context::client_id_from_headers;
use crate::state::AppState;

pub async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatTurnRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::error!(error = %rejection, "chat request body rejected");
            return failure_response();
        }
    };

    let client_id = client_id_from_headers(&headers);
    match state
        .chat_service
        .handle(payload.into_chat_request(client_id))
        .await
    {
        Ok(outcome) => outcome_response(outcome),
        Err(error) => {
            tracing::error!(error = %error, "chat request failed");
            failure_response()
        }
    }
}

fn outcome_response(outcome: ChatOutcome) -> Response {
    match outcome {
        ChatOutcome::Rejected(rejection) => rejection_response(&rejection),
        ChatOutcome::Cached(response) => Json(CachedChatResponse {
            response,
            cached: true,
        })
        .into_response(),
        ChatOutcome::Generated(response) => (
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            )],
            response,
        )
            .into_response(),
        ChatOutcome::Offline(response) => Json(OfflineChatResponse {
            response,
            is_offline: true,
        })
        .into_response(),
    }
}

fn rejection_response(rejection: &AdmissionRejection) -> Response {
    let payload = Json(ErrorResponse::new(rejection.message()));
    match rejection {
        AdmissionRejection::RateLimited {
            retry_after_seconds,
        } => {
            let mut response = (StatusCode::TOO_MANY_REQUESTS, payload).into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after_seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
        AdmissionRejection::InvalidContent { .. } => {
            (StatusCode::BAD_REQUEST, payload).into_response()
        }
    }
}

fn failure_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ChatFailureResponse {
            error: "Failed to generate response".to_owned(),
            response: INTERNAL_ERROR_REPLY.to_owned(),
        }),
    )
        .into_response()
}
