use axum::http::{HeaderMap, header};
use chatgate_domain::ClientId;
use uuid::Uuid;

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Derives the caller's identifier from forwarding headers and the session cookie.
pub fn client_id_from_headers(headers: &HeaderMap) -> ClientId {
    ClientId::from_request_metadata(
        header_str(headers, "x-forwarded-for"),
        header_str(headers, "x-real-ip"),
        headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok()),
        || format!("session-{}", Uuid::new_v4()),
    )
}
