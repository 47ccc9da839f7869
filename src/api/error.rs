use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid response body: {0}")]
    Decode(#[from] std::io::Error),
}

impl ApiError {
    /// Text shown to the user: the server's own message for HTTP failures,
    /// the error description otherwise.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ureq::Error> for ApiError {
    fn from(error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(status, response) => {
                let body = response.into_string().unwrap_or_default();
                Self::Status {
                    status,
                    message: message_from_body(status, &body),
                }
            }
            ureq::Error::Transport(transport) => Self::Transport(transport.to_string()),
        }
    }
}

pub(crate) fn message_from_body(status: u16, body: &str) -> String {
    let structured = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["message", "error"].into_iter().find_map(|field| {
            value
                .get(field)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|message| !message.is_empty())
                .map(str::to_owned)
        })
    });

    if let Some(message) = structured {
        return message;
    }

    let raw = body.trim();
    if raw.is_empty() {
        format!("HTTP {status}")
    } else {
        raw.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_message_is_preferred() {
        let body = r#"{"code":409,"message":"Relation already exists"}"#;
        assert_eq!(message_from_body(409, body), "Relation already exists");
    }

    #[test]
    fn error_field_is_the_fallback() {
        assert_eq!(message_from_body(400, r#"{"error":"Label required"}"#), "Label required");
        assert_eq!(
            message_from_body(400, r#"{"message":"","error":"Unknown node"}"#),
            "Unknown node"
        );
    }

    #[test]
    fn raw_body_is_used_without_message_field() {
        assert_eq!(message_from_body(500, "  upstream timeout \n"), "upstream timeout");
        assert_eq!(
            message_from_body(400, r#"{"detail":"bad"}"#),
            r#"{"detail":"bad"}"#
        );
        assert_eq!(message_from_body(400, r#"{"message":"  "}"#), r#"{"message":"  "}"#);
    }

    #[test]
    fn empty_body_falls_back_to_status() {
        assert_eq!(message_from_body(502, ""), "HTTP 502");
    }

    #[test]
    fn user_message_strips_status_prefix() {
        let error = ApiError::Status {
            status: 404,
            message: "Node not found".to_owned(),
        };
        assert_eq!(error.user_message(), "Node not found");
        assert_eq!(error.status(), Some(404));
        assert_eq!(error.to_string(), "server returned 404: Node not found");

        let error = ApiError::Transport("connection refused".to_owned());
        assert_eq!(error.user_message(), "request failed: connection refused");
        assert_eq!(error.status(), None);
    }
}
