//! Client error type.

use pingspot_domain::LifecycleError;

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a usable response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body.
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },

    /// A lifecycle rule refused the action, locally or on the server.
    #[error(transparent)]
    Rejected(#[from] LifecycleError),

    /// The report is not in the local state.
    #[error("Report {0} is not loaded")]
    UnknownReport(i64),

    /// The action needs a signed-in user.
    #[error("Sign in to do this")]
    NotSignedIn,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    /// Build from an API error body, recognising lifecycle rule codes.
    #[must_use]
    pub fn from_api(code: String, message: String) -> Self {
        match LifecycleError::from_code(&code) {
            Some(rule) => Self::Rejected(rule),
            None => Self::Api { code, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_codes_become_rejections() {
        let err = ClientError::from_api(
            "CANNOT_VOTE_OWN_REPORT".to_string(),
            "You cannot vote on your own report".to_string(),
        );
        assert!(matches!(err, ClientError::Rejected(LifecycleError::OwnReport)));

        let err = ClientError::from_api("DATABASE_ERROR".to_string(), "down".to_string());
        assert!(matches!(err, ClientError::Api { ref code, .. } if code == "DATABASE_ERROR"));
    }
}
