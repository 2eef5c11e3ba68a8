use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::{Session, SessionManager};
use crate::config::Credentials;
use crate::utils::cookies;
use crate::{Error, Result};

/// `RESULT` value the login endpoint returns on success.
const LOGIN_OK: i64 = 1;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(rename = "RESULT")]
    result: Option<i64>,
}

/// Session manager backed by the AfreecaTV login endpoint.
pub struct AfreecaSessionManager {
    client: Client,
    login_url: String,
}

impl AfreecaSessionManager {
    pub fn new(client: Client, login_url: impl Into<String>) -> Self {
        Self {
            client,
            login_url: login_url.into(),
        }
    }
}

#[async_trait]
impl SessionManager for AfreecaSessionManager {
    async fn acquire_session(&self, credentials: &Credentials) -> Result<Session> {
        debug!(user = %credentials.username(), "Logging in");

        let form = [
            ("szWork", "login"),
            ("szType", "json"),
            ("szUid", credentials.username()),
            ("szPassword", credentials.password()),
            ("isSaveId", "true"),
            ("isSavePw", "false"),
            ("isSaveJoin", "false"),
            ("isLoginRetain", "Y"),
        ];

        let response = self
            .client
            .post(&self.login_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::auth(format!("login request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::auth(format!("login endpoint returned HTTP {status}")));
        }

        let session_cookies = cookies::parse_set_cookies(response.headers());

        let body = response
            .text()
            .await
            .map_err(|e| Error::auth(format!("failed to read login response: {e}")))?;

        // The body is informative only; an unparsable body still counts if
        // cookies came back.
        if let Ok(LoginResponse { result: Some(code) }) = serde_json::from_str(&body) {
            if code != LOGIN_OK {
                return Err(Error::auth(format!(
                    "login rejected by platform (RESULT {code})"
                )));
            }
        }

        if session_cookies.is_empty() {
            return Err(Error::auth("login returned no session cookies"));
        }

        info!(
            user = %credentials.username(),
            cookies = session_cookies.len(),
            "Acquired new session"
        );
        Ok(Session::new(session_cookies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::http_client::build_platform_client;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> Credentials {
        Credentials::new("alice", "hunter2")
    }

    fn manager(server: &MockServer) -> AfreecaSessionManager {
        AfreecaSessionManager::new(
            build_platform_client(Duration::from_secs(5)),
            format!("{}/app/LoginAction.php", server.uri()),
        )
    }

    #[tokio::test]
    async fn test_login_collects_cookies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/app/LoginAction.php"))
            .and(body_string_contains("szUid=alice"))
            .and(body_string_contains("szWork=login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "PdboxTicket=ticket; path=/")
                    .append_header("set-cookie", "PdboxUser=alice; path=/")
                    .set_body_string(r#"{"RESULT":1}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let session = manager(&server)
            .acquire_session(&credentials())
            .await
            .unwrap();
        assert_eq!(
            session.cookie_header(),
            "PdboxTicket=ticket; PdboxUser=alice"
        );
    }

    #[tokio::test]
    async fn test_rejected_result_code_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "_au=guest; path=/")
                    .set_body_string(r#"{"RESULT":-1}"#),
            )
            .mount(&server)
            .await;

        let err = manager(&server)
            .acquire_session(&credentials())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_missing_cookies_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let err = manager(&server)
            .acquire_session(&credentials())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_http_failure_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = manager(&server)
            .acquire_session(&credentials())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_auth_error() {
        // Nothing listens on the discard port.
        let manager = AfreecaSessionManager::new(
            build_platform_client(Duration::from_secs(5)),
            "http://127.0.0.1:9/login",
        );
        let err = manager.acquire_session(&credentials()).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }
}
