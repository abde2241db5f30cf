//! Sign-in against the backend's auth endpoint and resolution of the
//! caller's profile.
//!
//! A successful sign-in yields an [`AuthSession`]: the access token used
//! for subsequent table requests and the caller's [`Profile`], from which
//! the [`Identity`] handed to the data-access objects is derived.

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Profile, Role};
use crate::session::{Identity, SessionState};
use crate::store::{decode_rows, Filter, Query, RemoteStore, RestStore, Select, StoreError};

/// Errors that can occur while signing in or up.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The auth endpoint could not be reached.
    #[error("HTTP error: {0}")]
    Http(String),
    /// The auth endpoint refused the credentials or the request.
    #[error("{0}")]
    Rejected(String),
    /// Sign-up succeeded but the account must be confirmed by email before
    /// a session is issued.
    #[error("Check {0} for a confirmation link before signing in")]
    ConfirmationPending(String),
    /// The user exists but has no profile row.
    #[error("No profile found for user {0}")]
    MissingProfile(Uuid),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    user: Option<AuthUser>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AuthErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

/// A signed-in user.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    pub profile: Profile,
}

impl AuthSession {
    pub fn identity(&self) -> Identity {
        Identity::from(&self.profile)
    }

    pub fn state(&self) -> SessionState {
        SessionState::SignedIn(self.identity())
    }
}

/// Client for `{base_url}/auth/v1`.
pub struct AuthClient {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    /// Table store that acts as the signed-in user.
    pub fn store_for(&self, session: &AuthSession) -> RestStore {
        RestStore::new(&self.base_url, &self.anon_key).with_access_token(&session.access_token)
    }

    /// Signs in with email and password and loads the caller's profile.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let token = self.post_credentials(&url, email, password).await?;

        let (access_token, user) = match (token.access_token, token.user) {
            (Some(access_token), Some(user)) => (access_token, user),
            _ => return Err(AuthError::Rejected("Sign-in returned no session".to_string())),
        };

        let store = RestStore::new(&self.base_url, &self.anon_key).with_access_token(&access_token);
        let profile = load_profile(&store, user.id).await?;
        tracing::info!(user_id = %profile.id, role = %profile.role, "signed in");

        Ok(AuthSession {
            access_token,
            profile,
        })
    }

    /// Creates an account and its profile row with the chosen role.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: Role,
    ) -> Result<AuthSession, AuthError> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        let token = self.post_credentials(&url, email, password).await?;

        let Some(access_token) = token.access_token else {
            return Err(AuthError::ConfirmationPending(email.to_string()));
        };
        let user = token
            .user
            .ok_or_else(|| AuthError::Rejected("Sign-up returned no user".to_string()))?;

        let store = RestStore::new(&self.base_url, &self.anon_key).with_access_token(&access_token);
        let profile = create_profile(&store, user.id, email, full_name, role).await?;
        tracing::info!(user_id = %profile.id, role = %profile.role, "signed up");

        Ok(AuthSession {
            access_token,
            profile,
        })
    }

    async fn post_credentials(
        &self,
        url: &str,
        email: &str,
        password: &str,
    ) -> Result<TokenResponse, AuthError> {
        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body: AuthErrorBody = response.json().await.unwrap_or_default();
            let message = body
                .error_description
                .or(body.msg)
                .or(body.message)
                .or(body.error)
                .unwrap_or_else(|| format!("Server returned status {}", status));
            return Err(AuthError::Rejected(message));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))
    }
}

/// Reads the profile row for `user_id`.
pub async fn load_profile(store: &dyn RemoteStore, user_id: Uuid) -> Result<Profile, AuthError> {
    let rows = store
        .select("profiles", &Query::new().filter(Filter::id(user_id)))
        .await?;
    decode_rows::<Profile>(rows)?
        .into_iter()
        .next()
        .ok_or(AuthError::MissingProfile(user_id))
}

/// Inserts the profile row for a newly signed-up user.
pub async fn create_profile(
    store: &dyn RemoteStore,
    user_id: Uuid,
    email: &str,
    full_name: &str,
    role: Role,
) -> Result<Profile, AuthError> {
    let row = json!({
        "id": user_id,
        "email": email,
        "full_name": full_name,
        "role": role,
    });
    let stored = store.insert("profiles", row, &Select::all()).await?;
    Ok(serde_json::from_value(stored).map_err(StoreError::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::Value;

    const USER_ID: &str = "5a0e8b1e-2f0b-4c7e-8e0a-0c4f7d5c9b22";

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn profile_row() -> Value {
        json!({
            "id": USER_ID,
            "email": "vaidya@example.com",
            "full_name": "Dr. Anjali Rao",
            "role": "doctor",
            "created_at": "2024-01-15T10:00:00Z",
            "updated_at": "2024-01-15T10:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_sign_in_resolves_identity() {
        let app = Router::new()
            .route(
                "/auth/v1/token",
                post(|Json(body): Json<Value>| async move {
                    if body["password"] != "secret" {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})),
                        );
                    }
                    (
                        StatusCode::OK,
                        Json(json!({"access_token": "jwt-1", "user": {"id": USER_ID}})),
                    )
                }),
            )
            .route(
                "/rest/v1/profiles",
                get(|| async { Json(json!([profile_row()])) }),
            );
        let base = serve(app).await;
        let client = AuthClient::new(base, "anon");

        let session = client.sign_in("vaidya@example.com", "secret").await.unwrap();
        assert_eq!(session.access_token, "jwt-1");
        assert_eq!(session.profile.full_name, "Dr. Anjali Rao");
        assert!(session.identity().is_doctor());
        assert_eq!(session.state().identity().unwrap().id.to_string(), USER_ID);
    }

    #[tokio::test]
    async fn test_sign_in_with_wrong_password() {
        let app = Router::new().route(
            "/auth/v1/token",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})),
                )
            }),
        );
        let base = serve(app).await;
        let client = AuthClient::new(base, "anon");

        let err = client.sign_in("vaidya@example.com", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_sign_up_without_session_needs_confirmation() {
        let app = Router::new().route(
            "/auth/v1/signup",
            post(|| async { Json(json!({"user": {"id": USER_ID}})) }),
        );
        let base = serve(app).await;
        let client = AuthClient::new(base, "anon");

        let err = client
            .sign_up("new@example.com", "secret", "New Patient", Role::Patient)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ConfirmationPending(ref email) if email == "new@example.com"));
    }

    #[tokio::test]
    async fn test_load_profile_missing() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let err = load_profile(&store, user_id).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingProfile(id) if id == user_id));
    }

    #[tokio::test]
    async fn test_create_profile_then_load() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let created = create_profile(&store, user_id, "priya@example.com", "Priya Sharma", Role::Patient)
            .await
            .unwrap();
        assert_eq!(created.role, Role::Patient);

        let loaded = load_profile(&store, user_id).await.unwrap();
        assert_eq!(loaded, created);
    }
}
