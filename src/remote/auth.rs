//! Sign-in and registration.
//!
//! Credentials come from an external identity provider (email/password
//! sign-in over REST) or are injected directly. Registration is an
//! unauthenticated store route.

use serde::{Deserialize, Serialize};

use super::{Auth, RemoteClient, Result, SyncError};

/// Identity provider password sign-in endpoint; `?key=` is appended per call.
pub const DEFAULT_SIGN_IN_URL: &str =
    "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword";

/// Bearer credential plus the user it identifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub id_token: String,
    pub user_id: String,
    pub display_name: Option<String>,
}

impl Credentials {
    pub fn new(id_token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            id_token: id_token.into(),
            user_id: user_id.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// `POST /register` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisteredUser {
    pub name: String,
    pub email: String,
    pub uid: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInBody<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
    local_id: String,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

impl RemoteClient {
    /// Sign in with email/password and bind the returned credential.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Credentials> {
        let mut url = self.sign_in_url.clone();
        url.query_pairs_mut().append_pair("key", &self.api_key);

        let body = SignInBody {
            email,
            password,
            return_secure_token: true,
        };
        let request = self.http.post(url).json(&body);
        let text = self.execute(request).await?;
        let resp: SignInResponse = serde_json::from_str(&text)?;

        let credentials = Credentials {
            id_token: resp.id_token,
            user_id: resp.local_id,
            display_name: resp.display_name.filter(|n| !n.is_empty()),
        };
        self.set_credentials(credentials.clone());
        crate::debug!("auth"; "signed in as {}", credentials.user_id);
        Ok(credentials)
    }

    /// Inject a credential obtained elsewhere.
    pub fn set_auth(&self, id_token: &str, user_id: &str) {
        self.set_credentials(Credentials::new(id_token, user_id));
    }

    /// Create an account on the store. Does not sign in.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisteredUser> {
        let body = RegisterBody {
            name,
            email,
            password,
        };
        let text = self.post_json("register", &body, Auth::None).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Register, then sign in so protected routes are usable.
    pub async fn register_and_sign_in(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(RegisteredUser, Credentials)> {
        let user = self.register(name, email, password).await?;
        let credentials = self.sign_in(email, password).await?;
        Ok((user, credentials))
    }
}

/// Human-readable sign-in failure.
pub fn describe_sign_in_error(err: &SyncError) -> String {
    let detail = err.to_string();
    if detail.contains("EMAIL_NOT_FOUND") {
        "No account found for this email.".to_string()
    } else if detail.contains("INVALID_PASSWORD") {
        "Incorrect password.".to_string()
    } else if detail.contains("TOO_MANY_ATTEMPTS_TRY_LATER") {
        "Too many attempts. Try again later.".to_string()
    } else {
        format!("Could not sign in. {detail}")
    }
}
