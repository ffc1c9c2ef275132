use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl, basic::BasicClient,
};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::ServiceError};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const GOOGLE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/userinfo.email",
];

/// Profile returned by the provider's user-info endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoogleUserInfo {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// External identity provider used by the Google sign-in flow
pub trait IdentityProvider {
    /// Consent page URL carrying `state`
    fn authorization_url(&self, state: &str) -> Result<String, ServiceError>;

    /// Trade an authorization code for the signed-in user's profile
    async fn fetch_user_info(&self, code: &str) -> Result<GoogleUserInfo, ServiceError>;
}

/// Outbound HTTP client, configured for the Google OAuth endpoints
///
/// Cloning is cheap; `reqwest::Client` is reference counted. Redirects are
/// never followed so a token endpoint cannot bounce credentials elsewhere.
#[derive(Clone)]
pub struct HttpClient {
    pub conn: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
    user_info_url: String,
}

fn upstream(context: &str, e: impl std::fmt::Display) -> ServiceError {
    tracing::error!("{}: {}", context, e);
    ServiceError::Upstream(format!("{}: {}", context, e))
}

impl HttpClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let conn = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            conn,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_url: config.google_redirect_url.clone(),
            user_info_url: config.google_user_info_url.clone(),
        })
    }

    fn redirect_uri(&self) -> Result<RedirectUrl, ServiceError> {
        RedirectUrl::new(self.redirect_url.clone()).map_err(|e| upstream("Invalid redirect URL", e))
    }

    async fn exchange_code(&self, code: &str) -> Result<String, ServiceError> {
        let token_url = TokenUrl::new(GOOGLE_TOKEN_URL.to_string())
            .map_err(|e| upstream("Invalid token URL", e))?;

        let client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_token_uri(token_url)
            .set_redirect_uri(self.redirect_uri()?);

        let token = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.conn)
            .await
            .map_err(|e| upstream("Token exchange failed", e))?;

        Ok(token.access_token().secret().clone())
    }
}

impl IdentityProvider for HttpClient {
    fn authorization_url(&self, state: &str) -> Result<String, ServiceError> {
        let auth_url =
            AuthUrl::new(GOOGLE_AUTH_URL.to_string()).map_err(|e| upstream("Invalid auth URL", e))?;

        let client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_redirect_uri(self.redirect_uri()?);

        let state = state.to_string();
        let mut request = client.authorize_url(move || CsrfToken::new(state));
        for scope in GOOGLE_SCOPES {
            request = request.add_scope(Scope::new((*scope).to_string()));
        }

        let (url, _csrf) = request.url();
        Ok(url.to_string())
    }

    async fn fetch_user_info(&self, code: &str) -> Result<GoogleUserInfo, ServiceError> {
        let access_token = self.exchange_code(code).await?;

        let response = self
            .conn
            .get(&self.user_info_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| upstream("User info request failed", e))?
            .error_for_status()
            .map_err(|e| upstream("User info request rejected", e))?;

        response
            .json::<GoogleUserInfo>()
            .await
            .map_err(|e| upstream("User info decode failed", e))
    }
}
