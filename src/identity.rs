//! Identity collaborator (hosted auth, OAuth redirect flow).
//!
//! The quiz core only ever consumes a stable user id; everything here exists to turn a
//! bearer token into that id, or to hand the client the URLs it needs to sign in and out.

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::ServiceError;

const SERVICE: &str = "identity";

/// Caller id used when hosted auth is not configured and no `X-User-Id` is sent.
pub const GUEST_USER: &str = "guest";

/// A resolved caller: the stable user id plus, when signed in, the session token that
/// hosted persistence needs for row-level access.
#[derive(Clone, PartialEq, Eq)]
pub struct Caller {
  pub user_id: String,
  pub access_token: Option<String>,
}

impl Caller {
  /// Caller named by header or defaulted, with no session.
  pub fn local(user_id: impl Into<String>) -> Self {
    Self { user_id: user_id.into(), access_token: None }
  }

  pub fn signed_in(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
    Self { user_id: user_id.into(), access_token: Some(access_token.into()) }
  }
}

// Tokens stay out of logs and test output.
impl std::fmt::Debug for Caller {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Caller")
      .field("user_id", &self.user_id)
      .field("signed_in", &self.access_token.is_some())
      .finish()
  }
}

#[derive(Clone)]
pub struct SupabaseAuth {
  client: reqwest::Client,
  auth_url: String,
  authorize: reqwest::Url,
  anon_key: String,
}

#[derive(Deserialize)]
struct AuthUser {
  id: String,
}

impl SupabaseAuth {
  pub fn from_env() -> Option<Self> {
    let url = std::env::var("SUPABASE_URL").ok().filter(|u| !u.trim().is_empty())?;
    let key = std::env::var("SUPABASE_ANON_KEY").ok().filter(|k| !k.trim().is_empty())?;
    Self::new(&url, key)
  }

  pub fn new(base_url: &str, anon_key: String) -> Option<Self> {
    let client = reqwest::Client::builder()
      .timeout(std::time::Duration::from_secs(10))
      .build()
      .ok()?;
    let auth_url = format!("{}/auth/v1", base_url.trim_end_matches('/'));
    let authorize = reqwest::Url::parse(&format!("{auth_url}/authorize")).ok()?;
    Some(Self { client, auth_url, authorize, anon_key })
  }

  /// Where the browser should go to start the Google sign-in redirect. An empty
  /// `redirect_to` leaves the choice to the provider's configured site URL.
  pub fn authorize_url(&self, redirect_to: &str) -> String {
    let mut url = self.authorize.clone();
    {
      let mut query = url.query_pairs_mut();
      query.append_pair("provider", "google");
      let redirect_to = redirect_to.trim();
      if !redirect_to.is_empty() {
        query.append_pair("redirect_to", redirect_to);
      }
    }
    url.into()
  }

  /// Resolve a session access token to the provider's user id.
  #[instrument(level = "debug", skip(self, token), fields(token_len = token.len()))]
  pub async fn user_id(&self, token: &str) -> Result<String, ServiceError> {
    let res = self.client.get(format!("{}/user", self.auth_url))
      .header("apikey", &self.anon_key)
      .bearer_auth(token)
      .send().await.map_err(|e| ServiceError::http(SERVICE, e))?;
    match res.status().as_u16() {
      200..=299 => {}
      401 | 403 => return Err(ServiceError::Unauthorized),
      _ => return Err(ServiceError::from_response(SERVICE, res).await),
    }
    let user: AuthUser = res.json().await.map_err(|e| ServiceError::decode(SERVICE, e))?;
    debug!(target: "identity", user_id = %user.id, "Token resolved");
    Ok(user.id)
  }

  #[instrument(level = "debug", skip(self, token))]
  pub async fn sign_out(&self, token: &str) -> Result<(), ServiceError> {
    let res = self.client.post(format!("{}/logout", self.auth_url))
      .header("apikey", &self.anon_key)
      .bearer_auth(token)
      .send().await.map_err(|e| ServiceError::http(SERVICE, e))?;
    if res.status().is_success() {
      Ok(())
    } else {
      Err(ServiceError::from_response(SERVICE, res).await)
    }
  }
}

/// Extract the token from an `Authorization: Bearer <token>` value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
  let value = header?.trim();
  let (scheme, token) = value.split_once(' ')?;
  if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
    Some(token.trim())
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn authorize_url_encodes_redirect() {
    let auth = SupabaseAuth::new("https://demo.supabase.co", "anon".into()).unwrap();
    assert_eq!(
      auth.authorize_url("http://localhost:3000/home?x=1"),
      "https://demo.supabase.co/auth/v1/authorize?provider=google&redirect_to=http%3A%2F%2Flocalhost%3A3000%2Fhome%3Fx%3D1"
    );
    assert_eq!(auth.authorize_url(""), "https://demo.supabase.co/auth/v1/authorize?provider=google");
    assert_eq!(
      auth.authorize_url("http://x/a b"),
      "https://demo.supabase.co/auth/v1/authorize?provider=google&redirect_to=http%3A%2F%2Fx%2Fa+b"
    );
  }

  #[test]
  fn invalid_project_url_disables_auth() {
    assert!(SupabaseAuth::new("not a url", "anon".into()).is_none());
  }

  #[test]
  fn caller_debug_hides_the_token() {
    let caller = Caller::signed_in("u1", "secret-token");
    let shown = format!("{caller:?}");
    assert!(shown.contains("u1"));
    assert!(!shown.contains("secret-token"));
  }

  #[test]
  fn bearer_parsing() {
    assert_eq!(bearer_token(Some("Bearer abc")), Some("abc"));
    assert_eq!(bearer_token(Some("bearer  abc ")), Some("abc"));
    assert_eq!(bearer_token(Some("Basic abc")), None);
    assert_eq!(bearer_token(Some("Bearer ")), None);
    assert_eq!(bearer_token(None), None);
  }
}
