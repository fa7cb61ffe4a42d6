//! Application state: collaborators, settings and the active-round registry.
//!
//! This module owns:
//!   - the progress store (hosted when configured, in-memory otherwise)
//!   - the optional identity provider and OpenAI client
//!   - prompts and quiz timing (from TOML or defaults)
//!   - the registry of active rounds
//!
//! Collaborator failures are logged here and turned into benign defaults, so callers never
//! see a persistence or identity outage as anything worse than "no data".

use std::sync::Arc;

use axum::http::HeaderMap;
use tracing::{error, info, instrument, warn};

use crate::config::{load_app_config_from_env, AppConfig, Prompts, QuizSettings};
use crate::domain::{Profile, RoundResult};
use crate::error::{ApiError, ServiceError};
use crate::identity::{bearer_token, Caller, SupabaseAuth, GUEST_USER};
use crate::openai::OpenAI;
use crate::rounds::RoundRegistry;
use crate::store::{KeyRole, MemoryStore, ProgressStore, SupabaseStore};

/// Header naming the learner when hosted auth is disabled.
pub const USER_HEADER: &str = "x-user-id";

pub struct AppState {
    pub store: Arc<dyn ProgressStore>,
    pub auth: Option<SupabaseAuth>,
    pub openai: Option<OpenAI>,
    pub prompts: Prompts,
    pub quiz: QuizSettings,
    pub rounds: RoundRegistry,
}

impl AppState {
    /// Build state from env: load config, pick the store, init identity and OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_app_config_from_env().unwrap_or_default();

        let auth = SupabaseAuth::from_env();
        if auth.is_some() {
            info!(target: "pintarcilik", "Hosted sign-in enabled.");
        } else {
            info!(target: "pintarcilik", "Hosted sign-in disabled; callers identified by X-User-Id or as guest.");
        }

        let store: Arc<dyn ProgressStore> = match SupabaseStore::from_env() {
            Some(s) => {
                if s.role() == KeyRole::Anon && auth.is_none() {
                    warn!(
                        target: "pintarcilik",
                        "Persistence uses the anon key without sign-in; row-level policies on auth.uid() will reject reads and writes. Set SUPABASE_SERVICE_ROLE_KEY."
                    );
                }
                Arc::new(s)
            }
            None => {
                warn!(target: "pintarcilik", "SUPABASE_URL/key not set; progress is kept in memory only.");
                Arc::new(MemoryStore::new())
            }
        };

        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "pintarcilik", base_url = %oa.base_url, report_model = %oa.report_model, "OpenAI enabled.");
        } else {
            info!(target: "pintarcilik", "OpenAI disabled (no OPENAI_API_KEY). Reports use the fallback text.");
        }

        Self::with_parts(store, auth, openai, cfg)
    }

    pub fn with_parts(
        store: Arc<dyn ProgressStore>,
        auth: Option<SupabaseAuth>,
        openai: Option<OpenAI>,
        cfg: AppConfig,
    ) -> Self {
        info!(
            target: "pintarcilik",
            store = store.name(),
            feedback_delay_ms = cfg.quiz.feedback_delay_ms,
            report_window = cfg.quiz.report_window,
            "State ready"
        );
        Self {
            store,
            auth,
            openai,
            prompts: cfg.prompts,
            quiz: cfg.quiz,
            rounds: RoundRegistry::new(),
        }
    }

    /// Resolve the caller from request headers (see `resolve_caller`).
    pub async fn identify(&self, headers: &HeaderMap) -> Result<Caller, ApiError> {
        let authorization = headers.get("authorization").and_then(|v| v.to_str().ok());
        let user_hint = headers.get(USER_HEADER).and_then(|v| v.to_str().ok());
        self.resolve_caller(bearer_token(authorization), user_hint).await
    }

    /// With hosted auth, a valid access token is required and is kept on the caller for
    /// persistence. Without it, the caller names itself via `user_hint` or is the shared guest.
    #[instrument(level = "debug", skip(self, token, user_hint), fields(has_token = token.is_some()))]
    pub async fn resolve_caller(&self, token: Option<&str>, user_hint: Option<&str>) -> Result<Caller, ApiError> {
        let Some(auth) = &self.auth else {
            let user = user_hint.map(str::trim).filter(|u| !u.is_empty()).unwrap_or(GUEST_USER);
            return Ok(Caller::local(user));
        };
        let token = token.ok_or(ApiError::Unauthorized)?;
        match auth.user_id(token).await {
            Ok(id) => Ok(Caller::signed_in(id, token)),
            Err(ServiceError::Unauthorized) => Err(ApiError::Unauthorized),
            Err(e) => {
                error!(target: "identity", error = %e, "Token resolution failed");
                Err(ApiError::Unavailable("identity provider unavailable".into()))
            }
        }
    }

    /// Round history in chronological order; empty on any persistence failure.
    #[instrument(level = "debug", skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn load_history(&self, caller: &Caller) -> Vec<RoundResult> {
        match self.store.history(caller).await {
            Ok(h) => h,
            Err(e) => {
                error!(target: "store", store = self.store.name(), user_id = %caller.user_id, error = %e, "History fetch failed; treating as empty");
                Vec::new()
            }
        }
    }

    /// The learner's profile; absent on any persistence failure.
    #[instrument(level = "debug", skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn load_profile(&self, caller: &Caller) -> Option<Profile> {
        match self.store.profile(caller).await {
            Ok(p) => p,
            Err(e) => {
                error!(target: "store", store = self.store.name(), user_id = %caller.user_id, error = %e, "Profile fetch failed; treating as absent");
                None
            }
        }
    }

    /// Persist a profile. A failed write is logged; the caller still gets the profile back.
    pub async fn save_profile(&self, caller: &Caller, profile: &Profile) {
        if let Err(e) = self.store.upsert_profile(caller, profile).await {
            error!(target: "store", store = self.store.name(), user_id = %caller.user_id, error = %e, "Profile save failed");
        }
    }

    /// Fire-and-forget save of a finished round.
    pub fn save_result_detached(&self, caller: Caller, result: RoundResult) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let user_id = &caller.user_id;
            match store.save_round_result(&caller, &result).await {
                Ok(()) => info!(target: "store", store = store.name(), %user_id, score = result.score, "Round result saved"),
                Err(e) => error!(target: "store", store = store.name(), %user_id, error = %e, "Round result save failed"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn memory_state() -> AppState {
        AppState::with_parts(Arc::new(MemoryStore::new()), None, None, AppConfig::default())
    }

    #[tokio::test]
    async fn without_auth_caller_is_header_or_guest() {
        let state = memory_state();
        let mut headers = HeaderMap::new();
        assert_eq!(state.identify(&headers).await.unwrap(), Caller::local(GUEST_USER));
        headers.insert(USER_HEADER, HeaderValue::from_static("kid-1"));
        assert_eq!(state.identify(&headers).await.unwrap(), Caller::local("kid-1"));
        headers.insert(USER_HEADER, HeaderValue::from_static("   "));
        assert_eq!(state.identify(&headers).await.unwrap(), Caller::local(GUEST_USER));
    }

    #[tokio::test]
    async fn with_auth_a_token_is_required() {
        let auth = SupabaseAuth::new("http://127.0.0.1:9", "anon".into()).unwrap();
        let state = AppState::with_parts(Arc::new(MemoryStore::new()), Some(auth), None, AppConfig::default());
        let err = state.resolve_caller(None, Some("kid-1")).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn unreachable_identity_provider_is_unavailable() {
        let auth = SupabaseAuth::new("http://127.0.0.1:9", "anon".into()).unwrap();
        let state = AppState::with_parts(Arc::new(MemoryStore::new()), Some(auth), None, AppConfig::default());
        let err = state.resolve_caller(Some("tok"), None).await.unwrap_err();
        assert!(matches!(err, ApiError::Unavailable(_)));
    }

    #[tokio::test]
    async fn unconfigured_hosted_store_degrades_to_defaults() {
        // Nothing listens on port 9; every call fails and is converted.
        let store = SupabaseStore::new("http://127.0.0.1:9", "k".into(), KeyRole::ServiceRole).unwrap();
        let state = AppState::with_parts(Arc::new(store), None, None, AppConfig::default());
        let caller = Caller::local("u1");
        assert!(state.load_history(&caller).await.is_empty());
        assert!(state.load_profile(&caller).await.is_none());
    }
}
