//! Persistence collaborator: learner profiles and append-only round history.
//!
//! Two implementations sit behind `ProgressStore`:
//!   - `MemoryStore`: process-local maps, used when no hosted database is configured
//!     and in tests.
//!   - `SupabaseStore`: the hosted Postgres tables via their PostgREST endpoint.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::domain::{Category, DifficultyLevel, Profile, RoundResult};
use crate::error::ServiceError;
use crate::identity::Caller;

const SERVICE: &str = "persistence";
const RESULTS_TABLE: &str = "calistung_game_results";
const PROFILES_TABLE: &str = "calistung_profiles";

#[async_trait]
pub trait ProgressStore: Send + Sync {
  /// Short label for logs.
  fn name(&self) -> &'static str;

  async fn save_round_result(&self, caller: &Caller, result: &RoundResult) -> Result<(), ServiceError>;

  /// Results in chronological (append) order.
  async fn history(&self, caller: &Caller) -> Result<Vec<RoundResult>, ServiceError>;

  async fn profile(&self, caller: &Caller) -> Result<Option<Profile>, ServiceError>;

  async fn upsert_profile(&self, caller: &Caller, profile: &Profile) -> Result<(), ServiceError>;
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
  history: RwLock<HashMap<String, Vec<RoundResult>>>,
  profiles: RwLock<HashMap<String, Profile>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl ProgressStore for MemoryStore {
  fn name(&self) -> &'static str { "memory" }

  async fn save_round_result(&self, caller: &Caller, result: &RoundResult) -> Result<(), ServiceError> {
    self.history.write().await.entry(caller.user_id.clone()).or_default().push(result.clone());
    Ok(())
  }

  async fn history(&self, caller: &Caller) -> Result<Vec<RoundResult>, ServiceError> {
    Ok(self.history.read().await.get(&caller.user_id).cloned().unwrap_or_default())
  }

  async fn profile(&self, caller: &Caller) -> Result<Option<Profile>, ServiceError> {
    Ok(self.profiles.read().await.get(&caller.user_id).cloned())
  }

  async fn upsert_profile(&self, caller: &Caller, profile: &Profile) -> Result<(), ServiceError> {
    self.profiles.write().await.insert(caller.user_id.clone(), profile.clone());
    Ok(())
  }
}

// ---------------------------------------------------------------------------
// Hosted (PostgREST)
// ---------------------------------------------------------------------------

/// Which project key the store was given. The service-role key bypasses row-level
/// security; the anon key only works on behalf of a signed-in caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyRole {
  ServiceRole,
  Anon,
}

#[derive(Clone)]
pub struct SupabaseStore {
  client: reqwest::Client,
  rest_url: String,
  api_key: String,
  role: KeyRole,
}

#[derive(Serialize, Deserialize)]
struct ResultRow {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  user_id: Option<String>,
  category: Category,
  score: f64,
  total_questions: u32,
  difficulty: DifficultyLevel,
  created_at: DateTime<Utc>,
}

impl ResultRow {
  fn from_result(user_id: &str, r: &RoundResult) -> Self {
    Self {
      user_id: Some(user_id.to_string()),
      category: r.category,
      score: f64::from(r.score),
      total_questions: r.total_questions,
      difficulty: r.difficulty,
      created_at: r.date,
    }
  }

  fn into_result(self) -> RoundResult {
    RoundResult {
      date: self.created_at,
      score: self.score.round().clamp(0.0, 100.0) as u32,
      total_questions: self.total_questions,
      category: self.category,
      difficulty: self.difficulty,
    }
  }
}

#[derive(Serialize, Deserialize)]
struct ProfileRow {
  id: String,
  name: String,
  age: u8,
  level: DifficultyLevel,
  avatar: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  updated_at: Option<DateTime<Utc>>,
}

impl ProfileRow {
  fn into_profile(self) -> Profile {
    Profile { name: self.name, age: self.age, level: self.level, avatar: self.avatar }
  }
}

impl SupabaseStore {
  /// Build from SUPABASE_URL plus SUPABASE_SERVICE_ROLE_KEY (preferred) or SUPABASE_ANON_KEY.
  pub fn from_env() -> Option<Self> {
    let url = std::env::var("SUPABASE_URL").ok().filter(|u| !u.trim().is_empty())?;
    let env_key = |name: &str| std::env::var(name).ok().filter(|k| !k.trim().is_empty());
    match env_key("SUPABASE_SERVICE_ROLE_KEY") {
      Some(key) => Self::new(&url, key, KeyRole::ServiceRole),
      None => Self::new(&url, env_key("SUPABASE_ANON_KEY")?, KeyRole::Anon),
    }
  }

  pub fn new(base_url: &str, api_key: String, role: KeyRole) -> Option<Self> {
    let client = reqwest::Client::builder()
      .timeout(std::time::Duration::from_secs(10))
      .build()
      .ok()?;
    Some(Self { client, rest_url: format!("{}/rest/v1", base_url.trim_end_matches('/')), api_key, role })
  }

  pub fn role(&self) -> KeyRole {
    self.role
  }

  fn table(&self, name: &str) -> String {
    format!("{}/{}", self.rest_url, name)
  }

  /// With the anon key, requests run as the signed-in caller so row-level policies on
  /// `auth.uid()` apply; without a session they fall back to the project key.
  fn authed(&self, req: reqwest::RequestBuilder, caller: &Caller) -> reqwest::RequestBuilder {
    let bearer = match (self.role, caller.access_token.as_deref()) {
      (KeyRole::Anon, Some(token)) => token,
      _ => self.api_key.as_str(),
    };
    req.header("apikey", &self.api_key).bearer_auth(bearer)
  }

  async fn send(&self, req: reqwest::RequestBuilder, caller: &Caller) -> Result<reqwest::Response, ServiceError> {
    let res = self.authed(req, caller).send().await.map_err(|e| ServiceError::http(SERVICE, e))?;
    if res.status().is_success() {
      Ok(res)
    } else {
      Err(ServiceError::from_response(SERVICE, res).await)
    }
  }
}

#[async_trait]
impl ProgressStore for SupabaseStore {
  fn name(&self) -> &'static str { "supabase" }

  #[instrument(level = "debug", skip(self, caller, result), fields(user_id = %caller.user_id, category = %result.category))]
  async fn save_round_result(&self, caller: &Caller, result: &RoundResult) -> Result<(), ServiceError> {
    let row = ResultRow::from_result(&caller.user_id, result);
    let req = self.client.post(self.table(RESULTS_TABLE))
      .header("Prefer", "return=minimal")
      .json(&[row]);
    self.send(req, caller).await?;
    debug!(target: "store", user_id = %caller.user_id, "Round result saved");
    Ok(())
  }

  #[instrument(level = "debug", skip(self, caller), fields(user_id = %caller.user_id))]
  async fn history(&self, caller: &Caller) -> Result<Vec<RoundResult>, ServiceError> {
    let req = self.client.get(self.table(RESULTS_TABLE)).query(&[
      ("select", "*".to_string()),
      ("user_id", format!("eq.{}", caller.user_id)),
      ("order", "created_at.asc".to_string()),
    ]);
    let rows: Vec<ResultRow> = self.send(req, caller).await?
      .json().await.map_err(|e| ServiceError::decode(SERVICE, e))?;
    Ok(rows.into_iter().map(ResultRow::into_result).collect())
  }

  #[instrument(level = "debug", skip(self, caller), fields(user_id = %caller.user_id))]
  async fn profile(&self, caller: &Caller) -> Result<Option<Profile>, ServiceError> {
    let req = self.client.get(self.table(PROFILES_TABLE)).query(&[
      ("select", "*".to_string()),
      ("id", format!("eq.{}", caller.user_id)),
      ("limit", "1".to_string()),
    ]);
    let rows: Vec<ProfileRow> = self.send(req, caller).await?
      .json().await.map_err(|e| ServiceError::decode(SERVICE, e))?;
    Ok(rows.into_iter().next().map(ProfileRow::into_profile))
  }

  #[instrument(level = "debug", skip(self, caller, profile), fields(user_id = %caller.user_id))]
  async fn upsert_profile(&self, caller: &Caller, profile: &Profile) -> Result<(), ServiceError> {
    let row = ProfileRow {
      id: caller.user_id.clone(),
      name: profile.name.clone(),
      age: profile.age,
      level: profile.level,
      avatar: profile.avatar.clone(),
      updated_at: Some(Utc::now()),
    };
    let req = self.client.post(self.table(PROFILES_TABLE))
      .header("Prefer", "resolution=merge-duplicates,return=minimal")
      .json(&row);
    self.send(req, caller).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn result(score: u32, category: Category) -> RoundResult {
    RoundResult {
      date: Utc::now(),
      score,
      total_questions: 100,
      category,
      difficulty: DifficultyLevel::Beginner,
    }
  }

  #[tokio::test]
  async fn memory_history_is_append_only_per_user() {
    let store = MemoryStore::new();
    let (u1, u2) = (Caller::local("u1"), Caller::local("u2"));
    store.save_round_result(&u1, &result(20, Category::Logic)).await.unwrap();
    store.save_round_result(&u1, &result(80, Category::Reading)).await.unwrap();
    store.save_round_result(&u2, &result(100, Category::Arithmetic)).await.unwrap();

    let h = store.history(&u1).await.unwrap();
    assert_eq!(h.iter().map(|r| r.score).collect::<Vec<_>>(), vec![20, 80]);
    assert_eq!(store.history(&u2).await.unwrap().len(), 1);
    assert!(store.history(&Caller::local("nobody")).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn memory_profile_upsert_replaces() {
    let store = MemoryStore::new();
    let u1 = Caller::local("u1");
    assert!(store.profile(&u1).await.unwrap().is_none());
    let p = Profile::setup("Sari", 4, None).unwrap();
    store.upsert_profile(&u1, &p).await.unwrap();
    store.upsert_profile(&u1, &p.with_level(DifficultyLevel::Advanced)).await.unwrap();
    assert_eq!(store.profile(&u1).await.unwrap().unwrap().level, DifficultyLevel::Advanced);
  }

  #[test]
  fn result_rows_use_table_column_names() {
    let row = ResultRow::from_result("u1", &result(60, Category::Reading));
    let v = serde_json::to_value(&row).unwrap();
    assert_eq!(v["user_id"], "u1");
    assert_eq!(v["category"], "MEMBACA");
    assert_eq!(v["difficulty"], "PEMULA");
    assert_eq!(v["total_questions"], 100);
    assert!(v.get("created_at").is_some());
  }

  #[test]
  fn result_rows_decode_float_scores() {
    let raw = r#"[{"id":7,"user_id":"u1","category":"LOGIKA","score":80.0,"total_questions":100,
                  "difficulty":"MAHIR","created_at":"2026-03-01T10:00:00.123+00:00"}]"#;
    let rows: Vec<ResultRow> = serde_json::from_str(raw).unwrap();
    let r = rows.into_iter().next().unwrap().into_result();
    assert_eq!(r.score, 80);
    assert_eq!(r.category, Category::Logic);
    assert_eq!(r.difficulty, DifficultyLevel::Advanced);
  }

  #[test]
  fn rest_url_is_derived_from_project_url() {
    let s = SupabaseStore::new("https://demo.supabase.co/", "k".into(), KeyRole::Anon).unwrap();
    assert_eq!(s.table(RESULTS_TABLE), "https://demo.supabase.co/rest/v1/calistung_game_results");
  }

  fn bearer_sent(store: &SupabaseStore, caller: &Caller) -> (String, String) {
    let req = store.authed(store.client.get(store.table(RESULTS_TABLE)), caller).build().unwrap();
    let header = |name: &str| req.headers().get(name).unwrap().to_str().unwrap().to_string();
    (header("apikey"), header("authorization"))
  }

  #[test]
  fn anon_key_requests_carry_the_learner_session() {
    let store = SupabaseStore::new("https://demo.supabase.co", "anon-key".into(), KeyRole::Anon).unwrap();
    let signed_in = Caller::signed_in("u1", "learner-jwt");
    assert_eq!(bearer_sent(&store, &signed_in), ("anon-key".into(), "Bearer learner-jwt".into()));
    // No session to forward: the project key is all there is.
    assert_eq!(bearer_sent(&store, &Caller::local("u1")), ("anon-key".into(), "Bearer anon-key".into()));
  }

  #[test]
  fn service_role_key_is_always_the_bearer() {
    let store = SupabaseStore::new("https://demo.supabase.co", "service-key".into(), KeyRole::ServiceRole).unwrap();
    let signed_in = Caller::signed_in("u1", "learner-jwt");
    assert_eq!(bearer_sent(&store, &signed_in), ("service-key".into(), "Bearer service-key".into()));
    assert_eq!(store.role(), KeyRole::ServiceRole);
  }
}
