//! Loading application configuration (report prompts + quiz timing) from TOML.
//!
//! The file is optional; see `AppConfig` for the schema. Service credentials come from
//! the environment and are read by the collaborator constructors.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub quiz: QuizSettings,
}

/// Prompts for the parent report. `{child_name}` and `{history_json}` are substituted.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub report_system: String,
  pub report_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      report_system: "Bertindaklah sebagai ahli pendidikan anak usia dini dan psikolog anak. Jawab dalam Bahasa Indonesia.".into(),
      report_user_template: "Analisis data perkembangan belajar berikut untuk anak bernama {child_name}.\nData (JSON): {history_json}\n\nBerikan laporan singkat untuk orang tua yang mencakup:\n1. Ringkasan kemajuan (puji usaha anak).\n2. Area kekuatan (Membaca, Berhitung atau Logika).\n3. Saran aktivitas konkret di rumah untuk meningkatkan area yang lebih lemah.\n\nGunakan format Markdown yang rapi: **Bold** untuk penekanan, Heading (## atau ###) untuk memisahkan bagian, dan bullet points. Gunakan nada yang hangat, menyemangati, dan profesional.".into(),
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct QuizSettings {
  /// How long answer feedback stays up before the round advances.
  pub feedback_delay_ms: u64,
  /// Number of most recent results sent to the report model.
  pub report_window: usize,
}

impl Default for QuizSettings {
  fn default() -> Self {
    Self { feedback_delay_ms: 1500, report_window: 10 }
  }
}

impl QuizSettings {
  pub fn feedback_delay(&self) -> Duration {
    Duration::from_millis(self.feedback_delay_ms)
  }
}

/// Attempt to load `AppConfig` from APP_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("APP_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_app_config(&s) {
      Ok(cfg) => {
        info!(target: "pintarcilik", %path, "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "pintarcilik", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "pintarcilik", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_app_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_file_keeps_defaults() {
    let cfg = parse_app_config("[quiz]\nfeedback_delay_ms = 800\n").expect("parse");
    assert_eq!(cfg.quiz.feedback_delay(), Duration::from_millis(800));
    assert_eq!(cfg.quiz.report_window, 10);
    assert!(cfg.prompts.report_user_template.contains("{child_name}"));
  }

  #[test]
  fn empty_file_is_all_defaults() {
    let cfg = parse_app_config("").expect("parse");
    assert_eq!(cfg.quiz.feedback_delay_ms, 1500);
  }

  #[test]
  fn bad_types_are_rejected() {
    assert!(parse_app_config("[quiz]\nfeedback_delay_ms = \"soon\"\n").is_err());
  }
}
