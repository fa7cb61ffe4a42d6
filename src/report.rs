//! Progress report: summary statistics over the history, and the AI-written summary for
//! parents. The AI path never fails outward; it degrades to a fixed message.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::config::Prompts;
use crate::domain::{Category, RoundResult};
use crate::error::ServiceError;
use crate::openai::OpenAI;

/// Shown when the model answers with nothing.
pub const REPORT_EMPTY_FALLBACK: &str = "Maaf, tidak dapat membuat laporan saat ini.";
/// Shown when the model is unreachable or not configured.
pub const REPORT_ERROR_FALLBACK: &str = "Terjadi kesalahan saat menghubungkan ke asisten AI.";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategorySummary {
  pub category: Category,
  pub rounds: usize,
  pub average_score: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportSummary {
  pub total_rounds: usize,
  pub average_score: u32,
  pub by_category: Vec<CategorySummary>,
}

/// Rounded mean; an empty slice averages to 0.
fn mean(scores: &[u32]) -> u32 {
  let sum: u64 = scores.iter().map(|s| u64::from(*s)).sum();
  let n = scores.len().max(1) as f64;
  (sum as f64 / n).round() as u32
}

pub fn summarize(history: &[RoundResult]) -> ReportSummary {
  let all: Vec<u32> = history.iter().map(|r| r.score).collect();
  let mut per: HashMap<Category, Vec<u32>> = HashMap::new();
  for r in history {
    per.entry(r.category).or_default().push(r.score);
  }
  let by_category = Category::ALL
    .iter()
    .filter_map(|c| {
      per.get(c).map(|scores| CategorySummary {
        category: *c,
        rounds: scores.len(),
        average_score: mean(scores),
      })
    })
    .collect();
  ReportSummary { total_rounds: history.len(), average_score: mean(&all), by_category }
}

/// The most recent `window` results, oldest first.
pub fn recent(history: &[RoundResult], window: usize) -> &[RoundResult] {
  &history[history.len().saturating_sub(window)..]
}

async fn request_report(
  openai: Option<&OpenAI>,
  prompts: &Prompts,
  history: &[RoundResult],
  child_name: &str,
  window: usize,
) -> Result<String, ServiceError> {
  let oa = openai.ok_or(ServiceError::NotConfigured { service: "openai" })?;
  let history_json =
    serde_json::to_string(recent(history, window)).map_err(|e| ServiceError::decode("report", e))?;
  oa.parent_report(prompts, child_name, &history_json).await
}

/// Ask the language model for a parent-facing summary of the recent history.
#[instrument(level = "info", skip(openai, prompts, history, child_name), fields(history_len = history.len()))]
pub async fn parent_report(
  openai: Option<&OpenAI>,
  prompts: &Prompts,
  history: &[RoundResult],
  child_name: &str,
  window: usize,
) -> String {
  match request_report(openai, prompts, history, child_name, window).await {
    Ok(text) if text.trim().is_empty() => {
      warn!(target: "report", "Model returned an empty report");
      REPORT_EMPTY_FALLBACK.to_string()
    }
    Ok(text) => {
      info!(target: "report", text_len = text.len(), "Parent report generated");
      text
    }
    Err(e @ ServiceError::NotConfigured { .. }) => {
      warn!(target: "report", error = %e, "Returning fallback report");
      REPORT_ERROR_FALLBACK.to_string()
    }
    Err(e) => {
      error!(target: "report", error = %e, "Parent report generation failed");
      REPORT_ERROR_FALLBACK.to_string()
    }
  }
}
