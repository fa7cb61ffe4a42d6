//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Log-safe truncation for large strings (char-boundary aware).
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fills_known_keys_only() {
    let out = fill_template("Hi {child_name}, {missing}", &[("child_name", "Sari")]);
    assert_eq!(out, "Hi Sari, {missing}");
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    let s = "🍎🍎🍎";
    let out = trunc_for_log(s, 5);
    assert!(out.starts_with("🍎…"));
    assert_eq!(trunc_for_log("short", 10), "short");
  }
}
