//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic); literal
/// braces in the template (e.g. LaTeX `${ }$` markers) are left alone.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    s.to_string()
  } else {
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
      end -= 1;
    }
    format!("{}… ({} bytes total)", &s[..end], s.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fill_template_replaces_known_keys_only() {
    let tpl = "Tổng {total} câu, giữ ${x-1}$ nguyên.";
    let out = fill_template(tpl, &[("total", "10")]);
    assert_eq!(out, "Tổng 10 câu, giữ ${x-1}$ nguyên.");
  }

  #[test]
  fn fill_template_handles_repeated_keys() {
    let out = fill_template("{a}+{a}={b}", &[("a", "1"), ("b", "2")]);
    assert_eq!(out, "1+1=2");
  }

  #[test]
  fn trunc_for_log_respects_char_boundaries() {
    let s = "đề bài mẫu rất dài";
    let out = trunc_for_log(s, 5);
    assert!(out.contains("bytes total"));
    // must not panic on multi-byte boundaries
    let _ = trunc_for_log("việt", 1);
  }
}
