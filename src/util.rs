//! Small utility helpers used across modules.

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
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
  fn short_strings_pass_through() {
    assert_eq!(trunc_for_log("ok", 10), "ok");
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    let out = trunc_for_log("héllo wörld", 2);
    assert!(out.starts_with("h…"));
    assert!(out.ends_with("(13 bytes total)"));
  }
}
