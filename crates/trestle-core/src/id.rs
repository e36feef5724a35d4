//! String helpers over individual identifiers.
//!
//! Identifiers are URI-like, e.g.
//! `http://trestle.nickrobison.com/data#Alpha:2013:v1`. The rendering layer
//! works with the bare suffix (`Alpha`) and a stable numeric feature id
//! derived from the full identifier.

/// The `scheme://authority` prefix of `id`, or `""` when there is none.
pub fn extract_hostname(id: &str) -> &str {
  let Some(scheme_end) = id.find("://") else {
    return "";
  };
  let scheme = &id[..scheme_end];
  if scheme.is_empty()
    || !scheme
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
  {
    return "";
  }
  let authority_start = scheme_end + 3;
  let authority_len = id[authority_start..]
    .find(['/', '#', '?'])
    .unwrap_or(id.len() - authority_start);
  &id[..authority_start + authority_len]
}

/// `id` with its hostname prefix removed.
pub fn without_hostname(id: &str) -> &str {
  &id[extract_hostname(id).len()..]
}

/// Everything after the last `#` or `/`.
pub fn extract_suffix(id: &str) -> &str {
  match id.rfind(['#', '/']) {
    Some(idx) => &id[idx + 1..],
    None => id,
  }
}

/// Everything up to and including the last `#` or `/`. Together with
/// [`extract_suffix`] this splits `id` exactly in two.
pub fn extract_prefix(id: &str) -> &str {
  match id.rfind(['#', '/']) {
    Some(idx) => &id[..=idx],
    None => "",
  }
}

/// The suffix up to its first `:`, dropping any version or date qualifier.
pub fn filter_id(id: &str) -> &str {
  let suffix = extract_suffix(id);
  suffix.split(':').next().unwrap_or(suffix)
}

/// SDBM hash over UTF-16 code units with 32-bit wraparound.
///
/// Used as the numeric feature id for map layers, so the value has to match
/// what the browser computes for the same string.
pub fn hash_id(id: &str) -> i32 {
  id.encode_utf16().fold(0i32, |hash, unit| {
    i32::from(unit)
      .wrapping_add(hash.wrapping_shl(6))
      .wrapping_add(hash.wrapping_shl(16))
      .wrapping_sub(hash)
  })
}
