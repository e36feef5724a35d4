//! Login sessions: JWT decoding and on-disk persistence.

use std::{io, path::Path};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

// ─── Privileges ──────────────────────────────────────────────────────────────

/// One bit of a user's privilege mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Privilege {
  User  = 1,
  Admin = 2,
  Dba   = 4,
}

impl Privilege {
  pub const ALL: [Self; 3] = [Self::User, Self::Admin, Self::Dba];

  pub fn bit(self) -> u8 { self as u8 }
}

/// The user payload the server embeds in the token's `data4j` claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrestleUser {
  #[serde(default)]
  pub id:         Option<i64>,
  pub username:   String,
  #[serde(default)]
  pub first_name: String,
  #[serde(default)]
  pub last_name:  String,
  #[serde(default)]
  pub email:      String,
  /// Bit mask of [`Privilege`] values.
  #[serde(default)]
  pub privileges: u8,
}

impl TrestleUser {
  pub fn has(&self, privilege: Privilege) -> bool {
    self.privileges & privilege.bit() != 0
  }

  pub fn privilege_list(&self) -> Vec<Privilege> {
    Privilege::ALL.into_iter().filter(|p| self.has(*p)).collect()
  }
}

// ─── Token decoding ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct Claims {
  exp:    i64,
  /// JSON-encoded [`TrestleUser`].
  data4j: String,
}

/// Read the user and expiry out of a JWT without verifying its signature;
/// the server does that on every request.
pub fn decode_token(token: &str) -> Result<(TrestleUser, DateTime<Utc>)> {
  let mut parts = token.split('.');
  let (Some(_header), Some(payload), Some(_signature), None) =
    (parts.next(), parts.next(), parts.next(), parts.next())
  else {
    return Err(Error::Token("expected three dot-separated segments".into()));
  };

  let payload = URL_SAFE_NO_PAD
    .decode(payload.trim_end_matches('='))
    .map_err(|e| Error::Token(format!("payload is not base64url: {e}")))?;
  let claims: Claims = serde_json::from_slice(&payload)?;
  let user: TrestleUser = serde_json::from_str(&claims.data4j)?;
  let expires_at = DateTime::from_timestamp(claims.exp, 0)
    .ok_or_else(|| Error::Token(format!("exp {} out of range", claims.exp)))?;

  Ok((user, expires_at))
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// A logged-in user and the bearer token that proves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub token:      String,
  pub user:       TrestleUser,
  pub expires_at: DateTime<Utc>,
}

impl Session {
  pub fn from_token(token: impl Into<String>) -> Result<Self> {
    let token = token.into();
    let (user, expires_at) = decode_token(&token)?;
    Ok(Self {
      token,
      user,
      expires_at,
    })
  }

  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { now >= self.expires_at }

  /// Write the session as JSON, creating parent directories as needed.
  pub async fn save(&self, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, serde_json::to_vec_pretty(self)?).await?;
    debug!(path = %path.display(), user = %self.user.username, "saved session");
    Ok(())
  }

  /// Read a previously saved session. `None` if there is none.
  pub async fn load(path: &Path) -> Result<Option<Self>> {
    match tokio::fs::read(path).await {
      Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  /// Remove a saved session. Succeeds if there was none.
  pub async fn clear(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use serde_json::json;

  use super::*;

  /// An unsigned token carrying `user` that expires at `exp`.
  fn token_for(user: &serde_json::Value, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = json!({
      "sub": "trestle",
      "exp": exp,
      "data4j": user.to_string(),
    });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
  }

  fn alice() -> serde_json::Value {
    json!({
      "id": 7,
      "username": "alice",
      "firstName": "Alice",
      "lastName": "Liddell",
      "email": "alice@example.org",
      "privileges": 3,
    })
  }

  #[test]
  fn decodes_user_and_expiry() {
    let (user, expires_at) = decode_token(&token_for(&alice(), 1_700_000_000)).unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.first_name, "Alice");
    assert_eq!(user.email, "alice@example.org");
    assert_eq!(user.id, Some(7));
    assert_eq!(expires_at, Utc.timestamp_opt(1_700_000_000, 0).unwrap());
  }

  #[test]
  fn privilege_mask_decodes_to_flags() {
    let (user, _) = decode_token(&token_for(&alice(), 0)).unwrap();
    assert!(user.has(Privilege::User));
    assert!(user.has(Privilege::Admin));
    assert!(!user.has(Privilege::Dba));
    assert_eq!(user.privilege_list(), vec![Privilege::User, Privilege::Admin]);
  }

  #[test]
  fn rejects_malformed_tokens() {
    assert!(matches!(decode_token("not-a-jwt"), Err(Error::Token(_))));
    assert!(matches!(decode_token("a.b.c.d"), Err(Error::Token(_))));
    assert!(matches!(decode_token("a.!!!.c"), Err(Error::Token(_))));
    let no_user = URL_SAFE_NO_PAD.encode(r#"{"exp":1}"#);
    assert!(matches!(decode_token(&format!("h.{no_user}.s")), Err(Error::Json(_))));
  }

  #[test]
  fn session_expiry_is_inclusive() {
    let session = Session::from_token(token_for(&alice(), 1_000)).unwrap();
    let at = |s: i64| Utc.timestamp_opt(s, 0).unwrap();
    assert!(!session.is_expired(at(999)));
    assert!(session.is_expired(at(1_000)));
  }

  #[tokio::test]
  async fn session_persists_and_clears() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/session.json");

    assert_eq!(Session::load(&path).await.unwrap(), None);

    let session = Session::from_token(token_for(&alice(), 1_000)).unwrap();
    session.save(&path).await.unwrap();
    assert_eq!(Session::load(&path).await.unwrap(), Some(session));

    Session::clear(&path).await.unwrap();
    Session::clear(&path).await.unwrap();
    assert_eq!(Session::load(&path).await.unwrap(), None);
  }
}
