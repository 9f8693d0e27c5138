//! Decoding of the remote configuration response body.
//!
//! The server does not tag its responses. A body is tried as a success envelope first and as an
//! error envelope second; a body that fits neither becomes a generic "Invalid response format"
//! error. Decoding never fails: every outcome is a [`RemoteConfigResult`].
use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{Error, Result};

/// Remote flags: string keys to string values.
pub type Flags = HashMap<String, String>;

pub(crate) const INVALID_RESPONSE_FORMAT: &str = "Invalid response format";
const UNKNOWN_ERROR: &str = "Unknown error";

/// Outcome of decoding one configuration response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteConfigResult {
    /// The body was a success envelope.
    Success {
        /// Decoded flags. Empty if the envelope carried none.
        flags: Flags,
    },
    /// The body was an error envelope, or could not be decoded at all.
    Error {
        /// Human-readable description.
        reason: String,
        /// Parser message, set only when the body matched neither envelope.
        cause: Option<String>,
    },
}

impl RemoteConfigResult {
    /// Convert into a [`Result`], mapping error envelopes to [`Error::Rejected`] and undecodable
    /// bodies to [`Error::Decode`].
    pub fn into_result(self) -> Result<Flags> {
        match self {
            RemoteConfigResult::Success { flags } => Ok(flags),
            RemoteConfigResult::Error {
                reason,
                cause: None,
            } => Err(Error::Rejected(reason)),
            RemoteConfigResult::Error {
                reason,
                cause: Some(cause),
            } => Err(Error::Decode { reason, cause }),
        }
    }
}

/// Decode a configuration response body.
pub fn decode(body: &[u8]) -> RemoteConfigResult {
    // Both envelopes are JSON objects. Checking this up front keeps serde from accepting a
    // struct written as an array.
    let object = match serde_json::from_slice::<Value>(body) {
        Ok(object @ Value::Object(_)) => object,
        Ok(other) => {
            let found = match other {
                Value::Array(_) => "an array",
                Value::Null => "null",
                _ => "a scalar",
            };
            return invalid_response_format(format!("expected a JSON object, found {found}"));
        }
        Err(err) => return invalid_response_format(err.to_string()),
    };

    match SuccessEnvelope::deserialize(&object) {
        Ok(envelope) => {
            log::trace!(target: "haumea",
                        flag_count = envelope.flags.len(),
                        message:serde = envelope.message;
                        "decoded success envelope");
            return RemoteConfigResult::Success {
                flags: envelope.flags,
            };
        }
        Err(err) => {
            log::trace!(target: "haumea", "body is not a success envelope: {}", err);
        }
    }

    match ErrorEnvelope::deserialize(&object) {
        Ok(envelope) => RemoteConfigResult::Error {
            reason: envelope.reason(),
            cause: None,
        },
        Err(err) => invalid_response_format(err.to_string()),
    }
}

fn invalid_response_format(cause: String) -> RemoteConfigResult {
    RemoteConfigResult::Error {
        reason: INVALID_RESPONSE_FORMAT.to_owned(),
        cause: Some(cause),
    }
}

/// Success envelope as it appears on the wire. All fields are optional here; which combinations
/// make a success envelope is decided in `TryFrom`.
#[derive(Debug, Deserialize)]
struct WireSuccessEnvelope {
    #[serde(rename = "remote-flags", default, deserialize_with = "lenient_flags")]
    remote_flags: Option<Flags>,
    #[serde(default, deserialize_with = "lenient_flags")]
    data: Option<Flags>,
    /// Older backends send flags as a list of key/value pairs.
    flags: Option<Vec<FlagEntry>>,
    message: Option<String>,
    success: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct FlagEntry {
    key: String,
    value: FlagValue,
}

/// A flag value as the server may send it. Numbers and booleans are kept in their JSON text
/// form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FlagValue {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl From<FlagValue> for String {
    fn from(value: FlagValue) -> String {
        match value {
            FlagValue::String(s) => s,
            FlagValue::Number(n) => n.to_string(),
            FlagValue::Bool(b) => b.to_string(),
        }
    }
}

fn lenient_flags<'de, D>(deserializer: D) -> std::result::Result<Option<Flags>, D::Error>
where
    D: Deserializer<'de>,
{
    let flags = Option::<HashMap<String, FlagValue>>::deserialize(deserializer)?;
    Ok(flags.map(|flags| {
        flags
            .into_iter()
            .map(|(key, value)| (key, value.into()))
            .collect()
    }))
}

#[derive(Debug, Deserialize)]
#[serde(try_from = "WireSuccessEnvelope")]
struct SuccessEnvelope {
    flags: Flags,
    message: Option<String>,
}

impl TryFrom<WireSuccessEnvelope> for SuccessEnvelope {
    type Error = &'static str;

    fn try_from(wire: WireSuccessEnvelope) -> std::result::Result<Self, Self::Error> {
        if wire.success == Some(false) {
            return Err("envelope is marked as unsuccessful");
        }

        let flags = match (wire.remote_flags, wire.data, wire.flags) {
            (Some(remote_flags), _, _) if !remote_flags.is_empty() => remote_flags,
            (_, Some(data), _) => data,
            (None, None, Some(entries)) => entries
                .into_iter()
                .map(|entry| (entry.key, entry.value.into()))
                .collect(),
            (Some(empty), None, _) => empty,
            (None, None, None) => return Err("missing field `remote-flags`"),
        };

        Ok(SuccessEnvelope {
            flags,
            message: wire.message,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[allow(dead_code)]
    success: serde_bool::False,
    error: Option<String>,
    message: Option<String>,
    app_id: Option<String>,
    platform: Option<String>,
}

impl ErrorEnvelope {
    fn reason(&self) -> String {
        let mut reason = self.error.as_deref().unwrap_or(UNKNOWN_ERROR).to_owned();
        if let Some(message) = &self.message {
            reason.push_str(": ");
            reason.push_str(message);
        }
        if let Some(app_id) = &self.app_id {
            reason.push_str(&format!(" (app_id: {app_id})"));
        }
        if let Some(platform) = &self.platform {
            reason.push_str(&format!(", platform: {platform}"));
        }
        reason
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::{decode, RemoteConfigResult, INVALID_RESPONSE_FORMAT};
    use crate::Error;

    fn decode_json(value: serde_json::Value) -> RemoteConfigResult {
        decode(value.to_string().as_bytes())
    }

    fn success(pairs: &[(&str, &str)]) -> RemoteConfigResult {
        RemoteConfigResult::Success {
            flags: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn remote_flags_are_preferred() {
        let result = decode_json(json!({
            "remote-flags": {"theme": "dark"},
            "data": {"theme": "light"},
            "message": "ok",
        }));
        assert_eq!(result, success(&[("theme", "dark")]));
    }

    #[test]
    fn falls_back_to_data_when_remote_flags_empty() {
        let result = decode_json(json!({
            "remote-flags": {},
            "data": {"limit": "10"},
        }));
        assert_eq!(result, success(&[("limit", "10")]));
    }

    #[test]
    fn falls_back_to_data_when_remote_flags_absent() {
        let result = decode_json(json!({"data": {"limit": "10"}}));
        assert_eq!(result, success(&[("limit", "10")]));
    }

    #[test]
    fn empty_remote_flags_without_data_is_empty_success() {
        let result = decode_json(json!({"remote-flags": {}}));
        assert_eq!(
            result,
            RemoteConfigResult::Success {
                flags: HashMap::new()
            }
        );
    }

    #[test]
    fn null_fields_are_treated_as_absent() {
        let result = decode_json(json!({"remote-flags": null, "data": {"a": "b"}}));
        assert_eq!(result, success(&[("a", "b")]));
    }

    #[test]
    fn accepts_list_of_pairs() {
        let result = decode_json(json!({
            "flags": [
                {"key": "theme", "value": "dark"},
                {"key": "beta", "value": "true"},
            ]
        }));
        assert_eq!(result, success(&[("theme", "dark"), ("beta", "true")]));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let result = decode_json(json!({
            "remote-flags": {"theme": "dark"},
            "version": 3,
            "extra": {"nested": [1, 2, 3]},
        }));
        assert_eq!(result, success(&[("theme", "dark")]));
    }

    #[test]
    fn error_envelope_builds_full_reason() {
        let result = decode_json(json!({
            "success": false,
            "error": "Config not found",
            "message": "no flags published",
            "app_id": "app-1",
            "platform": "ios",
        }));
        assert_eq!(
            result,
            RemoteConfigResult::Error {
                reason: "Config not found: no flags published (app_id: app-1), platform: ios"
                    .to_owned(),
                cause: None,
            }
        );
    }

    #[test]
    fn error_envelope_defaults_to_unknown_error() {
        let result = decode_json(json!({"success": false}));
        assert_eq!(
            result,
            RemoteConfigResult::Error {
                reason: "Unknown error".to_owned(),
                cause: None,
            }
        );
    }

    #[test]
    fn unsuccessful_envelope_with_data_is_an_error() {
        let result = decode_json(json!({
            "success": false,
            "error": "Disabled",
            "data": {"a": "b"},
        }));
        assert!(matches!(result, RemoteConfigResult::Error { cause: None, .. }));
    }

    #[test]
    fn unexpected_shape_is_invalid_response_format() {
        let result = decode_json(json!({"unexpected": true}));
        match result {
            RemoteConfigResult::Error { reason, cause } => {
                assert_eq!(reason, INVALID_RESPONSE_FORMAT);
                assert!(cause.is_some());
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn non_json_is_invalid_response_format() {
        let bodies: [&[u8]; 4] = [b"<html>oops</html>", b"", b"[1, 2]", b"null"];
        for body in bodies {
            assert!(matches!(
                decode(body),
                RemoteConfigResult::Error { ref reason, cause: Some(_) } if reason == INVALID_RESPONSE_FORMAT
            ));
        }
    }

    #[test]
    fn scalar_flag_values_are_stringified() {
        let result = decode(br#"{"remote-flags": {"beta": true, "limit": 10, "ratio": 0.5}}"#);
        assert_eq!(
            result,
            success(&[("beta", "true"), ("limit", "10"), ("ratio", "0.5")])
        );

        let result = decode_json(json!({"flags": [{"key": "beta", "value": false}]}));
        assert_eq!(result, success(&[("beta", "false")]));
    }

    #[test]
    fn nested_flag_values_are_invalid() {
        let result = decode_json(json!({"remote-flags": {"limit": {"max": "10"}}}));
        assert!(matches!(result, RemoteConfigResult::Error { cause: Some(_), .. }));
    }

    #[test]
    fn top_level_array_is_invalid_response_format() {
        let result = decode(br#"[null, {"a": "b"}, null, null, null]"#);
        assert!(matches!(
            result,
            RemoteConfigResult::Error { ref reason, cause: Some(_) } if reason == INVALID_RESPONSE_FORMAT
        ));

        let result = decode(br#"[false, "Disabled", null, null, null]"#);
        assert!(matches!(
            result,
            RemoteConfigResult::Error { ref reason, cause: Some(_) } if reason == INVALID_RESPONSE_FORMAT
        ));
    }

    #[test]
    fn list_of_pairs_ignored_next_to_empty_remote_flags() {
        let result = decode_json(json!({
            "remote-flags": {},
            "flags": [{"key": "theme", "value": "dark"}],
        }));
        assert_eq!(
            result,
            RemoteConfigResult::Success {
                flags: HashMap::new()
            }
        );
    }

    #[test]
    fn into_result_maps_error_kinds() {
        let rejected = RemoteConfigResult::Error {
            reason: "Disabled".to_owned(),
            cause: None,
        };
        assert!(matches!(rejected.into_result(), Err(Error::Rejected(r)) if r == "Disabled"));

        let malformed = decode(b"{}");
        assert!(matches!(malformed.into_result(), Err(Error::Decode { .. })));

        let ok = decode_json(json!({"data": {"a": "b"}}));
        assert_eq!(ok.into_result().unwrap().get("a").map(String::as_str), Some("b"));
    }
}
