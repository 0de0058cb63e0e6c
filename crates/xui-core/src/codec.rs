// Copyright (c) 2026 Roman Barinov <rbarinov@gmail.com>
// Licensed under the FSL-1.1-NC.

use crate::Result;
use base64::Engine;
use serde::Serialize;
use serde_json::Value;

/// Unwraps a field the panel stores as JSON text inside the JSON envelope.
///
/// Accepts the text form and the already-expanded form. `null` and blank
/// strings mean the field is absent.
pub fn embedded_value(value: Value) -> Result<Option<Value>> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => Ok(Some(serde_json::from_str(&text)?)),
        other => Ok(Some(other)),
    }
}

pub fn encode_embedded<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub fn encode_base64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

pub fn encode_base64_url(data: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(data)
}

pub fn encode_query<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Percent-encodes a link remark. Spaces become `%20`; `/` and `~` stay
/// as they are.
pub fn encode_fragment(text: &str) -> String {
    encode_component(text)
        .replace("%2F", "/")
        .replace("%7E", "~")
}

/// Percent-encodes a user or password for the authority part of a URL.
/// Everything except ASCII alphanumerics and `-._` is escaped.
pub fn encode_userinfo(text: &str) -> String {
    encode_component(text)
}

fn encode_component(text: &str) -> String {
    url::form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
        .replace('*', "%2A")
}

/// Deserializers for scalars that older panels send as strings.
pub mod lenient {
    use serde::de::{self, Deserializer};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Int(i64),
        Uint(u64),
        Float(f64),
        Bool(bool),
        Text(String),
    }

    impl Loose {
        fn into_int<E: de::Error>(self) -> Result<i64, E> {
            match self {
                Loose::Int(v) => Ok(v),
                Loose::Uint(v) => i64::try_from(v).map_err(E::custom),
                Loose::Float(v) => Ok(v as i64),
                Loose::Bool(v) => Ok(v as i64),
                Loose::Text(text) => {
                    let text = text.trim();
                    if text.is_empty() {
                        Ok(0)
                    } else {
                        text.parse()
                            .map_err(|_| E::custom(format!("expected integer, got {:?}", text)))
                    }
                }
            }
        }

        fn into_string(self) -> String {
            match self {
                Loose::Int(v) => v.to_string(),
                Loose::Uint(v) => v.to_string(),
                Loose::Float(v) => v.to_string(),
                Loose::Bool(v) => v.to_string(),
                Loose::Text(text) => text,
            }
        }
    }

    pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Option::<Loose>::deserialize(deserializer)? {
            Some(value) => value.into_int(),
            None => Ok(0),
        }
    }

    pub fn opt_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        Option::<Loose>::deserialize(deserializer)?
            .map(Loose::into_int)
            .transpose()
    }

    pub fn port<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
        let value = int(deserializer)?;
        u16::try_from(value).map_err(|_| de::Error::custom(format!("invalid port {}", value)))
    }

    pub fn opt_port<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u16>, D::Error> {
        match opt_int(deserializer)? {
            Some(value) => u16::try_from(value)
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid port {}", value))),
            None => Ok(None),
        }
    }

    pub fn boolean<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Option::<Loose>::deserialize(deserializer)? {
            Some(Loose::Bool(v)) => Ok(v),
            Some(Loose::Text(text)) => match text.trim() {
                "true" | "1" => Ok(true),
                "false" | "0" | "" => Ok(false),
                other => Err(de::Error::custom(format!("expected boolean, got {:?}", other))),
            },
            Some(other) => Ok(other.into_int::<D::Error>()? != 0),
            None => Ok(false),
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(Option::<Loose>::deserialize(deserializer)?
            .map(Loose::into_string)
            .unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(Option::<Loose>::deserialize(deserializer)?.map(Loose::into_string))
    }
}
