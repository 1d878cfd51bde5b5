//! # Validation & Codec Layer
//!
//! A [`Codec`] is the contract a [`PersistedCell`](crate::cell::PersistedCell) uses
//! to move a value in and out of its durable slot:
//!
//! - `serialize`: value → slot string
//! - `deserialize`: slot string → value (shape check)
//! - `validate`: semantic check on an already-typed value
//!
//! Both checks return a [`ValidationError`] naming the offending field so the cell
//! can log *why* a payload was rejected before falling back.
//!
//! ## Implementations
//!
//! - [`JsonCodec`]: serde_json plus the type's own [`Validate`] impl. The default
//!   for every structured slot.
//! - [`DisplayCodec`]: bare strings through `Display`/`FromStr`, for slots that hold
//!   a single token (e.g. `"grid"`).

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::error::ValidationError;

/// Semantic checks a persisted type performs beyond its serde shape.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

pub trait Codec<T> {
    fn serialize(&self, value: &T) -> Result<String, ValidationError>;

    fn deserialize(&self, raw: &str) -> Result<T, ValidationError>;

    fn validate(&self, _value: &T) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Deserialize then validate: the full acceptance check for an inbound payload.
    fn decode(&self, raw: &str) -> Result<T, ValidationError> {
        let value = self.deserialize(raw)?;
        self.validate(&value)?;
        Ok(value)
    }
}

/// serde_json codec. Shape errors carry serde's line/column message.
pub struct JsonCodec<T>(PhantomData<fn() -> T>);

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Codec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned + Validate,
{
    fn serialize(&self, value: &T) -> Result<String, ValidationError> {
        serde_json::to_string(value).map_err(|e| ValidationError::whole(e.to_string()))
    }

    fn deserialize(&self, raw: &str) -> Result<T, ValidationError> {
        serde_json::from_str(raw).map_err(|e| ValidationError::whole(e.to_string()))
    }

    fn validate(&self, value: &T) -> Result<(), ValidationError> {
        value.validate()
    }
}

/// Plain-token codec for single-value slots.
pub struct DisplayCodec<T>(PhantomData<fn() -> T>);

impl<T> DisplayCodec<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for DisplayCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Codec<T> for DisplayCodec<T>
where
    T: Display + FromStr,
    T::Err: Display,
{
    fn serialize(&self, value: &T) -> Result<String, ValidationError> {
        Ok(value.to_string())
    }

    fn deserialize(&self, raw: &str) -> Result<T, ValidationError> {
        raw.parse()
            .map_err(|e: T::Err| ValidationError::whole(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ViewMode;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Counter {
        value: i64,
    }

    impl Validate for Counter {
        fn validate(&self) -> Result<(), ValidationError> {
            if self.value < 0 {
                return Err(ValidationError::new("value", "must not be negative"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_json_codec_decodes_valid_payload() {
        let codec = JsonCodec::<Counter>::new();
        assert_eq!(codec.decode(r#"{"value":3}"#).unwrap(), Counter { value: 3 });
    }

    #[test]
    fn test_json_codec_reports_shape_errors() {
        let codec = JsonCodec::<Counter>::new();
        assert!(codec.decode("not json").is_err());
        assert!(codec.decode(r#"{"value":"three"}"#).is_err());
    }

    #[test]
    fn test_json_codec_runs_semantic_validation() {
        let codec = JsonCodec::<Counter>::new();
        let err = codec.decode(r#"{"value":-1}"#).unwrap_err();
        assert_eq!(err.path, "value");
    }

    #[test]
    fn test_display_codec_uses_bare_tokens() {
        let codec = DisplayCodec::<ViewMode>::new();
        assert_eq!(codec.serialize(&ViewMode::List).unwrap(), "list");
        assert_eq!(codec.decode("grid").unwrap(), ViewMode::Grid);
        assert!(codec.decode("\"grid\"").is_err());
    }
}
