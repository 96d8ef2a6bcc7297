//! Encode/decode policy shared by every strategy adapter.
//!
//! Decoding collapses every failure to `None`: empty text, malformed text, a
//! decoder that returns `None` or panics, a falsy decoded value, a value
//! rejected by the validator, or a validator that panics. Callers cannot tell
//! these apart.
//!
//! A decoded value is falsy when its JSON form is `null`, `false`, a zero
//! number or an empty string. Falsy values never reach the validator.

use std::num::FpCategory;
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};
use crate::strategy::traits::{ReadOptions, SerializeFn};

/// Decode and validate the raw text read for `options.key`.
pub fn decode_value<T>(raw: Option<String>, options: &ReadOptions<'_, T>) -> Option<T>
where
    T: Serialize + DeserializeOwned,
{
    let raw = raw.filter(|raw| !raw.is_empty())?;

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let value = match options.deserialize {
            Some(deserialize) => deserialize(&raw),
            None => decode_json(&raw),
        }?;
        if is_falsy(&value) {
            return None;
        }
        (options.validate)(&value).then_some(value)
    }));

    match outcome {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            debug!(key = options.key, "Stored value is undecodable or invalid");
            None
        }
        Err(_) => {
            warn!(key = options.key, "Decoder or validator panicked");
            None
        }
    }
}

/// Default decoder: JSON.
fn decode_json<T>(raw: &str) -> Option<T>
where
    T: DeserializeOwned,
{
    serde_json::from_str(raw).ok()
}

/// Whether `value` reads as "no value" once decoded.
fn is_falsy<T: Serialize>(value: &T) -> bool {
    match serde_json::to_value(value) {
        Ok(Value::Null | Value::Bool(false)) => true,
        Ok(Value::Number(n)) => n
            .as_f64()
            .is_some_and(|f| f.classify() == FpCategory::Zero),
        Ok(Value::String(s)) => s.is_empty(),
        // Arrays, objects, and values with no JSON form.
        _ => false,
    }
}

/// Encode `value` with the custom encoder, or JSON by default.
///
/// # Errors
///
/// Returns [`StorageError::Serialization`] if encoding fails or the custom
/// encoder panics.
pub fn encode_value<T>(value: &T, serialize: Option<&SerializeFn<T>>) -> StorageResult<String>
where
    T: Serialize,
{
    match serialize {
        Some(serialize) => catch_unwind(AssertUnwindSafe(|| serialize(value)))
            .map_err(|_| StorageError::Serialization("custom serializer panicked".to_string())),
        None => Ok(serde_json::to_string(value)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::traits::{DeserializeFn, ValidateFn};

    fn accept_all(_: &i64) -> bool {
        true
    }

    fn read<'a>(
        validate: &'a ValidateFn<i64>,
        deserialize: Option<&'a DeserializeFn<i64>>,
    ) -> ReadOptions<'a, i64> {
        ReadOptions {
            key: "clicks",
            validate,
            deserialize,
        }
    }

    #[test]
    fn test_decode_json() {
        let options = read(&accept_all, None);
        assert_eq!(decode_value(Some("42".to_string()), &options), Some(42));
        assert_eq!(decode_value(Some("-3".to_string()), &options), Some(-3));
    }

    #[test]
    fn test_decode_falsy_is_absent() {
        let options = read(&accept_all, None);
        assert_eq!(decode_value(Some("0".to_string()), &options), None);

        let flags = |_: &bool| true;
        let options = ReadOptions {
            key: "enabled",
            validate: &flags,
            deserialize: None,
        };
        assert_eq!(decode_value(Some("false".to_string()), &options), None);
        assert_eq!(decode_value(Some("true".to_string()), &options), Some(true));

        let names = |_: &String| true;
        let options = ReadOptions {
            key: "name",
            validate: &names,
            deserialize: None,
        };
        assert_eq!(decode_value(Some("\"\"".to_string()), &options), None);
        assert_eq!(
            decode_value(Some("\"ada\"".to_string()), &options).as_deref(),
            Some("ada")
        );

        let ratios = |_: &f64| true;
        let options = ReadOptions {
            key: "ratio",
            validate: &ratios,
            deserialize: None,
        };
        assert_eq!(decode_value(Some("0.0".to_string()), &options), None);
        assert_eq!(decode_value(Some("0.5".to_string()), &options), Some(0.5));
    }

    #[test]
    fn test_falsy_value_skips_validator() {
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = std::sync::Arc::clone(&calls);
        let counting = move |_: &i64| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            true
        };
        let options = read(&counting, None);
        assert_eq!(decode_value(Some("0".to_string()), &options), None);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn test_custom_decoder_falsy_is_absent() {
        let zero = |_: &str| Some(0_i64);
        let options = read(&accept_all, Some(&zero));
        assert_eq!(decode_value(Some("anything".to_string()), &options), None);
    }

    #[test]
    fn test_decode_absent_or_empty() {
        let options = read(&accept_all, None);
        assert_eq!(decode_value(None, &options), None);
        assert_eq!(decode_value(Some(String::new()), &options), None);
        assert_eq!(decode_value(Some("null".to_string()), &options), None);
    }

    #[test]
    fn test_decode_malformed() {
        let options = read(&accept_all, None);
        assert_eq!(decode_value(Some("{oops".to_string()), &options), None);
        assert_eq!(decode_value(Some("\"text\"".to_string()), &options), None);
    }

    #[test]
    fn test_validation_gate() {
        let non_negative = |v: &i64| *v >= 0;
        let options = read(&non_negative, None);
        assert_eq!(decode_value(Some("-1".to_string()), &options), None);
        assert_eq!(decode_value(Some("1".to_string()), &options), Some(1));
    }

    #[test]
    fn test_custom_decoder() {
        let hex = |raw: &str| i64::from_str_radix(raw, 16).ok();
        let options = read(&accept_all, Some(&hex));
        assert_eq!(decode_value(Some("ff".to_string()), &options), Some(255));
        assert_eq!(decode_value(Some("zz".to_string()), &options), None);
    }

    #[test]
    fn test_panicking_decoder_and_validator() {
        let boom = |_: &str| -> Option<i64> { panic!("decoder failure") };
        let options = read(&accept_all, Some(&boom));
        assert_eq!(decode_value(Some("1".to_string()), &options), None);

        let strict = |_: &i64| -> bool { panic!("validator failure") };
        let options = read(&strict, None);
        assert_eq!(decode_value(Some("1".to_string()), &options), None);
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode_value(&5_i64, None).unwrap(), "5");

        let hex = |v: &i64| format!("{v:x}");
        assert_eq!(encode_value(&255_i64, Some(&hex)).unwrap(), "ff");

        let boom = |_: &i64| -> String { panic!("encoder failure") };
        assert!(matches!(
            encode_value(&1_i64, Some(&boom)),
            Err(StorageError::Serialization(_))
        ));
    }
}
