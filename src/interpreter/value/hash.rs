use std::hash::{DefaultHasher, Hash, Hasher};

use num_bigint::{BigInt, ToBigInt};
use num_traits::{FromPrimitive, ToPrimitive};
use ordered_float::OrderedFloat;

use crate::{
    error::RuntimeError,
    interpreter::{evaluator::core::EvalResult, value::core::Value},
};

/// Per-kind salt so that, say, a string and a list with the same content
/// hash apart. All numbers share one salt.
#[derive(Hash)]
enum Salt {
    Number,
    Boolean,
    Null,
    String,
    Bytes,
    Regex,
    List,
    Map,
    Set,
    Function,
}

impl Value {
    /// Computes the hash key used by maps and sets.
    ///
    /// Values that are equal under [`Value::equals`] hash alike: every
    /// integral number hashes by its exact integer value (so `1`, `0u1`,
    /// `1.0` and a big `1` collide on purpose), maps and sets hash
    /// independently of order, and functions hash by their source text.
    ///
    /// # Errors
    /// Returns a `TypeError` for builtins, namespaces, modules, processes,
    /// subscribers, errors and control-flow markers.
    ///
    /// # Example
    /// ```
    /// use blue::interpreter::value::core::Value;
    ///
    /// let a = Value::Integer(3).hash_key().unwrap();
    /// let b = Value::Float(3.0).hash_key().unwrap();
    /// assert_eq!(a, b);
    /// assert!(Value::Break.hash_key().is_err());
    /// ```
    pub fn hash_key(&self) -> EvalResult<u64> {
        let mut hasher = DefaultHasher::new();
        self.feed(&mut hasher)?;
        Ok(hasher.finish())
    }

    fn feed(&self, state: &mut DefaultHasher) -> EvalResult<()> {
        match self {
            Self::Integer(i) => hash_integer(state, *i),
            Self::UInteger(u) => match i64::try_from(*u) {
                Ok(i) => hash_integer(state, i),
                Err(_) => hash_big(state, &BigInt::from(*u)),
            },
            Self::BigInteger(b) => hash_big(state, b),
            Self::Float(f) => hash_float(state, *f),
            Self::BigFloat(d) => {
                if d.is_integer()
                   && let Some(b) = d.to_bigint()
                {
                    hash_big(state, &b);
                } else {
                    hash_float(state, d.to_f64().unwrap_or(f64::NAN));
                }
            },
            Self::Boolean(b) => (Salt::Boolean, b).hash(state),
            Self::Null => Salt::Null.hash(state),
            Self::String(s) => (Salt::String, &**s).hash(state),
            Self::Bytes(b) => (Salt::Bytes, &**b).hash(state),
            Self::Regex(r) => (Salt::Regex, r.as_str()).hash(state),
            Self::List(items) => {
                let items = items.snapshot();
                (Salt::List, items.len()).hash(state);
                for item in &items {
                    item.hash_key()?.hash(state);
                }
            },
            Self::Map(map) => {
                let map = map.snapshot();
                let mut combined = 0u64;
                for (key_hash, value) in map.hashed() {
                    combined ^= key_hash ^ value.hash_key()?;
                }
                (Salt::Map, map.len(), combined).hash(state);
            },
            Self::Set(set) => {
                let mut hashes = set.read().hashes().collect::<Vec<_>>();
                hashes.sort_unstable();
                (Salt::Set, hashes).hash(state);
            },
            Self::Function(function) => (Salt::Function, function.literal.to_string()).hash(state),
            other => {
                return Err(RuntimeError::type_error(format!("unhashable type: {}",
                                                            other.type_name())));
            },
        }
        Ok(())
    }
}

fn hash_integer(state: &mut DefaultHasher, value: i64) {
    (Salt::Number, value).hash(state);
}

fn hash_big(state: &mut DefaultHasher, value: &BigInt) {
    match i64::try_from(value) {
        Ok(i) => hash_integer(state, i),
        Err(_) => (Salt::Number, value.to_signed_bytes_le()).hash(state),
    }
}

/// Integral floats hash as the integer they equal; the rest by their bits,
/// with NaN and signed zero canonicalized.
fn hash_float(state: &mut DefaultHasher, value: f64) {
    if value.is_finite()
       && value.fract() == 0.0
       && let Some(b) = BigInt::from_f64(value)
    {
        hash_big(state, &b);
    } else {
        (Salt::Number, OrderedFloat(value)).hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::value::collection::MapValue;

    #[test]
    fn equal_numbers_hash_alike() {
        let one = Value::Integer(1).hash_key().unwrap();
        assert_eq!(one, Value::UInteger(1).hash_key().unwrap());
        assert_eq!(one, Value::Float(1.0).hash_key().unwrap());
        assert_eq!(one, Value::from(BigInt::from(1)).hash_key().unwrap());
    }

    #[test]
    fn map_hash_ignores_order() {
        let a = MapValue::from_pairs([(Value::from("a"), Value::Integer(1)),
                                      (Value::from("b"), Value::Integer(2))]).unwrap();
        let b = MapValue::from_pairs([(Value::from("b"), Value::Integer(2)),
                                      (Value::from("a"), Value::Integer(1))]).unwrap();
        assert_eq!(Value::from(a).hash_key().unwrap(), Value::from(b).hash_key().unwrap());
    }

    #[test]
    fn string_and_list_do_not_collide() {
        let s = Value::from("a").hash_key().unwrap();
        let l = Value::from(vec![Value::from("a")]).hash_key().unwrap();
        assert_ne!(s, l);
    }
}
