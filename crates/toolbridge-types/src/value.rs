//! Type-erased values carried through resolver chains.

use std::any::Any;
use std::fmt;
use std::path::PathBuf;

use crate::key::TypeKey;

/// A value that can take part in resolution.
///
/// `type_key` is the runtime type identity used for routing; it may differ
/// from the Rust type (every proxy is a `Proxy` struct, but each file kind has
/// its own key).
pub trait Resolvable: Any + fmt::Debug + Send {
    fn type_key(&self) -> TypeKey;

    /// Plain string form, used when a value is resolved as a string.
    fn render(&self) -> String;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

macro_rules! impl_resolvable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Resolvable for $ty {
                fn type_key(&self) -> TypeKey {
                    TypeKey::of::<$ty>()
                }

                fn render(&self) -> String {
                    self.to_string()
                }

                fn as_any(&self) -> &dyn Any {
                    self
                }

                fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
                    self
                }
            }
        )*
    };
}

impl_resolvable!(bool, i64, u64, f64, String);

impl Resolvable for PathBuf {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<PathBuf>()
    }

    fn render(&self) -> String {
        self.display().to_string()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// Raw data buffers render as (lossy) UTF-8.
impl Resolvable for Vec<u8> {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<Vec<u8>>()
    }

    fn render(&self) -> String {
        String::from_utf8_lossy(self).into_owned()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// Owned, type-erased value.
pub struct Value(Box<dyn Resolvable>);

impl Value {
    pub fn new<T: Resolvable>(value: T) -> Self {
        Self(Box::new(value))
    }

    pub fn type_key(&self) -> TypeKey {
        self.0.type_key()
    }

    pub fn render(&self) -> String {
        self.0.render()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Take the inner value, handing `self` back if it is not a `T`.
    pub fn downcast<T: Any>(self) -> Result<T, Value> {
        if !self.is::<T>() {
            return Err(self);
        }
        match self.0.into_any().downcast::<T>() {
            Ok(inner) => Ok(*inner),
            Err(_) => unreachable!("type checked above"),
        }
    }
}

impl<T: Resolvable> From<T> for Value {
    fn from(value: T) -> Self {
        Value::new(value)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Heterogeneous list of values.
#[derive(Debug, Default)]
pub struct Tuple(pub Vec<Value>);

impl Tuple {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Resolvable for Tuple {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<Tuple>()
    }

    fn render(&self) -> String {
        self.0.iter().map(Value::render).collect::<Vec<_>>().join(" ")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downcast_round() {
        let value = Value::new(2.5_f64);
        assert_eq!(value.type_key(), TypeKey::of::<f64>());
        assert!(value.is::<f64>());

        let value = value.downcast::<i64>().unwrap_err();
        assert_eq!(value.downcast::<f64>().unwrap(), 2.5);
    }

    #[test]
    fn test_render() {
        assert_eq!(Value::new(10.0_f64).render(), "10");
        assert_eq!(Value::new(PathBuf::from("/tmp/a.vol")).render(), "/tmp/a.vol");

        let tuple = Tuple::new(vec![Value::new(1_i64), Value::new("x".to_string())]);
        assert_eq!(tuple.render(), "1 x");
        assert_eq!(Value::new(b"0.5 1.0".to_vec()).render(), "0.5 1.0");
        assert_eq!(tuple.len(), 2);
    }
}
