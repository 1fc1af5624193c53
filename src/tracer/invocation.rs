//! Argument capture for traced calls
//!
//! Rust has no variadic or keyword arguments, so a traced call receives its arguments
//! as a single value:
//!
//! - a tuple `(a, b, ...)` of `Debug` values, spread into an `Fn(A, B, ...)`
//! - [`Kwargs<T>`], a serializable struct whose fields are rendered as named arguments
//! - [`Arguments`], a type-erased list of positional and named JSON values
//!
//! [`TraceArgs`] renders any of these into an [`InvocationRecord`] by reference,
//! and [`Invoke`] hands the same value, unchanged, to the target callable.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Rendered arguments of one call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationRecord {
    pub positional: Vec<String>,
    pub named: Vec<(String, String)>,
}

impl InvocationRecord {
    /// Positional arguments in tuple notation: `()`, `(1,)`, `(1, 2)`
    pub fn positional_repr(&self) -> String {
        match self.positional.as_slice() {
            [only] => format!("({},)", only),
            all => format!("({})", all.join(", ")),
        }
    }

    /// Named arguments in map notation: `{}`, `{a: 6, b: 3}`
    pub fn named_repr(&self) -> String {
        let pairs: Vec<String> = self.named.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        format!("{{{}}}", pairs.join(", "))
    }
}

impl fmt::Display for InvocationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.positional_repr(), self.named_repr())
    }
}

/// Types that can describe themselves as call arguments
pub trait TraceArgs {
    fn record(&self) -> InvocationRecord;
}

/// A callable that can be invoked with an argument value of type `Args`
///
/// Implemented for every `Fn(A, B, ...) -> R` with `Args = (A, B, ...)` up to eight
/// parameters, for `Fn(T) -> R` with `Args = Kwargs<T>`, and for `Fn(Arguments) -> R`.
pub trait Invoke<Args> {
    type Output;

    fn invoke(&self, args: Args) -> Self::Output;
}

macro_rules! impl_tuple_args {
    ($($name:ident),*) => {
        impl<$($name: fmt::Debug),*> TraceArgs for ($($name,)*) {
            #[allow(non_snake_case)]
            fn record(&self) -> InvocationRecord {
                let ($($name,)*) = self;
                InvocationRecord {
                    positional: vec![$(format!("{:?}", $name)),*],
                    named: Vec::new(),
                }
            }
        }

        impl<Func, Ret, $($name),*> Invoke<($($name,)*)> for Func
        where
            Func: Fn($($name),*) -> Ret,
        {
            type Output = Ret;

            #[allow(non_snake_case)]
            fn invoke(&self, ($($name,)*): ($($name,)*)) -> Ret {
                self($($name),*)
            }
        }
    };
}

impl_tuple_args!();
impl_tuple_args!(A);
impl_tuple_args!(A, B);
impl_tuple_args!(A, B, C);
impl_tuple_args!(A, B, C, D);
impl_tuple_args!(A, B, C, D, E);
impl_tuple_args!(A, B, C, D, E, F);
impl_tuple_args!(A, B, C, D, E, F, G);
impl_tuple_args!(A, B, C, D, E, F, G, H);

/// A struct passed as named arguments
///
/// ```rust,ignore
/// #[derive(Serialize)]
/// struct Divide { a: i64, b: i64 }
///
/// traced.call(Kwargs(Divide { a: 6, b: 3 }));  // TRACE: calling divide() with (), {a: 6, b: 3}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Kwargs<T>(pub T);

impl<T: Serialize> TraceArgs for Kwargs<T> {
    fn record(&self) -> InvocationRecord {
        match serde_json::to_value(&self.0) {
            Ok(Value::Object(fields)) => InvocationRecord {
                positional: Vec::new(),
                named: fields.into_iter().map(|(k, v)| (k, v.to_string())).collect(),
            },
            Ok(Value::Null) => InvocationRecord::default(),
            Ok(other) => InvocationRecord {
                positional: vec![other.to_string()],
                named: Vec::new(),
            },
            Err(e) => InvocationRecord {
                positional: vec![format!("<unrenderable: {}>", e)],
                named: Vec::new(),
            },
        }
    }
}

impl<Func, Ret, T> Invoke<Kwargs<T>> for Func
where
    Func: Fn(T) -> Ret,
{
    type Output = Ret;

    fn invoke(&self, args: Kwargs<T>) -> Ret {
        self(args.0)
    }
}

/// Type-erased positional and named arguments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arguments {
    positional: Vec<Value>,
    named: Map<String, Value>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a named argument; a repeated name replaces the earlier value in place
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn named(&self) -> &Map<String, Value> {
        &self.named
    }

    /// Positional argument at `index`
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Named argument `name`
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.named.get(name)
    }

    /// Named argument `name`, falling back to the positional slot `index`
    pub fn lookup(&self, name: &str, index: usize) -> Option<&Value> {
        self.get_named(name).or_else(|| self.get(index))
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TraceArgs for Arguments {
    fn record(&self) -> InvocationRecord {
        InvocationRecord {
            positional: self.positional.iter().map(Value::to_string).collect(),
            named: self.named.iter().map(|(k, v)| (k.clone(), v.to_string())).collect(),
        }
    }
}

impl<Func, Ret> Invoke<Arguments> for Func
where
    Func: Fn(Arguments) -> Ret,
{
    type Output = Ret;

    fn invoke(&self, args: Arguments) -> Ret {
        self(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tuple_records() {
        assert_eq!(().record().to_string(), "(), {}");
        assert_eq!((1,).record().to_string(), "(1,), {}");
        assert_eq!((1, 2).record().to_string(), "(1, 2), {}");
        assert_eq!((6.0, "x", Some(3)).record().to_string(), "(6.0, \"x\", Some(3)), {}");
    }

    #[test]
    fn test_tuple_invoke_spreads_arguments() {
        let add = |a: i32, b: i32| a + b;
        assert_eq!(add.invoke((2, 3)), 5);

        let constant = || 7;
        assert_eq!(constant.invoke(()), 7);

        fn eight(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8, g: u8, h: u8) -> u32 {
            [a, b, c, d, e, f, g, h].iter().map(|&x| x as u32).sum()
        }
        assert_eq!(eight.invoke((1, 2, 3, 4, 5, 6, 7, 8)), 36);
    }

    #[test]
    fn test_arguments_passed_by_value_unchanged() {
        let take = |v: Vec<String>| v;
        let input = vec!["a".to_string(), "b".to_string()];
        assert_eq!(take.invoke((input.clone(),)), input);
    }

    #[derive(Serialize)]
    struct Divide {
        a: i64,
        b: i64,
    }

    #[test]
    fn test_kwargs_record_keeps_field_order() {
        let record = Kwargs(Divide { a: 6, b: 3 }).record();
        assert!(record.positional.is_empty());
        assert_eq!(record.to_string(), "(), {a: 6, b: 3}");
    }

    #[test]
    fn test_kwargs_invoke() {
        let divide = |d: Divide| d.a / d.b;
        assert_eq!(divide.invoke(Kwargs(Divide { a: 6, b: 3 })), 2);
    }

    #[test]
    fn test_kwargs_non_object() {
        assert_eq!(Kwargs(5).record().to_string(), "(5,), {}");
        assert_eq!(Kwargs(()).record().to_string(), "(), {}");
    }

    #[test]
    fn test_arguments_builder_and_record() {
        let args = Arguments::new().arg(1).arg(2).kwarg("x", 3);
        assert_eq!(args.len(), 3);
        assert_eq!(args.get(1), Some(&json!(2)));
        assert_eq!(args.get_named("x"), Some(&json!(3)));
        assert_eq!(args.record().to_string(), "(1, 2), {x: 3}");
    }

    #[test]
    fn test_arguments_named_order_and_replace() {
        let args = Arguments::new().kwarg("b", 3).kwarg("a", 6).kwarg("b", 4);
        assert_eq!(args.record().named_repr(), "{b: 4, a: 6}");
    }

    #[test]
    fn test_arguments_lookup_falls_back_to_position() {
        let args = Arguments::new().arg(6).kwarg("b", 3);
        assert_eq!(args.lookup("a", 0), Some(&json!(6)));
        assert_eq!(args.lookup("b", 1), Some(&json!(3)));
        assert_eq!(args.lookup("c", 2), None);
    }

    #[test]
    fn test_arguments_invoke() {
        let count = |args: Arguments| args.len();
        assert_eq!(count.invoke(Arguments::new().arg("x").kwarg("y", true)), 2);
        assert!(Arguments::new().is_empty());
    }
}
