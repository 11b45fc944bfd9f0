//! Dynamic values carried by promise cells.
//!
//! A cell's outcome is a [`Value`]. Most variants are plain data. Two are
//! special to the resolution procedure:
//!
//! - [`Value::Promise`]: another cell; resolving with it adopts its outcome.
//! - [`Value::Object`]: a foreign object that may expose a callable `then`
//!   member (a *thenable*); resolving with it invokes that member.
//!
//! Foreign objects implement [`Thenable`]. Reading the member may fail
//! (`Err(reason)`), and an object without a callable member is treated as a
//! plain value.

use crate::error::Error;
use crate::promise::{Promise, Resolvers};
use crate::types::Settled;
use core::fmt;
use std::collections::BTreeMap;
use std::rc::Rc;

/// The result of running a continuation: `Ok` returns a value, `Err` throws a reason.
pub type Completion = Result<Value, Value>;

/// A callable `then` member.
///
/// Invoked once per resolution attempt with a fresh [`Resolvers`] pair.
/// Returning `Err(reason)` models the invocation throwing.
pub type ThenHook = Rc<dyn Fn(Resolvers) -> Result<(), Value>>;

/// A foreign object that may behave like a promise.
pub trait Thenable: fmt::Debug {
    /// Reads the object's `then` member.
    ///
    /// - `Ok(Some(hook))`: the member is callable
    /// - `Ok(None)`: absent or not callable; the object is a plain value
    /// - `Err(reason)`: reading the member threw
    fn then_member(&self) -> Result<Option<ThenHook>, Value>;
}

/// A dynamically typed value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value.
    #[default]
    Undefined,
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Immutable string.
    Str(Rc<str>),
    /// Ordered sequence.
    List(Vec<Value>),
    /// Another promise cell.
    Promise(Promise),
    /// Foreign object, possibly thenable.
    Object(Rc<dyn Thenable>),
    /// Error produced by the core.
    Error(Error),
    /// Settlement descriptor produced by `all_settled`.
    Outcome(Box<Settled>),
}

impl Value {
    /// Wraps a closure as a thenable object.
    #[must_use]
    pub fn thenable<F>(then: F) -> Self
    where
        F: Fn(Resolvers) -> Result<(), Value> + 'static,
    {
        Self::Object(Rc::new(FnThenable::new(then)))
    }

    /// Wraps any [`Thenable`] implementation.
    #[must_use]
    pub fn object<T: Thenable + 'static>(object: T) -> Self {
        Self::Object(Rc::new(object))
    }

    /// Returns true for `Undefined`.
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns the integer payload.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the numeric payload widened to `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Returns the boolean payload.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string payload.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the sequence payload.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the promise payload.
    #[must_use]
    pub const fn as_promise(&self) -> Option<&Promise> {
        match self {
            Self::Promise(p) => Some(p),
            _ => None,
        }
    }

    /// Returns the core error payload.
    #[must_use]
    pub const fn as_error(&self) -> Option<&Error> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the settlement descriptor payload.
    #[must_use]
    pub fn as_outcome(&self) -> Option<&Settled> {
        match self {
            Self::Outcome(s) => Some(s),
            _ => None,
        }
    }

    /// Short type name for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Promise(_) => "promise",
            Self::Object(_) => "object",
            Self::Error(_) => "error",
            Self::Outcome(_) => "outcome",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Promise(a), Self::Promise(b)) => a.ptr_eq(b),
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::Error(a), Self::Error(b)) => a == b,
            (Self::Outcome(a), Self::Outcome(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{:?}", &**s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Promise(p) => write!(f, "Promise({})", p.id()),
            Self::Object(_) => f.write_str("[object]"),
            Self::Error(e) => write!(f, "{e}"),
            Self::Outcome(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(Rc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<Promise> for Value {
    fn from(p: Promise) -> Self {
        Self::Promise(p)
    }
}

impl From<&Promise> for Value {
    fn from(p: &Promise) -> Self {
        Self::Promise(p.clone())
    }
}

impl From<Error> for Value {
    fn from(e: Error) -> Self {
        Self::Error(e)
    }
}

impl From<Settled> for Value {
    fn from(s: Settled) -> Self {
        Self::Outcome(Box::new(s))
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Undefined
    }
}

/// A thenable backed by a closure.
pub struct FnThenable {
    hook: ThenHook,
}

impl FnThenable {
    /// Creates a thenable whose `then` member is `then`.
    pub fn new<F>(then: F) -> Self
    where
        F: Fn(Resolvers) -> Result<(), Value> + 'static,
    {
        Self {
            hook: Rc::new(then),
        }
    }
}

impl fmt::Debug for FnThenable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnThenable").finish_non_exhaustive()
    }
}

impl Thenable for FnThenable {
    fn then_member(&self) -> Result<Option<ThenHook>, Value> {
        Ok(Some(Rc::clone(&self.hook)))
    }
}

/// A foreign object with named fields and no callable `then`.
///
/// Resolving with a `PlainObject` fulfills with the object itself, even if it
/// has a field called `then`: a data field is never callable.
#[derive(Debug, Clone, Default)]
pub struct PlainObject {
    fields: BTreeMap<String, Value>,
}

impl PlainObject {
    /// Creates an empty object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl Thenable for PlainObject {
    fn then_member(&self) -> Result<Option<ThenHook>, Value> {
        Ok(None)
    }
}
