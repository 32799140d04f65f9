//! Operation tables: tag types, signatures and invoke functions.

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::arguments::Arguments;

/// A semantic string type used as an operation parameter.
///
/// Tags document what a parameter means (a chat id, a user id, ...) and
/// drive the help text. They never validate their content.
pub trait Tag: Sized {
    /// Name shown in help output.
    const NAME: &'static str;

    /// Wrap a raw argument.
    fn from_raw(raw: String) -> Self;

    /// Borrow the wrapped string.
    fn as_str(&self) -> &str;
}

impl Tag for String {
    const NAME: &'static str = "string";

    fn from_raw(raw: String) -> Self {
        raw
    }

    fn as_str(&self) -> &str {
        self
    }
}

/// Declare one or more string newtypes implementing [`Tag`].
///
/// The help name of each tag is the type name itself.
///
/// ```rust
/// larkbot_calls::tag_type! {
///     /// Identifier of a chat.
///     pub struct ChatId;
/// }
///
/// use larkbot_calls::Tag;
/// assert_eq!(ChatId::NAME, "ChatId");
/// assert_eq!(ChatId::from_raw("oc_1".into()).as_str(), "oc_1");
/// ```
#[macro_export]
macro_rules! tag_type {
    ($($(#[$meta:meta])* $vis:vis struct $name:ident;)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
            $vis struct $name(pub String);

            impl $crate::Tag for $name {
                const NAME: &'static str = stringify!($name);

                fn from_raw(raw: String) -> Self {
                    Self(raw)
                }

                fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl $name {
                /// Whether the wrapped string is empty.
                #[allow(dead_code)]
                pub fn is_empty(&self) -> bool {
                    self.0.is_empty()
                }
            }

            impl ::std::fmt::Display for $name {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<$name> for String {
                fn from(value: $name) -> String {
                    value.0
                }
            }
        )+
    };
}

/// Whether a parameter takes one value or a sequence of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A single tagged string.
    Single,
    /// An ordered sequence of tagged strings.
    Sequence,
}

/// The declared type of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamType {
    /// Tag name, e.g. `ChatId`.
    pub tag: &'static str,
    /// Single value or sequence.
    pub shape: Shape,
}

impl ParamType {
    /// A single value of tag `T`.
    pub const fn single<T: Tag>() -> Self {
        Self {
            tag: T::NAME,
            shape: Shape::Single,
        }
    }

    /// A sequence of values of tag `T`.
    pub const fn sequence<T: Tag>() -> Self {
        Self {
            tag: T::NAME,
            shape: Shape::Sequence,
        }
    }
}

/// Name and parameter list of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Canonical (display) name.
    pub name: &'static str,
    /// Declared parameters, in positional order.
    pub params: &'static [ParamType],
    /// The last parameter collects every remaining argument.
    pub variadic: bool,
}

impl Signature {
    /// A signature with a fixed number of parameters.
    pub const fn fixed(name: &'static str, params: &'static [ParamType]) -> Self {
        Self {
            name,
            params,
            variadic: false,
        }
    }

    /// A signature whose last parameter is a variadic sequence.
    ///
    /// `params` must end with a [`Shape::Sequence`] parameter.
    pub const fn variadic(name: &'static str, params: &'static [ParamType]) -> Self {
        Self {
            name,
            params,
            variadic: true,
        }
    }

    /// Minimum number of positional arguments.
    ///
    /// For a fixed signature this is also the maximum.
    pub fn required(&self) -> usize {
        if self.variadic {
            self.params.len().saturating_sub(1)
        } else {
            self.params.len()
        }
    }
}

/// The pending reply of an invoked operation.
pub type Reply<'a> = BoxFuture<'a, String>;

/// Invoke function stored in an operation table.
pub type Invoke<C> = for<'a> fn(&'a C, Arguments) -> Reply<'a>;

/// One entry of a capability object's operation table.
pub struct Operation<C> {
    /// What the operation accepts.
    pub signature: Signature,
    /// Performs the call with already-bound arguments.
    pub invoke: Invoke<C>,
}

impl<C> Operation<C> {
    /// Create a table entry.
    pub const fn new(signature: Signature, invoke: Invoke<C>) -> Self {
        Self { signature, invoke }
    }

    /// Canonical name of the operation.
    pub fn name(&self) -> &'static str {
        self.signature.name
    }
}

impl<C> std::fmt::Debug for Operation<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// A value exposing a fixed, enumerable set of operations.
///
/// The table is static: it depends only on the implementing type, never on
/// the instance the operations are invoked on.
pub trait CommandObject: Sync + Sized + 'static {
    /// Every operation, in declaration order.
    fn operations() -> &'static [Operation<Self>];
}

/// Wrap an already-known reply.
pub fn immediate<'a>(text: impl Into<String>) -> Reply<'a> {
    futures::future::ready(text.into()).boxed()
}
