//! Command-expression dispatcher.
//!
//! Turns one line of chat text such as `add(oc_1, ou_a, ou_b)` or `help`
//! into a call on a capability object and returns the call's reply.
//!
//! # Pipeline
//!
//! 1. [`parse`] splits the line into a lower-cased name and raw arguments.
//! 2. [`Registry`] resolves the name against the object's operation table,
//!    ignoring case.
//! 3. [`bind`] checks arity and wraps the arguments in their tag types,
//!    collecting a variadic tail.
//! 4. The operation's invoke function runs once and its text is the reply.
//!
//! Any failure along the way becomes one of four sentinel replies (see
//! [`CallError`]); nothing escapes [`call`] as a panic or an error value.
//!
//! # Capability objects
//!
//! ```rust
//! use larkbot_calls::{
//!     Arguments, CommandObject, Operation, ParamType, Reply, Signature, call, describe,
//!     immediate, tag_type,
//! };
//!
//! tag_type! {
//!     pub struct ChatId;
//! }
//!
//! struct Console;
//!
//! const CHAT_ID: ParamType = ParamType::single::<ChatId>();
//!
//! fn ping(_: &Console, mut args: Arguments) -> Reply<'_> {
//!     let chat: ChatId = args.single();
//!     immediate(format!("pong {chat}"))
//! }
//!
//! fn help(_: &Console, _: Arguments) -> Reply<'_> {
//!     immediate(describe::<Console>())
//! }
//!
//! static OPERATIONS: &[Operation<Console>] = &[
//!     Operation::new(Signature::fixed("Ping", &[CHAT_ID]), ping),
//!     Operation::new(Signature::fixed("Help", &[]), help),
//! ];
//!
//! impl CommandObject for Console {
//!     fn operations() -> &'static [Operation<Self>] {
//!         OPERATIONS
//!     }
//! }
//!
//! # futures::executor::block_on(async {
//! assert_eq!(call(&Console, "PING(oc_1)").await, "pong oc_1");
//! assert_eq!(call(&Console, "help").await, "Ping(ChatId)\nHelp()");
//! assert_eq!(call(&Console, "ping()").await, "too few arguments");
//! # });
//! ```

mod arguments;
mod error;
mod help;
mod operation;
mod parser;
mod registry;

use tracing::debug;

pub use arguments::{Arguments, Bound, bind};
pub use error::{
    CALL_TOO_FEW_ARGUMENTS, CALL_TOO_MANY_ARGUMENTS, CALL_UNKNOWN_EXPRESSION,
    CALL_UNKNOWN_FUNCTION, CallError,
};
pub use help::{describe, render};
pub use operation::{
    CommandObject, Invoke, Operation, ParamType, Reply, Shape, Signature, Tag, immediate,
};
pub use parser::{Expression, parse};
pub use registry::Registry;

/// A call that passed parsing, resolution and binding.
pub struct Prepared<'a, C: 'static> {
    object: &'a C,
    operation: &'static Operation<C>,
    arguments: Arguments,
}

impl<'a, C: 'static> Prepared<'a, C> {
    /// Signature of the resolved operation.
    pub fn signature(&self) -> &'static Signature {
        &self.operation.signature
    }

    /// The bound arguments.
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Run the operation. Its reply is returned unchanged.
    pub fn invoke(self) -> Reply<'a> {
        (self.operation.invoke)(self.object, self.arguments)
    }
}

impl<C: 'static> std::fmt::Debug for Prepared<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prepared")
            .field("operation", &self.operation.signature.name)
            .field("arguments", &self.arguments)
            .finish()
    }
}

/// Parse, resolve and bind `expression` against `object` without invoking.
pub fn prepare<'a, C: CommandObject>(
    object: &'a C,
    expression: &str,
) -> Result<Prepared<'a, C>, CallError> {
    let Expression { name, args } = parse(expression)?;
    let operation = Registry::<C>::new().resolve(&name)?;
    let arguments = bind(args, &operation.signature)?;

    Ok(Prepared {
        object,
        operation,
        arguments,
    })
}

/// Dispatch one line of text to `object` and return the reply.
pub async fn call<C: CommandObject>(object: &C, expression: &str) -> String {
    match prepare(object, expression) {
        Ok(prepared) => {
            debug!("Invoking {}", prepared.signature().name);
            prepared.invoke().await
        }
        Err(err) => {
            debug!("Rejected call {:?}: {}", expression, err);
            err.to_string()
        }
    }
}
