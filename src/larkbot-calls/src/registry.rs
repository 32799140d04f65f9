//! Case-insensitive lookup over a capability object's operation table.

use crate::error::CallError;
use crate::operation::{CommandObject, Operation};

/// Registry of the operations a capability object exposes.
///
/// A read-only view of the static operation table; building one allocates
/// nothing, so two registries of the same capability object are identical.
#[derive(Debug)]
pub struct Registry<C: 'static> {
    /// Operations in declaration order.
    operations: &'static [Operation<C>],
}

impl<C: 'static> Clone for Registry<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: 'static> Copy for Registry<C> {}

impl<C: CommandObject> Registry<C> {
    /// Build the registry for `C`.
    pub fn new() -> Self {
        Self::from_operations(C::operations())
    }
}

impl<C: CommandObject> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> Registry<C> {
    /// Build a registry over an explicit operation table.
    pub fn from_operations(operations: &'static [Operation<C>]) -> Self {
        debug_assert!(
            operations.iter().enumerate().all(|(i, op)| {
                operations[..i]
                    .iter()
                    .all(|prev| !prev.name().eq_ignore_ascii_case(op.name()))
            }),
            "operation names differ only by case"
        );

        Self { operations }
    }

    /// Resolve a name, ignoring case.
    pub fn resolve(&self, name: &str) -> Result<&'static Operation<C>, CallError> {
        self.get(name).ok_or(CallError::UnknownFunction)
    }

    /// Get an operation by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&'static Operation<C>> {
        let operations: &'static [Operation<C>] = self.operations;
        operations
            .iter()
            .find(|op| op.name().eq_ignore_ascii_case(name))
    }

    /// Check if an operation exists, ignoring case.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Canonical operation names in declaration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.operations.iter().map(Operation::name).collect()
    }

    /// Operations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &'static Operation<C>> {
        let operations: &'static [Operation<C>] = self.operations;
        operations.iter()
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::Arguments;
    use crate::operation::{ParamType, Reply, Signature, immediate};

    struct Lamp;

    const TEXT: ParamType = ParamType::single::<String>();

    fn on(_: &Lamp, _: Arguments) -> Reply<'_> {
        immediate("on")
    }

    fn dim(_: &Lamp, mut args: Arguments) -> Reply<'_> {
        immediate(format!("dim {}", args.single::<String>()))
    }

    static LAMP: &[Operation<Lamp>] = &[
        Operation::new(Signature::fixed("TurnOn", &[]), on),
        Operation::new(Signature::fixed("Dim", &[TEXT]), dim),
    ];

    impl CommandObject for Lamp {
        fn operations() -> &'static [Operation<Self>] {
            LAMP
        }
    }

    #[test]
    fn test_resolve_ignores_case() {
        let registry = Registry::<Lamp>::new();

        for name in ["turnon", "TURNON", "TurnOn", "tUrNoN"] {
            assert_eq!(registry.resolve(name).unwrap().name(), "TurnOn");
        }
        assert!(registry.contains("DIM"));
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = Registry::<Lamp>::new();

        assert_eq!(
            registry.resolve("bogus").unwrap_err(),
            CallError::UnknownFunction
        );
        assert!(registry.get("").is_none());
    }

    #[test]
    fn test_declaration_order() {
        let registry = Registry::<Lamp>::default();

        assert_eq!(registry.names(), vec!["TurnOn", "Dim"]);
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
        assert_eq!(
            registry.iter().map(|op| op.signature.params.len()).collect::<Vec<_>>(),
            vec![0, 1]
        );
    }

    #[test]
    fn test_resolve_points_into_static_table() {
        let registry = Registry::<Lamp>::new();
        let copy = registry;

        assert!(std::ptr::eq(registry.resolve("dim").unwrap(), &LAMP[1]));
        assert!(std::ptr::eq(copy.resolve("TURNON").unwrap(), &LAMP[0]));
    }
}
