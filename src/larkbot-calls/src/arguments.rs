//! Argument binding.
//!
//! Binding only checks arity. Every string is a valid value for every tag,
//! so content never makes a call fail at this stage.

use std::collections::VecDeque;

use tracing::warn;

use crate::error::CallError;
use crate::operation::{Shape, Signature, Tag};

/// One bound positional value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound {
    /// Value for a single parameter.
    Single(String),
    /// Values for a sequence parameter, in argument order.
    Sequence(Vec<String>),
}

/// Arguments bound to a signature, aligned 1:1 with its parameters.
///
/// Invoke functions consume them front to back with [`Arguments::single`]
/// and [`Arguments::sequence`], following the declared parameter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    values: VecDeque<Bound>,
}

impl Arguments {
    /// Number of values not yet consumed.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether every value has been consumed.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Take the next value as a single tagged string.
    ///
    /// Reading a value the signature does not declare is a bug in the
    /// operation table: it panics in debug builds and yields an empty or
    /// first value otherwise.
    pub fn single<T: Tag>(&mut self) -> T {
        match self.values.pop_front() {
            Some(Bound::Single(raw)) => T::from_raw(raw),
            Some(Bound::Sequence(values)) => {
                warn!("{} parameter bound to a sequence, using its first value", T::NAME);
                debug_assert!(false, "{} parameter bound to a sequence", T::NAME);
                T::from_raw(values.into_iter().next().unwrap_or_default())
            }
            None => {
                warn!("{} parameter read past the bound arguments", T::NAME);
                debug_assert!(false, "{} parameter read past the bound arguments", T::NAME);
                T::from_raw(String::new())
            }
        }
    }

    /// Take the next value as a sequence of tagged strings.
    ///
    /// Mismatches panic in debug builds, like [`Arguments::single`].
    pub fn sequence<T: Tag>(&mut self) -> Vec<T> {
        match self.values.pop_front() {
            Some(Bound::Sequence(values)) => values.into_iter().map(T::from_raw).collect(),
            Some(Bound::Single(raw)) => {
                warn!("{}[] parameter bound to a single value", T::NAME);
                debug_assert!(false, "{}[] parameter bound to a single value", T::NAME);
                vec![T::from_raw(raw)]
            }
            None => {
                warn!("{}[] parameter read past the bound arguments", T::NAME);
                debug_assert!(false, "{}[] parameter read past the bound arguments", T::NAME);
                Vec::new()
            }
        }
    }

    /// Iterate over the values not yet consumed.
    pub fn iter(&self) -> impl Iterator<Item = &Bound> {
        self.values.iter()
    }
}

impl FromIterator<Bound> for Arguments {
    fn from_iter<I: IntoIterator<Item = Bound>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Bind raw argument strings to a signature.
///
/// A fixed signature needs exactly as many arguments as parameters. A
/// variadic one needs at least the fixed prefix and collects everything
/// after it into the trailing sequence, which may be empty.
pub fn bind(args: Vec<String>, signature: &Signature) -> Result<Arguments, CallError> {
    let required = signature.required();
    if args.len() < required {
        return Err(CallError::TooFewArguments);
    }
    if !signature.variadic && args.len() > required {
        return Err(CallError::TooManyArguments);
    }

    let mut raw = args.into_iter();
    let mut values = VecDeque::with_capacity(signature.params.len());

    for param in &signature.params[..required] {
        let Some(value) = raw.next() else {
            return Err(CallError::TooFewArguments);
        };
        values.push_back(match param.shape {
            Shape::Single => Bound::Single(value),
            Shape::Sequence => Bound::Sequence(vec![value]),
        });
    }

    if signature.variadic {
        values.push_back(Bound::Sequence(raw.collect()));
    }

    Ok(Arguments { values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::ParamType;

    const ONE: ParamType = ParamType::single::<String>();
    const MANY: ParamType = ParamType::sequence::<String>();

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fixed_arity_must_match() {
        let signature = Signature::fixed("C", &[ONE, ONE]);

        assert_eq!(
            bind(strings(&["1"]), &signature),
            Err(CallError::TooFewArguments)
        );
        assert_eq!(
            bind(strings(&["1", "a", "b"]), &signature),
            Err(CallError::TooManyArguments)
        );

        let bound = bind(strings(&["1", "a"]), &signature).unwrap();
        assert_eq!(
            bound.iter().cloned().collect::<Vec<_>>(),
            vec![Bound::Single("1".into()), Bound::Single("a".into())]
        );
    }

    #[test]
    fn test_zero_arity() {
        let signature = Signature::fixed("List", &[]);

        assert!(bind(Vec::new(), &signature).unwrap().is_empty());
        assert_eq!(
            bind(strings(&["x"]), &signature),
            Err(CallError::TooManyArguments)
        );
    }

    #[test]
    fn test_variadic_collects_tail() {
        let signature = Signature::variadic("Add", &[ONE, MANY]);

        assert_eq!(
            bind(strings(&[]), &signature),
            Err(CallError::TooFewArguments)
        );

        let mut bound = bind(strings(&["c1"]), &signature).unwrap();
        assert_eq!(bound.single::<String>(), "c1");
        assert!(bound.sequence::<String>().is_empty());

        let mut bound = bind(strings(&["c1", "u1", "u2", "u3"]), &signature).unwrap();
        assert_eq!(bound.len(), 2);
        assert_eq!(bound.single::<String>(), "c1");
        assert_eq!(bound.sequence::<String>(), strings(&["u1", "u2", "u3"]));
        assert!(bound.is_empty());
    }

    #[test]
    fn test_variadic_has_no_upper_bound() {
        let signature = Signature::variadic("E", &[MANY]);
        let args: Vec<String> = (0..50).map(|i| i.to_string()).collect();

        let mut bound = bind(args.clone(), &signature).unwrap();
        assert_eq!(bound.sequence::<String>(), args);
    }

    #[test]
    fn test_non_variadic_sequence_binds_one_value() {
        let signature = Signature::fixed("Tags", &[MANY]);

        let mut bound = bind(strings(&["a"]), &signature).unwrap();
        assert_eq!(bound.sequence::<String>(), strings(&["a"]));
    }

    #[test]
    fn test_empty_strings_are_values() {
        let signature = Signature::fixed("C", &[ONE, ONE]);

        let mut bound = bind(strings(&["", ""]), &signature).unwrap();
        assert_eq!(bound.single::<String>(), "");
        assert_eq!(bound.single::<String>(), "");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "read past the bound arguments")]
    fn test_reading_past_end_panics() {
        let mut bound = Arguments::default();
        bound.single::<String>();
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "bound to a single value")]
    fn test_sequence_from_single_value_panics() {
        let signature = Signature::fixed("C", &[ONE]);
        let mut bound = bind(strings(&["a"]), &signature).unwrap();
        bound.sequence::<String>();
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "bound to a sequence")]
    fn test_single_from_sequence_panics() {
        let signature = Signature::variadic("E", &[MANY]);
        let mut bound = bind(strings(&["a", "b"]), &signature).unwrap();
        bound.single::<String>();
    }
}
