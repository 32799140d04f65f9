//! Help text rendered from operation signatures.

use crate::operation::{CommandObject, Shape, Signature};
use crate::registry::Registry;

/// Render one signature as `Name(T1, T2, T3...)`.
///
/// A variadic final parameter is suffixed with `...`; any other sequence
/// parameter is suffixed with `[]`.
pub fn render(signature: &Signature) -> String {
    let last = signature.params.len().saturating_sub(1);
    let params: Vec<String> = signature
        .params
        .iter()
        .enumerate()
        .map(|(i, param)| match param.shape {
            Shape::Single => param.tag.to_string(),
            Shape::Sequence if signature.variadic && i == last => format!("{}...", param.tag),
            Shape::Sequence => format!("{}[]", param.tag),
        })
        .collect();

    format!("{}({})", signature.name, params.join(", "))
}

/// List every operation of `C`, one per line, in declaration order.
pub fn describe<C: CommandObject>() -> String {
    Registry::<C>::new()
        .iter()
        .map(|op| render(&op.signature))
        .collect::<Vec<_>>()
        .join("\n")
}
