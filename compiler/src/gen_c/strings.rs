use crate::{
    error::MrError,
    types::FieldAttributes,
};
use super::{
    dispatch::{operand, ItemCodec, ItemRef},
    Direction,
};

/// `ascii_string` and `utf16_string` items.
///
/// Pulls allocate from `mr->mem_ctx`. Without a `length` attribute the runtime
/// is told `MAPIROPS_STR_NOSIZE` and sizes the read itself; with one, the
/// literal or sibling field value is passed as the size. Pushes always pass a
/// zero flag word and ignore `length`.
pub struct StringCodec;

impl ItemCodec for StringCodec {
    fn push_item(&self, item: &ItemRef<'_>) -> Result<String, MrError> {
        Ok(format!("{}(mr, 0, {})", item.function(Direction::Push), item.member()))
    }

    fn pull_item(&self, item: &ItemRef<'_>) -> Result<String, MrError> {
        let function = item.function(Direction::Pull);
        Ok(match item.attributes.length() {
            None => format!(
                "{}(mr, mr->mem_ctx, MAPIROPS_STR_NOSIZE, &{}, 0)",
                function,
                item.member()
            ),
            Some(length) => format!(
                "{}(mr, mr->mem_ctx, 0, &{}, {})",
                function,
                item.member(),
                operand(length)
            ),
        })
    }
}
