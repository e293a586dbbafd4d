use crate::{
    error::MrError,
    types::{Primitive, TypeRef},
};
use super::{dispatch::{ItemCodec, ItemRef}, Direction};

/// Fixed-width primitives and opaque type names. Values go to the runtime by
/// value on push, except GUIDs which are passed by reference.
pub struct ScalarCodec;

impl ItemCodec for ScalarCodec {
    fn push_item(&self, item: &ItemRef<'_>) -> Result<String, MrError> {
        let by_ref = if *item.ty == TypeRef::Primitive(Primitive::Guid) { "&" } else { "" };
        Ok(format!("{}(mr, {}{})", item.function(Direction::Push), by_ref, item.member()))
    }

    fn pull_item(&self, item: &ItemRef<'_>) -> Result<String, MrError> {
        Ok(format!("{}(mr, &{})", item.function(Direction::Pull), item.member()))
    }
}
