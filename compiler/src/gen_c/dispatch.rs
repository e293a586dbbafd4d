use crate::{
    error::MrError,
    types::{AttrValue, FieldAttribute, TypeCategory, TypeRef},
};
use super::{
    enums::EnumCodec, scalar::ScalarCodec, strings::StringCodec, structs::StructCodec,
    unions::UnionCodec, writer::CodeWriter, Direction,
};

/// Renders the runtime call that pushes or pulls one item of a type category.
/// Implementations return the bare call expression; `write_item` wraps it in
/// `MAPIROPS_CHECK`.
pub trait ItemCodec {
    fn push_item(&self, item: &ItemRef<'_>) -> Result<String, MrError>;
    fn pull_item(&self, item: &ItemRef<'_>) -> Result<String, MrError>;
}

/// One item inside a generated push/pull body: a struct field or a union arm,
/// optionally subscripted by an array loop counter.
#[derive(Debug, Clone, Copy)]
pub struct ItemRef<'a> {
    pub ty:         &'a TypeRef,
    pub name:       &'a str,
    pub attributes: &'a [FieldAttribute],
    pub index:      Option<&'a str>,
}

impl<'a> ItemRef<'a> {
    pub fn new(ty: &'a TypeRef, name: &'a str, attributes: &'a [FieldAttribute]) -> Self {
        ItemRef { ty, name, attributes, index: None }
    }

    pub fn at(self, index: &'a str) -> Self {
        ItemRef { index: Some(index), ..self }
    }

    /// Member access on the instance, e.g. `r->b[cntr_b]`.
    pub fn member(&self) -> String {
        match self.index {
            Some(index) => format!("r->{}[{}]", self.name, index),
            None => format!("r->{}", self.name),
        }
    }

    pub fn function(&self, direction: Direction) -> String {
        direction.function(&self.ty.symbol())
    }
}

/// C expression for an attribute value: the literal itself, or a read of the
/// sibling field it names.
pub fn operand(value: &AttrValue) -> String {
    match value {
        AttrValue::Int(i) => i.text.clone(),
        AttrValue::Ident(name) => format!("r->{}", name),
    }
}

fn codec_for(category: TypeCategory) -> &'static dyn ItemCodec {
    match category {
        TypeCategory::Struct => &StructCodec,
        TypeCategory::Union => &UnionCodec,
        TypeCategory::Enum => &EnumCodec,
        TypeCategory::AsciiString | TypeCategory::Utf16String => &StringCodec,
        TypeCategory::Scalar => &ScalarCodec,
    }
}

/// Emit the checked runtime call for one item.
pub fn write_item(w: &mut CodeWriter, direction: Direction, item: &ItemRef<'_>) -> Result<(), MrError> {
    let codec = codec_for(item.ty.category());
    let call = match direction {
        Direction::Push => codec.push_item(item)?,
        Direction::Pull => codec.pull_item(item)?,
    };
    w.line(format!("MAPIROPS_CHECK({});", call));
    Ok(())
}

/// Emit a counting loop over `bound` elements; `body` receives the counter
/// name to subscript with.
pub fn write_array_loop<F>(w: &mut CodeWriter, name: &str, bound: &str, body: F) -> Result<(), MrError>
where
    F: FnOnce(&mut CodeWriter, &str) -> Result<(), MrError>,
{
    let cntr = format!("cntr_{}", name);
    w.line("{");
    w.indent();
    w.line(format!("uint32_t {};", cntr));
    w.blank();
    w.line(format!("for ({0} = 0; {0} < {1}; {0}++) {{", cntr, bound));
    w.indent();
    body(w, &cntr)?;
    w.dedent();
    w.line("}");
    w.dedent();
    w.line("}");
    Ok(())
}
