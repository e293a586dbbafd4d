use crate::{
    error::MrError,
    types::StructDecl,
};
use super::{
    dispatch::{operand, write_array_loop, write_item, ItemCodec, ItemRef},
    writer::CodeWriter,
    Direction, Signature,
};

/// Struct-typed items are always handed to the runtime by reference.
pub struct StructCodec;

impl ItemCodec for StructCodec {
    fn push_item(&self, item: &ItemRef<'_>) -> Result<String, MrError> {
        Ok(format!("{}(mr, &{})", item.function(Direction::Push), item.member()))
    }

    fn pull_item(&self, item: &ItemRef<'_>) -> Result<String, MrError> {
        Ok(format!("{}(mr, &{})", item.function(Direction::Pull), item.member()))
    }
}

/// Signature shared by the body and the header prototype.
pub fn signature(decl: &StructDecl, direction: Direction) -> Signature {
    Signature::new(direction.function(&format!("struct_{}", decl.name)))
        .param(direction.context(), "mr")
        .param(format!("{}struct {} *", direction.constness(), decl.name), "r")
}

/// Emit the push or pull function of a struct. Fields are handled strictly in
/// declaration order and any failing call returns immediately.
pub fn write_struct(w: &mut CodeWriter, decl: &StructDecl, direction: Direction) -> Result<(), MrError> {
    w.blank();
    w.line(signature(decl, direction).definition());
    w.line("{");
    w.indent();

    if decl.fields.is_empty() {
        w.line("return MAPIROPS_ERR_SUCCESS;");
        w.dedent();
        w.line("}");
        return Ok(());
    }

    for field in &decl.fields {
        let item = ItemRef::new(&field.ty, &field.name, &field.attributes);
        match field.arraysize() {
            Some(size) => write_array_loop(w, &field.name, &operand(size), |w, cntr| {
                write_item(w, direction, &item.at(cntr))
            })?,
            None => write_item(w, direction, &item)?,
        }
    }

    w.blank();
    w.line("return MAPIROPS_ERR_SUCCESS;");
    w.dedent();
    w.line("}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_mr;
    use crate::tokenizer::tokenize;
    use crate::types::TypeDecl;

    fn struct_decl(text: &str) -> StructDecl {
        let file = parse_mr(&tokenize(text).unwrap()).unwrap();
        match file.specifications[0].types[0].clone() {
            TypeDecl::Struct(s) => s,
            other => panic!("expected a struct, got {:?}", other),
        }
    }

    fn emit(decl: &StructDecl, direction: Direction) -> String {
        let mut w = CodeWriter::new();
        write_struct(&mut w, decl, direction).unwrap();
        w.finish()
    }

    #[test]
    fn test_empty_struct_returns_success() {
        let decl = struct_decl("specification T { struct Empty { }; };");
        assert_eq!(
            emit(&decl, Direction::Pull),
            "\nenum mapirops_err_code mapirops_pull_struct_Empty(struct mapirops_pull *mr, struct Empty *r)\n{\n\treturn MAPIROPS_ERR_SUCCESS;\n}\n"
        );
        assert!(!emit(&decl, Direction::Push).contains("MAPIROPS_CHECK"));
    }

    #[test]
    fn test_static_array_loop() {
        let decl = struct_decl("specification T { struct Foo { uint32 a; [arraysize=3] uint32 b; }; };");
        let expected = "
enum mapirops_err_code mapirops_push_struct_Foo(struct mapirops_push *mr, const struct Foo *r)
{
\tMAPIROPS_CHECK(mapirops_push_uint32(mr, r->a));
\t{
\t\tuint32_t cntr_b;

\t\tfor (cntr_b = 0; cntr_b < 3; cntr_b++) {
\t\t\tMAPIROPS_CHECK(mapirops_push_uint32(mr, r->b[cntr_b]));
\t\t}
\t}

\treturn MAPIROPS_ERR_SUCCESS;
}
";
        assert_eq!(emit(&decl, Direction::Push), expected);
    }

    #[test]
    fn test_dynamic_array_reads_sibling_field() {
        let decl = struct_decl(
            "specification T { struct Foo { uint16 len; [arraysize=len] struct Bar bars; }; };",
        );
        let out = emit(&decl, Direction::Pull);
        assert!(out.contains("for (cntr_bars = 0; cntr_bars < r->len; cntr_bars++) {"));
        assert!(out.contains("MAPIROPS_CHECK(mapirops_pull_struct_Bar(mr, &r->bars[cntr_bars]));"));
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let decl = struct_decl(
            "specification T { struct S { uint8 z; GUID y; double x; [switch_is=z] union U u; }; };",
        );
        let out = emit(&decl, Direction::Push);
        let calls: Vec<&str> = out.lines().filter(|l| l.contains("MAPIROPS_CHECK")).collect();
        assert_eq!(
            calls,
            vec![
                "\tMAPIROPS_CHECK(mapirops_push_uint8(mr, r->z));",
                "\tMAPIROPS_CHECK(mapirops_push_GUID(mr, &r->y));",
                "\tMAPIROPS_CHECK(mapirops_push_double(mr, r->x));",
                "\tMAPIROPS_CHECK(mapirops_push_union_U(mr, r->z, &r->u));",
            ]
        );
    }
}
