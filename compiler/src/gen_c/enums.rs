use crate::{
    error::MrError,
    types::EnumDecl,
};
use super::{dispatch::{ItemCodec, ItemRef}, writer::CodeWriter, Direction, Signature};

/// Enum items are pushed by value and pulled by reference.
pub struct EnumCodec;

impl ItemCodec for EnumCodec {
    fn push_item(&self, item: &ItemRef<'_>) -> Result<String, MrError> {
        Ok(format!("{}(mr, {})", item.function(Direction::Push), item.member()))
    }

    fn pull_item(&self, item: &ItemRef<'_>) -> Result<String, MrError> {
        Ok(format!("{}(mr, &{})", item.function(Direction::Pull), item.member()))
    }
}

/// Identifiers of the push body. The body names enum items, so each local is
/// renamed with trailing underscores until no item or other local shares it.
struct PushLocals {
    mr:    String,
    value: String,
    mask:  String,
}

impl PushLocals {
    fn new(decl: &EnumDecl) -> Self {
        let mut taken: Vec<String> = decl.items.iter().map(|item| item.name.clone()).collect();
        let mut fresh = |base: &str| {
            let mut name = base.to_string();
            while taken.contains(&name) {
                name.push('_');
            }
            taken.push(name.clone());
            name
        };
        let mr = fresh("mr");
        let value = fresh(&decl.name);
        let mask = fresh("val");
        PushLocals { mr, value, mask }
    }
}

/// Flags enums take the raw integer on push, plain enums the enum type. The
/// pushed value is named after the enum.
pub fn signature(decl: &EnumDecl, direction: Direction) -> Signature {
    let function = direction.function(&format!("enum_{}", decl.name));
    match direction {
        Direction::Push => {
            let locals = PushLocals::new(decl);
            let ty = if decl.flags {
                format!("uint{}_t", decl.width().bits())
            } else {
                format!("enum {}", decl.name)
            };
            Signature::new(function)
                .param(direction.context(), locals.mr)
                .param(ty, locals.value)
        }
        Direction::Pull => Signature::new(function)
            .param(direction.context(), "mr")
            .param(format!("enum {} *", decl.name), "r"),
    }
}

/// Emit the push function. Plain enums reject values outside the range of
/// declared items; flags enums reject any bit not covered by a declared flag.
/// The unmasked value is written at the declared width.
pub fn write_enum_push(w: &mut CodeWriter, decl: &EnumDecl) {
    let bits = decl.width().bits();
    let PushLocals { mr, value, mask } = PushLocals::new(decl);
    w.blank();
    w.line(signature(decl, Direction::Push).definition());
    w.line("{");
    w.indent();

    if decl.flags {
        w.line(format!("uint{}_t {} = {};", bits, mask, value));
        w.blank();
        for item in &decl.items {
            w.line(format!("if ({0} & {1}) {0} &= ~{1};", mask, item.name));
        }
        w.line(format!("if ({}) return MAPIROPS_ERR_INVALID_FLAGS;", mask));
    } else if let Some((min, max)) = decl.bounds() {
        w.line("/* Sanity Checks */");
        w.line(format!("if ({} < {}) return MAPIROPS_ERR_INVALID_VAL;", value, min.name));
        w.line(format!("if ({} > {}) return MAPIROPS_ERR_INVALID_VAL;", value, max.name));
    }

    w.blank();
    w.line(format!(
        "MAPIROPS_CHECK({}_push_uint{}({}, {}));",
        super::RUNTIME_PREFIX,
        bits,
        mr,
        value
    ));
    w.blank();
    w.line("return MAPIROPS_ERR_SUCCESS;");
    w.dedent();
    w.line("}");
}

/// Emit the pull function: read an integer of the declared width and cast it.
/// The read value is deliberately not range or flag checked.
pub fn write_enum_pull(w: &mut CodeWriter, decl: &EnumDecl) {
    let bits = decl.width().bits();
    w.blank();
    w.line(signature(decl, Direction::Pull).definition());
    w.line("{");
    w.indent();
    w.line(format!("uint{}_t v;", bits));
    w.blank();
    w.line(format!("MAPIROPS_CHECK({}_pull_uint{}(mr, &v));", super::RUNTIME_PREFIX, bits));
    w.line(format!("*r = (enum {}) v;", decl.name));
    w.blank();
    w.line("return MAPIROPS_ERR_SUCCESS;");
    w.dedent();
    w.line("}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_mr;
    use crate::tokenizer::tokenize;
    use crate::types::TypeDecl;

    fn enum_decl(text: &str) -> EnumDecl {
        let file = parse_mr(&tokenize(text).unwrap()).unwrap();
        match file.specifications[0].types[0].clone() {
            TypeDecl::Enum(e) => e,
            other => panic!("expected an enum, got {:?}", other),
        }
    }

    fn push(decl: &EnumDecl) -> String {
        let mut w = CodeWriter::new();
        write_enum_push(&mut w, decl);
        w.finish()
    }

    #[test]
    fn test_flags_push_clears_each_declared_flag() {
        let decl = enum_decl("specification T { [enumtype=flags, enumsize=16] enum E { A=0x1, B=0x2 }; };");
        let expected = "
enum mapirops_err_code mapirops_push_enum_E(struct mapirops_push *mr, uint16_t E)
{
\tuint16_t val = E;

\tif (val & A) val &= ~A;
\tif (val & B) val &= ~B;
\tif (val) return MAPIROPS_ERR_INVALID_FLAGS;

\tMAPIROPS_CHECK(mapirops_push_uint16(mr, E));

\treturn MAPIROPS_ERR_SUCCESS;
}
";
        assert_eq!(push(&decl), expected);
    }

    #[test]
    fn test_plain_push_checks_numeric_bounds() {
        let decl = enum_decl("specification T { enum E { HIGH=0x10, MID=9, LOW=0x2 }; };");
        let out = push(&decl);
        assert!(out.contains("\tif (E < LOW) return MAPIROPS_ERR_INVALID_VAL;\n"));
        assert!(out.contains("\tif (E > HIGH) return MAPIROPS_ERR_INVALID_VAL;\n"));
        assert!(out.contains("MAPIROPS_CHECK(mapirops_push_uint32(mr, E));"));
        assert!(out.contains("mapirops_push_enum_E(struct mapirops_push *mr, enum E E)"));
    }

    #[test]
    fn test_pull_casts_without_validation() {
        let decl = enum_decl("specification T { [enumsize=8, enumtype=flags] enum F { X=1 }; };");
        let mut w = CodeWriter::new();
        write_enum_pull(&mut w, &decl);
        let expected = "
enum mapirops_err_code mapirops_pull_enum_F(struct mapirops_pull *mr, enum F *r)
{
\tuint8_t v;

\tMAPIROPS_CHECK(mapirops_pull_uint8(mr, &v));
\t*r = (enum F) v;

\treturn MAPIROPS_ERR_SUCCESS;
}
";
        assert_eq!(w.finish(), expected);
    }

    #[test]
    fn test_push_locals_never_shadow_items() {
        let decl = enum_decl("specification T { enum P { P=1, mr=3, Z=5 }; };");
        let out = push(&decl);
        assert!(out.contains("mapirops_push_enum_P(struct mapirops_push *mr_, enum P P_)"));
        assert!(out.contains("\tif (P_ < P) return MAPIROPS_ERR_INVALID_VAL;\n"));
        assert!(out.contains("\tif (P_ > Z) return MAPIROPS_ERR_INVALID_VAL;\n"));
        assert!(out.contains("MAPIROPS_CHECK(mapirops_push_uint32(mr_, P_));"));
    }

    #[test]
    fn test_flags_mask_never_shadows_items() {
        let decl = enum_decl("specification T { [enumtype=flags] enum F { val=0x1, val_=0x2 }; };");
        let out = push(&decl);
        assert!(out.contains("\tuint32_t val__ = F;\n"));
        assert!(out.contains("\tif (val__ & val) val__ &= ~val;\n"));
        assert!(out.contains("\tif (val__ & val_) val__ &= ~val_;\n"));
        assert!(out.contains("\tif (val__) return MAPIROPS_ERR_INVALID_FLAGS;\n"));
    }

    #[test]
    fn test_pushed_value_named_after_enum_differs_from_locals() {
        let decl = enum_decl("specification T { [enumtype=flags] enum val { A=1 }; };");
        let out = push(&decl);
        assert!(out.contains("(struct mapirops_push *mr, uint32_t val)"));
        assert!(out.contains("\tuint32_t val_ = val;\n"));
    }
}
