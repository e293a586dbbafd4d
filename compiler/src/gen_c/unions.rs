use crate::{
    error::MrError,
    types::{ArmSelector, FieldAttributes, UnionArm, UnionDecl},
};
use super::{
    dispatch::{operand, write_array_loop, write_item, ItemCodec, ItemRef},
    writer::CodeWriter,
    DefaultArmPolicy, Direction, Signature,
};

/// Union-typed struct fields need the sibling `switch_is` value as the
/// discriminant argument.
pub struct UnionCodec;

impl UnionCodec {
    fn call(&self, item: &ItemRef<'_>, direction: Direction) -> Result<String, MrError> {
        let switch = item.attributes.switch_is().ok_or_else(|| {
            MrError::GenerateError(format!(
                "union field \"{}\" of type \"{}\" has no switch_is attribute",
                item.name, item.ty
            ))
        })?;
        Ok(format!(
            "{}(mr, {}, &{})",
            item.function(direction),
            operand(switch),
            item.member()
        ))
    }
}

impl ItemCodec for UnionCodec {
    fn push_item(&self, item: &ItemRef<'_>) -> Result<String, MrError> {
        self.call(item, Direction::Push)
    }

    fn pull_item(&self, item: &ItemRef<'_>) -> Result<String, MrError> {
        self.call(item, Direction::Pull)
    }
}

pub fn signature(decl: &UnionDecl, direction: Direction) -> Signature {
    Signature::new(direction.function(&format!("union_{}", decl.name)))
        .param(direction.context(), "mr")
        .param(format!("uint{}_t", decl.width().bits()), "lvl")
        .param(format!("{}union {} *", direction.constness(), decl.name), "r")
}

fn write_arm(w: &mut CodeWriter, arm: &UnionArm, direction: Direction) -> Result<(), MrError> {
    let item = ItemRef::new(&arm.ty, &arm.name, &[]);
    match &arm.arraysize {
        Some(size) => write_array_loop(w, &arm.name, &size.text, |w, cntr| {
            write_item(w, direction, &item.at(cntr))
        })?,
        None => write_item(w, direction, &item)?,
    }
    w.line("break;");
    Ok(())
}

/// Emit the push or pull function of a union as one switch over `lvl`.
///
/// Case arms keep their source order, each label of an `a|b` list falling
/// through to the shared body. A declared default arm is emitted last; when
/// there is none, `policy` decides what the synthesized default does.
pub fn write_union(
    w: &mut CodeWriter,
    decl: &UnionDecl,
    direction: Direction,
    policy: DefaultArmPolicy,
) -> Result<(), MrError> {
    w.blank();
    w.line(signature(decl, direction).definition());
    w.line("{");
    w.indent();
    w.line("switch (lvl) {");

    for arm in &decl.arms {
        let ArmSelector::Case(values) = &arm.selector else {
            continue;
        };
        for value in values {
            w.line(format!("case ({}):", value.label()));
        }
        w.indent();
        write_arm(w, arm, direction)?;
        w.dedent();
    }

    w.line("default:");
    w.indent();
    match (decl.default_arm(), policy) {
        (Some(arm), _) => write_arm(w, arm, direction)?,
        (None, DefaultArmPolicy::Accept) => w.line("break;"),
        (None, DefaultArmPolicy::Reject) => w.line("return MAPIROPS_ERR_INVALID_VAL;"),
    }
    w.dedent();

    w.line("}");
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

    fn union_decl(text: &str) -> UnionDecl {
        let file = parse_mr(&tokenize(text).unwrap()).unwrap();
        match file.specifications[0].types[0].clone() {
            TypeDecl::Union(u) => u,
            other => panic!("expected a union, got {:?}", other),
        }
    }

    fn emit(decl: &UnionDecl, direction: Direction, policy: DefaultArmPolicy) -> String {
        let mut w = CodeWriter::new();
        write_union(&mut w, decl, direction, policy).unwrap();
        w.finish()
    }

    fn branch_count(out: &str) -> usize {
        // Labels sharing a body count once: only the line after the last
        // label of a run opens a branch.
        let lines: Vec<&str> = out.lines().map(str::trim).collect();
        lines
            .windows(2)
            .filter(|pair| {
                let is_label = |l: &str| l.starts_with("case (") || l == "default:";
                is_label(pair[0]) && !is_label(pair[1])
            })
            .count()
    }

    #[test]
    fn test_synthesized_default_accepts() {
        let decl = union_decl(
            "specification T { [switch_size=16] union U { [case=1|2] uint32 a; [case=0x3] struct S s; }; };",
        );
        let expected = "
enum mapirops_err_code mapirops_push_union_U(struct mapirops_push *mr, uint16_t lvl, const union U *r)
{
\tswitch (lvl) {
\tcase (1):
\tcase (2):
\t\tMAPIROPS_CHECK(mapirops_push_uint32(mr, r->a));
\t\tbreak;
\tcase (0x3):
\t\tMAPIROPS_CHECK(mapirops_push_struct_S(mr, &r->s));
\t\tbreak;
\tdefault:
\t\tbreak;
\t}

\treturn MAPIROPS_ERR_SUCCESS;
}
";
        let out = emit(&decl, Direction::Push, DefaultArmPolicy::Accept);
        assert_eq!(out, expected);
        assert_eq!(branch_count(&out), 3);
    }

    #[test]
    fn test_synthesized_default_rejects_when_strict() {
        let decl = union_decl("specification T { union U { [case=1] uint8 a; }; };");
        let out = emit(&decl, Direction::Pull, DefaultArmPolicy::Reject);
        assert!(out.contains("\tdefault:\n\t\treturn MAPIROPS_ERR_INVALID_VAL;\n"));
        assert!(out.contains("uint32_t lvl, union U *r)"));
    }

    #[test]
    fn test_declared_default_is_last_branch() {
        let decl = union_decl(
            "specification T { union U { [default] double d; [case=A] enum E e; [case=B] uint64 b; }; };",
        );
        let out = emit(&decl, Direction::Pull, DefaultArmPolicy::Reject);
        assert_eq!(branch_count(&out), 3);
        let default_at = out.find("default:").unwrap();
        assert!(out.find("case (B):").unwrap() < default_at);
        assert!(out[default_at..].starts_with("default:\n\t\tMAPIROPS_CHECK(mapirops_pull_double(mr, &r->d));\n\t\tbreak;"));
        assert!(!out.contains("INVALID_VAL"));
    }

    #[test]
    fn test_arm_arraysize_loops() {
        let decl = union_decl("specification T { union U { [case=4, arraysize=16] uint8 raw; }; };");
        let out = emit(&decl, Direction::Push, DefaultArmPolicy::Accept);
        assert!(out.contains("for (cntr_raw = 0; cntr_raw < 16; cntr_raw++) {"));
        assert!(out.contains("MAPIROPS_CHECK(mapirops_push_uint8(mr, r->raw[cntr_raw]));"));
    }

    #[test]
    fn test_string_case_label_is_unquoted() {
        let decl = union_decl(r#"specification T { union U { [case=("ROP_X")] ascii_string s; }; };"#);
        let out = emit(&decl, Direction::Pull, DefaultArmPolicy::Accept);
        assert!(out.contains("case (ROP_X):"));
        assert!(out.contains("mapirops_pull_ascii_string(mr, mr->mem_ctx, MAPIROPS_STR_NOSIZE, &r->s, 0)"));
    }
}
