use crate::types::{
    ArmSelector, AttrValue, EnumDecl, Field, Primitive, Specification, StructDecl, TypeCategory,
    TypeDecl, TypeRef, UnionDecl,
};
use super::{enums, structs, unions, writer::CodeWriter, Direction, Signature};

/// A type whose push/pull prototypes the header must declare, recorded in
/// first-declared order while the type declarations are written. The
/// signatures are the ones the source file's bodies are emitted with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub push: Signature,
    pub pull: Signature,
}

impl Declaration {
    pub fn of(decl: &TypeDecl) -> Self {
        let [push, pull] = [Direction::Push, Direction::Pull].map(|direction| match decl {
            TypeDecl::Struct(s) => structs::signature(s, direction),
            TypeDecl::Union(u) => unions::signature(u, direction),
            TypeDecl::Enum(e) => enums::signature(e, direction),
        });
        Declaration { name: decl.name().to_string(), push, pull }
    }
}

/// C spelling of a field type. Strings become `char` (the member gets the
/// pointer star) and unsigned keywords their `_t` form.
pub fn c_type(ty: &TypeRef) -> String {
    match ty {
        TypeRef::Primitive(p) => match p {
            Primitive::Uint8 | Primitive::Uint16 | Primitive::Uint32 | Primitive::Uint64 => {
                format!("{}_t", p.keyword())
            }
            Primitive::AsciiString | Primitive::Utf16String => "char".to_string(),
            other => other.keyword().to_string(),
        },
        TypeRef::Struct(n) => format!("struct {}", n),
        TypeRef::Union(n) => format!("union {}", n),
        TypeRef::Enum(n) => format!("enum {}", n),
        TypeRef::Opaque(n) => n.clone(),
    }
}

/// One member line of a struct or union declaration, before alignment.
struct Member {
    ty:      String,
    name:    String,
    comment: Option<String>,
}

fn member(ty: &TypeRef, name: &str, arraysize: Option<&AttrValue>) -> Member {
    let mut name = match ty.category() {
        TypeCategory::AsciiString | TypeCategory::Utf16String => format!("*{}", name),
        _ => name.to_string(),
    };
    let mut comment = None;
    match arraysize {
        Some(AttrValue::Int(size)) => name = format!("{}[{}]", name, size.text),
        Some(AttrValue::Ident(count)) => {
            name = format!("*{}", name);
            comment = Some(format!("/* [array_size]: {} */", count));
        }
        None => {}
    }
    Member { ty: c_type(ty), name, comment }
}

fn field_member(field: &Field) -> Member {
    let mut m = member(&field.ty, &field.name, field.arraysize());
    if let Some(switch) = field.switch_is() {
        let note = format!("/* [switch_is]: {} */", switch);
        m.comment = Some(match m.comment {
            Some(existing) => format!("{} {}", existing, note),
            None => note,
        });
    }
    m
}

/// Write members with their names aligned on one column and their comments
/// on another.
fn write_members(w: &mut CodeWriter, members: &[Member]) {
    let type_width = members.iter().map(|m| m.ty.len()).max().unwrap_or(0);
    let name_width = members.iter().map(|m| m.name.len() + 1).max().unwrap_or(0);
    w.indent();
    for m in members {
        let decl = format!("{:<tw$} {}", m.ty, format!("{};", m.name), tw = type_width);
        match &m.comment {
            Some(comment) => w.line(format!(
                "{:<width$} {}",
                decl,
                comment,
                width = type_width + 1 + name_width
            )),
            None => w.line(decl),
        }
    }
    w.dedent();
}

pub fn write_struct_decl(w: &mut CodeWriter, decl: &StructDecl) {
    w.blank();
    w.line(format!("struct {} {{", decl.name));
    let members: Vec<Member> = decl.fields.iter().map(field_member).collect();
    write_members(w, &members);
    w.line("};");
}

pub fn write_union_decl(w: &mut CodeWriter, decl: &UnionDecl) {
    w.blank();
    w.line(format!("union {} {{", decl.name));
    let members: Vec<Member> = decl
        .arms
        .iter()
        .map(|arm| {
            let size = arm.arraysize.clone().map(AttrValue::Int);
            let mut m = member(&arm.ty, &arm.name, size.as_ref());
            let labels = match &arm.selector {
                ArmSelector::Case(values) => values
                    .iter()
                    .map(|v| v.label().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                ArmSelector::Default => "default".to_string(),
            };
            m.comment = Some(format!("/* case: {} */", labels));
            m
        })
        .collect();
    write_members(w, &members);
    w.line("};");
}

pub fn write_enum_decl(w: &mut CodeWriter, decl: &EnumDecl) {
    w.blank();
    w.line(format!("enum {} {{", decl.name));
    let width = decl.items.iter().map(|i| i.name.len()).max().unwrap_or(0);
    w.indent();
    for (n, item) in decl.items.iter().enumerate() {
        let separator = if n + 1 < decl.items.len() { "," } else { "" };
        w.line(format!(
            "{:<width$} = (int)({}){}",
            item.name,
            item.value.text,
            separator,
            width = width
        ));
    }
    w.dedent();
    w.line("};");
}

/// Write every type declaration of `spec` in source order and return the
/// declarations the prototype block needs.
pub fn write_types(w: &mut CodeWriter, spec: &Specification) -> Vec<Declaration> {
    let mut decls = Vec::with_capacity(spec.types.len());
    for decl in &spec.types {
        decls.push(Declaration::of(decl));
        match decl {
            TypeDecl::Struct(s) => write_struct_decl(w, s),
            TypeDecl::Union(u) => write_union_decl(w, u),
            TypeDecl::Enum(e) => write_enum_decl(w, e),
        }
    }
    decls
}

pub fn write_prototypes(w: &mut CodeWriter, decls: &[Declaration]) {
    for decl in decls {
        w.line(decl.push.prototype());
        w.line(decl.pull.prototype());
    }
}

const BEGIN_DECLS: &str = "
#ifndef __BEGIN_DECLS
#ifdef  __cplusplus
#define __BEGIN_DECLS   extern \"C\" {
#define __END_DECLS     }
#else
#define __BEGIN_DECLS
#define __END_DECLS
#endif
#endif

__BEGIN_DECLS

";

pub fn write_begin_decls(w: &mut CodeWriter) {
    w.raw(BEGIN_DECLS);
}

pub fn write_end_decls(w: &mut CodeWriter) {
    w.blank();
    w.line("__END_DECLS");
}

fn guard_name(file_name: &str) -> String {
    format!("__{}__", file_name.to_uppercase().replace('.', "_"))
}

pub fn write_guard_start(w: &mut CodeWriter, file_name: &str) {
    let guard = guard_name(file_name);
    w.blank();
    w.line(format!("#ifndef {}", guard));
    w.line(format!("#define {}", guard));
}

pub fn write_guard_end(w: &mut CodeWriter, file_name: &str) {
    w.blank();
    w.line(format!("#endif /*! {} */", guard_name(file_name)));
}

/// Doxygen block naming the file and the specification attributes. Missing
/// attributes are written empty.
pub fn write_file_doc(w: &mut CodeWriter, file_name: &str, spec: &Specification) {
    let attrs = &spec.attributes;
    let field = |v: &Option<String>| v.clone().unwrap_or_default();
    w.blank();
    w.line("/**");
    for (tag, value) in [
        ("file", file_name.to_string()),
        ("version", field(&attrs.version)),
        ("revision", field(&attrs.revision)),
        ("date", field(&attrs.release)),
        ("brief", field(&attrs.description)),
    ] {
        w.line(format!("   \\{} {}", tag, value).trim_end());
    }
    w.line("*/");
}

pub fn write_spec_defines(w: &mut CodeWriter, spec: &Specification) {
    let attrs = &spec.attributes;
    w.blank();
    for (suffix, value) in [
        ("VERSION", &attrs.version),
        ("REVISION", &attrs.revision),
        ("DATE", &attrs.release),
        ("DESCRIPTION", &attrs.description),
    ] {
        let name = format!("{}_{}", spec.name, suffix);
        w.line(format!(
            "#define {:<24} \"{}\"",
            name,
            value.as_deref().unwrap_or("")
        ));
    }
}
