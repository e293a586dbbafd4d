//! C code generation for MR specifications.
//!
//! Each specification produces a header (type declarations plus push/pull
//! prototypes) and a source file (push/pull bodies). Both are rendered fully
//! in memory; writing them out is the driver's job.

pub mod dispatch;
pub mod enums;
pub mod header;
pub mod scalar;
pub mod strings;
pub mod structs;
pub mod unions;
pub mod writer;

use crate::{
    error::MrError,
    types::{Specification, TypeDecl},
};
use writer::CodeWriter;

/// Prefix of every runtime library function and of generated ones.
pub const RUNTIME_PREFIX: &str = "mapirops";

pub const DEFAULT_LICENSE: &str = "/*
   MAPI ROPs serialization routines

   This file was generated by the MR compiler. Do not edit it by hand;
   change the .mr specification and regenerate instead.
 */
";

/// What a union's synthesized `default:` branch does when no default arm
/// was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultArmPolicy {
    /// Unmatched discriminants push/pull nothing and succeed.
    #[default]
    Accept,
    /// Unmatched discriminants fail with `MAPIROPS_ERR_INVALID_VAL`.
    Reject,
}

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Banner written at the top of both output files.
    pub license:         String,
    /// Header included by the generated source file.
    pub runtime_include: String,
    pub default_arm:     DefaultArmPolicy,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            license:         DEFAULT_LICENSE.to_string(),
            runtime_include: "libmapirops.h".to_string(),
            default_arm:     DefaultArmPolicy::Accept,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Push,
    Pull,
}

impl Direction {
    pub fn verb(self) -> &'static str {
        match self {
            Direction::Push => "push",
            Direction::Pull => "pull",
        }
    }

    /// C type of the runtime context argument.
    pub fn context(self) -> &'static str {
        match self {
            Direction::Push => "struct mapirops_push *",
            Direction::Pull => "struct mapirops_pull *",
        }
    }

    /// Qualifier of the instance pointer: pushes only read it.
    pub fn constness(self) -> &'static str {
        match self {
            Direction::Push => "const ",
            Direction::Pull => "",
        }
    }

    /// Name of the generated or runtime function handling `symbol`.
    pub fn function(self, symbol: &str) -> String {
        format!("{}_{}_{}", RUNTIME_PREFIX, self.verb(), symbol)
    }
}

/// Signature of a generated push/pull function. The body prints it with
/// parameter names, the header prototype without.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub function: String,
    /// `(C type, name)` pairs. Pointer types carry their trailing `*`.
    pub params:   Vec<(String, String)>,
}

impl Signature {
    pub fn new(function: String) -> Self {
        Signature { function, params: Vec::new() }
    }

    pub fn param(mut self, ty: impl Into<String>, name: impl Into<String>) -> Self {
        self.params.push((ty.into(), name.into()));
        self
    }

    pub fn definition(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|(ty, name)| {
                if ty.ends_with('*') {
                    format!("{}{}", ty, name)
                } else {
                    format!("{} {}", ty, name)
                }
            })
            .collect();
        format!("enum mapirops_err_code {}({})", self.function, params.join(", "))
    }

    pub fn prototype(&self) -> String {
        let types: Vec<&str> = self.params.iter().map(|(ty, _)| ty.as_str()).collect();
        format!("enum mapirops_err_code {}({});", self.function, types.join(", "))
    }
}

/// File names used for a specification's outputs.
pub fn output_names(spec: &Specification) -> (String, String) {
    let base = spec.name.to_lowercase();
    (format!("{}.h", base), format!("{}.c", base))
}

/// Render the header file of `spec`.
pub fn generate_header(spec: &Specification, options: &GeneratorOptions) -> String {
    let (name, _) = output_names(spec);
    let mut w = CodeWriter::new();
    w.raw(&options.license);
    header::write_file_doc(&mut w, &name, spec);
    header::write_guard_start(&mut w, &name);
    header::write_spec_defines(&mut w, spec);
    let decls = header::write_types(&mut w, spec);
    header::write_begin_decls(&mut w);
    header::write_prototypes(&mut w, &decls);
    header::write_end_decls(&mut w);
    header::write_guard_end(&mut w, &name);
    w.finish()
}

/// Render the source file of `spec`: push then pull bodies for every declared
/// type, in declaration order.
pub fn generate_source(spec: &Specification, options: &GeneratorOptions) -> Result<String, MrError> {
    let (_, name) = output_names(spec);
    let mut w = CodeWriter::new();
    w.raw(&options.license);
    header::write_file_doc(&mut w, &name, spec);
    w.blank();
    w.line(format!("#include <{}>", options.runtime_include));
    w.blank();

    for decl in &spec.types {
        for direction in [Direction::Push, Direction::Pull] {
            match decl {
                TypeDecl::Struct(s) => structs::write_struct(&mut w, s, direction)?,
                TypeDecl::Union(u) => unions::write_union(&mut w, u, direction, options.default_arm)?,
                TypeDecl::Enum(e) => match direction {
                    Direction::Push => enums::write_enum_push(&mut w, e),
                    Direction::Pull => enums::write_enum_pull(&mut w, e),
                },
            }
        }
    }

    Ok(w.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_definition_and_prototype() {
        let sig = Signature::new(Direction::Push.function("union_U"))
            .param(Direction::Push.context(), "mr")
            .param("uint16_t", "lvl")
            .param("const union U *", "r");
        assert_eq!(
            sig.definition(),
            "enum mapirops_err_code mapirops_push_union_U(struct mapirops_push *mr, uint16_t lvl, const union U *r)"
        );
        assert_eq!(
            sig.prototype(),
            "enum mapirops_err_code mapirops_push_union_U(struct mapirops_push *, uint16_t, const union U *);"
        );
    }
}
