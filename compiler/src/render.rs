//! Canonical MR text for parsed trees.
//!
//! The output of every `Display` impl here is accepted by the parser and
//! parses back to an equal tree, so `mrc fmt` can be used to normalise files.

use std::fmt::{self, Display, Formatter};

use crate::types::{
    ArmSelector, AttrValue, CaseValue, EnumDecl, Field, FieldAttribute, MrFile, Specification,
    StructDecl, TypeDecl, TypeRef, UnionArm, UnionDecl,
};

const INDENT: &str = "    ";

impl Display for MrFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, spec) in self.specifications.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", spec)?;
        }
        Ok(())
    }
}

impl Display for Specification {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let attrs = &self.attributes;
        let pairs: Vec<String> = [
            ("version", &attrs.version),
            ("revision", &attrs.revision),
            ("release", &attrs.release),
            ("description", &attrs.description),
        ]
        .iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| format!("{}=\"{}\"", key, v)))
        .collect();
        if !pairs.is_empty() {
            writeln!(f, "[{}]", pairs.join(", "))?;
        }

        writeln!(f, "specification {} {{", self.name)?;
        for decl in &self.types {
            write!(f, "{}", decl)?;
        }
        writeln!(f, "}};")
    }
}

impl Display for TypeDecl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TypeDecl::Struct(s) => write!(f, "{}", s),
            TypeDecl::Union(u) => write!(f, "{}", u),
            TypeDecl::Enum(e) => write!(f, "{}", e),
        }
    }
}

impl Display for StructDecl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}struct {} {{", INDENT, self.name)?;
        for field in &self.fields {
            writeln!(f, "{0}{0}{1}", INDENT, field)?;
        }
        writeln!(f, "{}}};", INDENT)
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if !self.attributes.is_empty() {
            let attrs: Vec<String> = self.attributes.iter().map(|a| a.to_string()).collect();
            write!(f, "[{}] ", attrs.join(", "))?;
        }
        write!(f, "{} {};", self.ty, self.name)
    }
}

impl Display for FieldAttribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key(), self.value())
    }
}

impl Display for AttrValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(i) => f.write_str(&i.text),
            AttrValue::Ident(name) => f.write_str(name),
        }
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => f.write_str(p.keyword()),
            TypeRef::Struct(n) => write!(f, "struct {}", n),
            TypeRef::Union(n) => write!(f, "union {}", n),
            TypeRef::Enum(n) => write!(f, "enum {}", n),
            TypeRef::Opaque(n) => f.write_str(n),
        }
    }
}

impl Display for EnumDecl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut attrs = Vec::new();
        if self.flags {
            attrs.push("enumtype=flags".to_string());
        }
        if let Some(size) = self.size {
            attrs.push(format!("enumsize={}", size.bits()));
        }
        write!(f, "{}", INDENT)?;
        if !attrs.is_empty() {
            write!(f, "[{}] ", attrs.join(", "))?;
        }
        writeln!(f, "enum {} {{", self.name)?;
        let items: Vec<String> = self
            .items
            .iter()
            .map(|item| format!("{0}{0}{1} = {2}", INDENT, item.name, item.value.text))
            .collect();
        writeln!(f, "{}", items.join(",\n"))?;
        writeln!(f, "{}}};", INDENT)
    }
}

impl Display for UnionDecl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", INDENT)?;
        if let Some(size) = self.switch_size {
            write!(f, "[switch_size={}] ", size.bits())?;
        }
        writeln!(f, "union {} {{", self.name)?;
        for arm in &self.arms {
            writeln!(f, "{0}{0}{1}", INDENT, arm)?;
        }
        writeln!(f, "{}}};", INDENT)
    }
}

impl Display for UnionArm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        match &self.selector {
            ArmSelector::Default => f.write_str("default")?,
            ArmSelector::Case(values) => {
                let labels: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "case={}", labels.join("|"))?;
            }
        }
        if let Some(size) = &self.arraysize {
            write!(f, ", arraysize={}", size.text)?;
        }
        write!(f, "] {} {};", self.ty, self.name)
    }
}

impl Display for CaseValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CaseValue::Ident(name) => f.write_str(name),
            CaseValue::Int(i) => f.write_str(&i.text),
            CaseValue::Str(s) => write!(f, "(\"{}\")", s),
        }
    }
}
