use serde::Serialize;

/// A parsed MR file: zero or more specifications in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MrFile {
    pub specifications: Vec<Specification>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Specification {
    pub name:       String,
    pub attributes: SpecAttributes,
    pub types:      Vec<TypeDecl>,
}

/// Specification-level string attributes. Values keep their backslash escapes
/// exactly as written between the quotes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpecAttributes {
    pub version:     Option<String>,
    pub revision:    Option<String>,
    pub release:     Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeDecl {
    Struct(StructDecl),
    Union(UnionDecl),
    Enum(EnumDecl),
}

impl TypeDecl {
    pub fn name(&self) -> &str {
        match self {
            TypeDecl::Struct(s) => &s.name,
            TypeDecl::Union(u) => &u.name,
            TypeDecl::Enum(e) => &e.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructDecl {
    pub name:   String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub ty:         TypeRef,
    pub name:       String,
    pub attributes: Vec<FieldAttribute>,
}

impl Field {
    pub fn arraysize(&self) -> Option<&AttrValue> {
        self.attributes.arraysize()
    }

    pub fn length(&self) -> Option<&AttrValue> {
        self.attributes.length()
    }

    pub fn switch_is(&self) -> Option<&AttrValue> {
        self.attributes.switch_is()
    }

    pub fn value(&self) -> Option<&AttrValue> {
        self.attributes.value()
    }
}

/// Named lookups over an attribute list. Each returns the first match in
/// source order.
pub trait FieldAttributes {
    fn arraysize(&self) -> Option<&AttrValue>;
    fn length(&self) -> Option<&AttrValue>;
    fn switch_is(&self) -> Option<&AttrValue>;
    fn value(&self) -> Option<&AttrValue>;
}

impl FieldAttributes for [FieldAttribute] {
    fn arraysize(&self) -> Option<&AttrValue> {
        self.iter().find_map(|a| match a {
            FieldAttribute::ArraySize(v) => Some(v),
            _ => None,
        })
    }

    fn length(&self) -> Option<&AttrValue> {
        self.iter().find_map(|a| match a {
            FieldAttribute::Length(v) => Some(v),
            _ => None,
        })
    }

    fn switch_is(&self) -> Option<&AttrValue> {
        self.iter().find_map(|a| match a {
            FieldAttribute::SwitchIs(v) => Some(v),
            _ => None,
        })
    }

    fn value(&self) -> Option<&AttrValue> {
        self.iter().find_map(|a| match a {
            FieldAttribute::Value(v) => Some(v),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAttribute {
    SwitchIs(AttrValue),
    Length(AttrValue),
    /// Accepted and preserved, never used by code generation.
    Value(AttrValue),
    ArraySize(AttrValue),
}

impl FieldAttribute {
    pub fn key(&self) -> &'static str {
        match self {
            FieldAttribute::SwitchIs(_) => "switch_is",
            FieldAttribute::Length(_) => "length",
            FieldAttribute::Value(_) => "value",
            FieldAttribute::ArraySize(_) => "arraysize",
        }
    }

    pub fn value(&self) -> &AttrValue {
        match self {
            FieldAttribute::SwitchIs(v)
            | FieldAttribute::Length(v)
            | FieldAttribute::Value(v)
            | FieldAttribute::ArraySize(v) => v,
        }
    }
}

/// Right-hand side of a field attribute: a literal or the name of a sibling
/// field whose runtime value is used.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrValue {
    Int(IntLiteral),
    Ident(String),
}

/// Integer literal in decimal or `0x` hexadecimal form. The source text is
/// kept so generated code spells constants the way the author did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntLiteral {
    pub text:  String,
    pub value: u64,
}

impl IntLiteral {
    pub fn parse(text: &str) -> Option<IntLiteral> {
        let value = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).ok()?,
            None => text.parse::<u64>().ok()?,
        };
        Some(IntLiteral { text: text.to_string(), value })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Primitive {
    Bool,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Double,
    AsciiString,
    Utf16String,
    Guid,
}

impl Primitive {
    pub const ALL: [Primitive; 9] = [
        Primitive::Bool,
        Primitive::Uint8,
        Primitive::Uint16,
        Primitive::Uint32,
        Primitive::Uint64,
        Primitive::Double,
        Primitive::AsciiString,
        Primitive::Utf16String,
        Primitive::Guid,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Uint8 => "uint8",
            Primitive::Uint16 => "uint16",
            Primitive::Uint32 => "uint32",
            Primitive::Uint64 => "uint64",
            Primitive::Double => "double",
            Primitive::AsciiString => "ascii_string",
            Primitive::Utf16String => "utf16_string",
            Primitive::Guid => "GUID",
        }
    }

    pub fn from_keyword(text: &str) -> Option<Primitive> {
        Primitive::ALL.iter().copied().find(|p| p.keyword() == text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum TypeRef {
    Primitive(Primitive),
    Struct(String),
    Union(String),
    Enum(String),
    /// Unrecognised bare type name, passed through to the runtime verbatim.
    Opaque(String),
}

/// Closed set of code generation strategies a type reference selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Struct,
    Union,
    Enum,
    AsciiString,
    Utf16String,
    Scalar,
}

impl TypeRef {
    pub fn category(&self) -> TypeCategory {
        match self {
            TypeRef::Struct(_) => TypeCategory::Struct,
            TypeRef::Union(_) => TypeCategory::Union,
            TypeRef::Enum(_) => TypeCategory::Enum,
            TypeRef::Primitive(Primitive::AsciiString) => TypeCategory::AsciiString,
            TypeRef::Primitive(Primitive::Utf16String) => TypeCategory::Utf16String,
            TypeRef::Primitive(_) | TypeRef::Opaque(_) => TypeCategory::Scalar,
        }
    }

    /// Suffix of the runtime function handling this type, e.g. `uint32` or
    /// `struct_Foo`.
    pub fn symbol(&self) -> String {
        match self {
            TypeRef::Primitive(p) => p.keyword().to_string(),
            TypeRef::Struct(n) => format!("struct_{}", n),
            TypeRef::Union(n) => format!("union_{}", n),
            TypeRef::Enum(n) => format!("enum_{}", n),
            TypeRef::Opaque(n) => n.clone(),
        }
    }
}

/// Bit width accepted by `enumsize` and `switch_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BitWidth {
    W8,
    W16,
    W32,
    W64,
}

impl BitWidth {
    pub fn bits(self) -> u32 {
        match self {
            BitWidth::W8 => 8,
            BitWidth::W16 => 16,
            BitWidth::W32 => 32,
            BitWidth::W64 => 64,
        }
    }

    pub fn from_text(text: &str) -> Option<BitWidth> {
        match text {
            "8" => Some(BitWidth::W8),
            "16" => Some(BitWidth::W16),
            "32" => Some(BitWidth::W32),
            "64" => Some(BitWidth::W64),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDecl {
    pub name:  String,
    /// `enumsize`, `None` when not written (32 bits).
    pub size:  Option<BitWidth>,
    /// `enumtype=flags`
    pub flags: bool,
    pub items: Vec<EnumItem>,
}

impl EnumDecl {
    pub fn width(&self) -> BitWidth {
        self.size.unwrap_or(BitWidth::W32)
    }

    /// Items holding the smallest and largest numeric value. The first item
    /// wins on ties.
    pub fn bounds(&self) -> Option<(&EnumItem, &EnumItem)> {
        let mut items = self.items.iter();
        let first = items.next()?;
        Some(items.fold((first, first), |(min, max), item| {
            (
                if item.value.value < min.value.value { item } else { min },
                if item.value.value > max.value.value { item } else { max },
            )
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumItem {
    pub name:  String,
    pub value: IntLiteral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionDecl {
    pub name:        String,
    /// `switch_size`, `None` when not written (32 bits).
    pub switch_size: Option<BitWidth>,
    pub arms:        Vec<UnionArm>,
}

impl UnionDecl {
    pub fn width(&self) -> BitWidth {
        self.switch_size.unwrap_or(BitWidth::W32)
    }

    pub fn default_arm(&self) -> Option<&UnionArm> {
        self.arms.iter().find(|arm| arm.selector == ArmSelector::Default)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionArm {
    pub selector:  ArmSelector,
    pub arraysize: Option<IntLiteral>,
    pub ty:        TypeRef,
    pub name:      String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmSelector {
    Case(Vec<CaseValue>),
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseValue {
    Ident(String),
    Int(IntLiteral),
    /// Contents of a `("...")` label, escapes kept verbatim.
    Str(String),
}

impl CaseValue {
    /// Text used as the C case label.
    pub fn label(&self) -> &str {
        match self {
            CaseValue::Ident(s) | CaseValue::Str(s) => s,
            CaseValue::Int(i) => &i.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, text: &str) -> EnumItem {
        EnumItem { name: name.into(), value: IntLiteral::parse(text).unwrap() }
    }

    #[test]
    fn test_int_literal_parses_hex_and_decimal() {
        assert_eq!(IntLiteral::parse("0x1F").unwrap().value, 31);
        assert_eq!(IntLiteral::parse("42").unwrap().value, 42);
        assert!(IntLiteral::parse("len").is_none());
    }

    #[test]
    fn test_enum_bounds_compare_numerically() {
        let decl = EnumDecl {
            name:  "E".into(),
            size:  None,
            flags: false,
            items: vec![item("A", "0x10"), item("B", "9"), item("C", "0x2"), item("D", "2")],
        };
        let (min, max) = decl.bounds().unwrap();
        assert_eq!(min.name, "C");
        assert_eq!(max.name, "A");
    }

    #[test]
    fn test_type_categories() {
        assert_eq!(TypeRef::Primitive(Primitive::Guid).category(), TypeCategory::Scalar);
        assert_eq!(TypeRef::Primitive(Primitive::Utf16String).category(), TypeCategory::Utf16String);
        assert_eq!(TypeRef::Opaque("FILETIME".into()).category(), TypeCategory::Scalar);
        assert_eq!(TypeRef::Union("U".into()).symbol(), "union_U");
    }
}
