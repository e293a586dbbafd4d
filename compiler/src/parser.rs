use crate::{
    tokenizer::Token,
    types::{
        ArmSelector, AttrValue, BitWidth, CaseValue, EnumDecl, EnumItem, Field, FieldAttribute,
        IntLiteral, MrFile, Primitive, SpecAttributes, Specification, StructDecl, TypeDecl,
        TypeRef, UnionArm, UnionDecl,
    },
    utils::{describe, error_at, quote},
    error::MrError,
};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IDENTIFIER:    Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref INTEGER:       Regex = Regex::new(r"^(0[xX][0-9A-Fa-f]+|\d+)$").unwrap();
    static ref STRING:        Regex = Regex::new(r#"^".*"$"#).unwrap();
    static ref EQUALS:        Regex = Regex::new(r"^=$").unwrap();
    static ref SEMICOLON:     Regex = Regex::new(r"^;$").unwrap();
    static ref COMMA:         Regex = Regex::new(r"^,$").unwrap();
    static ref PIPE:          Regex = Regex::new(r"^\|$").unwrap();
    static ref LEFT_BRACE:    Regex = Regex::new(r"^\{$").unwrap();
    static ref RIGHT_BRACE:   Regex = Regex::new(r"^\}$").unwrap();
    static ref LEFT_BRACKET:  Regex = Regex::new(r"^\[$").unwrap();
    static ref RIGHT_BRACKET: Regex = Regex::new(r"^\]$").unwrap();
    static ref LEFT_PAREN:    Regex = Regex::new(r"^\($").unwrap();
    static ref RIGHT_PAREN:   Regex = Regex::new(r"^\)$").unwrap();
    static ref SPEC_KEYWORD:  Regex = Regex::new(r"^specification$").unwrap();
    static ref STRUCT_KEYWORD: Regex = Regex::new(r"^struct$").unwrap();
    static ref UNION_KEYWORD: Regex = Regex::new(r"^union$").unwrap();
    static ref ENUM_KEYWORD:  Regex = Regex::new(r"^enum$").unwrap();
    static ref CASE_KEYWORD:  Regex = Regex::new(r"^case$").unwrap();
    static ref DEFAULT_KEYWORD: Regex = Regex::new(r"^default$").unwrap();
    static ref ARRAYSIZE_KEYWORD: Regex = Regex::new(r"^arraysize$").unwrap();
    static ref FLAGS_KEYWORD: Regex = Regex::new(r"^flags$").unwrap();
    static ref EOF:           Regex = Regex::new(r"^$").unwrap();
}

/// Parse a token stream produced by `tokenize` into an `MrFile`. The whole
/// stream must be consumed; the first error aborts the parse.
pub fn parse_mr(tokens: &[Token]) -> Result<MrFile, MrError> {
    let mut parser = Parser { tokens, index: 0 };
    let mut specifications = Vec::new();

    while !parser.eat(&EOF) {
        specifications.push(parser.specification()?);
    }

    Ok(MrFile { specifications })
}

struct Parser<'a> {
    tokens: &'a [Token],
    index:  usize,
}

/// An attribute as written, before it is checked against the declaration it
/// precedes.
struct RawAttribute<'a> {
    key:   &'a Token,
    value: &'a Token,
}

impl<'a> Parser<'a> {
    fn current(&self) -> &'a Token {
        // The end-of-file token is never consumed past.
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.index.min(last)]
    }

    fn peek(&self, test: &Regex) -> bool {
        test.is_match(&self.current().text)
    }

    fn eat(&mut self, test: &Regex) -> bool {
        if self.peek(test) {
            if !self.current().text.is_empty() {
                self.index += 1;
            }
            true
        } else {
            false
        }
    }

    fn expect(&mut self, test: &Regex, expected: &str) -> Result<&'a Token, MrError> {
        let tok = self.current();
        if !self.eat(test) {
            return Err(error_at(
                &format!("Expected {} but found {}", expected, describe(tok)),
                tok,
            ));
        }
        Ok(tok)
    }

    fn unexpected_token(&self) -> MrError {
        let tok = self.current();
        error_at(&format!("Unexpected token {}", describe(tok)), tok)
    }

    fn identifier(&mut self) -> Result<String, MrError> {
        Ok(self.expect(&IDENTIFIER, "identifier")?.text.clone())
    }

    fn integer(&mut self) -> Result<IntLiteral, MrError> {
        let tok = self.expect(&INTEGER, "integer")?;
        IntLiteral::parse(&tok.text)
            .ok_or_else(|| error_at(&format!("Invalid integer {}", quote(&tok.text)), tok))
    }

    fn string(&mut self) -> Result<String, MrError> {
        let tok = self.expect(&STRING, "quoted string")?;
        Ok(tok.text[1..tok.text.len() - 1].to_string())
    }

    /// `[key=value, ...]`, or nothing when the next token is not `[`.
    fn attribute_list(&mut self) -> Result<Vec<RawAttribute<'a>>, MrError> {
        let mut attributes = Vec::new();
        if !self.eat(&LEFT_BRACKET) {
            return Ok(attributes);
        }
        loop {
            let key = self.expect(&IDENTIFIER, "attribute name")?;
            self.expect(&EQUALS, "\"=\"")?;
            let value = self.current();
            if !(INTEGER.is_match(&value.text)
                || IDENTIFIER.is_match(&value.text)
                || STRING.is_match(&value.text))
            {
                return Err(error_at(
                    &format!("Expected attribute value but found {}", describe(value)),
                    value,
                ));
            }
            self.index += 1;
            attributes.push(RawAttribute { key, value });
            if !self.eat(&COMMA) {
                break;
            }
        }
        self.expect(&RIGHT_BRACKET, "\"]\"")?;
        Ok(attributes)
    }

    fn specification(&mut self) -> Result<Specification, MrError> {
        let raw = self.attribute_list()?;
        let mut attributes = SpecAttributes::default();
        for attr in raw {
            if !STRING.is_match(&attr.value.text) {
                return Err(error_at(
                    &format!("Expected quoted string but found {}", describe(attr.value)),
                    attr.value,
                ));
            }
            let text = attr.value.text[1..attr.value.text.len() - 1].to_string();
            let slot = match attr.key.text.as_str() {
                "version" => &mut attributes.version,
                "revision" => &mut attributes.revision,
                "release" => &mut attributes.release,
                "description" => &mut attributes.description,
                other => {
                    return Err(error_at(
                        &format!("Unknown specification attribute {}", quote(other)),
                        attr.key,
                    ))
                }
            };
            *slot = Some(text);
        }

        if !self.peek(&SPEC_KEYWORD) {
            return Err(self.unexpected_token());
        }
        self.index += 1;
        let name = self.identifier()?;
        self.expect(&LEFT_BRACE, "\"{\"")?;

        let mut types = Vec::new();
        while !self.eat(&RIGHT_BRACE) {
            types.push(self.type_decl()?);
        }
        self.expect(&SEMICOLON, "\";\"")?;

        Ok(Specification { name, attributes, types })
    }

    fn type_decl(&mut self) -> Result<TypeDecl, MrError> {
        let attributes = self.attribute_list()?;

        if self.eat(&STRUCT_KEYWORD) {
            if let Some(attr) = attributes.first() {
                return Err(error_at(
                    &format!("Unexpected attribute {} on struct", quote(&attr.key.text)),
                    attr.key,
                ));
            }
            self.struct_decl().map(TypeDecl::Struct)
        } else if self.eat(&ENUM_KEYWORD) {
            self.enum_decl(attributes).map(TypeDecl::Enum)
        } else if self.eat(&UNION_KEYWORD) {
            self.union_decl(attributes).map(TypeDecl::Union)
        } else {
            Err(self.unexpected_token())
        }
    }

    fn struct_decl(&mut self) -> Result<StructDecl, MrError> {
        let name = self.identifier()?;
        self.expect(&LEFT_BRACE, "\"{\"")?;

        let mut fields = Vec::new();
        while !self.eat(&RIGHT_BRACE) {
            let mut attributes = Vec::new();
            for attr in self.attribute_list()? {
                let value = attr_value(attr.value)?;
                attributes.push(match attr.key.text.as_str() {
                    "switch_is" => FieldAttribute::SwitchIs(value),
                    "length" => FieldAttribute::Length(value),
                    "value" => FieldAttribute::Value(value),
                    "arraysize" => FieldAttribute::ArraySize(value),
                    other => {
                        return Err(error_at(
                            &format!("Unexpected field attribute {}", quote(other)),
                            attr.key,
                        ))
                    }
                });
            }
            let ty = self.type_ref(true)?;
            let name = self.identifier()?;
            self.expect(&SEMICOLON, "\";\"")?;
            fields.push(Field { ty, name, attributes });
        }
        self.expect(&SEMICOLON, "\";\"")?;

        Ok(StructDecl { name, fields })
    }

    /// Field type: a primitive keyword, a `struct`/`union`/`enum` reference
    /// or a bare name. Union arms cannot hold unions.
    fn type_ref(&mut self, allow_union: bool) -> Result<TypeRef, MrError> {
        if self.eat(&STRUCT_KEYWORD) {
            return Ok(TypeRef::Struct(self.identifier()?));
        }
        if self.eat(&ENUM_KEYWORD) {
            return Ok(TypeRef::Enum(self.identifier()?));
        }
        if self.peek(&UNION_KEYWORD) {
            if !allow_union {
                return Err(error_at("A union arm cannot hold a union", self.current()));
            }
            self.index += 1;
            return Ok(TypeRef::Union(self.identifier()?));
        }
        let name = self.expect(&IDENTIFIER, "type")?;
        Ok(match Primitive::from_keyword(&name.text) {
            Some(p) => TypeRef::Primitive(p),
            None => TypeRef::Opaque(name.text.clone()),
        })
    }

    fn enum_decl(&mut self, raw: Vec<RawAttribute<'a>>) -> Result<EnumDecl, MrError> {
        let mut size = None;
        let mut flags = false;
        for attr in raw {
            match attr.key.text.as_str() {
                "enumsize" => size = Some(bit_width(attr.value)?),
                "enumtype" => {
                    if !FLAGS_KEYWORD.is_match(&attr.value.text) {
                        return Err(error_at(
                            &format!("Expected \"flags\" but found {}", describe(attr.value)),
                            attr.value,
                        ));
                    }
                    flags = true;
                }
                other => {
                    return Err(error_at(
                        &format!("Unexpected enum attribute {}", quote(other)),
                        attr.key,
                    ))
                }
            }
        }

        let name = self.identifier()?;
        self.expect(&LEFT_BRACE, "\"{\"")?;
        let mut items = Vec::new();
        loop {
            let item_name = self.identifier()?;
            self.expect(&EQUALS, "\"=\"")?;
            let value = self.integer()?;
            items.push(EnumItem { name: item_name, value });
            if !self.eat(&COMMA) {
                break;
            }
        }
        self.expect(&RIGHT_BRACE, "\"}\"")?;
        self.expect(&SEMICOLON, "\";\"")?;

        Ok(EnumDecl { name, size, flags, items })
    }

    fn union_decl(&mut self, raw: Vec<RawAttribute<'a>>) -> Result<UnionDecl, MrError> {
        let mut switch_size = None;
        for attr in raw {
            if attr.key.text != "switch_size" {
                return Err(error_at(
                    &format!("Unexpected union attribute {}", quote(&attr.key.text)),
                    attr.key,
                ));
            }
            switch_size = Some(bit_width(attr.value)?);
        }

        let name = self.identifier()?;
        self.expect(&LEFT_BRACE, "\"{\"")?;
        let mut arms: Vec<UnionArm> = Vec::new();
        while !self.eat(&RIGHT_BRACE) {
            let has_default = arms.iter().any(|arm| arm.selector == ArmSelector::Default);
            arms.push(self.union_arm(has_default)?);
        }
        self.expect(&SEMICOLON, "\";\"")?;

        Ok(UnionDecl { name, switch_size, arms })
    }

    /// One `[case=...]` or `[default]` arm. A union takes at most one default.
    fn union_arm(&mut self, has_default: bool) -> Result<UnionArm, MrError> {
        self.expect(&LEFT_BRACKET, "\"[\"")?;
        let selector_tok = self.current();
        let selector = if self.eat(&DEFAULT_KEYWORD) {
            if has_default {
                return Err(error_at("Duplicate default arm in union", selector_tok));
            }
            ArmSelector::Default
        } else if self.eat(&CASE_KEYWORD) {
            self.expect(&EQUALS, "\"=\"")?;
            let mut values = vec![self.case_value()?];
            while self.eat(&PIPE) {
                values.push(self.case_value()?);
            }
            ArmSelector::Case(values)
        } else {
            return Err(self.unexpected_token());
        };

        let mut arraysize = None;
        if self.eat(&COMMA) {
            self.expect(&ARRAYSIZE_KEYWORD, "\"arraysize\"")?;
            self.expect(&EQUALS, "\"=\"")?;
            arraysize = Some(self.integer()?);
        }
        self.expect(&RIGHT_BRACKET, "\"]\"")?;

        let ty = self.type_ref(false)?;
        let name = self.identifier()?;
        self.expect(&SEMICOLON, "\";\"")?;

        Ok(UnionArm { selector, arraysize, ty, name })
    }

    fn case_value(&mut self) -> Result<CaseValue, MrError> {
        if self.eat(&LEFT_PAREN) {
            let text = self.string()?;
            self.expect(&RIGHT_PAREN, "\")\"")?;
            return Ok(CaseValue::Str(text));
        }
        if self.peek(&INTEGER) {
            return Ok(CaseValue::Int(self.integer()?));
        }
        Ok(CaseValue::Ident(self.identifier()?))
    }
}

fn attr_value(tok: &Token) -> Result<AttrValue, MrError> {
    if INTEGER.is_match(&tok.text) {
        return IntLiteral::parse(&tok.text)
            .map(AttrValue::Int)
            .ok_or_else(|| error_at(&format!("Invalid integer {}", quote(&tok.text)), tok));
    }
    if IDENTIFIER.is_match(&tok.text) {
        return Ok(AttrValue::Ident(tok.text.clone()));
    }
    Err(error_at(
        &format!("Expected integer or identifier but found {}", describe(tok)),
        tok,
    ))
}

fn bit_width(tok: &Token) -> Result<BitWidth, MrError> {
    BitWidth::from_text(&tok.text).ok_or_else(|| {
        error_at(
            &format!("Expected one of 8, 16, 32, 64 but found {}", describe(tok)),
            tok,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn parse(text: &str) -> Result<MrFile, MrError> {
        parse_mr(&tokenize(text)?)
    }

    #[test]
    fn test_parse_empty_file() {
        assert_eq!(parse("  // nothing\n").unwrap(), MrFile::default());
    }

    #[test]
    fn test_parse_specification_attributes() {
        let file = parse(
            r#"[version="1.0", release="2012-03-01", version="1.1"] specification Test { };"#,
        )
        .unwrap();
        let spec = &file.specifications[0];
        assert_eq!(spec.name, "Test");
        assert_eq!(spec.attributes.version.as_deref(), Some("1.1"));
        assert_eq!(spec.attributes.release.as_deref(), Some("2012-03-01"));
        assert!(spec.attributes.revision.is_none());
        assert!(spec.types.is_empty());
    }

    #[test]
    fn test_parse_struct_fields_and_attributes() {
        let file = parse(
            "specification T {
                struct Foo {
                    uint32 count;
                    [arraysize=count, value=0x10] struct Bar bars;
                    [length=8] ascii_string name;
                    [switch_is=count] union Sel sel;
                    FILETIME stamp;
                };
            };",
        )
        .unwrap();
        let TypeDecl::Struct(foo) = &file.specifications[0].types[0] else {
            panic!("expected a struct");
        };
        assert_eq!(foo.fields.len(), 5);
        assert_eq!(foo.fields[0].ty, TypeRef::Primitive(Primitive::Uint32));
        assert_eq!(foo.fields[1].ty, TypeRef::Struct("Bar".into()));
        assert_eq!(foo.fields[1].arraysize(), Some(&AttrValue::Ident("count".into())));
        assert_eq!(foo.fields[1].value().map(|v| matches!(v, AttrValue::Int(i) if i.value == 16)), Some(true));
        assert!(matches!(foo.fields[2].length(), Some(AttrValue::Int(i)) if i.value == 8));
        assert_eq!(foo.fields[3].switch_is(), Some(&AttrValue::Ident("count".into())));
        assert_eq!(foo.fields[4].ty, TypeRef::Opaque("FILETIME".into()));
    }

    #[test]
    fn test_parse_enum_attributes() {
        let file = parse(
            "specification T { [enumtype=flags, enumsize=16] enum E { A=0x1, B=0x2 }; };",
        )
        .unwrap();
        let TypeDecl::Enum(e) = &file.specifications[0].types[0] else {
            panic!("expected an enum");
        };
        assert!(e.flags);
        assert_eq!(e.size, Some(BitWidth::W16));
        assert_eq!(e.items.len(), 2);
        assert_eq!(e.items[1].value.value, 2);
    }

    #[test]
    fn test_parse_union_arms() {
        let file = parse(
            r#"specification T {
                [switch_size=16] union U {
                    [case=0x1|TWO|("three")] uint32 a;
                    [case=4, arraysize=16] uint8 raw;
                    [default] enum E e;
                };
            };"#,
        )
        .unwrap();
        let TypeDecl::Union(u) = &file.specifications[0].types[0] else {
            panic!("expected a union");
        };
        assert_eq!(u.width(), BitWidth::W16);
        assert_eq!(u.arms.len(), 3);
        let ArmSelector::Case(values) = &u.arms[0].selector else {
            panic!("expected a case arm");
        };
        let labels: Vec<&str> = values.iter().map(|v| v.label()).collect();
        assert_eq!(labels, vec!["0x1", "TWO", "three"]);
        assert_eq!(u.arms[1].arraysize.as_ref().map(|a| a.value), Some(16));
        assert_eq!(u.arms[2].selector, ArmSelector::Default);
        assert!(u.default_arm().is_some());
    }

    #[test]
    fn test_keywords_are_contextual() {
        let file = parse("specification T { struct S { uint32 value; uint8 flags; }; };").unwrap();
        let TypeDecl::Struct(s) = &file.specifications[0].types[0] else {
            panic!("expected a struct");
        };
        assert_eq!(s.fields[0].name, "value");
        assert_eq!(s.fields[1].name, "flags");
    }

    #[test]
    fn test_rejects_attribute_for_wrong_declaration() {
        let err = parse("specification T { struct S { [case=1] uint32 a; }; };").unwrap_err();
        assert!(matches!(err, MrError::ParseError { column: 31, .. }), "{:?}", err);

        let err = parse("specification T { [switch_size=16] enum E { A=1 }; };").unwrap_err();
        assert!(matches!(err, MrError::ParseError { .. }), "{:?}", err);

        let err = parse("specification T { [enumsize=12] enum E { A=1 }; };").unwrap_err();
        assert!(matches!(err, MrError::ParseError { .. }), "{:?}", err);
    }

    #[test]
    fn test_rejects_union_inside_union() {
        let err = parse("specification T { union U { [default] union V v; }; };").unwrap_err();
        assert!(matches!(err, MrError::ParseError { .. }), "{:?}", err);
    }

    #[test]
    fn test_rejects_second_default_arm() {
        let err = parse(
            "specification T { union U { [default] uint8 a; [case=1] uint16 b; [default] uint32 c; }; };",
        )
        .unwrap_err();
        assert!(matches!(err, MrError::ParseError { line: 1, column: 68, .. }), "{:?}", err);
        assert!(err.to_string().contains("Duplicate default arm"));
    }

    #[test]
    fn test_rejects_trailing_garbage() {
        let err = parse("specification T { }; struct").unwrap_err();
        assert!(matches!(err, MrError::ParseError { line: 1, column: 22, .. }), "{:?}", err);
    }

    #[test]
    fn test_rejects_empty_enum() {
        let err = parse("specification T { enum E { }; };").unwrap_err();
        assert!(matches!(err, MrError::ParseError { .. }), "{:?}", err);
    }
}
