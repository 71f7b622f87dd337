//! XSD builtin → native type table for every target language.

use crate::proto_tree::Builtin;

/// Native spellings of one builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Primitive {
    pub go: &'static str,
    pub typescript: &'static str,
    pub c: &'static str,
    pub java: &'static str,
    /// Reference type used where Java needs an object (optional, `List`).
    pub java_boxed: &'static str,
    pub rust: &'static str,
}

const fn p(
    go: &'static str,
    typescript: &'static str,
    c: &'static str,
    java: &'static str,
    java_boxed: &'static str,
    rust: &'static str,
) -> Primitive {
    Primitive {
        go,
        typescript,
        c,
        java,
        java_boxed,
        rust,
    }
}

const STRING: Primitive = p("string", "string", "char *", "String", "String", "String");
const BINARY: Primitive = p("[]byte", "Uint8Array", "uint8_t *", "byte[]", "byte[]", "Vec<u8>");

pub fn primitive(builtin: Builtin) -> Primitive {
    match builtin {
        Builtin::String
        | Builtin::DateTime
        | Builtin::Date
        | Builtin::Time
        | Builtin::Duration
        | Builtin::AnyUri
        | Builtin::QName
        | Builtin::AnySimpleType => STRING,
        Builtin::Boolean => p("bool", "boolean", "bool", "boolean", "Boolean", "bool"),
        Builtin::Decimal => p(
            "float64",
            "number",
            "double",
            "java.math.BigDecimal",
            "java.math.BigDecimal",
            "f64",
        ),
        Builtin::Float => p("float32", "number", "float", "float", "Float", "f32"),
        Builtin::Double => p("float64", "number", "double", "double", "Double", "f64"),
        Builtin::Integer => p(
            "int64",
            "number",
            "int64_t",
            "java.math.BigInteger",
            "java.math.BigInteger",
            "i64",
        ),
        Builtin::Long => p("int64", "number", "int64_t", "long", "Long", "i64"),
        Builtin::Int => p("int32", "number", "int32_t", "int", "Integer", "i32"),
        Builtin::Short => p("int16", "number", "int16_t", "short", "Short", "i16"),
        Builtin::Byte => p("int8", "number", "int8_t", "byte", "Byte", "i8"),
        Builtin::UnsignedLong => p(
            "uint64",
            "number",
            "uint64_t",
            "java.math.BigInteger",
            "java.math.BigInteger",
            "u64",
        ),
        Builtin::UnsignedInt => p("uint32", "number", "uint32_t", "long", "Long", "u32"),
        Builtin::UnsignedShort => p("uint16", "number", "uint16_t", "int", "Integer", "u16"),
        Builtin::UnsignedByte => p("uint8", "number", "uint8_t", "short", "Short", "u8"),
        Builtin::Base64Binary | Builtin::HexBinary => BINARY,
        Builtin::AnyType => p(
            "interface{}",
            "any",
            "void *",
            "Object",
            "Object",
            "serde_json::Value",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_types() {
        let base64 = primitive(Builtin::Base64Binary);
        assert_eq!(base64.go, "[]byte");
        assert_eq!(base64.typescript, "Uint8Array");
        assert_eq!(base64.java, "byte[]");
        assert_eq!(base64.rust, "Vec<u8>");
    }

    #[test]
    fn test_opaque_type() {
        let any = primitive(Builtin::AnyType);
        assert_eq!(any.go, "interface{}");
        assert_eq!(any.typescript, "any");
        assert_eq!(any.c, "void *");
        assert_eq!(any.java, "Object");
    }

    #[test]
    fn test_dates_are_strings() {
        for builtin in [Builtin::Date, Builtin::DateTime, Builtin::Time, Builtin::Duration] {
            assert_eq!(primitive(builtin), primitive(Builtin::String));
        }
    }
}
