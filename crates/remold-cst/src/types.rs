//! Structural type representation for declarations.
//!
//! Types are compared structurally, never by name resolution: equal type
//! class, equal qualifiers, element and pointee types recursively. Named
//! tag types compare by name unless name-only relaxation is in effect.

use std::fmt;

/// `const`/`volatile` qualifiers on a type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Qualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
}

impl Qualifiers {
    pub fn none() -> Self {
        Qualifiers::default()
    }
}

/// Discriminant for named tag types and tag declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Struct,
    Class,
    Union,
    Enum,
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TagKind::Struct => "struct",
            TagKind::Class => "class",
            TagKind::Union => "union",
            TagKind::Enum => "enum",
        };
        write!(f, "{text}")
    }
}

/// Builtin scalar types of the parsed subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Void,
    Bool,
    Char,
    Short,
    Int,
    Long,
    UChar,
    UShort,
    UInt,
    ULong,
    Float,
    Double,
}

/// A qualified type: qualifiers plus the underlying type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualType {
    pub quals: Qualifiers,
    pub ty: Type,
}

impl QualType {
    pub fn unqualified(ty: Type) -> Self {
        QualType {
            quals: Qualifiers::none(),
            ty,
        }
    }

    /// Structural equality with optional name-only relaxation for named
    /// tag types. Qualifiers always participate.
    pub fn structural_eq(&self, other: &QualType, name_only: bool) -> bool {
        self.structural_eq_modulo(other, name_only, None, None)
    }

    /// Structural equality that additionally identifies the two sides'
    /// *self* names: a named type spelled `self_name` on the left and
    /// one spelled `other_self_name` on the right compare equal. Member
    /// declarations use this so a class referring to itself matches a
    /// differently-named class referring to itself.
    pub fn structural_eq_modulo(
        &self,
        other: &QualType,
        name_only: bool,
        self_name: Option<&str>,
        other_self_name: Option<&str>,
    ) -> bool {
        self.quals == other.quals
            && self
                .ty
                .structural_eq(&other.ty, name_only, self_name, other_self_name)
    }
}

/// The type classes of the parsed subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Builtin(Builtin),
    Pointer(Box<QualType>),
    LValueRef(Box<QualType>),
    RValueRef(Box<QualType>),
    Array {
        elem: Box<QualType>,
        size: Option<u64>,
    },
    /// Function type; parameter types are carried by the parameter
    /// declarations, only the return type lives here.
    Function {
        ret: Box<QualType>,
    },
    /// A named record or enum type.
    Tag {
        kind: TagKind,
        name: String,
    },
    /// A type referenced by a name this front-end did not resolve
    /// (typedef names). Compares by name.
    Named(String),
}

impl Type {
    fn structural_eq(
        &self,
        other: &Type,
        name_only: bool,
        self_name: Option<&str>,
        other_self_name: Option<&str>,
    ) -> bool {
        let names_equal = |lhs: &str, rhs: &str| {
            name_only || lhs == rhs || (self_name == Some(lhs) && other_self_name == Some(rhs))
        };
        match (self, other) {
            (Type::Builtin(lhs), Type::Builtin(rhs)) => lhs == rhs,
            (Type::Pointer(lhs), Type::Pointer(rhs))
            | (Type::LValueRef(lhs), Type::LValueRef(rhs))
            | (Type::RValueRef(lhs), Type::RValueRef(rhs)) => {
                lhs.structural_eq_modulo(rhs, name_only, self_name, other_self_name)
            }
            (
                Type::Array {
                    elem: lhs,
                    size: lhs_size,
                },
                Type::Array {
                    elem: rhs,
                    size: rhs_size,
                },
            ) => {
                lhs_size == rhs_size
                    && lhs.structural_eq_modulo(rhs, name_only, self_name, other_self_name)
            }
            (Type::Function { ret: lhs }, Type::Function { ret: rhs }) => {
                lhs.structural_eq_modulo(rhs, name_only, self_name, other_self_name)
            }
            (
                Type::Tag {
                    kind: lhs_kind,
                    name: lhs_name,
                },
                Type::Tag {
                    kind: rhs_kind,
                    name: rhs_name,
                },
            ) => lhs_kind == rhs_kind && names_equal(lhs_name, rhs_name),
            (Type::Named(lhs), Type::Named(rhs)) => names_equal(lhs, rhs),
            _ => false,
        }
    }
}
