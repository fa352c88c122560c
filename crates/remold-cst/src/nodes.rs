//! Typed AST nodes.
//!
//! Nodes live in a flat arena owned by the [`crate::unit::Unit`]; every
//! node is addressed by a [`NodeId`] assigned in pre-order during
//! parsing, so ids are stable across runs for identical input. A node
//! records its parent, its byte span, the file its first token came
//! from, and a [`NodeData`] payload.
//!
//! The expression model follows the C family: expressions *are*
//! statements, so an expression can appear directly in a statement slot
//! without a wrapper node.

use std::fmt;

use remold_core::patch::Span;

use crate::tokenizer::FileId;
use crate::types::{QualType, TagKind};

/// A stable, unique identifier for an AST node within one unit.
///
/// Ids are assigned in pre-order (parent before children, left to
/// right), so the same source always produces the same assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// Member access specifier. `Default` is used outside class-like scopes
/// and means "not applicable".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Default,
    Public,
    Protected,
    Private,
}

/// What flavour of function a function declaration is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Free,
    Method,
    Constructor,
    Destructor,
    Conversion,
}

impl FunctionKind {
    /// The member kinds that implicitly carry their class's name.
    pub fn carries_class_name(self) -> bool {
        matches!(
            self,
            FunctionKind::Constructor | FunctionKind::Destructor | FunctionKind::Conversion
        )
    }
}

/// Binary operator opcodes, assignment forms included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
    ShlAssign,
    ShrAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    LogicalOr,
    LogicalAnd,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Unary operator opcodes. Pre and post increment forms are distinct
/// opcodes, as are dereference and address-of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    Deref,
    AddrOf,
}

/// One AST node: identity, position, and payload.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub file: FileId,
    pub span: Span,
    pub data: NodeData,
}

/// The payload of an AST node.
#[derive(Debug, Clone)]
pub enum NodeData {
    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------
    TranslationUnit {
        decls: Vec<NodeId>,
    },
    Namespace {
        name: String,
        decls: Vec<NodeId>,
    },
    Record {
        name: String,
        tag: TagKind,
        members: Vec<NodeId>,
        access: Access,
        /// True for an injected class name: the memberless copy of a
        /// record declared first inside its own body, through which the
        /// class refers to itself.
        injected: bool,
    },
    Enum {
        name: String,
        enumerators: Vec<NodeId>,
        access: Access,
    },
    EnumConstant {
        name: String,
        init: Option<NodeId>,
    },
    Function {
        name: String,
        fn_kind: FunctionKind,
        ty: QualType,
        params: Vec<NodeId>,
        body: Option<NodeId>,
        access: Access,
        is_virtual: bool,
        is_const: bool,
        is_static: bool,
    },
    Var {
        name: String,
        ty: QualType,
        init: Option<NodeId>,
        access: Access,
    },
    Field {
        name: String,
        ty: QualType,
        init: Option<NodeId>,
        access: Access,
    },
    Param {
        name: String,
        ty: QualType,
        default: Option<NodeId>,
    },
    Typedef {
        name: String,
        ty: QualType,
    },
    UsingDirective {
        namespace: String,
    },

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------
    Compound {
        stmts: Vec<NodeId>,
    },
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    For {
        init: Option<NodeId>,
        cond: Option<NodeId>,
        step: Option<NodeId>,
        body: NodeId,
    },
    Return {
        value: Option<NodeId>,
    },
    DeclStmt {
        decls: Vec<NodeId>,
    },
    Null,
    Break,
    Continue,

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------
    Binary {
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    IntLit {
        value: u128,
    },
    FloatLit {
        bits: u64,
        exact: bool,
    },
    CharLit {
        wide: bool,
        value: u32,
    },
    BoolLit {
        value: bool,
    },
    StrLit {
        wide: bool,
        value: String,
    },
    DeclRef {
        name: String,
        /// Resolved by the binder after parsing; `None` when the name
        /// could not be resolved lexically.
        target: Option<NodeId>,
    },
    Member {
        base: NodeId,
        name: String,
        arrow: bool,
        target: Option<NodeId>,
    },
    Call {
        callee: NodeId,
        args: Vec<NodeId>,
    },
    Paren {
        inner: NodeId,
    },
}

impl NodeData {
    /// The discriminant of this payload.
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::TranslationUnit { .. } => NodeKind::TranslationUnit,
            NodeData::Namespace { .. } => NodeKind::Namespace,
            NodeData::Record { .. } => NodeKind::Record,
            NodeData::Enum { .. } => NodeKind::Enum,
            NodeData::EnumConstant { .. } => NodeKind::EnumConstant,
            NodeData::Function { .. } => NodeKind::Function,
            NodeData::Var { .. } => NodeKind::Var,
            NodeData::Field { .. } => NodeKind::Field,
            NodeData::Param { .. } => NodeKind::Param,
            NodeData::Typedef { .. } => NodeKind::Typedef,
            NodeData::UsingDirective { .. } => NodeKind::UsingDirective,
            NodeData::Compound { .. } => NodeKind::Compound,
            NodeData::If { .. } => NodeKind::If,
            NodeData::While { .. } => NodeKind::While,
            NodeData::For { .. } => NodeKind::For,
            NodeData::Return { .. } => NodeKind::Return,
            NodeData::DeclStmt { .. } => NodeKind::DeclStmt,
            NodeData::Null => NodeKind::Null,
            NodeData::Break => NodeKind::Break,
            NodeData::Continue => NodeKind::Continue,
            NodeData::Binary { .. } => NodeKind::Binary,
            NodeData::Unary { .. } => NodeKind::Unary,
            NodeData::IntLit { .. } => NodeKind::IntLit,
            NodeData::FloatLit { .. } => NodeKind::FloatLit,
            NodeData::CharLit { .. } => NodeKind::CharLit,
            NodeData::BoolLit { .. } => NodeKind::BoolLit,
            NodeData::StrLit { .. } => NodeKind::StrLit,
            NodeData::DeclRef { .. } => NodeKind::DeclRef,
            NodeData::Member { .. } => NodeKind::Member,
            NodeData::Call { .. } => NodeKind::Call,
            NodeData::Paren { .. } => NodeKind::Paren,
        }
    }

    /// All syntactic children in source order. Optional children are
    /// included only when present; the engine's normalized child view
    /// has its own slot rules on top of this.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeData::TranslationUnit { decls }
            | NodeData::Namespace { decls, .. }
            | NodeData::DeclStmt { decls } => decls.clone(),
            NodeData::Record { members, .. } => members.clone(),
            NodeData::Enum { enumerators, .. } => enumerators.clone(),
            NodeData::EnumConstant { init, .. } => init.iter().copied().collect(),
            NodeData::Function { params, body, .. } => {
                params.iter().copied().chain(body.iter().copied()).collect()
            }
            NodeData::Var { init, .. } | NodeData::Field { init, .. } => {
                init.iter().copied().collect()
            }
            NodeData::Param { default, .. } => default.iter().copied().collect(),
            NodeData::Typedef { .. }
            | NodeData::UsingDirective { .. }
            | NodeData::Null
            | NodeData::Break
            | NodeData::Continue
            | NodeData::IntLit { .. }
            | NodeData::FloatLit { .. }
            | NodeData::CharLit { .. }
            | NodeData::BoolLit { .. }
            | NodeData::StrLit { .. }
            | NodeData::DeclRef { .. } => Vec::new(),
            NodeData::Compound { stmts } => stmts.clone(),
            NodeData::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let mut out = vec![*cond, *then_branch];
                out.extend(else_branch.iter().copied());
                out
            }
            NodeData::While { cond, body } => vec![*cond, *body],
            NodeData::For {
                init,
                cond,
                step,
                body,
            } => init
                .iter()
                .chain(cond.iter())
                .chain(step.iter())
                .copied()
                .chain(std::iter::once(*body))
                .collect(),
            NodeData::Return { value } => value.iter().copied().collect(),
            NodeData::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            NodeData::Unary { operand, .. } => vec![*operand],
            NodeData::Member { base, .. } => vec![*base],
            NodeData::Call { callee, args } => {
                std::iter::once(*callee).chain(args.iter().copied()).collect()
            }
            NodeData::Paren { inner } => vec![*inner],
        }
    }

    /// Rewrite every embedded [`NodeId`] through `map`. Used by the
    /// parser's pre-order renumbering pass; reference targets are not
    /// yet resolved at that point and need no mapping.
    pub(crate) fn map_ids(&mut self, map: &dyn Fn(NodeId) -> NodeId) {
        match self {
            NodeData::TranslationUnit { decls }
            | NodeData::Namespace { decls, .. }
            | NodeData::DeclStmt { decls } => decls.iter_mut().for_each(|id| *id = map(*id)),
            NodeData::Record { members, .. } => {
                members.iter_mut().for_each(|id| *id = map(*id))
            }
            NodeData::Enum { enumerators, .. } => {
                enumerators.iter_mut().for_each(|id| *id = map(*id))
            }
            NodeData::EnumConstant { init, .. } => {
                if let Some(init) = init {
                    *init = map(*init);
                }
            }
            NodeData::Function { params, body, .. } => {
                params.iter_mut().for_each(|id| *id = map(*id));
                if let Some(body) = body {
                    *body = map(*body);
                }
            }
            NodeData::Var { init, .. } | NodeData::Field { init, .. } => {
                if let Some(init) = init {
                    *init = map(*init);
                }
            }
            NodeData::Param { default, .. } => {
                if let Some(default) = default {
                    *default = map(*default);
                }
            }
            NodeData::Typedef { .. }
            | NodeData::UsingDirective { .. }
            | NodeData::Null
            | NodeData::Break
            | NodeData::Continue
            | NodeData::IntLit { .. }
            | NodeData::FloatLit { .. }
            | NodeData::CharLit { .. }
            | NodeData::BoolLit { .. }
            | NodeData::StrLit { .. }
            | NodeData::DeclRef { .. } => {}
            NodeData::Compound { stmts } => stmts.iter_mut().for_each(|id| *id = map(*id)),
            NodeData::If {
                cond,
                then_branch,
                else_branch,
            } => {
                *cond = map(*cond);
                *then_branch = map(*then_branch);
                if let Some(else_branch) = else_branch {
                    *else_branch = map(*else_branch);
                }
            }
            NodeData::While { cond, body } => {
                *cond = map(*cond);
                *body = map(*body);
            }
            NodeData::For {
                init,
                cond,
                step,
                body,
            } => {
                for slot in [init, cond, step] {
                    if let Some(id) = slot {
                        *id = map(*id);
                    }
                }
                *body = map(*body);
            }
            NodeData::Return { value } => {
                if let Some(value) = value {
                    *value = map(*value);
                }
            }
            NodeData::Binary { lhs, rhs, .. } => {
                *lhs = map(*lhs);
                *rhs = map(*rhs);
            }
            NodeData::Unary { operand, .. } => *operand = map(*operand),
            NodeData::Member { base, .. } => *base = map(*base),
            NodeData::Call { callee, args } => {
                *callee = map(*callee);
                args.iter_mut().for_each(|id| *id = map(*id));
            }
            NodeData::Paren { inner } => *inner = map(*inner),
        }
    }

    /// The declared name, for named declarations.
    pub fn name(&self) -> Option<&str> {
        match self {
            NodeData::Namespace { name, .. }
            | NodeData::Record { name, .. }
            | NodeData::Enum { name, .. }
            | NodeData::EnumConstant { name, .. }
            | NodeData::Function { name, .. }
            | NodeData::Var { name, .. }
            | NodeData::Field { name, .. }
            | NodeData::Param { name, .. }
            | NodeData::Typedef { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The declared type, for typed declarations.
    pub fn declared_type(&self) -> Option<&QualType> {
        match self {
            NodeData::Function { ty, .. }
            | NodeData::Var { ty, .. }
            | NodeData::Field { ty, .. }
            | NodeData::Param { ty, .. }
            | NodeData::Typedef { ty, .. } => Some(ty),
            _ => None,
        }
    }

    /// Whether this is an injected class name member.
    pub fn is_injected_class_name(&self) -> bool {
        matches!(self, NodeData::Record { injected: true, .. })
    }

    /// The access specifier, for member-capable declarations.
    pub fn access(&self) -> Option<Access> {
        match self {
            NodeData::Record { access, .. }
            | NodeData::Enum { access, .. }
            | NodeData::Function { access, .. }
            | NodeData::Var { access, .. }
            | NodeData::Field { access, .. } => Some(*access),
            _ => None,
        }
    }
}

/// Fieldless discriminant for node payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    TranslationUnit,
    Namespace,
    Record,
    Enum,
    EnumConstant,
    Function,
    Var,
    Field,
    Param,
    Typedef,
    UsingDirective,
    Compound,
    If,
    While,
    For,
    Return,
    DeclStmt,
    Null,
    Break,
    Continue,
    Binary,
    Unary,
    IntLit,
    FloatLit,
    CharLit,
    BoolLit,
    StrLit,
    DeclRef,
    Member,
    Call,
    Paren,
}

impl NodeKind {
    /// Discriminant equality. The kind set is flat, so this is also the
    /// subtype test: per-kind rules live in payload comparison, not in
    /// a class hierarchy.
    pub fn is_same(self, other: NodeKind) -> bool {
        self == other
    }

    /// The declaration/statement split, the one base distinction the
    /// comparator dispatches on. Everything that is not a declaration
    /// is a statement; expressions are statements.
    pub fn is_declaration(self) -> bool {
        matches!(
            self,
            NodeKind::TranslationUnit
                | NodeKind::Namespace
                | NodeKind::Record
                | NodeKind::Enum
                | NodeKind::EnumConstant
                | NodeKind::Function
                | NodeKind::Var
                | NodeKind::Field
                | NodeKind::Param
                | NodeKind::Typedef
                | NodeKind::UsingDirective
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Builtin, Type};

    fn int() -> QualType {
        QualType::unqualified(Type::Builtin(Builtin::Int))
    }

    #[test]
    fn kind_predicates_split_declarations_from_statements() {
        assert!(NodeKind::Function.is_declaration());
        assert!(NodeKind::Param.is_declaration());
        assert!(!NodeKind::Binary.is_declaration());
        assert!(!NodeKind::Compound.is_declaration());
        assert!(NodeKind::Binary.is_same(NodeKind::Binary));
        assert!(!NodeKind::Binary.is_same(NodeKind::Unary));
    }

    #[test]
    fn children_follow_source_order() {
        let data = NodeData::If {
            cond: NodeId(4),
            then_branch: NodeId(5),
            else_branch: Some(NodeId(9)),
        };
        assert_eq!(data.children(), vec![NodeId(4), NodeId(5), NodeId(9)]);

        let no_else = NodeData::If {
            cond: NodeId(4),
            then_branch: NodeId(5),
            else_branch: None,
        };
        assert_eq!(no_else.children(), vec![NodeId(4), NodeId(5)]);
    }

    #[test]
    fn function_children_are_params_then_body() {
        let data = NodeData::Function {
            name: "f".into(),
            fn_kind: FunctionKind::Free,
            ty: QualType::unqualified(Type::Function {
                ret: Box::new(int()),
            }),
            params: vec![NodeId(2), NodeId(3)],
            body: Some(NodeId(4)),
            access: Access::Default,
            is_virtual: false,
            is_const: false,
            is_static: false,
        };
        assert_eq!(data.children(), vec![NodeId(2), NodeId(3), NodeId(4)]);
        assert_eq!(data.kind(), NodeKind::Function);
        assert_eq!(data.name(), Some("f"));
    }

    #[test]
    fn constructor_kinds_carry_the_class_name() {
        assert!(FunctionKind::Constructor.carries_class_name());
        assert!(FunctionKind::Destructor.carries_class_name());
        assert!(FunctionKind::Conversion.carries_class_name());
        assert!(!FunctionKind::Method.carries_class_name());
        assert!(!FunctionKind::Free.carries_class_name());
    }
}
