//! Uniform node views with normalized children.
//!
//! The matcher walks templates and candidates as trees of [`NodeView`]s.
//! A view is either a real AST node, a *virtual group* bundling an
//! ordered run of views with no underlying node, or the empty view
//! standing in for an absent child slot. Groups appear in three places:
//! as the multi-subtree root of a template or candidate, as the
//! parameter-list pseudo-child of a function declaration, and as the
//! prefix slices enumerated for variadic bindings.
//!
//! Every view gets an identifier from a process-wide monotone counter at
//! construction; equality is identifier equality, never address
//! comparison. Child lists are computed on first access and memoised.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use remold_core::patch::Span;
use remold_cst::{FileId, NodeData, NodeId, NodeKind, Unit};

static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(0);

/// A view over one logical tree position.
///
/// Cloning is cheap and shares the memoised child list; forked partial
/// matches reference the same views.
#[derive(Clone)]
pub struct NodeView {
    inner: Rc<ViewInner>,
}

struct ViewInner {
    id: u64,
    repr: ViewRepr,
    children: RefCell<Option<Rc<Vec<NodeView>>>>,
}

enum ViewRepr {
    Real(NodeId),
    Group,
    Empty,
}

impl PartialEq for NodeView {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for NodeView {}

impl fmt::Debug for NodeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.repr {
            ViewRepr::Real(node) => write!(f, "View#{}({node})", self.inner.id),
            ViewRepr::Group => {
                let count = self
                    .inner
                    .children
                    .borrow()
                    .as_ref()
                    .map(|children| children.len())
                    .unwrap_or_default();
                write!(f, "View#{}(group of {count})", self.inner.id)
            }
            ViewRepr::Empty => write!(f, "View#{}(empty)", self.inner.id),
        }
    }
}

impl NodeView {
    fn alloc(repr: ViewRepr, children: Option<Vec<NodeView>>) -> NodeView {
        NodeView {
            inner: Rc::new(ViewInner {
                id: NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed),
                repr,
                children: RefCell::new(children.map(Rc::new)),
            }),
        }
    }

    /// View over a real AST node.
    pub fn real(node: NodeId) -> NodeView {
        NodeView::alloc(ViewRepr::Real(node), None)
    }

    /// Virtual group over an ordered run of views.
    pub fn group(children: Vec<NodeView>) -> NodeView {
        NodeView::alloc(ViewRepr::Group, Some(children))
    }

    /// The empty view, standing in for an absent child slot.
    pub fn empty() -> NodeView {
        NodeView::alloc(ViewRepr::Empty, Some(Vec::new()))
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The underlying AST node, for real views.
    pub fn node(&self) -> Option<NodeId> {
        match self.inner.repr {
            ViewRepr::Real(node) => Some(node),
            _ => None,
        }
    }

    pub fn is_virtual(&self) -> bool {
        !matches!(self.inner.repr, ViewRepr::Real(_))
    }

    pub fn is_empty_view(&self) -> bool {
        matches!(self.inner.repr, ViewRepr::Empty)
    }

    /// The node kind, for real views.
    pub fn kind(&self, unit: &Unit) -> Option<NodeKind> {
        self.node().map(|node| unit.kind(node))
    }

    /// The normalized children, computed on first access and memoised.
    pub fn children(&self, unit: &Unit) -> Rc<Vec<NodeView>> {
        if let Some(children) = self.inner.children.borrow().as_ref() {
            return Rc::clone(children);
        }
        let computed = match &self.inner.repr {
            ViewRepr::Real(node) => Rc::new(normalized_children(unit, *node)),
            // Groups and empties are constructed with their lists.
            _ => unreachable!("virtual views carry their child list"),
        };
        *self.inner.children.borrow_mut() = Some(Rc::clone(&computed));
        computed
    }

    /// The file and byte span this view covers. Groups cover the union
    /// of their members; empty views cover nothing.
    pub fn span(&self, unit: &Unit) -> Option<(FileId, Span)> {
        match &self.inner.repr {
            ViewRepr::Real(node) => Some((unit.file_of(*node), unit.span(*node))),
            ViewRepr::Empty => None,
            ViewRepr::Group => {
                let children = self.inner.children.borrow();
                let children = children.as_ref()?;
                let mut spans = children.iter().filter_map(|child| child.span(unit));
                let (file, first) = spans.next()?;
                let last = spans.last().map(|(_, span)| span).unwrap_or(first);
                Some((file, Span::new(first.start, last.end.max(first.end))))
            }
        }
    }

    /// Enumerate the prefix-terminated slices of `parent`'s children
    /// beginning at `start`: one group per prefix, shortest first.
    pub fn prefixes(parent: &NodeView, unit: &Unit, start: usize) -> Vec<NodeView> {
        let children = parent.children(unit);
        (start..children.len())
            .map(|end| NodeView::group(children[start..=end].to_vec()))
            .collect()
    }
}

/// The normalization rules for real nodes.
///
/// - Statement nodes expose their sub-statements with absent optional
///   slots preserved as empty views, so indices stay aligned.
/// - A function declaration has exactly a parameter group child plus the
///   body when one exists.
/// - Variables, fields, and parameters expose only their initialiser.
/// - Declaration contexts expose their contained declarations.
/// - Other declarations have no children.
fn normalized_children(unit: &Unit, id: NodeId) -> Vec<NodeView> {
    let real = |node: &NodeId| NodeView::real(*node);
    let slot = |node: &Option<NodeId>| match node {
        Some(node) => NodeView::real(*node),
        None => NodeView::empty(),
    };

    match &unit.node(id).data {
        NodeData::Function { params, body, .. } => {
            let group = NodeView::group(params.iter().map(real).collect());
            let mut children = vec![group];
            children.extend(body.as_ref().map(|body| NodeView::real(*body)));
            children
        }
        NodeData::Var { init, .. } | NodeData::Field { init, .. } => {
            init.iter().map(real).collect()
        }
        NodeData::Param { default, .. } => default.iter().map(real).collect(),
        NodeData::TranslationUnit { decls }
        | NodeData::Namespace { decls, .. }
        | NodeData::DeclStmt { decls } => decls.iter().map(real).collect(),
        NodeData::Record { members, .. } => members.iter().map(real).collect(),
        NodeData::Enum { enumerators, .. } => enumerators.iter().map(real).collect(),
        NodeData::EnumConstant { .. }
        | NodeData::Typedef { .. }
        | NodeData::UsingDirective { .. } => Vec::new(),
        NodeData::Compound { stmts } => stmts.iter().map(real).collect(),
        NodeData::If {
            cond,
            then_branch,
            else_branch,
        } => vec![real(cond), real(then_branch), slot(else_branch)],
        NodeData::While { cond, body } => vec![real(cond), real(body)],
        NodeData::For {
            init,
            cond,
            step,
            body,
        } => vec![slot(init), slot(cond), slot(step), real(body)],
        NodeData::Return { value } => vec![slot(value)],
        NodeData::Null | NodeData::Break | NodeData::Continue => Vec::new(),
        NodeData::Binary { lhs, rhs, .. } => vec![real(lhs), real(rhs)],
        NodeData::Unary { operand, .. } => vec![real(operand)],
        NodeData::IntLit { .. }
        | NodeData::FloatLit { .. }
        | NodeData::CharLit { .. }
        | NodeData::BoolLit { .. }
        | NodeData::StrLit { .. }
        | NodeData::DeclRef { .. } => Vec::new(),
        NodeData::Member { base, .. } => vec![real(base)],
        NodeData::Call { callee, args } => {
            std::iter::once(real(callee)).chain(args.iter().map(real)).collect()
        }
        NodeData::Paren { inner } => vec![real(inner)],
    }
}
