//! Traversal cursors over view trees.
//!
//! The template cursor and every candidate cursor share this state
//! machine: a stack of `(parent, index)` frames plus a per-frame flag
//! recording whether the walk has already been down into the current
//! node's children. The matcher keeps all cursors in lockstep, so the
//! operations here never look at node contents, only at shape.

use crate::view::NodeView;
use remold_cst::Unit;

#[derive(Clone)]
struct Frame {
    parent: NodeView,
    idx: usize,
    /// Whether the children of `parent.children[idx]` have been entered.
    accessed: bool,
}

/// A cursor over one view tree. The initial position is the root's first
/// child; the walk is finished once the root frame has been popped.
#[derive(Clone)]
pub struct TraversalState {
    stack: Vec<Frame>,
}

impl TraversalState {
    pub fn new(root: NodeView) -> Self {
        TraversalState {
            stack: vec![Frame {
                parent: root,
                idx: 0,
                accessed: false,
            }],
        }
    }

    /// The root view this cursor was started on.
    pub fn root(&self) -> Option<&NodeView> {
        self.stack.first().map(|frame| &frame.parent)
    }

    /// True once the walk has popped past the root.
    pub fn done(&self) -> bool {
        self.stack.is_empty()
    }

    fn frame(&self) -> &Frame {
        self.stack.last().expect("cursor already finished")
    }

    fn frame_mut(&mut self) -> &mut Frame {
        self.stack.last_mut().expect("cursor already finished")
    }

    /// The current view, or `None` when the cursor sits past the end of
    /// its sibling list (possible only transiently after a fork).
    pub fn current(&self, unit: &Unit) -> Option<NodeView> {
        let frame = self.frame();
        frame.parent.children(unit).get(frame.idx).cloned()
    }

    pub fn index(&self) -> usize {
        self.frame().idx
    }

    /// Whether the cursor has consumed every sibling at this level.
    pub fn at_end(&self, unit: &Unit) -> bool {
        let frame = self.frame();
        frame.idx >= frame.parent.children(unit).len()
    }

    pub fn is_last_child(&self, unit: &Unit) -> bool {
        let frame = self.frame();
        frame.idx + 1 == frame.parent.children(unit).len()
    }

    pub fn has_children(&self, unit: &Unit) -> bool {
        self.current(unit)
            .map(|current| !current.children(unit).is_empty())
            .unwrap_or(false)
    }

    pub fn children_accessed(&self) -> bool {
        self.frame().accessed
    }

    /// The sibling list at the current level.
    pub fn siblings(&self, unit: &Unit) -> std::rc::Rc<Vec<NodeView>> {
        self.frame().parent.children(unit)
    }

    /// Move to the first child of the current node.
    pub fn descend(&mut self, unit: &Unit) {
        let current = self
            .current(unit)
            .expect("descend called past the sibling list");
        self.frame_mut().accessed = true;
        self.stack.push(Frame {
            parent: current,
            idx: 0,
            accessed: false,
        });
    }

    /// Move to the next sibling.
    pub fn next_sibling(&mut self) {
        let frame = self.frame_mut();
        frame.idx += 1;
        frame.accessed = false;
    }

    /// Pop back to the parent level.
    pub fn backtrack(&mut self) {
        self.stack.pop();
    }

    /// Reposition within the current sibling list; used by variadic
    /// forks, which consume a run of siblings in one step.
    pub(crate) fn set_index(&mut self, idx: usize) {
        let frame = self.frame_mut();
        frame.idx = idx;
        frame.accessed = false;
    }
}
