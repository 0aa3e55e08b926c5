// The host configuration tree: labelled, ordered, rooted. Nodes are
// shared handles; the engine holds them across calls without owning the
// tree itself.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};


/// A cheaply clonable handle to a tree node. Equality is node identity,
/// not structural equality.
#[derive(Clone)]
pub struct Node(Rc<NodeData>);

struct NodeData {
	label: Option<String>,
	value: RefCell<Option<String>>,
	parent: RefCell<Weak<NodeData>>,
	children: RefCell<Vec<Node>>,
}

impl Node {
	/// Create a tree root. The root is its own parent.
	pub fn root() -> Node {
		Node(Rc::new_cyclic(|me| NodeData {
			label: None,
			value: RefCell::new(None),
			parent: RefCell::new(me.clone()),
			children: RefCell::new(Vec::new()),
		}))
	}

	/// Create a node beneath `parent`. The node is linked to its parent
	/// but not yet part of the parent's child list; call
	/// [`Node::push_child`] to append it.
	pub fn make_tree(label: Option<&str>, value: Option<&str>, parent: &Node) -> Node {
		Node(Rc::new(NodeData {
			label: label.map(str::to_owned),
			value: RefCell::new(value.map(str::to_owned)),
			parent: RefCell::new(Rc::downgrade(&parent.0)),
			children: RefCell::new(Vec::new()),
		}))
	}

	/// Append `child` at the end of this node's child list.
	pub fn push_child(&self, child: Node) {
		*child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
		self.0.children.borrow_mut().push(child);
	}

	/// Unlink this node from its parent's child list. Dropping the last
	/// handle afterwards frees the whole subtree. Detaching the root is
	/// a no-op.
	pub fn detach(&self) {
		let parent = self.parent();
		if parent == *self {
			return;
		}
		let mut children = parent.0.children.borrow_mut();
		if let Some(ix) = children.iter().position(|c| c == self) {
			children.remove(ix);
		}
	}

	pub fn label(&self) -> Option<&str> {
		self.0.label.as_deref()
	}

	pub fn value(&self) -> Option<String> {
		self.0.value.borrow().clone()
	}

	pub fn set_value(&self, value: Option<&str>) {
		*self.0.value.borrow_mut() = value.map(str::to_owned);
	}

	/// The parent node. The root is its own parent.
	pub fn parent(&self) -> Node {
		match self.0.parent.borrow().upgrade() {
			Some(rc) => Node(rc),
			// An unlinked ancestor was dropped; treat the node as a root.
			None => self.clone(),
		}
	}

	pub fn is_root(&self) -> bool {
		self.parent() == *self
	}

	/// Head of the ordered child list.
	pub fn first_child(&self) -> Option<Node> {
		self.0.children.borrow().first().cloned()
	}

	/// The next sibling within the parent's child list.
	pub fn next_sibling(&self) -> Option<Node> {
		let parent = self.parent();
		if parent == *self {
			return None;
		}
		let children = parent.0.children.borrow();
		let ix = children.iter().position(|c| c == self)?;
		children.get(ix + 1).cloned()
	}

	pub fn children(&self) -> Vec<Node> {
		self.0.children.borrow().clone()
	}
}

impl PartialEq for Node {
	fn eq(&self, other: &Node) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl Eq for Node {}

impl fmt::Debug for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let value = self.0.value.borrow();
		match value.as_deref() {
			Some(v) => write!(f, "Node({:?} = {:?})", self.label().unwrap_or(""), v),
			None => write!(f, "Node({:?})", self.label().unwrap_or("")),
		}
	}
}


/// Absent labels and values compare equal to the empty string.
pub(crate) fn streq_lax(s1: Option<&str>, s2: Option<&str>) -> bool {
	s1.unwrap_or("") == s2.unwrap_or("")
}
