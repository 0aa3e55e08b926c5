use crate::functions::Func;
use crate::value::{Type, ValueInd};


/// Direction of travel from a context node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
	/// 'self'
	/// Just the context node itself.
	SelfAxis,
	/// 'child'
	/// The children of the context node, in order.
	Child,
	/// 'descendant'
	/// Children, their children and so on, in pre-order; never the
	/// context node itself.
	Descendant,
	/// 'descendant-or-self'
	/// The context node, then its descendants in pre-order.
	DescendantOrSelf,
	/// 'parent'
	/// The parent of the context node. The tree root is its own parent.
	Parent,
	/// 'ancestor'
	/// The parent, the parent's parent and so on, ending at the root.
	Ancestor,
	/// 'root'
	/// The topmost node of the tree, wherever the context node is.
	Root,
}

/// Axis keywords as they appear before '::' in a step.
pub(crate) static AXIS_NAMES: [(&str, Axis); 7] = [
	("self", Axis::SelfAxis),
	("child", Axis::Child),
	("descendant", Axis::Descendant),
	("descendant-or-self", Axis::DescendantOrSelf),
	("parent", Axis::Parent),
	("ancestor", Axis::Ancestor),
	("root", Axis::Root),
];


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
	/// '='
	Eq,
	/// '!='
	Neq,
	/// '+'
	Plus,
	/// '-'
	Minus,
	/// '*'
	Star,
}


/// One element of a location path: an axis, an optional name test and
/// any number of predicate expressions.
#[derive(Debug, PartialEq)]
pub struct Step {
	pub axis: Axis,
	/// `None` matches any name.
	pub name: Option<String>,
	pub predicates: Vec<Expr>,
}

impl Step {
	pub(crate) fn new(axis: Axis) -> Step {
		Step {
			axis,
			name: None,
			predicates: Vec::new(),
		}
	}
}


/// A location path: steps evaluated left to right, each mapping a
/// node-set to the next.
#[derive(Debug, Default, PartialEq)]
pub struct LocPath {
	pub steps: Vec<Step>,
}


/// A parsed expression. The type slot starts empty and is filled in by
/// the type checker before evaluation.
#[derive(Debug, PartialEq)]
pub struct Expr {
	pub kind: ExprKind,
	pub ty: Option<Type>,
}

#[derive(Debug, PartialEq)]
pub enum ExprKind {
	LocPath(LocPath),
	Binary {
		op: BinaryOp,
		left: Box<Expr>,
		right: Box<Expr>,
	},
	/// A number or string literal, stored in the value pool.
	Value(ValueInd),
	/// A built-in function applied to its arguments.
	App {
		func: &'static Func,
		args: Vec<Expr>,
	},
}

impl Expr {
	pub(crate) fn new(kind: ExprKind) -> Expr {
		Expr { kind, ty: None }
	}

	pub(crate) fn locpath(locpath: LocPath) -> Expr {
		Expr::new(ExprKind::LocPath(locpath))
	}
}
