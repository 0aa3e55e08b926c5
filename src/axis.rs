// Iteration over the nodes a step can reach from a context node. The
// pair `step_first`/`step_next` is a restartable iterator: predicates
// re-enter it freely while an outer iteration is in flight.

use crate::ast::{Axis, Step};
use crate::tree::{streq_lax, Node};


/// Whether `node` passes the step's name test. A step without a name
/// matches everything; an absent label equals the empty string.
pub fn step_matches(step: &Step, node: &Node) -> bool {
	match step.name.as_deref() {
		None => true,
		Some(name) => streq_lax(Some(name), node.label()),
	}
}

/// The first node reachable from `ctx` along the step's axis that passes
/// the name test.
pub fn step_first(step: &Step, ctx: &Node) -> Option<Node> {
	let node = match step.axis {
		Axis::SelfAxis | Axis::DescendantOrSelf => ctx.clone(),
		Axis::Child | Axis::Descendant => ctx.first_child()?,
		Axis::Parent | Axis::Ancestor => ctx.parent(),
		Axis::Root => {
			let mut node = ctx.clone();
			while !node.is_root() {
				node = node.parent();
			}
			node
		}
	};

	if step_matches(step, &node) {
		Some(node)
	} else {
		step_next(step, ctx, &node)
	}
}

/// The node after `cur` in the step's iteration order, or `None` when
/// the axis is exhausted.
pub fn step_next(step: &Step, ctx: &Node, cur: &Node) -> Option<Node> {
	let mut node = cur.clone();

	loop {
		node = match step.axis {
			Axis::SelfAxis | Axis::Parent | Axis::Root => return None,

			Axis::Child => node.next_sibling()?,

			// Pre-order within the subtree rooted at ctx: descend to the
			// first child, else climb until a sibling exists, stopping at
			// ctx itself.
			Axis::Descendant | Axis::DescendantOrSelf => {
				if let Some(child) = node.first_child() {
					child
				} else {
					while node.next_sibling().is_none() && node != *ctx {
						node = node.parent();
					}
					if node == *ctx {
						return None;
					}
					node.next_sibling()?
				}
			}

			Axis::Ancestor => {
				let parent = node.parent();
				if parent == node {
					return None;
				}
				parent
			}
		};

		if step_matches(step, &node) {
			return Some(node);
		}
	}
}
