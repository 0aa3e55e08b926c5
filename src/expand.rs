// Longest-prefix search and tree expansion: find how far a location path
// matches, then create the missing steps as fresh child nodes.

use tracing::debug;

use crate::ast::{Axis, LocPath};
use crate::eval;
use crate::path::State;
use crate::result::{ExpandError, Result};
use crate::tree::Node;


/// How far a location path matched into the tree.
#[derive(Debug)]
pub(crate) enum Search {
	/// More than one node matches the longest prefix.
	Ambiguous,
	/// Not even the context node survived the pipeline.
	NoMatch,
	/// Exactly one node matches the longest prefix. `next_step` is the
	/// index of the first unmatched step, or `None` when the whole path
	/// matched.
	Found {
		node: Node,
		next_step: Option<usize>,
	},
}

/// Run the node-set pipeline, keeping every stage, and classify the
/// longest non-empty one.
pub(crate) fn locpath_search(lp: &LocPath, state: &mut State, origin: &Node) -> Result<Search> {
	state.ctx = Some(origin.clone());
	state.ctx_pos = 1;
	state.ctx_len = 1;

	let ns = eval::ns_from_locpath(lp, state)?;
	let k = lp.steps.len();

	let last = match (0..=k).rev().find(|&i| !ns[i].is_empty()) {
		Some(last) => last,
		None => return Ok(Search::NoMatch),
	};
	if ns[last].len() > 1 {
		return Ok(Search::Ambiguous);
	}

	match ns[last].get(0) {
		Some(node) => Ok(Search::Found {
			node: node.clone(),
			next_step: (last < k).then_some(last),
		}),
		None => Ok(Search::NoMatch),
	}
}

/// Locate the path's node, creating the unmatched suffix beneath the
/// longest unambiguous prefix. Every created step must be `child::name`.
/// Returns the deepest created node, or the matched node when nothing
/// was missing. A failed expansion detaches everything it created.
pub(crate) fn expand_tree(
	lp: &LocPath,
	state: &mut State,
	origin: &Node,
) -> std::result::Result<Node, ExpandError> {
	let (mut parent, from) = match locpath_search(lp, state, origin)? {
		Search::Ambiguous => return Err(ExpandError::MultipleMatches),
		Search::Found {
			node,
			next_step: None,
		} => return Ok(node),
		Search::Found {
			node,
			next_step: Some(ix),
		} => (node, ix),
		Search::NoMatch => (origin.clone(), 0),
	};

	debug!(missing = lp.steps.len() - from, "expanding tree");

	let mut first_created: Option<Node> = None;
	for step in &lp.steps[from..] {
		let name = match (step.axis, step.name.as_deref()) {
			(Axis::Child, Some(name)) => name,
			_ => {
				if let Some(created) = &first_created {
					created.detach();
				}
				return Err(ExpandError::IllegalStep);
			}
		};

		let node = Node::make_tree(Some(name), None, &parent);
		parent.push_child(node.clone());
		if first_created.is_none() {
			first_created = Some(node.clone());
		}
		parent = node;
	}

	// The suffix is a freshly built chain, so the deepest leaf of the
	// first new node is the last one created.
	let mut leaf = match first_created {
		Some(node) => node,
		None => return Ok(parent),
	};
	while let Some(child) = leaf.first_child() {
		leaf = child;
	}
	Ok(leaf)
}
