// The evaluator. Every subexpression pushes exactly one value-pool index
// onto the value stack; the caller of the root expression pops the single
// result back off.

use tracing::trace;

use crate::ast::{BinaryOp, Expr, ExprKind, LocPath};
use crate::axis;
use crate::functions::Func;
use crate::path::State;
use crate::result::{ErrorCode, Result};
use crate::tree::streq_lax;
use crate::value::{Nodeset, Value};


pub(crate) fn eval_expr(expr: &Expr, state: &mut State) -> Result<()> {
	match &expr.kind {
		ExprKind::LocPath(lp) => eval_locpath(lp, state),
		ExprKind::Binary { op, left, right } => eval_binary(*op, left, right, state),
		ExprKind::Value(vind) => {
			state.push_value(*vind);
			Ok(())
		}
		ExprKind::App { func, args } => eval_app(func, args, state),
	}
}


/// Thread a node-set through the steps of `lp`, starting from the current
/// context node. Returns one node-set per pipeline stage: entry 0 holds
/// the context node, the last entry the nodes matching the whole path.
/// The evaluation context is restored on every exit.
pub(crate) fn ns_from_locpath(lp: &LocPath, state: &mut State) -> Result<Vec<Nodeset>> {
	let saved = (state.ctx.clone(), state.ctx_pos, state.ctx_len);
	let result = ns_steps(lp, state);
	state.ctx = saved.0;
	state.ctx_pos = saved.1;
	state.ctx_len = saved.2;
	result
}

fn ns_steps(lp: &LocPath, state: &mut State) -> Result<Vec<Nodeset>> {
	let ctx = match state.ctx.clone() {
		Some(ctx) => ctx,
		None => return Err(state.err(ErrorCode::Internal)),
	};

	let mut ns: Vec<Nodeset> = (0..=lp.steps.len()).map(|_| Nodeset::new()).collect();
	ns[0].push(ctx);

	for (i, step) in lp.steps.iter().enumerate() {
		let (done, rest) = ns.split_at_mut(i + 1);
		let work = &done[i];
		let next = &mut rest[0];

		for node in work.iter() {
			// Nothing is deduplicated here: a node reachable more than
			// one way ends up in the set more than once.
			let mut cur = axis::step_first(step, node);
			while let Some(found) = cur {
				next.push(found.clone());
				cur = axis::step_next(step, node, &found);
			}
		}

		for pred in &step.predicates {
			filter_pred(pred, next, state)?;
		}
	}

	Ok(ns)
}

/// Keep the nodes of `set` for which `pred` is truthy, preserving order.
/// Each node is evaluated with its original 1-based position and the
/// original set length as context.
fn filter_pred(pred: &Expr, set: &mut Nodeset, state: &mut State) -> Result<()> {
	let len = set.len();
	state.ctx_len = len as u32;

	let mut keep = Vec::with_capacity(len);
	for (ix, node) in set.iter().enumerate() {
		state.ctx_pos = ix as u32 + 1;
		state.ctx = Some(node.clone());
		keep.push(eval_pred(pred, state)?);
	}

	let mut ix = 0;
	set.nodes.retain(|_| {
		let k = keep[ix];
		ix += 1;
		k
	});
	Ok(())
}

fn eval_pred(expr: &Expr, state: &mut State) -> Result<bool> {
	eval_expr(expr, state)?;
	let vind = state.pop_value()?;

	Ok(match state.pool.get(vind) {
		Value::Boolean(b) => *b,
		// A bare number selects the node at that context position.
		Value::Number(n) => i64::from(state.ctx_pos) == i64::from(*n),
		Value::Nodeset(ns) => !ns.is_empty(),
		Value::String(_) => return Err(state.err(ErrorCode::Internal)),
	})
}

fn eval_locpath(lp: &LocPath, state: &mut State) -> Result<()> {
	let mut ns = ns_from_locpath(lp, state)?;
	let result = ns.pop().unwrap_or_default();
	trace!(matches = result.len(), "location path evaluated");

	let vind = state.pool.add(Value::Nodeset(result));
	state.push_value(vind);
	Ok(())
}


fn eval_binary(op: BinaryOp, left: &Expr, right: &Expr, state: &mut State) -> Result<()> {
	eval_expr(left, state)?;
	eval_expr(right, state)?;

	match op {
		BinaryOp::Eq => eval_eq(state, false),
		BinaryOp::Neq => eval_eq(state, true),
		BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Star => eval_arith(state, op),
	}
}

fn eq_nodeset_nodeset(ns1: &Nodeset, ns2: &Nodeset, neq: bool) -> bool {
	ns1.iter().any(|t1| {
		ns2.iter()
			.any(|t2| streq_lax(t1.value().as_deref(), t2.value().as_deref()) != neq)
	})
}

fn eq_nodeset_string(ns: &Nodeset, s: &str, neq: bool) -> bool {
	ns.iter()
		.any(|t| streq_lax(t.value().as_deref(), Some(s)) != neq)
}

fn eval_eq(state: &mut State, neq: bool) -> Result<()> {
	let rind = state.pop_value()?;
	let lind = state.pop_value()?;

	let res = match (state.pool.get(lind), state.pool.get(rind)) {
		(Value::Nodeset(ns1), Value::Nodeset(ns2)) => eq_nodeset_nodeset(ns1, ns2, neq),
		(Value::Nodeset(ns), Value::String(s)) | (Value::String(s), Value::Nodeset(ns)) => {
			eq_nodeset_string(ns, s, neq)
		}
		(Value::Number(n1), Value::Number(n2)) => (n1 == n2) != neq,
		(Value::String(s1), Value::String(s2)) => (s1 == s2) != neq,
		// The type checker rules out everything else.
		_ => return Err(state.err(ErrorCode::Internal)),
	};

	state.push_boolean(res);
	Ok(())
}

fn eval_arith(state: &mut State, op: BinaryOp) -> Result<()> {
	let rind = state.pop_value()?;
	let lind = state.pop_value()?;

	let res = match (state.pool.get(lind), state.pool.get(rind)) {
		(Value::Number(l), Value::Number(r)) => match op {
			BinaryOp::Plus => l.wrapping_add(*r),
			BinaryOp::Minus => l.wrapping_sub(*r),
			BinaryOp::Star => l.wrapping_mul(*r),
			_ => return Err(state.err(ErrorCode::Internal)),
		},
		_ => return Err(state.err(ErrorCode::Internal)),
	};

	let vind = state.pool.add(Value::Number(res));
	state.push_value(vind);
	Ok(())
}


fn eval_app(func: &Func, args: &[Expr], state: &mut State) -> Result<()> {
	for arg in args {
		eval_expr(arg, state)?;
	}
	(func.imp)(state)
}


#[cfg(test)]
mod tests {
	use super::*;
	use crate::path::Path;
	use crate::testing::{child, sample_tree};
	use crate::tree::Node;

	fn matches(root: &Node, txt: &str) -> Vec<Node> {
		let mut path = Path::parse(root, txt).unwrap();
		let mut found = Vec::new();
		let mut cur = path.first();
		while let Some(node) = cur {
			found.push(node);
			cur = path.next();
		}
		found
	}

	fn match_values(root: &Node, txt: &str) -> Vec<Option<String>> {
		matches(root, txt).iter().map(Node::value).collect()
	}

	#[test]
	fn child_steps_in_document_order() {
		let root = sample_tree();
		assert_eq!(
			match_values(&root, "/a"),
			vec![Some("1".into()), Some("2".into())]
		);
	}

	#[test]
	fn nodeset_predicate_requires_a_child() {
		let root = sample_tree();
		// Only the first a has a b child.
		assert_eq!(match_values(&root, "/a[b]"), vec![Some("1".into())]);
	}

	#[test]
	fn number_predicate_selects_by_position() {
		let root = sample_tree();
		assert_eq!(match_values(&root, "/a[2]"), vec![Some("2".into())]);
		assert_eq!(match_values(&root, "/a[1]"), vec![Some("1".into())]);
		assert_eq!(match_values(&root, "/a[3]"), vec![]);
	}

	#[test]
	fn value_comparison_in_predicate() {
		let root = sample_tree();
		assert_eq!(
			match_values(&root, "/a/b[. = \"y\"]"),
			vec![Some("y".into())]
		);
		assert_eq!(
			match_values(&root, "/a/b[. != \"y\"]"),
			vec![Some("x".into())]
		);
	}

	#[test]
	fn double_slash_searches_the_whole_tree() {
		let root = sample_tree();
		let found = matches(&root, "//c");
		assert_eq!(found.len(), 1);
		assert_eq!(found[0].value(), Some("x".into()));
		assert_eq!(found[0].parent().value(), Some("2".into()));
	}

	#[test]
	fn last_in_a_predicate() {
		let root = sample_tree();
		// Both a nodes sit in a sibling set of length 2.
		assert_eq!(matches(&root, "/a[last() + 1 = 3]").len(), 2);
		assert_eq!(match_values(&root, "/a/b[last()]"), vec![Some("y".into())]);
	}

	#[test]
	fn position_in_a_predicate() {
		let root = sample_tree();
		assert_eq!(
			match_values(&root, "/a/b[position() = last()]"),
			vec![Some("y".into())]
		);
		// position() equals the context position for every node.
		assert_eq!(matches(&root, "/a[position()]").len(), 2);
	}

	#[test]
	fn arithmetic_in_predicates() {
		let root = sample_tree();
		assert_eq!(match_values(&root, "/a[1 + 1]"), vec![Some("2".into())]);
		assert_eq!(match_values(&root, "/a[2 - 1]"), vec![Some("1".into())]);
		assert_eq!(match_values(&root, "/a[1 * 2]"), vec![Some("2".into())]);
	}

	#[test]
	fn nodeset_against_nodeset_comparison() {
		let root = sample_tree();
		// a(1) has b children whose values include "x"; c's value is "x"
		// too, so the sets compare equal for a(1) only.
		assert_eq!(
			match_values(&root, "/a[b = ../a/c]"),
			vec![Some("1".into())]
		);
	}

	#[test]
	fn string_comparison_is_constant_per_node() {
		let root = sample_tree();
		assert_eq!(matches(&root, "/a[\"x\" != \"y\"]").len(), 2);
		assert_eq!(matches(&root, "/a[\"x\" = \"y\"]").len(), 0);
	}

	#[test]
	fn duplicates_are_kept() {
		let root = sample_tree();
		// Both a nodes lead back up to the root, which contributes its
		// two a children once per way of reaching it.
		let found = matches(&root, "/a/../a");
		assert_eq!(found.len(), 4);
		assert_eq!(found[0], found[2]);
		assert_eq!(found[1], found[3]);
	}

	#[test]
	fn filter_keeps_truthy_runs_in_order() {
		let root = Node::root();
		let hay = ["n", "n", "y", "n", "y", "y", "n"];
		for v in hay {
			child(&root, "item", Some(v));
		}

		// Runs of consecutive non-matching nodes are all dropped and the
		// survivors keep their relative order.
		let found = matches(&root, "/item[. = \"y\"]");
		assert_eq!(found.len(), 3);
		assert_eq!(found[0], root.children()[2]);
		assert_eq!(found[1], root.children()[4]);
		assert_eq!(found[2], root.children()[5]);

		let second = matches(&root, "/item[. = \"y\"][2]");
		assert_eq!(second, vec![root.children()[4].clone()]);
	}

	#[test]
	fn chained_position_predicates_renumber() {
		let root = Node::root();
		for v in ["p", "q", "r", "s"] {
			child(&root, "item", Some(v));
		}

		// [position() != 1] drops p; the second predicate then counts
		// within the remaining three.
		assert_eq!(
			match_values(&root, "/item[position() != 1][2]"),
			vec![Some("r".into())]
		);
	}

	#[test]
	fn empty_result_is_not_an_error() {
		let root = sample_tree();
		let mut path = Path::parse(&root, "/does-not-exist").unwrap();
		assert_eq!(path.first(), None);
		assert!(path.error().is_none());
	}

	#[test]
	fn predicate_context_is_restored() {
		let root = sample_tree();
		// The outer step keeps iterating correctly after the inner
		// predicate rewired the evaluation context.
		assert_eq!(
			match_values(&root, "/a[b[. = \"x\"]]"),
			vec![Some("1".into())]
		);
	}

	#[test]
	fn wrapping_arithmetic() {
		let root = sample_tree();
		// i32 overflow wraps silently instead of failing.
		let found = matches(&root, "/a[2147483647 + 1 != 0]");
		assert_eq!(found.len(), 2);
	}
}
