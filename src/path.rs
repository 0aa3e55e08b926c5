// The path session: owns the evaluator state and the parsed expression,
// and exposes the public operations.

use tracing::{debug, trace};

use crate::ast::{Expr, ExprKind};
use crate::result::{Error, ErrorCode, ExpandError, Result};
use crate::tree::Node;
use crate::value::{Nodeset, Type, Value, ValueInd, ValuePool};
use crate::{eval, expand, typecheck};


/// Internal state shared by the parser, type checker and evaluator.
#[derive(Debug)]
pub struct State {
	/// The entire expression source.
	pub(crate) txt: String,
	/// Current byte position within `txt` during parsing.
	pub(crate) pos: usize,

	/// The current context node during evaluation.
	pub(crate) ctx: Option<Node>,
	pub(crate) ctx_pos: u32,
	pub(crate) ctx_len: u32,

	pub(crate) pool: ValuePool,
	/// Stack of values as pool indices, bottom of stack first.
	pub(crate) values: Vec<ValueInd>,
	/// Stack of expressions built up during parsing.
	pub(crate) exprs: Vec<Expr>,

	/// First error raised; later errors never replace it.
	pub(crate) error: Option<Error>,
}

impl State {
	pub(crate) fn new(txt: &str) -> State {
		State {
			txt: txt.to_owned(),
			pos: 0,
			ctx: None,
			ctx_pos: 1,
			ctx_len: 1,
			pool: ValuePool::new(),
			values: Vec::new(),
			exprs: Vec::new(),
			error: None,
		}
	}

	/// Build an [`Error`] for the current parse position.
	#[track_caller]
	pub(crate) fn err(&self, code: ErrorCode) -> Error {
		Error::new(code, self.pos)
	}

	pub(crate) fn latch(&mut self, err: Error) {
		if self.error.is_none() {
			self.error = Some(err);
		}
	}

	pub(crate) fn push_value(&mut self, vind: ValueInd) {
		self.values.push(vind);
	}

	pub(crate) fn pop_value(&mut self) -> Result<ValueInd> {
		self.values.pop().ok_or_else(|| self.err(ErrorCode::Internal))
	}

	pub(crate) fn push_boolean(&mut self, b: bool) {
		self.values.push(ValuePool::boolean(b));
	}

	pub(crate) fn push_expr(&mut self, expr: Expr) {
		self.exprs.push(expr);
	}

	pub(crate) fn pop_expr(&mut self) -> Result<Expr> {
		self.exprs.pop().ok_or_else(|| self.err(ErrorCode::Internal))
	}
}


/// Outcome of [`Path::find_one`].
#[derive(Debug, Clone, PartialEq)]
pub enum FindResult {
	NoMatch,
	One(Node),
	Multiple,
}


/// A parsed and type-checked path expression, bound to the tree node it
/// was parsed against. Evaluation happens lazily on the first call to
/// [`Path::first`] and the resulting node-set is kept for enumeration.
#[derive(Debug)]
pub struct Path {
	state: State,
	expr: Expr,
	origin: Node,
	/// Pool index of the result node-set once evaluated.
	nodeset: Option<ValueInd>,
	node: usize,
}

impl Path {
	/// Parse and type-check `txt` against the tree containing `origin`.
	/// Relative paths start at `origin`; absolute paths climb to the
	/// root first. The accepted top level is always a location path.
	pub fn parse(origin: &Node, txt: &str) -> Result<Path> {
		debug!(txt, "parsing path expression");

		let mut state = State::new(txt);
		let expr = Self::parse_and_check(&mut state)?;

		Ok(Path {
			state,
			expr,
			origin: origin.clone(),
			nodeset: None,
			node: 0,
		})
	}

	fn parse_and_check(state: &mut State) -> Result<Expr> {
		state.parse_expr()?;

		state.skipws();
		if state.pos < state.txt.len() {
			return Err(state.err(ErrorCode::Paren));
		}
		if state.exprs.len() != 1 {
			return Err(state.err(ErrorCode::Internal));
		}

		let mut expr = state.pop_expr()?;
		typecheck::check_expr(&mut expr, state)?;

		if expr.ty != Some(Type::Nodeset) || !matches!(expr.kind, ExprKind::LocPath(_)) {
			return Err(state.err(ErrorCode::Type));
		}

		Ok(expr)
	}

	/// The first matching node. Evaluates the expression on the first
	/// call; calling again restarts the enumeration at the same node.
	pub fn first(&mut self) -> Option<Node> {
		if self.state.error.is_some() {
			return None;
		}

		if self.nodeset.is_none() {
			if let Err(err) = self.evaluate() {
				self.state.latch(err);
				return None;
			}
		}

		self.node = 0;
		self.result_nodeset().and_then(|ns| ns.get(0).cloned())
	}

	/// The next matching node, or `None` when the set is exhausted.
	/// Safe to call on an empty or never-evaluated set.
	pub fn next(&mut self) -> Option<Node> {
		if self.state.error.is_some() {
			return None;
		}

		let len = self.result_nodeset().map_or(0, Nodeset::len);
		if self.node + 1 < len {
			self.node += 1;
			self.result_nodeset().and_then(|ns| ns.get(self.node).cloned())
		} else {
			None
		}
	}

	/// Match exactly one node: reports whether the expression matched
	/// none, one or several nodes.
	pub fn find_one(&mut self) -> FindResult {
		match self.first() {
			None => FindResult::NoMatch,
			Some(node) => {
				if self.next().is_some() {
					FindResult::Multiple
				} else {
					FindResult::One(node)
				}
			}
		}
	}

	/// Locate the node for this path, creating tree nodes along the
	/// unmatched suffix if necessary. Every missing step must be a plain
	/// `child::name`; on failure the tree is left exactly as it was.
	pub fn expand_tree(&mut self) -> std::result::Result<Node, ExpandError> {
		if let Some(err) = self.state.error {
			return Err(ExpandError::Eval(err));
		}

		let ExprKind::LocPath(lp) = &self.expr.kind else {
			let err = self.state.err(ErrorCode::Internal);
			self.state.latch(err);
			return Err(ExpandError::Eval(err));
		};

		match expand::expand_tree(lp, &mut self.state, &self.origin) {
			Err(ExpandError::Eval(err)) => {
				self.state.latch(err);
				Err(ExpandError::Eval(err))
			}
			other => other,
		}
	}

	/// The latched error, if any operation on this session failed.
	pub fn error(&self) -> Option<Error> {
		self.state.error
	}

	/// The source text this session was parsed from.
	pub fn text(&self) -> &str {
		&self.state.txt
	}

	pub fn origin(&self) -> &Node {
		&self.origin
	}

	fn evaluate(&mut self) -> Result<()> {
		trace!(txt = %self.state.txt, "evaluating");

		self.state.ctx = Some(self.origin.clone());
		self.state.ctx_pos = 1;
		self.state.ctx_len = 1;

		eval::eval_expr(&self.expr, &mut self.state)?;

		if self.state.values.len() != 1 {
			return Err(self.state.err(ErrorCode::Internal));
		}
		let vind = self.state.pop_value()?;
		if !matches!(self.state.pool.get(vind), Value::Nodeset(_)) {
			return Err(self.state.err(ErrorCode::Internal));
		}

		self.nodeset = Some(vind);
		Ok(())
	}

	fn result_nodeset(&self) -> Option<&Nodeset> {
		match self.state.pool.get(self.nodeset?) {
			Value::Nodeset(ns) => Some(ns),
			_ => None,
		}
	}
}
