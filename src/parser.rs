// Recursive-descent parser for path expressions. Each grammar production
// is one method on the parse state; productions push their result onto
// the expression stack, and binary rules pop their operands back off.

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tracing::trace;

use crate::ast::{Axis, BinaryOp, Expr, ExprKind, LocPath, Step, AXIS_NAMES};
use crate::functions::BUILTIN_FUNCS;
use crate::path::State;
use crate::result::{ErrorCode, Result};
use crate::value::Value;


/// A word followed by '(' can only be a function call; anything else
/// word-like is a node name.
static FUNC_LOOKAHEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z]+\s*\(").unwrap());


impl State {
	// Cursor helpers. The cursor is a byte offset; names and literals are
	// handled UTF-8-transparently.

	fn cur(&self) -> Option<u8> {
		self.txt.as_bytes().get(self.pos).copied()
	}

	fn cur_at(&self, off: usize) -> Option<u8> {
		self.txt.as_bytes().get(self.pos + off).copied()
	}

	fn at_end(&self) -> bool {
		self.pos >= self.txt.len()
	}

	pub(crate) fn skipws(&mut self) {
		while matches!(self.cur(), Some(c) if c.is_ascii_whitespace()) {
			self.pos += 1;
		}
	}

	/// Skip whitespace, then consume `m` if it is the next byte.
	fn eat(&mut self, m: u8) -> bool {
		self.skipws();
		if self.cur() == Some(m) {
			self.pos += 1;
			true
		} else {
			false
		}
	}

	/// Whether the current byte is one of `chars`. Does not skip
	/// whitespace and does not consume.
	fn peek_any(&self, chars: &str) -> bool {
		matches!(self.cur(), Some(c) if chars.as_bytes().contains(&c))
	}

	/// True iff the cursor starts with `token`, then optional whitespace,
	/// then `follow`; on success the cursor moves past `follow`.
	fn looking_at(&mut self, token: &str, follow: &str) -> bool {
		let bytes = self.txt.as_bytes();
		if !bytes[self.pos..].starts_with(token.as_bytes()) {
			return false;
		}

		let mut p = self.pos + token.len();
		while matches!(bytes.get(p), Some(c) if c.is_ascii_whitespace()) {
			p += 1;
		}
		if bytes[p..].starts_with(follow.as_bytes()) {
			self.pos = p + follow.len();
			true
		} else {
			false
		}
	}


	// The parser proper.

	fn push_new_binary_op(&mut self, op: BinaryOp) -> Result<()> {
		let right = Box::new(self.pop_expr()?);
		let left = Box::new(self.pop_expr()?);
		self.push_expr(Expr::new(ExprKind::Binary { op, left, right }));
		Ok(())
	}

	// Expr ::= EqualityExpr
	pub(crate) fn parse_expr(&mut self) -> Result<()> {
		self.skipws();
		self.parse_equality_expr()
	}

	// EqualityExpr ::= AdditiveExpr (('=' | '!=') AdditiveExpr)?
	fn parse_equality_expr(&mut self) -> Result<()> {
		self.parse_additive_expr()?;

		let op = if self.cur() == Some(b'=') {
			self.pos += 1;
			BinaryOp::Eq
		} else if self.cur() == Some(b'!') && self.cur_at(1) == Some(b'=') {
			self.pos += 2;
			BinaryOp::Neq
		} else {
			return Ok(());
		};

		self.skipws();
		self.parse_additive_expr()?;
		self.push_new_binary_op(op)
	}

	// AdditiveExpr ::= MultiplicativeExpr (('+' | '-') MultiplicativeExpr)*
	fn parse_additive_expr(&mut self) -> Result<()> {
		self.parse_multiplicative_expr()?;

		loop {
			let op = match self.cur() {
				Some(b'+') => BinaryOp::Plus,
				Some(b'-') => BinaryOp::Minus,
				_ => return Ok(()),
			};
			self.pos += 1;
			self.skipws();
			self.parse_multiplicative_expr()?;
			self.push_new_binary_op(op)?;
		}
	}

	// MultiplicativeExpr ::= PathExpr ('*' PathExpr)*
	fn parse_multiplicative_expr(&mut self) -> Result<()> {
		self.parse_path_expr()?;

		while self.eat(b'*') {
			self.parse_path_expr()?;
			self.push_new_binary_op(BinaryOp::Star)?;
		}
		Ok(())
	}

	// PathExpr ::= PrimaryExpr | LocationPath
	//
	// The grammar is ambiguous here: '42' can be the number 42 or the
	// relative path 'child::42', since node names may be all digits. '42'
	// always parses as a number; selecting such a node takes the form
	// 'child::42' or './42'.
	fn parse_path_expr(&mut self) -> Result<()> {
		if self.looking_at_primary_expr() {
			self.parse_primary_expr()
		} else {
			self.parse_location_path()
		}
	}

	fn looking_at_primary_expr(&self) -> bool {
		if self.peek_any("'\"0123456789") {
			return true;
		}
		FUNC_LOOKAHEAD.is_match(&self.txt.as_bytes()[self.pos..])
	}

	// PrimaryExpr ::= Literal | Number | FunctionCall
	fn parse_primary_expr(&mut self) -> Result<()> {
		if self.peek_any("'\"") {
			self.parse_literal()
		} else if self.peek_any("0123456789") {
			self.parse_number()
		} else {
			self.parse_function_call()
		}
	}

	// Literal ::= '"' [^"]* '"' | "'" [^']* "'"
	fn parse_literal(&mut self) -> Result<()> {
		let delim = match self.cur() {
			Some(c @ (b'"' | b'\'')) => c,
			_ => return Err(self.err(ErrorCode::String)),
		};
		self.pos += 1;

		let start = self.pos;
		while matches!(self.cur(), Some(c) if c != delim) {
			self.pos += 1;
		}
		if self.cur() != Some(delim) {
			return Err(self.err(ErrorCode::Delim));
		}

		let literal = self.txt[start..self.pos].to_owned();
		self.pos += 1;

		let vind = self.pool.add(Value::String(literal));
		self.push_expr(Expr::new(ExprKind::Value(vind)));
		Ok(())
	}

	// Number ::= /[0-9]+/
	fn parse_number(&mut self) -> Result<()> {
		let start = self.pos;
		while matches!(self.cur(), Some(c) if c.is_ascii_digit()) {
			self.pos += 1;
		}
		if self.pos == start {
			return Err(self.err(ErrorCode::Number));
		}

		// Rejects anything above i32::MAX.
		let number: i32 = self.txt[start..self.pos]
			.parse()
			.map_err(|_| self.err(ErrorCode::Number))?;

		let vind = self.pool.add(Value::Number(number));
		self.push_expr(Expr::new(ExprKind::Value(vind)));
		Ok(())
	}

	// FunctionCall ::= Name '(' ( Expr ( ',' Expr )* )? ')'
	fn parse_function_call(&mut self) -> Result<()> {
		let mut func = None;
		for f in BUILTIN_FUNCS.iter() {
			if self.looking_at(f.name, "(") {
				func = Some(f);
				break;
			}
		}
		let Some(func) = func else {
			return Err(self.err(ErrorCode::Name));
		};

		let mut nargs = 0;
		if !self.eat(b')') {
			loop {
				nargs += 1;
				self.parse_expr()?;
				if !self.eat(b',') {
					break;
				}
			}
			if !self.eat(b')') {
				return Err(self.err(ErrorCode::Delim));
			}
		}

		if nargs != func.arity {
			return Err(self.err(ErrorCode::Delim));
		}

		let mut args = Vec::with_capacity(nargs);
		for _ in 0..nargs {
			args.push(self.pop_expr()?);
		}
		args.reverse();

		self.push_expr(Expr::new(ExprKind::App { func, args }));
		Ok(())
	}

	// Name ::= bytes excluding '[', ']', '/', '=' and whitespace;
	//          '\x' escapes any byte x
	fn parse_name(&mut self) -> Result<String> {
		let start = self.pos;
		let mut name = Vec::new();

		while let Some(c) = self.cur() {
			if matches!(c, b'[' | b']' | b'/' | b'=') || c.is_ascii_whitespace() {
				break;
			}
			if c == b'\\' {
				self.pos += 1;
				match self.cur() {
					Some(escaped) => {
						name.push(escaped);
						self.pos += 1;
					}
					None => return Err(self.err(ErrorCode::Name)),
				}
			} else {
				name.push(c);
				self.pos += 1;
			}
		}

		if self.pos == start {
			return Err(self.err(ErrorCode::Name));
		}

		// Escapes remove single ASCII bytes from valid UTF-8 input, so
		// the remaining bytes are still valid UTF-8.
		String::from_utf8(name).map_err(|_| self.err(ErrorCode::Name))
	}

	// Predicate ::= '[' Expr ']'
	fn parse_predicates(&mut self) -> Result<Vec<Expr>> {
		let mut nexpr = 0;

		while self.eat(b'[') {
			self.skipws();
			if self.at_end() {
				// The bracket can no longer be closed.
				return Err(self.err(ErrorCode::Pred));
			}
			self.parse_expr()?;
			nexpr += 1;

			if !self.eat(b']') {
				return Err(self.err(ErrorCode::Pred));
			}
			self.skipws();
		}

		let mut preds = Vec::with_capacity(nexpr);
		for _ in 0..nexpr {
			preds.push(self.pop_expr()?);
		}
		preds.reverse();
		Ok(preds)
	}

	// Step ::= '..' | '.' | (AxisName '::')? ('*' | Name) Predicate*
	// AxisName ::= self | child | descendant | descendant-or-self
	//            | parent | ancestor | root
	fn parse_step(&mut self) -> Result<Step> {
		if self.cur() == Some(b'.') && self.cur_at(1) == Some(b'.') {
			self.pos += 2;
			return Ok(Step::new(Axis::Parent));
		}
		if self.eat(b'.') {
			return Ok(Step::new(Axis::SelfAxis));
		}

		let mut step = Step::new(Axis::Child);
		for &(name, axis) in AXIS_NAMES.iter() {
			if self.looking_at(name, "::") {
				step.axis = axis;
				break;
			}
		}

		if !self.eat(b'*') {
			step.name = Some(self.parse_name()?);
		}
		step.predicates = self.parse_predicates()?;

		trace!(axis = ?step.axis, name = ?step.name, "parsed step");
		Ok(step)
	}

	// RelativeLocationPath ::= Step (('/' | '//') Step)*
	fn parse_relative_location_path(&mut self) -> Result<LocPath> {
		let mut locpath = LocPath::default();
		locpath.steps.push(self.parse_step()?);

		while self.eat(b'/') {
			if self.cur() == Some(b'/') {
				self.pos += 1;
				locpath.steps.push(Step::new(Axis::DescendantOrSelf));
			}
			locpath.steps.push(self.parse_step()?);
		}
		Ok(locpath)
	}

	// LocationPath ::= '/' RelativeLocationPath?
	//                | '//' RelativeLocationPath
	//                | RelativeLocationPath
	//
	// Absolute paths get a synthesised leading root step; '//' adds a
	// descendant-or-self step behind it.
	fn parse_location_path(&mut self) -> Result<()> {
		let locpath = if self.eat(b'/') {
			if self.cur() == Some(b'/') {
				self.pos += 1;
				let mut lp = self.parse_relative_location_path()?;
				lp.steps.insert(0, Step::new(Axis::DescendantOrSelf));
				lp.steps.insert(0, Step::new(Axis::Root));
				lp
			} else if !self.at_end() {
				let mut lp = self.parse_relative_location_path()?;
				lp.steps.insert(0, Step::new(Axis::Root));
				lp
			} else {
				LocPath {
					steps: vec![Step::new(Axis::Root)],
				}
			}
		} else {
			self.parse_relative_location_path()?
		};

		self.push_expr(Expr::locpath(locpath));
		Ok(())
	}
}
