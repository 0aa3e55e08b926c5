// Built-in functions. Each implementation pops its arguments from the
// value stack and pushes exactly one result.

use std::fmt;

use crate::path::State;
use crate::result::Result;
use crate::value::{Type, Value};


/// Descriptor of a built-in function: the call signature plus the
/// implementation run by the evaluator.
pub struct Func {
	pub name: &'static str,
	pub arity: usize,
	pub ty: Type,
	pub arg_types: &'static [Type],
	pub imp: fn(&mut State) -> Result<()>,
}

impl PartialEq for Func {
	fn eq(&self, other: &Func) -> bool {
		std::ptr::eq(self, other)
	}
}

impl fmt::Debug for Func {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Func({})", self.name)
	}
}


pub(crate) static BUILTIN_FUNCS: [Func; 2] = [
	Func {
		name: "last",
		arity: 0,
		ty: Type::Number,
		arg_types: &[],
		imp: func_last,
	},
	Func {
		name: "position",
		arity: 0,
		ty: Type::Number,
		arg_types: &[],
		imp: func_position,
	},
];

/// number last() - the length of the context node-set.
fn func_last(state: &mut State) -> Result<()> {
	let vind = state.pool.add(Value::Number(state.ctx_len as i32));
	state.push_value(vind);
	Ok(())
}

/// number position() - the 1-based position of the context node.
fn func_position(state: &mut State) -> Result<()> {
	let vind = state.pool.add(Value::Number(state.ctx_pos as i32));
	state.push_value(vind);
	Ok(())
}
