// Static type checking. Walks the AST bottom-up, fills in each node's
// type slot and rejects ill-typed trees before anything is evaluated.

use crate::ast::{BinaryOp, Expr, ExprKind};
use crate::path::State;
use crate::result::{ErrorCode, Result};
use crate::value::Type;


pub(crate) fn check_expr(expr: &mut Expr, state: &mut State) -> Result<()> {
	match &mut expr.kind {
		ExprKind::LocPath(lp) => {
			// A predicate acts as a filter of type
			//   NODESET -> BOOLEAN, NUMBER -> BOOLEAN (position test),
			//   or BOOLEAN -> BOOLEAN.
			for step in &mut lp.steps {
				for pred in &mut step.predicates {
					check_expr(pred, state)?;
					if !matches!(
						pred.ty,
						Some(Type::Nodeset | Type::Number | Type::Boolean)
					) {
						return Err(state.err(ErrorCode::Type));
					}
				}
			}
			expr.ty = Some(Type::Nodeset);
		}

		// '=', '!=' : (NODESET|STRING) x (NODESET|STRING) -> BOOLEAN
		//             NUMBER x NUMBER -> BOOLEAN
		// '+', '-', '*' : NUMBER x NUMBER -> NUMBER
		ExprKind::Binary { op, left, right } => {
			check_expr(left, state)?;
			check_expr(right, state)?;

			let l = left.ty;
			let r = right.ty;
			let ty = match op {
				BinaryOp::Eq | BinaryOp::Neq => {
					let ok = (matches!(l, Some(Type::Nodeset | Type::String))
						&& matches!(r, Some(Type::Nodeset | Type::String)))
						|| (l == Some(Type::Number) && r == Some(Type::Number));
					if !ok {
						return Err(state.err(ErrorCode::Type));
					}
					Type::Boolean
				}
				BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Star => {
					if l != Some(Type::Number) || r != Some(Type::Number) {
						return Err(state.err(ErrorCode::Type));
					}
					Type::Number
				}
			};
			expr.ty = Some(ty);
		}

		ExprKind::Value(vind) => {
			expr.ty = Some(state.pool.get(*vind).ty());
		}

		ExprKind::App { func, args } => {
			for (i, arg) in args.iter_mut().enumerate() {
				check_expr(arg, state)?;
				if arg.ty != Some(func.arg_types[i]) {
					return Err(state.err(ErrorCode::Type));
				}
			}
			expr.ty = Some(func.ty);
		}
	}
	Ok(())
}
