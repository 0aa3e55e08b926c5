use std::fmt;
use std::panic::Location;


pub type Result<I> = std::result::Result<I, Error>;


/// Error codes reported by the engine. The discriminants are stable and
/// part of the public contract; new codes may only be appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[repr(u8)]
pub enum ErrorCode {
	#[error("no error")]
	NoError = 0,
	/// A step name was empty, or a word was not a known function name.
	#[error("empty name")]
	Name,
	#[error("illegal string literal")]
	String,
	/// Non-digit where a number was expected, or the number overflows i32.
	#[error("illegal number")]
	Number,
	/// Unterminated string literal, missing ')', or wrong argument count.
	#[error("string missing ending ' or \"")]
	Delim,
	/// A '[' predicate that is never closed.
	#[error("unmatched '['")]
	Pred,
	#[error("allocation failed")]
	NoMem,
	/// Trailing input after a complete expression, e.g. a stray ']'.
	#[error("unmatched ']'")]
	Paren,
	#[error("expected a '/'")]
	Slash,
	#[error("internal error")]
	Internal,
	#[error("type error")]
	Type,
}

impl ErrorCode {
	pub fn message(self) -> String {
		self.to_string()
	}
}


/// A latched engine error: the code plus the byte offset where the parser
/// stopped. The capture site inside the engine is kept for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct Error {
	pub code: ErrorCode,
	pub pos: usize,
	site: &'static Location<'static>,
}

impl Error {
	#[track_caller]
	pub(crate) fn new(code: ErrorCode, pos: usize) -> Self {
		Self {
			code,
			pos,
			site: Location::caller(),
		}
	}

	/// Where inside the engine the error was raised (file and line).
	pub fn site(&self) -> &'static Location<'static> {
		self.site
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} at offset {}", self.code, self.pos)
	}
}

impl std::error::Error for Error {}


/// Failures of tree expansion. Distinct from [`ErrorCode`]: the stable
/// code set covers parse, type and internal errors only.
#[derive(Debug, Clone, Copy, thiserror::Error)]
pub enum ExpandError {
	#[error("multiple nodes match the path")]
	MultipleMatches,
	/// A step in the unmatched suffix is not `child::name`.
	#[error("path step cannot be created")]
	IllegalStep,
	#[error(transparent)]
	Eval(#[from] Error),
}
