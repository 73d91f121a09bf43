//! A backend-agnostic stack frame: the Rust analog of the spec's
//! `(filePath, functionName, isEval, isConstructor)` tuple. `is_constructor`
//! has no Rust equivalent (there is no constructor-call distinction in a
//! native backtrace) and is dropped; see DESIGN.md.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub file: Option<String>,
    pub function: Option<String>,
}

impl Frame {
    pub fn new(file: Option<String>, function: Option<String>) -> Self {
        Self { file, function }
    }

    /// The eval heuristic, ported to what a native backtrace can observe:
    /// a resolvable function symbol with no resolvable source file is the
    /// Rust analog of the spec's "unnamed file with a named non-anonymous
    /// function" bullet — characteristic of code loaded at runtime via
    /// `dlopen`/`libloading` without embedded debug info.
    pub fn looks_like_eval(&self) -> bool {
        match (&self.file, &self.function) {
            (None, Some(name)) => !name.is_empty() && name != "<anonymous>",
            _ => false,
        }
    }
}
