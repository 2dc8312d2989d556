use crate::token::{Token, Type};

static mut HAD_STATIC_ERROR: bool = false;
static mut HAD_RUNTIME_ERROR: bool = false;

/// True if any stage (scan, parse, resolve) has reported a static error.
pub fn had_static_error() -> bool {
    unsafe { HAD_STATIC_ERROR }
}

/// True if the evaluator has reported a runtime error.
pub fn had_runtime_error() -> bool {
    unsafe { HAD_RUNTIME_ERROR }
}

/// True if either flag is set. Stages downstream of a static error skip
/// their pass entirely (see `Glint::run`).
pub fn had_error() -> bool {
    had_static_error() || had_runtime_error()
}

/// Clears both flags. Called between REPL lines.
pub fn reset() {
    unsafe {
        HAD_STATIC_ERROR = false;
        HAD_RUNTIME_ERROR = false;
    }
}

/// Implemented by every diagnostic type. `report` formats the message to
/// stderr and sets the appropriate process-wide flag.
pub trait Report {
    fn report(&self);
}

fn static_flag() {
    unsafe {
        HAD_STATIC_ERROR = true;
    }
}

fn runtime_flag() {
    unsafe {
        HAD_RUNTIME_ERROR = true;
    }
}

/// A diagnostic raised by the scanner: unterminated strings/numbers,
/// unexpected characters. Scanner errors have no token to point at (the
/// lexeme isn't known yet), so they report with line only.
#[derive(Debug)]
pub struct ScanError {
    pub line: usize,
    pub message: String,
}

impl Report for ScanError {
    fn report(&self) {
        eprintln!("[line {}] Error: {}", self.line, self.message);
        static_flag();
    }
}

/// A diagnostic raised by the parser.
#[derive(Debug)]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

impl Report for ParseError {
    fn report(&self) {
        report_at_token(&self.token, &self.message);
        static_flag();
    }
}

/// A diagnostic raised by the resolver.
#[derive(Debug)]
pub struct ResolveError {
    pub token: Token,
    pub message: String,
}

impl Report for ResolveError {
    fn report(&self) {
        report_at_token(&self.token, &self.message);
        static_flag();
    }
}

/// A diagnostic raised by the evaluator at runtime.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl Report for RuntimeError {
    fn report(&self) {
        eprintln!("{}\n[line {}]", self.message, self.token.location.line);
        runtime_flag();
    }
}

/// `[line L] Error AT: MESSAGE`, where `AT` is empty, `" at end"`, or
/// `" at 'LEXEME'"`. Shared by every stage that carries a `Token`, so
/// there is exactly one place that formats the `AT` clause.
fn report_at_token(token: &Token, message: &str) {
    let at = if token.r#type == Type::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    };

    eprintln!("[line {}] Error{at}: {message}", token.location.line);
}
