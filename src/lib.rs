//! Glint is a dynamically typed, lexically scoped scripting language with
//! first-class functions, closures, and single-inheritance classes. It is a
//! tree-walk interpreter: source text is scanned into tokens, parsed into an
//! abstract syntax tree, statically resolved, and then evaluated directly
//! against the tree rather than compiled to any bytecode or machine code.
//!
//! ## Scanning
//! The [`scanner`] module turns source text into a flat stream of
//! [`Token`](token::Token)s. Lexical errors (an unterminated string, a
//! stray `@`) are reported immediately as a [`ScanError`](error::ScanError)
//! and scanning continues, so a single run can surface more than one.
//!
//! ## Parsing
//! The [`parser`] module is a recursive-descent parser that turns the token
//! stream into a list of [`Stmt`](stmt::Stmt)s. Expressions
//! ([`Expr`](expr::Expr)) are the pieces of the tree that produce a value;
//! statements are the pieces that perform an action. Syntax errors are
//! reported as a [`ParseError`](error::ParseError); the parser
//! synchronizes to the next likely statement boundary and keeps going.
//!
//! ## Resolving
//! The [`resolver`] module is a static pass between parsing and evaluation.
//! It walks the same tree the interpreter will, computing how many
//! enclosing lexical scopes separate each variable reference from its
//! binding, and diagnosing misuse of `this`, `super`, and `return` before a
//! single line of the program actually runs. These are reported as a
//! [`ResolveError`](error::ResolveError).
//!
//! ## Interpreting
//! The [`interpreter`] module walks the resolved tree and evaluates it.
//! Variable storage is modeled by [`environment`] as a chain of scopes;
//! callables (native functions, user functions, and classes) are modeled in
//! [`function`] and [`class`]. Errors that can only be caught once values
//! exist — adding a string to a number, calling something that isn't
//! callable — are reported as a [`RuntimeError`](error::RuntimeError).

use std::fs;
use std::io::Write;
use std::process;

pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interpreter;
pub mod literal;
pub mod object;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;

use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// Top-level orchestration type: owns the single [`Interpreter`] that backs
/// either a one-shot file run or a REPL session, and wires together the
/// scan/parse/resolve/interpret pipeline.
///
/// `W` is the sink for `print` statements, shared with [`Interpreter`] so
/// tests can inject a `Vec<u8>` and the CLI can inject [`std::io::Stdout`].
pub struct Glint<W: Write> {
    interpreter: Interpreter<W>,
}

impl<W: Write> Glint<W> {
    pub fn new(output: W) -> Self {
        Glint { interpreter: Interpreter::new(output) }
    }

    /// Reads `path` in its entirety and runs it as a single program. Exits
    /// the process with 65 or 70 if a static or runtime error occurred.
    pub fn run_file(&mut self, path: &str) {
        let source = fs::read_to_string(path).unwrap_or_else(|err| {
            eprintln!("Could not read '{path}': {err}");
            process::exit(74);
        });

        self.run(&source);

        if error::had_static_error() {
            process::exit(65);
        }
        if error::had_runtime_error() {
            process::exit(70);
        }
    }

    /// Runs a single line as a stand-alone program, for use by a REPL
    /// driver. Resets both error flags before returning so the caller can
    /// start the next line with a clean slate.
    pub fn run_line(&mut self, source: &str) {
        self.run(source);
        error::reset();
    }

    fn run(&mut self, source: &str) {
        let mut scanner = Scanner::new(source);
        let tokens = scanner.scan_tokens();

        if error::had_static_error() {
            return;
        }

        let mut parser = Parser::new(tokens);
        let statements = parser.parse();

        if error::had_static_error() {
            return;
        }

        let mut resolver = Resolver::new(&mut self.interpreter);
        resolver.resolve(&statements);

        if error::had_static_error() {
            return;
        }

        self.interpreter.interpret(&statements);
    }
}
