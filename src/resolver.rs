use std::collections::HashMap;
use std::io::Write;
use std::mem;

use crate::error::{Report, ResolveError};
use crate::expr::{Expr, ExprVisitor};
use crate::interpreter::Interpreter;
use crate::stmt::{Stmt, StmtVisitor};
use crate::token::Token;

enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

enum ClassType {
    None,
    Class,
    Subclass,
}

/// A static pass between parsing and evaluation. Walks the same tree the
/// evaluator will, but only to compute how many scopes out each variable
/// reference resolves to, and to catch the errors that don't need runtime
/// values to detect (`return` at top level, `this` outside a class, ...).
pub struct Resolver<'a, W: Write> {
    interpreter: &'a mut Interpreter<W>,
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'a, W: Write> Resolver<'a, W> {
    pub fn new(interpreter: &'a mut Interpreter<W>) -> Self {
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        expr.accept(self);
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        stmt.accept(self);
    }

    pub fn resolve(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    fn resolve_function(&mut self, function: &Stmt, r#type: FunctionType) {
        let Stmt::Function(data) = function else { unreachable!() };

        let enclosing_function = mem::replace(&mut self.current_function, r#type);

        self.begin_scope();
        for param in &data.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve(&data.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else { return };

        if scope.contains_key(&name.lexeme) {
            ResolveError {
                token: name.clone(),
                message: "Already a variable with this name in this scope.".to_string(),
            }.report();
        }

        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else { return };
        scope.insert(name.lexeme.clone(), true);
    }

    fn resolve_local(&mut self, name: &Token) {
        for (i, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.interpreter.resolve(name, i);
                return;
            }
        }
    }
}

impl<'a, W: Write> ExprVisitor<()> for Resolver<'a, W> {
    fn visit_variable_expr(&mut self, expr: &Expr) {
        let Expr::Variable(data) = expr else { unreachable!() };

        if let Some(scope) = self.scopes.last() {
            if let Some(false) = scope.get(&data.name.lexeme) {
                ResolveError {
                    token: data.name.clone(),
                    message: "Can't read local variable in its own initializer.".to_string(),
                }.report();
            }
        }

        self.resolve_local(&data.name);
    }

    fn visit_assign_expr(&mut self, expr: &Expr) {
        let Expr::Assign(data) = expr else { unreachable!() };

        self.resolve_expr(&data.value);
        self.resolve_local(&data.name);
    }

    fn visit_literal_expr(&mut self, _expr: &Expr) {}

    fn visit_logical_expr(&mut self, expr: &Expr) {
        let Expr::Logical(data) = expr else { unreachable!() };

        self.resolve_expr(&data.left);
        self.resolve_expr(&data.right);
    }

    fn visit_unary_expr(&mut self, expr: &Expr) {
        let Expr::Unary(data) = expr else { unreachable!() };
        self.resolve_expr(&data.expr);
    }

    fn visit_binary_expr(&mut self, expr: &Expr) {
        let Expr::Binary(data) = expr else { unreachable!() };

        self.resolve_expr(&data.left);
        self.resolve_expr(&data.right);
    }

    fn visit_grouping_expr(&mut self, expr: &Expr) {
        let Expr::Grouping(data) = expr else { unreachable!() };
        self.resolve_expr(&data.expr);
    }

    fn visit_call_expr(&mut self, expr: &Expr) {
        let Expr::Call(data) = expr else { unreachable!() };

        self.resolve_expr(&data.callee);
        for argument in &data.arguments {
            self.resolve_expr(argument);
        }
    }

    fn visit_get_expr(&mut self, expr: &Expr) {
        let Expr::Get(data) = expr else { unreachable!() };
        self.resolve_expr(&data.object);
    }

    fn visit_set_expr(&mut self, expr: &Expr) {
        let Expr::Set(data) = expr else { unreachable!() };

        self.resolve_expr(&data.value);
        self.resolve_expr(&data.object);
    }

    fn visit_this_expr(&mut self, expr: &Expr) {
        let Expr::This(data) = expr else { unreachable!() };

        if let ClassType::None = self.current_class {
            ResolveError {
                token: data.keyword.clone(),
                message: "Can't use 'this' outside of a class.".to_string(),
            }.report();
            return;
        }

        self.resolve_local(&data.keyword);
    }

    fn visit_super_expr(&mut self, expr: &Expr) {
        let Expr::Super(data) = expr else { unreachable!() };

        match self.current_class {
            ClassType::Subclass => {}
            ClassType::None => ResolveError {
                token: data.keyword.clone(),
                message: "Can't use 'super' outside of a class.".to_string(),
            }.report(),
            ClassType::Class => ResolveError {
                token: data.keyword.clone(),
                message: "Can't use 'super' in a class with no superclass.".to_string(),
            }.report(),
        }

        self.resolve_local(&data.keyword);
    }
}

impl<'a, W: Write> StmtVisitor<()> for Resolver<'a, W> {
    fn visit_block_stmt(&mut self, stmt: &Stmt) {
        let Stmt::Block(data) = stmt else { unreachable!() };

        self.begin_scope();
        self.resolve(&data.statements);
        self.end_scope();
    }

    fn visit_var_stmt(&mut self, stmt: &Stmt) {
        let Stmt::Var(data) = stmt else { unreachable!() };

        self.declare(&data.name);
        if let Some(initializer) = &data.initializer {
            self.resolve_expr(initializer);
        }
        self.define(&data.name);
    }

    fn visit_function_stmt(&mut self, stmt: &Stmt) {
        let Stmt::Function(data) = stmt else { unreachable!() };

        self.declare(&data.name);
        self.define(&data.name);

        self.resolve_function(stmt, FunctionType::Function);
    }

    fn visit_expression_stmt(&mut self, stmt: &Stmt) {
        let Stmt::Expression(data) = stmt else { unreachable!() };
        self.resolve_expr(&data.expr);
    }

    fn visit_if_stmt(&mut self, stmt: &Stmt) {
        let Stmt::If(data) = stmt else { unreachable!() };

        self.resolve_expr(&data.condition);
        self.resolve_stmt(&data.then_branch);
        if let Some(else_branch) = &data.else_branch {
            self.resolve_stmt(else_branch);
        }
    }

    fn visit_print_stmt(&mut self, stmt: &Stmt) {
        let Stmt::Print(data) = stmt else { unreachable!() };
        self.resolve_expr(&data.expr);
    }

    fn visit_return_stmt(&mut self, stmt: &Stmt) {
        let Stmt::Return(data) = stmt else { unreachable!() };

        if let FunctionType::None = self.current_function {
            ResolveError {
                token: data.keyword.clone(),
                message: "Can't return from top-level code.".to_string(),
            }.report();
        }

        if let Some(value) = &data.value {
            if let FunctionType::Initializer = self.current_function {
                ResolveError {
                    token: data.keyword.clone(),
                    message: "Can't return a value from an initializer.".to_string(),
                }.report();
                return;
            }

            self.resolve_expr(value);
        }
    }

    fn visit_break_stmt(&mut self, _stmt: &Stmt) {}

    fn visit_while_stmt(&mut self, stmt: &Stmt) {
        let Stmt::While(data) = stmt else { unreachable!() };

        self.resolve_expr(&data.condition);
        self.resolve_stmt(&data.body);
    }

    fn visit_class_stmt(&mut self, stmt: &Stmt) {
        let Stmt::Class(data) = stmt else { unreachable!() };

        let enclosing_class = mem::replace(&mut self.current_class, ClassType::Class);

        self.declare(&data.name);
        self.define(&data.name);

        if let Some(superclass) = &data.superclass {
            let Expr::Variable(variable) = superclass else { unreachable!() };

            if data.name.lexeme == variable.name.lexeme {
                ResolveError {
                    token: variable.name.clone(),
                    message: "A class can't inherit from itself.".to_string(),
                }.report();
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);

            self.begin_scope();
            self.scopes.last_mut().expect("scope stack to be non-empty").insert("super".to_string(), true);
        }

        self.begin_scope();
        self.scopes.last_mut().expect("scope stack to be non-empty").insert("this".to_string(), true);

        for method in &data.methods {
            let Stmt::Function(method_data) = method else { unreachable!() };
            let kind = if method_data.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        if data.superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn resolve(source: &str) {
        crate::error::reset();
        let tokens = Scanner::new(source).scan_tokens();
        let statements = Parser::new(tokens).parse();
        let mut output = Vec::new();
        let mut interpreter = Interpreter::new(&mut output);
        Resolver::new(&mut interpreter).resolve(&statements);
    }

    #[test]
    fn return_at_top_level_is_a_resolve_error() {
        resolve("return 1;");
        assert!(crate::error::had_static_error());
    }

    #[test]
    fn this_outside_a_class_is_a_resolve_error() {
        resolve("print this;");
        assert!(crate::error::had_static_error());
    }

    #[test]
    fn class_inheriting_from_itself_is_a_resolve_error() {
        resolve("class A < A {}");
        assert!(crate::error::had_static_error());
    }

    #[test]
    fn shadowing_a_name_twice_in_one_scope_is_a_resolve_error() {
        resolve("{ var a = 1; var a = 2; }");
        assert!(crate::error::had_static_error());
    }

    #[test]
    fn reading_a_variable_in_its_own_initializer_is_a_resolve_error() {
        resolve("{ var a = a; }");
        assert!(crate::error::had_static_error());
    }

    #[test]
    fn well_formed_class_hierarchy_resolves_cleanly() {
        resolve("class A { greet() { print \"hi\"; } } class B < A { greet() { super.greet(); } }");
        assert!(!crate::error::had_static_error());
    }
}
