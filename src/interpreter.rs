use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use std::time::Instant;

use crate::class::{Class, Instance};
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::expr::{Expr, ExprVisitor};
use crate::function::{Function, NativeFunction};
use crate::literal::Literal;
use crate::object::{Callable, Object};
use crate::stmt::{Stmt, StmtVisitor};
use crate::token::{Token, Type};

/// What a statement handed back up the call stack besides a plain
/// `RuntimeError`: either nothing unusual happened, or a `return`/`break`
/// needs to unwind past any number of enclosing blocks.
#[derive(Debug, Clone)]
pub enum Signal {
    Return(Object),
    Break,
}

type EvalResult = Result<Object, RuntimeError>;
type ExecResult = Result<Option<Signal>, RuntimeError>;

/// Walks the AST produced by the parser and resolver, evaluating it
/// directly rather than compiling to any intermediate form. `W` is the
/// sink for `print` statements; tests inject a `Vec<u8>`, the CLI injects
/// `Stdout`.
pub struct Interpreter<W: Write> {
    pub globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<Token, usize>,
    output: W,
}

impl<W: Write> Interpreter<W> {
    pub fn new(output: W) -> Self {
        let globals = Rc::new(RefCell::new(Environment::default()));
        for native in NativeFunction::globals(Instant::now()) {
            globals.borrow_mut().define(&native.name.clone(), Object::from(native));
        }

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Recorded by the resolver: `name` resolves `depth` scopes up from
    /// wherever it's looked up at runtime.
    pub fn resolve(&mut self, name: &Token, depth: usize) {
        self.locals.insert(name.clone(), depth);
    }

    /// Runs a full program. A runtime error aborts the remaining
    /// statements and is reported once; it does not unwind past this call.
    pub fn interpret(&mut self, statements: &[Stmt]) {
        for statement in statements {
            if let Err(error) = self.execute(statement) {
                use crate::error::Report;
                error.report();
                return;
            }
        }
    }

    fn execute(&mut self, stmt: &Stmt) -> ExecResult {
        stmt.accept(self)
    }

    pub fn execute_block(&mut self, statements: &[Stmt], environment: Rc<RefCell<Environment>>) -> ExecResult {
        let previous = std::mem::replace(&mut self.environment, environment);

        let mut result = Ok(None);
        for statement in statements {
            match self.execute(statement) {
                Ok(None) => continue,
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    fn evaluate(&mut self, expr: &Expr) -> EvalResult {
        expr.accept(self)
    }

    fn lookup_variable(&mut self, name: &Token) -> EvalResult {
        match self.locals.get(name) {
            Some(&distance) => self.environment.borrow().get_at(distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    fn call(&mut self, callee: Object, paren: &Token, arguments: Vec<Object>) -> EvalResult {
        match callee {
            Object::Function(function) => {
                check_arity(paren, function.arity(), arguments.len())?;
                function.call(self, arguments)
            }
            Object::NativeFunction(function) => {
                check_arity(paren, function.arity(), arguments.len())?;
                function.call(self, arguments)
            }
            Object::Class(class) => {
                let arity = class.borrow().arity();
                check_arity(paren, arity, arguments.len())?;

                let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(&class))));
                let initializer = class.borrow().find_method("init");
                if let Some(init) = initializer {
                    let bound = init.bind(Object::Instance(Rc::clone(&instance)));
                    bound.call(self, arguments)?;
                }

                Ok(Object::Instance(instance))
            }
            _ => Err(RuntimeError {
                token: paren.clone(),
                message: "Can only call functions and classes.".to_string(),
            }),
        }
    }
}

fn check_arity(paren: &Token, expected: usize, got: usize) -> Result<(), RuntimeError> {
    if expected != got {
        return Err(RuntimeError {
            token: paren.clone(),
            message: format!("Expected {expected} arguments but got {got}."),
        });
    }
    Ok(())
}

fn number_operand(token: &Token, value: &Object) -> Result<f64, RuntimeError> {
    match value {
        Object::Literal(Literal::Number(n)) => Ok(*n),
        _ => Err(RuntimeError {
            token: token.clone(),
            message: "Operand must be a number.".to_string(),
        }),
    }
}

fn number_operands(token: &Token, left: &Object, right: &Object) -> Result<(f64, f64), RuntimeError> {
    match (left, right) {
        (Object::Literal(Literal::Number(l)), Object::Literal(Literal::Number(r))) => Ok((*l, *r)),
        _ => Err(RuntimeError {
            token: token.clone(),
            message: "Operands must be numbers.".to_string(),
        }),
    }
}

impl<W: Write> ExprVisitor<EvalResult> for Interpreter<W> {
    fn visit_literal_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Literal(literal) = expr else { unreachable!() };
        Ok(Object::from(literal.clone()))
    }

    fn visit_grouping_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Grouping(data) = expr else { unreachable!() };
        self.evaluate(&data.expr)
    }

    fn visit_unary_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Unary(data) = expr else { unreachable!() };
        let right = self.evaluate(&data.expr)?;

        match data.operator.r#type {
            Type::Minus => {
                let n = number_operand(&data.operator, &right)?;
                Ok(Object::from(-n))
            }
            Type::Bang => Ok(Object::from(!right.as_bool())),
            _ => unreachable!("unary operator {:?}", data.operator.r#type),
        }
    }

    fn visit_binary_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Binary(data) = expr else { unreachable!() };
        let left = self.evaluate(&data.left)?;
        let right = self.evaluate(&data.right)?;
        let op = &data.operator;

        match op.r#type {
            Type::Minus => {
                let (l, r) = number_operands(op, &left, &right)?;
                Ok(Object::from(l - r))
            }
            Type::Slash => {
                let (l, r) = number_operands(op, &left, &right)?;
                Ok(Object::from(l / r))
            }
            Type::Star => {
                let (l, r) = number_operands(op, &left, &right)?;
                Ok(Object::from(l * r))
            }
            Type::Plus => match (left, right) {
                (Object::Literal(Literal::Number(l)), Object::Literal(Literal::Number(r))) => {
                    Ok(Object::from(l + r))
                }
                (Object::Literal(Literal::String(l)), Object::Literal(Literal::String(r))) => {
                    Ok(Object::from(l + &r))
                }
                _ => Err(RuntimeError {
                    token: op.clone(),
                    message: "Operands must be two strings or two numbers.".to_string(),
                }),
            },
            Type::Greater => {
                let (l, r) = number_operands(op, &left, &right)?;
                Ok(Object::from(l > r))
            }
            Type::GreaterEqual => {
                let (l, r) = number_operands(op, &left, &right)?;
                Ok(Object::from(l >= r))
            }
            Type::Less => {
                let (l, r) = number_operands(op, &left, &right)?;
                Ok(Object::from(l < r))
            }
            Type::LessEqual => {
                let (l, r) = number_operands(op, &left, &right)?;
                Ok(Object::from(l <= r))
            }
            Type::EqualEqual => Ok(Object::from(left == right)),
            Type::BangEqual => Ok(Object::from(left != right)),
            _ => unreachable!("binary operator {:?}", op.r#type),
        }
    }

    fn visit_logical_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Logical(data) = expr else { unreachable!() };
        let left = self.evaluate(&data.left)?;

        let short_circuits = if data.operator.r#type == Type::Or {
            left.as_bool()
        } else {
            !left.as_bool()
        };

        if short_circuits {
            Ok(left)
        } else {
            self.evaluate(&data.right)
        }
    }

    fn visit_variable_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Variable(data) = expr else { unreachable!() };
        self.lookup_variable(&data.name)
    }

    fn visit_assign_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Assign(data) = expr else { unreachable!() };
        let value = self.evaluate(&data.value)?;

        match self.locals.get(&data.name) {
            Some(&distance) => {
                self.environment.borrow_mut().assign_at(distance, &data.name, value.clone());
            }
            None => {
                self.globals.borrow_mut().assign(&data.name, value.clone())?;
            }
        }

        Ok(value)
    }

    fn visit_call_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Call(data) = expr else { unreachable!() };
        let callee = self.evaluate(&data.callee)?;

        let mut arguments = Vec::with_capacity(data.arguments.len());
        for argument in &data.arguments {
            arguments.push(self.evaluate(argument)?);
        }

        self.call(callee, &data.paren, arguments)
    }

    fn visit_get_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Get(data) = expr else { unreachable!() };
        let object = self.evaluate(&data.object)?;

        match &object {
            Object::Instance(instance) => instance.borrow().get(&data.name, &object),
            _ => Err(RuntimeError {
                token: data.name.clone(),
                message: "Only instances have properties.".to_string(),
            }),
        }
    }

    fn visit_set_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Set(data) = expr else { unreachable!() };
        let value = self.evaluate(&data.value)?;
        let object = self.evaluate(&data.object)?;

        match object {
            Object::Instance(instance) => {
                instance.borrow_mut().set(&data.name, value.clone());
                Ok(value)
            }
            _ => Err(RuntimeError {
                token: data.name.clone(),
                message: "Only instances have fields.".to_string(),
            }),
        }
    }

    fn visit_this_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::This(data) = expr else { unreachable!() };
        self.lookup_variable(&data.keyword)
    }

    fn visit_super_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Super(data) = expr else { unreachable!() };

        let distance = *self.locals.get(&data.keyword)
            .unwrap_or_else(|| panic!("'super' to have been resolved"));

        let superclass = match self.environment.borrow().get_at(distance, &data.keyword)? {
            Object::Class(class) => class,
            _ => unreachable!("'super' resolved to a non-class value"),
        };

        // `this` always lives exactly one scope closer than `super`: the
        // resolver opens the `this` scope right after the `super` scope.
        let this_token = Token::synthetic("this");
        let this = self.environment.borrow().get_at(distance - 1, &this_token)?;

        let method = superclass.borrow().find_method(&data.method.lexeme).ok_or_else(|| RuntimeError {
            token: data.method.clone(),
            message: format!("Undefined property '{}'.", data.method.lexeme),
        })?;

        Ok(Object::from(method.bind(this)))
    }
}

impl<W: Write> StmtVisitor<ExecResult> for Interpreter<W> {
    fn visit_expression_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Expression(data) = stmt else { unreachable!() };
        self.evaluate(&data.expr)?;
        Ok(None)
    }

    fn visit_print_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Print(data) = stmt else { unreachable!() };
        let value = self.evaluate(&data.expr)?;
        writeln!(self.output, "{value}").expect("write to output");
        Ok(None)
    }

    fn visit_var_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Var(data) = stmt else { unreachable!() };
        let value = match &data.initializer {
            Some(initializer) => self.evaluate(initializer)?,
            None => Object::from(Literal::Nil),
        };

        self.environment.borrow_mut().define(&data.name.lexeme, value);
        Ok(None)
    }

    fn visit_block_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Block(data) = stmt else { unreachable!() };
        let scope = Environment::new(Some(Rc::clone(&self.environment)));
        self.execute_block(&data.statements, Rc::new(RefCell::new(scope)))
    }

    fn visit_if_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::If(data) = stmt else { unreachable!() };

        if self.evaluate(&data.condition)?.as_bool() {
            self.execute(&data.then_branch)
        } else if let Some(else_branch) = &data.else_branch {
            self.execute(else_branch)
        } else {
            Ok(None)
        }
    }

    fn visit_while_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::While(data) = stmt else { unreachable!() };

        while self.evaluate(&data.condition)?.as_bool() {
            match self.execute(&data.body)? {
                Some(Signal::Break) => break,
                signal @ Some(Signal::Return(_)) => return Ok(signal),
                None => {}
            }
        }

        Ok(None)
    }

    fn visit_function_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Function(data) = stmt else { unreachable!() };
        let function = Function::new(stmt, Rc::clone(&self.environment), false);
        self.environment.borrow_mut().define(&data.name.lexeme, Object::from(function));
        Ok(None)
    }

    fn visit_return_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Return(data) = stmt else { unreachable!() };
        let value = match &data.value {
            Some(expr) => self.evaluate(expr)?,
            None => Object::from(Literal::Nil),
        };
        Ok(Some(Signal::Return(value)))
    }

    fn visit_class_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Class(data) = stmt else { unreachable!() };

        let superclass = match &data.superclass {
            Some(expr) => {
                let value = self.evaluate(expr)?;
                match value {
                    Object::Class(class) => Some(class),
                    _ => {
                        let Expr::Variable(variable) = expr else { unreachable!() };
                        return Err(RuntimeError {
                            token: variable.name.clone(),
                            message: "Superclass must be a class.".to_string(),
                        });
                    }
                }
            }
            None => None,
        };

        self.environment.borrow_mut().define(&data.name.lexeme, Object::from(Literal::Nil));

        let previous = superclass.as_ref().map(|superclass| {
            let mut scope = Environment::new(Some(Rc::clone(&self.environment)));
            scope.define("super", Object::Class(Rc::clone(superclass)));
            std::mem::replace(&mut self.environment, Rc::new(RefCell::new(scope)))
        });

        let mut methods = HashMap::new();
        for method in &data.methods {
            let Stmt::Function(method_data) = method else { unreachable!() };
            let is_initializer = method_data.name.lexeme == "init";
            let function = Function::new(method, Rc::clone(&self.environment), is_initializer);
            methods.insert(method_data.name.lexeme.clone(), Rc::new(function));
        }

        let class = Class::new(data.name.lexeme.clone(), superclass, methods);

        if let Some(previous) = previous {
            self.environment = previous;
        }

        self.environment.borrow_mut().assign(&data.name, Object::from(Rc::new(RefCell::new(class))))?;
        Ok(None)
    }

    fn visit_break_stmt(&mut self, _stmt: &Stmt) -> ExecResult {
        Ok(Some(Signal::Break))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::scanner::Scanner;

    fn run(source: &str) -> String {
        crate::error::reset();
        let tokens = Scanner::new(source).scan_tokens();
        let statements = Parser::new(tokens).parse();

        let mut output = Vec::new();
        let mut interpreter = Interpreter::new(&mut output);
        let mut resolver = Resolver::new(&mut interpreter);
        resolver.resolve(&statements);
        interpreter.interpret(&statements);

        String::from_utf8(output).unwrap()
    }

    #[test]
    fn arithmetic_and_print() {
        assert_eq!(run("print 1 + 2 * 3;"), "7\n");
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(run("print \"a\" + \"b\";"), "ab\n");
    }

    #[test]
    fn integral_numbers_print_without_trailing_zero() {
        assert_eq!(run("print 6 / 2;"), "3\n");
    }

    #[test]
    fn closures_capture_their_defining_scope() {
        let source = r#"
            fun makeCounter() {
                var i = 0;
                fun count() {
                    i = i + 1;
                    print i;
                }
                return count;
            }
            var counter = makeCounter();
            counter();
            counter();
        "#;
        assert_eq!(run(source), "1\n2\n");
    }

    #[test]
    fn break_exits_the_nearest_loop() {
        let source = r#"
            var i = 0;
            while (true) {
                if (i >= 3) break;
                print i;
                i = i + 1;
            }
        "#;
        assert_eq!(run(source), "0\n1\n2\n");
    }

    #[test]
    fn classes_construct_and_bind_methods() {
        let source = r#"
            class Greeter {
                init(name) {
                    this.name = name;
                }
                greet() {
                    print "hi " + this.name;
                }
            }
            var g = Greeter("glint");
            g.greet();
        "#;
        assert_eq!(run(source), "hi glint\n");
    }

    #[test]
    fn inherited_methods_resolve_through_super() {
        let source = r#"
            class Animal {
                speak() {
                    print "...";
                }
            }
            class Dog < Animal {
                speak() {
                    super.speak();
                    print "woof";
                }
            }
            Dog().speak();
        "#;
        assert_eq!(run(source), "...\nwoof\n");
    }
}
