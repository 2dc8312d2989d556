use std::cell::RefCell;
use std::fmt::{Debug, Display};
use std::rc::Rc;
use std::time::Instant;

use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::interpreter::{Interpreter, Signal};
use crate::object::{Callable, Object};
use crate::stmt::Stmt;
use crate::token::Token;

/// A user-declared function or method.
///
/// Holds the environment that was active when the function was declared
/// (its closure), so that a block which has since exited is still
/// observed correctly by any function that escaped it.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
    pub closure: Rc<RefCell<Environment>>,
    pub is_initializer: bool,
}

impl Function {
    pub fn new(declaration: &Stmt, closure: Rc<RefCell<Environment>>, is_initializer: bool) -> Self {
        let Stmt::Function(data) = declaration else {
            panic!("Function::new called with a non-function statement");
        };

        Function {
            name: data.name.clone(),
            params: data.params.clone(),
            body: data.body.clone(),
            closure,
            is_initializer,
        }
    }

    /// Produces a copy of this function whose closure is a fresh scope,
    /// child of the original closure, binding `this` to `instance`. This
    /// is how a method becomes a bound method when read off an instance.
    pub fn bind(&self, instance: Object) -> Function {
        let mut environment = Environment::new(Some(Rc::clone(&self.closure)));
        environment.define("this", instance);

        Function {
            name: self.name.clone(),
            params: self.params.clone(),
            body: self.body.clone(),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }
}

impl Callable for Function {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        let mut environment = Environment::new(Some(Rc::clone(&self.closure)));

        for (param, arg) in self.params.iter().zip(arguments.into_iter()) {
            environment.define(&param.lexeme, arg);
        }

        let signal = interpreter.execute_block(&self.body, Rc::new(RefCell::new(environment)))?;

        if self.is_initializer {
            // `return;` inside an initializer still yields `this`, regardless
            // of whatever value the return statement (if any) carried.
            return self.closure.borrow().get_at(0, &Token::synthetic("this"));
        }

        match signal {
            Some(Signal::Return(value)) => Ok(value),
            _ => Ok(Object::from(crate::literal::Literal::Nil)),
        }
    }

    fn arity(&self) -> usize {
        self.params.len()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Rc::ptr_eq(&self.closure, &other.closure)
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<fn {}>", self.name.lexeme)
    }
}

/// A built-in function implemented in Rust rather than Glint.
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub function: Box<dyn Fn(&mut Interpreter, Vec<Object>) -> Result<Object, RuntimeError>>,
}

impl Callable for NativeFunction {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        (self.function)(interpreter, arguments)
    }

    fn arity(&self) -> usize {
        self.arity
    }
}

impl NativeFunction {
    /// The natives installed into the global environment at startup:
    /// `clock()` and `input()`, a line-reading convenience in the same
    /// spirit.
    pub fn globals(start: Instant) -> Vec<NativeFunction> {
        vec![
            NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                function: Box::new(move |_, _| {
                    Ok(Object::from(start.elapsed().as_secs_f64()))
                }),
            },
            NativeFunction {
                name: "input".to_string(),
                arity: 0,
                function: Box::new(|_, _| {
                    let mut input = String::new();
                    std::io::stdin().read_line(&mut input)
                        .map_err(|_| RuntimeError {
                            token: Token::synthetic("input"),
                            message: "Failed to read from stdin.".to_string(),
                        })?;
                    if input.ends_with('\n') {
                        input.pop();
                        if input.ends_with('\r') {
                            input.pop();
                        }
                    }
                    Ok(Object::from(input))
                }),
            },
        ]
    }
}

impl Display for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn '{}'>", self.name)
    }
}

impl Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn '{}'>", self.name)
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
