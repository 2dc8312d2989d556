use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::object::Object;
use crate::token::Token;

/// One link in the lexical scope chain. The chain forms a tree rooted at
/// globals; a block or call frame may outlive its lexical position if a
/// closure keeps its `Rc` alive.
#[derive(Debug, Clone)]
pub struct Environment {
    pub enclosing: Option<Rc<RefCell<Environment>>>,
    pub variables: HashMap<String, Object>,
}

impl Environment {
    pub fn new(enclosing: Option<Rc<RefCell<Environment>>>) -> Self {
        Environment {
            enclosing,
            variables: HashMap::new(),
        }
    }

    pub fn define(&mut self, name: &str, value: Object) {
        self.variables.insert(name.to_string(), value);
    }

    fn ancestor(&self, distance: usize) -> Rc<RefCell<Environment>> {
        let parent = self.enclosing.clone()
            .unwrap_or_else(|| panic!("enclosing environment to exist at depth 1"));
        let mut environment = Rc::clone(&parent);

        for i in 1..distance {
            let parent = environment.borrow().enclosing.clone()
                .unwrap_or_else(|| panic!("enclosing environment to exist at depth {i}"));
            environment = Rc::clone(&parent);
        }

        environment
    }

    pub fn assign(&mut self, name: &Token, value: Object) -> Result<(), RuntimeError> {
        if self.variables.contains_key(&name.lexeme) {
            self.variables.insert(name.lexeme.clone(), value);
            return Ok(());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow_mut().assign(name, value);
        }

        Err(RuntimeError {
            token: name.clone(),
            message: format!("Undefined variable '{}'.", name.lexeme),
        })
    }

    pub fn assign_at(&mut self, distance: usize, name: &Token, value: Object) {
        if distance > 0 {
            self.ancestor(distance).borrow_mut().variables.insert(name.lexeme.clone(), value);
        } else {
            self.variables.insert(name.lexeme.clone(), value);
        }
    }

    pub fn get(&self, name: &Token) -> Result<Object, RuntimeError> {
        if let Some(variable) = self.variables.get(&name.lexeme) {
            return Ok(variable.clone());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow().get(name);
        }

        Err(RuntimeError {
            token: name.clone(),
            message: format!("Undefined variable '{}'.", name.lexeme),
        })
    }

    pub fn get_at(&self, distance: usize, name: &Token) -> Result<Object, RuntimeError> {
        let undefined = || RuntimeError {
            token: name.clone(),
            message: format!("Undefined variable '{}'.", name.lexeme),
        };

        if distance > 0 {
            self.ancestor(distance).borrow().variables.get(&name.lexeme)
                .cloned()
                .ok_or_else(undefined)
        } else {
            self.variables.get(&name.lexeme).cloned().ok_or_else(undefined)
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Location, Type};

    fn token(name: &str) -> Token {
        Token::new(Type::Identifier, name.to_string(), None, Location::new(1, 1))
    }

    #[test]
    fn define_and_get() {
        let mut env = Environment::default();
        env.define("a", Object::from(1.0));
        assert_eq!(env.get(&token("a")).unwrap(), Object::from(1.0));
    }

    #[test]
    fn get_undefined_is_runtime_error() {
        let env = Environment::default();
        assert!(env.get(&token("missing")).is_err());
    }

    #[test]
    fn assign_walks_enclosing_chain() {
        let global = Rc::new(RefCell::new(Environment::default()));
        global.borrow_mut().define("a", Object::from(1.0));

        let mut child = Environment::new(Some(Rc::clone(&global)));
        child.assign(&token("a"), Object::from(2.0)).unwrap();

        assert_eq!(global.borrow().get(&token("a")).unwrap(), Object::from(2.0));
    }

    #[test]
    fn get_at_distance_skips_shadowing_scopes() {
        let global = Rc::new(RefCell::new(Environment::default()));
        global.borrow_mut().define("a", Object::from(1.0));

        let child = Rc::new(RefCell::new(Environment::new(Some(Rc::clone(&global)))));
        child.borrow_mut().define("a", Object::from(2.0));

        assert_eq!(child.borrow().get_at(0, &token("a")).unwrap(), Object::from(2.0));
        assert_eq!(child.borrow().get_at(1, &token("a")).unwrap(), Object::from(1.0));
    }
}
