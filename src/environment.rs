use crate::value::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    #[error("Undefined variable '{0}'.")]
    Undefined(String),
    #[error("Variable '{0}' is already declared in this scope.")]
    AlreadyDeclared(String),
}

/// Variable bindings for one program run.
///
/// Frames are kept innermost-last; each frame's enclosing scope is the one below
/// it and the bottom frame is the global scope, which is never popped. Declaring
/// and assigning are separate operations: `define` only ever touches the innermost
/// frame, `assign` only ever updates a binding that already exists.
#[derive(Debug, Clone)]
pub struct Environment {
    frames: Vec<HashMap<String, Value>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    /// Number of frames currently open, globals included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push_scope(&mut self) {
        self.frames.push(HashMap::new());
        trace!(depth = self.frames.len(), "scope pushed");
    }

    pub fn pop_scope(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
        trace!(depth = self.frames.len(), "scope popped");
    }

    /// Binds a new name in the innermost frame.
    pub fn define(&mut self, name: &str, value: Value) -> Result<(), EnvironmentError> {
        let frame = self.innermost();
        if frame.contains_key(name) {
            return Err(EnvironmentError::AlreadyDeclared(name.to_string()));
        }
        frame.insert(name.to_string(), value);
        Ok(())
    }

    /// Resolves `name`, innermost frame first.
    pub fn get(&self, name: &str) -> Result<Value, EnvironmentError> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .cloned()
            .ok_or_else(|| EnvironmentError::Undefined(name.to_string()))
    }

    /// Updates the nearest existing binding of `name`.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), EnvironmentError> {
        match self
            .frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.get_mut(name))
        {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(EnvironmentError::Undefined(name.to_string())),
        }
    }

    fn innermost(&mut self) -> &mut HashMap<String, Value> {
        if self.frames.is_empty() {
            self.frames.push(HashMap::new());
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }
}
