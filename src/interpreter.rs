use crate::ast::{BinaryOp, Expr, Stmt, UnaryOp};
use crate::environment::{Environment, EnvironmentError};
use crate::error::LoxError;
use crate::token::Token;
use crate::value::Value;
use std::io::Write;
use tracing::debug;

/// Tree-walking evaluator. Borrows the environment so bindings outlive a single
/// run (the REPL keeps one environment across lines) and writes `print` output
/// to `out`.
pub struct Interpreter<'env, W: Write> {
    environment: &'env mut Environment,
    out: W,
}

impl<'env, W: Write> Interpreter<'env, W> {
    pub fn new(environment: &'env mut Environment, out: W) -> Self {
        Self { environment, out }
    }

    /// Runs `statements` in order, stopping at the first runtime error. Output and
    /// bindings produced before the error are kept.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), LoxError> {
        debug!(statements = statements.len(), "interpreting");
        let result = statements
            .iter()
            .try_for_each(|statement| self.execute(statement));

        if let Err(ref error) = result {
            debug!(line = error.line, message = %error.message, "runtime error");
        }
        result
    }

    pub fn execute(&mut self, stmt: &Stmt) -> Result<(), LoxError> {
        match stmt {
            Stmt::Expression { expr } => {
                self.evaluate(expr)?;
                Ok(())
            }
            Stmt::Print { keyword, expr } => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value).map_err(|e| {
                    LoxError::runtime_error(
                        keyword.span,
                        keyword.line,
                        format!("Failed to write output: {}", e),
                    )
                })
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment
                    .define(&name.lexeme, value)
                    .map_err(|e| environment_error(name, e))
            }
            Stmt::Block { statements } => self.execute_block(statements),
        }
    }

    fn execute_block(&mut self, statements: &[Stmt]) -> Result<(), LoxError> {
        self.environment.push_scope();

        let result = statements
            .iter()
            .try_for_each(|statement| self.execute(statement));

        // The frame goes away whether or not the body failed
        self.environment.pop_scope();
        result
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, LoxError> {
        match expr {
            Expr::Literal { value } => Ok(value.clone()),
            Expr::Grouping { expr } => self.evaluate(expr),
            Expr::Unary {
                operator,
                operand,
                token,
            } => {
                let operand_val = self.evaluate(operand)?;
                evaluate_unary_op(*operator, operand_val, token)
            }
            Expr::Binary {
                left,
                operator,
                right,
                token,
            } => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                evaluate_binary_op(*operator, left_val, right_val, token)
            }
            Expr::Variable { name } => self
                .environment
                .get(&name.lexeme)
                .map_err(|e| environment_error(name, e)),
            Expr::Assign { name, value } => {
                let val = self.evaluate(value)?;
                self.environment
                    .assign(&name.lexeme, val.clone())
                    .map_err(|e| environment_error(name, e))?;
                Ok(val)
            }
        }
    }
}

/// Runs `statements` against `environment`, printing to `out`.
pub fn interpret<W: Write>(
    statements: &[Stmt],
    environment: &mut Environment,
    out: &mut W,
) -> Result<(), LoxError> {
    Interpreter::new(environment, out).interpret(statements)
}

fn environment_error(name: &Token, error: EnvironmentError) -> LoxError {
    let help = match error {
        EnvironmentError::Undefined(_) => "Declare it first with 'var'.",
        EnvironmentError::AlreadyDeclared(_) => "Assign to it instead of declaring it again.",
    };
    LoxError::runtime_error(name.span, name.line, error.to_string()).with_help(help)
}

fn evaluate_unary_op(operator: UnaryOp, operand: Value, token: &Token) -> Result<Value, LoxError> {
    match operator {
        UnaryOp::Negate => match operand {
            Value::Number(n) => Ok(Value::Number(-n)),
            other => Err(LoxError::runtime_error(
                token.span,
                token.line,
                "Operand must be a number.".to_string(),
            )
            .with_help(format!("Cannot negate a {}.", other.type_name()))),
        },
        UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
    }
}

fn evaluate_binary_op(
    operator: BinaryOp,
    left: Value,
    right: Value,
    token: &Token,
) -> Result<Value, LoxError> {
    match operator {
        BinaryOp::Add => match (left, right) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
            (Value::String(l), Value::String(r)) => Ok(Value::String(l + &r)),
            (l, r) => Err(LoxError::runtime_error(
                token.span,
                token.line,
                "Operands must be two numbers or two strings.".to_string(),
            )
            .with_help(format!(
                "Cannot add {} and {}.",
                l.type_name(),
                r.type_name()
            ))),
        },
        BinaryOp::Subtract => number_operands(&left, &right, token).map(|(l, r)| Value::Number(l - r)),
        BinaryOp::Multiply => number_operands(&left, &right, token).map(|(l, r)| Value::Number(l * r)),
        // IEEE semantics: dividing by zero yields an infinity or NaN
        BinaryOp::Divide => number_operands(&left, &right, token).map(|(l, r)| Value::Number(l / r)),
        BinaryOp::Greater => number_operands(&left, &right, token).map(|(l, r)| Value::Bool(l > r)),
        BinaryOp::GreaterEqual => {
            number_operands(&left, &right, token).map(|(l, r)| Value::Bool(l >= r))
        }
        BinaryOp::Less => number_operands(&left, &right, token).map(|(l, r)| Value::Bool(l < r)),
        BinaryOp::LessEqual => {
            number_operands(&left, &right, token).map(|(l, r)| Value::Bool(l <= r))
        }
        BinaryOp::Equal => Ok(Value::Bool(is_equal(&left, &right))),
        BinaryOp::NotEqual => Ok(Value::Bool(!is_equal(&left, &right))),
    }
}

fn number_operands(left: &Value, right: &Value, token: &Token) -> Result<(f64, f64), LoxError> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok((*l, *r)),
        (l, r) => Err(LoxError::runtime_error(
            token.span,
            token.line,
            "Operands must be numbers.".to_string(),
        )
        .with_help(format!(
            "'{}' got {} and {}.",
            token.lexeme,
            l.type_name(),
            r.type_name()
        ))),
    }
}

/// Nil equals only nil; mismatched types are never equal. NaN equals NaN.
fn is_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::Number(l), Value::Number(r)) => l == r || (l.is_nan() && r.is_nan()),
        (Value::String(l), Value::String(r)) => l == r,
        _ => false,
    }
}
