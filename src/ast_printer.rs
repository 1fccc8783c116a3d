//! Parenthesized prefix rendering of the AST, used by `--ast`.

use crate::ast::{Expr, Stmt};
use crate::value::Value;

pub fn print_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal { value } => match value {
            Value::String(s) => format!("\"{}\"", s),
            other => other.to_string(),
        },
        Expr::Grouping { expr } => parenthesize("group", &[expr.as_ref()]),
        Expr::Unary {
            operator, operand, ..
        } => parenthesize(operator.symbol(), &[operand.as_ref()]),
        Expr::Binary {
            left,
            operator,
            right,
            ..
        } => parenthesize(operator.symbol(), &[left.as_ref(), right.as_ref()]),
        Expr::Variable { name } => name.lexeme.clone(),
        Expr::Assign { name, value } => format!("(= {} {})", name.lexeme, print_expr(value)),
    }
}

pub fn print_stmt(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Expression { expr } => parenthesize(";", &[expr]),
        Stmt::Print { expr, .. } => parenthesize("print", &[expr]),
        Stmt::Var { name, initializer } => match initializer {
            Some(init) => format!("(var {} {})", name.lexeme, print_expr(init)),
            None => format!("(var {})", name.lexeme),
        },
        Stmt::Block { statements } => {
            let mut out = String::from("(block");
            for statement in statements {
                out.push(' ');
                out.push_str(&print_stmt(statement));
            }
            out.push(')');
            out
        }
    }
}

fn parenthesize(name: &str, exprs: &[&Expr]) -> String {
    let mut out = format!("({}", name);
    for expr in exprs {
        out.push(' ');
        out.push_str(&print_expr(expr));
    }
    out.push(')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::scanner::scan;

    fn render(source: &str) -> Vec<String> {
        let (tokens, scan_errors) = scan(source);
        assert!(scan_errors.is_empty());
        let (statements, parse_errors) = parse(tokens);
        assert!(parse_errors.is_empty(), "{:?}", parse_errors);
        statements.iter().map(print_stmt).collect()
    }

    #[test]
    fn nested_expression() {
        assert_eq!(render("-123 * (45.67);"), vec!["(; (* (- 123) (group 45.67)))"]);
    }

    #[test]
    fn precedence_is_visible() {
        assert_eq!(render("print 1 + 2 * 3;"), vec!["(print (+ 1 (* 2 3)))"]);
        assert_eq!(render("1 - 2 - 3;"), vec!["(; (- (- 1 2) 3))"]);
    }

    #[test]
    fn declarations_and_blocks() {
        assert_eq!(
            render("var a = \"x\"; { var b; a = b = nil; }"),
            vec!["(var a \"x\")", "(block (var b) (; (= a (= b nil))))"]
        );
    }
}
