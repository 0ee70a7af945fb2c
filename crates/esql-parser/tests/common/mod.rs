#![allow(dead_code)]

use esql_parser::ast::{Arith, Command, Expr, Value, WhereExpr};
use esql_parser::{ParseError, Parser, ParserConfig, Query};

pub fn parse(query: &str) -> Query {
    esql_parser::parse(query).unwrap_or_else(|e| panic!("Failed to parse: {query}\nError: {e:?}"))
}

pub fn parse_err(query: &str) -> ParseError {
    esql_parser::parse(query).expect_err(&format!("Expected parse error for: {query}"))
}

pub fn parse_with(query: &str, config: &ParserConfig) -> Result<Query, ParseError> {
    esql_parser::parse_with_config(query, config)
}

/// Parses `query` and returns its command at `index`.
pub fn command(query: &str, index: usize) -> Command {
    let mut parsed = parse(query);
    assert!(
        index < parsed.commands.len(),
        "Query has only {} commands: {query}",
        parsed.commands.len()
    );
    parsed.commands.swap_remove(index)
}

pub fn expr(input: &str) -> Expr {
    Parser::new(input)
        .parse_expression()
        .unwrap_or_else(|e| panic!("Failed to parse expression: {input}\nError: {e:?}"))
}

pub fn condition(input: &str) -> WhereExpr {
    Parser::new(input)
        .parse_where_expression()
        .unwrap_or_else(|e| panic!("Failed to parse condition: {input}\nError: {e:?}"))
}

/// Renders an expression as a fully parenthesized prefix form, ignoring spans.
pub fn sexpr(expr: &Expr) -> String {
    match expr {
        Expr::Or(left, right) => format!("(or {} {})", sexpr(left), sexpr(right)),
        Expr::And(left, right) => format!("(and {} {})", sexpr(left), sexpr(right)),
        Expr::Not(inner) => format!("(not {})", sexpr(inner)),
        Expr::Value(value) => value_sexpr(value),
    }
}

pub fn where_sexpr(expr: &WhereExpr) -> String {
    match expr {
        WhereExpr::Or(left, right) => format!("(or {} {})", where_sexpr(left), where_sexpr(right)),
        WhereExpr::And(left, right) => {
            format!("(and {} {})", where_sexpr(left), where_sexpr(right))
        }
        WhereExpr::Not(inner) => format!("(not {})", where_sexpr(inner)),
        WhereExpr::Value(value) => value_sexpr(value),
        other => format!("[{other}]"),
    }
}

pub fn value_sexpr(value: &Value) -> String {
    match value {
        Value::Comparison(c) => format!(
            "({} {} {})",
            c.op.as_str(),
            arith_sexpr(&c.left),
            arith_sexpr(&c.right)
        ),
        Value::Arith(arith) => arith_sexpr(arith),
    }
}

pub fn arith_sexpr(arith: &Arith) -> String {
    match arith {
        Arith::Binary { left, op, right } => format!(
            "({} {} {})",
            op.as_str(),
            arith_sexpr(left),
            arith_sexpr(right)
        ),
        Arith::Unary { op, operand } => format!("({} {})", op.as_str(), arith_sexpr(operand)),
        other => other.to_string(),
    }
}

/// Verifies that `to_string()` produces a fixed point:
/// parse(query).to_string() can be re-parsed and yields the same
/// string again.
pub fn round_trip(query: &str) {
    let ast1 = parse(query);
    let rendered1 = ast1.to_string();
    let ast2 = parse(&rendered1);
    let rendered2 = ast2.to_string();
    assert_eq!(
        rendered1, rendered2,
        "Round-trip failed.\n  Input:    {query}\n  First:    {rendered1}\n  Second:   {rendered2}"
    );
}

/// Re-parses every command from its own span and compares it to the original.
pub fn assert_command_spans(query: &str) {
    let config = ParserConfig::default();
    let parsed = parse(query);
    for command in &parsed.commands {
        let reparsed = Parser::with_range(query, command.span(), &config)
            .parse_command()
            .unwrap_or_else(|e| {
                panic!(
                    "Failed to re-parse {:?} from {query}\nError: {e:?}",
                    command.span().slice(query)
                )
            });
        assert_eq!(&reparsed, command, "Span re-parse differs for: {query}");
    }
}
