//! Expression parsing.
//!
//! General expressions (ROW, EVAL, STATS, SORT and call arguments) and WHERE
//! conditions share the value and arithmetic layers but have separate
//! boolean layers. Only WHERE conditions accept `IN`, `IS NULL`, `LIKE`,
//! `RLIKE` and WHERE-only function tests.

use super::error::ParseError;
use super::parser::{identifier_from_token, Parser};
use super::pratt::{
    arith_binding_power, boolean_binding_power, token_to_arith_op, token_to_sign,
    where_binding_power, ARITH_OPERATORS, PREDICATE_OPERATORS, PRIMARY_START,
};
use crate::ast::{
    Arith, ComparisonOp, DateLiteral, Expr, FnArg, FunctionCall, MathArg, NullsOrder, OrderExpr,
    Primary, RegexKind, SortDirection, Value, WhereExpr,
};
use crate::config::CallForm;
use crate::lexer::TokenKind;

impl Parser<'_> {
    /// Parses exactly one general expression.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input is not a single expression.
    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression_inner()?;
        self.expect_eof()?;
        Ok(expr)
    }

    /// Parses exactly one WHERE condition.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input is not a single condition.
    pub fn parse_where_expression(&mut self) -> Result<WhereExpr, ParseError> {
        let expr = self.parse_where_expression_inner()?;
        self.expect_eof()?;
        Ok(expr)
    }

    /// Parses exactly one SORT key.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input is not a single sort key.
    pub fn parse_order_expression(&mut self) -> Result<OrderExpr, ParseError> {
        let order = self.parse_order_expression_inner()?;
        self.expect_eof()?;
        Ok(order)
    }

    /// Parses `expr [ASC|DESC] [NULLS FIRST|LAST]`.
    pub(super) fn parse_order_expression_inner(&mut self) -> Result<OrderExpr, ParseError> {
        let start = self.current.span.start;
        let expr = self.parse_expression_inner()?;
        let direction = if self.check(TokenKind::OrderDirection) {
            let direction = if self.current.text_eq_ignore_case("asc") {
                SortDirection::Asc
            } else {
                SortDirection::Desc
            };
            self.advance();
            Some(direction)
        } else {
            None
        };
        let nulls = if self.eat(TokenKind::Nulls) {
            let token = self.expect(TokenKind::NullsDirection)?;
            Some(if token.text_eq_ignore_case("first") {
                NullsOrder::First
            } else {
                NullsOrder::Last
            })
        } else {
            None
        };
        Ok(OrderExpr {
            expr,
            direction,
            nulls,
            span: self.span_from(start),
        })
    }

    // --- General expressions ---

    pub(super) fn parse_expression_inner(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        let expr = self.parse_boolean_expr(0);
        self.leave();
        expr
    }

    fn parse_boolean_expr(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_not_expr()?;

        loop {
            self.note_expected(&[TokenKind::And, TokenKind::Or]);
            let op = self.current.kind;
            let Some(bp) = boolean_binding_power(op) else {
                break;
            };
            if bp < min_bp {
                break;
            }
            self.charge_operator()?;
            self.advance();
            let rhs = self.parse_boolean_expr(bp + 1)?;
            lhs = if op == TokenKind::Or {
                lhs.or(rhs)
            } else {
                lhs.and(rhs)
            };
        }

        Ok(lhs)
    }

    fn parse_not_expr(&mut self) -> Result<Expr, ParseError> {
        if self.eat(TokenKind::Not) {
            self.enter()?;
            let inner = self.parse_not_expr();
            self.leave();
            return Ok(inner?.not());
        }
        Ok(Expr::Value(self.parse_value()?))
    }

    /// Parses `arith [comparison arith]`.
    pub(super) fn parse_value(&mut self) -> Result<Value, ParseError> {
        let left = self.parse_arith(0)?;
        self.finish_value(left)
    }

    fn finish_value(&mut self, left: Arith) -> Result<Value, ParseError> {
        if !self.check(TokenKind::ComparisonOp) {
            return Ok(Value::Arith(left));
        }
        let Some(op) = ComparisonOp::from_symbol(&self.current.text) else {
            return Err(ParseError::invalid(
                &self.current,
                format!("unknown comparison operator `{}`", self.current.text),
            ));
        };
        self.advance();
        let right = self.parse_arith(0)?;
        Ok(Value::compare(op, left, right))
    }

    fn parse_arith(&mut self, min_bp: u8) -> Result<Arith, ParseError> {
        let lhs = self.parse_unary()?;
        self.continue_arith(lhs, min_bp)
    }

    /// Extends `lhs` with operators binding at least as tight as `min_bp`.
    fn continue_arith(&mut self, mut lhs: Arith, min_bp: u8) -> Result<Arith, ParseError> {
        loop {
            self.note_expected(ARITH_OPERATORS);
            let kind = self.current.kind;
            let (Some(bp), Some(op)) = (arith_binding_power(kind), token_to_arith_op(kind)) else {
                break;
            };
            if bp < min_bp {
                break;
            }
            self.charge_operator()?;
            self.advance();
            let rhs = self.parse_arith(bp + 1)?;
            lhs = lhs.binary(op, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Arith, ParseError> {
        let Some(op) = token_to_sign(self.current.kind) else {
            self.note_expected(&[TokenKind::Plus, TokenKind::Minus]);
            return self.parse_arith_atom();
        };
        self.advance();
        self.enter()?;
        let operand = self.parse_unary();
        self.leave();
        Ok(Arith::Unary {
            op,
            operand: Box::new(operand?),
        })
    }

    /// An operand of arithmetic: a restricted call or a primary.
    fn parse_arith_atom(&mut self) -> Result<Arith, ParseError> {
        if self.current.kind.is_identifier() && self.peek_kind(1) == TokenKind::LeftParen {
            let name = identifier_from_token(&self.current);
            match self.config.functions.classify(&name.name) {
                Some(CallForm::Simple) => return self.parse_math_call(),
                Some(CallForm::Math) => return self.parse_math_eval_call(),
                Some(CallForm::Where) => {
                    return Err(ParseError::invalid(
                        &self.current,
                        format!("`{}` can only be used as a WHERE condition", name.name),
                    ));
                }
                None => {}
            }
        }
        Ok(Arith::Primary(self.parse_primary()?))
    }

    /// Parses `name(arg, ...)` where each argument is a name, string or number.
    fn parse_math_call(&mut self) -> Result<Arith, ParseError> {
        let name = self.parse_identifier()?;
        self.expect(TokenKind::LeftParen)?;
        let args = if self.check(TokenKind::RightParen) {
            vec![]
        } else {
            self.parse_comma_list(Self::parse_fn_arg)?
        };
        self.expect(TokenKind::RightParen)?;
        Ok(Arith::MathCall { name, args })
    }

    /// Parses `name(value, ...)` for math/eval functions.
    fn parse_math_eval_call(&mut self) -> Result<Arith, ParseError> {
        let name = self.parse_identifier()?;
        self.expect(TokenKind::LeftParen)?;
        let args = if self.check(TokenKind::RightParen) {
            vec![]
        } else {
            self.enter()?;
            let args = self.parse_comma_list(|p| Ok(MathArg::from(p.parse_value()?)));
            self.leave();
            args?
        };
        self.expect(TokenKind::RightParen)?;
        Ok(Arith::MathEvalCall { name, args })
    }

    fn parse_fn_arg(&mut self) -> Result<FnArg, ParseError> {
        match self.current.kind {
            kind if kind.is_identifier() || kind == TokenKind::Star => {
                Ok(FnArg::Name(self.parse_qualified_name_inner()?))
            }
            TokenKind::String => Ok(FnArg::String(self.parse_string_literal()?)),
            TokenKind::Integer | TokenKind::Decimal => Ok(FnArg::Number(self.parse_number()?)),
            _ => {
                self.note_expected(&[
                    TokenKind::Identifier,
                    TokenKind::QuotedIdentifier,
                    TokenKind::Star,
                    TokenKind::String,
                    TokenKind::Integer,
                    TokenKind::Decimal,
                ]);
                Err(self.error())
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Primary, ParseError> {
        let kind = self.current.kind;
        match kind {
            TokenKind::Integer | TokenKind::Decimal => {
                let number = self.parse_number()?;
                if self.check(TokenKind::DateUnit) {
                    let unit = self.current.text.to_ascii_lowercase();
                    self.advance();
                    return Ok(Primary::Date(DateLiteral {
                        quantity: number,
                        unit,
                    }));
                }
                Ok(Primary::Constant(number.into()))
            }
            TokenKind::Null
            | TokenKind::Param
            | TokenKind::Boolean
            | TokenKind::String
            | TokenKind::LeftBracket => Ok(Primary::Constant(self.parse_constant()?)),
            TokenKind::LeftParen => {
                // Entered before advancing so a depth error points at the `(`
                self.enter()?;
                self.advance();
                let expr = self.parse_boolean_expr(0);
                self.leave();
                let expr = expr?;
                self.expect(TokenKind::RightParen)?;
                Ok(Primary::Paren(Box::new(expr)))
            }
            kind if kind.is_identifier() && self.peek_kind(1) == TokenKind::LeftParen => {
                Ok(Primary::Call(self.parse_function_call()?))
            }
            kind if kind.is_identifier() || kind == TokenKind::Star => {
                Ok(Primary::Name(self.parse_qualified_name_inner()?))
            }
            _ => {
                self.note_expected(PRIMARY_START);
                Err(self.error())
            }
        }
    }

    /// Parses `name([expr, ...])` for functions outside the restricted tables.
    fn parse_function_call(&mut self) -> Result<FunctionCall, ParseError> {
        let name = self.parse_identifier()?;
        self.expect(TokenKind::LeftParen)?;
        let args = if self.check(TokenKind::RightParen) {
            vec![]
        } else {
            self.parse_comma_list(Self::parse_expression_inner)?
        };
        self.expect(TokenKind::RightParen)?;
        Ok(FunctionCall { name, args })
    }

    // --- WHERE conditions ---

    pub(super) fn parse_where_expression_inner(&mut self) -> Result<WhereExpr, ParseError> {
        self.enter()?;
        let expr = self.parse_where_boolean(0);
        self.leave();
        expr
    }

    fn parse_where_boolean(&mut self, min_bp: u8) -> Result<WhereExpr, ParseError> {
        let mut lhs = self.parse_where_not()?;

        loop {
            self.note_expected(&[TokenKind::And, TokenKind::Or]);
            let op = self.current.kind;
            let Some(bp) = where_binding_power(op) else {
                break;
            };
            if bp < min_bp {
                break;
            }
            self.charge_operator()?;
            self.advance();
            let rhs = Box::new(self.parse_where_boolean(bp + 1)?);
            lhs = if op == TokenKind::Or {
                WhereExpr::Or(Box::new(lhs), rhs)
            } else {
                WhereExpr::And(Box::new(lhs), rhs)
            };
        }

        Ok(lhs)
    }

    fn parse_where_not(&mut self) -> Result<WhereExpr, ParseError> {
        if !self.check(TokenKind::Not) {
            return self.parse_where_atom();
        }
        // `NOT cidr_match(...)` negates the test itself
        if self.at_where_function(1) {
            self.advance();
            return self.parse_function_test(true);
        }
        self.advance();
        self.enter()?;
        let inner = self.parse_where_not();
        self.leave();
        Ok(WhereExpr::Not(Box::new(inner?)))
    }

    fn parse_where_atom(&mut self) -> Result<WhereExpr, ParseError> {
        if self.at_where_function(0) {
            return self.parse_function_test(false);
        }
        if self.check(TokenKind::LeftParen) {
            return self.parse_where_group();
        }
        let value = self.parse_value()?;
        self.parse_predicate(value)
    }

    /// Parses a parenthesized condition.
    ///
    /// `(a + 1) * 2 > 3` starts the same way as `(a > 1 AND b)`, so the group
    /// is parsed as a condition first. If an operator follows and the group
    /// holds no WHERE-only form, it becomes the leading operand of a value.
    fn parse_where_group(&mut self) -> Result<WhereExpr, ParseError> {
        self.advance();
        let inner = self.parse_where_expression_inner()?;
        self.expect(TokenKind::RightParen)?;

        if !self.continues_value() {
            return Ok(inner);
        }
        let Some(expr) = inner.clone().into_expr() else {
            return Ok(inner);
        };
        let seed = Arith::Primary(Primary::Paren(Box::new(expr)));
        let arith = self.continue_arith(seed, 0)?;
        let value = self.finish_value(arith)?;
        self.parse_predicate(value)
    }

    /// Checks if the current token can extend a value into a longer predicate.
    fn continues_value(&mut self) -> bool {
        self.check_any(ARITH_OPERATORS)
            || self.check(TokenKind::ComparisonOp)
            || self.check_any(PREDICATE_OPERATORS)
    }

    /// Parses the optional predicate suffix after a value.
    fn parse_predicate(&mut self, expr: Value) -> Result<WhereExpr, ParseError> {
        let negated = self.eat(TokenKind::Not);

        if self.eat(TokenKind::In) {
            self.expect(TokenKind::LeftParen)?;
            let list = self.parse_comma_list(Self::parse_value)?;
            self.expect(TokenKind::RightParen)?;
            return Ok(WhereExpr::InList {
                expr,
                list,
                negated,
            });
        }
        if !negated && self.eat(TokenKind::Is) {
            let negated = self.eat(TokenKind::Not);
            self.expect(TokenKind::Null)?;
            return Ok(WhereExpr::IsNull { expr, negated });
        }
        if self.check_any(&[TokenKind::Like, TokenKind::Rlike]) {
            let kind = if self.current.kind == TokenKind::Like {
                RegexKind::Like
            } else {
                RegexKind::Rlike
            };
            self.advance();
            let pattern = self.parse_string_literal()?;
            return Ok(WhereExpr::RegexMatch {
                expr,
                kind,
                pattern,
                negated,
            });
        }
        if negated {
            return Err(self.error());
        }
        Ok(WhereExpr::Value(expr))
    }

    /// Parses `name(field [, arg ...])` for a WHERE-only function.
    fn parse_function_test(&mut self, negated: bool) -> Result<WhereExpr, ParseError> {
        let name = self.parse_identifier()?;
        self.expect(TokenKind::LeftParen)?;
        let target = self.parse_qualified_name_inner()?;
        let mut args = Vec::new();
        while self.eat(TokenKind::Comma) {
            args.push(self.parse_fn_arg()?);
        }
        self.expect(TokenKind::RightParen)?;
        Ok(WhereExpr::FunctionTest {
            name,
            target,
            args,
            negated,
        })
    }

    /// Checks if the token `n` ahead starts a call to a WHERE-only function.
    fn at_where_function(&mut self, n: usize) -> bool {
        let token = self.peek_token(n);
        if !token.kind.is_identifier() {
            return false;
        }
        let name = identifier_from_token(token);
        self.peek_kind(n + 1) == TokenKind::LeftParen
            && self.config.functions.classify(&name.name) == Some(CallForm::Where)
    }
}
