//! Recursive-descent parser producing the syntax tree in [`super::ast`].

use super::ast::{
    BinaryOp, CatchClause, DeclKind, Expr, FunctionBody, FunctionDef, LogicalOp, Param, Stmt,
    UnaryOp,
};
use super::lexer::{Lexer, Spanned, Token};
use super::value::number_to_string;
use super::ExecutionError;
use std::rc::Rc;

type ParseResult<T> = Result<T, ExecutionError>;

/// Deepest statement, expression or template nesting accepted
pub(super) const MAX_NESTING: usize = 200;

const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "default", "delete", "do", "else",
    "false", "finally", "for", "function", "if", "in", "instanceof", "let", "new", "null",
    "return", "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while",
];

/// Parse a whole program
pub fn parse_program(source: &str) -> ParseResult<Vec<Stmt>> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser::new(tokens);
    let mut program = Vec::new();
    while !parser.at_eof() {
        program.push(parser.parse_statement()?);
    }
    Ok(program)
}

pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned>) -> Self {
        Self::with_depth(tokens, 0)
    }

    /// Parser for a fragment found `depth` levels inside another parse
    fn with_depth(tokens: Vec<Spanned>, depth: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            depth,
        }
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .or_else(|| self.tokens.last())
            .map(|s| &s.token)
            .unwrap_or(&Token::Eof)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |s| s.line)
    }

    /// Whether a line break separates the current token from the previous one
    fn newline_before(&self) -> bool {
        self.pos > 0
            && self
                .tokens
                .get(self.pos - 1)
                .is_some_and(|prev| prev.line < self.line())
    }

    fn at_eof(&self) -> bool {
        *self.peek() == Token::Eof
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn is_punct(&self, punct: &str) -> bool {
        matches!(self.peek(), Token::Punct(p) if *p == punct)
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        let found = self.is_punct(punct);
        if found {
            self.pos += 1;
        }
        found
    }

    fn expect_punct(&mut self, punct: &str) -> ParseResult<()> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn is_keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Token::Ident(w) if w == word)
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        let found = self.is_keyword(word);
        if found {
            self.pos += 1;
        }
        found
    }

    /// A binding name: an identifier that is not reserved
    fn expect_ident(&mut self) -> ParseResult<Rc<str>> {
        match self.peek() {
            Token::Ident(name) if !RESERVED.contains(&name.as_str()) => {
                let name = Rc::from(name.as_str());
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// A property name after `.`, where reserved words are allowed
    fn expect_property_name(&mut self) -> ParseResult<Rc<str>> {
        match self.advance() {
            Token::Ident(name) => Ok(Rc::from(name.as_str())),
            _ => {
                self.pos -= 1;
                Err(self.unexpected())
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> ExecutionError {
        ExecutionError::Syntax {
            message: message.into(),
            line: self.line(),
        }
    }

    fn unexpected(&self) -> ExecutionError {
        match self.peek() {
            Token::Eof => self.error("Unexpected end of input"),
            Token::Number(n) => self.error(format!("Unexpected number {}", number_to_string(*n))),
            Token::Str(_) | Token::Template { .. } => self.error("Unexpected string"),
            Token::Ident(name) => self.error(format!("Unexpected token '{}'", name)),
            Token::Punct(p) => self.error(format!("Unexpected token '{}'", p)),
        }
    }

    fn consume_semicolon(&mut self) -> ParseResult<()> {
        if self.eat_punct(";") || self.is_punct("}") || self.at_eof() || self.newline_before() {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("Program is nested too deeply"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // =========================================================================
    // Statements
    // =========================================================================

    pub fn parse_statement(&mut self) -> ParseResult<Stmt> {
        self.nested(Self::statement)
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        if self.eat_punct(";") {
            return Ok(Stmt::Empty);
        }
        if self.is_punct("{") {
            return Ok(Stmt::Block(self.parse_block()?));
        }

        let word = match self.peek() {
            Token::Ident(word) => word.clone(),
            _ => return self.expression_statement(),
        };

        match word.as_str() {
            "let" | "const" | "var" => {
                let stmt = self.declaration()?;
                self.consume_semicolon()?;
                Ok(stmt)
            }
            "function" => {
                self.pos += 1;
                let name = self.expect_ident()?;
                let def = self.function_rest(Some(name))?;
                Ok(Stmt::Function(Rc::new(def)))
            }
            "return" => {
                self.pos += 1;
                let value = if self.is_punct(";")
                    || self.is_punct("}")
                    || self.at_eof()
                    || self.newline_before()
                {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume_semicolon()?;
                Ok(Stmt::Return(value))
            }
            "if" => {
                self.pos += 1;
                self.expect_punct("(")?;
                let test = self.parse_expression()?;
                self.expect_punct(")")?;
                let consequent = Box::new(self.parse_statement()?);
                let alternate = if self.eat_keyword("else") {
                    Some(Box::new(self.parse_statement()?))
                } else {
                    None
                };
                Ok(Stmt::If(test, consequent, alternate))
            }
            "while" => {
                self.pos += 1;
                self.expect_punct("(")?;
                let test = self.parse_expression()?;
                self.expect_punct(")")?;
                Ok(Stmt::While(test, Box::new(self.parse_statement()?)))
            }
            "do" => {
                self.pos += 1;
                let body = Box::new(self.parse_statement()?);
                if !self.eat_keyword("while") {
                    return Err(self.unexpected());
                }
                self.expect_punct("(")?;
                let test = self.parse_expression()?;
                self.expect_punct(")")?;
                self.eat_punct(";");
                Ok(Stmt::DoWhile(body, test))
            }
            "for" => self.for_statement(),
            "break" => {
                self.pos += 1;
                self.consume_semicolon()?;
                Ok(Stmt::Break)
            }
            "continue" => {
                self.pos += 1;
                self.consume_semicolon()?;
                Ok(Stmt::Continue)
            }
            "throw" => {
                self.pos += 1;
                if self.newline_before() {
                    return Err(self.error("Illegal newline after throw"));
                }
                let value = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Stmt::Throw(value))
            }
            "try" => self.try_statement(),
            "class" | "switch" | "case" | "default" => {
                Err(self.error(format!("'{}' is not supported", word)))
            }
            _ => self.expression_statement(),
        }
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(Stmt::Expr(expr))
    }

    fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect_punct("{")?;
        let mut body = Vec::new();
        while !self.eat_punct("}") {
            if self.at_eof() {
                return Err(self.unexpected());
            }
            body.push(self.parse_statement()?);
        }
        Ok(body)
    }

    fn decl_kind(&mut self) -> Option<DeclKind> {
        let kind = match self.peek() {
            Token::Ident(w) if w == "let" => DeclKind::Let,
            Token::Ident(w) if w == "const" => DeclKind::Const,
            Token::Ident(w) if w == "var" => DeclKind::Var,
            _ => return None,
        };
        self.pos += 1;
        Some(kind)
    }

    fn declaration(&mut self) -> ParseResult<Stmt> {
        let kind = self.decl_kind().ok_or_else(|| self.unexpected())?;
        let first = self.expect_ident()?;
        self.declarators(kind, first)
    }

    fn declarators(&mut self, kind: DeclKind, first: Rc<str>) -> ParseResult<Stmt> {
        let mut decls = Vec::new();
        let mut name = first;
        loop {
            let init = if self.eat_punct("=") {
                Some(self.parse_assignment()?)
            } else if kind == DeclKind::Const {
                return Err(self.error("Missing initializer in const declaration"));
            } else {
                None
            };
            decls.push((name, init));

            if !self.eat_punct(",") {
                return Ok(Stmt::Declare { kind, decls });
            }
            name = self.expect_ident()?;
        }
    }

    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.pos += 1;
        self.expect_punct("(")?;

        let init = if self.eat_punct(";") {
            None
        } else if let Some(kind) = self.decl_kind() {
            let name = self.expect_ident()?;
            let keys = self.is_keyword("in");
            if keys || self.is_keyword("of") {
                self.pos += 1;
                let iterable = self.parse_expression()?;
                self.expect_punct(")")?;
                let body = Box::new(self.parse_statement()?);
                return Ok(Stmt::ForEach {
                    kind,
                    name,
                    keys,
                    iterable,
                    body,
                });
            }
            let decl = self.declarators(kind, name)?;
            self.expect_punct(";")?;
            Some(Box::new(decl))
        } else {
            let expr = self.parse_expression()?;
            self.expect_punct(";")?;
            Some(Box::new(Stmt::Expr(expr)))
        };

        let test = if self.is_punct(";") {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_punct(";")?;

        let update = if self.is_punct(")") {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_punct(")")?;

        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::For {
            init,
            test,
            update,
            body,
        })
    }

    fn try_statement(&mut self) -> ParseResult<Stmt> {
        self.pos += 1;
        let block = self.parse_block()?;

        let handler = if self.eat_keyword("catch") {
            let param = if self.eat_punct("(") {
                let name = self.expect_ident()?;
                self.expect_punct(")")?;
                Some(name)
            } else {
                None
            };
            Some(CatchClause {
                param,
                body: self.parse_block()?,
            })
        } else {
            None
        };

        let finalizer = if self.eat_keyword("finally") {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        }
        Ok(Stmt::Try {
            block,
            handler,
            finalizer,
        })
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Parameter list and block body, after the name
    fn function_rest(&mut self, name: Option<Rc<str>>) -> ParseResult<FunctionDef> {
        self.expect_punct("(")?;
        let params = self.params()?;
        let body = FunctionBody::Block(self.parse_block()?);
        Ok(FunctionDef {
            name,
            params,
            body,
            arrow: false,
        })
    }

    /// Parameters up to and including the closing parenthesis
    fn params(&mut self) -> ParseResult<Vec<Param>> {
        let mut params = Vec::new();
        while !self.eat_punct(")") {
            let name = self.expect_ident()?;
            let default = if self.eat_punct("=") {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            params.push(Param { name, default });
            if !self.is_punct(")") {
                self.expect_punct(",")?;
            }
        }
        Ok(params)
    }

    fn arrow_ahead(&self) -> bool {
        match self.peek() {
            Token::Ident(name) if !RESERVED.contains(&name.as_str()) => {
                matches!(self.peek_at(1), Token::Punct("=>"))
            }
            Token::Punct("(") => {
                let mut depth = 0usize;
                let mut offset = 0;
                loop {
                    match self.peek_at(offset) {
                        Token::Punct("(") => depth += 1,
                        Token::Punct(")") => {
                            depth -= 1;
                            if depth == 0 {
                                return matches!(self.peek_at(offset + 1), Token::Punct("=>"));
                            }
                        }
                        Token::Eof => return false,
                        _ => {}
                    }
                    offset += 1;
                }
            }
            _ => false,
        }
    }

    fn arrow_function(&mut self) -> ParseResult<Expr> {
        let params = if self.eat_punct("(") {
            self.params()?
        } else {
            vec![Param {
                name: self.expect_ident()?,
                default: None,
            }]
        };
        self.expect_punct("=>")?;

        let body = if self.is_punct("{") {
            FunctionBody::Block(self.parse_block()?)
        } else {
            FunctionBody::Expr(self.parse_assignment()?)
        };
        Ok(Expr::Function(Rc::new(FunctionDef {
            name: None,
            params,
            body,
            arrow: true,
        })))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        let first = self.parse_assignment()?;
        if !self.is_punct(",") {
            return Ok(first);
        }
        let mut exprs = vec![first];
        while self.eat_punct(",") {
            exprs.push(self.parse_assignment()?);
        }
        Ok(Expr::Sequence(exprs))
    }

    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        self.nested(Self::assignment)
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        if self.arrow_ahead() {
            return self.arrow_function();
        }

        let target = self.conditional()?;
        let op = match self.peek() {
            Token::Punct("=") => None,
            Token::Punct(p) => match BinaryOp::from_assign(p) {
                Some(op) => Some(op),
                None => return Ok(target),
            },
            _ => return Ok(target),
        };

        if !is_assignable(&target) {
            return Err(self.error("Invalid left-hand side in assignment"));
        }
        self.pos += 1;
        let value = self.parse_assignment()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn conditional(&mut self) -> ParseResult<Expr> {
        let test = self.binary(1)?;
        if !self.eat_punct("?") {
            return Ok(test);
        }
        let consequent = self.parse_assignment()?;
        self.expect_punct(":")?;
        let alternate = self.parse_assignment()?;
        Ok(Expr::Conditional(
            Box::new(test),
            Box::new(consequent),
            Box::new(alternate),
        ))
    }

    fn binary(&mut self, min_precedence: u8) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let Token::Punct(punct) = *self.peek() else {
                break;
            };
            let (precedence, logical) = match punct {
                "??" => (1, Some(LogicalOp::Nullish)),
                "||" => (1, Some(LogicalOp::Or)),
                "&&" => (2, Some(LogicalOp::And)),
                _ => match BinaryOp::from_punct(punct) {
                    Some(op) => (op.precedence(), None),
                    None => break,
                },
            };
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;

            // `**` is right-associative
            let next_min = if punct == "**" {
                precedence
            } else {
                precedence + 1
            };
            let right = self.binary(next_min)?;

            left = match (logical, BinaryOp::from_punct(punct)) {
                (Some(op), _) => Expr::Logical(op, Box::new(left), Box::new(right)),
                (None, Some(op)) => Expr::Binary(op, Box::new(left), Box::new(right)),
                (None, None) => break,
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        self.nested(Self::unary)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek() {
            Token::Punct("!") => Some(UnaryOp::Not),
            Token::Punct("-") => Some(UnaryOp::Neg),
            Token::Punct("+") => Some(UnaryOp::Plus),
            Token::Punct("~") => Some(UnaryOp::BitNot),
            Token::Ident(w) if w == "typeof" => Some(UnaryOp::TypeOf),
            Token::Ident(w) if w == "void" => Some(UnaryOp::Void),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary(op, Box::new(operand)));
        }

        if self.is_punct("++") || self.is_punct("--") {
            let increment = self.is_punct("++");
            self.pos += 1;
            let target = self.parse_unary()?;
            if !is_assignable(&target) {
                return Err(self.error("Invalid left-hand side expression in prefix operation"));
            }
            return Ok(Expr::Update {
                increment,
                prefix: true,
                target: Box::new(target),
            });
        }

        let expr = self.call_member()?;
        if (self.is_punct("++") || self.is_punct("--")) && !self.newline_before() {
            if !is_assignable(&expr) {
                return Err(self.error("Invalid left-hand side expression in postfix operation"));
            }
            let increment = self.is_punct("++");
            self.pos += 1;
            return Ok(Expr::Update {
                increment,
                prefix: false,
                target: Box::new(expr),
            });
        }
        Ok(expr)
    }

    fn call_member(&mut self) -> ParseResult<Expr> {
        let mut expr = if self.eat_keyword("new") {
            self.new_expression()?
        } else {
            self.primary()?
        };

        loop {
            if self.eat_punct(".") {
                expr = member(expr, Expr::Str(self.expect_property_name()?), false);
            } else if self.eat_punct("?.") {
                if self.eat_punct("[") {
                    let property = self.parse_expression()?;
                    self.expect_punct("]")?;
                    expr = member(expr, property, true);
                } else if self.is_punct("(") {
                    return Err(self.error("Optional calls are not supported"));
                } else {
                    expr = member(expr, Expr::Str(self.expect_property_name()?), true);
                }
            } else if self.eat_punct("[") {
                let property = self.parse_expression()?;
                self.expect_punct("]")?;
                expr = member(expr, property, false);
            } else if self.eat_punct("(") {
                let args = self.arguments()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn new_expression(&mut self) -> ParseResult<Expr> {
        let mut callee = self.primary()?;
        loop {
            if self.eat_punct(".") {
                callee = member(callee, Expr::Str(self.expect_property_name()?), false);
            } else if self.eat_punct("[") {
                let property = self.parse_expression()?;
                self.expect_punct("]")?;
                callee = member(callee, property, false);
            } else {
                break;
            }
        }
        let args = if self.eat_punct("(") {
            self.arguments()?
        } else {
            Vec::new()
        };
        Ok(Expr::New {
            callee: Box::new(callee),
            args,
        })
    }

    /// Call arguments after the opening parenthesis
    fn arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.eat_punct(")") {
            args.push(self.parse_assignment()?);
            if !self.is_punct(")") {
                self.expect_punct(",")?;
            }
        }
        Ok(args)
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let line = self.line();
        match self.advance() {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Str(s) => Ok(Expr::Str(Rc::from(s.as_str()))),
            Token::Template { strings, exprs } => {
                let mut parts = Vec::with_capacity(exprs.len());
                for (source, line) in exprs {
                    parts.push(parse_fragment(&source, line, self.depth + 1)?);
                }
                let strings = strings.iter().map(|s| Rc::from(s.as_str())).collect();
                Ok(Expr::Template(strings, parts))
            }
            Token::Ident(word) => match word.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                "null" => Ok(Expr::Null),
                "undefined" => Ok(Expr::Undefined),
                "this" => Ok(Expr::This),
                "function" => {
                    let name = match self.peek() {
                        Token::Ident(_) => Some(self.expect_ident()?),
                        _ => None,
                    };
                    Ok(Expr::Function(Rc::new(self.function_rest(name)?)))
                }
                w if RESERVED.contains(&w) => {
                    self.pos -= 1;
                    Err(self.unexpected())
                }
                _ => Ok(Expr::Ident(Rc::from(word.as_str()))),
            },
            Token::Punct("(") => {
                let expr = self.parse_expression()?;
                self.expect_punct(")")?;
                Ok(expr)
            }
            Token::Punct("[") => {
                let mut items = Vec::new();
                while !self.eat_punct("]") {
                    items.push(self.parse_assignment()?);
                    if !self.is_punct("]") {
                        self.expect_punct(",")?;
                    }
                }
                Ok(Expr::Array(items))
            }
            Token::Punct("{") => self.object_literal(),
            Token::Eof => Err(ExecutionError::Syntax {
                message: "Unexpected end of input".to_string(),
                line,
            }),
            _ => {
                self.pos -= 1;
                Err(self.unexpected())
            }
        }
    }

    /// Object literal after the opening brace
    fn object_literal(&mut self) -> ParseResult<Expr> {
        let mut props = Vec::new();
        while !self.eat_punct("}") {
            let (key, shorthand) = match self.advance() {
                Token::Ident(name) => (Expr::Str(Rc::from(name.as_str())), Some(name)),
                Token::Str(s) => (Expr::Str(Rc::from(s.as_str())), None),
                Token::Number(n) => (Expr::Str(Rc::from(number_to_string(n).as_str())), None),
                Token::Punct("[") => {
                    let key = self.parse_assignment()?;
                    self.expect_punct("]")?;
                    (key, None)
                }
                _ => {
                    self.pos -= 1;
                    return Err(self.unexpected());
                }
            };

            let value = if self.eat_punct(":") {
                self.parse_assignment()?
            } else if self.is_punct("(") {
                let name = match &key {
                    Expr::Str(s) => Some(s.clone()),
                    _ => None,
                };
                Expr::Function(Rc::new(self.function_rest(name)?))
            } else {
                match shorthand {
                    Some(name) if !RESERVED.contains(&name.as_str()) => {
                        Expr::Ident(Rc::from(name.as_str()))
                    }
                    _ => return Err(self.unexpected()),
                }
            };
            props.push((key, value));

            if !self.is_punct("}") {
                self.expect_punct(",")?;
            }
        }
        Ok(Expr::Object(props))
    }
}

/// Parse the source of a template substitution
fn parse_fragment(source: &str, line: usize, depth: usize) -> ParseResult<Expr> {
    if depth >= MAX_NESTING {
        return Err(ExecutionError::Syntax {
            message: "Program is nested too deeply".to_string(),
            line,
        });
    }
    let tokens = Lexer::starting_at(source, line).tokenize()?;
    let mut parser = Parser::with_depth(tokens, depth);
    let expr = parser.parse_expression()?;
    if !parser.at_eof() {
        return Err(parser.unexpected());
    }
    Ok(expr)
}

fn member(object: Expr, property: Expr, optional: bool) -> Expr {
    Expr::Member {
        object: Box::new(object),
        property: Box::new(property),
        optional,
    }
}

fn is_assignable(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Ident(_)
            | Expr::Member {
                optional: false,
                ..
            }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(source: &str) -> Expr {
        match parse_program(source).unwrap().remove(0) {
            Stmt::Expr(e) => e,
            other => panic!("expected expression, got {:?}", other),
        }
    }

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Number(n))
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            expr("1 + 2 * 3"),
            Expr::Binary(
                BinaryOp::Add,
                num(1.0),
                Box::new(Expr::Binary(BinaryOp::Mul, num(2.0), num(3.0)))
            )
        );
    }

    #[test]
    fn test_pow_is_right_associative() {
        assert_eq!(
            expr("2 ** 3 ** 2"),
            Expr::Binary(
                BinaryOp::Pow,
                num(2.0),
                Box::new(Expr::Binary(BinaryOp::Pow, num(3.0), num(2.0)))
            )
        );
    }

    #[test]
    fn test_arrow_functions() {
        let Expr::Function(def) = expr("(a, b = 2) => a + b") else {
            panic!("not a function");
        };
        assert!(def.arrow);
        assert_eq!(def.params.len(), 2);
        assert!(def.params[1].default.is_some());
        assert!(matches!(def.body, FunctionBody::Expr(_)));

        let Expr::Function(def) = expr("x => { return x; }") else {
            panic!("not a function");
        };
        assert!(matches!(def.body, FunctionBody::Block(_)));
    }

    #[test]
    fn test_parenthesized_is_not_arrow() {
        assert!(matches!(expr("(a + b) * c"), Expr::Binary(BinaryOp::Mul, _, _)));
    }

    #[test]
    fn test_statements_without_semicolons() {
        let program = parse_program("let a = 1\nconst b = 2\nconsole.log(a + b)").unwrap();
        assert_eq!(program.len(), 3);
        assert!(parse_program("let a = 1 let b = 2").is_err());
    }

    #[test]
    fn test_return_before_newline() {
        let program = parse_program("function f() {\n  return\n  1\n}").unwrap();
        let Stmt::Function(def) = &program[0] else {
            panic!("not a function");
        };
        let FunctionBody::Block(body) = &def.body else {
            panic!("not a block");
        };
        assert_eq!(body[0], Stmt::Return(None));
    }

    #[test]
    fn test_for_forms() {
        let program = parse_program(
            "for (let i = 0; i < 3; i++) {}\nfor (const x of xs) {}\nfor (let k in o) {}\nfor (;;) break;",
        )
        .unwrap();
        assert!(matches!(program[0], Stmt::For { .. }));
        assert!(matches!(program[1], Stmt::ForEach { keys: false, .. }));
        assert!(matches!(program[2], Stmt::ForEach { keys: true, .. }));
        assert!(matches!(program[3], Stmt::For { test: None, .. }));
    }

    #[test]
    fn test_object_literal_forms() {
        let Expr::Object(props) = expr("({ a: 1, 'b': 2, 3: 4, [k]: 5, c, m() { return 1 } })")
        else {
            panic!("not an object");
        };
        assert_eq!(props.len(), 6);
        assert_eq!(props[2].0, Expr::Str(Rc::from("3")));
        assert_eq!(props[4].1, Expr::Ident(Rc::from("c")));
        assert!(matches!(props[5].1, Expr::Function(_)));
    }

    #[test]
    fn test_template_substitutions() {
        let Expr::Template(strings, parts) = expr("`a${1 + 1}b${x}`") else {
            panic!("not a template");
        };
        assert_eq!(strings.len(), 3);
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn test_syntax_errors_carry_line() {
        let err = parse_program("let x = 1;\nlet = 2;").unwrap_err();
        assert!(matches!(err, ExecutionError::Syntax { line: 2, .. }));
        assert!(parse_program("const x;").is_err());
        assert!(parse_program("1 = 2").is_err());
        assert!(parse_program("foo(").is_err());
        assert!(parse_program("try {}").is_err());
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let source = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        assert!(parse_program(&source).is_err());
    }

    #[test]
    fn test_template_nesting_counts_toward_depth() {
        // Each level adds a paren group and a template, so the lexer alone never trips
        let level = "(`${";
        let close = "}`)";
        let source = format!("{}1{}", level.repeat(150), close.repeat(150));
        let err = parse_program(&source).unwrap_err();
        assert!(matches!(err, ExecutionError::Syntax { .. }));

        let source = format!("{}1{}", level.repeat(5), close.repeat(5));
        assert!(parse_program(&source).is_ok());
    }
}
