//! Recursive-descent parser for the sandbox's JavaScript subset.

use std::rc::Rc;

use super::ast::{
    ArrayItem, AssignOp, BinaryOp, DeclKind, Expr, Function, FunctionBody, Literal, LogicalOp,
    MemberProperty, PropertyItem, PropertyKey, Stmt, TemplateChunk, UnaryOp,
};
use super::error::{ScriptError, ScriptResult};
use super::lexer::{Lexer, NumberLiteral, Punct, Span, TemplatePart, Token, TokenKind};
use super::value::{exact_key, format_number};

const RESERVED: &[&str] = &[
    "var", "let", "const", "function", "return", "if", "else", "for", "new", "typeof", "this",
    "class", "import", "export", "while", "do", "switch", "case", "break", "continue", "throw",
    "try", "catch", "delete", "void", "in", "of", "instanceof",
];

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(source: &str, max_depth: usize) -> ScriptResult<Self> {
        Self::new_at(source, 0, max_depth)
    }

    fn new_at(source: &str, offset: usize, max_depth: usize) -> ScriptResult<Self> {
        let mut tokens = Lexer::tokenize(source).map_err(|err| shift_error(err, offset))?;
        if offset > 0 {
            for token in &mut tokens {
                token.span = Span::new(token.span.start + offset, token.span.end + offset);
            }
        }
        Ok(Self {
            tokens,
            pos: 0,
            depth: 0,
            max_depth,
        })
    }

    /// Parses a statement list up to end of input.
    pub fn parse_program(mut self) -> ScriptResult<Vec<Stmt>> {
        let mut body = Vec::new();
        while !self.peek().is_eof() {
            body.push(self.statement()?);
        }
        Ok(body)
    }

    /// Parses exactly one expression, tolerating a single trailing `;`.
    pub fn parse_expression(mut self) -> ScriptResult<Expr> {
        let expr = self.assignment()?;
        self.eat_punct(Punct::Semicolon);
        if !self.peek().is_eof() {
            return Err(self.error_here("unexpected trailing input after expression"));
        }
        Ok(expr)
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !token.is_eof() {
            self.pos += 1;
        }
        token
    }

    fn eat_punct(&mut self, punct: Punct) -> bool {
        if self.peek().is_punct(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_ident(&mut self, name: &str) -> bool {
        if self.peek().is_ident(name) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: Punct, what: &str) -> ScriptResult<Span> {
        if self.peek().is_punct(punct) {
            Ok(self.advance().span)
        } else {
            Err(self.error_here(format!("expected {what}")))
        }
    }

    fn expect_binding_name(&mut self) -> ScriptResult<String> {
        let token = self.advance();
        match token.kind {
            TokenKind::Ident(name) if !RESERVED.contains(&name.as_str()) => Ok(name),
            _ => Err(ScriptError::parse(token.span, "expected identifier")),
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::parse(self.peek().span, message)
    }

    fn enter(&mut self) -> ScriptResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ScriptError::DepthLimit(self.max_depth));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn statement(&mut self) -> ScriptResult<Stmt> {
        self.enter()?;
        let stmt = self.statement_inner();
        self.leave();
        stmt
    }

    fn statement_inner(&mut self) -> ScriptResult<Stmt> {
        if self.eat_punct(Punct::Semicolon) {
            return Ok(Stmt::Empty);
        }
        if self.peek().is_punct(Punct::LBrace) && !self.brace_starts_object_literal() {
            return Ok(Stmt::Block(self.block()?));
        }

        let keyword = self.peek().ident().map(str::to_owned);
        match keyword.as_deref() {
            Some("var") => return self.declaration(DeclKind::Var),
            Some("let") => return self.declaration(DeclKind::Let),
            Some("const") => return self.declaration(DeclKind::Const),
            Some("function") if self.peek_at(1).ident().is_some() => {
                self.advance();
                let name = self.expect_binding_name()?;
                let function = self.function_rest()?;
                return Ok(Stmt::Function { name, function });
            }
            Some("return") => {
                self.advance();
                let next = self.peek();
                let bare = next.is_eof()
                    || next.line_break_before
                    || next.is_punct(Punct::Semicolon)
                    || next.is_punct(Punct::RBrace);
                let value = if bare { None } else { Some(self.assignment()?) };
                self.end_statement()?;
                return Ok(Stmt::Return(value));
            }
            Some("if") => return self.if_statement(),
            Some("for") => return self.for_statement(),
            _ => {}
        }

        let expr = self.assignment()?;
        self.end_statement()?;
        Ok(Stmt::Expr(expr))
    }

    fn end_statement(&mut self) -> ScriptResult<()> {
        if self.eat_punct(Punct::Semicolon) {
            return Ok(());
        }
        let next = self.peek();
        if next.is_eof() || next.line_break_before || next.is_punct(Punct::RBrace) {
            Ok(())
        } else {
            Err(self.error_here("expected `;`"))
        }
    }

    /// `{ key: ...`, `{ ...spread`, `{ shorthand, ...` or `{}` at statement
    /// position read as an object literal; everything else is a block.
    fn brace_starts_object_literal(&self) -> bool {
        let first = self.peek_at(1);
        if first.is_punct(Punct::Ellipsis) {
            return true;
        }
        if first.is_punct(Punct::RBrace) {
            let after = self.peek_at(2);
            return after.is_eof() || after.is_punct(Punct::Semicolon);
        }
        let key_like = matches!(
            first.kind,
            TokenKind::Ident(_) | TokenKind::Str(_) | TokenKind::Number(_)
        );
        let second = self.peek_at(2);
        key_like
            && (second.is_punct(Punct::Colon)
                || second.is_punct(Punct::Comma)
                || second.is_punct(Punct::RBrace))
    }

    fn block(&mut self) -> ScriptResult<Vec<Stmt>> {
        self.expect_punct(Punct::LBrace, "`{`")?;
        let mut body = Vec::new();
        while !self.peek().is_punct(Punct::RBrace) {
            if self.peek().is_eof() {
                return Err(self.error_here("unterminated block"));
            }
            body.push(self.statement()?);
        }
        self.advance();
        Ok(body)
    }

    fn declaration(&mut self, kind: DeclKind) -> ScriptResult<Stmt> {
        let declarations = self.declarators()?;
        self.end_statement()?;
        Ok(Stmt::Declare { kind, declarations })
    }

    fn declarators(&mut self) -> ScriptResult<Vec<(String, Option<Expr>)>> {
        self.advance();
        let mut declarations = Vec::new();
        loop {
            let name = self.expect_binding_name()?;
            let init = if self.eat_punct(Punct::Assign) {
                Some(self.assignment()?)
            } else {
                None
            };
            declarations.push((name, init));
            if !self.eat_punct(Punct::Comma) {
                return Ok(declarations);
            }
        }
    }

    fn if_statement(&mut self) -> ScriptResult<Stmt> {
        self.advance();
        self.expect_punct(Punct::LParen, "`(` after `if`")?;
        let test = self.assignment()?;
        self.expect_punct(Punct::RParen, "`)` after condition")?;
        let consequent = Box::new(self.statement()?);
        let alternate = if self.eat_ident("else") {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            test,
            consequent,
            alternate,
        })
    }

    fn for_statement(&mut self) -> ScriptResult<Stmt> {
        self.advance();
        self.expect_punct(Punct::LParen, "`(` after `for`")?;

        let init = if self.peek().is_punct(Punct::Semicolon) {
            None
        } else {
            let kind = match self.peek().ident() {
                Some("var") => Some(DeclKind::Var),
                Some("let") => Some(DeclKind::Let),
                Some("const") => Some(DeclKind::Const),
                _ => None,
            };
            Some(Box::new(match kind {
                Some(kind) => Stmt::Declare {
                    kind,
                    declarations: self.declarators()?,
                },
                None => Stmt::Expr(self.assignment()?),
            }))
        };
        self.expect_punct(
            Punct::Semicolon,
            "`;` in `for` header (only C-style loops are supported)",
        )?;

        let test = if self.peek().is_punct(Punct::Semicolon) {
            None
        } else {
            Some(self.assignment()?)
        };
        self.expect_punct(Punct::Semicolon, "`;` in `for` header")?;

        let update = if self.peek().is_punct(Punct::RParen) {
            None
        } else {
            Some(self.assignment()?)
        };
        self.expect_punct(Punct::RParen, "`)` after `for` header")?;

        let body = Box::new(self.statement()?);
        Ok(Stmt::For {
            init,
            test,
            update,
            body,
        })
    }

    fn assignment(&mut self) -> ScriptResult<Expr> {
        self.enter()?;
        let expr = self.assignment_inner();
        self.leave();
        expr
    }

    fn assignment_inner(&mut self) -> ScriptResult<Expr> {
        if let Some(function) = self.try_arrow_function()? {
            return Ok(Expr::Function(function));
        }

        let target = self.conditional()?;
        let op = match &self.peek().kind {
            TokenKind::Punct(Punct::Assign) => AssignOp::Assign,
            TokenKind::Punct(Punct::PlusAssign) => AssignOp::Add,
            TokenKind::Punct(Punct::MinusAssign) => AssignOp::Sub,
            TokenKind::Punct(Punct::StarAssign) => AssignOp::Mul,
            TokenKind::Punct(Punct::SlashAssign) => AssignOp::Div,
            _ => return Ok(target),
        };
        let op_span = self.advance().span;
        if !matches!(target, Expr::Ident(..) | Expr::Member { optional: false, .. }) {
            return Err(ScriptError::parse(op_span, "invalid assignment target"));
        }
        let value = self.assignment()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn try_arrow_function(&mut self) -> ScriptResult<Option<Rc<Function>>> {
        let params = if self.peek().ident().is_some() && self.peek_at(1).is_punct(Punct::Arrow) {
            let name = self.expect_binding_name()?;
            vec![name]
        } else if self.peek().is_punct(Punct::LParen) {
            let Some(close) = self.matching_close(self.pos) else {
                return Ok(None);
            };
            if !self
                .tokens
                .get(close + 1)
                .is_some_and(|token| token.is_punct(Punct::Arrow))
            {
                return Ok(None);
            }
            self.param_list()?
        } else {
            return Ok(None);
        };

        self.expect_punct(Punct::Arrow, "`=>`")?;
        let body = if self.peek().is_punct(Punct::LBrace) {
            FunctionBody::Block(self.block()?)
        } else {
            FunctionBody::Expr(Box::new(self.assignment()?))
        };
        Ok(Some(Rc::new(Function { params, body })))
    }

    /// Index of the bracket closing the one at `open`, if balanced.
    fn matching_close(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (index, token) in self.tokens.iter().enumerate().skip(open) {
            match token.kind {
                TokenKind::Punct(Punct::LParen | Punct::LBracket | Punct::LBrace) => depth += 1,
                TokenKind::Punct(Punct::RParen | Punct::RBracket | Punct::RBrace) => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(index);
                    }
                }
                TokenKind::Eof => return None,
                _ => {}
            }
        }
        None
    }

    fn param_list(&mut self) -> ScriptResult<Vec<String>> {
        self.expect_punct(Punct::LParen, "`(`")?;
        let mut params = Vec::new();
        while !self.eat_punct(Punct::RParen) {
            params.push(self.expect_binding_name()?);
            if !self.eat_punct(Punct::Comma) {
                self.expect_punct(Punct::RParen, "`)` after parameters")?;
                break;
            }
        }
        Ok(params)
    }

    fn function_rest(&mut self) -> ScriptResult<Rc<Function>> {
        let params = self.param_list()?;
        let body = FunctionBody::Block(self.block()?);
        Ok(Rc::new(Function { params, body }))
    }

    fn conditional(&mut self) -> ScriptResult<Expr> {
        let test = self.logical_or()?;
        if !self.eat_punct(Punct::Question) {
            return Ok(test);
        }
        let consequent = self.assignment()?;
        self.expect_punct(Punct::Colon, "`:` in conditional expression")?;
        let alternate = self.assignment()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn logical_or(&mut self) -> ScriptResult<Expr> {
        let mut left = self.logical_and()?;
        loop {
            let op = if self.eat_punct(Punct::OrOr) {
                LogicalOp::Or
            } else if self.eat_punct(Punct::QuestionQuestion) {
                LogicalOp::Nullish
            } else {
                return Ok(left);
            };
            let right = self.logical_and()?;
            left = Expr::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn logical_and(&mut self) -> ScriptResult<Expr> {
        let mut left = self.equality()?;
        while self.eat_punct(Punct::AndAnd) {
            let right = self.equality()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn binary_level(
        &mut self,
        ops: &[(Punct, BinaryOp)],
        next: fn(&mut Self) -> ScriptResult<Expr>,
    ) -> ScriptResult<Expr> {
        let mut left = next(self)?;
        'outer: loop {
            for (punct, op) in ops {
                if self.eat_punct(*punct) {
                    let right = next(self)?;
                    left = Expr::Binary {
                        op: *op,
                        left: Box::new(left),
                        right: Box::new(right),
                    };
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn equality(&mut self) -> ScriptResult<Expr> {
        self.binary_level(
            &[
                (Punct::StrictEq, BinaryOp::StrictEq),
                (Punct::StrictNotEq, BinaryOp::StrictNotEq),
                (Punct::Eq, BinaryOp::Eq),
                (Punct::NotEq, BinaryOp::NotEq),
            ],
            Self::relational,
        )
    }

    fn relational(&mut self) -> ScriptResult<Expr> {
        self.binary_level(
            &[
                (Punct::LtEq, BinaryOp::LtEq),
                (Punct::GtEq, BinaryOp::GtEq),
                (Punct::Lt, BinaryOp::Lt),
                (Punct::Gt, BinaryOp::Gt),
            ],
            Self::additive,
        )
    }

    fn additive(&mut self) -> ScriptResult<Expr> {
        self.binary_level(
            &[(Punct::Plus, BinaryOp::Add), (Punct::Minus, BinaryOp::Sub)],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> ScriptResult<Expr> {
        self.binary_level(
            &[
                (Punct::Star, BinaryOp::Mul),
                (Punct::Slash, BinaryOp::Div),
                (Punct::Percent, BinaryOp::Rem),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> ScriptResult<Expr> {
        let op = if self.eat_punct(Punct::Bang) {
            Some(UnaryOp::Not)
        } else if self.eat_punct(Punct::Minus) {
            Some(UnaryOp::Negate)
        } else if self.eat_punct(Punct::Plus) {
            Some(UnaryOp::Plus)
        } else if self.eat_ident("typeof") {
            Some(UnaryOp::TypeOf)
        } else {
            None
        };
        if let Some(op) = op {
            self.enter()?;
            let operand = self.unary();
            self.leave();
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand?),
            });
        }

        for (punct, increment) in [(Punct::PlusPlus, true), (Punct::MinusMinus, false)] {
            if self.peek().is_punct(punct) {
                let span = self.advance().span;
                let target = self.unary()?;
                return update_expr(target, increment, true, span);
            }
        }

        let expr = self.postfix()?;
        for (punct, increment) in [(Punct::PlusPlus, true), (Punct::MinusMinus, false)] {
            if self.peek().is_punct(punct) && !self.peek().line_break_before {
                let span = self.advance().span;
                return update_expr(expr, increment, false, span);
            }
        }
        Ok(expr)
    }

    fn postfix(&mut self) -> ScriptResult<Expr> {
        let mut expr = if self.peek().is_ident("new") {
            self.new_expression()?
        } else {
            self.primary()?
        };

        loop {
            if self.eat_punct(Punct::Dot) {
                let property = self.member_name()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: MemberProperty::Named(property),
                    optional: false,
                };
            } else if self.eat_punct(Punct::QuestionDot) {
                if self.peek().is_punct(Punct::LParen) {
                    let args = self.arguments()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        optional: true,
                    };
                } else if self.eat_punct(Punct::LBracket) {
                    let index = self.assignment()?;
                    self.expect_punct(Punct::RBracket, "`]`")?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: MemberProperty::Computed(Box::new(index)),
                        optional: true,
                    };
                } else {
                    let property = self.member_name()?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: MemberProperty::Named(property),
                        optional: true,
                    };
                }
            } else if self.eat_punct(Punct::LBracket) {
                let index = self.assignment()?;
                self.expect_punct(Punct::RBracket, "`]`")?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: MemberProperty::Computed(Box::new(index)),
                    optional: false,
                };
            } else if self.peek().is_punct(Punct::LParen) {
                let args = self.arguments()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    optional: false,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn new_expression(&mut self) -> ScriptResult<Expr> {
        self.advance();
        let mut callee = self.primary()?;
        loop {
            if self.eat_punct(Punct::Dot) {
                let property = self.member_name()?;
                callee = Expr::Member {
                    object: Box::new(callee),
                    property: MemberProperty::Named(property),
                    optional: false,
                };
            } else if self.eat_punct(Punct::LBracket) {
                let index = self.assignment()?;
                self.expect_punct(Punct::RBracket, "`]`")?;
                callee = Expr::Member {
                    object: Box::new(callee),
                    property: MemberProperty::Computed(Box::new(index)),
                    optional: false,
                };
            } else {
                break;
            }
        }
        let args = if self.peek().is_punct(Punct::LParen) {
            self.arguments()?
        } else {
            Vec::new()
        };
        Ok(Expr::New {
            callee: Box::new(callee),
            args,
        })
    }

    fn member_name(&mut self) -> ScriptResult<String> {
        let token = self.advance();
        match token.kind {
            TokenKind::Ident(name) => Ok(name),
            _ => Err(ScriptError::parse(token.span, "expected property name")),
        }
    }

    fn arguments(&mut self) -> ScriptResult<Vec<ArrayItem>> {
        self.expect_punct(Punct::LParen, "`(`")?;
        let mut args = Vec::new();
        while !self.eat_punct(Punct::RParen) {
            if self.eat_punct(Punct::Ellipsis) {
                args.push(ArrayItem::Spread(self.assignment()?));
            } else {
                args.push(ArrayItem::Item(self.assignment()?));
            }
            if !self.eat_punct(Punct::Comma) {
                self.expect_punct(Punct::RParen, "`)` after arguments")?;
                break;
            }
        }
        Ok(args)
    }

    fn primary(&mut self) -> ScriptResult<Expr> {
        let token = self.advance();
        match token.kind {
            TokenKind::Number(NumberLiteral::Exact(n)) => Ok(Expr::Literal(Literal::Exact(n))),
            TokenKind::Number(NumberLiteral::Approx(value)) => {
                Ok(Expr::Literal(Literal::Number(value)))
            }
            TokenKind::Str(value) => Ok(Expr::Literal(Literal::Str(value))),
            TokenKind::Template(parts) => self.template(parts),
            TokenKind::Punct(Punct::LParen) => {
                let expr = self.assignment()?;
                self.expect_punct(Punct::RParen, "`)`")?;
                Ok(expr)
            }
            TokenKind::Punct(Punct::LBracket) => self.array_literal(),
            TokenKind::Punct(Punct::LBrace) => self.object_literal(),
            TokenKind::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Literal(Literal::Bool(true))),
                "false" => Ok(Expr::Literal(Literal::Bool(false))),
                "null" => Ok(Expr::Literal(Literal::Null)),
                "undefined" => Ok(Expr::Literal(Literal::Undefined)),
                "NaN" => Ok(Expr::Literal(Literal::Number(f64::NAN))),
                "Infinity" => Ok(Expr::Literal(Literal::Number(f64::INFINITY))),
                "function" => {
                    if self.peek().ident().is_some() {
                        self.advance();
                    }
                    Ok(Expr::Function(self.function_rest()?))
                }
                reserved if RESERVED.contains(&reserved) => Err(ScriptError::parse(
                    token.span,
                    format!("`{reserved}` is not supported in config text"),
                )),
                _ => Ok(Expr::Ident(name, token.span)),
            },
            TokenKind::Eof => Err(ScriptError::parse(token.span, "unexpected end of input")),
            TokenKind::Punct(_) => Err(ScriptError::parse(token.span, "unexpected token")),
        }
    }

    fn template(&mut self, parts: Vec<TemplatePart>) -> ScriptResult<Expr> {
        let mut chunks = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                TemplatePart::Text(text) => chunks.push(TemplateChunk::Text(text)),
                TemplatePart::Expr { source, offset } => {
                    let mut inner = Parser::new_at(&source, offset, self.max_depth)?;
                    inner.depth = self.depth;
                    chunks.push(TemplateChunk::Expr(inner.parse_expression()?));
                }
            }
        }
        Ok(Expr::Template(chunks))
    }

    fn array_literal(&mut self) -> ScriptResult<Expr> {
        let mut items = Vec::new();
        loop {
            if self.eat_punct(Punct::RBracket) {
                return Ok(Expr::Array(items));
            }
            if self.peek().is_punct(Punct::Comma) {
                self.advance();
                items.push(ArrayItem::Hole);
                continue;
            }
            if self.eat_punct(Punct::Ellipsis) {
                items.push(ArrayItem::Spread(self.assignment()?));
            } else {
                items.push(ArrayItem::Item(self.assignment()?));
            }
            if !self.eat_punct(Punct::Comma) {
                self.expect_punct(Punct::RBracket, "`]` after array elements")?;
                return Ok(Expr::Array(items));
            }
        }
    }

    fn object_literal(&mut self) -> ScriptResult<Expr> {
        let mut properties = Vec::new();
        loop {
            if self.eat_punct(Punct::RBrace) {
                return Ok(Expr::Object(properties));
            }
            properties.push(self.property()?);
            if !self.eat_punct(Punct::Comma) {
                self.expect_punct(Punct::RBrace, "`}` after object properties")?;
                return Ok(Expr::Object(properties));
            }
        }
    }

    fn property(&mut self) -> ScriptResult<PropertyItem> {
        if self.eat_punct(Punct::Ellipsis) {
            return Ok(PropertyItem::Spread(self.assignment()?));
        }
        if self.eat_punct(Punct::LBracket) {
            let key = self.assignment()?;
            self.expect_punct(Punct::RBracket, "`]` after computed key")?;
            self.expect_punct(Punct::Colon, "`:` after computed key")?;
            let value = self.assignment()?;
            return Ok(PropertyItem::KeyValue(PropertyKey::Computed(key), value));
        }

        let token = self.advance();
        let (key, shorthand_allowed) = match token.kind {
            TokenKind::Ident(name) => (name, true),
            TokenKind::Str(name) => (name, false),
            TokenKind::Number(NumberLiteral::Exact(n)) => (exact_key(&n), false),
            TokenKind::Number(NumberLiteral::Approx(value)) => (format_number(value), false),
            _ => return Err(ScriptError::parse(token.span, "expected property key")),
        };

        if self.eat_punct(Punct::Colon) {
            let value = self.assignment()?;
            return Ok(PropertyItem::KeyValue(PropertyKey::Named(key), value));
        }
        if self.peek().is_punct(Punct::LParen) {
            let function = self.function_rest()?;
            return Ok(PropertyItem::KeyValue(
                PropertyKey::Named(key),
                Expr::Function(function),
            ));
        }
        if shorthand_allowed
            && (self.peek().is_punct(Punct::Comma) || self.peek().is_punct(Punct::RBrace))
        {
            let value = Expr::Ident(key.clone(), token.span);
            return Ok(PropertyItem::KeyValue(PropertyKey::Named(key), value));
        }
        Err(self.error_here("expected `:` after property key"))
    }
}

fn update_expr(target: Expr, increment: bool, prefix: bool, span: Span) -> ScriptResult<Expr> {
    if !matches!(target, Expr::Ident(..) | Expr::Member { optional: false, .. }) {
        return Err(ScriptError::parse(span, "invalid update target"));
    }
    Ok(Expr::Update {
        increment,
        prefix,
        target: Box::new(target),
    })
}

fn shift_error(err: ScriptError, offset: usize) -> ScriptError {
    let shift = |span: Span| Span::new(span.start + offset, span.end + offset);
    match err {
        ScriptError::Lex { span, message } => ScriptError::Lex {
            span: shift(span),
            message,
        },
        ScriptError::Parse { span, message } => ScriptError::Parse {
            span: shift(span),
            message,
        },
        other => other,
    }
}
