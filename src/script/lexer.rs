//! Tokenizer for loosely-typed config source text.
//!
//! Covers the JavaScript subset the sandbox understands plus the punctuation
//! TypeScript annotations use, so annotation stripping and evaluation share a
//! single token stream with byte spans into the original text.

use std::fmt;

use serde_json::Number;

use super::error::{ScriptError, ScriptResult};

/// Source span (byte offsets, end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Ellipsis,
    Question,
    QuestionDot,
    QuestionQuestion,
    Arrow,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    Eq,
    StrictEq,
    NotEq,
    StrictNotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    Bang,
    AndAnd,
    OrOr,
    Amp,
    Pipe,
}

// Longest spellings first so greedy matching picks `===` over `==` over `=`.
const PUNCTUATION: &[(&str, Punct)] = &[
    ("...", Punct::Ellipsis),
    ("===", Punct::StrictEq),
    ("!==", Punct::StrictNotEq),
    ("=>", Punct::Arrow),
    ("==", Punct::Eq),
    ("!=", Punct::NotEq),
    ("<=", Punct::LtEq),
    (">=", Punct::GtEq),
    ("&&", Punct::AndAnd),
    ("||", Punct::OrOr),
    ("??", Punct::QuestionQuestion),
    ("?.", Punct::QuestionDot),
    ("+=", Punct::PlusAssign),
    ("-=", Punct::MinusAssign),
    ("*=", Punct::StarAssign),
    ("/=", Punct::SlashAssign),
    ("++", Punct::PlusPlus),
    ("--", Punct::MinusMinus),
    ("{", Punct::LBrace),
    ("}", Punct::RBrace),
    ("[", Punct::LBracket),
    ("]", Punct::RBracket),
    ("(", Punct::LParen),
    (")", Punct::RParen),
    (",", Punct::Comma),
    (":", Punct::Colon),
    (";", Punct::Semicolon),
    (".", Punct::Dot),
    ("?", Punct::Question),
    ("=", Punct::Assign),
    ("<", Punct::Lt),
    (">", Punct::Gt),
    ("+", Punct::Plus),
    ("-", Punct::Minus),
    ("*", Punct::Star),
    ("/", Punct::Slash),
    ("%", Punct::Percent),
    ("!", Punct::Bang),
    ("&", Punct::Amp),
    ("|", Punct::Pipe),
];

/// Piece of a template literal: raw text or an embedded `${...}` expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    Expr { source: String, offset: usize },
}

/// Numeric literal as written: integer lexemes keep their exact value and
/// lexemes with a fraction or exponent stay floats. Only literals that
/// overflow to infinity are approximate.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberLiteral {
    Exact(Number),
    Approx(f64),
}

impl NumberLiteral {
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        match self {
            Self::Exact(n) => n.as_f64().unwrap_or(f64::NAN),
            Self::Approx(value) => *value,
        }
    }

    fn from_decimal(text: &str) -> Option<Self> {
        if !text.contains(['.', 'e', 'E']) {
            if let Ok(value) = text.parse::<u64>() {
                return Some(Self::Exact(Number::from(value)));
            }
        }
        let value = text.parse::<f64>().ok()?;
        Some(Number::from_f64(value).map_or(Self::Approx(value), Self::Exact))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Number(NumberLiteral),
    Str(String),
    Template(Vec<TemplatePart>),
    Punct(Punct),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// Whether a line terminator separates this token from the previous one.
    pub line_break_before: bool,
}

impl Token {
    #[must_use]
    pub fn is_punct(&self, punct: Punct) -> bool {
        self.kind == TokenKind::Punct(punct)
    }

    #[must_use]
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(ident) if ident == name)
    }

    #[must_use]
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    saw_line_break: bool,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            saw_line_break: false,
        }
    }

    /// Tokenizes the entire input; the last token is always `Eof`.
    pub fn tokenize(input: &str) -> ScriptResult<Vec<Token>> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    pub fn next_token(&mut self) -> ScriptResult<Token> {
        self.saw_line_break = false;
        self.skip_trivia()?;
        let line_break_before = self.saw_line_break;
        let start = self.pos;

        let kind = match self.peek() {
            None => TokenKind::Eof,
            Some(c) if c == '\'' || c == '"' => self.read_string(c)?,
            Some('`') => self.read_template()?,
            Some(c) if c.is_ascii_digit() => self.read_number()?,
            Some('.') if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number()?
            }
            Some(c) if is_ident_start(c) => self.read_ident(),
            Some(c) => self.read_punct(c)?,
        };

        Ok(Token {
            kind,
            span: Span::new(start, self.pos),
            line_break_before,
        })
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_trivia(&mut self) -> ScriptResult<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    if c == '\n' || c == '\r' {
                        self.saw_line_break = true;
                    }
                    self.bump();
                }
                Some('/') if self.peek_nth(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_nth(1) == Some('*') => {
                    let start = self.pos;
                    self.pos += 2;
                    match self.input[self.pos..].find("*/") {
                        Some(offset) => {
                            if self.input[self.pos..self.pos + offset].contains('\n') {
                                self.saw_line_break = true;
                            }
                            self.pos += offset + 2;
                        }
                        None => {
                            return Err(ScriptError::lex(
                                Span::new(start, self.input.len()),
                                "unterminated block comment",
                            ));
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_ident(&mut self) -> TokenKind {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.bump();
            } else {
                break;
            }
        }
        TokenKind::Ident(self.input[start..self.pos].to_owned())
    }

    fn read_number(&mut self) -> ScriptResult<TokenKind> {
        let start = self.pos;
        if self.peek() == Some('0') {
            let radix = match self.peek_nth(1) {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.pos += 2;
                let digits_start = self.pos;
                while self.peek().is_some_and(|c| c.is_digit(radix) || c == '_') {
                    self.bump();
                }
                let digits = self.input[digits_start..self.pos].replace('_', "");
                let value = u64::from_str_radix(&digits, radix).map_err(|_| {
                    ScriptError::lex(Span::new(start, self.pos), "malformed radix literal")
                })?;
                return self.finish_number(start, NumberLiteral::Exact(Number::from(value)));
            }
        }

        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.bump();
        }
        if self.peek() == Some('.') {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let exponent_has_digits = match self.peek_nth(1) {
                Some('+' | '-') => self.peek_nth(2).is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent_has_digits {
                self.bump();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.bump();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }

        let text = self.input[start..self.pos].replace('_', "");
        let value = NumberLiteral::from_decimal(&text).ok_or_else(|| {
            ScriptError::lex(Span::new(start, self.pos), "malformed number literal")
        })?;
        self.finish_number(start, value)
    }

    fn finish_number(&mut self, start: usize, value: NumberLiteral) -> ScriptResult<TokenKind> {
        if self.peek().is_some_and(is_ident_start) {
            return Err(ScriptError::lex(
                Span::new(start, self.pos),
                "identifier starts immediately after numeric literal",
            ));
        }
        Ok(TokenKind::Number(value))
    }

    fn read_string(&mut self, quote: char) -> ScriptResult<TokenKind> {
        let start = self.pos;
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(ScriptError::lex(
                        Span::new(start, self.pos),
                        "unterminated string literal",
                    ));
                }
                Some('\\') => {
                    if let Some(c) = self.read_escape(start)? {
                        value.push(c);
                    }
                }
                Some(c) if c == quote => return Ok(TokenKind::Str(value)),
                Some(c) => value.push(c),
            }
        }
    }

    fn read_template(&mut self) -> ScriptResult<TokenKind> {
        let start = self.pos;
        self.bump();
        let mut parts = Vec::new();
        let mut text = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(ScriptError::lex(
                        Span::new(start, self.pos),
                        "unterminated template literal",
                    ));
                }
                Some('`') => break,
                Some('\\') => {
                    if let Some(c) = self.read_escape(start)? {
                        text.push(c);
                    }
                }
                Some('$') if self.peek() == Some('{') => {
                    self.bump();
                    if !text.is_empty() {
                        parts.push(TemplatePart::Text(std::mem::take(&mut text)));
                    }
                    let offset = self.pos;
                    let source = self.read_template_expr(start)?;
                    parts.push(TemplatePart::Expr { source, offset });
                }
                Some(c) => text.push(c),
            }
        }
        if !text.is_empty() {
            parts.push(TemplatePart::Text(text));
        }
        Ok(TokenKind::Template(parts))
    }

    fn read_template_expr(&mut self, template_start: usize) -> ScriptResult<String> {
        let expr_start = self.pos;
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        loop {
            let Some(c) = self.bump() else {
                return Err(ScriptError::lex(
                    Span::new(template_start, self.pos),
                    "unterminated template expression",
                ));
            };
            match quote {
                Some(q) => {
                    if c == '\\' {
                        self.bump();
                    } else if c == q {
                        quote = None;
                    }
                }
                None => match c {
                    '\'' | '"' | '`' => quote = Some(c),
                    '{' => depth += 1,
                    '}' if depth == 0 => {
                        return Ok(self.input[expr_start..self.pos - 1].to_owned());
                    }
                    '}' => depth -= 1,
                    _ => {}
                },
            }
        }
    }

    fn read_escape(&mut self, literal_start: usize) -> ScriptResult<Option<char>> {
        let unterminated =
            |pos: usize| ScriptError::lex(Span::new(literal_start, pos), "unterminated escape");
        let c = self.bump().ok_or_else(|| unterminated(self.pos))?;
        let escaped = match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => '\0',
            'x' => {
                let code = self.read_hex_digits(2, literal_start)?;
                char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
            }
            'u' => self.read_unicode_escape(literal_start)?,
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
                return Ok(None);
            }
            '\n' | '\u{2028}' | '\u{2029}' => return Ok(None),
            other => other,
        };
        Ok(Some(escaped))
    }

    fn read_unicode_escape(&mut self, literal_start: usize) -> ScriptResult<char> {
        if self.peek() == Some('{') {
            self.bump();
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            let digits = &self.input[digits_start..self.pos];
            if self.bump() != Some('}') || digits.is_empty() {
                return Err(ScriptError::lex(
                    Span::new(literal_start, self.pos),
                    "malformed unicode escape",
                ));
            }
            let code = u32::from_str_radix(digits, 16).map_err(|_| {
                ScriptError::lex(Span::new(literal_start, self.pos), "malformed unicode escape")
            })?;
            return Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
        }

        let high = self.read_hex_digits(4, literal_start)?;
        if (0xD800..0xDC00).contains(&high)
            && self.input[self.pos..].starts_with("\\u")
            && !self.input[self.pos..].starts_with("\\u{")
        {
            let checkpoint = self.pos;
            self.pos += 2;
            let low = self.read_hex_digits(4, literal_start)?;
            if (0xDC00..0xE000).contains(&low) {
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            self.pos = checkpoint;
        }
        Ok(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn read_hex_digits(&mut self, count: usize, literal_start: usize) -> ScriptResult<u32> {
        let digits_start = self.pos;
        for _ in 0..count {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    self.bump();
                }
                _ => {
                    return Err(ScriptError::lex(
                        Span::new(literal_start, self.pos),
                        "malformed hex escape",
                    ));
                }
            }
        }
        u32::from_str_radix(&self.input[digits_start..self.pos], 16).map_err(|_| {
            ScriptError::lex(Span::new(literal_start, self.pos), "malformed hex escape")
        })
    }

    fn read_punct(&mut self, c: char) -> ScriptResult<TokenKind> {
        let input = self.input;
        let rest = &input[self.pos..];
        for (spelling, punct) in PUNCTUATION {
            if !rest.starts_with(spelling) {
                continue;
            }
            // `a ?.5 : b` is a conditional, not optional chaining.
            if *punct == Punct::QuestionDot
                && rest[2..].chars().next().is_some_and(|c| c.is_ascii_digit())
            {
                continue;
            }
            self.pos += spelling.len();
            return Ok(TokenKind::Punct(*punct));
        }
        Err(ScriptError::lex(
            Span::new(self.pos, self.pos + c.len_utf8()),
            format!("unexpected character `{c}`"),
        ))
    }
}

#[must_use]
pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

#[must_use]
pub fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Whether `name` can be written as a bare object key / identifier.
#[must_use]
pub fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_ident_start(first) => chars.all(is_ident_continue),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Number;

    use super::{Lexer, NumberLiteral, Punct, TemplatePart, TokenKind, is_identifier_name};

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::tokenize(input)
            .expect("tokenize")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn greedy_punctuation_prefers_longest_spelling() {
        assert_eq!(
            kinds("a === b => ...c"),
            vec![
                TokenKind::Ident("a".to_owned()),
                TokenKind::Punct(Punct::StrictEq),
                TokenKind::Ident("b".to_owned()),
                TokenKind::Punct(Punct::Arrow),
                TokenKind::Punct(Punct::Ellipsis),
                TokenKind::Ident("c".to_owned()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn conditional_before_fraction_is_not_optional_chaining() {
        let tokens = kinds("a?.5:1");
        assert_eq!(tokens[1], TokenKind::Punct(Punct::Question));
        assert!(matches!(&tokens[2], TokenKind::Number(n) if n.to_f64() == 0.5));
    }

    #[test]
    fn number_lexemes_keep_their_written_form() {
        let tokens = kinds("2.0 9007199254740993 0x1F 1e999");
        assert_eq!(
            tokens[0],
            TokenKind::Number(NumberLiteral::Exact(Number::from_f64(2.0).expect("finite")))
        );
        assert_eq!(
            tokens[1],
            TokenKind::Number(NumberLiteral::Exact(Number::from(9_007_199_254_740_993u64)))
        );
        assert_eq!(tokens[2], TokenKind::Number(NumberLiteral::Exact(Number::from(31u64))));
        assert_eq!(tokens[3], TokenKind::Number(NumberLiteral::Approx(f64::INFINITY)));
    }

    #[test]
    fn string_escapes_decode() {
        assert_eq!(
            kinds(r"'it\'s\nA\u{1F600}'")[0],
            TokenKind::Str("it's\nA\u{1F600}".to_owned())
        );
    }

    #[test]
    fn template_literal_splits_expressions() {
        let tokens = kinds("`total: ${ a + 1 }!`");
        let TokenKind::Template(parts) = &tokens[0] else {
            panic!("expected template token");
        };
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], TemplatePart::Text("total: ".to_owned()));
        assert!(matches!(&parts[1], TemplatePart::Expr { source, .. } if source == " a + 1 "));
    }

    #[test]
    fn comments_are_skipped_and_mark_line_breaks() {
        let tokens = Lexer::tokenize("a /* x\n y */ b // tail\nc").expect("tokenize");
        assert!(tokens[1].line_break_before);
        assert!(tokens[2].line_break_before);
    }

    #[test]
    fn unterminated_string_is_a_lex_error() {
        let err = Lexer::tokenize("'abc").expect_err("must fail");
        assert!(format!("{err}").contains("unterminated string"));
    }

    #[test]
    fn identifier_names() {
        assert!(is_identifier_name("$DATA"));
        assert!(is_identifier_name("xAxis"));
        assert!(!is_identifier_name("1st"));
        assert!(!is_identifier_name("font-size"));
        assert!(!is_identifier_name(""));
    }
}
