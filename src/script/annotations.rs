//! Token-level removal of TypeScript annotations from pasted config text.
//!
//! This is not a type-system strip: it recognizes parameter and variable
//! annotations, return-type annotations, `as Type` assertions and top-level
//! `interface` / `type` declarations, and cuts exactly those byte ranges out
//! of the source. Text that does not tokenize is returned unchanged.

use super::lexer::{Lexer, Punct, Span, Token, TokenKind};

/// Returns `source` with recognized type annotations removed.
#[must_use]
pub fn strip_type_annotations(source: &str) -> String {
    let Ok(tokens) = Lexer::tokenize(source) else {
        return source.to_owned();
    };
    let mut stripper = Stripper {
        tokens: &tokens,
        removals: Vec::new(),
    };
    stripper.scan();
    apply_removals(source, stripper.removals)
}

struct Stripper<'t> {
    tokens: &'t [Token],
    removals: Vec<Span>,
}

impl Stripper<'_> {
    fn token(&self, index: usize) -> &Token {
        &self.tokens[index.min(self.tokens.len() - 1)]
    }

    fn remove(&mut self, first: usize, last_exclusive: usize) {
        if last_exclusive <= first {
            return;
        }
        let start = self.token(first).span.start;
        let end = self.token(last_exclusive - 1).span.end;
        self.removals.push(Span::new(start, end));
    }

    fn at_statement_start(&self, index: usize) -> bool {
        if index == 0 {
            return true;
        }
        let token = self.token(index);
        let previous = self.token(index - 1);
        token.line_break_before
            || previous.is_punct(Punct::Semicolon)
            || previous.is_punct(Punct::LBrace)
            || previous.is_punct(Punct::RBrace)
    }

    fn scan(&mut self) {
        let mut index = 0;
        while !self.token(index).is_eof() {
            index = self.step(index);
        }
    }

    /// Handles the construct starting at `index` and returns the next index.
    fn step(&mut self, index: usize) -> usize {
        let token = self.token(index);

        if self.at_statement_start(index) {
            let keyword_at = if token.is_ident("export") { index + 1 } else { index };
            let keyword = self.token(keyword_at);
            let named = self.token(keyword_at + 1).ident().is_some();
            if keyword.is_ident("interface") && named {
                let end = self.skip_interface(keyword_at);
                self.remove(index, end);
                return end;
            }
            if keyword.is_ident("type")
                && named
                && (self.token(keyword_at + 2).is_punct(Punct::Assign)
                    || self.token(keyword_at + 2).is_punct(Punct::Lt))
            {
                let end = self.skip_type_alias(keyword_at);
                self.remove(index, end);
                return end;
            }
        }

        if matches!(token.ident(), Some("let" | "const" | "var"))
            && self.token(index + 1).ident().is_some()
            && self.token(index + 2).is_punct(Punct::Colon)
        {
            let end = self.skip_type(index + 3);
            self.remove(index + 2, end);
            return end;
        }

        if token.is_ident("as") && index > 0 && self.ends_expression(index - 1) {
            let end = self.skip_type(index + 1);
            if end > index + 1 {
                self.remove(index, end);
                return end;
            }
        }

        if token.is_punct(Punct::LParen) && self.is_parameter_list(index) {
            self.strip_parameters(index);
        }

        index + 1
    }

    fn ends_expression(&self, index: usize) -> bool {
        let token = self.token(index);
        match &token.kind {
            TokenKind::Ident(name) => !matches!(
                name.as_str(),
                "return" | "typeof" | "new" | "let" | "const" | "var" | "import" | "export"
            ),
            TokenKind::Number(_) | TokenKind::Str(_) | TokenKind::Template(_) => true,
            TokenKind::Punct(punct) => {
                matches!(punct, Punct::RParen | Punct::RBracket | Punct::RBrace)
            }
            TokenKind::Eof => false,
        }
    }

    fn matching_close(&self, open: usize) -> Option<usize> {
        let (open_punct, close_punct) = match self.token(open).kind {
            TokenKind::Punct(Punct::LParen) => (Punct::LParen, Punct::RParen),
            TokenKind::Punct(Punct::LBracket) => (Punct::LBracket, Punct::RBracket),
            TokenKind::Punct(Punct::LBrace) => (Punct::LBrace, Punct::RBrace),
            TokenKind::Punct(Punct::Lt) => (Punct::Lt, Punct::Gt),
            _ => return None,
        };
        let mut depth = 0usize;
        let mut index = open;
        loop {
            let token = self.token(index);
            if token.is_eof() {
                return None;
            }
            if token.is_punct(open_punct) {
                depth += 1;
            } else if token.is_punct(close_punct) {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            index += 1;
        }
    }

    fn is_parameter_list(&self, open: usize) -> bool {
        if open > 0 {
            let previous = self.token(open - 1);
            if previous.is_ident("function") {
                return true;
            }
            if open > 1 && previous.ident().is_some() && self.token(open - 2).is_ident("function")
            {
                return true;
            }
        }
        let Some(close) = self.matching_close(open) else {
            return false;
        };
        let after = self.token(close + 1);
        if after.is_punct(Punct::Arrow) {
            return true;
        }
        if self.is_method_shorthand(open)
            && (after.is_punct(Punct::LBrace) || after.is_punct(Punct::Colon))
        {
            return true;
        }
        if after.is_punct(Punct::Colon) {
            let end = self.skip_type(close + 2);
            return end > close + 2 && self.token(end).is_punct(Punct::Arrow);
        }
        false
    }

    /// `{ formatter(params) { ... } }`: a name directly after `{` or `,`.
    fn is_method_shorthand(&self, open: usize) -> bool {
        if open < 2 {
            return false;
        }
        let name = self.token(open - 1);
        let before = self.token(open - 2);
        name.ident().is_some_and(|name| {
            !matches!(name, "if" | "for" | "while" | "switch" | "catch" | "function")
        }) && (before.is_punct(Punct::LBrace) || before.is_punct(Punct::Comma))
    }

    fn strip_parameters(&mut self, open: usize) {
        let Some(close) = self.matching_close(open) else {
            return;
        };
        let mut index = open + 1;
        while index < close {
            // Binding pattern: identifier or destructuring group.
            let binding_end = match self.token(index).kind {
                TokenKind::Punct(Punct::LBrace | Punct::LBracket) => {
                    self.matching_close(index).map_or(close, |end| end + 1)
                }
                TokenKind::Punct(Punct::Ellipsis) if self.token(index + 1).ident().is_some() => {
                    index + 2
                }
                TokenKind::Ident(_) => index + 1,
                _ => index + 1,
            };
            let mut cursor = binding_end;
            let optional = self.token(cursor).is_punct(Punct::Question)
                && self.token(cursor + 1).is_punct(Punct::Colon);
            if optional {
                cursor += 1;
            }
            if self.token(cursor).is_punct(Punct::Colon) {
                let end = self.skip_type(cursor + 1).min(close);
                self.remove(if optional { cursor - 1 } else { cursor }, end);
                cursor = end;
            }
            // Advance to the next top-level comma of this parameter list.
            while cursor < close && !self.token(cursor).is_punct(Punct::Comma) {
                cursor = match self.token(cursor).kind {
                    TokenKind::Punct(Punct::LParen | Punct::LBracket | Punct::LBrace) => {
                        self.matching_close(cursor).map_or(close, |end| end + 1)
                    }
                    _ => cursor + 1,
                };
            }
            index = cursor + 1;
        }

        if self.token(close + 1).is_punct(Punct::Colon) {
            let end = self.skip_type(close + 2);
            if end > close + 2 {
                self.remove(close + 1, end);
            }
        }
    }

    fn skip_interface(&self, keyword: usize) -> usize {
        let mut index = keyword + 2;
        while !self.token(index).is_eof() && !self.token(index).is_punct(Punct::LBrace) {
            index += 1;
        }
        let end = self.matching_close(index).map_or(index, |close| close + 1);
        if self.token(end).is_punct(Punct::Semicolon) {
            end + 1
        } else {
            end
        }
    }

    fn skip_type_alias(&self, keyword: usize) -> usize {
        let mut index = keyword + 2;
        if self.token(index).is_punct(Punct::Lt) {
            index = self.matching_close(index).map_or(index + 1, |close| close + 1);
        }
        if self.token(index).is_punct(Punct::Assign) {
            index += 1;
        }
        let end = self.skip_type(index);
        if self.token(end).is_punct(Punct::Semicolon) {
            end + 1
        } else {
            end
        }
    }

    /// Skips one type expression starting at `index`; returns the index of the
    /// first token after it (equal to `index` when nothing type-like is there).
    fn skip_type(&self, index: usize) -> usize {
        let mut cursor = index;
        // Leading union/intersection bar: `type A = | 'x' | 'y'`.
        if self.token(cursor).is_punct(Punct::Pipe) || self.token(cursor).is_punct(Punct::Amp) {
            cursor += 1;
        }
        loop {
            let Some(after_primary) = self.skip_type_primary(cursor) else {
                return if cursor == index { index } else { cursor - 1 };
            };
            cursor = after_primary;
            while self.token(cursor).is_punct(Punct::LBracket)
                && self.token(cursor + 1).is_punct(Punct::RBracket)
            {
                cursor += 2;
            }
            if self.token(cursor).is_punct(Punct::Pipe) || self.token(cursor).is_punct(Punct::Amp)
            {
                cursor += 1;
                continue;
            }
            return cursor;
        }
    }

    fn skip_type_primary(&self, index: usize) -> Option<usize> {
        let token = self.token(index);
        match &token.kind {
            TokenKind::Punct(Punct::LBrace | Punct::LBracket) => {
                self.matching_close(index).map(|close| close + 1)
            }
            TokenKind::Punct(Punct::LParen) => {
                let close = self.matching_close(index)?;
                if self.token(close + 1).is_punct(Punct::Arrow) {
                    let end = self.skip_type(close + 2);
                    (end > close + 2).then_some(end)
                } else {
                    Some(close + 1)
                }
            }
            TokenKind::Str(_) | TokenKind::Number(_) => Some(index + 1),
            TokenKind::Ident(name) => {
                if matches!(name.as_str(), "keyof" | "typeof" | "readonly" | "unique")
                    && self.token(index + 1).ident().is_some()
                {
                    return self.skip_type_primary(index + 1);
                }
                let mut cursor = index + 1;
                while self.token(cursor).is_punct(Punct::Dot)
                    && self.token(cursor + 1).ident().is_some()
                {
                    cursor += 2;
                }
                if self.token(cursor).is_punct(Punct::Lt) {
                    cursor = self.matching_close(cursor).map_or(cursor, |close| close + 1);
                }
                Some(cursor)
            }
            _ => None,
        }
    }
}

fn apply_removals(source: &str, mut removals: Vec<Span>) -> String {
    if removals.is_empty() {
        return source.to_owned();
    }
    removals.sort_by_key(|span| span.start);
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for span in removals {
        if span.end <= cursor {
            continue;
        }
        if span.start > cursor {
            out.push_str(&source[cursor..span.start]);
        }
        cursor = cursor.max(span.end);
    }
    out.push_str(&source[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::strip_type_annotations;

    #[test]
    fn text_without_annotations_is_unchanged() {
        let source = "option = { a: cond ? 1 : 2 };";
        assert_eq!(strip_type_annotations(source), source);
    }

    #[test]
    fn untokenizable_text_is_returned_verbatim() {
        let source = "option = { a: 'unterminated }";
        assert_eq!(strip_type_annotations(source), source);
    }
}
