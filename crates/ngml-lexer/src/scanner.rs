use crate::token::{Span, Token, TokenKind};
use crate::{LexError, LexErrorKind};

/// Lexical mode. The scanner keeps a stack of these so the same character
/// can be read differently depending on context (`{` is punctuation in
/// code, an interpolation opener in templates, a rule opener in CSS).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Default TypeScript-like scanning.
    Code,
    /// Inside a backtick-delimited template body: HTML text, tags, `{{ }}`.
    Template,
    /// Inside an open tag, before `>`: attribute names and delimiters.
    TagAttrs,
    /// Inside a quoted attribute value: captured as one opaque token.
    AttrValue,
    /// Inside a backtick-delimited style entry: selectors and declarations.
    Css,
}

/// NGML source scanner.
///
/// Produces tokens on demand via `next_token`. Mode transitions are driven
/// by the characters themselves (`<name` pushes TagAttrs, `>` pops it, a
/// closing backtick pops Template/Css) with one exception: a backtick seen
/// in Code mode only emits a `Backtick` token, and the caller decides
/// whether the body is a template or CSS by calling `push_mode`. That
/// distinction is positional (an element of the `styles:` array vs. a
/// `template:` value), so the scanner cannot make it alone.
pub struct Scanner<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    modes: Vec<Mode>,
    /// In Css mode, set after a `:` so the next run is a declaration value.
    css_value: bool,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given source, starting in Code mode.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            modes: vec![Mode::Code],
            css_value: false,
        }
    }

    /// The currently active mode.
    pub fn mode(&self) -> Mode {
        *self.modes.last().expect("mode stack never empty")
    }

    /// Enter a mode. Called by the parser after consuming an opening
    /// backtick, with `Mode::Template` or `Mode::Css`.
    pub fn push_mode(&mut self, mode: Mode) {
        self.modes.push(mode);
    }

    /// Read the next token under the current mode.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        match self.mode() {
            Mode::Code => self.scan_code(),
            Mode::Template => self.scan_template(),
            Mode::TagAttrs => self.scan_tag_attrs(),
            // AttrValue is entered and left inside scan_tag_attrs; if the
            // stack still says AttrValue the value was unterminated.
            Mode::AttrValue => Err(self.error(LexErrorKind::UnterminatedLiteral)),
            Mode::Css => self.scan_css(),
        }
    }

    // --- Code mode ---

    fn scan_code(&mut self) -> Result<Token, LexError> {
        self.skip_trivia();

        if self.is_at_end() {
            return Ok(self.emit(TokenKind::Eof, self.pos, self.line, self.column));
        }

        let (start, line, column) = (self.pos, self.line, self.column);
        let ch = self.peek();

        match ch {
            '`' => {
                self.advance();
                Ok(self.emit(TokenKind::Backtick, start, line, column))
            }
            '\'' | '"' => self.scan_string(),
            '0'..='9' => self.scan_number(),
            c if c.is_alphabetic() || c == '_' || c == '$' => self.scan_identifier(),

            '@' => self.punct(TokenKind::At),
            '{' => self.punct(TokenKind::LBrace),
            '}' => self.punct(TokenKind::RBrace),
            '[' => self.punct(TokenKind::LBracket),
            ']' => self.punct(TokenKind::RBracket),
            '(' => self.punct(TokenKind::LParen),
            ')' => self.punct(TokenKind::RParen),
            ':' => self.punct(TokenKind::Colon),
            ',' => self.punct(TokenKind::Comma),
            ';' => self.punct(TokenKind::Semi),
            '.' => self.punct(TokenKind::Dot),
            '?' => self.punct(TokenKind::Question),

            '=' => match self.peek_next() {
                '=' => self.punct2(TokenKind::EqEq),
                '>' => self.punct2(TokenKind::Arrow),
                _ => self.punct(TokenKind::Equals),
            },
            '!' => {
                if self.peek_next() == '=' {
                    self.punct2(TokenKind::NotEq)
                } else {
                    self.punct(TokenKind::Not)
                }
            }
            '+' => {
                if self.peek_next() == '+' {
                    self.punct2(TokenKind::Increment)
                } else {
                    self.punct(TokenKind::Plus)
                }
            }
            '-' => self.punct(TokenKind::Minus),
            '*' => self.punct(TokenKind::Star),
            '/' => self.punct(TokenKind::Slash),
            '%' => self.punct(TokenKind::Percent),
            '<' => {
                if self.peek_next() == '=' {
                    self.punct2(TokenKind::Le)
                } else {
                    self.punct(TokenKind::Lt)
                }
            }
            '>' => {
                if self.peek_next() == '=' {
                    self.punct2(TokenKind::Ge)
                } else {
                    self.punct(TokenKind::Gt)
                }
            }
            '&' => {
                if self.peek_next() == '&' {
                    self.punct2(TokenKind::AndAnd)
                } else {
                    Err(self.error(LexErrorKind::InvalidCharacter('&')))
                }
            }
            '|' => {
                if self.peek_next() == '|' {
                    self.punct2(TokenKind::OrOr)
                } else {
                    Err(self.error(LexErrorKind::InvalidCharacter('|')))
                }
            }

            c => Err(self.error(LexErrorKind::InvalidCharacter(c))),
        }
    }

    /// Scan a string literal. Escapes are processed; the quotes are not
    /// part of the token value.
    fn scan_string(&mut self) -> Result<Token, LexError> {
        let (start, line, column) = (self.pos, self.line, self.column);
        let quote = self.peek();
        self.advance(); // consume opening quote

        let mut value = String::new();

        while !self.is_at_end() && self.peek() != quote {
            if self.peek() == '\\' {
                self.advance();
                if self.is_at_end() {
                    break;
                }
                match self.peek() {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '\\' => value.push('\\'),
                    '`' => value.push('`'),
                    c if c == quote => value.push(c),
                    c => {
                        value.push('\\');
                        value.push(c);
                    }
                }
                self.advance();
            } else {
                value.push(self.peek());
                self.advance();
            }
        }

        if self.is_at_end() {
            return Err(LexError {
                kind: LexErrorKind::UnterminatedLiteral,
                line,
                column,
            });
        }

        self.advance(); // consume closing quote
        Ok(self.emit(TokenKind::String(value), start, line, column))
    }

    /// Scan a number literal. The lexeme is kept verbatim; the parser maps
    /// it 1:1 to a literal node without validation.
    fn scan_number(&mut self) -> Result<Token, LexError> {
        let (start, line, column) = (self.pos, self.line, self.column);
        let mut text = String::new();

        while !self.is_at_end() && (self.peek().is_ascii_digit() || self.peek() == '.') {
            text.push(self.peek());
            self.advance();
        }

        Ok(self.emit(TokenKind::Number(text), start, line, column))
    }

    fn scan_identifier(&mut self) -> Result<Token, LexError> {
        let (start, line, column) = (self.pos, self.line, self.column);
        let mut ident = String::new();

        while !self.is_at_end()
            && (self.peek().is_alphanumeric() || self.peek() == '_' || self.peek() == '$')
        {
            ident.push(self.peek());
            self.advance();
        }

        Ok(self.emit(Self::keyword_or_ident(ident), start, line, column))
    }

    /// Determine if an identifier is a keyword or remains an identifier.
    /// The component-config keys (`selector`, `template`, ...) are NOT
    /// keywords; the parser matches them by text inside a config object.
    fn keyword_or_ident(ident: String) -> TokenKind {
        match ident.as_str() {
            "import" => TokenKind::Import,
            "from" => TokenKind::From,
            "export" => TokenKind::Export,
            "class" => TokenKind::Class,
            "interface" => TokenKind::Interface,
            "new" => TokenKind::New,
            "this" => TokenKind::This,
            "let" => TokenKind::Let,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "while" => TokenKind::While,
            "break" => TokenKind::Break,
            "return" => TokenKind::Return,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "any" => TokenKind::Any,
            _ => TokenKind::Identifier(ident),
        }
    }

    /// Skip whitespace and `//` / `/* */` comments.
    fn skip_trivia(&mut self) {
        loop {
            while !self.is_at_end() && self.peek().is_whitespace() {
                self.advance();
            }
            if self.peek() == '/' && self.peek_next() == '/' {
                while !self.is_at_end() && self.peek() != '\n' {
                    self.advance();
                }
            } else if self.peek() == '/' && self.peek_next() == '*' {
                self.advance();
                self.advance();
                while !self.is_at_end() && !(self.peek() == '*' && self.peek_next() == '/') {
                    self.advance();
                }
                self.advance(); // consume *
                self.advance(); // consume /
            } else {
                break;
            }
        }
    }

    // --- Template mode ---

    fn scan_template(&mut self) -> Result<Token, LexError> {
        if self.is_at_end() {
            return Err(self.error(LexErrorKind::UnterminatedTemplate));
        }

        let (start, line, column) = (self.pos, self.line, self.column);

        if self.peek() == '`' {
            self.advance();
            self.modes.pop();
            return Ok(self.emit(TokenKind::Backtick, start, line, column));
        }

        if self.peek() == '{' && self.peek_next() == '{' {
            return self.scan_interpolation();
        }

        if self.peek() == '<' && self.peek_next() == '/' {
            self.advance();
            self.advance();
            let name = self.scan_tag_name();
            while !self.is_at_end() && self.peek().is_whitespace() {
                self.advance();
            }
            if self.is_at_end() {
                return Err(LexError {
                    kind: LexErrorKind::UnterminatedTemplate,
                    line,
                    column,
                });
            }
            if name.is_empty() || self.peek() != '>' {
                return Err(self.error(LexErrorKind::InvalidCharacter(self.peek())));
            }
            self.advance(); // consume >
            return Ok(self.emit(TokenKind::TagClose(name), start, line, column));
        }

        if self.peek() == '<' && self.peek_next().is_alphabetic() {
            self.advance();
            let name = self.scan_tag_name();
            self.push_mode(Mode::TagAttrs);
            return Ok(self.emit(TokenKind::TagOpen(name), start, line, column));
        }

        // Raw text run: everything up to the next tag, interpolation, or
        // closing backtick. A `<` that opens no tag is ordinary text.
        let mut text = String::new();
        while !self.is_at_end() {
            let c = self.peek();
            if c == '`' {
                break;
            }
            if c == '{' && self.peek_next() == '{' {
                break;
            }
            if c == '<' && (self.peek_next() == '/' || self.peek_next().is_alphabetic()) {
                break;
            }
            text.push(c);
            self.advance();
        }
        Ok(self.emit(TokenKind::Text(text), start, line, column))
    }

    /// Scan `{{ ... }}`. The content is one opaque token, trimmed; it is
    /// not re-tokenized as code.
    fn scan_interpolation(&mut self) -> Result<Token, LexError> {
        let (start, line, column) = (self.pos, self.line, self.column);
        self.advance(); // {
        self.advance(); // {

        let mut content = String::new();
        while !self.is_at_end() && !(self.peek() == '}' && self.peek_next() == '}') {
            content.push(self.peek());
            self.advance();
        }

        if self.is_at_end() {
            return Err(LexError {
                kind: LexErrorKind::UnterminatedTemplate,
                line,
                column,
            });
        }

        self.advance(); // }
        self.advance(); // }
        Ok(self.emit(
            TokenKind::Interpolation(content.trim().to_string()),
            start,
            line,
            column,
        ))
    }

    fn scan_tag_name(&mut self) -> String {
        let mut name = String::new();
        while !self.is_at_end()
            && (self.peek().is_alphanumeric() || self.peek() == '-' || self.peek() == '_')
        {
            name.push(self.peek());
            self.advance();
        }
        name
    }

    // --- TagAttrs mode ---

    fn scan_tag_attrs(&mut self) -> Result<Token, LexError> {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.advance();
        }

        if self.is_at_end() {
            return Err(self.error(LexErrorKind::UnterminatedTemplate));
        }

        let (start, line, column) = (self.pos, self.line, self.column);
        let ch = self.peek();

        match ch {
            '>' => {
                self.advance();
                self.modes.pop();
                Ok(self.emit(TokenKind::TagEnd, start, line, column))
            }
            '/' if self.peek_next() == '>' => {
                self.advance();
                self.advance();
                self.modes.pop();
                Ok(self.emit(TokenKind::TagSelfClose, start, line, column))
            }
            '[' => self.punct(TokenKind::LBracket),
            ']' => self.punct(TokenKind::RBracket),
            '(' => self.punct(TokenKind::LParen),
            ')' => self.punct(TokenKind::RParen),
            '*' => self.punct(TokenKind::Star),
            '=' => self.punct(TokenKind::Equals),
            '"' | '\'' => self.scan_attr_value(),
            c if c.is_alphabetic() || c == '_' => {
                let name = self.scan_tag_name();
                Ok(self.emit(TokenKind::AttrName(name), start, line, column))
            }
            c => Err(self.error(LexErrorKind::InvalidCharacter(c))),
        }
    }

    /// Scan a quoted attribute value as one opaque token. The content is
    /// captured verbatim (no escape processing); it may be re-parsed as an
    /// expression by a later phase, not by this scanner.
    fn scan_attr_value(&mut self) -> Result<Token, LexError> {
        let (start, line, column) = (self.pos, self.line, self.column);
        let quote = self.peek();
        self.advance();
        self.push_mode(Mode::AttrValue);

        let mut value = String::new();
        while !self.is_at_end() && self.peek() != quote {
            value.push(self.peek());
            self.advance();
        }

        if self.is_at_end() {
            return Err(LexError {
                kind: LexErrorKind::UnterminatedLiteral,
                line,
                column,
            });
        }

        self.advance(); // closing quote
        self.modes.pop();
        Ok(self.emit(TokenKind::AttrValue(value), start, line, column))
    }

    // --- Css mode ---

    fn scan_css(&mut self) -> Result<Token, LexError> {
        loop {
            while !self.is_at_end() && self.peek().is_whitespace() {
                self.advance();
            }
            if self.peek() == '/' && self.peek_next() == '*' {
                self.advance();
                self.advance();
                while !self.is_at_end() && !(self.peek() == '*' && self.peek_next() == '/') {
                    self.advance();
                }
                self.advance();
                self.advance();
            } else {
                break;
            }
        }

        if self.is_at_end() {
            return Err(self.error(LexErrorKind::UnterminatedTemplate));
        }

        let (start, line, column) = (self.pos, self.line, self.column);

        match self.peek() {
            '`' => {
                self.advance();
                self.modes.pop();
                self.css_value = false;
                Ok(self.emit(TokenKind::Backtick, start, line, column))
            }
            '{' => {
                self.advance();
                self.css_value = false;
                Ok(self.emit(TokenKind::LBrace, start, line, column))
            }
            '}' => {
                self.advance();
                self.css_value = false;
                Ok(self.emit(TokenKind::RBrace, start, line, column))
            }
            ':' => {
                self.advance();
                self.css_value = true;
                Ok(self.emit(TokenKind::Colon, start, line, column))
            }
            ';' => {
                self.advance();
                self.css_value = false;
                Ok(self.emit(TokenKind::Semi, start, line, column))
            }
            _ => {
                // A run of selector/property text, or (after a colon) a
                // declaration value. Values keep inner spaces but stop at
                // the end of the line, so a missing semicolon does not
                // swallow the next declaration; both are trimmed at the
                // edges.
                let value = self.css_value;
                let mut text = String::new();
                while !self.is_at_end() {
                    let c = self.peek();
                    let stop = if value {
                        matches!(c, ';' | '{' | '}' | '`' | '\n')
                    } else {
                        matches!(c, '{' | '}' | ':' | ';' | '`')
                    };
                    if stop {
                        break;
                    }
                    text.push(c);
                    self.advance();
                }
                self.css_value = false;
                let text = text.trim().to_string();
                let kind = if value {
                    TokenKind::CssText(text)
                } else {
                    TokenKind::CssIdent(text)
                };
                Ok(self.emit(kind, start, line, column))
            }
        }
    }

    // --- Helpers ---

    fn punct(&mut self, kind: TokenKind) -> Result<Token, LexError> {
        let (start, line, column) = (self.pos, self.line, self.column);
        self.advance();
        Ok(self.emit(kind, start, line, column))
    }

    fn punct2(&mut self, kind: TokenKind) -> Result<Token, LexError> {
        let (start, line, column) = (self.pos, self.line, self.column);
        self.advance();
        self.advance();
        Ok(self.emit(kind, start, line, column))
    }

    fn emit(&self, kind: TokenKind, start: usize, line: usize, column: usize) -> Token {
        Token::new(kind, Span::new(start, self.pos, line, column))
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.pos]
        }
    }

    fn peek_next(&self) -> char {
        if self.pos + 1 >= self.chars.len() {
            '\0'
        } else {
            self.chars[self.pos + 1]
        }
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            if self.chars[self.pos] == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn error(&self, kind: LexErrorKind) -> LexError {
        LexError {
            kind,
            line: self.line,
            column: self.column,
        }
    }
}
