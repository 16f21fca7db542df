//! Program, declaration, and statement parser for NGML.
//!
//! The parser pulls tokens from the mode-stack scanner on demand, keeping
//! a small buffer for bounded lookahead. It owns the diagnostic list:
//! recoverable errors are recorded and parsing resumes at a synchronizing
//! token, so a single pass can report several independent problems.
//!
//! Expression, template, and CSS parsing live in sibling modules; they
//! extend the same `Parser` type.

use std::collections::VecDeque;

use crate::ast::{
    ArrayItem, Class, Component, Declaration, Field, ForInit, Import, Interface, Method, Param,
    Program, Stmt, TypeMember, TypeRef,
};
use crate::{Diagnostic, ParseError, ParseResult, Severity};
use ngml_lexer::{LexError, Mode, Scanner, Span, Token, TokenKind};

/// Recursive descent parser over the scanner's token stream.
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    /// Tokens pulled from the scanner but not yet consumed.
    lookahead: VecDeque<Token>,
    diagnostics: Vec<Diagnostic>,
    /// Set once the scanner has failed; the stream then yields only Eof.
    lex_failed: bool,
    /// Span of the most recent real token, for positioning synthetic Eof.
    last_span: Span,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            scanner: Scanner::new(source),
            lookahead: VecDeque::new(),
            diagnostics: Vec::new(),
            lex_failed: false,
            last_span: Span::new(0, 0, 1, 1),
        }
    }

    /// Parse source code into a program AST plus diagnostics.
    pub fn parse(source: &str) -> ParseResult {
        let mut parser = Parser::new(source);
        let program = parser.parse_program();
        ParseResult {
            program,
            diagnostics: parser.diagnostics,
        }
    }

    // =========================================================================
    // Program
    // =========================================================================

    /// `program := import* (interface | component)+`
    fn parse_program(&mut self) -> Program {
        let mut declarations = Vec::new();

        while matches!(self.peek().kind, TokenKind::Import) {
            match self.parse_import() {
                Ok(import) => declarations.push(Declaration::Import(import)),
                Err(e) => {
                    self.report(e);
                    self.synchronize_import();
                }
            }
        }

        let mut saw_declaration = false;

        while !self.at_eof() {
            match self.peek().kind {
                TokenKind::Interface => match self.parse_interface() {
                    Ok(interface) => {
                        declarations.push(Declaration::Interface(interface));
                        saw_declaration = true;
                    }
                    Err(e) => {
                        self.report(e);
                        self.synchronize_top_level();
                    }
                },
                TokenKind::At => match self.parse_component() {
                    Ok(component) => {
                        declarations.push(Declaration::Component(component));
                        saw_declaration = true;
                    }
                    Err(e) => {
                        self.report(e);
                        self.synchronize_top_level();
                    }
                },
                _ => {
                    let message = format!(
                        "Expected interface or component declaration, got {:?}",
                        self.peek().kind
                    );
                    let e = self.err_at_peek(message);
                    self.report(e);
                    self.synchronize_top_level();
                }
            }
        }

        // A program needs at least one interface or component; stay quiet
        // when earlier errors already explain why none parsed.
        if !saw_declaration && self.diagnostics.is_empty() {
            let e = self.err_at_peek("Expected interface or component declaration".into());
            self.report(e);
        }

        Program { declarations }
    }

    // =========================================================================
    // Imports and interfaces
    // =========================================================================

    /// `import { name (, name)* } from 'path' ;?`
    fn parse_import(&mut self) -> Result<Import, ParseError> {
        self.expect(TokenKind::Import, "'import'")?;
        self.expect(TokenKind::LBrace, "'{'")?;

        let mut names = Vec::new();
        if matches!(self.peek().kind, TokenKind::RBrace) {
            return Err(self.err_at_peek("Expected at least one import name".into()));
        }
        loop {
            names.push(self.expect_identifier("import name")?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::RBrace, "'}'")?;
        self.expect(TokenKind::From, "'from'")?;
        let path = self.expect_string("module path")?;
        self.eat(TokenKind::Semi);

        Ok(Import { names, path })
    }

    /// `interface Name { (name : type ;?)* }`
    fn parse_interface(&mut self) -> Result<Interface, ParseError> {
        self.expect(TokenKind::Interface, "'interface'")?;
        let name = self.expect_identifier("interface name")?;
        self.expect(TokenKind::LBrace, "'{'")?;

        let mut members = Vec::new();
        while !matches!(self.peek().kind, TokenKind::RBrace) && !self.at_eof() {
            match self.parse_type_member() {
                Ok(member) => {
                    members.push(member);
                    self.eat(TokenKind::Semi);
                }
                Err(e) => {
                    self.report(e);
                    self.synchronize_member();
                }
            }
        }

        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Interface { name, members })
    }

    /// A `name : type` pair (interface member or inline object type member).
    fn parse_type_member(&mut self) -> Result<TypeMember, ParseError> {
        let name = self.expect_identifier("member name")?;
        self.expect(TokenKind::Colon, "':'")?;
        let ty = self.parse_type()?;
        Ok(TypeMember { name, ty })
    }

    /// `type := (name | any | inlineObject) ("[" "]")*`
    pub(crate) fn parse_type(&mut self) -> Result<TypeRef, ParseError> {
        let mut ty = match &self.peek().kind {
            TokenKind::Any => {
                self.advance();
                TypeRef::Any
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                TypeRef::Named(name)
            }
            TokenKind::LBrace => {
                self.advance();
                let mut members = Vec::new();
                while !matches!(self.peek().kind, TokenKind::RBrace) && !self.at_eof() {
                    members.push(self.parse_type_member()?);
                    if !self.eat(TokenKind::Comma) && !self.eat(TokenKind::Semi) {
                        break;
                    }
                }
                self.expect(TokenKind::RBrace, "'}'")?;
                TypeRef::InlineObject(members)
            }
            kind => {
                let message = format!("Expected type, got {kind:?}");
                return Err(self.err_at_peek(message));
            }
        };

        while self.eat(TokenKind::LBracket) {
            self.expect(TokenKind::RBracket, "']'")?;
            ty = TypeRef::ArrayOf(Box::new(ty));
        }

        Ok(ty)
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// `@Component( { prop (, prop)* } ) class`
    ///
    /// Recognized keys: `selector`, `standalone`, `imports`, `template`,
    /// `styles`. Any key may be omitted; a duplicate key keeps its last
    /// occurrence. The `template:` body is scanned in Template mode; each
    /// backtick entry of `styles:` is scanned in Css mode.
    fn parse_component(&mut self) -> Result<Component, ParseError> {
        self.expect(TokenKind::At, "'@'")?;
        let decorator = self.expect_identifier("decorator name")?;
        if decorator != "Component" {
            return Err(self.err_at_peek(format!(
                "Expected @Component decorator, got @{decorator}"
            )));
        }
        self.expect(TokenKind::LParen, "'('")?;
        self.expect(TokenKind::LBrace, "'{'")?;

        let mut selector = None;
        let mut standalone = None;
        let mut imports = Vec::new();
        let mut styles = Vec::new();
        let mut template = None;

        if !matches!(self.peek().kind, TokenKind::RBrace) {
            loop {
                let key = self.expect_identifier("component config key")?;
                self.expect(TokenKind::Colon, "':'")?;
                match key.as_str() {
                    "selector" => {
                        let value = self.expect_string("selector string")?;
                        if value.is_empty() {
                            let e = self.err_at_peek("Component selector must not be empty".into());
                            self.report(e);
                        }
                        selector = Some(value);
                    }
                    "standalone" => standalone = Some(self.expect_bool()?),
                    "imports" => imports = self.parse_array_items(false)?,
                    "styles" => styles = self.parse_array_items(true)?,
                    "template" => {
                        self.expect(TokenKind::Backtick, "'`'")?;
                        self.enter_mode(Mode::Template);
                        template = Some(self.parse_template_body());
                    }
                    _ => {
                        return Err(self.err_at_peek(format!(
                            "Unknown component config key '{key}'"
                        )));
                    }
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenKind::RBrace, "'}'")?;
        self.expect(TokenKind::RParen, "')'")?;

        let class = self.parse_class()?;

        Ok(Component {
            selector,
            standalone,
            imports,
            styles,
            template,
            class,
        })
    }

    /// `[ item (, item)* ]` where an item is a backtick body, a string, an
    /// identifier, or an object literal. `css_backticks` selects the mode
    /// for backtick items: CSS inside a `styles:` array, template anywhere
    /// else. The distinction is positional, so it is made here, not in the
    /// scanner.
    pub(crate) fn parse_array_items(
        &mut self,
        css_backticks: bool,
    ) -> Result<Vec<ArrayItem>, ParseError> {
        self.expect(TokenKind::LBracket, "'['")?;

        let mut items = Vec::new();
        if !matches!(self.peek().kind, TokenKind::RBracket) {
            loop {
                let item = match &self.peek().kind {
                    TokenKind::Backtick => {
                        self.advance();
                        if css_backticks {
                            self.enter_mode(Mode::Css);
                            ArrayItem::Css(self.parse_css_body())
                        } else {
                            self.enter_mode(Mode::Template);
                            ArrayItem::Template(self.parse_template_body())
                        }
                    }
                    TokenKind::String(value) => {
                        let value = value.clone();
                        self.advance();
                        ArrayItem::StringLit(value)
                    }
                    TokenKind::Identifier(name) => {
                        let name = name.clone();
                        self.advance();
                        ArrayItem::Identifier(name)
                    }
                    TokenKind::LBrace => ArrayItem::Object(self.parse_object_properties()?),
                    kind => {
                        let message = format!("Expected array item, got {kind:?}");
                        return Err(self.err_at_peek(message));
                    }
                };
                items.push(item);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenKind::RBracket, "']'")?;
        Ok(items)
    }

    // =========================================================================
    // Classes
    // =========================================================================

    /// `export? class Name { (field | method)* }`
    ///
    /// Field vs. method is decided by one token of lookahead after the
    /// member name: `(` starts a method, anything else a field.
    fn parse_class(&mut self) -> Result<Class, ParseError> {
        let is_exported = self.eat(TokenKind::Export);
        self.expect(TokenKind::Class, "'class'")?;
        let name = self.expect_identifier("class name")?;
        self.expect(TokenKind::LBrace, "'{'")?;

        let mut fields = Vec::new();
        let mut methods = Vec::new();

        while !matches!(self.peek().kind, TokenKind::RBrace) && !self.at_eof() {
            match self.parse_class_member(&mut fields, &mut methods) {
                Ok(()) => {}
                Err(e) => {
                    self.report(e);
                    self.synchronize_member();
                }
            }
        }

        self.expect(TokenKind::RBrace, "'}'")?;

        Ok(Class {
            name,
            is_exported,
            fields,
            methods,
        })
    }

    fn parse_class_member(
        &mut self,
        fields: &mut Vec<Field>,
        methods: &mut Vec<Method>,
    ) -> Result<(), ParseError> {
        let name = self.expect_identifier("class member name")?;

        if matches!(self.peek().kind, TokenKind::LParen) {
            methods.push(self.parse_method(name)?);
        } else {
            fields.push(self.parse_field(name)?);
        }
        Ok(())
    }

    /// `name (: type)? (= expr)? ;`
    fn parse_field(&mut self, name: String) -> Result<Field, ParseError> {
        let ty = if self.eat(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let initializer = if self.eat(TokenKind::Equals) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::Semi, "';'")?;
        Ok(Field {
            name,
            ty,
            initializer,
        })
    }

    /// `name ( params? ) (: type)? { body }`
    fn parse_method(&mut self, name: String) -> Result<Method, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;

        let mut params = Vec::new();
        if !matches!(self.peek().kind, TokenKind::RParen) {
            loop {
                let param_name = self.expect_identifier("parameter name")?;
                let ty = if self.eat(TokenKind::Colon) {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                params.push(Param {
                    name: param_name,
                    ty,
                });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        let return_type = if self.eat(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = self.parse_block_stmts()?;

        Ok(Method {
            name,
            params,
            return_type,
            body,
        })
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// One token of lookahead picks the statement form; anything else
    /// falls through to an expression statement.
    pub(crate) fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek().kind {
            TokenKind::Let => {
                let (name, ty, initializer) = self.parse_var_decl_core()?;
                self.expect(TokenKind::Semi, "';'")?;
                Ok(Stmt::VarDecl {
                    name,
                    ty,
                    initializer,
                })
            }
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => self.parse_while(),
            TokenKind::Break => {
                self.advance();
                self.expect(TokenKind::Semi, "';'")?;
                Ok(Stmt::Break)
            }
            TokenKind::Return => {
                self.advance();
                let value = if matches!(self.peek().kind, TokenKind::Semi) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(TokenKind::Semi, "';'")?;
                Ok(Stmt::Return(value))
            }
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block_stmts()?)),
            TokenKind::Semi => {
                self.advance();
                Ok(Stmt::Empty)
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Semi, "';'")?;
                Ok(Stmt::ExprStmt(expr))
            }
        }
    }

    /// `let name (: type)? (= expr)?` — the trailing `;` belongs to the
    /// caller (a `for` init has none).
    fn parse_var_decl_core(
        &mut self,
    ) -> Result<(String, Option<TypeRef>, Option<crate::ast::Expr>), ParseError> {
        self.expect(TokenKind::Let, "'let'")?;
        let name = self.expect_identifier("variable name")?;
        let ty = if self.eat(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let initializer = if self.eat(TokenKind::Equals) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok((name, ty, initializer))
    }

    /// A trailing `else` binds greedily to the nearest preceding `if`.
    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::If, "'if'")?;
        self.expect(TokenKind::LParen, "'('")?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen, "')'")?;
        let then = Box::new(self.parse_stmt()?);
        let else_ = if self.eat(TokenKind::Else) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        Ok(Stmt::If { cond, then, else_ })
    }

    /// `for ( init? ; cond? ; step? ) stmt` — each clause is optional
    /// independently of the other two.
    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::For, "'for'")?;
        self.expect(TokenKind::LParen, "'('")?;

        let init = if matches!(self.peek().kind, TokenKind::Semi) {
            None
        } else if matches!(self.peek().kind, TokenKind::Let) {
            let (name, ty, initializer) = self.parse_var_decl_core()?;
            Some(ForInit::VarDecl {
                name,
                ty,
                initializer,
            })
        } else {
            Some(ForInit::Expr(self.parse_expr()?))
        };
        self.expect(TokenKind::Semi, "';'")?;

        let cond = if matches!(self.peek().kind, TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semi, "';'")?;

        let step = if matches!(self.peek().kind, TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::RParen, "')'")?;

        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::For {
            init,
            cond,
            step,
            body,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::While, "'while'")?;
        self.expect(TokenKind::LParen, "'('")?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen, "')'")?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::While { cond, body })
    }

    /// `{ stmt* }` with statement-level recovery: a bad statement is
    /// reported and skipped up to the next synchronizing token.
    fn parse_block_stmts(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        while !matches!(self.peek().kind, TokenKind::RBrace) && !self.at_eof() {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    self.report(e);
                    self.synchronize_stmt();
                }
            }
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(stmts)
    }

    // =========================================================================
    // Recovery
    // =========================================================================

    /// Skip to the next top-level declaration start, statement terminator,
    /// or block end. Always consumes at least one token so the caller's
    /// loop makes progress.
    fn synchronize_top_level(&mut self) {
        let mut first = true;
        while !self.at_eof() {
            match self.peek().kind {
                TokenKind::Import
                | TokenKind::Interface
                | TokenKind::At
                | TokenKind::Export
                | TokenKind::Class
                    if !first =>
                {
                    return;
                }
                TokenKind::Semi | TokenKind::RBrace => {
                    self.advance();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
            first = false;
        }
    }

    /// Skip the remainder of a broken import: past its terminating `;`,
    /// or up to the next declaration start.
    fn synchronize_import(&mut self) {
        let mut first = true;
        while !self.at_eof() {
            match self.peek().kind {
                TokenKind::Semi => {
                    self.advance();
                    return;
                }
                TokenKind::Import
                | TokenKind::Interface
                | TokenKind::At
                | TokenKind::Export
                | TokenKind::Class
                    if !first =>
                {
                    return;
                }
                _ => {
                    self.advance();
                }
            }
            first = false;
        }
    }

    /// Skip to the end of a class/interface member: past the next `;`, or
    /// up to the closing `}`.
    fn synchronize_member(&mut self) {
        while !self.at_eof() {
            match self.peek().kind {
                TokenKind::Semi => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip to the next statement boundary: past the next `;`, or up to a
    /// `}` or statement keyword.
    fn synchronize_stmt(&mut self) {
        let mut first = true;
        while !self.at_eof() {
            match self.peek().kind {
                TokenKind::Semi => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace => return,
                TokenKind::Let
                | TokenKind::If
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Break
                | TokenKind::Return
                    if !first =>
                {
                    return;
                }
                _ => {
                    self.advance();
                }
            }
            first = false;
        }
    }

    // =========================================================================
    // Token pump
    // =========================================================================

    /// Make sure `n` tokens are buffered. A scanner failure is fatal to
    /// the stream: it is recorded once and the buffer is padded with Eof.
    fn fill(&mut self, n: usize) {
        while self.lookahead.len() < n {
            if self.lex_failed {
                self.lookahead
                    .push_back(Token::new(TokenKind::Eof, self.last_span));
                continue;
            }
            match self.scanner.next_token() {
                Ok(token) => {
                    self.last_span = token.span;
                    self.lookahead.push_back(token);
                }
                Err(e) => {
                    self.lex_failed = true;
                    self.report_lex_error(&e);
                    self.last_span = Span::new(self.last_span.end, self.last_span.end, e.line, e.column);
                    self.lookahead
                        .push_back(Token::new(TokenKind::Eof, self.last_span));
                }
            }
        }
    }

    pub(crate) fn peek(&mut self) -> &Token {
        self.fill(1);
        &self.lookahead[0]
    }

    pub(crate) fn peek_nth(&mut self, n: usize) -> &Token {
        self.fill(n + 1);
        &self.lookahead[n]
    }

    pub(crate) fn advance(&mut self) -> Token {
        self.fill(1);
        self.lookahead.pop_front().expect("buffer filled")
    }

    pub(crate) fn at_eof(&mut self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    /// Enter a lexical mode for the body of a just-consumed backtick.
    pub(crate) fn enter_mode(&mut self, mode: Mode) {
        debug_assert!(
            self.lookahead.is_empty(),
            "mode selected with tokens already buffered"
        );
        self.scanner.push_mode(mode);
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            let message = format!("Expected {what}, got {:?}", self.peek().kind);
            Err(self.err_at_peek(message))
        }
    }

    pub(crate) fn expect_identifier(&mut self, what: &str) -> Result<String, ParseError> {
        if let TokenKind::Identifier(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            let message = format!("Expected {what}, got {:?}", self.peek().kind);
            Err(self.err_at_peek(message))
        }
    }

    pub(crate) fn expect_string(&mut self, what: &str) -> Result<String, ParseError> {
        if let TokenKind::String(value) = &self.peek().kind {
            let value = value.clone();
            self.advance();
            Ok(value)
        } else {
            let message = format!("Expected {what}, got {:?}", self.peek().kind);
            Err(self.err_at_peek(message))
        }
    }

    fn expect_bool(&mut self) -> Result<bool, ParseError> {
        match self.peek().kind {
            TokenKind::True => {
                self.advance();
                Ok(true)
            }
            TokenKind::False => {
                self.advance();
                Ok(false)
            }
            _ => {
                let message = format!("Expected true or false, got {:?}", self.peek().kind);
                Err(self.err_at_peek(message))
            }
        }
    }

    pub(crate) fn err_at_peek(&mut self, message: String) -> ParseError {
        let span = self.peek().span;
        ParseError::at(message, span)
    }

    pub(crate) fn report(&mut self, e: ParseError) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            message: e.message,
            line: e.line,
            column: e.column,
        });
    }

    fn report_lex_error(&mut self, e: &LexError) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            message: e.kind.to_string(),
            line: e.line,
            column: e.column,
        });
    }

    #[cfg(test)]
    pub(crate) fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use pretty_assertions::assert_eq;

    /// Helper: parse a program, requiring no diagnostics.
    fn parse_ok(source: &str) -> Program {
        let result = Parser::parse(source);
        assert_eq!(result.diagnostics, vec![]);
        result.program
    }

    /// Helper: parse a standalone statement, requiring success.
    fn stmt(source: &str) -> Stmt {
        let mut parser = Parser::new(source);
        let stmt = parser.parse_stmt().expect("statement should parse");
        assert!(parser.diagnostics().is_empty());
        stmt
    }

    fn first_component(program: &Program) -> &Component {
        program
            .declarations
            .iter()
            .find_map(|d| match d {
                Declaration::Component(c) => Some(c),
                _ => None,
            })
            .expect("program should contain a component")
    }

    fn first_interface(program: &Program) -> &Interface {
        program
            .declarations
            .iter()
            .find_map(|d| match d {
                Declaration::Interface(i) => Some(i),
                _ => None,
            })
            .expect("program should contain an interface")
    }

    // =========================================================================
    // Imports
    // =========================================================================

    #[test]
    fn test_import_single_name() {
        let program = parse_ok("import { Component } from '@angular/core';\n@Component({}) class A {}");
        match &program.declarations[0] {
            Declaration::Import(import) => {
                assert_eq!(import.names, vec!["Component"]);
                assert_eq!(import.path, "@angular/core");
            }
            other => panic!("Expected import, got {other:?}"),
        }
    }

    #[test]
    fn test_import_multiple_names_no_semicolon() {
        let program = parse_ok("import { A, B, C } from 'lib'\n@Component({}) class X {}");
        match &program.declarations[0] {
            Declaration::Import(import) => {
                assert_eq!(import.names, vec!["A", "B", "C"]);
            }
            other => panic!("Expected import, got {other:?}"),
        }
    }

    #[test]
    fn test_import_requires_at_least_one_name() {
        let result = Parser::parse("import { } from 'lib';\n@Component({}) class X {}");
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.diagnostics[0].message.contains("import name"));
        // Recovery still parses the component.
        assert_eq!(result.program.declarations.len(), 1);
    }

    // =========================================================================
    // Interfaces and types
    // =========================================================================

    #[test]
    fn test_interface_members() {
        let program = parse_ok("interface Todo { id: number; title: string; done: boolean; }");
        let interface = first_interface(&program);
        assert_eq!(interface.name, "Todo");
        assert_eq!(
            interface.members,
            vec![
                TypeMember {
                    name: "id".into(),
                    ty: TypeRef::Named("number".into()),
                },
                TypeMember {
                    name: "title".into(),
                    ty: TypeRef::Named("string".into()),
                },
                TypeMember {
                    name: "done".into(),
                    ty: TypeRef::Named("boolean".into()),
                },
            ]
        );
    }

    #[test]
    fn test_type_annotations() {
        let program = parse_ok(
            "interface X { items: Todo[]; grid: number[][]; meta: { id: number, tags: string[] }; blob: any; }",
        );
        let interface = first_interface(&program);
        assert_eq!(
            interface.members[0].ty,
            TypeRef::ArrayOf(Box::new(TypeRef::Named("Todo".into())))
        );
        assert_eq!(
            interface.members[1].ty,
            TypeRef::ArrayOf(Box::new(TypeRef::ArrayOf(Box::new(TypeRef::Named(
                "number".into()
            )))))
        );
        assert_eq!(
            interface.members[2].ty,
            TypeRef::InlineObject(vec![
                TypeMember {
                    name: "id".into(),
                    ty: TypeRef::Named("number".into()),
                },
                TypeMember {
                    name: "tags".into(),
                    ty: TypeRef::ArrayOf(Box::new(TypeRef::Named("string".into()))),
                },
            ])
        );
        assert_eq!(interface.members[3].ty, TypeRef::Any);
    }

    // =========================================================================
    // Components
    // =========================================================================

    #[test]
    fn test_component_full_config() {
        let program = parse_ok(
            "@Component({\n  selector: 'app-root',\n  standalone: true,\n  imports: [FormsModule, CommonModule],\n  template: `<h1>Hi</h1>`,\n  styles: [`h1 { color: red; }`]\n})\nexport class AppComponent { }",
        );
        let component = first_component(&program);
        assert_eq!(component.selector.as_deref(), Some("app-root"));
        assert_eq!(component.standalone, Some(true));
        assert_eq!(
            component.imports,
            vec![
                ArrayItem::Identifier("FormsModule".into()),
                ArrayItem::Identifier("CommonModule".into()),
            ]
        );
        let template = component.template.as_ref().expect("template present");
        assert_eq!(template.nodes.len(), 1);
        match &component.styles[0] {
            ArrayItem::Css(block) => {
                assert_eq!(block.items.len(), 1);
            }
            other => panic!("Expected CSS style entry, got {other:?}"),
        }
        assert!(component.class.is_exported);
        assert_eq!(component.class.name, "AppComponent");
    }

    #[test]
    fn test_component_config_keys_all_optional() {
        let program = parse_ok("@Component({}) class A {}");
        let component = first_component(&program);
        assert_eq!(component.selector, None);
        assert_eq!(component.standalone, None);
        assert!(component.imports.is_empty());
        assert!(component.styles.is_empty());
        assert!(component.template.is_none());
        assert!(!component.class.is_exported);
    }

    #[test]
    fn test_component_duplicate_key_last_wins() {
        let program =
            parse_ok("@Component({ selector: 'one', selector: 'two' }) class A {}");
        assert_eq!(first_component(&program).selector.as_deref(), Some("two"));
    }

    #[test]
    fn test_component_empty_selector_reports() {
        let result = Parser::parse("@Component({ selector: '' }) class A {}");
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.diagnostics[0].message.contains("selector"));
    }

    #[test]
    fn test_component_unknown_key_reports() {
        let result = Parser::parse("@Component({ animate: 'x' }) class A {}");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("Unknown component config key")));
    }

    #[test]
    fn test_component_styles_mix_string_and_css() {
        let program =
            parse_ok("@Component({ styles: ['shared.css', `p { margin: 0; }`] }) class A {}");
        let component = first_component(&program);
        assert_eq!(component.styles.len(), 2);
        assert_eq!(component.styles[0], ArrayItem::StringLit("shared.css".into()));
        assert!(matches!(component.styles[1], ArrayItem::Css(_)));
    }

    #[test]
    fn test_interleaved_interfaces_and_components_keep_order() {
        let program = parse_ok(
            "interface A { x: number; }\n@Component({}) class B {}\ninterface C { y: string; }",
        );
        let kinds: Vec<_> = program
            .declarations
            .iter()
            .map(|d| match d {
                Declaration::Import(_) => "import",
                Declaration::Interface(_) => "interface",
                Declaration::Component(_) => "component",
            })
            .collect();
        assert_eq!(kinds, vec!["interface", "component", "interface"]);
    }

    // =========================================================================
    // Classes
    // =========================================================================

    #[test]
    fn test_class_fields_and_methods() {
        let program = parse_ok(
            "@Component({}) class Counter {\n  count: number = 0;\n  label = 'Count';\n  items: string[];\n  step;\n  increment() { this.count = this.count + 1; }\n  add(a: number, b: number): number { return a + b; }\n}",
        );
        let class = &first_component(&program).class;
        assert_eq!(class.fields.len(), 4);
        assert_eq!(class.methods.len(), 2);

        assert_eq!(class.fields[0].name, "count");
        assert_eq!(class.fields[0].ty, Some(TypeRef::Named("number".into())));
        assert_eq!(class.fields[0].initializer, Some(Expr::NumberLit("0".into())));

        assert_eq!(class.fields[1].ty, None);
        assert_eq!(
            class.fields[1].initializer,
            Some(Expr::StringLit("Count".into()))
        );

        assert_eq!(class.fields[3].ty, None);
        assert_eq!(class.fields[3].initializer, None);

        let add = &class.methods[1];
        assert_eq!(add.name, "add");
        assert_eq!(
            add.params,
            vec![
                Param {
                    name: "a".into(),
                    ty: Some(TypeRef::Named("number".into())),
                },
                Param {
                    name: "b".into(),
                    ty: Some(TypeRef::Named("number".into())),
                },
            ]
        );
        assert_eq!(add.return_type, Some(TypeRef::Named("number".into())));
        assert_eq!(add.body.len(), 1);
    }

    // =========================================================================
    // Statements
    // =========================================================================

    #[test]
    fn test_var_decl() {
        assert_eq!(
            stmt("let x: number = 1;"),
            Stmt::VarDecl {
                name: "x".into(),
                ty: Some(TypeRef::Named("number".into())),
                initializer: Some(Expr::NumberLit("1".into())),
            }
        );
    }

    #[test]
    fn test_var_decl_bare() {
        assert_eq!(
            stmt("let x;"),
            Stmt::VarDecl {
                name: "x".into(),
                ty: None,
                initializer: None,
            }
        );
    }

    #[test]
    fn test_dangling_else_binds_to_inner_if() {
        let parsed = stmt("if (a) if (b) x(); else y();");
        match parsed {
            Stmt::If { then, else_, .. } => {
                assert!(else_.is_none(), "outer if must not take the else");
                match *then {
                    Stmt::If { else_: inner_else, .. } => {
                        assert!(inner_else.is_some(), "inner if takes the else");
                    }
                    other => panic!("Expected inner if, got {other:?}"),
                }
            }
            other => panic!("Expected if, got {other:?}"),
        }
    }

    #[test]
    fn test_for_full_clauses() {
        let parsed = stmt("for (let i = 0; i < 10; i++) { work(i); }");
        match parsed {
            Stmt::For {
                init, cond, step, ..
            } => {
                assert!(matches!(init, Some(ForInit::VarDecl { .. })));
                assert!(cond.is_some());
                assert!(step.is_some());
            }
            other => panic!("Expected for, got {other:?}"),
        }
    }

    #[test]
    fn test_for_all_clauses_empty() {
        let parsed = stmt("for (;;) ;");
        match parsed {
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                assert_eq!(init, None);
                assert_eq!(cond, None);
                assert_eq!(step, None);
                assert_eq!(*body, Stmt::Empty);
            }
            other => panic!("Expected for, got {other:?}"),
        }
    }

    #[test]
    fn test_for_expression_init_only() {
        let parsed = stmt("for (i = 0;;) ;");
        match parsed {
            Stmt::For {
                init, cond, step, ..
            } => {
                assert!(matches!(init, Some(ForInit::Expr(_))));
                assert_eq!(cond, None);
                assert_eq!(step, None);
            }
            other => panic!("Expected for, got {other:?}"),
        }
    }

    #[test]
    fn test_while() {
        let parsed = stmt("while (ok) { step(); }");
        match parsed {
            Stmt::While { body, .. } => {
                assert!(matches!(*body, Stmt::Block(_)));
            }
            other => panic!("Expected while, got {other:?}"),
        }
    }

    #[test]
    fn test_break_and_return() {
        assert_eq!(stmt("break;"), Stmt::Break);
        assert_eq!(stmt("return;"), Stmt::Return(None));
        assert_eq!(
            stmt("return 1;"),
            Stmt::Return(Some(Expr::NumberLit("1".into())))
        );
    }

    #[test]
    fn test_empty_statement() {
        assert_eq!(stmt(";"), Stmt::Empty);
    }

    #[test]
    fn test_expression_statement() {
        assert_eq!(
            stmt("save();"),
            Stmt::ExprStmt(Expr::Postfix {
                base: Box::new(Expr::Identifier("save".into())),
                parts: vec![PostfixPart::Call(vec![])],
            })
        );
    }

    // =========================================================================
    // Error recovery
    // =========================================================================

    #[test]
    fn test_recovery_keeps_later_members_and_declarations() {
        let result =
            Parser::parse("@Component({}) class A { x = ; y = 2; }\ninterface B { n: number; }");
        assert_eq!(result.diagnostics.len(), 1);
        let class = &first_component(&result.program).class;
        assert_eq!(class.fields.len(), 1);
        assert_eq!(class.fields[0].name, "y");
        // The interface after the broken class still parses.
        assert_eq!(first_interface(&result.program).name, "B");
    }

    #[test]
    fn test_missing_class_brace_reports() {
        let result = Parser::parse("@Component({}) class A");
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.diagnostics[0].message.contains("'{'"));
    }

    #[test]
    fn test_empty_program_requires_declaration() {
        let result = Parser::parse("");
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.diagnostics[0]
            .message
            .contains("interface or component declaration"));
    }

    #[test]
    fn test_imports_alone_require_declaration() {
        let result = Parser::parse("import { A } from 'lib';");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.program.declarations.len(), 1);
    }

    #[test]
    fn test_lex_error_keeps_partial_ast() {
        let result = Parser::parse("import { A } from 'lib';\n@Component({ template: `<div>");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("unterminated")));
        assert!(matches!(
            result.program.declarations[0],
            Declaration::Import(_)
        ));
    }

    // =========================================================================
    // End to end
    // =========================================================================

    #[test]
    fn test_sample_component_end_to_end() {
        let source = "import { Component } from '@angular/core';\n@Component({ selector: 'app-root', standalone: true, template: `<h1>{{ title }}</h1>` })\nclass AppComponent { title = 'Hi'; }";
        let program = parse_ok(source);
        assert_eq!(program.declarations.len(), 2);

        let component = first_component(&program);
        assert_eq!(component.selector.as_deref(), Some("app-root"));
        assert_eq!(component.standalone, Some(true));

        let template = component.template.as_ref().expect("template present");
        assert_eq!(template.nodes.len(), 1);
        match &template.nodes[0] {
            TemplateNode::Element(h1) => {
                assert_eq!(h1.tag_name, "h1");
                assert_eq!(
                    h1.children,
                    vec![TemplateNode::Interpolation("title".into())]
                );
            }
            other => panic!("Expected h1 element, got {other:?}"),
        }

        assert_eq!(
            component.class.fields,
            vec![Field {
                name: "title".into(),
                ty: None,
                initializer: Some(Expr::StringLit("Hi".into())),
            }]
        );
    }

    #[test]
    fn test_parse_is_idempotent() {
        let source = "@Component({ selector: 'x', template: `<p>{{ n }}</p>` }) class X { n = 1; }";
        let first = Parser::parse(source);
        let second = Parser::parse(source);
        assert_eq!(first, second);
    }
}
