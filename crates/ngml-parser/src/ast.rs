//! Abstract Syntax Tree for NGML.
//!
//! One tagged enum or struct per grammar rule, matched exhaustively by
//! consumers. All nodes are built in a single parse pass and immutable
//! afterwards; a parent exclusively owns its children.

/// A complete compilation unit: imports first, then interfaces and
/// components in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub declarations: Vec<Declaration>,
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// `import { A, B } from 'path';`
    Import(Import),

    /// `interface Name { member: type; ... }`
    Interface(Interface),

    /// `@Component({ ... }) class Name { ... }`
    Component(Component),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub names: Vec<String>,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    pub name: String,
    pub members: Vec<TypeMember>,
}

/// A `name: type` pair, used by interface bodies and inline object types.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMember {
    pub name: String,
    pub ty: TypeRef,
}

/// A component definition. The config keys are all optional; a duplicate
/// key keeps its last occurrence. The `imports` array here is independent
/// of top-level `Import` declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub selector: Option<String>,
    pub standalone: Option<bool>,
    pub imports: Vec<ArrayItem>,
    pub styles: Vec<ArrayItem>,
    pub template: Option<TemplateAst>,
    pub class: Class,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: String,
    pub is_exported: bool,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Option<TypeRef>,
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeRef>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeRef>,
}

/// A type annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// A named type: `string`, `Todo`.
    Named(String),
    /// The `any` type.
    Any,
    /// An array type: `T[]`.
    ArrayOf(Box<TypeRef>),
    /// An inline object type: `{ name: string, done: boolean }`.
    InlineObject(Vec<TypeMember>),
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let name: type = value;`
    VarDecl {
        name: String,
        ty: Option<TypeRef>,
        initializer: Option<Expr>,
    },

    ExprStmt(Expr),

    Return(Option<Expr>),

    If {
        cond: Expr,
        then: Box<Stmt>,
        else_: Option<Box<Stmt>>,
    },

    /// All three clauses are independently optional.
    For {
        init: Option<ForInit>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },

    While {
        cond: Expr,
        body: Box<Stmt>,
    },

    Break,

    Block(Vec<Stmt>),

    /// A bare `;`.
    Empty,
}

/// The first clause of a `for` statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    VarDecl {
        name: String,
        ty: Option<TypeRef>,
        initializer: Option<Expr>,
    },
    Expr(Expr),
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// Expression variants. Precedence is embedded structurally: the parser
/// only produces trees that respect the ladder in `expr.rs`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `target = value`, right-associative.
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },

    /// `cond ? then : else`, right-associative.
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        else_: Box<Expr>,
    },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    /// A primary followed by call/member/increment parts, in source order.
    Postfix {
        base: Box<Expr>,
        parts: Vec<PostfixPart>,
    },

    /// Numeric literal, lexeme verbatim.
    NumberLit(String),

    StringLit(String),

    BoolLit(bool),

    Identifier(String),

    This,

    /// A parenthesized expression, kept so precedence round-trips.
    Grouped(Box<Expr>),

    /// `new a.b.C(args)`.
    New {
        callee: Vec<String>,
        args: Vec<Expr>,
    },

    /// `(a, b) => expr` — parameters are plain identifiers, the body is a
    /// single expression.
    Arrow {
        params: Vec<String>,
        body: Box<Expr>,
    },

    ObjectLiteral(Vec<ObjectProperty>),

    ArrayLiteral(Vec<ArrayItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectProperty {
    pub key: String,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PostfixPart {
    Call(Vec<Expr>),
    Member(String),
    Increment,
}

/// An element of an array literal. The backtick-delimited variants are
/// disambiguated by the enclosing context: inside a `styles:` array a
/// backtick body is CSS, everywhere else it is a template.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayItem {
    Template(TemplateAst),
    Css(CssBlock),
    StringLit(String),
    Identifier(String),
    Object(Vec<ObjectProperty>),
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// The parsed body of a `template:` value.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateAst {
    pub nodes: Vec<TemplateNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    Element(Element),
    /// The trimmed content of a `{{ ... }}` region, kept opaque.
    Interpolation(String),
    /// A raw text run. Whitespace-only runs are dropped; adjacent runs are
    /// concatenated.
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag_name: String,
    /// Attributes in source order.
    pub attributes: Vec<Attribute>,
    pub children: Vec<TemplateNode>,
}

/// The five attribute forms, disambiguated purely by opening delimiter.
/// Bound forms carry their raw expression text; it is not re-parsed here.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// `name` or `name="value"`.
    Plain { name: String, value: Option<String> },
    /// `[name]="expr"`.
    BoundProperty { name: String, expr: String },
    /// `(name)="expr"`.
    BoundEvent { name: String, expr: String },
    /// `[(name)]="expr"`.
    TwoWay { name: String, expr: String },
    /// `*name="expr"`.
    Structural { name: String, expr: String },
}

// ---------------------------------------------------------------------------
// CSS
// ---------------------------------------------------------------------------

/// The parsed body of a backtick-delimited `styles:` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CssBlock {
    pub items: Vec<CssItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CssItem {
    Rule(CssRule),
    /// Text between rules, kept verbatim.
    RawText(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CssRule {
    pub selector: String,
    pub declarations: Vec<CssDeclaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CssDeclaration {
    pub property: String,
    pub value: String,
    /// The semicolon is optional only on the last declaration in a rule.
    pub has_semicolon: bool,
}
