use std::rc::Rc;

use super::lexer::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Declare {
        kind: DeclKind,
        declarations: Vec<(String, Option<Expr>)>,
    },
    Function {
        name: String,
        function: Rc<Function>,
    },
    Expr(Expr),
    Return(Option<Expr>),
    If {
        test: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    For {
        init: Option<Box<Stmt>>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    Block(Vec<Stmt>),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    /// Number literal kept in its written JSON form.
    Exact(serde_json::Number),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateChunk {
    Text(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayItem {
    Item(Expr),
    Spread(Expr),
    Hole,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Named(String),
    Computed(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyItem {
    KeyValue(PropertyKey, Expr),
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    Named(String),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
    Plus,
    TypeOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Expr(Box<Expr>),
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub params: Vec<String>,
    pub body: FunctionBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Template(Vec<TemplateChunk>),
    Ident(String, Span),
    Array(Vec<ArrayItem>),
    Object(Vec<PropertyItem>),
    Member {
        object: Box<Expr>,
        property: MemberProperty,
        optional: bool,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<ArrayItem>,
        optional: bool,
    },
    New {
        callee: Box<Expr>,
        args: Vec<ArrayItem>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Update {
        increment: bool,
        prefix: bool,
        target: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Function(Rc<Function>),
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
}
