// AST (Abstract Syntax Tree) definitions for the lesson language

use std::fmt;
use std::rc::Rc;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Types that can be written in annotations and carried by runtime values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int,
    UInt,
    Double,
    String,
    Bool,
    Void,
    Range,
    Array(Box<Type>),
    Dictionary(Box<Type>, Box<Type>),
    Struct(String),
}

impl Type {
    /// Resolve a type name as written in source (`Float` is an alias of `Double`)
    pub fn from_name(name: &str) -> Self {
        match name {
            "Int" => Type::Int,
            "UInt" => Type::UInt,
            "Double" | "Float" => Type::Double,
            "String" => Type::String,
            "Bool" => Type::Bool,
            "Void" => Type::Void,
            other => Type::Struct(other.to_string()),
        }
    }

    pub fn array_of(elem: Type) -> Self {
        Type::Array(Box::new(elem))
    }

    pub fn dictionary_of(key: Type, value: Type) -> Self {
        Type::Dictionary(Box::new(key), Box::new(value))
    }

    /// Whether values of this type may be used as dictionary keys
    pub fn is_hashable(&self) -> bool {
        matches!(
            self,
            Type::Int | Type::UInt | Type::Double | Type::String | Type::Bool
        )
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "Int"),
            Type::UInt => write!(f, "UInt"),
            Type::Double => write!(f, "Double"),
            Type::String => write!(f, "String"),
            Type::Bool => write!(f, "Bool"),
            Type::Void => write!(f, "Void"),
            Type::Range => write!(f, "Range"),
            Type::Array(elem) => write!(f, "[{}]", elem),
            Type::Dictionary(key, value) => write!(f, "[{}: {}]", key, value),
            Type::Struct(name) => write!(f, "{}", name),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
    // Ranges
    ClosedRange,   // a...b
    HalfOpenRange, // a..<b
    // Fallback for failed lookups
    NilCoalesce, // a ?? b
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::ClosedRange => "...",
            BinOp::HalfOpenRange => "..<",
            BinOp::NilCoalesce => "??",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg, // -x
    Not, // !x
}

/// Function parameter. `label` is the argument label callers write
/// (`None` for `_`); `name` is the binding inside the body.
#[derive(Debug, Clone)]
pub struct Param {
    pub label: Option<String>,
    pub name: String,
    pub param_type: Type,
}

/// Call argument, optionally labelled (`f(5, y: 1)`)
#[derive(Debug, Clone)]
pub struct Arg {
    pub label: Option<String>,
    pub value: AstNode,
}

/// Function or method definition
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Type,
    pub body: Vec<AstNode>,
    pub location: SourceLocation,
}

/// Struct property
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub field_type: Type,
    pub is_mutable: bool,
}

/// Struct definition with its properties and methods
#[derive(Debug, Clone)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<Field>,
    pub methods: Vec<Rc<FunctionDef>>,
    pub location: SourceLocation,
}

impl StructDef {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&Rc<FunctionDef>> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Piece of a string literal: plain text or an interpolated `\(expr)`
#[derive(Debug, Clone)]
pub enum StringPart {
    Text(String),
    Interpolation(Box<AstNode>),
}

/// Loop variable pattern of a `for-in` statement. `None` binds nothing (`_`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForPattern {
    Single(Option<String>),
    Pair(Option<String>, Option<String>),
}

/// AST nodes representing statements and expressions
#[derive(Debug, Clone)]
pub enum AstNode {
    // Declarations
    FunctionDecl(Rc<FunctionDef>),
    StructDecl(Rc<StructDef>),
    VarDecl {
        name: String,
        is_mutable: bool,
        var_type: Option<Type>,
        init: Box<AstNode>,
        location: SourceLocation,
    },

    // Statements
    Assignment {
        target: Box<AstNode>,
        value: Box<AstNode>,
        location: SourceLocation,
    },
    CompoundAssignment {
        target: Box<AstNode>,
        op: BinOp,
        value: Box<AstNode>,
        location: SourceLocation,
    },
    Return {
        expr: Option<Box<AstNode>>,
        location: SourceLocation,
    },
    If {
        condition: Box<AstNode>,
        then_branch: Vec<AstNode>,
        else_branch: Option<Vec<AstNode>>,
        location: SourceLocation,
    },
    While {
        condition: Box<AstNode>,
        body: Vec<AstNode>,
        location: SourceLocation,
    },
    RepeatWhile {
        body: Vec<AstNode>,
        condition: Box<AstNode>,
        location: SourceLocation,
    },
    ForIn {
        pattern: ForPattern,
        iterable: Box<AstNode>,
        body: Vec<AstNode>,
        location: SourceLocation,
    },
    Break {
        location: SourceLocation,
    },
    Continue {
        location: SourceLocation,
    },
    ExpressionStatement {
        expr: Box<AstNode>,
        location: SourceLocation,
    },

    // Expressions
    IntLiteral(i64, SourceLocation),
    DoubleLiteral(f64, SourceLocation),
    BoolLiteral(bool, SourceLocation),
    StringLiteral(Vec<StringPart>, SourceLocation),
    ArrayLiteral(Vec<AstNode>, SourceLocation),
    DictLiteral(Vec<(AstNode, AstNode)>, SourceLocation),
    Variable(String, SourceLocation),
    BinaryOp {
        op: BinOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
        location: SourceLocation,
    },
    UnaryOp {
        op: UnOp,
        operand: Box<AstNode>,
        location: SourceLocation,
    },
    Ternary {
        condition: Box<AstNode>,
        then_expr: Box<AstNode>,
        else_expr: Box<AstNode>,
        location: SourceLocation,
    },
    Call {
        callee: String,
        args: Vec<Arg>,
        location: SourceLocation,
    },
    MethodCall {
        object: Box<AstNode>,
        method: String,
        args: Vec<Arg>,
        location: SourceLocation,
    },
    Member {
        object: Box<AstNode>,
        member: String,
        location: SourceLocation,
    },
    Subscript {
        object: Box<AstNode>,
        index: Box<AstNode>,
        location: SourceLocation,
    },
    ForceUnwrap {
        expr: Box<AstNode>,
        location: SourceLocation,
    },
}

impl AstNode {
    /// Get the source location of this node
    pub fn location(&self) -> SourceLocation {
        match self {
            AstNode::FunctionDecl(def) => def.location,
            AstNode::StructDecl(def) => def.location,
            AstNode::VarDecl { location, .. }
            | AstNode::Assignment { location, .. }
            | AstNode::CompoundAssignment { location, .. }
            | AstNode::Return { location, .. }
            | AstNode::If { location, .. }
            | AstNode::While { location, .. }
            | AstNode::RepeatWhile { location, .. }
            | AstNode::ForIn { location, .. }
            | AstNode::Break { location }
            | AstNode::Continue { location }
            | AstNode::ExpressionStatement { location, .. }
            | AstNode::BinaryOp { location, .. }
            | AstNode::UnaryOp { location, .. }
            | AstNode::Ternary { location, .. }
            | AstNode::Call { location, .. }
            | AstNode::MethodCall { location, .. }
            | AstNode::Member { location, .. }
            | AstNode::Subscript { location, .. }
            | AstNode::ForceUnwrap { location, .. } => *location,
            AstNode::IntLiteral(_, loc)
            | AstNode::DoubleLiteral(_, loc)
            | AstNode::BoolLiteral(_, loc)
            | AstNode::StringLiteral(_, loc)
            | AstNode::ArrayLiteral(_, loc)
            | AstNode::DictLiteral(_, loc)
            | AstNode::Variable(_, loc) => *loc,
        }
    }

    /// True for integer literals (optionally negated), which may stand in for a Double
    pub fn is_integer_literal(&self) -> bool {
        match self {
            AstNode::IntLiteral(..) => true,
            AstNode::UnaryOp {
                op: UnOp::Neg,
                operand,
                ..
            } => operand.is_integer_literal(),
            _ => false,
        }
    }

    /// True for nodes that can appear on the left of `=`
    pub fn is_place(&self) -> bool {
        match self {
            AstNode::Variable(..) => true,
            AstNode::Member { object, .. } | AstNode::Subscript { object, .. } => {
                object.is_place()
            }
            AstNode::ForceUnwrap { expr, .. } => expr.is_place(),
            _ => false,
        }
    }
}

/// A parsed lesson unit: its top-level statements in source order
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub nodes: Vec<AstNode>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }
}
