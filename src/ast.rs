use crate::tokenizer::NameTable;
use crate::tree::Tree;
use crate::vocabulary::Keyword;

/// Payload of an AST node. What `left` and `right` mean depends on the
/// variant; see the parser for the shapes it builds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Value {
    ProgramRoot,
    /// One link of the function list.
    Declaration,
    Function,
    /// One link of a parameter list.
    VarList,
    /// Index into the name table.
    Id(usize),
    /// One link of a block's statement list.
    Op,
    Block,
    If,
    While,
    /// Holds the else block on the left and the then block on the right.
    Branches,
    Assign,
    Var,
    Return,
    Call,
    Operator(Operator),
    Num(i64),
    Input,
    Output,
    Explode,
    RamExplode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Below,
    Above,
    Equal,
    Mul,
    Div,
    Add,
    Sub,
    Sqrt,
}

impl Operator {
    pub fn from_keyword(keyword: Keyword) -> Option<Operator> {
        match keyword {
            Keyword::Below => Some(Operator::Below),
            Keyword::Above => Some(Operator::Above),
            Keyword::Equal => Some(Operator::Equal),
            Keyword::Mul => Some(Operator::Mul),
            Keyword::Div => Some(Operator::Div),
            Keyword::Add => Some(Operator::Add),
            Keyword::Sub => Some(Operator::Sub),
            Keyword::Sqrt => Some(Operator::Sqrt),
            _ => None,
        }
    }

    pub fn is_relational(self) -> bool {
        matches!(self, Operator::Below | Operator::Above | Operator::Equal)
    }

    pub fn is_additive(self) -> bool {
        matches!(self, Operator::Add | Operator::Sub)
    }

    pub fn is_multiplicative(self) -> bool {
        matches!(self, Operator::Mul | Operator::Div)
    }
}

/// A parsed program together with the name table its `Id` nodes index into.
#[derive(Clone, Debug)]
pub struct Ast {
    pub tree: Tree<Value>,
    pub names: NameTable,
}
