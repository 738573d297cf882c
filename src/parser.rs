//! Recursive-descent parser producing the binary-tree AST.
//!
//! Lists are encoded as chains of wrapper nodes. Parameter and statement
//! chains run forwards: the head wrapper holds the first element on its right
//! and the rest of the chain on its left. The function list runs backwards:
//! each declaration holds the previously parsed one on its left, and the
//! program root points at the last.

use tracing::{debug, trace};

use crate::ast::{Ast, Operator, Value};
use crate::tokenizer::{Position, TokenKind, TokenList};
use crate::tree::{NodeId, Tree};
use crate::vocabulary::{Keyword, Symbol};

#[derive(Debug, thiserror::Error)]
#[error("parse error: expected {expected}, found {found}")]
pub struct ParseError {
    pub expected: String,
    pub found: String,
    pub position: Position,
}

type ParseResult<T = NodeId> = Result<T, ParseError>;

struct Chain {
    wrapper: Value,
    head: Option<NodeId>,
    tail: Option<NodeId>,
}

impl Chain {
    fn new(wrapper: Value) -> Self {
        Self {
            wrapper,
            head: None,
            tail: None,
        }
    }

    fn append(&mut self, tree: &mut Tree<Value>, element: NodeId) {
        let link = tree.make_node(None, Some(element), self.wrapper);
        match self.tail {
            Some(tail) => tree.set_left(tail, Some(link)),
            None => self.head = Some(link),
        }
        self.tail = Some(link);
    }

    /// Detaches the head so it can be hung under its owner.
    fn finish(self, tree: &mut Tree<Value>) -> Option<NodeId> {
        if let Some(head) = self.head {
            tree.clear_parent(head);
        }
        self.head
    }
}

struct Parser<'a> {
    tokens: &'a TokenList,
    cursor: usize,
    tree: Tree<Value>,
}

#[tracing::instrument(level = "trace", skip_all)]
pub fn parse(tokens: TokenList) -> ParseResult<Ast> {
    let mut parser = Parser {
        tokens: &tokens,
        cursor: 0,
        tree: Tree::new(),
    };
    let root = parser.parse_program()?;

    let mut tree = parser.tree;
    tree.set_head(root);
    debug!(identifiers = tokens.names.len(), "Parsed program");

    Ok(Ast {
        tree,
        names: tokens.names,
    })
}

impl Parser<'_> {
    fn peek_nth(&self, n: usize) -> TokenKind {
        self.tokens
            .tokens
            .get(self.cursor + n)
            .map_or(TokenKind::End, |token| token.kind)
    }

    fn peek(&self) -> TokenKind {
        self.peek_nth(0)
    }

    fn position(&self) -> Position {
        let tokens = &self.tokens.tokens;
        tokens
            .get(self.cursor)
            .or(tokens.last())
            .map(|token| token.position)
            .unwrap_or_default()
    }

    fn advance(&mut self) {
        if self.cursor < self.tokens.tokens.len() {
            self.cursor += 1;
        }
    }

    fn error(&self, expected: impl Into<String>) -> ParseError {
        ParseError {
            expected: expected.into(),
            found: self.tokens.describe(&self.peek()),
            position: self.position(),
        }
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.peek() == TokenKind::Keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_symbol(&mut self, symbol: Symbol) -> bool {
        if self.peek() == TokenKind::Symbol(symbol) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword, expected: &str) -> ParseResult<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    fn expect_symbol(&mut self, symbol: Symbol, expected: &str) -> ParseResult<()> {
        if self.eat_symbol(symbol) {
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    fn expect_semicolon(&mut self, after: &str) -> ParseResult<()> {
        self.expect_symbol(Symbol::Semicolon, &format!("`;` after {after}"))
    }

    fn expect_identifier(&mut self, expected: &str) -> ParseResult {
        match self.peek() {
            TokenKind::Identifier(id) => {
                self.advance();
                Ok(self.tree.make_leaf(Value::Id(id)))
            }
            _ => Err(self.error(expected)),
        }
    }

    fn parse_program(&mut self) -> ParseResult {
        let mut previous = self.parse_definition()?;
        while self.peek() != TokenKind::End {
            let declaration = self.parse_definition()?;
            self.tree.set_left(declaration, Some(previous));
            previous = declaration;
        }
        Ok(self.tree.make_node(None, Some(previous), Value::ProgramRoot))
    }

    /// The function name node carries the body block on its right.
    fn parse_definition(&mut self) -> ParseResult {
        self.expect_keyword(Keyword::DefineFunction, "function definition")?;
        let name = self.expect_identifier("function name after `labassistant`")?;
        trace!(?name, "Parsing function definition");

        self.expect_symbol(Symbol::LeftParen, "`(` opening the parameter list")?;
        let parameters = self.parse_param_list()?;
        self.expect_symbol(Symbol::RightParen, "`)` closing the parameter list")?;

        let body = self.parse_block()?;
        self.tree.set_right(name, Some(body));

        let function = self
            .tree
            .make_node(Some(parameters), Some(name), Value::Function);
        Ok(self.tree.make_node(None, Some(function), Value::Declaration))
    }

    /// An empty list is a lone `VarList` node.
    fn parse_param_list(&mut self) -> ParseResult {
        let mut chain = Chain::new(Value::VarList);
        if matches!(self.peek(), TokenKind::Identifier(_)) {
            loop {
                let parameter = self.expect_identifier("parameter name")?;
                chain.append(&mut self.tree, parameter);
                if !self.eat_symbol(Symbol::Comma) {
                    break;
                }
            }
        }

        let head = chain.finish(&mut self.tree);
        Ok(head.unwrap_or_else(|| self.tree.make_leaf(Value::VarList)))
    }

    fn parse_block(&mut self) -> ParseResult {
        self.expect_keyword(Keyword::OpenBlock, "`labprotocol` opening a block")?;

        let mut chain = Chain::new(Value::Op);
        while !self.eat_keyword(Keyword::CloseBlock) {
            if self.peek() == TokenKind::End {
                return Err(self.error("`endprotocol` closing the block"));
            }
            let statement = self.parse_statement()?;
            chain.append(&mut self.tree, statement);
        }

        let statements = chain.finish(&mut self.tree);
        Ok(self.tree.make_node(None, statements, Value::Block))
    }

    fn parse_statement(&mut self) -> ParseResult {
        trace!(token = ?self.peek(), "Parsing statement");

        match self.peek() {
            TokenKind::Keyword(Keyword::Declare) => {
                self.advance();
                let name = self.expect_identifier("variable name after `testtube`")?;
                let initializer = if self.eat_keyword(Keyword::Is) {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                self.expect_semicolon("a variable declaration")?;
                Ok(self.tree.make_node(initializer, Some(name), Value::Var))
            }
            TokenKind::Keyword(Keyword::If) => {
                self.advance();
                let condition = self.parse_condition("taste")?;
                let then_block = self.parse_block()?;
                let else_block = if self.eat_keyword(Keyword::Else) {
                    Some(self.parse_block()?)
                } else {
                    None
                };
                let branches = self
                    .tree
                    .make_node(else_block, Some(then_block), Value::Branches);
                Ok(self
                    .tree
                    .make_node(Some(condition), Some(branches), Value::If))
            }
            TokenKind::Keyword(Keyword::While) => {
                self.advance();
                let condition = self.parse_condition("eat")?;
                let body = self.parse_block()?;
                Ok(self.tree.make_node(Some(condition), Some(body), Value::While))
            }
            TokenKind::Keyword(Keyword::Return) => {
                self.advance();
                let value = if self.peek() == TokenKind::Symbol(Symbol::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.expect_semicolon("`synthesize`")?;
                Ok(self.tree.make_node(None, value, Value::Return))
            }
            TokenKind::Keyword(Keyword::Output) => {
                self.advance();
                let name = self.expect_identifier("identifier after `report`")?;
                self.expect_semicolon("`report`")?;
                Ok(self.tree.make_node(None, Some(name), Value::Output))
            }
            TokenKind::Keyword(Keyword::Input) => {
                self.advance();
                let name = self.expect_identifier("identifier after `getorder`")?;
                self.expect_semicolon("`getorder`")?;
                Ok(self.tree.make_node(None, Some(name), Value::Input))
            }
            TokenKind::Keyword(Keyword::Explode) => {
                self.advance();
                self.expect_semicolon("`explode`")?;
                Ok(self.tree.make_leaf(Value::Explode))
            }
            TokenKind::Keyword(Keyword::RamExplode) => {
                self.advance();
                self.expect_semicolon("`ramexplode`")?;
                Ok(self.tree.make_leaf(Value::RamExplode))
            }
            TokenKind::Identifier(_)
                if self.peek_nth(1) == TokenKind::Symbol(Symbol::LeftParen) =>
            {
                let call = self.parse_call()?;
                self.expect_semicolon("a call")?;
                Ok(call)
            }
            TokenKind::Identifier(_) => {
                let target = self.expect_identifier("identifier")?;
                self.expect_keyword(Keyword::Is, "`is` or `(` after an identifier")?;
                let value = self.parse_expression()?;
                self.expect_semicolon("an assignment")?;
                Ok(self.tree.make_node(Some(target), Some(value), Value::Assign))
            }
            _ => Err(self.error("statement")),
        }
    }

    fn parse_condition(&mut self, keyword: &str) -> ParseResult {
        self.expect_symbol(Symbol::LeftParen, &format!("`(` after `{keyword}`"))?;
        let condition = self.parse_expression()?;
        self.expect_symbol(Symbol::RightParen, "`)` closing the condition")?;
        Ok(condition)
    }

    fn parse_call(&mut self) -> ParseResult {
        let callee = self.expect_identifier("function name")?;
        self.expect_symbol(Symbol::LeftParen, "`(` opening the argument list")?;
        let arguments = self.parse_param_list()?;
        self.expect_symbol(Symbol::RightParen, "`)` closing the argument list")?;
        Ok(self.tree.make_node(Some(callee), Some(arguments), Value::Call))
    }

    /// Relational operators bind loosest.
    fn parse_expression(&mut self) -> ParseResult {
        self.parse_tier(Operator::is_relational, Self::parse_sum)
    }

    fn parse_sum(&mut self) -> ParseResult {
        self.parse_tier(Operator::is_additive, Self::parse_product)
    }

    fn parse_product(&mut self) -> ParseResult {
        self.parse_tier(Operator::is_multiplicative, Self::parse_primary)
    }

    /// Folds a run of same-tier operators to the left.
    fn parse_tier(
        &mut self,
        in_tier: fn(Operator) -> bool,
        operand: fn(&mut Self) -> ParseResult,
    ) -> ParseResult {
        let mut lhs = operand(self)?;
        while let Some(op) = self.peek_operator().filter(|op| in_tier(*op)) {
            self.advance();
            let rhs = operand(self)?;
            lhs = self
                .tree
                .make_node(Some(lhs), Some(rhs), Value::Operator(op));
        }
        Ok(lhs)
    }

    fn peek_operator(&self) -> Option<Operator> {
        match self.peek() {
            TokenKind::Keyword(keyword) => Operator::from_keyword(keyword),
            _ => None,
        }
    }

    fn parse_primary(&mut self) -> ParseResult {
        match self.peek() {
            TokenKind::Symbol(Symbol::LeftParen) => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect_symbol(
                    Symbol::RightParen,
                    "`)` closing a parenthesised expression",
                )?;
                Ok(inner)
            }
            TokenKind::Keyword(Keyword::Sqrt) => {
                self.advance();
                self.expect_symbol(Symbol::LeftParen, "`(` after `sqrt`")?;
                let operand = self.parse_expression()?;
                self.expect_symbol(Symbol::RightParen, "`)` closing `sqrt`")?;
                Ok(self
                    .tree
                    .make_node(None, Some(operand), Value::Operator(Operator::Sqrt)))
            }
            TokenKind::Identifier(_)
                if self.peek_nth(1) == TokenKind::Symbol(Symbol::LeftParen) =>
            {
                self.parse_call()
            }
            TokenKind::Identifier(_) => self.expect_identifier("identifier"),
            TokenKind::Number(value) => {
                self.advance();
                Ok(self.tree.make_leaf(Value::Num(value)))
            }
            _ => Err(self.error("expression")),
        }
    }
}
