//! Renders the AST: bracketed text for persistence, records for Graphviz.
//!
//! Text format, per node: `{ LABEL ` followed, when the node has any child,
//! by the rendering of the left and then the right child, then `} `. An absent
//! child renders as `{ @ } `.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::Context;

use crate::ast::{Ast, Operator, Value};
use crate::tokenizer::NameTable;
use crate::tree::NodeId;

/// Resolves identifier ids while rendering.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    names: &'a NameTable,
}

impl<'a> RenderContext<'a> {
    pub fn new(names: &'a NameTable) -> Self {
        Self { names }
    }

    fn name(&self, id: usize) -> &'a str {
        self.names
            .get(id)
            .unwrap_or_else(|| panic!("identifier id {id} is outside the name table"))
    }

    pub fn text_label(&self, value: &Value) -> Cow<'a, str> {
        let label = match value {
            Value::ProgramRoot => "PROGRAM_ROOT",
            Value::Declaration => "DECLARATION",
            Value::Function => "FUNCTION",
            Value::VarList => "VARLIST",
            Value::Id(id) => return Cow::Borrowed(self.name(*id)),
            Value::Op => "OP",
            Value::Block => "BLOCK",
            Value::If => "IF",
            Value::While => "WHILE",
            Value::Branches => "C",
            Value::Assign => "ASSIGN",
            Value::Var => "INITIALIZE",
            Value::Return => "RETURN",
            Value::Call => "CALL",
            Value::Operator(op) => match op {
                Operator::Below => "BELOW",
                Operator::Above => "ABOVE",
                Operator::Equal => "EQUAL",
                Operator::Mul => "MUL",
                Operator::Div => "DIV",
                Operator::Add => "ADD",
                Operator::Sub => "SUB",
                Operator::Sqrt => "SQR",
            },
            Value::Num(value) => return Cow::Owned(value.to_string()),
            Value::Input => "INPUT",
            Value::Output => "OUTPUT",
            Value::Explode => "EXPLODE",
            Value::RamExplode => "RAMEXPLODE",
        };
        Cow::Borrowed(label)
    }

    /// Graphviz record label.
    pub fn dot_label(&self, value: &Value) -> String {
        let label = match value {
            Value::ProgramRoot => "{ PROGRAM }",
            Value::Declaration => "{ DEFINITION }",
            Value::Function => "{ FUNCTION }",
            Value::VarList => "{ VARLIST }",
            Value::Id(id) => return format!("{{ ID }} | {}", self.name(*id)),
            Value::Op => "{ OPERATION }",
            Value::Block => "{ BLOCK }",
            Value::If => "{ IF }",
            Value::While => "{ WHILE }",
            Value::Branches => "{ BRANCHING }",
            Value::Assign => "{ = }",
            Value::Var => "{ VAR }",
            Value::Return => "{ RETURN }",
            Value::Call => "{ CALL }",
            Value::Operator(op) => match op {
                Operator::Below => "{ \\< }",
                Operator::Above => "{ \\> }",
                Operator::Equal => "{ == }",
                Operator::Mul => "{ * }",
                Operator::Div => "{ / }",
                Operator::Add => "{ + }",
                Operator::Sub => "{ - }",
                Operator::Sqrt => "{ sqrt }",
            },
            Value::Num(value) => return format!("{{ INTEGER: {value} }}"),
            Value::Input => "{ INPUT }",
            Value::Output => "{ OUTPUT }",
            Value::Explode => "{ EXPLODE }",
            Value::RamExplode => "{ RAMEXPLODE }",
        };
        label.to_string()
    }
}

/// Pending work while rendering. Chains nest one level per element, so the
/// renderer keeps its own stack instead of recursing.
enum Step {
    Open(Option<NodeId>),
    Close,
}

pub fn render_text(ast: &Ast) -> String {
    let context = RenderContext::new(&ast.names);
    let mut out = String::new();
    let mut steps = vec![Step::Open(ast.tree.head())];

    while let Some(step) = steps.pop() {
        let id = match step {
            Step::Close => {
                out.push_str("} ");
                continue;
            }
            Step::Open(None) => {
                out.push_str("{ @ } ");
                continue;
            }
            Step::Open(Some(id)) => id,
        };

        let node = ast.tree.node(id);
        out.push_str("{ ");
        out.push_str(&context.text_label(&node.value));
        out.push(' ');
        steps.push(Step::Close);
        if node.left.is_some() || node.right.is_some() {
            steps.push(Step::Open(node.right));
            steps.push(Step::Open(node.left));
        }
    }
    out
}

pub fn save_text(ast: &Ast, path: &Path) -> anyhow::Result<()> {
    std::fs::write(path, render_text(ast))
        .with_context(|| format!("failed to write AST to {}", path.display()))
}

pub fn write_dot<W: Write>(ast: &Ast, out: &mut W) -> io::Result<()> {
    let context = RenderContext::new(&ast.names);
    ast.tree.dump_dot(out, |value| context.dot_label(value))
}

pub fn save_dot(ast: &Ast, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_dot(ast, &mut out)
        .and_then(|()| out.flush())
        .with_context(|| format!("failed to write graph to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::tokenizer::tokenize;

    fn parse_source(source: &str) -> Ast {
        parse(tokenize(source).expect("tokenize")).expect("parse")
    }

    #[test]
    fn renders_minimal_program() {
        let ast = parse_source("labassistant main_babka_labka ( ) labprotocol endprotocol");
        let rendered = render_text(&ast);
        insta::assert_snapshot!(
            rendered.trim_end(),
            @"{ PROGRAM_ROOT { @ } { DECLARATION { @ } { FUNCTION { VARLIST } { main { @ } { BLOCK } } } } }"
        );
    }

    #[test]
    fn renders_exact_bytes_with_trailing_space() {
        let ast = parse_source("labassistant f ( a ) labprotocol synthesize a ; endprotocol");
        assert_eq!(
            render_text(&ast),
            "{ PROGRAM_ROOT { @ } { DECLARATION { @ } { FUNCTION { VARLIST { @ } { a } } \
             { f { @ } { BLOCK { @ } { OP { @ } { RETURN { @ } { a } } } } } } } } "
        );
    }

    #[test]
    fn renders_operators_and_numbers() {
        let ast = parse_source(
            "labassistant f ( ) labprotocol x is sqrt ( HE ) sourer H filter y ; endprotocol",
        );
        let rendered = render_text(&ast);
        insta::assert_snapshot!(
            rendered.trim_end(),
            @"{ PROGRAM_ROOT { @ } { DECLARATION { @ } { FUNCTION { VARLIST } { f { @ } { BLOCK { @ } { OP { @ } { ASSIGN { x } { BELOW { SQR { @ } { 10 } } { SUB { 1 } { y } } } } } } } } } }"
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let source = "labassistant f ( a , b ) labprotocol taste ( a justlike b ) labprotocol \
                      report a ; endprotocol emergencyroom labprotocol ramexplode ; endprotocol \
                      endprotocol";
        let ast = parse_source(source);
        assert_eq!(render_text(&ast), render_text(&ast));
        assert_eq!(render_text(&ast), render_text(&parse_source(source)));
    }

    #[test]
    fn every_value_has_a_text_and_dot_label() {
        let mut names = NameTable::default();
        names.intern("x");
        let context = RenderContext::new(&names);
        let expected = [
            (Value::ProgramRoot, "PROGRAM_ROOT", "{ PROGRAM }"),
            (Value::Declaration, "DECLARATION", "{ DEFINITION }"),
            (Value::Function, "FUNCTION", "{ FUNCTION }"),
            (Value::VarList, "VARLIST", "{ VARLIST }"),
            (Value::Id(0), "x", "{ ID } | x"),
            (Value::Op, "OP", "{ OPERATION }"),
            (Value::Block, "BLOCK", "{ BLOCK }"),
            (Value::If, "IF", "{ IF }"),
            (Value::While, "WHILE", "{ WHILE }"),
            (Value::Branches, "C", "{ BRANCHING }"),
            (Value::Assign, "ASSIGN", "{ = }"),
            (Value::Var, "INITIALIZE", "{ VAR }"),
            (Value::Return, "RETURN", "{ RETURN }"),
            (Value::Call, "CALL", "{ CALL }"),
            (Value::Operator(Operator::Below), "BELOW", "{ \\< }"),
            (Value::Operator(Operator::Above), "ABOVE", "{ \\> }"),
            (Value::Operator(Operator::Equal), "EQUAL", "{ == }"),
            (Value::Operator(Operator::Mul), "MUL", "{ * }"),
            (Value::Operator(Operator::Div), "DIV", "{ / }"),
            (Value::Operator(Operator::Add), "ADD", "{ + }"),
            (Value::Operator(Operator::Sub), "SUB", "{ - }"),
            (Value::Operator(Operator::Sqrt), "SQR", "{ sqrt }"),
            (Value::Num(-3), "-3", "{ INTEGER: -3 }"),
            (Value::Input, "INPUT", "{ INPUT }"),
            (Value::Output, "OUTPUT", "{ OUTPUT }"),
            (Value::Explode, "EXPLODE", "{ EXPLODE }"),
            (Value::RamExplode, "RAMEXPLODE", "{ RAMEXPLODE }"),
        ];
        for (value, text, dot) in expected {
            assert_eq!(context.text_label(&value), text, "{value:?}");
            assert_eq!(context.dot_label(&value), dot, "{value:?}");
        }
    }

    #[test]
    fn dot_dump_escapes_relational_operators() {
        let ast = parse_source(
            "labassistant f ( ) labprotocol x is a sourer b ; y is a bitterer b ; endprotocol",
        );
        let mut out = Vec::new();
        write_dot(&ast, &mut out).expect("write to vec");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains(r#"[label="{ \< }"]"#), "{text}");
        assert!(text.contains(r#"[label="{ \> }"]"#), "{text}");
    }

    #[test]
    fn long_block_renders_without_deep_recursion() {
        const STATEMENTS: usize = 100_000;
        let source = format!(
            "labassistant f ( ) labprotocol {} endprotocol",
            "explode ; ".repeat(STATEMENTS)
        );
        let ast = parse_source(&source);
        let rendered = render_text(&ast);
        assert_eq!(rendered.matches("{ EXPLODE } ").count(), STATEMENTS);
        assert_eq!(rendered.matches("{ ").count(), rendered.matches("} ").count());
        assert!(rendered.starts_with("{ PROGRAM_ROOT { @ } { DECLARATION "));
    }

    #[test]
    #[should_panic(expected = "outside the name table")]
    fn unknown_identifier_id_is_fatal() {
        let names = NameTable::default();
        RenderContext::new(&names).text_label(&Value::Id(4));
    }

    #[test]
    fn dot_dump_labels_nodes() {
        let ast = parse_source("labassistant f ( ) labprotocol report f ; endprotocol");
        let mut out = Vec::new();
        write_dot(&ast, &mut out).expect("write to vec");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("digraph tree {\n"));
        assert!(text.contains("[label=\"{ PROGRAM }\"]"));
        assert!(text.contains("[label=\"{ OUTPUT }\"]"));
        assert!(text.contains("[label=\"{ ID } | f\"]"));
        assert!(text.trim_end().ends_with('}'));
    }

    #[test]
    fn save_text_writes_rendering() {
        let ast = parse_source("labassistant f ( ) labprotocol endprotocol");
        let tmp = tempfile::tempdir().expect("create tempdir");
        let path = tmp.path().join("output.ast");
        save_text(&ast, &path).expect("save");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), render_text(&ast));
    }

    #[test]
    fn save_dot_writes_graph() {
        let ast = parse_source("labassistant f ( ) labprotocol endprotocol");
        let tmp = tempfile::tempdir().expect("create tempdir");
        let path = tmp.path().join("dump.dot");
        save_dot(&ast, &path).expect("save");
        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.contains("{ BLOCK }"));
    }
}
