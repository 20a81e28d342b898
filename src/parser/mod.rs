//! Python source reader and text generator
//!
//! This module converts between Python source text and the typed program
//! model in [`crate::tree::ast`]:
//! - [`lexer`]: Tokenization with indentation tracking
//! - [`parse`]: The [`Parser`] coordinator and [`ParseError`]
//! - `statements` and `expressions`: `impl Parser` blocks for each grammar level
//! - [`printer`]: Typed model → source text
//!
//! # Supported Subset
//!
//! Functions with plain positional parameters, `if`/`elif`/`else`, `while`,
//! `for`, `return`, `break`, `continue`, `import`, `from ... import`,
//! single and tuple assignment, and expressions over literals, names, calls,
//! attribute access, subscripts, slices and container displays.
//!
//! Valid Python that the program model cannot hold (default parameter
//! values, augmented assignment, slice steps, ...) is reported as
//! [`ParseError::Unsupported`]; anything else outside the subset is a
//! [`ParseError::Syntax`] error.

pub mod expressions;
pub mod lexer;
pub mod parse;
pub mod printer;
pub mod statements;

pub use parse::{ParseError, Parser};
pub use printer::generate_source;

use crate::compiler::errors::CompileError;
use crate::tree::ast::Statement;
use crate::tree::{convert, Node};

/// Read source text into top-level statements.
pub fn parse_source(source: &str) -> Result<Vec<Statement>, ParseError> {
    Parser::new(source)?.parse_program()
}

/// Read source text into a canonical `PYTHON_FILE` node tree.
pub fn source_to_node(source: &str) -> Result<Node, ParseError> {
    Ok(convert::encode_file(&parse_source(source)?))
}

/// Print a `PYTHON_FILE` node tree as source text.
pub fn node_to_source(tree: &Node) -> Result<String, CompileError> {
    Ok(generate_source(&convert::decode_file(tree)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: &str = "\
import math
from string import digits
# count things
def count(items, limit):
    total = 0
    for i, item in enumerate(items):
        if item is None or i >= limit:
            break
        elif not item:
            continue
        else:
            total = total + -item ** 2
    return total
while count([1, 2.5, (3,)], 2) != {'a': [x[1:], x[:2]]}:
    print('done', end='\\n')
    y = math.sqrt(4)[0]
";

    #[test]
    fn test_round_trip_is_stable() {
        let tree = source_to_node(PROGRAM).unwrap();
        let text = node_to_source(&tree).unwrap();
        assert_eq!(text, PROGRAM);
        assert_eq!(source_to_node(&text).unwrap(), tree);
    }

    #[test]
    fn test_tree_is_canonical() {
        let tree = source_to_node("x = 1\n").unwrap();
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["type"], "PYTHON_FILE");
        let statement = &json["childSets"]["body"][0];
        assert_eq!(statement["type"], "PYTHON_STATEMENT");
        assert_eq!(statement["childSets"]["statement"][0]["type"], "PYTHON_ASSIGNMENT");
    }
}
