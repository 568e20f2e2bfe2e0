//! Rules Python enforces that the tree-sitter grammar lets through
//!
//! tree-sitter-python recovers from some mistakes without leaving an error
//! node behind: bodies that were never indented, dedents to a column no
//! enclosing block uses, parameters without defaults after ones with
//! defaults, and misordered call arguments. Each is reported the way the
//! interpreter words it.

use tree_sitter::Node;

/// First violation in document order, as a syntax error message
pub(super) fn first_violation(root: Node, source: &str) -> Option<String> {
    Checker::new(source).check(root)
}

struct Checker<'a> {
    lines: Vec<&'a str>,
}

impl<'a> Checker<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.split('\n').collect(),
        }
    }

    fn check(&self, node: Node) -> Option<String> {
        let violation = match node.kind() {
            "module" => self.suite(node, 0),
            "block" => self.block(node),
            "elif_clause" | "else_clause" | "except_clause" | "except_group_clause"
            | "finally_clause" => self.clause(node),
            "parameters" | "lambda_parameters" => parameter_order(node),
            "argument_list" => argument_order(node),
            _ => None,
        };
        if violation.is_some() {
            return violation;
        }

        let mut cursor = node.walk();
        let found = node.children(&mut cursor).find_map(|child| self.check(child));
        found
    }

    /// Statements starting a line must all sit at `expected`
    fn suite(&self, container: Node, expected: usize) -> Option<String> {
        let mut previous: Option<Node> = None;

        let mut cursor = container.walk();
        for statement in container.named_children(&mut cursor) {
            if statement.is_extra() {
                continue;
            }

            if self.starts_line(statement) {
                let width = self.indent(statement.start_position().row);
                if width != expected {
                    // Dedenting out of a deeper statement to a column nobody uses
                    let from_deeper = previous
                        .is_some_and(|prev| self.indent(last_row(prev)) > width);
                    let message = if width < expected || from_deeper {
                        "unindent does not match any outer indentation level"
                    } else {
                        "unexpected indent"
                    };
                    return Some(at(message, statement));
                }
            }

            previous = Some(statement);
        }

        None
    }

    fn block(&self, block: Node) -> Option<String> {
        let owner = block.parent()?;
        let outer = self.indent(owner.start_position().row);

        let mut cursor = block.walk();
        let first = block.named_children(&mut cursor).find(|child| !child.is_extra());
        let Some(first) = first else {
            return Some(at("expected an indented block", block));
        };

        // `if x: y` keeps its simple statements on the header line
        if !self.starts_line(first) {
            return None;
        }

        let expected = self.indent(first.start_position().row);
        if expected <= outer {
            return Some(at("expected an indented block", first));
        }

        self.suite(block, expected)
    }

    /// `elif`, `else`, `except` and `finally` line up with their statement
    fn clause(&self, clause: Node) -> Option<String> {
        let statement = clause.parent()?;
        if !self.starts_line(clause) {
            return None;
        }

        let width = self.indent(clause.start_position().row);
        let expected = self.indent(statement.start_position().row);
        if width == expected {
            return None;
        }

        let message = if width < expected {
            "unindent does not match any outer indentation level"
        } else {
            "unexpected indent"
        };
        Some(at(message, clause))
    }

    /// Width of the leading whitespace on `row`, tabs to multiples of eight
    fn indent(&self, row: usize) -> usize {
        let line = self.lines.get(row).copied().unwrap_or("");

        let mut width = 0;
        for c in line.chars() {
            match c {
                ' ' => width += 1,
                '\t' => width = (width / 8 + 1) * 8,
                '\x0c' => width = 0,
                _ => break,
            }
        }
        width
    }

    /// True when only whitespace precedes `node` on its line
    fn starts_line(&self, node: Node) -> bool {
        let position = node.start_position();
        self.lines
            .get(position.row)
            .and_then(|line| line.get(..position.column))
            .is_some_and(|prefix| prefix.chars().all(|c| matches!(c, ' ' | '\t' | '\x0c')))
    }
}

/// Last row holding text of `node`; a trailing newline ends on the next row
fn last_row(node: Node) -> usize {
    let start = node.start_position();
    let end = node.end_position();
    if end.column == 0 && end.row > start.row {
        end.row - 1
    } else {
        end.row
    }
}

/// No plain parameter may follow a defaulted one before `*`
fn parameter_order(params: Node) -> Option<String> {
    let mut defaulted = false;

    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        match param.kind() {
            "default_parameter" | "typed_default_parameter" => defaulted = true,
            "identifier" | "tuple_pattern" if defaulted => {
                return Some(at(
                    "parameter without a default follows parameter with a default",
                    param,
                ));
            }
            "typed_parameter" => {
                // `*args: T` and `**kwargs: T` end the positional part
                if param.named_child(0).is_some_and(|target| target.kind() != "identifier") {
                    return None;
                }
                if defaulted {
                    return Some(at(
                        "parameter without a default follows parameter with a default",
                        param,
                    ));
                }
            }
            "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => {
                return None
            }
            _ => {}
        }
    }

    None
}

/// Positional before keyword, and nothing but keywords after `**`
fn argument_order(arguments: Node) -> Option<String> {
    let mut keyword = false;
    let mut mapping_unpacked = false;

    let mut cursor = arguments.walk();
    for argument in arguments.named_children(&mut cursor) {
        if argument.is_extra() {
            continue;
        }

        let message = match argument.kind() {
            "keyword_argument" => {
                keyword = true;
                None
            }
            "dictionary_splat" => {
                mapping_unpacked = true;
                None
            }
            "list_splat" if mapping_unpacked => {
                Some("iterable argument unpacking follows keyword argument unpacking")
            }
            "list_splat" => None,
            _ if mapping_unpacked => Some("positional argument follows keyword argument unpacking"),
            _ if keyword => Some("positional argument follows keyword argument"),
            _ => None,
        };

        if let Some(message) = message {
            return Some(at(message, argument));
        }
    }

    None
}

fn at(message: &str, node: Node) -> String {
    let position = node.start_position();
    format!(
        "{} (line {}, column {})",
        message,
        position.row + 1,
        position.column + 1
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn violation(code: &str) -> Option<String> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(code, None).unwrap();
        first_violation(tree.root_node(), code)
    }

    #[test]
    fn test_well_formed_code_passes() {
        let code = r#"
import os

# comment at column zero
class Service(Base, metaclass=Meta):
    """Doc."""

    @staticmethod
    def build(a, b=1, *args, c, d=2, **kwargs):
  # comments may sit anywhere
        if a: return b
        elif b:
            pass
        else:
            value = call(a, *args, key=1, **kwargs)
        try:
            pass
        except ValueError:
            pass
        finally:
            pass
        return (a,
    b)

def keyword_only(x=1, *, y):
	return lambda p, q=2: p
"#;
        assert_eq!(violation(code), None);
    }

    #[test]
    fn test_unindented_body() {
        let message = violation("def f():\npass\n").unwrap();
        assert!(message.starts_with("expected an indented block"), "{}", message);
    }

    #[test]
    fn test_dedent_to_unknown_column() {
        let message = violation("def h():\n    return\n  x = 1\n").unwrap();
        assert!(message.contains("indent"), "{}", message);
        assert!(message.ends_with("(line 3, column 3)"), "{}", message);
    }

    #[test]
    fn test_parameter_without_default_after_default() {
        assert_eq!(
            violation("def f(x=1, y):\n    pass\n").as_deref(),
            Some("parameter without a default follows parameter with a default (line 1, column 12)")
        );
        assert!(violation("def f(x=1, y: int):\n    pass\n").is_some());
        assert!(violation("g = lambda x=1, y: y\n").is_some());
    }

    #[test]
    fn test_call_argument_order() {
        assert_eq!(
            violation("f(**a, *b)\n").as_deref(),
            Some("iterable argument unpacking follows keyword argument unpacking (line 1, column 8)")
        );
        assert!(violation("f(a=1, b)\n")
            .is_some_and(|m| m.starts_with("positional argument follows keyword argument")));
        assert!(violation("f(**a, b)\n")
            .is_some_and(|m| m.starts_with("positional argument follows keyword argument unpacking")));
        assert_eq!(violation("f(a, *b, c=1, *d, **e, g=2)\n"), None);
    }
}
