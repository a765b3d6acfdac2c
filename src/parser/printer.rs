//! Indented tree dump of the AST, used by `zen --ast`

use super::ast::*;

pub fn print_program(program: &Program) -> String {
    let mut printer = AstPrinter::default();
    printer.line("Program");
    printer.nested(|p| p.stmts(&program.statements));
    printer.output
}

pub fn print_stmt(stmt: &Stmt) -> String {
    let mut printer = AstPrinter::default();
    printer.stmt(stmt);
    printer.output
}

pub fn print_expr(expr: &Expr) -> String {
    let mut printer = AstPrinter::default();
    printer.expr(expr);
    printer.output
}

#[derive(Default)]
struct AstPrinter {
    output: String,
    indent: usize,
}

impl AstPrinter {
    fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.indent {
            self.output.push_str("  ");
        }
        self.output.push_str(text.as_ref());
        self.output.push('\n');
    }

    fn nested(&mut self, print: impl FnOnce(&mut Self)) {
        self.indent += 1;
        print(self);
        self.indent -= 1;
    }

    fn labelled_block(&mut self, label: &str, stmts: &[Stmt]) {
        self.line(label);
        self.nested(|p| p.stmts(stmts));
    }

    fn labelled_expr(&mut self, label: &str, expr: &Expr) {
        self.line(label);
        self.nested(|p| p.expr(expr));
    }

    fn stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl {
                name,
                type_annotation,
                initializer,
                is_const,
                is_nullable,
                ..
            } => {
                let keyword = if *is_const { "Const" } else { "Var" };
                let ty = type_annotation
                    .as_ref()
                    .map(|ty| format!(": {}", ty))
                    .unwrap_or_default();
                let nullable = if *is_nullable { "?" } else { "" };
                self.line(format!("{} {}{}{}", keyword, name, ty, nullable));
                if let Some(initializer) = initializer {
                    self.nested(|p| p.expr(initializer));
                }
            }

            Stmt::FunctionDecl(decl) => {
                let params = decl
                    .params
                    .iter()
                    .map(|param| {
                        let nullable = if param.is_nullable { "?" } else { "" };
                        format!("{}: {}{}", param.name, param.type_annotation, nullable)
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                let return_type = decl
                    .return_type
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "void".to_string());
                let prefix = if decl.is_async { "Async Func" } else { "Func" };
                self.line(format!("{} {}({}): {}", prefix, decl.name, params, return_type));
                self.nested(|p| {
                    for param in &decl.params {
                        if let Some(default) = &param.default {
                            p.labelled_expr(&format!("Default {}", param.name), default);
                        }
                    }
                    p.labelled_block("Body", &decl.body);
                });
            }

            Stmt::Expression { expr, .. } => {
                self.labelled_expr("Expression", expr);
            }

            Stmt::If {
                condition,
                then_branch,
                elif_branches,
                else_branch,
                ..
            } => {
                self.line("If");
                self.nested(|p| {
                    p.labelled_expr("Condition", condition);
                    p.labelled_block("Then", then_branch);
                    for branch in elif_branches {
                        p.line("Elif");
                        p.nested(|p| {
                            p.labelled_expr("Condition", &branch.condition);
                            p.labelled_block("Then", &branch.body);
                        });
                    }
                    if let Some(else_branch) = else_branch {
                        p.labelled_block("Else", else_branch);
                    }
                });
            }

            Stmt::While { condition, body, .. } => {
                self.line("While");
                self.nested(|p| {
                    p.labelled_expr("Condition", condition);
                    p.labelled_block("Body", body);
                });
            }

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
                ..
            } => {
                self.line("For");
                self.nested(|p| {
                    if let Some(initializer) = initializer {
                        p.line("Init");
                        p.nested(|p| p.stmt(initializer));
                    }
                    if let Some(condition) = condition {
                        p.labelled_expr("Condition", condition);
                    }
                    if let Some(increment) = increment {
                        p.labelled_expr("Update", increment);
                    }
                    p.labelled_block("Body", body);
                });
            }

            Stmt::ForIn {
                key,
                value,
                container,
                body,
                ..
            } => {
                match key {
                    Some(key) => self.line(format!("ForIn {}, {}", key, value)),
                    None => self.line(format!("ForIn {}", value)),
                }
                self.nested(|p| {
                    p.labelled_expr("In", container);
                    p.labelled_block("Body", body);
                });
            }

            Stmt::Return { value, .. } => {
                self.line("Return");
                if let Some(value) = value {
                    self.nested(|p| p.expr(value));
                }
            }

            Stmt::Break { .. } => self.line("Break"),
            Stmt::Continue { .. } => self.line("Continue"),
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal { value, .. } => self.line(format!("Literal {}", value)),

            Expr::Identifier { name, .. } => self.line(format!("Identifier {}", name)),

            Expr::Binary {
                left,
                operator,
                right,
                ..
            } => {
                self.line(format!("Binary {}", operator));
                self.nested(|p| {
                    p.expr(left);
                    p.expr(right);
                });
            }

            Expr::Unary {
                operator, operand, ..
            } => {
                self.line(format!("Unary {}", operator));
                self.nested(|p| p.expr(operand));
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.line("Call");
                self.nested(|p| {
                    p.expr(callee);
                    for argument in arguments {
                        p.expr(argument);
                    }
                });
            }

            Expr::MemberAccess { object, member, .. } => {
                self.line(format!("Member .{}", member));
                self.nested(|p| p.expr(object));
            }

            Expr::ArrayLiteral { elements, .. } => {
                self.line("Array");
                self.nested(|p| {
                    for element in elements {
                        p.expr(element);
                    }
                });
            }

            Expr::ArrayAccess { array, index, .. } => {
                self.line("Index");
                self.nested(|p| {
                    p.expr(array);
                    p.expr(index);
                });
            }

            Expr::MapLiteral { entries, .. } => {
                self.line("Map");
                self.nested(|p| {
                    for (key, value) in entries {
                        p.line("Entry");
                        p.nested(|p| {
                            p.expr(key);
                            p.expr(value);
                        });
                    }
                });
            }

            Expr::MapAccess { map, key, .. } => {
                self.line("MapAccess");
                self.nested(|p| {
                    p.expr(map);
                    p.expr(key);
                });
            }

            Expr::Await { expression, .. } => {
                self.line("Await");
                self.nested(|p| p.expr(expression));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::source::SourceCode;
    use pretty_assertions::assert_eq;

    fn dump(source: &str) -> String {
        let tokens = Lexer::new(SourceCode::inline(source)).scan().unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        print_program(&program)
    }

    #[test]
    fn test_function_dump() {
        assert_eq!(
            dump("func add(a: int, b: int? = 2): int { return a + b }"),
            "Program\n  Func add(a: int, b: int?): int\n    Default b\n      Literal 2\n    Body\n      Return\n        Binary +\n          Identifier a\n          Identifier b\n"
        );
    }

    #[test]
    fn test_declaration_dump() {
        assert_eq!(
            dump("const NAME: string = \"zen\"\nvar maybe?"),
            "Program\n  Const NAME: string\n    Literal \"zen\"\n  Var maybe?\n"
        );
    }

    #[test]
    fn test_for_in_dump() {
        assert_eq!(
            dump("for k, v in table { continue }"),
            "Program\n  ForIn k, v\n    In\n      Identifier table\n    Body\n      Continue\n"
        );
    }

    #[test]
    fn test_void_function() {
        assert!(dump("func noop() {}").contains("Func noop(): void"));
    }
}
