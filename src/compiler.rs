#![deny(missing_docs)]

//! # Source Validation
//!
//! `Compiler` checks rendered source with the rust-analyzer syntax library:
//! parse errors are fatal diagnostics, unresolved extension bases are
//! warnings. Success yields a [`CompiledModule`] exposing the exported type
//! names, with an opt-in smoke test that default-constructs every concrete
//! exported type through a registry.

use crate::error::{AppError, AppResult};
use crate::registry::{TypeRegistry, Value};
use ra_ap_edition::Edition;
use ra_ap_syntax::ast::{self, HasName, HasVisibility};
use ra_ap_syntax::{AstNode, SourceFile};
use regex::Regex;
use tracing::{debug, warn};

/// Diagnostic code for a syntax error.
pub const CODE_SYNTAX_ERROR: u32 = 1001;

/// Diagnostic code for an extension base that resolves nowhere.
pub const CODE_UNRESOLVED_BASE: u32 = 2001;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Non-fatal finding.
    Warning,
    /// Fatal finding.
    Error,
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Numeric diagnostic code.
    pub code: u32,
}

/// A validated module: the source plus its exported concrete surface.
#[derive(Debug, Clone)]
pub struct CompiledModule {
    /// The validated source text.
    pub source: String,
    /// Names of exported (`pub`) structs and enums, in source order.
    pub exported_types: Vec<String>,
}

impl CompiledModule {
    /// Default-constructs every exported type registered as concrete in
    /// `registry`. Abstract types are logged and skipped; unregistered
    /// names are skipped silently (value holders and collections have no
    /// registry presence).
    pub fn instantiate_objects(&self, registry: &TypeRegistry) -> Vec<Value> {
        let mut values = Vec::new();
        for name in &self.exported_types {
            let Some(ty) = registry.get(name) else {
                debug!("'{}' has no registry entry, not instantiated", name);
                continue;
            };
            if ty.is_abstract {
                warn!("'{}' is abstract, not instantiated", name);
                continue;
            }
            match registry.instantiate(name) {
                Ok(value) => values.push(value),
                Err(e) => warn!("default construction of '{}' failed: {}", name, e),
            }
        }
        values
    }
}

/// The result of a validation run.
#[derive(Debug)]
pub struct CompileResult {
    /// True when no error-severity diagnostic was produced.
    pub success: bool,
    /// All findings, errors and warnings both.
    pub diagnostics: Vec<Diagnostic>,
    /// The module, present only on success.
    pub module: Option<CompiledModule>,
}

impl CompileResult {
    /// Error-severity findings.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// Warning-severity findings.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}

/// Validates rendered source.
#[derive(Debug, Default)]
pub struct Compiler {
    /// Type names supplied by the environment; extension bases resolving to
    /// one of these do not warn.
    pub references: Vec<String>,
    /// When true, a failed run becomes an `AppError::Compile` summarizing
    /// every diagnostic instead of a result with `success == false`.
    pub throw_exceptions: bool,
}

impl Compiler {
    /// Creates a validator with no references.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs validation over one source text.
    pub fn compile(&self, source: &str) -> AppResult<CompileResult> {
        let parse = SourceFile::parse(source, Edition::Edition2021);
        let mut diagnostics: Vec<Diagnostic> = parse
            .errors()
            .iter()
            .map(|e| Diagnostic {
                severity: Severity::Error,
                message: format!("{} at offset {}", e, u32::from(e.range().start())),
                code: CODE_SYNTAX_ERROR,
            })
            .collect();

        let tree = parse.tree();
        let exported_types = exported_type_names(&tree);

        // Extension bases must name a declared or referenced type.
        for base in extension_bases(source) {
            let declared = declared_type_names(&tree).contains(&base);
            let referenced = self.references.iter().any(|r| r == &base);
            if !declared && !referenced {
                diagnostics.push(Diagnostic {
                    severity: Severity::Warning,
                    message: format!("extension base '{}' does not resolve", base),
                    code: CODE_UNRESOLVED_BASE,
                });
            }
        }

        let success = !diagnostics.iter().any(|d| d.severity == Severity::Error);
        if !success && self.throw_exceptions {
            let summary: Vec<String> = diagnostics
                .iter()
                .map(|d| format!("[{}] {}", d.code, d.message))
                .collect();
            return Err(AppError::Compile(format!(
                "{} diagnostic(s): {}",
                summary.len(),
                summary.join("; ")
            )));
        }

        let module = success.then(|| CompiledModule {
            source: source.to_string(),
            exported_types,
        });

        Ok(CompileResult {
            success,
            diagnostics,
            module,
        })
    }
}

fn exported_type_names(tree: &SourceFile) -> Vec<String> {
    let mut names = Vec::new();
    for node in tree.syntax().descendants() {
        if let Some(decl) = ast::Struct::cast(node.clone()) {
            if decl.visibility().is_some() {
                if let Some(name) = decl.name() {
                    names.push(name.text().to_string());
                }
            }
        } else if let Some(decl) = ast::Enum::cast(node) {
            if decl.visibility().is_some() {
                if let Some(name) = decl.name() {
                    names.push(name.text().to_string());
                }
            }
        }
    }
    names
}

fn declared_type_names(tree: &SourceFile) -> Vec<String> {
    let mut names = Vec::new();
    for node in tree.syntax().descendants() {
        let name = ast::Struct::cast(node.clone())
            .and_then(|s| s.name())
            .or_else(|| ast::Enum::cast(node).and_then(|e| e.name()));
        if let Some(name) = name {
            names.push(name.text().to_string());
        }
    }
    names
}

fn extension_bases(source: &str) -> Vec<String> {
    // The marker is emitted by the renderer, so the shape is fixed.
    match Regex::new(r"#\[extends\((\w+)\)\]") {
        Ok(re) => re
            .captures_iter(source)
            .map(|c| c[1].to_string())
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{RecordType, ValueType};

    #[test]
    fn test_valid_source_succeeds() {
        let source = "pub struct Person { pub name: String }\npub enum Priority { Low, High }\n";
        let result = Compiler::new().compile(source).unwrap();
        assert!(result.success);
        assert_eq!(
            result.module.unwrap().exported_types,
            vec!["Person", "Priority"]
        );
    }

    #[test]
    fn test_syntax_error_fails() {
        let result = Compiler::new().compile("pub struct {").unwrap();
        assert!(!result.success);
        assert!(result.module.is_none());
        assert!(result.errors().all(|d| d.code == CODE_SYNTAX_ERROR));
    }

    #[test]
    fn test_throw_exceptions_aggregates() {
        let compiler = Compiler {
            throw_exceptions: true,
            ..Default::default()
        };
        let err = compiler.compile("pub struct {").unwrap_err();
        assert!(matches!(err, AppError::Compile(_)));
    }

    #[test]
    fn test_unresolved_base_is_warning_only() {
        let source = "#[extends(Missing)]\npub struct Employee { pub id: i64 }\n";
        let result = Compiler::new().compile(source).unwrap();
        assert!(result.success);
        assert_eq!(result.warnings().count(), 1);
        assert_eq!(
            result.warnings().next().unwrap().code,
            CODE_UNRESOLVED_BASE
        );
    }

    #[test]
    fn test_referenced_base_does_not_warn() {
        let source = "#[extends(Person)]\npub struct Employee { pub id: i64 }\n";
        let compiler = Compiler {
            references: vec!["Person".to_string()],
            ..Default::default()
        };
        let result = compiler.compile(source).unwrap();
        assert_eq!(result.warnings().count(), 0);
    }

    #[test]
    fn test_instantiate_objects_skips_abstract() {
        let source = "pub struct Person { pub name: String }\npub struct Shape { pub id: i64 }\n";
        let result = Compiler::new().compile(source).unwrap();
        let module = result.module.unwrap();

        let mut registry = TypeRegistry::new();
        registry.register(RecordType::new("Person").with_field("Name", ValueType::String));
        let mut shape = RecordType::new("Shape");
        shape.is_abstract = true;
        registry.register(shape);

        let values = module.instantiate_objects(&registry);
        assert_eq!(values.len(), 1);
    }
}
