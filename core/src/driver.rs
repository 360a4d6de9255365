//! Driver that reads one source file, parses it with tree-sitter, and writes
//! the serialized tree (or a classified error) to the given streams.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde_json::value::RawValue;
use tracing::{debug, warn};
use tree_sitter::Parser;

use crate::error::{DriverError, Result, WalkError};
use crate::parser::languages::{FieldTable, Grammar, Language};
use crate::parser::serialize::{SerializationResult, SerializeOptions};
use crate::parser::walk::{first_error, CstWalker};
use crate::types::{ErrorKind, ErrorPayload, ExitOutcome, OutputShape, RunConfig, StructuredOutput};

/// A parser with its grammar loaded, plus the grammar's field table.
struct LoadedGrammar {
    parser: Parser,
    grammar: &'static dyn Grammar,
    table: &'static FieldTable,
}

impl LoadedGrammar {
    /// Fails before any parsing when the runtime rejects the grammar.
    fn load(language: Language) -> Result<Self> {
        let grammar = language.grammar();
        let mut parser = Parser::new();
        parser
            .set_language(grammar.language())
            .map_err(|source| DriverError::VersionUnsupported {
                language: grammar.name(),
                source,
            })?;
        let table = grammar.field_table().map_err(DriverError::Grammar)?;
        Ok(Self {
            parser,
            grammar,
            table,
        })
    }

    fn serialize(
        &mut self,
        source: &str,
        file: &Path,
        options: &SerializeOptions,
    ) -> Result<SerializationResult> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| DriverError::parse(file, "parser returned no tree"))?;
        let root = tree.root_node();

        if let Some(node) = first_error(root) {
            let at = node.start_position();
            let what = if node.is_missing() {
                format!("missing `{}`", node.kind())
            } else {
                "syntax error".to_string()
            };
            debug!(
                file = %file.display(),
                line = at.row + 1,
                column = at.column,
                kind = node.kind(),
                "first syntax error"
            );
            return Err(DriverError::parse(
                file,
                format!("{what} at line {}, column {}", at.row + 1, at.column),
            ));
        }

        let syntax = CstWalker::new(self.grammar, self.table, source).build(root)?;
        let result = syntax.to_ast_json(options)?;
        debug!(
            grammar = self.grammar.name(),
            count = result.count,
            "serialized syntax tree"
        );
        Ok(result)
    }
}

/// Serialize in-memory source without touching the filesystem.
pub fn serialize_source(
    source: &str,
    language: Language,
    options: &SerializeOptions,
) -> Result<SerializationResult> {
    LoadedGrammar::load(language)?.serialize(source, Path::new("<memory>"), options)
}

/// Render the stdout payload for a successful run.
pub fn render(result: &SerializationResult, shape: OutputShape) -> Result<String> {
    match shape {
        OutputShape::Count => Ok(result.count.to_string()),
        OutputShape::Structured => {
            let ast_json: &RawValue = serde_json::from_str(&result.text)
                .map_err(|e| WalkError::contract("ast_json", e.to_string()))?;
            let payload = StructuredOutput {
                ast_count: result.count,
                ast_json,
            };
            let mut line = serde_json::to_string(&payload)
                .map_err(|e| WalkError::contract("ast_json", e.to_string()))?;
            line.push('\n');
            Ok(line)
        }
    }
}

pub struct Driver {
    config: RunConfig,
}

impl Driver {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Load the grammar, read the file, parse and serialize it.
    pub fn run(&self) -> Result<SerializationResult> {
        let path = &self.config.input;
        let language = self.config.resolved_language();
        let mut loaded = LoadedGrammar::load(language)?;

        let bytes = fs::read(path).map_err(|source| DriverError::Io {
            path: path.clone(),
            source,
        })?;
        let source = String::from_utf8(bytes).map_err(|source| DriverError::Encoding {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), bytes = source.len(), ?language, "read source");

        loaded.serialize(&source, path, &self.config.serialize_options())
    }

    /// Run and report through [`emit`].
    pub fn execute<O, E>(&self, stdout: &mut O, stderr: &mut E) -> ExitOutcome
    where
        O: Write,
        E: Write,
    {
        emit(self.run(), self.config.output, stdout, stderr)
    }
}

/// Report one serialization outcome: the payload goes to `stdout` on
/// success, a single `{"errType": ...}` line goes to `stderr` on failure.
/// Nothing reaches `stdout` unless rendering succeeded.
pub fn emit<O, E>(
    outcome: Result<SerializationResult>,
    shape: OutputShape,
    stdout: &mut O,
    stderr: &mut E,
) -> ExitOutcome
where
    O: Write,
    E: Write,
{
    let payload = outcome.and_then(|result| render(&result, shape));

    let kind = match payload {
        Ok(text) => match stdout
            .write_all(text.as_bytes())
            .and_then(|_| stdout.flush())
        {
            Ok(()) => return ExitOutcome::Success,
            Err(e) => {
                warn!(error = %e, "failed to write output");
                ErrorKind::IoError
            }
        },
        Err(e) => {
            warn!(error = %e, kind = ?e.kind(), "ast2json failed");
            e.kind()
        }
    };

    report_error(stderr, kind);
    ExitOutcome::Failure(kind)
}

fn report_error<E: Write>(stderr: &mut E, kind: ErrorKind) {
    let line = serde_json::to_string(&ErrorPayload::from(kind))
        .unwrap_or_else(|_| String::from("{\"errType\":\"INTERNAL_ERROR\"}"));
    // Nothing left to report to if stderr itself fails.
    let _ = writeln!(stderr, "{line}").and_then(|_| stderr.flush());
}
