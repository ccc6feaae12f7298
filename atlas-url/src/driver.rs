use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term::termcolor::{BufferedStandardStream, ColorChoice, WriteColor};
use std::cell::RefCell;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use crate::codec::registry::CodecRegistry;
use crate::codec::Codec;
use crate::error::DecodeError;
use crate::payload::{self, PayloadError, PayloadTable};
use crate::schema::Schema;
use crate::source::{ByteRange, FileId};
use crate::{framing, json, EXPLORE_SCHEMA};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Error => 1,
        }
    }
}

fn color_choice(stream: atty::Stream) -> ColorChoice {
    if atty::is(stream) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

pub struct Driver {
    files: SimpleFiles<String, String>,
    codecs: CodecRegistry,

    seen_errors: RefCell<bool>,
    codespan_config: codespan_reporting::term::Config,
    diagnostic_writer: RefCell<Box<dyn WriteColor>>,

    emit_writer: RefCell<Box<dyn WriteColor>>,
}

impl Default for Driver {
    fn default() -> Driver {
        Driver::new()
    }
}

impl Driver {
    pub fn new() -> Driver {
        Driver {
            files: SimpleFiles::new(),
            codecs: CodecRegistry::new(),

            seen_errors: RefCell::new(false),
            codespan_config: codespan_reporting::term::Config::default(),
            diagnostic_writer: RefCell::new(Box::new(BufferedStandardStream::stderr(
                color_choice(atty::Stream::Stderr),
            ))),

            emit_writer: RefCell::new(Box::new(BufferedStandardStream::stdout(color_choice(
                atty::Stream::Stdout,
            )))),
        }
    }

    /// Setup a global panic hook
    pub fn install_panic_hook(&self) {
        // Use the currently set codespan configuration
        let term_config = self.codespan_config.clone();
        // Fetch the default hook (which prints the panic message and an optional backtrace)
        let default_hook = std::panic::take_hook();

        std::panic::set_hook(Box::new(move |info| {
            let location = info.location();
            let message = if let Some(message) = info.payload().downcast_ref::<String>() {
                message.as_str()
            } else if let Some(message) = info.payload().downcast_ref::<&str>() {
                message
            } else {
                "unknown panic type"
            };

            let diagnostic = Diagnostic::bug()
                .with_message(format!("atlas-url panicked at '{message}'"))
                .with_notes(vec![
                    match location {
                        Some(location) => format!("panicked at: {location}"),
                        None => "panicked at: unknown location".to_owned(),
                    },
                    "this is a bug in atlas-url, not in its input".to_owned(),
                ]);

            let mut writer = BufferedStandardStream::stderr(color_choice(atty::Stream::Stderr));
            let dummy_files = SimpleFiles::<String, String>::new();

            default_hook(info);
            eprintln!();
            // Already panicking, so there is nowhere left to report a failure
            let _ = codespan_reporting::term::emit(&mut writer, &term_config, &dummy_files, &diagnostic);
            let _ = writer.flush();
        }));
    }

    /// Set the writer to use when rendering diagnostics
    pub fn set_diagnostic_writer(&mut self, stream: impl 'static + WriteColor) {
        self.diagnostic_writer = RefCell::new(Box::new(stream) as Box<dyn WriteColor>);
    }

    /// Set the writer to use when emitting tokens and decoded values
    pub fn set_emit_writer(&mut self, stream: impl 'static + WriteColor) {
        self.emit_writer = RefCell::new(Box::new(stream) as Box<dyn WriteColor>);
    }

    /// Whether any errors have been reported so far.
    pub fn seen_errors(&self) -> bool {
        *self.seen_errors.borrow()
    }

    /// Load a source string into the file database.
    pub fn load_source_string(&mut self, name: String, source: String) -> FileId {
        self.files.add(name, source)
    }

    /// Load the schema that is bundled with atlas-url.
    pub fn load_bundled_schema(&mut self) -> FileId {
        self.load_source_string("<bundled explore.kiwi>".to_owned(), EXPLORE_SCHEMA.to_owned())
    }

    /// Load a source file into the file database using a reader.
    pub fn load_source(&mut self, name: String, mut reader: impl Read) -> Option<FileId> {
        let mut source = String::new();
        match reader.read_to_string(&mut source) {
            Ok(_) => Some(self.load_source_string(name, source)),
            Err(error) => {
                self.emit_read_diagnostic(name, error);
                None
            }
        }
    }

    /// Load a source file into the file database from the given path.
    pub fn load_source_path(&mut self, path: &Path) -> Option<FileId> {
        match std::fs::File::open(path) {
            Ok(file) => self.load_source(path.display().to_string(), file),
            Err(error) => {
                self.emit_read_diagnostic(path.display(), error);
                None
            }
        }
    }

    /// Parse and validate a schema, reporting every problem found.
    pub fn check_schema(&self, file_id: FileId) -> Status {
        let source = match self.source(file_id) {
            Some(source) => source,
            None => return Status::Error,
        };

        match Schema::parse_all(source) {
            Ok(schema) => {
                let count = schema.definitions().len();
                self.emit_diagnostic(Diagnostic::note().with_message(format!(
                    "`{}` defines {count} {}",
                    self.file_name(file_id),
                    if count == 1 { "type" } else { "types" },
                )));
                Status::Ok
            }
            Err(errors) => {
                self.emit_diagnostics(errors.iter().map(|error| error.to_diagnostic(file_id)));
                Status::Error
            }
        }
    }

    /// Read a JSON value from `json_file`, encode it as `type_name`, and emit
    /// the resulting URL token.
    pub fn encode_and_emit(&self, schema_file: FileId, type_name: &str, json_file: FileId) -> Status {
        let codec = match self.compile_schema(schema_file) {
            Some(codec) => codec,
            None => return Status::Error,
        };
        let source = match self.source(json_file) {
            Some(source) => source,
            None => return Status::Error,
        };

        let json = match serde_json::from_str::<serde_json::Value>(source) {
            Ok(json) => json,
            Err(error) => {
                self.emit_diagnostic(self.json_error_to_diagnostic(json_file, &error));
                return Status::Error;
            }
        };
        let bytes = json::to_value(&codec, type_name, &json)
            .and_then(|value| codec.encode(type_name, &value));
        match bytes {
            Ok(bytes) => self.emit_line(&framing::frame(&bytes)),
            Err(error) => {
                self.emit_diagnostic(
                    Diagnostic::error()
                        .with_message(format!("failed to encode `{type_name}`: {error}"))
                        .with_labels(vec![Label::primary(json_file, 0..source.len())
                            .with_message("this value")]),
                );
                Status::Error
            }
        }
    }

    /// Decode a URL token as `type_name`, and emit the value as JSON.
    pub fn decode_and_emit(&self, schema_file: FileId, type_name: &str, token: &str) -> Status {
        let codec = match self.compile_schema(schema_file) {
            Some(codec) => codec,
            None => return Status::Error,
        };

        let bytes = match framing::unframe(token.trim()) {
            Ok(bytes) => bytes,
            Err(error) => {
                self.emit_diagnostic(Diagnostic::error().with_message(error.to_string()));
                return Status::Error;
            }
        };
        let json = codec
            .decode(type_name, &bytes)
            .and_then(|value| json::from_value(&codec, type_name, &value));
        let json = match json {
            Ok(json) => json,
            Err(error) => {
                self.emit_diagnostic(decode_error_to_diagnostic(type_name, &error));
                return Status::Error;
            }
        };
        match serde_json::to_string_pretty(&json) {
            Ok(text) => self.emit_line(&text),
            Err(error) => {
                self.emit_diagnostic(Diagnostic::bug().with_message(error.to_string()));
                Status::Error
            }
        }
    }

    /// Write a token for every annotation in a taxonomy dendrogram.
    pub fn write_annotation_table(&self, dendrogram_file: FileId, output: &Path) -> Status {
        let codec = match self.explore_codec() {
            Some(codec) => codec,
            None => return Status::Error,
        };
        let source = match self.source(dendrogram_file) {
            Some(source) => source,
            None => return Status::Error,
        };

        match payload::annotation_table(&codec, source) {
            Ok(table) => self.write_table(&table, output),
            Err(error) => {
                self.emit_diagnostic(self.payload_error_to_diagnostic(dendrogram_file, &error));
                Status::Error
            }
        }
    }

    /// Write a token for every marker set in a tab-separated gene table.
    pub fn write_gene_table(&self, genes_file: FileId, output: &Path) -> Status {
        let codec = match self.explore_codec() {
            Some(codec) => codec,
            None => return Status::Error,
        };
        let source = match self.source(genes_file) {
            Some(source) => source,
            None => return Status::Error,
        };

        match payload::gene_table(&codec, source) {
            Ok(table) => self.write_table(&table, output),
            Err(error) => {
                self.emit_diagnostic(self.payload_error_to_diagnostic(genes_file, &error));
                Status::Error
            }
        }
    }

    fn write_table(&self, table: &PayloadTable, output: &Path) -> Status {
        let result = payload::table_to_json(table).and_then(|text| {
            std::fs::write(output, text).map_err(|error| PayloadError::Io {
                path: output.to_owned(),
                error,
            })
        });
        match result {
            Ok(()) => {
                self.emit_diagnostic(Diagnostic::note().with_message(format!(
                    "payload table with {} entries written to `{}`",
                    table.len(),
                    output.display(),
                )));
                Status::Ok
            }
            Err(error) => {
                self.emit_diagnostic(
                    Diagnostic::error().with_message(format!("couldn't write table: {error}")),
                );
                Status::Error
            }
        }
    }

    /// Compile the schema in `file_id`, reporting every problem if it is
    /// invalid.
    fn compile_schema(&self, file_id: FileId) -> Option<Arc<Codec>> {
        let source = self.source(file_id)?;
        match self.codecs.get_or_compile(source) {
            Ok(codec) => Some(codec),
            Err(error) => {
                let errors = Schema::parse_all(source).err().unwrap_or_else(|| vec![error]);
                self.emit_diagnostics(errors.iter().map(|error| error.to_diagnostic(file_id)));
                None
            }
        }
    }

    fn explore_codec(&self) -> Option<Arc<Codec>> {
        match self.codecs.get_or_compile(EXPLORE_SCHEMA) {
            Ok(codec) => Some(codec),
            Err(error) => {
                self.emit_diagnostic(
                    Diagnostic::bug()
                        .with_message(format!("bundled schema is invalid: {error}")),
                );
                None
            }
        }
    }

    fn source(&self, file_id: FileId) -> Option<&str> {
        match self.files.get(file_id) {
            Ok(file) => Some(file.source()),
            Err(error) => {
                self.emit_diagnostic(Diagnostic::bug().with_message(error.to_string()));
                None
            }
        }
    }

    fn file_name(&self, file_id: FileId) -> String {
        match self.files.name(file_id) {
            Ok(name) => name,
            Err(_) => "<unknown>".to_owned(),
        }
    }

    fn emit_line(&self, text: &str) -> Status {
        let mut emit_writer = self.emit_writer.borrow_mut();
        let result = writeln!(emit_writer, "{text}").and_then(|()| emit_writer.flush());
        drop(emit_writer);

        match result {
            Ok(()) => Status::Ok,
            Err(error) => {
                self.emit_diagnostic(
                    Diagnostic::error().with_message(format!("couldn't write output: {error}")),
                );
                Status::Error
            }
        }
    }

    fn emit_diagnostic(&self, diagnostic: Diagnostic<FileId>) {
        let mut writer = self.diagnostic_writer.borrow_mut();
        let config = &self.codespan_config;

        // Diagnostics are the last resort for reporting, so failures to write
        // them are dropped
        let _ = codespan_reporting::term::emit(&mut *writer, config, &self.files, &diagnostic);
        let _ = writer.flush();

        if diagnostic.severity >= Severity::Error {
            *self.seen_errors.borrow_mut() = true;
        }
    }

    fn emit_diagnostics(&self, diagnostics: impl Iterator<Item = Diagnostic<FileId>>) {
        for diagnostic in diagnostics {
            self.emit_diagnostic(diagnostic);
        }
    }

    fn emit_read_diagnostic(&self, name: impl std::fmt::Display, error: std::io::Error) {
        let diagnostic =
            Diagnostic::error().with_message(format!("couldn't read `{name}`: {error}"));
        self.emit_diagnostic(diagnostic);
    }

    /// Locate a JSON error in its source file.
    fn json_error_range(&self, file_id: FileId, error: &serde_json::Error) -> Option<ByteRange> {
        let line = error.line().checked_sub(1)?;
        let line_range = self.files.line_range(file_id, line).ok()?;
        let start = line_range.start + error.column().saturating_sub(1);
        let start = std::cmp::min(start, line_range.end);
        Some(ByteRange::point(u32::try_from(start).ok()?))
    }

    fn json_error_to_diagnostic(&self, file_id: FileId, error: &serde_json::Error) -> Diagnostic<FileId> {
        let diagnostic = Diagnostic::error().with_message(format!("invalid JSON: {error}"));
        match self.json_error_range(file_id, error) {
            Some(range) => diagnostic.with_labels(vec![Label::primary(file_id, range)]),
            None => diagnostic,
        }
    }

    fn payload_error_to_diagnostic(&self, file_id: FileId, error: &PayloadError) -> Diagnostic<FileId> {
        match error {
            PayloadError::Json(error) => self.json_error_to_diagnostic(file_id, error),
            PayloadError::MissingColumn { .. } | PayloadError::EmptyTable => Diagnostic::error()
                .with_message(error.to_string())
                .with_notes(vec![
                    "gene tables need the columns `Cell_label`, `Labelset`, `Markers_label` and `defined_class`"
                        .to_owned(),
                ]),
            PayloadError::ShortRow { line, .. } => {
                let diagnostic = Diagnostic::error().with_message(error.to_string());
                match self.files.line_range(file_id, line - 1) {
                    Ok(range) => diagnostic
                        .with_labels(vec![Label::primary(file_id, range).with_message("this row")]),
                    Err(_) => diagnostic,
                }
            }
            PayloadError::Decode(error) => {
                decode_error_to_diagnostic(payload::PAYLOAD_TYPE, error)
            }
            PayloadError::Io { .. } | PayloadError::Encode(_) | PayloadError::Framing(_) => {
                Diagnostic::error().with_message(error.to_string())
            }
        }
    }
}

fn decode_error_to_diagnostic(type_name: &str, error: &DecodeError) -> Diagnostic<FileId> {
    let diagnostic =
        Diagnostic::error().with_message(format!("failed to decode `{type_name}`: {error}"));
    match error {
        DecodeError::UnexpectedEndOfBuffer { .. } => diagnostic.with_notes(vec![
            "the token ends before the value is complete, it may have been truncated".to_owned(),
        ]),
        DecodeError::UnknownField { .. } => diagnostic.with_notes(vec![
            "the token may have been produced with a newer schema".to_owned(),
        ]),
        DecodeError::TrailingBytes { .. } => diagnostic.with_notes(vec![
            "the token may have been produced with a different schema".to_owned(),
        ]),
        _ => diagnostic,
    }
}
