use std::io;

use camino::Utf8Path;
use rustc_hash::FxHashMap;
pub use sable_errors::{ParseError, ParseErrorKind, Renderer};
pub use sable_inputs::{
    ContentProvider, File, Files, FsContentProvider, Location, MemoryContentProvider, OutOfRange,
    Position, TextEdit,
};
pub use sable_parse::{Ast, Node, NodeId, Parse, Reparse, get_parse_errors};
pub use sable_tokenizer::{Splice, TokenArray};
use salsa::{Database, DatabaseImpl};
use text_size::TextRange;
use tracing::debug;

/// Tokens and tree of one file, built from its current text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub tokens: TokenArray,
    pub parse: Parse,
}

impl Parsed {
    fn new(text: &str) -> Self {
        let tokens = TokenArray::new(text);
        let parse = sable_parse::parse(text, &tokens);
        Self { tokens, parse }
    }

    pub fn errors(&self) -> Vec<ParseError> {
        get_parse_errors(self.tokens.errors(), &self.parse)
    }
}

/// From-scratch parse of `file`, memoized until its text changes.
#[salsa::tracked(returns(ref), no_eq)]
pub fn parse_file(db: &dyn Database, file: File) -> Parsed {
    Parsed::new(file.text(db))
}

/// What [`Workspace::edit`] did to the cached state of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edited {
    pub edit: TextEdit,
    /// `None` when the file had not been parsed yet.
    pub splice: Option<Splice>,
    pub reparse: Option<Reparse>,
}

/// Open files together with their incrementally maintained parses.
pub struct Workspace {
    db: DatabaseImpl,
    files: Files,
    documents: FxHashMap<File, Parsed>,
}

impl Workspace {
    pub fn new(provider: impl ContentProvider + 'static) -> Self {
        let files = Files::new(provider);
        Self { db: DatabaseImpl::new(), files, documents: FxHashMap::default() }
    }

    pub fn db(&self) -> &dyn Database {
        &self.db
    }

    /// Loads `path` through the content provider, once.
    pub fn open(&mut self, path: &Utf8Path) -> io::Result<File> {
        self.files.get_or_load(&self.db, path)
    }

    /// Registers in-memory text under `path`, dropping any cached parse.
    pub fn insert(&mut self, path: &Utf8Path, text: impl Into<String>) -> File {
        if let Some(previous) = self.files.get(path) {
            self.documents.remove(&previous);
        }
        self.files.insert(&self.db, path.to_owned(), text.into())
    }

    /// Number of files with a cached parse.
    pub fn parsed_len(&self) -> usize {
        self.documents.len()
    }

    pub fn path(&self, file: File) -> &Utf8Path {
        file.path(&self.db)
    }

    pub fn text(&self, file: File) -> &str {
        file.text(&self.db)
    }

    fn document(&mut self, file: File) -> &Parsed {
        self.documents.entry(file).or_insert_with(|| {
            debug!(path = %file.path(&self.db), "parsing");
            Parsed::new(file.text(&self.db))
        })
    }

    pub fn tokens(&mut self, file: File) -> &TokenArray {
        &self.document(file).tokens
    }

    pub fn parse(&mut self, file: File) -> &Parse {
        &self.document(file).parse
    }

    /// Replaces `range` of the file's text with `replacement`.
    ///
    /// A parsed file has its token array spliced and its tree reparsed on
    /// the spot; the line table is rebuilt lazily.
    pub fn edit(
        &mut self,
        file: File,
        range: TextRange,
        replacement: &str,
    ) -> Result<Edited, OutOfRange> {
        let edit = sable_inputs::edit(&mut self.db, file, range, replacement)?;
        let text = file.text(&self.db);

        let Some(document) = self.documents.get_mut(&file) else {
            debug!(path = %file.path(&self.db), "edited a file that was never parsed");
            return Ok(Edited { edit, splice: None, reparse: None });
        };

        let splice = document.tokens.apply_edit(text, edit);
        let reparse = document.parse.reparse(text, &document.tokens, splice, edit);
        debug!(path = %file.path(&self.db), ?splice, ?reparse, "applied edit");

        Ok(Edited { edit, splice: Some(splice), reparse: Some(reparse) })
    }

    /// Every diagnostic of `file`, ordered by offset; empty until the file
    /// has been parsed.
    pub fn get_parse_errors(&self, file: File) -> Vec<ParseError> {
        self.documents.get(&file).map_or_else(Vec::new, Parsed::errors)
    }

    /// Renders `error` in the `path:line:col - error <code>: <message>` form.
    pub fn render(&self, file: File, error: &ParseError) -> String {
        let path = file.path(&self.db);
        error.render(path.as_str(), file.text(&self.db), file.line_table(&self.db))
    }

    pub fn render_snippet(&self, file: File, error: &ParseError, renderer: &Renderer) -> String {
        error.render_snippet(renderer, file.path(&self.db).as_str(), file.text(&self.db))
    }

    /// Forgets every file and cached parse.
    pub fn reset(&mut self) {
        self.files.reset();
        self.documents.clear();
    }
}
