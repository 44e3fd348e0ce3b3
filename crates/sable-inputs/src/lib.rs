use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;
pub use sable_span::{LineCol, LineTable, OutOfRange, TextEdit};
use salsa::{Database, Setter as _};
use text_size::{TextLen as _, TextRange, TextSize};
use tracing::debug;

#[salsa::input(debug)]
pub struct File {
    #[returns(ref)]
    pub path: Utf8PathBuf,
    #[returns(deref)]
    pub text: String,
}

#[salsa::tracked]
impl File {
    #[salsa::tracked(returns(ref), no_eq)]
    pub fn line_table(self, db: &dyn Database) -> LineTable {
        LineTable::new(self.text(db))
    }
}

/// Replaces `range` of the file's text with `replacement`.
///
/// Everything derived from the old text (the line table included) is
/// recomputed on next access.
pub fn edit(
    db: &mut dyn Database,
    file: File,
    range: TextRange,
    replacement: &str,
) -> Result<TextEdit, OutOfRange> {
    let old = file.text(&*db);
    if old.get(std::ops::Range::<usize>::from(range)).is_none() {
        return Err(OutOfRange { offset: range.end(), len: old.text_len() });
    }

    let mut text = old.to_owned();
    text.replace_range(std::ops::Range::<usize>::from(range), replacement);
    file.set_text(db).to(text);

    Ok(TextEdit::replace(range, replacement))
}

/// A byte offset inside one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub file: File,
    pub offset: TextSize,
}

impl Position {
    pub fn new(file: File, offset: TextSize) -> Self {
        Self { file, offset }
    }

    pub fn add(self, len: TextSize) -> Self {
        Self { file: self.file, offset: self.offset + len }
    }

    pub fn line_col(self, db: &dyn Database) -> Result<LineCol, OutOfRange> {
        self.file.line_table(db).line_col(self.offset)
    }
}

/// A half-open span inside one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: File,
    pub range: TextRange,
}

impl Location {
    pub fn new(file: File, range: TextRange) -> Self {
        Self { file, range }
    }

    pub fn start(self) -> Position {
        Position::new(self.file, self.range.start())
    }

    pub fn end(self) -> Position {
        Position::new(self.file, self.range.end())
    }

    pub fn text(self, db: &dyn Database) -> &str {
        &self.file.text(db)[self.range]
    }
}

/// Source of file contents, consulted once per path.
pub trait ContentProvider {
    fn read(&self, path: &Utf8Path) -> io::Result<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FsContentProvider;

impl ContentProvider for FsContentProvider {
    fn read(&self, path: &Utf8Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryContentProvider {
    files: FxHashMap<Utf8PathBuf, String>,
}

impl MemoryContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<Utf8PathBuf>, text: impl Into<String>) -> Self {
        self.files.insert(path.into(), text.into());
        self
    }
}

impl ContentProvider for MemoryContentProvider {
    fn read(&self, path: &Utf8Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such file `{path}`"))
        })
    }
}

/// Registry of loaded files, keyed by path.
pub struct Files {
    provider: Box<dyn ContentProvider>,
    files: FxHashMap<Utf8PathBuf, File>,
}

impl Files {
    pub fn new(provider: impl ContentProvider + 'static) -> Self {
        Self { provider: Box::new(provider), files: FxHashMap::default() }
    }

    pub fn get(&self, path: &Utf8Path) -> Option<File> {
        self.files.get(path).copied()
    }

    /// Returns the file for `path`, reading it through the provider on first
    /// request.
    pub fn get_or_load(&mut self, db: &dyn Database, path: &Utf8Path) -> io::Result<File> {
        if let Some(file) = self.get(path) {
            return Ok(file);
        }

        let text = self.provider.read(path)?;
        debug!(%path, len = text.len(), "loaded source");
        Ok(self.insert(db, path.to_owned(), text))
    }

    /// Registers `text` under `path`, replacing any previous entry.
    pub fn insert(&mut self, db: &dyn Database, path: Utf8PathBuf, text: String) -> File {
        let file = File::new(db, path.clone(), text);
        self.files.insert(path, file);
        file
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn reset(&mut self) {
        self.files.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use salsa::DatabaseImpl;

    use super::*;

    struct Counting {
        inner: MemoryContentProvider,
        reads: Rc<Cell<usize>>,
    }

    impl ContentProvider for Counting {
        fn read(&self, path: &Utf8Path) -> io::Result<String> {
            self.reads.set(self.reads.get() + 1);
            self.inner.read(path)
        }
    }

    #[test]
    fn line_table_follows_edits() {
        let mut db = DatabaseImpl::new();
        let file = File::new(&db, "a.sbl".into(), "func a()\nfunc b()".to_owned());

        assert_eq!(file.line_table(&db).line_count(), 2);
        let position = Position::new(file, 9.into());
        assert_eq!(position.line_col(&db), Ok(LineCol { line: 2, col: 1 }));

        let applied = edit(&mut db, file, TextRange::new(8.into(), 9.into()), "\n\n").unwrap();
        assert_eq!(applied, TextEdit::new(8.into(), 9.into(), 10.into()));
        assert_eq!(file.text(&db), "func a()\n\nfunc b()");
        assert_eq!(file.line_table(&db).line_count(), 3);
        assert_eq!(position.line_col(&db), Ok(LineCol { line: 2, col: 1 }));
        assert_eq!(position.add(1.into()).line_col(&db), Ok(LineCol { line: 3, col: 1 }));
    }

    #[test]
    fn edit_rejects_ranges_outside_the_text() {
        let mut db = DatabaseImpl::new();
        let file = File::new(&db, "a.sbl".into(), "abc".to_owned());

        let error = edit(&mut db, file, TextRange::new(2.into(), 5.into()), "x").unwrap_err();
        assert_eq!(error, OutOfRange { offset: 5.into(), len: 3.into() });
        assert_eq!(file.text(&db), "abc");
    }

    #[test]
    fn location_text() {
        let db = DatabaseImpl::new();
        let file = File::new(&db, "a.sbl".into(), "func main()".to_owned());
        let location = Location::new(file, TextRange::new(5.into(), 9.into()));

        assert_eq!(location.text(&db), "main");
        assert_eq!(location.start().line_col(&db), Ok(LineCol { line: 1, col: 6 }));
        assert_eq!(location.end().offset, TextSize::new(9));
    }

    #[test]
    fn registry_reads_each_path_once() {
        let db = DatabaseImpl::new();
        let reads = Rc::new(Cell::new(0));
        let provider = Counting {
            inner: MemoryContentProvider::new().with("main.sbl", "func main()"),
            reads: reads.clone(),
        };
        let mut files = Files::new(provider);

        let first = files.get_or_load(&db, "main.sbl".into()).unwrap();
        let second = files.get_or_load(&db, "main.sbl".into()).unwrap();
        assert_eq!(first, second);
        assert_eq!(reads.get(), 1);
        assert_eq!(first.text(&db), "func main()");

        let missing = files.get_or_load(&db, "other.sbl".into()).unwrap_err();
        assert_eq!(missing.kind(), io::ErrorKind::NotFound);
        assert_eq!(files.len(), 1);
        assert_eq!(reads.get(), 2);

        files.reset();
        assert!(files.is_empty());
        files.get_or_load(&db, "main.sbl".into()).unwrap();
        assert_eq!(reads.get(), 3);
    }
}
