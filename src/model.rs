//! Suite file model and the line based reference parser

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Error while reading or parsing a source file
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error("Invalid file {}: {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

/// Kind of source file, decided by its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Suite initialization file (`__init__.robot`)
    Init,
    /// Resource file (`*.resource`)
    Resource,
    /// Any other suite file
    Suite,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Self {
        if path.file_stem().and_then(|s| s.to_str()) == Some("__init__") {
            FileKind::Init
        } else if path.extension().and_then(|e| e.to_str()) == Some("resource") {
            FileKind::Resource
        } else {
            FileKind::Suite
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Settings,
    Variables,
    TestCases,
    Tasks,
    Keywords,
    Comments,
    /// Header not recognised in any enabled language
    Invalid,
}

/// Localised section headers (language, header, kind)
const HEADER_TRANSLATIONS: &[(&str, &str, SectionKind)] = &[
    ("en", "settings", SectionKind::Settings),
    ("en", "setting", SectionKind::Settings),
    ("en", "variables", SectionKind::Variables),
    ("en", "variable", SectionKind::Variables),
    ("en", "test cases", SectionKind::TestCases),
    ("en", "test case", SectionKind::TestCases),
    ("en", "tasks", SectionKind::Tasks),
    ("en", "task", SectionKind::Tasks),
    ("en", "keywords", SectionKind::Keywords),
    ("en", "keyword", SectionKind::Keywords),
    ("en", "comments", SectionKind::Comments),
    ("en", "comment", SectionKind::Comments),
    ("fi", "asetukset", SectionKind::Settings),
    ("fi", "muuttujat", SectionKind::Variables),
    ("fi", "testit", SectionKind::TestCases),
    ("fi", "tehtävät", SectionKind::Tasks),
    ("fi", "avainsanat", SectionKind::Keywords),
    ("fi", "kommentit", SectionKind::Comments),
    ("de", "einstellungen", SectionKind::Settings),
    ("de", "variablen", SectionKind::Variables),
    ("de", "testfälle", SectionKind::TestCases),
    ("de", "aufgaben", SectionKind::Tasks),
    ("de", "schlüsselwörter", SectionKind::Keywords),
    ("de", "kommentare", SectionKind::Comments),
];

impl SectionKind {
    /// Map a header name to a section kind; English is always accepted
    pub fn from_header(name: &str, languages: &[String]) -> Self {
        let name = name.trim().to_lowercase();
        HEADER_TRANSLATIONS
            .iter()
            .find(|(lang, header, _)| {
                *header == name && (*lang == "en" || languages.iter().any(|l| l == lang))
            })
            .map(|(_, _, kind)| *kind)
            .unwrap_or(SectionKind::Invalid)
    }

    fn holds_blocks(&self) -> bool {
        matches!(
            self,
            SectionKind::TestCases | SectionKind::Tasks | SectionKind::Keywords
        )
    }

    fn holds_entries(&self) -> bool {
        matches!(self, SectionKind::Settings | SectionKind::Variables)
    }
}

/// A named test case, task or keyword
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub name: String,
    pub line: usize,
    pub end_line: usize,
}

/// A setting or variable: first cell plus values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub values: Vec<String>,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub header: String,
    pub line: usize,
    pub end_line: usize,
    pub blocks: Vec<Block>,
    pub entries: Vec<Entry>,
}

/// A `#` comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub line: usize,
    /// 1-based column of the `#`
    pub col: usize,
    /// Text including the leading `#`
    pub text: String,
    /// Whether the comment is alone on its line
    pub standalone: bool,
}

/// A parsed suite, resource or init file
#[derive(Debug, Clone)]
pub struct SuiteFile {
    pub path: PathBuf,
    pub kind: FileKind,
    pub lines: Vec<String>,
    pub sections: Vec<Section>,
    pub comments: Vec<Comment>,
    /// First line holding anything other than blanks and comments
    pub first_content_line: Option<usize>,
}

static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}|\t").unwrap());
static INLINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:\s{2,}|\t)#").unwrap());
static HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\*+\s*([^*]+?)\s*\**\s*$").unwrap());

/// Split a line into `(column, cell)` pairs; columns are 1-based
pub fn split_cells(line: &str) -> Vec<(usize, &str)> {
    let mut cells = Vec::new();
    let mut start = 0;
    for sep in SEPARATOR.find_iter(line) {
        if sep.start() > start {
            cells.push((line[..start].chars().count() + 1, &line[start..sep.start()]));
        }
        start = sep.end();
    }
    if start < line.len() {
        let rest = line[start..].trim_end();
        if !rest.is_empty() {
            cells.push((line[..start].chars().count() + 1, rest));
        }
    }
    cells
}

/// Locate a comment on a line: (byte offset of `#`, standalone)
fn find_comment(line: &str) -> Option<(usize, bool)> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return Some((line.len() - trimmed.len(), true));
    }
    INLINE_COMMENT
        .find(line)
        .map(|m| (m.end() - 1, false))
}

impl SuiteFile {
    /// Parse file content
    pub fn parse_str(
        content: &str,
        path: &Path,
        kind: FileKind,
        languages: &[String],
    ) -> Result<Self, ParseError> {
        let lines: Vec<String> = content.lines().map(String::from).collect();
        let mut sections: Vec<Section> = Vec::new();
        let mut comments = Vec::new();
        let mut first_content_line = None;

        for (idx, raw) in lines.iter().enumerate() {
            let line_no = idx + 1;

            let code = match find_comment(raw) {
                Some((offset, standalone)) => {
                    comments.push(Comment {
                        line: line_no,
                        col: raw[..offset].chars().count() + 1,
                        text: raw[offset..].trim_end().to_string(),
                        standalone,
                    });
                    &raw[..offset]
                }
                None => raw.as_str(),
            };

            if code.trim().is_empty() {
                continue;
            }
            first_content_line.get_or_insert(line_no);

            if let Some(caps) = HEADER.captures(code) {
                let header = caps[1].to_string();
                let section_kind = SectionKind::from_header(&header, languages);
                if matches!(section_kind, SectionKind::TestCases | SectionKind::Tasks)
                    && kind != FileKind::Suite
                {
                    return Err(ParseError::Invalid {
                        path: path.to_path_buf(),
                        message: format!(
                            "{} files cannot contain a '{}' section (line {})",
                            if kind == FileKind::Init { "Init" } else { "Resource" },
                            header,
                            line_no
                        ),
                    });
                }
                sections.push(Section {
                    kind: section_kind,
                    header,
                    line: line_no,
                    end_line: line_no,
                    blocks: Vec::new(),
                    entries: Vec::new(),
                });
                continue;
            }

            // Content before the first header is ignored
            let Some(section) = sections.last_mut() else {
                continue;
            };
            section.end_line = line_no;

            let indented = code.starts_with([' ', '\t']);
            let cells = split_cells(code);

            if section.kind.holds_blocks() {
                if !indented {
                    if let Some((_, name)) = cells.first() {
                        section.blocks.push(Block {
                            name: name.to_string(),
                            line: line_no,
                            end_line: line_no,
                        });
                    }
                } else if let Some(block) = section.blocks.last_mut() {
                    block.end_line = line_no;
                }
            } else if section.kind.holds_entries() {
                let Some(&(col, first)) = cells.first() else {
                    continue;
                };
                if first == "..." {
                    if let Some(entry) = section.entries.last_mut() {
                        entry.values.extend(cells[1..].iter().map(|(_, c)| c.to_string()));
                    }
                } else if !indented {
                    section.entries.push(Entry {
                        name: first.to_string(),
                        values: cells[1..].iter().map(|(_, c)| c.to_string()).collect(),
                        line: line_no,
                        col,
                    });
                }
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            kind,
            lines,
            sections,
            comments,
            first_content_line,
        })
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn blocks_in(&self, kinds: &'static [SectionKind]) -> impl Iterator<Item = &Block> {
        self.sections
            .iter()
            .filter(move |s| kinds.contains(&s.kind))
            .flat_map(|s| s.blocks.iter())
    }

    fn entries_in(&self, kind: SectionKind) -> impl Iterator<Item = &Entry> {
        self.sections
            .iter()
            .filter(move |s| s.kind == kind)
            .flat_map(|s| s.entries.iter())
    }

    /// Test cases and tasks
    pub fn test_cases(&self) -> impl Iterator<Item = &Block> {
        self.blocks_in(&[SectionKind::TestCases, SectionKind::Tasks])
    }

    pub fn keywords(&self) -> impl Iterator<Item = &Block> {
        self.blocks_in(&[SectionKind::Keywords])
    }

    pub fn variables(&self) -> impl Iterator<Item = &Entry> {
        self.entries_in(SectionKind::Variables)
    }

    pub fn settings(&self) -> impl Iterator<Item = &Entry> {
        self.entries_in(SectionKind::Settings)
    }

    /// Look up a setting by name, ignoring case
    pub fn setting(&self, name: &str) -> Option<&Entry> {
        self.settings().find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Whether every test in the suite runs from a template
    pub fn is_templated(&self) -> bool {
        if self.kind != FileKind::Suite {
            return false;
        }
        ["Test Template", "Task Template"].iter().any(|name| {
            self.setting(name).is_some_and(|entry| {
                entry
                    .values
                    .first()
                    .is_some_and(|v| !v.eq_ignore_ascii_case("NONE"))
            })
        })
    }
}

/// Turns a source file into a [`SuiteFile`]
pub trait SourceParser: Send + Sync {
    fn parse(&self, path: &Path, kind: FileKind, languages: &[String])
        -> Result<SuiteFile, ParseError>;
}

/// Line based parser for the space separated format
#[derive(Debug, Clone, Copy, Default)]
pub struct TextParser;

impl SourceParser for TextParser {
    fn parse(
        &self,
        path: &Path,
        kind: FileKind,
        languages: &[String],
    ) -> Result<SuiteFile, ParseError> {
        let bytes = std::fs::read(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
        let content = std::str::from_utf8(bytes).map_err(|e| ParseError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        SuiteFile::parse_str(content, path, kind, languages)
    }
}
