//! Paragraph extraction from `.docx` files
//!
//! A `.docx` file is a zip archive. Its body lives in `word/document.xml` as
//! WordprocessingML, where every paragraph is a `w:p` element and the visible
//! text sits in descendant text nodes (mostly `w:t` runs).

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Read, Seek},
    path::{Path, PathBuf},
};

use quick_xml::{
    events::Event,
    name::{Namespace, ResolveResult},
    reader::NsReader,
};
use tracing::instrument;
use zip::result::ZipError;

/// The archive member holding the document body.
pub const DOCUMENT_MEMBER: &str = "word/document.xml";

/// The WordprocessingML main namespace.
pub const WORD_NAMESPACE: &[u8] = b"http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Errors raised while extracting paragraphs.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The file could not be opened.
    #[error("failed to open {}", .path.display())]
    Io {
        /// The file that could not be opened.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The file is not a readable zip archive.
    #[error("{} is not a valid .docx archive", .path.display())]
    Archive {
        /// The offending file.
        path: PathBuf,
        /// The underlying error.
        source: ZipError,
    },

    /// The archive has no document body.
    #[error("{} has no {DOCUMENT_MEMBER}", .0.display())]
    MissingMember(PathBuf),

    /// The document body is not well-formed XML.
    #[error("malformed document XML")]
    Xml(#[from] quick_xml::Error),
}

/// Read the flattened text of every paragraph of a `.docx` file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, is not a zip archive, has
/// no document body, or the body is not well-formed XML.
#[instrument(level = "debug", fields(path = %path.display()))]
pub fn paragraphs_from_docx(path: &Path) -> Result<Vec<String>, SourceError> {
    let file = File::open(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let paragraphs = paragraphs_from_archive(file, path)?;
    tracing::debug!("Read {} paragraphs", paragraphs.len());
    Ok(paragraphs)
}

/// Read paragraphs from any reader over a `.docx` archive.
///
/// `name` is only used in error messages.
///
/// # Errors
///
/// See [`paragraphs_from_docx`].
pub fn paragraphs_from_archive<R: Read + Seek>(
    reader: R,
    name: &Path,
) -> Result<Vec<String>, SourceError> {
    let mut archive = zip::ZipArchive::new(reader).map_err(|source| SourceError::Archive {
        path: name.to_path_buf(),
        source,
    })?;

    let member = match archive.by_name(DOCUMENT_MEMBER) {
        Ok(member) => member,
        Err(ZipError::FileNotFound) => return Err(SourceError::MissingMember(name.to_path_buf())),
        Err(source) => {
            return Err(SourceError::Archive {
                path: name.to_path_buf(),
                source,
            });
        }
    };

    paragraphs_from_xml(BufReader::new(member))
}

/// Read the flattened text of every paragraph of a WordprocessingML body.
///
/// Paragraphs are returned in the order their start tags appear. A paragraph
/// nested inside another (as in a text box) is listed after its enclosing
/// paragraph, and its text counts towards both.
///
/// # Errors
///
/// Returns an error if the XML is not well-formed.
pub fn paragraphs_from_xml<R: BufRead>(reader: R) -> Result<Vec<String>, SourceError> {
    let mut reader = NsReader::from_reader(reader);
    reader.config_mut().trim_text(false);

    let mut paragraphs: Vec<String> = Vec::new();
    // indices into `paragraphs` of the currently open paragraph elements
    let mut open: Vec<usize> = Vec::new();
    let mut buf = Vec::new();

    loop {
        let (namespace, event) = reader.read_resolved_event_into(&mut buf)?;
        match event {
            Event::Start(start) if is_paragraph(&namespace, start.local_name().as_ref()) => {
                open.push(paragraphs.len());
                paragraphs.push(String::new());
            }
            Event::Empty(empty) if is_paragraph(&namespace, empty.local_name().as_ref()) => {
                paragraphs.push(String::new());
            }
            Event::End(end) if is_paragraph(&namespace, end.local_name().as_ref()) => {
                open.pop();
            }
            Event::Text(text) if !open.is_empty() => {
                let text = text.unescape()?;
                for &index in &open {
                    paragraphs[index].push_str(&text);
                }
            }
            Event::CData(data) if !open.is_empty() => {
                let text = String::from_utf8_lossy(&data);
                for &index in &open {
                    paragraphs[index].push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

fn is_paragraph(namespace: &ResolveResult, local_name: &[u8]) -> bool {
    matches!(namespace, ResolveResult::Bound(Namespace(ns)) if *ns == WORD_NAMESPACE)
        && local_name == b"p"
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use super::*;

    const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    fn body(paragraphs: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W}"><w:body>{paragraphs}</w:body></w:document>"#
        )
    }

    fn extract(paragraphs: &str) -> Vec<String> {
        paragraphs_from_xml(Cursor::new(body(paragraphs))).unwrap()
    }

    #[test]
    fn runs_are_concatenated() {
        let paragraphs = extract(
            r#"<w:p><w:r><w:t>REQ_</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>TYPE</w:t></w:r></w:p>"#,
        );
        assert_eq!(paragraphs, ["REQ_TYPE"]);
    }

    #[test]
    fn empty_paragraphs_are_kept() {
        let paragraphs = extract(r#"<w:p/><w:p><w:pPr/></w:p><w:p><w:r><w:t>x</w:t></w:r></w:p>"#);
        assert_eq!(paragraphs, ["", "", "x"]);
    }

    #[test]
    fn whitespace_and_entities_are_preserved() {
        let paragraphs =
            extract(r#"<w:p><w:r><w:t xml:space="preserve">a &amp; b </w:t></w:r></w:p>"#);
        assert_eq!(paragraphs, ["a & b "]);
    }

    #[test]
    fn paragraphs_in_tables_are_found() {
        let paragraphs = extract(
            r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        );
        assert_eq!(paragraphs, ["cell"]);
    }

    #[test]
    fn nested_paragraphs_follow_their_parent() {
        let paragraphs = extract(
            r#"<w:p><w:r><w:t>outer </w:t></w:r><w:r><w:txbxContent><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:txbxContent></w:r></w:p>"#,
        );
        assert_eq!(paragraphs, ["outer inner", "inner"]);
    }

    #[test]
    fn other_namespaces_are_ignored() {
        let xml = format!(
            r#"<w:document xmlns:w="{W}" xmlns:o="urn:other"><w:body><o:p>no</o:p><w:p><w:r><w:t>yes</w:t></w:r></w:p></w:body></w:document>"#
        );
        let paragraphs = paragraphs_from_xml(Cursor::new(xml)).unwrap();
        assert_eq!(paragraphs, ["yes"]);
    }

    #[test]
    fn text_outside_paragraphs_is_ignored() {
        let paragraphs = extract(r#"<w:sectPr>ignored</w:sectPr>"#);
        assert!(paragraphs.is_empty());
    }

    #[test]
    fn malformed_xml_fails() {
        let result = paragraphs_from_xml(Cursor::new(body("<w:p></w:r>")));
        assert!(matches!(result, Err(SourceError::Xml(_))));
    }

    fn archive(members: &[(&str, &str)]) -> Cursor<Vec<u8>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in members {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        let mut cursor = writer.finish().unwrap();
        cursor.set_position(0);
        cursor
    }

    #[test]
    fn reads_document_member_of_archive() {
        let xml = body("<w:p><w:r><w:t>hello</w:t></w:r></w:p>");
        let cursor = archive(&[("[Content_Types].xml", "<Types/>"), (DOCUMENT_MEMBER, &xml)]);
        let paragraphs = paragraphs_from_archive(cursor, Path::new("test.docx")).unwrap();
        assert_eq!(paragraphs, ["hello"]);
    }

    #[test]
    fn archive_without_body_fails() {
        let cursor = archive(&[("word/styles.xml", "<w:styles/>")]);
        let result = paragraphs_from_archive(cursor, Path::new("test.docx"));
        assert!(matches!(result, Err(SourceError::MissingMember(_))));
    }

    #[test]
    fn missing_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let result = paragraphs_from_docx(&tmp.path().join("missing.docx"));
        assert!(matches!(result, Err(SourceError::Io { .. })));
    }

    #[test]
    fn non_zip_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("plain.docx");
        std::fs::write(&path, "not a zip").unwrap();
        let result = paragraphs_from_docx(&path);
        assert!(matches!(result, Err(SourceError::Archive { .. })));
    }
}
