// ABOUTME: DOCX package access backed by a zip archive held in memory
// ABOUTME: Reads every entry, exposes the WordprocessingML text parts and rebuilds the archive

use std::io::{Cursor, Read, Write};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::error::{DocumentError, Result};

/// Main document part. Every Word document has one.
pub const MAIN_PART: &str = "word/document.xml";

#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    stored: bool,
    is_dir: bool,
}

/// In-memory copy of a DOCX zip package.
///
/// Entry order and compression mode are kept so that an untouched package
/// round-trips to an equivalent archive.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    entries: Vec<PackageEntry>,
}

impl DocxPackage {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            let mut data = Vec::new();
            if !file.is_dir() {
                file.read_to_end(&mut data)?;
            }
            entries.push(PackageEntry {
                name: file.name().to_string(),
                stored: file.compression() == CompressionMethod::Stored,
                is_dir: file.is_dir(),
                data,
            });
        }

        debug!("Opened document package with {} entries", entries.len());

        let package = Self { entries };
        if package.part(MAIN_PART).is_none() {
            return Err(DocumentError::MissingPart {
                part: MAIN_PART.to_string(),
            });
        }
        Ok(package)
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.data.as_slice())
    }

    pub fn set_part(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                entry.data = data;
                Ok(())
            }
            None => Err(DocumentError::MissingPart {
                part: name.to_string(),
            }),
        }
    }

    /// Parts holding visible text: the main document first, then headers and footers.
    pub fn text_parts(&self) -> Vec<String> {
        let mut parts = vec![MAIN_PART.to_string()];
        parts.extend(
            self.entries
                .iter()
                .filter(|entry| is_header_or_footer(&entry.name))
                .map(|entry| entry.name.clone()),
        );
        parts
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for entry in &self.entries {
            let method = if entry.stored {
                CompressionMethod::Stored
            } else {
                CompressionMethod::Deflated
            };
            let options = SimpleFileOptions::default().compression_method(method);

            if entry.is_dir {
                writer.add_directory(entry.name.as_str(), options)?;
            } else {
                writer.start_file(entry.name.as_str(), options)?;
                writer.write_all(&entry.data)?;
            }
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}

fn is_header_or_footer(name: &str) -> bool {
    let Some(file) = name.strip_prefix("word/") else {
        return false;
    };
    !file.contains('/')
        && file.ends_with(".xml")
        && (file.starts_with("header") || file.starts_with("footer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_missing_main_part_is_rejected() {
        let bytes = build_zip(&[("word/styles.xml", "<w:styles/>")]);
        let err = DocxPackage::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, DocumentError::MissingPart { .. }));
    }

    #[test]
    fn test_not_a_zip_is_rejected() {
        let err = DocxPackage::from_bytes(b"plain text, not a package").unwrap_err();
        assert!(matches!(err, DocumentError::Package(_)));
    }

    #[test]
    fn test_text_parts_include_headers_and_footers() {
        let bytes = build_zip(&[
            ("[Content_Types].xml", "<Types/>"),
            ("word/document.xml", "<w:document/>"),
            ("word/header1.xml", "<w:hdr/>"),
            ("word/footer2.xml", "<w:ftr/>"),
            ("word/_rels/header1.xml.rels", "<Relationships/>"),
            ("word/styles.xml", "<w:styles/>"),
        ]);

        let package = DocxPackage::from_bytes(&bytes).unwrap();
        assert_eq!(
            package.text_parts(),
            vec![
                "word/document.xml".to_string(),
                "word/header1.xml".to_string(),
                "word/footer2.xml".to_string(),
            ]
        );
    }

    #[test]
    fn test_set_part_survives_rebuild() {
        let bytes = build_zip(&[
            ("[Content_Types].xml", "<Types/>"),
            ("word/document.xml", "<w:document/>"),
        ]);

        let mut package = DocxPackage::from_bytes(&bytes).unwrap();
        package
            .set_part(MAIN_PART, b"<w:document>changed</w:document>".to_vec())
            .unwrap();
        assert!(package.set_part("word/unknown.xml", Vec::new()).is_err());

        let rebuilt = DocxPackage::from_bytes(&package.to_bytes().unwrap()).unwrap();
        assert_eq!(
            rebuilt.part(MAIN_PART).unwrap(),
            b"<w:document>changed</w:document>"
        );
        assert_eq!(rebuilt.part("[Content_Types].xml").unwrap(), b"<Types/>");
    }
}
