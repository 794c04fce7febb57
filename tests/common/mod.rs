// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Builds DOCX fixtures in memory and provides an in-memory drive store

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use recoverlette::document::package::DocxPackage;
use recoverlette::document::wordml::paragraph_text;
use recoverlette::document::WordDocument;
use recoverlette::engine::{ConversionSettings, WorkflowOptions};
use recoverlette::graph::{
    DownloadBody, Drive, DriveItem, DriveStore, GraphError, ItemReference, Result, UserProfile,
};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub fn run(text: &str) -> String {
    format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, escape(text))
}

pub fn colored_run(text: &str, color: &str) -> String {
    format!(
        r#"<w:r><w:rPr><w:rStyle w:val="Emphasis"/><w:b/><w:color w:val="{}" w:themeColor="accent1"/><w:sz w:val="24"/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        color,
        escape(text)
    )
}

pub fn paragraph(runs: &[String]) -> String {
    format!("<w:p>{}</w:p>", runs.concat())
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Builds a minimal but valid Word package.
#[derive(Default)]
pub struct DocxBuilder {
    body: Vec<String>,
    headers: Vec<(String, String)>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// One paragraph, one run per entry.
    pub fn paragraph(mut self, runs: &[&str]) -> Self {
        let runs: Vec<String> = runs.iter().map(|text| run(text)).collect();
        self.body.push(paragraph(&runs));
        self
    }

    pub fn raw(mut self, xml: &str) -> Self {
        self.body.push(xml.to_string());
        self
    }

    /// A table whose cells each hold one single-run paragraph.
    pub fn table(mut self, rows: &[&[&str]]) -> Self {
        let mut xml = String::from("<w:tbl><w:tblPr/>");
        for row in rows {
            xml.push_str("<w:tr>");
            for cell in row.iter() {
                xml.push_str(&format!("<w:tc><w:tcPr/>{}</w:tc>", paragraph(&[run(cell)])));
            }
            xml.push_str("</w:tr>");
        }
        xml.push_str("</w:tbl>");
        self.body.push(xml);
        self
    }

    pub fn header(mut self, text: &str) -> Self {
        let name = format!("word/header{}.xml", self.headers.len() + 1);
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:hdr xmlns:w="{}">{}</w:hdr>"#,
            W_NS,
            paragraph(&[run(text)])
        );
        self.headers.push((name, xml));
        self
    }

    pub fn document_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{}"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            W_NS,
            self.body.concat()
        )
    }

    pub fn build(&self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        let mut entries = vec![
            (
                "[Content_Types].xml".to_string(),
                r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#.to_string(),
            ),
            ("word/document.xml".to_string(), self.document_xml()),
        ];
        entries.extend(self.headers.iter().cloned());

        for (name, data) in entries {
            writer.start_file(name, options).unwrap();
            writer.write_all(data.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
}

/// Visible text of every paragraph in every text part, in document order.
pub fn paragraph_texts(content: &[u8]) -> Vec<String> {
    let mut document = WordDocument::from_bytes(content).unwrap();
    let mut texts = Vec::new();
    document.for_each_paragraph_mut(&mut |paragraph, _| texts.push(paragraph_text(paragraph)));
    texts
}

pub fn all_text(content: &[u8]) -> String {
    paragraph_texts(content).join("\n")
}

pub fn part_xml(content: &[u8], part: &str) -> String {
    let package = DocxPackage::from_bytes(content).unwrap();
    String::from_utf8(package.part(part).unwrap().to_vec()).unwrap()
}

/// Options for tests: no settle delay, immediate retries.
pub fn fast_options() -> WorkflowOptions {
    WorkflowOptions {
        conversion: ConversionSettings {
            settle_delay_secs: 0,
            retry_delay_secs: 0,
            ..ConversionSettings::default()
        },
        ..WorkflowOptions::default()
    }
}

pub fn not_found() -> GraphError {
    GraphError::Api {
        status: 404,
        code: "itemNotFound".to_string(),
        message: "The resource could not be found.".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub drive_id: String,
    pub parent_id: String,
    pub file_name: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct Calls {
    pub uploads: Vec<Upload>,
    pub deletes: Vec<String>,
    pub conversion_attempts: u32,
    pub item_lookups: Vec<String>,
}

/// In-memory drive holding one template.
pub struct FakeDrive {
    pub template: Vec<u8>,
    /// Deliver the template as a stream of chunks of this size.
    pub chunk_size: Option<usize>,
    pub template_missing: bool,
    pub fail_auth: bool,
    pub fail_upload: bool,
    pub fail_delete: bool,
    pub parent_id: Option<String>,
    pub item_id: String,
    pub root_id: String,
    pub converted: Vec<u8>,
    /// Conversion requests answered with 404 before the converted bytes.
    pub not_ready_responses: u32,
    pub calls: Mutex<Calls>,
}

impl FakeDrive {
    pub fn new(template: Vec<u8>) -> Self {
        Self {
            template,
            chunk_size: None,
            template_missing: false,
            fail_auth: false,
            fail_upload: false,
            fail_delete: false,
            parent_id: Some("FOLDER1".to_string()),
            item_id: "ITEM1".to_string(),
            root_id: "ROOT".to_string(),
            converted: b"%PDF-1.7 converted".repeat(100),
            not_ready_responses: 0,
            calls: Mutex::new(Calls::default()),
        }
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.calls.lock().unwrap().uploads.clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls.lock().unwrap().deletes.clone()
    }

    pub fn conversion_attempts(&self) -> u32 {
        self.calls.lock().unwrap().conversion_attempts
    }
}

#[async_trait]
impl DriveStore for FakeDrive {
    async fn current_user(&self) -> Result<UserProfile> {
        if self.fail_auth {
            return Err(GraphError::Api {
                status: 401,
                code: "InvalidAuthenticationToken".to_string(),
                message: "Access token is empty.".to_string(),
            });
        }
        Ok(UserProfile {
            display_name: Some("Test User".to_string()),
        })
    }

    async fn default_drive(&self) -> Result<Drive> {
        Ok(Drive {
            id: Some("DRIVE1".to_string()),
            drive_type: Some("personal".to_string()),
        })
    }

    async fn item_by_path(&self, _drive_id: &str, path: &str) -> Result<DriveItem> {
        self.calls.lock().unwrap().item_lookups.push(path.to_string());
        if self.template_missing {
            return Err(not_found());
        }
        Ok(DriveItem {
            id: Some(self.item_id.clone()),
            name: path.rsplit('/').next().map(str::to_string),
            size: Some(self.template.len() as u64),
            parent_reference: self.parent_id.as_ref().map(|id| ItemReference {
                id: Some(id.clone()),
                drive_id: Some("DRIVE1".to_string()),
                path: None,
            }),
        })
    }

    async fn root_item(&self, _drive_id: &str) -> Result<DriveItem> {
        Ok(DriveItem::with_id(self.root_id.clone()))
    }

    async fn download_content(&self, _drive_id: &str, item_id: &str) -> Result<DownloadBody> {
        assert_eq!(item_id, self.item_id);
        match self.chunk_size {
            None => Ok(DownloadBody::Buffered(self.template.clone())),
            Some(size) => {
                let chunks: Vec<Result<Vec<u8>>> = self
                    .template
                    .chunks(size)
                    .map(|chunk| Ok(chunk.to_vec()))
                    .collect();
                Ok(DownloadBody::Streamed(stream::iter(chunks).boxed()))
            }
        }
    }

    async fn upload_content(
        &self,
        drive_id: &str,
        parent_id: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<DriveItem> {
        if self.fail_upload {
            return Err(GraphError::Api {
                status: 507,
                code: "quotaLimitReached".to_string(),
                message: "Insufficient storage.".to_string(),
            });
        }
        self.calls.lock().unwrap().uploads.push(Upload {
            drive_id: drive_id.to_string(),
            parent_id: parent_id.to_string(),
            file_name: file_name.to_string(),
            content,
        });
        Ok(DriveItem::with_id("TEMP1"))
    }

    async fn download_converted(
        &self,
        _drive_id: &str,
        item_id: &str,
        format: &str,
    ) -> Result<Vec<u8>> {
        assert_eq!(item_id, "TEMP1");
        assert_eq!(format, "pdf");

        let mut calls = self.calls.lock().unwrap();
        calls.conversion_attempts += 1;
        if calls.conversion_attempts <= self.not_ready_responses {
            return Err(not_found());
        }
        Ok(self.converted.clone())
    }

    async fn delete_item(&self, _drive_id: &str, item_id: &str) -> Result<()> {
        self.calls.lock().unwrap().deletes.push(item_id.to_string());
        if self.fail_delete {
            return Err(GraphError::Api {
                status: 423,
                code: "resourceLocked".to_string(),
                message: "The resource you are attempting to access is locked".to_string(),
            });
        }
        Ok(())
    }
}
