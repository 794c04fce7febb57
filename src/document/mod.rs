// ABOUTME: Word document module: package access, XML tree and placeholder processing
// ABOUTME: Exposes the placeholder scanner and the substitution engine used by the workflow

pub mod error;
pub mod package;
pub mod placeholder;
pub mod scanner;
pub mod substitute;
pub mod wordml;
pub mod xml;

pub use error::{DocumentError, Result};
pub use package::DocxPackage;
pub use placeholder::{DelimiterStyle, Definitions, PlaceholderPlan, PlaceholderSyntax};
pub use scanner::scan_placeholders;
pub use substitute::{
    ColorPolicy, SubstitutionOptions, SubstitutionOutcome, SubstitutionStrategy, Substituter,
};

use tracing::debug;

use wordml::Location;
use xml::{Element, XmlTree};

/// A DOCX package with its text parts parsed for editing.
pub struct WordDocument {
    package: DocxPackage,
    parts: Vec<(String, XmlTree)>,
}

impl WordDocument {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let package = DocxPackage::from_bytes(bytes)?;
        let mut parts = Vec::new();

        for name in package.text_parts() {
            let data = package
                .part(&name)
                .ok_or_else(|| DocumentError::MissingPart { part: name.clone() })?;
            let tree = XmlTree::parse(&name, data)?;
            if name == package::MAIN_PART && wordml::paragraph_count(&tree.nodes) == 0 {
                debug!(
                    "{} has no w:p paragraphs; markup bound to another namespace prefix is not read",
                    name
                );
            }
            parts.push((name, tree));
        }

        debug!("Parsed {} text part(s) from document", parts.len());
        Ok(Self { package, parts })
    }

    pub fn part_names(&self) -> Vec<&str> {
        self.parts.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Paragraphs across all text parts.
    pub fn paragraph_count(&self) -> usize {
        self.parts
            .iter()
            .map(|(_, tree)| wordml::paragraph_count(&tree.nodes))
            .sum()
    }

    /// Visit every paragraph of every text part.
    pub fn for_each_paragraph_mut(&mut self, visit: &mut dyn FnMut(&mut Element, Location)) {
        for (_, tree) in self.parts.iter_mut() {
            wordml::for_each_paragraph_mut(&mut tree.nodes, visit);
        }
    }

    /// Force every run of every text part to `color`; returns the number of runs touched.
    pub fn neutralize_all_runs(&mut self, color: &str) -> usize {
        self.parts
            .iter_mut()
            .map(|(_, tree)| wordml::neutralize_all_runs(&mut tree.nodes, color))
            .sum()
    }

    pub fn to_bytes(mut self) -> Result<Vec<u8>> {
        for (name, tree) in &self.parts {
            let data = tree.to_bytes(name)?;
            self.package.set_part(name, data)?;
        }
        self.package.to_bytes()
    }
}
