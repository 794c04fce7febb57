// ABOUTME: Placeholder scanner collecting the distinct keys present in a template
// ABOUTME: Best effort: a template that cannot be parsed yields an empty set and a warning

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::error::Result;
use super::placeholder::PlaceholderSyntax;
use super::wordml::{paragraph_runs, run_text};
use super::WordDocument;

/// Distinct placeholder keys in all visible text of the document.
///
/// The paragraph's concatenated run text is authoritative, so tokens split
/// across formatting runs are found. Per-run hits are only logged.
pub fn scan_placeholders(content: &[u8], syntax: &PlaceholderSyntax) -> BTreeSet<String> {
    match try_scan_placeholders(content, syntax) {
        Ok(keys) => {
            debug!("Placeholder scan finished. Found unique keys: {:?}", keys);
            keys
        }
        Err(e) => {
            warn!("Error parsing template to find placeholders: {}", e);
            warn!("Placeholder reporting might be incomplete.");
            debug!("Scan failure details: {:?}", e);
            BTreeSet::new()
        }
    }
}

pub fn try_scan_placeholders(
    content: &[u8],
    syntax: &PlaceholderSyntax,
) -> Result<BTreeSet<String>> {
    debug!("Starting placeholder scan");
    let mut document = WordDocument::from_bytes(content)?;
    let mut found = BTreeSet::new();

    document.for_each_paragraph_mut(&mut |paragraph, location| {
        let mut paragraph_text = String::new();

        for run in paragraph_runs(paragraph) {
            let text = run_text(run);
            let tokens = syntax.tokens(&text);
            if !tokens.is_empty() {
                let keys: Vec<&str> = tokens.iter().map(|t| t.key.as_str()).collect();
                debug!("  Found in {} run: {:?}", location, keys);
            }
            paragraph_text.push_str(&text);
        }

        let tokens = syntax.tokens(&paragraph_text);
        if !tokens.is_empty() {
            let keys: Vec<&str> = tokens.iter().map(|t| t.key.as_str()).collect();
            debug!("  Found in {} text: {:?}", location, keys);
        }
        found.extend(tokens.into_iter().map(|token| token.key));
    });

    Ok(found)
}
