// ABOUTME: Placeholder substitution engine for Word documents
// ABOUTME: Rewrites matched tokens per paragraph or per run and applies the colour policy

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::Result;
use super::placeholder::{Definitions, PlaceholderSyntax};
use super::wordml::{neutralize_run, paragraph_runs_mut, run_text, set_run_text, Location};
use super::xml::Element;
use super::WordDocument;

pub const DEFAULT_NEUTRAL_COLOR: &str = "000000";

/// Where replaced text is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubstitutionStrategy {
    /// The whole replaced paragraph text goes into the first run, other runs are blanked.
    /// Collapses the paragraph's formatting onto the first run.
    #[default]
    Paragraph,
    /// Each token's value goes into the run holding the token's first character.
    Run,
}

impl FromStr for SubstitutionStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "paragraph" => Ok(SubstitutionStrategy::Paragraph),
            "run" => Ok(SubstitutionStrategy::Run),
            other => Err(format!(
                "unknown substitution strategy '{}', expected 'paragraph' or 'run'",
                other
            )),
        }
    }
}

impl std::fmt::Display for SubstitutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubstitutionStrategy::Paragraph => write!(f, "paragraph"),
            SubstitutionStrategy::Run => write!(f, "run"),
        }
    }
}

/// Colour handling for runs. Exactly one policy is active per run of the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColorPolicy {
    /// Modified runs keep their colour and theme
    Preserve,
    /// Modified runs are forced to the neutral colour and lose their character style
    #[default]
    NeutralizeModified,
    /// Every run in the document is forced to the neutral colour
    ForceAll,
}

impl ColorPolicy {
    /// Resolve the command line flags; forcing everything wins over preserving.
    pub fn from_flags(preserve: bool, force_all: bool, fallback: ColorPolicy) -> Self {
        match (preserve, force_all) {
            (_, true) => ColorPolicy::ForceAll,
            (true, false) => ColorPolicy::Preserve,
            (false, false) => fallback,
        }
    }
}

impl std::fmt::Display for ColorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorPolicy::Preserve => write!(f, "preserve"),
            ColorPolicy::NeutralizeModified => write!(f, "neutralize_modified"),
            ColorPolicy::ForceAll => write!(f, "force_all"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionOptions {
    #[serde(default)]
    pub strategy: SubstitutionStrategy,
    #[serde(default)]
    pub color_policy: ColorPolicy,
    #[serde(default = "default_neutral_color")]
    pub neutral_color: String,
}

fn default_neutral_color() -> String {
    DEFAULT_NEUTRAL_COLOR.to_string()
}

impl Default for SubstitutionOptions {
    fn default() -> Self {
        Self {
            strategy: SubstitutionStrategy::default(),
            color_policy: ColorPolicy::default(),
            neutral_color: default_neutral_color(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionOutcome {
    pub content: Vec<u8>,
    /// Tokens replaced with a defined value
    pub replaced: usize,
    /// Optional tokens removed
    pub removed: usize,
    pub modified_runs: usize,
    pub recolored_runs: usize,
    /// True when the input was returned byte for byte
    pub unchanged: bool,
}

/// A token that will be rewritten, with its byte range in the paragraph text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Hit {
    start: usize,
    end: usize,
    value: String,
    removal: bool,
}

pub struct Substituter<'a> {
    syntax: &'a PlaceholderSyntax,
    options: &'a SubstitutionOptions,
}

impl<'a> Substituter<'a> {
    pub fn new(syntax: &'a PlaceholderSyntax, options: &'a SubstitutionOptions) -> Self {
        Self { syntax, options }
    }

    /// Replace defined keys with their values and blank the keys in `removals`.
    ///
    /// With nothing to replace and nothing to remove the content is returned unchanged.
    pub fn apply(
        &self,
        content: &[u8],
        definitions: &Definitions,
        removals: &BTreeSet<String>,
    ) -> Result<SubstitutionOutcome> {
        if definitions.is_empty() && removals.is_empty() {
            info!("No replacement values provided via -D arguments.");
            return Ok(SubstitutionOutcome {
                content: content.to_vec(),
                unchanged: true,
                ..Default::default()
            });
        }

        info!(
            "Performing replacements ({} strategy, colour policy: {})...",
            self.options.strategy, self.options.color_policy
        );

        let mut document = WordDocument::from_bytes(content)?;
        let mut outcome = SubstitutionOutcome::default();

        document.for_each_paragraph_mut(&mut |paragraph, location| {
            self.rewrite_paragraph(paragraph, location, definitions, removals, &mut outcome);
        });

        if self.options.color_policy == ColorPolicy::ForceAll {
            outcome.recolored_runs = document.neutralize_all_runs(&self.options.neutral_color);
            debug!("Forced {} run(s) to the neutral colour", outcome.recolored_runs);
        }

        outcome.content = document.to_bytes()?;
        info!(
            "Replacements applied successfully ({} replaced, {} optional removed).",
            outcome.replaced, outcome.removed
        );
        Ok(outcome)
    }

    fn rewrite_paragraph(
        &self,
        paragraph: &mut Element,
        location: Location,
        definitions: &Definitions,
        removals: &BTreeSet<String>,
        outcome: &mut SubstitutionOutcome,
    ) {
        let mut runs = paragraph_runs_mut(paragraph);
        let texts: Vec<String> = runs.iter().map(|run| run_text(run)).collect();
        let full: String = texts.concat();

        let hits = self.find_hits(&full, definitions, removals);
        if hits.is_empty() {
            return;
        }

        for hit in &hits {
            if hit.removal {
                outcome.removed += 1;
            } else {
                outcome.replaced += 1;
            }
            debug!(
                "  Replaced '{}' in {} text.",
                &full[hit.start..hit.end],
                location
            );
        }

        let modified = match self.options.strategy {
            SubstitutionStrategy::Paragraph => {
                let replaced = splice(&full, 0, full.len(), &hits);
                for (index, run) in runs.iter_mut().enumerate() {
                    set_run_text(run, if index == 0 { replaced.as_str() } else { "" });
                }
                vec![0]
            }
            SubstitutionStrategy::Run => {
                let mut modified = Vec::new();
                let mut offset = 0;
                for (index, run) in runs.iter_mut().enumerate() {
                    let end = offset + texts[index].len();
                    if hits.iter().any(|hit| overlaps(hit, offset, end)) {
                        set_run_text(run, &splice(&full, offset, end, &hits));
                        modified.push(index);
                    }
                    offset = end;
                }
                modified
            }
        };

        outcome.modified_runs += modified.len();

        if self.options.color_policy != ColorPolicy::Preserve {
            for index in modified {
                neutralize_run(runs[index], &self.options.neutral_color, true);
            }
        }
    }

    fn find_hits(
        &self,
        text: &str,
        definitions: &Definitions,
        removals: &BTreeSet<String>,
    ) -> Vec<Hit> {
        self.syntax
            .tokens(text)
            .into_iter()
            .filter_map(|token| {
                if let Some(value) = definitions.get(&token.key) {
                    Some(Hit {
                        start: token.start,
                        end: token.end,
                        value: value.to_string(),
                        removal: false,
                    })
                } else if removals.contains(&token.key) {
                    Some(Hit {
                        start: token.start,
                        end: token.end,
                        value: String::new(),
                        removal: true,
                    })
                } else {
                    None
                }
            })
            .collect()
    }
}

fn overlaps(hit: &Hit, start: usize, end: usize) -> bool {
    hit.start < end && hit.end > start
}

/// Rebuild `full[start..end]` with every hit applied. A hit's value is emitted
/// only by the range holding the hit's first byte.
fn splice(full: &str, start: usize, end: usize, hits: &[Hit]) -> String {
    let mut out = String::with_capacity(end - start);
    let mut cursor = start;

    for hit in hits.iter().filter(|hit| overlaps(hit, start, end)) {
        if hit.start > cursor {
            out.push_str(&full[cursor..hit.start]);
        }
        if hit.start >= start {
            out.push_str(&hit.value);
        }
        cursor = cursor.max(hit.end.min(end));
    }

    if cursor < end {
        out.push_str(&full[cursor..end]);
    }
    out
}
