// ABOUTME: WordprocessingML paragraph and run model on top of the XML tree
// ABOUTME: Reads and rewrites run text and applies run colour formatting

use super::xml::{walk_elements_mut, Element, Node};

const PARAGRAPH: &str = "w:p";
const RUN: &str = "w:r";
const RUN_PROPERTIES: &str = "w:rPr";
const RUN_STYLE: &str = "w:rStyle";
const COLOR: &str = "w:color";
const TEXT: &str = "w:t";
const TAB: &str = "w:tab";
const BREAK: &str = "w:br";
const CARRIAGE_RETURN: &str = "w:cr";
const TABLE_CELL: &str = "w:tc";

/// Inline wrappers that can hold a paragraph's runs.
const RUN_CONTAINERS: &[&str] = &[
    "w:hyperlink",
    "w:smartTag",
    "w:ins",
    "w:fldSimple",
    "w:customXml",
    "w:sdt",
    "w:sdtContent",
    "w:dir",
    "w:bdo",
];

const TEXT_CONTENT: &[&str] = &[TEXT, TAB, BREAK, CARRIAGE_RETURN];

/// `w:rPr` children that the schema places after `w:color`.
const AFTER_COLOR: &[&str] = &[
    "w:spacing",
    "w:w",
    "w:kern",
    "w:position",
    "w:sz",
    "w:szCs",
    "w:highlight",
    "w:u",
    "w:effect",
    "w:bdr",
    "w:shd",
    "w:fitText",
    "w:vertAlign",
    "w:rtl",
    "w:cs",
    "w:em",
    "w:lang",
    "w:eastAsianLayout",
    "w:specVanish",
    "w:oMath",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Body,
    TableCell,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Body => write!(f, "paragraph"),
            Location::TableCell => write!(f, "table cell"),
        }
    }
}

/// Visit every paragraph, including those in table cells and text boxes.
pub fn for_each_paragraph_mut(
    nodes: &mut [Node],
    visit: &mut dyn FnMut(&mut Element, Location),
) {
    visit_paragraphs(nodes, Location::Body, visit);
}

fn visit_paragraphs(
    nodes: &mut [Node],
    location: Location,
    visit: &mut dyn FnMut(&mut Element, Location),
) {
    for node in nodes.iter_mut() {
        let Node::Element(element) = node else {
            continue;
        };

        if element.is(PARAGRAPH) {
            visit(element, location);
        }

        let inner = if element.is(TABLE_CELL) {
            Location::TableCell
        } else {
            location
        };
        visit_paragraphs(&mut element.children, inner, visit);
    }
}

/// Number of `w:p` elements at any depth.
pub fn paragraph_count(nodes: &[Node]) -> usize {
    nodes
        .iter()
        .filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
        .map(|element| usize::from(element.is(PARAGRAPH)) + paragraph_count(&element.children))
        .sum()
}

pub fn paragraph_runs(paragraph: &Element) -> Vec<&Element> {
    let mut runs = Vec::new();
    collect_runs(paragraph, &mut runs);
    runs
}

fn collect_runs<'a>(parent: &'a Element, runs: &mut Vec<&'a Element>) {
    for child in parent.child_elements() {
        if child.is(RUN) {
            runs.push(child);
        } else if child.is_any(RUN_CONTAINERS) {
            collect_runs(child, runs);
        }
    }
}

pub fn paragraph_runs_mut(paragraph: &mut Element) -> Vec<&mut Element> {
    let mut runs = Vec::new();
    collect_runs_mut(paragraph, &mut runs);
    runs
}

fn collect_runs_mut<'a>(parent: &'a mut Element, runs: &mut Vec<&'a mut Element>) {
    for node in parent.children.iter_mut() {
        let Node::Element(child) = node else {
            continue;
        };
        if child.is(RUN) {
            runs.push(child);
        } else if child.is_any(RUN_CONTAINERS) {
            collect_runs_mut(child, runs);
        }
    }
}

/// Visible text of a run: `w:t` content, tabs as `\t`, breaks as `\n`.
pub fn run_text(run: &Element) -> String {
    let mut text = String::new();
    for child in run.child_elements() {
        if child.is(TEXT) {
            text.push_str(&child.text());
        } else if child.is(TAB) {
            text.push('\t');
        } else if child.is_any(&[BREAK, CARRIAGE_RETURN]) {
            text.push('\n');
        }
    }
    text
}

pub fn paragraph_text(paragraph: &Element) -> String {
    paragraph_runs(paragraph)
        .into_iter()
        .map(run_text)
        .collect()
}

/// Replace the run's text content, keeping its properties and any non-text children.
pub fn set_run_text(run: &mut Element, text: &str) {
    let insert_at = run
        .children
        .iter()
        .position(|node| matches!(node, Node::Element(child) if child.is_any(TEXT_CONTENT)));

    run.children
        .retain(|node| !matches!(node, Node::Element(child) if child.is_any(TEXT_CONTENT)));

    let content = text_content_nodes(text);
    let index = match insert_at {
        Some(index) => index.min(run.children.len()),
        None => run.children.len(),
    };
    run.children.splice(index..index, content);
}

fn text_content_nodes(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut segment = String::new();

    let flush = |segment: &mut String, nodes: &mut Vec<Node>| {
        if !segment.is_empty() {
            let mut element = Element::new(TEXT);
            element.push_attribute("xml:space", "preserve");
            element.set_text(segment);
            nodes.push(Node::Element(element));
            segment.clear();
        }
    };

    for ch in text.chars() {
        match ch {
            '\t' => {
                flush(&mut segment, &mut nodes);
                nodes.push(Node::Element(Element::empty_with_attributes(TAB, &[])));
            }
            '\n' => {
                flush(&mut segment, &mut nodes);
                nodes.push(Node::Element(Element::empty_with_attributes(BREAK, &[])));
            }
            _ => segment.push(ch),
        }
    }
    flush(&mut segment, &mut nodes);
    nodes
}

/// Force the run to the given colour, dropping theme colour attributes.
/// With `reset_style` the run's character style is removed as well.
pub fn neutralize_run(run: &mut Element, color: &str, reset_style: bool) {
    let properties_index = match run.position_of(RUN_PROPERTIES) {
        Some(index) => index,
        None => {
            run.children.insert(0, Node::Element(Element::new(RUN_PROPERTIES)));
            0
        }
    };
    let Some(properties) = run.child_mut(properties_index) else {
        return;
    };

    if reset_style {
        properties
            .children
            .retain(|node| !matches!(node, Node::Element(child) if child.is(RUN_STYLE)));
    }

    let color_element = Node::Element(Element::empty_with_attributes(COLOR, &[("w:val", color)]));
    if let Some(index) = properties.position_of(COLOR) {
        properties.children[index] = color_element;
        return;
    }

    let insert_at = properties
        .children
        .iter()
        .position(|node| matches!(node, Node::Element(child) if child.is_any(AFTER_COLOR)))
        .unwrap_or(properties.children.len());
    properties.children.insert(insert_at, color_element);
}

pub fn neutralize_all_runs(nodes: &mut [Node], color: &str) -> usize {
    let mut count = 0;
    walk_elements_mut(nodes, &mut |element| {
        if element.is(RUN) {
            neutralize_run(element, color, false);
            count += 1;
        }
    });
    count
}
