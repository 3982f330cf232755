//! Replay harness: a page file stands in for the browser, a JSON-lines file
//! for the authoring tool.

use anyhow::{Context, Result};
use bus::{EditorEvent, WireEvent};
use dom::{Document, NodeKey};
use editor_support::annotations::{self, PageContext};
use editor_support::{
    Decorator, Dispatcher, Host, Outcome, Reconciler, StandardDecorator, SupportConfig,
};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Reloading re-reads and re-renders the page from disk.
struct PageFile {
    path: PathBuf,
    decorator: StandardDecorator,
    reloads: usize,
}

impl PageFile {
    fn load(&self) -> Result<Document> {
        let markup = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        render(&markup, &self.decorator)
    }
}

impl Host for PageFile {
    fn reload(&mut self, doc: &mut Document) {
        self.reloads += 1;
        match self.load() {
            Ok(fresh) => *doc = fresh,
            Err(err) => log::error!("reload failed, keeping the current page: {err:#}"),
        }
    }
}

/// Parses `markup` and runs the page's own rendering over its main region.
fn render(markup: &str, decorator: &StandardDecorator) -> Result<Document> {
    let mut doc = Document::parse(markup);
    if let Some(main) = doc.main() {
        decorator.decorate_main(&mut doc, main)?;
        decorator.decorate_richtext(&mut doc, main)?;
        pollster::block_on(decorator.load_sections(&mut doc, main))?;
    }
    Ok(doc)
}

#[derive(Debug, Default)]
pub struct Tally {
    pub applied: usize,
    pub reloaded: usize,
    pub selected: usize,
    pub ignored: usize,
}

impl Tally {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Applied(_) => self.applied += 1,
            Outcome::Reloaded(_) | Outcome::Unhandled(_) => self.reloaded += 1,
            Outcome::Selected { .. } => self.selected += 1,
            Outcome::Ignored => self.ignored += 1,
        }
    }
}

pub struct Report {
    pub document: Document,
    pub tally: Tally,
}

pub fn run(page: &Path, events: &Path, config: SupportConfig) -> Result<Report> {
    let host = PageFile {
        path: page.to_path_buf(),
        decorator: StandardDecorator::new(config.clone()),
        reloads: 0,
    };
    let mut doc = host.load()?;
    let decorator = StandardDecorator::new(config.clone());
    let mut dispatcher = Dispatcher::new(Reconciler::new(decorator, config), host);
    dispatcher.install(&mut doc);

    let lines = std::fs::read_to_string(events)
        .with_context(|| format!("reading {}", events.display()))?;
    let mut tally = Tally::default();
    for (index, line) in lines.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let wire: WireEvent = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: malformed event", events.display(), index + 1))?;
        let event = match EditorEvent::try_from(wire) {
            Ok(event) => event,
            Err(err) => {
                log::warn!("{}:{}: skipped: {err}", events.display(), index + 1);
                continue;
            }
        };
        log::debug!("line {}: {}", index + 1, event.event_type());
        for outcome in pollster::block_on(dispatcher.dispatch(&mut doc, event)) {
            tally.record(&outcome);
        }
    }
    log::info!("page reloaded {} time(s)", dispatcher.host().reloads);
    Ok(Report { document: doc, tally })
}

pub fn annotate(page: &Path, config: SupportConfig) -> Result<Document> {
    let host = PageFile {
        path: page.to_path_buf(),
        decorator: StandardDecorator::new(config.clone()),
        reloads: 0,
    };
    let mut doc = host.load()?;
    let ctx = PageContext::from_document(&doc, &config);
    annotations::refresh(&mut doc, &config, &ctx)?;
    Ok(doc)
}

/// One line per element: tag, classes and resource, indented by depth.
pub fn outline(doc: &Document) -> String {
    let mut out = String::new();
    let mut stack: Vec<(NodeKey, usize)> = doc
        .element_children(doc.root())
        .into_iter()
        .rev()
        .map(|k| (k, 0))
        .collect();
    while let Some((key, depth)) = stack.pop() {
        let tag = doc.tag_name(key).unwrap_or_default();
        let _ = write!(out, "{:indent$}{tag}", "", indent = depth * 2);
        if let Some(class) = doc.attr(key, "class") {
            for c in class.split_ascii_whitespace() {
                let _ = write!(out, ".{c}");
            }
        }
        if let Some(resource) = doc.attr(key, "data-aue-resource") {
            let _ = write!(out, " [{resource}]");
        }
        if doc.is_hidden(key) {
            out.push_str(" (hidden)");
        }
        out.push('\n');
        stack.extend(doc.element_children(key).into_iter().rev().map(|k| (k, depth + 1)));
    }
    out
}
