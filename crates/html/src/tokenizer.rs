//! Byte-oriented tokenizer for rendered fragments.
//!
//! This is not the HTML5 state machine. It covers what server-rendered content
//! fragments contain: tags with quoted, unquoted or valueless attributes,
//! comments, a doctype, and rawtext bodies for `script` and `style`.
//!
//! Tag and attribute names are ASCII `[A-Za-z0-9:_-]` and are lowercased.
//! Identical names share one `Arc<str>` per tokenize call.
//!
//! Slices are only cut at ASCII structural bytes, so every slice endpoint is a
//! UTF-8 char boundary.
use crate::entities::decode_entities;
use crate::types::{Attribute, Token};
use memchr::{memchr, memmem};
use std::collections::HashMap;
use std::sync::Arc;

pub fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

#[derive(Default)]
struct Names {
    seen: HashMap<String, Arc<str>>,
}

impl Names {
    fn intern(&mut self, raw: &str) -> Arc<str> {
        let lower = raw.to_ascii_lowercase();
        if let Some(existing) = self.seen.get(&lower) {
            return Arc::clone(existing);
        }
        let atom: Arc<str> = Arc::from(lower.as_str());
        self.seen.insert(lower, Arc::clone(&atom));
        atom
    }
}

struct Cursor<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn starts_with_ignore_case(&self, needle: &[u8]) -> bool {
        self.bytes
            .get(self.pos..self.pos + needle.len())
            .is_some_and(|s| s.eq_ignore_ascii_case(needle))
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn take_name(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_name_byte) {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    fn skip_past(&mut self, byte: u8) {
        match memchr(byte, &self.bytes[self.pos..]) {
            Some(rel) => self.pos += rel + 1,
            None => self.pos = self.bytes.len(),
        }
    }
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let mut names = Names::default();
    let mut cur = Cursor::new(input);

    while !cur.at_end() {
        if cur.peek() != Some(b'<') {
            let start = cur.pos;
            cur.pos = memchr(b'<', &cur.bytes[start..]).map_or(cur.bytes.len(), |rel| start + rel);
            let text = decode_entities(&input[start..cur.pos]);
            if !text.is_empty() {
                out.push(Token::Text(text));
            }
            continue;
        }

        if cur.starts_with_ignore_case(b"<!--") {
            let body_start = cur.pos + 4;
            match memmem::find(&cur.bytes[body_start..], b"-->") {
                Some(rel) => {
                    out.push(Token::Comment(input[body_start..body_start + rel].to_string()));
                    cur.pos = body_start + rel + 3;
                }
                None => {
                    out.push(Token::Comment(input[body_start..].to_string()));
                    cur.pos = cur.bytes.len();
                }
            }
            continue;
        }

        if cur.starts_with_ignore_case(b"<!doctype") {
            let start = cur.pos + 2;
            cur.skip_past(b'>');
            let end = if cur.bytes[..cur.pos].ends_with(b">") {
                cur.pos - 1
            } else {
                cur.pos
            };
            out.push(Token::Doctype(input[start..end].trim().to_string()));
            continue;
        }

        if cur.peek_at(1) == Some(b'/') {
            cur.pos += 2;
            let raw = cur.take_name();
            cur.skip_past(b'>');
            if !raw.is_empty() {
                out.push(Token::EndTag(names.intern(raw)));
            }
            continue;
        }

        if !cur.peek_at(1).is_some_and(|b| b.is_ascii_alphabetic()) {
            // A lone `<` is text.
            out.push(Token::Text("<".to_string()));
            cur.pos += 1;
            continue;
        }

        cur.pos += 1;
        let name = names.intern(cur.take_name());
        let (attributes, explicit_self_close) = read_attributes(&mut cur, &mut names);
        let self_closing = explicit_self_close || is_void_element(&name);

        out.push(Token::StartTag {
            name: Arc::clone(&name),
            attributes,
            self_closing,
        });

        if !self_closing && (&*name == "script" || &*name == "style") {
            read_rawtext(&mut cur, &name, &mut out);
        }
    }

    log::trace!(
        target: "html.tokenizer",
        "tokenized {} bytes into {} tokens",
        input.len(),
        out.len()
    );
    out
}

fn read_attributes(cur: &mut Cursor<'_>, names: &mut Names) -> (Vec<Attribute>, bool) {
    let mut attributes = Vec::new();
    loop {
        cur.skip_whitespace();
        match cur.peek() {
            None => return (attributes, false),
            Some(b'>') => {
                cur.pos += 1;
                return (attributes, false);
            }
            Some(b'/') if cur.peek_at(1) == Some(b'>') => {
                cur.pos += 2;
                return (attributes, true);
            }
            Some(b) if !is_name_byte(b) => {
                cur.pos += 1;
                continue;
            }
            Some(_) => {}
        }

        let key = names.intern(cur.take_name());
        cur.skip_whitespace();
        if cur.peek() != Some(b'=') {
            attributes.push((key, None));
            continue;
        }
        cur.pos += 1;
        cur.skip_whitespace();

        let value = match cur.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                let start = cur.pos + 1;
                let end = memchr(quote, &cur.bytes[start..])
                    .map_or(cur.bytes.len(), |rel| start + rel);
                cur.pos = (end + 1).min(cur.bytes.len());
                decode_entities(&cur.input[start..end])
            }
            _ => {
                let start = cur.pos;
                while let Some(b) = cur.peek() {
                    if b.is_ascii_whitespace()
                        || b == b'>'
                        || (b == b'/' && cur.peek_at(1) == Some(b'>'))
                    {
                        break;
                    }
                    cur.pos += 1;
                }
                decode_entities(&cur.input[start..cur.pos])
            }
        };
        attributes.push((key, Some(value)));
    }
}

fn read_rawtext(cur: &mut Cursor<'_>, name: &Arc<str>, out: &mut Vec<Token>) {
    let start = cur.pos;
    let close = format!("</{name}");
    let mut search = start;
    let body_end = loop {
        let Some(rel) = memchr(b'<', &cur.bytes[search..]) else {
            break None;
        };
        let at = search + rel;
        let tail = &cur.bytes[at..];
        if tail.len() >= close.len() && tail[..close.len()].eq_ignore_ascii_case(close.as_bytes()) {
            let mut k = at + close.len();
            while cur.bytes.get(k).is_some_and(|b| b.is_ascii_whitespace()) {
                k += 1;
            }
            if cur.bytes.get(k) == Some(&b'>') {
                break Some((at, k + 1));
            }
        }
        search = at + 1;
    };

    let (text_end, resume) = body_end.unwrap_or((cur.bytes.len(), cur.bytes.len()));
    if text_end > start {
        out.push(Token::Text(cur.input[start..text_end].to_string()));
    }
    out.push(Token::EndTag(Arc::clone(name)));
    cur.pos = resume;
}
