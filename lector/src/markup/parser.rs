//! Well-formedness-checking parser for documents and content fragments.
//!
//! Comments, processing instructions and the document type declaration are
//! skipped. CDATA sections become plain text.

use memchr::{memchr, memmem};

use super::entities::decode;
use super::{Fragment, Node, ParseFailure};

type ParseResult<T> = Result<T, ParseFailure>;

/// Parse a complete document and return its root element.
pub fn parse_document(input: &str) -> ParseResult<Node> {
    let mut parser = Parser::new(input.strip_prefix('\u{feff}').unwrap_or(input));
    parser.skip_misc()?;
    if parser.at_end() {
        return Err(parser.fail("no element found"));
    }
    if !parser.starts_with("<") {
        return Err(parser.fail("text before the root element"));
    }
    let root = parser.parse_element()?;
    parser.skip_misc()?;
    if !parser.at_end() {
        return Err(parser.fail("junk after document element"));
    }
    Ok(root)
}

/// Parse mixed content (text and balanced elements) with no single root.
pub fn parse_fragment(input: &str) -> ParseResult<Vec<Fragment>> {
    let mut parser = Parser::new(input);
    parser.parse_content(None)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn fail(&self, message: impl Into<String>) -> ParseFailure {
        ParseFailure::new(message, self.pos)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
        self.pos += rest.len() - trimmed.len();
    }

    /// Advance past `terminator`, returning the text before it.
    fn take_until(&mut self, terminator: &str, what: &str) -> ParseResult<&'a str> {
        match memmem::find(self.rest().as_bytes(), terminator.as_bytes()) {
            Some(index) => {
                let taken = &self.rest()[..index];
                self.pos += index + terminator.len();
                Ok(taken)
            }
            None => Err(self.fail(format!("unterminated {}", what))),
        }
    }

    /// Skip whitespace, comments, processing instructions and doctype.
    fn skip_misc(&mut self) -> ParseResult<()> {
        loop {
            self.skip_whitespace();
            if self.starts_with("<?") {
                self.take_until("?>", "processing instruction")?;
            } else if self.starts_with("<!--") {
                self.pos += 4;
                self.take_until("-->", "comment")?;
            } else if self.starts_with("<!DOCTYPE") {
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_doctype(&mut self) -> ParseResult<()> {
        let start = self.pos;
        let mut depth = 0usize;
        for (offset, byte) in self.rest().bytes().enumerate() {
            match byte {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => {
                    self.pos += offset + 1;
                    return Ok(());
                }
                _ => {}
            }
        }
        Err(ParseFailure::new("unterminated doctype", start))
    }

    fn parse_name(&mut self) -> ParseResult<&'a str> {
        let rest = self.rest();
        let end = rest
            .char_indices()
            .find(|&(_, c)| !is_name_char(c))
            .map_or(rest.len(), |(i, _)| i);
        let name = &rest[..end];
        match name.chars().next() {
            Some(c) if is_name_start(c) => {
                self.pos += end;
                Ok(name)
            }
            _ => Err(self.fail("not well-formed (invalid token)")),
        }
    }

    /// Parse an element starting at `<`.
    fn parse_element(&mut self) -> ParseResult<Node> {
        self.pos += 1;
        let tag = self.parse_name()?;
        let mut node = Node::new(tag);

        loop {
            let before = self.pos;
            self.skip_whitespace();
            if self.starts_with("/>") {
                self.pos += 2;
                return Ok(node);
            }
            if self.starts_with(">") {
                self.pos += 1;
                break;
            }
            if self.at_end() {
                return Err(self.fail(format!("unclosed start tag <{}>", tag)));
            }
            if before == self.pos {
                return Err(self.fail("expected whitespace before attribute"));
            }
            let (name, value) = self.parse_attribute()?;
            if node.attribute(name).is_some() {
                return Err(self.fail(format!("duplicate attribute {}", name)));
            }
            node.attributes.push((name.to_string(), value));
        }

        let content = self.parse_content(Some(tag))?;
        node.set_content(content);
        Ok(node)
    }

    fn parse_attribute(&mut self) -> ParseResult<(&'a str, String)> {
        let name = self.parse_name()?;
        self.skip_whitespace();
        if !self.starts_with("=") {
            return Err(self.fail(format!("attribute {} has no value", name)));
        }
        self.pos += 1;
        self.skip_whitespace();

        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.fail("attribute value must be quoted")),
        };
        self.pos += 1;
        let start = self.pos;
        let Some(len) = memchr(quote as u8, self.rest().as_bytes()) else {
            return Err(self.fail("unterminated attribute value"));
        };
        let raw = &self.rest()[..len];
        if let Some(lt) = memchr(b'<', raw.as_bytes()) {
            return Err(ParseFailure::new("'<' in attribute value", start + lt));
        }
        self.pos += len + 1;
        Ok((name, decode(raw, start)?))
    }

    /// Parse content until the end tag of `parent`, or to end of input when
    /// `parent` is `None`.
    fn parse_content(&mut self, parent: Option<&str>) -> ParseResult<Vec<Fragment>> {
        let mut fragments: Vec<Fragment> = Vec::new();

        loop {
            let rest = self.rest();
            let next = memchr(b'<', rest.as_bytes()).unwrap_or(rest.len());
            if next > 0 {
                let text = decode(&rest[..next], self.pos)?;
                push_text(&mut fragments, text);
                self.pos += next;
            }

            if self.at_end() {
                return match parent {
                    Some(tag) => Err(self.fail(format!("no closing tag for <{}>", tag))),
                    None => Ok(fragments),
                };
            }

            if self.starts_with("</") {
                let Some(tag) = parent else {
                    return Err(self.fail("closing tag without matching start tag"));
                };
                self.parse_end_tag(tag)?;
                return Ok(fragments);
            } else if self.starts_with("<!--") {
                self.pos += 4;
                self.take_until("-->", "comment")?;
            } else if self.starts_with("<![CDATA[") {
                self.pos += 9;
                let text = self.take_until("]]>", "CDATA section")?.to_string();
                push_text(&mut fragments, text);
            } else if self.starts_with("<?") {
                self.take_until("?>", "processing instruction")?;
            } else if self.starts_with("<!") {
                return Err(self.fail("unexpected markup declaration"));
            } else {
                let node = self.parse_element()?;
                fragments.push(Fragment::Node(node));
            }
        }
    }

    fn parse_end_tag(&mut self, expected: &str) -> ParseResult<()> {
        let start = self.pos;
        self.pos += 2;
        let name = self.parse_name()?;
        if name != expected {
            return Err(ParseFailure::new(
                format!("mismatched tag: expected </{}>, found </{}>", expected, name),
                start,
            ));
        }
        self.skip_whitespace();
        if !self.starts_with(">") {
            return Err(self.fail("unterminated end tag"));
        }
        self.pos += 1;
        Ok(())
    }
}

fn push_text(fragments: &mut Vec<Fragment>, text: String) {
    if text.is_empty() {
        return;
    }
    match fragments.last_mut() {
        Some(Fragment::Text(last)) => last.push_str(&text),
        _ => fragments.push(Fragment::Text(text)),
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.') || (!c.is_ascii() && !c.is_whitespace())
}
