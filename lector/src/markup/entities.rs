//! Character and entity reference decoding.

use memchr::memchr;

use super::ParseFailure;

/// Decode the five predefined entities and numeric character references.
///
/// `offset` is the byte position of `raw` in the input, used for error
/// positions.
pub fn decode(raw: &str, offset: usize) -> Result<String, ParseFailure> {
    let bytes = raw.as_bytes();
    let Some(first) = memchr(b'&', bytes) else {
        return Ok(raw.to_string());
    };

    let mut out = String::with_capacity(raw.len());
    out.push_str(&raw[..first]);
    let mut pos = first;

    while pos < bytes.len() {
        if bytes[pos] != b'&' {
            let next = memchr(b'&', &bytes[pos..]).map_or(bytes.len(), |i| pos + i);
            out.push_str(&raw[pos..next]);
            pos = next;
            continue;
        }

        let Some(len) = memchr(b';', &bytes[pos..]) else {
            return Err(ParseFailure::new("unterminated entity reference", offset + pos));
        };
        let name = &raw[pos + 1..pos + len];
        out.push(resolve(name).ok_or_else(|| {
            ParseFailure::new(format!("undefined entity &{};", name), offset + pos)
        })?);
        pos += len + 1;
    }

    Ok(out)
}

fn resolve(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

/// Escape character data for element content.
pub fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

/// Escape an attribute value for a double-quoted attribute.
pub fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#09;"),
            _ => out.push(c),
        }
    }
}
