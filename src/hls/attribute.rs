use std::ops::Range;

/// One `NAME=VALUE` entry of a tag's attribute list, with byte offsets
/// relative to the full line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: &'a str,
    pub value: &'a str,
    /// Span of the value, excluding surrounding quotes.
    pub value_span: Range<usize>,
    pub quoted: bool,
}

/// Iterate the attribute list of a tag line such as
/// `#EXT-X-KEY:METHOD=AES-128,URI="key.bin"`.
///
/// Commas inside quoted values do not split attributes.
pub fn attributes(line: &str) -> Vec<Attribute<'_>> {
    let Some(colon) = line.find(':') else {
        return Vec::new();
    };

    let list_start = colon + 1;
    let mut attrs = Vec::new();
    let mut start = list_start;
    let mut in_quotes = false;

    for (i, c) in line[list_start..].char_indices() {
        let i = list_start + i;
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                attrs.extend(parse_attribute(line, start..i));
                start = i + 1;
            }
            _ => {}
        }
    }

    if start < line.len() {
        attrs.extend(parse_attribute(line, start..line.len()));
    }

    attrs
}

fn parse_attribute(line: &str, span: Range<usize>) -> Option<Attribute<'_>> {
    let raw = &line[span.clone()];
    let eq = raw.find('=')?;
    let name = raw[..eq].trim();

    let value_start = span.start + eq + 1;
    let raw_value = &line[value_start..span.end];
    let leading = raw_value.len() - raw_value.trim_start().len();
    let trimmed = raw_value.trim();
    let value_start = value_start + leading;

    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        let value_span = value_start + 1..value_start + trimmed.len() - 1;
        Some(Attribute {
            name,
            value: &line[value_span.clone()],
            value_span,
            quoted: true,
        })
    } else {
        let value_span = value_start..value_start + trimmed.len();
        Some(Attribute {
            name,
            value: trimmed,
            value_span,
            quoted: false,
        })
    }
}

/// Span of the first quoted, non-empty `URI` attribute value in a tag line.
pub fn uri_span(line: &str) -> Option<Range<usize>> {
    attributes(line)
        .into_iter()
        .find(|attr| attr.quoted && attr.name.eq_ignore_ascii_case("URI") && !attr.value.is_empty())
        .map(|attr| attr.value_span)
}
