//! Lenient scanner for the markup of override documents.
//!
//! Only the top-level elements named by the caller are collected; every other
//! tag is transparent. The body of a collected element is kept verbatim and
//! never scanned for further elements.

/// Elements whose content is raw text (the first matching close tag ends them).
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// A collected element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
	/// Lowercased tag name.
	pub name: String,

	/// Attributes in source order.
	pub attributes: Attributes,

	/// Raw inner text between the start and end tags.
	pub body: String,

	/// False when the document ended before the closing tag.
	pub closed: bool,
}

/// Attributes of an element. Names are lowercased; bare attributes have no
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, Option<String>)>);

impl Attributes {
	/// Value of the first attribute called `name`. Bare attributes yield "".
	pub fn get(&self, name: &str) -> Option<&str> {
		self.0
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.as_deref().unwrap_or(""))
	}

	/// Whether an attribute called `name` is present, with or without value.
	pub fn has(&self, name: &str) -> bool {
		self.0.iter().any(|(key, _)| key == name)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl FromIterator<(String, Option<String>)> for Attributes {
	fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
		Attributes(iter.into_iter().collect())
	}
}

struct StartTag {
	name: String,
	attributes: Attributes,
	self_closing: bool,
	/// Byte offset just past the closing `>`.
	end: usize,
}

/// Collect the top-level elements of `source` whose tag name is in `names`
/// (names must be lowercase).
pub fn parse_elements(source: &str, names: &[&str]) -> Vec<Element> {
	let mut elements = Vec::new();
	let mut pos = 0;

	while let Some(offset) = source[pos..].find('<') {
		let start = pos + offset;

		if source[start..].starts_with("<!--") {
			pos = skip_comment(source, start);
			continue;
		}

		let Some(tag) = parse_start_tag(source, start) else {
			pos = start + 1;
			continue;
		};
		pos = tag.end;

		if !names.contains(&tag.name.as_str()) {
			continue;
		}

		if tag.self_closing {
			elements.push(Element {
				name: tag.name,
				attributes: tag.attributes,
				body: String::new(),
				closed: true,
			});
			continue;
		}

		match find_end_tag(source, tag.end, &tag.name) {
			Some((body_end, after)) => {
				elements.push(Element {
					name: tag.name,
					attributes: tag.attributes,
					body: source[tag.end..body_end].to_string(),
					closed: true,
				});
				pos = after;
			}
			None => {
				elements.push(Element {
					name: tag.name,
					attributes: tag.attributes,
					body: source[tag.end..].to_string(),
					closed: false,
				});
				pos = source.len();
			}
		}
	}

	elements
}

/// Offset just past the comment starting at `start`, or the end of input.
fn skip_comment(source: &str, start: usize) -> usize {
	let body = start + "<!--".len();
	match source[body..].find("-->") {
		Some(end) => body + end + "-->".len(),
		None => source.len(),
	}
}

fn is_name_start(byte: u8) -> bool {
	byte.is_ascii_alphabetic()
}

fn is_name_char(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b':' | b'.')
}

/// Parse a start tag at `start` (which points at `<`). Returns `None` when
/// the text there is not a well-formed start tag.
fn parse_start_tag(source: &str, start: usize) -> Option<StartTag> {
	let bytes = source.as_bytes();
	let mut i = start + 1;

	if i >= bytes.len() || !is_name_start(bytes[i]) {
		return None;
	}
	let name_start = i;
	while i < bytes.len() && is_name_char(bytes[i]) {
		i += 1;
	}
	let name = source[name_start..i].to_ascii_lowercase();

	let mut attributes = Vec::new();
	loop {
		while i < bytes.len() && bytes[i].is_ascii_whitespace() {
			i += 1;
		}
		if i >= bytes.len() {
			return None;
		}

		match bytes[i] {
			b'>' => {
				return Some(StartTag {
					name,
					attributes: Attributes(attributes),
					self_closing: false,
					end: i + 1,
				});
			}
			b'/' if bytes.get(i + 1) == Some(&b'>') => {
				return Some(StartTag {
					name,
					attributes: Attributes(attributes),
					self_closing: true,
					end: i + 2,
				});
			}
			b'/' => {
				i += 1;
				continue;
			}
			_ => {}
		}

		let attr_start = i;
		while i < bytes.len()
			&& !bytes[i].is_ascii_whitespace()
			&& !matches!(bytes[i], b'=' | b'>' | b'/')
		{
			i += 1;
		}
		if i == attr_start {
			// A stray `=` with no attribute name.
			i += 1;
			continue;
		}
		let attr_name = source[attr_start..i].to_ascii_lowercase();

		let mut j = i;
		while j < bytes.len() && bytes[j].is_ascii_whitespace() {
			j += 1;
		}
		if bytes.get(j) != Some(&b'=') {
			attributes.push((attr_name, None));
			continue;
		}
		i = j + 1;
		while i < bytes.len() && bytes[i].is_ascii_whitespace() {
			i += 1;
		}
		if i >= bytes.len() {
			return None;
		}

		let value = match bytes[i] {
			quote @ (b'"' | b'\'') => {
				let value_start = i + 1;
				let close = source[value_start..].find(quote as char)?;
				i = value_start + close + 1;
				&source[value_start..value_start + close]
			}
			_ => {
				let value_start = i;
				while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
					i += 1;
				}
				&source[value_start..i]
			}
		};
		attributes.push((attr_name, Some(decode_entities(value))));
	}
}

/// Whether `source[at..]` starts with `prefix` followed by `name` and a tag
/// name boundary, ignoring ASCII case.
fn starts_with_tag(source: &str, at: usize, prefix: &str, name: &str) -> bool {
	let bytes = source.as_bytes();
	let name_at = at + prefix.len();
	let end = name_at + name.len();
	if end > bytes.len() || !source[at..].starts_with(prefix) {
		return false;
	}
	bytes[name_at..end].eq_ignore_ascii_case(name.as_bytes())
		&& bytes
			.get(end)
			.is_none_or(|b| b.is_ascii_whitespace() || matches!(b, b'>' | b'/'))
}

/// Locate the end tag closing `name`, searching from `from`. Returns the
/// offset where the body ends and the offset just past the end tag.
fn find_end_tag(source: &str, from: usize, name: &str) -> Option<(usize, usize)> {
	let raw_text = RAW_TEXT_ELEMENTS.contains(&name);
	let mut depth = 0usize;
	let mut pos = from;

	while let Some(offset) = source[pos..].find('<') {
		let at = pos + offset;

		if starts_with_tag(source, at, "</", name) {
			if depth == 0 {
				let after = source[at..].find('>').map_or(source.len(), |gt| at + gt + 1);
				return Some((at, after));
			}
			depth -= 1;
			pos = at + 2;
			continue;
		}

		if !raw_text {
			if source[at..].starts_with("<!--") {
				pos = skip_comment(source, at);
				continue;
			}
			if starts_with_tag(source, at, "<", name)
				&& let Some(tag) = parse_start_tag(source, at)
			{
				if !tag.self_closing {
					depth += 1;
				}
				pos = tag.end;
				continue;
			}
		}

		pos = at + 1;
	}

	None
}

/// Decode the character references that commonly appear in attribute values.
fn decode_entities(value: &str) -> String {
	if !value.contains('&') {
		return value.to_string();
	}
	value
		.replace("&lt;", "<")
		.replace("&gt;", ">")
		.replace("&quot;", "\"")
		.replace("&#39;", "'")
		.replace("&#x27;", "'")
		.replace("&apos;", "'")
		.replace("&amp;", "&")
}
