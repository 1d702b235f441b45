use crate::pattern::Pattern;

/// Capture groups a replacement template may refer to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureGroups {
	count: usize,
	named: bool,
}

impl CaptureGroups {
	pub fn new(count: usize, named: bool) -> Self {
		CaptureGroups { count, named }
	}

	/// The groups of a compiled find pattern.
	pub fn of(pattern: &Pattern) -> Self {
		CaptureGroups::new(pattern.group_count(), pattern.has_named_groups())
	}

	fn has(&self, index: usize) -> bool {
		(1..=self.count).contains(&index)
	}
}

/// Expand a document replacement template into the regex crate's syntax,
/// substituting `body` for every `$S`.
///
/// Document templates use `$`-style references resolved against `groups`:
/// - `$nn` refers to a group when that group exists; otherwise `$n` does,
///   and the second digit stays literal
/// - `$0` and references to missing groups stay literal
/// - `$&` becomes `${0}`
/// - `$<name>` becomes `${name}` when the pattern has named groups
/// - `$$` stays an escaped dollar sign
/// - the body is inserted literally; its dollar signs are escaped
/// - any other `$` is a literal dollar sign
pub fn expand_template(template: &str, body: &str, groups: CaptureGroups) -> String {
	let mut out = String::with_capacity(template.len() + body.len());
	let mut rest = template;

	while let Some(dollar) = rest.find('$') {
		out.push_str(&rest[..dollar]);
		let after = &rest[dollar + 1..];

		let consumed = match after.as_bytes().first() {
			Some(b'$') => {
				out.push_str("$$");
				1
			}
			Some(b'S') => {
				out.push_str(&escape_dollars(body));
				1
			}
			Some(b'&') => {
				out.push_str("${0}");
				1
			}
			Some(b) if b.is_ascii_digit() => {
				let (index, digits) = group_reference(after.as_bytes(), groups);
				if digits == 0 {
					out.push_str("$$");
				} else {
					out.push_str(&format!("${{{}}}", index));
				}
				digits
			}
			Some(b'<') if groups.named => match after.find('>') {
				Some(close) => {
					// Unknown names expand to nothing.
					let name = &after[1..close];
					if is_group_name(name) {
						out.push_str(&format!("${{{}}}", name));
					}
					close + 1
				}
				None => {
					out.push_str("$$");
					0
				}
			},
			_ => {
				out.push_str("$$");
				0
			}
		};

		rest = &after[consumed..];
	}

	out.push_str(rest);
	out
}

/// Resolve the group index after a `$`, preferring two digits. Returns the
/// index and the number of digits consumed (zero for a literal dollar).
fn group_reference(digits: &[u8], groups: CaptureGroups) -> (usize, usize) {
	let first = usize::from(digits[0] - b'0');

	if let Some(second) = digits.get(1).filter(|b| b.is_ascii_digit()) {
		let index = first * 10 + usize::from(second - b'0');
		if groups.has(index) {
			return (index, 2);
		}
	}

	if groups.has(first) { (first, 1) } else { (0, 0) }
}

/// Escape text so the regex crate inserts it verbatim.
pub fn escape_dollars(text: &str) -> String {
	text.replace('$', "$$")
}

fn is_group_name(name: &str) -> bool {
	name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
		&& name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
