use crate::document::OverrideDocument;
use crate::error::Result;
use crate::rules::modification::Modification;
use tracing::debug;

/// Compile every section of a document into a modification, in section
/// order. A document without sections yields no modifications.
pub fn compile_document(document: &OverrideDocument) -> Result<Vec<Modification>> {
	let modifications = document
		.sections()
		.iter()
		.map(|section| section.compile(document.target(), document.filepath()))
		.collect::<Result<Vec<_>>>()?;

	debug!(
		path = %document.filepath().display(),
		target = %document.target().filename(),
		count = modifications.len(),
		"compiled override document"
	);

	Ok(modifications)
}

/// Compile a list of documents, preserving discovery order.
pub fn compile_documents(documents: &[OverrideDocument]) -> Result<Vec<Modification>> {
	let mut modifications = Vec::new();
	for document in documents {
		modifications.extend(compile_document(document)?);
	}
	Ok(modifications)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::Extensions;
	use pretty_assertions::assert_eq;
	use std::path::Path;

	fn parse(source: &str) -> OverrideDocument {
		OverrideDocument::parse("/o/Foo.vuem", source, &Extensions::default()).unwrap()
	}

	#[test]
	fn test_document_without_sections() {
		assert!(compile_document(&parse("")).unwrap().is_empty());
		assert!(
			compile_document(&parse("<file>Bar.vue</file>\nnotes"))
				.unwrap()
				.is_empty()
		);
	}

	#[test]
	fn test_one_rule_per_section_grouped_by_kind() {
		let rules = compile_document(&parse(
			"<style>s</style><script>a</script><template>t</template><script>b</script>",
		))
		.unwrap();

		let finds: Vec<_> = rules
			.iter()
			.map(|r| r.find().map(|p| p.as_str().to_string()).unwrap_or_default())
			.collect();
		assert_eq!(
			finds,
			vec![
				"(</template[^>]*>)",
				"(</script[^>]*>)",
				"(</script[^>]*>)",
				"(</style[^>]*>)",
			]
		);
		assert_eq!(rules[1].replace(), "a\n${1}");
		assert_eq!(rules[2].replace(), "b\n${1}");
		assert!(rules.iter().all(|r| r.owner_filename() == "Foo.vue"));
		assert!(
			rules
				.iter()
				.all(|r| r.own_document_id() == Path::new("/o/Foo.vuem"))
		);
	}

	#[test]
	fn test_compilation_is_idempotent() {
		let source = r#"<file regex>Card\w*\.vue</file>
<template before="<footer>" trim>
  <p>x</p>
</template>
<style>.a { color: red }</style>"#;

		let first = compile_document(&parse(source)).unwrap();
		let second = compile_document(&parse(source)).unwrap();
		assert_eq!(first, second);
		assert_eq!(first[0].filter().as_str(), r"Card\w*\.vue");
	}

	#[test]
	fn test_compile_documents_keeps_order() {
		let extensions = Extensions::default();
		let documents = vec![
			OverrideDocument::parse("/o/A.vuem", "<script>a</script>", &extensions).unwrap(),
			OverrideDocument::parse("/o/B.vuem", "<script>b</script>", &extensions).unwrap(),
		];
		let owners: Vec<_> = compile_documents(&documents)
			.unwrap()
			.iter()
			.map(|r| r.owner_filename().to_string())
			.collect();
		assert_eq!(owners, vec!["A.vue", "B.vue"]);
	}

	#[test]
	fn test_invalid_find_fails_document() {
		let document = parse(r#"<script find="(unclosed">x</script>"#);
		assert!(compile_document(&document).is_err());
	}
}
