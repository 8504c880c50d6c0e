use apidocs_engine::NamedDocument;

/// Generate a documentation set of `pages` files with nested headings
pub fn generate_documents(pages: usize) -> Vec<NamedDocument> {
    (0..pages)
        .map(|page| {
            let mut content = format!("# Endpoint group {page}\n\nOverview paragraph.\n\n");
            for section in 0..8 {
                content.push_str(&format!("## Operation {section}\n\nDescribes the request.\n\n"));
                content.push_str("```bash\n# example request\ncurl https://api.example.com\n```\n\n");
                for detail in 0..3 {
                    content.push_str(&format!("### Parameter {detail}\n\nType and default.\n\n"));
                }
            }
            NamedDocument::new(format!("group-{page}.mdx"), content)
        })
        .collect()
}
