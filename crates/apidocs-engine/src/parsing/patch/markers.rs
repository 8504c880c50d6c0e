use std::sync::OnceLock;

use regex::Regex;

use crate::editing::EditOperation;

struct MarkerGrammar {
    update: Regex,
    add: Regex,
    delete: Regex,
}

fn grammar() -> &'static MarkerGrammar {
    static GRAMMAR: OnceLock<MarkerGrammar> = OnceLock::new();
    GRAMMAR.get_or_init(|| MarkerGrammar {
        update: body_block("UPDATE"),
        add: body_block("ADD"),
        delete: Regex::new(
            r"(?s)MDX_DELETE_START\s*filename:[ \t]*(?P<filename>[^\r\n]*?)\s*MDX_DELETE_END",
        )
        .expect("Invalid delete marker regex"),
    })
}

fn body_block(kind: &str) -> Regex {
    Regex::new(&format!(
        r"(?s)MDX_{kind}_START\s*filename:[ \t]*(?P<filename>[^\r\n]*?)\s*content:(?P<body>.*?)MDX_{kind}_END"
    ))
    .expect("Invalid marker regex")
}

/// Parse the first marker block by priority: update, add, delete
pub fn parse(message: &str) -> Option<EditOperation> {
    let grammar = grammar();

    if let Some((filename, body)) = capture_body(&grammar.update, message) {
        return Some(EditOperation::update(filename, body));
    }
    if let Some((filename, body)) = capture_body(&grammar.add, message) {
        return Some(EditOperation::add(filename, body));
    }

    let captures = grammar.delete.captures(message)?;
    let filename = clean_filename(&captures["filename"])?;
    Some(EditOperation::delete(filename))
}

fn capture_body<'a>(regex: &Regex, message: &'a str) -> Option<(&'a str, &'a str)> {
    let captures = regex.captures(message)?;
    let filename = clean_filename(captures.name("filename")?.as_str())?;
    let body = captures.name("body")?.as_str().trim();
    Some((filename, body))
}

/// Models sometimes quote or backtick the filename
fn clean_filename(raw: &str) -> Option<&str> {
    let filename = raw.trim().trim_matches(|c| matches!(c, '`' | '"' | '\'')).trim();
    (!filename.is_empty()).then_some(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_update_block() {
        let message = "Sure, here you go.\n\nMDX_UPDATE_START\nfilename: auth.mdx\ncontent:\n# Auth\n\nUse a bearer token.\nMDX_UPDATE_END\n\nLet me know!";

        assert_eq!(
            parse(message),
            Some(EditOperation::update("auth.mdx", "# Auth\n\nUse a bearer token."))
        );
    }

    #[test]
    fn test_add_block() {
        let message = "MDX_ADD_START\nfilename: errors.mdx\ncontent:\n## Errors\nMDX_ADD_END";
        assert_eq!(parse(message), Some(EditOperation::add("errors.mdx", "## Errors")));
    }

    #[test]
    fn test_delete_block() {
        let message = "Removing it.\nMDX_DELETE_START\nfilename: old.mdx\nMDX_DELETE_END";
        assert_eq!(parse(message), Some(EditOperation::delete("old.mdx")));
    }

    #[rstest]
    #[case("MDX_UPDATE_START filename: a.mdx content: body MDX_UPDATE_END")]
    #[case("MDX_UPDATE_START\r\nfilename:a.mdx\r\ncontent:\r\nbody\r\nMDX_UPDATE_END")]
    #[case("MDX_UPDATE_START\n\n  filename:   a.mdx  \n\n content:\n\n body \n\nMDX_UPDATE_END")]
    #[case("MDX_UPDATE_START\nfilename: `a.mdx`\ncontent:\nbody\nMDX_UPDATE_END")]
    fn test_whitespace_tolerance(#[case] message: &str) {
        assert_eq!(parse(message), Some(EditOperation::update("a.mdx", "body")));
    }

    #[test]
    fn test_body_keeps_inner_formatting() {
        let message = "MDX_UPDATE_START\nfilename: a.mdx\ncontent:\n```js\nconst x = 1;\n```\n\n  indented\nMDX_UPDATE_END";

        assert_eq!(
            parse(message),
            Some(EditOperation::update("a.mdx", "```js\nconst x = 1;\n```\n\n  indented"))
        );
    }

    #[test]
    fn test_add_wins_over_delete() {
        let message = "MDX_DELETE_START\nfilename: a.mdx\nMDX_DELETE_END\nMDX_ADD_START\nfilename: b.mdx\ncontent:\nB\nMDX_ADD_END";
        assert_eq!(parse(message), Some(EditOperation::add("b.mdx", "B")));
    }

    #[rstest]
    #[case("MDX_UPDATE_START\nfilename: a.mdx\ncontent:\nno end marker")]
    #[case("MDX_UPDATE_START\nfilename:\ncontent:\nbody\nMDX_UPDATE_END")]
    #[case("MDX_DELETE_START\nMDX_DELETE_END")]
    #[case("MDX_ADD_START\nfilename: a.mdx\nMDX_ADD_END")]
    fn test_incomplete_blocks_are_ignored(#[case] message: &str) {
        assert_eq!(parse(message), None);
    }
}
