use pretty_assertions::assert_eq;
use snippet_extract::{extract, list_snippets, CommentPrefixes, Extractor, SnippetSpan};
use std::fs;
use std::path::PathBuf;

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(path).unwrap()
}

fn has_marker_line(text: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim_start();
        (line.starts_with("//") || line.starts_with('#')) && line.contains("snippet")
    })
}

#[test]
fn should_return_text_without_markers_unchanged() {
    // Given
    let text = "fn main() {\n    println!(\"hi\");\n}\n\n";

    // When
    let result = extract(text, None);

    // Then
    assert_eq!(result, "fn main() {\n    println!(\"hi\");\n}\n");
}

#[test]
fn should_isolate_region_between_blank_boundaries() {
    // Given
    let source = fixture("todo_handler.go");

    // When
    let result = extract(&source, Some("handler struct"));

    // Then
    assert_eq!(result, "type TodoHandler struct {\n\tstore TodoStore\n}");
}

#[test]
fn should_strip_nested_markers_inside_region() {
    // Given
    let source = fixture("todo_handler.go");

    // When
    let result = extract(&source, Some("truncate"));

    // Then
    assert_eq!(
        result,
        concat!(
            "func truncate(text string, limit int) string {\n",
            "\tr := []rune(text)\n",
            "\tif len(r) <= limit {\n",
            "\t\treturn text\n",
            "\t}\n",
            "\n",
            "\treturn fmt.Sprintf(\"%s...\", string(r[:limit]))\n",
            "}"
        )
    );
}

#[test]
fn should_never_include_content_outside_requested_region() {
    // Given
    let text = concat!(
        "outside before\n",
        "// snippet-start: B\n",
        "\n",
        "b body\n",
        "\n",
        "// snippet-end: B\n",
        "// snippet-start: A\n",
        "\n",
        "a body 1\n",
        "# snippet-start: B\n",
        "a body 2\n",
        "# snippet-end: B\n",
        "\n",
        "// snippet-end: A\n",
        "outside after\n",
    );

    // When
    let result = extract(text, Some("A"));

    // Then
    assert_eq!(result, "a body 1\na body 2");
}

#[test]
fn should_fall_back_to_whole_text_when_snippet_is_missing() {
    // Given
    let text = concat!(
        "first\n",
        "// snippet-start: A\n",
        "middle\n",
        "// snippet-end: A\n",
        "last\n",
    );

    // When
    let extraction = Extractor::shared().extract(text, Some("C"));

    // Then
    assert!(!extraction.isolated);
    assert_eq!(extraction.text, "first\nmiddle\nlast");
}

#[test]
fn should_fall_back_when_end_marker_is_missing() {
    // Given
    let text = "head\n# snippet-start: open\nbody\ntail\n";

    // When
    let extraction = Extractor::shared().extract(text, Some("open"));

    // Then
    assert!(!extraction.isolated);
    assert_eq!(extraction.text, "head\nbody\ntail");
}

#[test]
fn should_never_leak_marker_lines() {
    let sources = [fixture("todo_handler.go"), fixture("settings.py")];
    let names = [
        None,
        Some("handler struct"),
        Some("constructor"),
        Some("truncate"),
        Some("guard"),
        Some("defaults"),
        Some("env"),
        Some("missing"),
    ];

    for source in &sources {
        for name in names {
            let result = extract(source, name);
            assert!(
                !has_marker_line(&result),
                "marker leaked for {name:?}:\n{result}"
            );
        }
    }
}

#[test]
fn should_trim_boundary_lines_even_when_not_blank() {
    // Given
    let text = concat!(
        "// snippet-start: X\n",
        "fn() {\n",
        "  doWork()\n",
        "}\n",
        "// snippet-end: X\n",
    );

    // When
    let isolated = extract(text, Some("X"));
    let whole = extract(text, None);

    // Then
    assert_eq!(isolated, "  doWork()");
    assert_eq!(whole, "fn() {\n  doWork()\n}");
}

#[test]
fn should_trim_python_dictionary_boundaries() {
    // Given
    let source = fixture("settings.py");

    // When
    let defaults = extract(&source, Some("defaults"));
    let env = extract(&source, Some("env"));

    // Then
    assert_eq!(defaults, "    \"host\": \"localhost\",\n    \"port\": 8080,");
    assert_eq!(
        env,
        concat!(
            "def from_env():\n",
            "    return {\n",
            "        \"host\": os.environ.get(\"HOST\", DEFAULTS[\"host\"]),\n",
            "        \"port\": int(os.environ.get(\"PORT\", DEFAULTS[\"port\"])),\n",
            "    }"
        )
    );
}

#[test]
fn should_select_first_start_and_first_following_end_for_duplicates() {
    // Given
    let text = concat!(
        "// snippet-start: X\n",
        "\n",
        "first\n",
        "\n",
        "// snippet-end: X\n",
        "between\n",
        "// snippet-start: X\n",
        "\n",
        "second\n",
        "\n",
        "// snippet-end: X\n",
    );

    // When
    let result = extract(text, Some("X"));

    // Then
    assert_eq!(result, "first");
}

#[test]
fn should_ignore_stray_end_marker_before_region() {
    // Given
    let text = concat!(
        "// snippet-end: X\n",
        "outside\n",
        "// snippet-start: X\n",
        "\n",
        "inside\n",
        "\n",
        "// snippet-end: X\n",
    );

    // Then
    assert_eq!(extract(text, Some("X")), "inside");
}

#[test]
fn should_match_names_verbatim() {
    // Given
    let text = "// snippet-start: demo2\n\nbody\n\n// snippet-end: demo2\n";

    // When
    let extraction = Extractor::shared().extract(text, Some("demo"));

    // Then
    assert!(!extraction.isolated);
    assert_eq!(extraction.text, "\nbody\n");
}

#[test]
fn should_honour_extended_comment_prefixes() {
    // Given
    let source = fixture("schema.sql");
    let prefixes = CommentPrefixes::default().with_prefix("--").unwrap();
    let extractor = Extractor::new(prefixes).unwrap();

    // When
    let default_result = Extractor::shared().extract(&source, Some("table"));
    let extended_result = extractor.extract(&source, Some("table"));

    // Then
    assert!(!default_result.isolated);
    assert_eq!(default_result.text, source.trim_end_matches('\n'));
    assert!(extended_result.isolated);
    assert_eq!(
        extended_result.text,
        "    id SERIAL PRIMARY KEY,\n    text TEXT NOT NULL"
    );
}

#[test]
fn should_list_snippets_in_order_of_appearance() {
    // Given
    let source = fixture("todo_handler.go");

    // When
    let spans = list_snippets(&source);

    // Then
    assert_eq!(
        spans,
        vec![
            SnippetSpan {
                name: "handler struct".to_string(),
                start_line: 8,
                end_line: Some(14),
            },
            SnippetSpan {
                name: "constructor".to_string(),
                start_line: 16,
                end_line: Some(22),
            },
            SnippetSpan {
                name: "truncate".to_string(),
                start_line: 24,
                end_line: Some(37),
            },
            SnippetSpan {
                name: "guard".to_string(),
                start_line: 28,
                end_line: Some(32),
            },
        ]
    );
}

#[test]
fn should_keep_content_where_prefix_touches_snippet_word() {
    // Given
    let text = concat!(
        "#snippet-card {\n",
        "  color: red;\n",
        "}\n",
        "let url = \"https://snippet.dev\";\n",
        "let tag = \"#snippet\";\n",
    );

    // When
    let result = extract(text, None);

    // Then
    assert_eq!(
        result,
        concat!(
            "#snippet-card {\n",
            "  color: red;\n",
            "}\n",
            "let url = \"https://snippet.dev\";\n",
            "let tag = \"#snippet\";",
        )
    );
}

#[test]
fn should_trim_padding_from_requested_name() {
    // Given
    let text = "// snippet-start: demo\n\nbody\n\n// snippet-end: demo\n";

    // When
    let extraction = Extractor::shared().extract(text, Some(" demo "));

    // Then
    assert!(extraction.isolated);
    assert_eq!(extraction.text, "body");
}

#[test]
fn should_drop_first_code_line_when_region_has_no_leading_blank() {
    // Given
    let source = fixture("exchange_main.go");

    // When
    let isolated = extract(&source, Some("main"));
    let whole = extract(&source, None);

    // Then
    assert_eq!(
        isolated,
        concat!(
            "\n",
            "import \"fmt\"\n",
            "\n",
            "func main() {\n",
            "\tfmt.Println(\"exchange ready\")\n",
            "}"
        )
    );
    assert!(whole.starts_with("package main\n"));
}
