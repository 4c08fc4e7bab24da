// tests/pattern_matching.rs

use devloop::errors::DevloopError;
use devloop::watch::{matches, Pattern, PatternSet};

/// (path, pattern, expected)
const TABLE: &[(&str, &str, bool)] = &[
    // `**` spans zero or more directories.
    ("main.go", "**/*.go", true),
    ("pkg/foo.go", "**/*.go", true),
    ("pkg/deep/nested/foo.go", "**/*.go", true),
    ("README.md", "**/*.go", false),
    ("main.go.bak", "**/*.go", false),
    // `*` never crosses a `/`.
    ("app.js", "*.js", true),
    ("src/app.js", "*.js", false),
    ("src/app.js", "src/*.js", true),
    ("src/lib/app.js", "src/*.js", false),
    ("src/lib/app.js", "src/**/*.js", true),
    ("src/app.js", "src/**/*.js", true),
    ("src/deep/x/app.js", "src/**/*.js", true),
    ("src/app.js", "**/*.js", true),
    ("test/app.js", "src/**/*.js", false),
    // Brace alternation and classes come from the glob library.
    ("web/style.css", "web/*.{css,scss}", true),
    ("web/style.scss", "web/*.{css,scss}", true),
    ("web/style.less", "web/*.{css,scss}", false),
    ("log1.txt", "log[0-9].txt", true),
    // Bare extension lists match the suffix at any depth.
    ("main.go", "go", true),
    ("cmd/server/main.go", "go", true),
    ("main.gox", "go", false),
    ("pkg/foo.go", "js,go", true),
    ("lib.rs", ".rs", true),
    ("index.html", "js,css,html", true),
    ("assets/site.css", "js, css, html", true),
    ("notes.txt", "js,css,html", false),
    ("Makefile", "go", false),
    // A bare token also matches a file with exactly that name.
    ("Makefile", "Makefile", true),
    ("docs/Makefile", "Makefile", true),
    ("Dockerfile", "Dockerfile,Makefile", true),
    ("Makefile.bak", "Makefile", false),
    ("go", "go", true),
    // No case folding.
    ("MAIN.GO", "**/*.go", false),
    // Empty path never matches.
    ("", "**", false),
    ("", "go", false),
];

#[test]
fn fixed_table() {
    for &(path, pattern, expected) in TABLE {
        assert_eq!(
            matches(path, pattern),
            expected,
            "matches({path:?}, {pattern:?})"
        );
    }
}

#[test]
fn invalid_pattern_never_matches() {
    assert!(!matches("src/[", "src/["));
}

#[test]
fn parse_distinguishes_globs_from_extension_lists() -> Result<(), DevloopError> {
    assert!(matches!(Pattern::parse("go,js")?, Pattern::Extensions(ref e) if e == &["go", "js"]));
    assert!(matches!(Pattern::parse(".rs")?, Pattern::Extensions(ref e) if e == &["rs"]));
    assert!(matches!(Pattern::parse("*.go")?, Pattern::Glob { .. }));
    assert!(matches!(Pattern::parse("src/main.go")?, Pattern::Glob { .. }));
    Ok(())
}

#[test]
fn parse_rejects_empty_and_malformed() {
    assert!(matches!(Pattern::parse("   "), Err(DevloopError::ConfigError(_))));
    assert!(matches!(
        Pattern::parse("a/{b"),
        Err(DevloopError::InvalidPattern { .. })
    ));
}

#[test]
fn first_match_short_circuits_in_order() -> Result<(), DevloopError> {
    let set = PatternSet::compile(&["**/*.md", "**/*.go", "go"])?;

    assert_eq!(set.first_match("pkg/main.go"), Some(1));
    assert_eq!(set.first_match("docs/intro.md"), Some(0));
    assert_eq!(set.first_match("style.css"), None);
    Ok(())
}

#[test]
fn empty_set_never_matches() -> Result<(), DevloopError> {
    let set = PatternSet::compile::<&str>(&[])?;
    assert!(set.is_empty());
    assert!(!set.is_match("main.go"));
    Ok(())
}
