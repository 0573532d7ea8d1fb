#![cfg(unix)]

use std::path::Path;
use std::process::{Command, Output};

/// A renderer that ignores its input and prints three header lines followed
/// by a tiny SVG, like `dot -Tsvg` does.
const FAKE_DOT: &str = r#"
title = "Field Notes"
root = "https://example.com"

[graphviz]
program = "sh"
args = ["-c", "cat > /dev/null; printf '<?xml?>\\n<!DOCTYPE>\\n<!-- gen -->\\n<svg/>'"]
"#;

const POST: &str = "+++
title = \"Hello\"
+++
Before.

```dot
digraph { a -> b }
```

After.
";

fn kestrel(args: &[&Path]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kestrel"))
        .args(args)
        .output()
        .unwrap()
}

fn site(config: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let content = dir.path().join("content");
    std::fs::create_dir_all(content.join("_posts")).unwrap();
    std::fs::write(dir.path().join("config.toml"), config).unwrap();
    std::fs::write(content.join("_posts/2024-03-01-hello.md"), POST).unwrap();
    std::fs::write(content.join("about.md"), "# About\n\n```dot\ngraph {}\n```\n").unwrap();
    std::fs::write(content.join("style.css"), "body {}").unwrap();
    dir
}

fn build(dir: &Path) -> Output {
    let out = dir.join("out");
    kestrel(&[Path::new("build"), dir, out.as_path()])
}

#[test]
fn builds_posts_with_embedded_diagrams() {
    let dir = site(FAKE_DOT);
    let output = build(dir.path());
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let out = dir.path().join("out");
    let post = std::fs::read_to_string(out.join("posts/hello/index.html")).unwrap();
    assert!(post.contains("<title>Hello</title>"));
    assert!(post.contains("data:image/svg+xml;base64,PHN2Zy8+"));
    assert!(post.contains("<!--\ndigraph { a -> b }\n-->"));
    assert!(!post.contains("```dot"));

    // Diagrams are only embedded in posts.
    let about = std::fs::read_to_string(out.join("about.html")).unwrap();
    assert!(about.contains(r##"<a class="link" href="#about" aria-label="about">"##));
    assert!(!about.contains("base64"));

    assert_eq!(std::fs::read_to_string(out.join("style.css")).unwrap(), "body {}");
}

#[test]
fn generates_a_feed() {
    let dir = site(FAKE_DOT);
    assert!(build(dir.path()).status.success());

    let feed = std::fs::read_to_string(dir.path().join("out/feed.xml")).unwrap();
    assert!(feed.starts_with("<?xml"));
    assert!(feed.contains(r#"<title type="html">Field Notes</title>"#));
    assert!(feed.contains("https://example.com/posts/hello/"));
    assert!(feed.contains("2024-03-01T00:00:00Z"));
}

#[test]
fn existing_feed_is_copied_not_generated() {
    let dir = site(FAKE_DOT);
    std::fs::write(dir.path().join("content/feed.xml"), "<feed>mine</feed>").unwrap();
    assert!(build(dir.path()).status.success());

    let feed = std::fs::read_to_string(dir.path().join("out/feed.xml")).unwrap();
    assert_eq!(feed, "<feed>mine</feed>");
}

#[test]
fn missing_renderer_fails_the_build() {
    let dir = site("[graphviz]\nprogram = \"kestrel-no-such-dot\"\n");
    let output = build(dir.path());
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("kestrel-no-such-dot"), "{stderr}");
    assert!(!dir.path().join("out/posts/hello/index.html").exists());
}

#[test]
fn embed_writes_to_stdout() {
    let dir = site(FAKE_DOT);
    let file = dir.path().join("content/_posts/2024-03-01-hello.md");
    let output = Command::new(env!("CARGO_BIN_EXE_kestrel"))
        .current_dir(dir.path())
        .args([Path::new("embed"), file.as_path(), Path::new("--no-comment")])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(
        "<div align=\"center\"><img src=\"data:image/svg+xml;base64,PHN2Zy8+\" /></div>"
    ));
    assert!(stdout.starts_with("+++\ntitle = \"Hello\""));
    assert!(!stdout.contains("digraph"));
}
