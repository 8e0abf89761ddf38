mod sonar_stub;

use predicates::prelude::*;

#[cfg(unix)]
use sonar_stub::{LessonBehavior, ProblemBehavior, SonarStub, SonarStubConfig, TopicsBehavior};

#[test]
fn sanitize_rewrites_markdown_file() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let input = temp.path().join("in.md");
    let out = temp.path().join("out/clean.md");
    std::fs::write(
        &input,
        "# Forces\nThe vec{F} = m vec{a} relation\nLet $x_1$ be 50% & more\n```python\nx = {'a': 1}  # 50%\n```\n",
    )?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("studypack");
    cmd.args(["sanitize", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let cleaned = std::fs::read_to_string(&out)?;
    assert_eq!(
        cleaned,
        "# Forces\n$The \\vec{F} = m \\vec{a} relation$\nLet $x_1$ be 50\\% \\& more\n```python\nx = {'a': 1}  # 50%\n```\n"
    );
    Ok(())
}

#[test]
fn sanitize_item_strips_numbering() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let input = temp.path().join("item.md");
    let out = temp.path().join("item.out.md");
    std::fs::write(&input, "Problem 4: A cart rolls.\n(a) Find v.")?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("studypack");
    cmd.args(["sanitize", "--item", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    assert_eq!(std::fs::read_to_string(&out)?, "A cart rolls.\n(a) Find v.");
    Ok(())
}

#[test]
fn sanitize_refuses_to_overwrite_without_force() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let input = temp.path().join("in.md");
    let out = temp.path().join("out.md");
    std::fs::write(&input, "a & b")?;
    std::fs::write(&out, "keep me")?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("studypack");
    cmd.args(["sanitize", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("open output"));
    assert_eq!(std::fs::read_to_string(&out)?, "keep me");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("studypack");
    cmd.args(["sanitize", "--force", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();
    assert_eq!(std::fs::read_to_string(&out)?, "a \\& b");
    Ok(())
}

#[test]
fn studypack_log_debug_emits_debug_line_to_stderr() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("studypack");
    cmd.env_remove("RUST_LOG")
        .env("STUDYPACK_LOG", "debug")
        .args(["list", "--out-dir"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout("[]\n")
        .stderr(predicate::str::contains("parsed cli"));
    Ok(())
}

#[test]
fn create_fails_fast_without_api_key() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("studypack");
    cmd.env_remove("PERPLEXITY_API_KEY")
        .env_remove("PPLX_API_KEY")
        .args(["create", "--prompt", "vectors", "--grade-level", "undergraduate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PERPLEXITY_API_KEY"));
}

#[test]
fn visibility_of_unknown_packet_fails() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("studypack");
    cmd.args(["visibility", "--id", "abc123", "--public", "true", "--out-dir"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("packet not found: abc123"));
    Ok(())
}

#[cfg(unix)]
const FAKE_PANDOC: &str = r#"#!/bin/sh
while [ "$#" -gt 0 ]; do
  case "$1" in
    -o) : > "$2"; shift 2 ;;
    -H) cp "$2" "$HEADER_COPY"; shift 2 ;;
    *) shift ;;
  esac
done
"#;

#[cfg(unix)]
#[test]
fn packet_command_hands_header_includes_to_pandoc() -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt as _;

    let stub = SonarStub::spawn(SonarStubConfig {
        topics: TopicsBehavior::Valid,
        lesson: LessonBehavior::Valid,
        problems: ProblemBehavior::Items(2),
    });
    let temp = tempfile::TempDir::new()?;
    let fake_pandoc = temp.path().join("fake-pandoc");
    std::fs::write(&fake_pandoc, FAKE_PANDOC)?;
    std::fs::set_permissions(&fake_pandoc, std::fs::Permissions::from_mode(0o755))?;
    let header_copy = temp.path().join("header.tex");
    let out_dir = temp.path().join("packets");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("studypack");
    cmd.env("PERPLEXITY_API_KEY", "")
        .env("PPLX_API_KEY", "pplx-test")
        .env("STUDYPACK_BASE_URL", &stub.base_url)
        .env("STUDYPACK_PANDOC", &fake_pandoc)
        .env(
            "STUDYPACK_HEADER_INCLUDES",
            "\\usepackage{amsmath}\n\\usepackage{bm}",
        )
        .env("HEADER_COPY", &header_copy)
        .args([
            "packet",
            "--topic",
            "Vectors",
            "--subtopic",
            "Gram-Schmidt",
            "--grade-level",
            "undergraduate",
            "--problems",
            "2",
            "--out-dir",
        ])
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"ok\""));

    assert_eq!(
        std::fs::read_to_string(&header_copy)?,
        "\\usepackage{amsmath}\n\\usepackage{bm}\n"
    );
    Ok(())
}
