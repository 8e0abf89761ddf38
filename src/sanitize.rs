use once_cell::sync::Lazy;
use regex::Regex;

/// Commands that only make sense in math mode.
pub const MATH_COMMANDS: &[&str] = &[
    "vec", "frac", "cdot", "times", "ldots", "nabla", "partial", "sqrt", "sum", "prod", "int",
    "lim", "log", "ln", "sin", "cos", "tan", "alpha", "beta", "gamma", "Delta", "leq", "geq", "pm",
];

pub const RESERVED_CHARS: &[char] = &['\\', '{', '}', '&', '#', '%', '_', '~', '^', '$'];

/// Enumeration markers removed from the first line of a problem or solution.
pub const NUMBERING_PATTERNS: &[&str] = &[
    r"(?i)^\*\*(?:problem|question|exercise)\s*\d+[a-z]?\s*[:.)]?\s*\*\*\s*[:.)]?\s*",
    r"(?i)^(?:problem|question|exercise)\s*\d+[a-z]?(?:\s*[:.)\-–]\s*|\s*$)",
    r"(?i)^q\s*\.?\s*\d+[a-z]?\s*[:.)\-–]\s*",
    r"^\(\d+[a-z]?\)\s*",
    r"^\d+[.)]\s+",
    r"^\([a-z]\)\s*",
    r"^[a-z]\)\s*",
];

// The backslash must not itself be escaped: `\\frac` is a literal backslash
// followed by the word `frac`.
static RE_COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?:^|[^\\])(?:\\\\)*\\(?:{})(?:[^A-Za-z]|$)",
        MATH_COMMANDS.join("|")
    ))
    .unwrap()
});

// A command written without its backslash but with its argument, e.g. `vec{F}`.
static RE_BARE_COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(^|[^\\A-Za-z])({})\{{", MATH_COMMANDS.join("|"))).unwrap()
});

static RE_LINE_PARTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*(?:(?:#{1,6}|[-*+]|\d+[.)]|>)[ \t]+)*)(.*?)(\s*)$").unwrap()
});

static RE_HEADING_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}#{1,6}(?:[ \t]|$)").unwrap());

static RE_MARKDOWN_WRAPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[ \t]*(?:markdown|md)[ \t]*\r?\n(.*?)\r?\n```[ \t]*$").unwrap());

static NUMBERING_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    NUMBERING_PATTERNS
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

pub fn sanitize(raw: &str) -> String {
    let text = unwrap_markdown_fence(raw);
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for block in split_blocks(text) {
        match block {
            Block::Code(code) => out.push_str(code),
            Block::Prose(prose) => out.push_str(&sanitize_prose(&prose)),
        }
    }
    out
}

/// Sanitize one problem or solution: numbering removal, then [`sanitize`].
pub fn sanitize_item(raw: &str) -> String {
    sanitize(&strip_numbering_prefix(raw))
}

fn sanitize_prose(prose: &str) -> String {
    let text = normalize_delimiters(prose);
    let text = demote_stray_delimiters(&text);
    let text = force_math_mode(&text);
    let text = escape_reserved(&text);
    balance_dollars(&text)
}

/// Closed fenced code blocks, verbatim and in order.
pub fn extract_code_blocks(text: &str) -> Vec<String> {
    split_blocks(unwrap_markdown_fence(text))
        .into_iter()
        .filter_map(|block| match block {
            Block::Code(code) => Some(code.to_owned()),
            Block::Prose(_) => None,
        })
        .collect()
}

fn unwrap_markdown_fence(raw: &str) -> &str {
    match RE_MARKDOWN_WRAPPER.captures(raw.trim()) {
        Some(caps) => caps.get(1).map_or(raw, |m| m.as_str()),
        None => raw,
    }
}

// ── Fenced blocks ────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum Block<'a> {
    Code(&'a str),
    Prose(String),
}

fn split_blocks(input: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut prose = String::new();
    let mut offset = 0usize;
    let mut fence: Option<(usize, &str)> = None;

    for piece in input.split_inclusive('\n') {
        let start = offset;
        offset += piece.len();

        match fence {
            None => {
                if let Some(marker) = fence_start_marker(piece) {
                    fence = Some((start, marker));
                } else {
                    prose.push_str(piece);
                }
            }
            Some((fence_start, marker)) => {
                if fence_end_marker(piece, marker) {
                    if !prose.is_empty() {
                        blocks.push(Block::Prose(std::mem::take(&mut prose)));
                    }
                    blocks.push(Block::Code(&input[fence_start..offset]));
                    fence = None;
                }
            }
        }
    }

    // Unclosed fence: drop the stray fence line and split what followed again.
    if let Some((fence_start, _)) = fence {
        let opening = &input[fence_start..];
        let after = opening.find('\n').map_or("", |idx| &opening[idx + 1..]);
        for block in split_blocks(after) {
            match block {
                Block::Prose(text) => prose.push_str(&text),
                code @ Block::Code(_) => {
                    if !prose.is_empty() {
                        blocks.push(Block::Prose(std::mem::take(&mut prose)));
                    }
                    blocks.push(code);
                }
            }
        }
    }
    if !prose.is_empty() {
        blocks.push(Block::Prose(prose));
    }
    blocks
}

fn fence_start_marker(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    for fence_char in ['`', '~'] {
        let len = trimmed.chars().take_while(|c| *c == fence_char).count();
        if len >= 3 {
            return Some(&trimmed[..len]);
        }
    }
    None
}

fn fence_end_marker(line: &str, marker: &str) -> bool {
    let trimmed = line.trim();
    let Some(fence_char) = marker.chars().next() else {
        return false;
    };
    trimmed.len() >= marker.len() && trimmed.chars().all(|c| c == fence_char)
}

// ── Tokenizer ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentKind {
    Text,
    /// Copied as is: code spans, URLs, escape pairs, heading markers.
    Verbatim,
    Math(Closing),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closing {
    Closed,
    /// `$` still open at a newline or the end of input.
    OpenInline,
    /// `$$` never closed before the end of input.
    OpenDisplay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    kind: SegmentKind,
    start: usize,
    end: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Text,
    Inline,
    Display,
}

/// Split prose into text, verbatim, and math segments covering every byte.
fn tokenize(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut mode = Mode::Text;
    let mut text_start = 0usize;
    let mut math_start = 0usize;
    let mut at_line_start = true;
    let mut i = 0usize;

    let push = |segments: &mut Vec<Segment>, kind: SegmentKind, start: usize, end: usize| {
        if end > start {
            segments.push(Segment { kind, start, end });
        }
    };

    while i < input.len() {
        let rest = &input[i..];
        let Some(ch) = rest.chars().next() else {
            break;
        };

        match mode {
            Mode::Text => {
                if at_line_start {
                    at_line_start = false;
                    let line = rest.split('\n').next().unwrap_or(rest);
                    if let Some(m) = RE_HEADING_MARKER.find(line) {
                        push(&mut segments, SegmentKind::Text, text_start, i);
                        push(&mut segments, SegmentKind::Verbatim, i, i + m.end());
                        i += m.end();
                        text_start = i;
                        continue;
                    }
                }

                let verbatim_len = if ch == '`' {
                    code_span_len(rest)
                } else if rest.starts_with("http://") || rest.starts_with("https://") {
                    Some(rest.find(char::is_whitespace).unwrap_or(rest.len()))
                } else if ch == '\\' {
                    escape_pair_len(rest)
                } else {
                    None
                };
                if let Some(len) = verbatim_len {
                    push(&mut segments, SegmentKind::Text, text_start, i);
                    push(&mut segments, SegmentKind::Verbatim, i, i + len);
                    i += len;
                    text_start = i;
                    continue;
                }

                if ch == '$' {
                    push(&mut segments, SegmentKind::Text, text_start, i);
                    math_start = i;
                    if rest.starts_with("$$") {
                        mode = Mode::Display;
                        i += 2;
                    } else {
                        mode = Mode::Inline;
                        i += 1;
                    }
                    continue;
                }

                if ch == '\n' {
                    at_line_start = true;
                }
                i += ch.len_utf8();
            }
            Mode::Inline => {
                if ch == '\n' {
                    push(
                        &mut segments,
                        SegmentKind::Math(Closing::OpenInline),
                        math_start,
                        i,
                    );
                    mode = Mode::Text;
                    text_start = i;
                    continue;
                }
                if ch == '$' {
                    i += 1;
                    push(
                        &mut segments,
                        SegmentKind::Math(Closing::Closed),
                        math_start,
                        i,
                    );
                    mode = Mode::Text;
                    text_start = i;
                    continue;
                }
                i += math_escape_len(rest).unwrap_or(ch.len_utf8());
            }
            Mode::Display => {
                if rest.starts_with("$$") {
                    i += 2;
                    push(
                        &mut segments,
                        SegmentKind::Math(Closing::Closed),
                        math_start,
                        i,
                    );
                    mode = Mode::Text;
                    text_start = i;
                    continue;
                }
                i += math_escape_len(rest).unwrap_or(ch.len_utf8());
            }
        }
    }

    match mode {
        Mode::Text => push(&mut segments, SegmentKind::Text, text_start, input.len()),
        Mode::Inline => push(
            &mut segments,
            SegmentKind::Math(Closing::OpenInline),
            math_start,
            input.len(),
        ),
        Mode::Display => push(
            &mut segments,
            SegmentKind::Math(Closing::OpenDisplay),
            math_start,
            input.len(),
        ),
    }
    segments
}

fn code_span_len(rest: &str) -> Option<usize> {
    let run = rest.chars().take_while(|c| *c == '`').count();
    let delimiter = "`".repeat(run);
    let line = rest.split('\n').next().unwrap_or(rest);
    let close = line[run..].find(&delimiter)?;
    Some(run + close + run)
}

// `\` plus ASCII punctuation is an existing escape.
fn escape_pair_len(rest: &str) -> Option<usize> {
    let next = rest[1..].chars().next()?;
    next.is_ascii_punctuation().then_some(1 + next.len_utf8())
}

fn math_escape_len(rest: &str) -> Option<usize> {
    if !rest.starts_with('\\') {
        return None;
    }
    let next = rest[1..].chars().next()?;
    (next != '\n').then_some(1 + next.len_utf8())
}

// ── Stage 1 ──────────────────────────────────────────────────────────────────

/// Rewrite `\(..\)` to `$..$` and `\[..\]` to `$$..$$` outside code spans.
pub fn normalize_delimiters(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut i = 0usize;

    while i < input.len() {
        let rest = &input[i..];
        let Some(ch) = rest.chars().next() else {
            break;
        };

        if ch == '`'
            && let Some(len) = code_span_len(rest)
        {
            out.push_str(&rest[..len]);
            i += len;
            continue;
        }

        if ch == '\\'
            && let Some(next) = rest[1..].chars().next()
        {
            match next {
                '(' | ')' => out.push('$'),
                '[' | ']' => out.push_str("$$"),
                _ => {
                    out.push('\\');
                    out.push(next);
                }
            }
            i += 1 + next.len_utf8();
            continue;
        }

        out.push(ch);
        i += ch.len_utf8();
    }

    out
}

/// Turn `$$` that never closes into `\$\$`, and a `$` with nothing after
/// it on its line into `\$`. Runs before any stage that looks at math spans.
pub fn demote_stray_delimiters(input: &str) -> String {
    let mut text = input.to_owned();
    while let Some(open) = tokenize(&text)
        .into_iter()
        .find(|seg| seg.kind == SegmentKind::Math(Closing::OpenDisplay))
    {
        text.replace_range(open.start..open.start + 2, "\\$\\$");
    }

    let mut out = String::with_capacity(text.len() + 4);
    for seg in tokenize(&text) {
        let piece = &text[seg.start..seg.end];
        if seg.kind == SegmentKind::Math(Closing::OpenInline) && piece[1..].trim().is_empty() {
            out.push_str("\\$");
            out.push_str(&piece[1..]);
        } else {
            out.push_str(piece);
        }
    }
    out
}

// ── Stage 2 ──────────────────────────────────────────────────────────────────

/// Wrap lines that use math commands but carry no math span.
pub fn force_math_mode(input: &str) -> String {
    let math_ranges = tokenize(input)
        .into_iter()
        .filter(|seg| matches!(seg.kind, SegmentKind::Math(_)))
        .map(|seg| (seg.start, seg.end))
        .collect::<Vec<_>>();

    let mut out = String::with_capacity(input.len() + 16);
    let mut offset = 0usize;
    for piece in input.split_inclusive('\n') {
        let start = offset;
        offset += piece.len();
        let (line, newline) = match piece.strip_suffix('\n') {
            Some(line) => (line, "\n"),
            None => (piece, ""),
        };

        let end = start + line.len();
        let touches_math = math_ranges.iter().any(|(s, e)| *s < end && *e > start);
        if touches_math {
            out.push_str(piece);
            continue;
        }

        out.push_str(&wrap_math_line(line));
        out.push_str(newline);
    }
    out
}

fn wrap_math_line(line: &str) -> String {
    if line.contains('`') || line.contains("://") {
        return line.to_owned();
    }
    if !RE_COMMAND.is_match(line) && !RE_BARE_COMMAND.is_match(line) {
        return line.to_owned();
    }
    let Some(caps) = RE_LINE_PARTS.captures(line) else {
        return line.to_owned();
    };
    let prefix = caps.get(1).map_or("", |m| m.as_str());
    let body = caps.get(2).map_or("", |m| m.as_str());
    let trailing = caps.get(3).map_or("", |m| m.as_str());
    if body.is_empty() {
        return line.to_owned();
    }

    let body = RE_BARE_COMMAND.replace_all(body, "${1}\\${2}{");
    format!("{prefix}${body}${trailing}")
}

// ── Stage 3 ──────────────────────────────────────────────────────────────────

pub fn escape_reserved(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 8);
    for seg in tokenize(input) {
        let text = &input[seg.start..seg.end];
        if seg.kind != SegmentKind::Text {
            out.push_str(text);
            continue;
        }
        for ch in text.chars() {
            if RESERVED_CHARS.contains(&ch) {
                out.push('\\');
            }
            out.push(ch);
        }
    }
    out
}

// ── Stage 4 ──────────────────────────────────────────────────────────────────

/// Close inline math left open at the end of a line.
pub fn balance_dollars(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    for seg in tokenize(input) {
        let text = &input[seg.start..seg.end];
        if seg.kind != SegmentKind::Math(Closing::OpenInline) {
            out.push_str(text);
            continue;
        }

        let body = text[1..].trim_end();
        let trailing = &text[1 + body.len()..];
        if body.is_empty() {
            out.push_str("\\$");
            out.push_str(trailing);
            continue;
        }

        out.push('$');
        out.push_str(body);
        let dangling_backslashes = body.chars().rev().take_while(|c| *c == '\\').count();
        if dangling_backslashes % 2 == 1 {
            out.push(' ');
        }
        out.push('$');
        out.push_str(trailing);
    }
    out
}

// ── Stage 5 ──────────────────────────────────────────────────────────────────

/// Remove a leading enumeration marker from the first line only.
pub fn strip_numbering_prefix(item: &str) -> String {
    let item = item.trim_start();
    let (first, rest) = match item.split_once('\n') {
        Some((first, rest)) => (first, Some(rest)),
        None => (item, None),
    };

    let Some(stripped) = NUMBERING_RES
        .iter()
        .find_map(|re| re.find(first).map(|m| &first[m.end()..]))
    else {
        return item.to_owned();
    };

    match rest {
        Some(rest) if stripped.trim().is_empty() => rest.to_owned(),
        Some(rest) => format!("{stripped}\n{rest}"),
        None => stripped.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_delimiters_become_dollars() {
        assert_eq!(
            normalize_delimiters(r"inline \(x^2\) and \[\int_0^1 f\]"),
            r"inline $x^2$ and $$\int_0^1 f$$"
        );
        assert_eq!(normalize_delimiters(r"keep `\(code\)`"), r"keep `\(code\)`");
        assert_eq!(normalize_delimiters(r"escaped \\(x"), r"escaped \\(x");
    }

    #[test]
    fn line_with_bare_command_is_wrapped_and_repaired() {
        let out = sanitize("The vec{F} = m vec{a} relation");
        assert_eq!(out, r"$The \vec{F} = m \vec{a} relation$");
    }

    #[test]
    fn line_with_backslash_command_is_wrapped_after_list_marker() {
        let out = sanitize("- \\frac{a}{b} \\cdot c  \n");
        assert_eq!(out, "- $\\frac{a}{b} \\cdot c$  \n");
    }

    #[test]
    fn existing_math_is_kept_and_surrounding_text_escaped() {
        let out = sanitize("Let $x_1 = \\frac{a}{b}$ be 50% & more_than #3");
        assert_eq!(
            out,
            "Let $x_1 = \\frac{a}{b}$ be 50\\% \\& more\\_than \\#3"
        );
    }

    #[test]
    fn display_block_across_lines_is_untouched() {
        let input = "Energy:\n$$\nE = \\frac{1}{2} m v^2 % kinetic\n$$\nDone_now";
        let out = sanitize(input);
        assert_eq!(
            out,
            "Energy:\n$$\nE = \\frac{1}{2} m v^2 % kinetic\n$$\nDone\\_now"
        );
    }

    #[test]
    fn headings_keep_their_markers() {
        assert_eq!(sanitize("## Problem 1\n#tag"), "## Problem 1\n\\#tag");
    }

    #[test]
    fn reserved_characters_are_escaped_once() {
        let out = sanitize(r"a\b {c} ~d ^e");
        assert_eq!(out, r"a\\b \{c\} \~d \^e");
        assert_eq!(sanitize(&out), out);
    }

    #[test]
    fn existing_escapes_and_urls_pass_through() {
        let input = r"Costs \$5 \& see https://ocw.mit.edu/a_b?x=1&y=2 or `a_b`";
        assert_eq!(sanitize(input), input);
    }

    #[test]
    fn open_inline_math_is_closed_at_line_end() {
        assert_eq!(sanitize("so $x = 2\nnext"), "so $x = 2$\nnext");
        assert_eq!(sanitize("ends with $x  "), "ends with $x$  ");
    }

    #[test]
    fn dangling_dollar_becomes_literal() {
        assert_eq!(sanitize("price $"), "price \\$");
        assert_eq!(sanitize("$a$ then $"), "$a$ then \\$");
    }

    #[test]
    fn unclosed_display_opener_becomes_literal_and_rest_is_sanitized() {
        let input = "Cost is $$5 today\nA & B_c 50%\nThe vec{F} = m vec{a} relation";
        let out = sanitize(input);
        assert_eq!(
            out,
            "Cost is \\$\\$5 today\nA \\& B\\_c 50\\%\n$The \\vec{F} = m \\vec{a} relation$"
        );
        assert_eq!(sanitize(&out), out);
    }

    #[test]
    fn dangling_delimiter_is_demoted_before_wrapping() {
        assert_eq!(
            sanitize("Use \\vec{v} for velocity \\)"),
            "$Use \\vec{v} for velocity \\$$"
        );
        assert_eq!(sanitize("Use a \\\\frac here"), "Use a \\\\frac here");
    }

    #[test]
    fn fenced_code_is_never_modified() {
        let input = "Intro_1\n```python\nx = {'a': 1}  # 50% \\frac\n```\nOutro & end\n";
        let out = sanitize(input);
        assert_eq!(
            out,
            "Intro\\_1\n```python\nx = {'a': 1}  # 50% \\frac\n```\nOutro \\& end\n"
        );
        assert_eq!(extract_code_blocks(&out), extract_code_blocks(input));
        assert_eq!(extract_code_blocks(input).len(), 1);
    }

    #[test]
    fn markdown_wrapper_and_stray_fences_are_removed() {
        assert_eq!(sanitize("```markdown\n# Title\nA & B\n```"), "# Title\nA \\& B");
        assert_eq!(sanitize("Body_1\n```\nmore"), "Body\\_1\nmore");
    }

    #[test]
    fn closed_fence_after_stray_opener_stays_code() {
        let input = "````\n```\n```\n&$";
        let out = sanitize(input);
        assert_eq!(out, "```\n```\n\\&\\$");
        assert_eq!(extract_code_blocks(input), vec!["```\n```\n".to_owned()]);
        assert_eq!(extract_code_blocks(&out), extract_code_blocks(input));
    }

    #[test]
    fn sanitize_is_idempotent_without_fences() {
        let samples = [
            "The vec{F} = m vec{a} relation",
            "Let $x_1$ be 50% & {more}",
            "so $x = 2\nnext \\(y\\) and \\[z\\]",
            "price $ and a \\ b",
            "ends $x \\",
            "# Heading with \\sqrt{2}\n- item ~ ^ _ #",
            "Energy:\n$$\nE = mc^2\n$$\ntrailing $",
            "mixed $a$$b$ and $$c$$ then $d",
            "`code_span` with \\alpha outside",
            "See https://openstax.org/books/x_y & \\sum_i",
            "Use \\vec{v} for velocity \\)",
            "Write the ratio as \\frac{a}{b}; the fee is 5$",
            "Cost is $$5 today\nA & B_c 50%",
            "a \\\\vec{x} and b \\\\\\vec{y} $",
        ];
        for sample in samples {
            let once = sanitize(sample);
            assert_eq!(sanitize(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn numbering_is_stripped_from_first_line_only() {
        let input = "Problem 3: A block slides.\n(a) Find the speed.\nb) Find the time.";
        assert_eq!(
            strip_numbering_prefix(input),
            "A block slides.\n(a) Find the speed.\nb) Find the time."
        );
    }

    #[test]
    fn numbering_patterns_cover_common_markers() {
        let cases = [
            ("Problem 3: Find x.", "Find x."),
            ("question 12. Find x.", "Find x."),
            ("Exercise 4) Find x.", "Find x."),
            ("Q5: Find x.", "Find x."),
            ("(3) Find x.", "Find x."),
            ("3. Find x.", "Find x."),
            ("3) Find x.", "Find x."),
            ("a) Find x.", "Find x."),
            ("(b) Find x.", "Find x."),
            ("**Problem 1.** Find x.", "Find x."),
            ("  2. Indented", "Indented"),
            ("3.5 kg of water", "3.5 kg of water"),
            ("Problem 3 asks you to find x.", "Problem 3 asks you to find x."),
            ("Problem 7", ""),
            ("Find x.", "Find x."),
        ];
        for (input, expected) in cases {
            assert_eq!(strip_numbering_prefix(input), expected, "input: {input:?}");
        }
    }

    #[test]
    fn numbering_only_first_line_is_dropped() {
        assert_eq!(
            strip_numbering_prefix("Problem 2:\n(a) part one\n(b) part two"),
            "(a) part one\n(b) part two"
        );
    }

    #[test]
    fn sanitize_item_strips_then_sanitizes() {
        assert_eq!(sanitize_item("1. Show \\nabla f = 0"), "$Show \\nabla f = 0$");
    }

    #[test]
    fn command_table_matches_only_whole_commands() {
        assert!(RE_COMMAND.is_match(r"\int_0^1"));
        assert!(!RE_COMMAND.is_match(r"\integral"));
        assert!(!RE_COMMAND.is_match(r"a \\frac{1}{2}"));
        assert!(RE_COMMAND.is_match(r"a \\\frac{1}{2}"));
        assert!(RE_BARE_COMMAND.is_match("sqrt{2}"));
        assert!(!RE_BARE_COMMAND.is_match("convec{x}"));
        assert!(!RE_BARE_COMMAND.is_match("vector"));
    }
}
