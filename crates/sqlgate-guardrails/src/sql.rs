//! SQL text preparation: comment stripping, nesting depth, token scanning.
//!
//! Every guardrail rule matches against the rendered SQL **with comments
//! stripped first** — a tenant filter mentioned only inside a `--` comment
//! must never satisfy a security rule.  Comment bodies are retained
//! separately because governance markers (`allow-restricted:`, `allow-pii:`,
//! `allow-unbounded`) legitimately live in comments and only the governance
//! rules read them.

/// The prepared form of one rendered SQL statement.
#[derive(Debug)]
pub struct SqlText {
    /// The statement with comments replaced by a single space, original
    /// casing preserved for messages.
    pub stripped: String,

    /// `stripped` lowercased byte-for-byte (ASCII); all pattern matching
    /// happens here so byte offsets line up with `stripped` and `depth`.
    pub lowered: String,

    /// Paren nesting depth per byte of `lowered`.  An opening paren carries
    /// the depth outside it; its contents carry depth + 1.
    pub depth: Vec<u32>,

    /// The bodies of all stripped comments, in source order.
    pub comments: Vec<String>,
}

/// Lexer state while stripping comments.
enum State {
    Normal,
    /// Inside a single-quoted string literal ('' escapes a quote).
    InString,
    /// Inside a `--` comment, until end of line.
    LineComment,
    /// Inside a `/* */` comment (non-nesting).
    BlockComment,
}

impl SqlText {
    /// Strip comments from `sql` and precompute the depth map.
    ///
    /// String literals are respected: `--` or `/*` inside a quoted string is
    /// literal text, and quotes inside comments do not open strings.
    pub fn parse(sql: &str) -> Self {
        let bytes = sql.as_bytes();
        let mut stripped = String::with_capacity(sql.len());
        let mut comments = Vec::new();
        let mut current_comment = String::new();
        let mut state = State::Normal;
        let mut i = 0;

        while i < bytes.len() {
            let b = bytes[i] as char;
            match state {
                State::Normal => {
                    if b == '-' && bytes.get(i + 1) == Some(&b'-') {
                        state = State::LineComment;
                        stripped.push(' ');
                        i += 2;
                        continue;
                    }
                    if b == '/' && bytes.get(i + 1) == Some(&b'*') {
                        state = State::BlockComment;
                        stripped.push(' ');
                        i += 2;
                        continue;
                    }
                    if b == '\'' {
                        state = State::InString;
                    }
                    stripped.push(b);
                }
                State::InString => {
                    stripped.push(b);
                    if b == '\'' {
                        // '' is an escaped quote, not a terminator.
                        if bytes.get(i + 1) == Some(&b'\'') {
                            stripped.push('\'');
                            i += 2;
                            continue;
                        }
                        state = State::Normal;
                    }
                }
                State::LineComment => {
                    if b == '\n' {
                        comments.push(std::mem::take(&mut current_comment));
                        state = State::Normal;
                        stripped.push('\n');
                    } else {
                        current_comment.push(b);
                    }
                }
                State::BlockComment => {
                    if b == '*' && bytes.get(i + 1) == Some(&b'/') {
                        comments.push(std::mem::take(&mut current_comment));
                        state = State::Normal;
                        i += 2;
                        continue;
                    }
                    current_comment.push(b);
                }
            }
            i += 1;
        }
        // A line comment terminated by end-of-input.
        if !current_comment.is_empty() {
            comments.push(current_comment);
        }

        let lowered = stripped.to_ascii_lowercase();
        let depth = depth_map(&lowered);

        Self {
            stripped,
            lowered,
            depth,
            comments,
        }
    }

    /// Paren nesting depth at byte offset `pos` of `lowered`.
    pub fn depth_at(&self, pos: usize) -> u32 {
        self.depth.get(pos).copied().unwrap_or(0)
    }

    /// True if any stripped comment contains `marker` (case-insensitive).
    pub fn has_marker(&self, marker: &str) -> bool {
        let marker = marker.to_ascii_lowercase();
        self.comments
            .iter()
            .any(|c| c.to_ascii_lowercase().contains(&marker))
    }
}

/// Compute the paren nesting depth for each byte of `s`.
///
/// String literals do not affect depth (callers pass comment-stripped text,
/// but quoted parens must still not count).
pub fn depth_map(s: &str) -> Vec<u32> {
    let mut depths = Vec::with_capacity(s.len());
    let mut depth: u32 = 0;
    let mut in_string = false;

    for b in s.bytes() {
        match b {
            b'\'' => {
                in_string = !in_string;
                depths.push(depth);
            }
            b'(' if !in_string => {
                depths.push(depth);
                depth += 1;
            }
            b')' if !in_string => {
                depth = depth.saturating_sub(1);
                depths.push(depth);
            }
            _ => depths.push(depth),
        }
    }
    depths
}

/// Byte offsets of every whole-word occurrence of `word` in `haystack`.
///
/// A word boundary is any character outside `[a-z0-9_]`.  `word` must
/// already be lowercase; `haystack` is expected to be the lowered text.
pub fn find_word(haystack: &str, word: &str) -> Vec<usize> {
    let mut hits = Vec::new();
    if word.is_empty() {
        return hits;
    }
    let hay = haystack.as_bytes();
    let mut start = 0;
    while let Some(rel) = haystack[start..].find(word) {
        let pos = start + rel;
        let end = pos + word.len();
        let left_ok = pos == 0 || !is_word_byte(hay[pos - 1]);
        let right_ok = end >= hay.len() || !is_word_byte(hay[end]);
        if left_ok && right_ok {
            hits.push(pos);
        }
        start = pos + 1;
    }
    hits
}

/// Table identifiers referenced after `FROM` or `JOIN` keywords, with the
/// byte offset of the referencing keyword.
///
/// Dotted names (`schema.table`) are returned whole; a parenthesized
/// sub-select after `FROM` yields no entry.
pub fn referenced_tables(lowered: &str) -> Vec<(usize, String)> {
    let mut tables = Vec::new();
    for kw in ["from", "join"] {
        for pos in find_word(lowered, kw) {
            let rest = &lowered[pos + kw.len()..];
            let trimmed = rest.trim_start();
            let skipped = rest.len() - trimmed.len();
            let name: String = trimmed
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '.')
                .collect();
            if !name.is_empty() {
                let name_pos = pos + kw.len() + skipped;
                tables.push((name_pos, name));
            }
        }
    }
    tables.sort_by_key(|(pos, _)| *pos);
    tables
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

// ── Tests ─────────────────────────────────────────────────────────────────────
