//! The lexical layer: a stream reader over UTF-8 source text (spec.md
//! §4.E "Lexical layer").
//!
//! Grounded in `original_source/src/parse/input.c` for line/column
//! tracking, CRLF/LFCR normalization, line continuation, and the
//! caret-annotated error format; `src/parse/utility.c` for quoting and
//! word-boundary rules.

pub const PARSE_MAX_ERROR_COUNT: usize = 30;
pub const PARSE_TAB_SIZE: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Word(String),
    Str(String),
    Comma,
    Newline,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Plus,
    Equals,
    Semicolon,
    Amp,
    Pipe,
    Star,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub col: u32,
}

#[derive(Debug, Clone)]
pub struct ParseError {
    pub file: String,
    pub line: u32,
    pub col: u32,
    pub message: String,
    pub source_line: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}:{}:{}: {}", self.file, self.line, self.col, self.message)?;
        writeln!(f, "{}", self.source_line)?;
        let caret_col = self.col.saturating_sub(1) as usize;
        writeln!(f, "{}^", " ".repeat(caret_col))
    }
}

/// Normalizes CRLF/LFCR to LF and joins `\`-continued lines, then splits
/// into tokens, honoring `#` end-of-line comments, quoted strings
/// (`"..."`/`'...'` with `\"`, `\'`, `\\` escapes), and the word-boundary
/// character set `,;()[]{}&|+*=` plus whitespace and quotes.
pub struct Lexer<'a> {
    file: &'a str,
    lines: Vec<String>,
    line_idx: usize,
    col_idx: usize,
    pub errors: Vec<ParseError>,
}

fn normalize(source: &str) -> Vec<String> {
    let mut normalized = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                normalized.push('\n');
            }
            '\n' => {
                if chars.peek() == Some(&'\r') {
                    chars.next();
                }
                normalized.push('\n');
            }
            c => normalized.push(c),
        }
    }
    // Line continuation: a newline followed by blanks and a leading `\`
    // joins two logical lines without inserting a newline.
    let mut joined = String::with_capacity(normalized.len());
    let raw_lines: Vec<&str> = normalized.split('\n').collect();
    let mut i = 0;
    while i < raw_lines.len() {
        joined.push_str(raw_lines[i]);
        while joined.trim_end().ends_with('\\') {
            let trimmed_len = joined.trim_end().len();
            joined.truncate(trimmed_len - 1);
            i += 1;
            if i >= raw_lines.len() {
                break;
            }
            joined.push_str(raw_lines[i].trim_start());
        }
        joined.push('\n');
        i += 1;
    }
    joined.split('\n').map(str::to_owned).collect()
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(file: &'a str, source: &str) -> Self {
        Lexer {
            file,
            lines: normalize(source),
            line_idx: 0,
            col_idx: 0,
            errors: Vec::new(),
        }
    }

    fn push_error(&mut self, line: u32, col: u32, message: String) {
        if self.errors.len() >= PARSE_MAX_ERROR_COUNT {
            return;
        }
        let source_line = self.lines.get((line as usize).saturating_sub(1)).cloned().unwrap_or_default();
        self.errors.push(ParseError {
            file: self.file.to_string(),
            line,
            col,
            message,
            source_line,
        });
    }

    fn current_line(&self) -> &str {
        self.lines.get(self.line_idx).map(String::as_str).unwrap_or("")
    }

    fn visual_col(&self, line: &str, byte_idx: usize) -> u32 {
        let mut col = 1u32;
        for c in line[..byte_idx.min(line.len())].chars() {
            col += if c == '\t' { PARSE_TAB_SIZE as u32 - ((col - 1) % PARSE_TAB_SIZE as u32) } else { 1 };
        }
        col
    }

    fn advance_line(&mut self) {
        self.line_idx += 1;
        self.col_idx = 0;
    }

    /// Produces the next token, or `Eof` once the source is exhausted.
    pub fn next_token(&mut self) -> Token {
        loop {
            if self.line_idx >= self.lines.len() {
                return Token { kind: TokenKind::Eof, line: self.line_idx as u32 + 1, col: 1 };
            }
            let line_owned = self.current_line().to_string();
            let bytes_from = self.col_idx;
            let rest = &line_owned[bytes_from.min(line_owned.len())..];
            let mut chars = rest.char_indices();

            let Some((_, c)) = chars.clone().next() else {
                // end of line: emit Newline unless it's entirely blank
                // continuation padding already handled at normalize time
                let tok_line = self.line_idx as u32 + 1;
                let tok_col = self.visual_col(&line_owned, bytes_from);
                self.advance_line();
                return Token { kind: TokenKind::Newline, line: tok_line, col: tok_col };
            };

            if c == '#' {
                self.advance_line();
                continue;
            }
            if c.is_whitespace() {
                let len = c.len_utf8();
                self.col_idx = bytes_from + len;
                continue;
            }
            let tok_line = self.line_idx as u32 + 1;
            let tok_col = self.visual_col(&line_owned, bytes_from);

            match c {
                ',' => {
                    self.col_idx = bytes_from + 1;
                    return Token { kind: TokenKind::Comma, line: tok_line, col: tok_col };
                }
                '(' => {
                    self.col_idx = bytes_from + 1;
                    return Token { kind: TokenKind::LParen, line: tok_line, col: tok_col };
                }
                ')' => {
                    self.col_idx = bytes_from + 1;
                    return Token { kind: TokenKind::RParen, line: tok_line, col: tok_col };
                }
                '[' => {
                    self.col_idx = bytes_from + 1;
                    return Token { kind: TokenKind::LBracket, line: tok_line, col: tok_col };
                }
                ']' => {
                    self.col_idx = bytes_from + 1;
                    return Token { kind: TokenKind::RBracket, line: tok_line, col: tok_col };
                }
                '{' => {
                    self.col_idx = bytes_from + 1;
                    return Token { kind: TokenKind::LBrace, line: tok_line, col: tok_col };
                }
                '}' => {
                    self.col_idx = bytes_from + 1;
                    return Token { kind: TokenKind::RBrace, line: tok_line, col: tok_col };
                }
                '+' => {
                    self.col_idx = bytes_from + 1;
                    return Token { kind: TokenKind::Plus, line: tok_line, col: tok_col };
                }
                '=' => {
                    self.col_idx = bytes_from + 1;
                    return Token { kind: TokenKind::Equals, line: tok_line, col: tok_col };
                }
                ';' => {
                    self.col_idx = bytes_from + 1;
                    return Token { kind: TokenKind::Semicolon, line: tok_line, col: tok_col };
                }
                '&' => {
                    self.col_idx = bytes_from + 1;
                    return Token { kind: TokenKind::Amp, line: tok_line, col: tok_col };
                }
                '|' => {
                    self.col_idx = bytes_from + 1;
                    return Token { kind: TokenKind::Pipe, line: tok_line, col: tok_col };
                }
                '*' => {
                    self.col_idx = bytes_from + 1;
                    return Token { kind: TokenKind::Star, line: tok_line, col: tok_col };
                }
                '"' | '\'' => {
                    return self.read_quoted(&line_owned, bytes_from, c, tok_line, tok_col);
                }
                _ => {
                    return self.read_word(&line_owned, bytes_from, tok_line, tok_col);
                }
            }
        }
    }

    fn read_quoted(&mut self, line: &str, start: usize, quote: char, tok_line: u32, tok_col: u32) -> Token {
        let mut out = String::new();
        let bytes = &line[start + quote.len_utf8()..];
        let mut iter = bytes.char_indices();
        loop {
            match iter.next() {
                None => {
                    self.push_error(tok_line, tok_col, "unterminated string literal".to_string());
                    self.advance_line();
                    return Token { kind: TokenKind::Str(out), line: tok_line, col: tok_col };
                }
                Some((_, '\\')) => match iter.next() {
                    Some((_, esc @ ('"' | '\'' | '\\'))) => out.push(esc),
                    Some((_, other)) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => {
                        self.push_error(tok_line, tok_col, "unterminated string literal".to_string());
                        self.advance_line();
                        return Token { kind: TokenKind::Str(out), line: tok_line, col: tok_col };
                    }
                },
                Some((i, c)) if c == quote => {
                    let consumed = start + quote.len_utf8() + i + c.len_utf8();
                    self.col_idx = consumed;
                    return Token { kind: TokenKind::Str(out), line: tok_line, col: tok_col };
                }
                Some((_, c)) => out.push(c),
            }
        }
    }

    fn read_word(&mut self, line: &str, start: usize, tok_line: u32, tok_col: u32) -> Token {
        let rest = &line[start..];
        let mut end = 0;
        for (i, c) in rest.char_indices() {
            if c.is_whitespace() || matches!(c, ',' | ';' | '(' | ')' | '[' | ']' | '{' | '}' | '&' | '|' | '+' | '*' | '=' | '"' | '\'') {
                break;
            }
            end = i + c.len_utf8();
        }
        self.col_idx = start + end;
        Token { kind: TokenKind::Word(rest[..end].to_string()), line: tok_line, col: tok_col }
    }

    pub fn report(&mut self, line: u32, col: u32, message: impl Into<String>) {
        self.push_error(line, col, message.into());
    }

    #[must_use]
    pub fn error_limit_reached(&self) -> bool {
        self.errors.len() >= PARSE_MAX_ERROR_COUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tokens(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new("test", src);
        let mut out = Vec::new();
        loop {
            let t = lexer.next_token();
            let is_eof = t.kind == TokenKind::Eof;
            out.push(t.kind);
            if is_eof {
                break;
            }
        }
        out
    }

    #[test]
    fn splits_words_on_whitespace_and_comma() {
        let toks = all_tokens("focus left, quit");
        assert_eq!(
            toks,
            vec![
                TokenKind::Word("focus".into()),
                TokenKind::Word("left".into()),
                TokenKind::Comma,
                TokenKind::Word("quit".into()),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comment_runs_to_end_of_line() {
        let toks = all_tokens("quit # comment\nnop");
        assert_eq!(
            toks,
            vec![
                TokenKind::Word("quit".into()),
                TokenKind::Newline,
                TokenKind::Word("nop".into()),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn quoted_string_with_escape() {
        let toks = all_tokens("run \"echo \\\"hi\\\"\"");
        assert_eq!(
            toks,
            vec![
                TokenKind::Word("run".into()),
                TokenKind::Str("echo \"hi\"".into()),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_continuation_joins_logical_lines() {
        let toks = all_tokens("focus \\\n  left");
        assert_eq!(
            toks,
            vec![TokenKind::Word("focus".into()), TokenKind::Word("left".into()), TokenKind::Newline, TokenKind::Eof]
        );
    }
}
