//! The predictive parser over the flat action catalog (spec.md §4.E).
//!
//! Grounded in `original_source/src/parse/top.c` (the `top` grammar
//! dispatch), `src/parse/action.c` (action-template matching) and
//! `src/parse/binding.c`/`src/parse/relation.c`/`src/parse/group.c`/
//! `src/parse/alias.c` for the nested-construct productions. The C
//! implementation avoids backtracking by keeping a live bitmap over
//! prefix-disjoint string templates (DESIGN NOTES, spec.md §9); the
//! idiomatic Rust rendition of "predictive, no backtracking" is a
//! `match` over the already-read leading words -- `match` arms are
//! exhaustively checked by the compiler and dispatch in the same one-word-
//! at-a-time, no-backtrack fashion the original's bitmap achieves at
//! runtime, without needing to hand-roll the bitmap itself.

use crate::action::{
    Action, ActionList, BindingFlags, ButtonBindingDef, ButtonTarget, Int, KeyBindingDef, KeyTarget, RelationDef,
};
use crate::config::lexer::{Lexer, ParseError, Token, TokenKind};
use crate::config::registry::{AliasTable, GroupTable};

pub const PARSE_INTEGER_LIMIT: i64 = 1_000_000;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Token>,
    aliases: &'a mut AliasTable,
    groups: &'a mut GroupTable,
    source_stack: Vec<std::path::PathBuf>,
    base_dir: std::path::PathBuf,
}

pub struct ParseOutcome {
    pub actions: ActionList,
    pub errors: Vec<ParseError>,
}

/// Parses a top-level configuration source. `file` is used in error
/// messages; `base_dir` anchors relative `source` statements.
pub fn parse_config(
    file: &str,
    source: &str,
    base_dir: std::path::PathBuf,
    aliases: &mut AliasTable,
    groups: &mut GroupTable,
) -> ParseOutcome {
    let lexer = Lexer::new(file, source);
    let mut parser = Parser {
        lexer,
        peeked: None,
        aliases,
        groups,
        source_stack: vec![base_dir.join(file)],
        base_dir,
    };
    let actions = parser.parse_statements_until(&[TokenKind::Eof]);
    ParseOutcome { actions, errors: parser.lexer.errors.clone() }
}

impl<'a> Parser<'a> {
    fn peek(&mut self) -> &Token {
        if self.peeked.is_none() {
            self.peeked = Some(self.lexer.next_token());
        }
        self.peeked.as_ref().unwrap()
    }

    fn bump(&mut self) -> Token {
        self.peek();
        self.peeked.take().unwrap()
    }

    fn error(&mut self, message: impl Into<String>) {
        let tok = self.peek().clone();
        self.lexer.report(tok.line, tok.col, message);
    }

    fn at_limit(&self) -> bool {
        self.lexer.error_limit_reached()
    }

    /// Reads one unquoted word, resolving it through the alias table
    /// (a single, non-recursive replacement) per spec.md §4.E "Alias
    /// resolution".
    fn read_word(&mut self) -> Option<String> {
        let tok = self.bump();
        match tok.kind {
            TokenKind::Word(w) => {
                if let Some(expanded) = self.aliases.lookup(&w) {
                    Some(expanded.to_string())
                } else {
                    Some(w)
                }
            }
            other => {
                let (line, col) = (tok.line, tok.col);
                self.peeked = Some(Token { kind: other, line, col });
                None
            }
        }
    }

    fn read_word_or_string(&mut self) -> Option<String> {
        let tok = self.bump();
        match tok.kind {
            TokenKind::Word(w) => {
                if let Some(expanded) = self.aliases.lookup(&w) {
                    Some(expanded.to_string())
                } else {
                    Some(w)
                }
            }
            TokenKind::Str(s) => Some(s),
            other => {
                let (line, col) = (tok.line, tok.col);
                self.peeked = Some(Token { kind: other, line, col });
                None
            }
        }
    }

    /// Peeks at the next word (without alias resolution, for keyword
    /// dispatch) without consuming it.
    fn peek_word(&mut self) -> Option<&str> {
        match &self.peek().kind {
            TokenKind::Word(w) => Some(w.as_str()),
            _ => None,
        }
    }

    /// As `peek_word`, but resolved through the alias table (non-
    /// destructively), for dispatch decisions that must see what a word
    /// expands to (e.g. `alias mod = Super` before `mod+q ...`).
    fn peek_word_resolved(&mut self) -> Option<String> {
        let raw = self.peek_word()?.to_string();
        Some(self.aliases.lookup(&raw).map(str::to_string).unwrap_or(raw))
    }

    fn expect_word(&mut self, expected: &str) -> bool {
        if self.peek_word() == Some(expected) {
            self.bump();
            true
        } else {
            self.error(format!("expected '{expected}'"));
            false
        }
    }

    fn is_separator_or_end(&mut self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Comma | TokenKind::Newline | TokenKind::Eof | TokenKind::RParen
        )
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek().kind, TokenKind::Comma | TokenKind::Newline) {
            self.bump();
        }
    }

    // ---- integer / modifier expressions ------------------------------

    /// `DIGITS%? | '#'HEXDIGITS | boolean | modifier`, joined by `+`; the
    /// percent flag is sticky through `+` (spec.md §4.E "Integer
    /// expressions"). Clamps at `PARSE_INTEGER_LIMIT`, reporting an error
    /// but continuing to parse.
    fn read_int(&mut self) -> Option<Int> {
        let mut total: i64 = 0;
        let mut percent = false;
        loop {
            let Some(word) = self.read_word() else {
                self.error("expected an integer");
                return None;
            };
            let (value, is_percent) = parse_int_atom(&word)?;
            percent |= is_percent;
            total += value;
            if total.abs() > PARSE_INTEGER_LIMIT {
                self.error(format!("integer {total} overflows the parser's limit of {PARSE_INTEGER_LIMIT}"));
                total = total.clamp(-PARSE_INTEGER_LIMIT, PARSE_INTEGER_LIMIT);
            }
            if matches!(self.peek().kind, TokenKind::Plus) {
                self.bump();
                continue;
            }
            break;
        }
        Some(Int { value: total, percent })
    }

    /// As `read_int` but combines words with bitwise OR (modifier masks
    /// rather than arithmetic quantities).
    fn read_modifiers(&mut self) -> u32 {
        let mut mask = 0u32;
        loop {
            let Some(word) = self.read_word() else { break };
            mask |= modifier_bit(&word).unwrap_or(0);
            if matches!(self.peek().kind, TokenKind::Plus) {
                self.bump();
                continue;
            } else {
                // not a `+`; this word belonged to modifiers only if it
                // resolved to a known modifier name -- otherwise push it
                // back as the button/key token.
                if modifier_bit(&word).is_none() {
                    self.peeked = Some(Token { kind: TokenKind::Word(word), line: 0, col: 0 });
                }
                break;
            }
        }
        mask
    }

    // ---- top-level dispatch ------------------------------------------

    /// Parses statements (the full `top` grammar) until any token in
    /// `end` is reached (not consumed). Used for both the whole file and
    /// a parenthesized `top-block`.
    pub fn parse_statements_until(&mut self, end: &[TokenKind]) -> ActionList {
        let mut out = ActionList::new();
        loop {
            self.skip_separators();
            if self.at_limit() || end.iter().any(|e| std::mem::discriminant(e) == std::mem::discriminant(&self.peek().kind)) {
                break;
            }
            let before = match &self.peek().kind {
                TokenKind::Eof => break,
                _ => self.peek().clone(),
            };
            let produced = self.parse_one_top();
            out.0.extend(produced.0);
            // Guard against an infinite loop if a statement consumed
            // nothing (a malformed token we couldn't classify).
            if std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(&before.kind)
                && matches!(before.kind, TokenKind::Word(_))
            {
                self.bump();
            }
        }
        out
    }

    /// The `top-block` production: `'(' top (',' | NL)* ')'` or a bare
    /// `action-seq`.
    fn parse_top_block(&mut self) -> ActionList {
        if matches!(self.peek().kind, TokenKind::LParen) {
            self.bump();
            let list = self.parse_statements_until(&[TokenKind::RParen]);
            if matches!(self.peek().kind, TokenKind::RParen) {
                self.bump();
            } else {
                self.error("expected ')'");
            }
            list
        } else {
            self.parse_action_seq()
        }
    }

    /// `action (',' action)*`, stopping at newline/EOF/`)` without
    /// consuming it.
    fn parse_action_seq(&mut self) -> ActionList {
        let mut out = ActionList::new();
        loop {
            if self.at_limit() {
                break;
            }
            match self.parse_action() {
                Some(a) => out.push(a),
                None => break,
            }
            if matches!(self.peek().kind, TokenKind::Comma) {
                self.bump();
                self.skip_separators();
                continue;
            }
            break;
        }
        out
    }

    fn parse_one_top(&mut self) -> ActionList {
        let Some(word) = self.peek_word().map(str::to_string) else {
            self.error("expected a statement");
            self.bump();
            return ActionList::new();
        };
        match word.as_str() {
            "alias" => {
                self.bump();
                self.parse_alias_stmt();
                ActionList::new()
            }
            "group" => {
                self.bump();
                self.parse_group_stmt();
                ActionList::new()
            }
            "source" => {
                self.bump();
                self.parse_source_stmt()
            }
            _ => {
                if self.looks_like_binding_head() {
                    let mut list = ActionList::new();
                    if let Some(a) = self.parse_binding_stmt() {
                        list.push(a);
                    }
                    list
                } else {
                    self.parse_action_seq()
                }
            }
        }
    }

    fn parse_alias_stmt(&mut self) {
        let Some(name) = self.read_word() else {
            self.error("expected alias name");
            return;
        };
        if !matches!(self.peek().kind, TokenKind::Equals) {
            self.error("expected '=' in alias");
            return;
        }
        self.bump();
        let Some(value) = self.read_word_or_string() else {
            self.error("expected alias value");
            return;
        };
        if self.aliases.insert(name, value).is_err() {
            self.error("alias table is full");
        }
    }

    fn parse_group_stmt(&mut self) {
        let Some(name) = self.read_word() else {
            self.error("expected group name");
            return;
        };
        let body = self.parse_top_block();
        if self.groups.insert(name, body).is_err() {
            self.error("group table is full");
        }
    }

    fn parse_source_stmt(&mut self) -> ActionList {
        let Some(path_str) = self.read_word_or_string() else {
            self.error("expected a file path after 'source'");
            return ActionList::new();
        };
        let path = self.base_dir.join(&path_str);
        let canon = path.canonicalize().unwrap_or_else(|_| path.clone());
        if self.source_stack.contains(&canon) {
            self.error(format!("recursive 'source' of {path_str:?}"));
            return ActionList::new();
        }
        let Ok(contents) = std::fs::read_to_string(&path) else {
            self.error(format!("could not read sourced file {path_str:?}"));
            return ActionList::new();
        };
        self.source_stack.push(canon);
        let child_base = path.parent().map(std::path::Path::to_path_buf).unwrap_or_else(|| self.base_dir.clone());
        let mut child = Parser {
            lexer: Lexer::new(&path_str, &contents),
            peeked: None,
            aliases: &mut *self.aliases,
            groups: &mut *self.groups,
            source_stack: self.source_stack.clone(),
            base_dir: child_base,
        };
        let list = child.parse_statements_until(&[TokenKind::Eof]);
        self.lexer.errors.extend(child.lexer.errors);
        self.source_stack.pop();
        list
    }

    /// Distinguishes a `binding` statement's head (`[release] [transparent]
    /// modifier+... (button|keysym|'['keycode']')`) from a plain
    /// `action-seq`, by looking only at the next token -- a binding head
    /// always starts with `release`/`transparent`, a modifier name, a
    /// `[`, or a button name, none of which are valid leading words for
    /// any catalog action (spec.md §4.E grammar).
    fn looks_like_binding_head(&mut self) -> bool {
        if matches!(self.peek_word(), Some("release") | Some("transparent")) {
            return true;
        }
        if matches!(self.peek().kind, TokenKind::LBracket) {
            return true;
        }
        if let Some(w) = self.peek_word_resolved() {
            if modifier_bit(&w).is_some() || parse_button_name(&w).is_some() {
                return true;
            }
        }
        false
    }

    // ---- binding / relation ------------------------------------------

    fn parse_binding_stmt(&mut self) -> Option<Action> {
        let mut flags = BindingFlags::default();
        if self.peek_word() == Some("release") {
            self.bump();
            flags.is_release = true;
        }
        if self.peek_word() == Some("transparent") {
            self.bump();
            flags.is_transparent = true;
        }
        let modifiers = self.read_modifiers();
        if matches!(self.peek().kind, TokenKind::LBracket) {
            self.bump();
            let Some(int) = self.read_int() else {
                self.error("expected a keycode integer");
                return None;
            };
            if !matches!(self.peek().kind, TokenKind::RBracket) {
                self.error("expected ']'");
            } else {
                self.bump();
            }
            let actions = self.parse_top_block();
            return Some(Action::KeyBinding(KeyBindingDef {
                modifiers,
                key: KeyTarget::Keycode(int.value as u8),
                flags,
                actions,
            }));
        }
        let Some(word) = self.read_word() else {
            self.error("expected a button or key name");
            return None;
        };
        if let Some(button) = parse_button_name(&word) {
            let actions = self.parse_top_block();
            return Some(Action::ButtonBinding(ButtonBindingDef {
                modifiers,
                button: ButtonTarget::Index(button),
                flags,
                actions,
            }));
        }
        let keysym = keysym_from_name(&word).unwrap_or(0);
        let actions = self.parse_top_block();
        Some(Action::KeyBinding(KeyBindingDef { modifiers, key: KeyTarget::Keysym(keysym), flags, actions }))
    }

    fn parse_relation_data(&mut self, pattern_text: &str) -> RelationDef {
        let (instance_pattern, class_pattern) = split_relation_pattern(pattern_text);
        let actions = self.parse_top_block();
        RelationDef { instance_pattern, class_pattern, actions }
    }

    // ---- individual actions ------------------------------------------

    fn parse_action(&mut self) -> Option<Action> {
        let word = self.read_word()?;
        let action = match word.as_str() {
            "nop" => Action::Nop,
            "assign" => {
                if self.peek_word() == Some("window") {
                    self.bump();
                    Action::AssignWindow(self.read_int()?)
                } else {
                    Action::Assign(self.read_int()?)
                }
            }
            "auto" => self.parse_auto_action()?,
            "background" => Action::Background(self.read_int()?),
            "border" => self.parse_border_action()?,
            "call" => Action::Call(self.read_word_or_string()?),
            "center" => {
                self.expect_word("window");
                if self.peek_word() == Some("to") {
                    self.bump();
                    Action::CenterWindowTo(self.read_word_or_string()?)
                } else {
                    Action::CenterWindow
                }
            }
            "close" => {
                self.expect_word("window");
                match self.try_read_int() {
                    Some(i) => Action::CloseWindowI(i),
                    None => Action::CloseWindow,
                }
            }
            "cursor" => self.parse_cursor_action()?,
            "dump" => {
                self.expect_word("layout");
                Action::DumpLayout(self.read_word_or_string()?)
            }
            "empty" => Action::Empty,
            "equalize" => Action::Equalize,
            "exchange" => self.parse_exchange_action()?,
            "focus" => self.parse_focus_action()?,
            "font" => Action::Font(self.read_word_or_string()?),
            "foreground" => Action::Foreground(self.read_int()?),
            "gaps" => self.parse_gaps_action()?,
            "hint" => {
                self.expect_word("split");
                match self.read_word()?.as_str() {
                    "horizontally" => Action::HintSplitHorizontally,
                    "vertically" => Action::HintSplitVertically,
                    _ => {
                        self.error("expected 'horizontally' or 'vertically'");
                        return None;
                    }
                }
            }
            "indicate" => Action::Indicate,
            "initiate" => match self.read_word()?.as_str() {
                "move" => Action::InitiateMove,
                "resize" => Action::InitiateResize,
                _ => {
                    self.error("expected 'move' or 'resize'");
                    return None;
                }
            },
            "minimize" => {
                self.expect_word("window");
                match self.try_read_int() {
                    Some(i) => Action::MinimizeWindowI(i),
                    None => Action::MinimizeWindow,
                }
            }
            "modifiers" => {
                self.expect_word("ignore");
                Action::ModifiersIgnore(self.read_int()?)
            }
            "move" => self.parse_move_action()?,
            "notification" => {
                self.expect_word("duration");
                Action::NotificationDuration(self.read_int()?)
            }
            "overlap" => Action::Overlap(self.read_int()?),
            "pop" => {
                self.expect_word("stash");
                Action::PopStash
            }
            "quit" => Action::Quit,
            "reload" => {
                self.expect_word("configuration");
                Action::ReloadConfiguration
            }
            "relate" => {
                let pattern = self.read_word_or_string()?;
                Action::Relation(self.parse_relation_data(&pattern))
            }
            "unrelate" => Action::Unrelate,
            "remove" => match self.try_read_int() {
                Some(i) => Action::RemoveI(i),
                None => Action::Remove,
            },
            "resize" => {
                self.expect_word("window");
                let kind = self.read_word()?;
                let a = self.read_int()?;
                let b = self.read_int()?;
                match kind.as_str() {
                    "by" => Action::ResizeWindowBy(a, b),
                    "to" => Action::ResizeWindowTo(a, b),
                    _ => {
                        self.error("expected 'by' or 'to'");
                        return None;
                    }
                }
            }
            "run" => Action::Run(self.read_word_or_string()?),
            "select" => match self.read_word()?.as_str() {
                "focus" => Action::SelectFocus,
                "pressed" => Action::SelectPressed,
                "window" => Action::SelectWindow(self.read_int()?),
                _ => {
                    self.error("expected 'focus', 'pressed' or 'window'");
                    return None;
                }
            },
            "set" => match self.read_word()?.as_str() {
                "defaults" => Action::SetDefaults,
                "floating" => Action::SetFloating,
                "fullscreen" => Action::SetFullscreen,
                "tiling" => Action::SetTiling,
                _ => {
                    self.error("expected 'defaults', 'floating', 'fullscreen' or 'tiling'");
                    return None;
                }
            },
            "show" => self.parse_show_action()?,
            "split" => self.parse_split_action()?,
            "text" => {
                self.expect_word("padding");
                Action::TextPadding(self.read_int()?)
            }
            "toggle" => match self.read_word()?.as_str() {
                "focus" => Action::ToggleFocus,
                "fullscreen" => Action::ToggleFullscreen,
                "tiling" => Action::ToggleTiling,
                _ => {
                    self.error("expected 'focus', 'fullscreen' or 'tiling'");
                    return None;
                }
            },
            "ungroup" => Action::Ungroup(self.read_word_or_string()?),
            "unbind" => self.parse_unbind_action()?,
            "bind" => self.parse_bind_action_word()?,
            other => {
                self.error(format!("unknown action word {other:?}"));
                return None;
            }
        };
        Some(action)
    }

    /// Peeks whether the next word can even start an integer expression,
    /// without consuming it -- `read_int` has no way to push a word back
    /// once it discovers the word wasn't numeric, so callers that treat
    /// a trailing integer as optional (`focus [N]`, `remove [N]`, ...)
    /// must check before committing to `read_int`, not after.
    fn peek_int_atom(&mut self) -> bool {
        match self.peek_word_resolved() {
            Some(w) => parse_int_atom(&w).is_some(),
            None => false,
        }
    }

    fn try_read_int(&mut self) -> Option<Int> {
        if self.is_separator_or_end() || !self.peek_int_atom() {
            return None;
        }
        self.read_int()
    }

    fn parse_auto_action(&mut self) -> Option<Action> {
        Some(match self.read_word()?.as_str() {
            "equalize" => Action::AutoEqualize(self.read_bool()?),
            "fill" => {
                self.expect_word("void");
                Action::AutoFillVoid(self.read_bool()?)
            }
            "find" => {
                self.expect_word("void");
                Action::AutoFindVoid(self.read_bool()?)
            }
            "remove" => {
                if self.peek_word() == Some("void") {
                    self.bump();
                    Action::AutoRemoveVoid(self.read_bool()?)
                } else {
                    Action::AutoRemove(self.read_bool()?)
                }
            }
            "split" => Action::AutoSplit(self.read_bool()?),
            _ => {
                self.error("expected an 'auto ...' sub-action");
                return None;
            }
        })
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_int()?.value != 0)
    }

    fn parse_border_action(&mut self) -> Option<Action> {
        Some(match self.read_word()?.as_str() {
            "color" => match self.peek_word() {
                Some("active") => {
                    self.bump();
                    Action::BorderColorActive(self.read_int()?)
                }
                Some("current") => {
                    self.bump();
                    Action::BorderColorCurrent(self.read_int()?)
                }
                Some("focus") => {
                    self.bump();
                    Action::BorderColorFocus(self.read_int()?)
                }
                _ => Action::BorderColor(self.read_int()?),
            },
            "size" => {
                if self.peek_word() == Some("current") {
                    self.bump();
                    Action::BorderSizeCurrent(self.read_int()?)
                } else {
                    Action::BorderSize(self.read_int()?)
                }
            }
            _ => {
                self.error("expected 'color' or 'size'");
                return None;
            }
        })
    }

    fn parse_cursor_action(&mut self) -> Option<Action> {
        Some(match self.read_word()?.as_str() {
            "horizontal" => Action::CursorHorizontal(self.read_word_or_string()?),
            "moving" => Action::CursorMoving(self.read_word_or_string()?),
            "root" => Action::CursorRoot(self.read_word_or_string()?),
            "sizing" => Action::CursorSizing(self.read_word_or_string()?),
            "vertical" => Action::CursorVertical(self.read_word_or_string()?),
            _ => {
                self.error("expected a cursor sub-action");
                return None;
            }
        })
    }

    fn parse_exchange_action(&mut self) -> Option<Action> {
        Some(match self.read_word()?.as_str() {
            "down" => Action::ExchangeDown,
            "left" => Action::ExchangeLeft,
            "right" => Action::ExchangeRight,
            "up" => Action::ExchangeUp,
            _ => {
                self.error("expected 'down', 'left', 'right' or 'up'");
                return None;
            }
        })
    }

    fn parse_focus_action(&mut self) -> Option<Action> {
        if self.is_separator_or_end() {
            return Some(Action::Focus);
        }
        if let Some(i) = self.try_read_int() {
            return Some(Action::FocusI(i));
        }
        Some(match self.read_word()?.as_str() {
            "child" => match self.try_read_int() {
                Some(i) => Action::FocusChildI(i),
                None => Action::FocusChild,
            },
            "down" => Action::FocusDown,
            "leaf" => Action::FocusLeaf,
            "left" => Action::FocusLeft,
            "monitor" => Action::FocusMonitor(self.read_word_or_string()?),
            "parent" => match self.try_read_int() {
                Some(i) => Action::FocusParentI(i),
                None => Action::FocusParent,
            },
            "right" => Action::FocusRight,
            "root" => {
                if self.is_separator_or_end() {
                    Action::FocusRoot
                } else {
                    Action::FocusRootS(self.read_word_or_string()?)
                }
            }
            "up" => Action::FocusUp,
            "window" => match self.try_read_int() {
                Some(i) => Action::FocusWindowI(i),
                None => Action::FocusWindow,
            },
            _ => {
                self.error("expected a 'focus ...' sub-action");
                return None;
            }
        })
    }

    fn parse_gaps_action(&mut self) -> Option<Action> {
        let side = self.read_word()?;
        let mut ints = Vec::new();
        while ints.len() < 4 {
            if self.is_separator_or_end() {
                break;
            }
            ints.push(self.read_int()?);
        }
        let make = |n: usize, ints: &[Int]| -> Option<Action> {
            match (side.as_str(), n) {
                ("inner", 1) => Some(Action::GapsInner(ints[0])),
                ("inner", 2) => Some(Action::GapsInnerII(ints[0], ints[1])),
                ("inner", 4) => Some(Action::GapsInnerIIII(ints[0], ints[1], ints[2], ints[3])),
                ("outer", 1) => Some(Action::GapsOuter(ints[0])),
                ("outer", 2) => Some(Action::GapsOuterII(ints[0], ints[1])),
                ("outer", 4) => Some(Action::GapsOuterIIII(ints[0], ints[1], ints[2], ints[3])),
                _ => None,
            }
        };
        match make(ints.len(), &ints) {
            Some(a) => Some(a),
            None => {
                self.error("expected 1, 2 or 4 gap integers");
                None
            }
        }
    }

    fn parse_move_action(&mut self) -> Option<Action> {
        Some(match self.read_word()?.as_str() {
            "down" => Action::MoveDown,
            "left" => Action::MoveLeft,
            "right" => Action::MoveRight,
            "up" => Action::MoveUp,
            "window" => {
                let kind = self.read_word()?;
                let a = self.read_int()?;
                let b = self.read_int()?;
                match kind.as_str() {
                    "by" => Action::MoveWindowBy(a, b),
                    "to" => Action::MoveWindowTo(a, b),
                    _ => {
                        self.error("expected 'by' or 'to'");
                        return None;
                    }
                }
            }
            _ => {
                self.error("expected 'down', 'left', 'right', 'up' or 'window'");
                return None;
            }
        })
    }

    fn parse_show_action(&mut self) -> Option<Action> {
        Some(match self.read_word()?.as_str() {
            "list" => Action::ShowList,
            "message" => Action::ShowMessage(self.read_word_or_string()?),
            "next" => {
                self.expect_word("window");
                match self.try_read_int() {
                    Some(i) => Action::ShowNextWindowI(i),
                    None => Action::ShowNextWindow,
                }
            }
            "previous" => {
                self.expect_word("window");
                match self.try_read_int() {
                    Some(i) => Action::ShowPreviousWindowI(i),
                    None => Action::ShowPreviousWindow,
                }
            }
            "run" => Action::ShowRun(self.read_word_or_string()?),
            "window" => match self.try_read_int() {
                Some(i) => Action::ShowWindowI(i),
                None => Action::ShowWindow,
            },
            _ => {
                self.error("expected a 'show ...' sub-action");
                return None;
            }
        })
    }

    fn parse_split_action(&mut self) -> Option<Action> {
        Some(match self.read_word()?.as_str() {
            "horizontally" => Action::SplitHorizontally,
            "left" => match self.read_word()?.as_str() {
                "horizontally" => Action::SplitLeftHorizontally,
                "vertically" => Action::SplitLeftVertically,
                _ => {
                    self.error("expected 'horizontally' or 'vertically'");
                    return None;
                }
            },
            "vertically" => Action::SplitVertically,
            _ => {
                self.error("expected 'horizontally', 'left' or 'vertically'");
                return None;
            }
        })
    }

    fn parse_unbind_action(&mut self) -> Option<Action> {
        let modifiers = self.read_modifiers();
        if matches!(self.peek().kind, TokenKind::LBracket) {
            self.bump();
            let int = self.read_int()?;
            if matches!(self.peek().kind, TokenKind::RBracket) {
                self.bump();
            }
            return Some(Action::UnbindKey { modifiers, key: KeyTarget::Keycode(int.value as u8) });
        }
        let word = self.read_word()?;
        if let Some(button) = parse_button_name(&word) {
            return Some(Action::UnbindButton { modifiers, button: ButtonTarget::Index(button) });
        }
        Some(Action::UnbindKey { modifiers, key: KeyTarget::Keysym(keysym_from_name(&word).unwrap_or(0)) })
    }

    fn parse_bind_action_word(&mut self) -> Option<Action> {
        let mut flags = BindingFlags::default();
        if self.peek_word() == Some("release") {
            self.bump();
            flags.is_release = true;
        }
        if self.peek_word() == Some("transparent") {
            self.bump();
            flags.is_transparent = true;
        }
        let modifiers = self.read_modifiers();
        if matches!(self.peek().kind, TokenKind::LBracket) {
            self.bump();
            let int = self.read_int()?;
            if matches!(self.peek().kind, TokenKind::RBracket) {
                self.bump();
            }
            let actions = self.parse_top_block();
            return Some(Action::KeyBinding(KeyBindingDef {
                modifiers,
                key: KeyTarget::Keycode(int.value as u8),
                flags,
                actions,
            }));
        }
        let word = self.read_word()?;
        if let Some(button) = parse_button_name(&word) {
            let actions = self.parse_top_block();
            return Some(Action::ButtonBinding(ButtonBindingDef {
                modifiers,
                button: ButtonTarget::Index(button),
                flags,
                actions,
            }));
        }
        let keysym = keysym_from_name(&word).unwrap_or(0);
        let actions = self.parse_top_block();
        Some(Action::KeyBinding(KeyBindingDef { modifiers, key: KeyTarget::Keysym(keysym), flags, actions }))
    }
}

fn parse_int_atom(word: &str) -> Option<(i64, bool)> {
    let (digits, percent) = if let Some(stripped) = word.strip_suffix('%') { (stripped, true) } else { (word, false) };
    if let Some(hex) = digits.strip_prefix('#') {
        return i64::from_str_radix(hex, 16).ok().map(|v| (v, percent));
    }
    match digits.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => return Some((1, percent)),
        "off" | "false" | "no" => return Some((0, percent)),
        _ => {}
    }
    if let Some(bit) = modifier_bit(digits) {
        return Some((i64::from(bit), percent));
    }
    digits.parse::<i64>().ok().map(|v| (v, percent))
}

/// Modifier constants (`None/Shift/Lock/Control/Mod1..Mod5`), matching
/// the X11 `ModMask` bit layout.
fn modifier_bit(word: &str) -> Option<u32> {
    Some(match word {
        "None" => 0,
        "Shift" => 1 << 0,
        "Lock" => 1 << 1,
        "Control" => 1 << 2,
        "Mod1" => 1 << 3,
        "Mod2" => 1 << 4,
        "Mod3" => 1 << 5,
        "Mod4" | "Super" => 1 << 6,
        "Mod5" => 1 << 7,
        _ => return None,
    })
}

fn parse_button_name(word: &str) -> Option<u8> {
    if let Some(n) = word.strip_prefix("Button") {
        return n.parse::<u8>().ok();
    }
    Some(match word {
        "Left" => 1,
        "Middle" => 2,
        "Right" => 3,
        "WheelUp" => 4,
        "WheelDown" => 5,
        "WheelLeft" => 6,
        "WheelRight" => 7,
        "X1" => 8,
        "X2" => 9,
        "X3" => 10,
        "X4" => 11,
        "X5" => 12,
        "X6" => 13,
        "X7" => 14,
        "X8" => 15,
        _ => return None,
    })
}

/// A best-effort keysym name table covering the common ASCII-valued
/// keysyms (X11 assigns `XK_a`..`XK_z`/`XK_0`..`XK_9` their ASCII
/// codepoints) plus a handful of named keys actually used by the default
/// bindings (spec.md §6 "Defaults").
#[must_use]
pub fn keysym_from_name(name: &str) -> Option<u32> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            return Some(u32::from(c as u8));
        }
    }
    Some(match name {
        "Return" => 0xff0d,
        "space" | "Space" => 0x0020,
        "Escape" => 0xff1b,
        "Tab" => 0xff09,
        "BackSpace" => 0xff08,
        "Up" => 0xff52,
        "Down" => 0xff54,
        "Left" => 0xff51,
        "Right" => 0xff53,
        "comma" => 0x002c,
        "period" => 0x002e,
        "Print" => 0xff61,
        _ if name.starts_with('F') && name[1..].parse::<u32>().is_ok() => {
            0xffbe + name[1..].parse::<u32>().unwrap() - 1
        }
        _ => return None,
    })
}

/// Splits a `relate` pattern string on an unescaped comma into
/// `(instance, class)`, `\,` decoding to a literal comma and a missing
/// instance becoming `*` (spec.md §4.E "Data-value `R`").
#[must_use]
pub fn split_relation_pattern(text: &str) -> (String, String) {
    let mut instance = String::new();
    let mut chars = text.chars().peekable();
    let mut found_comma = false;
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&',') {
            instance.push(',');
            chars.next();
        } else if c == ',' {
            found_comma = true;
            break;
        } else {
            instance.push(c);
        }
    }
    if !found_comma {
        return ("*".to_string(), instance);
    }
    let class: String = chars.collect();
    let instance = if instance.is_empty() { "*".to_string() } else { instance };
    (instance, class)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> (ActionList, Vec<ParseError>) {
        let mut aliases = AliasTable::new();
        let mut groups = GroupTable::new();
        let outcome = parse_config("test", src, std::path::PathBuf::from("."), &mut aliases, &mut groups);
        (outcome.actions, outcome.errors)
    }

    #[test]
    fn scenario_1_split_split_equalize() {
        let (actions, errors) = parse("split horizontally, split vertically, equalize");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(
            actions.0,
            vec![Action::SplitHorizontally, Action::SplitVertically, Action::Equalize]
        );
    }

    #[test]
    fn scenario_4_alias_and_key_binding() {
        let (actions, errors) = parse("alias mod = Super\nmod+Shift+q quit");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(actions.0.len(), 1);
        match &actions.0[0] {
            Action::KeyBinding(def) => {
                assert_eq!(def.modifiers, modifier_bit("Mod4").unwrap() | modifier_bit("Shift").unwrap());
                assert_eq!(def.key, KeyTarget::Keysym(keysym_from_name("q").unwrap()));
                assert_eq!(def.actions.0, vec![Action::Quit]);
            }
            other => panic!("expected a key binding, got {other:?}"),
        }
    }

    #[test]
    fn focus_direction_word_is_not_swallowed_by_trailing_int_probe() {
        let (actions, errors) = parse("focus left, focus right, remove, focus 3");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(
            actions.0,
            vec![Action::FocusLeft, Action::FocusRight, Action::Remove, Action::FocusI(Int::plain(3))]
        );
    }

    #[test]
    fn scenario_2_focus_right_parses_as_directional_focus() {
        let (actions, errors) = parse("focus right");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(actions.0, vec![Action::FocusRight]);
    }

    #[test]
    fn relate_splits_instance_and_class() {
        assert_eq!(split_relation_pattern("Firefox,firefox"), ("Firefox".to_string(), "firefox".to_string()));
        assert_eq!(split_relation_pattern("firefox"), ("*".to_string(), "firefox".to_string()));
    }

    #[test]
    fn integer_at_limit_succeeds_over_limit_errors() {
        let (actions, errors) = parse("overlap 1000000");
        assert!(errors.is_empty());
        assert_eq!(actions.0, vec![Action::Overlap(Int::plain(1_000_000))]);

        let (_actions, errors) = parse("overlap 1000001");
        assert!(!errors.is_empty());
    }
}
