//! The LR parsing engine.
//!
//! A [`Parser`] drives the shared [`ParseTables`] over tokens pulled lazily
//! from the language's lexer. The lookahead is either a freshly lexed token
//! or, during a reparse, an unchanged subtree of the previous tree. Subtrees
//! are shifted whole when the state they were built in matches the current
//! one, and broken down into their children otherwise.
//!
//! Malformed input never aborts a parse; see the `recovery` module.

mod recovery;
mod reuse;
mod stack;

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, debug_span, trace};

use crate::config::ParseConfig;
use crate::edit::Edit;
use crate::error::InvalidEdit;
use crate::language::Language;
use crate::lexer::{LexState, Lexer};
use crate::symbol::{KindId, SymbolFlags};
use crate::tables::{Action, ParseTables};
use crate::tree::{NodeData, NodeFlags, Tree};

use self::recovery::Recovery;
use self::reuse::ReuseCursor;
use self::stack::{Entry, Stack};

/// Parses text of one [`Language`].
///
/// A parser is cheap to create and holds no state between parses other than
/// scratch buffers. Use one per thread; trees and languages can be shared.
#[derive(Debug)]
pub struct Parser {
    language: Language,
    config: ParseConfig,
    scratch: Vec<Entry>,
}

impl Parser {
    pub fn new(language: &Language) -> Self {
        Self::with_config(language, ParseConfig::DEFAULT)
    }

    pub fn with_config(language: &Language, config: ParseConfig) -> Self {
        Self {
            language: language.clone(),
            config,
            scratch: Vec::new(),
        }
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ParseConfig) {
        self.config = config;
    }

    /// Parses `source` from scratch. Always returns a tree.
    pub fn parse(&mut self, source: &[u8]) -> Tree {
        let _span = debug_span!("parse", language = self.language.name(), len = source.len())
            .entered();
        self.run(source, None)
    }

    /// Parses `source`, the result of applying `edit` to the text of
    /// `previous`, reusing what the edit left untouched.
    pub fn parse_incremental(
        &mut self,
        previous: &Tree,
        edit: &Edit,
        source: &[u8],
    ) -> Result<Tree, InvalidEdit> {
        let edited = previous.edit(edit)?;
        self.reparse(&edited, source)
    }

    /// Parses `source`, the current text of a tree edited with [`Tree::edit`].
    pub fn reparse(&mut self, edited: &Tree, source: &[u8]) -> Result<Tree, InvalidEdit> {
        if edited.language.fingerprint() != self.language.fingerprint() {
            return Err(InvalidEdit::LanguageMismatch {
                expected: self.language.name().to_owned(),
                found: edited.language.name().to_owned(),
            });
        }
        if edited.source_len != source.len() {
            return Err(InvalidEdit::LengthMismatch {
                expected: edited.source_len,
                found: source.len(),
            });
        }
        let _span = debug_span!(
            "reparse",
            language = self.language.name(),
            len = source.len(),
            edit = ?edited.edit
        )
        .entered();
        let reuse = self
            .config
            .reuse
            .then(|| ReuseCursor::new(&edited.root, edited.edit));
        Ok(self.run(source, reuse))
    }

    fn run(&mut self, source: &[u8], reuse: Option<ReuseCursor<'_>>) -> Tree {
        let language = self.language.clone();
        let tables = language.tables();
        let mut run = Run {
            tables,
            lexer: language.lexer(),
            source,
            config: &self.config,
            stack: Stack::new(tables, std::mem::take(&mut self.scratch)),
            pending: VecDeque::new(),
            reuse,
            reused: 0,
        };
        let root = run.parse();
        debug!(
            reused = run.reused,
            has_error = root.has_error(),
            "parse finished"
        );
        self.scratch = run.stack.into_entries();
        Tree::new(Arc::new(root), self.language.clone(), source.len())
    }
}

/// The next input: a token, or a subtree of the previous tree.
struct Lookahead {
    node: Arc<NodeData>,
    /// Still the current node of the reuse cursor.
    from_cursor: bool,
}

/// State of a single parse.
struct Run<'a> {
    tables: &'a ParseTables,
    lexer: &'a dyn Lexer,
    source: &'a [u8],
    config: &'a ParseConfig,
    stack: Stack<'a>,
    /// Tokens already lexed past the lookahead, or pushed back by recovery.
    pending: VecDeque<Arc<NodeData>>,
    reuse: Option<ReuseCursor<'a>>,
    reused: usize,
}

impl Run<'_> {
    fn parse(&mut self) -> NodeData {
        let mut lookahead = self.next_lookahead();
        let mut accepted = true;
        loop {
            let state = self.stack.state();
            let (leaf, leaf_end) = lookahead.node.first_leaf();
            let kind = leaf.kind;
            let is_leaf = lookahead.node.children.is_empty();

            match self.tables.action(state, kind) {
                Action::Shift(next) if is_leaf => {
                    if self.stack.len() >= self.config.max_stack_depth
                        && lookahead.node.total() > 0
                    {
                        trace!(depth = self.stack.len(), "stack limit reached, skipping token");
                        self.stack.push_error(vec![lookahead.node]);
                    } else {
                        self.stack.push(next, lookahead.node);
                    }
                    lookahead = self.next_lookahead();
                }
                Action::Shift(_) => {
                    let node = &lookahead.node;
                    let target = if node.parse_state == state
                        && self.stack.len() < self.config.max_stack_depth
                    {
                        self.tables.goto(state, node.kind)
                    } else {
                        None
                    };
                    match target {
                        Some(next) => {
                            trace!(
                                kind = self.tables.symbol_name(node.kind),
                                position = self.stack.end(),
                                "reusing subtree"
                            );
                            self.reused += 1;
                            self.stack.push(next, Arc::clone(node));
                            self.consume_from_cursor(&lookahead);
                            lookahead = self.next_lookahead();
                        }
                        None => lookahead = self.break_down(lookahead),
                    }
                }
                Action::Reduce(rule) => {
                    let lookahead_end = self.stack.end() + leaf_end + leaf.lookahead;
                    let reduced = match self.tables.rule(rule) {
                        Some(info) => self.stack.reduce(info, lookahead_end),
                        None => false,
                    };
                    if !reduced {
                        // Only reachable with inconsistent tables.
                        if !is_leaf {
                            lookahead = self.break_down(lookahead);
                            continue;
                        }
                        match self.recover(lookahead) {
                            Recovery::Resume(next) => lookahead = next,
                            Recovery::Finish => {
                                accepted = false;
                                break;
                            }
                        }
                    }
                }
                Action::Accept => break,
                Action::Error if !is_leaf => lookahead = self.break_down(lookahead),
                Action::Error => match self.recover(lookahead) {
                    Recovery::Resume(next) => lookahead = next,
                    Recovery::Finish => {
                        accepted = false;
                        break;
                    }
                },
            }
        }

        let stack = std::mem::replace(&mut self.stack, Stack::new(self.tables, Vec::new()));
        let (mut root, entries) = stack.into_root(self.tables.start_symbol(), self.source.len());
        self.stack = Stack::new(self.tables, entries);
        if !accepted {
            root.flags |= NodeFlags::HAS_ERROR;
        }
        root
    }

    fn consume_from_cursor(&mut self, lookahead: &Lookahead) {
        if lookahead.from_cursor {
            if let Some(cursor) = &mut self.reuse {
                cursor.advance();
            }
        }
    }

    /// Replaces a subtree lookahead with its first child.
    fn break_down(&mut self, lookahead: Lookahead) -> Lookahead {
        if lookahead.from_cursor {
            if let Some(cursor) = &mut self.reuse {
                if !cursor.descend() {
                    cursor.advance();
                }
            }
        }
        self.next_lookahead()
    }

    fn next_lookahead(&mut self) -> Lookahead {
        if let Some(node) = self.pending.pop_front() {
            return Lookahead {
                node,
                from_cursor: false,
            };
        }
        let position = self.stack.end();
        if let Some(cursor) = &mut self.reuse {
            if let Some(node) = cursor.candidate_at(position) {
                if node.children.is_empty() {
                    cursor.advance();
                    self.reused += 1;
                    return Lookahead {
                        node,
                        from_cursor: false,
                    };
                }
                return Lookahead {
                    node,
                    from_cursor: true,
                };
            }
        }
        Lookahead {
            node: self.lex(position),
            from_cursor: false,
        }
    }

    /// Lexes the token at `position`, or the end of input.
    fn lex(&self, position: usize) -> Arc<NodeData> {
        let len = self.source.len();
        let token = self
            .lexer
            .next_token(self.source, LexState { offset: position });
        let node = match token {
            Some((token, _))
                if token.padding + token.size > 0
                    && position + token.padding + token.size <= len =>
            {
                let mut leaf =
                    NodeData::leaf(token.kind, token.padding, token.size, token.lookahead);
                if self.is_invalid_token(token.kind) {
                    leaf.flags |= NodeFlags::HAS_ERROR;
                }
                leaf
            }
            // The end of input counts as one byte read past the text, so
            // anything reduced on it is dirty once text is appended.
            _ if position >= len => NodeData::leaf(KindId::END, 0, 0, 1),
            Some(_) => {
                // A token that does not advance, or runs past the text.
                trace!(position, "lexer returned an unusable token");
                NodeData::leaf(KindId::ERROR, 0, len - position, 0)
            }
            None => NodeData::leaf(KindId::END, len - position, 0, 1),
        };
        Arc::new(node)
    }

    fn is_invalid_token(&self, kind: KindId) -> bool {
        kind == KindId::ERROR
            || self
                .tables
                .symbol_flags(kind)
                .contains(SymbolFlags::ERROR_TOKEN)
    }
}
