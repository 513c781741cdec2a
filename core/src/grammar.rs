//! Grammar descriptions.
//!
//! A [`GrammarBuilder`] collects symbols, fields, rules and precedences and
//! checks them into a [`Grammar`]. The grammar is only an input to
//! [`ParseTables::build`](crate::tables::ParseTables::build); the runtime
//! never parses with a `Grammar` directly.
//!
//! ```ignore
//! let mut g = GrammarBuilder::new("calc");
//! let plus = g.terminal("+", false)?;
//! let num = g.terminal("number", true)?;
//! let expr = g.nonterminal("expression")?;
//! let left = g.field("left");
//! let right = g.field("right");
//!
//! g.token_precedence(plus, Precedence::left(1));
//! g.rule(expr, [left.on(expr), plus.into(), right.on(expr)])?;
//! g.rule(expr, [num.into()])?;
//! g.start(expr);
//! let grammar = g.build()?;
//! ```

use std::collections::HashMap;

use crate::error::GrammarError;
use crate::symbol::{FieldId, KindId, Precedence, Sym, SymbolFlags, SymbolInfo};

/// A checked grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) name: String,
    pub(crate) symbols: Vec<SymbolInfo>,
    pub(crate) fields: Vec<String>,
    pub(crate) terminal_count: u16,
    pub(crate) start: KindId,
    pub(crate) rules: Vec<Rule>,
    pub(crate) token_precedence: Vec<Option<Precedence>>,
}

/// A production with per-position fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub lhs: KindId,
    pub rhs: Vec<Sym>,
    pub precedence: Option<Precedence>,
}

impl Grammar {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbols(&self) -> &[SymbolInfo] {
        &self.symbols
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn terminal_count(&self) -> usize {
        self.terminal_count as usize
    }
}

/// Incremental grammar construction.
#[derive(Debug)]
pub struct GrammarBuilder {
    name: String,
    symbols: Vec<SymbolInfo>,
    by_name: HashMap<String, KindId>,
    fields: Vec<String>,
    rules: Vec<Rule>,
    token_precedence: HashMap<KindId, Precedence>,
    start: Option<KindId>,
    terminal_count: Option<u16>,
}

impl GrammarBuilder {
    /// Largest symbol count: ids must stay below the table sentinels.
    pub const MAX_SYMBOLS: usize = 0x7FFF;

    /// Creates a builder holding the two reserved terminals.
    pub fn new(name: impl Into<String>) -> Self {
        let reserved = [
            ("end", SymbolFlags::TERMINAL),
            ("ERROR", SymbolFlags::TERMINAL | SymbolFlags::NAMED),
        ];
        let symbols: Vec<SymbolInfo> = reserved
            .iter()
            .map(|(name, flags)| SymbolInfo {
                name: (*name).to_owned(),
                flags: *flags,
            })
            .collect();
        let by_name = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.clone(), KindId(i as u16)))
            .collect();

        Self {
            name: name.into(),
            symbols,
            by_name,
            fields: Vec::new(),
            rules: Vec::new(),
            token_precedence: HashMap::new(),
            start: None,
            terminal_count: None,
        }
    }

    fn push_symbol(&mut self, name: &str, flags: SymbolFlags) -> Result<KindId, GrammarError> {
        if self.by_name.contains_key(name) {
            return Err(GrammarError::DuplicateSymbol(name.to_owned()));
        }
        if self.symbols.len() >= Self::MAX_SYMBOLS {
            return Err(GrammarError::TooManySymbols {
                max: Self::MAX_SYMBOLS,
            });
        }
        let id = KindId(self.symbols.len() as u16);
        self.symbols.push(SymbolInfo {
            name: name.to_owned(),
            flags,
        });
        self.by_name.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Declares a terminal. `named` terminals appear in S-expressions.
    pub fn terminal(&mut self, name: &str, named: bool) -> Result<KindId, GrammarError> {
        let mut flags = SymbolFlags::TERMINAL;
        flags.set(SymbolFlags::NAMED, named);
        self.push_terminal(name, flags)
    }

    /// Declares a lexer error kind. No parse state accepts it.
    pub fn error_terminal(&mut self, name: &str) -> Result<KindId, GrammarError> {
        self.push_terminal(
            name,
            SymbolFlags::TERMINAL | SymbolFlags::NAMED | SymbolFlags::ERROR_TOKEN,
        )
    }

    fn push_terminal(&mut self, name: &str, flags: SymbolFlags) -> Result<KindId, GrammarError> {
        if self.terminal_count.is_some() {
            return Err(GrammarError::TerminalAfterNonterminal(name.to_owned()));
        }
        self.push_symbol(name, flags)
    }

    /// Declares a nonterminal. Names starting with `_` are hidden.
    pub fn nonterminal(&mut self, name: &str) -> Result<KindId, GrammarError> {
        if self.terminal_count.is_none() {
            self.terminal_count = Some(self.symbols.len() as u16);
        }
        let flags = if name.starts_with('_') {
            SymbolFlags::HIDDEN
        } else {
            SymbolFlags::NAMED
        };
        self.push_symbol(name, flags)
    }

    /// Returns the id of a field, declaring it on first use.
    pub fn field(&mut self, name: &str) -> FieldId {
        if let Some(pos) = self.fields.iter().position(|f| f == name) {
            return FieldId(pos as u16 + 1);
        }
        self.fields.push(name.to_owned());
        FieldId(self.fields.len() as u16)
    }

    /// Looks up a declared symbol by name.
    pub fn symbol(&self, name: &str) -> Option<KindId> {
        self.by_name.get(name).copied()
    }

    pub fn token_precedence(&mut self, terminal: KindId, precedence: Precedence) -> &mut Self {
        self.token_precedence.insert(terminal, precedence);
        self
    }

    pub fn start(&mut self, start: KindId) -> &mut Self {
        self.start = Some(start);
        self
    }

    /// Adds `lhs -> rhs`.
    pub fn rule<I, S>(&mut self, lhs: KindId, rhs: I) -> Result<&mut Self, GrammarError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Sym>,
    {
        self.push_rule(lhs, rhs.into_iter().map(Into::into).collect(), None)
    }

    /// Adds `lhs -> rhs` carrying a precedence for shift/reduce resolution.
    pub fn rule_with_precedence<I, S>(
        &mut self,
        lhs: KindId,
        rhs: I,
        precedence: Precedence,
    ) -> Result<&mut Self, GrammarError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Sym>,
    {
        self.push_rule(
            lhs,
            rhs.into_iter().map(Into::into).collect(),
            Some(precedence),
        )
    }

    fn push_rule(
        &mut self,
        lhs: KindId,
        rhs: Vec<Sym>,
        precedence: Option<Precedence>,
    ) -> Result<&mut Self, GrammarError> {
        let lhs_info = self
            .symbols
            .get(lhs.index())
            .ok_or(GrammarError::UnknownSymbol(lhs.0))?;
        if lhs_info.flags.contains(SymbolFlags::TERMINAL) {
            return Err(GrammarError::TerminalRule(lhs_info.name.clone()));
        }
        for sym in &rhs {
            let info = self
                .symbols
                .get(sym.kind.index())
                .ok_or(GrammarError::UnknownSymbol(sym.kind.0))?;
            if sym.kind == KindId::END || sym.kind == KindId::ERROR {
                return Err(GrammarError::ReservedSymbol(info.name.clone()));
            }
            match sym.field {
                Some(field) if field.0 == 0 || field.0 as usize > self.fields.len() => {
                    return Err(GrammarError::UnknownField(field.0));
                }
                _ => {}
            }
        }
        self.rules.push(Rule {
            lhs,
            rhs,
            precedence,
        });
        Ok(self)
    }

    /// Checks the description and freezes it.
    pub fn build(self) -> Result<Grammar, GrammarError> {
        let start = self.start.ok_or(GrammarError::MissingStart)?;
        let terminal_count = self.terminal_count.unwrap_or(self.symbols.len() as u16);
        let start_info = self
            .symbols
            .get(start.index())
            .ok_or(GrammarError::UnknownSymbol(start.0))?;
        if start.0 < terminal_count {
            return Err(GrammarError::TerminalRule(start_info.name.clone()));
        }

        for (index, info) in self.symbols.iter().enumerate().skip(terminal_count as usize) {
            if !self.rules.iter().any(|r| r.lhs.index() == index) {
                return Err(GrammarError::NoRules(info.name.clone()));
            }
        }

        let token_precedence = (0..terminal_count)
            .map(|t| self.token_precedence.get(&KindId(t)).copied())
            .collect();

        Ok(Grammar {
            name: self.name,
            symbols: self.symbols,
            fields: self.fields,
            terminal_count,
            start,
            rules: self.rules,
            token_precedence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_symbols() {
        let builder = GrammarBuilder::new("empty");
        assert_eq!(builder.symbol("end"), Some(KindId::END));
        assert_eq!(builder.symbol("ERROR"), Some(KindId::ERROR));
    }

    #[test]
    fn test_terminal_after_nonterminal_rejected() {
        let mut g = GrammarBuilder::new("bad");
        g.terminal("a", true).unwrap();
        g.nonterminal("s").unwrap();
        assert_eq!(
            g.terminal("b", true),
            Err(GrammarError::TerminalAfterNonterminal("b".into()))
        );
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let mut g = GrammarBuilder::new("bad");
        g.terminal("a", true).unwrap();
        assert_eq!(
            g.terminal("a", false),
            Err(GrammarError::DuplicateSymbol("a".into()))
        );
    }

    #[test]
    fn test_fields_are_deduplicated() {
        let mut g = GrammarBuilder::new("fields");
        let a = g.field("left");
        let b = g.field("right");
        assert_eq!(a, FieldId(1));
        assert_eq!(b, FieldId(2));
        assert_eq!(g.field("left"), a);
    }

    #[test]
    fn test_hidden_nonterminal_flags() {
        let mut g = GrammarBuilder::new("hidden");
        g.terminal("a", true).unwrap();
        let visible = g.nonterminal("item").unwrap();
        let hidden = g.nonterminal("_items").unwrap();
        assert!(g.symbols[visible.index()].flags.contains(SymbolFlags::NAMED));
        assert!(g.symbols[hidden.index()].flags.contains(SymbolFlags::HIDDEN));
    }

    #[test]
    fn test_nonterminal_without_rules_rejected() {
        let mut g = GrammarBuilder::new("bad");
        let a = g.terminal("a", true).unwrap();
        let s = g.nonterminal("s").unwrap();
        g.nonterminal("orphan").unwrap();
        g.rule(s, [a]).unwrap();
        g.start(s);
        assert_eq!(
            g.build().map(|_| ()),
            Err(GrammarError::NoRules("orphan".into()))
        );
    }

    #[test]
    fn test_missing_start_rejected() {
        let mut g = GrammarBuilder::new("bad");
        let a = g.terminal("a", true).unwrap();
        let s = g.nonterminal("s").unwrap();
        g.rule(s, [a]).unwrap();
        assert_eq!(g.build().map(|_| ()), Err(GrammarError::MissingStart));
    }

    #[test]
    fn test_reserved_symbol_in_rule_rejected() {
        let mut g = GrammarBuilder::new("bad");
        g.terminal("a", true).unwrap();
        let s = g.nonterminal("s").unwrap();
        assert!(matches!(
            g.rule(s, [KindId::ERROR]),
            Err(GrammarError::ReservedSymbol(_))
        ));
    }
}
