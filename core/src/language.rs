//! A loaded language: parse tables paired with the lexer that feeds them.

use std::fmt;
use std::sync::Arc;

use crate::error::GrammarLoadError;
use crate::lexer::Lexer;
use crate::symbol::{FieldId, KindId, SymbolFlags};
use crate::tables::ParseTables;

/// Shared, immutable language definition.
///
/// Cloning is cheap; every parser and tree built from one `Language` shares
/// the same tables.
#[derive(Clone)]
pub struct Language {
    tables: Arc<ParseTables>,
    lexer: Arc<dyn Lexer>,
    fingerprint: u32,
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.name())
            .field("symbols", &self.symbol_count())
            .field("states", &self.state_count())
            .field("fingerprint", &format_args!("{:#010x}", self.fingerprint))
            .finish()
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint && self.tables == other.tables
    }
}

impl Language {
    /// Validates a grammar blob and pairs it with `lexer`.
    pub fn from_blob(bytes: &[u8], lexer: Arc<dyn Lexer>) -> Result<Self, GrammarLoadError> {
        let tables = ParseTables::from_bytes(bytes)?;
        Self::new(tables, lexer)
    }

    /// Pairs already-built tables with `lexer`, checking that the lexer's
    /// terminals are exactly the grammar's.
    pub fn new(tables: ParseTables, lexer: Arc<dyn Lexer>) -> Result<Self, GrammarLoadError> {
        let expected = lexer.terminal_names();
        let declared = tables.terminal_count();
        for index in 0..expected.len().max(declared) {
            let found = (index < declared).then(|| tables.symbol_name(KindId(index as u16)));
            match (expected.get(index), found) {
                (Some(&e), Some(f)) if e == f => {}
                (e, f) => {
                    return Err(GrammarLoadError::LexerMismatch {
                        index,
                        expected: e.copied().unwrap_or("<none>").to_owned(),
                        found: f.unwrap_or("<none>").to_owned(),
                    });
                }
            }
        }
        let fingerprint = tables.fingerprint();
        Ok(Self {
            tables: Arc::new(tables),
            lexer,
            fingerprint,
        })
    }

    #[inline]
    pub(crate) fn tables(&self) -> &ParseTables {
        &self.tables
    }

    #[inline]
    pub(crate) fn lexer(&self) -> &dyn Lexer {
        self.lexer.as_ref()
    }

    pub fn name(&self) -> &str {
        self.tables.name()
    }

    pub fn symbol_count(&self) -> usize {
        self.tables.symbol_count()
    }

    pub fn state_count(&self) -> usize {
        self.tables.state_count()
    }

    pub fn symbol_name(&self, kind: KindId) -> Option<&str> {
        (kind.index() < self.symbol_count()).then(|| self.tables.symbol_name(kind))
    }

    /// Id of a symbol by name. Hidden rules are not addressable.
    pub fn id_for_name(&self, name: &str) -> Option<KindId> {
        self.tables
            .symbols
            .iter()
            .position(|s| s.name == name && !s.flags.contains(SymbolFlags::HIDDEN))
            .map(|i| KindId(i as u16))
    }

    pub fn is_named(&self, kind: KindId) -> bool {
        self.tables.symbol_flags(kind).contains(SymbolFlags::NAMED)
    }

    pub fn field_count(&self) -> usize {
        self.tables.fields.len()
    }

    pub fn field_name(&self, field: FieldId) -> Option<&str> {
        self.tables.field_name(field)
    }

    pub fn field_id_for_name(&self, name: &str) -> Option<FieldId> {
        self.tables
            .fields
            .iter()
            .position(|f| f == name)
            .map(|i| FieldId(i as u16 + 1))
    }

    /// Checksum identifying the tables; trees only reparse under an equal one.
    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }
}
