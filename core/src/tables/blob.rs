//! Grammar blob format.
//!
//! ```text
//! offset  size  field
//! 0       4     magic "SYLR"
//! 4       2     format version (little endian)
//! 6       2     reserved, zero
//! 8       4     CRC-32 of the payload
//! 12      4     payload length
//! 16      ..    payload
//! ```
//!
//! The payload holds, in order: grammar name, symbol table (flags and name
//! per symbol), field names, terminal count, start symbol, rules (left-hand
//! side, then symbol and field per position), token precedence per terminal,
//! state count, the dense action table and the goto table.
//!
//! Strings are a `u16` length followed by UTF-8 bytes. Every id read back is
//! range-checked, so a blob that decodes can be indexed without further
//! validation.

use tracing::debug;

use super::{Action, NO_GOTO, ParseTables, RuleInfo};
use crate::error::GrammarLoadError;
use crate::symbol::{Assoc, FieldId, KindId, Precedence, SymbolFlags, SymbolInfo};

pub const MAGIC: [u8; 4] = *b"SYLR";
pub const FORMAT_VERSION: u16 = 1;
pub const HEADER_SIZE: usize = 16;

const NO_FIELD: u16 = 0;
const NO_PRECEDENCE: u8 = 0;

struct Writer {
    out: Vec<u8>,
}

impl Writer {
    fn u8(&mut self, value: u8) {
        self.out.push(value);
    }

    fn u16(&mut self, value: u16) {
        self.out.extend_from_slice(&value.to_le_bytes());
    }

    fn u32(&mut self, value: u32) {
        self.out.extend_from_slice(&value.to_le_bytes());
    }

    fn str(&mut self, value: &str) {
        let bytes = &value.as_bytes()[..value.len().min(u16::MAX as usize)];
        self.u16(bytes.len() as u16);
        self.out.extend_from_slice(bytes);
    }
}

pub(super) fn encode(tables: &ParseTables) -> Vec<u8> {
    let mut w = Writer { out: Vec::new() };

    w.str(&tables.name);
    w.u16(tables.symbols.len() as u16);
    for symbol in &tables.symbols {
        w.u8(symbol.flags.bits());
        w.str(&symbol.name);
    }
    w.u16(tables.fields.len() as u16);
    for field in &tables.fields {
        w.str(field);
    }
    w.u16(tables.terminal_count);
    w.u16(tables.start.0);

    w.u16(tables.rules.len() as u16);
    for rule in &tables.rules {
        w.u16(rule.lhs.0);
        w.u16(rule.rhs.len() as u16);
        for (kind, field) in rule.rhs.iter().zip(rule.fields.iter()) {
            w.u16(kind.0);
            w.u16(field.map_or(NO_FIELD, |f| f.0));
        }
    }

    for precedence in &tables.token_precedence {
        match precedence {
            None => {
                w.u8(NO_PRECEDENCE);
                w.u16(0);
            }
            Some(p) => {
                w.u8(match p.assoc {
                    Assoc::Left => 1,
                    Assoc::Right => 2,
                    Assoc::NonAssoc => 3,
                });
                w.u16(p.level);
            }
        }
    }

    w.u16(tables.state_count);
    for &cell in &tables.actions {
        w.u32(cell);
    }
    for &cell in &tables.gotos {
        w.u16(cell);
    }

    let payload = w.out;
    let mut blob = Vec::with_capacity(HEADER_SIZE + payload.len());
    blob.extend_from_slice(&MAGIC);
    blob.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    blob.extend_from_slice(&0u16.to_le_bytes());
    blob.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    blob.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    blob.extend_from_slice(&payload);
    blob
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], GrammarLoadError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(GrammarLoadError::Truncated(what))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, GrammarLoadError> {
        Ok(self.take(1, what)?[0])
    }

    fn u16(&mut self, what: &'static str) -> Result<u16, GrammarLoadError> {
        let b = self.take(2, what)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, what: &'static str) -> Result<u32, GrammarLoadError> {
        let b = self.take(4, what)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn str(&mut self, what: &'static str) -> Result<String, GrammarLoadError> {
        let len = self.u16(what)? as usize;
        let bytes = self.take(len, what)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| GrammarLoadError::Malformed("non UTF-8 name"))
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

fn check(what: &'static str, value: u32, bound: usize) -> Result<(), GrammarLoadError> {
    if (value as usize) < bound {
        Ok(())
    } else {
        Err(GrammarLoadError::OutOfRange { what, value })
    }
}

fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

pub(super) fn decode(bytes: &[u8]) -> Result<ParseTables, GrammarLoadError> {
    if bytes.len() < HEADER_SIZE {
        return Err(GrammarLoadError::FileTooSmall(bytes.len()));
    }
    let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
    if magic != MAGIC {
        return Err(GrammarLoadError::InvalidMagic(magic));
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != FORMAT_VERSION {
        return Err(GrammarLoadError::VersionMismatch {
            expected: FORMAT_VERSION,
            found: version,
        });
    }
    let checksum = read_u32_le(bytes, 8);
    let payload_len = read_u32_le(bytes, 12);
    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != payload_len as usize {
        return Err(GrammarLoadError::SizeMismatch {
            header: payload_len,
            actual: payload.len(),
        });
    }
    let actual = crc32fast::hash(payload);
    if actual != checksum {
        return Err(GrammarLoadError::ChecksumMismatch {
            expected: checksum,
            found: actual,
        });
    }

    let tables = decode_payload(payload)?;
    debug!(
        grammar = %tables.name,
        symbols = tables.symbols.len(),
        states = tables.state_count,
        bytes = bytes.len(),
        "loaded grammar tables"
    );
    Ok(tables)
}

fn decode_payload(payload: &[u8]) -> Result<ParseTables, GrammarLoadError> {
    let mut r = Reader {
        bytes: payload,
        pos: 0,
    };

    let name = r.str("grammar name")?;

    let symbol_count = r.u16("symbol count")? as usize;
    if symbol_count < 2 {
        return Err(GrammarLoadError::Malformed("reserved symbols missing"));
    }
    let mut symbols = Vec::with_capacity(symbol_count);
    for _ in 0..symbol_count {
        let raw = r.u8("symbol flags")?;
        let flags = SymbolFlags::from_bits(raw).ok_or(GrammarLoadError::OutOfRange {
            what: "symbol flags",
            value: raw as u32,
        })?;
        let name = r.str("symbol name")?;
        symbols.push(SymbolInfo { name, flags });
    }
    if symbols[KindId::END.index()].name != "end" || symbols[KindId::ERROR.index()].name != "ERROR"
    {
        return Err(GrammarLoadError::Malformed("reserved symbols renamed"));
    }

    let field_count = r.u16("field count")? as usize;
    let mut fields = Vec::with_capacity(field_count);
    for _ in 0..field_count {
        fields.push(r.str("field name")?);
    }

    let terminal_count = r.u16("terminal count")?;
    if (terminal_count as usize) < 2 || terminal_count as usize > symbol_count {
        return Err(GrammarLoadError::OutOfRange {
            what: "terminal count",
            value: terminal_count as u32,
        });
    }
    for (index, symbol) in symbols.iter().enumerate() {
        let terminal = index < terminal_count as usize;
        if symbol.flags.contains(SymbolFlags::TERMINAL) != terminal {
            return Err(GrammarLoadError::Malformed("terminal flags disagree with terminal count"));
        }
    }

    let start = r.u16("start symbol")?;
    check("start symbol", start as u32, symbol_count)?;
    if start < terminal_count {
        return Err(GrammarLoadError::Malformed("start symbol is a terminal"));
    }

    let rule_count = r.u16("rule count")? as usize;
    let mut rules = Vec::with_capacity(rule_count);
    for _ in 0..rule_count {
        let lhs = r.u16("rule lhs")?;
        check("rule lhs", lhs as u32, symbol_count)?;
        if lhs < terminal_count {
            return Err(GrammarLoadError::Malformed("rule lhs is a terminal"));
        }
        let len = r.u16("rule length")? as usize;
        let mut rhs = Vec::with_capacity(len);
        let mut rule_fields = Vec::with_capacity(len);
        for _ in 0..len {
            let kind = r.u16("rule symbol")?;
            check("rule symbol", kind as u32, symbol_count)?;
            let field = r.u16("rule field")?;
            check("rule field", field as u32, field_count + 1)?;
            rhs.push(KindId(kind));
            rule_fields.push((field != NO_FIELD).then_some(FieldId(field)));
        }
        rules.push(RuleInfo {
            lhs: KindId(lhs),
            rhs: rhs.into_boxed_slice(),
            fields: rule_fields.into_boxed_slice(),
        });
    }

    let mut token_precedence = Vec::with_capacity(terminal_count as usize);
    for _ in 0..terminal_count {
        let assoc = r.u8("precedence")?;
        let level = r.u16("precedence level")?;
        token_precedence.push(match assoc {
            NO_PRECEDENCE => None,
            1 => Some(Precedence::left(level)),
            2 => Some(Precedence::right(level)),
            3 => Some(Precedence::non_assoc(level)),
            other => {
                return Err(GrammarLoadError::OutOfRange {
                    what: "associativity",
                    value: other as u32,
                });
            }
        });
    }

    let state_count = r.u16("state count")?;
    if state_count == 0 {
        return Err(GrammarLoadError::Malformed("no parse states"));
    }
    let action_cells = state_count as usize * terminal_count as usize;
    let mut actions = Vec::with_capacity(action_cells);
    for _ in 0..action_cells {
        let raw = r.u32("action table")?;
        match Action::decode(raw) {
            None => {
                return Err(GrammarLoadError::OutOfRange {
                    what: "action",
                    value: raw,
                });
            }
            Some(Action::Shift(target)) => check("shift target", target as u32, state_count as usize)?,
            Some(Action::Reduce(rule)) => check("reduced rule", rule as u32, rule_count)?,
            Some(Action::Error | Action::Accept) => {}
        }
        actions.push(raw);
    }

    let goto_cells = state_count as usize * (symbol_count - terminal_count as usize);
    let mut gotos = Vec::with_capacity(goto_cells);
    for _ in 0..goto_cells {
        let target = r.u16("goto table")?;
        if target != NO_GOTO {
            check("goto target", target as u32, state_count as usize)?;
        }
        gotos.push(target);
    }

    if r.remaining() != 0 {
        return Err(GrammarLoadError::TrailingBytes(r.remaining()));
    }

    Ok(ParseTables {
        name,
        symbols,
        fields,
        terminal_count,
        start: KindId(start),
        rules,
        token_precedence,
        state_count,
        actions,
        gotos,
    })
}
