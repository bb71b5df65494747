//! Cross-reference table
//!
//! One slot per object number, sized by the trailer's `Size`. Sections from
//! every revision are merged into the same table, newest first: a slot only
//! changes when an incoming entry carries a strictly higher generation, so
//! ties go to the newest revision and a higher generation is never replaced
//! by a lower one.

use super::lexer::{Lexer, Token};
use super::{ParseError, ParseResult};
use std::io::{Read, Seek};

/// Cross-reference entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XRefEntry {
    /// Byte offset relative to the version marker (meaningless for free entries)
    pub offset: u64,
    /// Generation number
    pub generation: u16,
    /// `n` entries are in use, `f` entries are free
    pub in_use: bool,
}

impl XRefEntry {
    pub fn in_use(offset: u64, generation: u16) -> Self {
        Self {
            offset,
            generation,
            in_use: true,
        }
    }

    pub fn free(next_free: u64, generation: u16) -> Self {
        Self {
            offset: next_free,
            generation,
            in_use: false,
        }
    }
}

/// Cross-reference table indexed by object number
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XRefTable {
    entries: Vec<Option<XRefEntry>>,
}

impl XRefTable {
    /// Table with `size` slots: object 0 plus `size - 1` object numbers
    pub fn with_size(size: usize) -> Self {
        Self {
            entries: vec![None; size],
        }
    }

    /// Number of slots, object 0 included
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Grow the table; never shrinks
    pub fn resize(&mut self, size: usize) {
        if size > self.entries.len() {
            self.entries.resize(size, None);
        }
    }

    pub fn get(&self, number: u32) -> Option<&XRefEntry> {
        self.entries.get(number as usize).and_then(Option::as_ref)
    }

    /// Overwrite a slot unconditionally. Out-of-range numbers are ignored.
    pub fn set(&mut self, number: u32, entry: XRefEntry) {
        if let Some(slot) = self.entries.get_mut(number as usize) {
            *slot = Some(entry);
        }
    }

    /// Apply the generation rule. Returns whether the slot changed.
    pub fn merge(&mut self, number: u32, entry: XRefEntry) -> bool {
        let Some(slot) = self.entries.get_mut(number as usize) else {
            return false;
        };
        match slot {
            Some(stored) if stored.generation >= entry.generation => false,
            _ => {
                *slot = Some(entry);
                true
            }
        }
    }

    /// Every filled slot, object 0 included
    pub fn iter(&self) -> impl Iterator<Item = (u32, &XRefEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(number, entry)| entry.as_ref().map(|e| (number as u32, e)))
    }

    /// In-use entries for real object numbers, ascending
    pub fn live_entries(&self) -> impl Iterator<Item = (u32, XRefEntry)> + '_ {
        self.iter()
            .filter(|(number, entry)| *number > 0 && entry.in_use)
            .map(|(number, entry)| (number, *entry))
    }

    /// Parse an `xref` section at the cursor and merge its entries.
    ///
    /// Stops in front of the `trailer` keyword, which is left unconsumed.
    /// Returns the number of entries read.
    pub fn parse_section<R: Read + Seek>(&mut self, lexer: &mut Lexer<R>) -> ParseResult<usize> {
        let position = lexer.position();
        match lexer.next_token()? {
            Token::XRef => {}
            other => {
                return Err(ParseError::InvalidXRef {
                    position,
                    message: format!("Expected 'xref', found {other:?}"),
                })
            }
        }

        let mut count = 0;
        loop {
            let position = lexer.position();
            match lexer.peek_token()? {
                Token::Trailer => break,
                Token::Integer(_) => count += self.parse_subsection(lexer)?,
                other => {
                    return Err(ParseError::InvalidXRef {
                        position,
                        message: format!("Expected subsection or 'trailer', found {other:?}"),
                    })
                }
            }
        }
        Ok(count)
    }

    fn parse_subsection<R: Read + Seek>(&mut self, lexer: &mut Lexer<R>) -> ParseResult<usize> {
        let position = lexer.position();
        let first = read_unsigned(lexer, "subsection start")?;
        let count = read_unsigned(lexer, "subsection length")?;

        if first + count > self.entries.len() as u64 {
            return Err(ParseError::InvalidXRef {
                position,
                message: format!(
                    "Subsection {first}..{} exceeds table size {}",
                    first + count,
                    self.entries.len()
                ),
            });
        }

        for i in 0..count {
            let offset = read_unsigned(lexer, "entry offset")?;
            let position = lexer.position();
            let generation = read_unsigned(lexer, "entry generation")?;
            let generation = u16::try_from(generation).map_err(|_| ParseError::InvalidXRef {
                position,
                message: format!("Generation {generation} out of range"),
            })?;
            let in_use = read_flag(lexer)?;

            // first + count fits the table, so the number fits u32
            self.merge(
                (first + i) as u32,
                XRefEntry {
                    offset,
                    generation,
                    in_use,
                },
            );
        }

        Ok(count as usize)
    }
}

fn read_unsigned<R: Read + Seek>(lexer: &mut Lexer<R>, what: &str) -> ParseResult<u64> {
    let position = lexer.position();
    match lexer.next_token()? {
        Token::Integer(value) if value >= 0 => Ok(value as u64),
        other => Err(ParseError::InvalidXRef {
            position,
            message: format!("Expected {what}, found {other:?}"),
        }),
    }
}

/// The `f`/`n` column of an entry
fn read_flag<R: Read + Seek>(lexer: &mut Lexer<R>) -> ParseResult<bool> {
    lexer.skip_whitespace()?;
    let position = lexer.position();
    let flag = match lexer.next_byte("xref entry")? {
        b'n' => true,
        b'f' => false,
        other => {
            return Err(ParseError::InvalidXRef {
                position,
                message: format!("Expected 'f' or 'n', found '{}'", char::from(other)),
            })
        }
    };
    if !lexer.at_token_boundary()? {
        return Err(ParseError::InvalidXRef {
            position,
            message: "Entry flag must be followed by whitespace".to_string(),
        });
    }
    Ok(flag)
}
