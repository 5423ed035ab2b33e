// The opcode table from spec.md §4.8, as a dense tagged enum dispatched by
// an exhaustive match rather than a dynamic mapping (spec.md §9: "the
// opcode space is dense and finite... a tagged enum... is preferred over a
// dynamic mapping"). Grounded on the teacher's `Instruction` enum in
// instructions.rs, whose shape (one variant per mnemonic, optional payload
// fields) this mirrors — its `execute` bodies are empty stubs in the
// teacher, fully implemented here in `engine.rs` against this spec instead.

use crate::error::AgcError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Opcode {
    Tc,
    Ccs,
    Index,
    Xch,
    Ca,
    Cs,
    Ts,
    Ad,
    Msk,
    Extend,
    Mp,
    Dv,
    Su,
    Dca,
    Dcs,
    Dad,
    Das,
    Dsu,
    Lxch,
    Qxch,
    Incr,
    Aug,
    Dim,
    Bzf,
    Bzm,
    Relint,
    Inhint,
    Edrupt,
    Resume,
    Cyr,
    Sr,
    Sl,
    Pinc,
    Minc,
    Dxch,
    Caf,
    Tcaf,
    Rand,
    Mask,
    Read,
    Write,
    Noop,
    /// Reserved token from spec.md §6; decodes but has no defined effect.
    Inot,
    /// Reserved token from spec.md §6; decodes but has no defined effect.
    Inotr,
}

/// Whether an opcode's symbolic form requires an address/mask/vector operand.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operand {
    None,
    Required,
}

impl Opcode {
    pub const ALL: [Opcode; 44] = [
        Opcode::Tc, Opcode::Ccs, Opcode::Index, Opcode::Xch, Opcode::Ca, Opcode::Cs,
        Opcode::Ts, Opcode::Ad, Opcode::Msk, Opcode::Extend, Opcode::Mp, Opcode::Dv,
        Opcode::Su, Opcode::Dca, Opcode::Dcs, Opcode::Dad, Opcode::Das, Opcode::Dsu,
        Opcode::Lxch, Opcode::Qxch, Opcode::Incr, Opcode::Aug, Opcode::Dim, Opcode::Bzf,
        Opcode::Bzm, Opcode::Relint, Opcode::Inhint, Opcode::Edrupt, Opcode::Resume,
        Opcode::Cyr, Opcode::Sr, Opcode::Sl, Opcode::Pinc, Opcode::Minc, Opcode::Dxch,
        Opcode::Caf, Opcode::Tcaf, Opcode::Rand, Opcode::Mask, Opcode::Read, Opcode::Write,
        Opcode::Noop, Opcode::Inot, Opcode::Inotr,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Tc => "TC",
            Opcode::Ccs => "CCS",
            Opcode::Index => "INDEX",
            Opcode::Xch => "XCH",
            Opcode::Ca => "CA",
            Opcode::Cs => "CS",
            Opcode::Ts => "TS",
            Opcode::Ad => "AD",
            Opcode::Msk => "MSK",
            Opcode::Extend => "EXTEND",
            Opcode::Mp => "MP",
            Opcode::Dv => "DV",
            Opcode::Su => "SU",
            Opcode::Dca => "DCA",
            Opcode::Dcs => "DCS",
            Opcode::Dad => "DAD",
            Opcode::Das => "DAS",
            Opcode::Dsu => "DSU",
            Opcode::Lxch => "LXCH",
            Opcode::Qxch => "QXCH",
            Opcode::Incr => "INCR",
            Opcode::Aug => "AUG",
            Opcode::Dim => "DIM",
            Opcode::Bzf => "BZF",
            Opcode::Bzm => "BZM",
            Opcode::Relint => "RELINT",
            Opcode::Inhint => "INHINT",
            Opcode::Edrupt => "EDRUPT",
            Opcode::Resume => "RESUME",
            Opcode::Cyr => "CYR",
            Opcode::Sr => "SR",
            Opcode::Sl => "SL",
            Opcode::Pinc => "PINC",
            Opcode::Minc => "MINC",
            Opcode::Dxch => "DXCH",
            Opcode::Caf => "CAF",
            Opcode::Tcaf => "TCAF",
            Opcode::Rand => "RAND",
            Opcode::Mask => "MASK",
            Opcode::Read => "READ",
            Opcode::Write => "WRITE",
            Opcode::Noop => "NOOP",
            Opcode::Inot => "INOT",
            Opcode::Inotr => "INOTR",
        }
    }

    pub fn from_mnemonic(s: &str) -> Result<Opcode, AgcError> {
        let upper = s.to_ascii_uppercase();
        Opcode::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic() == upper)
            .ok_or_else(|| AgcError::UnknownMnemonic(s.to_string()))
    }

    /// Per-opcode MCT cost from spec.md §4.8.
    pub fn cycles(self) -> u32 {
        match self {
            Opcode::Tc => 1,
            Opcode::Ccs => 2,
            Opcode::Index => 1,
            Opcode::Xch => 2,
            Opcode::Ca => 2,
            Opcode::Cs => 2,
            Opcode::Ts => 2,
            Opcode::Ad => 2,
            Opcode::Msk => 1,
            Opcode::Extend => 1,
            Opcode::Mp => 6,
            Opcode::Dv => 6,
            Opcode::Su => 2,
            Opcode::Dca => 4,
            Opcode::Dcs => 4,
            Opcode::Dad | Opcode::Das | Opcode::Dsu => 6,
            Opcode::Lxch | Opcode::Qxch => 2,
            Opcode::Incr => 2,
            Opcode::Aug => 1,
            Opcode::Dim => 2,
            Opcode::Bzf => 2,
            Opcode::Bzm => 2,
            Opcode::Relint | Opcode::Inhint => 1,
            Opcode::Edrupt => 1,
            Opcode::Resume => 1,
            Opcode::Cyr => 2,
            Opcode::Sr | Opcode::Sl => 2,
            Opcode::Pinc | Opcode::Minc => 2,
            Opcode::Dxch => 4,
            Opcode::Caf => 2,
            Opcode::Tcaf => 2,
            Opcode::Rand => 2,
            Opcode::Mask => 1,
            Opcode::Read => 2,
            Opcode::Write => 2,
            Opcode::Noop => 1,
            Opcode::Inot | Opcode::Inotr => 1,
        }
    }

    pub fn operand(self) -> Operand {
        match self {
            Opcode::Extend
            | Opcode::Aug
            | Opcode::Relint
            | Opcode::Inhint
            | Opcode::Resume
            | Opcode::Noop
            | Opcode::Inot
            | Opcode::Inotr => Operand::None,
            _ => Operand::Required,
        }
    }

    /// True for opcodes that set `Z` themselves and must not also be
    /// advanced by the post-increment step (spec.md §9, resolved per the
    /// real-AGC convention rather than the double-incrementing source).
    pub fn is_branch(self) -> bool {
        matches!(self, Opcode::Tc | Opcode::Index | Opcode::Bzf | Opcode::Bzm | Opcode::Tcaf)
    }

    /// Basic-mode encoding: opcode 0 is the TC-class group, further split by
    /// a 2-bit subcode (bits 11..10 of the word) since the real table packs
    /// more mnemonics under it than the bare 3-bit field has room for.
    /// Opcodes 1..7 are the remaining seven "basic" memory-reference
    /// instructions, assigned in the order spec.md §4.8 lists them.
    pub fn basic_code(self) -> Option<(u8, Option<u8>)> {
        match self {
            Opcode::Tc => Some((0, Some(0))),
            Opcode::Extend => Some((0, Some(1))),
            Opcode::Relint => Some((0, Some(2))),
            Opcode::Inhint => Some((0, Some(3))),
            Opcode::Ccs => Some((1, None)),
            Opcode::Index => Some((2, None)),
            Opcode::Xch => Some((3, None)),
            Opcode::Ca => Some((4, None)),
            Opcode::Cs => Some((5, None)),
            Opcode::Ts => Some((6, None)),
            Opcode::Ad => Some((7, None)),
            _ => None,
        }
    }

    /// Extended-mode (6-bit field, but `decode.rs` only ever produces a
    /// 5-bit value since the field sits in the top 5 bits of a 15-bit word)
    /// encoding for every mnemonic not covered by `basic_code`, assigned
    /// sequentially in spec.md §4.8 table order. `Extend` is included here
    /// (reachable, index 31) so that a second `EXTEND` word fetched while
    /// `extended_mode` is already latched decodes back to `Extend` instead
    /// of falling off the end of the table — spec.md §8 P5 requires two
    /// successive `EXTEND`s to keep the mode latched. `Inot`/`Inotr` are
    /// pushed past the reachable range as a result; they are reserved,
    /// no-defined-effect tokens (spec.md §6) reachable only through the
    /// symbolic instruction interface, never through real fetch/decode.
    pub fn extended_code(self) -> Option<u8> {
        const ORDER: [Opcode; 34] = [
            Opcode::Msk, Opcode::Mp, Opcode::Dv, Opcode::Su, Opcode::Dca, Opcode::Dcs,
            Opcode::Dad, Opcode::Das, Opcode::Dsu, Opcode::Lxch, Opcode::Qxch, Opcode::Incr,
            Opcode::Aug, Opcode::Dim, Opcode::Bzf, Opcode::Bzm, Opcode::Edrupt, Opcode::Resume,
            Opcode::Cyr, Opcode::Sr, Opcode::Sl, Opcode::Pinc, Opcode::Minc, Opcode::Dxch,
            Opcode::Caf, Opcode::Tcaf, Opcode::Rand, Opcode::Mask, Opcode::Read, Opcode::Write,
            Opcode::Noop, Opcode::Extend, Opcode::Inot, Opcode::Inotr,
        ];
        ORDER.iter().position(|&op| op == self).map(|i| i as u8)
    }

    pub fn from_basic(opcode: u8, subcode: u8) -> Option<Opcode> {
        match opcode {
            0 => match subcode {
                0 => Some(Opcode::Tc),
                1 => Some(Opcode::Extend),
                2 => Some(Opcode::Relint),
                3 => Some(Opcode::Inhint),
                _ => None,
            },
            1 => Some(Opcode::Ccs),
            2 => Some(Opcode::Index),
            3 => Some(Opcode::Xch),
            4 => Some(Opcode::Ca),
            5 => Some(Opcode::Cs),
            6 => Some(Opcode::Ts),
            7 => Some(Opcode::Ad),
            _ => None,
        }
    }

    pub fn from_extended(opcode: u8) -> Option<Opcode> {
        const ORDER: [Opcode; 34] = [
            Opcode::Msk, Opcode::Mp, Opcode::Dv, Opcode::Su, Opcode::Dca, Opcode::Dcs,
            Opcode::Dad, Opcode::Das, Opcode::Dsu, Opcode::Lxch, Opcode::Qxch, Opcode::Incr,
            Opcode::Aug, Opcode::Dim, Opcode::Bzf, Opcode::Bzm, Opcode::Edrupt, Opcode::Resume,
            Opcode::Cyr, Opcode::Sr, Opcode::Sl, Opcode::Pinc, Opcode::Minc, Opcode::Dxch,
            Opcode::Caf, Opcode::Tcaf, Opcode::Rand, Opcode::Mask, Opcode::Read, Opcode::Write,
            Opcode::Noop, Opcode::Extend, Opcode::Inot, Opcode::Inotr,
        ];
        ORDER.get(opcode as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mnemonic_round_trips_through_from_mnemonic() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_mnemonic(op.mnemonic()).unwrap(), op);
        }
    }

    #[test]
    fn unknown_mnemonic_is_an_error() {
        assert_eq!(Opcode::from_mnemonic("BOGUS"), Err(AgcError::UnknownMnemonic("BOGUS".to_string())));
    }

    #[test]
    fn basic_and_extended_codes_round_trip() {
        for op in Opcode::ALL {
            if let Some((code, subcode)) = op.basic_code() {
                assert_eq!(Opcode::from_basic(code, subcode.unwrap_or(0)), Some(op));
            } else if let Some(code) = op.extended_code() {
                assert_eq!(Opcode::from_extended(code), Some(op));
            } else {
                panic!("{:?} has neither a basic nor an extended encoding", op);
            }
        }
    }

    #[test]
    fn extend_has_a_reachable_extended_mode_encoding() {
        // decode.rs's extended-mode opcode field is only ever 0..=31 (it sits
        // in bits 14..10 of a 15-bit word), so a second EXTEND word fetched
        // while extended_mode is already latched must decode back to
        // Opcode::Extend through from_extended for spec.md §8 P5 to hold.
        let code = Opcode::Extend.extended_code().expect("EXTEND must have an extended-mode slot");
        assert!(code <= 31, "extended-mode opcode field can only ever be 0..=31, got {code}");
        assert_eq!(Opcode::from_extended(code), Some(Opcode::Extend));
    }
}
