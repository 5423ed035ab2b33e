// The one synchronous error surface the simulator has: a programmer error
// on the symbolic instruction interface (spec.md §6/§7). The three fault
// latches (parity_fail, tc_trap, rupt_lock) stay observable, non-aborting
// state on `Agc` per spec.md §7 and are deliberately not folded in here.
//
// The teacher itself has no `Result`-based error type (it panics/unwraps at
// its own boundary, e.g. `fs::read(...).expect(...)` in lib.rs); this is the
// one place this crate upgrades past the teacher's own practice, because
// spec.md explicitly calls for a programmer-error *signal* rather than a
// panic.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AgcError {
    #[error("unknown mnemonic: {0}")]
    UnknownMnemonic(String),
    #[error("symbolic instruction {0} requires an address/operand")]
    MissingOperand(String),
    #[error("program image too large for one fixed bank ({0} words)")]
    ImageTooLarge(usize),
    #[error("{0} decodes but has no defined effect (reserved opcode space)")]
    UnimplementedOpcode(String),
}
