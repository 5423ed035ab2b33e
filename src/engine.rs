// The machine itself: registers, the owned component set, and the
// fetch/decode/dispatch loop. Grounded on the teacher's `CPU` struct in
// processor.rs (owned `Bus`, clock_cycle dispatch, serve_interrupt_requests
// called after the opcode body) and its `Instruction::execute` match, with
// every opcode body implemented per spec.md §4.8 rather than left as the
// teacher's empty stubs.

use crate::decode;
use crate::dsky::Dsky;
use crate::error::AgcError;
use crate::interrupts::{InterruptKind, Interrupts};
use crate::io::{ChannelEvent, IoChannels};
use crate::memory::Memory;
use crate::opcode::{Opcode, Operand};
use crate::timers::Timers;
use crate::word::Word;
use log::{debug, trace};

pub struct Agc {
    pub memory: Memory,
    pub io: IoChannels,
    pub interrupts: Interrupts,
    pub timers: Timers,
    pub dsky: Dsky,

    pub a: Word,
    pub l: Word,
    pub q: Word,
    pub z: Word,
    pub eb: u8,
    pub fb: u8,

    pub extended_mode: bool,
    pub cycle_count: u64,
    /// Latched when a TC jumps to its own address (spec.md §4.8/§7).
    pub tc_trap: bool,
}

impl Agc {
    pub fn new() -> Self {
        Self {
            memory: Memory::new(),
            io: IoChannels::new(),
            interrupts: Interrupts::new(),
            timers: Timers::new(),
            dsky: Dsky::new(),
            a: Word::ZERO,
            l: Word::ZERO,
            q: Word::ZERO,
            z: Word::ZERO,
            eb: 0,
            fb: 0,
            extended_mode: false,
            cycle_count: 0,
            tc_trap: false,
        }
    }

    pub fn bb(&self) -> u8 {
        (self.fb << 3) | self.eb
    }

    /// Advances the wall-clock-driven timer block and feeds any resulting
    /// overflow into the interrupt controller. Not itself an instruction;
    /// callers (the CLI loop, tests) drive this alongside `clock_cycle`.
    pub fn tick_timers(&mut self, mcts: u32) {
        for kind in self.timers.tick_mcts(mcts) {
            self.interrupts.trigger(kind);
        }
    }

    /// Fetches the word at `Z` in the current fixed bank, decodes, dispatches,
    /// and runs the post-instruction sequencing of spec.md §4.8.
    pub fn clock_cycle(&mut self) -> Result<(), AgcError> {
        let word = self.memory.read_fixed(self.fb, self.z.raw() as usize);
        let decoded = decode::decode(word, self.extended_mode);
        let (opcode, operand) = self.resolve(decoded);
        self.run(opcode, operand)
    }

    /// The symbolic instruction interface (spec.md §6): `(mnemonic, operand)`.
    pub fn execute_symbolic(&mut self, mnemonic: &str, operand: Option<Word>) -> Result<(), AgcError> {
        let opcode = Opcode::from_mnemonic(mnemonic)?;
        self.run(opcode, operand)
    }

    fn run(&mut self, opcode: Opcode, operand: Option<Word>) -> Result<(), AgcError> {
        if matches!(opcode, Opcode::Inot | Opcode::Inotr) {
            return Err(AgcError::UnimplementedOpcode(opcode.mnemonic().to_string()));
        }
        if opcode.operand() == Operand::Required && operand.is_none() {
            return Err(AgcError::MissingOperand(opcode.mnemonic().to_string()));
        }
        debug!("dispatch {} operand={:?}", opcode.mnemonic(), operand);
        self.dispatch(opcode, operand);
        self.post_instruction(opcode);
        Ok(())
    }

    /// Splits a decoded (opcode-field, address-field) pair into the `Opcode`
    /// and its operand, handling the basic-mode opcode-0 subcode split
    /// (spec.md §4.7: "bits 11..10 form a subcode selecting among TC-class
    /// operations"). `Opcode::from_basic`/`from_extended` are exhaustive over
    /// every bit pattern `decode::decode` can ever produce (3-bit basic
    /// opcode/2-bit TC-class subcode, and the 5-bit value the extended-mode
    /// opcode field actually carries), so this never fails to resolve.
    fn resolve(&self, decoded: decode::Decoded) -> (Opcode, Option<Word>) {
        if self.extended_mode {
            let opcode = Opcode::from_extended(decoded.opcode)
                .expect("from_extended is exhaustive over every 5-bit decode value");
            (opcode, Some(Word::new(decoded.address)))
        } else if decoded.opcode == 0 {
            let subcode = ((decoded.address >> 10) & 0b11) as u8;
            let address = decoded.address & 0x3ff;
            let opcode = Opcode::from_basic(0, subcode)
                .expect("from_basic(0, _) is exhaustive over every 2-bit subcode");
            (opcode, Some(Word::new(address)))
        } else {
            let opcode = Opcode::from_basic(decoded.opcode, 0)
                .expect("from_basic is exhaustive over every 3-bit basic opcode");
            (opcode, Some(Word::new(decoded.address)))
        }
    }

    fn post_instruction(&mut self, opcode: Opcode) {
        if !opcode.is_branch() {
            self.z = self.z.incremented();
        }
        if self.extended_mode && opcode != Opcode::Extend {
            self.extended_mode = false;
        }
        if let Some(vector) = self.interrupts.process(self.z) {
            trace!("vectoring to {}", vector);
            self.z = vector;
        }
        self.cycle_count += opcode.cycles() as u64;
    }

    fn apply_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::None => {}
            ChannelEvent::Uprupt => self.interrupts.trigger(InterruptKind::UpRupt),
            ChannelEvent::Downrupt => self.interrupts.trigger(InterruptKind::DownRupt),
            ChannelEvent::BankSwitch { eb, fb } => {
                trace!("bank switch eb={} fb={}", eb, fb);
                self.eb = eb;
                self.fb = fb;
            }
        }
    }

    fn dispatch(&mut self, opcode: Opcode, operand: Option<Word>) {
        let address = operand.map(|w| w.raw() as usize).unwrap_or(0);

        match opcode {
            Opcode::Tc => {
                if self.z == Word::new(address as u16) {
                    self.tc_trap = true;
                }
                self.z = Word::new(address as u16);
            }
            Opcode::Ccs => {
                let v = self.memory.read_erasable(self.eb, address);
                if v.is_zero() {
                    self.z = self.z.incremented();
                } else if !v.is_negative() {
                    self.a = self.a.complement().normalize();
                } else {
                    self.a = Word::new(self.a.raw() & !crate::word::SIGN_BIT);
                }
            }
            Opcode::Index => {
                self.z = self.memory.read_erasable(self.eb, address);
            }
            Opcode::Xch => {
                let v = self.memory.read_erasable(self.eb, address);
                self.memory.write_erasable(self.eb, address, self.a);
                self.a = v;
            }
            Opcode::Ca => {
                self.a = self.memory.read_erasable(self.eb, address);
            }
            Opcode::Cs => {
                self.a = self.memory.read_erasable(self.eb, address).complement().normalize();
            }
            Opcode::Ts => {
                self.memory.write_erasable(self.eb, address, self.a);
                self.a = Word::ZERO;
            }
            Opcode::Ad => {
                self.a = self.a.add(self.memory.read_erasable(self.eb, address));
            }
            Opcode::Msk | Opcode::Mask => {
                self.a = self.a & Word::new(address as u16);
            }
            Opcode::Extend => {
                self.extended_mode = true;
            }
            Opcode::Mp => {
                let multiplier = self.memory.read_erasable(self.eb, address);
                let product = self.a.raw() as u32 * multiplier.raw() as u32;
                self.l = Word::new(((product >> 15) & 0x7fff) as u16);
                self.a = Word::new((product & 0x7fff) as u16);
            }
            Opcode::Dv => {
                let dividend = ((self.l.raw() as u32) << 15) | self.a.raw() as u32;
                let divisor = self.memory.read_erasable(self.eb, address);
                if divisor.is_zero() {
                    self.a = Word::ZERO;
                    self.l = Word::ZERO;
                    self.interrupts.trigger(InterruptKind::DsRupt);
                } else {
                    let d = divisor.raw() as u32;
                    self.a = Word::new((dividend / d) as u16);
                    self.l = Word::new((dividend % d) as u16);
                }
            }
            Opcode::Su => {
                self.a = self.a.sub(self.memory.read_erasable(self.eb, address));
            }
            Opcode::Dca => {
                self.a = self.memory.read_erasable(self.eb, address);
                self.l = self.memory.read_erasable(self.eb, (address + 1) % crate::memory::ERASABLE_WORDS);
            }
            Opcode::Dcs => {
                self.a = self.memory.read_erasable(self.eb, address).complement().normalize();
                self.l = self
                    .memory
                    .read_erasable(self.eb, (address + 1) % crate::memory::ERASABLE_WORDS)
                    .complement()
                    .normalize();
            }
            Opcode::Dad => {
                let m_high = self.memory.read_erasable(self.eb, address);
                let m_low = self.memory.read_erasable(self.eb, (address + 1) % crate::memory::ERASABLE_WORDS);
                let (high, low) = double_add(self.a, self.l, m_high, m_low);
                self.a = high;
                self.l = low;
            }
            Opcode::Das => {
                let m_high = self.memory.read_erasable(self.eb, address);
                let m_low = self.memory.read_erasable(self.eb, (address + 1) % crate::memory::ERASABLE_WORDS);
                let (high, low) = double_add(self.a, self.l, m_high, m_low);
                self.memory.write_erasable(self.eb, address, high);
                self.memory.write_erasable(self.eb, (address + 1) % crate::memory::ERASABLE_WORDS, low);
            }
            Opcode::Dsu => {
                let m_high = self.memory.read_erasable(self.eb, address);
                let m_low = self.memory.read_erasable(self.eb, (address + 1) % crate::memory::ERASABLE_WORDS);
                let (high, low) = double_sub(self.a, self.l, m_high, m_low);
                self.a = high;
                self.l = low;
            }
            Opcode::Lxch => {
                let v = self.memory.read_erasable(self.eb, address);
                self.memory.write_erasable(self.eb, address, self.l);
                self.l = v;
            }
            Opcode::Qxch => {
                let v = self.memory.read_erasable(self.eb, address);
                self.memory.write_erasable(self.eb, address, self.q);
                self.q = v;
            }
            Opcode::Incr => {
                let v = self.memory.read_erasable(self.eb, address);
                self.memory.write_erasable(self.eb, address, v.incremented());
            }
            Opcode::Aug => {
                self.a = self.a.incremented();
            }
            Opcode::Dim => {
                let v = self.memory.read_erasable(self.eb, address);
                let updated = if v.sign() > 0 { v.sub(Word::new(1)) } else { v.add(Word::new(1)) };
                self.memory.write_erasable(self.eb, address, updated);
            }
            Opcode::Bzf => {
                if !self.a.is_negative() {
                    self.z = Word::new(address as u16);
                } else {
                    self.z = self.z.incremented();
                }
            }
            Opcode::Bzm => {
                if self.a.is_negative() {
                    self.z = Word::new(address as u16);
                } else {
                    self.z = self.z.incremented();
                }
            }
            Opcode::Relint => self.interrupts.relint(),
            Opcode::Inhint => self.interrupts.inhint(),
            Opcode::Edrupt => self.interrupts.edrupt(Word::new(address as u16)),
            Opcode::Resume => {
                self.z = self.interrupts.resume();
            }
            Opcode::Cyr => {
                let v = self.memory.read_erasable(self.eb, address);
                let raw = v.raw();
                let rotated = ((raw >> 1) | ((raw & 1) << 14)) & crate::word::MASK;
                self.memory.write_erasable(self.eb, address, Word::new(rotated));
            }
            Opcode::Sr => {
                let v = self.memory.read_erasable(self.eb, address);
                self.memory.write_erasable(self.eb, address, Word::new((v.raw() >> 1) & crate::word::MASK));
            }
            Opcode::Sl => {
                let v = self.memory.read_erasable(self.eb, address);
                self.memory.write_erasable(self.eb, address, Word::new((v.raw() << 1) & crate::word::MASK));
            }
            Opcode::Pinc => {
                let v = self.memory.read_erasable(self.eb, address);
                if !v.is_negative() {
                    self.memory.write_erasable(self.eb, address, v.incremented());
                }
            }
            Opcode::Minc => {
                let v = self.memory.read_erasable(self.eb, address);
                if v.is_negative() {
                    self.memory.write_erasable(self.eb, address, v.incremented());
                }
            }
            Opcode::Dxch => {
                let m_high = self.memory.read_erasable(self.eb, address);
                let m_low = self.memory.read_erasable(self.eb, (address + 1) % crate::memory::ERASABLE_WORDS);
                self.memory.write_erasable(self.eb, address, self.a);
                self.memory.write_erasable(self.eb, (address + 1) % crate::memory::ERASABLE_WORDS, self.l);
                self.a = m_high;
                self.l = m_low;
            }
            Opcode::Caf => {
                self.a = self.memory.read_fixed(self.fb, address);
            }
            Opcode::Tcaf => {
                self.a = self.memory.read_fixed(self.fb, address);
                self.z = Word::new(address as u16);
            }
            Opcode::Rand => {
                if let Some(v) = self.io.take(address) {
                    self.a = v;
                }
            }
            Opcode::Read => {
                let (value, event) = self.io.read(address, &self.dsky);
                if let Some(v) = value {
                    self.a = v;
                }
                self.apply_channel_event(event);
            }
            Opcode::Write => {
                let event = self.io.write(address, self.a, &mut self.dsky);
                self.apply_channel_event(event);
            }
            Opcode::Noop => {}
            Opcode::Inot | Opcode::Inotr => unreachable!("filtered out in run()"),
        }
    }
}

impl Default for Agc {
    fn default() -> Self {
        Self::new()
    }
}

/// Double-precision add of the `(high,low)` pair against `(m_high,m_low)`.
/// Each word still folds its own end-around carry via `Word::add`; the extra
/// bit carried from the low-word's native (pre-normalized) sum propagates
/// into the high word as a separate `+1`, per spec.md §4.8's "carry derived
/// from the pre-normalized native sum of the low words".
fn double_add(a_high: Word, a_low: Word, m_high: Word, m_low: Word) -> (Word, Word) {
    let low_native = a_low.raw() as u32 + m_low.raw() as u32;
    let carry = if low_native > 0x7fff { 1u16 } else { 0u16 };
    let low = Word::new((low_native & 0x7fff) as u16);
    let high = a_high.add(m_high).add(Word::new(carry));
    (high, low)
}

fn double_sub(a_high: Word, a_low: Word, m_high: Word, m_low: Word) -> (Word, Word) {
    let diff = a_low.raw() as i32 - m_low.raw() as i32;
    let (low_raw, borrow) = if diff < 0 { ((diff + 0x8000) as u16, 1u16) } else { (diff as u16, 0u16) };
    let low = Word::new(low_raw);
    let high = a_high.sub(m_high).sub(Word::new(borrow));
    (high, low)
}
