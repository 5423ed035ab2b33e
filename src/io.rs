// The 33-channel I/O file. Grounded on the teacher's `devices.rs` `Device`
// trait (`read`/`write` with side effects on the surrounding machine state),
// narrowed from a byte-addressed memory bus to the AGC's fixed 33-slot
// channel file and its handful of special channels.

use crate::dsky::Dsky;
use crate::word::Word;

pub const NUM_CHANNELS: usize = 33;

pub const CHANNEL_DSKY_VERB: usize = 10;
pub const CHANNEL_DSKY_NOUN: usize = 11;
pub const CHANNEL_BANK_CONTROL: usize = 12;
pub const CHANNEL_UPLINK: usize = 30;
pub const CHANNEL_DOWNLINK: usize = 31;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    None,
    Uprupt,
    Downrupt,
    BankSwitch { eb: u8, fb: u8 },
}

pub struct IoChannels {
    channels: [Word; NUM_CHANNELS],
}

impl IoChannels {
    pub fn new() -> Self {
        Self { channels: [Word::ZERO; NUM_CHANNELS] }
    }

    /// `ReadChannel(i)`: returns `None` for an out-of-range index (the
    /// "absent" sentinel), otherwise the channel's word plus any interrupt
    /// the read side effect raises.
    pub fn read(&self, i: usize, dsky: &Dsky) -> (Option<Word>, ChannelEvent) {
        if i >= NUM_CHANNELS {
            return (None, ChannelEvent::None);
        }
        match i {
            CHANNEL_DSKY_VERB => (Some(Word::new(dsky.verb() as u16)), ChannelEvent::None),
            CHANNEL_DSKY_NOUN => (Some(Word::new(dsky.noun() as u16)), ChannelEvent::None),
            CHANNEL_UPLINK => (Some(self.channels[i]), ChannelEvent::Uprupt),
            CHANNEL_DOWNLINK => (Some(self.channels[i]), ChannelEvent::Downrupt),
            _ => (Some(self.channels[i]), ChannelEvent::None),
        }
    }

    /// `WriteChannel(i, v)`: stores `v & 0x7FFF`. Channel 12 additionally
    /// decomposes into an EB/FB bank-switch event for the caller to apply.
    /// Out-of-range indices are silently ignored.
    pub fn write(&mut self, i: usize, v: Word, dsky: &mut Dsky) -> ChannelEvent {
        if i >= NUM_CHANNELS {
            return ChannelEvent::None;
        }
        self.channels[i] = v;
        match i {
            CHANNEL_DSKY_VERB => {
                dsky.set_verb_noun_raw(v.raw() as u8 & 0x7f, dsky.noun());
                ChannelEvent::None
            }
            CHANNEL_DSKY_NOUN => {
                dsky.set_verb_noun_raw(dsky.verb(), v.raw() as u8 & 0x7f);
                ChannelEvent::None
            }
            CHANNEL_BANK_CONTROL => {
                let raw = v.raw();
                let eb = ((raw >> 3) & 0o7) as u8;
                let fb = ((raw >> 9) & 0o37) as u8;
                ChannelEvent::BankSwitch { eb, fb }
            }
            _ => ChannelEvent::None,
        }
    }

    /// `RAND`-style read-and-clear, used by the RAND opcode.
    pub fn take(&mut self, i: usize) -> Option<Word> {
        if i >= NUM_CHANNELS {
            return None;
        }
        let value = self.channels[i];
        self.channels[i] = Word::ZERO;
        Some(value)
    }

    pub fn raw(&self, i: usize) -> Option<Word> {
        self.channels.get(i).copied()
    }
}

impl Default for IoChannels {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_12_write_decomposes_bank_registers() {
        let mut io = IoChannels::new();
        let mut dsky = Dsky::new();
        let event = io.write(CHANNEL_BANK_CONTROL, Word::new(0o7070), &mut dsky);
        assert_eq!(event, ChannelEvent::BankSwitch { eb: 7, fb: 7 });
    }

    #[test]
    fn channel_10_and_11_alias_dsky_verb_noun() {
        let mut io = IoChannels::new();
        let mut dsky = Dsky::new();
        io.write(CHANNEL_DSKY_VERB, Word::new(16), &mut dsky);
        assert_eq!(dsky.verb(), 16);
        let (value, _) = io.read(CHANNEL_DSKY_VERB, &dsky);
        assert_eq!(value, Some(Word::new(16)));
    }

    #[test]
    fn channel_30_and_31_raise_up_and_down_rupt_on_read() {
        let io = IoChannels::new();
        let dsky = Dsky::new();
        let (_, event) = io.read(CHANNEL_UPLINK, &dsky);
        assert_eq!(event, ChannelEvent::Uprupt);
        let (_, event) = io.read(CHANNEL_DOWNLINK, &dsky);
        assert_eq!(event, ChannelEvent::Downrupt);
    }

    #[test]
    fn out_of_range_index_is_absent_on_read_and_ignored_on_write() {
        let mut io = IoChannels::new();
        let mut dsky = Dsky::new();
        let (value, event) = io.read(99, &dsky);
        assert_eq!(value, None);
        assert_eq!(event, ChannelEvent::None);
        assert_eq!(io.write(99, Word::new(5), &mut dsky), ChannelEvent::None);
    }
}
