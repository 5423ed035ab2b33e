// `agc-console`: loads a binary core-rope image, steps the machine, and
// renders CPU + DSKY state. Grounded on the teacher's `main.rs` single-step
// `pause()` loop and `impl fmt::Display for CPU` box-drawing panel
// (`termion::cursor`/`color`), generalized from the 68k register file to the
// AGC's A/L/Q/Z/EB/FB/BB registers and DSKY display rows.

use agc_core::config::Config;
use agc_core::loader;
use agc_core::Agc;
use std::fmt;
use std::fs;
use std::io::{stdin, stdout, Read, Write};
use std::process::ExitCode;
use termion::{color, cursor};

#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[derive(Debug, Clone, Default)]
struct CliConfig {
    #[cfg_attr(feature = "serde", serde(default))]
    machine: Config,
}

fn pause() {
    let mut out = stdout();
    let _ = out.write_all(b"Press Enter to step, CTRL+C to quit...");
    let _ = out.flush();
    let _ = stdin().read(&mut [0]);
}

struct Panel<'a>(&'a Agc);

impl fmt::Display for Panel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let agc = self.0;
        writeln!(f, "{}{}AGC{}", cursor::Goto(1, 1), color::Fg(color::Cyan), color::Fg(color::Reset))?;
        writeln!(f, "A={} L={} Q={} Z={}", agc.a, agc.l, agc.q, agc.z)?;
        writeln!(f, "EB={:o} FB={:o} BB={:o} ext={}", agc.eb, agc.fb, agc.bb(), agc.extended_mode)?;
        writeln!(
            f,
            "faults: parity={} tc_trap={} rupt_lock={}",
            agc.memory.parity_fail(),
            agc.tc_trap,
            agc.interrupts.rupt_lock
        )?;
        writeln!(f, "DSKY verb={:02} noun={:02} {}", agc.dsky.verb(), agc.dsky.noun(), agc.dsky.display()[0])?;
        writeln!(f, "cycles={}", agc.cycle_count)
    }
}

fn load_config(path: Option<&str>) -> CliConfig {
    let Some(path) = path else {
        return CliConfig::default();
    };
    match fs::read_to_string(path) {
        Ok(_text) => {
            #[cfg(feature = "serde")]
            {
                toml::from_str(&_text).unwrap_or_else(|err| {
                    log::warn!("failed to parse {}: {}, using defaults", path, err);
                    CliConfig::default()
                })
            }
            #[cfg(not(feature = "serde"))]
            {
                log::warn!("config file given but the `serde` feature is off; using defaults");
                CliConfig::default()
            }
        }
        Err(err) => {
            log::warn!("could not read config {}: {}, using defaults", path, err);
            CliConfig::default()
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let rope_path = match args.next() {
        Some(path) => path,
        None => {
            eprintln!("usage: agc-console <rope.bin> [--debug] [--config FILE]");
            return ExitCode::FAILURE;
        }
    };
    let mut debug = false;
    let mut config_path = None;
    let mut rest = args;
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--debug" => debug = true,
            "--config" => config_path = rest.next(),
            other => log::warn!("ignoring unrecognized argument: {}", other),
        }
    }

    let config = load_config(config_path.as_deref());
    let bytes = match fs::read(&rope_path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("could not read {}: {}", rope_path, err);
            return ExitCode::FAILURE;
        }
    };

    let mut agc = Agc::new();
    agc.eb = config.machine.initial_eb;
    agc.fb = config.machine.initial_fb;
    agc.dsky.set_mode(match config.machine.dsky_mode {
        agc_core::config::DskyModeConfig::Dec => "DEC",
        agc_core::config::DskyModeConfig::Oct => "OCT",
    });

    if let Err(err) = loader::load_core_rope(&bytes, config.machine.initial_fb, &mut agc.memory) {
        eprintln!("failed to load {}: {}", rope_path, err);
        return ExitCode::FAILURE;
    }

    loop {
        if let Err(err) = agc.clock_cycle() {
            log::warn!("halting: {}", err);
            break;
        }
        agc.tick_timers(1);
        if debug {
            print!("{}{}", termion::clear::All, Panel(&agc));
            pause();
        }
        if agc.interrupts.rupt_lock {
            log::warn!("rupt_lock latched, halting");
            break;
        }
    }
    ExitCode::SUCCESS
}
