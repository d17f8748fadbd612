//! The interactive debugger shell.
//!
//! Unwinds the command loop's three non-error outcomes (quit, interrupt,
//! breakpoint) as an ordinary return value, [`DebugSignal`], the same way
//! [`crate::vm::StepResult`] reports the VM's own step outcomes.

mod commands;

use std::collections::BTreeSet;
use std::io::{self, Write};

use crate::constants::{MAX_ADDRESS, Word};
use crate::disasm::disassemble;
use crate::error::Result;
use crate::io_channel::{IoChannel, StdinChannel};
use crate::vm::{StepResult, Vm};

use commands::command_table;

/// Non-error reasons the command loop unwound back to the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSignal {
    /// The `quit` command was run.
    Quit,
    /// A running program hit the interrupt condition.
    Interrupted,
    /// A running program's PC landed on an active breakpoint.
    BreakpointHit,
}

/// Owns the VM and the debugger's own state (breakpoints, I/O channel) and
/// drives the `VM> ` command loop.
pub struct Debugger<C: IoChannel = StdinChannel> {
    pub(crate) vm: Vm,
    pub(crate) breakpoints: BTreeSet<Word>,
    pub(crate) io: C,
}

impl Debugger<StdinChannel> {
    pub fn new() -> Self {
        Self::with_io(StdinChannel::with_escape_char(
            StdinChannel::DEFAULT_ESCAPE_CHAR,
        ))
    }
}

impl Default for Debugger<StdinChannel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: IoChannel> Debugger<C> {
    pub fn with_io(io: C) -> Self {
        Self {
            vm: Vm::new(),
            breakpoints: BTreeSet::new(),
            io,
        }
    }

    /// Steps the VM up to `max_steps` times (or forever, if `None`),
    /// stopping early on halt, breakpoint, or interrupt. Mirrors the
    /// `while (ops-- && m_vm.step())` loop shared by `cmdStep`/`cmdRun`,
    /// minus the exception unwinding.
    pub(crate) fn step_loop(&mut self, max_steps: Option<usize>) -> Result<Option<DebugSignal>> {
        let mut remaining = max_steps;
        loop {
            if remaining == Some(0) {
                return Ok(None);
            }
            match self.vm.step(&mut self.io)? {
                StepResult::Halted => return Ok(None),
                StepResult::Interrupted => return Ok(Some(DebugSignal::Interrupted)),
                StepResult::Continue => {}
            }
            if self.breakpoints.contains(&self.vm.pc()) {
                return Ok(Some(DebugSignal::BreakpointHit));
            }
            if let Some(n) = remaining.as_mut() {
                *n -= 1;
            }
        }
    }

    /// Prints `<addr as hex4>: <disassembly>` and returns the next address.
    pub(crate) fn print_disassembly(&self, addr: Word) -> Word {
        let (text, next) = disassemble(&self.vm.memory, addr);
        println!("{addr:04x}: {text}");
        next
    }

    /// Runs the `VM> ` command loop until `quit` or end-of-input on the
    /// prompt line itself.
    pub fn run_shell(&mut self) {
        println!("Synacor VM interactive debugger\n");
        println!("For a list of commands, type 'help'.");
        println!("To interrupt the VM when running, type '#' when the program requests input.\n");

        let table = command_table::<C>();
        let mut line = String::new();

        loop {
            print!("VM> ");
            let _ = io::stdout().flush();
            line.clear();
            if io::stdin().read_line(&mut line).unwrap_or(0) == 0 {
                println!();
                break;
            }

            let args: Vec<String> = line.split_whitespace().map(str::to_owned).collect();
            let Some(name) = args.first() else { continue };

            match table.iter().find(|c| c.name == name.as_str()) {
                None => println!("Unknown command '{name}'"),
                Some(command) => match (command.handler)(self, &args) {
                    Ok(None) => {}
                    Ok(Some(DebugSignal::Quit)) => break,
                    Ok(Some(DebugSignal::Interrupted)) => {
                        print!("VM Interrupted at ");
                        self.print_disassembly(self.vm.pc());
                    }
                    Ok(Some(DebugSignal::BreakpointHit)) => {
                        print!("Breakpoint hit at ");
                        self.print_disassembly(self.vm.pc());
                    }
                    Err(e) => println!("Error: {e}"),
                },
            }
        }
    }
}

/// Clamps a disassembly/dump range the way `cmdDumpAsm`/`cmdDump` do: both
/// endpoints capped at memory size, swapped if given backwards.
pub(crate) fn clamp_range(start: Word, end: Word) -> (Word, Word) {
    let cap = MAX_ADDRESS.wrapping_add(1); // 32768, fits in Word
    let start = start.min(cap);
    let end = end.min(cap);
    if start > end { (end, start) } else { (start, end) }
}
