//! The debugger's 16 commands.
//!
//! Each handler gets the full whitespace-split argument list with `args[0]`
//! holding the command's own name; `help`, in particular, leans on that
//! to look itself up in the table.

use std::fs::File;
use std::io::Write as _;

use super::{DebugSignal, Debugger, clamp_range};
use crate::constants::{MAX_ADDRESS, VALUE_MASK, Word};
use crate::error::{Result, VmError};
use crate::io_channel::IoChannel;

type Handler<C> = fn(&mut Debugger<C>, &[String]) -> Result<Option<DebugSignal>>;

pub struct CommandSpec<C: IoChannel> {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    pub handler: Handler<C>,
}

/// The command table, alphabetical by name, matching the iteration order
/// of a sorted-by-name command map.
pub fn command_table<C: IoChannel>() -> Vec<CommandSpec<C>> {
    vec![
        CommandSpec { name: "break", usage: "break [<address>]", description: "Adds a breakpoint at <address>, or lists all active breakpoints.", handler: cmd_break },
        CommandSpec { name: "clear", usage: "clear", description: "Clears the VM, wiping all memory.", handler: cmd_clear },
        CommandSpec { name: "dis", usage: "dis <address> [<count>]", description: "Disassembles one or <count> instructions, starting at <address>.", handler: cmd_dis },
        CommandSpec { name: "dump", usage: "dump <filename> [<start>] [<end>]", description: "Dumps the binary to <filename>. Optionally starting and ending at <start> and <end>.", handler: cmd_dump },
        CommandSpec { name: "dumpasm", usage: "dumpasm <filename> [<start>] [<end>]", description: "Dumps the disassembly to <filename>. Optionally starting and ending at <start> and <end>.", handler: cmd_dumpasm },
        CommandSpec { name: "help", usage: "help [<command>]", description: "Lists all commands, or shows description of <command>.", handler: cmd_help },
        CommandSpec { name: "load", usage: "load <filename>", description: "Loads the binary <filename> at address 0.", handler: cmd_load },
        CommandSpec { name: "mem", usage: "mem <address> [<value>]", description: "Shows the value of memory address <address>, or changes it to <value>.", handler: cmd_mem },
        CommandSpec { name: "pc", usage: "pc [<address>]", description: "Shows or changes the program counter to <address>.", handler: cmd_pc },
        CommandSpec { name: "quit", usage: "quit", description: "Quits the interactive debugger.", handler: cmd_quit },
        CommandSpec { name: "reg", usage: "reg [<id>] [<value>]", description: "Shows the value of <id> or all registers, or changes it to <value>.", handler: cmd_reg },
        CommandSpec { name: "reset", usage: "reset", description: "Resets the VM, clearing registers and stack, but leaves memory intact.", handler: cmd_reset },
        CommandSpec { name: "run", usage: "run", description: "Executes the program.", handler: cmd_run },
        CommandSpec { name: "stack", usage: "stack", description: "Shows the current stack.", handler: cmd_stack },
        CommandSpec { name: "step", usage: "step [<count>]", description: "Executes one or <count> instructions.", handler: cmd_step },
        CommandSpec { name: "unbreak", usage: "unbreak [<address>]", description: "Removes a breakpoint at <address>, or removes all active breakpoints.", handler: cmd_unbreak },
    ]
}

/// Parses `0x`-prefixed hex or plain decimal (radix auto-detect).
fn parse_auto(s: &str) -> Result<u32> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"));
    match digits {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    }
    .map_err(|_| VmError::BadArgument(format!("invalid number: {s}")))
}

/// Parses a bare hex string (no `0x` required), the radix every address
/// argument in the shell uses regardless of the auto-detect rule above.
fn parse_hex(s: &str) -> Result<u32> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    u32::from_str_radix(digits, 16).map_err(|_| VmError::BadArgument(format!("invalid address: {s}")))
}

fn cmd_quit<C: IoChannel>(_dbg: &mut Debugger<C>, _args: &[String]) -> Result<Option<DebugSignal>> {
    Ok(Some(DebugSignal::Quit))
}

fn cmd_help<C: IoChannel>(_dbg: &mut Debugger<C>, args: &[String]) -> Result<Option<DebugSignal>> {
    let table = command_table::<C>();
    if args.len() < 2 {
        println!("Available commands:");
        for command in &table {
            println!("{}", command.usage);
        }
    } else {
        match table.iter().find(|c| c.name == args[1].as_str()) {
            None => println!("Unknown command '{}'.", args[1]),
            Some(command) => {
                println!("{}", command.usage);
                println!("{}", command.description);
            }
        }
    }
    Ok(None)
}

fn cmd_clear<C: IoChannel>(dbg: &mut Debugger<C>, _args: &[String]) -> Result<Option<DebugSignal>> {
    dbg.vm.clear();
    println!("Virtual machine cleared.");
    Ok(None)
}

fn cmd_reset<C: IoChannel>(dbg: &mut Debugger<C>, _args: &[String]) -> Result<Option<DebugSignal>> {
    dbg.vm.reset();
    println!("Virtual machine reset.");
    Ok(None)
}

fn cmd_load<C: IoChannel>(dbg: &mut Debugger<C>, args: &[String]) -> Result<Option<DebugSignal>> {
    if args.len() < 2 {
        println!("Please specify a file name to load.");
        return Ok(None);
    }
    let end = dbg.vm.load_binary(&args[1])?;
    println!("Binary loaded into VM. (From 0x0 to 0x{:x})", end.wrapping_sub(1));
    Ok(None)
}

fn cmd_step<C: IoChannel>(dbg: &mut Debugger<C>, args: &[String]) -> Result<Option<DebugSignal>> {
    let ops = if args.len() >= 2 { parse_auto(&args[1])? as usize } else { 1 };
    match dbg.step_loop(Some(ops))? {
        None => {
            dbg.print_disassembly(dbg.vm.pc());
            Ok(None)
        }
        some => Ok(some),
    }
}

fn cmd_run<C: IoChannel>(dbg: &mut Debugger<C>, _args: &[String]) -> Result<Option<DebugSignal>> {
    dbg.step_loop(None)
}

fn cmd_reg<C: IoChannel>(dbg: &mut Debugger<C>, args: &[String]) -> Result<Option<DebugSignal>> {
    match args.len() {
        0 | 1 => {
            for (i, value) in dbg.vm.registers.iter() {
                println!("R{i} = 0x{value:x}");
            }
        }
        2 => {
            let reg_id = (parse_auto(&args[1])? & VALUE_MASK as u32) as Word;
            if reg_id > 7 {
                println!("Invalid register.");
            } else {
                println!("R{reg_id} = 0x{:x}", dbg.vm.registers.read(reg_id as u8)?);
            }
        }
        _ => {
            let reg_id = (parse_auto(&args[1])? & VALUE_MASK as u32) as Word;
            let value = parse_auto(&args[2])? as Word;
            if reg_id > 7 {
                println!("Invalid register.");
            } else {
                println!("R{reg_id} := 0x{:x}", value & VALUE_MASK);
                dbg.vm.registers.write_masked(reg_id as u8, value)?;
            }
        }
    }
    Ok(None)
}

fn cmd_mem<C: IoChannel>(dbg: &mut Debugger<C>, args: &[String]) -> Result<Option<DebugSignal>> {
    match args.len() {
        0 | 1 => println!("Missing address"),
        2 => {
            let addr = (parse_hex(&args[1])? & VALUE_MASK as u32) as Word;
            println!("M[0x{addr:x}] = 0x{:x}", dbg.vm.memory.read(addr)?);
        }
        _ => {
            let addr = (parse_hex(&args[1])? & VALUE_MASK as u32) as Word;
            let value = (parse_auto(&args[2])? & 0xFFFF) as Word;
            println!("M[0x{addr:x}] := 0x{value:x}");
            dbg.vm.memory.write(addr, value)?;
        }
    }
    Ok(None)
}

fn cmd_pc<C: IoChannel>(dbg: &mut Debugger<C>, args: &[String]) -> Result<Option<DebugSignal>> {
    if args.len() < 2 {
        println!("PC = 0x{:x}", dbg.vm.pc());
    } else {
        let addr = (parse_hex(&args[1])? & VALUE_MASK as u32) as Word;
        println!("PC := 0x{addr:x}");
        dbg.vm.set_pc(addr);
    }
    Ok(None)
}

fn cmd_dis<C: IoChannel>(dbg: &mut Debugger<C>, args: &[String]) -> Result<Option<DebugSignal>> {
    if args.len() < 2 {
        println!("Missing address");
        return Ok(None);
    }
    let mut ip = (parse_hex(&args[1])? & VALUE_MASK as u32) as Word;
    let mut count = if args.len() < 3 { 1 } else { parse_auto(&args[2])? };

    loop {
        ip = dbg.print_disassembly(ip);
        if ip > MAX_ADDRESS {
            break;
        }
        count = count.saturating_sub(1);
        if count == 0 {
            break;
        }
    }
    Ok(None)
}

fn cmd_break<C: IoChannel>(dbg: &mut Debugger<C>, args: &[String]) -> Result<Option<DebugSignal>> {
    if args.len() < 2 {
        if dbg.breakpoints.is_empty() {
            println!("No breakpoints");
        } else {
            println!("Breakpoints:");
            for ip in dbg.breakpoints.clone() {
                dbg.print_disassembly(ip);
            }
        }
    } else {
        let addr = (parse_hex(&args[1])? & VALUE_MASK as u32) as Word;
        dbg.breakpoints.insert(addr);
        print!("Added breakpoint at ");
        dbg.print_disassembly(addr);
    }
    Ok(None)
}

fn cmd_unbreak<C: IoChannel>(dbg: &mut Debugger<C>, args: &[String]) -> Result<Option<DebugSignal>> {
    if args.len() < 2 {
        dbg.breakpoints.clear();
        println!("Removed all breakpoints");
    } else {
        let addr = (parse_hex(&args[1])? & VALUE_MASK as u32) as Word;
        if dbg.breakpoints.remove(&addr) {
            println!("Removed breakpoint at {addr:x}");
        } else {
            println!("No breakpoint on address {addr:x}");
        }
    }
    Ok(None)
}

fn cmd_dumpasm<C: IoChannel>(dbg: &mut Debugger<C>, args: &[String]) -> Result<Option<DebugSignal>> {
    if args.len() < 2 {
        println!("Missing filename");
        return Ok(None);
    }
    let mut file = match File::create(&args[1]) {
        Ok(f) => f,
        Err(_) => {
            println!("Cannot open {} for writing", args[1]);
            return Ok(None);
        }
    };

    let raw_start = if args.len() < 3 { 0 } else { parse_hex(&args[2])? & 0xFFFF };
    let raw_end = if args.len() < 4 { 0x8000 } else { parse_hex(&args[3])? & 0xFFFF };
    let (start, end) = clamp_range(raw_start as Word, raw_end as Word);

    writeln!(file, "Synacor VM Disassembly\n")?;
    let mut ip = start;
    while ip < end {
        let (text, next) = crate::disasm::disassemble(&dbg.vm.memory, ip);
        writeln!(file, "{ip:04x}: {text}")?;
        ip = next;
    }

    println!("Disassembly dumped to {}", args[1]);
    Ok(None)
}

fn cmd_dump<C: IoChannel>(dbg: &mut Debugger<C>, args: &[String]) -> Result<Option<DebugSignal>> {
    if args.len() < 2 {
        println!("Missing filename");
        return Ok(None);
    }
    let mut file = match File::create(&args[1]) {
        Ok(f) => f,
        Err(_) => {
            println!("Cannot open {} for writing", args[1]);
            return Ok(None);
        }
    };

    let raw_start = if args.len() < 3 { 0 } else { parse_hex(&args[2])? & 0xFFFF };
    let raw_end = if args.len() < 4 { 0x8000 } else { parse_hex(&args[3])? & 0xFFFF };
    let (start, end) = clamp_range(raw_start as Word, raw_end as Word);

    for addr in start..end {
        let value = dbg.vm.memory.read(addr)?;
        file.write_all(&value.to_le_bytes())?;
    }

    println!("Binary dumped to {}", args[1]);
    Ok(None)
}

fn cmd_stack<C: IoChannel>(dbg: &mut Debugger<C>, _args: &[String]) -> Result<Option<DebugSignal>> {
    let stack = dbg.vm.stack();
    for (idx, value) in stack.iter().enumerate().rev() {
        println!("[{idx:04x}] = {value:x}");
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_channel::tests::ScriptedChannel;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    fn dbg_with_program(words: &[u16]) -> Debugger<ScriptedChannel> {
        let mut dbg = Debugger::with_io(ScriptedChannel::new([]));
        for (i, w) in words.iter().enumerate() {
            dbg.vm.memory.write(i as Word, *w).unwrap();
        }
        dbg
    }

    #[test]
    fn quit_returns_quit_signal() {
        let mut dbg = dbg_with_program(&[]);
        let signal = cmd_quit(&mut dbg, &args(&["quit"])).unwrap();
        assert_eq!(signal, Some(DebugSignal::Quit));
    }

    #[test]
    fn reg_writes_masked_value_and_reports_it() {
        let mut dbg = dbg_with_program(&[]);
        cmd_reg(&mut dbg, &args(&["reg", "0", "0xFFFF"])).unwrap();
        // masked to 15 bits on write
        assert_eq!(dbg.vm.registers.read(0).unwrap(), 0x7FFF);
    }

    #[test]
    fn reg_rejects_out_of_range_id() {
        let mut dbg = dbg_with_program(&[]);
        // Should print "Invalid register." and not touch anything; no error.
        assert!(cmd_reg(&mut dbg, &args(&["reg", "8"])).is_ok());
    }

    #[test]
    fn mem_write_then_read_round_trips() {
        // mem addresses are always parsed as hex: "a" is address 10.
        let mut dbg = dbg_with_program(&[]);
        cmd_mem(&mut dbg, &args(&["mem", "a", "99"])).unwrap();
        assert_eq!(dbg.vm.memory.read(10).unwrap(), 99);
    }

    #[test]
    fn pc_set_moves_instruction_pointer() {
        let mut dbg = dbg_with_program(&[]);
        cmd_pc(&mut dbg, &args(&["pc", "20"])).unwrap();
        assert_eq!(dbg.vm.pc(), 0x20);
    }

    #[test]
    fn break_then_unbreak_round_trips() {
        let mut dbg = dbg_with_program(&[]);
        cmd_break(&mut dbg, &args(&["break", "5"])).unwrap();
        assert!(dbg.breakpoints.contains(&5));
        cmd_unbreak(&mut dbg, &args(&["unbreak", "5"])).unwrap();
        assert!(!dbg.breakpoints.contains(&5));
    }

    #[test]
    fn step_stops_at_breakpoint() {
        // noop; noop; halt, with a breakpoint on the second noop.
        let mut dbg = dbg_with_program(&[21, 21, 0]);
        dbg.breakpoints.insert(1);
        let signal = cmd_step(&mut dbg, &args(&["step", "5"])).unwrap();
        assert_eq!(signal, Some(DebugSignal::BreakpointHit));
        assert_eq!(dbg.vm.pc(), 1);
    }

    #[test]
    fn run_halts_cleanly_without_signal() {
        let mut dbg = dbg_with_program(&[0]); // halt
        let signal = cmd_run(&mut dbg, &args(&["run"])).unwrap();
        assert_eq!(signal, None);
    }

    #[test]
    fn run_reports_interrupt_from_blocking_input() {
        // in R0 with no scripted bytes: blocks then interrupts immediately.
        let mut dbg = dbg_with_program(&[20, 32768]);
        let signal = cmd_run(&mut dbg, &args(&["run"])).unwrap();
        assert_eq!(signal, Some(DebugSignal::Interrupted));
    }

    #[test]
    fn dis_reports_missing_address() {
        let mut dbg = dbg_with_program(&[0]);
        assert!(cmd_dis(&mut dbg, &args(&["dis"])).is_ok());
    }

    #[test]
    fn load_reports_missing_filename() {
        let mut dbg = dbg_with_program(&[]);
        assert!(cmd_load(&mut dbg, &args(&["load"])).is_ok());
    }

    #[test]
    fn dump_then_dumpasm_round_trip_to_temp_files() {
        let mut dbg = dbg_with_program(&[9, 32768, 32769, 4]);
        let bin_path = std::env::temp_dir().join("synacor_vm_test_dump.bin");
        let asm_path = std::env::temp_dir().join("synacor_vm_test_dump.asm");

        cmd_dump(
            &mut dbg,
            &args(&["dump", bin_path.to_str().unwrap(), "0", "4"]),
        )
        .unwrap();
        cmd_dumpasm(
            &mut dbg,
            &args(&["dumpasm", asm_path.to_str().unwrap(), "0", "4"]),
        )
        .unwrap();

        let bytes = std::fs::read(&bin_path).unwrap();
        assert_eq!(bytes, vec![9, 0, 0, 0x80, 1, 0x80, 4, 0]);
        let text = std::fs::read_to_string(&asm_path).unwrap();
        assert!(text.contains("add R0 R1 4 ' '"));

        std::fs::remove_file(&bin_path).ok();
        std::fs::remove_file(&asm_path).ok();
    }

    #[test]
    fn help_lists_all_commands_without_error() {
        let mut dbg = dbg_with_program(&[]);
        assert!(cmd_help(&mut dbg, &args(&["help"])).unwrap().is_none());
        assert!(
            cmd_help(&mut dbg, &args(&["help", "step"]))
                .unwrap()
                .is_none()
        );
    }
}
