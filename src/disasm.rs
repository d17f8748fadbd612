//! Disassembler: a pure function over VM memory.

use crate::constants::{MAX_ADDRESS, Word};
use crate::memory::Memory;
use crate::operand::Operand;

struct OpcodeInfo {
    name: &'static str,
    operands: u8,
}

const OPCODE_TABLE: [OpcodeInfo; 22] = [
    OpcodeInfo { name: "halt", operands: 0 },
    OpcodeInfo { name: "set", operands: 2 },
    OpcodeInfo { name: "push", operands: 1 },
    OpcodeInfo { name: "pop", operands: 1 },
    OpcodeInfo { name: "eq", operands: 3 },
    OpcodeInfo { name: "gt", operands: 3 },
    OpcodeInfo { name: "jmp", operands: 1 },
    OpcodeInfo { name: "jt", operands: 2 },
    OpcodeInfo { name: "jf", operands: 2 },
    OpcodeInfo { name: "add", operands: 3 },
    OpcodeInfo { name: "mult", operands: 3 },
    OpcodeInfo { name: "mod", operands: 3 },
    OpcodeInfo { name: "and", operands: 3 },
    OpcodeInfo { name: "or", operands: 3 },
    OpcodeInfo { name: "not", operands: 2 },
    OpcodeInfo { name: "rmem", operands: 2 },
    OpcodeInfo { name: "wmem", operands: 2 },
    OpcodeInfo { name: "call", operands: 1 },
    OpcodeInfo { name: "ret", operands: 0 },
    OpcodeInfo { name: "out", operands: 1 },
    OpcodeInfo { name: "in", operands: 1 },
    OpcodeInfo { name: "noop", operands: 0 },
];

/// Disassembles the instruction at `addr`. Returns the rendered text and
/// the address of the next instruction.
///
/// If `addr` is past the end of addressable memory, emits `err` without
/// consuming anything.
pub fn disassemble(memory: &Memory, addr: Word) -> (String, Word) {
    if addr > MAX_ADDRESS {
        return ("err".to_string(), addr);
    }

    let mut ip = addr;
    let opcode = memory.read(ip).unwrap();
    ip = ip.wrapping_add(1);

    let mut text = String::new();
    match OPCODE_TABLE.get(opcode as usize) {
        Some(info) => {
            text.push_str(info.name);
            for _ in 0..info.operands {
                if ip > MAX_ADDRESS {
                    break;
                }
                let operand = memory.read(ip).unwrap();
                ip = ip.wrapping_add(1);
                text.push(' ');
                text.push_str(&format_operand(operand));
            }
        }
        None => {
            text.push_str("dw ");
            text.push_str(&format_operand(opcode));
        }
    }

    (text, ip)
}

/// Renders a single operand word the way the debugger's disassembly does:
/// literals show their decimal value (plus an ASCII glyph for values under
/// 256), register references show `R0`..`R7`, anything else shows
/// `Err(<value>)`.
pub fn format_operand(word: Word) -> String {
    match Operand::decode(word) {
        Operand::Literal(value) => {
            if value < 256 {
                format!("{} '{}'", value, ascii_glyph(value as u8))
            } else {
                value.to_string()
            }
        }
        Operand::Register(idx) => format!("R{idx}"),
        Operand::Invalid(value) => format!("Err({value})"),
    }
}

fn ascii_glyph(byte: u8) -> String {
    match byte {
        b'\n' => "\\n".to_string(),
        b'\r' => "\\r".to_string(),
        b'\t' => "\\t".to_string(),
        b if b < 0x20 => " ".to_string(),
        b => (b as char).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disassembles_zero_operand_instruction() {
        let mut mem = Memory::new();
        mem.write(0, 0).unwrap(); // halt
        let (text, next) = disassemble(&mem, 0);
        assert_eq!(text, "halt");
        assert_eq!(next, 1);
    }

    #[test]
    fn disassembles_multi_operand_instruction() {
        let mut mem = Memory::new();
        mem.write(0, 9).unwrap(); // add
        mem.write(1, 0x8000).unwrap(); // R0
        mem.write(2, 0x8001).unwrap(); // R1
        mem.write(3, 4).unwrap(); // literal 4, renders with its glyph too
        let (text, next) = disassemble(&mem, 0);
        assert_eq!(text, "add R0 R1 4 ' '");
        assert_eq!(next, 4);
    }

    #[test]
    fn unknown_opcode_renders_as_data_word() {
        let mut mem = Memory::new();
        mem.write(0, 9999).unwrap();
        let (text, next) = disassemble(&mem, 0);
        assert_eq!(text, "dw 9999");
        assert_eq!(next, 1);
    }

    #[test]
    fn literal_below_256_shows_ascii_glyph() {
        assert_eq!(format_operand(33), "33 '!'");
        assert_eq!(format_operand(b'\n' as Word), "10 '\\n'");
        assert_eq!(format_operand(5), "5 ' '");
    }

    #[test]
    fn literal_at_or_above_256_has_no_glyph() {
        assert_eq!(format_operand(256), "256");
    }

    #[test]
    fn invalid_operand_renders_err() {
        assert_eq!(format_operand(0x8009), "Err(32777)");
    }

    #[test]
    fn boundary_past_end_of_memory_emits_err_without_consuming() {
        let mem = Memory::new();
        let (text, next) = disassemble(&mem, MAX_ADDRESS + 1);
        assert_eq!(text, "err");
        assert_eq!(next, MAX_ADDRESS + 1);
    }

    #[test]
    fn truncates_operand_fetch_past_memory_end() {
        // A single-word opcode (halt) sitting exactly at the last address
        // disassembles cleanly; a multi-operand opcode there truncates.
        let mut mem = Memory::new();
        mem.write(MAX_ADDRESS, 9).unwrap(); // add, needs 3 operands
        let (text, next) = disassemble(&mem, MAX_ADDRESS);
        assert_eq!(text, "add");
        assert_eq!(next, MAX_ADDRESS + 1);
    }
}
