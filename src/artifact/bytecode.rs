// Bytecode walker
//
// Steps through a method's code array instruction by instruction and
// collects the constant pool indices of every invoked method.

use super::classfile::{ClassParseError, ClassReader};

const TABLESWITCH: u8 = 0xaa;
const LOOKUPSWITCH: u8 = 0xab;
const INVOKEVIRTUAL: u8 = 0xb6;
const INVOKESPECIAL: u8 = 0xb7;
const INVOKESTATIC: u8 = 0xb8;
const INVOKEINTERFACE: u8 = 0xb9;
const WIDE: u8 = 0xc4;
const IINC: u8 = 0x84;

/// Constant pool indices of `invokevirtual`, `invokespecial`, `invokestatic`
/// and `invokeinterface` targets, in code order.
pub fn invoked_method_indices(code: &[u8]) -> Result<Vec<u16>, ClassParseError> {
    let mut reader = ClassReader::new(code);
    let mut indices = Vec::new();

    while !reader.is_at_end() {
        let offset = reader.position();
        let opcode = reader.read_u1()?;

        match opcode {
            INVOKEVIRTUAL | INVOKESPECIAL | INVOKESTATIC => {
                indices.push(reader.read_u2()?);
            }
            INVOKEINTERFACE => {
                indices.push(reader.read_u2()?);
                reader.skip(2)?; // count, 0
            }
            TABLESWITCH => {
                skip_switch_padding(&mut reader)?;
                reader.skip(4)?; // default
                let low = reader.read_i4()?;
                let high = reader.read_i4()?;
                let entries = (high as i64 - low as i64 + 1).max(0) as usize;
                reader.skip(entries * 4)?;
            }
            LOOKUPSWITCH => {
                skip_switch_padding(&mut reader)?;
                reader.skip(4)?; // default
                let pairs = reader.read_i4()?.max(0) as usize;
                reader.skip(pairs * 8)?;
            }
            WIDE => {
                let widened = reader.read_u1()?;
                reader.skip(if widened == IINC { 4 } else { 2 })?;
            }
            _ => {
                let len = operand_len(opcode)
                    .ok_or(ClassParseError::UnknownOpcode { opcode, offset })?;
                reader.skip(len)?;
            }
        }
    }

    Ok(indices)
}

/// Switch operands start on a 4-byte boundary relative to the code start
fn skip_switch_padding(reader: &mut ClassReader<'_>) -> Result<(), ClassParseError> {
    let padding = (4 - reader.position() % 4) % 4;
    reader.skip(padding)
}

/// Operand bytes following a fixed-length opcode
fn operand_len(opcode: u8) -> Option<usize> {
    let len = match opcode {
        0x00..=0x0f => 0,
        0x10 => 1,        // bipush
        0x11 => 2,        // sipush
        0x12 => 1,        // ldc
        0x13 | 0x14 => 2, // ldc_w, ldc2_w
        0x15..=0x19 => 1, // xload
        0x1a..=0x35 => 0,
        0x36..=0x3a => 1, // xstore
        0x3b..=0x83 => 0,
        0x84 => 2, // iinc
        0x85..=0x98 => 0,
        0x99..=0xa8 => 2, // branches, goto, jsr
        0xa9 => 1,        // ret
        0xac..=0xb1 => 0, // returns
        0xb2..=0xb5 => 2, // field access
        0xba => 4,        // invokedynamic
        0xbb => 2,        // new
        0xbc => 1,        // newarray
        0xbd => 2,        // anewarray
        0xbe | 0xbf => 0,
        0xc0 | 0xc1 => 2, // checkcast, instanceof
        0xc2 | 0xc3 => 0,
        0xc5 => 3,        // multianewarray
        0xc6 | 0xc7 => 2, // ifnull, ifnonnull
        0xc8 | 0xc9 => 4, // goto_w, jsr_w
        _ => return None,
    };
    Some(len)
}
