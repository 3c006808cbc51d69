//! Script parsing primitives
//!
//! Scripts are kept as raw bytes. Everything here walks the byte string
//! with [`Instructions`] rather than building an owned representation.

use crate::constants::*;
use crate::error::ScriptError;

pub mod opcodes {
    pub const OP_0: u8 = 0x00;
    pub const OP_PUSHDATA1: u8 = 0x4c;
    pub const OP_PUSHDATA2: u8 = 0x4d;
    pub const OP_PUSHDATA4: u8 = 0x4e;
    pub const OP_1NEGATE: u8 = 0x4f;
    pub const OP_RESERVED: u8 = 0x50;
    pub const OP_1: u8 = 0x51;
    pub const OP_2: u8 = 0x52;
    pub const OP_3: u8 = 0x53;
    pub const OP_4: u8 = 0x54;
    pub const OP_5: u8 = 0x55;
    pub const OP_6: u8 = 0x56;
    pub const OP_7: u8 = 0x57;
    pub const OP_8: u8 = 0x58;
    pub const OP_9: u8 = 0x59;
    pub const OP_10: u8 = 0x5a;
    pub const OP_11: u8 = 0x5b;
    pub const OP_12: u8 = 0x5c;
    pub const OP_13: u8 = 0x5d;
    pub const OP_14: u8 = 0x5e;
    pub const OP_15: u8 = 0x5f;
    pub const OP_16: u8 = 0x60;
    pub const OP_NOP: u8 = 0x61;
    pub const OP_VER: u8 = 0x62;
    pub const OP_IF: u8 = 0x63;
    pub const OP_NOTIF: u8 = 0x64;
    pub const OP_VERIF: u8 = 0x65;
    pub const OP_VERNOTIF: u8 = 0x66;
    pub const OP_ELSE: u8 = 0x67;
    pub const OP_ENDIF: u8 = 0x68;
    pub const OP_VERIFY: u8 = 0x69;
    pub const OP_RETURN: u8 = 0x6a;
    pub const OP_TOALTSTACK: u8 = 0x6b;
    pub const OP_FROMALTSTACK: u8 = 0x6c;
    pub const OP_2DROP: u8 = 0x6d;
    pub const OP_2DUP: u8 = 0x6e;
    pub const OP_3DUP: u8 = 0x6f;
    pub const OP_2OVER: u8 = 0x70;
    pub const OP_2ROT: u8 = 0x71;
    pub const OP_2SWAP: u8 = 0x72;
    pub const OP_IFDUP: u8 = 0x73;
    pub const OP_DEPTH: u8 = 0x74;
    pub const OP_DROP: u8 = 0x75;
    pub const OP_DUP: u8 = 0x76;
    pub const OP_NIP: u8 = 0x77;
    pub const OP_OVER: u8 = 0x78;
    pub const OP_PICK: u8 = 0x79;
    pub const OP_ROLL: u8 = 0x7a;
    pub const OP_ROT: u8 = 0x7b;
    pub const OP_SWAP: u8 = 0x7c;
    pub const OP_TUCK: u8 = 0x7d;
    pub const OP_CAT: u8 = 0x7e;
    pub const OP_SUBSTR: u8 = 0x7f;
    pub const OP_LEFT: u8 = 0x80;
    pub const OP_RIGHT: u8 = 0x81;
    pub const OP_SIZE: u8 = 0x82;
    pub const OP_INVERT: u8 = 0x83;
    pub const OP_AND: u8 = 0x84;
    pub const OP_OR: u8 = 0x85;
    pub const OP_XOR: u8 = 0x86;
    pub const OP_EQUAL: u8 = 0x87;
    pub const OP_EQUALVERIFY: u8 = 0x88;
    pub const OP_RESERVED1: u8 = 0x89;
    pub const OP_RESERVED2: u8 = 0x8a;
    pub const OP_1ADD: u8 = 0x8b;
    pub const OP_1SUB: u8 = 0x8c;
    pub const OP_2MUL: u8 = 0x8d;
    pub const OP_2DIV: u8 = 0x8e;
    pub const OP_NEGATE: u8 = 0x8f;
    pub const OP_ABS: u8 = 0x90;
    pub const OP_NOT: u8 = 0x91;
    pub const OP_0NOTEQUAL: u8 = 0x92;
    pub const OP_ADD: u8 = 0x93;
    pub const OP_SUB: u8 = 0x94;
    pub const OP_MUL: u8 = 0x95;
    pub const OP_DIV: u8 = 0x96;
    pub const OP_MOD: u8 = 0x97;
    pub const OP_LSHIFT: u8 = 0x98;
    pub const OP_RSHIFT: u8 = 0x99;
    pub const OP_BOOLAND: u8 = 0x9a;
    pub const OP_BOOLOR: u8 = 0x9b;
    pub const OP_NUMEQUAL: u8 = 0x9c;
    pub const OP_NUMEQUALVERIFY: u8 = 0x9d;
    pub const OP_NUMNOTEQUAL: u8 = 0x9e;
    pub const OP_LESSTHAN: u8 = 0x9f;
    pub const OP_GREATERTHAN: u8 = 0xa0;
    pub const OP_LESSTHANOREQUAL: u8 = 0xa1;
    pub const OP_GREATERTHANOREQUAL: u8 = 0xa2;
    pub const OP_MIN: u8 = 0xa3;
    pub const OP_MAX: u8 = 0xa4;
    pub const OP_WITHIN: u8 = 0xa5;
    pub const OP_RIPEMD160: u8 = 0xa6;
    pub const OP_SHA1: u8 = 0xa7;
    pub const OP_SHA256: u8 = 0xa8;
    pub const OP_HASH160: u8 = 0xa9;
    pub const OP_HASH256: u8 = 0xaa;
    pub const OP_CODESEPARATOR: u8 = 0xab;
    pub const OP_CHECKSIG: u8 = 0xac;
    pub const OP_CHECKSIGVERIFY: u8 = 0xad;
    pub const OP_CHECKMULTISIG: u8 = 0xae;
    pub const OP_CHECKMULTISIGVERIFY: u8 = 0xaf;
    pub const OP_NOP1: u8 = 0xb0;
    pub const OP_CHECKLOCKTIMEVERIFY: u8 = 0xb1;
    pub const OP_CHECKSEQUENCEVERIFY: u8 = 0xb2;
    pub const OP_NOP10: u8 = 0xb9;
}

use opcodes::*;

/// One parsed script element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    /// A data push (including OP_0). `opcode` is the push opcode used.
    Push { opcode: u8, data: &'a [u8] },
    /// Any non-push opcode, including OP_1NEGATE and OP_1..OP_16
    Op(u8),
}

impl Instruction<'_> {
    pub fn opcode(&self) -> u8 {
        match self {
            Instruction::Push { opcode, .. } => *opcode,
            Instruction::Op(opcode) => *opcode,
        }
    }
}

/// Iterator over the instructions of a script
///
/// Yields `Err(ScriptError::BadPush)` once for a truncated push and then
/// stops.
pub struct Instructions<'a> {
    script: &'a [u8],
    pos: usize,
    done: bool,
}

pub fn instructions(script: &[u8]) -> Instructions<'_> {
    Instructions { script, pos: 0, done: false }
}

impl<'a> Instructions<'a> {
    /// Byte offset of the next instruction
    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, start: usize, len: usize) -> Option<&'a [u8]> {
        let end = start.checked_add(len)?;
        let data = self.script.get(start..end)?;
        self.pos = end;
        Some(data)
    }

    fn read_len(&self, start: usize, width: usize) -> Option<usize> {
        let bytes = self.script.get(start..start.checked_add(width)?)?;
        let mut len = 0usize;
        for (i, byte) in bytes.iter().enumerate() {
            len |= (*byte as usize) << (8 * i);
        }
        Some(len)
    }

    fn fail(&mut self) -> Option<Result<Instruction<'a>, ScriptError>> {
        self.done = true;
        Some(Err(ScriptError::BadPush(self.pos)))
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Instruction<'a>, ScriptError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.script.len() {
            return None;
        }

        let opcode = self.script[self.pos];
        let start = self.pos + 1;

        let (header, len) = match opcode {
            0x01..=0x4b => (0, opcode as usize),
            OP_PUSHDATA1 => match self.read_len(start, 1) {
                Some(len) => (1, len),
                None => return self.fail(),
            },
            OP_PUSHDATA2 => match self.read_len(start, 2) {
                Some(len) => (2, len),
                None => return self.fail(),
            },
            OP_PUSHDATA4 => match self.read_len(start, 4) {
                Some(len) => (4, len),
                None => return self.fail(),
            },
            OP_0 => {
                self.pos = start;
                return Some(Ok(Instruction::Push { opcode, data: &[] }));
            }
            _ => {
                self.pos = start;
                return Some(Ok(Instruction::Op(opcode)));
            }
        };

        match self.take(start + header, len) {
            Some(data) => Some(Ok(Instruction::Push { opcode, data })),
            None => self.fail(),
        }
    }
}

/// Value of OP_0 / OP_1..OP_16, if `opcode` is one of them
pub fn decode_op_n(opcode: u8) -> Option<u8> {
    match opcode {
        OP_0 => Some(0),
        OP_1..=OP_16 => Some(opcode - OP_1 + 1),
        _ => None,
    }
}

/// True if the script contains only data pushes
///
/// OP_1NEGATE, OP_RESERVED and OP_1..OP_16 count as pushes. A script that
/// fails to parse is not push-only.
pub fn is_push_only(script: &[u8]) -> bool {
    for instruction in instructions(script) {
        match instruction {
            Ok(instruction) if instruction.opcode() <= OP_16 => {}
            _ => return false,
        }
    }
    true
}

/// Provably unspendable: starts with OP_RETURN or exceeds the script size limit
pub fn is_unspendable(script: &[u8]) -> bool {
    (!script.is_empty() && script[0] == OP_RETURN) || script.len() > MAX_SCRIPT_SIZE
}

/// OP_HASH160 <20 bytes> OP_EQUAL
pub fn is_pay_to_script_hash(script: &[u8]) -> bool {
    script.len() == 23 && script[0] == OP_HASH160 && script[1] == 0x14 && script[22] == OP_EQUAL
}

/// Witness version and program, if `script` is a witness program
///
/// A witness program is a version opcode (OP_0 or OP_1..OP_16) followed by
/// a single direct push of 2 to 40 bytes, and nothing else.
pub fn witness_program(script: &[u8]) -> Option<(u8, &[u8])> {
    if script.len() < 4 || script.len() > 42 {
        return None;
    }
    let version = match script[0] {
        OP_0 => 0,
        op @ OP_1..=OP_16 => op - OP_1 + 1,
        _ => return None,
    };
    if script[1] as usize + 2 != script.len() {
        return None;
    }
    Some((version, &script[2..]))
}

pub fn is_witness_program(script: &[u8]) -> bool {
    witness_program(script).is_some()
}

/// Data of the last push in a push-only script, if any
pub fn last_push(script: &[u8]) -> Option<&[u8]> {
    let mut last = None;
    for instruction in instructions(script) {
        match instruction {
            Ok(Instruction::Push { data, .. }) => last = Some(data),
            Ok(Instruction::Op(op)) if op <= OP_16 => last = None,
            _ => return None,
        }
    }
    last
}

/// Count signature operations in a script
///
/// With `accurate`, a CHECKMULTISIG preceded by OP_1..OP_16 counts that
/// many sigops; otherwise it counts [`MAX_PUBKEYS_PER_MULTISIG`]. Counting
/// stops at the first unparsable push.
pub fn sig_op_count(script: &[u8], accurate: bool) -> u32 {
    let mut count = 0u32;
    let mut last_opcode = 0xffu8;
    for instruction in instructions(script) {
        let opcode = match instruction {
            Ok(instruction) => instruction.opcode(),
            Err(_) => break,
        };
        match opcode {
            OP_CHECKSIG | OP_CHECKSIGVERIFY => count += 1,
            OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => {
                count += if accurate && (OP_1..=OP_16).contains(&last_opcode) {
                    (last_opcode - OP_1 + 1) as u32
                } else {
                    MAX_PUBKEYS_PER_MULTISIG
                };
            }
            _ => {}
        }
        last_opcode = opcode;
    }
    count
}

/// Sigops of the redeem script a P2SH scriptSig reveals
///
/// Returns 0 if `script_pubkey` is not P2SH or `script_sig` is not push-only.
pub fn p2sh_sig_op_count(script_pubkey: &[u8], script_sig: &[u8]) -> u32 {
    if !is_pay_to_script_hash(script_pubkey) || !is_push_only(script_sig) {
        return 0;
    }
    last_push(script_sig)
        .map(|redeem_script| sig_op_count(redeem_script, true))
        .unwrap_or(0)
}

/// Build a minimal push of `data`
pub fn push_data(data: &[u8]) -> Vec<u8> {
    let mut script = Vec::with_capacity(data.len() + 5);
    match data.len() {
        len @ 0..=0x4b => script.push(len as u8),
        len @ 0x4c..=0xff => {
            script.push(OP_PUSHDATA1);
            script.push(len as u8);
        }
        len @ 0x100..=0xffff => {
            script.push(OP_PUSHDATA2);
            script.extend_from_slice(&(len as u16).to_le_bytes());
        }
        len => {
            script.push(OP_PUSHDATA4);
            script.extend_from_slice(&(len as u32).to_le_bytes());
        }
    }
    script.extend_from_slice(data);
    script
}
