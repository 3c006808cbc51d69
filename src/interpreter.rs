//! Non-verifying script evaluator
//!
//! Policy checks only need to turn a scriptSig into the data stack it
//! leaves behind, so that the redeem script (or a wrapped witness program)
//! can be inspected. Signature checks go through a [`SignatureChecker`]; the
//! policy code always passes [`BaseSignatureChecker`], which rejects every
//! signature without looking at it.
//!
//! Limits match the consensus interpreter: script size, push size, op count,
//! combined stack size, disabled opcodes and balanced conditionals. Every
//! enabled opcode is executed. CHECKLOCKTIMEVERIFY and CHECKSEQUENCEVERIFY
//! have no transaction to check against and run as NOPs.

use crate::constants::*;
use crate::error::ScriptError;
use crate::script::opcodes::*;
use crate::script::{instructions, Instruction};
use crate::types::ByteString;
use bitcoin_hashes::{sha1, Hash as BitcoinHash};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Signature verification hook used by CHECKSIG and CHECKMULTISIG
///
/// `script_code` is the executing script from just after the last executed
/// OP_CODESEPARATOR.
pub trait SignatureChecker {
    fn check_sig(&self, _signature: &[u8], _pubkey: &[u8], _script_code: &[u8]) -> bool {
        false
    }
}

/// Checker that treats every signature as invalid
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseSignatureChecker;

impl SignatureChecker for BaseSignatureChecker {}

type EvalResult<T> = std::result::Result<T, ScriptError>;

/// Interpreter state besides the main stack
struct Frame<'s> {
    alt_stack: Vec<ByteString>,
    exec_stack: Vec<bool>,
    op_count: usize,
    script_code: &'s [u8],
}

impl Frame<'_> {
    fn count_ops(&mut self, n: usize) -> EvalResult<()> {
        self.op_count += n;
        if self.op_count > MAX_OPS_PER_SCRIPT {
            return Err(ScriptError::OpCount);
        }
        Ok(())
    }
}

/// Execute `script` on `stack`
///
/// Returns `Ok(())` when the script runs to the end; the final stack is left
/// in `stack` without being interpreted as a verdict.
pub fn eval_script<C: SignatureChecker + ?Sized>(
    stack: &mut Vec<ByteString>,
    script: &[u8],
    _flags: u32,
    checker: &C,
) -> EvalResult<()> {
    if script.len() > MAX_SCRIPT_SIZE {
        return Err(ScriptError::ScriptSize(script.len()));
    }

    let mut frame = Frame {
        alt_stack: Vec::new(),
        exec_stack: Vec::new(),
        op_count: 0,
        script_code: script,
    };

    let mut iter = instructions(script);
    while let Some(instruction) = iter.next() {
        let executing = frame.exec_stack.iter().all(|branch| *branch);

        match instruction? {
            Instruction::Push { data, .. } => {
                if data.len() > MAX_SCRIPT_ELEMENT_SIZE {
                    return Err(ScriptError::PushSize(data.len()));
                }
                if executing {
                    stack.push(data.to_vec());
                }
            }
            Instruction::Op(opcode) => {
                if opcode > OP_16 {
                    frame.count_ops(1)?;
                }

                if is_disabled(opcode) {
                    return Err(ScriptError::DisabledOpcode(opcode));
                }

                let is_conditional = (OP_IF..=OP_ENDIF).contains(&opcode);
                if opcode == OP_CODESEPARATOR {
                    if executing {
                        frame.script_code = &script[iter.position()..];
                    }
                } else if executing || is_conditional {
                    execute_opcode(opcode, stack, &mut frame, executing, checker)?;
                }
            }
        }

        if stack.len() + frame.alt_stack.len() > MAX_STACK_SIZE {
            return Err(ScriptError::StackSize);
        }
    }

    if !frame.exec_stack.is_empty() {
        return Err(ScriptError::UnbalancedConditional);
    }

    Ok(())
}

fn is_disabled(opcode: u8) -> bool {
    matches!(
        opcode,
        OP_CAT
            | OP_SUBSTR
            | OP_LEFT
            | OP_RIGHT
            | OP_INVERT
            | OP_AND
            | OP_OR
            | OP_XOR
            | OP_2MUL
            | OP_2DIV
            | OP_MUL
            | OP_DIV
            | OP_MOD
            | OP_LSHIFT
            | OP_RSHIFT
    )
}

fn execute_opcode<C: SignatureChecker + ?Sized>(
    opcode: u8,
    stack: &mut Vec<ByteString>,
    frame: &mut Frame<'_>,
    executing: bool,
    checker: &C,
) -> EvalResult<()> {
    match opcode {
        OP_1NEGATE => stack.push(vec![0x81]),

        OP_1..=OP_16 => stack.push(vec![opcode - OP_1 + 1]),

        OP_NOP | OP_NOP1..=OP_NOP10 => {}

        OP_IF | OP_NOTIF => {
            let mut value = false;
            if executing {
                value = cast_to_bool(&pop(stack)?);
                if opcode == OP_NOTIF {
                    value = !value;
                }
            }
            frame.exec_stack.push(value);
        }

        OP_ELSE => {
            let branch = frame.exec_stack.last_mut().ok_or(ScriptError::UnbalancedConditional)?;
            *branch = !*branch;
        }

        OP_ENDIF => {
            frame.exec_stack.pop().ok_or(ScriptError::UnbalancedConditional)?;
        }

        OP_VERIFY => {
            if !cast_to_bool(&pop(stack)?) {
                return Err(ScriptError::Verify);
            }
        }

        OP_RETURN => return Err(ScriptError::OpReturn),

        OP_TOALTSTACK => frame.alt_stack.push(pop(stack)?),

        OP_FROMALTSTACK => {
            let item = frame.alt_stack.pop().ok_or(ScriptError::InvalidStackOperation)?;
            stack.push(item);
        }

        OP_2DROP => {
            require(stack, 2)?;
            stack.truncate(stack.len() - 2);
        }

        OP_2DUP | OP_3DUP => {
            let n = if opcode == OP_2DUP { 2 } else { 3 };
            require(stack, n)?;
            let len = stack.len();
            let items = stack[len - n..].to_vec();
            stack.extend(items);
        }

        OP_2OVER => {
            require(stack, 4)?;
            let len = stack.len();
            let pair = stack[len - 4..len - 2].to_vec();
            stack.extend(pair);
        }

        OP_2ROT => {
            require(stack, 6)?;
            let len = stack.len();
            stack[len - 6..].rotate_left(2);
        }

        OP_2SWAP => {
            require(stack, 4)?;
            let len = stack.len();
            stack[len - 4..].rotate_left(2);
        }

        OP_IFDUP => {
            let top = peek(stack, 0)?.clone();
            if cast_to_bool(&top) {
                stack.push(top);
            }
        }

        OP_DEPTH => {
            let depth = stack.len() as i64;
            stack.push(encode_num(depth));
        }

        OP_DROP => {
            pop(stack)?;
        }

        OP_DUP => {
            let top = peek(stack, 0)?.clone();
            stack.push(top);
        }

        OP_NIP => {
            require(stack, 2)?;
            let len = stack.len();
            stack.remove(len - 2);
        }

        OP_OVER => {
            let second = peek(stack, 1)?.clone();
            stack.push(second);
        }

        OP_PICK | OP_ROLL => {
            let n = decode_num(&pop(stack)?)?;
            if n < 0 || n as usize >= stack.len() {
                return Err(ScriptError::InvalidStackOperation);
            }
            let index = stack.len() - 1 - n as usize;
            let item = if opcode == OP_ROLL {
                stack.remove(index)
            } else {
                stack[index].clone()
            };
            stack.push(item);
        }

        OP_ROT => {
            require(stack, 3)?;
            let len = stack.len();
            stack[len - 3..].rotate_left(1);
        }

        OP_SWAP => {
            require(stack, 2)?;
            let len = stack.len();
            stack.swap(len - 1, len - 2);
        }

        OP_TUCK => {
            require(stack, 2)?;
            let top = peek(stack, 0)?.clone();
            let len = stack.len();
            stack.insert(len - 2, top);
        }

        OP_SIZE => {
            let size = peek(stack, 0)?.len() as i64;
            stack.push(encode_num(size));
        }

        OP_EQUAL | OP_EQUALVERIFY => {
            let a = pop(stack)?;
            let b = pop(stack)?;
            let equal = a == b;
            if opcode == OP_EQUALVERIFY {
                if !equal {
                    return Err(ScriptError::Verify);
                }
            } else {
                stack.push(encode_bool(equal));
            }
        }

        OP_1ADD | OP_1SUB | OP_NEGATE | OP_ABS | OP_NOT | OP_0NOTEQUAL => {
            let n = decode_num(&pop(stack)?)?;
            let result = match opcode {
                OP_1ADD => n + 1,
                OP_1SUB => n - 1,
                OP_NEGATE => -n,
                OP_ABS => n.abs(),
                OP_NOT => (n == 0) as i64,
                _ => (n != 0) as i64,
            };
            stack.push(encode_num(result));
        }

        OP_ADD
        | OP_SUB
        | OP_BOOLAND
        | OP_BOOLOR
        | OP_NUMEQUAL
        | OP_NUMEQUALVERIFY
        | OP_NUMNOTEQUAL
        | OP_LESSTHAN
        | OP_GREATERTHAN
        | OP_LESSTHANOREQUAL
        | OP_GREATERTHANOREQUAL
        | OP_MIN
        | OP_MAX => {
            require(stack, 2)?;
            let b = decode_num(&pop(stack)?)?;
            let a = decode_num(&pop(stack)?)?;
            let result = match opcode {
                OP_ADD => a + b,
                OP_SUB => a - b,
                OP_BOOLAND => (a != 0 && b != 0) as i64,
                OP_BOOLOR => (a != 0 || b != 0) as i64,
                OP_NUMEQUAL | OP_NUMEQUALVERIFY => (a == b) as i64,
                OP_NUMNOTEQUAL => (a != b) as i64,
                OP_LESSTHAN => (a < b) as i64,
                OP_GREATERTHAN => (a > b) as i64,
                OP_LESSTHANOREQUAL => (a <= b) as i64,
                OP_GREATERTHANOREQUAL => (a >= b) as i64,
                OP_MIN => a.min(b),
                _ => a.max(b),
            };
            if opcode == OP_NUMEQUALVERIFY {
                if result == 0 {
                    return Err(ScriptError::Verify);
                }
            } else {
                stack.push(encode_num(result));
            }
        }

        OP_WITHIN => {
            require(stack, 3)?;
            let max = decode_num(&pop(stack)?)?;
            let min = decode_num(&pop(stack)?)?;
            let x = decode_num(&pop(stack)?)?;
            stack.push(encode_bool(min <= x && x < max));
        }

        OP_RIPEMD160 => {
            let item = pop(stack)?;
            stack.push(Ripemd160::digest(&item).to_vec());
        }

        OP_SHA1 => {
            let item = pop(stack)?;
            stack.push(sha1::Hash::hash(&item).into_inner().to_vec());
        }

        OP_SHA256 => {
            let item = pop(stack)?;
            stack.push(Sha256::digest(&item).to_vec());
        }

        OP_HASH160 => {
            let item = pop(stack)?;
            let sha256_hash = Sha256::digest(&item);
            stack.push(Ripemd160::digest(sha256_hash).to_vec());
        }

        OP_HASH256 => {
            let item = pop(stack)?;
            let hash1 = Sha256::digest(&item);
            stack.push(Sha256::digest(hash1).to_vec());
        }

        OP_CHECKSIG | OP_CHECKSIGVERIFY => {
            let pubkey = pop(stack)?;
            let signature = pop(stack)?;
            let valid = checker.check_sig(&signature, &pubkey, frame.script_code);
            if opcode == OP_CHECKSIGVERIFY {
                if !valid {
                    return Err(ScriptError::Verify);
                }
            } else {
                stack.push(encode_bool(valid));
            }
        }

        OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => {
            let valid = check_multisig(stack, frame, checker)?;
            if opcode == OP_CHECKMULTISIGVERIFY {
                if !valid {
                    return Err(ScriptError::Verify);
                }
            } else {
                stack.push(encode_bool(valid));
            }
        }

        _ => return Err(ScriptError::BadOpcode(opcode)),
    }

    Ok(())
}

/// Pop `<dummy> <sig>.. <m> <key>.. <n>` and report whether the signatures
/// match keys in order
///
/// Keys count towards the op limit. Signatures and keys are consumed from
/// the top down; matching stops once the remaining keys cannot cover the
/// remaining signatures.
fn check_multisig<C: SignatureChecker + ?Sized>(
    stack: &mut Vec<ByteString>,
    frame: &mut Frame<'_>,
    checker: &C,
) -> EvalResult<bool> {
    let key_count = decode_num(peek(stack, 0)?)?;
    if !(0..=MAX_PUBKEYS_PER_MULTISIG as i64).contains(&key_count) {
        return Err(ScriptError::PubkeyCount);
    }
    let key_count = key_count as usize;
    frame.count_ops(key_count)?;

    let sig_count = decode_num(peek(stack, key_count + 1)?)?;
    if !(0..=key_count as i64).contains(&sig_count) {
        return Err(ScriptError::SigCount);
    }
    let sig_count = sig_count as usize;

    // Keys, signatures, both counts and the dummy element
    let consumed = key_count + sig_count + 3;
    require(stack, consumed)?;

    let top = stack.len();
    let keys = &stack[top - 1 - key_count..top - 1];
    let sigs = &stack[top - 2 - key_count - sig_count..top - 2 - key_count];

    let mut matched = 0;
    let mut tried = 0;
    let mut valid = true;
    while valid && matched < sig_count {
        let signature = &sigs[sig_count - 1 - matched];
        let pubkey = &keys[key_count - 1 - tried];
        if checker.check_sig(signature, pubkey, frame.script_code) {
            matched += 1;
        }
        tried += 1;
        if sig_count - matched > key_count - tried {
            valid = false;
        }
    }

    stack.truncate(top - consumed);
    Ok(valid)
}

fn require(stack: &[ByteString], n: usize) -> EvalResult<()> {
    if stack.len() < n {
        return Err(ScriptError::InvalidStackOperation);
    }
    Ok(())
}

fn pop(stack: &mut Vec<ByteString>) -> EvalResult<ByteString> {
    stack.pop().ok_or(ScriptError::InvalidStackOperation)
}

fn peek(stack: &[ByteString], depth: usize) -> EvalResult<&ByteString> {
    stack
        .len()
        .checked_sub(depth + 1)
        .map(|index| &stack[index])
        .ok_or(ScriptError::InvalidStackOperation)
}

/// Script truthiness: any non-zero byte, except negative zero
pub fn cast_to_bool(item: &[u8]) -> bool {
    for (i, byte) in item.iter().enumerate() {
        if *byte != 0 {
            // 0x80 in the last byte is a sign bit on an otherwise-zero number
            return !(i == item.len() - 1 && *byte == 0x80);
        }
    }
    false
}

fn encode_bool(value: bool) -> ByteString {
    if value {
        vec![1]
    } else {
        vec![]
    }
}

/// Minimal little-endian sign-magnitude encoding
pub fn encode_num(value: i64) -> ByteString {
    if value == 0 {
        return vec![];
    }
    let negative = value < 0;
    let mut magnitude = value.unsigned_abs();
    let mut result = Vec::new();
    while magnitude > 0 {
        result.push((magnitude & 0xff) as u8);
        magnitude >>= 8;
    }
    if let Some(last) = result.last_mut() {
        if *last & 0x80 != 0 {
            result.push(if negative { 0x80 } else { 0x00 });
        } else if negative {
            *last |= 0x80;
        }
    }
    result
}

/// Decode a stack item of at most 4 bytes as a number
pub fn decode_num(item: &[u8]) -> EvalResult<i64> {
    if item.len() > 4 {
        return Err(ScriptError::InvalidNumber);
    }
    let Some((last, _)) = item.split_last() else {
        return Ok(0);
    };
    let mut value = 0i64;
    for (i, byte) in item.iter().enumerate() {
        value |= (*byte as i64) << (8 * i);
    }
    if last & 0x80 != 0 {
        let sign_bit = 0x80i64 << (8 * (item.len() - 1));
        return Ok(-(value & !sign_bit));
    }
    Ok(value)
}
