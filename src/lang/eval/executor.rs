use crate::common::*;
use crate::lang::instr::{Instruction, OpCode, Payload};
use crate::lang::library::{Library, NativeId};
use crate::lang::literals::LiteralPool;

use super::store::Store;
use super::value::{apply_binary_operator, apply_negate, Value};

/// Runs one instruction sequence to completion against a fresh store.
pub(crate) struct Executor<'a> {
    instructions: &'a [Instruction],
    literals: &'a LiteralPool,
    library: &'a Library,
    logger: &'a mut dyn Logger,
    store: Store,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(
        instructions: &'a [Instruction], literals: &'a LiteralPool, frame_size: u32,
        library: &'a Library, logger: &'a mut dyn Logger,
    ) -> Self {
        Self { instructions, literals, library, logger, store: Store::new(frame_size) }
    }

    pub(crate) fn execute(mut self) -> Result<Value, Error> {
        let instructions = self.instructions;
        for (idx, instr) in instructions.iter().enumerate() {
            if let Some(value) = self.step(instr)? {
                log!(self.logger, "exec {:04} END -> {} = {}", idx, value.ty(), value.render());
                return Ok(value);
            }
            log!(
                self.logger, "exec {:04} {} | stack {} bytes: {:?}",
                idx, instr, self.store.height(), DenseDebugHex(&self.store.stack[self.store.frame_size..])
            );
        }

        Err(Error::internal("instruction sequence ended without END"))
    }

    /// Executes a single instruction. Returns the program result on `END`.
    fn step(&mut self, instr: &Instruction) -> Result<Option<Value>, Error> {
        let size = instr.result.size();
        match instr.op {
            OpCode::Unresolved => {
                return Err(Error::internal(format!(
                    "executing unresolved placeholder '{}'", instr.identifier().unwrap_or("")
                )));
            },
            OpCode::Nop => {},
            OpCode::LoadI => {
                let bytes = match &instr.payload {
                    Payload::Immediate(value) => value.encode(instr.result.first_atom())?,
                    Payload::Native(id) => id.to_bytes().to_vec(),
                    payload => return Err(unexpected_payload(instr, payload)),
                };
                self.store.push(instr.placement, &bytes)?;
            },
            OpCode::LoadL => {
                let offset = match &instr.payload {
                    Payload::Literal(offset) => *offset,
                    payload => return Err(unexpected_payload(instr, payload)),
                };
                let bytes = self.literals.read(offset, size).ok_or_else(|| Error::internal(format!(
                    "literal {}..{} outside of the literal pool", offset, offset + size
                )))?;
                self.store.push(instr.placement, bytes)?;
            },
            OpCode::Load => {
                let offset = match &instr.payload {
                    Payload::Stack(offset) => *offset,
                    payload => return Err(unexpected_payload(instr, payload)),
                };
                let bytes = self.store.read_frame(offset, size)?.to_vec();
                self.store.push(instr.placement, &bytes)?;
            },
            OpCode::Copy => {
                let offset = match &instr.payload {
                    Payload::Stack(offset) => *offset,
                    payload => return Err(unexpected_payload(instr, payload)),
                };
                let bytes = self.store.pop(size)?;
                self.store.write_frame(offset, &bytes)?;
                self.store.push(instr.placement, &bytes)?;
            },
            OpCode::Add | OpCode::Sub | OpCode::Mul => {
                let rhs = self.store.pop(instr.operand_size(1)?)?;
                let lhs = self.store.pop(instr.operand_size(0)?)?;
                let result = apply_binary_operator(instr.op, instr.result.first_atom(), &lhs, &rhs)?;
                self.store.push(instr.placement, &result)?;
            },
            OpCode::Neg => {
                let value = self.store.pop(instr.operand_size(0)?)?;
                let result = apply_negate(instr.result.first_atom(), &value)?;
                self.store.push(instr.placement, &result)?;
            },
            OpCode::Tuple => {
                // Elements already lie next to each other, only a placement
                // requires moving them
                if instr.placement != 0 {
                    let bytes = self.store.pop(size)?;
                    self.store.push(instr.placement, &bytes)?;
                }
            },
            OpCode::Member => {
                let offset = match &instr.payload {
                    Payload::Member(offset) => *offset as usize,
                    payload => return Err(unexpected_payload(instr, payload)),
                };
                let subject = self.store.pop(instr.operand_size(0)?)?;
                let bytes = subject.get(offset..offset + size as usize).ok_or_else(|| Error::internal(format!(
                    "member at {} of {} bytes outside of {} byte tuple", offset, size, subject.len()
                )))?;
                self.store.push(instr.placement, bytes)?;
            },
            OpCode::Seq => {
                let kept = self.store.pop(instr.operand_size(1)?)?;
                self.store.pop(instr.operand_size(0)?)?;
                self.store.push(instr.placement, &kept)?;
            },
            OpCode::Call => {
                let arg = self.store.pop(instr.operand_size(1)?)?;
                let handle = self.store.pop(instr.operand_size(0)?)?;
                let library = self.library;
                let native = NativeId::from_bytes(&handle)
                    .and_then(|id| library.native(id))
                    .ok_or_else(|| Error::internal(format!("unknown native handle {:?}", DenseDebugHex(&handle))))?;

                // Handles from another library or foreign bytecode must still
                // name a native of exactly the called type
                let arg_size = native.ty.func_argument().map(|ty| ty.size() as usize);
                let ret_size = native.ty.func_return().map(|ty| ty.size());
                if instr.operands.first() != Some(&native.ty) || arg_size != Some(arg.len()) || ret_size != Some(size) {
                    return Err(Error::internal(format!(
                        "native '{}' of type {} called as {} with {} argument bytes",
                        native.name, native.ty,
                        instr.operands.first().map_or_else(|| "?".to_string(), |ty| ty.to_string()),
                        arg.len()
                    )));
                }

                let mut result = vec![0u8; size as usize];
                (native.func)(&arg, &mut result);
                self.store.push(instr.placement, &result)?;
            },
            OpCode::End => {
                let bytes = self.store.pop(size)?;
                if self.store.height() != 0 {
                    return Err(Error::internal(format!(
                        "{} bytes left on the stack at END", self.store.height()
                    )));
                }
                return Ok(Some(Value::new(instr.result.clone(), bytes)));
            },
        }

        Ok(None)
    }
}

fn unexpected_payload(instr: &Instruction, payload: &Payload) -> Error {
    Error::internal(format!("unexpected payload {:?} for {:?}", payload, instr.op))
}
