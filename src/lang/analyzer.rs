/// analyzer.rs
///
/// Turns the postfix token stream into a typed instruction sequence. Next to
/// the instructions the analyzer keeps a stack of pending entries mirroring
/// the values the evaluator will have on its stack.
///
/// Names are not looked up when they are encountered: a placeholder
/// instruction is emitted and the operator consuming the name decides how to
/// resolve it. A plain use takes the first binding, a call picks the overload
/// whose argument type matches, an assignment turns the placeholder into a
/// binding target. Resolving patches the placeholder in place.
///
/// Piping (`x |> f`) evaluates `x` before `f`, while a native call expects
/// the function handle directly below its argument. Instead of reordering,
/// the analyzer assigns placements: the producer of `x` leaves a gap of one
/// handle below its result and the producer of `f` writes into that gap.

use crate::common::*;
use super::instr::{Immediate, Instruction, OpCode, Payload};
use super::library::Library;
use super::literals::LiteralPool;
use super::scope::{Literal, ScopeChain, ValueRef};
use super::source::InputPosition;
use super::tokens::{Arity, Token, TokenKind};
use super::types::{build_tuple, inner_type};

#[derive(Debug, Clone)]
enum PendingKind {
    Resolved(Type),
    // The producer is an unresolved placeholder
    Unresolved,
    // A value on its way into a call, together with the callee
    Piped { value: Type, callee: Box<Pending> },
}

/// Analysis-time view of one value on the evaluation stack. `producer` is
/// the index of the instruction writing the value's bytes.
#[derive(Debug, Clone)]
struct Pending {
    kind: PendingKind,
    producer: usize,
}

pub(crate) struct Analysis {
    pub instructions: Vec<Instruction>,
    pub literals: LiteralPool,
    pub frame_size: u32,
}

pub(crate) struct Analyzer<'a> {
    instructions: Vec<Instruction>,
    pending: Vec<Pending>,
    scopes: ScopeChain,
    literals: LiteralPool,
    logger: &'a mut dyn Logger,
    finished: bool,
}

impl<'a> Analyzer<'a> {
    pub(crate) fn new(library: &Library, logger: &'a mut dyn Logger) -> Result<Self, Error> {
        let mut literals = LiteralPool::new();
        let scopes = ScopeChain::with_library(library, &mut literals)?;
        Ok(Self {
            instructions: Vec::with_capacity(64),
            pending: Vec::with_capacity(16),
            scopes,
            literals,
            logger,
            finished: false,
        })
    }

    pub(crate) fn analyze(mut self, tokens: &[Token]) -> Result<Analysis, Error> {
        for token in tokens {
            if self.finished {
                return Err(Error::internal(format!("token '{}' after the end of the program", token)));
            }
            self.handle(token)?;
        }
        if !self.finished {
            return Err(Error::internal("token stream is missing its end token"));
        }

        log!(self.logger, "analyzed {} instructions, frame of {} bytes", self.instructions.len(), self.scopes.frame_size());
        Ok(Analysis {
            instructions: self.instructions,
            literals: self.literals,
            frame_size: self.scopes.frame_size(),
        })
    }

    fn handle(&mut self, token: &Token) -> Result<(), Error> {
        match (token.kind, token.arity) {
            (TokenKind::Number, Arity::Nullary) => self.number(token),
            (TokenKind::Name, Arity::Nullary) => self.name(token),
            (TokenKind::Assign, Arity::Binary) => self.assign(token),
            (TokenKind::Plus, Arity::Binary) => self.arithmetic(token, OpCode::Add),
            (TokenKind::Minus, Arity::Binary) => self.arithmetic(token, OpCode::Sub),
            (TokenKind::Star, Arity::Binary) => self.arithmetic(token, OpCode::Mul),
            (TokenKind::Minus, Arity::RightUnary) => self.negate(token),
            (TokenKind::Comma, Arity::Binary) => self.tuple(token),
            (TokenKind::Call, Arity::Binary) => self.call(token),
            (TokenKind::Call, Arity::LeftUnary) => self.apply(token),
            (TokenKind::Pipe, Arity::Binary) => self.pipe(),
            (TokenKind::Member, Arity::Binary) => self.member(token),
            (TokenKind::Group, Arity::LeftUnary) => self.group(),
            (TokenKind::Array, Arity::LeftUnary) => self.array(token),
            (TokenKind::Sequence, Arity::Binary) => self.sequence(token),
            (TokenKind::BlockBegin, Arity::Nullary) => {
                self.scopes.enter();
                Ok(())
            },
            (TokenKind::BlockEnd, Arity::LeftUnary) => self.block_end(),
            (TokenKind::End, Arity::LeftUnary) => self.end(token),
            (kind, arity) => Err(Error::internal(format!("unexpected {:?} token with {:?} arity", kind, arity))),
        }
    }

    //--------------------------------------------------------------------------
    // Token handlers
    //--------------------------------------------------------------------------

    fn number(&mut self, token: &Token) -> Result<(), Error> {
        let text = &token.text;
        let (atom, value) = if text.contains('.') {
            let value: f64 = text.parse().map_err(|_| Error::new_at(
                ErrorKind::Syntax, token.position, format!("invalid number '{}'", text)
            ))?;
            (TypeAtom::F64, Immediate::Float(value))
        } else {
            let value: i32 = text.parse().map_err(|_| Error::new_at(
                ErrorKind::Syntax, token.position, format!("integer '{}' does not fit in {}", text, Type::from(TypeAtom::I32))
            ))?;
            (TypeAtom::I32, Immediate::Int(value as i64))
        };

        let ty = Type::from(atom);
        let producer = self.emit(Instruction::new(OpCode::LoadI, ty.clone(), Vec::new(), Payload::Immediate(value), token.position));
        self.pending.push(Pending { kind: PendingKind::Resolved(ty), producer });
        Ok(())
    }

    fn name(&mut self, token: &Token) -> Result<(), Error> {
        let producer = self.emit(Instruction::placeholder(&token.text, token.position));
        self.pending.push(Pending { kind: PendingKind::Unresolved, producer });
        Ok(())
    }

    fn assign(&mut self, token: &Token) -> Result<(), Error> {
        let right = self.pop()?;
        let left = self.pop()?;
        let (ty, _) = self.resolve_plain(right)?;
        let ty = ty.close();

        if !matches!(left.kind, PendingKind::Unresolved) {
            return Err(Error::new_at(
                ErrorKind::UndefinedId, token.position,
                "the left side of ':=' must be a name",
            ));
        }
        let (name, position) = self.placeholder(left.producer)?;
        let offset = self.scopes.allocate(ty.size());
        self.scopes.declare(&name, ValueRef::Stack { ty: ty.clone(), offset }, position)?;

        let target = &mut self.instructions[left.producer];
        target.op = OpCode::Nop;
        target.result = ty.clone();
        log!(self.logger, "bind    {:04} '{}' at frame {}", left.producer, name, offset);

        let producer = self.emit(Instruction::new(OpCode::Copy, ty.clone(), vec![ty.clone()], Payload::Stack(offset), token.position));
        self.pending.push(Pending { kind: PendingKind::Resolved(ty), producer });
        Ok(())
    }

    fn arithmetic(&mut self, token: &Token, op: OpCode) -> Result<(), Error> {
        let right = self.pop()?;
        let left = self.pop()?;
        let (left_type, _) = self.resolve_plain(left)?;
        let (right_type, _) = self.resolve_plain(right)?;

        if !left_type.is_numeric() || left_type != right_type {
            return Err(Error::new_at(
                ErrorKind::TypeMismatch, token.position,
                format!("cannot apply '{}' to {} and {}", token, left_type, right_type),
            ));
        }

        let result = Type::from(left_type.first_atom());
        let producer = self.emit(Instruction::new(op, result.clone(), vec![left_type, right_type], Payload::None, token.position));
        self.pending.push(Pending { kind: PendingKind::Resolved(result), producer });
        Ok(())
    }

    fn negate(&mut self, token: &Token) -> Result<(), Error> {
        let operand = self.pop()?;
        let (ty, _) = self.resolve_plain(operand)?;
        if !ty.is_numeric() {
            return Err(Error::new_at(
                ErrorKind::TypeMismatch, token.position,
                format!("cannot negate a value of type {}", ty),
            ));
        }

        let producer = self.emit(Instruction::new(OpCode::Neg, ty.clone(), vec![ty.clone()], Payload::None, token.position));
        self.pending.push(Pending { kind: PendingKind::Resolved(ty), producer });
        Ok(())
    }

    fn tuple(&mut self, token: &Token) -> Result<(), Error> {
        let right = self.pop()?;
        let left = self.pop()?;
        let (left_type, _) = self.resolve_plain(left)?;
        let (right_type, _) = self.resolve_plain(right)?;

        let ty = build_tuple(&left_type, &right_type);
        let producer = self.emit(Instruction::new(OpCode::Tuple, ty.clone(), vec![left_type, right_type], Payload::None, token.position));
        self.pending.push(Pending { kind: PendingKind::Resolved(ty), producer });
        Ok(())
    }

    /// Juxtaposition `f x`, or the argument following a pipe in `x |> f y`.
    fn call(&mut self, token: &Token) -> Result<(), Error> {
        let arg = self.pop()?;
        let left = self.pop()?;
        let (arg_type, _) = self.resolve_plain(arg)?;

        match left.kind {
            PendingKind::Piped { value, callee } => {
                let arg_type = build_tuple(&value, &arg_type);
                self.emit_call(*callee, arg_type, token)
            },
            _ => self.emit_call(left, arg_type, token),
        }
    }

    /// Completes a pipe without further arguments: `x |> f` is `f x`.
    fn apply(&mut self, token: &Token) -> Result<(), Error> {
        let left = self.pop()?;
        match left.kind {
            PendingKind::Piped { value, callee } => self.emit_call(*callee, value, token),
            _ => Err(Error::internal("applying a value that is not piped")),
        }
    }

    fn pipe(&mut self) -> Result<(), Error> {
        let callee = self.pop()?;
        let value = self.pop()?;
        let (value_type, value_producer) = self.resolve_plain(value)?;

        let handle_width = POINTER_WIDTH as i32;
        self.place(value_producer, handle_width)?;
        self.place(callee.producer, -(value_type.size() as i32 + handle_width))?;

        self.pending.push(Pending {
            kind: PendingKind::Piped { value: value_type, callee: Box::new(callee) },
            producer: value_producer,
        });
        Ok(())
    }

    fn member(&mut self, token: &Token) -> Result<(), Error> {
        let name = self.pop()?;
        let subject = self.pop()?;
        if !matches!(name.kind, PendingKind::Unresolved) {
            return Err(Error::internal("member access without a member name"));
        }
        let (member_name, _) = self.placeholder(name.producer)?;
        let (subject_type, _) = self.resolve_plain(subject)?;

        let member = if subject_type.is_tuple() { subject_type.member(&member_name).cloned() } else { None };
        let member = match member {
            Some(member) => member,
            None => return Err(Error::new_at(
                ErrorKind::UnknownMemberName, token.position,
                format!("a value of type {} has no member '{}'", subject_type, member_name),
            )),
        };
        self.instructions[name.producer].op = OpCode::Nop;

        let ty = inner_type(subject_type.atoms(), member.index);
        let producer = self.emit(Instruction::new(OpCode::Member, ty.clone(), vec![subject_type], Payload::Member(member.offset), token.position));
        self.pending.push(Pending { kind: PendingKind::Resolved(ty), producer });
        Ok(())
    }

    fn group(&mut self) -> Result<(), Error> {
        let entry = self.pop()?;
        let kind = match entry.kind {
            PendingKind::Resolved(ty) => PendingKind::Resolved(ty.close()),
            PendingKind::Unresolved => PendingKind::Unresolved,
            PendingKind::Piped { .. } => return Err(Error::internal("grouping a pipe without a call")),
        };
        self.pending.push(Pending { kind, producer: entry.producer });
        Ok(())
    }

    fn array(&mut self, token: &Token) -> Result<(), Error> {
        let entry = self.pop()?;
        let (ty, producer) = self.resolve_plain(entry)?;

        let (element, count) = if ty.is_tuple() && !ty.is_closed() {
            let elements = ty.tuple_elements();
            let first = elements[0].clone();
            if let Some((idx, other)) = elements.iter().enumerate().find(|(_, e)| **e != first) {
                return Err(Error::new_at(
                    ErrorKind::ArrayElementTypeMismatch, token.position,
                    format!("array element {} has type {}, but the first element has type {}", idx + 1, other, first),
                ));
            }
            (first, elements.len() as u32)
        } else {
            (ty, 1)
        };

        let array = Type::array(&element, count);
        log!(self.logger, "array   {:04} {}", producer, array);
        self.pending.push(Pending { kind: PendingKind::Resolved(array), producer });
        Ok(())
    }

    fn sequence(&mut self, token: &Token) -> Result<(), Error> {
        let right = self.pop()?;
        let left = self.pop()?;
        let (left_type, _) = self.resolve_plain(left)?;
        let (right_type, _) = self.resolve_plain(right)?;

        let producer = self.emit(Instruction::new(OpCode::Seq, right_type.clone(), vec![left_type, right_type.clone()], Payload::None, token.position));
        self.pending.push(Pending { kind: PendingKind::Resolved(right_type), producer });
        Ok(())
    }

    fn block_end(&mut self) -> Result<(), Error> {
        // Names must be resolved while the block's bindings are visible
        let entry = self.pop()?;
        let (ty, producer) = self.resolve_plain(entry)?;
        self.scopes.leave()?;
        self.pending.push(Pending { kind: PendingKind::Resolved(ty.close()), producer });
        Ok(())
    }

    fn end(&mut self, token: &Token) -> Result<(), Error> {
        let entry = self.pop()?;
        let (ty, _) = self.resolve_plain(entry)?;
        if !self.pending.is_empty() {
            return Err(Error::internal(format!("{} values left over at the end of the program", self.pending.len())));
        }
        if self.scopes.depth() != 1 {
            return Err(Error::internal("unbalanced block scopes at the end of the program"));
        }

        self.emit(Instruction::new(OpCode::End, ty.clone(), vec![ty], Payload::None, token.position));
        self.finished = true;
        Ok(())
    }

    //--------------------------------------------------------------------------
    // Resolution
    //--------------------------------------------------------------------------

    /// Resolves an entry to its value type, binding a placeholder to the
    /// first binding of its name.
    fn resolve_plain(&mut self, entry: Pending) -> Result<(Type, usize), Error> {
        match entry.kind {
            PendingKind::Resolved(ty) => Ok((ty, entry.producer)),
            PendingKind::Unresolved => {
                let (name, position) = self.placeholder(entry.producer)?;
                let value = match self.scopes.lookup(&name) {
                    Some(value) => value.clone(),
                    None => return Err(Error::new_at(
                        ErrorKind::UndefinedId, position, format!("'{}' is not defined", name)
                    )),
                };
                let ty = self.patch(entry.producer, &value)?;
                Ok((ty, entry.producer))
            },
            PendingKind::Piped { .. } => Err(Error::internal("piped value used outside of a call")),
        }
    }

    /// Resolves a callee for an argument of type `arg`. Placeholders bind to
    /// the first overload accepting `arg`.
    fn resolve_matching(&mut self, entry: Pending, arg: &Type, at: InputPosition) -> Result<(Type, usize), Error> {
        let pattern = Type::func(&Type::undecided(), arg);
        match entry.kind {
            PendingKind::Resolved(ty) => {
                if !ty.is_func() {
                    return Err(Error::new_at(
                        ErrorKind::CallingNonFunction, at,
                        format!("calling a value of type {}", ty),
                    ));
                }
                if !pattern.matches(&ty) {
                    return Err(Error::new_at(
                        ErrorKind::TypeMismatch, at,
                        format!("a function of type {} does not accept {}", ty, arg),
                    ));
                }
                Ok((ty, entry.producer))
            },
            PendingKind::Unresolved => {
                let (name, position) = self.placeholder(entry.producer)?;
                let value = match self.scopes.lookup_matching(&name, &pattern) {
                    Some(value) => value.clone(),
                    None => return Err(match self.scopes.lookup(&name) {
                        Some(value) if !value.ty().is_func() => Error::new_at(
                            ErrorKind::CallingNonFunction, position,
                            format!("'{}' has type {} and cannot be called", name, value.ty()),
                        ),
                        Some(_) => Error::new_at(
                            ErrorKind::UndefinedId, position,
                            format!("no overload of '{}' accepts {}", name, arg),
                        ),
                        None => Error::new_at(
                            ErrorKind::UndefinedId, position, format!("'{}' is not defined", name)
                        ),
                    }),
                };
                let ty = self.patch(entry.producer, &value)?;
                Ok((ty, entry.producer))
            },
            PendingKind::Piped { .. } => Err(Error::internal("calling a piped value")),
        }
    }

    fn emit_call(&mut self, callee: Pending, arg: Type, token: &Token) -> Result<(), Error> {
        let (func_type, _) = self.resolve_matching(callee, &arg, token.position)?;
        let ret = func_type.func_return()
            .ok_or_else(|| Error::internal(format!("callee of type {} has no return type", func_type)))?;

        let producer = self.emit(Instruction::new(OpCode::Call, ret.clone(), vec![func_type, arg], Payload::None, token.position));
        self.pending.push(Pending { kind: PendingKind::Resolved(ret), producer });
        Ok(())
    }

    /// Name and position of the placeholder at `idx`.
    fn placeholder(&self, idx: usize) -> Result<(String, InputPosition), Error> {
        let instr = &self.instructions[idx];
        match (instr.op, instr.identifier()) {
            (OpCode::Unresolved, Some(name)) => Ok((name.to_string(), instr.position)),
            _ => Err(Error::internal(format!("instruction {} is not an unresolved placeholder", idx))),
        }
    }

    /// Rewrites the placeholder at `idx` into a load of `value`. The
    /// placement stays untouched.
    fn patch(&mut self, idx: usize, value: &ValueRef) -> Result<Type, Error> {
        let instr = &mut self.instructions[idx];
        if instr.op != OpCode::Unresolved {
            return Err(Error::internal(format!("instruction {} resolved twice", idx)));
        }

        let (op, payload) = match value {
            ValueRef::Stack { offset, .. } => (OpCode::Load, Payload::Stack(*offset)),
            ValueRef::Literal { literal: Literal::Immediate(value), .. } => (OpCode::LoadI, Payload::Immediate(*value)),
            ValueRef::Literal { literal: Literal::Pool(offset), .. } => (OpCode::LoadL, Payload::Literal(*offset)),
            ValueRef::Literal { literal: Literal::Native(id), .. } => (OpCode::LoadI, Payload::Native(*id)),
        };
        instr.op = op;
        instr.payload = payload;
        instr.result = value.ty().clone();
        log!(self.logger, "resolve {:04} {}", idx, instr);

        Ok(value.ty().clone())
    }

    fn place(&mut self, idx: usize, placement: i32) -> Result<(), Error> {
        let instr = &mut self.instructions[idx];
        if instr.placement != 0 {
            return Err(Error::internal(format!("instruction {} placed twice", idx)));
        }
        instr.placement = placement;
        log!(self.logger, "place   {:04} {:+}", idx, placement);
        Ok(())
    }

    fn emit(&mut self, instr: Instruction) -> usize {
        let idx = self.instructions.len();
        log!(self.logger, "emit    {:04} {}", idx, instr);
        self.instructions.push(instr);
        idx
    }

    fn pop(&mut self) -> Result<Pending, Error> {
        self.pending.pop().ok_or_else(|| Error::internal("operator without enough operands"))
    }
}
