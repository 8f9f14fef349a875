//! x86 code buffer and the small instruction subset used by the game calls.
//!
//! This is not an assembler. Each emitter writes one fixed encoding, and every
//! `call` operand is recorded as a relocation site so it can be rewritten once
//! the final load address is known (see [`CodeBuffer::relocate`]).

use strum::{Display, FromRepr};

use super::immediate::Immediate;
use crate::error::{Error, Result};

/// Default code buffer capacity in bytes
pub const CODE_CAPACITY: usize = 1024;

/// 32-bit general purpose registers, numbered as in the ModR/M encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, Display)]
#[repr(u8)]
pub enum Register {
    #[strum(serialize = "eax")]
    Eax = 0,
    #[strum(serialize = "ecx")]
    Ecx = 1,
    #[strum(serialize = "edx")]
    Edx = 2,
    #[strum(serialize = "ebx")]
    Ebx = 3,
    #[strum(serialize = "esp")]
    Esp = 4,
    #[strum(serialize = "ebp")]
    Ebp = 5,
    #[strum(serialize = "esi")]
    Esi = 6,
    #[strum(serialize = "edi")]
    Edi = 7,
}

impl Register {
    pub fn from_index(index: u8) -> Option<Self> {
        Self::from_repr(index)
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

mod opcode {
    pub const PUSH_IMM: u8 = 0x68;
    pub const MOV_IMM: u8 = 0xB8;
    pub const MOV_R32_RM32: u8 = 0x8B;
    pub const PUSH_REG: u8 = 0x50;
    pub const POP_REG: u8 = 0x58;
    pub const CALL_REL32: u8 = 0xE8;
    pub const RET: u8 = 0xC3;

    /// ModR/M mod=00 rm=101: disp32 only
    pub const MODRM_DISP32: u8 = 0x05;
    /// ModR/M mod=10: [reg + disp32]
    pub const MODRM_REG_DISP32: u8 = 0x80;
    /// ModR/M mod=11: register direct
    pub const MODRM_REG: u8 = 0xC0;
    /// SIB byte for an ESP base with no index
    pub const SIB_ESP: u8 = 0x24;
}

/// Growable machine-code buffer with a hard capacity bound
#[derive(Debug, Clone)]
pub struct CodeBuffer {
    code: Vec<u8>,
    capacity: usize,
    calls_pos: Vec<usize>,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::with_capacity(CODE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            code: Vec::with_capacity(capacity),
            capacity,
            calls_pos: Vec::new(),
        }
    }

    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.code
    }

    /// Offsets of `call` operands, in emission order
    pub fn relocations(&self) -> &[usize] {
        &self.calls_pos
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.code
    }

    /// Append raw bytes, returning the offset of the first one.
    ///
    /// Fails without writing anything if the bytes would not fit.
    pub fn emit(&mut self, bytes: &[u8]) -> Result<usize> {
        let start = self.code.len();
        let requested = start + bytes.len();
        if requested > self.capacity {
            return Err(Error::CodeOverflow {
                capacity: self.capacity,
                requested,
            });
        }
        self.code.extend_from_slice(bytes);
        Ok(start)
    }

    pub fn add_byte(&mut self, value: u8) -> Result<()> {
        self.emit(&[value]).map(|_| ())
    }

    /// Append a typed little-endian value
    pub fn add<T: Immediate>(&mut self, value: T) -> Result<()> {
        let mut bytes = Vec::with_capacity(T::WIDTH);
        value.encode_le(&mut bytes);
        self.emit(&bytes).map(|_| ())
    }

    /// `push imm` with a single immediate byte after the opcode
    pub fn push_byte(&mut self, value: u8) -> Result<()> {
        self.emit(&[opcode::PUSH_IMM, value]).map(|_| ())
    }

    /// `push imm` with a typed immediate
    pub fn push<T: Immediate>(&mut self, value: T) -> Result<()> {
        let mut insn = vec![opcode::PUSH_IMM];
        value.encode_le(&mut insn);
        self.emit(&insn).map(|_| ())
    }

    /// `mov reg, imm`
    pub fn mov_imm<T: Immediate>(&mut self, reg: Register, value: T) -> Result<()> {
        let mut insn = vec![opcode::MOV_IMM + reg.index()];
        value.encode_le(&mut insn);
        self.emit(&insn).map(|_| ())
    }

    /// `mov reg, dword ptr [addr]`
    pub fn mov_from_abs(&mut self, reg: Register, addr: u32) -> Result<()> {
        let mut insn = vec![
            opcode::MOV_R32_RM32,
            opcode::MODRM_DISP32 + reg.index() * 8,
        ];
        addr.encode_le(&mut insn);
        self.emit(&insn).map(|_| ())
    }

    /// `mov dst, dword ptr [base + disp]`
    pub fn mov_from_disp(&mut self, dst: Register, base: Register, disp: u32) -> Result<()> {
        let mut insn = vec![
            opcode::MOV_R32_RM32,
            opcode::MODRM_REG_DISP32 + dst.index() * 8 + base.index(),
        ];
        // rm=100 selects a SIB byte rather than ESP itself
        if base == Register::Esp {
            insn.push(opcode::SIB_ESP);
        }
        disp.encode_le(&mut insn);
        self.emit(&insn).map(|_| ())
    }

    pub fn push_reg(&mut self, reg: Register) -> Result<()> {
        self.add_byte(opcode::PUSH_REG + reg.index())
    }

    pub fn pop_reg(&mut self, reg: Register) -> Result<()> {
        self.add_byte(opcode::POP_REG + reg.index())
    }

    /// `mov dst, src`
    pub fn mov_reg(&mut self, dst: Register, src: Register) -> Result<()> {
        self.emit(&[
            opcode::MOV_R32_RM32,
            opcode::MODRM_REG + dst.index() * 8 + src.index(),
        ])
        .map(|_| ())
    }

    /// Near `call` to an absolute address.
    ///
    /// The operand holds `target` until [`CodeBuffer::relocate`] turns it into
    /// a displacement.
    pub fn call(&mut self, target: u32) -> Result<()> {
        let mut insn = vec![opcode::CALL_REL32];
        target.encode_le(&mut insn);
        let start = self.emit(&insn)?;
        self.calls_pos.push(start + 1);
        Ok(())
    }

    pub fn ret(&mut self) -> Result<()> {
        self.add_byte(opcode::RET)
    }
}

impl Default for CodeBuffer {
    fn default() -> Self {
        Self::new()
    }
}
