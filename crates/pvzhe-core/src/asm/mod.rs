//! Runtime x86 code generation for calls into the target process.

mod encoder;
mod immediate;
mod reloc;

pub use encoder::{CODE_CAPACITY, CodeBuffer, Register};
pub use immediate::{Immediate, to_le_vec};
pub use reloc::call_displacement;
