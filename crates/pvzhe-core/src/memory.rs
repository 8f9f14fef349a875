//! Pointer-chase reads and writes against the target process.
//!
//! An [`AddressPath`] like `[0x6A9EC0, 0x83C, 0x8]` means: read the 4-byte
//! pointer at `0x6A9EC0`, add `0x83C` and read the pointer there, then access
//! the value at that pointer plus `0x8`. A single-element path accesses its
//! offset directly.

use std::fmt;
use std::str::FromStr;

use tracing::{trace, warn};

use crate::asm::Immediate;
use crate::error::{Error, Result};
use crate::process::RemoteProcess;
use crate::target::Target;

/// Width of a pointer in the target process
const POINTER_SIZE: usize = 4;

/// Non-empty chain of signed offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressPath(Vec<i32>);

impl AddressPath {
    pub fn new(offsets: &[i32]) -> Result<Self> {
        if offsets.is_empty() {
            return Err(Error::EmptyAddressPath);
        }
        Ok(Self(offsets.to_vec()))
    }

    pub fn offsets(&self) -> &[i32] {
        &self.0
    }

    /// Number of levels, one per offset
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Follow the intermediate pointers and return the final address.
    ///
    /// Every level except the last is a 4-byte dereference of
    /// `base + offset`; the first base is 0.
    pub fn resolve<P: RemoteProcess + ?Sized>(&self, process: &P) -> Result<u64> {
        let (last, levels) = self.0.split_last().ok_or(Error::EmptyAddressPath)?;

        let mut base = 0u32;
        for &offset in levels {
            let address = u64::from(base.wrapping_add(offset as u32));
            let mut buf = [0u8; POINTER_SIZE];
            let transferred = process.read(address, &mut buf);
            if transferred != POINTER_SIZE {
                warn!(
                    "Pointer read at {:#x} returned {} of {} bytes",
                    address, transferred, POINTER_SIZE
                );
                return Err(Error::ShortRead {
                    address,
                    requested: POINTER_SIZE,
                    transferred,
                });
            }
            base = u32::from_le_bytes(buf);
            trace!("[{:#x}] -> {:#x}", address, base);
        }

        Ok(u64::from(base.wrapping_add(*last as u32)))
    }
}

impl fmt::Display for AddressPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, offset) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if *offset < 0 {
                write!(f, "-{:#x}", offset.unsigned_abs())?;
            } else {
                write!(f, "{:#x}", offset)?;
            }
        }
        write!(f, "]")
    }
}

impl FromStr for AddressPath {
    type Err = Error;

    /// Parse `"0x6a9ec0, 0x7fc"`. Hex needs the `0x` prefix; bare numbers are
    /// decimal. Offsets may be negative and may span the full 32-bit range.
    fn from_str(s: &str) -> Result<Self> {
        let offsets = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(parse_offset)
            .collect::<Result<Vec<_>>>()?;
        Self::new(&offsets)
    }
}

fn parse_offset(token: &str) -> Result<i32> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => digits.parse::<i64>(),
    }
    .map_err(|e| Error::InvalidAddressPath(format!("{}: {}", token, e)))?;

    let value = if negative { -magnitude } else { magnitude };
    if value < i64::from(i32::MIN) || value > i64::from(u32::MAX) {
        return Err(Error::InvalidAddressPath(format!(
            "{} does not fit in 32 bits",
            token
        )));
    }
    Ok(value as u32 as i32)
}

impl<P: RemoteProcess> Target<P> {
    /// Read `size` bytes at the end of `path`
    pub fn read_bytes(&self, size: usize, path: &AddressPath) -> Result<Vec<u8>> {
        self.with_process(|process| {
            let _guard = self.lock_memory();
            let address = path.resolve(process)?;

            let mut buf = vec![0u8; size];
            let transferred = process.read(address, &mut buf);
            if transferred != size {
                warn!(
                    "Read at {:#x} ({}) returned {} of {} bytes",
                    address, path, transferred, size
                );
                return Err(Error::ShortRead {
                    address,
                    requested: size,
                    transferred,
                });
            }
            Ok(buf)
        })
    }

    /// Read a typed value of `T::WIDTH` bytes at the end of `path`
    pub fn read<T: Immediate>(&self, path: &AddressPath) -> Result<T> {
        let bytes = self.read_bytes(T::WIDTH, path)?;
        T::decode_le(&bytes).ok_or(Error::InvalidLength {
            requested: T::WIDTH,
            available: bytes.len(),
        })
    }

    /// Write the first `count` bytes of `bytes` at the end of `path`
    pub fn write_bytes(&self, bytes: &[u8], count: usize, path: &AddressPath) -> Result<()> {
        self.with_process(|process| {
            let data = bytes.get(..count).ok_or(Error::InvalidLength {
                requested: count,
                available: bytes.len(),
            })?;

            let _guard = self.lock_memory();
            let address = path.resolve(process)?;

            let transferred = process.write(address, data);
            if transferred != count {
                warn!(
                    "Write at {:#x} ({}) returned {} of {} bytes",
                    address, path, transferred, count
                );
                return Err(Error::ShortWrite {
                    address,
                    requested: count,
                    transferred,
                });
            }
            Ok(())
        })
    }

    /// Write a typed value of `T::WIDTH` bytes at the end of `path`
    pub fn write<T: Immediate>(&self, value: T, path: &AddressPath) -> Result<()> {
        let bytes = crate::asm::to_le_vec(value);
        self.write_bytes(&bytes, bytes.len(), path)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::process::mock::{Call, MockProcess};
    use crate::process::{Binding, WindowHandle};

    fn target(process: MockProcess) -> Target<MockProcess> {
        Target::bound(Binding::new(WindowHandle(1), 100, process))
    }

    fn path(offsets: &[i32]) -> AddressPath {
        AddressPath::new(offsets).unwrap()
    }

    #[test]
    fn test_empty_path_rejected() {
        assert!(matches!(AddressPath::new(&[]), Err(Error::EmptyAddressPath)));
        assert!(matches!(
            "".parse::<AddressPath>(),
            Err(Error::EmptyAddressPath)
        ));
    }

    #[test]
    fn test_parse_path() {
        let parsed: AddressPath = "0x6a9ec0, 0x83C 8".parse().unwrap();
        assert_eq!(parsed.offsets(), &[0x6A9EC0, 0x83C, 8]);

        let parsed: AddressPath = "-0x10,0xFFFFFFFF".parse().unwrap();
        assert_eq!(parsed.offsets(), &[-0x10, -1]);
    }

    #[test]
    fn test_parse_path_invalid() {
        assert!(matches!(
            "0xZZ".parse::<AddressPath>(),
            Err(Error::InvalidAddressPath(_))
        ));
        assert!(matches!(
            "0x100000000".parse::<AddressPath>(),
            Err(Error::InvalidAddressPath(_))
        ));
    }

    #[test]
    fn test_display_path() {
        assert_eq!(path(&[0x6A9EC0, 0x7FC]).to_string(), "[0x6a9ec0, 0x7fc]");
        assert_eq!(path(&[-8]).to_string(), "[-0x8]");
    }

    #[test]
    fn test_single_level_read_is_one_transfer() {
        let process = MockProcess::new();
        process.poke(0x408D4B, &[0x6A, 0x01]);
        let target = target(process);

        let bytes = target.read_bytes(2, &path(&[0x408D4B])).unwrap();
        assert_eq!(bytes, vec![0x6A, 0x01]);

        target
            .with_process(|p| {
                assert_eq!(
                    p.calls(),
                    vec![Call::Read {
                        address: 0x408D4B,
                        len: 2
                    }]
                );
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_multi_level_read_chases_pointers() {
        let process = MockProcess::new();
        process.poke_u32(0x6A9EC0, 0x0200_0000);
        process.poke_u32(0x0200_083C, 0x0300_0000);
        process.poke_u32(0x0300_0008, 27);
        let target = target(process);

        let music: u32 = target.read(&path(&[0x6A9EC0, 0x83C, 0x8])).unwrap();
        assert_eq!(music, 27);

        target
            .with_process(|p| {
                assert_eq!(
                    p.calls(),
                    vec![
                        Call::Read {
                            address: 0x6A9EC0,
                            len: 4
                        },
                        Call::Read {
                            address: 0x0200_083C,
                            len: 4
                        },
                        Call::Read {
                            address: 0x0300_0008,
                            len: 4
                        },
                    ]
                );
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_intermediate_reads_are_pointer_sized() {
        let process = MockProcess::new();
        process.poke_u32(0x1000, 0x2000);
        process.poke(0x2010, &[1, 2, 3, 4, 5, 6, 7, 8]);
        let target = target(process);

        let value: u64 = target.read(&path(&[0x1000, 0x10])).unwrap();
        assert_eq!(value, 0x0807060504030201);

        target
            .with_process(|p| {
                let calls = p.calls();
                assert_eq!(
                    calls[0],
                    Call::Read {
                        address: 0x1000,
                        len: 4
                    }
                );
                assert_eq!(
                    calls[1],
                    Call::Read {
                        address: 0x2010,
                        len: 8
                    }
                );
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_negative_offset() {
        let process = MockProcess::new();
        process.poke_u32(0x1000, 0x2000);
        process.poke_u32(0x1FF8, 0xDEAD);
        let target = target(process);

        let value: u32 = target.read(&path(&[0x1000, -8])).unwrap();
        assert_eq!(value, 0xDEAD);
    }

    #[test]
    fn test_short_final_read_fails() {
        let process = MockProcess::new();
        process.short_read_at(0x5000, 3);
        let target = target(process);

        let err = target.read::<u32>(&path(&[0x5000])).unwrap_err();
        assert!(matches!(
            err,
            Error::ShortRead {
                address: 0x5000,
                requested: 4,
                transferred: 3
            }
        ));
    }

    #[test]
    fn test_short_pointer_read_aborts_write() {
        let process = MockProcess::new();
        process.short_read_at(0x6A9EC0, 2);
        let target = target(process);

        let err = target
            .write_bytes(&106u32.to_le_bytes(), 2, &path(&[0x6A9EC0, 0x7FC]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ShortRead {
                address: 0x6A9EC0,
                requested: 4,
                transferred: 2
            }
        ));

        target
            .with_process(|p| {
                assert!(
                    !p.calls()
                        .iter()
                        .any(|call| matches!(call, Call::Write { .. }))
                );
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_write_transfers_exact_count() {
        let target = target(MockProcess::new());
        target
            .write_bytes(&362u32.to_le_bytes(), 2, &path(&[0x408D4B]))
            .unwrap();

        target
            .with_process(|p| {
                assert_eq!(
                    p.calls(),
                    vec![Call::Write {
                        address: 0x408D4B,
                        data: vec![0x6A, 0x01]
                    }]
                );
                assert_eq!(p.peek(0x408D4B, 3), vec![0x6A, 0x01, 0x00]);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_short_write_fails() {
        let process = MockProcess::new();
        process.short_write_at(0x408D4B, 1);
        let target = target(process);

        let err = target.write(7u32, &path(&[0x408D4B])).unwrap_err();
        assert!(matches!(
            err,
            Error::ShortWrite {
                requested: 4,
                transferred: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_write_count_larger_than_bytes() {
        let target = target(MockProcess::new());
        let err = target
            .write_bytes(&[1, 2], 4, &path(&[0x1000]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidLength {
                requested: 4,
                available: 2
            }
        ));
        target
            .with_process(|p| {
                assert!(p.calls().is_empty());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_invalid_target_fails_before_access() {
        let target = target(MockProcess::new().with_exit_code(Some(0)));
        assert!(matches!(
            target.read::<u32>(&path(&[0x1000])),
            Err(Error::InvalidTarget)
        ));
        assert!(matches!(
            target.write(1u8, &path(&[0x1000])),
            Err(Error::InvalidTarget)
        ));
    }

    #[test]
    fn test_concurrent_traversals_do_not_interleave() {
        let process = MockProcess::new().with_transfer_delay(Duration::from_millis(2));
        process.poke_u32(0x1000, 0x2000);
        process.poke_u32(0x2004, 0x3000);
        let target = Arc::new(target(process));
        let chain = path(&[0x1000, 0x4, 0x8]);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let target = Arc::clone(&target);
                let chain = chain.clone();
                thread::spawn(move || {
                    for _ in 0..5 {
                        if i % 2 == 0 {
                            target.read::<u32>(&chain).unwrap();
                        } else {
                            target.write(i as u32, &chain).unwrap();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        target
            .with_process(|p| {
                let calls = p.calls_by_thread();
                assert_eq!(calls.len(), 4 * 5 * 3);
                // Every traversal is three consecutive transfers from one thread
                for traversal in calls.chunks(3) {
                    let owner = traversal[0].0;
                    assert!(traversal.iter().all(|(id, _)| *id == owner));
                    assert!(matches!(traversal[0].1, Call::Read { address: 0x1000, .. }));
                }
                Ok(())
            })
            .unwrap();
    }
}
