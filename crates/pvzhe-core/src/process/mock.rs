//! Scripted [`RemoteProcess`] for tests.
//!
//! Serves reads from a sparse byte map, records every primitive call in
//! order, and can be told to fail individual operations.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::thread::{self, ThreadId};
use std::time::Duration;

use super::{RemoteProcess, RemoteThread, STILL_ACTIVE};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Read { address: u64, len: usize },
    Write { address: u64, data: Vec<u8> },
    Allocate { size: usize },
    Free { address: u64 },
    CreateThread { entry: u64 },
    WaitThread(RemoteThread),
    CloseThread(RemoteThread),
}

#[derive(Debug, Default)]
struct State {
    memory: BTreeMap<u64, u8>,
    calls: Vec<(ThreadId, Call)>,
    short_reads: HashMap<u64, usize>,
    short_writes: HashMap<u64, usize>,
}

#[derive(Debug)]
pub struct MockProcess {
    state: Mutex<State>,
    alloc_base: Option<u64>,
    fail_thread: bool,
    exit_code: Mutex<Option<u32>>,
    transfer_delay: Option<Duration>,
}

impl MockProcess {
    /// A running process whose allocations land at `0x0010_0000`
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            alloc_base: Some(0x0010_0000),
            fail_thread: false,
            exit_code: Mutex::new(Some(STILL_ACTIVE)),
            transfer_delay: None,
        }
    }

    pub fn with_alloc_base(mut self, base: u64) -> Self {
        self.alloc_base = Some(base);
        self
    }

    pub fn failing_alloc(mut self) -> Self {
        self.alloc_base = None;
        self
    }

    pub fn failing_thread(mut self) -> Self {
        self.fail_thread = true;
        self
    }

    pub fn with_exit_code(self, code: Option<u32>) -> Self {
        self.set_exit_code(code);
        self
    }

    /// Simulate the process exiting (or failing the exit-code query)
    pub fn set_exit_code(&self, code: Option<u32>) {
        *self.exit_code.lock().unwrap() = code;
    }

    /// Sleep inside every read/write so concurrent callers would interleave
    pub fn with_transfer_delay(mut self, delay: Duration) -> Self {
        self.transfer_delay = Some(delay);
        self
    }

    /// Place bytes at `address`
    pub fn poke(&self, address: u64, bytes: &[u8]) {
        let mut state = self.state.lock().unwrap();
        for (i, b) in bytes.iter().enumerate() {
            state.memory.insert(address + i as u64, *b);
        }
    }

    pub fn poke_u32(&self, address: u64, value: u32) {
        self.poke(address, &value.to_le_bytes());
    }

    /// Bytes currently stored at `address`; unset bytes read as zero
    pub fn peek(&self, address: u64, len: usize) -> Vec<u8> {
        let state = self.state.lock().unwrap();
        (0..len as u64)
            .map(|i| state.memory.get(&(address + i)).copied().unwrap_or(0))
            .collect()
    }

    /// Make reads at `address` transfer only `count` bytes
    pub fn short_read_at(&self, address: u64, count: usize) {
        self.state.lock().unwrap().short_reads.insert(address, count);
    }

    /// Make writes at `address` transfer only `count` bytes
    pub fn short_write_at(&self, address: u64, count: usize) {
        self.state.lock().unwrap().short_writes.insert(address, count);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .map(|(_, call)| call.clone())
            .collect()
    }

    /// Calls tagged with the thread that issued them
    pub fn calls_by_thread(&self) -> Vec<(ThreadId, Call)> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: Call) {
        self.state
            .lock()
            .unwrap()
            .calls
            .push((thread::current().id(), call));
    }

    fn delay(&self) {
        if let Some(delay) = self.transfer_delay {
            thread::sleep(delay);
        }
    }
}

impl Default for MockProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteProcess for MockProcess {
    fn read(&self, address: u64, buf: &mut [u8]) -> usize {
        self.record(Call::Read {
            address,
            len: buf.len(),
        });
        self.delay();

        let state = self.state.lock().unwrap();
        let count = state
            .short_reads
            .get(&address)
            .copied()
            .unwrap_or(buf.len())
            .min(buf.len());
        for (i, slot) in buf.iter_mut().take(count).enumerate() {
            *slot = state.memory.get(&(address + i as u64)).copied().unwrap_or(0);
        }
        count
    }

    fn write(&self, address: u64, data: &[u8]) -> usize {
        self.record(Call::Write {
            address,
            data: data.to_vec(),
        });
        self.delay();

        let count = {
            let state = self.state.lock().unwrap();
            state
                .short_writes
                .get(&address)
                .copied()
                .unwrap_or(data.len())
                .min(data.len())
        };
        self.poke(address, &data[..count]);
        count
    }

    fn allocate_executable(&self, size: usize) -> Result<u64> {
        self.record(Call::Allocate { size });
        self.alloc_base.ok_or(Error::AllocationFailed { size })
    }

    fn free(&self, address: u64) {
        self.record(Call::Free { address });
    }

    fn create_thread(&self, entry: u64) -> Result<RemoteThread> {
        self.record(Call::CreateThread { entry });
        if self.fail_thread {
            return Err(Error::ThreadCreationFailed {
                entry,
                message: "scripted failure".to_string(),
            });
        }
        Ok(RemoteThread::from_raw(0x1234))
    }

    fn wait_thread(&self, thread: RemoteThread) {
        self.record(Call::WaitThread(thread));
    }

    fn close_thread(&self, thread: RemoteThread) {
        self.record(Call::CloseThread(thread));
    }

    fn exit_code(&self) -> Option<u32> {
        *self.exit_code.lock().unwrap()
    }
}
