//! Mock 传输
//!
//! 用于测试与 `--simulate` 模式：记录所有写入的字节，并在每次写入后
//! 由脚本（排队的应答或响应函数）决定设备端返回的字节。
//!
//! 读取时若没有待读字节，立即返回 `Ok(0)`（相当于一次读超时），
//! 因此测试不会真的等待串口超时。

mod mount;

pub use mount::SimulatedMount;

use crate::{Transport, TransportError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// 设备端响应函数：输入为一次写入的字节，输出为应答字节（可为空）
pub type Responder = Box<dyn FnMut(&[u8]) -> Vec<u8> + Send>;

#[derive(Default)]
struct MockState {
    writes: Vec<Vec<u8>>,
    rx: VecDeque<u8>,
    replies: VecDeque<Vec<u8>>,
    responder: Option<Responder>,
    clears: usize,
    chunk_size: Option<usize>,
    fail_writes: bool,
}

/// 脚本化 Mock 传输
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

/// Mock 传输的观察/控制句柄（可在传输被移入客户端后继续使用）
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    /// 创建空 Mock：不应答任何命令
    pub fn new() -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        (
            Self {
                state: state.clone(),
            },
            MockHandle { state },
        )
    }

    /// 使用响应函数创建 Mock
    pub fn with_responder(
        responder: impl FnMut(&[u8]) -> Vec<u8> + Send + 'static,
    ) -> (Self, MockHandle) {
        let (transport, handle) = Self::new();
        handle.set_responder(responder);
        (transport, handle)
    }
}

impl MockHandle {
    /// 为下一次写入排队一条应答（FIFO，优先于响应函数）
    pub fn queue_reply(&self, bytes: impl Into<Vec<u8>>) {
        lock(&self.state).replies.push_back(bytes.into());
    }

    pub fn set_responder(&self, responder: impl FnMut(&[u8]) -> Vec<u8> + Send + 'static) {
        lock(&self.state).responder = Some(Box::new(responder));
    }

    /// 每次 `read` 最多返回的字节数（模拟慢速链路分片到达）
    pub fn set_chunk_size(&self, chunk_size: usize) {
        lock(&self.state).chunk_size = Some(chunk_size.max(1));
    }

    /// 令后续写入失败（模拟设备断开）
    pub fn set_fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    /// 所有写入记录（每次 `write` 一条）
    pub fn writes(&self) -> Vec<Vec<u8>> {
        lock(&self.state).writes.clone()
    }

    pub fn bytes_written(&self) -> usize {
        lock(&self.state).writes.iter().map(Vec::len).sum()
    }

    pub fn clear_count(&self) -> usize {
        lock(&self.state).clears
    }

    /// 在输入缓冲区中注入残留字节（模拟上一条命令的迟到应答）
    pub fn inject_stale(&self, bytes: &[u8]) {
        lock(&self.state).rx.extend(bytes.iter().copied());
    }
}

impl Transport for MockTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut state = lock(&self.state);
        if state.fail_writes {
            return Err(TransportError::Closed);
        }
        state.writes.push(bytes.to_vec());

        let reply = match state.replies.pop_front() {
            Some(reply) => reply,
            None => match state.responder.as_mut() {
                Some(responder) => responder(bytes),
                None => Vec::new(),
            },
        };
        state.rx.extend(reply);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut state = lock(&self.state);
        let limit = state.chunk_size.unwrap_or(buf.len()).min(buf.len());
        let mut n = 0;
        while n < limit {
            match state.rx.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                },
                None => break,
            }
        }
        Ok(n)
    }

    fn clear(&mut self) -> Result<(), TransportError> {
        let mut state = lock(&self.state);
        state.rx.clear();
        state.clears += 1;
        Ok(())
    }
}
