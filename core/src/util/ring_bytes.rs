use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Bounded byte buffer keeping the most recent `cap` bytes of a stream.
pub struct RingBytes {
    inner: Mutex<VecDeque<u8>>,
    cap: usize,
    total: AtomicU64,
}

impl RingBytes {
    pub fn new(cap: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(VecDeque::with_capacity(cap.min(64 * 1024))),
            cap,
            total: AtomicU64::new(0),
        })
    }

    pub fn push(&self, data: &[u8]) {
        self.total.fetch_add(data.len() as u64, Ordering::Relaxed);
        let mut g = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let data = if data.len() > self.cap {
            &data[data.len() - self.cap..]
        } else {
            data
        };
        let overflow = g.len().saturating_add(data.len()).saturating_sub(self.cap);
        if overflow > 0 {
            g.drain(..overflow);
        }
        g.extend(data);
    }

    /// Bytes pushed over the lifetime of the buffer, including evicted ones.
    pub fn total_bytes(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn dropped_bytes(&self) -> u64 {
        let held = self.inner.lock().unwrap_or_else(|e| e.into_inner()).len() as u64;
        self.total_bytes().saturating_sub(held)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let g = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut vec = Vec::with_capacity(g.len());
        vec.extend(g.iter().copied());
        vec
    }

    /// Lossy UTF-8 view of the retained tail, prefixed with a marker when bytes were evicted.
    pub fn to_text(&self) -> String {
        let body = String::from_utf8_lossy(&self.to_bytes()).into_owned();
        match self.dropped_bytes() {
            0 => body,
            n => format!("[... {n} earlier bytes truncated ...]\n{body}"),
        }
    }
}
