/// Handshake messages in the order they were sent or received.
///
/// Each entry is a whole message including its 4-byte header. Both the
/// TLS 1.2 PRF and the TLS 1.3 transcript hash read from here.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Vec<u8>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Vec<u8>) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Concatenation of the first `n` messages.
    pub fn up_to(&self, n: usize) -> Vec<u8> {
        self.messages[..n.min(self.messages.len())].concat()
    }

    /// Everything except the most recent message.
    pub fn without_last(&self) -> Vec<u8> {
        self.up_to(self.messages.len().saturating_sub(1))
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.messages.concat()
    }
}
