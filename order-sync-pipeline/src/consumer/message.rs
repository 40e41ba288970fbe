/// Location of a message in the channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessagePosition {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl MessagePosition {
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
        }
    }
}

/// An owned copy of a consumed message.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumedMessage {
    pub position: MessagePosition,
    pub key: Option<Vec<u8>>,
    pub payload: Option<Vec<u8>>,
}

impl ConsumedMessage {
    pub fn new(position: MessagePosition, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            position,
            key: None,
            payload: Some(payload.into()),
        }
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Payload bytes, empty when the message carried none.
    pub fn payload(&self) -> &[u8] {
        self.payload.as_deref().unwrap_or_default()
    }
}
