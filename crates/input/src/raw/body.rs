use std::cell::RefCell;
use std::fmt;
use std::io::Read;

use bytes::Bytes;
use tracing::warn;

/// The raw request body.
///
/// A reader is drained on the first call to [`RequestBody::read_once`] and
/// never touched again; buffered bytes are handed out as cheap clones.
#[derive(Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Bytes(Bytes),
    Reader(RefCell<Option<Box<dyn Read + Send>>>),
}

impl RequestBody {
    pub fn reader<R: Read + Send + 'static>(reader: R) -> Self {
        RequestBody::Reader(RefCell::new(Some(Box::new(reader))))
    }

    /// Returns the full body. Read failures are logged and yield what was read so far.
    pub fn read_once(&self) -> Bytes {
        match self {
            RequestBody::Empty => Bytes::new(),
            RequestBody::Bytes(bytes) => bytes.clone(),
            RequestBody::Reader(cell) => {
                let Some(mut reader) = cell.borrow_mut().take() else {
                    warn!("request body reader already consumed");
                    return Bytes::new();
                };

                let mut buf = Vec::new();
                if let Err(e) = reader.read_to_end(&mut buf) {
                    warn!(cause = %e, read = buf.len(), "failed to read request body");
                }
                Bytes::from(buf)
            }
        }
    }
}

impl From<Bytes> for RequestBody {
    fn from(value: Bytes) -> Self {
        if value.is_empty() { RequestBody::Empty } else { RequestBody::Bytes(value) }
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("RequestBody::Empty"),
            RequestBody::Bytes(bytes) => f.debug_tuple("RequestBody::Bytes").field(&bytes.len()).finish(),
            RequestBody::Reader(_) => f.write_str("RequestBody::Reader"),
        }
    }
}
