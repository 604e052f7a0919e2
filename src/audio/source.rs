use std::borrow::Cow;
use std::io::Cursor;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::probe::Hint;

/// The single track shipped inside the binary.
static BUNDLED_TRACK: &[u8] = include_bytes!("../../assets/track.wav");

/// An in-memory audio asset the engine can be bound to.
#[derive(Debug, Clone)]
pub struct AudioSource {
    name: Cow<'static, str>,
    extension: Option<Cow<'static, str>>,
    bytes: Cow<'static, [u8]>,
}

impl AudioSource {
    /// The asset embedded at build time.
    pub fn bundled() -> Self {
        AudioSource {
            name: Cow::Borrowed("track.wav"),
            extension: Some(Cow::Borrowed("wav")),
            bytes: Cow::Borrowed(BUNDLED_TRACK),
        }
    }

    /// Wraps arbitrary bytes, e.g. a generated clip.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name: String = name.into();
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| Cow::Owned(ext.to_ascii_lowercase()));
        AudioSource {
            name: Cow::Owned(name),
            extension,
            bytes: Cow::Owned(bytes),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Builds a probe hint from the asset's file extension.
    pub fn hint(&self) -> Hint {
        let mut hint = Hint::new();
        if let Some(ext) = &self.extension {
            hint.with_extension(ext);
        }
        hint
    }

    /// Opens a fresh stream positioned at the start of the asset.
    pub fn open_stream(&self) -> MediaSourceStream {
        let cursor = Cursor::new(self.bytes.clone().into_owned());
        MediaSourceStream::new(Box::new(cursor), MediaSourceStreamOptions { buffer_len: 64 * 1024 })
    }
}
