//! Transparent decompression of input files.
//!
//! Compressed inputs are recognised by file extension first and by magic
//! bytes second. Each codec sits behind its own feature flag:
//! - **Gzip** (`.gz`) - via `flate2` (feature: `compression-gzip`)
//! - **Zstd** (`.zst`) - via `zstd` (feature: `compression-zstd`)
//! - **Bzip2** (`.bz2`) - via `bzip2` (feature: `compression-bzip2`)
//! - **Xz** (`.xz`) - via `xz2` (feature: `compression-xz`)
//!
//! A codec whose feature is disabled is still detected, and opening such a
//! file fails with [`std::io::ErrorKind::Unsupported`] instead of feeding
//! compressed bytes to the tokenizer.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Compression formats recognised on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Zstd,
    Bzip2,
    Xz,
}

const ALL: [Compression; 4] = [
    Compression::Gzip,
    Compression::Zstd,
    Compression::Bzip2,
    Compression::Xz,
];

impl Compression {
    pub fn name(self) -> &'static str {
        match self {
            Compression::Gzip => "gzip",
            Compression::Zstd => "zstd",
            Compression::Bzip2 => "bzip2",
            Compression::Xz => "xz",
        }
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            Compression::Gzip => &[".gz", ".gzip"],
            Compression::Zstd => &[".zst", ".zstd"],
            Compression::Bzip2 => &[".bz2", ".bzip2"],
            Compression::Xz => &[".xz"],
        }
    }

    fn magic(self) -> &'static [u8] {
        match self {
            Compression::Gzip => &[0x1f, 0x8b],
            Compression::Zstd => &[0x28, 0xb5, 0x2f, 0xfd],
            Compression::Bzip2 => &[0x42, 0x5a, 0x68],
            Compression::Xz => &[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00],
        }
    }

    /// Detect from a path's extension, case-insensitively.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref().to_string_lossy().to_lowercase();
        ALL.into_iter()
            .find(|c| c.extensions().iter().any(|ext| path.ends_with(ext)))
    }

    /// Detect from the first bytes of a stream.
    pub fn from_magic(head: &[u8]) -> Option<Self> {
        ALL.into_iter().find(|c| head.starts_with(c.magic()))
    }

    /// Wrap `reader` with this codec's decoder.
    ///
    /// # Errors
    /// Fails when the codec's feature is disabled or the decoder cannot start.
    pub fn wrap_reader(self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        match self {
            #[cfg(feature = "compression-gzip")]
            Compression::Gzip => Ok(Box::new(flate2::read::MultiGzDecoder::new(reader))),
            #[cfg(feature = "compression-zstd")]
            Compression::Zstd => Ok(Box::new(zstd::stream::read::Decoder::new(reader)?)),
            #[cfg(feature = "compression-bzip2")]
            Compression::Bzip2 => Ok(Box::new(bzip2::read::MultiBzDecoder::new(reader))),
            #[cfg(feature = "compression-xz")]
            Compression::Xz => Ok(Box::new(xz2::read::XzDecoder::new_multi_decoder(reader))),
            #[allow(unreachable_patterns)]
            other => Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                format!("{} input requires the compression-{} feature", other.name(), other.name()),
            )),
        }
    }
}

/// Wrap a reader with decompression when the path or content calls for it.
///
/// Detection strategy:
/// 1. Check the path extension
/// 2. Fall back to magic bytes at the start of the stream
/// 3. Otherwise return the buffered reader unchanged
///
/// # Errors
/// Fails if the stream cannot be peeked or the detected codec is unavailable.
pub fn auto_detect_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> std::io::Result<Box<dyn Read>> {
    if let Some(codec) = Compression::from_path(&path_hint) {
        return codec.wrap_reader(Box::new(BufReader::new(reader)));
    }

    let mut buffered = BufReader::new(reader);
    let detected = Compression::from_magic(buffered.fill_buf()?);
    match detected {
        Some(codec) => codec.wrap_reader(Box::new(buffered)),
        None => Ok(Box::new(buffered)),
    }
}
