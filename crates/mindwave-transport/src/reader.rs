//! 基于 `std::io::Read` 的字节源（抓包文件回放）

use crate::{ByteSource, CloseHandle, TransportError, TransportOpener};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

/// 包装任意 `Read`，EOF 映射为 [`TransportError::Disconnected`]
pub struct ReaderSource<R> {
    inner: R,
    close: CloseHandle,
    name: String,
}

impl<R: Read + Send> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        Self::named(inner, "reader")
    }

    pub fn named(inner: R, name: impl Into<String>) -> Self {
        Self {
            inner,
            close: CloseHandle::new(),
            name: name.into(),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Send> ByteSource for ReaderSource<R> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        if self.close.is_closed() {
            return Err(TransportError::Closed);
        }
        match self.inner.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(TransportError::Disconnected),
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    fn close_handle(&self) -> CloseHandle {
        self.close.clone()
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// 每次打开时重新读取同一个抓包文件
#[derive(Debug, Clone)]
pub struct FileOpener {
    path: PathBuf,
}

impl FileOpener {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TransportOpener for FileOpener {
    fn open(&self) -> Result<Box<dyn ByteSource>, TransportError> {
        let file = File::open(&self.path).map_err(|e| TransportError::Open {
            target: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(ReaderSource::named(
            BufReader::new(file),
            format!("file:{}", self.path.display()),
        )))
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
