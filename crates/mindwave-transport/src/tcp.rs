//! TCP 字节源
//!
//! 关闭时对流的克隆调用 `shutdown(Both)`，阻塞中的 `read` 随即返回。

use crate::{ByteSource, CloseHandle, TransportError, TransportOpener};
use std::io::{self, Read};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::{info, warn};

/// TCP 打开器
#[derive(Debug, Clone)]
pub struct TcpOpener {
    addr: String,
    connect_timeout: Option<Duration>,
}

impl TcpOpener {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout: None,
        }
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    fn connect(&self) -> io::Result<TcpStream> {
        match self.connect_timeout {
            None => TcpStream::connect(&self.addr),
            Some(timeout) => {
                let mut last_err = io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    "address resolved to nothing",
                );
                for addr in self.addr.to_socket_addrs()? {
                    match TcpStream::connect_timeout(&addr, timeout) {
                        Ok(stream) => return Ok(stream),
                        Err(e) => last_err = e,
                    }
                }
                Err(last_err)
            },
        }
    }
}

impl TransportOpener for TcpOpener {
    fn open(&self) -> Result<Box<dyn ByteSource>, TransportError> {
        let stream = self.connect().map_err(|e| TransportError::Open {
            target: self.addr.clone(),
            reason: e.to_string(),
        })?;
        info!("Connected to {}", self.addr);
        Ok(Box::new(TcpSource::new(stream)?))
    }

    fn describe(&self) -> String {
        format!("tcp:{}", self.addr)
    }
}

/// TCP 字节源
pub struct TcpSource {
    stream: TcpStream,
    peer: String,
    close: CloseHandle,
}

impl TcpSource {
    pub fn new(stream: TcpStream) -> Result<Self, TransportError> {
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let shutdown_clone = stream.try_clone()?;
        let close = CloseHandle::with_action(move || {
            if let Err(e) = shutdown_clone.shutdown(Shutdown::Both) {
                warn!("TCP shutdown failed: {}", e);
            }
        });
        Ok(Self {
            stream,
            peer,
            close,
        })
    }
}

impl ByteSource for TcpSource {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        let mut filled = 0;
        while filled < buf.len() {
            if self.close.is_closed() {
                return Err(TransportError::Closed);
            }
            match self.stream.read(&mut buf[filled..]) {
                Ok(0) if self.close.is_closed() => return Err(TransportError::Closed),
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) if self.close.is_closed() => return Err(TransportError::Closed),
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
        Ok(())
    }

    fn close_handle(&self) -> CloseHandle {
        self.close.clone()
    }

    fn describe(&self) -> String {
        format!("tcp:{}", self.peer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_tcp_reads_bytes_then_disconnects() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            conn.write_all(&[0xAA, 0xAA, 0x02]).unwrap();
        });

        let mut source = TcpOpener::new(addr.to_string()).open().unwrap();
        let mut buf = [0u8; 3];
        source.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [0xAA, 0xAA, 0x02]);

        server.join().unwrap();
        assert!(matches!(
            source.read_byte(),
            Err(TransportError::Disconnected)
        ));
    }

    #[test]
    fn test_close_unblocks_pending_read() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (conn, _) = listener.accept().unwrap();
            // 保持连接但不发送数据
            thread::sleep(Duration::from_millis(500));
            drop(conn);
        });

        let mut source = TcpOpener::new(addr.to_string())
            .connect_timeout(Duration::from_secs(1))
            .open()
            .unwrap();
        let handle = source.close_handle();

        let reader = thread::spawn(move || source.read_byte());
        thread::sleep(Duration::from_millis(50));
        handle.close();

        let result = reader.join().unwrap();
        assert!(matches!(result, Err(TransportError::Closed)));
        server.join().unwrap();
    }

    #[test]
    fn test_connect_refused() {
        // 绑定后立即释放，端口大概率无人监听
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let result = TcpOpener::new(addr.to_string()).open();
        assert!(matches!(result, Err(TransportError::Open { .. })));
    }
}
