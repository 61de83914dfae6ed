//! 从字节源读取完整数据包
//!
//! [`PacketReader`] 用 [`Framer`] 驱动一个 [`ByteSource`]：
//! 每次按 `bytes_needed()` 批量读取，负载阶段一次读完剩余字节。
//! 任何传输错误都会把帧同步器重置到 `SeekSync`，下次调用从头开始同步。

use mindwave_protocol::{Framer, RawPacket};
use mindwave_transport::{ByteSource, CloseHandle, TransportError};

/// 数据包读取器
pub struct PacketReader<S> {
    source: S,
    framer: Framer,
    buf: Vec<u8>,
}

impl<S: ByteSource> PacketReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            framer: Framer::new(),
            buf: Vec::with_capacity(256),
        }
    }

    /// 阻塞直到得到下一个数据包（尚未校验）
    pub fn next_packet(&mut self) -> Result<RawPacket, TransportError> {
        loop {
            let needed = self.framer.bytes_needed();
            self.buf.resize(needed, 0);
            if let Err(e) = self.source.read_exact(&mut self.buf[..needed]) {
                self.framer.reset();
                return Err(e);
            }
            for &byte in &self.buf[..needed] {
                if let Some(packet) = self.framer.push(byte) {
                    return Ok(packet);
                }
            }
        }
    }

    /// 取出并清零同步期间跳过的字节数
    pub fn take_discarded(&mut self) -> u64 {
        self.framer.take_discarded()
    }

    pub fn close_handle(&self) -> CloseHandle {
        self.source.close_handle()
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: ByteSource> Iterator for PacketReader<S> {
    type Item = Result<RawPacket, TransportError>;

    /// 传输断开或关闭时结束迭代，其他错误作为 `Some(Err)` 返回一次
    fn next(&mut self) -> Option<Self::Item> {
        match self.next_packet() {
            Ok(packet) => Some(Ok(packet)),
            Err(TransportError::Disconnected | TransportError::Closed) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindwave_protocol::encode_packet;
    use mindwave_transport::ReaderSource;
    use std::io::Cursor;

    #[test]
    fn test_reads_packets_from_stream() {
        let mut stream = vec![0x00, 0xAA, 0x55];
        stream.extend(encode_packet(&[0x02, 0xC8]));
        stream.extend(encode_packet(&[0x80, 0x02, 0x04, 0xD2]));

        let mut reader = PacketReader::new(ReaderSource::new(Cursor::new(stream)));
        let first = reader.next_packet().unwrap();
        assert_eq!(first.payload, vec![0x02, 0xC8]);
        assert_eq!(reader.take_discarded(), 3);

        let second = reader.next_packet().unwrap();
        assert_eq!(second.payload, vec![0x80, 0x02, 0x04, 0xD2]);
        assert!(second.verify().is_ok());

        assert!(matches!(
            reader.next_packet(),
            Err(TransportError::Disconnected)
        ));
    }

    #[test]
    fn test_truncated_packet_is_disconnect() {
        // 声明 4 字节负载，实际只有 2 字节
        let stream = vec![0xAA, 0xAA, 0x04, 0x02, 0x00];
        let mut reader = PacketReader::new(ReaderSource::new(Cursor::new(stream)));
        assert!(matches!(
            reader.next_packet(),
            Err(TransportError::Disconnected)
        ));
    }

    #[test]
    fn test_iterator_stops_at_eof() {
        let mut stream = encode_packet(&[0x16, 0x20]);
        stream.extend(encode_packet(&[0x16, 0x21]));
        let reader = PacketReader::new(ReaderSource::new(Cursor::new(stream)));

        let packets: Vec<_> = reader.map(|p| p.unwrap().payload).collect();
        assert_eq!(packets, vec![vec![0x16, 0x20], vec![0x16, 0x21]]);
    }
}
