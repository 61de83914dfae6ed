//! 原始数据包与校验和
//!
//! 线上格式：
//!
//! ```text
//! SYNC SYNC LENGTH PAYLOAD[0..LENGTH) CHECKSUM
//! SYNC     = 0xAA
//! CHECKSUM = (!sum(PAYLOAD)) & 0xFF
//! ```

use crate::ProtocolError;
use crate::constants::{MAX_PAYLOAD_LEN, SYNC_BYTE};

/// 计算负载校验和
///
/// 所有负载字节按 8 位累加，取反码。
///
/// # Example
///
/// ```
/// use mindwave_protocol::checksum;
///
/// assert_eq!(checksum(&[0x02, 0xC8]), 0x35);
/// assert_eq!(checksum(&[]), 0xFF);
/// ```
pub fn checksum(payload: &[u8]) -> u8 {
    !payload.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// 帧同步后得到的原始数据包（尚未校验）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    /// 负载字节（0-255 字节）
    pub payload: Vec<u8>,
    /// 发送端给出的校验和
    pub checksum: u8,
}

impl RawPacket {
    /// 创建数据包
    pub fn new(payload: Vec<u8>, checksum: u8) -> Self {
        Self { payload, checksum }
    }

    /// 以正确的校验和创建数据包
    pub fn with_valid_checksum(payload: Vec<u8>) -> Self {
        let checksum = checksum(&payload);
        Self { payload, checksum }
    }

    /// 校验负载完整性
    ///
    /// # 错误
    /// - `ProtocolError::ChecksumMismatch`: 计算值与传输值不一致
    pub fn verify(&self) -> Result<(), ProtocolError> {
        let expected = checksum(&self.payload);
        if expected == self.checksum {
            Ok(())
        } else {
            Err(ProtocolError::ChecksumMismatch {
                expected,
                actual: self.checksum,
            })
        }
    }

    /// 负载长度
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// 负载是否为空
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// 编码为线上字节（同步头 + 长度 + 负载 + 校验和）
    ///
    /// # 错误
    /// - `ProtocolError::PayloadTooLong`: 负载超过 255 字节
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        let len = u8::try_from(self.payload.len()).map_err(|_| ProtocolError::PayloadTooLong {
            len: self.payload.len(),
        })?;
        Ok(frame(len, &self.payload, self.checksum))
    }
}

/// 拼装线上字节，`len` 必须等于 `payload.len()`
fn frame(len: u8, payload: &[u8], checksum: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 4);
    out.push(SYNC_BYTE);
    out.push(SYNC_BYTE);
    out.push(len);
    out.extend_from_slice(payload);
    out.push(checksum);
    out
}

/// 将负载编码为完整数据包（自动计算校验和）
///
/// 超过 255 字节的负载会被截断到 [`MAX_PAYLOAD_LEN`]。
pub fn encode_packet(payload: &[u8]) -> Vec<u8> {
    let payload = &payload[..payload.len().min(MAX_PAYLOAD_LEN)];
    let len = u8::try_from(payload.len()).unwrap_or(u8::MAX);
    frame(len, payload, checksum(payload))
}
