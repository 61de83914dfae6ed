//! 负载解码与编码
//!
//! 负载是 `[CODE][VALUE...]` 序列，从左到右解析：
//!
//! | 字段码 | 含义 | 数据 |
//! |---|---|---|
//! | `0x02` | 信号质量 | 1 字节 |
//! | `0x04` | 专注度 | 1 字节 |
//! | `0x05` | 冥想度 | 1 字节 |
//! | `0x16` | 眨眼强度 | 1 字节 |
//! | `0x80` | 原始 EEG | 1 字节声明长度（不校验）+ 2 字节大端数值 |
//! | 其他 `>= 0x80` | 未识别扩展码 | 1 字节长度 + 按长度跳过 |
//! | 其他 `< 0x80` | 未识别单字节码 | 仅跳过字段码本身 |
//!
//! 扩展码按 ThinkGear 串行协议的规则处理：`0x80` 及以上的字段码后面
//! 总有一个长度字节。即使是不认识的扩展码，也按长度整体跳过，
//! 多字节的 EEG 功率数据（`0x83`）不会被当成单字节字段误读。
//! 因此负载以一个不完整的扩展码结尾时，整个包判为格式错误，
//! 不会只保留前面的字段。
//!
//! 解析基于带边界检查的游标：任何越过负载末尾的读取都返回
//! `ProtocolError::Malformed`，整个数据包被丢弃（不会部分生效）。

use crate::ProtocolError;
use crate::constants::RAW_VALUE_LEN;
use crate::field::SensorField;
use crate::ids::FieldCode;
use crate::packet::encode_packet;
use crate::{bytes_to_u16_be, raw_to_signed};
use smallvec::SmallVec;

/// 单个数据包解码出的字段（通常 1-3 个，避免堆分配）
pub type DecodedFields = SmallVec<[SensorField; 4]>;

/// 负载游标（只读，不越界）
struct PayloadCursor<'a> {
    payload: &'a [u8],
    pos: usize,
}

impl<'a> PayloadCursor<'a> {
    fn new(payload: &'a [u8]) -> Self {
        Self { payload, pos: 0 }
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = *self.payload.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let bytes: [u8; N] = self.payload.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(bytes)
    }

    fn skip(&mut self, n: usize) -> Option<()> {
        let end = self.pos.checked_add(n)?;
        if end > self.payload.len() {
            return None;
        }
        self.pos = end;
        Some(())
    }
}

/// 解码已通过校验的负载
///
/// # 错误
/// - `ProtocolError::Malformed`: 某个字段声明的数据超出负载边界
///
/// # Example
///
/// ```
/// use mindwave_protocol::{SensorField, decode_payload};
///
/// let fields = decode_payload(&[0x02, 0x00, 0x80, 0x02, 0x04, 0xD2]).unwrap();
/// assert_eq!(
///     fields.as_slice(),
///     &[SensorField::PoorSignal(0), SensorField::RawValue(1234)]
/// );
/// ```
pub fn decode_payload(payload: &[u8]) -> Result<DecodedFields, ProtocolError> {
    let mut cursor = PayloadCursor::new(payload);
    let mut fields = DecodedFields::new();

    while let Some(code) = cursor.next_byte() {
        let offset = cursor.pos - 1;
        let malformed = || ProtocolError::Malformed { code, offset };

        match FieldCode::try_from(code) {
            Ok(FieldCode::PoorSignal) => {
                fields.push(SensorField::PoorSignal(cursor.next_byte().ok_or_else(malformed)?));
            },
            Ok(FieldCode::Attention) => {
                fields.push(SensorField::Attention(cursor.next_byte().ok_or_else(malformed)?));
            },
            Ok(FieldCode::Meditation) => {
                fields.push(SensorField::Meditation(cursor.next_byte().ok_or_else(malformed)?));
            },
            Ok(FieldCode::BlinkStrength) => {
                fields.push(SensorField::BlinkStrength(
                    cursor.next_byte().ok_or_else(malformed)?,
                ));
            },
            Ok(FieldCode::RawValue) => {
                // 声明长度恒为 2，线上存在但不参与解析
                let _declared_len = cursor.next_byte().ok_or_else(malformed)?;
                let bytes = cursor.take::<2>().ok_or_else(malformed)?;
                fields.push(SensorField::RawValue(raw_to_signed(bytes_to_u16_be(bytes))));
            },
            Err(_) if FieldCode::is_extended(code) => {
                let len = cursor.next_byte().ok_or_else(malformed)?;
                cursor.skip(len as usize).ok_or_else(malformed)?;
            },
            Err(_) => {
                // 未识别的单字节码：仅前进一位
            },
        }
    }

    Ok(fields)
}

/// 负载构建器（用于测试、模拟器与工具）
///
/// # Example
///
/// ```
/// use mindwave_protocol::{PayloadBuilder, SensorField};
///
/// let packet = PayloadBuilder::new()
///     .field(SensorField::PoorSignal(200))
///     .packet();
/// assert_eq!(packet, vec![0xAA, 0xAA, 0x02, 0x02, 0xC8, 0x35]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PayloadBuilder {
    bytes: Vec<u8>,
}

impl PayloadBuilder {
    /// 创建空负载
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个传感器字段
    pub fn field(mut self, field: SensorField) -> Self {
        match field {
            SensorField::PoorSignal(v) => self.bytes.extend([FieldCode::PoorSignal.into(), v]),
            SensorField::BlinkStrength(v) => {
                self.bytes.extend([FieldCode::BlinkStrength.into(), v])
            },
            SensorField::Attention(v) => self.bytes.extend([FieldCode::Attention.into(), v]),
            SensorField::Meditation(v) => self.bytes.extend([FieldCode::Meditation.into(), v]),
            SensorField::RawValue(v) => {
                let [hi, lo] = (v as u16).to_be_bytes();
                self.bytes.extend([FieldCode::RawValue.into(), RAW_VALUE_LEN, hi, lo]);
            },
        }
        self
    }

    /// 追加扩展码字段（`code` 应 >= 0x80）
    ///
    /// 长度字节只有 8 位，超过 255 字节的 `data` 被截断。
    pub fn extended(mut self, code: u8, data: &[u8]) -> Self {
        let len = u8::try_from(data.len()).unwrap_or(u8::MAX);
        self.bytes.push(code);
        self.bytes.push(len);
        self.bytes.extend_from_slice(&data[..usize::from(len)]);
        self
    }

    /// 追加任意字节
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// 负载字节
    pub fn build(self) -> Vec<u8> {
        self.bytes
    }

    /// 完整的线上数据包（含同步头和校验和）
    pub fn packet(self) -> Vec<u8> {
        encode_packet(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_poor_signal() {
        let fields = decode_payload(&[0x02, 0xC8]).unwrap();
        assert_eq!(fields.as_slice(), &[SensorField::PoorSignal(200)]);
    }

    #[test]
    fn test_decode_raw_value_signed_conversion() {
        let fields = decode_payload(&[0x80, 0x02, 0x80, 0x00]).unwrap();
        assert_eq!(fields.as_slice(), &[SensorField::RawValue(-32768)]);

        let fields = decode_payload(&[0x80, 0x02, 0x7F, 0xFF]).unwrap();
        assert_eq!(fields.as_slice(), &[SensorField::RawValue(32767)]);
    }

    #[test]
    fn test_raw_value_declared_length_not_validated() {
        // 声明长度为 5，依然按 2 字节解析
        let fields = decode_payload(&[0x80, 0x05, 0x00, 0x10]).unwrap();
        assert_eq!(fields.as_slice(), &[SensorField::RawValue(16)]);
    }

    #[test]
    fn test_decode_multiple_fields_in_order() {
        let payload = [0x02, 0x1A, 0x04, 0x30, 0x05, 0x40, 0x16, 0x55];
        let fields = decode_payload(&payload).unwrap();
        assert_eq!(
            fields.as_slice(),
            &[
                SensorField::PoorSignal(0x1A),
                SensorField::Attention(0x30),
                SensorField::Meditation(0x40),
                SensorField::BlinkStrength(0x55),
            ]
        );
    }

    #[test]
    fn test_raw_value_missing_value_bytes_is_malformed() {
        let err = decode_payload(&[0x80, 0x02]).unwrap_err();
        assert_eq!(err, ProtocolError::Malformed { code: 0x80, offset: 0 });

        let err = decode_payload(&[0x80, 0x02, 0x01]).unwrap_err();
        assert_eq!(err, ProtocolError::Malformed { code: 0x80, offset: 0 });

        let err = decode_payload(&[0x80]).unwrap_err();
        assert_eq!(err, ProtocolError::Malformed { code: 0x80, offset: 0 });
    }

    #[test]
    fn test_truncated_single_byte_field_is_malformed() {
        let err = decode_payload(&[0x02, 0x00, 0x16]).unwrap_err();
        assert_eq!(err, ProtocolError::Malformed { code: 0x16, offset: 2 });
    }

    #[test]
    fn test_unknown_single_byte_code_advances_one() {
        // 0x01 未识别，只跳过自身；随后的 0x02 0x10 正常解析
        let fields = decode_payload(&[0x01, 0x02, 0x10]).unwrap();
        assert_eq!(fields.as_slice(), &[SensorField::PoorSignal(0x10)]);
    }

    #[test]
    fn test_unknown_extended_code_skipped_by_length() {
        // 0x83 的数据中包含 0x02，不能被误认为信号质量字段
        let payload = PayloadBuilder::new()
            .extended(0x83, &[0x02, 0x63, 0x00, 0x02, 0x11, 0x22])
            .field(SensorField::BlinkStrength(9))
            .build();
        let fields = decode_payload(&payload).unwrap();
        assert_eq!(fields.as_slice(), &[SensorField::BlinkStrength(9)]);
    }

    #[test]
    fn test_unknown_extended_code_past_end_is_malformed() {
        let err = decode_payload(&[0x83, 0x18, 0x00]).unwrap_err();
        assert_eq!(err, ProtocolError::Malformed { code: 0x83, offset: 0 });
    }

    #[test]
    fn test_empty_payload_yields_nothing() {
        assert!(decode_payload(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_builder_round_trip() {
        let payload = PayloadBuilder::new()
            .field(SensorField::PoorSignal(0))
            .field(SensorField::RawValue(1234))
            .build();
        assert_eq!(payload, vec![0x02, 0x00, 0x80, 0x02, 0x04, 0xD2]);

        let fields = decode_payload(&payload).unwrap();
        assert_eq!(
            fields.as_slice(),
            &[SensorField::PoorSignal(0), SensorField::RawValue(1234)]
        );
    }

    #[test]
    fn test_builder_negative_raw_value() {
        let payload = PayloadBuilder::new().field(SensorField::RawValue(-2)).build();
        assert_eq!(payload, vec![0x80, 0x02, 0xFF, 0xFE]);
        assert_eq!(
            decode_payload(&payload).unwrap().as_slice(),
            &[SensorField::RawValue(-2)]
        );
    }

    #[test]
    fn test_trailing_extended_code_without_length_is_malformed() {
        // 0x90 后面缺少长度字节：扩展码规则要求整包丢弃，信号质量不生效
        let err = decode_payload(&[0x02, 0x10, 0x90]).unwrap_err();
        assert_eq!(err, ProtocolError::Malformed { code: 0x90, offset: 2 });
    }

    #[test]
    fn test_builder_extended_caps_length_byte() {
        let payload = PayloadBuilder::new().extended(0x83, &[0x00; 300]).build();
        assert_eq!(payload.len(), 2 + 255);
        assert_eq!(payload[1], 0xFF);
        assert!(decode_payload(&payload).unwrap().is_empty());
    }
}
