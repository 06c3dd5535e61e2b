use std::fmt;

/// 属性访问失败时返回给对端的 ATT 错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttError {
    ReadNotPermitted,
    WriteNotPermitted,
    InvalidAttributeValueLength,
    Unlikely,
    ValueNotAllowed,
}

impl AttError {
    /// ATT 协议里的错误码
    pub fn code(&self) -> u8 {
        match self {
            AttError::ReadNotPermitted => 0x02,
            AttError::WriteNotPermitted => 0x03,
            AttError::InvalidAttributeValueLength => 0x0d,
            AttError::Unlikely => 0x0e,
            AttError::ValueNotAllowed => 0x13,
        }
    }
}

impl fmt::Display for AttError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AttError::ReadNotPermitted => "read not permitted",
            AttError::WriteNotPermitted => "write not permitted",
            AttError::InvalidAttributeValueLength => "invalid attribute value length",
            AttError::Unlikely => "unlikely error",
            AttError::ValueNotAllowed => "value not allowed",
        };
        write!(f, "{text} (0x{:02x})", self.code())
    }
}

impl std::error::Error for AttError {}

/// 写入值必须正好是 `len` 个字节
pub fn expect_len(data: &[u8], len: usize) -> Result<(), AttError> {
    if data.len() == len {
        Ok(())
    } else {
        Err(AttError::InvalidAttributeValueLength)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_att_protocol() {
        assert_eq!(AttError::ReadNotPermitted.code(), 0x02);
        assert_eq!(AttError::Unlikely.code(), 0x0e);
        assert_eq!(AttError::ValueNotAllowed.code(), 0x13);
    }

    #[test]
    fn display_carries_code() {
        assert_eq!(
            AttError::InvalidAttributeValueLength.to_string(),
            "invalid attribute value length (0x0d)"
        );
    }

    #[test]
    fn expect_len_rejects_short_and_long_writes() {
        assert!(expect_len(&[1], 1).is_ok());
        assert_eq!(expect_len(&[], 1), Err(AttError::InvalidAttributeValueLength));
        assert_eq!(expect_len(&[1, 2], 1), Err(AttError::InvalidAttributeValueLength));
    }
}
