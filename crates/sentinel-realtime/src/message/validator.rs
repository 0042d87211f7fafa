//! Inbound frame validation rules.

use crate::error::ClientError;

/// Reject empty frames and frames above `max_bytes`.
pub fn validate_frame(raw: &str, max_bytes: usize) -> Result<(), ClientError> {
    if raw.len() > max_bytes {
        return Err(ClientError::FrameTooLarge {
            size: raw.len(),
            limit: max_bytes,
        });
    }

    if raw.trim().is_empty() {
        return Err(ClientError::EmptyFrame);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_frame() {
        assert!(validate_frame(r#"{"type":"pong"}"#, 64).is_ok());
        assert_eq!(validate_frame("   ", 64), Err(ClientError::EmptyFrame));
        assert_eq!(
            validate_frame(&"x".repeat(65), 64),
            Err(ClientError::FrameTooLarge { size: 65, limit: 64 })
        );
    }
}
