//! Consumer protocol member assignment decoding.
//!
//! Supports versions 0-3. Layout: version (i16), topic array (i32 count; each
//! topic is an i16-length name followed by an i32 partition array), then
//! user data (i32 length, -1 for null). All integers are big-endian.

use super::TopicPartition;
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use thiserror::Error;

/// Protocol type of groups whose assignments use this layout
pub const CONSUMER_PROTOCOL_TYPE: &str = "consumer";

#[derive(Error, Debug)]
pub enum AssignmentError {
    #[error("Truncated assignment while reading {field}")]
    Truncated { field: &'static str },

    #[error("Unsupported assignment version: {0}")]
    UnsupportedVersion(i16),

    #[error("Invalid {field}: {value}")]
    InvalidLength { field: &'static str, value: i64 },

    #[error("Invalid topic name: {0}")]
    InvalidTopicName(#[from] std::string::FromUtf8Error),
}

type Result<T> = std::result::Result<T, AssignmentError>;

/// Decode an assignment into topic-partition pairs, in wire order
pub fn decode_assignment(bytes: &[u8]) -> Result<Vec<TopicPartition>> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }

    let mut cursor = Cursor::new(bytes);

    let version = cursor
        .read_i16::<BigEndian>()
        .map_err(|_| AssignmentError::Truncated { field: "version" })?;
    if !(0..=3).contains(&version) {
        return Err(AssignmentError::UnsupportedVersion(version));
    }

    let topic_count = read_count(&mut cursor, "topic count")?;
    let mut assignment = Vec::new();

    for _ in 0..topic_count {
        let topic_len = cursor
            .read_i16::<BigEndian>()
            .map_err(|_| AssignmentError::Truncated { field: "topic length" })?;
        if topic_len < 0 {
            return Err(AssignmentError::InvalidLength {
                field: "topic length",
                value: topic_len as i64,
            });
        }

        let mut topic_bytes = vec![0u8; topic_len as usize];
        cursor
            .read_exact(&mut topic_bytes)
            .map_err(|_| AssignmentError::Truncated { field: "topic name" })?;
        let topic = String::from_utf8(topic_bytes)?;

        let partition_count = read_count(&mut cursor, "partition count")?;
        for _ in 0..partition_count {
            let partition = cursor
                .read_i32::<BigEndian>()
                .map_err(|_| AssignmentError::Truncated { field: "partition" })?;
            assignment.push(TopicPartition {
                topic: topic.clone(),
                partition,
            });
        }
    }

    // User data is opaque to us; older clients omit it entirely.
    Ok(assignment)
}

fn read_count(cursor: &mut Cursor<&[u8]>, field: &'static str) -> Result<usize> {
    let count = cursor
        .read_i32::<BigEndian>()
        .map_err(|_| AssignmentError::Truncated { field })?;
    if count < 0 {
        return Ok(0);
    }
    // A count past the remaining input is corrupt.
    let remaining = cursor.get_ref().len() as u64 - cursor.position();
    if count as u64 > remaining {
        return Err(AssignmentError::InvalidLength {
            field,
            value: count as i64,
        });
    }
    Ok(count as usize)
}
