//! Tagged binary encoding for persisted friend records.
//!
//! # Responsibility
//! - Define the field-numbered wire schema for `Friend` and `Interaction`.
//! - Convert between domain values and wire messages.
//!
//! # Invariants
//! - Field numbers are never reused; new fields get new numbers so older
//!   readers skip them.
//! - `decode_friend(&encode_friend(f)) == f` for every valid friend.
//! - Birthdays are stored as midnight UTC of the calendar date.

use crate::model::friend::{Friend, Interaction};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use prost::Message;
use prost_types::Timestamp;
use thiserror::Error;

/// Wire form of [`Friend`].
#[derive(Clone, PartialEq, Message)]
pub struct FriendRecord {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(message, optional, tag = "3")]
    pub birthday: Option<Timestamp>,
    #[prost(string, repeated, tag = "4")]
    pub facts: Vec<String>,
    #[prost(message, repeated, tag = "5")]
    pub interactions: Vec<InteractionRecord>,
    #[prost(string, tag = "6")]
    pub knows_because: String,
}

/// Wire form of [`Interaction`].
#[derive(Clone, PartialEq, Message)]
pub struct InteractionRecord {
    #[prost(string, tag = "1")]
    pub title: String,
    #[prost(string, tag = "2")]
    pub description: String,
    #[prost(message, optional, tag = "3")]
    pub date: Option<Timestamp>,
    #[prost(string, repeated, tag = "4")]
    pub tags: Vec<String>,
}

/// Failure to turn stored bytes back into a friend.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed friend record: {0}")]
    Malformed(#[from] prost::DecodeError),
    #[error("timestamp out of range: seconds={seconds} nanos={nanos}")]
    TimestampOutOfRange { seconds: i64, nanos: i32 },
}

/// Serializes a friend into its tagged binary form.
pub fn encode_friend(friend: &Friend) -> Vec<u8> {
    FriendRecord::from(friend).encode_to_vec()
}

/// Parses a friend from its tagged binary form.
///
/// # Errors
/// - Returns `Malformed` when the bytes are not a valid record.
/// - Returns `TimestampOutOfRange` for records whose dates cannot be
///   represented in the domain model.
pub fn decode_friend(bytes: &[u8]) -> Result<Friend, CodecError> {
    let record = FriendRecord::decode(bytes)?;
    Friend::try_from(record)
}

impl From<&Friend> for FriendRecord {
    fn from(friend: &Friend) -> Self {
        Self {
            id: friend.id.clone(),
            name: friend.name.clone(),
            birthday: friend.birthday.map(date_to_timestamp),
            facts: friend.facts.clone(),
            interactions: friend
                .interactions
                .iter()
                .map(InteractionRecord::from)
                .collect(),
            knows_because: friend.knows_because.clone(),
        }
    }
}

impl From<&Interaction> for InteractionRecord {
    fn from(interaction: &Interaction) -> Self {
        Self {
            title: interaction.title.clone(),
            description: interaction.description.clone(),
            date: interaction.date.map(datetime_to_timestamp),
            tags: interaction.tags.clone(),
        }
    }
}

impl TryFrom<FriendRecord> for Friend {
    type Error = CodecError;

    fn try_from(record: FriendRecord) -> Result<Self, Self::Error> {
        let birthday = match record.birthday {
            Some(ts) => Some(timestamp_to_datetime(&ts)?.date_naive()),
            None => None,
        };

        let interactions = record
            .interactions
            .into_iter()
            .map(|item| -> Result<Interaction, CodecError> {
                let date = match item.date {
                    Some(ts) => Some(timestamp_to_datetime(&ts)?),
                    None => None,
                };
                Ok(Interaction {
                    title: item.title,
                    description: item.description,
                    date,
                    tags: item.tags,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Friend {
            id: record.id,
            name: record.name,
            birthday,
            facts: record.facts,
            interactions,
            knows_because: record.knows_because,
        })
    }
}

fn date_to_timestamp(date: NaiveDate) -> Timestamp {
    datetime_to_timestamp(date.and_time(NaiveTime::MIN).and_utc())
}

fn datetime_to_timestamp(value: DateTime<Utc>) -> Timestamp {
    Timestamp {
        seconds: value.timestamp(),
        nanos: value.timestamp_subsec_nanos() as i32,
    }
}

fn timestamp_to_datetime(ts: &Timestamp) -> Result<DateTime<Utc>, CodecError> {
    let out_of_range = || CodecError::TimestampOutOfRange {
        seconds: ts.seconds,
        nanos: ts.nanos,
    };
    let nanos = u32::try_from(ts.nanos).map_err(|_| out_of_range())?;
    DateTime::from_timestamp(ts.seconds, nanos).ok_or_else(out_of_range)
}
