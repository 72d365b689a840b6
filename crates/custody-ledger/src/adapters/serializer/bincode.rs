use crate::domain::entities::{CustodyEntry, ItemRecord};
use crate::domain::errors::SerializationError;
use crate::ports::outbound::RecordSerializer;
use serde::{de::DeserializeOwned, Serialize};

/// Default record serializer using bincode.
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeRecordSerializer;

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    bincode::serialize(value).map_err(|e| SerializationError {
        message: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, SerializationError> {
    bincode::deserialize(data).map_err(|e| SerializationError {
        message: e.to_string(),
    })
}

impl RecordSerializer for BincodeRecordSerializer {
    fn serialize_record(&self, record: &ItemRecord) -> Result<Vec<u8>, SerializationError> {
        encode(record)
    }

    fn deserialize_record(&self, data: &[u8]) -> Result<ItemRecord, SerializationError> {
        decode(data)
    }

    fn serialize_entry(&self, entry: &CustodyEntry) -> Result<Vec<u8>, SerializationError> {
        encode(entry)
    }

    fn deserialize_entry(&self, data: &[u8]) -> Result<CustodyEntry, SerializationError> {
        decode(data)
    }
}
