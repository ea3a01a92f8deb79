//! Wire schema of the remote record payload
//!
//! Only the fields the dataset needs are declared; everything else in the body is
//! ignored. Missing or mistyped required fields fail the decode.

use crate::error::DecodeError;
use crate::types::Record;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct PokemonPayload {
    pub base_experience: Option<u32>,
    pub height: u32,
    pub id: u32,
    pub species: NamedResource,
    pub types: Vec<TypeSlot>,
    pub weight: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NamedResource {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TypeSlot {
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

impl PokemonPayload {
    /// Normalize into a [`Record`]
    ///
    /// Slot 1 becomes `primary`; every other slot writes `secondary`, so with more
    /// than two slots the last non-primary one wins.
    pub fn into_record(self) -> Result<Record, DecodeError> {
        let mut primary = None;
        let mut secondary = None;
        for entry in self.types {
            if entry.slot == 1 {
                primary = Some(entry.kind.name);
            } else {
                secondary = Some(entry.kind.name);
            }
        }

        let primary = primary.ok_or(DecodeError::MissingPrimaryType)?;

        Ok(Record {
            base_experience: self.base_experience,
            height: self.height,
            id: self.id,
            species: self.species.name,
            primary,
            secondary,
            weight: self.weight,
        })
    }
}

/// Decode a response body into a [`Record`]
pub(crate) fn decode_record(body: &str) -> Result<Record, DecodeError> {
    let payload: PokemonPayload = serde_json::from_str(body)?;
    payload.into_record()
}
