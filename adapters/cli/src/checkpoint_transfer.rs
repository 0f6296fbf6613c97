use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use kernel_defence_defence_loop::DefenceCheckpoint;
use kernel_defence_encounter::EncounterCheckpoint;
use serde::{Deserialize, Serialize};

const TRANSFER_DOMAIN: &str = "kdsim";
const TRANSFER_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded checkpoint payload.
pub(crate) const TRANSFER_HEADER: &str = "kdsim:v1";
/// Delimiter used to separate the prefix, version and payload.
const FIELD_DELIMITER: char = ':';

/// Mid-run checkpoint of either loop.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) enum RunCheckpoint {
    /// Defence loop checkpoint.
    Defence(DefenceCheckpoint),
    /// Encounter loop checkpoint.
    Encounter(EncounterCheckpoint),
}

/// Checkpoint paired with the strategy that must drive the rest of the run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct SavedRun {
    /// Registered name of the strategy driving the run.
    pub(crate) strategy: String,
    /// State to resume from.
    pub(crate) checkpoint: RunCheckpoint,
}

impl SavedRun {
    /// Encodes the run into a single-line string suitable for clipboard transfer.
    pub(crate) fn encode(&self) -> Result<String, TransferError> {
        let bytes = bincode::serialize(self).map_err(TransferError::Serialize)?;
        let encoded = STANDARD_NO_PAD.encode(bytes);
        Ok(format!("{TRANSFER_HEADER}:{encoded}"))
    }

    /// Decodes a run from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, TransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(TransferError::EmptyPayload);
        }

        let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
        let domain = parts.next().ok_or(TransferError::MissingPrefix)?;
        let version = parts.next().ok_or(TransferError::MissingVersion)?;
        let payload = parts.next().ok_or(TransferError::MissingPayload)?;

        if domain != TRANSFER_DOMAIN {
            return Err(TransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != TRANSFER_VERSION {
            return Err(TransferError::UnsupportedVersion(version.to_owned()));
        }

        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(TransferError::InvalidEncoding)?;
        bincode::deserialize(&bytes).map_err(TransferError::InvalidPayload)
    }
}

/// Errors that can occur while encoding or decoding checkpoint strings.
#[derive(Debug)]
pub(crate) enum TransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing.
    MissingPrefix,
    /// The version segment was missing.
    MissingVersion,
    /// The payload segment was missing.
    MissingPayload,
    /// The string used an unexpected prefix.
    InvalidPrefix(String),
    /// The string used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload was not a checkpoint.
    InvalidPayload(bincode::Error),
    /// The checkpoint could not be serialised.
    Serialize(bincode::Error),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "checkpoint string was empty"),
            Self::MissingPrefix => write!(f, "checkpoint string is missing the prefix"),
            Self::MissingVersion => write!(f, "checkpoint string is missing the version"),
            Self::MissingPayload => write!(f, "checkpoint string is missing the payload"),
            Self::InvalidPrefix(prefix) => {
                write!(f, "checkpoint prefix '{prefix}' is not supported")
            }
            Self::UnsupportedVersion(version) => {
                write!(f, "checkpoint version '{version}' is not supported")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode checkpoint payload: {error}")
            }
            Self::InvalidPayload(error) => write!(f, "could not parse checkpoint payload: {error}"),
            Self::Serialize(error) => write!(f, "could not serialise checkpoint: {error}"),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) | Self::Serialize(error) => Some(&**error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_defence_core::{BossArchetype, Difficulty, Progression, SimulationContext};
    use kernel_defence_encounter::{EncounterConfig, EncounterSimulator};

    fn saved_encounter() -> SavedRun {
        let config = EncounterConfig::new(
            5,
            BossArchetype::TrojanWyrm,
            Difficulty::Normal,
            Progression::fresh(),
        );
        let simulator = EncounterSimulator::new(&SimulationContext::builtin(), config)
            .expect("valid configuration");
        SavedRun {
            strategy: "kiting".to_owned(),
            checkpoint: RunCheckpoint::Encounter(simulator.checkpoint()),
        }
    }

    #[test]
    fn round_trip_encounter_checkpoint() {
        let saved = saved_encounter();
        let encoded = saved.encode().expect("checkpoint encodes");
        assert!(encoded.starts_with(&format!("{TRANSFER_HEADER}:")));
        assert!(!encoded.contains('\n'));

        let decoded = SavedRun::decode(&format!("  {encoded}\n")).expect("checkpoint decodes");
        assert_eq!(decoded.strategy, "kiting");
        match (decoded.checkpoint, saved.checkpoint) {
            (RunCheckpoint::Encounter(decoded), RunCheckpoint::Encounter(original)) => {
                assert_eq!(decoded.config(), original.config());
                assert_eq!(decoded.ticks_elapsed(), original.ticks_elapsed());
            }
            _ => panic!("expected an encounter checkpoint"),
        }
    }

    #[test]
    fn rejects_foreign_and_malformed_strings() {
        assert!(matches!(SavedRun::decode("   "), Err(TransferError::EmptyPayload)));
        assert!(matches!(
            SavedRun::decode("save:v1:AAAA"),
            Err(TransferError::InvalidPrefix(prefix)) if prefix == "save"
        ));
        assert!(matches!(
            SavedRun::decode("kdsim:v2:AAAA"),
            Err(TransferError::UnsupportedVersion(version)) if version == "v2"
        ));
        assert!(matches!(SavedRun::decode("kdsim:v1"), Err(TransferError::MissingPayload)));
        assert!(matches!(
            SavedRun::decode("kdsim:v1:!!!"),
            Err(TransferError::InvalidEncoding(_))
        ));
        assert!(matches!(
            SavedRun::decode("kdsim:v1:AAAA"),
            Err(TransferError::InvalidPayload(_))
        ));
    }
}
