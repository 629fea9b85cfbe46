use super::assembler::GeneratedProgram;
use crate::error::ArtifactError;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};

/// A compiled workflow ready to be shipped to the packaging/execution
/// layer, persisted in the bincode format.
#[derive(Serialize, Deserialize, Debug)]
pub struct CompiledWorkflow {
    pub name: Option<String>,
    pub program: GeneratedProgram,
}

impl CompiledWorkflow {
    pub fn new(name: Option<String>, program: GeneratedProgram) -> Self {
        Self { name, program }
    }

    /// Serializes the compiled workflow to a byte vector.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        encode_to_vec(self, standard())
            .map_err(|e| ArtifactError::Generic(format!("Serialization failed: {}", e)))
    }

    /// Saves the compiled workflow to a file.
    pub fn save(&self, path: &str) -> Result<(), ArtifactError> {
        let bytes = self.to_bytes()?;
        let mut file = fs::File::create(path).map_err(|e| {
            ArtifactError::Generic(format!("Could not create file '{}': {}", path, e))
        })?;
        file.write_all(&bytes).map_err(|e| {
            ArtifactError::Generic(format!("Could not write to file '{}': {}", path, e))
        })?;
        Ok(())
    }

    /// Loads a compiled workflow from a file.
    pub fn from_file(path: &str) -> Result<Self, ArtifactError> {
        let mut file = fs::File::open(path)
            .map_err(|e| ArtifactError::Generic(format!("Could not open file '{}': {}", path, e)))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| {
            ArtifactError::Generic(format!("Could not read from file '{}': {}", path, e))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Deserializes a compiled workflow from a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        decode_from_slice(bytes, standard())
            .map(|(artifact, _)| artifact) // bincode 2 returns a tuple (data, bytes_read)
            .map_err(|e| ArtifactError::Generic(format!("Deserialization failed: {}", e)))
    }
}
