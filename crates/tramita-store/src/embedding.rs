//! Embedding vector serialization (little-endian f32 BLOBs).

use ndarray::Array1;

/// Serialize an embedding for storage.
pub fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

/// Deserialize a stored embedding.
pub fn blob_to_embedding(blob: &[u8]) -> Array1<f32> {
    let values: Vec<f32> = blob
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Array1::from_vec(values)
}
