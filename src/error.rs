/*
 * Copyright (c) pvgss contributors.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *        http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Error taxonomy shared by every stage of the scheme.

use ark_serialize::SerializationError;

/// Failure of a sharing, verification or reconstruction step.
///
/// Every variant is surfaced to the caller; nothing in this crate recovers
/// from one of these by substituting a default value.
#[derive(Debug, thiserror::Error)]
pub enum PvgssError {
    /// The access tree is malformed.
    #[error("invalid access tree: {0}")]
    Construction(String),

    /// Operand shapes do not line up.
    #[error("dimension mismatch: {0}")]
    Dimension(String),

    /// No usable pivot was found in `column`, or the selected rows do not
    /// span the target vector `(1, 0, ..., 0)`.
    #[error("singular matrix (column {column})")]
    SingularMatrix { column: usize },

    /// A per-row consistency equation, the challenge, or a cross-quorum
    /// agreement check failed.
    #[error("dealing proof rejected: {0}")]
    ProofVerification(String),

    /// The secret key is zero and has no inverse modulo the group order.
    #[error("secret key has no modular inverse")]
    KeyInverse,

    /// A partial decryption does not match its commitment and public key.
    #[error("partial decryption rejected: {0}")]
    KeyValidity(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] SerializationError),

    /// JSON policy decoding, with the `serde_json` error as its source.
    #[error("policy decoding failed: {0}")]
    Policy(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PvgssError>;
