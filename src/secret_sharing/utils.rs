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

use ark_ff::PrimeField;
use ark_serialize::CanonicalSerialize;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::secret_sharing::*;
use crate::F;

//produces 4λ bits, where λ = 128
pub fn random_oracle(msg: &[u8], tag: &[u8]) -> Vec<u8> {
    let mut output: Vec<u8> = Vec::with_capacity(4 * λ);

    for i in 0..2 {
        let mut hasher = Sha256::new();
        // H(tag || len(msg) || msg || counter)
        hasher.update(tag);
        hasher.update((msg.len() as u64).to_be_bytes());
        hasher.update(msg);
        hasher.update([i as u8; 1]);

        output.extend_from_slice(hasher.finalize().as_slice());
    }

    output
}

/// Accumulates canonical (compressed) encodings of group elements and
/// scalars, and turns them into a Fiat-Shamir challenge.
#[derive(Default)]
pub struct Transcript {
    bytes: Vec<u8>,
}

impl Transcript {
    pub fn new(label: &[u8]) -> Self {
        let mut transcript = Self::default();
        transcript.bytes.extend_from_slice(&(label.len() as u64).to_be_bytes());
        transcript.bytes.extend_from_slice(label);
        transcript
    }

    pub fn append<T: CanonicalSerialize>(&mut self, item: &T) -> Result<()> {
        item.serialize_compressed(&mut self.bytes)?;
        Ok(())
    }

    pub fn append_all<'a, T: CanonicalSerialize + 'a>(
        &mut self,
        items: impl IntoIterator<Item = &'a T>,
    ) -> Result<()> {
        for item in items {
            self.append(item)?;
        }
        Ok(())
    }

    /// 512 hash bits reduced modulo the group order
    pub fn challenge(&self, domain: &[u8]) -> F {
        let digest = random_oracle(&self.bytes, domain);
        let c = F::from_be_bytes_mod_order(&digest);
        tracing::trace!(digest = %hex::encode(&digest[..λ]), "fiat-shamir challenge");
        c
    }
}
