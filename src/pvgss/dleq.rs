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

//! Chaum-Pedersen proof that two discrete logarithms are equal.

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::UniformRand;
use rand::{CryptoRng, Rng};
use zeroize::Zeroize;

use crate::secret_sharing::utils::Transcript;
use crate::{F, G1};

/// Non-interactive proof of knowledge of `x` with `h1 = g1^x` and
/// `h2 = g2^x`, in the compact `(c, z)` form.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct DleqProof {
    pub challenge: F,
    pub response: F,
}

/// The four group elements a [`DleqProof`] speaks about.
#[derive(Clone, Copy, Debug)]
pub struct DleqStatement<'a> {
    pub g1: &'a G1,
    pub h1: &'a G1,
    pub g2: &'a G1,
    pub h2: &'a G1,
}

impl DleqProof {
    pub fn prove<R: Rng + CryptoRng>(
        statement: DleqStatement,
        witness: &F,
        domain: &[u8],
        rng: &mut R,
    ) -> crate::Result<Self> {
        let mut nonce = F::rand(rng);
        let a1 = *statement.g1 * nonce;
        let a2 = *statement.g2 * nonce;

        let challenge = challenge(statement, &a1, &a2, domain)?;
        let response = nonce - challenge * witness;
        nonce.zeroize();

        Ok(DleqProof {
            challenge,
            response,
        })
    }

    /// Recomputes the commitments `a1 = g1^z · h1^c`, `a2 = g2^z · h2^c`
    /// and checks that they hash back to `c`.
    pub fn verify(&self, statement: DleqStatement, domain: &[u8]) -> crate::Result<bool> {
        let a1 = *statement.g1 * self.response + *statement.h1 * self.challenge;
        let a2 = *statement.g2 * self.response + *statement.h2 * self.challenge;

        Ok(challenge(statement, &a1, &a2, domain)? == self.challenge)
    }
}

fn challenge(statement: DleqStatement, a1: &G1, a2: &G1, domain: &[u8]) -> crate::Result<F> {
    let mut transcript = Transcript::new(b"pvgss-dleq");
    transcript.append_all([statement.g1, statement.h1, statement.g2, statement.h2, a1, a2])?;
    Ok(transcript.challenge(domain))
}
