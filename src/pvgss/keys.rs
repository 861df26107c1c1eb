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

//! Participant keys and the decryption side of the protocol: removing the
//! recipient encryption from a commitment and proving it was done right.

use std::fmt;

use ark_ec::pairing::Pairing;
use ark_ff::Field;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{UniformRand, Zero};
use ark_bls12_381::Bls12_381;
use rand::{CryptoRng, Rng};
use tracing::warn;
use zeroize::Zeroize;

use crate::config::Parameters;
use crate::error::PvgssError;
use crate::pvgss::dleq::{DleqProof, DleqStatement};
use crate::{F, G1, G2};

/// `pk1 = g1^sk` and `pk2 = g2^sk`.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct PublicKey {
    pub pk1: G1,
    pub pk2: G2,
}

impl PublicKey {
    /// Checks `e(pk1, g2) = e(g1, pk2)`, i.e. both halves use the same `sk`.
    pub fn is_consistent(&self, params: &Parameters) -> bool {
        Bls12_381::pairing(self.pk1, params.g2) == Bls12_381::pairing(params.g1, self.pk2)
    }
}

/// Wiped from memory on drop.
pub struct SecretKey(F);

impl SecretKey {
    pub(crate) fn scalar(&self) -> &F {
        &self.0
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SecretKey(<redacted>)")
    }
}

/// One participant's keys.
#[derive(Debug)]
pub struct KeyPair {
    public: PublicKey,
    secret: SecretKey,
}

impl KeyPair {
    pub fn generate<R: Rng + CryptoRng>(params: &Parameters, rng: &mut R) -> Self {
        Self::from_secret(params, F::rand(rng))
    }

    pub fn from_secret(params: &Parameters, sk: F) -> Self {
        KeyPair {
            public: PublicKey {
                pk1: params.g1 * sk,
                pk2: params.g2 * sk,
            },
            secret: SecretKey(sk),
        }
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }
}

/// A participant's commitment with the recipient encryption removed,
/// `g1^{λ_i}`, plus the proof that it was removed with the right key.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct DecryptedShare {
    pub share: G1,
    pub proof: DleqProof,
}

/// A decrypted share that passed KeyVrf, tagged with the row and the
/// dealing it was checked against. Only these feed reconstruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifiedShare {
    row: usize,
    dealing: F,
    share: G1,
}

impl VerifiedShare {
    pub(crate) fn new(row: usize, dealing: F, share: G1) -> Self {
        Self {
            row,
            dealing,
            share,
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub(crate) fn dealing(&self) -> &F {
        &self.dealing
    }

    pub fn share(&self) -> &G1 {
        &self.share
    }
}

/// `sk^{-1} mod p`; fails for the zero key.
pub fn invert_key(sk: &SecretKey) -> crate::Result<F> {
    sk.scalar().inverse().ok_or(PvgssError::KeyInverse)
}

/// `decShare = C^{sk^{-1}}`, with a DLEQ proof that
/// `log_{g1}(pk1) = log_{decShare}(C)`.
pub(crate) fn pre_recon<R: Rng + CryptoRng>(
    params: &Parameters,
    commitment: &G1,
    keys: &KeyPair,
    rng: &mut R,
) -> crate::Result<DecryptedShare> {
    let mut sk_inv = invert_key(&keys.secret)?;
    let share = *commitment * sk_inv;
    sk_inv.zeroize();

    let statement = DleqStatement {
        g1: &params.g1,
        h1: &keys.public.pk1,
        g2: &share,
        h2: commitment,
    };
    let proof = DleqProof::prove(statement, keys.secret.scalar(), &params.domain, rng)?;

    Ok(DecryptedShare { share, proof })
}

pub(crate) fn key_vrf(
    params: &Parameters,
    commitment: &G1,
    decrypted: &DecryptedShare,
    public_key: &PublicKey,
) -> crate::Result<()> {
    if decrypted.share.is_zero() {
        return Err(PvgssError::KeyValidity("decrypted share is the identity".into()));
    }

    let statement = DleqStatement {
        g1: &params.g1,
        h1: &public_key.pk1,
        g2: &decrypted.share,
        h2: commitment,
    };
    if !decrypted.proof.verify(statement, &params.domain)? {
        warn!("partial decryption failed DLEQ check");
        return Err(PvgssError::KeyValidity("DLEQ proof does not verify".into()));
    }

    Ok(())
}

/// Proof-free alternative: `e(decShare, pk2) = e(C, g2)`.
pub(crate) fn key_vrf_pairing(
    params: &Parameters,
    commitment: &G1,
    share: &G1,
    public_key: &PublicKey,
) -> crate::Result<()> {
    if share.is_zero() {
        return Err(PvgssError::KeyValidity("decrypted share is the identity".into()));
    }

    let lhs = Bls12_381::pairing(*share, public_key.pk2);
    let rhs = Bls12_381::pairing(*commitment, params.g2);
    if lhs != rhs {
        warn!("partial decryption failed pairing check");
        return Err(PvgssError::KeyValidity("pairing equation does not hold".into()));
    }

    Ok(())
}
