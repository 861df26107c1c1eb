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

//! The PVGSS protocol: Setup, Share, Verify, PreRecon, KeyVrf, Recon.
//!
//! The dealer encrypts row share `λ_i` to participant `i` as
//! `C_i = pk1_i^{λ_i}` and proves, Schnorr style, that all `C_i` come from
//! one sharing: it shares a blinding secret `s'` under the same matrix,
//! publishes `C'_i = pk1_i^{λ'_i}`, and answers the challenge
//! `c = H(C, C')` with `ŝ = s' - c·s` and `ŝ_i = λ'_i - c·λ_i`. The
//! responses must satisfy `C'_i = C_i^c · pk1_i^{ŝ_i}` row by row and must
//! themselves be a sharing of `ŝ`, which the verifier checks under every
//! authorized quorum it is given.
//!
//! Every stage is a synchronous call with no state carried between calls,
//! so a caller cancels or enforces a deadline by not making the next call.

pub mod dleq;
pub mod keys;

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{cfg_into_iter, cfg_iter, UniformRand};
use rand::{CryptoRng, Rng};
use tracing::{debug, warn};
use zeroize::Zeroize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::Parameters;
use crate::error::PvgssError;
use crate::secret_sharing::lsss::{Lsss, Quorum};
use crate::secret_sharing::utils::Transcript;
use crate::{F, G1};

pub use dleq::DleqProof;
pub use keys::{invert_key, DecryptedShare, KeyPair, PublicKey, SecretKey, VerifiedShare};

/// Proof that a vector of commitments is one consistent sharing.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Proof {
    /// `C'_i = pk1_i^{λ'_i}`
    pub blinding: Vec<G1>,
    /// `c`
    pub challenge: F,
    /// `ŝ = s' - c·s`
    pub response: F,
    /// `ŝ_i = λ'_i - c·λ_i`
    pub row_responses: Vec<F>,
}

/// Output of Share: the encrypted shares and their proof, which are only
/// meaningful together.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Dealing {
    /// `C_i = pk1_i^{λ_i}`
    pub commitments: Vec<G1>,
    pub proof: Proof,
}

/// A dealing that passed [`Pvgss::verify`].
#[derive(Clone, Copy, Debug)]
pub struct VerifiedDealing<'a> {
    dealing: &'a Dealing,
}

impl<'a> VerifiedDealing<'a> {
    pub fn commitments(&self) -> &'a [G1] {
        &self.dealing.commitments
    }

    pub fn commitment(&self, row: usize) -> Option<&'a G1> {
        self.dealing.commitments.get(row)
    }

    /// The dealing's challenge, which binds every commitment; verified
    /// shares carry it so shares of different dealings cannot be mixed.
    pub(crate) fn id(&self) -> F {
        self.dealing.proof.challenge
    }

    fn checked_commitment(&self, row: usize) -> crate::Result<&'a G1> {
        self.commitment(row).ok_or_else(|| {
            PvgssError::Dimension(format!(
                "no commitment for row {} among {}",
                row,
                self.dealing.commitments.len()
            ))
        })
    }
}

/// Protocol context; every operation uses the same generators and hash
/// domain.
#[derive(Clone, Debug, Default)]
pub struct Pvgss {
    params: Parameters,
}

impl Pvgss {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameters(params: Parameters) -> Self {
        Self { params }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// `g1^s`, the value Recon yields for secret `s`.
    pub fn lift(&self, secret: &F) -> G1 {
        self.params.g1 * secret
    }

    /// Setup for one participant.
    pub fn setup<R: Rng + CryptoRng>(&self, rng: &mut R) -> KeyPair {
        KeyPair::generate(&self.params, rng)
    }

    /// Setup for `n` participants, each with fresh randomness.
    pub fn setup_many<R: Rng + CryptoRng>(&self, n: usize, rng: &mut R) -> Vec<KeyPair> {
        (0..n).map(|_| self.setup(rng)).collect()
    }

    /// Shares `secret` under `lsss`, encrypting row `i` to `public_keys[i]`.
    pub fn share<R: Rng + CryptoRng>(
        &self,
        secret: &F,
        lsss: &Lsss,
        public_keys: &[PublicKey],
        rng: &mut R,
    ) -> crate::Result<Dealing> {
        if public_keys.len() != lsss.rows() {
            return Err(PvgssError::Dimension(format!(
                "{} public keys for {} rows",
                public_keys.len(),
                lsss.rows()
            )));
        }

        let mut lambdas = lsss.share(*secret, rng)?;
        let commitments = encrypt_rows(public_keys, &lambdas);

        let mut blinding_secret = F::rand(rng);
        let mut blinding_lambdas = lsss.share(blinding_secret, rng)?;
        let blinding = encrypt_rows(public_keys, &blinding_lambdas);

        let challenge = dealing_challenge(&self.params, &commitments, &blinding)?;

        let response = blinding_secret - challenge * secret;
        let row_responses = cfg_iter!(blinding_lambdas)
            .zip(cfg_iter!(lambdas))
            .map(|(b, l)| *b - challenge * l)
            .collect();

        lambdas.zeroize();
        blinding_lambdas.zeroize();
        blinding_secret.zeroize();

        debug!(rows = lsss.rows(), cols = lsss.cols(), "dealt shares");
        Ok(Dealing {
            commitments,
            proof: Proof {
                blinding,
                challenge,
                response,
                row_responses,
            },
        })
    }

    /// Checks the dealing: the challenge, every row equation, and that the
    /// row responses reconstruct `ŝ` under each of `quorums`.
    pub fn verify<'a>(
        &self,
        dealing: &'a Dealing,
        public_keys: &[PublicKey],
        quorums: &[Quorum],
    ) -> crate::Result<VerifiedDealing<'a>> {
        let Dealing { commitments, proof } = dealing;
        let n = commitments.len();

        if public_keys.len() != n {
            return Err(PvgssError::Dimension(format!(
                "{} public keys for {} commitments",
                public_keys.len(),
                n
            )));
        }
        if proof.blinding.len() != n || proof.row_responses.len() != n {
            return Err(PvgssError::ProofVerification(format!(
                "proof covers {} blinding commitments and {} responses for {} rows",
                proof.blinding.len(),
                proof.row_responses.len(),
                n
            )));
        }
        if quorums.is_empty() {
            return Err(PvgssError::ProofVerification(
                "no authorized row set to check against".into(),
            ));
        }

        if dealing_challenge(&self.params, commitments, &proof.blinding)? != proof.challenge {
            warn!("dealing challenge mismatch");
            return Err(PvgssError::ProofVerification(
                "challenge is not the hash of the commitments".into(),
            ));
        }

        let c = proof.challenge;
        let bad_rows: Vec<usize> = cfg_into_iter!(0..n)
            .filter(|&i| {
                commitments[i] * c + public_keys[i].pk1 * proof.row_responses[i]
                    != proof.blinding[i]
            })
            .collect();
        if let Some(&row) = bad_rows.first() {
            warn!(row, failures = bad_rows.len(), "row consistency check failed");
            return Err(PvgssError::ProofVerification(format!(
                "row {} does not satisfy C'_i = C_i^c * pk1_i^s_i",
                row
            )));
        }

        for (k, quorum) in quorums.iter().enumerate() {
            let responses = quorum.select(&proof.row_responses)?;
            if quorum.reconstruct(&responses)? != proof.response {
                warn!(quorum = k, "row responses disagree with aggregate response");
                return Err(PvgssError::ProofVerification(format!(
                    "quorum {} reconstructs a different aggregate response",
                    k
                )));
            }
        }

        debug!(rows = n, quorums = quorums.len(), "verified dealing");
        Ok(VerifiedDealing { dealing })
    }

    /// Removes the participant's encryption from its commitment in row
    /// `row` of a verified dealing.
    pub fn pre_recon<R: Rng + CryptoRng>(
        &self,
        dealing: &VerifiedDealing,
        row: usize,
        keypair: &KeyPair,
        rng: &mut R,
    ) -> crate::Result<DecryptedShare> {
        let commitment = dealing.checked_commitment(row)?;
        keys::pre_recon(&self.params, commitment, keypair, rng)
    }

    /// Checks a [`DecryptedShare`] for row `row` against that row's
    /// commitment and the participant's public key.
    pub fn key_vrf(
        &self,
        dealing: &VerifiedDealing,
        row: usize,
        decrypted: &DecryptedShare,
        public_key: &PublicKey,
    ) -> crate::Result<VerifiedShare> {
        let commitment = dealing.checked_commitment(row)?;
        keys::key_vrf(&self.params, commitment, decrypted, public_key)?;
        Ok(VerifiedShare::new(row, dealing.id(), decrypted.share))
    }

    /// KeyVrf through the pairing `e(decShare, pk2) = e(C, g2)`; needs no
    /// proof from the participant.
    pub fn key_vrf_pairing(
        &self,
        dealing: &VerifiedDealing,
        row: usize,
        share: &G1,
        public_key: &PublicKey,
    ) -> crate::Result<VerifiedShare> {
        let commitment = dealing.checked_commitment(row)?;
        keys::key_vrf_pairing(&self.params, commitment, share, public_key)?;
        Ok(VerifiedShare::new(row, dealing.id(), *share))
    }

    /// Recombines verified shares of `dealing` into `g1^s`. The shares must
    /// come in the order of `quorum.rows()`.
    pub fn reconstruct(
        &self,
        dealing: &VerifiedDealing,
        quorum: &Quorum,
        shares: &[VerifiedShare],
    ) -> crate::Result<G1> {
        if shares.len() != quorum.len() {
            return Err(PvgssError::Dimension(format!(
                "{} shares for a quorum of {} rows",
                shares.len(),
                quorum.len()
            )));
        }
        for (share, &row) in shares.iter().zip(quorum.rows()) {
            if *share.dealing() != dealing.id() {
                warn!(row = share.row(), "share belongs to another dealing");
                return Err(PvgssError::KeyValidity(format!(
                    "share for row {} was verified against another dealing",
                    share.row()
                )));
            }
            if share.row() != row {
                return Err(PvgssError::Dimension(format!(
                    "share for row {} where the quorum expects row {}",
                    share.row(),
                    row
                )));
            }
        }

        let shares: Vec<G1> = shares.iter().map(|s| *s.share()).collect();
        quorum.reconstruct_group(&shares)
    }

    /// Recon straight from a precomputed inverse submatrix; see
    /// [`Quorum::from_inverse`].
    pub fn reconstruct_with_inverse(
        &self,
        dealing: &VerifiedDealing,
        lsss: &Lsss,
        inverse: &crate::Matrix,
        rows: &[usize],
        shares: &[VerifiedShare],
    ) -> crate::Result<G1> {
        let quorum = Quorum::from_inverse(lsss, rows, inverse)?;
        self.reconstruct(dealing, &quorum, shares)
    }
}

fn encrypt_rows(public_keys: &[PublicKey], lambdas: &[F]) -> Vec<G1> {
    cfg_iter!(public_keys)
        .zip(cfg_iter!(lambdas))
        .map(|(pk, l)| pk.pk1 * l)
        .collect()
}

fn dealing_challenge(
    params: &Parameters,
    commitments: &[G1],
    blinding: &[G1],
) -> crate::Result<F> {
    let mut transcript = Transcript::new(b"pvgss-dealing");
    transcript.append_all(commitments)?;
    transcript.append_all(blinding)?;
    Ok(transcript.challenge(&params.domain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret_sharing::access_tree::Policy;
    use ark_std::One;
    use rand::thread_rng;

    // 2-of-(1-of-(2-of-(P1, P2, P3), seller), buyer); rows P1, P2, P3, seller, buyer
    fn fixture() -> (Pvgss, Lsss, Vec<KeyPair>, Vec<Quorum>) {
        let mut rng = thread_rng();
        let policy = Policy::and(vec![
            Policy::or(vec![
                Policy::threshold(2, vec![Policy::leaf(1), Policy::leaf(2), Policy::leaf(3)]),
                Policy::leaf(4),
            ]),
            Policy::leaf(5),
        ]);
        let lsss = Lsss::from_policy(&policy).unwrap();
        let pvgss = Pvgss::new();
        let keys = pvgss.setup_many(lsss.rows(), &mut rng);
        let quorums = vec![lsss.quorum(&[3, 4]).unwrap(), lsss.quorum(&[0, 2, 4]).unwrap()];
        (pvgss, lsss, keys, quorums)
    }

    fn public_keys(keys: &[KeyPair]) -> Vec<PublicKey> {
        keys.iter().map(|k| k.public().clone()).collect()
    }

    fn decrypt(
        pvgss: &Pvgss,
        dealing: &VerifiedDealing,
        keys: &[KeyPair],
        quorum: &Quorum,
    ) -> Vec<VerifiedShare> {
        let mut rng = thread_rng();
        quorum
            .rows()
            .iter()
            .map(|&row| {
                let dec = pvgss.pre_recon(dealing, row, &keys[row], &mut rng).unwrap();
                pvgss.key_vrf(dealing, row, &dec, keys[row].public()).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_honest_dealing_verifies() {
        let mut rng = thread_rng();
        let (pvgss, lsss, keys, quorums) = fixture();
        let pks = public_keys(&keys);

        let secret = F::rand(&mut rng);
        let dealing = pvgss.share(&secret, &lsss, &pks, &mut rng).unwrap();
        let verified = pvgss.verify(&dealing, &pks, &quorums).unwrap();
        assert_eq!(verified.commitments().len(), lsss.rows());

        let quorum = &quorums[1];
        let shares = decrypt(&pvgss, &verified, &keys, quorum);
        assert_eq!(
            pvgss.reconstruct(&verified, quorum, &shares).unwrap(),
            pvgss.lift(&secret)
        );

        let row = quorum.rows()[0];
        let dec = pvgss.pre_recon(&verified, row, &keys[row], &mut rng).unwrap();
        let share = pvgss
            .key_vrf_pairing(&verified, row, &dec.share, keys[row].public())
            .unwrap();
        assert_eq!(share, shares[0]);
    }

    #[test]
    fn test_reconstruct_rejects_misplaced_shares() {
        let mut rng = thread_rng();
        let (pvgss, lsss, keys, quorums) = fixture();
        let pks = public_keys(&keys);
        let dealing = pvgss.share(&F::rand(&mut rng), &lsss, &pks, &mut rng).unwrap();
        let verified = pvgss.verify(&dealing, &pks, &quorums).unwrap();

        let quorum = &quorums[1];
        let mut shares = decrypt(&pvgss, &verified, &keys, quorum);
        shares.swap(0, 2);
        assert!(matches!(
            pvgss.reconstruct(&verified, quorum, &shares),
            Err(PvgssError::Dimension(_))
        ));

        shares.pop();
        assert!(matches!(
            pvgss.reconstruct(&verified, quorum, &shares),
            Err(PvgssError::Dimension(_))
        ));

        // a proper share for the wrong row does not pass KeyVrf either
        let dec = pvgss.pre_recon(&verified, 0, &keys[0], &mut rng).unwrap();
        assert!(matches!(
            pvgss.key_vrf(&verified, 2, &dec, keys[0].public()),
            Err(PvgssError::KeyValidity(_))
        ));
        assert!(matches!(
            pvgss.pre_recon(&verified, lsss.rows(), &keys[0], &mut rng),
            Err(PvgssError::Dimension(_))
        ));
    }

    #[test]
    fn test_reconstruct_rejects_shares_of_another_dealing() {
        let mut rng = thread_rng();
        let (pvgss, lsss, keys, quorums) = fixture();
        let pks = public_keys(&keys);

        let secret = F::rand(&mut rng);
        let first = pvgss.share(&secret, &lsss, &pks, &mut rng).unwrap();
        let second = pvgss.share(&F::rand(&mut rng), &lsss, &pks, &mut rng).unwrap();
        let first = pvgss.verify(&first, &pks, &quorums).unwrap();
        let second = pvgss.verify(&second, &pks, &quorums).unwrap();

        let quorum = &quorums[1];
        let mut shares = decrypt(&pvgss, &first, &keys, quorum);
        let foreign = decrypt(&pvgss, &second, &keys, quorum);
        shares[1] = foreign[1];

        assert!(matches!(
            pvgss.reconstruct(&first, quorum, &shares),
            Err(PvgssError::KeyValidity(_))
        ));
        assert!(matches!(
            pvgss.reconstruct(&second, quorum, &shares),
            Err(PvgssError::KeyValidity(_))
        ));

        shares[1] = decrypt(&pvgss, &first, &keys, quorum)[1];
        assert_eq!(
            pvgss.reconstruct(&first, quorum, &shares).unwrap(),
            pvgss.lift(&secret)
        );
    }

    #[test]
    fn test_single_fault_injection() {
        let mut rng = thread_rng();
        let (pvgss, lsss, keys, quorums) = fixture();
        let pks = public_keys(&keys);
        let dealing = pvgss.share(&F::rand(&mut rng), &lsss, &pks, &mut rng).unwrap();

        for i in 0..lsss.rows() {
            let mut bad = dealing.clone();
            bad.proof.blinding[i] += pvgss.parameters().g1;
            assert!(matches!(
                pvgss.verify(&bad, &pks, &quorums),
                Err(PvgssError::ProofVerification(_))
            ));

            let mut bad = dealing.clone();
            bad.proof.row_responses[i] += F::one();
            assert!(matches!(
                pvgss.verify(&bad, &pks, &quorums),
                Err(PvgssError::ProofVerification(_))
            ));

            let mut bad = dealing.clone();
            bad.commitments[i] += pvgss.parameters().g1;
            assert!(matches!(
                pvgss.verify(&bad, &pks, &quorums),
                Err(PvgssError::ProofVerification(_))
            ));
        }

        let mut bad = dealing.clone();
        bad.proof.response += F::one();
        assert!(matches!(
            pvgss.verify(&bad, &pks, &quorums),
            Err(PvgssError::ProofVerification(_))
        ));
    }

    #[test]
    fn test_inconsistent_dealer_is_caught_by_quorum_check() {
        // a dealer who hands the seller a share from a different sharing
        // can still satisfy every row equation, but not the quorum check
        let mut rng = thread_rng();
        let (pvgss, lsss, keys, quorums) = fixture();
        let pks = public_keys(&keys);

        let secret = F::rand(&mut rng);
        let mut lambdas = lsss.share(secret, &mut rng).unwrap();
        lambdas[3] += F::one();
        let blinding_secret = F::rand(&mut rng);
        let blinding_lambdas = lsss.share(blinding_secret, &mut rng).unwrap();

        let commitments = encrypt_rows(&pks, &lambdas);
        let blinding = encrypt_rows(&pks, &blinding_lambdas);
        let challenge = dealing_challenge(pvgss.parameters(), &commitments, &blinding).unwrap();
        let dealing = Dealing {
            commitments,
            proof: Proof {
                blinding,
                challenge,
                response: blinding_secret - challenge * secret,
                row_responses: blinding_lambdas
                    .iter()
                    .zip(&lambdas)
                    .map(|(b, l)| *b - challenge * l)
                    .collect(),
            },
        };

        // the second quorum does not use the seller's row
        assert!(pvgss.verify(&dealing, &pks, &quorums[1..]).is_ok());
        assert!(matches!(
            pvgss.verify(&dealing, &pks, &quorums),
            Err(PvgssError::ProofVerification(_))
        ));
    }

    #[test]
    fn test_shape_errors() {
        let mut rng = thread_rng();
        let (pvgss, lsss, keys, quorums) = fixture();
        let pks = public_keys(&keys);

        assert!(matches!(
            pvgss.share(&F::one(), &lsss, &pks[1..], &mut rng),
            Err(PvgssError::Dimension(_))
        ));

        let dealing = pvgss.share(&F::one(), &lsss, &pks, &mut rng).unwrap();
        assert!(matches!(
            pvgss.verify(&dealing, &pks[1..], &quorums),
            Err(PvgssError::Dimension(_))
        ));
        assert!(matches!(
            pvgss.verify(&dealing, &pks, &[]),
            Err(PvgssError::ProofVerification(_))
        ));

        let mut short = dealing.clone();
        short.proof.row_responses.pop();
        assert!(matches!(
            pvgss.verify(&short, &pks, &quorums),
            Err(PvgssError::ProofVerification(_))
        ));
    }

    #[test]
    fn test_dealing_serialization() {
        let mut rng = thread_rng();
        let (pvgss, lsss, keys, _) = fixture();
        let pks = public_keys(&keys);
        let dealing = pvgss.share(&F::rand(&mut rng), &lsss, &pks, &mut rng).unwrap();

        let mut bytes = Vec::new();
        dealing.serialize_compressed(&mut bytes).unwrap();
        let decoded = Dealing::deserialize_compressed(&bytes[..]).unwrap();
        assert_eq!(decoded, dealing);
    }

    #[test]
    fn test_domain_separation() {
        let mut rng = thread_rng();
        let (pvgss, lsss, keys, quorums) = fixture();
        let pks = public_keys(&keys);
        let dealing = pvgss.share(&F::rand(&mut rng), &lsss, &pks, &mut rng).unwrap();

        let other = Pvgss::with_parameters(Parameters::with_domain(b"another deployment"));
        assert!(matches!(
            other.verify(&dealing, &pks, &quorums),
            Err(PvgssError::ProofVerification(_))
        ));
    }
}
