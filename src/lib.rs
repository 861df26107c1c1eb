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

//! Publicly verifiable general secret sharing (PVGSS) over BLS12-381.
//!
//! A monotone access structure (nested threshold gates) is compiled into an
//! LSSS matrix; a dealer shares a secret under that matrix, encrypting each
//! row share to its participant and attaching a Fiat-Shamir proof that the
//! encrypted shares form one consistent sharing. Anyone can check the proof,
//! participants strip their encryption (with a DLEQ proof of correct
//! decryption), and any authorized quorum recombines `g1^s`.

pub mod config;
pub mod error;
pub mod pvgss;
pub mod secret_sharing;

pub use config::Parameters;
pub use error::{PvgssError, Result};
pub use pvgss::{
    Dealing, DecryptedShare, KeyPair, Proof, PublicKey, Pvgss, VerifiedDealing, VerifiedShare,
};
pub use secret_sharing::access_tree::{AccessTree, Policy};
pub use secret_sharing::lsss::{Lsss, Quorum};
pub use secret_sharing::matrix::Matrix;

/// The scalar field `Z_p`, with `p` the order of the BLS12-381 groups.
pub type F = ark_bls12_381::Fr;
/// First source group.
pub type G1 = ark_bls12_381::G1Projective;
/// Second source group.
pub type G2 = ark_bls12_381::G2Projective;
