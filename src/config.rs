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

//! Public parameters fixed for the lifetime of a deployment.

use ark_ec::PrimeGroup;

use crate::{G1, G2};

/// default domain-separation tag for every Fiat-Shamir hash
pub const DEFAULT_DOMAIN: &[u8] = b"PVGSS-BLS12-381-v1";

/// Generators and hashing domain used by [`crate::Pvgss`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameters {
    /// base for secret keys, decrypted shares and the reconstructed secret
    pub g1: G1,
    /// base for the G2 half of each public key
    pub g2: G2,
    /// prefix absorbed by every challenge hash
    pub domain: Vec<u8>,
}

impl Parameters {
    pub fn with_domain(domain: &[u8]) -> Self {
        Self {
            domain: domain.to_vec(),
            ..Self::default()
        }
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            g1: G1::generator(),
            g2: G2::generator(),
            domain: DEFAULT_DOMAIN.to_vec(),
        }
    }
}
