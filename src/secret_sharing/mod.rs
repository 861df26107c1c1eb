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

//! Linear secret sharing: field matrices, access trees, the tree-to-matrix
//! compiler, and share/reconstruct over the resulting LSSS.

pub mod access_tree;
pub mod compiler;
pub mod lsss;
pub mod matrix;
pub(crate) mod utils;

#[allow(non_upper_case_globals)]
const λ_bits: usize = 128;

#[allow(non_upper_case_globals)]
const λ: usize = λ_bits / 8;
