// SPDX-License-Identifier: Apache-2.0

pub(crate) mod bucket;
pub(crate) mod fs;
