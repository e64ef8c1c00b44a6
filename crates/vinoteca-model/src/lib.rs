// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod category;
mod label;
mod wine;

pub use category::{CategoryMap, UnknownCategory, CATEGORY_CODE_MAX, CATEGORY_CODE_MIN};
pub use label::LabelEntry;
pub use wine::{SampleResult, WineRecord};
