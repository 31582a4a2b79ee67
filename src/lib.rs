// Legend for various fix-this comments:
//   * "TODO" - bug or missing crucial feature.
//   * "Improvement potential" - missing nice-to-have feature or an opportunity
//       to make code better or faster.

#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod client;
pub mod coordinator;
pub mod countdown;
pub mod error;
pub mod event;
pub mod network;
pub mod player;
pub mod round;
pub mod rules;
pub mod session;
pub mod test_util;
pub mod word_pair;
