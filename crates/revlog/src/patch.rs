// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Diff collaborator
//!
//! The revision store never looks inside a [`PatchSet`]; it only asks a
//! [`Differ`] to make one from two texts and to apply one to a base text.
//! [`CharDiffer`] is the bundled implementation, a character-level Myers
//! diff computed by the `similar` crate.

use serde::{Deserialize, Serialize};
use similar::{Algorithm, DiffTag, capture_diff_slices};

/// One edit step, measured in characters.
///
/// Serialized externally tagged: `{"keep":3}`, `{"delete":"lo"}`,
/// `{"insert":"p!"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hunk {
    /// Copy this many characters of the base unchanged
    Keep(usize),
    /// The base must continue with exactly this text, which is dropped
    Delete(String),
    /// Emit this text
    Insert(String),
}

/// The edits that turn one text into another
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSet {
    pub hunks: Vec<Hunk>,
}

impl PatchSet {
    /// True when applying the patch changes nothing
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.hunks.iter().all(|h| matches!(h, Hunk::Keep(_)))
    }

    fn push(&mut self, hunk: Hunk) {
        let empty = match &hunk {
            Hunk::Keep(n) => *n == 0,
            Hunk::Delete(s) | Hunk::Insert(s) => s.is_empty(),
        };
        if empty {
            return;
        }
        let merged = match (self.hunks.last_mut(), &hunk) {
            (Some(Hunk::Keep(n)), Hunk::Keep(m)) => {
                *n += m;
                true
            }
            (Some(Hunk::Delete(a)), Hunk::Delete(b)) | (Some(Hunk::Insert(a)), Hunk::Insert(b)) => {
                a.push_str(b);
                true
            }
            _ => false,
        };
        if !merged {
            self.hunks.push(hunk);
        }
    }
}

/// Result of applying a patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub text: String,
    /// False when the base did not match what the patch expected. The text
    /// is still a best-effort application.
    pub clean: bool,
}

/// Produces and applies patch sets
pub trait Differ: Send + Sync {
    fn make_patch(&self, old: &str, new: &str) -> PatchSet;

    fn apply_patch(&self, patch: &PatchSet, base: &str) -> Applied;
}

/// Character-level differ backed by `similar`
#[derive(Debug, Clone, Copy, Default)]
pub struct CharDiffer;

impl Differ for CharDiffer {
    fn make_patch(&self, old: &str, new: &str) -> PatchSet {
        let old_chars: Vec<char> = old.chars().collect();
        let new_chars: Vec<char> = new.chars().collect();

        let mut patch = PatchSet::default();
        for op in capture_diff_slices(Algorithm::Myers, &old_chars, &new_chars) {
            let (tag, old_range, new_range) = op.as_tag_tuple();
            match tag {
                DiffTag::Equal => patch.push(Hunk::Keep(old_range.len())),
                DiffTag::Delete => patch.push(Hunk::Delete(old_chars[old_range].iter().collect())),
                DiffTag::Insert => patch.push(Hunk::Insert(new_chars[new_range].iter().collect())),
                DiffTag::Replace => {
                    patch.push(Hunk::Delete(old_chars[old_range].iter().collect()));
                    patch.push(Hunk::Insert(new_chars[new_range].iter().collect()));
                }
            }
        }
        patch
    }

    fn apply_patch(&self, patch: &PatchSet, base: &str) -> Applied {
        let mut rest = base.chars();
        let mut text = String::with_capacity(base.len());
        let mut clean = true;

        for hunk in &patch.hunks {
            match hunk {
                Hunk::Keep(n) => {
                    let before = text.len();
                    text.extend(rest.by_ref().take(*n));
                    if text[before..].chars().count() != *n {
                        clean = false;
                    }
                }
                Hunk::Delete(expected) => {
                    for want in expected.chars() {
                        if rest.next() != Some(want) {
                            clean = false;
                        }
                    }
                }
                Hunk::Insert(s) => text.push_str(s),
            }
        }

        // A patch made against this base consumes all of it.
        let leftover: String = rest.collect();
        if !leftover.is_empty() {
            clean = false;
            text.push_str(&leftover);
        }

        Applied { text, clean }
    }
}
