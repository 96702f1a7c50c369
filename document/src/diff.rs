//! Myers diff with an LCS dynamic-programming fallback for small interiors,
//! trimmed by common prefix/suffix first. Implemented from scratch (this is
//! one of the four hard parts the spec calls out, not something to reach for
//! a crate to do).
//!
//! Operates over `char`s rather than raw bytes or UTF-16 code units: trimming
//! and every edit-graph step only ever lands on whole-character boundaries,
//! which is a strictly stronger guarantee than "never split a UTF-16
//! surrogate pair" (a surrogate pair only ever arises from a single `char`
//! outside the BMP, so respecting `char` boundaries respects surrogate
//! boundaries for free).

const LCS_FALLBACK_CELL_BUDGET: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Insert,
    Delete,
    Equal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub kind: EditKind,
    pub text: String,
    /// Byte position in the *old* text this edit starts at (for Equal/Delete;
    /// for a pure Insert this is where it would be spliced into `old`).
    pub old_pos: usize,
    /// Byte position in the *new* text this edit starts at.
    pub new_pos: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    pub edits: Vec<Edit>,
    pub distance: usize,
}

struct CharSeq {
    chars: Vec<char>,
    /// byte offset of each char in the original string, plus one trailing
    /// entry equal to the string's total byte length.
    byte_offsets: Vec<usize>,
}

impl CharSeq {
    fn new(s: &str) -> CharSeq {
        let mut chars = Vec::with_capacity(s.len());
        let mut byte_offsets = Vec::with_capacity(s.len() + 1);
        for (i, ch) in s.char_indices() {
            byte_offsets.push(i);
            chars.push(ch);
        }
        byte_offsets.push(s.len());
        CharSeq {
            chars,
            byte_offsets,
        }
    }

    fn len(&self) -> usize {
        self.chars.len()
    }

    fn byte_of(&self, char_idx: usize) -> usize {
        self.byte_offsets[char_idx]
    }
}

pub fn diff(old: &str, new: &str) -> DiffResult {
    if old == new {
        if old.is_empty() {
            return DiffResult {
                edits: Vec::new(),
                distance: 0,
            };
        }
        return DiffResult {
            edits: vec![Edit {
                kind: EditKind::Equal,
                text: old.to_string(),
                old_pos: 0,
                new_pos: 0,
            }],
            distance: 0,
        };
    }

    let old_seq = CharSeq::new(old);
    let new_seq = CharSeq::new(new);

    let prefix = common_prefix_len(&old_seq.chars, &new_seq.chars);
    let old_suffix_limit = old_seq.len() - prefix;
    let new_suffix_limit = new_seq.len() - prefix;
    let suffix = common_suffix_len(
        &old_seq.chars[prefix..],
        &new_seq.chars[prefix..],
        old_suffix_limit,
        new_suffix_limit,
    );

    let old_mid = &old_seq.chars[prefix..old_seq.len() - suffix];
    let new_mid = &new_seq.chars[prefix..new_seq.len() - suffix];

    let ops = if (old_mid.len() as u64) * (new_mid.len() as u64) < LCS_FALLBACK_CELL_BUDGET as u64 {
        lcs_ops(old_mid, new_mid)
    } else {
        myers_ops(old_mid, new_mid)
    };

    let mut edits = Vec::new();
    if prefix > 0 {
        edits.push(Edit {
            kind: EditKind::Equal,
            text: old_seq.chars[..prefix].iter().collect(),
            old_pos: 0,
            new_pos: 0,
        });
    }

    let mut old_char_pos = prefix;
    let mut new_char_pos = prefix;
    for op in ops {
        match op {
            EditKind::Equal => {
                edits.push(Edit {
                    kind: EditKind::Equal,
                    text: old_seq.chars[old_char_pos..old_char_pos + 1].iter().collect(),
                    old_pos: old_seq.byte_of(old_char_pos),
                    new_pos: new_seq.byte_of(new_char_pos),
                });
                old_char_pos += 1;
                new_char_pos += 1;
            }
            EditKind::Delete => {
                edits.push(Edit {
                    kind: EditKind::Delete,
                    text: old_seq.chars[old_char_pos..old_char_pos + 1].iter().collect(),
                    old_pos: old_seq.byte_of(old_char_pos),
                    new_pos: new_seq.byte_of(new_char_pos),
                });
                old_char_pos += 1;
            }
            EditKind::Insert => {
                edits.push(Edit {
                    kind: EditKind::Insert,
                    text: new_seq.chars[new_char_pos..new_char_pos + 1].iter().collect(),
                    old_pos: old_seq.byte_of(old_char_pos),
                    new_pos: new_seq.byte_of(new_char_pos),
                });
                new_char_pos += 1;
            }
        }
    }

    if suffix > 0 {
        let start = old_seq.len() - suffix;
        let nstart = new_seq.len() - suffix;
        edits.push(Edit {
            kind: EditKind::Equal,
            text: old_seq.chars[start..].iter().collect(),
            old_pos: old_seq.byte_of(start),
            new_pos: new_seq.byte_of(nstart),
        });
    }

    let edits = coalesce(edits);
    let distance = edits
        .iter()
        .filter(|e| e.kind != EditKind::Equal)
        .map(|e| e.text.len())
        .sum();

    DiffResult { edits, distance }
}

fn common_prefix_len(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

fn common_suffix_len(a: &[char], b: &[char], a_limit: usize, b_limit: usize) -> usize {
    let max = a_limit.min(b_limit);
    let mut n = 0;
    while n < max && a[a.len() - 1 - n] == b[b.len() - 1 - n] {
        n += 1;
    }
    n
}

/// Coalesce consecutive edits of identical kind into one.
fn coalesce(edits: Vec<Edit>) -> Vec<Edit> {
    let mut out: Vec<Edit> = Vec::with_capacity(edits.len());
    for edit in edits {
        if let Some(last) = out.last_mut() {
            if last.kind == edit.kind {
                last.text.push_str(&edit.text);
                continue;
            }
        }
        out.push(edit);
    }
    out
}

/// LCS via a flat dynamic-programming matrix, for small interiors where the
/// setup cost of Myers' diagonal bookkeeping isn't worth it.
fn lcs_ops(a: &[char], b: &[char]) -> Vec<EditKind> {
    let n = a.len();
    let m = b.len();
    let mut dp = vec![0u32; (n + 1) * (m + 1)];
    let idx = |i: usize, j: usize| i * (m + 1) + j;

    for i in (0..n).rev() {
        for j in (0..m).rev() {
            dp[idx(i, j)] = if a[i] == b[j] {
                dp[idx(i + 1, j + 1)] + 1
            } else {
                dp[idx(i + 1, j)].max(dp[idx(i, j + 1)])
            };
        }
    }

    let mut ops = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            ops.push(EditKind::Equal);
            i += 1;
            j += 1;
        } else if dp[idx(i + 1, j)] >= dp[idx(i, j + 1)] {
            ops.push(EditKind::Delete);
            i += 1;
        } else {
            ops.push(EditKind::Insert);
            j += 1;
        }
    }
    while i < n {
        ops.push(EditKind::Delete);
        i += 1;
    }
    while j < m {
        ops.push(EditKind::Insert);
        j += 1;
    }
    ops
}

/// Myers' O((N+M)D) greedy edit-graph algorithm. Finds the shortest edit
/// script between `a` and `b` by walking increasing "D" (edit distance)
/// fronts over diagonals `k = x - y`, recording each front so the script can
/// be recovered by a backward walk once the target diagonal is reached.
fn myers_ops(a: &[char], b: &[char]) -> Vec<EditKind> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max = n + m;
    if max == 0 {
        return Vec::new();
    }

    let offset = max as usize;
    let mut v = vec![0isize; 2 * max as usize + 1];
    // fronts[d] is the diagonal array as it stood right after round d
    // completed: fronts[d][k + offset] is the furthest x reached on
    // diagonal k using at most d edits.
    let mut fronts: Vec<Vec<isize>> = Vec::new();
    let mut found_at: Option<usize> = None;

    for d in 0..=max as usize {
        for k in (-(d as isize)..=d as isize).step_by(2) {
            let k_idx = (k + offset as isize) as usize;
            let mut x = if k == -(d as isize)
                || (k != d as isize && v[k_idx - 1] < v[k_idx + 1])
            {
                v[k_idx + 1]
            } else {
                v[k_idx - 1] + 1
            };
            let mut y = x - k;

            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }

            v[k_idx] = x;

            if x >= n && y >= m {
                found_at = Some(d);
            }
        }

        fronts.push(v.clone());
        if found_at.is_some() {
            break;
        }
    }

    backtrack(&fronts, n, m, offset, found_at.unwrap_or(0))
}

fn backtrack(
    fronts: &[Vec<isize>],
    n: isize,
    m: isize,
    offset: usize,
    d_max: usize,
) -> Vec<EditKind> {
    let mut ops = Vec::new();
    let (mut x, mut y) = (n, m);
    let k_idx = |k: isize| (k + offset as isize) as usize;

    for d in (1..=d_max).rev() {
        let v = &fronts[d - 1];
        let k = x - y;

        let prev_k = if k == -(d as isize)
            || (k != d as isize && v[k_idx(k - 1)] < v[k_idx(k + 1)])
        {
            k + 1
        } else {
            k - 1
        };
        let prev_x = v[k_idx(prev_k)];
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            ops.push(EditKind::Equal);
            x -= 1;
            y -= 1;
        }

        ops.push(if x == prev_x {
            EditKind::Insert
        } else {
            EditKind::Delete
        });

        x = prev_x;
        y = prev_y;
    }

    while x > 0 && y > 0 {
        ops.push(EditKind::Equal);
        x -= 1;
        y -= 1;
    }

    ops.reverse();
    ops
}

/// Lifts a [`diff`] between `old` and `new` into the sequence of `INSERT`/
/// `DELETE` actions that reproduce it, with byte offsets valid at the moment
/// each action is applied (§4.3 "Lifting to actions"): an edit's position in
/// `old`/`new` is adjusted by the net byte delta every earlier action in the
/// sequence has already introduced.
pub fn compute_set_value_actions(old: &str, new: &str) -> Vec<crate::action::DocumentAction> {
    use crate::action::DocumentAction;

    let result = diff(old, new);
    let mut actions = Vec::new();
    let mut delta: i64 = 0;

    for edit in &result.edits {
        match edit.kind {
            EditKind::Equal => {}
            EditKind::Delete => {
                let start = (edit.old_pos as i64 + delta) as usize;
                let end = start + edit.text.len();
                actions.push(DocumentAction::Delete { start, end });
                delta -= edit.text.len() as i64;
            }
            EditKind::Insert => {
                let start = (edit.old_pos as i64 + delta) as usize;
                actions.push(DocumentAction::Insert {
                    start,
                    text: edit.text.clone(),
                });
                delta += edit.text.len() as i64;
            }
        }
    }

    actions
}

/// Collapses the single changed byte range between `old` and `new` into one
/// `REPLACE` (or a pure `INSERT`/`DELETE` when one side of the changed range
/// is empty), trimming the common prefix/suffix at `char` boundaries rather
/// than running the full edit-graph search — `computeSetValueActionsOptimized`
/// in §4.3, used when a caller replaces a document's whole value and only the
/// single touched span (not a minimal multi-hunk script) matters.
pub fn compute_set_value_actions_optimized(
    old: &str,
    new: &str,
) -> Vec<crate::action::DocumentAction> {
    use crate::action::DocumentAction;

    if old == new {
        return Vec::new();
    }

    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();

    let prefix = common_prefix_len(&old_chars, &new_chars);
    let old_suffix_limit = old_chars.len() - prefix;
    let new_suffix_limit = new_chars.len() - prefix;
    let suffix = common_suffix_len(
        &old_chars[prefix..],
        &new_chars[prefix..],
        old_suffix_limit,
        new_suffix_limit,
    );

    let old_mid: String = old_chars[prefix..old_chars.len() - suffix].iter().collect();
    let new_mid: String = new_chars[prefix..new_chars.len() - suffix].iter().collect();

    let start: usize = old_chars[..prefix].iter().map(|c| c.len_utf8()).sum();
    let end = start + old_mid.len();

    if old_mid.is_empty() {
        vec![DocumentAction::Insert {
            start,
            text: new_mid,
        }]
    } else if new_mid.is_empty() {
        vec![DocumentAction::Delete { start, end }]
    } else {
        vec![DocumentAction::Replace {
            start,
            end,
            text: new_mid,
        }]
    }
}
